pub mod engine;
pub mod remote;

pub use engine::{SyncEngine, SyncOutcome};
pub use remote::{HttpManifestSource, ManifestSource, DEFAULT_MANIFEST_URL};
