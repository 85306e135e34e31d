pub mod model;
pub mod store;

pub use model::ModpackManifest;
pub use store::ManifestStore;
