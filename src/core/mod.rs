// ─── Launcher Core ───
// Version-gated modpack sync and parameterized game launch.
//
// Architecture:
//   core/
//     manifest/: Manifest model + on-disk store
//     fetcher/ : Locator parsing, archive/dir/git fetch, staged install
//     sync/    : Remote manifest source + sync engine
//     launch/  : Command template resolution + process spawner
//     options  : Persisted nickname / RAM
//     paths    : Per-user config layout
//     state/   : Wiring shared by the front-end commands

pub mod error;
pub mod fetcher;
pub mod http;
pub mod launch;
pub mod manifest;
pub mod options;
pub mod paths;
pub mod state;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

