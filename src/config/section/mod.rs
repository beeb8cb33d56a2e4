//! Configuration section definitions.

mod addons;
mod backend;
mod serve;

pub use addons::AddonsConfig;
pub use backend::BackendConfig;
pub use serve::ServeConfig;
