//! mediasrv - loopback HTTP server for an embedded browser view.
//!
//! Serves bundled web assets, an override export tree under `/_anki/`,
//! addon-exported files under `/_addons/`, and a couple of POST commands that
//! call into the host application's backend.
//!
//! ```ignore
//! let host = HostContext::new(backend).with_addons(addons);
//! let server = MediaServer::from_config(&config.serve, host)?;
//! server.start()?;
//! let port = server.get_port()?; // blocks until bound
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod logger;
pub mod resolve;
pub mod serve;
pub mod server;
pub mod utils;

pub use error::{BackendError, ServerError, TransferError};
pub use host::{AddonRegistry, Backend, HostContext};
pub use server::{MediaServer, Phase};
