//! Backend used when the server runs without a host application.

use super::Backend;
use crate::error::BackendError;
use std::path::Path;
use std::{fs, io};

/// Serves a translation bundle from disk and has no collection to compute
/// graphs over, so every graph request takes the empty-payload path.
#[derive(Debug, Default)]
pub struct BundleBackend {
    i18n: Vec<u8>,
}

impl BundleBackend {
    pub fn new(i18n: Vec<u8>) -> Self {
        Self { i18n }
    }

    /// Load the bundle file, or use an empty bundle when none is configured.
    pub fn load(i18n: Option<&Path>) -> io::Result<Self> {
        match i18n {
            Some(path) => Ok(Self::new(fs::read(path)?)),
            None => Ok(Self::default()),
        }
    }
}

impl Backend for BundleBackend {
    fn graphs(&self, _search: &str, _days: u32) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::NoCollection)
    }

    fn i18n_resources(&self) -> Vec<u8> {
        self.i18n.clone()
    }
}
