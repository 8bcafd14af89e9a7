use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::durable::RedbKv;
use crate::error::{KvError, KvResult};
use crate::memory::InMemoryKv;
use crate::traits::KvEngine;

/// Which engine implementation to open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile in-memory engine.
    #[default]
    Memory,
    /// Single-file redb database at [`EngineConfig::path`].
    Redb,
}

/// Configuration for opening a key-value engine.
///
/// ```toml
/// backend = "redb"
/// path = "/var/lib/trove/index.redb"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: Backend,
    /// Database file; required for [`Backend::Redb`], ignored otherwise.
    pub path: Option<PathBuf>,
}

impl EngineConfig {
    /// An in-memory engine.
    pub fn memory() -> Self {
        Self::default()
    }

    /// A redb engine stored at `path`.
    pub fn redb(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Redb,
            path: Some(path.into()),
        }
    }

    /// Parse a configuration from TOML.
    pub fn from_toml_str(s: &str) -> KvResult<Self> {
        toml::from_str(s).map_err(|e| KvError::Config(e.to_string()))
    }

    /// Open the configured engine.
    pub fn open(&self) -> KvResult<Arc<dyn KvEngine>> {
        match self.backend {
            Backend::Memory => Ok(Arc::new(InMemoryKv::new())),
            Backend::Redb => {
                let path = self.path.as_deref().ok_or_else(|| {
                    KvError::Config("the redb backend requires a path".into())
                })?;
                Ok(Arc::new(RedbKv::open(path)?))
            }
        }
    }
}
