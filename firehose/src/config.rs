//! Process wide toggles and the genesis they carry.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::genesis::Genesis;

/// The genesis file could not be loaded. Raised while resolving the
/// configuration, before anything is recorded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened.
    #[error("firehose open genesis file {path:?}: {source}")]
    Open {
        /// Path of the genesis file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The file is not a valid genesis.
    #[error("decode genesis file {path:?}: {source}")]
    Decode {
        /// Path of the genesis file.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Where the configured genesis came from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum GenesisSource {
    /// Handed over by the host, which knows its chain.
    Host,
    /// Read from the `--firehose-genesis-file` flag.
    File(PathBuf),
    /// No genesis configured.
    #[default]
    Unset,
}

impl fmt::Display for GenesisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Unset => f.write_str("unset"),
        }
    }
}

/// Process wide toggles gating whether recording calls have any effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirehoseConfig {
    /// Master switch, nothing is recorded when off.
    pub enabled: bool,
    /// Whether the sync context records the blocks followed from the network.
    pub sync_instrumentation_enabled: bool,
    /// Whether mining code runs while instrumentation is active. Requires
    /// speculative execution on the local miner node.
    pub mining_enabled: bool,
    /// Emit `FINALIZE_BLOCK` through the sync context even when sync
    /// instrumentation is off.
    pub block_progress_enabled: bool,
    /// Genesis recorded as the first block of the stream.
    pub genesis: Option<Genesis>,
    /// Where `genesis` came from.
    pub genesis_source: GenesisSource,
}

impl Default for FirehoseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sync_instrumentation_enabled: true,
            mining_enabled: false,
            block_progress_enabled: false,
            genesis: None,
            genesis_source: GenesisSource::Unset,
        }
    }
}

impl FirehoseConfig {
    /// Whether the sync context records.
    pub const fn sync_enabled(&self) -> bool {
        self.enabled && self.sync_instrumentation_enabled
    }
}
