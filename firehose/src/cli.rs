//! Command line flags of the host, resolved into a [`FirehoseConfig`].

use std::path::PathBuf;

use clap::{ArgAction, Args, ValueHint};
use log::info;

use crate::config::{ConfigError, FirehoseConfig, GenesisSource};
use crate::genesis::Genesis;

const HELP_HEADING: &str = "Firehose options";

/// Firehose flags, to be flattened into the host's command line.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct CliFirehoseConfig {
    /// Activate Firehose instrumentation.
    #[arg(long, env = "FIREHOSE_ENABLED", help_heading = HELP_HEADING, default_value_t = false)]
    firehose_enabled: bool,
    /// Activate Firehose sync output instrumentation.
    #[arg(long, env = "FIREHOSE_SYNC_INSTRUMENTATION", help_heading = HELP_HEADING, default_value_t = true, action = ArgAction::Set)]
    firehose_sync_instrumentation: bool,
    /// Keep mining code running while Firehose is active. Requires speculative
    /// execution on the local miner node.
    #[arg(long, env = "FIREHOSE_MINING_ENABLED", help_heading = HELP_HEADING, default_value_t = false)]
    firehose_mining_enabled: bool,
    /// Activate Firehose block progress output instrumentation.
    #[arg(long, env = "FIREHOSE_BLOCK_PROGRESS", help_heading = HELP_HEADING, default_value_t = false)]
    firehose_block_progress: bool,
    /// Genesis file used when the host does not provide its own genesis.
    #[arg(long, env = "FIREHOSE_GENESIS_FILE", help_heading = HELP_HEADING, value_hint = ValueHint::FilePath)]
    firehose_genesis_file: Option<PathBuf>,
}

impl CliFirehoseConfig {
    /// Resolves the configuration. A genesis provided by the host wins over
    /// the genesis file flag.
    pub fn into_config(self, host_genesis: Option<Genesis>) -> Result<FirehoseConfig, ConfigError> {
        let (genesis, genesis_source) = match (host_genesis, self.firehose_genesis_file) {
            (Some(genesis), _) => (Some(genesis), GenesisSource::Host),
            (None, Some(path)) => (Some(Genesis::from_path(&path)?), GenesisSource::File(path)),
            (None, None) => (None, GenesisSource::Unset),
        };

        let config = FirehoseConfig {
            enabled: self.firehose_enabled,
            sync_instrumentation_enabled: self.firehose_sync_instrumentation,
            mining_enabled: self.firehose_mining_enabled,
            block_progress_enabled: self.firehose_block_progress,
            genesis,
            genesis_source,
        };

        info!(
            "Firehose initialized: enabled={} sync_instrumentation_enabled={} mining_enabled={} \
             block_progress_enabled={} genesis_provenance={} protocol_version={}",
            config.enabled,
            config.sync_instrumentation_enabled,
            config.mining_enabled,
            config.block_progress_enabled,
            config.genesis_source,
            crate::PROTOCOL_VERSION,
        );

        Ok(config)
    }
}
