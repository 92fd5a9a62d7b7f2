use std::io;

use ethereum_types::H256;
use firehose_common::Block;
use log::debug;

use crate::config::FirehoseConfig;
use crate::context::{Context, Flusher};
use crate::error::TraceResult;
use crate::printer::Sink;

/// Owns the process wide contexts and hands them out according to the
/// configured toggles.
///
/// The host builds one registry at start up and keeps it for the lifetime of
/// the process. The sync context it owns follows the chain head and must only
/// be driven by the syncing thread.
#[derive(Debug)]
pub struct Registry {
    config: FirehoseConfig,
    sink: Sink,
    sync: Context,
    noop: Context,
}

impl Registry {
    /// A registry whose sync context writes to `sink`.
    pub fn new(config: FirehoseConfig, sink: Sink) -> Self {
        Self {
            config,
            sync: Context::direct(sink.clone()),
            sink,
            noop: Context::noop(),
        }
    }

    /// A registry whose sync context writes to the process' standard output.
    pub fn stdout(config: FirehoseConfig) -> Self {
        Self::new(config, Sink::stdout())
    }

    /// The toggles this registry was built with.
    pub const fn config(&self) -> &FirehoseConfig {
        &self.config
    }

    /// The sync context when Firehose and sync instrumentation are both
    /// enabled, the no-op context otherwise.
    pub fn maybe_sync_context(&mut self) -> &mut Context {
        if self.config.sync_enabled() {
            &mut self.sync
        } else {
            &mut self.noop
        }
    }

    /// The sync context regardless of the toggles. Only for the few code
    /// paths that must write even when instrumentation is off, see
    /// [`Registry::finalize_block`].
    pub fn sync_context(&mut self) -> &mut Context {
        &mut self.sync
    }

    /// The context that ignores every call.
    pub fn noop_context(&mut self) -> &mut Context {
        &mut self.noop
    }

    /// A fresh buffering context for speculative execution, or a no-op one
    /// when Firehose is disabled.
    pub fn speculative_context(&self, capacity: usize) -> Context {
        if self.config.enabled {
            Context::buffered(capacity)
        } else {
            Context::noop()
        }
    }

    /// Commits the trace buffered by a speculative context through
    /// [`Registry::maybe_sync_context`]. Nothing reaches the sink unless
    /// sync instrumentation records, in which case `other` is left as is.
    pub fn flush_transaction(&mut self, other: &mut Context) {
        self.maybe_sync_context().flush_transaction(other);
    }

    /// Handle used to commit speculative contexts into the sync sink from
    /// other threads. `None` unless sync instrumentation records.
    pub fn flusher(&self) -> Option<Flusher> {
        if !self.config.sync_enabled() {
            return None;
        }
        self.sync.flusher()
    }

    /// Emits `FINALIZE_BLOCK` through the sync context when it records, or
    /// when only block progress is enabled.
    pub fn finalize_block(&mut self, block: &Block) -> TraceResult {
        if self.config.sync_enabled() || self.config.block_progress_enabled {
            self.sync.finalize_block(block)?;
        }
        Ok(())
    }

    /// Records the configured genesis as the first block of the stream.
    /// `state_root` is the root of the trie built from the genesis
    /// allocation.
    pub fn record_genesis(&mut self, state_root: H256) -> TraceResult {
        if !self.config.sync_enabled() {
            return Ok(());
        }
        let Some(genesis) = &self.config.genesis else {
            debug!("No genesis configured, not recording genesis block");
            return Ok(());
        };

        let block = genesis.to_block(state_root);
        self.sync
            .record_genesis_block(&block, |ctx| ctx.record_genesis_alloc(&genesis.alloc))
    }

    /// Flushes the shared sink.
    pub fn shutdown(self) -> io::Result<()> {
        debug!("Shutting down Firehose, flushing sink");
        self.sink.flush()
    }
}
