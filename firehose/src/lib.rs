//! Firehose execution tracing.
//!
//! This crate turns the execution of blocks by an EVM host into a strictly
//! ordered stream of lines, one per event, that an external console reader
//! consumes to rebuild every state change and call of the chain:
//!
//! ```text
//! FIRE BEGIN_BLOCK 1
//! FIRE BEGIN_APPLY_TRX aaaa…aaaa . . 1b 01 02 21000 . 0 . 00 . . 0 1 0
//! FIRE TRX_FROM 0000…0001
//! FIRE EVM_RUN_CALL CALL 1 2
//! …
//! ```
//!
//! The host drives a [`Context`] through nested scopes, block then
//! transaction then call, and calls one of its `record_*` methods at each
//! state mutation. Contexts come from a [`Registry`]:
//!
//! - the sync context writes each line straight to a shared [`Sink`] while
//!   the host follows the chain head,
//! - the no-op context is handed out when recording is disabled,
//! - speculative contexts buffer the lines of a transaction executed ahead of
//!   time, to be merged into the sink with [`Context::flush_transaction`] (or
//!   a [`Flusher`] from another thread) or dropped.
//!
//! Calling scopes out of order yields a [`TraceError`] before anything is
//! written. Such an error means the host and the tracer no longer agree on
//! where execution stands: hosts must treat it as fatal.

#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
mod context;
pub mod encode;
mod error;
pub mod genesis;
mod ordinal;
pub mod printer;
pub mod reasons;
mod registry;
mod stack;

pub use cli::CliFirehoseConfig;
pub use config::{ConfigError, FirehoseConfig, GenesisSource};
pub use context::{Context, Flusher, RawTransaction};
pub use error::{TraceError, TraceResult};
pub use genesis::{Genesis, GenesisAccount};
pub use ordinal::Ordinal;
pub use printer::{BufferPrinter, DirectPrinter, Printer, Sink};
pub use reasons::{BalanceChangeReason, CallType, GasChangeReason};
pub use registry::Registry;
pub use stack::CallStack;

/// Version of the line protocol, printed in the `INIT` banner.
pub const PROTOCOL_VERSION: &str = "2.0";
