use thiserror::Error;

/// Result of a recording operation.
pub type TraceResult<T = ()> = Result<T, TraceError>;

/// A scope-discipline violation.
///
/// Any of these means the host's control flow and the tracer have
/// desynchronized. The offending operation is aborted before a single byte
/// is produced, but the trace can no longer be trusted: hosts are expected to
/// treat every `TraceError` as fatal and stop the process.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    /// A block was started while another one is open.
    #[error("entering a block while already in a block scope")]
    BlockAlreadyOpen,

    /// A block was ended while none is open.
    #[error("exiting a block while not already within a block scope")]
    NoOpenBlock,

    /// The genesis block was recorded while a block is open.
    #[error("trying to record genesis block while in block context")]
    GenesisInBlock,

    /// The genesis block was recorded while a transaction is open.
    #[error("trying to record genesis block while in transaction context")]
    GenesisInTransaction,

    /// A transaction was started while another one is open.
    #[error("entering a transaction while already in a transaction scope")]
    TransactionAlreadyOpen,

    /// Carries the name of the operation that required an open transaction.
    #[error("{0} should have been called within a transaction")]
    NoOpenTransaction(&'static str),

    /// The call index stack lost its transaction root frame.
    #[error("call index stack is empty")]
    EmptyCallStack,

    /// Only the transaction root frame is left on the call index stack.
    #[error("closing a call while no call is open")]
    CallStackUnderflow,

    /// Carries the tag of the line that could not be encoded.
    #[error("failed to encode a field of {0}")]
    Encoding(String),
}

impl TraceError {
    /// Whether the host should abort. Always true.
    pub const fn is_fatal(&self) -> bool {
        true
    }
}
