//! The trace [`Context`]: a block, transaction and call scope machine that
//! turns the host's recording calls into protocol lines.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use ethereum_types::{Address, H256, U256};
use firehose_common::{AccessListItem, Block, Header, Log, Receipt, Transaction, TxType};
use log::{debug, error};
use parking_lot::Mutex;
use serde::Serialize;

use crate::encode::{self, Addr, BigInt, Bool, Hash, Hex, Json, OptAddr, OptBigInt, OptHash, Topics};
use crate::error::{TraceError, TraceResult};
use crate::ordinal::Ordinal;
use crate::printer::{BufferPrinter, DirectPrinter, Printer, Sink, LINE_PREFIX};
use crate::reasons::{BalanceChangeReason, CallType, GasChangeReason};
use crate::stack::CallStack;

/// Formats one line out of a tag and its fields, then hands it to the printer.
///
/// Every field must be bound before the macro is invoked when it needs a
/// mutable access to the context (ordinals, call indices).
macro_rules! emit {
    ($ctx:expr, $tag:expr $(, $field:expr)* $(,)?) => {
        $ctx.print($tag, &[$(&$field as &dyn fmt::Display),*])
    };
}

/// Which scopes are currently open.
///
/// A transaction may be open without a block for speculative contexts, which
/// only ever record a single transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Scope {
    #[default]
    Idle,
    Block,
    Transaction,
    BlockTransaction,
}

impl Scope {
    const fn in_block(self) -> bool {
        matches!(self, Self::Block | Self::BlockTransaction)
    }

    const fn in_transaction(self) -> bool {
        matches!(self, Self::Transaction | Self::BlockTransaction)
    }

    const fn with_block(self, open: bool) -> Self {
        Self::from_flags(open, self.in_transaction())
    }

    const fn with_transaction(self, open: bool) -> Self {
        Self::from_flags(self.in_block(), open)
    }

    const fn from_flags(block: bool, transaction: bool) -> Self {
        match (block, transaction) {
            (false, false) => Self::Idle,
            (true, false) => Self::Block,
            (false, true) => Self::Transaction,
            (true, true) => Self::BlockTransaction,
        }
    }
}

/// Transaction fields as printed in `BEGIN_APPLY_TRX`.
///
/// Used directly by hosts that synthesize system transactions which have no
/// signed envelope, and by [`Context::start_transaction`] for regular ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawTransaction<'a> {
    /// Transaction hash.
    pub hash: H256,
    /// `None` for contract creation.
    pub to: Option<&'a Address>,
    /// Wei transferred.
    pub value: U256,
    /// Signature `v`.
    pub v: U256,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas price actually paid.
    pub gas_price: U256,
    /// Sender nonce.
    pub nonce: u64,
    /// Call data or init code.
    pub data: &'a [u8],
    /// Access list, empty for legacy transactions.
    pub access_list: &'a [AccessListItem],
    /// Fee cap, `None` before London or for older envelopes.
    pub max_fee_per_gas: Option<U256>,
    /// Tip cap, `None` before London or for older envelopes.
    pub max_priority_fee_per_gas: Option<U256>,
    /// Envelope type.
    pub tx_type: TxType,
    /// Position of the transaction in its block.
    pub index: u64,
}

/// Block scoped recording state.
///
/// One context is one recording lineage: either the long lived sync context
/// that follows the chain head and writes straight to the shared sink, or a
/// speculative context that buffers the trace of a single transaction until
/// it is flushed or dropped. A context without a printer is the no-op
/// context and ignores every call.
///
/// Contexts are not meant to be shared: a single owner drives one at a time.
/// The only cross-thread point is [`Context::flush_transaction`] (or a
/// [`Flusher`]), which serializes merges into the shared sink.
#[derive(Debug)]
pub struct Context {
    printer: Option<Box<dyn Printer>>,
    flush_lock: Arc<Mutex<()>>,
    line: String,

    seen_block: bool,
    scope: Scope,

    block_log_index: u64,
    ordinal: Ordinal,
    cumulative_gas_used: u64,
    last_transaction_index: Option<u64>,

    active_call_index: u64,
    next_call_index: u64,
    call_stack: CallStack,
}

impl Context {
    /// A recording context printing through `printer`.
    pub fn new(printer: Box<dyn Printer>) -> Self {
        Self::with_printer(Some(printer))
    }

    /// A context that records nothing.
    pub fn noop() -> Self {
        Self::with_printer(None)
    }

    /// A context writing each line straight to `sink`.
    pub fn direct(sink: Sink) -> Self {
        Self::new(Box::new(DirectPrinter::new(sink)))
    }

    /// A context accumulating its lines in memory, see
    /// [`Context::flush_transaction`].
    pub fn buffered(capacity: usize) -> Self {
        Self::new(Box::new(BufferPrinter::with_capacity(capacity)))
    }

    fn with_printer(printer: Option<Box<dyn Printer>>) -> Self {
        Self {
            printer,
            flush_lock: Arc::default(),
            line: String::with_capacity(256),
            seen_block: false,
            scope: Scope::Idle,
            block_log_index: 0,
            ordinal: Ordinal::default(),
            cumulative_gas_used: 0,
            last_transaction_index: None,
            active_call_index: 0,
            next_call_index: 0,
            call_stack: CallStack::default(),
        }
    }

    /// Whether this context records at all.
    pub fn enabled(&self) -> bool {
        self.printer.is_some()
    }

    /// Whether a block is open.
    pub const fn in_block(&self) -> bool {
        self.scope.in_block()
    }

    /// Whether a transaction is open.
    pub const fn in_transaction(&self) -> bool {
        self.scope.in_transaction()
    }

    /// Whether a block was ever started on this context.
    pub const fn seen_block(&self) -> bool {
        self.seen_block
    }

    /// Number of frames on the call index stack, the transaction root
    /// included.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Index of the innermost open call, `0` for the transaction root.
    pub const fn active_call_index(&self) -> u64 {
        self.active_call_index
    }

    /// The last ordinal stamped in the current block.
    pub const fn ordinal(&self) -> u64 {
        self.ordinal.current()
    }

    /// Cumulative gas used reported by the last receipt of the current block.
    pub const fn cumulative_gas_used(&self) -> u64 {
        self.cumulative_gas_used
    }

    /// Index of the last transaction started in the current block.
    pub const fn last_transaction_index(&self) -> Option<u64> {
        self.last_transaction_index
    }

    /// The lines accumulated so far by a buffering context.
    pub fn firehose_log(&self) -> Option<&[u8]> {
        self.printer.as_ref().and_then(|printer| printer.buffer())
    }

    /// A handle to merge buffered traces into this context's sink from any
    /// thread. `None` unless this context writes to a [`Sink`].
    pub fn flusher(&self) -> Option<Flusher> {
        let sink = self.printer.as_ref()?.sink()?;
        Some(Flusher {
            lock: self.flush_lock.clone(),
            sink: sink.clone(),
        })
    }

    fn print(&mut self, tag: &str, fields: &[&dyn fmt::Display]) -> TraceResult {
        let Some(printer) = self.printer.as_mut() else {
            return Ok(());
        };

        self.line.clear();
        self.line.push_str(LINE_PREFIX);
        self.line.push_str(tag);
        for field in fields {
            self.line.push(' ');
            write!(self.line, "{}", field)
                .map_err(|_| TraceError::Encoding(tag.to_owned()))?;
        }
        self.line.push('\n');

        printer.write(self.line.as_bytes());
        Ok(())
    }

    fn violation(&self, err: TraceError) -> TraceError {
        error!(
            "Firehose scope violation: {} (in_block={}, in_transaction={}, call_depth={})",
            err,
            self.in_block(),
            self.in_transaction(),
            self.call_stack.len()
        );
        err
    }

    /// Index of the active call, failing when no transaction is open.
    fn call_index(&self, op: &'static str) -> TraceResult<u64> {
        if !self.in_transaction() {
            return Err(self.violation(TraceError::NoOpenTransaction(op)));
        }
        Ok(self.active_call_index)
    }

    fn reset_block(&mut self) {
        self.scope = self.scope.with_block(false);
        self.block_log_index = 0;
        self.ordinal.reset();
        self.cumulative_gas_used = 0;
        self.last_transaction_index = None;
    }

    fn reset_transaction(&mut self) {
        self.scope = self.scope.with_transaction(false);
        self.next_call_index = 0;
        self.active_call_index = 0;
        self.call_stack.clear();
    }

    /// Resets block and transaction scope so the context can be reused for an
    /// unrelated recording.
    pub fn reset(&mut self) {
        self.reset_block();
        self.reset_transaction();
    }

    /// Emits the `INIT` banner.
    pub fn init_version(
        &mut self,
        node_version: &str,
        protocol_version: &str,
        variant: &str,
    ) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        emit!(self, "INIT", protocol_version, variant, node_version)
    }

    // Block

    /// Records the chain's initial state as a block holding a single synthetic
    /// transaction from the zero address. `record_alloc` is called inside that
    /// transaction to record the allocated accounts.
    pub fn record_genesis_block<F>(&mut self, block: &Block, record_alloc: F) -> TraceResult
    where
        F: FnOnce(&mut Self) -> TraceResult,
    {
        if !self.enabled() {
            return Ok(());
        }
        if self.in_block() {
            return Err(self.violation(TraceError::GenesisInBlock));
        }
        if self.in_transaction() {
            return Err(self.violation(TraceError::GenesisInTransaction));
        }

        let zero = Address::zero();

        self.start_block(block)?;
        self.start_transaction_raw(RawTransaction {
            to: Some(&zero),
            ..Default::default()
        })?;
        self.record_trx_from(zero)?;
        record_alloc(self)?;
        self.end_transaction(&Receipt {
            post_state: block.state_root().as_bytes().to_vec(),
            ..Default::default()
        })?;
        self.finalize_block(block)?;
        self.end_block(block, block.difficulty())
    }

    /// Opens the block scope and emits `BEGIN_BLOCK`.
    pub fn start_block(&mut self, block: &Block) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        if self.in_block() {
            return Err(self.violation(TraceError::BlockAlreadyOpen));
        }

        self.reset_block();
        self.scope = self.scope.with_block(true);
        self.seen_block = true;

        emit!(self, "BEGIN_BLOCK", block.number())
    }

    /// Allowed outside of a block scope, for block progress only
    /// instrumentation.
    pub fn finalize_block(&mut self, block: &Block) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        emit!(self, "FINALIZE_BLOCK", block.number())
    }

    /// Emits `END_BLOCK` with the header, uncles and total difficulty, then
    /// leaves the block scope.
    pub fn end_block(&mut self, block: &Block, total_difficulty: U256) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        if !self.in_block() {
            return Err(self.violation(TraceError::NoOpenBlock));
        }

        let payload = EndBlockPayload {
            header: HeaderView::new(&block.header),
            total_difficulty,
            uncles: block.uncles.iter().map(HeaderView::new).collect(),
        };
        let size = block.size() as u64;

        emit!(self, "END_BLOCK", block.number(), size, Json(&payload))?;
        self.exit_block()
    }

    /// Leaves the block scope, closing any transaction left open by an
    /// abnormal end of block.
    fn exit_block(&mut self) -> TraceResult {
        if !self.in_block() {
            return Err(self.violation(TraceError::NoOpenBlock));
        }
        self.reset_block();
        self.reset_transaction();
        Ok(())
    }

    /// Tells the reader to discard everything recorded for `block`.
    ///
    /// Tolerates being called while no block is open, in which case only the
    /// `CANCEL_BLOCK` line is emitted.
    pub fn cancel_block(&mut self, block: &Block, reason: &dyn fmt::Display) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        if self.in_block() {
            self.exit_block()?;
        }
        emit!(self, "CANCEL_BLOCK", block.number(), reason)
    }

    // Transaction

    /// Opens the transaction scope for a signed transaction. `base_fee` is
    /// the block's base fee once London is active.
    pub fn start_transaction(
        &mut self,
        tx: &Transaction,
        index: u64,
        base_fee: Option<U256>,
    ) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }

        let (max_fee_per_gas, max_priority_fee_per_gas) = match tx.tx_type {
            TxType::DynamicFee => (tx.max_fee_per_gas, tx.max_priority_fee_per_gas),
            TxType::Legacy | TxType::AccessList => (None, None),
        };

        self.start_transaction_raw(RawTransaction {
            hash: tx.hash(),
            to: tx.to.as_ref(),
            value: tx.value,
            v: tx.v,
            r: tx.r,
            s: tx.s,
            gas_limit: tx.gas,
            gas_price: tx.effective_gas_price(base_fee),
            nonce: tx.nonce,
            data: &tx.data,
            access_list: &tx.access_list.0,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            tx_type: tx.tx_type,
            index,
        })
    }

    /// Opens the transaction scope and emits `BEGIN_APPLY_TRX` with the
    /// fields of `tx` as given.
    pub fn start_transaction_raw(&mut self, tx: RawTransaction<'_>) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        if self.in_transaction() {
            return Err(self.violation(TraceError::TransactionAlreadyOpen));
        }

        self.scope = self.scope.with_transaction(true);
        self.next_call_index = 0;
        self.active_call_index = 0;
        self.call_stack.clear();
        self.call_stack.push(0);
        self.last_transaction_index = Some(tx.index);

        let access_list = encode::access_list(tx.access_list);
        let ordinal = self.ordinal.next();

        emit!(
            self,
            "BEGIN_APPLY_TRX",
            Hash(&tx.hash),
            OptAddr(tx.to),
            BigInt(&tx.value),
            BigInt(&tx.v),
            BigInt(&tx.r),
            BigInt(&tx.s),
            tx.gas_limit,
            BigInt(&tx.gas_price),
            tx.nonce,
            Hex(tx.data),
            Hex(&access_list),
            OptBigInt(tx.max_fee_per_gas.as_ref()),
            OptBigInt(tx.max_priority_fee_per_gas.as_ref()),
            tx.tx_type as u8,
            ordinal,
            tx.index,
        )
    }

    /// Emits `TRX_FROM` with the transaction sender.
    pub fn record_trx_from(&mut self, from: Address) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        if !self.in_transaction() {
            return Err(self.violation(TraceError::NoOpenTransaction("record_trx_from")));
        }
        emit!(self, "TRX_FROM", Addr(&from))
    }

    /// Emits `END_APPLY_TRX` from `receipt`, then leaves the transaction
    /// scope.
    pub fn end_transaction(&mut self, receipt: &Receipt) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        if !self.in_transaction() {
            return Err(self.violation(TraceError::NoOpenTransaction("end_transaction")));
        }

        let logs = receipt.logs.iter().map(LogItem::new).collect::<Vec<_>>();
        let ordinal = self.ordinal.next();

        emit!(
            self,
            "END_APPLY_TRX",
            receipt.gas_used,
            Hex(&receipt.post_state),
            receipt.cumulative_gas_used,
            Hex(receipt.logs_bloom.as_bytes()),
            ordinal,
            Json(&logs),
        )?;

        self.cumulative_gas_used = receipt.cumulative_gas_used;
        self.reset_transaction();
        Ok(())
    }

    /// Copies the lines buffered by `other` into this context's output, then
    /// resets `other` for reuse.
    ///
    /// Concurrent flushes into the same sink never interleave, but nothing
    /// orders them: callers flush in the order transactions must appear.
    pub fn flush_transaction(&mut self, other: &mut Context) {
        if !self.enabled() {
            return;
        }

        if let (Some(printer), Some(bytes)) = (self.printer.as_mut(), other.firehose_log()) {
            let _guard = self.flush_lock.lock();
            debug!("Flushing {} bytes of buffered Firehose trace", bytes.len());
            printer.write(bytes);
        }

        other.discard();
    }

    /// Drops whatever `self` buffered and resets it.
    pub fn discard(&mut self) {
        if let Some(printer) = self.printer.as_mut() {
            printer.clear();
        }
        self.reset();
    }

    // Call

    /// Opens a call with a fresh index and emits `EVM_RUN_CALL`.
    pub fn start_call(&mut self, call_type: CallType) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        self.call_index("start_call")?;

        self.next_call_index += 1;
        self.active_call_index = self.next_call_index;
        self.call_stack.push(self.active_call_index);

        let index = self.active_call_index;
        let ordinal = self.ordinal.next();
        emit!(self, "EVM_RUN_CALL", call_type, index, ordinal)
    }

    /// Emits `EVM_PARAM` for the active call.
    pub fn record_call_params(
        &mut self,
        call_type: CallType,
        caller: Address,
        callee: Address,
        value: U256,
        gas_limit: u64,
        input: &[u8],
    ) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_call_params")?;
        emit!(
            self,
            "EVM_PARAM",
            call_type,
            index,
            Addr(&caller),
            Addr(&callee),
            BigInt(&value),
            gas_limit,
            Hex(input),
        )
    }

    /// The callee of the active call has no code.
    pub fn record_call_without_code(&mut self) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_call_without_code")?;
        emit!(self, "ACCOUNT_WITHOUT_CODE", index)
    }

    /// Emits `EVM_CALL_FAILED` with the failure `reason`.
    pub fn record_call_failed(&mut self, gas_left: u64, reason: &str) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_call_failed")?;
        emit!(self, "EVM_CALL_FAILED", index, gas_left, reason)
    }

    /// Emits `EVM_REVERTED`.
    pub fn record_call_reverted(&mut self) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_call_reverted")?;
        emit!(self, "EVM_REVERTED", index)
    }

    /// Fails unless a call other than the transaction root is open.
    fn ensure_call_open(&self, op: &'static str) -> TraceResult {
        self.call_index(op)?;
        if self.call_stack.len() <= 1 {
            return Err(self.violation(TraceError::CallStackUnderflow));
        }
        Ok(())
    }

    /// Pops the active call and returns its index.
    fn close_call(&mut self) -> TraceResult<u64> {
        let closed = self.call_stack.pop()?;
        self.active_call_index = self.call_stack.peek()?;
        Ok(closed)
    }

    /// Closes the active call and emits `EVM_END_CALL`.
    pub fn end_call(&mut self, gas_left: u64, return_value: &[u8]) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        self.ensure_call_open("end_call")?;

        let index = self.close_call()?;
        let ordinal = self.ordinal.next();
        emit!(self, "EVM_END_CALL", index, gas_left, Hex(return_value), ordinal)
    }

    /// Closes the active call on a failure path.
    ///
    /// Emits `EVM_CALL_FAILED`, then `EVM_REVERTED` when `reverted`, or a
    /// `GAS_CHANGE` consuming all of `gas_left` otherwise, and finally
    /// `EVM_END_CALL`. In the second case the end of call reports no gas
    /// left. A reverted call keeps its `gas_left`.
    pub fn end_failed_call(&mut self, gas_left: u64, reverted: bool, reason: &str) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        self.ensure_call_open("end_failed_call")?;

        self.record_call_failed(gas_left, reason)?;

        let mut gas_left = gas_left;
        if reverted {
            self.record_call_reverted()?;
        } else {
            self.record_gas_consume(gas_left, gas_left, GasChangeReason::FailedExecution)?;
            gas_left = 0;
        }

        let index = self.close_call()?;
        let ordinal = self.ordinal.next();
        emit!(self, "EVM_END_CALL", index, gas_left, Hex(&[]), ordinal)
    }

    // In call

    /// Emits `EVM_KECCAK`, a preimage computed by the active call.
    pub fn record_keccak(&mut self, hash_of_data: H256, data: &[u8]) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_keccak")?;
        emit!(self, "EVM_KECCAK", index, Hash(&hash_of_data), Hex(data))
    }

    /// Nothing is emitted for a zero refund.
    pub fn record_gas_refund(&mut self, gas_old: u64, gas_refund: u64) -> TraceResult {
        if !self.enabled() || gas_refund == 0 {
            return Ok(());
        }
        let index = self.call_index("record_gas_refund")?;
        let ordinal = self.ordinal.next();
        emit!(
            self,
            "GAS_CHANGE",
            index,
            gas_old,
            gas_old.saturating_add(gas_refund),
            GasChangeReason::RefundAfterExecution,
            ordinal,
        )
    }

    /// Nothing is emitted when no gas is consumed or the reason is
    /// [`GasChangeReason::Ignored`].
    pub fn record_gas_consume(
        &mut self,
        gas_old: u64,
        gas_consumed: u64,
        reason: GasChangeReason,
    ) -> TraceResult {
        if !self.enabled() || gas_consumed == 0 || reason == GasChangeReason::Ignored {
            return Ok(());
        }
        let index = self.call_index("record_gas_consume")?;
        let ordinal = self.ordinal.next();
        emit!(
            self,
            "GAS_CHANGE",
            index,
            gas_old,
            gas_old.saturating_sub(gas_consumed),
            reason,
            ordinal,
        )
    }

    /// Emits `STORAGE_CHANGE`.
    pub fn record_storage_change(
        &mut self,
        address: Address,
        key: H256,
        old_value: H256,
        new_value: H256,
    ) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_storage_change")?;
        let ordinal = self.ordinal.next();
        emit!(
            self,
            "STORAGE_CHANGE",
            index,
            Addr(&address),
            Hash(&key),
            Hash(&old_value),
            Hash(&new_value),
            ordinal,
        )
    }

    /// Nothing is emitted for [`BalanceChangeReason::Ignored`].
    pub fn record_balance_change(
        &mut self,
        address: Address,
        old_balance: U256,
        new_balance: U256,
        reason: BalanceChangeReason,
    ) -> TraceResult {
        if !self.enabled() || reason == BalanceChangeReason::Ignored {
            return Ok(());
        }
        let index = self.call_index("record_balance_change")?;
        let ordinal = self.ordinal.next();
        emit!(
            self,
            "BALANCE_CHANGE",
            index,
            Addr(&address),
            BigInt(&old_balance),
            BigInt(&new_balance),
            reason,
            ordinal,
        )
    }

    /// Emits `ADD_LOG`, numbered with the block wide log index.
    pub fn record_log(&mut self, log: &Log) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_log")?;

        let log_index = self.block_log_index;
        self.block_log_index += 1;
        let ordinal = self.ordinal.next();

        emit!(
            self,
            "ADD_LOG",
            index,
            log_index,
            Addr(&log.address),
            Topics(&log.topics),
            Hex(&log.data),
            ordinal,
        )
    }

    /// Records a self destruct. The host has already zeroed the account's
    /// balance at this point, so a non-zero `balance_before` is withdrawn
    /// with an explicit `BALANCE_CHANGE`.
    pub fn record_suicide(
        &mut self,
        address: Address,
        suicided: bool,
        balance_before: U256,
    ) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_suicide")?;
        emit!(
            self,
            "SUICIDE_CHANGE",
            index,
            Addr(&address),
            Bool(suicided),
            BigInt(&balance_before),
        )?;

        if !balance_before.is_zero() {
            self.record_balance_change(
                address,
                balance_before,
                U256::zero(),
                BalanceChangeReason::SuicideWithdraw,
            )?;
        }
        Ok(())
    }

    /// Emits `CREATED_ACCOUNT`.
    pub fn record_new_account(&mut self, address: Address) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_new_account")?;
        let ordinal = self.ordinal.next();
        emit!(self, "CREATED_ACCOUNT", index, Addr(&address), ordinal)
    }

    /// `old_code_hash` is `None` for accounts that had no code.
    pub fn record_code_change(
        &mut self,
        address: Address,
        old_code_hash: Option<H256>,
        old_code: &[u8],
        new_code_hash: H256,
        new_code: &[u8],
    ) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_code_change")?;
        let ordinal = self.ordinal.next();
        emit!(
            self,
            "CODE_CHANGE",
            index,
            Addr(&address),
            OptHash(old_code_hash.as_ref()),
            Hex(old_code),
            Hash(&new_code_hash),
            Hex(new_code),
            ordinal,
        )
    }

    /// Emits `NONCE_CHANGE`.
    pub fn record_nonce_change(
        &mut self,
        address: Address,
        old_nonce: u64,
        new_nonce: u64,
    ) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }
        let index = self.call_index("record_nonce_change")?;
        let ordinal = self.ordinal.next();
        emit!(
            self,
            "NONCE_CHANGE",
            index,
            Addr(&address),
            old_nonce,
            new_nonce,
            ordinal,
        )
    }

    // Mempool

    /// Records a transaction pool event, tagged with `event_type`. Legal in
    /// any scope. The sender is printed as `.` when it cannot be recovered.
    pub fn record_trx_pool(&mut self, event_type: &str, tx: &Transaction) -> TraceResult {
        if !self.enabled() {
            return Ok(());
        }

        let hash = tx.hash();
        let from = match tx.sender() {
            Ok(from) => Some(from),
            Err(err) => {
                debug!("Unable to recover sender of pool transaction {:?}: {}", hash, err);
                None
            }
        };

        emit!(
            self,
            event_type,
            Hash(&hash),
            OptAddr(from.as_ref()),
            OptAddr(tx.to.as_ref()),
            BigInt(&tx.value),
            BigInt(&tx.v),
            BigInt(&tx.r),
            BigInt(&tx.s),
            tx.gas,
            BigInt(&tx.gas_price),
            tx.nonce,
            Hex(&tx.data),
        )
    }
}

/// Cloneable handle onto a context's sink and flush lock, so that
/// speculative executors on other threads can commit their buffers.
#[derive(Clone, Debug)]
pub struct Flusher {
    lock: Arc<Mutex<()>>,
    sink: Sink,
}

impl Flusher {
    /// Same as [`Context::flush_transaction`] on the context this handle was
    /// taken from.
    pub fn flush_transaction(&self, other: &mut Context) {
        if let Some(bytes) = other.firehose_log() {
            let _guard = self.lock.lock();
            debug!("Flushing {} bytes of buffered Firehose trace", bytes.len());
            if let Err(err) = self.sink.write_all(bytes) {
                error!("Firehose sink rejected a flushed trace: {}", err);
            }
        }
        other.discard();
    }
}

/// A header as geth serializes it, hash included.
#[derive(Serialize)]
struct HeaderView<'a> {
    #[serde(flatten)]
    header: &'a Header,
    hash: H256,
}

impl<'a> HeaderView<'a> {
    fn new(header: &'a Header) -> Self {
        Self {
            header,
            hash: header.hash(),
        }
    }
}

#[derive(Serialize)]
struct EndBlockPayload<'a> {
    header: HeaderView<'a>,
    #[serde(rename = "totalDifficulty")]
    total_difficulty: U256,
    uncles: Vec<HeaderView<'a>>,
}

#[derive(Serialize)]
struct LogItem<'a> {
    address: Address,
    #[serde(with = "firehose_common::serde_utils::hex_bytes")]
    data: &'a [u8],
    topics: &'a [H256],
}

impl<'a> LogItem<'a> {
    fn new(log: &'a Log) -> Self {
        Self {
            address: log.address,
            data: &log.data,
            topics: &log.topics,
        }
    }
}
