//! Closed sets of tags understood by the console reader.

use strum::{Display, EnumString, IntoStaticStr};

/// Why the gas left in a call changed, printed in `GAS_CHANGE` lines.
#[derive(Clone, Copy, Debug, Display, EnumString, IntoStaticStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum GasChangeReason {
    /// Gas forwarded to a `CALL`.
    Call,
    /// Gas forwarded to a `CALLCODE`.
    CallCode,
    /// Cost of `CALLDATACOPY`.
    CallDataCopy,
    /// Cost of `CODECOPY`.
    CodeCopy,
    /// Cost of storing the code of a created contract.
    CodeStorage,
    /// Gas forwarded to a `CREATE`.
    ContractCreation,
    /// Gas forwarded to a `CREATE2`.
    #[strum(serialize = "contract_creation2")]
    ContractCreation2,
    /// Gas forwarded to a `DELEGATECALL`.
    DelegateCall,
    /// Cost of a `LOG` opcode.
    EventLog,
    /// Cost of `EXTCODECOPY`.
    ExtCodeCopy,
    /// Gas burnt by a call that failed without reverting.
    FailedExecution,
    /// Intrinsic cost of the transaction.
    IntrinsicGas,
    /// Cost of a precompiled contract.
    PrecompiledContract,
    /// Refund counter applied at the end of the transaction.
    RefundAfterExecution,
    /// Cost of `RETURN`.
    Return,
    /// Cost of `RETURNDATACOPY`.
    ReturnDataCopy,
    /// Cost of `REVERT`.
    Revert,
    /// Cost of `SELFDESTRUCT`.
    SelfDestruct,
    /// Gas forwarded to a `STATICCALL`.
    StaticCall,
    /// Surcharge for a cold account or slot access.
    StateColdAccess,
    /// Gas bought by the sender.
    TxInitialBalance,
    /// Refunds granted to the sender.
    TxRefunds,
    /// Unused gas returned to the sender.
    TxLeftOverReturned,
    /// Never printed.
    Ignored,
}

/// Why an account balance changed, printed in `BALANCE_CHANGE` lines.
#[derive(Clone, Copy, Debug, Display, EnumString, IntoStaticStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum BalanceChangeReason {
    /// Reward of an uncle miner.
    RewardMineUncle,
    /// Reward of the block miner.
    RewardMineBlock,
    /// Ether moved into the DAO refund contract.
    DaoRefundContract,
    /// Ether drained from a DAO account.
    DaoAdjustBalance,
    /// Value transfer of a call.
    Transfer,
    /// Allocation of the genesis block.
    GenesisBalance,
    /// Gas paid upfront by the sender.
    GasBuy,
    /// Transaction fee paid to the miner.
    RewardTransactionFee,
    /// Unused gas refunded to the sender.
    GasRefund,
    /// Zero value touch of an account.
    TouchAccount,
    /// Balance received by the beneficiary of a self destruct.
    SuicideRefund,
    /// Balance withdrawn from a self destructed account.
    SuicideWithdraw,
    /// Balance overridden for an `eth_call`.
    CallBalanceOverride,
    /// Base fee burnt.
    Burn,
    /// Never printed.
    Ignored,
}

/// Kind of call frame, printed in `EVM_RUN_CALL` and `EVM_PARAM` lines.
#[derive(Clone, Copy, Debug, Display, EnumString, IntoStaticStr, PartialEq, Eq, Hash)]
pub enum CallType {
    /// `CALL`.
    #[strum(serialize = "CALL")]
    Call,
    /// `CALLCODE`.
    #[strum(serialize = "CALLCODE")]
    CallCode,
    /// `DELEGATECALL`.
    #[strum(serialize = "DELEGATE")]
    Delegate,
    /// `STATICCALL`.
    #[strum(serialize = "STATIC")]
    Static,
    /// `CREATE` and `CREATE2`.
    #[strum(serialize = "CREATE")]
    Create,
}
