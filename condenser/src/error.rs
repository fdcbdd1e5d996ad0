use revm::primitives::{Address, U256};

use crate::ledger::Amount;

/// Misuse of the account store. Checkpoints are strictly LIFO and balances never wrap.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StateError {
    #[error("checkpoint {got} released while checkpoint {expected} is innermost")]
    CheckpointOrder { expected: usize, got: usize },
    #[error("no checkpoint is open")]
    NoCheckpoint,
    #[error("insufficient balance in {address}: has {balance}, needs {value}")]
    InsufficientBalance {
        address: Address,
        balance: U256,
        value: U256,
    },
    #[error("balance of {0} overflows")]
    BalanceOverflow(Address),
}

/// An internal-consistency failure while turning execution results into ledger transactions. Any of
/// these means value would be created or destroyed, so the whole batch must be rejected.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CondenseError {
    #[error("value {0} does not fit in a ledger amount")]
    AmountOverflow(U256),
    #[error("{address} would spend {spent} but only holds {available}")]
    BalanceUnderflow {
        address: Address,
        available: U256,
        spent: U256,
    },
    #[error("condensing transaction consumes {inputs} but creates {outputs}")]
    Conservation { inputs: Amount, outputs: Amount },
    #[error("vin of {address} holds {balance}, cannot debit {value}")]
    VinUnderflow {
        address: Address,
        balance: Amount,
        value: Amount,
    },
    #[error("vin of {address} overflows")]
    VinOverflow { address: Address },
    #[error("no vin for {0}")]
    MissingVin(Address),
    #[error("vin of {address} still holds {balance} and cannot be rebound")]
    VinNotSpent { address: Address, balance: Amount },
    #[error("contract {address} holds {balance} but its vin holds {vin}")]
    ContractBalanceMismatch {
        address: Address,
        balance: U256,
        vin: Amount,
    },
}

/// A failure which aborts a whole batch. Execution exceptions are not errors; they are reported on
/// each transaction's result.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Condense(#[from] CondenseError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("gas value {0} overflows")]
    GasOverflow(U256),
    #[error("batch uses {used} gas, more than the block limit of {limit}")]
    BlockGasLimit { used: u64, limit: u64 },
    #[error("EVM error: {0}")]
    Evm(String),
}
