//! Executes a single contract transaction against the account store.

use std::collections::BTreeSet;

use revm::{
    Evm, inspector_handle_register,
    primitives::{
        Address, B256, Bytes, EVMError, ExecutionResult as EvmResult, HaltReason, Log, MAX_INITCODE_SIZE,
        ResultAndState, SpecId, TxKind, U256,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    cfg::Config,
    crypto::contract_address,
    error::BatchError,
    gas,
    inspector::{Transfer, TransferInspector},
    state::{Account, AccountStore},
    transaction::{ContractTransaction, EvmGas},
};

/// Gas schedule and opcode set of the EVM. Contract gas costs on the ledger are quoted against this
/// schedule, so changing it changes what every transaction pays.
pub const SPEC_ID: SpecId = SpecId::BYZANTIUM;

/// Why a transaction did not complete. Exceptions are part of a transaction's result, not errors: the
/// transaction is still charged gas and the batch carries on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exception {
    None,
    /// The gas limit does not cover the intrinsic cost of the transaction.
    OutOfGasBase,
    OutOfGas,
    InvalidCode,
    BadInstruction,
    BadJumpDestination,
    StackUnderflow,
    OutOfStack,
    Revert,
    NotEnoughCash,
    CreateWithValue,
    CreateCollision,
    /// The call targets an address with no account.
    NonexistentTarget,
    /// The transaction was rejected before execution, for example because the sender has code.
    InvalidTransaction,
    /// Condensing the transaction's transfers would need more outputs than allowed.
    VoutLimitReached,
    Unknown,
}

impl Exception {
    pub fn is_none(self) -> bool {
        self == Exception::None
    }
}

impl From<HaltReason> for Exception {
    fn from(reason: HaltReason) -> Self {
        match reason {
            HaltReason::OutOfGas(_) => Exception::OutOfGas,
            HaltReason::OpcodeNotFound | HaltReason::InvalidEFOpcode | HaltReason::NotActivated => {
                Exception::BadInstruction
            }
            HaltReason::InvalidJump => Exception::BadJumpDestination,
            HaltReason::StackUnderflow => Exception::StackUnderflow,
            HaltReason::StackOverflow | HaltReason::CallTooDeep => Exception::OutOfStack,
            HaltReason::CreateCollision => Exception::CreateCollision,
            HaltReason::CreateContractSizeLimit
            | HaltReason::CreateContractStartingWithEF
            | HaltReason::CreateInitCodeSizeLimit => Exception::InvalidCode,
            HaltReason::OutOfFunds => Exception::NotEnoughCash,
            _ => Exception::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl From<Log> for EvmLog {
    fn from(log: Log) -> Self {
        let (topics, data) = log.data.split();
        EvmLog {
            address: log.address,
            topics,
            data,
        }
    }
}

/// The receipt of one executed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub exception: Exception,
    pub gas_used: EvmGas,
    /// Gas paid for but returned to the sender. `gas_used + gas_refunded` is the gas limit when the
    /// transaction succeeded, and nothing is returned otherwise.
    pub gas_refunded: EvmGas,
    pub output: Bytes,
    /// Address of the contract deployed by a creation.
    pub new_address: Option<Address>,
    pub created: Vec<Address>,
    pub destructed: Vec<Address>,
    pub logs: Vec<EvmLog>,
    pub state_root: B256,
}

impl ExecutionResult {
    /// A result which charges the whole gas limit and changes nothing.
    pub fn excepted(tx: &ContractTransaction, exception: Exception) -> Self {
        ExecutionResult {
            exception,
            gas_used: tx.gas_limit,
            gas_refunded: EvmGas(0),
            output: Bytes::new(),
            new_address: None,
            created: Vec::new(),
            destructed: Vec::new(),
            logs: Vec::new(),
            state_root: B256::ZERO,
        }
    }
}

/// A result together with the value transfers which produced it.
#[derive(Debug)]
pub struct Execution {
    pub result: ExecutionResult,
    /// In the order the transfers happened. Empty unless the transaction succeeded.
    pub transfers: Vec<Transfer>,
}

pub struct ByteCodeExecutor<'a> {
    config: &'a Config,
}

impl<'a> ByteCodeExecutor<'a> {
    pub fn new(config: &'a Config) -> Self {
        ByteCodeExecutor { config }
    }

    /// Runs `tx` inside a checkpoint of its own. The checkpoint is committed on success and reverted on
    /// any exception, so a failed transaction leaves no trace in the store.
    pub fn execute(
        &self,
        store: &mut AccountStore,
        tx: &ContractTransaction,
    ) -> Result<Execution, BatchError> {
        let checkpoint = store.checkpoint();
        let outcome = self.run(store, tx);
        match outcome {
            Ok(mut execution) => {
                if execution.result.exception.is_none() {
                    store.commit(checkpoint)?;
                } else {
                    store.revert(checkpoint)?;
                    execution.transfers.clear();
                    warn!(
                        origin = %tx.origin,
                        exception = ?execution.result.exception,
                        gas_used = %execution.result.gas_used,
                        "transaction excepted"
                    );
                }
                execution.result.state_root = store.state_root();
                debug!(
                    origin = %tx.origin,
                    gas_used = %execution.result.gas_used,
                    transfers = execution.transfers.len(),
                    "transaction executed"
                );
                Ok(execution)
            }
            Err(e) => {
                store.revert(checkpoint)?;
                Err(e)
            }
        }
    }

    fn excepted(tx: &ContractTransaction, exception: Exception) -> Execution {
        Execution {
            result: ExecutionResult::excepted(tx, exception),
            transfers: Vec::new(),
        }
    }

    fn run(
        &self,
        store: &mut AccountStore,
        tx: &ContractTransaction,
    ) -> Result<Execution, BatchError> {
        if tx.is_creation() && !tx.value.is_zero() {
            return Ok(Self::excepted(tx, Exception::CreateWithValue));
        }
        if let Some(receiver) = tx.receiver {
            if !store.is_alive(&receiver) {
                return Ok(Self::excepted(tx, Exception::NonexistentTarget));
            }
        }
        if tx.gas_limit < gas::intrinsic_gas(tx) {
            return Ok(Self::excepted(tx, Exception::OutOfGasBase));
        }

        store.credit(tx.sender, tx.value + tx.max_fee())?;

        // Creations run as a call into the new address with the init code installed, so the contract
        // lands at the address derived from the carrying output.
        let (target, data, surcharge, new_address) = match tx.receiver {
            Some(receiver) => (receiver, tx.data.clone(), EvmGas(0), None),
            None => {
                let address = contract_address(&tx.origin);
                if SPEC_ID.is_enabled_in(SpecId::SHANGHAI) && tx.data.len() > MAX_INITCODE_SIZE {
                    return Ok(Self::excepted(tx, Exception::InvalidCode));
                }
                if store
                    .account(&address)
                    .is_some_and(|a| a.nonce != 0 || a.is_contract())
                {
                    return Ok(Self::excepted(tx, Exception::CreateCollision));
                }
                let balance = store.balance_of(&address);
                store.put(
                    address,
                    Account {
                        balance,
                        nonce: 1,
                        code: tx.data.clone(),
                        storage: Default::default(),
                    },
                );
                (
                    address,
                    Bytes::new(),
                    gas::creation_surcharge(&tx.data),
                    Some(address),
                )
            }
        };
        let evm_gas_limit = tx.gas_limit - surcharge;

        let mut evm = Evm::builder()
            .with_ref_db(&*store)
            .with_external_context(TransferInspector::default())
            .with_spec_id(SPEC_ID)
            .modify_cfg_env(|cfg| {
                cfg.chain_id = self.config.chain_id;
                cfg.limit_contract_code_size = Some(self.config.max_code_size);
            })
            .modify_block_env(|block| {
                block.number = U256::from(self.config.block_number);
                block.timestamp = U256::from(self.config.block_timestamp);
                block.coinbase = self.config.coinbase;
                block.gas_limit = U256::from(self.config.block_gas_limit.0);
                block.basefee = U256::ZERO;
            })
            .modify_tx_env(|env| {
                env.caller = tx.sender;
                env.transact_to = TxKind::Call(target);
                env.value = tx.value;
                env.data = data;
                env.gas_limit = evm_gas_limit.0;
                env.gas_price = U256::from(tx.gas_price);
                env.gas_priority_fee = None;
                env.nonce = None;
                env.chain_id = None;
            })
            .append_handler_register(inspector_handle_register)
            .build();
        let transacted = evm.transact();
        let transfers = evm.into_context().external.into_transfers();

        let ResultAndState { result, state } = match transacted {
            Ok(r) => r,
            Err(EVMError::Transaction(e)) => {
                debug!(origin = %tx.origin, error = %e, "transaction rejected by the EVM");
                return Ok(Self::excepted(tx, Exception::InvalidTransaction));
            }
            Err(e) => return Err(BatchError::Evm(e.to_string())),
        };

        let created: Vec<_> = new_address
            .into_iter()
            .chain(
                state
                    .iter()
                    .filter(|(_, a)| a.is_created())
                    .map(|(address, _)| *address),
            )
            .collect();
        let destructed: Vec<_> = state
            .iter()
            .filter(|(_, a)| a.is_selfdestructed())
            .map(|(address, _)| *address)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (exception, gas_used, output, logs) = match result {
            EvmResult::Success {
                gas_used,
                gas_refunded,
                logs,
                output,
                ..
            } => {
                let output = output.into_data();
                let gas_used = match new_address {
                    None => EvmGas(gas_used),
                    Some(_) => {
                        match self.deposit_gas(&output, evm_gas_limit, gas_used, gas_refunded) {
                            Ok(evm_gas) => surcharge + evm_gas,
                            Err(exception) => return Ok(Self::excepted(tx, exception)),
                        }
                    }
                };
                (Exception::None, gas_used, output, logs)
            }
            EvmResult::Revert { output, .. } => {
                (Exception::Revert, tx.gas_limit, output, Vec::new())
            }
            EvmResult::Halt { reason, .. } => {
                debug!(origin = %tx.origin, ?reason, "execution halted");
                (Exception::from(reason), tx.gas_limit, Bytes::new(), Vec::new())
            }
        };

        // Gas is only ever refunded to a transaction which succeeded.
        let gas_refunded = match exception {
            Exception::None => tx.gas_limit - gas_used,
            _ => EvmGas(0),
        };
        let result = ExecutionResult {
            exception,
            gas_used,
            gas_refunded,
            output: output.clone(),
            new_address,
            created,
            destructed,
            logs: logs.into_iter().map(EvmLog::from).collect(),
            state_root: B256::ZERO,
        };
        if !exception.is_none() {
            return Ok(Execution {
                result,
                transfers: Vec::new(),
            });
        }

        store.apply(state);
        if let Some(address) = new_address {
            store.set_code(address, output);
        }
        self.retire_non_contracts(store, tx, &transfers);

        Ok(Execution { result, transfers })
    }

    /// Gas charged by the EVM for a creation once the runtime code is deposited, or the exception the
    /// deposit fails with.
    fn deposit_gas(
        &self,
        code: &Bytes,
        evm_gas_limit: EvmGas,
        gas_used: u64,
        gas_refunded: u64,
    ) -> Result<EvmGas, Exception> {
        let starts_with_ef = SPEC_ID.is_enabled_in(SpecId::LONDON) && code.first() == Some(&0xef);
        if code.len() > self.config.max_code_size || starts_with_ef {
            return Err(Exception::InvalidCode);
        }
        let spent = EvmGas(gas_used + gas_refunded);
        let deposit = gas::code_deposit_cost(code.len());
        let remaining = evm_gas_limit.checked_sub(spent).unwrap_or_default();
        if remaining < deposit {
            return Err(Exception::OutOfGas);
        }
        let refund = EvmGas(gas_refunded).min(gas::max_refund(spent + deposit));
        Ok(spent + deposit - refund)
    }

    /// Value only persists in the account model for contracts. The sender and block author are deleted
    /// outright; every other code-less account that took part in a transfer has its balance swept, since
    /// that value is paid out to it on the ledger.
    fn retire_non_contracts(
        &self,
        store: &mut AccountStore,
        tx: &ContractTransaction,
        transfers: &[Transfer],
    ) {
        store.destroy(&tx.sender);
        store.destroy(&self.config.coinbase);
        let participants: BTreeSet<Address> = transfers
            .iter()
            .flat_map(|t| [t.from, t.to])
            .collect();
        for address in participants {
            if !store.is_contract(&address) {
                store.sweep(&address);
            }
        }
    }
}
