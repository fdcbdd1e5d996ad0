//! Executes an ordered batch of contract transactions and condenses each one as it goes.

use revm::primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    cfg::Config,
    condense::{Condensed, CondensingTransaction, refund_transaction},
    error::{BatchError, CondenseError},
    exec::{ByteCodeExecutor, Exception, ExecutionResult},
    ledger::{Amount, LedgerTransaction, Script, TxOut},
    state::AccountStore,
    transaction::{ContractTransaction, EvmGas},
    vin::VinTracker,
};

/// Everything a batch hands back to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteCodeExecResult {
    pub used_gas: EvmGas,
    /// Total value of `refund_outputs`.
    pub refund_sender: Amount,
    /// Unused gas paid back to each sender, in transaction order.
    pub refund_outputs: Vec<TxOut>,
    /// Condensing transactions and refunds of failed transactions, in transaction order.
    pub value_transfers: Vec<LedgerTransaction>,
}

pub struct BatchExecutor<'a> {
    config: &'a Config,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(config: &'a Config) -> Self {
        BatchExecutor { config }
    }

    /// Executes `txs` in order. Each transaction sees the state and contract coins left by the ones
    /// before it.
    ///
    /// On error, `store` and `vins` are left as they were before the call.
    pub fn execute_batch(
        &self,
        store: &mut AccountStore,
        vins: &mut VinTracker,
        txs: &[ContractTransaction],
    ) -> Result<(Vec<ExecutionResult>, ByteCodeExecResult), BatchError> {
        let checkpoint = store.checkpoint();
        let initial_vins = vins.clone();
        match self.run(store, vins, txs) {
            Ok(outcome) => {
                store.commit(checkpoint)?;
                Ok(outcome)
            }
            Err(e) => {
                store.revert(checkpoint)?;
                *vins = initial_vins;
                Err(e)
            }
        }
    }

    /// Executes a single transaction and throws away its effects.
    pub fn call_readonly(
        &self,
        store: &mut AccountStore,
        tx: &ContractTransaction,
    ) -> Result<ExecutionResult, BatchError> {
        let checkpoint = store.checkpoint();
        let execution = ByteCodeExecutor::new(self.config).execute(store, tx);
        store.revert(checkpoint)?;
        Ok(execution?.result)
    }

    fn run(
        &self,
        store: &mut AccountStore,
        vins: &mut VinTracker,
        txs: &[ContractTransaction],
    ) -> Result<(Vec<ExecutionResult>, ByteCodeExecResult), BatchError> {
        let executor = ByteCodeExecutor::new(self.config);
        let mut results = Vec::with_capacity(txs.len());
        let mut condensed = ByteCodeExecResult::default();

        for tx in txs {
            let checkpoint = store.checkpoint();
            let result = match self.execute_one(&executor, store, vins, tx, &mut condensed) {
                Ok((result, true)) => {
                    store.commit(checkpoint)?;
                    result
                }
                Ok((_, false)) => {
                    store.revert(checkpoint)?;
                    ExecutionResult {
                        state_root: store.state_root(),
                        ..ExecutionResult::excepted(tx, Exception::VoutLimitReached)
                    }
                }
                Err(e) => {
                    store.revert(checkpoint)?;
                    return Err(e);
                }
            };

            if !result.exception.is_none() {
                if let Some(refund) = refund_transaction(tx, self.config.condensing_tx_version)? {
                    condensed.value_transfers.push(refund);
                }
            }

            let refund = result.gas_refunded.cost(tx.gas_price);
            if !refund.is_zero() {
                let value = Amount::from_u256(refund)?;
                condensed.refund_outputs.push(TxOut {
                    value,
                    script_pubkey: Script::pay_to_pubkey_hash(&tx.sender),
                });
                condensed.refund_sender = condensed
                    .refund_sender
                    .checked_add(value)
                    .ok_or(CondenseError::AmountOverflow(
                        condensed.refund_sender.to_u256() + refund,
                    ))?;
            }

            condensed.used_gas = condensed.used_gas.checked_add(result.gas_used).ok_or(
                BatchError::GasOverflow(
                    U256::from(condensed.used_gas.0) + U256::from(result.gas_used.0),
                ),
            )?;
            if condensed.used_gas > self.config.block_gas_limit {
                return Err(BatchError::BlockGasLimit {
                    used: condensed.used_gas.0,
                    limit: self.config.block_gas_limit.0,
                });
            }

            results.push(result);
        }

        check_contract_balances(store, vins)?;

        info!(
            transactions = txs.len(),
            excepted = results.iter().filter(|r| !r.exception.is_none()).count(),
            used_gas = %condensed.used_gas,
            refund_sender = %condensed.refund_sender,
            value_transfers = condensed.value_transfers.len(),
            "batch executed"
        );
        Ok((results, condensed))
    }

    /// Executes and condenses one transaction. Returns `false` if its condensing transaction would
    /// have too many outputs, in which case nothing was condensed and its effects must be undone.
    fn execute_one(
        &self,
        executor: &ByteCodeExecutor<'_>,
        store: &mut AccountStore,
        vins: &mut VinTracker,
        tx: &ContractTransaction,
        condensed: &mut ByteCodeExecResult,
    ) -> Result<(ExecutionResult, bool), BatchError> {
        let execution = executor.execute(store, tx)?;
        if !execution.result.exception.is_none() {
            return Ok((execution.result, true));
        }
        let outcome = CondensingTransaction::new(tx, &execution.transfers, vins, store)
            .max_vouts(self.config.max_contract_vouts)
            .version(self.config.condensing_tx_version)
            .build()?;
        match outcome {
            Condensed::Nothing => {}
            Condensed::Transaction(c) => condensed.value_transfers.push(c.apply(vins)?),
            Condensed::TooManyOutputs(vouts) => {
                warn!(
                    origin = %tx.origin,
                    vouts,
                    limit = self.config.max_contract_vouts,
                    "condensing transaction has too many outputs"
                );
                return Ok((execution.result, false));
            }
        }
        Ok((execution.result, true))
    }
}

/// Every contract's balance must be exactly the value of its coin.
fn check_contract_balances(store: &AccountStore, vins: &VinTracker) -> Result<(), CondenseError> {
    let contracts = store
        .accounts()
        .filter(|(_, account)| account.is_contract())
        .map(|(address, account)| (*address, account.balance));
    let orphans = vins
        .iter()
        .filter(|(address, _)| !store.is_contract(address))
        .map(|(address, _)| (*address, U256::ZERO));
    for (address, balance) in contracts.chain(orphans) {
        let vin = vins.get(&address);
        if vin.to_u256() != balance {
            return Err(CondenseError::ContractBalanceMismatch {
                address,
                balance,
                vin,
            });
        }
    }
    Ok(())
}
