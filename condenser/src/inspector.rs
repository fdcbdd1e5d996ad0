//! Captures the value transfers made while a transaction executes.

use revm::{
    Database, EvmContext, Inspector,
    interpreter::{CallInputs, CallOutcome, CreateInputs, CreateOutcome},
    primitives::{Address, U256},
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Value moved from one account to another during execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Records every value transfer which survives execution, in the order the transfers happened.
///
/// Transfers made inside a frame which later fails are discarded along with the frame, so the final
/// list describes exactly the balance changes the EVM committed.
#[derive(Debug, Default)]
pub struct TransferInspector {
    transfers: Vec<Transfer>,
    /// Length of `transfers` when each open frame started.
    frames: Vec<usize>,
    /// Index of the pending transfer into each open creation, if it carries value.
    creations: Vec<Option<usize>>,
}

impl TransferInspector {
    pub fn into_transfers(self) -> Vec<Transfer> {
        self.transfers
    }

    fn record(&mut self, from: Address, to: Address, value: U256) -> usize {
        trace!(%from, %to, %value, "transfer");
        self.transfers.push(Transfer { from, to, value });
        self.transfers.len() - 1
    }

    fn end_frame(&mut self, success: bool) {
        let mark = self.frames.pop().unwrap_or_default();
        if !success {
            self.transfers.truncate(mark);
        }
    }
}

impl<DB: Database> Inspector<DB> for TransferInspector {
    fn call(&mut self, _: &mut EvmContext<DB>, inputs: &mut CallInputs) -> Option<CallOutcome> {
        self.frames.push(self.transfers.len());
        if let Some(value) = inputs.transfer_value() {
            if !value.is_zero() && inputs.caller != inputs.target_address {
                self.record(inputs.caller, inputs.target_address, value);
            }
        }
        None
    }

    fn call_end(
        &mut self,
        _: &mut EvmContext<DB>,
        _: &CallInputs,
        outcome: CallOutcome,
    ) -> CallOutcome {
        self.end_frame(outcome.result.is_ok());
        outcome
    }

    fn create(
        &mut self,
        _: &mut EvmContext<DB>,
        inputs: &mut CreateInputs,
    ) -> Option<CreateOutcome> {
        self.frames.push(self.transfers.len());
        let pending =
            (!inputs.value.is_zero()).then(|| self.record(inputs.caller, Address::ZERO, inputs.value));
        self.creations.push(pending);
        None
    }

    fn create_end(
        &mut self,
        _: &mut EvmContext<DB>,
        _: &CreateInputs,
        outcome: CreateOutcome,
    ) -> CreateOutcome {
        let pending = self.creations.pop().flatten();
        let created = outcome.result.is_ok().then_some(outcome.address).flatten();
        if let (Some(index), Some(address)) = (pending, created) {
            self.transfers[index].to = address;
        }
        self.end_frame(created.is_some());
        outcome
    }

    /// A sweep to the contract itself burns the balance. It is still recorded so the contract's coin is
    /// spent.
    fn selfdestruct(&mut self, contract: Address, target: Address, value: U256) {
        if !value.is_zero() {
            self.record(contract, target, value);
        }
    }
}
