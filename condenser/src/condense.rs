//! Turns the value transfers of one executed transaction into a single ledger transaction.
//!
//! Every address touched by a transfer spends the coin currently holding its balance and is paid its
//! new balance in one output. Contracts keep that output as their new coin; everything else is paid
//! to its key. However long the chain of internal calls, the result is one transaction with at most
//! one output per distinct address.

use std::collections::BTreeMap;

use revm::primitives::{Address, U256};
use tracing::{debug, trace};

use crate::{
    error::CondenseError,
    inspector::Transfer,
    ledger::{Amount, LedgerTransaction, OutPoint, Script, TxIn, TxOut},
    state::AccountStore,
    transaction::ContractTransaction,
    vin::{Vin, VinTracker},
};

/// The coin an address spends in a condensing transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Source {
    /// The output which carried the transaction. Only the sender spends it.
    Origin(Vin),
    Tracked(Vin),
    None,
}

impl Source {
    fn vin(&self) -> Option<&Vin> {
        match self {
            Source::Origin(vin) | Source::Tracked(vin) => Some(vin),
            Source::None => None,
        }
    }

    fn value(&self) -> Amount {
        self.vin().map(|v| v.value).unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Flow {
    received: U256,
    sent: U256,
}

/// Builds the condensing transaction for one successfully executed contract transaction.
pub struct CondensingTransaction<'a> {
    tx: &'a ContractTransaction,
    transfers: &'a [Transfer],
    vins: &'a VinTracker,
    store: &'a AccountStore,
    max_vouts: usize,
    version: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condensed {
    /// No value moved.
    Nothing,
    Transaction(CondensedTransaction),
    /// The transaction would need this many outputs, more than allowed.
    TooManyOutputs(usize),
}

/// A condensing transaction together with the coin updates it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensedTransaction {
    pub transaction: LedgerTransaction,
    /// Tracked coins consumed by the transaction.
    spent: Vec<(Address, Amount)>,
    /// New balance of every contract touched by the transaction, and the index of the output which
    /// becomes its coin.
    contracts: Vec<(Address, Amount, Option<u32>)>,
}

impl CondensedTransaction {
    /// Moves every contract's coin to its output of this transaction, returning the transaction.
    pub fn apply(self, vins: &mut VinTracker) -> Result<LedgerTransaction, CondenseError> {
        for (address, value) in &self.spent {
            vins.debit(*address, *value)?;
        }
        let txid = self.transaction.txid();
        for (address, value, vout) in self.contracts {
            match vout {
                Some(vout) => vins.rebind(address, OutPoint { txid, vout }, value)?,
                None => {
                    if let Some(previous) = vins.remove(&address) {
                        if !previous.value.is_zero() {
                            return Err(CondenseError::VinNotSpent {
                                address,
                                balance: previous.value,
                            });
                        }
                    }
                }
            }
        }
        Ok(self.transaction)
    }
}

impl<'a> CondensingTransaction<'a> {
    /// `store` must hold the state after execution: it decides which addresses are contracts.
    pub fn new(
        tx: &'a ContractTransaction,
        transfers: &'a [Transfer],
        vins: &'a VinTracker,
        store: &'a AccountStore,
    ) -> Self {
        CondensingTransaction {
            tx,
            transfers,
            vins,
            store,
            max_vouts: usize::MAX,
            version: 2,
        }
    }

    pub fn max_vouts(mut self, max_vouts: usize) -> Self {
        self.max_vouts = max_vouts;
        self
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn build(&self) -> Result<Condensed, CondenseError> {
        if self.transfers.is_empty() {
            return Ok(Condensed::Nothing);
        }

        let (order, sources) = self.select()?;
        let flows = self.flows();

        let mut transaction = LedgerTransaction::new(self.version);
        let mut spent = Vec::new();
        for address in &order {
            let source = sources[address];
            let Some(vin) = source.vin() else { continue };
            if vin.value.is_zero() {
                continue;
            }
            transaction.inputs.push(TxIn::spend(vin.outpoint));
            if let Source::Tracked(vin) = source {
                spent.push((*address, vin.value));
            }
        }

        let mut contracts = Vec::new();
        for address in &order {
            let balance = self.balance(address, sources[address], flows[address])?;
            let is_contract = self.store.is_contract(address);
            let vout = if balance.is_zero() {
                None
            } else {
                let script = if is_contract {
                    Script::contract_no_exec(address)
                } else {
                    Script::pay_to_pubkey_hash(address)
                };
                transaction.outputs.push(TxOut {
                    value: balance,
                    script_pubkey: script,
                });
                Some(transaction.outputs.len() as u32 - 1)
            };
            // A coin only moves to the new output for live contracts. A destructed contract loses it.
            let tracked = matches!(sources[address], Source::Tracked(_));
            if *address != self.tx.sender && (is_contract || tracked) {
                contracts.push((*address, balance, vout.filter(|_| is_contract)));
            }
        }

        if transaction.outputs.len() > self.max_vouts {
            return Ok(Condensed::TooManyOutputs(transaction.outputs.len()));
        }

        let input_values: Vec<_> = order.iter().map(|a| sources[a].value()).collect();
        let inputs = Amount::checked_sum(&input_values)
            .ok_or(CondenseError::AmountOverflow(U256::MAX))?;
        let outputs = transaction
            .total_output()
            .ok_or(CondenseError::AmountOverflow(U256::MAX))?;
        if inputs != outputs {
            return Err(CondenseError::Conservation { inputs, outputs });
        }

        debug!(
            origin = %self.tx.origin,
            txid = %transaction.txid(),
            inputs = transaction.inputs.len(),
            outputs = transaction.outputs.len(),
            value = %outputs,
            "condensing transaction built"
        );
        Ok(Condensed::Transaction(CondensedTransaction {
            transaction,
            spent,
            contracts,
        }))
    }

    /// Every address involved in a transfer, in order of first appearance, with the coin it spends.
    fn select(&self) -> Result<(Vec<Address>, BTreeMap<Address, Source>), CondenseError> {
        let mut order = Vec::new();
        let mut sources = BTreeMap::new();
        for transfer in self.transfers {
            for address in [transfer.from, transfer.to] {
                if sources.contains_key(&address) {
                    continue;
                }
                let source = if address == self.tx.sender && !self.tx.value.is_zero() {
                    Source::Origin(Vin {
                        outpoint: self.tx.origin,
                        value: Amount::from_u256(self.tx.value)?,
                    })
                } else {
                    self.vins
                        .vin(&address)
                        .copied()
                        .map_or(Source::None, Source::Tracked)
                };
                trace!(%address, ?source, "coin selected");
                order.push(address);
                sources.insert(address, source);
            }
        }
        Ok((order, sources))
    }

    fn flows(&self) -> BTreeMap<Address, Flow> {
        let mut flows: BTreeMap<Address, Flow> = BTreeMap::new();
        for transfer in self.transfers {
            flows.entry(transfer.from).or_default().sent += transfer.value;
            flows.entry(transfer.to).or_default().received += transfer.value;
        }
        flows
    }

    fn balance(&self, address: &Address, source: Source, flow: Flow) -> Result<Amount, CondenseError> {
        let available = source
            .value()
            .to_u256()
            .checked_add(flow.received)
            .ok_or(CondenseError::AmountOverflow(U256::MAX))?;
        let balance = available
            .checked_sub(flow.sent)
            .ok_or(CondenseError::BalanceUnderflow {
                address: *address,
                available,
                spent: flow.sent,
            })?;
        Amount::from_u256(balance)
    }
}

/// Returns the value of a transaction which did not go through to its sender, or `None` if it carried
/// no value.
pub fn refund_transaction(
    tx: &ContractTransaction,
    version: i32,
) -> Result<Option<LedgerTransaction>, CondenseError> {
    if tx.value.is_zero() {
        return Ok(None);
    }
    let mut refund = LedgerTransaction::new(version);
    refund.inputs.push(TxIn::spend(tx.origin));
    refund.outputs.push(TxOut {
        value: Amount::from_u256(tx.value)?,
        script_pubkey: Script::pay_to_pubkey_hash(&tx.sender),
    });
    Ok(Some(refund))
}
