//! Tracks the coin each contract's balance currently lives in.
//!
//! A contract's value is held by a single ledger output. The next condensing transaction which moves
//! value into or out of that contract spends the output and re-creates it with the new balance. The
//! tracker is rebuilt from confirmed outputs for every batch and is never shared between batches.

use std::collections::BTreeMap;

use revm::primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::CondenseError,
    ledger::{Amount, OutPoint},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vin {
    pub outpoint: OutPoint,
    pub value: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VinTracker {
    vins: BTreeMap<Address, Vin>,
}

impl VinTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value owed to `address`. Zero if it has no vin.
    pub fn get(&self, address: &Address) -> Amount {
        self.vins.get(address).map(|v| v.value).unwrap_or_default()
    }

    pub fn vin(&self, address: &Address) -> Option<&Vin> {
        self.vins.get(address)
    }

    pub fn insert(&mut self, address: Address, vin: Vin) -> Option<Vin> {
        self.vins.insert(address, vin)
    }

    pub fn remove(&mut self, address: &Address) -> Option<Vin> {
        self.vins.remove(address)
    }

    pub fn credit(&mut self, address: Address, value: Amount) -> Result<(), CondenseError> {
        let vin = self
            .vins
            .get_mut(&address)
            .ok_or(CondenseError::MissingVin(address))?;
        vin.value = vin
            .value
            .checked_add(value)
            .ok_or(CondenseError::VinOverflow { address })?;
        trace!(%address, %value, balance = %vin.value, "vin credited");
        Ok(())
    }

    /// Fails if `value` exceeds the current balance; never clamps.
    pub fn debit(&mut self, address: Address, value: Amount) -> Result<(), CondenseError> {
        let balance = self.get(&address);
        let remaining = balance
            .checked_sub(value)
            .ok_or(CondenseError::VinUnderflow {
                address,
                balance,
                value,
            })?;
        if let Some(vin) = self.vins.get_mut(&address) {
            vin.value = remaining;
        } else if !value.is_zero() {
            return Err(CondenseError::MissingVin(address));
        }
        trace!(%address, %value, balance = %remaining, "vin debited");
        Ok(())
    }

    /// Points `address` at a freshly created output. Its previous coin must already have been spent.
    pub fn rebind(
        &mut self,
        address: Address,
        outpoint: OutPoint,
        value: Amount,
    ) -> Result<(), CondenseError> {
        if let Some(previous) = self.vins.get(&address) {
            if !previous.value.is_zero() {
                return Err(CondenseError::VinNotSpent {
                    address,
                    balance: previous.value,
                });
            }
        }
        self.vins.insert(
            address,
            Vin {
                outpoint,
                value: Amount::ZERO,
            },
        );
        self.credit(address, value)
    }

    pub fn total(&self) -> Option<Amount> {
        Amount::checked_sum(self.vins.values().map(|v| &v.value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Vin)> {
        self.vins.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.vins.is_empty()
    }
}

impl FromIterator<(Address, Vin)> for VinTracker {
    fn from_iter<T: IntoIterator<Item = (Address, Vin)>>(iter: T) -> Self {
        VinTracker {
            vins: iter.into_iter().collect(),
        }
    }
}
