use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, Sub},
};

use revm::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::ledger::OutPoint;

/// A quantity of EVM gas.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct EvmGas(pub u64);

impl EvmGas {
    pub fn checked_sub(self, rhs: EvmGas) -> Option<EvmGas> {
        Some(EvmGas(self.0.checked_sub(rhs.0)?))
    }

    pub fn checked_add(self, rhs: EvmGas) -> Option<EvmGas> {
        Some(EvmGas(self.0.checked_add(rhs.0)?))
    }

    /// The value of this much gas at `price`. Cannot overflow a U256.
    pub fn cost(self, price: u64) -> U256 {
        U256::from(self.0) * U256::from(price)
    }
}

impl Sub for EvmGas {
    type Output = EvmGas;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs).expect("evm gas underflow")
    }
}

impl Add for EvmGas {
    type Output = EvmGas;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).expect("evm gas overflow")
    }
}

impl Display for EvmGas {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A contract call or creation carried by a ledger output.
///
/// `origin` is the output which carried the call. Its value funds the call, it determines the address
/// of a created contract, and it is the input spent when value has to be returned to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTransaction {
    pub sender: Address,
    /// `None` for contract creation.
    pub receiver: Option<Address>,
    #[serde(default)]
    pub value: U256,
    pub gas_limit: EvmGas,
    pub gas_price: u64,
    /// Init code for a creation, call data otherwise.
    #[serde(default)]
    pub data: Bytes,
    pub origin: OutPoint,
}

impl ContractTransaction {
    pub fn is_creation(&self) -> bool {
        self.receiver.is_none()
    }

    /// The most gas this transaction can be charged for.
    pub fn max_fee(&self) -> U256 {
        self.gas_limit.cost(self.gas_price)
    }
}
