//! The account-model side of the ledger.
//!
//! [AccountStore] is an explicit value, passed by reference to whichever batch owns it. Speculative
//! work happens inside checkpoints which are opened and released in strict LIFO order.

use std::{collections::BTreeMap, convert::Infallible};

use itertools::Itertools;
use revm::{
    DatabaseRef,
    primitives::{AccountInfo, Address, B256, Bytecode, Bytes, EvmState, KECCAK_EMPTY, U256, keccak256},
};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::StateError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: U256,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub code: Bytes,
    #[serde(default)]
    pub storage: BTreeMap<U256, U256>,
}

impl Account {
    pub fn code_hash(&self) -> B256 {
        if self.code.is_empty() {
            KECCAK_EMPTY
        } else {
            keccak256(&self.code)
        }
    }

    /// A commitment to the account's storage. Slots are hashed in key order.
    pub fn storage_root(&self) -> B256 {
        let mut preimage = Vec::with_capacity(self.storage.len() * 64);
        for (slot, value) in &self.storage {
            preimage.extend_from_slice(&slot.to_be_bytes::<32>());
            preimage.extend_from_slice(&value.to_be_bytes::<32>());
        }
        keccak256(preimage)
    }

    pub fn is_contract(&self) -> bool {
        !self.code.is_empty()
    }

    /// Empty in the EIP-161 sense.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }
}

/// Handle to an open checkpoint. Must be passed back to [AccountStore::commit] or
/// [AccountStore::revert].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Checkpoint {
    depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AccountStore {
    accounts: BTreeMap<Address, Account>,
    /// Previous value of every account modified since the outermost open checkpoint.
    journal: Vec<(Address, Option<Account>)>,
    /// Journal length at the time each checkpoint was opened.
    checkpoints: Vec<usize>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    pub fn is_alive(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    pub fn is_contract(&self, address: &Address) -> bool {
        self.accounts.get(address).is_some_and(Account::is_contract)
    }

    pub fn balance_of(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn checkpoint(&mut self) -> Checkpoint {
        self.checkpoints.push(self.journal.len());
        let depth = self.checkpoints.len();
        trace!(depth, "checkpoint opened");
        Checkpoint { depth }
    }

    /// Keeps every change made since `checkpoint`. An enclosing checkpoint can still undo them.
    pub fn commit(&mut self, checkpoint: Checkpoint) -> Result<(), StateError> {
        self.release(&checkpoint)?;
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
        trace!(depth = checkpoint.depth, "checkpoint committed");
        Ok(())
    }

    /// Undoes every change made since `checkpoint`.
    pub fn revert(&mut self, checkpoint: Checkpoint) -> Result<(), StateError> {
        let mark = self.release(&checkpoint)?;
        for (address, previous) in self.journal.drain(mark..).rev() {
            match previous {
                Some(account) => self.accounts.insert(address, account),
                None => self.accounts.remove(&address),
            };
        }
        trace!(depth = checkpoint.depth, "checkpoint reverted");
        Ok(())
    }

    fn release(&mut self, checkpoint: &Checkpoint) -> Result<usize, StateError> {
        let expected = self.checkpoints.len();
        if expected == 0 {
            return Err(StateError::NoCheckpoint);
        }
        if checkpoint.depth != expected {
            return Err(StateError::CheckpointOrder {
                expected,
                got: checkpoint.depth,
            });
        }
        Ok(self.checkpoints.pop().unwrap_or_default())
    }

    fn record(&mut self, address: Address) {
        if !self.checkpoints.is_empty() {
            self.journal
                .push((address, self.accounts.get(&address).cloned()));
        }
    }

    /// Replaces an account wholesale, or removes it when `account` is empty.
    pub fn put(&mut self, address: Address, account: Account) {
        self.record(address);
        if account.is_empty() && account.storage.is_empty() {
            self.accounts.remove(&address);
        } else {
            self.accounts.insert(address, account);
        }
    }

    pub fn credit(&mut self, address: Address, value: U256) -> Result<(), StateError> {
        let mut account = self.accounts.get(&address).cloned().unwrap_or_default();
        account.balance = account
            .balance
            .checked_add(value)
            .ok_or(StateError::BalanceOverflow(address))?;
        self.put(address, account);
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), StateError> {
        let balance = self.balance_of(&from);
        if balance < value {
            return Err(StateError::InsufficientBalance {
                address: from,
                balance,
                value,
            });
        }
        if from == to {
            return Ok(());
        }
        let mut sender = self.accounts.get(&from).cloned().unwrap_or_default();
        sender.balance -= value;
        self.put(from, sender);
        self.credit(to, value)
    }

    pub fn set_code(&mut self, address: Address, code: Bytes) {
        let mut account = self.accounts.get(&address).cloned().unwrap_or_default();
        account.code = code;
        self.put(address, account);
    }

    pub fn destroy(&mut self, address: &Address) -> Option<Account> {
        if !self.accounts.contains_key(address) {
            return None;
        }
        self.record(*address);
        self.accounts.remove(address)
    }

    /// Zeroes the balance of an account whose value has left the account model. Code, nonce and
    /// storage are kept.
    pub fn sweep(&mut self, address: &Address) -> U256 {
        let Some(mut account) = self.accounts.get(address).cloned() else {
            return U256::ZERO;
        };
        let balance = std::mem::take(&mut account.balance);
        self.put(*address, account);
        balance
    }

    /// Applies the state diff produced by one EVM execution.
    pub fn apply(&mut self, state: EvmState) {
        for (address, changed) in state.into_iter().sorted_by_key(|(address, _)| *address) {
            if !changed.is_touched() {
                continue;
            }
            if changed.is_selfdestructed() {
                self.destroy(&address);
                continue;
            }
            let mut account = if changed.is_created() {
                Account::default()
            } else {
                self.accounts.get(&address).cloned().unwrap_or_default()
            };
            account.balance = changed.info.balance;
            account.nonce = changed.info.nonce;
            if let Some(code) = &changed.info.code {
                account.code = code.original_bytes();
            }
            for (slot, value) in changed.storage {
                if !value.is_changed() {
                    continue;
                }
                let present = value.present_value();
                if present.is_zero() {
                    account.storage.remove(&slot);
                } else {
                    account.storage.insert(slot, present);
                }
            }
            self.put(address, account);
        }
    }

    /// A commitment to the whole account set.
    pub fn state_root(&self) -> B256 {
        let mut preimage = Vec::with_capacity(self.accounts.len() * 136);
        for (address, account) in &self.accounts {
            preimage.extend_from_slice(address.as_slice());
            preimage.extend_from_slice(&account.balance.to_be_bytes::<32>());
            preimage.extend_from_slice(&account.nonce.to_be_bytes());
            preimage.extend_from_slice(account.code_hash().as_slice());
            preimage.extend_from_slice(account.storage_root().as_slice());
        }
        keccak256(preimage)
    }
}

impl FromIterator<(Address, Account)> for AccountStore {
    fn from_iter<T: IntoIterator<Item = (Address, Account)>>(iter: T) -> Self {
        AccountStore {
            accounts: iter.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl DatabaseRef for AccountStore {
    type Error = Infallible;

    fn basic_ref(&self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        Ok(self.accounts.get(&address).map(|account| AccountInfo {
            balance: account.balance,
            nonce: account.nonce,
            code_hash: account.code_hash(),
            code: Some(Bytecode::new_raw(account.code.clone())),
        }))
    }

    fn code_by_hash_ref(&self, code_hash: B256) -> Result<Bytecode, Self::Error> {
        Ok(self
            .accounts
            .values()
            .find(|account| account.code_hash() == code_hash)
            .map(|account| Bytecode::new_raw(account.code.clone()))
            .unwrap_or_default())
    }

    fn storage_ref(&self, address: Address, index: U256) -> Result<U256, Self::Error> {
        Ok(self
            .accounts
            .get(&address)
            .and_then(|account| account.storage.get(&index).copied())
            .unwrap_or_default())
    }

    /// Block storage lives outside this crate, so hashes are derived from the number.
    fn block_hash_ref(&self, number: U256) -> Result<B256, Self::Error> {
        Ok(keccak256(number.to_be_bytes::<32>()))
    }
}
