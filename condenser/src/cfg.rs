use std::{fs, path::Path};

use anyhow::{Result, anyhow};
use revm::primitives::{Address, MAX_CODE_SIZE};
use serde::{Deserialize, Serialize};

use crate::transaction::EvmGas;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Chain identifier of the EVM environment.
    #[serde(default = "chain_id_default")]
    pub chain_id: u64,
    /// The most outputs a single condensing transaction may create. A transaction which would need more
    /// fails as if it ran out of gas.
    #[serde(default = "max_contract_vouts_default")]
    pub max_contract_vouts: usize,
    /// Total gas all transactions in one batch may use.
    #[serde(default = "block_gas_limit_default")]
    pub block_gas_limit: EvmGas,
    /// Author of the block being built. Its account is deleted after every transaction, like the
    /// sender's.
    #[serde(default)]
    pub coinbase: Address,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub block_timestamp: u64,
    /// Largest runtime code a creation may deploy.
    #[serde(default = "max_code_size_default")]
    pub max_code_size: usize,
    /// Version field of every condensing and refund transaction.
    #[serde(default = "condensing_tx_version_default")]
    pub condensing_tx_version: i32,
}

pub fn chain_id_default() -> u64 {
    8888
}

pub fn max_contract_vouts_default() -> usize {
    1000
}

pub fn block_gas_limit_default() -> EvmGas {
    EvmGas(40_000_000)
}

pub fn max_code_size_default() -> usize {
    MAX_CODE_SIZE
}

pub fn condensing_tx_version_default() -> i32 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chain_id: chain_id_default(),
            max_contract_vouts: max_contract_vouts_default(),
            block_gas_limit: block_gas_limit_default(),
            coinbase: Address::ZERO,
            block_number: 0,
            block_timestamp: 0,
            max_code_size: max_code_size_default(),
            condensing_tx_version: condensing_tx_version_default(),
        }
    }
}

impl Config {
    /// Reads and merges TOML files. A key may only be set by one file.
    pub fn load<P: AsRef<Path>>(files: &[P]) -> Result<Config> {
        let mut merged_config = toml::Table::new();
        for config_file in files {
            let config_file = config_file.as_ref();
            let config = fs::read_to_string(config_file)?;
            let config: toml::Table = toml::from_str(&config)?;
            for key in config.keys() {
                if merged_config.contains_key(key) {
                    return Err(anyhow!(
                        "configuration conflict: {config_file:?} contained a key {key:?} that was already included in an earlier file"
                    ));
                }
            }
            merged_config.extend(config);
        }
        let config: Config = serde::Deserialize::deserialize(merged_config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_contract_vouts == 0 {
            return Err(anyhow!("max_contract_vouts must be at least 1"));
        }
        if self.block_gas_limit.0 < 21000 {
            return Err(anyhow!(
                "block_gas_limit of {} cannot fit a single transaction",
                self.block_gas_limit
            ));
        }
        if self.max_code_size == 0 {
            return Err(anyhow!("max_code_size must be non-zero"));
        }
        if self.condensing_tx_version < 1 {
            return Err(anyhow!(
                "condensing_tx_version {} is not a valid transaction version",
                self.condensing_tx_version
            ));
        }
        Ok(())
    }
}
