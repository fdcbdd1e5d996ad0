//! Gas costs charged outside the interpreter.

use revm::{
    interpreter::gas::{CODEDEPOSIT, validate_initial_tx_gas},
    primitives::SpecId,
};

use crate::{
    exec::SPEC_ID,
    transaction::{ContractTransaction, EvmGas},
};

/// Gas charged before any code runs: the base stipend, call data and, for creations, the creation
/// fee and init code words.
pub fn intrinsic_gas(tx: &ContractTransaction) -> EvmGas {
    EvmGas(validate_initial_tx_gas(
        SPEC_ID,
        &tx.data,
        tx.is_creation(),
        &[],
    ))
}

/// Creations are executed as a call into the new address with empty call data. This is the part of
/// the intrinsic cost that call does not charge itself.
pub fn creation_surcharge(init_code: &[u8]) -> EvmGas {
    let create = validate_initial_tx_gas(SPEC_ID, init_code, true, &[]);
    let call = validate_initial_tx_gas(SPEC_ID, &[], false, &[]);
    EvmGas(create - call)
}

pub fn code_deposit_cost(code_len: usize) -> EvmGas {
    EvmGas(CODEDEPOSIT * code_len as u64)
}

/// Storage refunds are capped at half the gas spent, or a fifth from London (EIP-3529).
pub fn max_refund(spent: EvmGas) -> EvmGas {
    let quotient = if SPEC_ID.is_enabled_in(SpecId::LONDON) { 5 } else { 2 };
    EvmGas(spent.0 / quotient)
}
