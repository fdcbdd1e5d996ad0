use revm::primitives::Address;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::ledger::OutPoint;

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Double SHA-256, as used for ledger transaction ids.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// `RIPEMD160(SHA256(data))`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// The address a contract created by the transaction at `outpoint` is deployed to. Derived from the
/// internal byte order of the txid followed by the little-endian output index.
pub fn contract_address(outpoint: &OutPoint) -> Address {
    let mut preimage = Vec::with_capacity(36);
    preimage.extend_from_slice(&outpoint.txid.0);
    preimage.extend_from_slice(&outpoint.vout.to_le_bytes());
    Address::from(hash160(&preimage))
}
