//! Ledger-side types. Condensing produces ordinary UTXO transactions, so everything here mirrors the
//! shape of the ledger's own transactions and is serialized the same way for hashing.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use revm::primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{crypto::sha256d, error::CondenseError};

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CALL: u8 = 0xc2;
pub const OP_SPEND: u8 = 0xc3;

/// Sequence number of every input of a condensing transaction.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// A quantity of the ledger's native currency, in its smallest unit.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    /// Ledger amounts are signed 64-bit on the wire.
    pub const MAX_MONEY: Amount = Amount(i64::MAX as u64);

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        let sum = Amount(self.0.checked_add(rhs.0)?);
        (sum <= Self::MAX_MONEY).then_some(sum)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        Some(Amount(self.0.checked_sub(rhs.0)?))
    }

    /// Converts an EVM-side value. Fails rather than truncating.
    pub fn from_u256(value: U256) -> Result<Amount, CondenseError> {
        u64::try_from(value)
            .ok()
            .map(Amount)
            .filter(|amount| *amount <= Self::MAX_MONEY)
            .ok_or(CondenseError::AmountOverflow(value))
    }

    pub fn to_u256(self) -> U256 {
        U256::from(self.0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Sums amounts, returning `None` on overflow.
    pub fn checked_sum<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> Option<Amount> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(*a))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A transaction id, stored in internal byte order. Displayed byte-reversed like the ledger does.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Txid(pub [u8; 32]);

impl Display for Txid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl FromStr for Txid {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = <[u8; 32]>::try_from(hex::decode(s)?.as_slice())
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        bytes.reverse();
        Ok(Txid(bytes))
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Txid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Txid,
    pub vout: u32,
}

impl Display for OutPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Script(#[serde(with = "hex::serde")] pub Vec<u8>);

impl Script {
    /// `OP_DUP OP_HASH160 <address> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn pay_to_pubkey_hash(address: &Address) -> Script {
        let mut script = Script::default();
        script.push_opcode(OP_DUP);
        script.push_opcode(OP_HASH160);
        script.push_slice(address.as_slice());
        script.push_opcode(OP_EQUALVERIFY);
        script.push_opcode(OP_CHECKSIG);
        script
    }

    /// A contract output which only carries value: version, gas limit, gas price and data are all
    /// zero, so spending it into the contract executes nothing.
    pub fn contract_no_exec(address: &Address) -> Script {
        let mut script = Script::default();
        for _ in 0..4 {
            script.push_slice(&[0]);
        }
        script.push_slice(address.as_slice());
        script.push_opcode(OP_CALL);
        script
    }

    /// The script signature of every condensing input.
    pub fn spend() -> Script {
        Script(vec![OP_SPEND])
    }

    pub fn push_opcode(&mut self, opcode: u8) {
        self.0.push(opcode);
    }

    pub fn push_slice(&mut self, data: &[u8]) {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.0.push(len as u8);
        } else if len <= u8::MAX as usize {
            self.0.push(OP_PUSHDATA1);
            self.0.push(len as u8);
        } else if len <= u16::MAX as usize {
            self.0.push(OP_PUSHDATA2);
            self.0.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.0.push(OP_PUSHDATA4);
            self.0.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.0.extend_from_slice(data);
    }

    /// Iterates over the script as `(opcode, pushed data)`. Stops at the first malformed push.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            script: &self.0,
            position: 0,
        }
    }

    pub fn is_pay_to_pubkey_hash(&self) -> bool {
        let s = &self.0;
        s.len() == 25
            && s[0] == OP_DUP
            && s[1] == OP_HASH160
            && s[2] == 20
            && s[23] == OP_EQUALVERIFY
            && s[24] == OP_CHECKSIG
    }

    pub fn has_op_call(&self) -> bool {
        self.instructions().any(|(opcode, _)| opcode == OP_CALL)
    }

    /// The address this output pays to, for pay-to-pubkey-hash and contract outputs.
    pub fn destination(&self) -> Option<Address> {
        if self.is_pay_to_pubkey_hash() {
            return Some(Address::from_slice(&self.0[3..23]));
        }
        let instructions: Vec<_> = self.instructions().collect();
        match instructions.as_slice() {
            [.., (_, Some(address)), (OP_CALL, None)] if address.len() == 20 => {
                Some(Address::from_slice(address))
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct Instructions<'a> {
    script: &'a [u8],
    position: usize,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = (u8, Option<&'a [u8]>);

    fn next(&mut self) -> Option<Self::Item> {
        let opcode = *self.script.get(self.position)?;
        self.position += 1;
        let len = match opcode {
            OP_0 => return Some((opcode, None)),
            1..OP_PUSHDATA1 => opcode as usize,
            OP_PUSHDATA1 => self.read_len(1)?,
            OP_PUSHDATA2 => self.read_len(2)?,
            OP_PUSHDATA4 => self.read_len(4)?,
            _ => return Some((opcode, None)),
        };
        let data = self.script.get(self.position..self.position.checked_add(len)?)?;
        self.position += len;
        Some((opcode, Some(data)))
    }
}

impl Instructions<'_> {
    fn read_len(&mut self, width: usize) -> Option<usize> {
        let bytes = self.script.get(self.position..self.position + width)?;
        self.position += width;
        let mut buf = [0u8; 4];
        buf[..width].copy_from_slice(bytes);
        Some(u32::from_le_bytes(buf) as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    /// An input spending a contract-held output.
    pub fn spend(prevout: OutPoint) -> TxIn {
        TxIn {
            prevout,
            script_sig: Script::spend(),
            sequence: SEQUENCE_FINAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Script,
}

/// A transaction as it will be included in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl LedgerTransaction {
    pub fn new(version: i32) -> Self {
        LedgerTransaction {
            version,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    /// Ledger wire encoding, without witness data.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.prevout.txid.0);
            out.extend_from_slice(&input.prevout.vout.to_le_bytes());
            write_compact_size(&mut out, input.script_sig.len() as u64);
            out.extend_from_slice(&input.script_sig.0);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&(output.value.0 as i64).to_le_bytes());
            write_compact_size(&mut out, output.script_pubkey.len() as u64);
            out.extend_from_slice(&output.script_pubkey.0);
        }
        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    pub fn txid(&self) -> Txid {
        Txid(sha256d(&self.serialize()))
    }

    pub fn total_output(&self) -> Option<Amount> {
        Amount::checked_sum(self.outputs.iter().map(|o| &o.value))
    }
}

fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}
