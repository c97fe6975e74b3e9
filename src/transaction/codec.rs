//! Transaction wire codec
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! version:i32 | inputCount:varint | inputs | outputCount:varint | outputs | lockTime:u32
//! input  = prevHash:32 | prevIndex:u32 | scriptSigLen:varint | scriptSig
//! output = amount:i64 | scriptLen:varint | script
//! ```
//!
//! Previous-output hashes are copied in natural byte order; no reversal is
//! applied at this layer.

use super::{TransactionRecord, TxInput, TxOutput};

/// Smallest possible encoded input (hash + index + empty script length)
const MIN_INPUT_SIZE: usize = 32 + 4 + 1;

/// Smallest possible encoded output (amount + empty script length)
const MIN_OUTPUT_SIZE: usize = 8 + 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Transaction truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid length at offset {offset}: {reason}")]
    InvalidLength { offset: usize, reason: String },

    #[error("Output {index} has negative amount {amount}")]
    NegativeAmount { index: usize, amount: i64 },
}

/// Encode a Bitcoin CompactSize integer
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut out = vec![0xfd];
        out.extend_from_slice(&(value as u16).to_le_bytes());
        out
    } else if value <= 0xffff_ffff {
        let mut out = vec![0xfe];
        out.extend_from_slice(&(value as u32).to_le_bytes());
        out
    } else {
        let mut out = vec![0xff];
        out.extend_from_slice(&value.to_le_bytes());
        out
    }
}

/// Serialize a transaction to its canonical wire form
pub fn encode(tx: &TransactionRecord) -> Vec<u8> {
    let mut serialized = Vec::new();

    serialized.extend_from_slice(&tx.version.to_le_bytes());

    serialized.extend_from_slice(&encode_varint(tx.inputs.len() as u64));
    for input in &tx.inputs {
        serialized.extend_from_slice(&input.previous_tx_hash);
        serialized.extend_from_slice(&input.previous_output_index.to_le_bytes());
        serialized.extend_from_slice(&encode_varint(input.script_sig.len() as u64));
        serialized.extend_from_slice(&input.script_sig);
    }

    serialized.extend_from_slice(&encode_varint(tx.outputs.len() as u64));
    for output in &tx.outputs {
        serialized.extend_from_slice(&output.amount.to_le_bytes());
        serialized.extend_from_slice(&encode_varint(output.script_pubkey.len() as u64));
        serialized.extend_from_slice(&output.script_pubkey);
    }

    serialized.extend_from_slice(&tx.lock_time.to_le_bytes());
    serialized
}

/// Deserialize a transaction. The whole buffer must be consumed.
pub fn decode(data: &[u8]) -> Result<TransactionRecord, CodecError> {
    let mut reader = Reader::new(data);

    let version = i32::from_le_bytes(reader.read_array()?);

    let input_count = reader.read_count(MIN_INPUT_SIZE)?;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        let previous_tx_hash: [u8; 32] = reader.read_array()?;
        let previous_output_index = u32::from_le_bytes(reader.read_array()?);
        let script_sig = reader.read_script()?;
        inputs.push(TxInput {
            previous_tx_hash,
            previous_output_index,
            script_sig,
        });
    }

    let output_count = reader.read_count(MIN_OUTPUT_SIZE)?;
    let mut outputs = Vec::with_capacity(output_count);
    for index in 0..output_count {
        let amount = i64::from_le_bytes(reader.read_array()?);
        if amount < 0 {
            return Err(CodecError::NegativeAmount { index, amount });
        }
        let script_pubkey = reader.read_script()?;
        outputs.push(TxOutput {
            amount,
            script_pubkey,
        });
    }

    let lock_time = u32::from_le_bytes(reader.read_array()?);

    if reader.remaining() != 0 {
        return Err(CodecError::InvalidLength {
            offset: reader.offset,
            reason: format!("{} trailing bytes", reader.remaining()),
        });
    }

    Ok(TransactionRecord {
        version,
        lock_time,
        inputs,
        outputs,
        fee: None,
    })
}

/// Bounds-checked cursor over the input buffer
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::Truncated {
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_varint(&mut self) -> Result<u64, CodecError> {
        let start = self.offset;
        let prefix = self.read_array::<1>()?[0];
        let (value, minimum) = match prefix {
            0xfd => (u16::from_le_bytes(self.read_array()?) as u64, 0xfd),
            0xfe => (u32::from_le_bytes(self.read_array()?) as u64, 0x1_0000),
            0xff => (u64::from_le_bytes(self.read_array()?), 0x1_0000_0000),
            small => return Ok(small as u64),
        };
        if value < minimum {
            return Err(CodecError::InvalidLength {
                offset: start,
                reason: format!("non-canonical varint encoding of {}", value),
            });
        }
        Ok(value)
    }

    /// Element count, rejected when the remaining bytes cannot possibly hold it
    fn read_count(&mut self, min_element_size: usize) -> Result<usize, CodecError> {
        let start = self.offset;
        let count = self.read_varint()?;
        let max = (self.remaining() / min_element_size) as u64;
        if count > max {
            return Err(CodecError::InvalidLength {
                offset: start,
                reason: format!("count {} exceeds what {} bytes can hold", count, self.remaining()),
            });
        }
        Ok(count as usize)
    }

    /// Length-prefixed script; a prefix past the end of the buffer is `Truncated`
    fn read_script(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        Ok(self.read_bytes(len)?.to_vec())
    }
}
