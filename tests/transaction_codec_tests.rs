//! Transaction codec tests
//!
//! Wire layout, hashing, and rejection of malformed input.

use blvm_payment_protocol::transaction::{
    decode, encode, encode_varint, CodecError, TransactionRecord, TxInput, TxOutput,
};
use proptest::prelude::*;

fn one_in_one_out() -> TransactionRecord {
    TransactionRecord {
        version: 1,
        lock_time: 0,
        inputs: vec![TxInput {
            previous_tx_hash: [0xab; 32],
            previous_output_index: 1,
            script_sig: vec![0x00, 0x01, 0x02],
        }],
        outputs: vec![TxOutput::new(
            50_000_000,
            hex::decode("76a914000102030405060708090a0b0c0d0e0f1011121388ac").unwrap(),
        )],
        fee: None,
    }
}

#[test]
fn test_wire_layout() {
    let bytes = encode(&one_in_one_out());

    let mut expected = Vec::new();
    expected.extend_from_slice(&1i32.to_le_bytes());
    expected.push(1);
    expected.extend_from_slice(&[0xab; 32]);
    expected.extend_from_slice(&1u32.to_le_bytes());
    expected.extend_from_slice(&[3, 0x00, 0x01, 0x02]);
    expected.push(1);
    expected.extend_from_slice(&50_000_000i64.to_le_bytes());
    expected.push(25);
    expected.extend_from_slice(
        &hex::decode("76a914000102030405060708090a0b0c0d0e0f1011121388ac").unwrap(),
    );
    expected.extend_from_slice(&0u32.to_le_bytes());

    assert_eq!(bytes, expected);
}

#[test]
fn test_empty_transaction() {
    let tx = TransactionRecord::new();
    let bytes = tx.encode();
    assert_eq!(bytes, vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(TransactionRecord::decode(&bytes), Ok(tx));
}

#[test]
fn test_hash_is_double_sha256_of_encoding() {
    let tx = one_in_one_out();
    let expected = blvm_payment_protocol::hashing::double_sha256(&tx.encode());
    assert_eq!(tx.hash().0, expected);
    assert_eq!(tx.hash().to_string(), hex::encode(expected));
}

#[test]
fn test_hash_follows_mutation() {
    let mut tx = one_in_one_out();
    let before = tx.hash();
    tx.lock_time = 500_000;
    assert_ne!(tx.hash(), before);
}

#[test]
fn test_fee_is_not_serialized() {
    let mut tx = one_in_one_out();
    tx.fee = Some(1_000);
    let decoded = decode(&encode(&tx)).unwrap();
    assert_eq!(decoded.fee, None);
    assert_eq!(decoded.hash(), tx.hash());
}

#[test]
fn test_truncated_lock_time() {
    let bytes = encode(&one_in_one_out());
    let result = decode(&bytes[..bytes.len() - 2]);
    assert!(matches!(
        result,
        Err(CodecError::Truncated {
            needed: 4,
            available: 2,
            ..
        })
    ));
}

#[test]
fn test_script_length_past_end() {
    // version, 1 input, prev hash, index, script length 100 with 3 bytes left
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.push(1);
    bytes.extend_from_slice(&[0u8; 32]);
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.push(100);
    bytes.extend_from_slice(&[1, 2, 3]);
    assert!(matches!(decode(&bytes), Err(CodecError::Truncated { .. })));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut bytes = encode(&one_in_one_out());
    bytes.push(0);
    assert!(matches!(
        decode(&bytes),
        Err(CodecError::InvalidLength { .. })
    ));
}

#[test]
fn test_non_canonical_varint_rejected() {
    // Input count 0 written as 0xfd 0x00 0x00
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&[0xfd, 0x00, 0x00]);
    bytes.push(0);
    bytes.extend_from_slice(&0u32.to_le_bytes());
    assert!(matches!(
        decode(&bytes),
        Err(CodecError::InvalidLength { offset: 4, .. })
    ));
}

#[test]
fn test_absurd_count_rejected() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&encode_varint(u32::MAX as u64));
    bytes.extend_from_slice(&[0u8; 64]);
    assert!(matches!(
        decode(&bytes),
        Err(CodecError::InvalidLength { .. })
    ));
}

#[test]
fn test_large_scripts_round_trip() {
    let mut tx = TransactionRecord::new();
    tx.inputs.push(TxInput {
        previous_tx_hash: [0x01; 32],
        previous_output_index: 0,
        script_sig: vec![0; 10_001],
    });
    // Needs the 5-byte length prefix
    tx.outputs
        .push(TxOutput::new(1, vec![0x6a; 0x1_0001]));

    let bytes = encode(&tx);
    assert_eq!(decode(&bytes), Ok(tx));
}

#[test]
fn test_large_script_cut_short_is_truncated() {
    let mut tx = TransactionRecord::new();
    tx.outputs.push(TxOutput::new(1, vec![0x6a; 20_000]));
    let bytes = encode(&tx);
    assert!(matches!(
        decode(&bytes[..bytes.len() - 100]),
        Err(CodecError::Truncated { .. })
    ));
}

#[test]
fn test_negative_amount_rejected() {
    let mut tx = one_in_one_out();
    tx.outputs.push(TxOutput::new(-5, vec![0x51]));
    assert_eq!(
        decode(&encode(&tx)),
        Err(CodecError::NegativeAmount {
            index: 1,
            amount: -5
        })
    );
}

#[test]
fn test_varint_boundaries() {
    assert_eq!(encode_varint(0xfc), vec![0xfc]);
    assert_eq!(encode_varint(0xfd), vec![0xfd, 0xfd, 0x00]);
    assert_eq!(encode_varint(0xffff), vec![0xfd, 0xff, 0xff]);
    assert_eq!(encode_varint(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    assert_eq!(encode_varint(0x1_0000_0000)[0], 0xff);
}

fn arb_input() -> impl Strategy<Value = TxInput> {
    (
        any::<[u8; 32]>(),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..300),
    )
        .prop_map(|(previous_tx_hash, previous_output_index, script_sig)| TxInput {
            previous_tx_hash,
            previous_output_index,
            script_sig,
        })
}

fn arb_output() -> impl Strategy<Value = TxOutput> {
    (0..=i64::MAX, prop::collection::vec(any::<u8>(), 0..300))
        .prop_map(|(amount, script)| TxOutput::new(amount, script))
}

fn arb_transaction() -> impl Strategy<Value = TransactionRecord> {
    (
        any::<i32>(),
        any::<u32>(),
        prop::collection::vec(arb_input(), 0..4),
        prop::collection::vec(arb_output(), 0..4),
    )
        .prop_map(|(version, lock_time, inputs, outputs)| TransactionRecord {
            version,
            lock_time,
            inputs,
            outputs,
            fee: None,
        })
}

proptest! {
    #[test]
    fn prop_round_trip(tx in arb_transaction()) {
        prop_assert_eq!(decode(&encode(&tx)), Ok(tx));
    }

    #[test]
    fn prop_every_strict_prefix_fails(tx in arb_transaction(), cut in any::<prop::sample::Index>()) {
        let bytes = encode(&tx);
        let len = cut.index(bytes.len());
        prop_assert!(decode(&bytes[..len]).is_err());
    }
}
