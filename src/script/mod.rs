//! Script engine
//!
//! Only the canonical pay-to-address (P2PKH) output template is understood:
//!
//! ```text
//! OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG
//! ```
//!
//! This is not a script interpreter. Any other script shape is reported as
//! [`ScriptError::UnsupportedForm`].

pub mod address;
pub mod amount;

pub use address::{Address, AddressError, ADDRESS_HASH_LEN};
pub use amount::{
    btc_to_satoshis, checked_total, parse_btc, satoshis_to_btc, AmountError, SATOSHIS_PER_UNIT,
};

use crate::params::NetworkContext;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;

/// Push opcode for the 20-byte address hash
const OP_PUSHBYTES_20: u8 = ADDRESS_HASH_LEN as u8;

/// Length of a pay-to-address script
pub const PAY_TO_ADDRESS_SCRIPT_LEN: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("Unsupported script form (only pay-to-address outputs are recognised)")]
    UnsupportedForm,
}

/// Build the canonical pay-to-address output script for `address`
pub fn build_pay_to_address_script(address: &Address) -> Vec<u8> {
    let mut script = Vec::with_capacity(PAY_TO_ADDRESS_SCRIPT_LEN);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(OP_PUSHBYTES_20);
    script.extend_from_slice(address.hash());
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// Whether `script` is a canonical pay-to-address output script
pub fn is_pay_to_address(script: &[u8]) -> bool {
    script.len() == PAY_TO_ADDRESS_SCRIPT_LEN
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == OP_PUSHBYTES_20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
}

/// Recover the destination address of a pay-to-address output script
pub fn address_from_script(
    script: &[u8],
    network: &NetworkContext,
) -> Result<Address, ScriptError> {
    if !is_pay_to_address(script) {
        return Err(ScriptError::UnsupportedForm);
    }
    let mut hash = [0u8; ADDRESS_HASH_LEN];
    hash.copy_from_slice(&script[3..3 + ADDRESS_HASH_LEN]);
    Ok(Address::new(network, hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_template() {
        let address = Address::new(&NetworkContext::testnet(), [0xab; 20]);
        let script = build_pay_to_address_script(&address);
        assert_eq!(script.len(), PAY_TO_ADDRESS_SCRIPT_LEN);
        assert_eq!(
            hex::encode(&script),
            format!("76a914{}88ac", "ab".repeat(20))
        );
    }

    #[test]
    fn test_address_recovered_from_script() {
        let ctx = NetworkContext::mainnet();
        let address = Address::new(&ctx, [0x11; 20]);
        let script = build_pay_to_address_script(&address);
        assert_eq!(address_from_script(&script, &ctx), Ok(address));
    }

    #[test]
    fn test_other_forms_unsupported() {
        let ctx = NetworkContext::mainnet();
        // P2WPKH: OP_0 <20 bytes>
        let mut witness = vec![0x00, 0x14];
        witness.extend_from_slice(&[0u8; 20]);
        assert_eq!(
            address_from_script(&witness, &ctx),
            Err(ScriptError::UnsupportedForm)
        );
        assert_eq!(
            address_from_script(&[], &ctx),
            Err(ScriptError::UnsupportedForm)
        );

        // Right length, wrong trailing opcode
        let mut script = build_pay_to_address_script(&Address::new(&ctx, [2u8; 20]));
        script[24] = 0x87;
        assert!(!is_pay_to_address(&script));
    }
}
