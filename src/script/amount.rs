//! Ledger unit / satoshi conversion
//!
//! 1 unit = 100,000,000 satoshis. Conversions are exact: an amount that
//! cannot be represented in whole satoshis is rejected, never truncated.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Satoshis per ledger unit
pub const SATOSHIS_PER_UNIT: i64 = 100_000_000;

/// Fractional digits representable in satoshis
pub const UNIT_DECIMALS: u32 = 8;

/// Amount conversion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount {0} has more than 8 fractional digits")]
    TooPrecise(Decimal),

    #[error("Amount {0} is negative")]
    Negative(Decimal),

    #[error("Amount {0} does not fit in satoshis")]
    Overflow(Decimal),

    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// Convert a ledger-unit amount to satoshis, rejecting sub-satoshi precision
pub fn btc_to_satoshis(amount: Decimal) -> Result<i64, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }

    let normalized = amount.normalize();
    if normalized.scale() > UNIT_DECIMALS {
        return Err(AmountError::TooPrecise(amount));
    }

    normalized
        .checked_mul(Decimal::from(SATOSHIS_PER_UNIT))
        .and_then(|sats| sats.to_i64())
        .ok_or(AmountError::Overflow(amount))
}

/// Parse a decimal string ("0.5", "1.00000001") into satoshis
pub fn parse_btc(text: &str) -> Result<i64, AmountError> {
    let amount = Decimal::from_str_exact(text.trim())
        .map_err(|e| AmountError::Invalid(format!("{}: {}", text, e)))?;
    btc_to_satoshis(amount)
}

/// Convert to satoshis rounding half-to-even at the 8th fractional digit.
///
/// Only for amounts derived from other computations (exchange rates, splits)
/// where the caller has accepted rounding.
pub fn round_to_satoshis(amount: Decimal) -> Result<i64, AmountError> {
    btc_to_satoshis(amount.round_dp_with_strategy(UNIT_DECIMALS, RoundingStrategy::MidpointNearestEven))
}

/// Satoshis as a ledger-unit amount with 8 fractional digits
pub fn satoshis_to_btc(satoshis: i64) -> Decimal {
    Decimal::new(satoshis, UNIT_DECIMALS)
}

/// Sum of satoshi amounts, `None` if it overflows `i64`
pub fn checked_total<I>(amounts: I) -> Option<i64>
where
    I: IntoIterator<Item = i64>,
{
    amounts
        .into_iter()
        .try_fold(0i64, |total, amount| total.checked_add(amount))
}
