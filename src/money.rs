//! Amount conversion between wire decimals and stored minor units.
//!
//! Amounts cross the API as JSON numbers and are stored as integer cents so
//! sums and per-category totals add up exactly.

/// Upper bound on a single amount (one trillion), keeps cent sums far from overflow.
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

/// Convert a decimal amount to cents, rounding half away from zero.
///
/// Returns `None` for non-finite, zero, negative, or absurdly large values.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_cents(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 || amount > MAX_AMOUNT {
        return None;
    }
    let cents = (amount * 100.0).round() as i64;
    (cents > 0).then_some(cents)
}

/// Convert cents back to a decimal amount for responses.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Serde adapter: serialize an `i64` cent field as a decimal number.
pub mod as_amount {
    use serde::Serializer;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(super::from_cents(*cents))
    }
}

#[cfg(test)]
#[path = "money_test.rs"]
mod tests;
