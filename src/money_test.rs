use super::*;

#[test]
fn to_cents_rounds_to_two_places() {
    assert_eq!(to_cents(12.5), Some(1250));
    assert_eq!(to_cents(0.125), Some(13));
    assert_eq!(to_cents(19.999), Some(2000));
}

#[test]
fn to_cents_rejects_non_positive_and_non_finite() {
    assert_eq!(to_cents(0.0), None);
    assert_eq!(to_cents(-4.0), None);
    assert_eq!(to_cents(f64::NAN), None);
    assert_eq!(to_cents(f64::INFINITY), None);
}

#[test]
fn to_cents_rejects_amounts_that_round_to_zero() {
    assert_eq!(to_cents(0.004), None);
}

#[test]
fn to_cents_rejects_above_max() {
    assert_eq!(to_cents(MAX_AMOUNT * 2.0), None);
    assert!(to_cents(MAX_AMOUNT).is_some());
}

#[test]
fn from_cents_renders_decimal() {
    assert!((from_cents(1250) - 12.5).abs() < f64::EPSILON);
    assert!((from_cents(-300) + 3.0).abs() < f64::EPSILON);
}

#[test]
fn as_amount_serializes_decimal() {
    #[derive(serde::Serialize)]
    struct Wrapper {
        #[serde(with = "as_amount")]
        amount: i64,
    }
    let json = serde_json::to_value(Wrapper { amount: 4599 }).unwrap();
    assert_eq!(json["amount"], 45.99);
}
