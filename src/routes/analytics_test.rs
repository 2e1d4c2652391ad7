use super::*;

#[test]
fn trend_months_default_to_six() {
    assert_eq!(parse_trend_months(None), Ok(6));
}

#[test]
fn trend_months_accepts_offered_periods() {
    for months in [6, 12, 36, 60] {
        assert_eq!(parse_trend_months(Some(months)), Ok(months));
    }
}

#[test]
fn trend_months_rejects_other_values() {
    for months in [0, 1, 7, 24, 120] {
        assert_eq!(parse_trend_months(Some(months)), Err(StatusCode::BAD_REQUEST));
    }
}
