use super::*;

fn limiter(per_address_limit: usize, global_limit: usize) -> RateLimiter {
    RateLimiter::with_config(RateLimitConfig { per_address_limit, global_limit, window: Duration::from_secs(60) })
}

#[test]
fn per_address_allows_up_to_limit() {
    let rl = limiter(3, 100);
    let now = Instant::now();

    for i in 0..3 {
        assert!(rl.check_and_record_at("a@example.com", now).is_ok(), "request {i} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at("a@example.com", now),
        Err(RateLimitError::PerAddressExceeded { limit: 3, window_secs: 60 })
    ));
}

#[test]
fn addresses_are_limited_independently() {
    let rl = limiter(1, 100);
    let now = Instant::now();

    rl.check_and_record_at("a@example.com", now).unwrap();
    assert!(rl.check_and_record_at("a@example.com", now).is_err());
    assert!(rl.check_and_record_at("b@example.com", now).is_ok());
}

#[test]
fn global_allows_up_to_limit() {
    let rl = limiter(10, 5);
    let now = Instant::now();

    for i in 0..5 {
        assert!(rl.check_and_record_at(&format!("user{i}@example.com"), now).is_ok());
    }
    assert!(matches!(
        rl.check_and_record_at("late@example.com", now),
        Err(RateLimitError::GlobalExceeded { limit: 5, .. })
    ));
}

#[test]
fn window_expiry_allows_new_requests() {
    let rl = limiter(2, 100);
    let start = Instant::now();

    rl.check_and_record_at("a@example.com", start).unwrap();
    rl.check_and_record_at("a@example.com", start).unwrap();
    assert!(rl.check_and_record_at("a@example.com", start).is_err());

    let later = start + Duration::from_secs(61);
    assert!(rl.check_and_record_at("a@example.com", later).is_ok());
}

#[test]
fn rejected_requests_are_not_recorded() {
    let rl = limiter(1, 100);
    let start = Instant::now();

    rl.check_and_record_at("a@example.com", start).unwrap();
    for _ in 0..5 {
        assert!(rl.check_and_record_at("a@example.com", start + Duration::from_secs(30)).is_err());
    }
    // Only the first request counts, so the window reopens 61s after it.
    assert!(rl.check_and_record_at("a@example.com", start + Duration::from_secs(61)).is_ok());
}

#[test]
fn clones_share_state() {
    let rl = limiter(1, 100);
    let other = rl.clone();
    let now = Instant::now();

    rl.check_and_record_at("a@example.com", now).unwrap();
    assert!(other.check_and_record_at("a@example.com", now).is_err());
}

#[test]
fn default_config_is_reasonable() {
    let cfg = RateLimitConfig::default();
    assert!(cfg.per_address_limit >= 1);
    assert!(cfg.global_limit >= cfg.per_address_limit);
    assert!(cfg.window >= Duration::from_secs(60));
}
