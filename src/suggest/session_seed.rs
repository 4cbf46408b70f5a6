use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};

/// Seed for one suggestion call. Deterministic over its inputs, but the
/// wall-clock component makes repeated calls with identical logical
/// parameters diverge. Reproducibility is only guaranteed when a seed is
/// injected directly (see `suggest_meals_seeded`).
pub fn generate_session_seed(day: NaiveDate, user_id: i64, entropy: Option<&str>) -> u64 {
    let timestamp_ms = Utc::now().timestamp_millis();
    seed_from_parts(day, user_id, entropy, timestamp_ms)
}

/// Content-addressed hash over `{day}_{user_id}[_{entropy}]_{timestamp_ms}`,
/// truncated to a positive 31-bit value. Not security-sensitive.
pub fn seed_from_parts(
    day: NaiveDate,
    user_id: i64,
    entropy: Option<&str>,
    timestamp_ms: i64,
) -> u64 {
    let mut base_string = format!("{}_{}", day, user_id);
    if let Some(extra) = entropy {
        base_string.push('_');
        base_string.push_str(extra);
    }
    let seed_string = format!("{}_{}", base_string, timestamp_ms);

    let digest = Sha256::digest(seed_string.as_bytes());
    let head = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    u64::from(head % (1u32 << 31))
}
