//! Referral code candidates and the check-then-insert allocation loop.
//!
//! Allocation is best effort: a candidate that passes the existence check
//! can still lose a race with a concurrent insert, in which case the unique
//! constraint on `referral_codes.code` rejects it.

use std::{
    future::Future,
    hash::{DefaultHasher, Hash, Hasher},
};

use chrono::{DateTime, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use uuid::Uuid;

use crate::error::AppResult;

pub const CODE_LEN: usize = 8;
pub const FALLBACK_CODE_LEN: usize = 12;
pub const MAX_CODE_ATTEMPTS: usize = 5;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Last `len` base-36 digits of `n`, zero padded on the left.
fn tail(n: u64, len: usize) -> String {
    let digits = to_base36(n);
    if digits.len() >= len {
        digits[digits.len() - len..].to_string()
    } else {
        format!("{}{}", "0".repeat(len - digits.len()), digits)
    }
}

fn user_hash(user_id: Uuid) -> u64 {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    hasher.finish()
}

/// 8 characters: 3 from the owner hash, 3 from the clock, 2 random.
pub fn candidate(user_id: Uuid, now: DateTime<Utc>, random: u64) -> String {
    let millis = now.timestamp_millis().unsigned_abs();
    format!(
        "{}{}{}",
        tail(user_hash(user_id), 3),
        tail(millis, 3),
        tail(random, 2)
    )
}

/// Long form used once the short candidates keep colliding.
pub fn fallback(user_id: Uuid, now: DateTime<Utc>, random: u64) -> String {
    let millis = now.timestamp_millis().unsigned_abs();
    format!(
        "{}{}{}",
        tail(user_hash(user_id), 4),
        tail(millis, 4),
        tail(random, 4)
    )
}

pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Generates candidates until `exists` reports a free one, at most
/// [`MAX_CODE_ATTEMPTS`] times, then returns an unchecked fallback code.
pub async fn allocate<F, Fut>(user_id: Uuid, mut exists: F) -> AppResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = candidate(user_id, Utc::now(), OsRng.next_u64());
        if !exists(code.clone()).await? {
            return Ok(code);
        }
        tracing::debug!(attempt, code = %code, "referral code collision");
    }

    let code = fallback(user_id, Utc::now(), OsRng.next_u64());
    tracing::warn!(
        user_id = %user_id,
        attempts = MAX_CODE_ATTEMPTS,
        "referral code attempts exhausted, using long form"
    );
    Ok(code)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::error::AppError;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn is_code_char(c: char) -> bool {
        c.is_ascii_digit() || c.is_ascii_uppercase()
    }

    #[test]
    fn candidate_shape() {
        let code = candidate(Uuid::new_v4(), fixed_now(), 7);
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.chars().all(is_code_char));
        assert!(code.ends_with("07"));
    }

    #[test]
    fn candidate_depends_on_user_and_randomness() {
        let user = Uuid::from_u128(42);
        let a = candidate(user, fixed_now(), 1);
        let b = candidate(user, fixed_now(), 2);
        assert_ne!(a, b);
        assert_eq!(a[..6], b[..6]);
        assert_eq!(a, candidate(user, fixed_now(), 1));
    }

    #[test]
    fn fallback_is_longer() {
        let code = fallback(Uuid::new_v4(), fixed_now(), u64::MAX);
        assert_eq!(code.len(), FALLBACK_CODE_LEN);
        assert!(code.chars().all(is_code_char));
    }

    #[test]
    fn tail_pads_and_truncates() {
        assert_eq!(tail(0, 3), "000");
        assert_eq!(tail(35, 2), "0Z");
        assert_eq!(tail(36 * 36 * 36 + 1, 3), "001");
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize("  ab12cd34 "), "AB12CD34");
    }

    #[tokio::test]
    async fn allocate_retries_until_free() {
        let mut calls = 0;
        let code = allocate(Uuid::new_v4(), |_code| {
            calls += 1;
            let taken = calls <= 2;
            async move { Ok(taken) }
        })
        .await
        .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(code.len(), CODE_LEN);
    }

    #[tokio::test]
    async fn allocate_falls_back_after_exhaustion() {
        let mut calls = 0;
        let code = allocate(Uuid::new_v4(), |_code| {
            calls += 1;
            async { Ok(true) }
        })
        .await
        .unwrap();

        assert_eq!(calls, MAX_CODE_ATTEMPTS);
        assert_eq!(code.len(), FALLBACK_CODE_LEN);
    }

    #[tokio::test]
    async fn allocate_propagates_lookup_errors() {
        let result = allocate(Uuid::new_v4(), |_code| async {
            Err(AppError::BadRequest("lookup failed".into()))
        })
        .await;
        assert!(result.is_err());
    }
}
