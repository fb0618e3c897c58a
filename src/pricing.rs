use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Settings key holding the referral commission percentage.
pub const COMMISSION_RATE_KEY: &str = "commission_rate";

/// Reads a commission percentage stored as a JSON number or string. Must lie in `0..=100`.
pub fn parse_rate(value: &Value) -> AppResult<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(AppError::BadRequest(format!(
                "commission rate must be a number, got {other}"
            )));
        }
    };
    let rate = Decimal::from_str(&raw)
        .map_err(|_| AppError::BadRequest(format!("invalid commission rate '{raw}'")))?;
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(
            "commission rate must be between 0 and 100".into(),
        ));
    }
    Ok(rate)
}

/// Commission in whole yen: `total * rate / 100`, halves rounded away from zero.
pub fn commission_for(order_total: i64, rate: Decimal) -> i64 {
    (Decimal::from(order_total) * rate / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

pub fn variant_price(base_price: i64, price_delta: i64) -> i64 {
    (base_price + price_delta).max(0)
}

/// `¥1,234` style formatting used in customer-facing text.
pub fn format_yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-¥{grouped}")
    } else {
        format!("¥{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commission_is_total_times_rate_over_hundred() {
        assert_eq!(commission_for(10_000, Decimal::from(5)), 500);
        assert_eq!(commission_for(0, Decimal::from(5)), 0);
        assert_eq!(commission_for(1_234, Decimal::from(100)), 1_234);
    }

    #[test]
    fn commission_rounds_half_away_from_zero() {
        // 1_250 * 2.5% = 31.25
        assert_eq!(commission_for(1_250, Decimal::new(25, 1)), 31);
        // 1_010 * 5% = 50.5
        assert_eq!(commission_for(1_010, Decimal::from(5)), 51);
        // 990 * 5% = 49.5
        assert_eq!(commission_for(990, Decimal::from(5)), 50);
    }

    #[test]
    fn parse_rate_accepts_numbers_and_strings() {
        assert_eq!(parse_rate(&json!(5)).unwrap(), Decimal::from(5));
        assert_eq!(parse_rate(&json!("7.5")).unwrap(), Decimal::new(75, 1));
        assert_eq!(parse_rate(&json!(2.5)).unwrap(), Decimal::new(25, 1));
    }

    #[test]
    fn parse_rate_rejects_out_of_range_and_garbage() {
        assert!(parse_rate(&json!(-1)).is_err());
        assert!(parse_rate(&json!(101)).is_err());
        assert!(parse_rate(&json!("lots")).is_err());
        assert!(parse_rate(&json!(null)).is_err());
    }

    #[test]
    fn yen_formatting_groups_thousands() {
        assert_eq!(format_yen(0), "¥0");
        assert_eq!(format_yen(980), "¥980");
        assert_eq!(format_yen(1_234), "¥1,234");
        assert_eq!(format_yen(1_234_567), "¥1,234,567");
        assert_eq!(format_yen(-5_000), "-¥5,000");
    }

    #[test]
    fn variant_price_never_negative() {
        assert_eq!(variant_price(500, 120), 620);
        assert_eq!(variant_price(500, -800), 0);
    }
}
