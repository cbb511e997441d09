//! Discount pricing for quote display
//!
//! Pure functions: the discount toggle and percentage are owned by the caller
//! and passed in on every evaluation.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::quote::QuoteResult;

/// Percentage discount applied uniformly to every beneficiary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscountSettings {
    pub enabled: bool,
    pub percent: Decimal,
}

impl DiscountSettings {
    pub fn new(enabled: bool, percent: Decimal) -> Self {
        Self { enabled, percent }
    }

    /// Parse the percentage as typed by the operator; garbage becomes 0
    pub fn from_input(enabled: bool, percent: &str) -> Self {
        Self::new(enabled, coerce_str(percent))
    }

    /// True when the discount changes displayed values
    pub fn is_active(&self) -> bool {
        self.enabled && self.percent > Decimal::ZERO
    }

    /// Percentage forwarded with PDF requests: 0 when the toggle is off
    pub fn effective_percent(&self) -> Decimal {
        if self.enabled {
            self.percent
        } else {
            Decimal::ZERO
        }
    }
}

/// Discounted value of one beneficiary.
///
/// Returns `base` unchanged when the discount is off or the percentage is not
/// positive; otherwise `max(0, base - base * percent / 100)`. A percentage of
/// 100 or more, or a product outside the `Decimal` range, yields 0.
pub fn compute_discounted_value(
    base: Decimal,
    discount_enabled: bool,
    discount_percent: Decimal,
) -> Decimal {
    if !discount_enabled || discount_percent <= Decimal::ZERO {
        return base;
    }
    if discount_percent >= Decimal::ONE_HUNDRED {
        return Decimal::ZERO;
    }

    discount_percent
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|fraction| base.checked_mul(fraction))
        .and_then(|discount| base.checked_sub(discount))
        .map_or(Decimal::ZERO, clamp_non_negative)
}

/// Total shown at the bottom of a quote card.
///
/// Without beneficiaries the flat `preco_total` is used as-is.
pub fn compute_total(quote: &QuoteResult, discount: DiscountSettings) -> Decimal {
    if quote.beneficiaries.is_empty() {
        return quote.total_price;
    }

    quote
        .beneficiaries
        .iter()
        .map(|beneficiary| {
            compute_discounted_value(beneficiary.value, discount.enabled, discount.percent)
        })
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Two decimals, comma as decimal separator: `1234.5` → `"1234,50"`
pub fn format_amount(value: Decimal) -> String {
    format_dot(value).replace('.', ",")
}

/// Two decimals keeping the dot separator
pub fn format_dot(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Coerce free text to a non-negative amount; anything unparseable is 0.
///
/// Accepts a comma as decimal separator and scientific notation.
pub fn coerce_str(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    let normalised = trimmed.replace(',', ".");
    Decimal::from_str(&normalised)
        .or_else(|_| Decimal::from_scientific(&normalised))
        .map_or(Decimal::ZERO, clamp_non_negative)
}

/// Coerce a float; NaN and infinities become 0
pub fn coerce_f64(raw: f64) -> Decimal {
    if !raw.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(raw).map_or(Decimal::ZERO, clamp_non_negative)
}

/// Coerce an arbitrary JSON value the way a display layer would
pub fn coerce_value(raw: &Value) -> Decimal {
    match raw {
        Value::Number(number) => coerce_str(&number.to_string()),
        Value::String(text) => coerce_str(text),
        _ => Decimal::ZERO,
    }
}

fn clamp_non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Serde adapter for amounts that may arrive as numbers, strings or null
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_value(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::Beneficiary;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn quote_with(values: &[Decimal], total: Decimal) -> QuoteResult {
        QuoteResult {
            total_price: total,
            beneficiaries: values
                .iter()
                .map(|value| Beneficiary {
                    age: 30,
                    age_range_used: "29-33".to_string(),
                    value: *value,
                })
                .collect(),
            ..QuoteResult::default()
        }
    }

    #[test]
    fn test_discount_disabled_or_zero() {
        assert_eq!(compute_discounted_value(dec!(100), false, dec!(50)), dec!(100));
        assert_eq!(compute_discounted_value(dec!(100), true, dec!(0)), dec!(100));
        assert_eq!(compute_discounted_value(dec!(100), true, dec!(-5)), dec!(100));
    }

    #[test]
    fn test_discount_clamped_at_zero() {
        assert_eq!(compute_discounted_value(dec!(100), true, dec!(10)), dec!(90));
        assert_eq!(compute_discounted_value(dec!(100), true, dec!(150)), dec!(0));
        assert_eq!(compute_discounted_value(dec!(100), true, dec!(100)), dec!(0));
    }

    #[test]
    fn test_huge_percentage_does_not_overflow() {
        let settings = DiscountSettings::from_input(true, "1e26");
        assert!(settings.is_active());
        assert_eq!(compute_discounted_value(dec!(1000), true, settings.percent), Decimal::ZERO);

        let quote = quote_with(&[dec!(100), dec!(200)], dec!(300));
        assert_eq!(compute_total(&quote, settings), Decimal::ZERO);
    }

    #[test]
    fn test_large_values_saturate() {
        let halved = compute_discounted_value(Decimal::MAX, true, dec!(50));
        assert!(halved > Decimal::ZERO && halved < Decimal::MAX);

        let quote = quote_with(&[Decimal::MAX, Decimal::MAX], Decimal::ZERO);
        assert_eq!(compute_total(&quote, DiscountSettings::default()), Decimal::MAX);
    }

    #[test]
    fn test_total_with_beneficiaries() {
        let quote = quote_with(&[dec!(100), dec!(200)], dec!(300));
        assert_eq!(compute_total(&quote, DiscountSettings::new(true, dec!(10))), dec!(270));
        assert_eq!(compute_total(&quote, DiscountSettings::new(false, dec!(10))), dec!(300));
    }

    #[test]
    fn test_total_without_beneficiaries_uses_flat_price() {
        let quote = quote_with(&[], dec!(412.37));
        assert_eq!(compute_total(&quote, DiscountSettings::new(true, dec!(10))), dec!(412.37));
    }

    #[test]
    fn test_flat_price_coercion() {
        let quote: QuoteResult = serde_json::from_value(serde_json::json!({
            "operadora": "Amil",
            "plano": "Bronze",
            "preco_total": "abc"
        }))
        .unwrap();
        assert_eq!(compute_total(&quote, DiscountSettings::default()), Decimal::ZERO);

        let quote: QuoteResult = serde_json::from_value(serde_json::json!({
            "operadora": "Amil",
            "plano": "Bronze",
            "preco_total": "512.40"
        }))
        .unwrap();
        assert_eq!(compute_total(&quote, DiscountSettings::default()), dec!(512.40));
    }

    #[test]
    fn test_coercion() {
        assert_eq!(coerce_str("10"), dec!(10));
        assert_eq!(coerce_str(" 12,5 "), dec!(12.5));
        assert_eq!(coerce_str("1e2"), dec!(100));
        assert_eq!(coerce_str("dez"), Decimal::ZERO);
        assert_eq!(coerce_str(""), Decimal::ZERO);
        assert_eq!(coerce_str("-3"), Decimal::ZERO);
        assert_eq!(coerce_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(coerce_f64(f64::INFINITY), Decimal::ZERO);
        assert_eq!(coerce_value(&Value::Null), Decimal::ZERO);
    }

    #[test]
    fn test_settings_from_input() {
        let settings = DiscountSettings::from_input(true, "abc");
        assert!(!settings.is_active());
        assert_eq!(DiscountSettings::from_input(false, "15").effective_percent(), Decimal::ZERO);
        assert_eq!(DiscountSettings::from_input(true, "15").effective_percent(), dec!(15));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1234.5)), "1234,50");
        assert_eq!(format_amount(dec!(0)), "0,00");
        assert_eq!(format_amount(dec!(89.995)), "90,00");
        assert_eq!(format_dot(dec!(50)), "50.00");
    }

    proptest! {
        #[test]
        fn prop_discount_matches_formula(
            cents in 0u64..10_000_000,
            pct_hundredths in 0u32..=10_000,
        ) {
            let base = Decimal::new(i64::try_from(cents).unwrap(), 2);
            let pct = Decimal::new(i64::from(pct_hundredths), 2);

            let discounted = compute_discounted_value(base, true, pct);
            let expected = base * (Decimal::ONE - pct / Decimal::ONE_HUNDRED);

            prop_assert!(discounted >= Decimal::ZERO);
            prop_assert!((discounted - expected).abs() < dec!(0.000001));
        }

        #[test]
        fn prop_disabled_is_identity(cents in -10_000_000i64..10_000_000, pct in -1000i64..1000) {
            let base = Decimal::new(cents, 2);
            prop_assert_eq!(compute_discounted_value(base, false, Decimal::from(pct)), base);
        }
    }
}
