use std::fmt;

use serde::de::{self, Deserializer, Visitor};

/// Money is represented as integer cents so splits and sums stay exact.
/// For USD/EUR, 1 unit = 100 cents, so $20.00 = 2000 cents.
pub type Cents = i64;

/// Largest single amount accepted anywhere: one billion in major units.
/// Keeps ledger totals far from `i64` overflow.
pub const MAX_AMOUNT_CENTS: Cents = 100_000_000_000;

/// Format cents as a plain decimal string.
/// Example: 2000 -> "20.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Format cents with a currency symbol placed after the sign.
/// Example: ("$", -1500) -> "-$15.00"
pub fn format_money(symbol: &str, cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}{}.{:02}", sign, symbol, abs_cents / 100, abs_cents % 100)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
///
/// Digits past the second decimal place are accepted only when they are zero,
/// so no amount is ever silently truncated.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let (units_str, decimal_str) = match input.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (input, ""),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimal_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::Overflow)?
    };

    let (kept, dropped) = decimal_str.split_at(decimal_str.len().min(2));
    if dropped.chars().any(|c| c != '0') {
        return Err(ParseCentsError::TooPrecise);
    }
    let decimal_cents: i64 = match kept.len() {
        0 => 0,
        // "5" after the point means 50 cents
        1 => kept.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        _ => kept.parse().map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    TooPrecise,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::TooPrecise => write!(f, "amount has more than two decimal places"),
            ParseCentsError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

/// Deserialize an amount that may arrive as a JSON number or a JSON string.
///
/// Integers are whole currency units. Floats are read back through their
/// shortest decimal rendering (`20.5` -> `"20.5"`) and parsed like strings, so
/// no binary floating point arithmetic ever touches the amount.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Cents, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}

/// Optional variant of [`deserialize_amount`] for `Option<Cents>` fields.
pub fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<Cents>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OptionalAmount;

    impl<'de> Visitor<'de> for OptionalAmount {
        type Value = Option<Cents>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional money amount")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            deserialize_amount(d).map(Some)
        }
    }

    deserializer.deserialize_option(OptionalAmount)
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Cents;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a money amount as a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cents, E> {
        v.checked_mul(100)
            .ok_or_else(|| E::custom(ParseCentsError::Overflow))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cents, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .ok_or_else(|| E::custom(ParseCentsError::Overflow))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Cents, E> {
        if !v.is_finite() {
            return Err(E::custom(ParseCentsError::InvalidFormat));
        }
        parse_cents(&v.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Cents, E> {
        parse_cents(v).map_err(E::custom)
    }
}
