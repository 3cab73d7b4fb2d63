use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid number '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Trims whitespace and drops `_` and `,` digit grouping.
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace([',', '_'], "")
}

/// Parses a required amount typed on the command line.
///
/// Accepts `50000`, `50,000.50` and `50_000`. Empty input is an error
/// here, unlike the optional variant.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// `None` for empty input, otherwise as [`parse_decimal`].
pub fn parse_optional_decimal(s: &str) -> Result<Option<Decimal>, ParseDecimalError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        parse_decimal(s).map(Some)
    }
}

/// Groups thousands with `.` and uses `,` for decimals (es-AR).
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", decimals as usize, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped},{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// kW below one megawatt, MW from there, one decimal.
pub fn format_power(kw: Decimal) -> String {
    if kw >= Decimal::ONE_THOUSAND {
        format!("{} MW", format_number(kw / Decimal::ONE_THOUSAND, 1))
    } else {
        format!("{} kW", format_number(kw, 1))
    }
}

/// Whole kWh below 1 MWh, then MWh and GWh with one decimal.
pub fn format_energy(kwh: Decimal) -> String {
    let million = Decimal::from(1_000_000);
    if kwh >= million {
        format!("{} GWh", format_number(kwh / million, 1))
    } else if kwh >= Decimal::ONE_THOUSAND {
        format!("{} MWh", format_number(kwh / Decimal::ONE_THOUSAND, 1))
    } else {
        format!("{} kWh", format_number(kwh, 0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Local,
    Usd,
}

/// Whole-unit amount with the currency's symbol.
pub fn format_currency(amount: Decimal, currency: Currency) -> String {
    let symbol = match currency {
        Currency::Local => "$",
        Currency::Usd => "US$",
    };
    format!("{symbol} {}", format_number(amount, 0))
}

/// Two decimals and a trailing `%`.
pub fn format_percentage(value: Decimal) -> String {
    format!("{} %", format_number(value, 2))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_decimal_accepts_grouping() {
        assert_eq!(parse_decimal("50,000.50").unwrap(), dec!(50000.50));
        assert_eq!(parse_decimal(" 50_000 ").unwrap(), dec!(50000));
    }

    #[test]
    fn parse_decimal_rejects_empty_and_garbage() {
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn parse_optional_decimal_treats_blank_as_none() {
        assert_eq!(parse_optional_decimal("  ").unwrap(), None);
        assert_eq!(parse_optional_decimal("12.5").unwrap(), Some(dec!(12.5)));
        assert!(parse_optional_decimal("1.2.3").is_err());
    }

    #[test]
    fn numbers_use_dot_grouping_and_comma_decimals() {
        assert_eq!(format_number(dec!(1234567.891), 2), "1.234.567,89");
        assert_eq!(format_number(dec!(999), 0), "999");
        assert_eq!(format_number(dec!(-4250.5), 0), "-4.251");
        assert_eq!(format_number(dec!(-0.001), 1), "0,0");
    }

    #[test]
    fn power_switches_to_megawatts() {
        assert_eq!(format_power(dec!(4)), "4,0 kW");
        assert_eq!(format_power(dec!(1250)), "1,3 MW");
    }

    #[test]
    fn energy_scales_through_three_units() {
        assert_eq!(format_energy(dec!(425)), "425 kWh");
        assert_eq!(format_energy(dec!(5100)), "5,1 MWh");
        assert_eq!(format_energy(dec!(2500000)), "2,5 GWh");
    }

    #[test]
    fn currency_has_symbol_and_no_cents() {
        assert_eq!(format_currency(dec!(4000000), Currency::Local), "$ 4.000.000");
        assert_eq!(format_currency(dec!(42.5), Currency::Usd), "US$ 43");
    }
}
