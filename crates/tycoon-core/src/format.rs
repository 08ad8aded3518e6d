//! Number and duration formatting for display.

use serde::{Deserialize, Serialize};

/// How large numbers are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    /// Floored, with thousands separators: `1,234,567`.
    #[default]
    Standard,
    /// One decimal with a magnitude suffix: `1.2M`.
    Compact,
    /// Two-decimal mantissa: `1.23e+6`.
    Scientific,
}

const COMPACT_UNITS: [(f64, &str); 4] = [(1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];

pub fn format_number(value: f64, format: NumberFormat) -> String {
    if value.is_nan() {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }
    match format {
        NumberFormat::Standard => standard(value),
        NumberFormat::Compact => compact(value),
        NumberFormat::Scientific => scientific(value),
    }
}

fn standard(value: f64) -> String {
    let floored = value.floor();
    let digits = format!("{:.0}", floored.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if floored < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn one_decimal(value: f64) -> String {
    let s = format!("{value:.1}");
    match s.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => s,
    }
}

fn compact(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let rounded = |x: f64| (x * 10.0).round() / 10.0;

    let mut idx = match COMPACT_UNITS.iter().rposition(|(scale, _)| abs >= *scale) {
        Some(idx) => idx,
        None if rounded(abs) < 1000.0 => return format!("{sign}{}", one_decimal(rounded(abs))),
        None => 0,
    };
    let mut scaled = rounded(abs / COMPACT_UNITS[idx].0);
    // Rounding can carry into the next unit (999,990 is 1M, not 1000K).
    if scaled >= 1000.0 && idx + 1 < COMPACT_UNITS.len() {
        idx += 1;
        scaled = rounded(abs / COMPACT_UNITS[idx].0);
    }
    format!("{sign}{}{}", one_decimal(scaled), COMPACT_UNITS[idx].1)
}

fn scientific(value: f64) -> String {
    let s = format!("{value:.2e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

/// `Xh Ym Zs`, each part floored.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}h {}m {}s", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_floors_and_groups() {
        assert_eq!(format_number(0.0, NumberFormat::Standard), "0");
        assert_eq!(format_number(999.9, NumberFormat::Standard), "999");
        assert_eq!(format_number(1234567.8, NumberFormat::Standard), "1,234,567");
        assert_eq!(format_number(-1500.0, NumberFormat::Standard), "-1,500");
        assert_eq!(format_number(f64::NAN, NumberFormat::Standard), "0");
    }

    #[test]
    fn compact_uses_suffixes() {
        assert_eq!(format_number(12.34, NumberFormat::Compact), "12.3");
        assert_eq!(format_number(1000.0, NumberFormat::Compact), "1K");
        assert_eq!(format_number(1234.0, NumberFormat::Compact), "1.2K");
        assert_eq!(format_number(1_500_000.0, NumberFormat::Compact), "1.5M");
        assert_eq!(format_number(999_990.0, NumberFormat::Compact), "1M");
        assert_eq!(format_number(2.5e12, NumberFormat::Compact), "2.5T");
        assert_eq!(format_number(-4200.0, NumberFormat::Compact), "-4.2K");
    }

    #[test]
    fn scientific_signs_the_exponent() {
        assert_eq!(format_number(12345.0, NumberFormat::Scientific), "1.23e+4");
        assert_eq!(format_number(0.5, NumberFormat::Scientific), "5.00e-1");
        assert_eq!(format_number(0.0, NumberFormat::Scientific), "0.00e+0");
    }

    #[test]
    fn duration_splits_hours_minutes_seconds() {
        assert_eq!(format_duration(0.0), "0h 0m 0s");
        assert_eq!(format_duration(3725.9), "1h 2m 5s");
    }

    #[test]
    fn format_names_are_lowercase() {
        let json = serde_json::to_string(&NumberFormat::Scientific).unwrap();
        assert_eq!(json, "\"scientific\"");
    }
}
