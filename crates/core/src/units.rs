//! Human-readable byte sizes (binary units).

const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Format a byte count with two-decimal precision, trailing zeros trimmed:
/// `1048576` → `"1 MiB"`, `1248576` → `"1.19 MiB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >= 1u64 << (10 * (unit + 1)) {
        unit += 1;
    }

    let value = bytes as f64 / (1u64 << (10 * unit)) as f64;
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');

    format!("{} {}", trimmed, UNITS[unit])
}

/// Parse the output of [`format_bytes`] back to a byte count, rounding to
/// the nearest byte.
pub fn parse_bytes(value: &str) -> Option<u64> {
    let (number, unit) = value.trim().split_once(' ')?;
    let number: f64 = number.trim().parse().ok()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }

    let unit = unit.trim();
    let exponent = if unit == "Bytes" {
        0
    } else {
        UNITS.iter().position(|u| *u == unit)?
    };

    Some((number * (1u64 << (10 * exponent)) as f64).round() as u64)
}
