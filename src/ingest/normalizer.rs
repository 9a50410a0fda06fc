//! Numeric cell normalization

/// Coerce a cell of unknown shape into a nullable count.
///
/// Keeps ASCII digits plus a minus sign appearing before the first digit;
/// everything else (thousands separators, currency, footnote marks, spaces)
/// is dropped. An empty result or a lone `-` is null, as is anything that
/// overflows `i64`. Never fails.
pub fn normalize_count(raw: &str) -> Option<i64> {
    let mut kept = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_digit() {
            kept.push(ch);
        } else if ch == '-' && kept.is_empty() {
            kept.push(ch);
        }
    }

    if kept.is_empty() || kept == "-" {
        return None;
    }
    kept.parse().ok()
}

/// Parse a serial-number cell; `None` marks a title, header or footer row.
///
/// Workbook cells may carry the ordinal as a whole float (`3.0`).
pub fn parse_ordinal(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(f as i64)
        }
        _ => None,
    }
}
