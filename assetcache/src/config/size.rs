//! Human-readable size parsing (e.g., "100MB", "1GB").

use thiserror::Error;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '100MB', '1GB', or '512KB'")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Parse a human-readable size string into bytes.
///
/// Accepts a bare or `B`-suffixed byte count, or a `K`/`KB`, `M`/`MB`, `G`/`GB` suffix
/// (binary multiples), case-insensitive, with optional whitespace.
///
/// # Examples
///
/// ```
/// use assetcache::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1 KB").unwrap(), 1024);
/// assert_eq!(parse_size("100MB").unwrap(), 100 * 1024 * 1024);
/// assert_eq!(parse_size("2g").unwrap(), 2 * 1024 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB), ("B", 1)]
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|rest| (rest.trim().to_string(), *mult)))
        .unwrap_or((upper.clone(), 1));

    if digits.is_empty() {
        return Err(SizeParseError::new(s));
    }

    let value: u64 = digits.parse().map_err(|_| SizeParseError::new(s))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| SizeParseError::new(s))
}

/// Format a byte count as a human-readable string.
///
/// Exact multiples use the largest whole unit; anything else is shown in
/// the largest unit with one decimal.
///
/// ```
/// use assetcache::config::format_size;
///
/// assert_eq!(format_size(100 * 1024 * 1024), "100MB");
/// assert_eq!(format_size(1536), "1.5KB");
/// assert_eq!(format_size(12), "12B");
/// ```
pub fn format_size(bytes: u64) -> String {
    for (unit, size) in [("GB", GB), ("MB", MB), ("KB", KB)] {
        if bytes >= size {
            return if bytes % size == 0 {
                format!("{}{}", bytes / size, unit)
            } else {
                format!("{:.1}{}", bytes as f64 / size as f64, unit)
            };
        }
    }
    format!("{}B", bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_size("10K").unwrap(), 10 * KB);
        assert_eq!(parse_size("10kb").unwrap(), 10 * KB);
        assert_eq!(parse_size("10M").unwrap(), 10 * MB);
        assert_eq!(parse_size(" 3 GB ").unwrap(), 3 * GB);
        assert_eq!(parse_size("12B").unwrap(), 12);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("MB").is_err());
        assert!(parse_size("ten MB").is_err());
        assert!(parse_size("-5MB").is_err());
        assert!(parse_size("1.5GB").is_err());
        assert!(parse_size("B").is_err());
    }

    #[test]
    fn test_parse_overflow() {
        assert!(parse_size("18446744073709551615GB").is_err());
    }

    #[test]
    fn test_error_message_includes_input() {
        let err = parse_size("lots").unwrap_err();
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn test_format_round_trip() {
        for value in [KB, 100 * MB, 2 * GB] {
            assert_eq!(parse_size(&format_size(value)).unwrap(), value);
        }
    }
}
