use crate::error::Error;
use std::path::Path;
use std::time::Duration;

/// Parses a duration of the form `1d 2h 30m`: whitespace-separated tokens,
/// each `<N>` followed by `d`, `h` or `m`, any subset in any order. Empty
/// input parses to a zero duration; callers reject zero where it makes no
/// sense (e.g. a zero-length timeout). Totals past the representable range
/// are rejected rather than wrapped.
pub fn parse_duration(input: &str) -> Result<Duration, Error> {
    let mut total = Duration::ZERO;

    for token in input.to_lowercase().split_whitespace() {
        let (value, unit_secs) = if let Some(value) = token.strip_suffix('d') {
            (value, 24 * 60 * 60)
        } else if let Some(value) = token.strip_suffix('h') {
            (value, 60 * 60)
        } else if let Some(value) = token.strip_suffix('m') {
            (value, 60)
        } else {
            return Err(Error::Validation(format!(
                "Invalid time format: '{}'",
                token
            )));
        };

        let value: u64 = value.parse().map_err(|_| {
            Error::Validation(format!("Invalid time format: '{}'", token))
        })?;
        let secs = value
            .checked_mul(unit_secs)
            .ok_or_else(|| Error::Validation(format!("Duration is too long: '{}'", token)))?;
        total = total
            .checked_add(Duration::from_secs(secs))
            .ok_or_else(|| Error::Validation("Duration is too long.".to_string()))?;
    }

    Ok(total)
}

/// Renders a duration back into `1d 2h 30m` form. Sub-minute leftovers are
/// dropped; a zero duration renders as `0m`.
pub fn human_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    let days = secs / (24 * 60 * 60);
    secs %= 24 * 60 * 60;
    let hours = secs / (60 * 60);
    secs %= 60 * 60;
    let minutes = secs / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{}m", minutes));
    }

    parts.join(" ")
}

/// Loads a plain-text collaborator document (rules, help texts) verbatim.
/// The content is opaque and relayed to users as-is.
pub async fn load_text(path: &Path) -> Result<String, Error> {
    Ok(tokio::fs::read_to_string(path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_units() {
        let parsed = parse_duration("1d 2h 30m").unwrap();
        assert_eq!(
            parsed,
            Duration::from_secs(24 * 60 * 60 + 2 * 60 * 60 + 30 * 60)
        );
    }

    #[test]
    fn order_does_not_matter() {
        assert_eq!(
            parse_duration("30m 1d").unwrap(),
            parse_duration("1d 30m").unwrap()
        );
    }

    #[test]
    fn single_token_and_case() {
        assert_eq!(parse_duration("2H").unwrap(), Duration::from_secs(7200));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!(matches!(
            parse_duration("2x"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn bare_unit_is_rejected() {
        assert!(matches!(parse_duration("d"), Err(Error::Validation(_))));
    }

    #[test]
    fn one_bad_token_fails_the_whole_string() {
        assert!(parse_duration("1d nonsense").is_err());
    }

    #[test]
    fn overflowing_token_is_rejected() {
        assert!(matches!(
            parse_duration("300000000000000000d"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn overflowing_sum_is_rejected() {
        // Each token fits on its own; together they exceed the range.
        assert!(matches!(
            parse_duration("5000000000000000h 5000000000000000h"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(parse_duration("").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("   ").unwrap(), Duration::ZERO);
    }

    #[test]
    fn human_form_round_trips() {
        let parsed = parse_duration("1d 2h 30m").unwrap();
        assert_eq!(human_duration(parsed), "1d 2h 30m");
        assert_eq!(human_duration(Duration::ZERO), "0m");
        assert_eq!(human_duration(Duration::from_secs(59)), "0m");
    }
}
