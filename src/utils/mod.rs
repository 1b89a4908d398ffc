//! Shared helpers.

pub mod duration;

pub use duration::{format_age, format_exact, parse_duration};

/// Split a comma-separated value, trimming whitespace and discarding empty segments.
pub fn split_csv(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|part| !part.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::split_csv;

    #[test]
    fn split_csv_drops_blanks() {
        assert_eq!(split_csv(" acme, ,widgets ,"), vec!["acme", "widgets"]);
        assert!(split_csv("").is_empty());
    }
}
