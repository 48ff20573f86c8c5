use chrono::NaiveDate;
use dailys_schemas::{DailysConfig, DailysDate, DailysError, DailysResult, EndDate, StartDate, DATE_FORMAT};
use regex::Regex;
use std::collections::BTreeMap;

/// Turns user-supplied date tokens into concrete dates or sentinels.
///
/// Tokens are matched case-insensitively against `earliest`, `latest`,
/// `static`, the configured named dates, then a strict `YYYY-MM-DD` pattern.
pub struct DateAxisResolver {
    date_pattern: Regex,
    named_dates: BTreeMap<String, NaiveDate>,
}

impl DateAxisResolver {
    pub fn new(config: &DailysConfig) -> Self {
        Self {
            date_pattern: Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap(),
            named_dates: config
                .named_dates
                .iter()
                .map(|(name, date)| (name.to_lowercase(), *date))
                .collect(),
        }
    }

    /// Configured aliases, keyed by their lowercase name
    pub fn named_dates(&self) -> &BTreeMap<String, NaiveDate> {
        &self.named_dates
    }

    /// Resolve any token, accepting every sentinel
    pub fn resolve(&self, token: &str) -> DailysResult<DailysDate> {
        match token.to_lowercase().as_str() {
            "earliest" => Ok(DailysDate::Earliest),
            "latest" => Ok(DailysDate::Latest),
            "static" => Ok(DailysDate::Static),
            lower => self.resolve_date(token, lower).map(DailysDate::Day),
        }
    }

    /// Range start: `earliest`, an alias or a date
    pub fn resolve_start(&self, token: &str) -> DailysResult<StartDate> {
        match self.resolve(token)? {
            DailysDate::Earliest => Ok(StartDate::Earliest),
            DailysDate::Day(day) => Ok(StartDate::Day(day)),
            other => Err(not_allowed(token, other, "range start")),
        }
    }

    /// Range end: `latest`, an alias or a date
    pub fn resolve_end(&self, token: &str) -> DailysResult<EndDate> {
        match self.resolve(token)? {
            DailysDate::Latest => Ok(EndDate::Latest),
            DailysDate::Day(day) => Ok(EndDate::Day(day)),
            other => Err(not_allowed(token, other, "range end")),
        }
    }

    /// Single day: anything a range end accepts, plus `static`
    pub fn resolve_day(&self, token: &str) -> DailysResult<DailysDate> {
        match self.resolve(token)? {
            DailysDate::Earliest => Err(not_allowed(token, DailysDate::Earliest, "single day")),
            other => Ok(other),
        }
    }

    fn resolve_date(&self, token: &str, lower: &str) -> DailysResult<NaiveDate> {
        if let Some(date) = self.named_dates.get(lower) {
            return Ok(*date);
        }
        if !self.date_pattern.is_match(token) {
            return Err(DailysError::Validation(format!(
                "'{}' is not a date, a named date or a date keyword",
                token
            )));
        }
        NaiveDate::parse_from_str(token, DATE_FORMAT)
            .map_err(|e| DailysError::Validation(format!("'{}' is not a valid date: {}", token, e)))
    }
}

fn not_allowed(token: &str, resolved: DailysDate, position: &str) -> DailysError {
    DailysError::Validation(format!(
        "'{}' ({}) is not allowed as a {}",
        token, resolved, position
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> DateAxisResolver {
        let mut config = DailysConfig::default();
        config.named_dates.insert(
            "Christmas-2020".to_string(),
            NaiveDate::from_ymd_opt(2020, 12, 25).unwrap(),
        );
        DateAxisResolver::new(&config)
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("EARLIEST").unwrap(), DailysDate::Earliest);
        assert_eq!(resolver.resolve("Latest").unwrap(), DailysDate::Latest);
        assert_eq!(resolver.resolve("static").unwrap(), DailysDate::Static);
    }

    #[test]
    fn test_named_dates_and_explicit_dates() {
        let resolver = resolver();
        let christmas = NaiveDate::from_ymd_opt(2020, 12, 25).unwrap();
        assert_eq!(resolver.resolve("christmas-2020").unwrap(), DailysDate::Day(christmas));
        assert_eq!(resolver.resolve("CHRISTMAS-2020").unwrap(), DailysDate::Day(christmas));
        assert_eq!(resolver.resolve_start("christmas-2020").unwrap(), StartDate::Day(christmas));
        assert_eq!(
            resolver.resolve("2024-02-29").unwrap(),
            DailysDate::Day(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn test_malformed_tokens_fail_validation() {
        let resolver = resolver();
        for token in ["yesterday", "2024-1-01", "2024-13-01", "2023-02-29", " 2024-01-01", ""] {
            assert!(
                matches!(resolver.resolve(token), Err(DailysError::Validation(_))),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_variants_restrict_sentinels() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_start("earliest").unwrap(), StartDate::Earliest);
        assert!(resolver.resolve_start("latest").is_err());
        assert!(resolver.resolve_start("static").is_err());

        assert_eq!(resolver.resolve_end("latest").unwrap(), EndDate::Latest);
        assert!(resolver.resolve_end("earliest").is_err());
        assert!(resolver.resolve_end("static").is_err());

        assert_eq!(resolver.resolve_day("static").unwrap(), DailysDate::Static);
        assert_eq!(resolver.resolve_day("latest").unwrap(), DailysDate::Latest);
        assert!(resolver.resolve_day("earliest").is_err());
    }

    #[test]
    fn test_resolution_is_stable_through_display() {
        let resolver = resolver();
        for token in ["earliest", "latest", "static", "christmas-2020", "2024-01-31"] {
            let resolved = resolver.resolve(token).unwrap();
            assert_eq!(resolver.resolve(&resolved.to_string()).unwrap(), resolved);
        }
        let start = resolver.resolve_start("christmas-2020").unwrap();
        assert_eq!(resolver.resolve_start(&start.to_string()).unwrap(), start);
        let end = resolver.resolve_end("latest").unwrap();
        assert_eq!(resolver.resolve_end(&end.to_string()).unwrap(), end);
    }
}
