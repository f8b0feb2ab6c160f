//! Date window construction.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// The next `lookahead` calendar days starting tomorrow, filtered to
/// business days. The target system never has activity on weekends, so
/// Saturdays and Sundays are excluded by policy.
pub fn business_days_ahead(today: NaiveDate, lookahead: u32) -> Vec<NaiveDate> {
    (1..=i64::from(lookahead))
        .map(|offset| today + Duration::days(offset))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_days_from_friday_excludes_both_weekends() {
        // 2026-08-07 is a Friday; the next 10 calendar days contain two
        // weekends (Aug 8-9 and Aug 15-16).
        let friday = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let window = business_days_ahead(friday, 10);

        assert_eq!(window.len(), 6);
        assert!(window
            .iter()
            .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
        assert_eq!(window[0], NaiveDate::from_ymd_opt(2026, 8, 10).unwrap());
        assert_eq!(*window.last().unwrap(), NaiveDate::from_ymd_opt(2026, 8, 17).unwrap());
    }

    #[test]
    fn test_window_starts_tomorrow_not_today() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        let window = business_days_ahead(wednesday, 3);
        assert_eq!(window[0], NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
        assert!(!window.contains(&wednesday));
    }

    #[test]
    fn test_weekend_only_span_is_empty() {
        // Friday with a 2-day lookahead covers only Sat/Sun.
        let friday = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert!(business_days_ahead(friday, 2).is_empty());
    }
}
