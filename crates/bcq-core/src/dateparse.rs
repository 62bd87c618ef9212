//! Natural-language due dates.
//!
//! Everything resolves to `YYYY-MM-DD`. Unrecognized input is returned
//! unchanged so the API can report it.

use chrono::{Datelike, Days, Local, Months, NaiveDate, Weekday};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse relative to today in the local timezone.
pub fn parse(input: &str) -> String {
    parse_from(input, Local::now().date_naive())
}

/// Parse relative to a fixed day.
pub fn parse_from(input: &str, today: NaiveDate) -> String {
    let input = input.trim().to_lowercase();

    let resolved = match input.as_str() {
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        "yesterday" => today.checked_sub_days(Days::new(1)),
        "next week" | "nextweek" => today.checked_add_days(Days::new(7)),
        "next month" | "nextmonth" => today.checked_add_months(Months::new(1)),
        "end of week" | "eow" => Some(next_weekday(today, Weekday::Fri, false)),
        "end of month" | "eom" => end_of_month(today),
        other => parse_relative(other, today),
    };

    match resolved {
        Some(date) => date.format(DATE_FORMAT).to_string(),
        None => input,
    }
}

/// True when the input resolves to a concrete date.
pub fn is_valid(input: &str) -> bool {
    NaiveDate::parse_from_str(&parse(input), DATE_FORMAT).is_ok()
}

fn parse_relative(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(day) = parse_weekday(input) {
        return Some(next_weekday(today, day, input.starts_with("next ")));
    }

    if let Some(days) = input.strip_prefix('+') {
        let days: u64 = days.parse().ok()?;
        return today.checked_add_days(Days::new(days));
    }

    if let Some(rest) = input.strip_prefix("in ") {
        let mut parts = rest.split_whitespace();
        let n: u64 = parts.next()?.parse().ok()?;
        let unit = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        return match unit {
            "day" | "days" => today.checked_add_days(Days::new(n)),
            "week" | "weeks" => today.checked_add_days(Days::new(n.checked_mul(7)?)),
            _ => None,
        };
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT).ok()
}

fn parse_weekday(input: &str) -> Option<Weekday> {
    match input.strip_prefix("next ").unwrap_or(input) {
        "sunday" | "sun" => Some(Weekday::Sun),
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        _ => None,
    }
}

/// Nearest future occurrence of `target`; today's weekday means next week.
/// `force_next` skips this week's occurrence.
fn next_weekday(today: NaiveDate, target: Weekday, force_next: bool) -> NaiveDate {
    let current = today.weekday().num_days_from_sunday() as i64;
    let wanted = target.num_days_from_sunday() as i64;
    let mut days = wanted - current;
    let same_day = days == 0;

    if days <= 0 {
        days += 7;
    }
    if force_next && !same_day {
        days += 7;
    }

    today + chrono::Duration::days(days)
}

fn end_of_month(today: NaiveDate) -> Option<NaiveDate> {
    let first = today.with_day(1)?;
    first
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wednesday
    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 17).unwrap()
    }

    #[test]
    fn keywords() {
        assert_eq!(parse_from("today", day()), "2024-01-17");
        assert_eq!(parse_from("Tomorrow", day()), "2024-01-18");
        assert_eq!(parse_from("yesterday", day()), "2024-01-16");
        assert_eq!(parse_from("next week", day()), "2024-01-24");
        assert_eq!(parse_from("eow", day()), "2024-01-19");
        assert_eq!(parse_from("eom", day()), "2024-01-31");
    }

    #[test]
    fn weekdays() {
        assert_eq!(parse_from("friday", day()), "2024-01-19");
        assert_eq!(parse_from("next friday", day()), "2024-01-26");
        assert_eq!(parse_from("wed", day()), "2024-01-24");
        assert_eq!(parse_from("next wednesday", day()), "2024-01-24");
        assert_eq!(parse_from("monday", day()), "2024-01-22");
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(parse_from("+3", day()), "2024-01-20");
        assert_eq!(parse_from("in 2 days", day()), "2024-01-19");
        assert_eq!(parse_from("in 1 week", day()), "2024-01-24");
    }

    #[test]
    fn huge_offsets_pass_through() {
        assert_eq!(
            parse_from("in 3000000000000000000 weeks", day()),
            "in 3000000000000000000 weeks"
        );
        assert_eq!(parse_from("in 99999999999 days", day()), "in 99999999999 days");
        assert_eq!(parse_from("+99999999999", day()), "+99999999999");
    }

    #[test]
    fn passthrough() {
        assert_eq!(parse_from("2024-12-25", day()), "2024-12-25");
        assert_eq!(parse_from("someday", day()), "someday");
    }

    #[test]
    fn end_of_february_in_leap_year() {
        let feb = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(parse_from("eom", feb), "2024-02-29");
    }
}
