//! Urgency classification of follow-up timestamps.
//!
//! A follow-up cell holds either a timestamp or a placeholder such as
//! "Not Scheduled". [`classify`] buckets it against an explicit `now`; the
//! result is never stored and is recomputed whenever the clock ticks.
//!
//! All calendar-day comparisons and minute differences happen in the time
//! zone of `now`. Timestamps without an offset are read in that zone too.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

/// Upper bound of the due-soon window. The window is closed on both ends.
pub const DUE_SOON_WINDOW: TimeDelta = TimeDelta::minutes(60);

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d %b %Y %H:%M",
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%b %d, %Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p", "%I %p"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowUpCategory {
    Unscheduled,
    DueToday,
    Unparseable,
    Overdue,
    Upcoming,
}

impl FollowUpCategory {
    /// Position of the rule that produces this category. Lower ranks are
    /// checked first.
    pub fn rank(self) -> u8 {
        match self {
            FollowUpCategory::Unscheduled => 1,
            FollowUpCategory::DueToday => 2,
            FollowUpCategory::Unparseable => 3,
            FollowUpCategory::Overdue => 4,
            FollowUpCategory::Upcoming => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FollowUpCategory::Unscheduled => "Not scheduled",
            FollowUpCategory::DueToday => "Today",
            FollowUpCategory::Unparseable => "Invalid date",
            FollowUpCategory::Overdue => "Overdue",
            FollowUpCategory::Upcoming => "Upcoming",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowUpStatus {
    pub category: FollowUpCategory,
    pub is_due_soon: bool,
    pub rank: u8,
}

impl FollowUpStatus {
    pub fn new(category: FollowUpCategory, is_due_soon: bool) -> Self {
        Self {
            category,
            is_due_soon,
            rank: category.rank(),
        }
    }

    /// Whether the cell gets the pulsing cue. Missed follow-ups always pulse.
    pub fn pulses(&self) -> bool {
        match self.category {
            FollowUpCategory::Overdue => true,
            FollowUpCategory::DueToday | FollowUpCategory::Upcoming => self.is_due_soon,
            FollowUpCategory::Unscheduled | FollowUpCategory::Unparseable => false,
        }
    }
}

/// Classifies a raw follow-up value. The first matching rule wins:
///
/// 1. empty, "n/a" or containing "not scheduled": unscheduled
/// 2. containing "today": due today, due soon if it resolves to an instant
///    within the next hour
/// 3. not a date: unparseable
/// 4. an earlier calendar day than `now`: overdue, always due soon
/// 5. otherwise upcoming, due soon within the next hour
pub fn classify<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> FollowUpStatus {
    let raw = raw.trim();
    let lowered = raw.to_lowercase();

    if raw.is_empty() || lowered == "n/a" || lowered.contains("not scheduled") {
        return FollowUpStatus::new(FollowUpCategory::Unscheduled, false);
    }

    if lowered.contains("today") {
        let due_soon = parse_today(raw, now)
            .or_else(|| parse_instant(raw, &now.timezone()))
            .is_some_and(|instant| is_due_soon(&instant, now));
        return FollowUpStatus::new(FollowUpCategory::DueToday, due_soon);
    }

    let Some(instant) = parse_instant(raw, &now.timezone()) else {
        return FollowUpStatus::new(FollowUpCategory::Unparseable, false);
    };

    if instant.date_naive() < now.date_naive() {
        FollowUpStatus::new(FollowUpCategory::Overdue, true)
    } else {
        FollowUpStatus::new(FollowUpCategory::Upcoming, is_due_soon(&instant, now))
    }
}

/// `instant` lies between `now` and `now + 60 minutes`, both ends included.
pub fn is_due_soon<Tz: TimeZone>(instant: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
    let until = instant.clone().signed_duration_since(now);
    until >= TimeDelta::zero() && until <= DUE_SOON_WINDOW
}

/// Reads a timestamp into `zone`. Offsets in the text are honoured, plain
/// local times and bare dates are taken as local to `zone` (bare dates at
/// midnight).
pub fn parse_instant<Tz: TimeZone>(raw: &str, zone: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(zone));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(zone));
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(zone));
        }
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })?;

    // Local times skipped by a DST jump do not exist
    zone.from_local_datetime(&naive).earliest()
}

// "Today, 10:30 AM" style values: the time of day on `now`'s date.
fn parse_today<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let lowered = raw.to_lowercase();
    let start = lowered.find("today")?;
    let rest = format!("{}{}", &lowered[..start], &lowered[start + "today".len()..]);
    let rest = rest
        .trim()
        .trim_start_matches([',', '-'])
        .trim()
        .trim_start_matches("at ")
        .trim();
    if rest.is_empty() {
        return None;
    }

    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&rest.to_uppercase(), fmt).ok())?;
    now.timezone()
        .from_local_datetime(&now.date_naive().and_time(time))
        .earliest()
}

#[cfg(test)]
mod tests {
    use super::FollowUpCategory::*;
    use super::*;
    use chrono::{FixedOffset, Utc};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("Not Scheduled")]
    #[case("follow-up NOT SCHEDULED yet")]
    #[case("n/a")]
    #[case("N/A")]
    fn unscheduled(#[case] raw: &str) {
        let status = classify(raw, &now());
        assert_eq!(status, FollowUpStatus::new(Unscheduled, false));
        assert!(!status.pulses());
    }

    #[test]
    fn unscheduled_takes_precedence_over_today() {
        assert_eq!(classify("not scheduled today", &now()).category, Unscheduled);
    }

    #[rstest]
    #[case("2024-01-01T10:30:00Z", true)] // exactly 60 minutes ahead
    #[case("2024-01-01T10:31:00Z", false)] // 61 minutes ahead
    #[case("2024-01-01T10:00:00Z", true)] // 30 minutes ahead
    #[case("2024-01-01T09:30:00Z", true)] // right now
    #[case("2024-01-01T09:29:00Z", false)] // a minute ago, same day
    #[case("2024-01-01T23:00:00Z", false)]
    #[case("2024-03-05", false)]
    fn upcoming_due_soon_boundaries(#[case] raw: &str, #[case] due_soon: bool) {
        let status = classify(raw, &now());
        assert_eq!(status.category, Upcoming, "{raw}");
        assert_eq!(status.is_due_soon, due_soon, "{raw}");
        assert_eq!(status.pulses(), due_soon);
    }

    #[test]
    fn due_soon_window_counts_seconds() {
        assert!(!classify("2024-01-01T10:30:01Z", &now()).is_due_soon);
    }

    #[rstest]
    #[case("Today", false)]
    #[case("today, 10:15", true)]
    #[case("Today, 10:30 AM", true)]
    #[case("Today at 11:00", false)]
    #[case("Today, 9:00 am", false)]
    #[case("due TODAY", false)]
    fn due_today(#[case] raw: &str, #[case] due_soon: bool) {
        let status = classify(raw, &now());
        assert_eq!(status.category, DueToday, "{raw}");
        assert_eq!(status.is_due_soon, due_soon, "{raw}");
        assert_eq!(status.rank, 2);
    }

    #[test]
    fn overdue_pulses_regardless_of_time_of_day() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        let status = classify("2024-01-01T23:59:00Z", &now);
        assert_eq!(status, FollowUpStatus::new(Overdue, true));
        assert!(status.pulses());
        assert_eq!(classify("2023-12-31", &now).category, Overdue);
    }

    #[test]
    fn same_day_in_the_past_is_not_overdue() {
        let status = classify("2024-01-01T00:01:00Z", &now());
        assert_eq!(status.category, Upcoming);
        assert!(!status.is_due_soon);
    }

    #[rstest]
    #[case("next week")]
    #[case("2024-13-45")]
    #[case("31/31/2024")]
    fn unparseable(#[case] raw: &str) {
        let status = classify(raw, &now());
        assert_eq!(status, FollowUpStatus::new(Unparseable, false));
        assert!(!status.pulses());
    }

    #[test]
    fn calendar_day_uses_the_zone_of_now() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let now = ist.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        // 2024-01-02 01:30 in IST, the previous day in UTC
        let status = classify("2024-01-01T20:00:00Z", &now);
        assert_eq!(status.category, Upcoming);
        // Without an offset the text is read as IST wall time
        let naive = classify("2024-01-02 09:45", &now);
        assert_eq!(naive, FollowUpStatus::new(Upcoming, true));
    }

    #[rstest]
    #[case("2024-01-01T10:00:00+00:00")]
    #[case("2024-01-01 10:00:00")]
    #[case("2024-01-01 10:00:00.250")]
    #[case("2024-01-01T10:00")]
    #[case("01 Jan 2024 10:00")]
    #[case("Jan 01, 2024 10:00 AM")]
    #[case("Mon, 01 Jan 2024 10:00:00 +0000")]
    fn accepted_formats(#[case] raw: &str) {
        let parsed = parse_instant(raw, &Utc);
        assert_eq!(
            parsed.map(|dt| dt.date_naive()),
            NaiveDate::from_ymd_opt(2024, 1, 1),
            "{raw}"
        );
        assert!(classify(raw, &now()).is_due_soon, "{raw}");
    }

    #[test]
    fn ranks_follow_rule_order() {
        let ranks: Vec<u8> = [Unscheduled, DueToday, Unparseable, Overdue, Upcoming]
            .iter()
            .map(|c| c.rank())
            .collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }
}
