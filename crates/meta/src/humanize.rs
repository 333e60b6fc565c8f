//! Human-readable renderings of file sizes and instants.
//!
//! Sizes use SI (base 1000) units and instants are described relative to
//! "now", e.g. `"2.0 kB"` and `"3 hours ago"`.

use time::UtcDateTime;

const SIZES: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Format a byte count with SI units.
///
/// Anything under ten bytes is printed verbatim. Scaled values below ten
/// keep one decimal, everything else is rounded to a whole number.
///
/// ```
/// assert_eq!(filebin_meta::humanize::bytes(2048), "2.0 kB");
/// assert_eq!(filebin_meta::humanize::bytes(82_854_982), "83 MB");
/// ```
pub fn bytes(size: u64) -> String {
    if size < 10 {
        return format!("{size} B");
    }
    let mut exponent = 0;
    let mut scale = 1u64;
    while exponent < SIZES.len() - 1 && size / scale >= 1000 {
        scale *= 1000;
        exponent += 1;
    }
    let value = (size as f64 / scale as f64 * 10.0 + 0.5).floor() / 10.0;
    match value < 10.0 {
        true => format!("{value:.1} {}", SIZES[exponent]),
        false => format!("{value:.0} {}", SIZES[exponent]),
    }
}

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 12 * MONTH;
const LONG_TIME: i64 = 37 * YEAR;

enum Label {
    Now,
    Fixed(&'static str),
    /// Unit name, and the number of seconds in one unit.
    Count(&'static str, i64),
}

/// Upper bounds (exclusive, in seconds) for each label, in ascending order.
const MAGNITUDES: &[(i64, Label)] = &[
    (1, Label::Now),
    (2, Label::Fixed("1 second")),
    (MINUTE, Label::Count("seconds", 1)),
    (2 * MINUTE, Label::Fixed("1 minute")),
    (HOUR, Label::Count("minutes", MINUTE)),
    (2 * HOUR, Label::Fixed("1 hour")),
    (DAY, Label::Count("hours", HOUR)),
    (2 * DAY, Label::Fixed("1 day")),
    (WEEK, Label::Count("days", DAY)),
    (2 * WEEK, Label::Fixed("1 week")),
    (MONTH, Label::Count("weeks", WEEK)),
    (2 * MONTH, Label::Fixed("1 month")),
    (YEAR, Label::Count("months", MONTH)),
    (18 * MONTH, Label::Fixed("1 year")),
    (2 * YEAR, Label::Fixed("2 years")),
    (LONG_TIME, Label::Count("years", YEAR)),
];

/// Describe `then` relative to `now`, e.g. `"5 minutes ago"` or
/// `"1 day from now"`.
pub fn relative(then: UtcDateTime, now: UtcDateTime) -> String {
    let (diff, suffix) = match then > now {
        true => (then - now, "from now"),
        false => (now - then, "ago"),
    };
    let seconds = diff.whole_seconds();
    let label = MAGNITUDES.iter().find(|(below, _)| seconds < *below).map(|(_, label)| label);
    match label {
        Some(Label::Now) => "now".to_string(),
        Some(Label::Fixed(text)) => format!("{text} {suffix}"),
        Some(Label::Count(unit, per)) => format!("{} {unit} {suffix}", seconds / per),
        None => format!("a long while {suffix}"),
    }
}
