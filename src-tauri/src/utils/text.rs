use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

const NEWLINE_MARKER: &str = " ↵ ";
const TAB_MARKER: &str = " ⇥ ";
const ELLIPSIS: char = '…';

/// Single-line rendering of clipboard text for menus and tables.
///
/// Line breaks and tabs become visible markers, whitespace runs collapse to a
/// single space, and the result is capped at `max_len` characters.
pub fn preview(content: &str, max_len: usize) -> String {
    let marked = content
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', NEWLINE_MARKER)
        .replace('\t', TAB_MARKER);
    let collapsed = marked.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_len {
        return collapsed;
    }

    let mut truncated: String = collapsed.chars().take(max_len).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push(ELLIPSIS);
    truncated
}

/// Coarse "how long ago" label. Returns an empty string when `timestamp`
/// cannot be parsed.
pub fn age_label(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_timestamp(timestamp) else {
        return String::new();
    };

    let elapsed = (now - then).num_seconds();
    if elapsed < 60 {
        return "just now".to_string();
    }

    let days = elapsed / 86_400;
    if days > 0 {
        return format!("{days}d ago");
    }
    let hours = elapsed / 3_600;
    if hours > 0 {
        return format!("{hours}h ago");
    }
    format!("{}m ago", elapsed / 60)
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts stored RFC 3339 stamps as well as the naive local-time format
/// written by older ClipFlow databases.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).single().expect("valid date")
    }

    fn ago(seconds: i64) -> String {
        format_timestamp(fixed_now() - Duration::seconds(seconds))
    }

    #[test]
    fn preview_marks_newlines_and_tabs() {
        assert_eq!(preview("line1\nline2", 40), "line1 ↵ line2");
        assert_eq!(preview("a\r\nb", 40), "a ↵ b");
        assert_eq!(preview("key\tvalue", 40), "key ⇥ value");
    }

    #[test]
    fn preview_collapses_whitespace_and_trims() {
        assert_eq!(preview("   hello     world  ", 40), "hello world");
        assert_eq!(preview("", 40), "");
        assert_eq!(preview(" \n ", 40), "↵");
    }

    #[test]
    fn preview_truncates_on_characters() {
        assert_eq!(preview("abcdef", 3), "abc…");
        assert_eq!(preview("abc", 3), "abc");
        assert_eq!(preview("日本語のテキスト", 3), "日本語…");
    }

    #[test]
    fn preview_does_not_leave_space_before_ellipsis() {
        assert_eq!(preview("abc def", 4), "abc…");
    }

    #[test]
    fn age_label_buckets_with_floor_division() {
        let now = fixed_now();
        assert_eq!(age_label(&ago(0), now), "just now");
        assert_eq!(age_label(&ago(59), now), "just now");
        assert_eq!(age_label(&ago(60), now), "1m ago");
        assert_eq!(age_label(&ago(3_599), now), "59m ago");
        assert_eq!(age_label(&ago(3_600), now), "1h ago");
        assert_eq!(age_label(&ago(86_399), now), "23h ago");
        assert_eq!(age_label(&ago(86_400), now), "1d ago");
        assert_eq!(age_label(&ago(3 * 86_400 + 7_200), now), "3d ago");
    }

    #[test]
    fn age_label_treats_future_as_just_now() {
        assert_eq!(age_label(&ago(-600), fixed_now()), "just now");
    }

    #[test]
    fn age_label_is_empty_for_garbage() {
        assert_eq!(age_label("not a date", fixed_now()), "");
        assert_eq!(age_label("", fixed_now()), "");
    }

    #[test]
    fn parses_legacy_naive_timestamps() {
        assert!(parse_timestamp("2024-05-10 11:00:00").is_some());
        assert!(parse_timestamp("2024-05-10 11:00:00.250").is_some());
        assert!(parse_timestamp("2024-05-10T11:00:00").is_some());
    }

    #[test]
    fn formatted_stamps_sort_lexically() {
        let earlier = format_timestamp(fixed_now());
        let later = format_timestamp(fixed_now() + Duration::microseconds(1));
        assert!(earlier < later);
        assert_eq!(parse_timestamp(&later), Some(fixed_now() + Duration::microseconds(1)));
    }
}
