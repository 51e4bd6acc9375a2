use crate::calendar::CalendarDay;

/// Japanese weekday letters, Monday-first to line up with
/// `Weekday::num_days_from_monday`.
const WEEKDAY_KANJI: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `M/D(曜)`, e.g. `7/21(月)`.
    Short,
    /// `YYYY年M月D日(曜)`, e.g. `2025年7月21日(月)`.
    Long,
    /// `今日` / `明日` / `昨日` / `N日後` / `N日前`, diffed against a
    /// caller-supplied today so the answer cannot drift mid-render.
    Relative,
}

#[must_use]
pub fn weekday_kanji(day: CalendarDay) -> &'static str {
    WEEKDAY_KANJI[day.weekday().num_days_from_monday() as usize]
}

#[must_use]
pub fn format_calendar_day(day: CalendarDay, style: DateStyle, today: CalendarDay) -> String {
    match style {
        DateStyle::Short => format!(
            "{}/{}({})",
            day.month(),
            day.day_of_month(),
            weekday_kanji(day)
        ),
        DateStyle::Long => format!(
            "{}年{}月{}日({})",
            day.year(),
            day.month(),
            day.day_of_month(),
            weekday_kanji(day)
        ),
        DateStyle::Relative => match day.days_since(today) {
            0 => "今日".to_string(),
            1 => "明日".to_string(),
            -1 => "昨日".to_string(),
            n if n > 1 => format!("{n}日後"),
            n => format!("{}日前", -n),
        },
    }
}

/// Render a raw day string. Unparsable input comes back unchanged so a
/// corrupt record still displays something instead of breaking the view.
#[must_use]
pub fn format_day(raw: &str, style: DateStyle, today: CalendarDay) -> String {
    match CalendarDay::parse(raw).day() {
        Some(day) => format_calendar_day(day, style, today),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{DateStyle, format_day, weekday_kanji};
    use crate::calendar::CalendarDay;

    fn day(raw: &str) -> CalendarDay {
        CalendarDay::parse(raw).day().expect("valid test day")
    }

    #[test]
    fn short_and_long_styles_use_unpadded_japanese_forms() {
        let today = day("2025-07-21");
        assert_eq!(format_day("2025-07-21", DateStyle::Short, today), "7/21(月)");
        assert_eq!(
            format_day("2025-07-21", DateStyle::Long, today),
            "2025年7月21日(月)"
        );
        assert_eq!(format_day("2025-01-05", DateStyle::Short, today), "1/5(日)");
    }

    #[test]
    fn relative_style_tracks_the_supplied_today() {
        let target = "2025-07-21";
        assert_eq!(format_day(target, DateStyle::Relative, day("2025-07-21")), "今日");
        assert_eq!(format_day(target, DateStyle::Relative, day("2025-07-20")), "明日");
        assert_eq!(format_day(target, DateStyle::Relative, day("2025-07-22")), "昨日");
        assert_eq!(format_day(target, DateStyle::Relative, day("2025-07-18")), "3日後");
        assert_eq!(format_day(target, DateStyle::Relative, day("2025-07-26")), "5日前");
    }

    #[test]
    fn relative_style_crosses_month_boundaries() {
        assert_eq!(
            format_day("2025-08-01", DateStyle::Relative, day("2025-07-30")),
            "2日後"
        );
    }

    #[test]
    fn unparsable_input_degrades_to_the_raw_string() {
        let today = day("2025-07-21");
        for raw in ["", "garbage", "2025/07/21"] {
            assert_eq!(format_day(raw, DateStyle::Short, today), raw);
            assert_eq!(format_day(raw, DateStyle::Long, today), raw);
            assert_eq!(format_day(raw, DateStyle::Relative, today), raw);
        }
    }

    #[test]
    fn weekday_letters_are_monday_first() {
        assert_eq!(weekday_kanji(day("2025-07-21")), "月");
        assert_eq!(weekday_kanji(day("2025-07-26")), "土");
        assert_eq!(weekday_kanji(day("2025-07-27")), "日");
    }
}
