use crate::calc::dates::{
    Granularity, Span, YearMonth, checked_add_months, end_of_day, parse_date_time, start_of_day,
};
use crate::data::PresetConfig;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::collections::HashSet;

/// A named shortcut range, already clamped to the picker's bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct RangePreset {
    pub label: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Limits a preset must fit inside.
#[derive(Clone, Copy, Debug)]
pub struct PresetBounds<'a> {
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    pub max_span: Option<&'a Span>,
    pub time_picker: bool,
    pub format: &'a str,
}

/// Result of evaluating a date expression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResolvedDate {
    /// A whole day; starts map to midnight, ends to the last instant.
    Day(NaiveDate),
    Instant(NaiveDateTime),
}

impl ResolvedDate {
    fn as_start(self) -> NaiveDateTime {
        match self {
            ResolvedDate::Day(d) => start_of_day(d),
            ResolvedDate::Instant(dt) => dt,
        }
    }

    fn as_end(self) -> NaiveDateTime {
        match self {
            ResolvedDate::Day(d) => end_of_day(d),
            ResolvedDate::Instant(dt) => dt,
        }
    }
}

/// Evaluates `anchor[(+|-)N(d|w|m|y)]...` against `today`.
///
/// Anchors: `today`, `yesterday`, `tomorrow`, `month_start`, `month_end`,
/// `year_start`, `year_end`. Anything else is parsed as an absolute date
/// with `format`.
pub fn resolve_date_expr(expr: &str, today: NaiveDate, format: &str) -> Option<ResolvedDate> {
    let expr = expr.trim();
    let split = expr.find(['+', '-']).unwrap_or(expr.len());
    let (anchor, offsets) = expr.split_at(split);
    let base = match anchor.trim() {
        "today" => Some(today),
        "yesterday" => today.pred_opt(),
        "tomorrow" => today.succ_opt(),
        "month_start" => Some(YearMonth::of(today).first_day()),
        "month_end" => Some(YearMonth::of(today).last_day()),
        "year_start" => NaiveDate::from_ymd_opt(today.year(), 1, 1),
        "year_end" => NaiveDate::from_ymd_opt(today.year(), 12, 31),
        _ => None,
    };
    let Some(mut date) = base else {
        return parse_date_time(expr, format).map(ResolvedDate::Instant);
    };

    // month_end-1m must land on the previous month's last day, not the 30th.
    let month_end = anchor.trim() == "month_end";
    let mut rest = offsets.trim();
    while !rest.is_empty() {
        let sign = match rest.as_bytes()[0] {
            b'+' => 1,
            b'-' => -1,
            _ => return None,
        };
        rest = &rest[1..];
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 || digits == rest.len() {
            return None;
        }
        let n: i32 = rest[..digits].parse().ok()?;
        let unit = rest[digits..].chars().next()?;
        let step = sign * n;
        date = match unit {
            'd' => date.checked_add_signed(Duration::days(step as i64))?,
            'w' => date.checked_add_signed(Duration::weeks(step as i64))?,
            'm' | 'y' => {
                let months = if unit == 'y' { step.checked_mul(12)? } else { step };
                let shifted = checked_add_months(date, months)?;
                if month_end {
                    YearMonth::of(shifted).last_day()
                } else {
                    shifted
                }
            }
            _ => return None,
        };
        rest = rest[digits + unit.len_utf8()..].trim_start();
    }
    Some(ResolvedDate::Day(date))
}

/// Resolves and clamps the configured presets.
///
/// Each start is raised to `min_date`; the effective maximum is the tighter of
/// `max_date` and `start + max_span`, and each end is lowered to it. A preset
/// is dropped when its end falls before `min_date`, its start after the
/// effective maximum, its end before its start, or an expression does not
/// resolve. Comparisons are per day, or per minute with the time picker.
pub fn build_presets(
    raw: &[PresetConfig],
    today: NaiveDate,
    bounds: &PresetBounds<'_>,
) -> Vec<RangePreset> {
    let granularity = if bounds.time_picker {
        Granularity::Minute
    } else {
        Granularity::Day
    };
    let mut seen = HashSet::new();
    let mut presets = Vec::new();

    for preset in raw {
        if !seen.insert(preset.label.as_str()) {
            tracing::warn!(target: "rangepick::presets", "duplicate preset '{}' skipped", preset.label);
            continue;
        }
        let (Some(start), Some(end)) = (
            resolve_date_expr(&preset.start, today, bounds.format),
            resolve_date_expr(&preset.end, today, bounds.format),
        ) else {
            tracing::warn!(
                target: "rangepick::presets",
                "preset '{}' has an unreadable date ('{}' / '{}')",
                preset.label,
                preset.start,
                preset.end
            );
            continue;
        };
        let mut start = start.as_start();
        let mut end = end.as_end();
        if !bounds.time_picker {
            start = start_of_day(start.date());
            end = end_of_day(end.date());
        }

        if let Some(min) = bounds.min_date {
            if start < min {
                start = min;
            }
        }
        let mut max = bounds.max_date;
        if let Some(span) = bounds.max_span {
            let limit = span.add_to(start);
            if max.is_none_or(|m| limit < m) {
                max = Some(limit);
            }
        }
        if let Some(max) = max {
            if end > max {
                end = max;
            }
        }

        let t = |dt| granularity.truncate(dt);
        let before_min = bounds.min_date.is_some_and(|min| t(end) < t(min));
        let after_max = max.is_some_and(|max| t(start) > t(max));
        if before_min || after_max || t(end) < t(start) {
            tracing::debug!(target: "rangepick::presets", "preset '{}' falls outside the bounds", preset.label);
            continue;
        }
        presets.push(RangePreset {
            label: preset.label.clone(),
            start,
            end,
        });
    }
    presets
}

/// First preset whose start and end match the selection at `granularity`.
pub fn find_active<'a>(
    presets: &'a [RangePreset],
    start: NaiveDateTime,
    end: NaiveDateTime,
    granularity: Granularity,
) -> Option<&'a RangePreset> {
    presets
        .iter()
        .find(|p| granularity.same(p.start, start) && granularity.same(p.end, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bounds<'a>() -> PresetBounds<'a> {
        PresetBounds {
            min_date: None,
            max_date: None,
            max_span: None,
            time_picker: false,
            format: "%m/%d/%Y",
        }
    }

    #[test]
    fn test_resolve_anchors() {
        let today = d(2024, 3, 15);
        assert_eq!(
            resolve_date_expr("today", today, "%m/%d/%Y"),
            Some(ResolvedDate::Day(today))
        );
        assert_eq!(
            resolve_date_expr("yesterday", today, "%m/%d/%Y"),
            Some(ResolvedDate::Day(d(2024, 3, 14)))
        );
        assert_eq!(
            resolve_date_expr("month_start", today, "%m/%d/%Y"),
            Some(ResolvedDate::Day(d(2024, 3, 1)))
        );
        assert_eq!(
            resolve_date_expr("year_end", today, "%m/%d/%Y"),
            Some(ResolvedDate::Day(d(2024, 12, 31)))
        );
    }

    #[test]
    fn test_resolve_offsets() {
        let today = d(2024, 3, 15);
        assert_eq!(
            resolve_date_expr("today-6d", today, "%m/%d/%Y"),
            Some(ResolvedDate::Day(d(2024, 3, 9)))
        );
        assert_eq!(
            resolve_date_expr("today+1w", today, "%m/%d/%Y"),
            Some(ResolvedDate::Day(d(2024, 3, 22)))
        );
        assert_eq!(
            resolve_date_expr("month_start-1m", today, "%m/%d/%Y"),
            Some(ResolvedDate::Day(d(2024, 2, 1)))
        );
        assert_eq!(
            resolve_date_expr("month_end-1m", today, "%m/%d/%Y"),
            Some(ResolvedDate::Day(d(2024, 2, 29)))
        );
    }

    #[test]
    fn test_resolve_absolute_and_invalid() {
        let today = d(2024, 3, 15);
        assert_eq!(
            resolve_date_expr("01/02/2024", today, "%m/%d/%Y"),
            Some(ResolvedDate::Instant(start_of_day(d(2024, 1, 2))))
        );
        assert_eq!(resolve_date_expr("today-6", today, "%m/%d/%Y"), None);
        assert_eq!(resolve_date_expr("today*2d", today, "%m/%d/%Y"), None);
        assert_eq!(resolve_date_expr("someday", today, "%m/%d/%Y"), None);
        assert_eq!(resolve_date_expr("today+999999999y", today, "%m/%d/%Y"), None);
        assert_eq!(resolve_date_expr("month_end+2147483647m", today, "%m/%d/%Y"), None);
    }

    #[test]
    fn test_out_of_range_preset_is_dropped() {
        let raw = vec![
            PresetConfig::new("Far", "today", "today+999999999y"),
            PresetConfig::new("Today", "today", "today"),
        ];
        let presets = build_presets(&raw, d(2024, 3, 15), &bounds());
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].label, "Today");
    }

    #[test]
    fn test_build_presets_keeps_order_and_normalizes_days() {
        let raw = vec![
            PresetConfig::new("Today", "today", "today"),
            PresetConfig::new("Last 7 Days", "today-6d", "today"),
        ];
        let presets = build_presets(&raw, d(2024, 3, 15), &bounds());
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].label, "Today");
        assert_eq!(presets[1].start, start_of_day(d(2024, 3, 9)));
        assert_eq!(presets[1].end, end_of_day(d(2024, 3, 15)));
    }

    #[test]
    fn test_preset_ending_before_min_is_dropped() {
        let raw = vec![
            PresetConfig::new("Last Year", "2023-01-01", "2023-12-31"),
            PresetConfig::new("Today", "today", "today"),
        ];
        let b = PresetBounds {
            min_date: Some(start_of_day(d(2024, 1, 1))),
            ..bounds()
        };
        let presets = build_presets(&raw, d(2024, 3, 15), &b);
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].label, "Today");
    }

    #[test]
    fn test_preset_starting_after_max_is_dropped() {
        let raw = vec![PresetConfig::new("Tomorrow", "tomorrow", "tomorrow")];
        let b = PresetBounds {
            max_date: Some(end_of_day(d(2024, 3, 15))),
            ..bounds()
        };
        assert!(build_presets(&raw, d(2024, 3, 15), &b).is_empty());
    }

    #[test]
    fn test_preset_clamped_to_min_and_span() {
        let raw = vec![PresetConfig::new("Last 30 Days", "today-29d", "today")];
        let span = Span::days(7);
        let b = PresetBounds {
            min_date: Some(start_of_day(d(2024, 3, 1))),
            max_span: Some(&span),
            ..bounds()
        };
        let presets = build_presets(&raw, d(2024, 3, 15), &b);
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].start, start_of_day(d(2024, 3, 1)));
        assert_eq!(presets[0].end, start_of_day(d(2024, 3, 8)));
    }

    #[test]
    fn test_inverted_preset_is_dropped() {
        let raw = vec![PresetConfig::new("Backwards", "today", "today-3d")];
        assert!(build_presets(&raw, d(2024, 3, 15), &bounds()).is_empty());
    }

    #[test]
    fn test_duplicate_and_unreadable_presets_skipped() {
        let raw = vec![
            PresetConfig::new("Today", "today", "today"),
            PresetConfig::new("Today", "yesterday", "yesterday"),
            PresetConfig::new("Broken", "whenever", "today"),
        ];
        let presets = build_presets(&raw, d(2024, 3, 15), &bounds());
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].start, start_of_day(d(2024, 3, 15)));
    }

    #[test]
    fn test_find_active_first_match_wins() {
        let today = d(2024, 3, 15);
        let presets = vec![
            RangePreset {
                label: "A".to_string(),
                start: start_of_day(today),
                end: end_of_day(today),
            },
            RangePreset {
                label: "B".to_string(),
                start: start_of_day(today),
                end: end_of_day(today),
            },
        ];
        let found = find_active(&presets, start_of_day(today), end_of_day(today), Granularity::Day);
        assert_eq!(found.map(|p| p.label.as_str()), Some("A"));
        assert!(
            find_active(&presets, start_of_day(d(2024, 3, 14)), end_of_day(today), Granularity::Day)
                .is_none()
        );
    }
}
