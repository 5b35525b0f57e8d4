use crate::calc::dates::{
    Granularity, Rounding, YearMonth, end_of_day, format_date_time, parse_date_time, snap_minutes,
    start_of_day,
};
use crate::calc::grid::{CalendarMonthView, GridContext, Side, WeekNumbers, build_month};
use crate::calc::presets::{PresetBounds, RangePreset, build_presets, find_active};
use crate::calc::time_picker::{TimeOptions, TimePickerInput, build_time_options};
use crate::data::{PickerOptions, PresetConfig};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Where the selection is in its two-click cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing picked since construction or reset.
    AwaitingStart,
    /// A start is picked and the end is cleared.
    AwaitingEnd,
    /// Start and end are both set by a click, preset, or input.
    Complete,
}

/// What a date click did to the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The clicked date became the new start and the end was cleared.
    StartedRange,
    /// The clicked date, on or after the start's day, became the end.
    CommittedEnd,
    /// The clicked date preceded the start's day; the end became a copy of
    /// the start.
    CollapsedToStart,
    /// Single-date mode: start and end both became the clicked date.
    SingleDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresetChoice {
    Applied,
    /// The custom-range entry: dates unchanged, calendars should show.
    CustomRange,
    Unknown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRangeError {
    #[error("no date given")]
    Empty,
    #[error("'{text}' does not match the date format '{format}'")]
    InvalidDate { text: String, format: String },
}

/// The selection state machine. Holds no UI state; views are rebuilt from
/// it on demand.
#[derive(Debug)]
pub struct RangeController {
    options: PickerOptions,
    presets: Vec<RangePreset>,
    today: NaiveDate,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    phase: Phase,
    chosen_label: Option<String>,
    hover: Option<NaiveDate>,
    left_month: YearMonth,
    right_month: YearMonth,
    left_time: NaiveTime,
    right_time: NaiveTime,
    initial: (NaiveDateTime, NaiveDateTime),
}

impl RangeController {
    pub fn new(options: PickerOptions, now: NaiveDateTime) -> Self {
        let today = now.date();
        let left_month = YearMonth::of(options.start_date.date());
        let mut ctl = RangeController {
            presets: Vec::new(),
            today,
            start: options.start_date,
            end: None,
            phase: Phase::AwaitingStart,
            chosen_label: None,
            hover: None,
            left_month,
            right_month: left_month.add(1),
            left_time: options.start_date.time(),
            right_time: options.end_date.time(),
            initial: (options.start_date, options.end_date),
            options,
        };
        ctl.presets = ctl.resolve_presets(&ctl.options.ranges);

        ctl.set_start_date(ctl.options.start_date);
        if ctl.options.single_date_picker {
            ctl.set_end_date(ctl.start);
        } else {
            ctl.set_end_date(ctl.options.end_date);
        }
        ctl.phase = Phase::AwaitingStart;
        ctl.initial = (ctl.start, ctl.end.unwrap_or(ctl.start));
        ctl.calculate_chosen_label();
        tracing::debug!(
            target: "rangepick::controller",
            "initial range {} .. {}",
            ctl.initial.0,
            ctl.initial.1
        );
        ctl
    }

    fn resolve_presets(&self, raw: &[PresetConfig]) -> Vec<RangePreset> {
        let bounds = PresetBounds {
            min_date: self.options.min_date,
            max_date: self.options.max_date,
            max_span: self.options.max_span.as_ref(),
            time_picker: self.options.time_picker,
            format: &self.options.locale.format,
        };
        build_presets(raw, self.today, &bounds)
    }

    pub fn options(&self) -> &PickerOptions {
        &self.options
    }

    pub fn presets(&self) -> &[RangePreset] {
        &self.presets
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn chosen_label(&self) -> Option<&str> {
        self.chosen_label.as_deref()
    }

    pub fn hover(&self) -> Option<NaiveDate> {
        self.hover
    }

    pub fn month(&self, side: Side) -> YearMonth {
        match side {
            Side::Left => self.left_month,
            Side::Right => self.right_month,
        }
    }

    fn round(&self, dt: NaiveDateTime, rounding: Rounding) -> NaiveDateTime {
        snap_minutes(dt, self.options.time_picker_increment, rounding)
    }

    /// Sets the start, snapped to the day or the minute increment and kept
    /// inside `[min_date, max_date]`. An end left before the new start is
    /// pulled up to it.
    pub fn set_start_date(&mut self, dt: NaiveDateTime) {
        let tp = self.options.time_picker;
        let mut start = if tp {
            self.round(dt, Rounding::Nearest)
        } else {
            start_of_day(dt.date())
        };
        if let Some(min) = self.options.min_date {
            if start < min {
                start = if tp { self.round(min, Rounding::Nearest) } else { min };
            }
        }
        if let Some(max) = self.options.max_date {
            if start > max {
                start = if tp { self.round(max, Rounding::Floor) } else { max };
            }
        }
        self.start = start;
        self.left_time = start.time();

        if self.end.is_some_and(|end| end < start) {
            self.set_end_date(start);
        } else {
            self.update_months_in_view();
        }
    }

    /// Sets the end, snapped like the start, then held to
    /// `start <= end <= min(max_date, start + max_span)`.
    pub fn set_end_date(&mut self, dt: NaiveDateTime) {
        let mut end = if self.options.time_picker {
            self.round(dt, Rounding::Nearest)
        } else {
            end_of_day(dt.date())
        };
        if end < self.start {
            end = self.start;
        }
        if let Some(max) = self.options.max_date {
            if end > max {
                end = max;
            }
        }
        if let Some(span) = &self.options.max_span {
            let limit = span.add_to(self.start);
            if limit < end {
                end = limit;
            }
        }
        self.end = Some(end);
        self.right_time = end.time();
        if self.phase == Phase::AwaitingEnd {
            self.phase = Phase::Complete;
        }
        self.update_months_in_view();
    }

    /// Chooses the visible months so the selection can be seen.
    pub fn update_months_in_view(&mut self) {
        let start_month = YearMonth::of(self.start.date());
        let single = self.options.single_date_picker;
        let linked = self.options.linked_calendars;

        match self.end {
            Some(end) => {
                let end_month = YearMonth::of(end.date());
                let visible = |m: YearMonth| m == self.left_month || m == self.right_month;
                if !single && visible(start_month) && visible(end_month) {
                    return;
                }
                self.left_month = start_month;
                self.right_month = if !linked && end_month != start_month {
                    end_month
                } else {
                    start_month.add(1)
                };
            }
            None => {
                if self.left_month != start_month && self.right_month != start_month {
                    self.left_month = start_month;
                    self.right_month = start_month.add(1);
                }
            }
        }

        if let Some(max) = self.options.max_date {
            let max_month = YearMonth::of(max.date());
            if linked && !single && self.right_month > max_month {
                self.right_month = max_month;
                self.left_month = max_month.add(-1);
            }
        }
    }

    fn with_time(&self, date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
        if self.options.time_picker {
            date.and_time(time)
        } else {
            start_of_day(date)
        }
    }

    /// Applies a click on `date`.
    pub fn select_date(&mut self, date: NaiveDate) -> Transition {
        self.hover = None;
        if self.options.single_date_picker {
            self.set_start_date(self.with_time(date, self.left_time));
            self.set_end_date(self.start);
            self.phase = Phase::Complete;
            self.calculate_chosen_label();
            return Transition::SingleDate;
        }

        match self.phase {
            Phase::AwaitingStart | Phase::Complete => {
                self.end = None;
                self.phase = Phase::AwaitingEnd;
                self.set_start_date(self.with_time(date, self.left_time));
                Transition::StartedRange
            }
            Phase::AwaitingEnd if date < self.start.date() => {
                self.set_end_date(self.start);
                self.phase = Phase::Complete;
                self.calculate_chosen_label();
                Transition::CollapsedToStart
            }
            Phase::AwaitingEnd => {
                self.set_end_date(self.with_time(date, self.right_time));
                self.phase = Phase::Complete;
                self.calculate_chosen_label();
                Transition::CommittedEnd
            }
        }
    }

    /// Tracks the pointer while the end is pending; ignored otherwise.
    pub fn hover_date(&mut self, date: Option<NaiveDate>) {
        self.hover = if self.end.is_none() { date } else { None };
    }

    /// Steps one side's month. Linked calendars stay one month apart.
    pub fn navigate_month(&mut self, side: Side, delta: i32) {
        let linked = self.options.linked_calendars;
        match side {
            Side::Left => {
                self.left_month = self.left_month.add(delta);
                if linked {
                    self.right_month = self.left_month.add(1);
                }
            }
            Side::Right => {
                self.right_month = self.right_month.add(delta);
                if linked {
                    self.left_month = self.right_month.add(-1);
                }
            }
        }
    }

    /// Jumps a side to `month`/`year` from the dropdowns. The right side
    /// never shows a month before the start; both stay within min/max.
    pub fn change_month_year(&mut self, side: Side, month: u32, year: i32) {
        let Some(mut target) = YearMonth::new(year, month) else {
            tracing::debug!(target: "rangepick::controller", "ignoring month {} of {}", month, year);
            return;
        };
        if side == Side::Right {
            target = target.max(YearMonth::of(self.start.date()));
        }
        if let Some(min) = self.options.min_date {
            target = target.max(YearMonth::of(min.date()));
        }
        if let Some(max) = self.options.max_date {
            target = target.min(YearMonth::of(max.date()));
        }
        let linked = self.options.linked_calendars;
        match side {
            Side::Left => {
                self.left_month = target;
                if linked {
                    self.right_month = target.add(1);
                }
            }
            Side::Right => {
                self.right_month = target;
                if linked {
                    self.left_month = target.add(-1);
                }
            }
        }
    }

    /// Applies a time selector change. The right side only moves an end
    /// that exists.
    pub fn change_time(&mut self, side: Side, hour: u32, minute: u32, second: u32) {
        let second = if self.options.time_picker_seconds { second } else { 0 };
        let Some(time) = NaiveTime::from_hms_opt(hour, minute, second) else {
            tracing::debug!(
                target: "rangepick::controller",
                "ignoring time {}:{}:{}",
                hour,
                minute,
                second
            );
            return;
        };
        match side {
            Side::Left => {
                self.set_start_date(self.start.date().and_time(time));
                if self.options.single_date_picker {
                    self.end = Some(self.start);
                    self.right_time = self.start.time();
                }
            }
            Side::Right => match self.end {
                Some(end) => self.set_end_date(end.date().and_time(time)),
                None => return,
            },
        }
        if self.end.is_some() {
            self.calculate_chosen_label();
        }
    }

    /// Selects a preset by label.
    pub fn apply_preset(&mut self, label: &str) -> PresetChoice {
        if label == self.options.locale.custom_range_label {
            self.chosen_label = Some(label.to_string());
            return PresetChoice::CustomRange;
        }
        let Some(preset) = self.presets.iter().find(|p| p.label == label).cloned() else {
            tracing::debug!(target: "rangepick::controller", "no preset named '{}'", label);
            return PresetChoice::Unknown;
        };
        let (start, end) = if self.options.time_picker {
            (preset.start, preset.end)
        } else {
            (start_of_day(preset.start.date()), end_of_day(preset.end.date()))
        };
        self.start = start;
        self.end = Some(end);
        self.left_time = start.time();
        self.right_time = end.time();
        self.hover = None;
        self.phase = Phase::Complete;
        self.chosen_label = Some(preset.label);
        self.update_months_in_view();
        PresetChoice::Applied
    }

    /// Back to the range the controller was built with.
    pub fn reset(&mut self) {
        let (start, end) = self.initial;
        self.restore(start, end);
        self.phase = Phase::AwaitingStart;
    }

    /// Puts back a previously committed range without clamping.
    pub fn restore(&mut self, start: NaiveDateTime, end: NaiveDateTime) {
        self.start = start;
        self.end = Some(end);
        self.left_time = start.time();
        self.right_time = end.time();
        self.hover = None;
        if self.phase == Phase::AwaitingEnd {
            self.phase = Phase::Complete;
        }
        self.update_months_in_view();
        self.calculate_chosen_label();
    }

    /// Replaces the preset list and re-derives the active label.
    pub fn set_presets(&mut self, raw: Vec<PresetConfig>) {
        self.presets = self.resolve_presets(&raw);
        self.options.ranges = raw;
        self.calculate_chosen_label();
    }

    fn granularity(&self) -> Granularity {
        match (self.options.time_picker, self.options.time_picker_seconds) {
            (false, _) => Granularity::Day,
            (true, false) => Granularity::Minute,
            (true, true) => Granularity::Second,
        }
    }

    /// Labels the selection with the first matching preset, else the
    /// custom-range entry when the presets menu shows one.
    pub fn calculate_chosen_label(&mut self) {
        let Some(end) = self.end else {
            return;
        };
        if let Some(preset) = find_active(&self.presets, self.start, end, self.granularity()) {
            self.chosen_label = Some(preset.label.clone());
            return;
        }
        self.chosen_label = if self.options.show_custom_range_label && !self.options.ranges.is_empty()
        {
            Some(self.options.locale.custom_range_label.clone())
        } else {
            None
        };
    }

    pub fn is_custom_range(&self) -> bool {
        match self.end {
            Some(end) => find_active(&self.presets, self.start, end, self.granularity()).is_none(),
            None => true,
        }
    }

    pub fn grid_context(&self) -> GridContext<'_> {
        let week_numbers = if self.options.show_week_numbers {
            WeekNumbers::Locale
        } else if self.options.show_iso_week_numbers {
            WeekNumbers::Iso
        } else {
            WeekNumbers::None
        };
        GridContext {
            today: self.today,
            locale: &self.options.locale,
            hooks: &self.options.hooks,
            min_date: self.options.min_date,
            max_date: self.options.max_date,
            max_span: self.options.max_span.as_ref(),
            start: self.start,
            end: self.end,
            hover: self.hover,
            linked: self.options.linked_calendars,
            single: self.options.single_date_picker,
            week_numbers,
            dropdowns: self
                .options
                .show_dropdowns
                .then_some((self.options.min_year, self.options.max_year)),
        }
    }

    pub fn left_view(&self) -> CalendarMonthView {
        build_month(self.left_month, Side::Left, &self.grid_context())
    }

    pub fn right_view(&self) -> CalendarMonthView {
        build_month(self.right_month, Side::Right, &self.grid_context())
    }

    pub fn view(&self, side: Side) -> CalendarMonthView {
        match side {
            Side::Left => self.left_view(),
            Side::Right => self.right_view(),
        }
    }

    fn time_max(&self) -> Option<NaiveDateTime> {
        let mut max = self.options.max_date;
        if let Some(span) = &self.options.max_span {
            let limit = span.add_to(self.start);
            if max.is_none_or(|m| limit < m) {
                max = Some(limit);
            }
        }
        max
    }

    /// Time selector contents for `side`, or None without a time picker.
    pub fn time_options(&self, side: Side) -> Option<TimeOptions> {
        if !self.options.time_picker {
            return None;
        }
        if side == Side::Right && self.options.single_date_picker {
            return None;
        }
        let max = self.time_max();
        let (selected, min, disabled) = match side {
            Side::Left => (self.start, self.options.min_date, false),
            Side::Right => {
                let mut selected = self
                    .end
                    .unwrap_or_else(|| self.start.date().and_time(self.right_time));
                if selected < self.start {
                    selected = self.start;
                }
                if let Some(max) = max {
                    if selected > max {
                        selected = max;
                    }
                }
                (selected, Some(self.start), self.end.is_none())
            }
        };
        Some(build_time_options(&TimePickerInput {
            selected,
            min,
            max,
            use_24h: self.options.time_picker_24_hour,
            increment: self.options.time_picker_increment,
            include_seconds: self.options.time_picker_seconds,
            disabled,
        }))
    }

    /// The apply button is usable once the range is complete and ordered.
    pub fn apply_enabled(&self) -> bool {
        self.options.single_date_picker || self.end.is_some_and(|end| self.start <= end)
    }

    fn format(&self, dt: NaiveDateTime) -> String {
        format_date_time(dt, &self.options.locale.format)
    }

    /// Text for the selection summary next to the buttons.
    pub fn selected_text(&self) -> String {
        match self.end {
            Some(end) => format!(
                "{}{}{}",
                self.format(self.start),
                self.options.locale.separator,
                self.format(end)
            ),
            None => self.format(self.start),
        }
    }

    /// Value written into a bound text input.
    pub fn element_text(&self) -> String {
        if self.options.single_date_picker {
            return self.format(self.start);
        }
        format!(
            "{}{}{}",
            self.format(self.start),
            self.options.locale.separator,
            self.format(self.end.unwrap_or(self.start))
        )
    }

    /// Parses free text like `03/01/2024 - 03/09/2024`. A single date, or
    /// any single-date-mode text, gives `start == end`.
    pub fn parse_input(&self, text: &str) -> Result<(NaiveDateTime, NaiveDateTime), ParseRangeError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseRangeError::Empty);
        }
        let format = &self.options.locale.format;
        let parse = |part: &str| {
            parse_date_time(part, format).ok_or_else(|| ParseRangeError::InvalidDate {
                text: part.trim().to_string(),
                format: format.clone(),
            })
        };
        let parts: Vec<&str> = text.split(self.options.locale.separator.as_str()).collect();
        if !self.options.single_date_picker && parts.len() == 2 {
            Ok((parse(parts[0])?, parse(parts[1])?))
        } else {
            let date = parse(text)?;
            Ok((date, date))
        }
    }

    /// Parses `text` and, when it reads, makes it the selection. On error
    /// the selection is left untouched.
    pub fn apply_input(&mut self, text: &str) -> Result<(), ParseRangeError> {
        let (start, end) = self.parse_input(text)?;
        self.end = None;
        self.set_start_date(start);
        self.set_end_date(end);
        self.hover = None;
        self.phase = Phase::Complete;
        self.calculate_chosen_label();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::dates::Span;
    use crate::data::PickerConfig;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dt(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
        d(y, m, day).and_hms_opt(h, min, 0).unwrap()
    }

    fn now() -> NaiveDateTime {
        dt(2024, 3, 15, 9, 30)
    }

    fn controller(cfg: PickerConfig) -> RangeController {
        RangeController::new(PickerOptions::from_config(&cfg, now()), now())
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn test_new_defaults_to_today() {
        let ctl = controller(PickerConfig::default());
        assert_eq!(ctl.start(), start_of_day(d(2024, 3, 15)));
        assert_eq!(ctl.end().unwrap().date(), d(2024, 3, 15));
        assert_eq!(ctl.phase(), Phase::AwaitingStart);
        assert_eq!(ctl.month(Side::Left), ym(2024, 3));
        assert_eq!(ctl.month(Side::Right), ym(2024, 4));
        assert!(ctl.chosen_label().is_none());
    }

    #[test]
    fn test_construction_clamps_start_up_to_min() {
        let ctl = controller(PickerConfig {
            min_date: Some("2024-01-10".to_string()),
            max_date: Some("2024-01-20".to_string()),
            start_date: Some("2024-01-05".to_string()),
            end_date: Some("2024-01-12".to_string()),
            ..PickerConfig::default()
        });
        assert_eq!(ctl.start(), start_of_day(d(2024, 1, 10)));
        assert_eq!(ctl.end().unwrap().date(), d(2024, 1, 12));
    }

    #[test]
    fn test_single_date_click_sets_both() {
        let mut ctl = controller(PickerConfig {
            single_date_picker: true,
            ..PickerConfig::default()
        });
        assert_eq!(ctl.select_date(d(2024, 3, 15)), Transition::SingleDate);
        assert_eq!(ctl.start().date(), d(2024, 3, 15));
        assert_eq!(ctl.end().unwrap().date(), d(2024, 3, 15));
        assert_eq!(ctl.phase(), Phase::Complete);
        assert!(ctl.apply_enabled());
    }

    #[test]
    fn test_start_rounds_to_nearest_increment() {
        let mut ctl = controller(PickerConfig {
            time_picker: true,
            time_picker_increment: 15,
            ..PickerConfig::default()
        });
        ctl.set_start_date(dt(2024, 1, 1, 10, 7));
        assert_eq!(ctl.start(), dt(2024, 1, 1, 10, 0));
    }

    #[test]
    fn test_click_before_start_collapses_to_start() {
        let mut ctl = controller(PickerConfig::default());
        assert_eq!(ctl.select_date(d(2024, 2, 1)), Transition::StartedRange);
        assert!(ctl.end().is_none());
        assert_eq!(ctl.phase(), Phase::AwaitingEnd);
        assert_eq!(ctl.select_date(d(2024, 1, 25)), Transition::CollapsedToStart);
        assert_eq!(ctl.start().date(), d(2024, 2, 1));
        assert_eq!(ctl.end().unwrap().date(), d(2024, 2, 1));
        assert_eq!(ctl.phase(), Phase::Complete);
    }

    #[test]
    fn test_max_span_caps_clicked_end() {
        let mut ctl = controller(PickerConfig {
            max_span: Some(Span::days(3)),
            ..PickerConfig::default()
        });
        ctl.select_date(d(2024, 1, 1));
        assert_eq!(ctl.select_date(d(2024, 1, 10)), Transition::CommittedEnd);
        assert_eq!(ctl.end().unwrap().date(), d(2024, 1, 4));
    }

    #[test]
    fn test_set_end_past_span_lands_exactly_on_span() {
        let span = Span::days(5);
        let mut ctl = controller(PickerConfig {
            max_span: Some(span.clone()),
            ..PickerConfig::default()
        });
        for start in [d(2024, 1, 1), d(2024, 2, 27), d(2024, 12, 30)] {
            ctl.set_start_date(start_of_day(start));
            let past = span.add_to(start_of_day(start)) + chrono::Duration::days(1);
            ctl.set_end_date(past);
            assert_eq!(ctl.end(), Some(span.add_to(ctl.start())));
        }
    }

    #[test]
    fn test_oversized_span_saturates_instead_of_panicking() {
        let mut opts = PickerOptions::from_config(&PickerConfig::default(), now());
        opts.max_span = Some(Span::days(4_000_000_000));
        let mut ctl = RangeController::new(opts, now());
        ctl.select_date(d(2024, 3, 10));
        assert_eq!(ctl.select_date(d(2024, 3, 20)), Transition::CommittedEnd);
        assert_eq!(ctl.end().unwrap().date(), d(2024, 3, 20));
        let view = ctl.left_view();
        assert_eq!(view.cells.len(), 42);
    }

    #[test]
    fn test_set_start_is_idempotent_inside_bounds() {
        let mut ctl = controller(PickerConfig {
            time_picker: true,
            time_picker_increment: 15,
            min_date: Some("2024-01-01".to_string()),
            max_date: Some("2024-12-31".to_string()),
            ..PickerConfig::default()
        });
        let t = dt(2024, 6, 1, 10, 45);
        ctl.set_start_date(t);
        let first = ctl.start();
        ctl.set_start_date(first);
        assert_eq!(first, t);
        assert_eq!(ctl.start(), first);
    }

    #[test]
    fn test_start_clamped_down_to_max_floors_minutes() {
        let mut ctl = controller(PickerConfig {
            time_picker: true,
            time_picker_increment: 15,
            max_date: Some("2024-06-01T10:50:00".to_string()),
            ..PickerConfig::default()
        });
        ctl.set_start_date(dt(2024, 7, 1, 0, 0));
        assert_eq!(ctl.start(), dt(2024, 6, 1, 10, 45));
    }

    #[test]
    fn test_start_never_passes_end() {
        let mut ctl = controller(PickerConfig::default());
        let steps: Vec<Box<dyn Fn(&mut RangeController)>> = vec![
            Box::new(|c: &mut RangeController| c.set_start_date(start_of_day(d(2024, 5, 1)))),
            Box::new(|c: &mut RangeController| c.set_end_date(start_of_day(d(2024, 4, 1)))),
            Box::new(|c: &mut RangeController| {
                c.select_date(d(2024, 6, 10));
            }),
            Box::new(|c: &mut RangeController| {
                c.select_date(d(2024, 6, 2));
            }),
            Box::new(|c: &mut RangeController| c.change_time(Side::Left, 23, 0, 0)),
            Box::new(|c: &mut RangeController| {
                let _ = c.apply_input("07/09/2024 - 07/01/2024");
            }),
            Box::new(|c: &mut RangeController| c.reset()),
        ];
        for step in steps {
            step(&mut ctl);
            if let Some(end) = ctl.end() {
                assert!(ctl.start() <= end);
            }
        }
    }

    #[test]
    fn test_click_with_time_picker_uses_selector_times() {
        let mut ctl = controller(PickerConfig {
            time_picker: true,
            time_picker_24_hour: true,
            ..PickerConfig::default()
        });
        ctl.change_time(Side::Left, 8, 30, 0);
        ctl.change_time(Side::Right, 18, 0, 0);
        ctl.select_date(d(2024, 3, 20));
        assert_eq!(ctl.start(), dt(2024, 3, 20, 8, 30));
        ctl.select_date(d(2024, 3, 22));
        assert_eq!(ctl.end(), Some(dt(2024, 3, 22, 18, 0)));
    }

    #[test]
    fn test_same_day_end_before_start_time_becomes_start() {
        let mut ctl = controller(PickerConfig {
            time_picker: true,
            ..PickerConfig::default()
        });
        ctl.change_time(Side::Right, 6, 0, 0);
        ctl.change_time(Side::Left, 12, 0, 0);
        ctl.select_date(d(2024, 3, 20));
        ctl.select_date(d(2024, 3, 20));
        assert_eq!(ctl.end(), Some(ctl.start()));
    }

    #[test]
    fn test_right_time_ignored_while_end_pending() {
        let mut ctl = controller(PickerConfig {
            time_picker: true,
            ..PickerConfig::default()
        });
        ctl.select_date(d(2024, 3, 20));
        ctl.change_time(Side::Right, 14, 0, 0);
        assert!(ctl.end().is_none());
        assert!(ctl.time_options(Side::Right).unwrap().disabled);
        assert!(!ctl.time_options(Side::Left).unwrap().disabled);
    }

    #[test]
    fn test_hover_only_tracked_while_end_pending() {
        let mut ctl = controller(PickerConfig::default());
        ctl.hover_date(Some(d(2024, 3, 20)));
        assert!(ctl.hover().is_none());
        ctl.select_date(d(2024, 3, 18));
        ctl.hover_date(Some(d(2024, 3, 20)));
        assert_eq!(ctl.hover(), Some(d(2024, 3, 20)));
        assert!(ctl.left_view().find(d(2024, 3, 19)).unwrap().is_in_range);
        ctl.select_date(d(2024, 3, 20));
        assert!(ctl.hover().is_none());
    }

    #[test]
    fn test_months_follow_selection() {
        let mut ctl = controller(PickerConfig::default());
        ctl.select_date(d(2024, 7, 4));
        assert_eq!(ctl.month(Side::Left), ym(2024, 7));
        assert_eq!(ctl.month(Side::Right), ym(2024, 8));
        // End already visible on the right: nothing moves.
        ctl.select_date(d(2024, 8, 2));
        assert_eq!(ctl.month(Side::Left), ym(2024, 7));
    }

    #[test]
    fn test_unlinked_calendars_show_end_month() {
        let mut ctl = controller(PickerConfig {
            linked_calendars: false,
            ..PickerConfig::default()
        });
        ctl.select_date(d(2024, 3, 4));
        ctl.select_date(d(2024, 9, 2));
        assert_eq!(ctl.month(Side::Left), ym(2024, 3));
        assert_eq!(ctl.month(Side::Right), ym(2024, 9));
    }

    #[test]
    fn test_linked_months_stay_before_max() {
        let ctl = controller(PickerConfig {
            max_date: Some("2024-03-20".to_string()),
            ..PickerConfig::default()
        });
        assert_eq!(ctl.month(Side::Right), ym(2024, 3));
        assert_eq!(ctl.month(Side::Left), ym(2024, 2));
    }

    #[test]
    fn test_navigate_linked_and_unlinked() {
        let mut ctl = controller(PickerConfig::default());
        ctl.navigate_month(Side::Left, -1);
        assert_eq!(ctl.month(Side::Left), ym(2024, 2));
        assert_eq!(ctl.month(Side::Right), ym(2024, 3));
        ctl.navigate_month(Side::Right, 2);
        assert_eq!(ctl.month(Side::Left), ym(2024, 4));

        let mut ctl = controller(PickerConfig {
            linked_calendars: false,
            ..PickerConfig::default()
        });
        ctl.navigate_month(Side::Right, 3);
        assert_eq!(ctl.month(Side::Left), ym(2024, 3));
        assert_eq!(ctl.month(Side::Right), ym(2024, 7));
    }

    #[test]
    fn test_change_month_year_clamps() {
        let mut ctl = controller(PickerConfig {
            min_date: Some("2023-06-01".to_string()),
            max_date: Some("2025-02-01".to_string()),
            ..PickerConfig::default()
        });
        ctl.change_month_year(Side::Left, 1, 2020);
        assert_eq!(ctl.month(Side::Left), ym(2023, 6));
        assert_eq!(ctl.month(Side::Right), ym(2023, 7));
        ctl.change_month_year(Side::Right, 1, 2024);
        assert_eq!(ctl.month(Side::Right), ym(2024, 3));
        assert_eq!(ctl.month(Side::Left), ym(2024, 2));
        ctl.change_month_year(Side::Left, 12, 2030);
        assert_eq!(ctl.month(Side::Left), ym(2025, 2));
        ctl.change_month_year(Side::Left, 13, 2024);
        assert_eq!(ctl.month(Side::Left), ym(2025, 2));
    }

    fn with_presets() -> PickerConfig {
        PickerConfig {
            ranges: vec![
                PresetConfig::new("Today", "today", "today"),
                PresetConfig::new("Last 7 Days", "today-6d", "today"),
            ],
            ..PickerConfig::default()
        }
    }

    #[test]
    fn test_initial_label_matches_preset() {
        let ctl = controller(with_presets());
        assert_eq!(ctl.chosen_label(), Some("Today"));
        assert!(!ctl.is_custom_range());
    }

    #[test]
    fn test_apply_preset_sets_range_and_label() {
        let mut ctl = controller(with_presets());
        assert_eq!(ctl.apply_preset("Last 7 Days"), PresetChoice::Applied);
        assert_eq!(ctl.start(), start_of_day(d(2024, 3, 9)));
        assert_eq!(ctl.end(), Some(end_of_day(d(2024, 3, 15))));
        assert_eq!(ctl.chosen_label(), Some("Last 7 Days"));
        assert_eq!(ctl.apply_preset("Next Decade"), PresetChoice::Unknown);
        assert_eq!(ctl.start(), start_of_day(d(2024, 3, 9)));
    }

    #[test]
    fn test_custom_range_label() {
        let mut ctl = controller(with_presets());
        assert_eq!(ctl.apply_preset("Custom Range"), PresetChoice::CustomRange);
        assert_eq!(ctl.chosen_label(), Some("Custom Range"));
        ctl.select_date(d(2024, 3, 1));
        ctl.select_date(d(2024, 3, 3));
        assert_eq!(ctl.chosen_label(), Some("Custom Range"));
        assert!(ctl.is_custom_range());
    }

    #[test]
    fn test_no_custom_label_without_presets_menu() {
        let mut ctl = controller(PickerConfig::default());
        ctl.select_date(d(2024, 3, 1));
        ctl.select_date(d(2024, 3, 3));
        assert!(ctl.chosen_label().is_none());
    }

    #[test]
    fn test_set_presets_rederives_label() {
        let mut ctl = controller(PickerConfig::default());
        assert!(ctl.chosen_label().is_none());
        ctl.set_presets(vec![PresetConfig::new("Today", "today", "today")]);
        assert_eq!(ctl.presets().len(), 1);
        assert_eq!(ctl.chosen_label(), Some("Today"));
    }

    #[test]
    fn test_reset_restores_initial_range() {
        let mut ctl = controller(with_presets());
        ctl.select_date(d(2024, 1, 2));
        ctl.hover_date(Some(d(2024, 1, 5)));
        ctl.reset();
        assert_eq!(ctl.start(), start_of_day(d(2024, 3, 15)));
        assert_eq!(ctl.end().unwrap().date(), d(2024, 3, 15));
        assert!(ctl.hover().is_none());
        assert_eq!(ctl.phase(), Phase::AwaitingStart);
        assert_eq!(ctl.chosen_label(), Some("Today"));
    }

    #[test]
    fn test_parse_input_two_parts() {
        let ctl = controller(PickerConfig::default());
        let (start, end) = ctl.parse_input("03/01/2024 - 03/09/2024").unwrap();
        assert_eq!(start, start_of_day(d(2024, 3, 1)));
        assert_eq!(end, start_of_day(d(2024, 3, 9)));
        let (start, end) = ctl.parse_input("03/05/2024").unwrap();
        assert_eq!(start, end);
    }

    #[test]
    fn test_parse_input_errors() {
        let ctl = controller(PickerConfig::default());
        assert_eq!(ctl.parse_input("   "), Err(ParseRangeError::Empty));
        match ctl.parse_input("03/01/2024 - soon") {
            Err(ParseRangeError::InvalidDate { text, .. }) => assert_eq!(text, "soon"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_apply_input_keeps_state_on_error() {
        let mut ctl = controller(PickerConfig::default());
        let before = (ctl.start(), ctl.end());
        assert!(ctl.apply_input("garbage").is_err());
        assert_eq!((ctl.start(), ctl.end()), before);
        ctl.apply_input("03/01/2024 - 03/09/2024").unwrap();
        assert_eq!(ctl.start(), start_of_day(d(2024, 3, 1)));
        assert_eq!(ctl.end(), Some(end_of_day(d(2024, 3, 9))));
    }

    #[test]
    fn test_texts() {
        let mut ctl = controller(PickerConfig::default());
        assert_eq!(ctl.element_text(), "03/15/2024 - 03/15/2024");
        ctl.select_date(d(2024, 3, 18));
        assert_eq!(ctl.selected_text(), "03/18/2024");
        assert!(!ctl.apply_enabled());
        ctl.select_date(d(2024, 3, 19));
        assert_eq!(ctl.selected_text(), "03/18/2024 - 03/19/2024");
        assert!(ctl.apply_enabled());
    }

    #[test]
    fn test_time_options_right_side_bounded_by_start() {
        let mut ctl = controller(PickerConfig {
            time_picker: true,
            time_picker_24_hour: true,
            ..PickerConfig::default()
        });
        ctl.select_date(d(2024, 3, 20));
        ctl.change_time(Side::Left, 10, 0, 0);
        ctl.select_date(d(2024, 3, 20));
        let right = ctl.time_options(Side::Right).unwrap();
        assert!(!right.disabled);
        assert!(!right.hours[9].enabled);
        assert!(right.hours[10].enabled);
        assert!(ctl.time_options(Side::Left).unwrap().hours[0].enabled);
    }

    #[test]
    fn test_time_options_absent_without_time_picker() {
        let ctl = controller(PickerConfig::default());
        assert!(ctl.time_options(Side::Left).is_none());
    }
}
