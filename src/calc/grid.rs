use crate::calc::dates::{
    Span, YearMonth, end_of_day, is_weekend, locale_week_number, weekday_index,
};
use crate::data::{DateHooks, Locale};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Number of cells in a month grid: six weeks of seven days.
pub const GRID_CELLS: usize = 42;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeekNumbers {
    None,
    Locale,
    Iso,
}

/// Everything the grid builder reads. Borrowed from the controller for one
/// render; `today` is passed in so builds are deterministic.
#[derive(Clone, Copy, Debug)]
pub struct GridContext<'a> {
    pub today: NaiveDate,
    pub locale: &'a Locale,
    pub hooks: &'a DateHooks,
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    pub max_span: Option<&'a Span>,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub hover: Option<NaiveDate>,
    pub linked: bool,
    pub single: bool,
    pub week_numbers: WeekNumbers,
    /// `(min_year, max_year)` when month/year dropdowns are shown.
    pub dropdowns: Option<(i32, i32)>,
}

impl GridContext<'_> {
    /// Upper bound for selectable cells. While the end is still being picked
    /// the span limit tightens it.
    pub fn effective_max(&self) -> Option<NaiveDateTime> {
        let mut max = self.max_date;
        if self.end.is_none() {
            if let Some(span) = self.max_span {
                let limit = end_of_day(span.add_to(self.start).date());
                if max.is_none_or(|m| limit < m) {
                    max = Some(limit);
                }
            }
        }
        max
    }

    fn side_min(&self, side: Side) -> Option<NaiveDateTime> {
        match side {
            Side::Left => self.min_date,
            Side::Right => Some(self.start),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub is_other_month: bool,
    pub is_weekend: bool,
    pub is_today: bool,
    pub is_disabled: bool,
    pub is_in_range: bool,
    pub is_start: bool,
    pub is_end: bool,
    pub custom_classes: Vec<String>,
}

impl CalendarCell {
    pub fn is_available(&self) -> bool {
        !self.is_disabled
    }

    /// Space-separated class list, in the order a stylesheet would expect.
    pub fn classes(&self) -> String {
        let mut classes: Vec<&str> = Vec::new();
        if self.is_today {
            classes.push("today");
        }
        if self.is_weekend {
            classes.push("weekend");
        }
        if self.is_other_month {
            classes.push("off");
        }
        if self.is_disabled {
            classes.push("disabled");
        }
        if self.is_start {
            classes.push("active start-date");
        }
        if self.is_end {
            classes.push("active end-date");
        }
        if self.is_in_range {
            classes.push("in-range");
        }
        if !self.is_disabled {
            classes.push("available");
        }
        classes.extend(self.custom_classes.iter().map(String::as_str));
        classes.join(" ")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DropdownOption<T> {
    pub value: T,
    pub label: String,
    pub enabled: bool,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthHeader {
    pub title: String,
    pub prev_available: bool,
    pub next_available: bool,
    pub month_options: Vec<DropdownOption<u32>>,
    pub year_options: Vec<DropdownOption<i32>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalendarMonthView {
    pub side: Side,
    pub month: YearMonth,
    pub header: MonthHeader,
    pub weekdays: Vec<String>,
    /// One entry per row when week numbers are shown.
    pub week_numbers: Option<Vec<u32>>,
    pub cells: Vec<CalendarCell>,
}

impl CalendarMonthView {
    pub fn rows(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CalendarCell> {
        if col >= 7 {
            return None;
        }
        self.cells.get(row * 7 + col)
    }

    /// The in-month cell for `date`, or an overflow cell when the date only
    /// shows up as padding.
    pub fn find(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells
            .iter()
            .find(|c| c.date == date && !c.is_other_month)
            .or_else(|| self.cells.iter().find(|c| c.date == date))
    }
}

/// First cell of the grid: the locale's first weekday on or before the 1st.
pub fn grid_start(month: YearMonth, first_day: chrono::Weekday) -> NaiveDate {
    let first = month.first_day();
    first - Duration::days(weekday_index(first.weekday(), first_day) as i64)
}

pub fn build_month(month: YearMonth, side: Side, ctx: &GridContext<'_>) -> CalendarMonthView {
    let origin = grid_start(month, ctx.locale.first_day);
    let max = ctx.effective_max();
    let start_day = ctx.start.date();
    let end_day = ctx.end.map(|e| e.date());

    let cells: Vec<CalendarCell> = (0..GRID_CELLS as i64)
        .map(|offset| {
            let date = origin + Duration::days(offset);
            let below_min = ctx.min_date.is_some_and(|min| date < min.date());
            let above_max = max.is_some_and(|max| date > max.date());
            let is_disabled = below_min || above_max || ctx.hooks.is_invalid(date);

            let is_in_range = match (end_day, ctx.hover) {
                (Some(end), _) => date > start_day && date < end,
                (None, Some(hover)) => (date > start_day && date < hover) || date == hover,
                (None, None) => false,
            };

            CalendarCell {
                date,
                is_other_month: !month.contains(date),
                is_weekend: is_weekend(date),
                is_today: date == ctx.today,
                is_disabled,
                is_in_range,
                is_start: date == start_day,
                is_end: end_day == Some(date),
                custom_classes: ctx.hooks.custom_classes(date),
            }
        })
        .collect();

    let week_numbers = match ctx.week_numbers {
        WeekNumbers::None => None,
        WeekNumbers::Locale => Some(
            cells
                .chunks(7)
                .map(|row| locale_week_number(row[0].date, ctx.locale.first_day))
                .collect(),
        ),
        WeekNumbers::Iso => Some(cells.chunks(7).map(|row| row[0].date.iso_week().week()).collect()),
    };

    CalendarMonthView {
        side,
        month,
        header: build_header(month, side, ctx, max),
        weekdays: ctx.locale.ordered_days_of_week(),
        week_numbers,
        cells,
    }
}

fn build_header(
    month: YearMonth,
    side: Side,
    ctx: &GridContext<'_>,
    max: Option<NaiveDateTime>,
) -> MonthHeader {
    let min = ctx.side_min(side);
    let prev_available = min.is_none_or(|m| m.date() < month.first_day())
        && (!ctx.linked || side == Side::Left);
    let next_available = max.is_none_or(|m| m.date() > month.last_day())
        && (!ctx.linked || side == Side::Right || ctx.single);

    let (month_options, year_options) = match ctx.dropdowns {
        Some((min_year, max_year)) => {
            let min_ym = min.map(|m| YearMonth::of(m.date()));
            let max_ym = max.map(|m| YearMonth::of(m.date()));
            let first_year = min_ym.map_or(min_year, |m| m.year);
            let last_year = max_ym.map_or(max_year, |m| m.year).max(first_year);

            let months = (1..=12)
                .map(|m| {
                    let ym = YearMonth { year: month.year, month: m };
                    DropdownOption {
                        value: m,
                        label: ctx.locale.month_label(m).to_string(),
                        enabled: min_ym.is_none_or(|lo| ym >= lo) && max_ym.is_none_or(|hi| ym <= hi),
                        selected: m == month.month,
                    }
                })
                .collect();
            let years = (first_year..=last_year)
                .map(|y| DropdownOption {
                    value: y,
                    label: y.to_string(),
                    enabled: true,
                    selected: y == month.year,
                })
                .collect();
            (months, years)
        }
        None => (Vec::new(), Vec::new()),
    };

    MonthHeader {
        title: format!("{} {}", ctx.locale.month_label(month.month), month.year),
        prev_available,
        next_available,
        month_options,
        year_options,
    }
}
