use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// What the time selectors for one side are built from.
#[derive(Clone, Copy, Debug)]
pub struct TimePickerInput {
    pub selected: NaiveDateTime,
    pub min: Option<NaiveDateTime>,
    pub max: Option<NaiveDateTime>,
    pub use_24h: bool,
    pub increment: u32,
    pub include_seconds: bool,
    /// The whole selector is inert (right side while the end is pending).
    pub disabled: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeOption {
    pub value: u32,
    pub label: String,
    pub enabled: bool,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeOptions {
    /// Values are 24-hour hours even when labels are 12-hour.
    pub hours: Vec<TimeOption>,
    pub minutes: Vec<TimeOption>,
    pub seconds: Vec<TimeOption>,
    /// AM (value 0) and PM (value 12); empty in 24-hour mode.
    pub ampm: Vec<TimeOption>,
    pub disabled: bool,
    pub selected: NaiveDateTime,
}

impl TimeOptions {
    pub fn is_pm(&self) -> bool {
        self.selected.hour() >= 12
    }
}

/// Converts a 12-hour clock value (1-12) to 0-23.
pub fn to_24h(hour12: u32, pm: bool) -> u32 {
    match (hour12 % 12, pm) {
        (h, false) => h,
        (h, true) => h + 12,
    }
}

fn at(base: NaiveDateTime, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveTime::from_hms_opt(h, m, s).map_or(base, |t| base.date().and_time(t))
}

/// Builds the hour, minute, second and AM/PM options for one side.
///
/// An hour is disabled when even its last second precedes `min` or its first
/// second follows `max`; minutes are checked the same way within the selected
/// hour, seconds by their exact instant.
pub fn build_time_options(input: &TimePickerInput) -> TimeOptions {
    let sel = input.selected;
    let before_min = |t: NaiveDateTime| input.min.is_some_and(|min| t < min);
    let after_max = |t: NaiveDateTime| input.max.is_some_and(|max| t > max);
    let pm = sel.hour() >= 12;

    let hour_range = if input.use_24h { 0..=23 } else { 1..=12 };
    let hours = hour_range
        .map(|i| {
            let hour = if input.use_24h { i } else { to_24h(i, pm) };
            TimeOption {
                value: hour,
                label: i.to_string(),
                enabled: !before_min(at(sel, hour, 59, 59)) && !after_max(at(sel, hour, 0, 0)),
                selected: hour == sel.hour(),
            }
        })
        .collect();

    let step = input.increment.clamp(1, 60) as usize;
    let minutes = (0..60)
        .step_by(step)
        .map(|m| TimeOption {
            value: m,
            label: format!("{:02}", m),
            enabled: !before_min(at(sel, sel.hour(), m, 59)) && !after_max(at(sel, sel.hour(), m, 0)),
            selected: m == sel.minute(),
        })
        .collect();

    let seconds = if input.include_seconds {
        (0..60)
            .map(|s| {
                let t = at(sel, sel.hour(), sel.minute(), s);
                TimeOption {
                    value: s,
                    label: format!("{:02}", s),
                    enabled: !before_min(t) && !after_max(t),
                    selected: s == sel.second(),
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    let ampm = if input.use_24h {
        Vec::new()
    } else {
        vec![
            TimeOption {
                value: 0,
                label: "AM".to_string(),
                enabled: !before_min(at(sel, 11, 59, 59)),
                selected: !pm,
            },
            TimeOption {
                value: 12,
                label: "PM".to_string(),
                enabled: !after_max(at(sel, 12, 0, 0)),
                selected: pm,
            },
        ]
    };

    TimeOptions {
        hours,
        minutes,
        seconds,
        ampm,
        disabled: input.disabled,
        selected: sel,
    }
}
