use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use rangepick::calc::{CalendarMonthView, RangeController, Side, YearMonth, build_month};
use rangepick::data::{PickerConfig, PickerOptions};

pub fn run(month: &str) -> Result<()> {
    let Some(month) = YearMonth::parse(month) else {
        bail!("'{}' is not a month; expected YYYY-MM", month);
    };
    let config = PickerConfig::load()?;
    let now = Local::now().naive_local();
    let controller = RangeController::new(PickerOptions::from_config(&config, now), now);
    let view = build_month(month, Side::Left, &controller.grid_context());
    write_month(&view, &mut std::io::stdout())
}

/// Prints one calendar grid. Range ends are marked `*`, days inside the
/// range `+`, and unavailable days `x`; padding days are left blank.
pub(crate) fn write_month<W: std::io::Write>(view: &CalendarMonthView, out: &mut W) -> Result<()> {
    let weeks = view.week_numbers.is_some();
    let width = 7 * 4 + if weeks { 4 } else { 0 };
    writeln!(out, "{:^width$}", view.header.title, width = width)?;

    let mut header = String::new();
    if weeks {
        header.push_str("    ");
    }
    for day in &view.weekdays {
        let short: String = day.chars().take(2).collect();
        header.push_str(&format!("{:>3} ", short));
    }
    writeln!(out, "{}", header.trim_end())?;

    for (r, row) in view.rows().enumerate() {
        let mut line = String::new();
        if let Some(numbers) = &view.week_numbers {
            line.push_str(&format!("{:>3} ", numbers.get(r).copied().unwrap_or_default()));
        }
        for cell in row {
            if cell.is_other_month {
                line.push_str("    ");
                continue;
            }
            let marker = if cell.is_start || cell.is_end {
                '*'
            } else if cell.is_in_range {
                '+'
            } else if cell.is_disabled {
                'x'
            } else {
                ' '
            };
            line.push_str(&format!("{:>3}{}", cell.date.day(), marker));
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn render(cfg: PickerConfig, month: YearMonth) -> String {
        let controller = RangeController::new(PickerOptions::from_config(&cfg, now()), now());
        let view = build_month(month, Side::Left, &controller.grid_context());
        let mut buf = Vec::new();
        write_month(&view, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    #[test]
    fn test_write_month_title_and_header() {
        let out = render(PickerConfig::default(), march());
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap().trim(), "Mar 2024");
        assert_eq!(lines.next().unwrap(), " Su  Mo  Tu  We  Th  Fr  Sa");
    }

    #[test]
    fn test_write_month_marks_selection() {
        let cfg = PickerConfig {
            start_date: Some("03/04/2024".to_string()),
            end_date: Some("03/06/2024".to_string()),
            ..PickerConfig::default()
        };
        let out = render(cfg, march());
        assert!(out.contains("  4*  5+  6*"));
    }

    #[test]
    fn test_write_month_marks_disabled() {
        let cfg = PickerConfig {
            min_date: Some("03/10/2024".to_string()),
            ..PickerConfig::default()
        };
        let out = render(cfg, march());
        assert!(out.contains("  9x"));
        assert!(!out.contains(" 10x"));
    }

    #[test]
    fn test_write_month_week_numbers() {
        let cfg = PickerConfig {
            show_iso_week_numbers: true,
            ..PickerConfig::default()
        };
        let out = render(cfg, march());
        let first_row = out.lines().nth(2).unwrap();
        // Sunday Feb 25 opens the first row.
        assert!(first_row.starts_with("  8 "));
    }

    #[test]
    fn test_write_month_padding_blank() {
        let out = render(PickerConfig::default(), march());
        let first_row = out.lines().nth(2).unwrap();
        // March 2024 starts on a Friday.
        assert_eq!(first_row, format!("{}  1   2", " ".repeat(20)));
    }
}
