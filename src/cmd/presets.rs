use anyhow::Result;
use chrono::Local;
use rangepick::calc::RangeController;
use rangepick::calc::dates::format_date_time;
use rangepick::data::{PickerConfig, PickerOptions};

pub fn run() -> Result<()> {
    let config = PickerConfig::load()?;
    let now = Local::now().naive_local();
    let controller = RangeController::new(PickerOptions::from_config(&config, now), now);
    write_presets(&controller, &mut std::io::stdout())
}

/// Lists the presets as resolved today, clamped to the configured bounds.
/// The one matching the initial selection is starred.
pub(crate) fn write_presets<W: std::io::Write>(controller: &RangeController, out: &mut W) -> Result<()> {
    let format = &controller.options().locale.format;
    let active = controller.chosen_label();
    writeln!(out, "Presets")?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<18} {:<12} {}", "Label", "Start", "End")?;
    for preset in controller.presets() {
        let mark = if active == Some(preset.label.as_str()) { '*' } else { ' ' };
        writeln!(
            out,
            "{} {:<18} {:<12} {}",
            mark,
            preset.label,
            format_date_time(preset.start, format),
            format_date_time(preset.end, format)
        )?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} preset(s)", controller.presets().len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rangepick::data::PresetConfig;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn output(cfg: PickerConfig) -> String {
        let controller = RangeController::new(PickerOptions::from_config(&cfg, now()), now());
        let mut buf = Vec::new();
        write_presets(&controller, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_presets_empty() {
        let out = output(PickerConfig::default());
        assert!(out.contains("Total: 0 preset(s)"));
    }

    #[test]
    fn test_write_presets_marks_active() {
        let cfg = PickerConfig {
            ranges: vec![
                PresetConfig::new("Today", "today", "today"),
                PresetConfig::new("Yesterday", "yesterday", "yesterday"),
            ],
            ..PickerConfig::default()
        };
        let out = output(cfg);
        assert!(out.contains("* Today"));
        assert!(out.contains("  Yesterday          03/14/2024   03/14/2024"));
        assert!(out.contains("Total: 2 preset(s)"));
    }

    #[test]
    fn test_write_presets_clamped_to_min_date() {
        let cfg = PickerConfig {
            min_date: Some("03/12/2024".to_string()),
            ranges: vec![
                PresetConfig::new("Last 7 Days", "today-6d", "today"),
                PresetConfig::new("Last Year", "year_start-1y", "year_end-1y"),
            ],
            ..PickerConfig::default()
        };
        let out = output(cfg);
        assert!(out.contains("Last 7 Days        03/12/2024   03/15/2024"));
        assert!(!out.contains("Last Year"));
        assert!(out.contains("Total: 1 preset(s)"));
    }
}
