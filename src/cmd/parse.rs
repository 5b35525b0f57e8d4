use anyhow::Result;
use chrono::Local;
use rangepick::calc::RangeController;
use rangepick::data::{PickerConfig, PickerOptions};

pub fn run(text: &str) -> Result<()> {
    let config = PickerConfig::load()?;
    let now = Local::now().naive_local();
    let mut controller = RangeController::new(PickerOptions::from_config(&config, now), now);
    write_parse(&mut controller, text, &mut std::io::stdout())
}

/// Feeds `text` through the input parser the picker uses and reports the
/// resulting range. Unreadable text keeps the previous range.
pub(crate) fn write_parse<W: std::io::Write>(
    controller: &mut RangeController,
    text: &str,
    out: &mut W,
) -> Result<()> {
    match controller.apply_input(text) {
        Ok(()) => {
            writeln!(out, "Range: {}", controller.selected_text())?;
            if let Some(label) = controller.chosen_label() {
                writeln!(out, "Preset: {}", label)?;
            }
        }
        Err(e) => {
            writeln!(out, "Ignored: {}", e)?;
            writeln!(out, "Range: {}", controller.selected_text())?;
        }
    }
    Ok(())
}
