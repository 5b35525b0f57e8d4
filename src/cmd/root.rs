use anyhow::Result;
use chrono::Local;
use rangepick::calc::dates::format_date_time;
use rangepick::data::{Persistable, PickerConfig, PickerOptions, SelectionData, SelectionRecord};
use rangepick::ui::picker::{BoundElement, DateRangePicker, LayoutEnv};
use rangepick::ui::picker_view::{App, run_app};
use rangepick::ui::position::Bounds;
use rangepick::ui::{restore_terminal, setup_terminal};

pub fn run() -> Result<()> {
    let config = PickerConfig::load()?;
    let mut selection = SelectionData::load()?;

    let now = Local::now().naive_local();
    let options = PickerOptions::from_config(&config, now);
    let initial = match &selection.last {
        Some(last) if !options.dates_configured => initial_text(last, &options),
        _ => String::new(),
    };
    let picker = DateRangePicker::new(
        options,
        BoundElement::text_input(&initial, Bounds::default()),
        LayoutEnv::root(0, 0, (0, 0)),
        now,
    );

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;
    let mut app = App::new(picker);
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    if let Some(commit) = app.committed.take() {
        tracing::info!(target: "rangepick::cmd", "saving selection {} .. {}", commit.start, commit.end);
        selection.record(commit.start, commit.end, commit.label);
        selection.save()?;
        println!("{}", app.picker.element().value);
    }

    result
}

/// Text that seeds the input from the last saved selection.
fn initial_text(last: &SelectionRecord, options: &PickerOptions) -> String {
    let format = &options.locale.format;
    if options.single_date_picker {
        return format_date_time(last.start, format);
    }
    format!(
        "{}{}{}",
        format_date_time(last.start, format),
        options.locale.separator,
        format_date_time(last.end, format)
    )
}
