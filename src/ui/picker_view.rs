use crate::calc::grid::{CalendarCell, Side};
use crate::calc::time_picker::{TimeOption, TimeOptions};
use crate::ui::picker::{
    DateRangePicker, DocumentEvent, ElementEvent, HitTarget, Key, LayoutEnv, PickerEvent, RangeCommit,
};
use crate::ui::position::Bounds;
use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Timelike};
use crossterm::event::{
    self, Event as CEvent, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::io::Stdout;
use std::time::Duration as StdDuration;

const RANGE_BG: Color = Color::Rgb(40, 60, 90);
const ACCENT: Color = Color::Indexed(39);

const INPUT_X: u16 = 2;
const INPUT_Y: u16 = 2;
const INPUT_WIDTH: u16 = 27;
const PRESETS_WIDTH: u16 = 18;
const CELL_WIDTH: u16 = 3;
const CALENDAR_HEIGHT: u16 = 8;

/// Something the mouse can land on, recorded while rendering.
#[derive(Clone, Debug, PartialEq)]
enum Hit {
    Input,
    Panel,
    Preset(String),
    Cell(Side, usize, usize),
    Prev(Side),
    Next(Side),
    Apply,
    Cancel,
}

pub struct App {
    pub picker: DateRangePicker,
    /// Keyboard cursor inside the calendars.
    cursor: NaiveDate,
    /// Last committed range; what gets saved on exit.
    pub committed: Option<RangeCommit>,
    status: Option<(String, Color)>,
    hits: Vec<(Bounds, Hit)>,
    screen: (u16, u16),
}

impl App {
    pub fn new(picker: DateRangePicker) -> Self {
        let cursor = picker.controller().start().date();
        App {
            picker,
            cursor,
            committed: None,
            status: None,
            hits: Vec::new(),
            screen: (0, 0),
        }
    }

    /// Popup size for the current option set.
    fn container_size(&self) -> (u16, u16) {
        let opts = self.picker.controller().options();
        let calendar_width = self.calendar_width();
        let mut width = 2;
        let mut height = 4;
        if !opts.ranges.is_empty() {
            width += PRESETS_WIDTH;
            height = height.max(self.picker.controller().presets().len() as u16 + 5);
        }
        if self.picker.calendars_visible() {
            let sides = if opts.single_date_picker { 1 } else { 2 };
            width += calendar_width * sides + sides;
            let time_rows = if opts.time_picker { 1 } else { 0 };
            height = height.max(CALENDAR_HEIGHT + time_rows + 4);
        }
        (width.max(INPUT_WIDTH), height)
    }

    fn calendar_width(&self) -> u16 {
        let weeks = self.picker.view(Side::Left).week_numbers.is_some();
        CELL_WIDTH * 7 + if weeks { CELL_WIDTH } else { 0 }
    }

    fn layout_env(&self) -> LayoutEnv {
        let (w, h) = self.container_size();
        LayoutEnv::root(
            i32::from(self.screen.0),
            i32::from(self.screen.1),
            (i32::from(w), i32::from(h)),
        )
    }

    /// Keeps the picker's geometry in step with the terminal size.
    fn sync_layout(&mut self, width: u16, height: u16) {
        let resized = self.screen != (width, height);
        self.screen = (width, height);
        let env = self.layout_env();
        if resized {
            self.picker.dispatch_document(DocumentEvent::Resize(env));
        }
        if *self.picker.layout() != env {
            self.picker.set_layout(env);
        }
    }

    fn drain_picker_events(&mut self) {
        for event in self.picker.drain_events() {
            match event {
                PickerEvent::Changed(commit) => {
                    self.committed = Some(commit);
                }
                PickerEvent::Apply => {
                    self.status = Some((
                        format!("Applied {}", self.picker.selected_text()),
                        Color::Green,
                    ));
                }
                PickerEvent::Cancel => {
                    self.status = Some(("Cancelled".to_string(), Color::Yellow));
                }
                PickerEvent::Show => {
                    self.cursor = self.picker.controller().start().date();
                }
                PickerEvent::ShowCalendar | PickerEvent::HideCalendar => {
                    let env = self.layout_env();
                    self.picker.set_layout(env);
                }
                PickerEvent::Hide | PickerEvent::OutsideClick => {}
            }
        }
    }

    fn visible_position(&self, date: NaiveDate) -> Option<(Side, usize, usize)> {
        let sides: &[Side] = if self.picker.controller().options().single_date_picker {
            &[Side::Left]
        } else {
            &[Side::Left, Side::Right]
        };
        sides.iter().find_map(|&side| {
            let view = self.picker.view(side);
            view.cells
                .iter()
                .position(|c| c.date == date && !c.is_other_month)
                .map(|idx| (side, idx / 7, idx % 7))
        })
    }

    fn move_cursor(&mut self, days: i64) {
        let Some(next) = self.cursor.checked_add_signed(Duration::days(days)) else {
            return;
        };
        self.cursor = next;
        if self.visible_position(next).is_none() {
            if days < 0 {
                self.picker.click_prev(Side::Left);
            } else {
                let side = if self.picker.controller().options().single_date_picker {
                    Side::Left
                } else {
                    Side::Right
                };
                self.picker.click_next(side);
            }
        }
        if let Some((side, row, col)) = self.visible_position(self.cursor) {
            self.picker.hover_cell(side, row, col);
        }
    }

    fn click_cursor(&mut self) {
        if let Some((side, row, col)) = self.visible_position(self.cursor) {
            if self.picker.click_cell(side, row, col).is_none() {
                self.status = Some(("That date is not available".to_string(), Color::DarkGray));
            }
        }
    }

    /// Selects the n-th entry of the presets menu, custom range included.
    fn choose_preset(&mut self, index: usize) {
        let label = self.preset_labels().get(index).cloned();
        if let Some(label) = label {
            self.picker.click_range(&label);
        }
    }

    fn preset_labels(&self) -> Vec<String> {
        let ctl = self.picker.controller();
        let mut labels: Vec<String> = ctl.presets().iter().map(|p| p.label.clone()).collect();
        if !labels.is_empty() && ctl.options().show_custom_range_label {
            labels.push(ctl.options().locale.custom_range_label.clone());
        }
        labels
    }

    /// Moves one side's hour or minute to the next enabled option.
    fn step_time(&mut self, side: Side, minutes: bool, forward: bool) {
        let Some(opts) = self.picker.time_options(side) else {
            return;
        };
        if opts.disabled {
            return;
        }
        let list = if minutes { &opts.minutes } else { &opts.hours };
        let Some(value) = next_enabled(list, forward) else {
            return;
        };
        let sel = opts.selected;
        let (hour, minute) = if minutes {
            (sel.hour(), value)
        } else {
            (value, sel.minute())
        };
        self.picker.time_changed(side, hour, minute, sel.second());
    }

    /// Steps the left calendar's month or year dropdown.
    fn step_dropdown(&mut self, year: bool) {
        let view = self.picker.view(Side::Left);
        let header = &view.header;
        let (month, yr) = (view.month.month, view.month.year);
        if year {
            let next = header
                .year_options
                .iter()
                .find(|o| o.enabled && o.value > yr)
                .map(|o| o.value);
            if let Some(next) = next {
                self.picker.month_or_year_changed(Side::Left, month, next);
            }
        } else {
            let next = header
                .month_options
                .iter()
                .find(|o| o.enabled && o.value > month)
                .map(|o| o.value);
            if let Some(next) = next {
                self.picker.month_or_year_changed(Side::Left, next, yr);
            }
        }
    }

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.status = None;
        if let KeyCode::Char('c') = code {
            if modifiers.contains(KeyModifiers::CONTROL) {
                return true;
            }
        }

        if !self.picker.is_showing() {
            match code {
                KeyCode::Char('q') => return true,
                KeyCode::Enter => self.picker.element_event(ElementEvent::Click),
                KeyCode::Backspace => {
                    let mut value = self.picker.element().value.clone();
                    value.pop();
                    self.picker.type_into_element(&value);
                }
                KeyCode::Char(c) => {
                    let mut value = self.picker.element().value.clone();
                    value.push(c);
                    self.picker.type_into_element(&value);
                }
                _ => {}
            }
            self.drain_picker_events();
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Up => self.move_cursor(-7),
            KeyCode::Down => self.move_cursor(7),
            KeyCode::PageUp => self.picker.click_prev(Side::Left),
            KeyCode::PageDown => {
                let side = if self.picker.controller().options().single_date_picker {
                    Side::Left
                } else {
                    Side::Right
                };
                self.picker.click_next(side);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.click_cursor(),
            KeyCode::Char('a') => {
                if self.picker.apply_enabled() {
                    self.picker.click_apply();
                }
            }
            KeyCode::Char('c') => self.picker.click_cancel(),
            KeyCode::Esc => self.picker.keydown(Key::Escape),
            KeyCode::Tab => self.picker.keydown(Key::Tab),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.choose_preset(index);
            }
            KeyCode::Char('[') => self.step_time(Side::Left, false, false),
            KeyCode::Char(']') => self.step_time(Side::Left, false, true),
            KeyCode::Char(',') => self.step_time(Side::Left, true, false),
            KeyCode::Char('.') => self.step_time(Side::Left, true, true),
            KeyCode::Char('{') => self.step_time(Side::Right, false, false),
            KeyCode::Char('}') => self.step_time(Side::Right, false, true),
            KeyCode::Char('<') => self.step_time(Side::Right, true, false),
            KeyCode::Char('>') => self.step_time(Side::Right, true, true),
            KeyCode::Char('m') => self.step_dropdown(false),
            KeyCode::Char('y') => self.step_dropdown(true),
            _ => {}
        }
        self.drain_picker_events();
        false
    }

    fn hit_at(&self, x: u16, y: u16) -> Option<&Hit> {
        let (x, y) = (i32::from(x), i32::from(y));
        self.hits
            .iter()
            .rev()
            .find(|(bounds, _)| bounds.contains(x, y))
            .map(|(_, hit)| hit)
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let hit = self.hit_at(mouse.column, mouse.row).cloned();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let target = match hit {
                    Some(Hit::Input) => HitTarget::Element,
                    Some(_) => HitTarget::Container,
                    None => HitTarget::Outside,
                };
                self.picker.dispatch_document(DocumentEvent::MouseDown(target));
                match hit {
                    Some(Hit::Input) => self.picker.element_event(ElementEvent::Click),
                    Some(Hit::Preset(label)) => self.picker.click_range(&label),
                    Some(Hit::Cell(side, row, col)) => {
                        if let Some(cell) = self.picker.view(side).cell(row, col) {
                            self.cursor = cell.date;
                        }
                        self.picker.click_cell(side, row, col);
                    }
                    Some(Hit::Prev(side)) => self.picker.click_prev(side),
                    Some(Hit::Next(side)) => self.picker.click_next(side),
                    Some(Hit::Apply) => {
                        if self.picker.apply_enabled() {
                            self.picker.click_apply();
                        }
                    }
                    Some(Hit::Cancel) => self.picker.click_cancel(),
                    Some(Hit::Panel) | None => {}
                }
            }
            MouseEventKind::Moved => {
                if let Some(Hit::Cell(side, row, col)) = hit {
                    self.picker.hover_cell(side, row, col);
                }
            }
            _ => {}
        }
        self.drain_picker_events();
    }

    pub fn render(&mut self, f: &mut Frame) {
        let area = f.area();
        self.sync_layout(area.width, area.height);
        self.hits.clear();

        let help = if self.picker.is_showing() {
            "arrows move  enter pick  1-9 presets  a apply  c cancel  esc close  q quit"
        } else {
            "enter open  type a range  q quit"
        };
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("rangepick", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(help, Style::default().fg(Color::DarkGray)),
            ])),
            Rect::new(0, 0, area.width, 1),
        );

        let input = Rect::new(INPUT_X, INPUT_Y, INPUT_WIDTH.min(area.width.saturating_sub(INPUT_X)), 1);
        let value = &self.picker.element().value;
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("{:<width$}", value, width = usize::from(input.width)),
                Style::default().add_modifier(Modifier::UNDERLINED),
            )),
            input,
        );
        self.picker.set_element_bounds(to_bounds(input));
        self.hits.push((to_bounds(input), Hit::Input));

        if let Some((msg, color)) = &self.status {
            f.render_widget(
                Paragraph::new(Span::styled(msg.clone(), Style::default().fg(*color))),
                Rect::new(INPUT_X, INPUT_Y + 1, area.width.saturating_sub(INPUT_X), 1),
            );
        }

        if self.picker.is_showing() {
            self.render_popup(f, area);
        }
    }

    fn render_popup(&mut self, f: &mut Frame, area: Rect) {
        let Some(placement) = self.picker.placement() else {
            return;
        };
        let (w, h) = self.container_size();
        let x = placement.left_edge(i32::from(w), i32::from(area.width));
        let y = placement.top;
        let popup = clip(area, x, y, w, h);
        if popup.width == 0 || popup.height == 0 {
            return;
        }
        f.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT));
        let inner = block.inner(popup);
        f.render_widget(block, popup);
        self.hits.push((to_bounds(popup), Hit::Panel));

        let mut x = inner.x;
        let opts = self.picker.controller().options();
        let single = opts.single_date_picker;
        let has_presets = !opts.ranges.is_empty();
        if has_presets {
            let presets = Rect::new(x, inner.y, PRESETS_WIDTH.min(inner.width), inner.height);
            self.render_presets(f, presets);
            x += PRESETS_WIDTH;
        }

        if self.picker.calendars_visible() {
            let width = self.calendar_width();
            let left = Rect::new(x, inner.y, width, CALENDAR_HEIGHT);
            self.render_month(f, Side::Left, clip_rect(area, left));
            if !single {
                let right = Rect::new(x + width + 1, inner.y, width, CALENDAR_HEIGHT);
                self.render_month(f, Side::Right, clip_rect(area, right));
            }
            let mut row = inner.y + CALENDAR_HEIGHT;
            if self.picker.controller().options().time_picker {
                let sides: &[Side] = if single { &[Side::Left] } else { &[Side::Left, Side::Right] };
                for (i, &side) in sides.iter().enumerate() {
                    if let Some(time) = self.picker.time_options(side) {
                        let line = time_line(time);
                        let rect = Rect::new(x + i as u16 * (width + 1), row, width, 1);
                        f.render_widget(Paragraph::new(line), clip_rect(area, rect));
                    }
                }
                row += 1;
            }
            self.render_buttons(f, clip_rect(area, Rect::new(x, row + 1, inner.width.saturating_sub(x - inner.x), 1)));
        } else {
            let row = inner.y + inner.height.saturating_sub(1);
            self.render_buttons(f, clip_rect(area, Rect::new(inner.x, row, inner.width, 1)));
        }
    }

    fn render_presets(&mut self, f: &mut Frame, area: Rect) {
        let active = self.picker.controller().chosen_label().map(str::to_string);
        let mut lines = Vec::new();
        for (i, label) in self.preset_labels().into_iter().enumerate() {
            let style = if active.as_deref() == Some(label.as_str()) {
                Style::default().fg(Color::Black).bg(ACCENT)
            } else {
                Style::default()
            };
            let text = format!("{} {}", i + 1, label);
            let rect = Rect::new(area.x, area.y + i as u16, area.width, 1);
            self.hits.push((to_bounds(rect), Hit::Preset(label)));
            lines.push(Line::from(Span::styled(
                format!("{:<width$}", text, width = usize::from(area.width)),
                style,
            )));
        }
        f.render_widget(Paragraph::new(lines), area);
    }

    fn render_month(&mut self, f: &mut Frame, side: Side, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let view = self.picker.view(side).clone();
        let offset = if view.week_numbers.is_some() { CELL_WIDTH } else { 0 };

        let prev = if view.header.prev_available { "<" } else { " " };
        let next = if view.header.next_available { ">" } else { " " };
        let title_width = usize::from(area.width.saturating_sub(2));
        let mut lines = vec![Line::from(vec![
            Span::styled(prev, Style::default().fg(ACCENT)),
            Span::styled(
                format!("{:^width$}", view.header.title, width = title_width),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(next, Style::default().fg(ACCENT)),
        ])];
        if view.header.prev_available {
            self.hits.push((Bounds::new(i32::from(area.x), i32::from(area.y), 1, 1), Hit::Prev(side)));
        }
        if view.header.next_available {
            let x = i32::from(area.x + area.width) - 1;
            self.hits.push((Bounds::new(x, i32::from(area.y), 1, 1), Hit::Next(side)));
        }

        let mut header = Vec::new();
        if view.week_numbers.is_some() {
            header.push(Span::styled(
                format!("{:>2} ", self.picker.controller().options().locale.week_label),
                Style::default().fg(Color::DarkGray),
            ));
        }
        for day in &view.weekdays {
            let short: String = day.chars().take(2).collect();
            header.push(Span::styled(format!("{:>2} ", short), Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(header));

        for (r, row) in view.rows().enumerate() {
            let mut spans = Vec::new();
            if let Some(weeks) = &view.week_numbers {
                let week = weeks.get(r).copied().unwrap_or_default();
                spans.push(Span::styled(format!("{:>2} ", week), Style::default().fg(Color::DarkGray)));
            }
            for (c, cell) in row.iter().enumerate() {
                let is_cursor = cell.date == self.cursor && !cell.is_other_month;
                spans.push(Span::styled(
                    format!("{:>2} ", cell.date.day()),
                    calendar_cell_style(cell, is_cursor),
                ));
                let x = i32::from(area.x + offset) + c as i32 * i32::from(CELL_WIDTH);
                let y = i32::from(area.y) + 2 + r as i32;
                self.hits.push((Bounds::new(x, y, i32::from(CELL_WIDTH), 1), Hit::Cell(side, r, c)));
            }
            lines.push(Line::from(spans));
        }
        f.render_widget(Paragraph::new(lines), area);
    }

    fn render_buttons(&mut self, f: &mut Frame, area: Rect) {
        if area.width == 0 {
            return;
        }
        let locale = &self.picker.controller().options().locale;
        let summary = self.picker.selected_text();
        let apply = format!("[{}]", locale.apply_label);
        let cancel = format!("[{}]", locale.cancel_label);
        let apply_style = if self.picker.apply_enabled() {
            Style::default().fg(Color::Black).bg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let summary_width = summary.chars().count() as u16 + 1;
        let cancel_x = area.x + summary_width;
        let apply_x = cancel_x + cancel.chars().count() as u16 + 1;
        self.hits.push((
            Bounds::new(i32::from(cancel_x), i32::from(area.y), cancel.chars().count() as i32, 1),
            Hit::Cancel,
        ));
        self.hits.push((
            Bounds::new(i32::from(apply_x), i32::from(area.y), apply.chars().count() as i32, 1),
            Hit::Apply,
        ));
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw(summary),
                Span::raw(" "),
                Span::styled(cancel, Style::default().fg(Color::Yellow)),
                Span::raw(" "),
                Span::styled(apply, apply_style),
            ])),
            area,
        );
    }
}

fn to_bounds(rect: Rect) -> Bounds {
    Bounds::new(
        i32::from(rect.x),
        i32::from(rect.y),
        i32::from(rect.width),
        i32::from(rect.height),
    )
}

/// A `w`x`h` rect at (x, y), cut to what fits on screen.
fn clip(area: Rect, x: i32, y: i32, w: u16, h: u16) -> Rect {
    let x = x.clamp(0, i32::from(area.width)) as u16;
    let y = y.clamp(0, i32::from(area.height)) as u16;
    Rect::new(
        x,
        y,
        w.min(area.width.saturating_sub(x)),
        h.min(area.height.saturating_sub(y)),
    )
}

fn clip_rect(area: Rect, rect: Rect) -> Rect {
    clip(area, i32::from(rect.x), i32::from(rect.y), rect.width, rect.height)
}

fn next_enabled(list: &[TimeOption], forward: bool) -> Option<u32> {
    let pos = list.iter().position(|o| o.selected)?;
    if forward {
        list[pos + 1..].iter().find(|o| o.enabled).map(|o| o.value)
    } else {
        list[..pos].iter().rev().find(|o| o.enabled).map(|o| o.value)
    }
}

fn time_line(time: &TimeOptions) -> Line<'static> {
    let selected = |list: &[TimeOption]| {
        list.iter()
            .find(|o| o.selected)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| "--".to_string())
    };
    let mut text = format!("{}:{}", selected(&time.hours), selected(&time.minutes));
    if !time.seconds.is_empty() {
        text.push(':');
        text.push_str(&selected(&time.seconds));
    }
    if !time.ampm.is_empty() {
        text.push_str(if time.is_pm() { " PM" } else { " AM" });
    }
    let style = if time.disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(ACCENT)
    };
    Line::from(Span::styled(text, style))
}

/// Style for one day cell. Range ends beat the cursor, which beats the
/// in-range band; disabled and padding days are dimmed.
pub(crate) fn calendar_cell_style(cell: &CalendarCell, is_cursor: bool) -> Style {
    if cell.is_start || cell.is_end {
        Style::default()
            .fg(Color::Black)
            .bg(ACCENT)
            .add_modifier(Modifier::BOLD)
    } else if is_cursor {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else if cell.is_disabled {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else if cell.is_in_range {
        let mut s = Style::default().bg(RANGE_BG);
        if cell.is_other_month {
            s = s.fg(Color::DarkGray);
        }
        s
    } else if cell.is_other_month {
        Style::default().fg(Color::DarkGray)
    } else if cell.is_today {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if cell.is_weekend {
        Style::default().fg(Color::Gray)
    } else {
        Style::default()
    }
}

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(16))? {
            match event::read()? {
                CEvent::Key(key) => {
                    if app.handle_key(key.code, key.modifiers) {
                        break;
                    }
                }
                CEvent::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }
    }
    Ok(())
}
