use crate::calc::grid::{CalendarMonthView, Side};
use crate::calc::time_picker::TimeOptions;
use crate::calc::{PresetChoice, RangeController, Transition};
use crate::data::PickerOptions;
use crate::ui::listeners::{EventKind, ListenerRegistry, ListenerScope, ListenerTarget};
use crate::ui::position::{Bounds, ParentFrame, Placement, compute_placement};
use chrono::NaiveDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    TextInput,
    Button,
    /// Anything else: clicks and key presses toggle the popup.
    Control,
}

/// The host control the picker is attached to.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundElement {
    pub kind: ElementKind,
    pub value: String,
    pub bounds: Bounds,
}

impl BoundElement {
    pub fn text_input(value: &str, bounds: Bounds) -> Self {
        BoundElement {
            kind: ElementKind::TextInput,
            value: value.to_string(),
            bounds,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RangeCommit {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PickerEvent {
    Show,
    Hide,
    Apply,
    Cancel,
    OutsideClick,
    ShowCalendar,
    HideCalendar,
    /// The committed range differs from the one the popup opened with.
    Changed(RangeCommit),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
    Escape,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementEvent {
    Click,
    Focus,
    KeyUp,
    KeyDown(Key),
}

/// Where a document-level event landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    Element,
    Container,
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DocumentEvent {
    MouseDown(HitTarget),
    TouchEnd(HitTarget),
    FocusIn(HitTarget),
    DropdownToggle(HitTarget),
    Resize(LayoutEnv),
}

/// Geometry the popup is placed against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutEnv {
    pub parent: ParentFrame,
    pub viewport_width: i32,
    pub container_width: i32,
    pub container_height: i32,
}

impl LayoutEnv {
    pub fn root(width: i32, height: i32, container: (i32, i32)) -> Self {
        LayoutEnv {
            parent: ParentFrame::root(width, height),
            viewport_width: width,
            container_width: container.0,
            container_height: container.1,
        }
    }
}

const ELEMENT_LISTENERS: &[(ListenerTarget, EventKind)] = &[
    (ListenerTarget::Element, EventKind::Click),
    (ListenerTarget::Element, EventKind::Focus),
    (ListenerTarget::Element, EventKind::KeyUp),
    (ListenerTarget::Element, EventKind::KeyDown),
];

const CONTROL_LISTENERS: &[(ListenerTarget, EventKind)] = &[
    (ListenerTarget::Element, EventKind::Click),
    (ListenerTarget::Element, EventKind::KeyDown),
];

const CONTAINER_LISTENERS: &[(ListenerTarget, EventKind)] = &[
    (ListenerTarget::Container, EventKind::Click),
    (ListenerTarget::Container, EventKind::MouseDown),
];

const CALENDAR_LISTENERS: &[(ListenerTarget, EventKind)] = &[
    (ListenerTarget::Calendar, EventKind::Click),
    (ListenerTarget::Calendar, EventKind::MouseEnter),
    (ListenerTarget::Calendar, EventKind::Change),
];

const GLOBAL_LISTENERS: &[(ListenerTarget, EventKind)] = &[
    (ListenerTarget::Document, EventKind::MouseDown),
    (ListenerTarget::Document, EventKind::TouchEnd),
    (ListenerTarget::Document, EventKind::FocusIn),
    (ListenerTarget::Document, EventKind::DropdownClick),
    (ListenerTarget::Window, EventKind::Resize),
];

/// A date-range popup bound to one host control.
///
/// Owns the selection controller and the rendered calendar views, tracks
/// visibility and placement, and queues [`PickerEvent`]s for the host to
/// drain. Every listener it registers lives in its own registry.
#[derive(Debug)]
pub struct DateRangePicker {
    controller: RangeController,
    element: BoundElement,
    showing: bool,
    calendars_shown: bool,
    removed: bool,
    old_range: (NaiveDateTime, NaiveDateTime),
    layout: LayoutEnv,
    placement: Option<Placement>,
    events: Vec<PickerEvent>,
    registry: ListenerRegistry,
    element_listeners: ListenerScope,
    container_listeners: ListenerScope,
    calendar_listeners: ListenerScope,
    global_listeners: ListenerScope,
    left_view: CalendarMonthView,
    right_view: CalendarMonthView,
    left_time: Option<TimeOptions>,
    right_time: Option<TimeOptions>,
}

impl DateRangePicker {
    pub fn new(
        options: PickerOptions,
        element: BoundElement,
        layout: LayoutEnv,
        now: NaiveDateTime,
    ) -> Self {
        let seed_from_element = element.kind == ElementKind::TextInput && !options.dates_configured;
        let calendars_shown =
            options.ranges.is_empty() || options.always_show_calendars || options.single_date_picker;

        let mut controller = RangeController::new(options, now);
        if seed_from_element && !element.value.trim().is_empty() {
            if let Err(e) = controller.apply_input(&element.value) {
                tracing::debug!(target: "rangepick::picker", "initial input ignored: {}", e);
            }
        }

        let registry = ListenerRegistry::new();
        let element_specs = match element.kind {
            ElementKind::TextInput | ElementKind::Button => ELEMENT_LISTENERS,
            ElementKind::Control => CONTROL_LISTENERS,
        };
        let mut element_listeners = ListenerScope::new(&registry, "element", element_specs);
        let mut container_listeners = ListenerScope::new(&registry, "container", CONTAINER_LISTENERS);
        let mut calendar_listeners = ListenerScope::new(&registry, "calendar", CALENDAR_LISTENERS);
        element_listeners.acquire();
        container_listeners.acquire();
        calendar_listeners.acquire();

        let start = controller.start();
        let end = controller.end().unwrap_or(start);
        let mut picker = DateRangePicker {
            left_view: controller.left_view(),
            right_view: controller.right_view(),
            left_time: controller.time_options(Side::Left),
            right_time: controller.time_options(Side::Right),
            controller,
            element,
            showing: false,
            calendars_shown,
            removed: false,
            old_range: (start, end),
            layout,
            placement: None,
            events: Vec::new(),
            global_listeners: ListenerScope::new(&registry, "global", GLOBAL_LISTENERS),
            registry,
            element_listeners,
            container_listeners,
            calendar_listeners,
        };
        picker.update_element();
        picker
    }

    pub fn controller(&self) -> &RangeController {
        &self.controller
    }

    pub fn element(&self) -> &BoundElement {
        &self.element
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn calendars_visible(&self) -> bool {
        self.calendars_shown
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn layout(&self) -> &LayoutEnv {
        &self.layout
    }

    pub fn view(&self, side: Side) -> &CalendarMonthView {
        match side {
            Side::Left => &self.left_view,
            Side::Right => &self.right_view,
        }
    }

    pub fn time_options(&self, side: Side) -> Option<&TimeOptions> {
        match side {
            Side::Left => self.left_time.as_ref(),
            Side::Right => self.right_time.as_ref(),
        }
    }

    /// Takes every event queued since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<PickerEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: PickerEvent) {
        tracing::debug!(target: "rangepick::picker", "event {:?}", event);
        self.events.push(event);
    }

    pub fn show(&mut self) {
        if self.showing || self.removed {
            return;
        }
        self.global_listeners.acquire();
        let start = self.controller.start();
        self.old_range = (start, self.controller.end().unwrap_or(start));
        self.showing = true;
        self.update_view();
        self.move_container();
        self.emit(PickerEvent::Show);
    }

    pub fn hide(&mut self) {
        if !self.showing {
            return;
        }
        let (old_start, old_end) = self.old_range;
        if self.controller.end().is_none() {
            self.controller.restore(old_start, old_end);
        }
        let start = self.controller.start();
        let end = self.controller.end().unwrap_or(start);
        if start != old_start || end != old_end {
            let label = self.controller.chosen_label().map(str::to_string);
            self.emit(PickerEvent::Changed(RangeCommit { start, end, label }));
        }
        self.update_element();
        self.global_listeners.release();
        self.showing = false;
        self.refresh_views();
        self.emit(PickerEvent::Hide);
    }

    pub fn toggle(&mut self) {
        if self.showing {
            self.hide();
        } else {
            self.show();
        }
    }

    /// Recomputes the popup position from the current layout.
    pub fn move_container(&mut self) {
        self.placement = Some(compute_placement(
            self.element.bounds,
            (self.layout.container_width, self.layout.container_height),
            &self.layout.parent,
            self.layout.viewport_width,
            self.controller.options().opens,
            self.controller.options().drops,
        ));
    }

    pub fn set_layout(&mut self, layout: LayoutEnv) {
        self.layout = layout;
        if self.showing {
            self.move_container();
        }
    }

    pub fn set_element_bounds(&mut self, bounds: Bounds) {
        self.element.bounds = bounds;
        if self.showing {
            self.move_container();
        }
    }

    /// Detaches every listener. The picker ignores input afterwards.
    pub fn remove(&mut self) {
        self.global_listeners.release();
        self.calendar_listeners.release();
        self.container_listeners.release();
        self.element_listeners.release();
        self.showing = false;
        self.removed = true;
        self.placement = None;
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn click_apply(&mut self) {
        if !self.container_listeners.is_held() {
            return;
        }
        self.hide();
        self.emit(PickerEvent::Apply);
    }

    pub fn click_cancel(&mut self) {
        if !self.container_listeners.is_held() {
            return;
        }
        let (start, end) = self.old_range;
        self.controller.restore(start, end);
        self.hide();
        self.emit(PickerEvent::Cancel);
    }

    pub fn click_range(&mut self, label: &str) {
        if !self.container_listeners.is_held() {
            return;
        }
        match self.controller.apply_preset(label) {
            PresetChoice::CustomRange => {
                self.show_calendars();
                self.update_view();
            }
            PresetChoice::Applied => {
                if !self.controller.options().always_show_calendars {
                    self.hide_calendars();
                }
                self.click_apply();
            }
            PresetChoice::Unknown => {}
        }
    }

    /// Click on a calendar cell. Disabled cells and out-of-grid positions
    /// are ignored.
    pub fn click_cell(&mut self, side: Side, row: usize, col: usize) -> Option<Transition> {
        if !self.calendar_listeners.is_held() {
            return None;
        }
        let cell = self.view(side).cell(row, col)?;
        if !cell.is_available() {
            return None;
        }
        let date = cell.date;
        let transition = self.controller.select_date(date);
        let opts = self.controller.options();
        let apply = match transition {
            Transition::CommittedEnd | Transition::CollapsedToStart => opts.auto_apply,
            Transition::SingleDate => opts.auto_apply && !opts.time_picker,
            Transition::StartedRange => false,
        };
        if apply {
            self.click_apply();
        } else {
            self.update_view();
        }
        Some(transition)
    }

    /// Pointer over a cell: previews the range while the end is pending.
    pub fn hover_cell(&mut self, side: Side, row: usize, col: usize) {
        if !self.calendar_listeners.is_held() {
            return;
        }
        let Some(cell) = self.view(side).cell(row, col) else {
            return;
        };
        if !cell.is_available() || self.controller.end().is_some() {
            return;
        }
        let date = cell.date;
        if self.controller.hover() != Some(date) {
            self.controller.hover_date(Some(date));
            self.update_calendars();
        }
    }

    pub fn click_prev(&mut self, side: Side) {
        if self.calendar_listeners.is_held() && self.view(side).header.prev_available {
            self.controller.navigate_month(side, -1);
            self.update_calendars();
        }
    }

    pub fn click_next(&mut self, side: Side) {
        if self.calendar_listeners.is_held() && self.view(side).header.next_available {
            self.controller.navigate_month(side, 1);
            self.update_calendars();
        }
    }

    pub fn month_or_year_changed(&mut self, side: Side, month: u32, year: i32) {
        if !self.calendar_listeners.is_held() {
            return;
        }
        self.controller.change_month_year(side, month, year);
        self.update_calendars();
    }

    /// A time selector changed. `hour` is 0-23.
    pub fn time_changed(&mut self, side: Side, hour: u32, minute: u32, second: u32) {
        if !self.calendar_listeners.is_held() {
            return;
        }
        self.controller.change_time(side, hour, minute, second);
        self.update_calendars();
    }

    /// Routes an event raised on the bound element.
    pub fn element_event(&mut self, event: ElementEvent) {
        if !self.element_listeners.is_held() {
            return;
        }
        match (self.element.kind, event) {
            (ElementKind::Control, ElementEvent::Click | ElementEvent::KeyDown(_)) => self.toggle(),
            (ElementKind::Control, _) => {}
            (_, ElementEvent::Click | ElementEvent::Focus) => self.show(),
            (_, ElementEvent::KeyUp) => self.element_changed(),
            (_, ElementEvent::KeyDown(key)) => self.keydown(key),
        }
    }

    /// Replaces the bound input's text as if typed, then handles the key-up.
    pub fn type_into_element(&mut self, value: &str) {
        if self.element.kind != ElementKind::TextInput {
            return;
        }
        self.element.value = value.to_string();
        self.element_event(ElementEvent::KeyUp);
    }

    pub fn keydown(&mut self, key: Key) {
        match key {
            Key::Tab | Key::Enter | Key::Escape => self.hide(),
            Key::Other => {}
        }
    }

    /// Re-reads the bound input. Text that does not parse leaves the
    /// selection as it was.
    pub fn element_changed(&mut self) {
        if self.element.kind != ElementKind::TextInput || self.element.value.is_empty() {
            return;
        }
        match self.controller.apply_input(&self.element.value) {
            Ok(()) => self.update_view(),
            Err(e) => {
                tracing::debug!(target: "rangepick::picker", "input '{}' ignored: {}", self.element.value, e)
            }
        }
    }

    /// Writes the selection into a bound text input.
    pub fn update_element(&mut self) {
        if self.element.kind == ElementKind::TextInput && self.controller.options().auto_update_input {
            let text = self.controller.element_text();
            if text != self.element.value {
                self.element.value = text;
            }
        }
    }

    /// Routes a document or window event. Only reaches the picker while the
    /// popup is open.
    pub fn dispatch_document(&mut self, event: DocumentEvent) {
        match event {
            DocumentEvent::MouseDown(target) => {
                if self.registry.is_listening(ListenerTarget::Document, EventKind::MouseDown) {
                    self.outside_click(target);
                }
            }
            DocumentEvent::TouchEnd(target) => {
                if self.registry.is_listening(ListenerTarget::Document, EventKind::TouchEnd) {
                    self.outside_click(target);
                }
            }
            DocumentEvent::DropdownToggle(target) => {
                if self.registry.is_listening(ListenerTarget::Document, EventKind::DropdownClick) {
                    self.outside_click(target);
                }
            }
            // Focus moving elsewhere does not close the popup.
            DocumentEvent::FocusIn(_) => {}
            DocumentEvent::Resize(layout) => {
                if self.registry.is_listening(ListenerTarget::Window, EventKind::Resize) {
                    self.set_layout(layout);
                }
            }
        }
    }

    pub fn outside_click(&mut self, target: HitTarget) {
        if target != HitTarget::Outside {
            return;
        }
        self.hide();
        self.emit(PickerEvent::OutsideClick);
    }

    pub fn show_calendars(&mut self) {
        if self.calendars_shown {
            return;
        }
        self.calendars_shown = true;
        self.move_container();
        self.emit(PickerEvent::ShowCalendar);
    }

    pub fn hide_calendars(&mut self) {
        if !self.calendars_shown {
            return;
        }
        self.calendars_shown = false;
        self.emit(PickerEvent::HideCalendar);
    }

    pub fn apply_enabled(&self) -> bool {
        self.controller.apply_enabled()
    }

    pub fn selected_text(&self) -> String {
        self.controller.selected_text()
    }

    /// Rebuilds the calendars and time selectors from the controller.
    pub fn update_view(&mut self) {
        self.controller.update_months_in_view();
        self.update_calendars();
    }

    fn refresh_views(&mut self) {
        let _paused = self.calendar_listeners.suspend();
        self.left_view = self.controller.left_view();
        self.right_view = self.controller.right_view();
        self.left_time = self.controller.time_options(Side::Left);
        self.right_time = self.controller.time_options(Side::Right);
    }

    fn update_calendars(&mut self) {
        self.refresh_views();
        if self.controller.end().is_none() {
            return;
        }
        self.controller.calculate_chosen_label();
        if self.showing && self.controller.is_custom_range() {
            self.show_calendars();
        }
    }
}
