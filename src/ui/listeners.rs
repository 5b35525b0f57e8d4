use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Document,
    Window,
    /// The bound input, button or control.
    Element,
    /// The popup panel: presets list and buttons.
    Container,
    /// Delegated handlers on the calendar tables and time selectors.
    Calendar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    TouchEnd,
    FocusIn,
    DropdownClick,
    Resize,
    Click,
    Focus,
    KeyUp,
    KeyDown,
    MouseEnter,
    Change,
}

#[derive(Debug)]
struct Registration {
    id: u64,
    target: ListenerTarget,
    kind: EventKind,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    active: Vec<Registration>,
}

/// Per-picker record of attached listeners. Handles are dropped to detach.
#[derive(Clone, Debug, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<Registry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        ListenerRegistry::default()
    }

    pub fn attach(&self, target: ListenerTarget, kind: EventKind) -> ListenerGuard {
        let mut reg = self.inner.borrow_mut();
        reg.next_id += 1;
        let id = reg.next_id;
        reg.active.push(Registration { id, target, kind });
        tracing::trace!(target: "rangepick::listeners", "attach {:?}/{:?} #{}", target, kind, id);
        ListenerGuard {
            registry: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn is_listening(&self, target: ListenerTarget, kind: EventKind) -> bool {
        self.count(target, kind) > 0
    }

    pub fn count(&self, target: ListenerTarget, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .active
            .iter()
            .filter(|r| r.target == target && r.kind == kind)
            .count()
    }

    pub fn active_len(&self) -> usize {
        self.inner.borrow().active.len()
    }
}

/// One attached listener. Detaches on drop; dropping after the registry is
/// gone, or twice over the same id, does nothing.
#[derive(Debug)]
pub struct ListenerGuard {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        match inner.try_borrow_mut() {
            Ok(mut reg) => {
                let id = self.id;
                reg.active.retain(|r| r.id != id);
                tracing::trace!(target: "rangepick::listeners", "detach #{}", id);
            }
            Err(_) => {
                tracing::warn!(target: "rangepick::listeners", "registry busy; listener #{} left attached", self.id)
            }
        }
    }
}

/// A named set of listeners attached and detached together.
#[derive(Debug)]
pub struct ListenerScope {
    name: &'static str,
    registry: ListenerRegistry,
    specs: Vec<(ListenerTarget, EventKind)>,
    guards: Vec<ListenerGuard>,
}

impl ListenerScope {
    pub fn new(
        registry: &ListenerRegistry,
        name: &'static str,
        specs: &[(ListenerTarget, EventKind)],
    ) -> Self {
        ListenerScope {
            name,
            registry: registry.clone(),
            specs: specs.to_vec(),
            guards: Vec::new(),
        }
    }

    /// Attaches every listener in the set. Already held: nothing happens.
    pub fn acquire(&mut self) {
        if self.is_held() {
            return;
        }
        self.guards = self
            .specs
            .iter()
            .map(|&(target, kind)| self.registry.attach(target, kind))
            .collect();
        tracing::debug!(target: "rangepick::listeners", "{} listeners attached", self.name);
    }

    pub fn release(&mut self) {
        if self.is_held() {
            self.guards.clear();
            tracing::debug!(target: "rangepick::listeners", "{} listeners released", self.name);
        }
    }

    pub fn is_held(&self) -> bool {
        !self.guards.is_empty()
    }

    /// Detaches the set until the returned guard drops. The guard re-attaches
    /// on every exit path, unwinding included, if the set was held.
    pub fn suspend(&mut self) -> SuspendGuard<'_> {
        let reattach = self.is_held();
        self.guards.clear();
        SuspendGuard {
            scope: self,
            reattach,
        }
    }
}

pub struct SuspendGuard<'a> {
    scope: &'a mut ListenerScope,
    reattach: bool,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        if self.reattach {
            self.scope.acquire();
        }
    }
}
