//! Native DOM events.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

use super::Node;

/// Which part of the propagation path an event is currently visiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// Options for constructing a plain [`DomEvent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
}

/// Key and modifier state carried by keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardEventInit {
    pub key_code: u32,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,
}

impl KeyboardEventInit {
    pub fn key(key_code: u32) -> Self {
        Self {
            key_code,
            ..Self::default()
        }
    }
}

/// A native event travelling through the DOM tree.
///
/// Cloning yields another handle to the same event, so flags set by one
/// listener (`prevent_default`, `stop_propagation`) are visible to the
/// dispatcher and to everyone holding a handle.
#[derive(Clone)]
pub struct DomEvent {
    inner: Rc<EventInner>,
}

struct EventInner {
    kind: SmolStr,
    bubbles: bool,
    cancelable: bool,
    keyboard: Option<KeyboardEventInit>,
    related_target: Option<Node>,
    target: RefCell<Option<Node>>,
    current_target: RefCell<Option<Node>>,
    phase: Cell<EventPhase>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
    in_passive_listener: Cell<bool>,
}

impl DomEvent {
    pub fn new(kind: impl Into<SmolStr>, init: EventInit) -> Self {
        Self::build(kind.into(), init, None, None)
    }

    /// A bubbling, cancelable keyboard event (`keydown`, `keyup`).
    pub fn keyboard(kind: impl Into<SmolStr>, init: KeyboardEventInit) -> Self {
        Self::build(
            kind.into(),
            EventInit {
                bubbles: true,
                cancelable: true,
            },
            Some(init),
            None,
        )
    }

    /// A focus event. `focus`/`blur` do not bubble, `focusin`/`focusout` do.
    pub fn focus(kind: impl Into<SmolStr>, related_target: Option<Node>) -> Self {
        let kind = kind.into();
        let bubbles = matches!(kind.as_str(), "focusin" | "focusout");
        Self::build(
            kind,
            EventInit {
                bubbles,
                cancelable: false,
            },
            None,
            related_target,
        )
    }

    /// A bubbling, cancelable mouse event such as `click` or `mousedown`.
    pub fn mouse(kind: impl Into<SmolStr>) -> Self {
        Self::new(
            kind,
            EventInit {
                bubbles: true,
                cancelable: true,
            },
        )
    }

    fn build(
        kind: SmolStr,
        init: EventInit,
        keyboard: Option<KeyboardEventInit>,
        related_target: Option<Node>,
    ) -> Self {
        Self {
            inner: Rc::new(EventInner {
                kind,
                bubbles: init.bubbles,
                cancelable: init.cancelable,
                keyboard,
                related_target,
                target: RefCell::new(None),
                current_target: RefCell::new(None),
                phase: Cell::new(EventPhase::None),
                default_prevented: Cell::new(false),
                propagation_stopped: Cell::new(false),
                immediate_propagation_stopped: Cell::new(false),
                in_passive_listener: Cell::new(false),
            }),
        }
    }

    /// The event type, e.g. `"focus"`.
    pub fn kind(&self) -> &str {
        &self.inner.kind
    }

    pub fn bubbles(&self) -> bool {
        self.inner.bubbles
    }

    pub fn target(&self) -> Option<Node> {
        self.inner.target.borrow().clone()
    }

    pub fn current_target(&self) -> Option<Node> {
        self.inner.current_target.borrow().clone()
    }

    pub fn related_target(&self) -> Option<&Node> {
        self.inner.related_target.as_ref()
    }

    pub fn phase(&self) -> EventPhase {
        self.inner.phase.get()
    }

    pub fn keyboard_init(&self) -> Option<KeyboardEventInit> {
        self.inner.keyboard
    }

    pub fn key_code(&self) -> u32 {
        self.inner.keyboard.map(|k| k.key_code).unwrap_or_default()
    }

    /// Cancel the default action. Ignored for non-cancelable events and
    /// inside passive listeners.
    pub fn prevent_default(&self) {
        if self.inner.cancelable && !self.inner.in_passive_listener.get() {
            self.inner.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.inner.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.inner.propagation_stopped.set(true);
    }

    pub fn stop_immediate_propagation(&self) {
        self.inner.propagation_stopped.set(true);
        self.inner.immediate_propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.inner.propagation_stopped.get()
    }

    pub(crate) fn is_immediate_propagation_stopped(&self) -> bool {
        self.inner.immediate_propagation_stopped.get()
    }

    pub(crate) fn set_target(&self, target: Option<Node>) {
        *self.inner.target.borrow_mut() = target;
    }

    pub(crate) fn set_current_target(&self, node: Option<Node>) {
        *self.inner.current_target.borrow_mut() = node;
    }

    pub(crate) fn set_phase(&self, phase: EventPhase) {
        self.inner.phase.set(phase);
    }

    pub(crate) fn set_in_passive_listener(&self, passive: bool) {
        self.inner.in_passive_listener.set(passive);
    }
}

impl fmt::Debug for DomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomEvent")
            .field("kind", &self.inner.kind)
            .field("phase", &self.inner.phase.get())
            .field("target", &self.inner.target.borrow())
            .field("default_prevented", &self.inner.default_prevented.get())
            .finish()
    }
}
