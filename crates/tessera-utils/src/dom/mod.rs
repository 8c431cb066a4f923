//! Headless DOM host.
//!
//! The editor framework never talks to a real browser directly. It runs
//! against this in-process document model, which keeps the parts of the DOM
//! the UI layer depends on:
//!
//! - element trees with attributes, text and HTML (de)serialization
//! - native listeners keyed by `(type, capture, passive)`
//! - capture / target / bubble dispatch with propagation control
//! - a single active element with browser-ordered `blur` → `focus` events
//! - a macrotask queue standing in for `setTimeout`
//!
//! Every node carries a stable identity tag ([`NodeId`]), which is what the
//! DOM emitter bridge keys its proxies on.

mod event;
mod html;
mod node;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

pub use event::{DomEvent, EventInit, EventPhase, KeyboardEventInit};
pub use node::{ListenerOptions, NativeListenerId, Node, NodeId, NodeKind};

pub(crate) use node::NodeInner;

/// Handle of a scheduled macrotask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    callback: Box<dyn FnOnce()>,
}

/// A document with its window, body, focus state and task queue.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

pub(crate) struct DocumentInner {
    window: Node,
    root: Node,
    body: Node,
    active: RefCell<Option<Node>>,
    timers: RefCell<VecDeque<Timer>>,
    next_timer: Cell<u64>,
}

impl Document {
    pub fn new() -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<DocumentInner>| {
            let window = Node::new_in(weak.clone(), NodeKind::Window, "#window");
            let root = Node::new_in(weak.clone(), NodeKind::Document, "#document");
            let body = Node::new_in(weak.clone(), NodeKind::Element, "body");
            root.append_child(&body);
            DocumentInner {
                window,
                root,
                body,
                active: RefCell::new(None),
                timers: RefCell::new(VecDeque::new()),
                next_timer: Cell::new(1),
            }
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner>) -> Self {
        Self { inner }
    }

    /// The window node. It sits above the document node in every event path.
    pub fn window(&self) -> &Node {
        &self.inner.window
    }

    /// The document node itself.
    pub fn document_node(&self) -> &Node {
        &self.inner.root
    }

    pub fn body(&self) -> &Node {
        &self.inner.body
    }

    pub fn create_element(&self, tag: &str) -> Node {
        Node::new_in(
            Rc::downgrade(&self.inner),
            NodeKind::Element,
            &tag.to_ascii_lowercase(),
        )
    }

    pub fn create_text_node(&self, text: &str) -> Node {
        let node = Node::new_in(Rc::downgrade(&self.inner), NodeKind::Text, "#text");
        node.set_text_content(text);
        node
    }

    /// Parse an HTML string into detached nodes owned by this document.
    pub fn parse_fragment(&self, html: &str) -> Vec<Node> {
        html::parse_fragment(self, html)
    }

    /// The element that currently holds focus, if any.
    pub fn active_element(&self) -> Option<Node> {
        self.inner.active.borrow().clone()
    }

    /// Move focus to `target` (or nowhere), firing `blur`/`focusout` on the
    /// previous element and then `focus`/`focusin` on the new one.
    ///
    /// While the blur events are dispatched no element is active, which is
    /// what browsers report from `document.activeElement` at that point.
    pub fn set_focus(&self, target: Option<&Node>) {
        let previous = self.active_element();
        if previous.as_ref() == target {
            return;
        }
        *self.inner.active.borrow_mut() = None;
        if let Some(previous) = &previous {
            tracing::trace!(node = ?previous, "blur");
            previous.dispatch_event(&DomEvent::focus("blur", target.cloned()));
            previous.dispatch_event(&DomEvent::focus("focusout", target.cloned()));
        }
        // A blur listener may have moved focus somewhere else already.
        if self.active_element().is_some() {
            return;
        }
        if let Some(target) = target {
            *self.inner.active.borrow_mut() = Some(target.clone());
            tracing::trace!(node = ?target, "focus");
            target.dispatch_event(&DomEvent::focus("focus", previous.clone()));
            target.dispatch_event(&DomEvent::focus("focusin", previous));
        }
    }

    /// Drop the active element without firing events, as browsers do when
    /// the focused element is removed from the tree.
    pub(crate) fn forget_focus_within(&self, subtree: &Node) {
        let mut active = self.inner.active.borrow_mut();
        if active.as_ref().is_some_and(|node| subtree.contains(node)) {
            *active = None;
        }
    }

    /// Queue `callback` to run on a later turn of the event loop.
    pub fn set_timeout(&self, callback: impl FnOnce() + 'static) -> TimerId {
        let id = TimerId(self.inner.next_timer.get());
        self.inner.next_timer.set(id.0 + 1);
        self.inner.timers.borrow_mut().push_back(Timer {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Cancel a queued task. Cancelling a task that already ran is a no-op.
    pub fn clear_timeout(&self, id: TimerId) {
        self.inner.timers.borrow_mut().retain(|timer| timer.id != id);
    }

    pub fn has_pending_timers(&self) -> bool {
        !self.inner.timers.borrow().is_empty()
    }

    /// Run queued tasks, including the ones they schedule, until the queue is
    /// empty. Returns how many tasks ran.
    pub fn run_timers(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.inner.timers.borrow_mut().pop_front();
            let Some(timer) = next else {
                break;
            };
            (timer.callback)();
            ran += 1;
        }
        ran
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("active", &self.inner.active.borrow())
            .field("pending_timers", &self.inner.timers.borrow().len())
            .finish()
    }
}
