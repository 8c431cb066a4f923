//! Tracking whether focus is inside a set of elements and nested focus scopes.
//!
//! A [`FocusTracker`] watches plain DOM elements through capturing
//! `focus`/`blur` listeners. Components that own a tracker of their own are
//! linked as external views instead: the parent mirrors the child tracker's
//! state and attributes focus to the component's root element, never to the
//! elements inside it.
//!
//! Blur is deferred to the next macrotask. A focus arriving in the meantime
//! (focus moving between two tracked siblings) cancels it, so `is_focused`
//! never flickers to `false` during a hand-off.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dom::{Document, Node, TimerId};
use crate::dom_emitter::DomListenOptions;
use crate::emitter::{Emitter, EventInfo};
use crate::error::{Error, Result};
use crate::observable::{Property, PropertyChange};

/// Capability of components that manage focus inside their own subtree.
pub trait HasOwnFocusTracker {
    /// The component's root element, once rendered.
    fn element(&self) -> Option<Node>;
    fn focus_tracker(&self) -> FocusTracker;
}

/// Something a [`FocusTracker`] can track.
#[derive(Clone)]
pub enum Trackable {
    Element(Node),
    /// A component without a tracker of its own; its root element is tracked.
    View { element: Option<Node> },
    /// A component with its own tracker, linked as an external view.
    Scope {
        element: Option<Node>,
        tracker: FocusTracker,
    },
}

impl Trackable {
    pub fn scope(component: &dyn HasOwnFocusTracker) -> Self {
        Self::Scope {
            element: component.element(),
            tracker: component.focus_tracker(),
        }
    }
}

impl From<&Node> for Trackable {
    fn from(node: &Node) -> Self {
        Self::Element(node.clone())
    }
}

impl From<Node> for Trackable {
    fn from(node: Node) -> Self {
        Self::Element(node)
    }
}

#[derive(Clone)]
struct ExternalView {
    element: Node,
    tracker: FocusTracker,
}

impl ExternalView {
    /// Whether focus sits inside this view and the view lives under `root`.
    fn is_focused_within(&self, root: &Node, active: &Node) -> bool {
        self.element.contains(active) && root.contains(&self.element)
    }

    /// Like [`is_focused_within`](Self::is_focused_within), also looking one
    /// level into the view's own external views.
    fn subtree_focused(&self, root: &Node, active: &Node) -> bool {
        self.is_focused_within(root, active)
            || self
                .tracker
                .inner
                .external_views
                .borrow()
                .iter()
                .any(|view| view.is_focused_within(root, active))
    }
}

/// Observable focus state of a set of elements and linked trackers.
#[derive(Clone)]
pub struct FocusTracker {
    inner: Rc<TrackerInner>,
}

struct TrackerInner {
    emitter: Emitter,
    is_focused: Property<bool>,
    focused_element: Property<Option<Node>>,
    elements: RefCell<Vec<Node>>,
    external_views: RefCell<Vec<ExternalView>>,
    blur_timeout: Cell<Option<TimerId>>,
    document: RefCell<Option<Document>>,
}

impl FocusTracker {
    pub fn new() -> Self {
        let emitter = Emitter::new();
        Self {
            inner: Rc::new(TrackerInner {
                is_focused: Property::new(&emitter, "isFocused", false),
                focused_element: Property::new(&emitter, "focusedElement", None),
                emitter,
                elements: RefCell::new(Vec::new()),
                external_views: RefCell::new(Vec::new()),
                blur_timeout: Cell::new(None),
                document: RefCell::new(None),
            }),
        }
    }

    fn downgrade(&self) -> Weak<TrackerInner> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<TrackerInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// The emitter `change:isFocused` and `change:focusedElement` fire on.
    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn is_focused(&self) -> bool {
        self.inner.is_focused.get()
    }

    /// The tracked element (or linked view root) that holds focus.
    pub fn focused_element(&self) -> Option<Node> {
        self.inner.focused_element.get()
    }

    pub fn is_focused_property(&self) -> &Property<bool> {
        &self.inner.is_focused
    }

    pub fn focused_element_property(&self) -> &Property<Option<Node>> {
        &self.inner.focused_element
    }

    /// Tracked DOM elements, including the roots of linked views.
    pub fn elements(&self) -> Vec<Node> {
        self.inner.elements.borrow().clone()
    }

    /// Trackers of the linked external views.
    pub fn external_trackers(&self) -> Vec<FocusTracker> {
        self.inner
            .external_views
            .borrow()
            .iter()
            .map(|view| view.tracker.clone())
            .collect()
    }

    pub fn has_pending_blur(&self) -> bool {
        self.inner.blur_timeout.get().is_some()
    }

    /// Start tracking an element or component.
    ///
    /// Fails with [`Error::DuplicateTrackedElement`] if the element is
    /// tracked already, and with [`Error::ViewMissingElement`] for a component
    /// that has not been rendered.
    pub fn add(&self, entry: impl Into<Trackable>) -> Result<()> {
        match entry.into() {
            Trackable::Element(element) => self.add_element(&element),
            Trackable::View { element } => {
                let element = element.ok_or(Error::ViewMissingElement)?;
                self.add_element(&element)
            }
            Trackable::Scope { element, tracker } => {
                let element = element.ok_or(Error::ViewMissingElement)?;
                self.add_view(element, tracker)
            }
        }
    }

    fn add_element(&self, element: &Node) -> Result<()> {
        if self.inner.elements.borrow().contains(element) {
            return Err(Error::DuplicateTrackedElement);
        }
        if self.inner.document.borrow().is_none() {
            *self.inner.document.borrow_mut() = element.owner_document();
        }

        let weak = self.downgrade();
        let root = element.clone();
        self.inner.emitter.listen_to_dom(
            element,
            "focus",
            DomListenOptions::capture(),
            move |_: &mut EventInfo, _| {
                let Some(tracker) = Self::upgrade(&weak) else {
                    return;
                };
                let focused_view = tracker.active_element().and_then(|active| {
                    tracker
                        .inner
                        .external_views
                        .borrow()
                        .iter()
                        .find(|view| view.subtree_focused(&root, &active))
                        .map(|view| view.element.clone())
                });
                tracker.focus(focused_view.unwrap_or_else(|| root.clone()));
            },
        );
        let weak = self.downgrade();
        self.inner.emitter.listen_to_dom(
            element,
            "blur",
            DomListenOptions::capture(),
            move |_: &mut EventInfo, _| {
                if let Some(tracker) = Self::upgrade(&weak) {
                    tracker.blur();
                }
            },
        );
        self.inner.elements.borrow_mut().push(element.clone());
        Ok(())
    }

    fn add_view(&self, element: Node, tracker: FocusTracker) -> Result<()> {
        self.add_element(&element)?;

        let weak = self.downgrade();
        let child = tracker.clone();
        let view_element = element.clone();
        self.inner.emitter.listen_to(
            tracker.emitter(),
            "change:focusedElement",
            move |_: &mut EventInfo, _: &PropertyChange<Option<Node>>| {
                let Some(parent) = Self::upgrade(&weak) else {
                    return;
                };
                if child.focused_element().is_some() {
                    parent.focus(view_element.clone());
                } else {
                    parent.blur();
                }
            },
        );
        self.inner
            .external_views
            .borrow_mut()
            .push(ExternalView { element, tracker });
        Ok(())
    }

    /// Stop tracking. Unknown entries are ignored. Removing the entry that
    /// holds focus blurs the tracker.
    pub fn remove(&self, entry: impl Into<Trackable>) {
        match entry.into() {
            Trackable::Element(element) => self.remove_element(&element),
            Trackable::View { element } => {
                if let Some(element) = element {
                    self.remove_element(&element);
                }
            }
            Trackable::Scope { element, tracker } => {
                // Unlink first so the blur below does not wait on the
                // removed view's tracker.
                self.inner
                    .emitter
                    .stop_listening(Some(tracker.emitter()), None, None);
                self.inner
                    .external_views
                    .borrow_mut()
                    .retain(|view| view.tracker != tracker);
                if let Some(element) = &element {
                    self.remove_element(element);
                }
            }
        }
    }

    fn remove_element(&self, element: &Node) {
        let tracked = {
            let mut elements = self.inner.elements.borrow_mut();
            let before = elements.len();
            elements.retain(|tracked| tracked != element);
            elements.len() != before
        };
        if tracked {
            self.inner.emitter.stop_listening_dom(Some(element), None, None);
        }
        if self.focused_element().as_ref() == Some(element) {
            self.blur();
        }
    }

    /// Stop listening to everything and reset to the blurred state.
    pub fn destroy(&self) {
        self.clear_blur_timeout();
        self.inner.emitter.stop_listening(None, None, None);
        self.inner.elements.borrow_mut().clear();
        self.inner.external_views.borrow_mut().clear();
        self.inner.is_focused.set(false);
        self.inner.focused_element.set(None);
    }

    fn active_element(&self) -> Option<Node> {
        self.inner
            .document
            .borrow()
            .as_ref()
            .and_then(Document::active_element)
    }

    fn focus(&self, element: Node) {
        self.clear_blur_timeout();
        tracing::trace!(element = ?element, "focus tracker focused");
        self.inner.focused_element.set(Some(element));
        self.inner.is_focused.set(true);
    }

    fn blur(&self) {
        let active = self.active_element();
        if let Some(active) = &active {
            if self
                .inner
                .elements
                .borrow()
                .iter()
                .any(|element| element.contains(active))
            {
                return;
            }
        }
        let external_focused = self
            .inner
            .external_views
            .borrow()
            .iter()
            .any(|view| view.tracker.is_focused() && !view.tracker.has_pending_blur());
        if external_focused {
            return;
        }

        self.clear_blur_timeout();
        let Some(document) = self.inner.document.borrow().clone() else {
            self.clear_state();
            return;
        };
        let weak = self.downgrade();
        let timer = document.set_timeout(move || {
            if let Some(tracker) = Self::upgrade(&weak) {
                tracker.inner.blur_timeout.set(None);
                tracker.clear_state();
            }
        });
        self.inner.blur_timeout.set(Some(timer));
    }

    fn clear_state(&self) {
        tracing::trace!("focus tracker blurred");
        self.inner.focused_element.set(None);
        self.inner.is_focused.set(false);
    }

    fn clear_blur_timeout(&self) {
        if let Some(timer) = self.inner.blur_timeout.take() {
            if let Some(document) = self.inner.document.borrow().as_ref() {
                document.clear_timeout(timer);
            }
        }
    }
}

impl Default for FocusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FocusTracker {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for FocusTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusTracker")
            .field("is_focused", &self.is_focused())
            .field("focused_element", &self.focused_element())
            .field("elements", &self.inner.elements.borrow().len())
            .field("external_views", &self.inner.external_views.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Panel {
        element: Node,
        tracker: FocusTracker,
    }

    impl HasOwnFocusTracker for Panel {
        fn element(&self) -> Option<Node> {
            Some(self.element.clone())
        }

        fn focus_tracker(&self) -> FocusTracker {
            self.tracker.clone()
        }
    }

    /// A panel with two buttons tracked by the panel's own tracker.
    fn panel(doc: &Document, parent: &Node) -> (Panel, Node, Node) {
        let element = doc.create_element("div");
        let first = doc.create_element("button");
        let second = doc.create_element("button");
        element.append_child(&first);
        element.append_child(&second);
        parent.append_child(&element);
        let tracker = FocusTracker::new();
        tracker.add(&first).unwrap();
        tracker.add(&second).unwrap();
        (Panel { element, tracker }, first, second)
    }

    fn input(doc: &Document) -> Node {
        let node = doc.create_element("input");
        doc.body().append_child(&node);
        node
    }

    fn count_changes<T: Clone + PartialEq + 'static>(property: &Property<T>) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        property.on_change(move |_| counter.set(counter.get() + 1));
        count
    }

    #[test]
    fn focus_and_deferred_blur() {
        let doc = Document::new();
        let a = input(&doc);
        let outside = input(&doc);
        let tracker = FocusTracker::new();
        tracker.add(&a).unwrap();

        a.focus();
        assert!(tracker.is_focused());
        assert_eq!(tracker.focused_element(), Some(a.clone()));

        outside.focus();
        // Still focused until the deferred blur runs.
        assert!(tracker.is_focused());
        assert!(tracker.has_pending_blur());

        doc.run_timers();
        assert!(!tracker.is_focused());
        assert_eq!(tracker.focused_element(), None);
    }

    #[test]
    fn moving_between_siblings_does_not_flicker() {
        let doc = Document::new();
        let a = input(&doc);
        let b = input(&doc);
        let tracker = FocusTracker::new();
        tracker.add(&a).unwrap();
        tracker.add(&b).unwrap();
        a.focus();
        let is_focused_changes = count_changes(tracker.is_focused_property());
        let element_changes = count_changes(tracker.focused_element_property());

        b.focus();
        doc.run_timers();

        assert_eq!(is_focused_changes.get(), 0);
        assert_eq!(element_changes.get(), 1);
        assert_eq!(tracker.focused_element(), Some(b));
        assert!(tracker.is_focused());
    }

    #[test]
    fn duplicate_add_fails_and_keeps_state() {
        let doc = Document::new();
        let a = input(&doc);
        let tracker = FocusTracker::new();
        tracker.add(&a).unwrap();
        let listeners = a.native_listener_count();

        let err = tracker.add(&a).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DuplicateTrackedElement);
        assert_eq!(err.code(), "focustracker-add-element-already-exist");
        assert_eq!(tracker.elements(), vec![a.clone()]);
        assert_eq!(a.native_listener_count(), listeners);
    }

    #[test]
    fn view_without_element_is_rejected() {
        let tracker = FocusTracker::new();
        let err = tracker.add(Trackable::View { element: None }).unwrap_err();
        assert_eq!(err.code(), "focustracker-add-view-missing-element");
    }

    #[test]
    fn unrendered_scope_is_rejected() {
        let tracker = FocusTracker::new();
        let err = tracker
            .add(Trackable::Scope {
                element: None,
                tracker: FocusTracker::new(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ViewMissingElement);
        assert!(tracker.external_trackers().is_empty());
    }

    #[test]
    fn removing_a_focused_scope_blurs_the_parent() {
        let doc = Document::new();
        let (panel, first, _) = panel(&doc, doc.body());
        let root = FocusTracker::new();
        root.add(Trackable::scope(&panel)).unwrap();

        first.focus();
        assert_eq!(root.focused_element(), Some(panel.element.clone()));

        root.remove(Trackable::scope(&panel));
        doc.run_timers();

        assert!(!root.is_focused());
        assert_eq!(root.focused_element(), None);
        assert!(root.external_trackers().is_empty());
        // The panel keeps tracking its own buttons.
        assert_eq!(panel.tracker.focused_element(), Some(first));
        assert!(!panel.tracker.emitter().has_listeners("change:focusedElement"));
    }

    #[test]
    fn remove_is_safe_and_blurs_the_focused_entry() {
        let doc = Document::new();
        let a = input(&doc);
        let never_added = input(&doc);
        let tracker = FocusTracker::new();
        tracker.add(&a).unwrap();
        tracker.remove(&never_added);

        a.focus();
        tracker.remove(&a);
        doc.run_timers();

        // `a` still holds DOM focus but is not tracked anymore.
        assert!(!tracker.is_focused());
        assert_eq!(a.native_listener_count(), 0);
    }

    #[test]
    fn linked_views_report_their_root_element() {
        let doc = Document::new();
        let toolbar = doc.create_element("div");
        doc.body().append_child(&toolbar);
        let (panel, first, second) = panel(&doc, &toolbar);
        let editable = input(&doc);

        let root = FocusTracker::new();
        root.add(Trackable::scope(&panel)).unwrap();
        root.add(&editable).unwrap();
        let element_changes = count_changes(root.focused_element_property());
        let focus_changes = count_changes(root.is_focused_property());

        first.focus();
        assert_eq!(root.focused_element(), Some(panel.element.clone()));
        assert_eq!(panel.tracker.focused_element(), Some(first.clone()));

        // Moving inside the panel is invisible to the root tracker.
        second.focus();
        doc.run_timers();
        assert_eq!(panel.tracker.focused_element(), Some(second));
        assert_eq!(root.focused_element(), Some(panel.element.clone()));
        assert_eq!(element_changes.get(), 1);

        editable.focus();
        doc.run_timers();
        assert_eq!(root.focused_element(), Some(editable));
        assert!(!panel.tracker.is_focused());
        assert!(root.is_focused());
        assert_eq!(focus_changes.get(), 1);
        assert_eq!(element_changes.get(), 2);
    }

    #[test]
    fn nested_scopes_attribute_focus_level_by_level() {
        let doc = Document::new();
        let toolbar_element = doc.create_element("div");
        doc.body().append_child(&toolbar_element);
        let (dropdown, button, _) = panel(&doc, &toolbar_element);
        let toolbar = Panel {
            element: toolbar_element.clone(),
            tracker: FocusTracker::new(),
        };
        toolbar.tracker.add(Trackable::scope(&dropdown)).unwrap();
        let root = FocusTracker::new();
        root.add(Trackable::scope(&toolbar)).unwrap();

        button.focus();

        assert_eq!(dropdown.tracker.focused_element(), Some(button));
        assert_eq!(toolbar.tracker.focused_element(), Some(dropdown.element.clone()));
        assert_eq!(root.focused_element(), Some(toolbar_element));
        assert!(root.is_focused());
    }

    #[test]
    fn focus_tracking_settles_to_dom_truth() {
        let doc = Document::new();
        let nodes: Vec<Node> = (0..4).map(|_| input(&doc)).collect();
        let tracker = FocusTracker::new();
        tracker.add(&nodes[0]).unwrap();
        tracker.add(&nodes[1]).unwrap();

        let check = |tracker: &FocusTracker, doc: &Document| {
            doc.run_timers();
            let expected = doc
                .active_element()
                .is_some_and(|active| tracker.elements().iter().any(|el| el.contains(&active)));
            assert_eq!(tracker.is_focused(), expected, "{tracker:?}");
        };

        for step in [0, 2, 1, 1, 3, 0, 2] {
            nodes[step].focus();
            check(&tracker, &doc);
        }
        tracker.add(&nodes[2]).unwrap();
        nodes[2].blur();
        check(&tracker, &doc);
        nodes[2].focus();
        check(&tracker, &doc);
        tracker.remove(&nodes[0]);
        nodes[0].focus();
        check(&tracker, &doc);
        nodes[1].focus();
        tracker.remove(&nodes[1]);
        check(&tracker, &doc);
    }

    #[test]
    fn destroy_detaches_and_resets() {
        let doc = Document::new();
        let a = input(&doc);
        let (panel, first, _) = panel(&doc, doc.body());
        let tracker = FocusTracker::new();
        tracker.add(&a).unwrap();
        tracker.add(Trackable::scope(&panel)).unwrap();
        first.focus();

        tracker.destroy();

        assert!(!tracker.is_focused());
        assert_eq!(tracker.focused_element(), None);
        assert_eq!(a.native_listener_count(), 0);
        assert!(!panel.tracker.emitter().has_listeners("change:focusedElement"));
        tracker.destroy();
    }
}
