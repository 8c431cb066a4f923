use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smol_str::SmolStr;

use super::html;
use super::{Document, DocumentInner, DomEvent, EventPhase};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Handle of a native listener attached with [`Node::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Window,
    Document,
    Element,
    Text,
}

/// `addEventListener` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
}

struct NativeListener {
    id: NativeListenerId,
    event: SmolStr,
    options: ListenerOptions,
    callback: Rc<dyn Fn(&DomEvent)>,
}

/// A node in the headless DOM. Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

pub(crate) struct NodeInner {
    id: NodeId,
    kind: NodeKind,
    name: SmolStr,
    attributes: RefCell<Vec<(SmolStr, String)>>,
    text: RefCell<String>,
    children: RefCell<Vec<Node>>,
    parent: RefCell<Weak<NodeInner>>,
    listeners: RefCell<Vec<NativeListener>>,
    document: Weak<DocumentInner>,
    editor_instance: Cell<Option<u64>>,
}

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub(crate) fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

impl Node {
    pub(crate) fn new_in(document: Weak<DocumentInner>, kind: NodeKind, name: &str) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                id: NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)),
                kind,
                name: SmolStr::new(name),
                attributes: RefCell::new(Vec::new()),
                text: RefCell::new(String::new()),
                children: RefCell::new(Vec::new()),
                parent: RefCell::new(Weak::new()),
                listeners: RefCell::new(Vec::new()),
                document,
                editor_instance: Cell::new(None),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    pub fn kind(&self) -> NodeKind {
        self.inner.kind
    }

    pub fn is_element(&self) -> bool {
        self.inner.kind == NodeKind::Element
    }

    /// Lowercase tag name for elements, `#text` / `#document` / `#window` otherwise.
    pub fn local_name(&self) -> &str {
        &self.inner.name
    }

    pub fn owner_document(&self) -> Option<Document> {
        self.inner.document.upgrade().map(Document::from_inner)
    }

    // === Tree ===

    pub fn parent(&self) -> Option<Node> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Node { inner })
    }

    pub fn children(&self) -> Vec<Node> {
        self.inner.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.inner.children.borrow().first().cloned()
    }

    /// Append `child`, moving it out of its current parent first.
    pub fn append_child(&self, child: &Node) {
        let index = self.child_count();
        self.insert_child(index, child);
    }

    /// Insert `child` at `index` (clamped), moving it out of its current parent first.
    pub fn insert_child(&self, index: usize, child: &Node) {
        child.detach();
        let mut children = self.inner.children.borrow_mut();
        let index = index.min(children.len());
        children.insert(index, child.clone());
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
    }

    pub fn remove_child(&self, child: &Node) -> bool {
        if child.parent().as_ref() != Some(self) {
            return false;
        }
        child.remove();
        true
    }

    /// Detach this node from its parent. The subtree loses focus silently.
    pub fn remove(&self) {
        if let Some(document) = self.owner_document() {
            document.forget_focus_within(self);
        }
        self.detach();
    }

    fn detach(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent
            .inner
            .children
            .borrow_mut()
            .retain(|node| node != self);
        *self.inner.parent.borrow_mut() = Weak::new();
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Whether the node is attached to its document's tree.
    pub fn is_connected(&self) -> bool {
        let mut current = self.clone();
        loop {
            if current.kind() == NodeKind::Document {
                return true;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// The chain used for event propagation, target first.
    fn event_path(&self) -> Vec<Node> {
        let mut path = vec![self.clone()];
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            path.push(parent.clone());
            current = parent;
        }
        if current.kind() == NodeKind::Document {
            if let Some(document) = current.owner_document() {
                path.push(document.window().clone());
            }
        }
        path
    }

    // === Attributes ===

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .borrow()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner
            .attributes
            .borrow()
            .iter()
            .any(|(key, _)| key == name)
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let mut attributes = self.inner.attributes.borrow_mut();
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => attributes.push((SmolStr::new(name), value)),
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        self.inner
            .attributes
            .borrow_mut()
            .retain(|(key, _)| key != name);
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> Vec<(SmolStr, String)> {
        self.inner.attributes.borrow().clone()
    }

    pub fn class_list(&self) -> Vec<String> {
        self.get_attribute("class")
            .map(|classes| classes.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().iter().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) {
        let mut classes = self.class_list();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_owned());
            self.set_attribute("class", classes.join(" "));
        }
    }

    pub fn remove_class(&self, class: &str) {
        let mut classes = self.class_list();
        let before = classes.len();
        classes.retain(|c| c != class);
        if classes.len() == before {
            return;
        }
        if classes.is_empty() {
            self.remove_attribute("class");
        } else {
            self.set_attribute("class", classes.join(" "));
        }
    }

    pub fn toggle_class(&self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    // === Content ===

    pub fn text_content(&self) -> String {
        match self.kind() {
            NodeKind::Text => self.inner.text.borrow().clone(),
            _ => self
                .children()
                .iter()
                .map(Node::text_content)
                .collect::<String>(),
        }
    }

    pub fn set_text_content(&self, text: &str) {
        match self.kind() {
            NodeKind::Text => *self.inner.text.borrow_mut() = text.to_owned(),
            _ => {
                self.clear_children();
                if !text.is_empty() {
                    if let Some(document) = self.owner_document() {
                        self.append_child(&document.create_text_node(text));
                    }
                }
            }
        }
    }

    pub fn clear_children(&self) {
        for child in self.children() {
            child.remove();
        }
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            html::serialize(&child, &mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        html::serialize(self, &mut out);
        out
    }

    pub fn set_inner_html(&self, markup: &str) {
        self.clear_children();
        let Some(document) = self.owner_document() else {
            return;
        };
        for node in document.parse_fragment(markup) {
            self.append_child(&node);
        }
    }

    pub(crate) fn raw_text(&self) -> std::cell::Ref<'_, String> {
        self.inner.text.borrow()
    }

    // === Focus ===

    pub fn focus(&self) {
        if let Some(document) = self.owner_document() {
            document.set_focus(Some(self));
        }
    }

    pub fn blur(&self) {
        if let Some(document) = self.owner_document() {
            if document.active_element().as_ref() == Some(self) {
                document.set_focus(None);
            }
        }
    }

    pub fn is_focused(&self) -> bool {
        self.owner_document()
            .and_then(|document| document.active_element())
            .is_some_and(|active| active == *self)
    }

    /// Dispatch a `click` event.
    pub fn click(&self) -> bool {
        self.dispatch_event(&DomEvent::mouse("click"))
    }

    // === Editor binding ===

    /// Identifier of the editor instance bound to this element, if any.
    pub fn editor_instance(&self) -> Option<u64> {
        self.inner.editor_instance.get()
    }

    pub fn set_editor_instance(&self, editor: Option<u64>) {
        self.inner.editor_instance.set(editor);
    }

    // === Events ===

    /// Attach a native listener. Every call attaches a new listener.
    pub fn add_event_listener(
        &self,
        event: &str,
        options: ListenerOptions,
        callback: impl Fn(&DomEvent) + 'static,
    ) -> NativeListenerId {
        let id = NativeListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.borrow_mut().push(NativeListener {
            id,
            event: SmolStr::new(event),
            options,
            callback: Rc::new(callback),
        });
        id
    }

    pub fn remove_event_listener(&self, id: NativeListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|listener| listener.id != id);
        listeners.len() != before
    }

    /// Number of native listeners attached for `event` with exactly these options.
    pub fn listener_count(&self, event: &str, options: ListenerOptions) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.event == event && listener.options == options)
            .count()
    }

    /// Number of native listeners attached for any event.
    pub fn native_listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn has_native_listener(&self, id: NativeListenerId) -> bool {
        self.inner
            .listeners
            .borrow()
            .iter()
            .any(|listener| listener.id == id)
    }

    /// Dispatch `event` with DOM propagation semantics.
    ///
    /// Returns `false` when a listener cancelled the default action.
    pub fn dispatch_event(&self, event: &DomEvent) -> bool {
        let path = self.event_path();
        event.set_target(Some(self.clone()));

        'dispatch: {
            event.set_phase(EventPhase::Capturing);
            for node in path.iter().skip(1).rev() {
                node.invoke_listeners(event, true);
                if event.is_propagation_stopped() {
                    break 'dispatch;
                }
            }

            event.set_phase(EventPhase::AtTarget);
            self.invoke_listeners(event, true);
            if !event.is_immediate_propagation_stopped() {
                self.invoke_listeners(event, false);
            }
            if event.is_propagation_stopped() || !event.bubbles() {
                break 'dispatch;
            }

            event.set_phase(EventPhase::Bubbling);
            for node in path.iter().skip(1) {
                node.invoke_listeners(event, false);
                if event.is_propagation_stopped() {
                    break;
                }
            }
        }

        event.set_phase(EventPhase::None);
        event.set_current_target(None);
        !event.default_prevented()
    }

    fn invoke_listeners(&self, event: &DomEvent, capture: bool) {
        let matching: Vec<(NativeListenerId, bool, Rc<dyn Fn(&DomEvent)>)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|listener| {
                listener.event == event.kind() && listener.options.capture == capture
            })
            .map(|listener| (listener.id, listener.options.passive, listener.callback.clone()))
            .collect();
        if matching.is_empty() {
            return;
        }

        event.set_current_target(Some(self.clone()));
        for (id, passive, callback) in matching {
            if event.is_immediate_propagation_stopped() {
                break;
            }
            // Listeners removed by an earlier listener in this round do not run.
            if !self.has_native_listener(id) {
                continue;
            }
            event.set_in_passive_listener(passive);
            callback(event);
            event.set_in_passive_listener(false);
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}#{}>", self.inner.name, self.inner.id.0)
    }
}
