//! The editing view: DOM roots the model is rendered into.
//!
//! The view owns the DOM side of editing. It renders model roots into the
//! attached DOM roots, tracks focus of those roots in `isFocused`, mirrors
//! `isReadOnly` into `contenteditable`, and re-fires native `keydown` events
//! as `keydown` with a [`KeyEventData`] payload so keystroke handlers can
//! listen to the view instead of to every root.
//!
//! Events fired on [`EditingView::emitter`]:
//!
//! | event            | payload        |
//! |------------------|----------------|
//! | `attachDomRoot`  | `SmolStr` name |
//! | `detachDomRoot`  | `SmolStr` name |
//! | `render`         | `()`           |
//! | `keydown`        | `KeyEventData` |
//! | `focus` / `blur` | `SmolStr` name |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::keyboard::KeyEventData;
use tessera_utils::{Document, DomListenOptions, Emitter, EventInfo, Property, PropertyChange};

use crate::conversion::{Conversion, EmptyBlock};
use crate::model::Model;
use crate::placeholder::PlaceholderConfig;

#[derive(Clone)]
pub struct EditingView {
    inner: Rc<ViewInner>,
}

pub(crate) struct ViewInner {
    emitter: Emitter,
    document: Document,
    dom_roots: RefCell<Vec<(SmolStr, Node)>>,
    is_focused: Property<bool>,
    is_read_only: Property<bool>,
    pub(crate) placeholders: RefCell<Vec<PlaceholderConfig>>,
}

impl EditingView {
    pub fn new(document: &Document) -> Self {
        let emitter = Emitter::new();
        let view = Self {
            inner: Rc::new(ViewInner {
                is_focused: Property::new(&emitter, "isFocused", false),
                is_read_only: Property::new(&emitter, "isReadOnly", false),
                emitter,
                document: document.clone(),
                dom_roots: RefCell::new(Vec::new()),
                placeholders: RefCell::new(Vec::new()),
            }),
        };

        let weak = view.downgrade();
        view.inner
            .is_read_only
            .on_change(move |change: &PropertyChange<bool>| {
                if let Some(view) = Self::upgrade(&weak) {
                    for (_, root) in view.inner.dom_roots.borrow().iter() {
                        root.set_attribute("contenteditable", (!change.new).to_string());
                    }
                }
            });
        let weak = view.downgrade();
        view.inner.is_focused.on_change(move |_| {
            if let Some(view) = Self::upgrade(&weak) {
                view.update_placeholders();
            }
        });
        view
    }

    fn downgrade(&self) -> Weak<ViewInner> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<ViewInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn inner(&self) -> &ViewInner {
        &self.inner
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn is_focused(&self) -> bool {
        self.inner.is_focused.get()
    }

    pub fn is_focused_property(&self) -> &Property<bool> {
        &self.inner.is_focused
    }

    pub fn is_read_only_property(&self) -> &Property<bool> {
        &self.inner.is_read_only
    }

    pub fn dom_root(&self, name: &str) -> Option<Node> {
        self.inner
            .dom_roots
            .borrow()
            .iter()
            .find(|(root, _)| root == name)
            .map(|(_, node)| node.clone())
    }

    pub fn dom_root_names(&self) -> Vec<SmolStr> {
        self.inner
            .dom_roots
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Make `node` the DOM root for the model root `name`.
    pub fn attach_dom_root(&self, node: &Node, name: &str) {
        if self.dom_root(name).is_some() {
            self.detach_dom_root(name);
        }
        node.set_attribute(
            "contenteditable",
            (!self.inner.is_read_only.get()).to_string(),
        );
        self.inner
            .dom_roots
            .borrow_mut()
            .push((SmolStr::new(name), node.clone()));

        let root_name = SmolStr::new(name);
        let weak = self.downgrade();
        self.inner.emitter.listen_to_dom(
            node,
            "focus",
            DomListenOptions::default(),
            move |_: &mut EventInfo, _| {
                if let Some(view) = Self::upgrade(&weak) {
                    view.inner.is_focused.set(true);
                    view.inner.emitter.fire("focus", &root_name);
                }
            },
        );
        let root_name = SmolStr::new(name);
        let weak = self.downgrade();
        self.inner.emitter.listen_to_dom(
            node,
            "blur",
            DomListenOptions::default(),
            move |_: &mut EventInfo, _| {
                if let Some(view) = Self::upgrade(&weak) {
                    view.inner.is_focused.set(false);
                    view.inner.emitter.fire("blur", &root_name);
                }
            },
        );
        let weak = self.downgrade();
        self.inner.emitter.listen_to_dom(
            node,
            "keydown",
            DomListenOptions::capture(),
            move |_: &mut EventInfo, event| {
                if let Some(view) = Self::upgrade(&weak) {
                    view.inner
                        .emitter
                        .fire("keydown", &KeyEventData::from_dom(event));
                }
            },
        );

        tracing::debug!(root = name, "attached DOM root");
        self.inner
            .emitter
            .fire("attachDomRoot", &SmolStr::new(name));
    }

    /// Detach the DOM root of `name`, removing every native listener the
    /// view put on it. Returns the detached node.
    pub fn detach_dom_root(&self, name: &str) -> Option<Node> {
        let node = {
            let mut roots = self.inner.dom_roots.borrow_mut();
            let index = roots.iter().position(|(root, _)| root == name);
            index.map(|index| roots.remove(index).1)
        };
        let Some(node) = node else {
            tracing::warn!(root = name, "detaching a DOM root that is not attached");
            return None;
        };
        self.inner.emitter.stop_listening_dom(Some(&node), None, None);
        node.remove_attribute("contenteditable");
        self.disable_placeholder(&node);
        tracing::debug!(root = name, "detached DOM root");
        self.inner
            .emitter
            .fire("detachDomRoot", &SmolStr::new(name));
        Some(node)
    }

    /// Render every attached root from the model.
    pub fn render(&self, model: &Model, conversion: &Conversion) {
        let roots = self.inner.dom_roots.borrow().clone();
        for (name, node) in roots {
            if let Some(element) = model.root(&name) {
                conversion.downcast_children(
                    &element,
                    &self.inner.document,
                    &node,
                    EmptyBlock::Empty,
                );
            }
        }
        self.update_placeholders();
        self.inner.emitter.fire("render", &());
    }

    /// Focus the first attached root.
    pub fn focus(&self) {
        let first = self.inner.dom_roots.borrow().first().map(|(_, node)| node.clone());
        if let Some(node) = first {
            if !node.is_focused() {
                node.focus();
            }
        }
    }

    pub fn destroy(&self) {
        for name in self.dom_root_names() {
            self.detach_dom_root(&name);
        }
        self.inner.emitter.stop_listening(None, None, None);
    }
}

impl fmt::Debug for EditingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditingView")
            .field("roots", &self.dom_root_names())
            .field("is_focused", &self.is_focused())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::model::ModelElement;
    use tessera_utils::keyboard::ENTER;

    fn setup() -> (Document, Node, EditingView) {
        let doc = Document::new();
        let editable = doc.create_element("div");
        doc.body().append_child(&editable);
        let view = EditingView::new(&doc);
        (doc, editable, view)
    }

    #[test]
    fn renders_model_roots_into_attached_dom() {
        let (_doc, editable, view) = setup();
        let model = Model::new();
        model.create_root("main");
        let conversion = Conversion::new();
        conversion.element_to_element("paragraph", "p");
        model.change(|writer| {
            writer
                .append("main", ModelElement::new("paragraph").with_text("hi"))
                .unwrap()
        });

        view.attach_dom_root(&editable, "main");
        view.render(&model, &conversion);

        insta::assert_snapshot!(editable.outer_html(), @r#"<div contenteditable="true"><p>hi</p></div>"#);
    }

    #[test]
    fn tracks_focus_and_forwards_keydown() {
        let (doc, editable, view) = setup();
        view.attach_dom_root(&editable, "main");
        let keys = Rc::new(Cell::new(0));
        {
            let keys = keys.clone();
            view.emitter()
                .on("keydown", move |_: &mut EventInfo, data: &KeyEventData| {
                    keys.set(data.key_code)
                });
        }

        editable.focus();
        assert!(view.is_focused());
        editable.dispatch_event(&KeyEventData::new(ENTER).to_dom_event("keydown"));
        assert_eq!(keys.get(), ENTER);

        doc.body().focus();
        assert!(!view.is_focused());
    }

    #[test]
    fn detach_removes_native_listeners_and_editability() {
        let (_doc, editable, view) = setup();
        view.attach_dom_root(&editable, "main");
        assert!(editable.native_listener_count() > 0);

        assert_eq!(view.detach_dom_root("main"), Some(editable.clone()));
        assert_eq!(editable.native_listener_count(), 0);
        assert!(!editable.has_attribute("contenteditable"));
        assert_eq!(view.detach_dom_root("main"), None);
    }

    #[test]
    fn read_only_toggles_contenteditable() {
        let (_doc, editable, view) = setup();
        view.attach_dom_root(&editable, "main");
        view.is_read_only_property().set(true);
        assert_eq!(editable.get_attribute("contenteditable").as_deref(), Some("false"));
        view.is_read_only_property().set(false);
        assert_eq!(editable.get_attribute("contenteditable").as_deref(), Some("true"));
    }
}
