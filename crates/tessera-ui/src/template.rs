//! Declarative element descriptions with bindings to observable properties.
//!
//! A [`Template`] describes one element: tag, attributes, children and the
//! DOM events it forwards. Attribute and text values are lists of
//! [`AttrPart`]s; bound parts are recomputed whenever their property changes
//! and the element is updated in place.
//!
//! ```ignore
//! let template = Template::new("button")
//!     .class("ck")
//!     .class("ck-button")
//!     .attr("class", Bind::when(&is_on, "ck-on"))
//!     .attr("aria-pressed", Bind::to(&is_on))
//!     .text(Bind::to(&label))
//!     .on("click", "execute");
//! ```
//!
//! Every subscription a template creates is owned by the view's emitter, so
//! destroying the view releases them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::{
    DomEvent, DomListenOptions, Emitter, Error, EventInfo, ListenOptions, Property, Result, Trigger,
};

use crate::view::{View, ViewBase};
use crate::view_collection::ViewCollection;

/// A value computed from observable state.
#[derive(Clone)]
pub struct BoundValue {
    trigger: Trigger,
    compute: Rc<dyn Fn() -> Option<String>>,
}

impl BoundValue {
    pub fn get(&self) -> Option<String> {
        (self.compute)()
    }
}

/// One piece of an attribute value or text node.
#[derive(Clone)]
pub enum AttrPart {
    Static(SmolStr),
    Bound(BoundValue),
}

impl AttrPart {
    fn value(&self) -> Option<String> {
        match self {
            Self::Static(value) => Some(value.to_string()),
            Self::Bound(bound) => bound.get(),
        }
    }
}

impl From<&str> for AttrPart {
    fn from(value: &str) -> Self {
        Self::Static(SmolStr::new(value))
    }
}

impl From<String> for AttrPart {
    fn from(value: String) -> Self {
        Self::Static(SmolStr::from(value))
    }
}

impl From<SmolStr> for AttrPart {
    fn from(value: SmolStr) -> Self {
        Self::Static(value)
    }
}

/// Constructors for bound [`AttrPart`]s.
pub struct Bind;

impl Bind {
    /// The property's value, formatted with `Display`.
    pub fn to<T>(property: &Property<T>) -> AttrPart
    where
        T: Clone + PartialEq + fmt::Display + 'static,
    {
        Self::to_with(property, |value| Some(value.to_string()))
    }

    /// The property's value mapped through `map`. `None` removes the part.
    pub fn to_with<T>(
        property: &Property<T>,
        map: impl Fn(&T) -> Option<String> + 'static,
    ) -> AttrPart
    where
        T: Clone + PartialEq + 'static,
    {
        let source = property.clone();
        AttrPart::Bound(BoundValue {
            trigger: property.trigger(),
            compute: Rc::new(move || source.with(&map)),
        })
    }

    /// `value` while the property is `true`.
    pub fn when(property: &Property<bool>, value: &str) -> AttrPart {
        let value = value.to_owned();
        Self::to_with(property, move |on| on.then(|| value.clone()))
    }

    /// `value` while the property is `false`.
    pub fn unless(property: &Property<bool>, value: &str) -> AttrPart {
        let value = value.to_owned();
        Self::to_with(property, move |on| (!on).then(|| value.clone()))
    }
}

#[derive(Clone)]
pub enum TemplateChild {
    Element(Template),
    Text(AttrPart),
    View(Rc<dyn View>),
    Collection(ViewCollection),
}

#[derive(Clone)]
enum ListenerAction {
    /// Re-fire the DOM event on the view's emitter under this name.
    Fire(SmolStr),
    Call(Rc<dyn Fn(&DomEvent)>),
}

#[derive(Clone)]
struct TemplateListener {
    event: SmolStr,
    options: DomListenOptions,
    action: ListenerAction,
}

#[derive(Clone)]
pub struct Template {
    tag: SmolStr,
    attributes: Vec<(SmolStr, Vec<AttrPart>)>,
    children: Vec<TemplateChild>,
    listeners: Vec<TemplateListener>,
}

impl Template {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag),
            attributes: Vec::new(),
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Append a part to attribute `name`. Parts are joined with spaces.
    pub fn attr(mut self, name: &str, part: impl Into<AttrPart>) -> Self {
        let part = part.into();
        match self.attributes.iter_mut().find(|(attr, _)| attr == name) {
            Some((_, parts)) => parts.push(part),
            None => self.attributes.push((SmolStr::new(name), vec![part])),
        }
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, template: Template) -> Self {
        self.children.push(TemplateChild::Element(template));
        self
    }

    pub fn text(mut self, part: impl Into<AttrPart>) -> Self {
        self.children.push(TemplateChild::Text(part.into()));
        self
    }

    pub fn view(mut self, view: Rc<dyn View>) -> Self {
        self.children.push(TemplateChild::View(view));
        self
    }

    /// Render every view of `collection` into this element, keeping it in
    /// sync as views come and go.
    pub fn collection(mut self, collection: &ViewCollection) -> Self {
        self.children.push(TemplateChild::Collection(collection.clone()));
        self
    }

    /// Re-fire DOM event `dom_event` on the view's emitter as `view_event`
    /// with the [`DomEvent`] as payload.
    pub fn on(mut self, dom_event: &str, view_event: &str) -> Self {
        self.listeners.push(TemplateListener {
            event: SmolStr::new(dom_event),
            options: DomListenOptions::default(),
            action: ListenerAction::Fire(SmolStr::new(view_event)),
        });
        self
    }

    pub fn on_dom(
        mut self,
        dom_event: &str,
        options: DomListenOptions,
        callback: impl Fn(&DomEvent) + 'static,
    ) -> Self {
        self.listeners.push(TemplateListener {
            event: SmolStr::new(dom_event),
            options,
            action: ListenerAction::Call(Rc::new(callback)),
        });
        self
    }

    /// Views placed directly among the children.
    pub fn views(&self) -> Vec<Rc<dyn View>> {
        let mut views = Vec::new();
        for child in &self.children {
            match child {
                TemplateChild::View(view) => views.push(view.clone()),
                TemplateChild::Element(template) => views.extend(template.views()),
                TemplateChild::Text(_) | TemplateChild::Collection(_) => {}
            }
        }
        views
    }

    /// Create the element described by this template.
    pub(crate) fn render(&self, owner: &ViewBase) -> Result<Node> {
        if self.tag.is_empty() {
            return Err(Error::TemplateWrongSyntax {
                reason: "a template element needs a tag name",
            });
        }
        let document = owner.document();
        let node = document.create_element(&self.tag);
        self.bind_attributes(owner.emitter(), &node);

        for child in &self.children {
            match child {
                TemplateChild::Element(template) => node.append_child(&template.render(owner)?),
                TemplateChild::Text(part) => {
                    let text = document.create_text_node("");
                    bind_text(owner.emitter(), &text, part);
                    node.append_child(&text);
                }
                TemplateChild::View(view) => {
                    owner.register_child(view.clone())?;
                    if let Some(element) = view.element() {
                        node.append_child(&element);
                    }
                }
                TemplateChild::Collection(collection) => collection.set_parent(&node)?,
            }
        }

        self.attach_listeners(owner.emitter(), &node);
        Ok(node)
    }

    /// Apply attributes and listeners to an element that exists already.
    /// Children are left alone.
    pub(crate) fn apply(&self, owner: &ViewBase, node: &Node) {
        self.bind_attributes(owner.emitter(), node);
        self.attach_listeners(owner.emitter(), node);
    }

    /// Undo [`apply`](Self::apply): remove the attributes and classes it
    /// set. Listeners are owned by the view and go with it.
    pub(crate) fn revert(&self, node: &Node) {
        for (name, parts) in &self.attributes {
            if name == "class" {
                for class in parts.iter().filter_map(AttrPart::value) {
                    for token in class.split_whitespace() {
                        node.remove_class(token);
                    }
                }
            } else {
                node.remove_attribute(name);
            }
        }
    }

    fn bind_attributes(&self, listener: &Emitter, node: &Node) {
        for (name, parts) in &self.attributes {
            let update: Rc<dyn Fn()> = if name == "class" {
                class_updater(node, parts.clone())
            } else {
                attribute_updater(node, name.clone(), parts.clone())
            };
            update();
            subscribe(listener, parts, &update);
        }
    }

    fn attach_listeners(&self, emitter: &Emitter, node: &Node) {
        for listener in &self.listeners {
            match &listener.action {
                ListenerAction::Fire(name) => {
                    let target = emitter.downgrade();
                    let name = name.clone();
                    emitter.listen_to_dom(
                        node,
                        &listener.event,
                        listener.options,
                        move |_: &mut EventInfo, event| {
                            if let Some(target) = target.upgrade() {
                                target.fire(&name, event);
                            }
                        },
                    );
                }
                ListenerAction::Call(callback) => {
                    let callback = callback.clone();
                    emitter.listen_to_dom(
                        node,
                        &listener.event,
                        listener.options,
                        move |_: &mut EventInfo, event| callback(event),
                    );
                }
            }
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("tag", &self.tag)
            .field(
                "attributes",
                &self.attributes.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("children", &self.children.len())
            .finish()
    }
}

fn subscribe(listener: &Emitter, parts: &[AttrPart], update: &Rc<dyn Fn()>) {
    for part in parts {
        if let AttrPart::Bound(bound) = part {
            let update = update.clone();
            listener.listen_to_any(
                bound.trigger.emitter(),
                bound.trigger.event(),
                ListenOptions::default(),
                Rc::new(move |_: &mut EventInfo, _: &dyn std::any::Any| update()),
            );
        }
    }
}

fn attribute_updater(node: &Node, name: SmolStr, parts: Vec<AttrPart>) -> Rc<dyn Fn()> {
    let node = node.clone();
    let has_bound = parts.iter().any(|part| matches!(part, AttrPart::Bound(_)));
    Rc::new(move || {
        let values: Vec<String> = parts.iter().filter_map(AttrPart::value).collect();
        if values.is_empty() && has_bound {
            node.remove_attribute(&name);
        } else {
            node.set_attribute(&name, values.join(" "));
        }
    })
}

/// Classes are managed token by token so a template can share the `class`
/// attribute with classes set by others.
fn class_updater(node: &Node, parts: Vec<AttrPart>) -> Rc<dyn Fn()> {
    let node = node.clone();
    let applied: RefCell<Vec<String>> = RefCell::new(Vec::new());
    Rc::new(move || {
        let tokens: Vec<String> = parts
            .iter()
            .filter_map(AttrPart::value)
            .flat_map(|value| {
                value
                    .split_whitespace()
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .collect();
        for stale in applied.borrow().iter().filter(|token| !tokens.contains(token)) {
            node.remove_class(stale);
        }
        for token in &tokens {
            node.add_class(token);
        }
        *applied.borrow_mut() = tokens;
    })
}

fn bind_text(listener: &Emitter, text: &Node, part: &AttrPart) {
    let node = text.clone();
    let value = part.clone();
    let update: Rc<dyn Fn()> =
        Rc::new(move || node.set_text_content(&value.value().unwrap_or_default()));
    update();
    subscribe(listener, std::slice::from_ref(part), &update);
}
