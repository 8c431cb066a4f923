//! The view base every UI component is built on.
//!
//! A view is a renderable, destroyable unit. Its element exists only after
//! [`View::render`]; before that [`View::element`] is `None`. Concrete views
//! embed a [`ViewBase`] holding the emitter, the template and the child
//! collections, and implement [`View`] on top of it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tessera_utils::dom::Node;
use tessera_utils::{
    Document, Emitter, Env, Error, HasOwnFocusTracker, Locale, Result, Trackable,
};

use crate::template::Template;
use crate::view_collection::ViewCollection;

/// What every view is created with: the locale for labels, the document
/// elements are created in, and the platform keystrokes are shown for.
#[derive(Clone, Debug, Default)]
pub struct ViewContext {
    pub locale: Locale,
    pub document: Document,
    pub env: Env,
}

impl ViewContext {
    pub fn new(locale: Locale, document: Document, env: Env) -> Self {
        Self {
            locale,
            document,
            env,
        }
    }

    /// Translate `message`, see [`Locale::t`].
    pub fn t(&self, message: &str) -> String {
        self.locale.t(message, &[])
    }
}

/// A renderable UI component.
pub trait View: 'static {
    fn base(&self) -> &ViewBase;

    fn render(&self) -> Result<()> {
        self.base().render()
    }

    fn element(&self) -> Option<Node> {
        self.base().element()
    }

    fn is_rendered(&self) -> bool {
        self.base().is_rendered()
    }

    /// Whether focus cyclers may move focus to this view right now.
    fn is_focusable(&self) -> bool {
        false
    }

    fn focus(&self) {}

    /// Views managing focus inside their own subtree return themselves here
    /// so parent focus trackers link to them instead of tracking their
    /// element alone.
    fn focus_scope(&self) -> Option<&dyn HasOwnFocusTracker> {
        None
    }

    /// How a [`FocusTracker`](tessera_utils::FocusTracker) should track this
    /// view.
    fn trackable(&self) -> Trackable {
        match self.focus_scope() {
            Some(scope) => Trackable::scope(scope),
            None => Trackable::View {
                element: self.element(),
            },
        }
    }

    fn destroy(&self) {
        self.base().destroy();
    }
}

/// State shared by every view.
pub struct ViewBase {
    context: ViewContext,
    emitter: Emitter,
    element: RefCell<Option<Node>>,
    template: RefCell<Option<Template>>,
    /// Views registered with [`register_child`](Self::register_child) and
    /// views placed in the template.
    children: ViewCollection,
    collections: RefCell<Vec<ViewCollection>>,
    is_rendered: Cell<bool>,
    /// An element adopted with [`adopt_element`](Self::adopt_element); the
    /// template was applied to it instead of creating a new one.
    adopted: Cell<bool>,
}

impl ViewBase {
    pub fn new(context: &ViewContext) -> Self {
        Self {
            context: context.clone(),
            emitter: Emitter::new(),
            element: RefCell::new(None),
            template: RefCell::new(None),
            children: ViewCollection::new(),
            collections: RefCell::new(Vec::new()),
            is_rendered: Cell::new(false),
            adopted: Cell::new(false),
        }
    }

    pub fn context(&self) -> &ViewContext {
        &self.context
    }

    pub fn locale(&self) -> &Locale {
        &self.context.locale
    }

    pub fn document(&self) -> &Document {
        &self.context.document
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn element(&self) -> Option<Node> {
        self.element.borrow().clone()
    }

    pub fn is_rendered(&self) -> bool {
        self.is_rendered.get()
    }

    pub fn set_template(&self, template: Template) {
        *self.template.borrow_mut() = Some(template);
    }

    /// Rework the template before the view renders.
    pub fn extend_template(&self, extend: impl FnOnce(Template) -> Template) {
        let mut template = self.template.borrow_mut();
        if let Some(current) = template.take() {
            *template = Some(extend(current));
        }
    }

    /// A collection whose views are destroyed together with this view.
    pub fn create_collection(&self) -> ViewCollection {
        let collection = ViewCollection::new();
        self.collections.borrow_mut().push(collection.clone());
        collection
    }

    /// Render `view` (if it is not rendered yet) and tie its lifetime to this
    /// view.
    pub fn register_child(&self, view: Rc<dyn View>) -> Result<()> {
        if self.children.contains(&*view) {
            return Ok(());
        }
        if !view.is_rendered() {
            view.render()?;
        }
        self.children.add(view)
    }

    pub fn deregister_child(&self, view: &dyn View) {
        self.children.remove(view);
    }

    /// Create the element from the template. A view without a template
    /// renders without an element of its own.
    pub fn render(&self) -> Result<()> {
        if self.is_rendered.get() {
            return Err(Error::ViewAlreadyRendered);
        }
        let template = self.template.borrow().clone();
        if let Some(template) = template {
            let element = template.render(self)?;
            *self.element.borrow_mut() = Some(element);
        }
        self.is_rendered.set(true);
        Ok(())
    }

    /// Render onto an element that already exists: the template's attributes
    /// and listeners are applied to `element`, which becomes this view's
    /// element. [`destroy`](Self::destroy) reverts them.
    pub fn adopt_element(&self, element: &Node) -> Result<()> {
        if self.is_rendered.get() {
            return Err(Error::ViewAlreadyRendered);
        }
        let template = self.template.borrow().clone();
        if let Some(template) = template {
            template.apply(self, element);
        }
        *self.element.borrow_mut() = Some(element.clone());
        self.adopted.set(true);
        self.is_rendered.set(true);
        Ok(())
    }

    pub fn destroy(&self) {
        self.emitter.stop_listening(None, None, None);
        self.children.destroy();
        let collections = self.collections.borrow().clone();
        for collection in collections {
            collection.destroy();
        }
        if self.adopted.get() {
            if let (Some(template), Some(element)) =
                (self.template.borrow().as_ref(), self.element.borrow().as_ref())
            {
                template.revert(element);
            }
        }
    }
}

impl fmt::Debug for ViewBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBase")
            .field("element", &self.element.borrow())
            .field("is_rendered", &self.is_rendered.get())
            .finish()
    }
}

/// A view that is nothing but its template.
pub struct TemplateView {
    base: ViewBase,
}

impl TemplateView {
    pub fn new(context: &ViewContext) -> Rc<Self> {
        Rc::new(Self {
            base: ViewBase::new(context),
        })
    }

    pub fn with_template(context: &ViewContext, template: Template) -> Rc<Self> {
        let view = Self::new(context);
        view.base.set_template(template);
        view
    }
}

impl View for TemplateView {
    fn base(&self) -> &ViewBase {
        &self.base
    }
}
