//! Ordered, observable collections of views.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::{Emitter, Error, Result};

use crate::view::View;

/// Payload of the `add` and `remove` events of a [`ViewCollection`].
#[derive(Clone)]
pub struct CollectionChange {
    pub view: Rc<dyn View>,
    pub index: usize,
}

impl fmt::Debug for CollectionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionChange")
            .field("element", &self.view.element())
            .field("index", &self.index)
            .finish()
    }
}

/// A list of views that keeps their elements in its parent element, once it
/// has one, and forwards delegated events of its views.
///
/// Fires `add` and `remove` with a [`CollectionChange`].
#[derive(Clone, Default)]
pub struct ViewCollection {
    inner: Rc<CollectionInner>,
}

#[derive(Default)]
struct CollectionInner {
    emitter: Emitter,
    views: RefCell<Vec<Rc<dyn View>>>,
    parent: RefCell<Option<Node>>,
    delegations: RefCell<Vec<(Vec<SmolStr>, Emitter)>>,
}

fn same_view(a: &dyn View, b: &dyn View) -> bool {
    a.base().emitter().id() == b.base().emitter().id()
}

impl ViewCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn len(&self) -> usize {
        self.inner.views.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.views.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Rc<dyn View>> {
        self.inner.views.borrow().get(index).cloned()
    }

    pub fn first(&self) -> Option<Rc<dyn View>> {
        self.get(0)
    }

    pub fn last(&self) -> Option<Rc<dyn View>> {
        self.inner.views.borrow().last().cloned()
    }

    /// A snapshot of the views, safe to hold while the collection changes.
    pub fn to_vec(&self) -> Vec<Rc<dyn View>> {
        self.inner.views.borrow().clone()
    }

    pub fn index_of(&self, view: &dyn View) -> Option<usize> {
        self.inner
            .views
            .borrow()
            .iter()
            .position(|candidate| same_view(&**candidate, view))
    }

    pub fn contains(&self, view: &dyn View) -> bool {
        self.index_of(view).is_some()
    }

    /// Index of the view whose element is `element`.
    pub fn index_of_element(&self, element: &Node) -> Option<usize> {
        self.inner
            .views
            .borrow()
            .iter()
            .position(|view| view.element().as_ref() == Some(element))
    }

    pub fn add(&self, view: Rc<dyn View>) -> Result<()> {
        self.add_at(view, self.len())
    }

    /// Insert `view` at `index` (clamped to the length).
    pub fn add_at(&self, view: Rc<dyn View>, index: usize) -> Result<()> {
        if self.contains(&*view) {
            return Err(Error::ViewCollectionDuplicate);
        }
        let index = index.min(self.len());
        let parent = self.inner.parent.borrow().clone();
        if let Some(parent) = parent {
            if !view.is_rendered() {
                view.render()?;
            }
            if let Some(element) = view.element() {
                parent.insert_child(index, &element);
            }
        }
        for (events, target) in self.inner.delegations.borrow().iter() {
            let events: Vec<&str> = events.iter().map(SmolStr::as_str).collect();
            view.base().emitter().delegate(&events).to(target);
        }
        self.inner.views.borrow_mut().insert(index, view.clone());
        self.inner
            .emitter
            .fire("add", &CollectionChange { view, index });
        Ok(())
    }

    pub fn add_many(&self, views: impl IntoIterator<Item = Rc<dyn View>>) -> Result<()> {
        views.into_iter().try_for_each(|view| self.add(view))
    }

    pub fn remove(&self, view: &dyn View) -> Option<Rc<dyn View>> {
        let index = self.index_of(view)?;
        self.remove_at(index)
    }

    pub fn remove_at(&self, index: usize) -> Option<Rc<dyn View>> {
        let view = {
            let mut views = self.inner.views.borrow_mut();
            (index < views.len()).then(|| views.remove(index))
        }?;
        if let (Some(parent), Some(element)) =
            (self.inner.parent.borrow().as_ref(), view.element())
        {
            parent.remove_child(&element);
        }
        for (_, target) in self.inner.delegations.borrow().iter() {
            view.base().emitter().stop_delegating(None, Some(target));
        }
        self.inner.emitter.fire(
            "remove",
            &CollectionChange {
                view: view.clone(),
                index,
            },
        );
        Some(view)
    }

    pub fn clear(&self) {
        while self.remove_at(0).is_some() {}
    }

    /// Render the views into `parent`, and any view added later.
    pub fn set_parent(&self, parent: &Node) -> Result<()> {
        *self.inner.parent.borrow_mut() = Some(parent.clone());
        for view in self.to_vec() {
            if !view.is_rendered() {
                view.render()?;
            }
            if let Some(element) = view.element() {
                parent.append_child(&element);
            }
        }
        Ok(())
    }

    pub fn parent(&self) -> Option<Node> {
        self.inner.parent.borrow().clone()
    }

    /// Delegate `events` fired by any view of the collection, present or
    /// future, to `target`.
    pub fn delegate(&self, events: &[&str], target: &Emitter) {
        for view in self.to_vec() {
            view.base().emitter().delegate(events).to(target);
        }
        self.inner.delegations.borrow_mut().push((
            events.iter().copied().map(SmolStr::new).collect(),
            target.clone(),
        ));
    }

    /// Destroy every view in the collection.
    pub fn destroy(&self) {
        for view in self.to_vec() {
            view.destroy();
        }
    }
}

impl fmt::Debug for ViewCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCollection")
            .field("len", &self.len())
            .field("parent", &self.inner.parent.borrow())
            .finish()
    }
}
