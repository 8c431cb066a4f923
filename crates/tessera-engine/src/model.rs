//! The editor's document model.
//!
//! A tree of named elements and text per root. All mutations go through
//! [`Model::change`], which hands out a [`Writer`] and announces the touched
//! roots with a single `change:data` event once the outermost change block
//! finishes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;
use tessera_utils::{Emitter, Error, Result};

use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelNode {
    Element(ModelElement),
    Text(String),
}

impl ModelNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn text_content(&self) -> String {
        match self {
            Self::Element(element) => element.text_content(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl From<ModelElement> for ModelNode {
    fn from(element: ModelElement) -> Self {
        Self::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelElement {
    pub name: SmolStr,
    pub children: Vec<ModelNode>,
}

impl ModelElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: impl Into<ModelNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_child(ModelNode::text(text))
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(ModelNode::text_content).collect()
    }

    /// No text anywhere inside.
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(|child| match child {
            ModelNode::Text(text) => text.is_empty(),
            ModelNode::Element(element) => element.is_empty(),
        })
    }
}

/// Selection anchor: a root and the index of a top-level child in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPosition {
    pub root: SmolStr,
    pub index: usize,
}

/// Payload of the model's `change:data` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedRoots(pub Vec<SmolStr>);

/// The document model. Cloning yields another handle to the same model.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelInner>,
}

struct ModelInner {
    emitter: Emitter,
    schema: Schema,
    roots: RefCell<Vec<ModelElement>>,
    root_names: RefCell<Vec<SmolStr>>,
    selection: RefCell<Option<ModelPosition>>,
    version: Cell<u64>,
    change_depth: Cell<usize>,
    pending: RefCell<Vec<SmolStr>>,
}

impl Model {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ModelInner {
                emitter: Emitter::new(),
                schema: Schema::new(),
                roots: RefCell::new(Vec::new()),
                root_names: RefCell::new(Vec::new()),
                selection: RefCell::new(None),
                version: Cell::new(0),
                change_depth: Cell::new(0),
                pending: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    // === Roots ===

    /// Create an empty root. Creating an existing root is a no-op.
    pub fn create_root(&self, name: &str) -> bool {
        if self.has_root(name) {
            tracing::warn!(root = name, "model root exists already");
            return false;
        }
        self.inner.root_names.borrow_mut().push(SmolStr::new(name));
        self.inner.roots.borrow_mut().push(ModelElement::new("$root"));
        true
    }

    pub fn has_root(&self, name: &str) -> bool {
        self.root_index(name).is_some()
    }

    pub fn root_names(&self) -> Vec<SmolStr> {
        self.inner.root_names.borrow().clone()
    }

    fn root_index(&self, name: &str) -> Option<usize> {
        self.inner.root_names.borrow().iter().position(|n| n == name)
    }

    /// Snapshot of a root's content.
    pub fn root(&self, name: &str) -> Option<ModelElement> {
        let index = self.root_index(name)?;
        self.inner.roots.borrow().get(index).cloned()
    }

    pub fn is_root_empty(&self, name: &str) -> Result<bool> {
        self.root(name)
            .map(|root| root.is_empty())
            .ok_or_else(|| Error::RootNotFound {
                root: SmolStr::new(name),
            })
    }

    pub fn selection(&self) -> Option<ModelPosition> {
        self.inner.selection.borrow().clone()
    }

    /// Bumped once per change block that modified a root.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    // === Changes ===

    /// Run `callback` with a writer. Nested calls join the outermost block;
    /// `change:data` fires once when it ends, if anything changed.
    pub fn change<R>(&self, callback: impl FnOnce(&mut Writer<'_>) -> R) -> R {
        self.inner.change_depth.set(self.inner.change_depth.get() + 1);
        let mut writer = Writer { model: self };
        let result = callback(&mut writer);
        let depth = self.inner.change_depth.get() - 1;
        self.inner.change_depth.set(depth);

        if depth == 0 {
            let changed = std::mem::take(&mut *self.inner.pending.borrow_mut());
            if !changed.is_empty() {
                self.inner.version.set(self.inner.version.get() + 1);
                tracing::trace!(roots = ?changed, "model changed");
                self.inner.emitter.fire("change:data", &ChangedRoots(changed));
            }
        }
        result
    }

    fn mark_changed(&self, root: &str) {
        let mut pending = self.inner.pending.borrow_mut();
        if !pending.iter().any(|name| name == root) {
            pending.push(SmolStr::new(root));
        }
    }

    fn with_root_mut<R>(&self, name: &str, f: impl FnOnce(&mut ModelElement) -> R) -> Result<R> {
        let index = self.root_index(name).ok_or_else(|| Error::RootNotFound {
            root: SmolStr::new(name),
        })?;
        let result = {
            let mut roots = self.inner.roots.borrow_mut();
            let root = roots.get_mut(index).ok_or_else(|| Error::RootNotFound {
                root: SmolStr::new(name),
            })?;
            f(root)
        };
        self.mark_changed(name);
        Ok(result)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("roots", &self.inner.root_names.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

/// Mutation handle passed to [`Model::change`] callbacks.
pub struct Writer<'a> {
    model: &'a Model,
}

impl Writer<'_> {
    pub fn model(&self) -> &Model {
        self.model
    }

    /// Replace the whole content of a root.
    pub fn set_root_children(&mut self, root: &str, children: Vec<ModelNode>) -> Result<()> {
        self.model
            .with_root_mut(root, |element| element.children = children)
    }

    pub fn append(&mut self, root: &str, node: impl Into<ModelNode>) -> Result<()> {
        let node = node.into();
        self.model
            .with_root_mut(root, |element| element.children.push(node))
    }

    /// Insert at `index`, clamped to the root's length.
    pub fn insert(&mut self, root: &str, index: usize, node: impl Into<ModelNode>) -> Result<()> {
        let node = node.into();
        self.model.with_root_mut(root, |element| {
            let index = index.min(element.children.len());
            element.children.insert(index, node);
        })
    }

    pub fn clear(&mut self, root: &str) -> Result<()> {
        self.model
            .with_root_mut(root, |element| element.children.clear())
    }

    /// Rename the top-level element at `index`. Returns `false` when there is
    /// no element there.
    pub fn rename(&mut self, root: &str, index: usize, name: &str) -> Result<bool> {
        self.model.with_root_mut(root, |element| {
            match element.children.get_mut(index) {
                Some(ModelNode::Element(child)) => {
                    child.name = SmolStr::new(name);
                    true
                }
                _ => false,
            }
        })
    }

    pub fn set_selection(&mut self, position: Option<ModelPosition>) {
        *self.model.inner.selection.borrow_mut() = position;
    }
}
