//! Registry of model element names.
//!
//! The schema only records what elements exist and which of them are blocks.
//! It is consulted by the upcast conversion (unknown elements are unwrapped,
//! loose text is wrapped in the default block) and by commands.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchemaItem {
    pub is_block: bool,
}

impl SchemaItem {
    pub fn block() -> Self {
        Self { is_block: true }
    }
}

#[derive(Clone, Default)]
pub struct Schema {
    inner: Rc<RefCell<SchemaInner>>,
}

#[derive(Default)]
struct SchemaInner {
    items: HashMap<SmolStr, SchemaItem>,
    default_block: Option<SmolStr>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &str, item: SchemaItem) {
        self.inner
            .borrow_mut()
            .items
            .insert(SmolStr::new(name), item);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.borrow().items.contains_key(name)
    }

    pub fn is_block(&self, name: &str) -> bool {
        self.inner
            .borrow()
            .items
            .get(name)
            .is_some_and(|item| item.is_block)
    }

    /// Block that wraps loose text during upcast and fills empty roots.
    pub fn set_default_block(&self, name: &str) {
        self.inner.borrow_mut().default_block = Some(SmolStr::new(name));
    }

    pub fn default_block(&self) -> Option<SmolStr> {
        self.inner.borrow().default_block.clone()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Schema")
            .field("items", &inner.items.len())
            .field("default_block", &inner.default_block)
            .finish()
    }
}
