//! Named UI component constructors, used to build toolbars from config.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;
use tessera_utils::{Error, Result};

use crate::view::{View, ViewContext};

type Factory = Rc<dyn Fn(&ViewContext) -> Result<Rc<dyn View>>>;

/// Registry of component constructors. Names are case-insensitive.
#[derive(Clone)]
pub struct ComponentFactory {
    context: ViewContext,
    components: Rc<RefCell<BTreeMap<SmolStr, (SmolStr, Factory)>>>,
}

fn normalize(name: &str) -> SmolStr {
    SmolStr::new(name.to_lowercase())
}

impl ComponentFactory {
    pub fn new(context: &ViewContext) -> Self {
        Self {
            context: context.clone(),
            components: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }

    pub fn context(&self) -> &ViewContext {
        &self.context
    }

    pub fn add(
        &self,
        name: &str,
        factory: impl Fn(&ViewContext) -> Result<Rc<dyn View>> + 'static,
    ) -> Result<()> {
        let key = normalize(name);
        let mut components = self.components.borrow_mut();
        if components.contains_key(&key) {
            return Err(Error::ComponentExists {
                name: SmolStr::new(name),
            });
        }
        components.insert(key, (SmolStr::new(name), Rc::new(factory)));
        Ok(())
    }

    /// Create a new instance of the component registered as `name`.
    pub fn create(&self, name: &str) -> Result<Rc<dyn View>> {
        let factory = self
            .components
            .borrow()
            .get(&normalize(name))
            .map(|(_, factory)| factory.clone())
            .ok_or_else(|| Error::ComponentMissing {
                name: SmolStr::new(name),
            })?;
        factory(&self.context)
    }

    pub fn has(&self, name: &str) -> bool {
        self.components.borrow().contains_key(&normalize(name))
    }

    /// Registered names, as they were registered.
    pub fn names(&self) -> Vec<SmolStr> {
        self.components
            .borrow()
            .values()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("names", &self.names())
            .finish()
    }
}
