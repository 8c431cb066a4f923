//! Editor configuration.
//!
//! Options live in a JSON tree addressed with dotted paths
//! (`"toolbar.shouldNotGroupWhenFull"`). Plugin lists are Rust values and
//! travel next to the tree in [`EditorConfig`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use smol_str::SmolStr;
use tessera_utils::Env;

use crate::plugin::PluginDefinition;

/// Shared, mutable option tree. Cloning yields another handle to the same
/// tree.
#[derive(Clone, Default)]
pub struct Config {
    values: Rc<RefCell<Map<String, Value>>>,
}

impl Config {
    /// Anything but a JSON object is ignored.
    pub fn new(values: Value) -> Self {
        let values = match values {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                tracing::warn!(value = %other, "editor configuration is not an object");
                Map::new()
            }
        };
        Self {
            values: Rc::new(RefCell::new(values)),
        }
    }

    /// Value at `path`, cloned.
    pub fn get(&self, path: &str) -> Option<Value> {
        let values = self.values.borrow();
        let mut parts = path.split('.');
        let mut current = values.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current.clone())
    }

    /// Value at `path` deserialized as `T`. A value of the wrong shape is
    /// logged and treated as missing.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let value = self.get(path)?;
        serde_json::from_value(value)
            .inspect_err(|err| {
                tracing::warn!(path, %err, "ignoring malformed configuration option")
            })
            .ok()
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set `path`, creating intermediate objects as needed.
    pub fn set(&self, path: &str, value: impl Into<Value>) {
        self.write(path, value.into(), true);
    }

    /// Set `path` only if it has no value yet.
    pub fn define(&self, path: &str, value: impl Into<Value>) {
        self.write(path, value.into(), false);
    }

    fn write(&self, path: &str, value: Value, overwrite: bool) {
        let mut values = self.values.borrow_mut();
        let mut parts: Vec<&str> = path.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };
        let mut current = &mut *values;
        for part in parts {
            let entry = current
                .entry(part)
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        if overwrite || !current.contains_key(last) {
            current.insert(last.to_owned(), value);
        }
    }

    /// Top-level option names.
    pub fn names(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("values", &self.values.borrow())
            .finish()
    }
}

/// Everything an editor is created with.
#[derive(Clone, Default)]
pub struct EditorConfig {
    pub plugins: Vec<PluginDefinition>,
    /// Loaded in addition to `plugins`; used by builds that ship a fixed
    /// plugin list.
    pub extra_plugins: Vec<PluginDefinition>,
    /// Plugin names to leave out, including from `requires` lists.
    pub remove_plugins: Vec<SmolStr>,
    pub values: Value,
    /// Platform keystrokes are parsed and shown for.
    pub env: Env,
}

impl EditorConfig {
    pub fn new(values: Value) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    pub fn with_plugins(mut self, plugins: impl IntoIterator<Item = PluginDefinition>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    pub fn with_extra_plugins(
        mut self,
        plugins: impl IntoIterator<Item = PluginDefinition>,
    ) -> Self {
        self.extra_plugins.extend(plugins);
        self
    }

    pub fn without_plugins<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.remove_plugins.extend(names.into_iter().map(SmolStr::new));
        self
    }

    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    /// `plugins` followed by `extra_plugins`.
    pub fn all_plugins(&self) -> Vec<PluginDefinition> {
        self.plugins
            .iter()
            .chain(&self.extra_plugins)
            .copied()
            .collect()
    }
}

impl From<Value> for EditorConfig {
    fn from(values: Value) -> Self {
        Self::new(values)
    }
}

impl fmt::Debug for EditorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorConfig")
            .field("plugins", &self.all_plugins())
            .field("remove_plugins", &self.remove_plugins)
            .field("values", &self.values)
            .finish()
    }
}

/// A setting given either once for every root or per root name, such as
/// `placeholder` and `label`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum PerRoot<T> {
    All(T),
    Roots(std::collections::BTreeMap<String, T>),
}

impl<T> PerRoot<T> {
    pub fn for_root(&self, root: &str) -> Option<&T> {
        match self {
            Self::All(value) => Some(value),
            Self::Roots(roots) => roots.get(root),
        }
    }
}
