//! Plugins and their loading.
//!
//! A plugin type implements [`Plugin`] (its lifecycle hooks) and
//! [`PluginConstructor`] (its name, requirements and constructor). Editors
//! are configured with [`PluginDefinition`]s, the type-erased form of a
//! constructor. Loading resolves requirements depth-first, so every plugin
//! is constructed, initialized and after-initialized after the plugins it
//! requires. Destruction runs in reverse order.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use smol_str::SmolStr;
use tessera_utils::{Error, Result};

use crate::editor::Editor;

/// Lifecycle hooks of a loaded plugin.
pub trait Plugin: 'static {
    /// Runs after every plugin has been constructed, in dependency order.
    /// Each plugin's `init` completes before the next one starts.
    fn init<'a>(&'a self, _editor: &'a Editor) -> LocalBoxFuture<'a, Result<()>> {
        future::ok(()).boxed_local()
    }

    /// Runs after every plugin's `init` has completed.
    fn after_init<'a>(&'a self, _editor: &'a Editor) -> LocalBoxFuture<'a, Result<()>> {
        future::ok(()).boxed_local()
    }

    fn destroy(&self) {}
}

/// How a plugin type is named, what it requires and how it is built.
pub trait PluginConstructor: Plugin + Sized {
    const NAME: &'static str;

    fn requires() -> Vec<PluginDefinition> {
        Vec::new()
    }

    fn new(editor: &Editor) -> Result<Self>;
}

/// A plugin type, ready to be listed in an editor's configuration.
#[derive(Clone, Copy)]
pub struct PluginDefinition {
    name: &'static str,
    requires: fn() -> Vec<PluginDefinition>,
    construct: fn(&Editor) -> Result<LoadedPlugin>,
}

fn construct<P: PluginConstructor>(editor: &Editor) -> Result<LoadedPlugin> {
    let plugin = Rc::new(P::new(editor)?);
    Ok(LoadedPlugin {
        name: P::NAME,
        plugin: plugin.clone(),
        any: plugin,
    })
}

impl PluginDefinition {
    pub fn of<P: PluginConstructor>() -> Self {
        Self {
            name: P::NAME,
            requires: P::requires,
            construct: construct::<P>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn requires(&self) -> Vec<PluginDefinition> {
        (self.requires)()
    }
}

impl fmt::Debug for PluginDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Clone)]
struct LoadedPlugin {
    name: &'static str,
    plugin: Rc<dyn Plugin>,
    any: Rc<dyn Any>,
}

/// Order `plugins` so that every plugin follows its requirements. Plugins
/// named in `removed` are skipped; requiring one of them is an error.
pub fn resolve(plugins: &[PluginDefinition], removed: &[SmolStr]) -> Result<Vec<PluginDefinition>> {
    let mut ordered = Vec::new();
    let mut chain = Vec::new();
    for definition in plugins {
        if removed.iter().any(|name| name == definition.name) {
            continue;
        }
        visit(definition, removed, &mut chain, &mut ordered)?;
    }
    Ok(ordered)
}

fn visit(
    definition: &PluginDefinition,
    removed: &[SmolStr],
    chain: &mut Vec<&'static str>,
    ordered: &mut Vec<PluginDefinition>,
) -> Result<()> {
    if ordered.iter().any(|loaded| loaded.name == definition.name) {
        return Ok(());
    }
    if let Some(start) = chain.iter().position(|name| *name == definition.name) {
        let mut cycle: Vec<SmolStr> = chain[start..].iter().map(SmolStr::new).collect();
        cycle.push(SmolStr::new(definition.name));
        return Err(Error::PluginDependencyCycle { chain: cycle });
    }

    chain.push(definition.name);
    for required in definition.requires() {
        if removed.iter().any(|name| name == required.name) {
            tracing::warn!(
                plugin = definition.name,
                required = required.name,
                "a required plugin was removed"
            );
            return Err(Error::PluginNotFound {
                name: SmolStr::new(required.name),
            });
        }
        visit(&required, removed, chain, ordered)?;
    }
    chain.pop();
    ordered.push(*definition);
    Ok(())
}

/// The plugins loaded into an editor.
#[derive(Clone, Default)]
pub struct PluginCollection {
    loaded: Rc<RefCell<Vec<LoadedPlugin>>>,
}

impl PluginCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve, construct and initialize `plugins`.
    pub async fn load(
        &self,
        editor: &Editor,
        plugins: &[PluginDefinition],
        removed: &[SmolStr],
    ) -> Result<()> {
        let ordered = resolve(plugins, removed)?;
        for definition in &ordered {
            if self.has(definition.name) {
                continue;
            }
            tracing::debug!(plugin = definition.name, "constructing plugin");
            let loaded = (definition.construct)(editor)?;
            self.loaded.borrow_mut().push(loaded);
        }

        let loaded = self.loaded.borrow().clone();
        for plugin in &loaded {
            tracing::debug!(plugin = plugin.name, "initializing plugin");
            plugin.plugin.init(editor).await?;
        }
        for plugin in &loaded {
            plugin.plugin.after_init(editor).await?;
        }
        Ok(())
    }

    /// The loaded instance of plugin type `P`.
    pub fn get<P: PluginConstructor>(&self) -> Option<Rc<P>> {
        self.loaded
            .borrow()
            .iter()
            .find(|loaded| loaded.name == P::NAME)
            .and_then(|loaded| loaded.any.clone().downcast::<P>().ok())
    }

    /// Like [`get`](Self::get), failing with [`Error::PluginNotFound`].
    pub fn require<P: PluginConstructor>(&self) -> Result<Rc<P>> {
        self.get::<P>().ok_or_else(|| Error::PluginNotFound {
            name: SmolStr::new(P::NAME),
        })
    }

    pub fn get_by_name(&self, name: &str) -> Option<Rc<dyn Plugin>> {
        self.loaded
            .borrow()
            .iter()
            .find(|loaded| loaded.name == name)
            .map(|loaded| loaded.plugin.clone())
    }

    pub fn has(&self, name: &str) -> bool {
        self.loaded.borrow().iter().any(|loaded| loaded.name == name)
    }

    /// Names in load order.
    pub fn names(&self) -> Vec<&'static str> {
        self.loaded.borrow().iter().map(|loaded| loaded.name).collect()
    }

    /// Destroy every plugin, last loaded first, and forget them.
    pub fn destroy(&self) {
        let loaded = std::mem::take(&mut *self.loaded.borrow_mut());
        for plugin in loaded.iter().rev() {
            tracing::debug!(plugin = plugin.name, "destroying plugin");
            plugin.plugin.destroy();
        }
    }
}

impl fmt::Debug for PluginCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_utils::ErrorKind;

    macro_rules! plugin {
        ($ty:ident, $name:literal, [$($req:ident),*]) => {
            struct $ty;
            impl Plugin for $ty {}
            impl PluginConstructor for $ty {
                const NAME: &'static str = $name;
                fn requires() -> Vec<PluginDefinition> {
                    vec![$(PluginDefinition::of::<$req>()),*]
                }
                fn new(_editor: &Editor) -> Result<Self> {
                    Ok($ty)
                }
            }
        };
    }

    plugin!(Base, "Base", []);
    plugin!(Widget, "Widget", [Base]);
    plugin!(Table, "Table", [Widget, Base]);
    plugin!(Ping, "Ping", [Pong]);
    plugin!(Pong, "Pong", [Ping]);

    fn names(definitions: &[PluginDefinition]) -> Vec<&'static str> {
        definitions.iter().map(PluginDefinition::name).collect()
    }

    #[test]
    fn requirements_come_first_and_once() {
        let ordered = resolve(
            &[PluginDefinition::of::<Table>(), PluginDefinition::of::<Base>()],
            &[],
        )
        .unwrap();
        assert_eq!(names(&ordered), vec!["Base", "Widget", "Table"]);
    }

    #[test]
    fn cycles_are_reported_with_their_chain() {
        let err = resolve(&[PluginDefinition::of::<Ping>()], &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PluginDependencyCycle);
        assert_eq!(err.to_string(), "plugin dependency cycle: Ping -> Pong -> Ping");
    }

    #[test]
    fn removed_plugins_are_skipped_unless_required() {
        let ordered = resolve(
            &[PluginDefinition::of::<Base>(), PluginDefinition::of::<Widget>()],
            &["Widget".into()],
        )
        .unwrap();
        assert_eq!(names(&ordered), vec!["Base"]);

        let err = resolve(&[PluginDefinition::of::<Table>()], &["Base".into()]).unwrap_err();
        assert_eq!(err.code(), "plugincollection-plugin-not-found");
    }
}
