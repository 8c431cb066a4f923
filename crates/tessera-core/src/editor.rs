//! The editor base every flavor is assembled around.
//!
//! [`Editor`] owns the engine (model, conversion, data and editing
//! controllers), the command and plugin collections, the editor-wide
//! keystroke handler and the shared [`EditorUI`]. A flavor constructs it,
//! then drives it through [`EditorState`]: plugins, its own UI, initial
//! data, and finally [`Editor::fire_ready`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde_json::Value;
use smol_str::SmolStr;
use tessera_engine::{Conversion, DataController, EditingController, EditingView, Model, Trim};
use tessera_ui::ViewContext;
use tessera_utils::dom::{Document, Node};
use tessera_utils::{Emitter, Env, Error, EventInfo, Locale, Property, PropertyChange, Result};

use crate::command::CommandCollection;
use crate::config::{Config, EditorConfig};
use crate::editing_keystrokes::EditingKeystrokeHandler;
use crate::editor_ui::EditorUI;
use crate::plugin::{PluginCollection, PluginDefinition};
use crate::source;

static NEXT_EDITOR_ID: AtomicU64 = AtomicU64::new(1);

/// Where an editor is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Constructed,
    PluginsInitializing,
    UiInitializing,
    DataLoading,
    Ready,
    Destroying,
    Destroyed,
}

/// `language` option: one language for everything, or separate UI and
/// content languages.
#[derive(Deserialize)]
#[serde(untagged)]
enum LanguageConfig {
    Both(String),
    Split {
        ui: Option<String>,
        content: Option<String>,
    },
}

fn locale_from_config(config: &Config) -> Locale {
    match config.get_as::<LanguageConfig>("language") {
        Some(LanguageConfig::Both(language)) => Locale::new(&language, None),
        Some(LanguageConfig::Split { ui, content }) => {
            Locale::new(ui.as_deref().unwrap_or("en"), content.as_deref())
        }
        None => Locale::default(),
    }
}

/// Handle to an editor. Clones share the same editor.
#[derive(Clone)]
pub struct Editor {
    inner: Rc<EditorInner>,
}

/// Non-owning handle, for closures registered on the editor's own parts.
#[derive(Clone)]
pub struct WeakEditor(Weak<EditorInner>);

impl WeakEditor {
    pub fn upgrade(&self) -> Option<Editor> {
        self.0.upgrade().map(|inner| Editor { inner })
    }
}

struct EditorInner {
    id: u64,
    emitter: Emitter,
    config: Config,
    plugin_list: Vec<PluginDefinition>,
    removed_plugins: Vec<SmolStr>,
    context: ViewContext,
    model: Model,
    conversion: Conversion,
    data: DataController,
    editing: EditingController,
    commands: CommandCollection,
    keystrokes: EditingKeystrokeHandler,
    plugins: PluginCollection,
    ui: EditorUI,
    state: Property<EditorState>,
    is_read_only: Property<bool>,
    read_only_locks: RefCell<Vec<SmolStr>>,
    source_element: RefCell<Option<Node>>,
}

impl Editor {
    pub fn new(document: &Document, config: EditorConfig) -> Result<Self> {
        let id = NEXT_EDITOR_ID.fetch_add(1, Ordering::Relaxed);
        let emitter = Emitter::new();
        let values = Config::new(config.values.clone());
        let context = ViewContext::new(locale_from_config(&values), document.clone(), config.env);

        let model = Model::new();
        let conversion = Conversion::new();
        let data = DataController::new(&model, &conversion);
        let editing = EditingController::new(&model, document, &conversion);
        let commands = CommandCollection::new();
        let keystrokes = EditingKeystrokeHandler::new(&commands, config.env);
        keystrokes.listen_to(editing.view().emitter());
        let ui = EditorUI::new(id, &context, editing.view(), &keystrokes)?;

        let state = Property::new(&emitter, "state", EditorState::Constructed);
        let is_read_only = Property::new(&emitter, "isReadOnly", false);
        editing.view().is_read_only_property().bind_to(&is_read_only);
        {
            let commands = commands.clone();
            is_read_only.on_change(move |change: &PropertyChange<bool>| {
                commands.set_read_only(change.new);
            });
        }
        {
            let commands = commands.clone();
            emitter.listen_to(
                model.emitter(),
                "change:data",
                move |_: &mut EventInfo, _: &tessera_engine::ChangedRoots| commands.refresh_all(),
            );
        }

        tracing::debug!(editor = id, "editor constructed");
        Ok(Self {
            inner: Rc::new(EditorInner {
                id,
                emitter,
                config: values,
                plugin_list: config.all_plugins(),
                removed_plugins: config.remove_plugins,
                context,
                model,
                conversion,
                data,
                editing,
                commands,
                keystrokes,
                plugins: PluginCollection::new(),
                ui,
                state,
                is_read_only,
                read_only_locks: RefCell::new(Vec::new()),
                source_element: RefCell::new(None),
            }),
        })
    }

    pub fn downgrade(&self) -> WeakEditor {
        WeakEditor(Rc::downgrade(&self.inner))
    }

    /// Process-unique id, also recorded on the source and editable elements.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn locale(&self) -> &Locale {
        &self.inner.context.locale
    }

    pub fn env(&self) -> Env {
        self.inner.context.env
    }

    pub fn document(&self) -> &Document {
        &self.inner.context.document
    }

    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    pub fn conversion(&self) -> &Conversion {
        &self.inner.conversion
    }

    pub fn data(&self) -> &DataController {
        &self.inner.data
    }

    pub fn editing(&self) -> &EditingController {
        &self.inner.editing
    }

    pub fn editing_view(&self) -> &EditingView {
        self.inner.editing.view()
    }

    pub fn commands(&self) -> &CommandCollection {
        &self.inner.commands
    }

    pub fn keystrokes(&self) -> &EditingKeystrokeHandler {
        &self.inner.keystrokes
    }

    pub fn plugins(&self) -> &PluginCollection {
        &self.inner.plugins
    }

    pub fn ui(&self) -> &EditorUI {
        &self.inner.ui
    }

    // === State ===

    pub fn state(&self) -> EditorState {
        self.inner.state.get()
    }

    pub fn state_property(&self) -> &Property<EditorState> {
        &self.inner.state
    }

    pub fn set_state(&self, state: EditorState) {
        tracing::debug!(editor = self.inner.id, ?state, "editor state");
        self.inner.state.set(state);
    }

    /// Mark the editor ready and fire `ready`.
    pub fn fire_ready(&self) {
        self.set_state(EditorState::Ready);
        self.inner.emitter.fire("ready", &());
    }

    fn ensure_alive(&self) -> Result<()> {
        match self.state() {
            EditorState::Destroying | EditorState::Destroyed => Err(Error::EditorDestroyed),
            _ => Ok(()),
        }
    }

    // === Read-only mode ===

    pub fn is_read_only(&self) -> bool {
        self.inner.is_read_only.get()
    }

    pub fn is_read_only_property(&self) -> &Property<bool> {
        &self.inner.is_read_only
    }

    /// Make the editor read-only until every lock is released.
    pub fn enable_read_only_mode(&self, lock_id: &str) {
        {
            let mut locks = self.inner.read_only_locks.borrow_mut();
            if !locks.iter().any(|lock| lock == lock_id) {
                locks.push(SmolStr::new(lock_id));
            }
        }
        self.inner.is_read_only.set(true);
    }

    pub fn disable_read_only_mode(&self, lock_id: &str) {
        let unlocked = {
            let mut locks = self.inner.read_only_locks.borrow_mut();
            locks.retain(|lock| lock != lock_id);
            locks.is_empty()
        };
        if unlocked {
            self.inner.is_read_only.set(false);
        }
    }

    // === Data ===

    pub fn get_data(&self) -> Result<String> {
        self.get_data_with("main", Trim::Empty)
    }

    pub fn get_data_with(&self, root: &str, trim: Trim) -> Result<String> {
        self.ensure_alive()?;
        self.inner.data.get_with(root, trim)
    }

    /// Replace the content of the `main` root.
    pub fn set_data(&self, data: &str) -> Result<()> {
        self.set_data_of([("main", data)])
    }

    pub fn set_data_of<'a>(
        &self,
        data: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<()> {
        self.ensure_alive()?;
        self.inner.data.set(data)
    }

    // === Commands and focus ===

    /// Execute a command. Returns whether it ran; disabled commands do not.
    pub fn execute(&self, command: &str, options: &Value) -> Result<bool> {
        self.inner.commands.execute(command, options)
    }

    pub fn focus(&self) {
        self.inner.editing.view().focus();
    }

    // === Source element ===

    pub fn source_element(&self) -> Option<Node> {
        self.inner.source_element.borrow().clone()
    }

    /// Bind `element` to this editor as its source element.
    pub fn attach_source_element(&self, element: &Node) -> Result<()> {
        source::secure_source_element(element, self.inner.id)?;
        *self.inner.source_element.borrow_mut() = Some(element.clone());
        Ok(())
    }

    /// Let another editor use the source element again.
    pub fn release_source_element(&self) {
        if let Some(element) = self.inner.source_element.borrow_mut().take() {
            source::release_source_element(&element, self.inner.id);
        }
    }

    /// Write the editor's data back into the source element, if any.
    pub fn update_source_element(&self, data: &str) {
        if let Some(element) = self.source_element() {
            source::set_data_in_element(&element, data);
        }
    }

    // === Lifecycle ===

    /// Construct, initialize and after-initialize the configured plugins.
    pub async fn init_plugins(&self) -> Result<()> {
        self.ensure_alive()?;
        self.set_state(EditorState::PluginsInitializing);
        let plugins = self.inner.plugins.clone();
        plugins
            .load(self, &self.inner.plugin_list, &self.inner.removed_plugins)
            .await?;
        tracing::debug!(plugins = ?plugins.names(), "plugins initialized");
        Ok(())
    }

    /// Tear the editor down: plugins (last loaded first), commands,
    /// keystrokes and the engine. The source element is released. The UI is
    /// destroyed by the flavor before calling this.
    pub async fn destroy(&self) -> Result<()> {
        if self.state() == EditorState::Destroyed {
            tracing::warn!(editor = self.inner.id, "editor already destroyed");
            return Ok(());
        }
        self.set_state(EditorState::Destroying);
        self.inner.emitter.fire("destroy", &());

        self.inner.plugins.destroy();
        self.inner.commands.destroy();
        self.inner.keystrokes.destroy();
        self.inner.data.destroy();
        self.inner.editing.view().is_read_only_property().unbind();
        self.inner.editing.destroy();
        self.inner.emitter.stop_listening(None, None, None);
        self.release_source_element();

        self.set_state(EditorState::Destroyed);
        Ok(())
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("is_read_only", &self.is_read_only())
            .field("plugins", &self.inner.plugins)
            .field("commands", &self.inner.commands)
            .finish()
    }
}
