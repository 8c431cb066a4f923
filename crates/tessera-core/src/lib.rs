//! Editor base of the tessera framework.
//!
//! Configuration, plugins, commands, editor-wide keystrokes and the UI
//! every flavor shares. Flavors such as the decoupled editor build on
//! [`Editor`] and [`EditorUI`].

pub mod command;
pub mod config;
pub mod editing_keystrokes;
pub mod editor;
pub mod editor_ui;
pub mod plugin;
pub mod source;

pub use command::{Command, CommandBase, CommandCollection, READ_ONLY_LOCK};
pub use config::{Config, EditorConfig, PerRoot};
pub use editing_keystrokes::EditingKeystrokeHandler;
pub use editor::{Editor, EditorState, WeakEditor};
pub use editor_ui::{EditorUI, ToolbarFocusOptions};
pub use plugin::{Plugin, PluginCollection, PluginConstructor, PluginDefinition};
pub use source::EditorSource;

pub use tessera_utils::{Error, Result};
