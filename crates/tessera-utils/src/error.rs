//! Error types shared by every tessera crate.
//!
//! Each error carries a stable [`ErrorKind`] whose [`code`](ErrorKind::code)
//! is the documented identifier host applications match on. The same code is
//! reported as the miette diagnostic code.

use std::fmt;

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

/// Stable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    DuplicateTrackedElement,
    ViewMissingElement,
    UnknownKey,
    InitialDataConflict,
    SourceElementAlreadyUsed,
    WrongElement,
    PluginNotFound,
    PluginDependencyCycle,
    PluginInit,
    CommandNotFound,
    ComponentExists,
    ComponentMissing,
    ViewCollectionDuplicate,
    TemplateWrongSyntax,
    ViewAlreadyRendered,
    RootNotFound,
    DataNotInitialized,
    EditorDestroyed,
}

impl ErrorKind {
    /// The documented identifier for this kind of error.
    pub fn code(self) -> &'static str {
        match self {
            Self::DuplicateTrackedElement => "focustracker-add-element-already-exist",
            Self::ViewMissingElement => "focustracker-add-view-missing-element",
            Self::UnknownKey => "keyboard-unknown-key",
            Self::InitialDataConflict => "editor-create-initial-data",
            Self::SourceElementAlreadyUsed => "editor-source-element-already-used",
            Self::WrongElement => "editor-wrong-element",
            Self::PluginNotFound => "plugincollection-plugin-not-found",
            Self::PluginDependencyCycle => "plugincollection-plugin-cycle",
            Self::PluginInit => "plugincollection-plugin-init",
            Self::CommandNotFound => "commandcollection-command-not-found",
            Self::ComponentExists => "componentfactory-item-exists",
            Self::ComponentMissing => "componentfactory-item-missing",
            Self::ViewCollectionDuplicate => "ui-viewcollection-add-item-already-exists",
            Self::TemplateWrongSyntax => "ui-template-wrong-syntax",
            Self::ViewAlreadyRendered => "ui-view-render-already-rendered",
            Self::RootNotFound => "datacontroller-get-non-existent-root",
            Self::DataNotInitialized => "datacontroller-init-document-not-empty",
            Self::EditorDestroyed => "editor-destroyed",
        }
    }

    /// Configuration errors are raised synchronously and are never retried.
    pub fn is_configuration(self) -> bool {
        matches!(
            self,
            Self::DuplicateTrackedElement
                | Self::ViewMissingElement
                | Self::UnknownKey
                | Self::InitialDataConflict
                | Self::SourceElementAlreadyUsed
                | Self::WrongElement
                | Self::ComponentExists
                | Self::ViewCollectionDuplicate
                | Self::TemplateWrongSyntax
                | Self::ViewAlreadyRendered
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Main error type for tessera operations.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    /// An element or view was added to a focus tracker twice.
    #[error("the element is already tracked by this focus tracker")]
    #[diagnostic(
        code("focustracker-add-element-already-exist"),
        help("remove the element before adding it again")
    )]
    DuplicateTrackedElement,

    /// A view without a rendered element was added to a focus tracker.
    #[error("cannot track a view that has no element, render it first")]
    #[diagnostic(code("focustracker-add-view-missing-element"))]
    ViewMissingElement,

    /// A keystroke description names a key that has no key code.
    #[error("unknown key name: {key}")]
    #[diagnostic(
        code("keyboard-unknown-key"),
        help("use a key name from key_codes or a numeric key code")
    )]
    UnknownKey { key: SmolStr },

    /// Initial data was given both as the source and as `config.initialData`.
    #[error("initial data was passed both as the editor source and as config.initialData")]
    #[diagnostic(
        code("editor-create-initial-data"),
        help("pass either a data string or config.initialData, not both")
    )]
    InitialDataConflict,

    /// The source element is already bound to a live editor.
    #[error("the source element is already used by another editor instance")]
    #[diagnostic(
        code("editor-source-element-already-used"),
        help("destroy the editor bound to the element first")
    )]
    SourceElementAlreadyUsed,

    /// The editor flavor cannot be created on this kind of element.
    #[error("this editor cannot be created on a <{tag}> element")]
    #[diagnostic(
        code("editor-wrong-element"),
        help("create the editor on a <div> or pass the data directly")
    )]
    WrongElement { tag: SmolStr },

    /// A plugin or one of its requirements is not available.
    #[error("plugin not found: {name}")]
    #[diagnostic(code("plugincollection-plugin-not-found"))]
    PluginNotFound { name: SmolStr },

    /// Plugin requirements form a cycle.
    #[error("plugin dependency cycle: {}", .chain.join(" -> "))]
    #[diagnostic(code("plugincollection-plugin-cycle"))]
    PluginDependencyCycle { chain: Vec<SmolStr> },

    /// A plugin failed while initializing.
    #[error("plugin {plugin} failed to initialize: {message}")]
    #[diagnostic(code("plugincollection-plugin-init"))]
    PluginInit { plugin: SmolStr, message: String },

    /// No command is registered under the requested name.
    #[error("command not found: {name}")]
    #[diagnostic(code("commandcollection-command-not-found"))]
    CommandNotFound { name: SmolStr },

    /// A UI component with this name is already registered.
    #[error("a component named {name} is already registered")]
    #[diagnostic(code("componentfactory-item-exists"))]
    ComponentExists { name: SmolStr },

    /// No UI component with this name is registered.
    #[error("no component named {name} is registered")]
    #[diagnostic(code("componentfactory-item-missing"))]
    ComponentMissing { name: SmolStr },

    /// A view was added to a collection that already holds it.
    #[error("the view is already in this collection")]
    #[diagnostic(code("ui-viewcollection-add-item-already-exists"))]
    ViewCollectionDuplicate,

    /// A template cannot be rendered in its current shape.
    #[error("invalid template: {reason}")]
    #[diagnostic(code("ui-template-wrong-syntax"))]
    TemplateWrongSyntax { reason: &'static str },

    /// `render()` was called on a view that is already rendered.
    #[error("this view has already been rendered")]
    #[diagnostic(code("ui-view-render-already-rendered"))]
    ViewAlreadyRendered,

    /// A data operation addressed a root that does not exist.
    #[error("root does not exist: {root}")]
    #[diagnostic(code("datacontroller-get-non-existent-root"))]
    RootNotFound { root: SmolStr },

    /// `data.init()` was called on a document that already has content.
    #[error("the document already has content, use set() instead of init()")]
    #[diagnostic(code("datacontroller-init-document-not-empty"))]
    DataNotInitialized,

    /// The operation requires an editor that has not been destroyed.
    #[error("the editor has been destroyed")]
    #[diagnostic(code("editor-destroyed"))]
    EditorDestroyed,
}

impl Error {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTrackedElement => ErrorKind::DuplicateTrackedElement,
            Self::ViewMissingElement => ErrorKind::ViewMissingElement,
            Self::UnknownKey { .. } => ErrorKind::UnknownKey,
            Self::InitialDataConflict => ErrorKind::InitialDataConflict,
            Self::SourceElementAlreadyUsed => ErrorKind::SourceElementAlreadyUsed,
            Self::WrongElement { .. } => ErrorKind::WrongElement,
            Self::PluginNotFound { .. } => ErrorKind::PluginNotFound,
            Self::PluginDependencyCycle { .. } => ErrorKind::PluginDependencyCycle,
            Self::PluginInit { .. } => ErrorKind::PluginInit,
            Self::CommandNotFound { .. } => ErrorKind::CommandNotFound,
            Self::ComponentExists { .. } => ErrorKind::ComponentExists,
            Self::ComponentMissing { .. } => ErrorKind::ComponentMissing,
            Self::ViewCollectionDuplicate => ErrorKind::ViewCollectionDuplicate,
            Self::TemplateWrongSyntax { .. } => ErrorKind::TemplateWrongSyntax,
            Self::ViewAlreadyRendered => ErrorKind::ViewAlreadyRendered,
            Self::RootNotFound { .. } => ErrorKind::RootNotFound,
            Self::DataNotInitialized => ErrorKind::DataNotInitialized,
            Self::EditorDestroyed => ErrorKind::EditorDestroyed,
        }
    }

    /// Shorthand for `self.kind().code()`.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Wrap an arbitrary failure raised by a plugin during initialization.
    pub fn plugin_init(plugin: impl Into<SmolStr>, message: impl fmt::Display) -> Self {
        Self::PluginInit {
            plugin: plugin.into(),
            message: message.to_string(),
        }
    }
}

/// Result alias used across tessera.
pub type Result<T, E = Error> = std::result::Result<T, E>;
