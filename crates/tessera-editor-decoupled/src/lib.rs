//! The decoupled editor flavor.
//!
//! Unlike a classic editor, which wraps its toolbar and editable in one
//! frame, the decoupled editor hands out separate elements: the host page
//! inserts `ui().view().toolbar` and `ui().view().menu_bar` wherever it
//! likes, and the editable either is the element the editor was created on
//! or a new element the page appends itself.
//!
//! ```no_run
//! # async fn demo() -> tessera_utils::Result<()> {
//! use tessera_core::{EditorConfig, PluginDefinition};
//! use tessera_editor_decoupled::DecoupledEditor;
//! use tessera_paragraph::Paragraph;
//! use tessera_ui::View;
//! use tessera_utils::Document;
//!
//! let document = Document::new();
//! let config = EditorConfig::new(serde_json::json!({ "toolbar": ["paragraph"] }))
//!     .with_plugins([PluginDefinition::of::<Paragraph>()]);
//! let editor = DecoupledEditor::create(&document, "<p>Hello</p>", config).await?;
//!
//! if let Some(toolbar) = editor.ui().view().toolbar.element() {
//!     document.body().append_child(&toolbar);
//! }
//! # Ok(())
//! # }
//! ```

pub mod editor;
pub mod ui;
pub mod view;

pub use editor::DecoupledEditor;
pub use ui::DecoupledEditorUI;
pub use view::{DecoupledEditorUIView, DecoupledViewOptions};

pub use tessera_utils::{Error, Result};
