use std::fmt;
use std::ops::Deref;

use serde_json::Value;
use tessera_core::source::{self, EditorSource};
use tessera_core::{Editor, EditorConfig, EditorState, PerRoot};
use tessera_utils::dom::Document;
use tessera_utils::{Error, Result};

use crate::ui::DecoupledEditorUI;
use crate::view::{DecoupledEditorUIView, DecoupledViewOptions};

const ROOT: &str = "main";

/// An editor whose toolbar, menu bar and editable are separate elements
/// the host page places itself.
///
/// Created either on an existing element, whose content becomes the
/// initial data and which becomes the editable, or from a data string, in
/// which case the editable is a new detached element.
pub struct DecoupledEditor {
    editor: Editor,
    ui: DecoupledEditorUI,
}

impl DecoupledEditor {
    /// Construct the editor without initializing it.
    ///
    /// Fails with [`Error::InitialDataConflict`] when data is passed both as
    /// the source and as `initialData`, with [`Error::WrongElement`] for a
    /// `<textarea>` source and with [`Error::SourceElementAlreadyUsed`] when
    /// another editor holds the source element.
    pub fn new(
        document: &Document,
        source: impl Into<EditorSource>,
        config: EditorConfig,
    ) -> Result<Self> {
        let source = source.into();
        let has_initial_data = config
            .values
            .as_object()
            .is_some_and(|values| values.contains_key("initialData"));
        if !source.is_element() && has_initial_data {
            return Err(Error::InitialDataConflict);
        }
        if let Some(element) = source.element() {
            source::check_source_element(element, &["textarea"])?;
        }

        let editor = Editor::new(document, config)?;
        let initial_data = match &source {
            EditorSource::Element(element) => source::get_data_from_element(element),
            EditorSource::Data(data) => data.clone(),
        };
        editor.config().define("initialData", initial_data);
        if let Some(element) = source.element() {
            editor.attach_source_element(element)?;
        }
        editor.model().create_root(ROOT);

        let config = editor.config();
        let options = DecoupledViewOptions {
            editable_element: source.element().cloned(),
            should_toolbar_group_when_full: !config
                .get_as::<bool>("toolbar.shouldNotGroupWhenFull")
                .unwrap_or(false),
            label: config
                .get_as::<PerRoot<String>>("label")
                .and_then(|label| label.for_root(ROOT).cloned()),
        };
        let view = DecoupledEditorUIView::new(editor.ui().context(), editor.editing_view(), options)
            .inspect_err(|_| editor.release_source_element())?;
        let ui = DecoupledEditorUI::new(&editor, view);
        Ok(Self { editor, ui })
    }

    /// Construct and initialize an editor: plugins, then the UI, then the
    /// initial data. Resolves once the editor fired `ready`.
    ///
    /// On failure whatever the completed stages set up is torn down, the
    /// source element is released and no editor is returned.
    pub async fn create(
        document: &Document,
        source: impl Into<EditorSource>,
        config: EditorConfig,
    ) -> Result<Self> {
        let editor = Self::new(document, source, config)?;
        if let Err(err) = editor.initialize().await {
            tracing::warn!(%err, state = ?editor.state(), "editor initialization failed");
            editor.ui.destroy();
            if let Err(teardown) = editor.editor.destroy().await {
                tracing::warn!(err = %teardown, "teardown after failed initialization");
            }
            return Err(err);
        }
        Ok(editor)
    }

    /// Run the initialization stages of a constructed editor.
    pub async fn initialize(&self) -> Result<()> {
        if self.editor.state() != EditorState::Constructed {
            tracing::warn!(state = ?self.editor.state(), "editor is already initialized");
            return Ok(());
        }
        self.editor.init_plugins().await?;

        self.editor.set_state(EditorState::UiInitializing);
        self.ui.init(&self.editor, ROOT)?;

        self.editor.set_state(EditorState::DataLoading);
        let initial_data = self
            .editor
            .config()
            .get_as::<String>("initialData")
            .unwrap_or_default();
        self.editor.data().init([(ROOT, initial_data.as_str())])?;

        self.editor.fire_ready();
        Ok(())
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn ui(&self) -> &DecoupledEditorUI {
        &self.ui
    }

    /// Destroy the editor. The data is read before the UI goes away and,
    /// with `updateSourceElementOnDestroy`, written back into the source
    /// element; otherwise the source element is emptied.
    pub async fn destroy(&self) -> Result<()> {
        if self.editor.state() == EditorState::Destroyed {
            return Ok(());
        }
        let data = self.editor.get_data()?;
        let source_element = self.editor.source_element();

        self.ui.destroy();
        self.editor.destroy().await?;

        if let Some(element) = source_element {
            let update = self
                .editor
                .config()
                .get("updateSourceElementOnDestroy")
                .is_some_and(|value| value == Value::Bool(true));
            source::set_data_in_element(&element, if update { &data } else { "" });
        }
        Ok(())
    }
}

impl Deref for DecoupledEditor {
    type Target = Editor;

    fn deref(&self) -> &Editor {
        &self.editor
    }
}

impl fmt::Debug for DecoupledEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoupledEditor")
            .field("editor", &self.editor)
            .field("ui", &*self.ui)
            .finish()
    }
}
