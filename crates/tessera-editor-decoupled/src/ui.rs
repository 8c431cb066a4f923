use std::ops::Deref;
use std::rc::Rc;

use smol_str::SmolStr;
use tessera_core::{Editor, EditorUI, PerRoot, ToolbarFocusOptions};
use tessera_engine::EditingView;
use tessera_ui::{MenuBarConfig, ToolbarConfig, View};
use tessera_utils::{Error, Result};

use crate::view::DecoupledEditorUIView;

/// The decoupled editor's UI: the shared [`EditorUI`] plus its own view.
pub struct DecoupledEditorUI {
    ui: EditorUI,
    view: Rc<DecoupledEditorUIView>,
    editing_view: EditingView,
}

impl DecoupledEditorUI {
    pub fn new(editor: &Editor, view: Rc<DecoupledEditorUIView>) -> Self {
        Self {
            ui: editor.ui().clone(),
            editing_view: editor.editing_view().clone(),
            view,
        }
    }

    pub fn view(&self) -> &Rc<DecoupledEditorUIView> {
        &self.view
    }

    /// Render the view and wire it to the editor, then fire `ready`.
    ///
    /// The editable's element is registered and attached as the DOM root
    /// before the toolbar is filled, so toolbar components can rely on it.
    pub fn init(&self, editor: &Editor, root_name: &str) -> Result<()> {
        let editable = &self.view.editable;
        editable.name.set(SmolStr::new(root_name));
        self.view.render()?;

        let element = editable.element().ok_or(Error::ViewMissingElement)?;
        self.ui.set_editable_element(root_name, &element)?;
        editable
            .is_focused
            .bind_to(self.ui.focus_tracker().is_focused_property());
        self.editing_view.attach_dom_root(&element, root_name);

        self.init_placeholder(editor, root_name);
        self.init_toolbar(editor)?;
        self.init_menu_bar(editor)?;

        tracing::debug!(root = root_name, "decoupled editor UI initialized");
        self.ui.fire_ready();
        Ok(())
    }

    fn init_placeholder(&self, editor: &Editor, root_name: &str) {
        let Some(placeholder) = editor.config().get_as::<PerRoot<String>>("placeholder") else {
            return;
        };
        let (Some(text), Some(element)) = (
            placeholder.for_root(root_name),
            self.editing_view.dom_root(root_name),
        ) else {
            return;
        };
        self.editing_view.enable_placeholder(&element, text, true);
    }

    fn init_toolbar(&self, editor: &Editor) -> Result<()> {
        let toolbar = &self.view.toolbar;
        let config = ToolbarConfig::from_value(editor.config().get("toolbar").as_ref());
        toolbar.fill_from_config(&config, self.ui.component_factory())?;
        self.ui.add_toolbar(toolbar, ToolbarFocusOptions::default())
    }

    fn init_menu_bar(&self, editor: &Editor) -> Result<()> {
        let menu_bar = &self.view.menu_bar;
        let config = MenuBarConfig::from_value(editor.config().get("menuBar").as_ref());
        menu_bar.fill_from_config(&config, self.ui.component_factory())?;
        self.ui.init_menu_bar(menu_bar)
    }

    /// Detach the editing root, then destroy the view.
    pub fn destroy(&self) {
        self.ui.destroy();
        let name = self.view.editable.name.get();
        if self.editing_view.dom_root(&name).is_some() {
            self.editing_view.detach_dom_root(&name);
        }
        self.view.destroy();
    }
}

impl Deref for DecoupledEditorUI {
    type Target = EditorUI;

    fn deref(&self) -> &EditorUI {
        &self.ui
    }
}
