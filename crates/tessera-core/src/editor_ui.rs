//! The part of an editor's UI every flavor shares.
//!
//! [`EditorUI`] owns the component factory and the global focus tracker,
//! keeps the registry of editable elements per root, and wires keyboard
//! access to toolbars (Alt+F10, Esc back to the content) and the menu bar
//! (Alt+F9). Flavors add their own view on top and fire `ready` once it is
//! in place.
//!
//! Events: `update` (the editing view rendered), `ready`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smol_str::SmolStr;
use tessera_engine::EditingView;
use tessera_ui::{ComponentFactory, MenuBarView, ToolbarView, View, ViewContext};
use tessera_utils::dom::Node;
use tessera_utils::keyboard::ESC;
use tessera_utils::{Emitter, EventInfo, FocusTracker, KeystrokeOptions, PropertyChange, Result};

use crate::editing_keystrokes::EditingKeystrokeHandler;

/// How a toolbar takes part in Alt+F10 navigation.
#[derive(Clone, Default)]
pub struct ToolbarFocusOptions {
    /// Contextual toolbars are offered first, and only while attached to
    /// the page.
    pub is_contextual: bool,
    /// Called before the toolbar receives focus, to show it for example.
    pub before_focus: Option<Rc<dyn Fn()>>,
    /// Called after focus left the toolbar through Esc.
    pub after_blur: Option<Rc<dyn Fn()>>,
}

#[derive(Clone)]
struct ToolbarEntry {
    toolbar: Rc<ToolbarView>,
    options: ToolbarFocusOptions,
}

#[derive(Clone)]
pub struct EditorUI {
    inner: Rc<UiInner>,
}

struct UiInner {
    emitter: Emitter,
    editor_id: u64,
    context: ViewContext,
    component_factory: ComponentFactory,
    focus_tracker: FocusTracker,
    editing_view: EditingView,
    keystrokes: EditingKeystrokeHandler,
    editables: RefCell<Vec<(SmolStr, Node)>>,
    toolbars: RefCell<Vec<ToolbarEntry>>,
    menu_bar: RefCell<Option<Rc<MenuBarView>>>,
    last_focused_editable: RefCell<Option<Node>>,
    is_ready: Cell<bool>,
}

impl EditorUI {
    pub fn new(
        editor_id: u64,
        context: &ViewContext,
        editing_view: &EditingView,
        keystrokes: &EditingKeystrokeHandler,
    ) -> Result<Self> {
        let emitter = Emitter::new();
        let ui = Self {
            inner: Rc::new(UiInner {
                editor_id,
                context: context.clone(),
                component_factory: ComponentFactory::new(context),
                focus_tracker: FocusTracker::new(),
                editing_view: editing_view.clone(),
                keystrokes: keystrokes.clone(),
                editables: RefCell::new(Vec::new()),
                toolbars: RefCell::new(Vec::new()),
                menu_bar: RefCell::new(None),
                last_focused_editable: RefCell::new(None),
                is_ready: Cell::new(false),
                emitter,
            }),
        };

        let weak = ui.downgrade();
        ui.inner.emitter.listen_to(
            editing_view.emitter(),
            "render",
            move |_: &mut EventInfo, _: &()| {
                if let Some(ui) = Self::upgrade(&weak) {
                    ui.update();
                }
            },
        );

        let weak = ui.downgrade();
        ui.inner.focus_tracker.focused_element_property().listen_change(
            &ui.inner.emitter,
            move |change: &PropertyChange<Option<Node>>| {
                let (Some(ui), Some(focused)) = (Self::upgrade(&weak), change.new.as_ref()) else {
                    return;
                };
                let is_editable = ui
                    .inner
                    .editables
                    .borrow()
                    .iter()
                    .any(|(_, element)| element == focused);
                if is_editable {
                    *ui.inner.last_focused_editable.borrow_mut() = Some(focused.clone());
                }
            },
        );

        let weak = ui.downgrade();
        keystrokes.set("Alt+F10", KeystrokeOptions::default(), move |_, cancel| {
            if let Some(ui) = Self::upgrade(&weak) {
                if ui.is_ui_focused() && ui.focus_next_toolbar() {
                    cancel();
                }
            }
        })?;

        let weak = ui.downgrade();
        keystrokes.set("Alt+F9", KeystrokeOptions::default(), move |_, cancel| {
            let Some(ui) = Self::upgrade(&weak) else {
                return;
            };
            let menu_bar = ui.inner.menu_bar.borrow().clone();
            let Some(menu_bar) = menu_bar else {
                return;
            };
            if ui.is_ui_focused() && menu_bar.element().is_some_and(|e| e.is_connected()) {
                menu_bar.focus();
                cancel();
            }
        })?;

        Ok(ui)
    }

    fn downgrade(&self) -> Weak<UiInner> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<UiInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn context(&self) -> &ViewContext {
        &self.inner.context
    }

    pub fn component_factory(&self) -> &ComponentFactory {
        &self.inner.component_factory
    }

    /// Tracks every element of the editor's UI: editables, toolbars and the
    /// menu bar.
    pub fn focus_tracker(&self) -> &FocusTracker {
        &self.inner.focus_tracker
    }

    pub fn is_ready(&self) -> bool {
        self.inner.is_ready.get()
    }

    /// Announce that the UI is in place.
    pub fn fire_ready(&self) {
        self.inner.is_ready.set(true);
        tracing::debug!("editor UI ready");
        self.inner.emitter.fire("ready", &());
    }

    /// Ask UI components to refresh their position or state.
    pub fn update(&self) {
        self.inner.emitter.fire("update", &());
    }

    fn is_ui_focused(&self) -> bool {
        self.inner.focus_tracker.is_focused() || self.inner.editing_view.is_focused()
    }

    // === Editables ===

    /// Register the DOM element editing root `root_name` is rendered into.
    pub fn set_editable_element(&self, root_name: &str, element: &Node) -> Result<()> {
        {
            let mut editables = self.inner.editables.borrow_mut();
            editables.retain(|(name, _)| name != root_name);
            editables.push((SmolStr::new(root_name), element.clone()));
        }
        if element.editor_instance().is_none() {
            element.set_editor_instance(Some(self.inner.editor_id));
        }
        if !self.inner.focus_tracker.elements().contains(element) {
            self.inner.focus_tracker.add(element)?;
        }
        Ok(())
    }

    pub fn remove_editable_element(&self, root_name: &str) {
        let removed = {
            let mut editables = self.inner.editables.borrow_mut();
            let index = editables.iter().position(|(name, _)| name == root_name);
            index.map(|index| editables.remove(index).1)
        };
        if let Some(element) = removed {
            self.inner.focus_tracker.remove(&element);
            if element.editor_instance() == Some(self.inner.editor_id) {
                element.set_editor_instance(None);
            }
        }
    }

    pub fn get_editable_element(&self, root_name: &str) -> Option<Node> {
        self.inner
            .editables
            .borrow()
            .iter()
            .find(|(name, _)| name == root_name)
            .map(|(_, element)| element.clone())
    }

    pub fn editable_element_names(&self) -> Vec<SmolStr> {
        self.inner
            .editables
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Focus the editable that last had focus, or the editing view.
    pub fn focus_editable(&self) {
        let last = self.inner.last_focused_editable.borrow().clone();
        match last {
            Some(element) if element.is_connected() => element.focus(),
            _ => self.inner.editing_view.focus(),
        }
    }

    // === Toolbars ===

    /// Make `toolbar` part of the editor UI: it is focus-tracked, reachable
    /// with Alt+F10, and Esc inside it returns to the content.
    pub fn add_toolbar(
        &self,
        toolbar: &Rc<ToolbarView>,
        options: ToolbarFocusOptions,
    ) -> Result<()> {
        self.inner.focus_tracker.add(toolbar.trackable())?;
        if let Some(element) = toolbar.element() {
            self.inner.keystrokes.listen_to_dom(&element);
        }

        let weak = self.downgrade();
        let toolbar_tracker = toolbar.focus_tracker.clone();
        let after_blur = options.after_blur.clone();
        toolbar.keystrokes.set(ESC, KeystrokeOptions::default(), move |_, cancel| {
            let Some(ui) = Self::upgrade(&weak) else {
                return;
            };
            if toolbar_tracker.is_focused() {
                ui.focus_editable();
                if let Some(after_blur) = &after_blur {
                    after_blur();
                }
                cancel();
            }
        })?;

        self.inner.toolbars.borrow_mut().push(ToolbarEntry {
            toolbar: toolbar.clone(),
            options,
        });
        Ok(())
    }

    /// Move focus to the next toolbar that can take it. Returns whether one
    /// did.
    fn focus_next_toolbar(&self) -> bool {
        let mut candidates: Vec<ToolbarEntry> = self
            .inner
            .toolbars
            .borrow()
            .iter()
            .filter(|entry| {
                entry.toolbar.element().is_some_and(|e| e.is_connected())
                    || (entry.options.is_contextual && entry.options.before_focus.is_some())
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|entry| !entry.options.is_contextual);

        let current = candidates
            .iter()
            .position(|entry| entry.toolbar.focus_tracker.is_focused());
        let next = match current {
            Some(index) if candidates.len() < 2 => {
                tracing::trace!(index, "the focused toolbar is the only one");
                return false;
            }
            Some(index) => (index + 1) % candidates.len(),
            None => 0,
        };
        let Some(entry) = candidates.get(next) else {
            return false;
        };
        if let Some(before_focus) = &entry.options.before_focus {
            before_focus();
        }
        entry.toolbar.focus();
        true
    }

    // === Menu bar ===

    /// Make `menu_bar` part of the editor UI, reachable with Alt+F9. Esc
    /// with every menu closed returns to the content.
    pub fn init_menu_bar(&self, menu_bar: &Rc<MenuBarView>) -> Result<()> {
        self.inner.focus_tracker.add(menu_bar.trackable())?;
        if let Some(element) = menu_bar.element() {
            self.inner.keystrokes.listen_to_dom(&element);
        }

        let weak = self.downgrade();
        let bar = Rc::downgrade(menu_bar);
        menu_bar.keystrokes.set(ESC, KeystrokeOptions::default(), move |_, cancel| {
            let (Some(ui), Some(bar)) = (Self::upgrade(&weak), bar.upgrade()) else {
                return;
            };
            if bar.focus_tracker.is_focused() && !bar.is_open.get() {
                ui.focus_editable();
                cancel();
            }
        })?;

        *self.inner.menu_bar.borrow_mut() = Some(menu_bar.clone());
        Ok(())
    }

    pub fn menu_bar(&self) -> Option<Rc<MenuBarView>> {
        self.inner.menu_bar.borrow().clone()
    }

    pub fn destroy(&self) {
        self.inner.emitter.stop_listening(None, None, None);
        self.inner.focus_tracker.destroy();
        for name in self.editable_element_names() {
            self.remove_editable_element(&name);
        }
        self.inner.toolbars.borrow_mut().clear();
        self.inner.menu_bar.borrow_mut().take();
        self.inner.last_focused_editable.borrow_mut().take();
        tracing::debug!("editor UI destroyed");
    }
}

impl fmt::Debug for EditorUI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorUI")
            .field("editables", &self.editable_element_names())
            .field("toolbars", &self.inner.toolbars.borrow().len())
            .field("is_ready", &self.is_ready())
            .finish()
    }
}
