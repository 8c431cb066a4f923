//! The editor menu bar: a row of dropdown menus.
//!
//! Left and right arrows move between the menus. While any menu is open,
//! moving focus to another menu opens that one instead, so the user can
//! browse menus with the keyboard without reopening each.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::keyboard::{ARROW_LEFT, ARROW_RIGHT, get_localized_arrow_key_code};
use tessera_utils::{
    DomListenOptions, EventInfo, FocusTracker, Keystroke, KeystrokeHandler, Property,
    PropertyChange, Result,
};

use crate::component_factory::ComponentFactory;
use crate::dropdown::DropdownView;
use crate::focus_cycler::{FocusCycler, FocusCyclerActions};
use crate::template::{Bind, Template};
use crate::view::{TemplateView, View, ViewBase, ViewContext};
use crate::view_collection::{CollectionChange, ViewCollection};

/// One top-level menu: a label and the component names it lists.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuDefinition {
    pub menu_id: SmolStr,
    pub label: SmolStr,
    #[serde(default)]
    pub items: Vec<String>,
}

/// The `menuBar` configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuBarConfig {
    pub is_visible: bool,
    pub items: Vec<MenuDefinition>,
}

impl MenuBarConfig {
    pub fn from_value(value: Option<&serde_json::Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring malformed menu bar configuration");
            Self::default()
        })
    }
}

pub struct MenuBarView {
    base: ViewBase,
    pub children: ViewCollection,
    pub focus_tracker: FocusTracker,
    pub keystrokes: KeystrokeHandler,
    /// Whether any menu is open.
    pub is_open: Property<bool>,
    pub aria_label: Property<SmolStr>,
    menus: RefCell<Vec<(SmolStr, Rc<DropdownView>)>>,
    focus_cycler: FocusCycler,
}

impl MenuBarView {
    pub fn new(context: &ViewContext) -> Result<Rc<Self>> {
        let base = ViewBase::new(context);
        let emitter = base.emitter().clone();
        let children = base.create_collection();
        let focus_tracker = FocusTracker::new();
        let keystrokes = KeystrokeHandler::with_env(context.env);

        let direction = context.locale.ui_language_direction();
        let arrow = |code| Keystroke::Code(get_localized_arrow_key_code(code, direction));
        let focus_cycler = FocusCycler::new(
            &children,
            &focus_tracker,
            Some(&keystrokes),
            FocusCyclerActions {
                focus_previous: vec![arrow(ARROW_LEFT)],
                focus_next: vec![arrow(ARROW_RIGHT)],
            },
        )?;

        let bar = Rc::new(Self {
            is_open: Property::new(&emitter, "isOpen", false),
            aria_label: Property::new(
                &emitter,
                "ariaLabel",
                SmolStr::new(context.t("Editor menu bar")),
            ),
            base,
            children,
            focus_tracker,
            keystrokes,
            menus: RefCell::new(Vec::new()),
            focus_cycler,
        });

        bar.base.set_template(
            Template::new("div")
                .class("ck")
                .class("ck-menu-bar")
                .attr("class", Bind::when(&bar.is_open, "ck-menu-bar_open"))
                .attr("role", "menubar")
                .attr("aria-label", Bind::to(&bar.aria_label))
                .collection(&bar.children),
        );

        let (tracker, children) = (bar.focus_tracker.clone(), bar.children.clone());
        emitter.listen_to(
            bar.children.emitter(),
            "add",
            move |_: &mut EventInfo, change: &CollectionChange| {
                if children.parent().is_some() {
                    if let Err(err) = tracker.add(change.view.trackable()) {
                        tracing::warn!(%err, "menu could not be tracked");
                    }
                }
            },
        );

        let weak: Weak<Self> = Rc::downgrade(&bar);
        bar.focus_tracker.focused_element_property().listen_change(
            &emitter,
            move |change: &PropertyChange<Option<Node>>| {
                let (Some(bar), Some(focused)) = (weak.upgrade(), change.new.as_ref()) else {
                    return;
                };
                if !bar.is_open.get() {
                    return;
                }
                if let Some(menu) = bar.menu_for_element(focused) {
                    menu.is_open.set(true);
                }
            },
        );
        Ok(bar)
    }

    /// Add a top-level menu labelled `label`.
    pub fn add_menu(self: &Rc<Self>, menu_id: &str, label: &str) -> Result<Rc<DropdownView>> {
        let menu = DropdownView::new(self.base.context())?;
        menu.button.label.set(SmolStr::new(label));
        menu.button.with_text.set(true);
        menu.button.class.set(Some("ck-menu-bar__menu__button".into()));
        menu.base()
            .emitter()
            .delegate(&["execute"])
            .to(self.base.emitter());

        let weak: Weak<Self> = Rc::downgrade(self);
        let opened = Rc::downgrade(&menu);
        menu.is_open.listen_change(
            self.base.emitter(),
            move |change: &PropertyChange<bool>| {
                let Some(bar) = weak.upgrade() else {
                    return;
                };
                let menus = bar.menus();
                if let (true, Some(opened)) = (change.new, opened.upgrade()) {
                    for other in menus.iter().filter(|other| !Rc::ptr_eq(&opened, other)) {
                        other.is_open.set(false);
                    }
                }
                bar.is_open.set(menus.iter().any(|menu| menu.is_open.get()));
            },
        );

        self.menus
            .borrow_mut()
            .push((SmolStr::new(menu_id), menu.clone()));
        self.children.add(menu.clone())?;
        Ok(menu)
    }

    pub fn menus(&self) -> Vec<Rc<DropdownView>> {
        self.menus.borrow().iter().map(|(_, menu)| menu.clone()).collect()
    }

    pub fn menu(&self, menu_id: &str) -> Option<Rc<DropdownView>> {
        self.menus
            .borrow()
            .iter()
            .find(|(id, _)| id == menu_id)
            .map(|(_, menu)| menu.clone())
    }

    fn menu_for_element(&self, element: &Node) -> Option<Rc<DropdownView>> {
        self.menus()
            .into_iter()
            .find(|menu| menu.element().as_ref() == Some(element))
    }

    /// Build the menus from config. `|` separates groups inside a menu;
    /// unknown component names are skipped.
    pub fn fill_from_config(
        self: &Rc<Self>,
        config: &MenuBarConfig,
        factory: &ComponentFactory,
    ) -> Result<()> {
        let context = self.base.context();
        for definition in &config.items {
            let menu = self.add_menu(&definition.menu_id, &definition.label)?;
            for name in &definition.items {
                let item: Rc<dyn View> = match name.as_str() {
                    "|" => TemplateView::with_template(
                        context,
                        Template::new("span")
                            .class("ck")
                            .class("ck-menu-bar__menu__separator"),
                    ),
                    name if factory.has(name) => factory.create(name)?,
                    name => {
                        tracing::warn!(
                            item = name,
                            menu = %definition.menu_id,
                            "menu item is unavailable"
                        );
                        continue;
                    }
                };
                menu.panel.children.add(item)?;
            }
        }
        Ok(())
    }

    /// Close every open menu.
    pub fn close(&self) {
        for menu in self.menus() {
            menu.is_open.set(false);
        }
    }

    pub fn focus_cycler(&self) -> &FocusCycler {
        &self.focus_cycler
    }
}

impl View for MenuBarView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn render(&self) -> Result<()> {
        self.base.render()?;
        for child in self.children.to_vec() {
            self.focus_tracker.add(child.trackable())?;
        }
        if let Some(element) = self.base.element() {
            self.keystrokes.listen_to_dom_with(&element, DomListenOptions::default());
        }
        Ok(())
    }

    fn is_focusable(&self) -> bool {
        self.children.to_vec().iter().any(|child| child.is_focusable())
    }

    /// Focus the first menu.
    fn focus(&self) {
        self.focus_cycler.focus_first();
    }

    fn focus_scope(&self) -> Option<&dyn tessera_utils::HasOwnFocusTracker> {
        Some(self)
    }

    fn destroy(&self) {
        self.base.destroy();
        self.focus_tracker.destroy();
        self.keystrokes.destroy();
        self.menus.borrow_mut().clear();
    }
}

impl tessera_utils::HasOwnFocusTracker for MenuBarView {
    fn element(&self) -> Option<Node> {
        self.base.element()
    }

    fn focus_tracker(&self) -> FocusTracker {
        self.focus_tracker.clone()
    }
}
