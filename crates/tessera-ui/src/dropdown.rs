//! Dropdowns: a button opening a panel.
//!
//! Default behaviour wired on render:
//!
//! - the button toggles `is_open`
//! - `execute` fired by any panel child closes the dropdown
//! - losing focus closes the dropdown
//! - ArrowDown on a closed, enabled dropdown opens it and focuses the panel
//! - Esc closes an open dropdown and returns focus to the button

use std::rc::{Rc, Weak};

use tessera_utils::dom::Node;
use tessera_utils::keyboard::{ARROW_DOWN, ESC};
use tessera_utils::{
    DomListenOptions, EventInfo, FocusTracker, KeystrokeHandler, KeystrokeOptions, Property,
    PropertyChange, Result,
};

use crate::button::ButtonView;
use crate::template::{Bind, Template};
use crate::view::{View, ViewBase, ViewContext};
use crate::view_collection::ViewCollection;

/// The panel shown below an open dropdown.
pub struct DropdownPanelView {
    base: ViewBase,
    pub children: ViewCollection,
    pub is_visible: Property<bool>,
}

impl DropdownPanelView {
    pub fn new(context: &ViewContext) -> Rc<Self> {
        let base = ViewBase::new(context);
        let panel = Self {
            children: base.create_collection(),
            is_visible: Property::new(base.emitter(), "isVisible", false),
            base,
        };
        panel.base.set_template(
            Template::new("div")
                .class("ck")
                .class("ck-reset")
                .class("ck-dropdown__panel")
                .attr("class", Bind::when(&panel.is_visible, "ck-dropdown__panel-visible"))
                .attr("tabindex", "-1")
                .collection(&panel.children),
        );
        Rc::new(panel)
    }

    pub fn focus_last(&self) {
        if let Some(child) = self.children.to_vec().into_iter().rev().find(|v| v.is_focusable()) {
            child.focus();
        }
    }
}

impl View for DropdownPanelView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    /// Focus the first focusable child.
    fn focus(&self) {
        if let Some(child) = self.children.to_vec().into_iter().find(|v| v.is_focusable()) {
            child.focus();
        }
    }
}

pub struct DropdownView {
    base: ViewBase,
    pub button: Rc<ButtonView>,
    pub panel: Rc<DropdownPanelView>,
    pub is_open: Property<bool>,
    pub is_enabled: Property<bool>,
    pub focus_tracker: FocusTracker,
    pub keystrokes: KeystrokeHandler,
}

impl DropdownView {
    /// A dropdown with its default behaviour wired.
    pub fn new(context: &ViewContext) -> Result<Rc<Self>> {
        let dropdown = Self::build(context);
        dropdown.wire()?;
        Ok(dropdown)
    }

    fn build(context: &ViewContext) -> Rc<Self> {
        let base = ViewBase::new(context);
        let emitter = base.emitter().clone();
        let button = ButtonView::new(context);
        let panel = DropdownPanelView::new(context);
        let dropdown = Self {
            is_open: Property::new(&emitter, "isOpen", false),
            is_enabled: Property::new(&emitter, "isEnabled", true),
            focus_tracker: FocusTracker::new(),
            keystrokes: KeystrokeHandler::with_env(context.env),
            base,
            button,
            panel,
        };

        let is_open = dropdown.is_open.clone();
        dropdown.button.base().extend_template(move |template| {
            template
                .class("ck-dropdown__button")
                .attr("aria-haspopup", "true")
                .attr("aria-expanded", Bind::to(&is_open))
        });
        dropdown.button.is_enabled.bind_to(&dropdown.is_enabled);
        dropdown.panel.is_visible.bind_to(&dropdown.is_open);
        dropdown
            .panel
            .children
            .delegate(&["execute"], dropdown.base.emitter());

        dropdown.base.set_template(
            Template::new("div")
                .class("ck")
                .class("ck-dropdown")
                .attr("class", Bind::unless(&dropdown.is_enabled, "ck-disabled"))
                .view(dropdown.button.clone())
                .view(dropdown.panel.clone()),
        );
        Rc::new(dropdown)
    }

    fn wire(self: &Rc<Self>) -> Result<()> {
        let emitter = self.base.emitter();

        let weak = Rc::downgrade(self);
        emitter.listen_to(
            self.button.base().emitter(),
            "execute",
            move |_: &mut EventInfo, _: &()| {
                if let Some(dropdown) = weak.upgrade() {
                    dropdown.is_open.set(!dropdown.is_open.get());
                }
            },
        );

        let is_open = self.is_open.clone();
        emitter.on("execute", move |_: &mut EventInfo, _: &()| {
            is_open.set(false);
        });

        let is_open = self.is_open.clone();
        self.focus_tracker.is_focused_property().listen_change(
            emitter,
            move |change: &PropertyChange<bool>| {
                if !change.new {
                    is_open.set(false);
                }
            },
        );

        let weak: Weak<Self> = Rc::downgrade(self);
        self.keystrokes.set(ARROW_DOWN, KeystrokeOptions::default(), move |_, cancel| {
            let Some(dropdown) = weak.upgrade() else {
                return;
            };
            if dropdown.button.is_enabled.get() && !dropdown.is_open.get() {
                dropdown.is_open.set(true);
                dropdown.panel.focus();
                cancel();
            }
        })?;

        let weak: Weak<Self> = Rc::downgrade(self);
        self.keystrokes.set(ESC, KeystrokeOptions::default(), move |_, cancel| {
            let Some(dropdown) = weak.upgrade() else {
                return;
            };
            if dropdown.is_open.get() {
                dropdown.is_open.set(false);
                dropdown.button.focus();
                cancel();
            }
        })?;
        Ok(())
    }
}

impl View for DropdownView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn render(&self) -> Result<()> {
        self.base.render()?;
        if let Some(element) = self.base.element() {
            self.focus_tracker.add(&element)?;
            self.keystrokes.listen_to_dom_with(&element, DomListenOptions::default());
        }
        Ok(())
    }

    fn is_focusable(&self) -> bool {
        self.button.is_focusable()
    }

    fn focus(&self) {
        self.button.focus();
    }

    fn focus_scope(&self) -> Option<&dyn tessera_utils::HasOwnFocusTracker> {
        Some(self)
    }

    fn destroy(&self) {
        self.base.destroy();
        self.focus_tracker.destroy();
        self.keystrokes.destroy();
    }
}

impl tessera_utils::HasOwnFocusTracker for DropdownView {
    fn element(&self) -> Option<Node> {
        self.base.element()
    }

    fn focus_tracker(&self) -> FocusTracker {
        self.focus_tracker.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_utils::keyboard::KeyEventData;
    use tessera_utils::Env;

    fn setup() -> (ViewContext, Rc<DropdownView>, Rc<ButtonView>) {
        let context = ViewContext {
            env: Env::other(),
            ..ViewContext::default()
        };
        let dropdown = DropdownView::new(&context).unwrap();
        dropdown.button.label.set("Heading".into());
        let option = ButtonView::with_label(&context, "Heading 1");
        dropdown.panel.children.add(option.clone()).unwrap();
        dropdown.render().unwrap();
        context.document.body().append_child(&dropdown.element().unwrap());
        (context, dropdown, option)
    }

    #[test]
    fn button_toggles_the_panel() {
        let (_context, dropdown, _option) = setup();
        let button = dropdown.button.element().unwrap();
        let panel = dropdown.panel.element().unwrap();

        button.click();
        assert!(dropdown.is_open.get());
        assert!(panel.has_class("ck-dropdown__panel-visible"));
        assert_eq!(button.get_attribute("aria-expanded").as_deref(), Some("true"));

        button.click();
        assert!(!dropdown.is_open.get());
        assert!(!panel.has_class("ck-dropdown__panel-visible"));
    }

    #[test]
    fn executing_a_panel_item_closes_the_dropdown() {
        let (_context, dropdown, option) = setup();
        dropdown.is_open.set(true);
        option.element().unwrap().click();
        assert!(!dropdown.is_open.get());
    }

    #[test]
    fn arrow_down_opens_and_esc_returns_to_the_button() {
        let (context, dropdown, option) = setup();
        dropdown.focus();

        assert!(dropdown.keystrokes.press(&KeyEventData::new(ARROW_DOWN)));
        assert!(dropdown.is_open.get());
        assert_eq!(context.document.active_element(), option.element());

        assert!(dropdown.keystrokes.press(&KeyEventData::new(ESC)));
        assert!(!dropdown.is_open.get());
        assert_eq!(context.document.active_element(), dropdown.button.element());
        assert!(!dropdown.keystrokes.press(&KeyEventData::new(ESC)));
    }

    #[test]
    fn losing_focus_closes_after_the_deferred_blur() {
        let (context, dropdown, option) = setup();
        dropdown.focus();
        dropdown.is_open.set(true);
        option.focus();
        assert!(dropdown.is_open.get());

        context.document.body().focus();
        assert!(dropdown.is_open.get());
        context.document.run_timers();
        assert!(!dropdown.is_open.get());
    }

    #[test]
    fn disabling_disables_the_button() {
        let (_context, dropdown, _option) = setup();
        dropdown.is_enabled.set(false);
        assert!(!dropdown.button.is_enabled.get());
        assert!(dropdown.element().unwrap().has_class("ck-disabled"));
        assert!(!dropdown.is_focusable());
    }
}
