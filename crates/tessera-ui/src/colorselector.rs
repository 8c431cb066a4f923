//! Color selector: a "Remove color" button above a [`ColorGridView`].
//!
//! Tab and Shift+Tab move between the button and the grid; arrows move
//! inside the grid. Both parts fire `execute` on the selector with a
//! [`ColorPick`].

use std::rc::Rc;

use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::{
    DomListenOptions, EventInfo, FocusTracker, KeystrokeHandler, Property, Result,
};

use crate::button::ButtonView;
use crate::colorgrid::{ColorDefinition, ColorGridView, ColorPick, ColorPickSource};
use crate::focus_cycler::{FocusCycler, FocusCyclerActions};
use crate::template::Template;
use crate::view::{View, ViewBase, ViewContext};
use crate::view_collection::ViewCollection;

pub struct ColorSelectorView {
    base: ViewBase,
    pub remove_button: Rc<ButtonView>,
    pub grid: Rc<ColorGridView>,
    pub selected_color: Property<Option<SmolStr>>,
    pub items: ViewCollection,
    pub focus_tracker: FocusTracker,
    pub keystrokes: KeystrokeHandler,
    focus_cycler: FocusCycler,
}

impl ColorSelectorView {
    pub fn new(
        context: &ViewContext,
        colors: &[ColorDefinition],
        columns: usize,
        remove_button_label: &str,
    ) -> Result<Rc<Self>> {
        let base = ViewBase::new(context);
        let emitter = base.emitter().clone();
        let items = base.create_collection();
        let focus_tracker = FocusTracker::new();
        let keystrokes = KeystrokeHandler::with_env(context.env);
        let focus_cycler = FocusCycler::new(
            &items,
            &focus_tracker,
            Some(&keystrokes),
            FocusCyclerActions::tab(),
        )?;

        let remove_button = ButtonView::with_label(context, remove_button_label);
        remove_button.class.set(Some("ck-color-selector__remove-color".into()));
        let grid = ColorGridView::new(context, colors, columns)?;

        let selector = Self {
            selected_color: Property::new(&emitter, "selectedColor", None),
            remove_button,
            grid,
            base,
            items,
            focus_tracker,
            keystrokes,
            focus_cycler,
        };
        selector.grid.selected_color.bind_to(&selector.selected_color);
        selector.items.add(selector.remove_button.clone())?;
        selector.items.add(selector.grid.clone())?;

        selector.base.set_template(
            Template::new("div")
                .class("ck")
                .class("ck-color-selector")
                .collection(&selector.items),
        );

        selector.grid.base().emitter().delegate(&["execute"]).to(&emitter);
        let target = emitter.downgrade();
        emitter.listen_to(
            selector.remove_button.base().emitter(),
            "execute",
            move |_: &mut EventInfo, _: &()| {
                if let Some(target) = target.upgrade() {
                    target.fire(
                        "execute",
                        &ColorPick {
                            value: SmolStr::default(),
                            label: SmolStr::default(),
                            source: ColorPickSource::RemoveColor,
                        },
                    );
                }
            },
        );
        Ok(Rc::new(selector))
    }

    pub fn focus_cycler(&self) -> &FocusCycler {
        &self.focus_cycler
    }

    pub fn focus_last(&self) {
        self.focus_cycler.focus_last();
    }
}

impl View for ColorSelectorView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn render(&self) -> Result<()> {
        self.base.render()?;
        for item in self.items.to_vec() {
            self.focus_tracker.add(item.trackable())?;
        }
        if let Some(element) = self.base.element() {
            self.keystrokes.listen_to_dom_with(&element, DomListenOptions::default());
        }
        Ok(())
    }

    fn is_focusable(&self) -> bool {
        self.is_rendered()
    }

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
    }
}

impl tessera_utils::HasOwnFocusTracker for ColorSelectorView {
    fn element(&self) -> Option<Node> {
        self.base.element()
    }

    fn focus_tracker(&self) -> FocusTracker {
        self.focus_tracker.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use tessera_utils::keyboard::{KeyEventData, TAB};

    fn setup() -> (ViewContext, Rc<ColorSelectorView>) {
        let context = ViewContext::default();
        let colors = [
            ColorDefinition::labelled("#000", "Black"),
            ColorDefinition::labelled("#f00", "Red"),
        ];
        let selector = ColorSelectorView::new(&context, &colors, 5, "Remove color").unwrap();
        selector.render().unwrap();
        context.document.body().append_child(&selector.element().unwrap());
        (context, selector)
    }

    #[test]
    fn both_parts_execute_on_the_selector() {
        let (_context, selector) = setup();
        let picks = Rc::new(RefCell::new(Vec::new()));
        {
            let picks = picks.clone();
            selector
                .base()
                .emitter()
                .on("execute", move |_: &mut EventInfo, pick: &ColorPick| {
                    picks.borrow_mut().push((pick.value.clone(), pick.source));
                });
        }

        selector.grid.tiles()[1].element().unwrap().click();
        selector.remove_button.element().unwrap().click();

        assert_eq!(
            *picks.borrow(),
            vec![
                (SmolStr::new("#f00"), ColorPickSource::ColorGrid),
                (SmolStr::new(""), ColorPickSource::RemoveColor),
            ]
        );
    }

    #[test]
    fn selected_color_reaches_the_grid() {
        let (_context, selector) = setup();
        selector.selected_color.set(Some("#000".into()));
        assert!(selector.grid.tiles()[0].button().is_on.get());
    }

    #[test]
    fn tab_moves_between_button_and_grid() {
        let (context, selector) = setup();
        selector.focus();
        assert_eq!(context.document.active_element(), selector.remove_button.element());

        let tab = KeyEventData::new(TAB);
        assert!(selector.keystrokes.press(&tab));
        assert_eq!(context.document.active_element(), selector.grid.tiles()[0].element());
        assert!(selector.focus_tracker.is_focused());

        assert!(selector.keystrokes.press(&tab));
        assert_eq!(context.document.active_element(), selector.remove_button.element());
    }
}
