//! Color grids: tiles laid out in columns, navigated with the arrow keys.

use std::rc::{Rc, Weak};

use serde::Deserialize;
use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::keyboard::{
    ARROW_DOWN, ARROW_LEFT, ARROW_RIGHT, ARROW_UP, get_localized_arrow_key_code,
};
use tessera_utils::{
    DomListenOptions, EventInfo, FocusTracker, KeystrokeHandler, KeystrokeOptions, Property,
    PropertyChange, Result,
};

use crate::button::ButtonView;
use crate::template::{Bind, Template};
use crate::view::{View, ViewBase, ViewContext};
use crate::view_collection::{CollectionChange, ViewCollection};

/// A color offered by a grid, as written in config: either a bare CSS color
/// or `{ "color": ..., "label": ..., "hasBorder": ... }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawColorDefinition")]
pub struct ColorDefinition {
    pub color: SmolStr,
    pub label: SmolStr,
    pub has_border: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawColorDefinition {
    Color(SmolStr),
    #[serde(rename_all = "camelCase")]
    Full {
        color: SmolStr,
        label: Option<SmolStr>,
        #[serde(default)]
        has_border: bool,
    },
}

impl From<RawColorDefinition> for ColorDefinition {
    fn from(raw: RawColorDefinition) -> Self {
        match raw {
            RawColorDefinition::Color(color) => Self::new(&color),
            RawColorDefinition::Full {
                color,
                label,
                has_border,
            } => Self {
                label: label.unwrap_or_else(|| color.clone()),
                color,
                has_border,
            },
        }
    }
}

impl ColorDefinition {
    /// A color labelled with its own value.
    pub fn new(color: &str) -> Self {
        Self {
            color: SmolStr::new(color),
            label: SmolStr::new(color),
            has_border: false,
        }
    }

    pub fn labelled(color: &str, label: &str) -> Self {
        Self {
            label: SmolStr::new(label),
            ..Self::new(color)
        }
    }
}

/// Payload of `execute` fired by color grids and selectors. An empty
/// `value` removes the color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPick {
    pub value: SmolStr,
    pub label: SmolStr,
    pub source: ColorPickSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPickSource {
    ColorGrid,
    RemoveColor,
}

/// A single grid tile: a button painted with its color.
pub struct ColorTileView {
    button: Rc<ButtonView>,
    pub color: Property<SmolStr>,
    pub has_border: Property<bool>,
}

impl ColorTileView {
    pub fn new(context: &ViewContext, definition: &ColorDefinition) -> Rc<Self> {
        let button = ButtonView::new(context);
        let emitter = button.base().emitter().clone();
        let tile = Self {
            color: Property::new(&emitter, "color", definition.color.clone()),
            has_border: Property::new(&emitter, "hasBorder", definition.has_border),
            button,
        };
        tile.button.label.set(definition.label.clone());
        tile.button.tooltip.set(true);

        let (color, has_border) = (tile.color.clone(), tile.has_border.clone());
        tile.button.base().extend_template(move |template| {
            template
                .class("ck-color-grid__tile")
                .attr("class", Bind::when(&has_border, "ck-color-selector__color-tile_bordered"))
                .attr(
                    "style",
                    Bind::to_with(&color, |color| Some(format!("background-color: {color}"))),
                )
        });
        Rc::new(tile)
    }

    pub fn button(&self) -> &ButtonView {
        &self.button
    }

    pub fn label(&self) -> SmolStr {
        self.button.label.get()
    }
}

impl View for ColorTileView {
    fn base(&self) -> &ViewBase {
        self.button.base()
    }

    fn is_focusable(&self) -> bool {
        self.button.is_focusable()
    }

    fn focus(&self) {
        self.button.focus();
    }
}

/// A grid of [`ColorTileView`]s.
///
/// `selected_color` marks the matching tile as on. Clicking a tile fires
/// `execute` with a [`ColorPick`].
pub struct ColorGridView {
    base: ViewBase,
    pub items: ViewCollection,
    pub selected_color: Property<Option<SmolStr>>,
    pub focus_tracker: FocusTracker,
    pub keystrokes: KeystrokeHandler,
    columns: usize,
    tiles: Vec<Rc<ColorTileView>>,
}

impl ColorGridView {
    pub fn new(
        context: &ViewContext,
        colors: &[ColorDefinition],
        columns: usize,
    ) -> Result<Rc<Self>> {
        let columns = columns.max(1);
        let base = ViewBase::new(context);
        let emitter = base.emitter().clone();
        let items = base.create_collection();
        let tiles: Vec<_> = colors
            .iter()
            .map(|definition| ColorTileView::new(context, definition))
            .collect();

        let grid = Rc::new(Self {
            selected_color: Property::new(&emitter, "selectedColor", None),
            focus_tracker: FocusTracker::new(),
            keystrokes: KeystrokeHandler::with_env(context.env),
            base,
            items,
            columns,
            tiles,
        });

        grid.base.set_template(
            Template::new("div")
                .class("ck")
                .class("ck-color-grid")
                .attr("style", format!("grid-template-columns: repeat({columns}, 1fr)"))
                .collection(&grid.items),
        );

        for tile in &grid.tiles {
            let pick = ColorPick {
                value: tile.color.get(),
                label: tile.label(),
                source: ColorPickSource::ColorGrid,
            };
            let target = emitter.downgrade();
            emitter.listen_to(
                tile.base().emitter(),
                "execute",
                move |_: &mut EventInfo, _: &()| {
                    if let Some(target) = target.upgrade() {
                        target.fire("execute", &pick);
                    }
                },
            );
            grid.items.add(tile.clone())?;
        }

        let tiles = grid.tiles.clone();
        grid.selected_color.listen_change(
            &emitter,
            move |change: &PropertyChange<Option<SmolStr>>| {
                for tile in &tiles {
                    let on = change
                        .new
                        .as_ref()
                        .is_some_and(|selected| tile.color.with(|color| color == selected));
                    tile.button.is_on.set(on);
                }
            },
        );

        let (tracker, items) = (grid.focus_tracker.clone(), grid.items.clone());
        emitter.listen_to(
            grid.items.emitter(),
            "add",
            move |_: &mut EventInfo, change: &CollectionChange| {
                if items.parent().is_some() {
                    if let Err(err) = tracker.add(change.view.trackable()) {
                        tracing::warn!(%err, "color tile could not be tracked");
                    }
                }
            },
        );
        let tracker = grid.focus_tracker.clone();
        emitter.listen_to(
            grid.items.emitter(),
            "remove",
            move |_: &mut EventInfo, change: &CollectionChange| {
                tracker.remove(change.view.trackable());
            },
        );

        grid.add_keyboard_handling()?;
        Ok(grid)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn tiles(&self) -> &[Rc<ColorTileView>] {
        &self.tiles
    }

    pub fn focus_last(&self) {
        if let Some(item) = self.items.last() {
            item.focus();
        }
    }

    fn add_keyboard_handling(self: &Rc<Self>) -> Result<()> {
        let direction = self.base.locale().ui_language_direction();
        let moves: [(u32, fn(usize, usize, usize) -> usize); 4] = [
            (get_localized_arrow_key_code(ARROW_RIGHT, direction), right_index),
            (get_localized_arrow_key_code(ARROW_LEFT, direction), left_index),
            (ARROW_UP, up_index),
            (ARROW_DOWN, down_index),
        ];
        for (key, next_index) in moves {
            let weak: Weak<Self> = Rc::downgrade(self);
            self.keystrokes.set(key, KeystrokeOptions::default(), move |_, cancel| {
                let Some(grid) = weak.upgrade() else {
                    return;
                };
                let Some(focused) = grid.focus_tracker.focused_element() else {
                    return;
                };
                let Some(index) = grid.items.index_of_element(&focused) else {
                    return;
                };
                let next = next_index(index, grid.items.len(), grid.columns);
                if let Some(item) = grid.items.get(next) {
                    item.focus();
                }
                cancel();
            })?;
        }
        Ok(())
    }
}

fn right_index(index: usize, len: usize, _columns: usize) -> usize {
    if index + 1 >= len { 0 } else { index + 1 }
}

fn left_index(index: usize, len: usize, _columns: usize) -> usize {
    if index == 0 { len.saturating_sub(1) } else { index - 1 }
}

/// One row up; from the first row, the same column in the last row.
fn up_index(index: usize, len: usize, columns: usize) -> usize {
    if index >= columns {
        return index - columns;
    }
    let next = index + columns * (len / columns);
    if next >= len { next.saturating_sub(columns) } else { next }
}

/// One row down; from the last row, the same column in the first row.
fn down_index(index: usize, len: usize, columns: usize) -> usize {
    let next = index + columns;
    if next >= len { index % columns } else { next }
}

impl View for ColorGridView {
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
        self.items.to_vec().iter().any(|item| item.is_focusable())
    }

    /// Focus the first tile.
    fn focus(&self) {
        if let Some(item) = self.items.first() {
            item.focus();
        }
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

impl tessera_utils::HasOwnFocusTracker for ColorGridView {
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
    use tessera_utils::keyboard::KeyEventData;
    use tessera_utils::Locale;

    fn colors(n: usize) -> Vec<ColorDefinition> {
        (0..n).map(|i| ColorDefinition::new(&format!("#00000{i}"))).collect()
    }

    fn rendered_grid(context: &ViewContext, n: usize, columns: usize) -> Rc<ColorGridView> {
        let grid = ColorGridView::new(context, &colors(n), columns).unwrap();
        grid.render().unwrap();
        context.document.body().append_child(&grid.element().unwrap());
        grid
    }

    fn focused_index(context: &ViewContext, grid: &ColorGridView) -> Option<usize> {
        grid.items.index_of_element(&context.document.active_element()?)
    }

    #[test]
    fn definitions_read_from_config() {
        let parsed: Vec<ColorDefinition> = serde_json::from_value(serde_json::json!([
            "red",
            { "color": "hsl(0, 0%, 100%)", "label": "White", "hasBorder": true },
            { "color": "blue" }
        ]))
        .unwrap();
        assert_eq!(parsed[0], ColorDefinition::new("red"));
        assert_eq!(parsed[1].label, "White");
        assert!(parsed[1].has_border);
        assert_eq!(parsed[2].label, "blue");
    }

    #[test]
    fn tiles_render_their_color() {
        let context = ViewContext::default();
        let grid = ColorGridView::new(
            &context,
            &[ColorDefinition {
                has_border: true,
                ..ColorDefinition::labelled("#fff", "White")
            }],
            5,
        )
        .unwrap();
        grid.render().unwrap();

        let element = grid.element().unwrap();
        assert_eq!(
            element.get_attribute("style").as_deref(),
            Some("grid-template-columns: repeat(5, 1fr)")
        );
        let tile = grid.tiles()[0].element().unwrap();
        assert_eq!(tile.get_attribute("style").as_deref(), Some("background-color: #fff"));
        assert!(tile.has_class("ck-color-grid__tile"));
        assert!(tile.has_class("ck-color-selector__color-tile_bordered"));
        assert_eq!(tile.get_attribute("data-cke-tooltip-text").as_deref(), Some("White"));
    }

    #[test]
    fn clicking_a_tile_executes_with_its_color() {
        let context = ViewContext::default();
        let grid = rendered_grid(&context, 3, 3);
        let picks = Rc::new(RefCell::new(Vec::new()));
        {
            let picks = picks.clone();
            grid.base().emitter().on("execute", move |_: &mut EventInfo, pick: &ColorPick| {
                picks.borrow_mut().push(pick.value.clone());
            });
        }

        grid.tiles()[1].element().unwrap().click();
        assert_eq!(*picks.borrow(), vec![SmolStr::new("#000001")]);
    }

    #[test]
    fn selected_color_turns_the_tile_on() {
        let context = ViewContext::default();
        let grid = rendered_grid(&context, 3, 3);

        grid.selected_color.set(Some("#000002".into()));
        assert!(grid.tiles()[2].button().is_on.get());
        assert!(!grid.tiles()[0].button().is_on.get());

        grid.selected_color.set(None);
        assert!(!grid.tiles()[2].button().is_on.get());
    }

    #[test]
    fn arrows_move_through_rows_and_columns() {
        let context = ViewContext::default();
        // Two full rows of three and a last row with one tile.
        let grid = rendered_grid(&context, 7, 3);
        grid.focus();
        assert_eq!(focused_index(&context, &grid), Some(0));

        let press = |key| grid.keystrokes.press(&KeyEventData::new(key));
        assert!(press(ARROW_LEFT));
        assert_eq!(focused_index(&context, &grid), Some(6));
        assert!(press(ARROW_RIGHT));
        assert_eq!(focused_index(&context, &grid), Some(0));
        assert!(press(ARROW_DOWN));
        assert_eq!(focused_index(&context, &grid), Some(3));
        assert!(press(ARROW_RIGHT));
        assert!(press(ARROW_UP));
        assert_eq!(focused_index(&context, &grid), Some(1));
        assert!(press(ARROW_UP));
        assert_eq!(focused_index(&context, &grid), Some(4));
        assert!(press(ARROW_DOWN));
        assert_eq!(focused_index(&context, &grid), Some(1));
    }

    #[test]
    fn horizontal_arrows_are_mirrored_for_rtl() {
        let context = ViewContext {
            locale: Locale::new("ar", None),
            ..ViewContext::default()
        };
        let grid = rendered_grid(&context, 4, 4);
        grid.focus();

        grid.keystrokes.press(&KeyEventData::new(ARROW_LEFT));
        assert_eq!(focused_index(&context, &grid), Some(1));
    }

    #[test]
    fn index_helpers_wrap() {
        assert_eq!(up_index(0, 9, 3), 6);
        assert_eq!(up_index(2, 8, 3), 5);
        assert_eq!(down_index(7, 8, 3), 1);
        assert_eq!(left_index(0, 0, 3), 0);
    }
}
