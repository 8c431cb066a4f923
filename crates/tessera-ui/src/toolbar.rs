//! Toolbars.
//!
//! A [`ToolbarView`] owns its items, a focus tracker following every item
//! and a keystroke handler on its element: arrow keys move focus among the
//! items (mirrored for right-to-left UI languages) and wrap at the ends.

use std::rc::Rc;

use serde::Deserialize;
use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::keyboard::{
    ARROW_DOWN, ARROW_LEFT, ARROW_RIGHT, ARROW_UP, get_localized_arrow_key_code,
};
use tessera_utils::{
    DomListenOptions, EventInfo, FocusTracker, Keystroke, KeystrokeHandler, Property, Result,
};

use crate::component_factory::ComponentFactory;
use crate::focus_cycler::{FocusCycler, FocusCyclerActions};
use crate::template::{Bind, Template};
use crate::view::{TemplateView, View, ViewBase, ViewContext};
use crate::view_collection::{CollectionChange, ViewCollection};

/// Normalized `toolbar` configuration. Accepts either a list of item names
/// or an object with `items`, `removeItems` and `shouldNotGroupWhenFull`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawToolbarConfig")]
pub struct ToolbarConfig {
    pub items: Vec<String>,
    pub remove_items: Vec<String>,
    pub should_not_group_when_full: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawToolbarConfig {
    Items(Vec<String>),
    #[serde(rename_all = "camelCase")]
    Full {
        #[serde(default)]
        items: Vec<String>,
        #[serde(default)]
        remove_items: Vec<String>,
        #[serde(default)]
        should_not_group_when_full: bool,
    },
}

impl From<RawToolbarConfig> for ToolbarConfig {
    fn from(raw: RawToolbarConfig) -> Self {
        match raw {
            RawToolbarConfig::Items(items) => Self {
                items,
                ..Self::default()
            },
            RawToolbarConfig::Full {
                items,
                remove_items,
                should_not_group_when_full,
            } => Self {
                items,
                remove_items,
                should_not_group_when_full,
            },
        }
    }
}

impl ToolbarConfig {
    /// Read a config value; anything unreadable yields an empty toolbar.
    pub fn from_value(value: Option<&serde_json::Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring malformed toolbar configuration");
            Self::default()
        })
    }

    /// Item names left after `removeItems`.
    pub fn effective_items(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .map(String::as_str)
            .filter(|item| !self.remove_items.iter().any(|removed| removed == item))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ToolbarOptions {
    /// Collapse items that do not fit into an overflow group.
    pub should_group_when_full: bool,
}

pub struct ToolbarView {
    base: ViewBase,
    pub items: ViewCollection,
    pub focus_tracker: FocusTracker,
    pub keystrokes: KeystrokeHandler,
    pub aria_label: Property<SmolStr>,
    pub is_vertical: Property<bool>,
    pub is_grouping: Property<bool>,
    pub class: Property<Option<SmolStr>>,
    focus_cycler: FocusCycler,
}

impl ToolbarView {
    pub fn new(context: &ViewContext, options: ToolbarOptions) -> Result<Rc<Self>> {
        let base = ViewBase::new(context);
        let emitter = base.emitter().clone();
        let items = base.create_collection();
        let focus_tracker = FocusTracker::new();
        let keystrokes = KeystrokeHandler::with_env(context.env);

        let direction = context.locale.ui_language_direction();
        let arrow = |code| Keystroke::Code(get_localized_arrow_key_code(code, direction));
        let focus_cycler = FocusCycler::new(
            &items,
            &focus_tracker,
            Some(&keystrokes),
            FocusCyclerActions {
                focus_previous: vec![arrow(ARROW_LEFT), Keystroke::Code(ARROW_UP)],
                focus_next: vec![arrow(ARROW_RIGHT), Keystroke::Code(ARROW_DOWN)],
            },
        )?;

        let toolbar = Self {
            aria_label: Property::new(
                &emitter,
                "ariaLabel",
                SmolStr::new(context.t("Editor toolbar")),
            ),
            is_vertical: Property::new(&emitter, "isVertical", false),
            is_grouping: Property::new(&emitter, "isGrouping", options.should_group_when_full),
            class: Property::new(&emitter, "class", None),
            base,
            items,
            focus_tracker,
            keystrokes,
            focus_cycler,
        };

        toolbar.base.set_template(
            Template::new("div")
                .class("ck")
                .class("ck-toolbar")
                .attr("class", Bind::when(&toolbar.is_vertical, "ck-toolbar_vertical"))
                .attr("class", Bind::when(&toolbar.is_grouping, "ck-toolbar_grouping"))
                .attr(
                    "class",
                    Bind::to_with(&toolbar.class, |class| class.as_ref().map(|c| c.to_string())),
                )
                .attr("role", "toolbar")
                .attr("aria-label", Bind::to(&toolbar.aria_label))
                .child(
                    Template::new("div")
                        .class("ck")
                        .class("ck-toolbar__items")
                        .collection(&toolbar.items),
                ),
        );

        let (tracker, items) = (toolbar.focus_tracker.clone(), toolbar.items.clone());
        emitter.listen_to(
            toolbar.items.emitter(),
            "add",
            move |_: &mut EventInfo, change: &CollectionChange| {
                // Items of an unrendered toolbar are tracked once it renders.
                if items.parent().is_some() {
                    if let Err(err) = tracker.add(change.view.trackable()) {
                        tracing::warn!(%err, "toolbar item could not be tracked");
                    }
                }
            },
        );
        let tracker = toolbar.focus_tracker.clone();
        emitter.listen_to(
            toolbar.items.emitter(),
            "remove",
            move |_: &mut EventInfo, change: &CollectionChange| {
                tracker.remove(change.view.trackable());
            },
        );

        Ok(Rc::new(toolbar))
    }

    pub fn focus_cycler(&self) -> &FocusCycler {
        &self.focus_cycler
    }

    /// Focus the last focusable item.
    pub fn focus_last(&self) {
        self.focus_cycler.focus_last();
    }

    /// Populate the toolbar from config. `|` adds a separator and `-` a
    /// line break; names the factory does not know are skipped.
    pub fn fill_from_config(
        &self,
        config: &ToolbarConfig,
        factory: &ComponentFactory,
    ) -> Result<()> {
        let context = self.base.context();
        for name in config.effective_items() {
            let item: Rc<dyn View> = match name {
                "|" => separator(context),
                "-" => line_break(context),
                name if factory.has(name) => factory.create(name)?,
                name => {
                    tracing::warn!(item = name, "toolbar item is unavailable");
                    continue;
                }
            };
            self.items.add(item)?;
        }
        Ok(())
    }
}

fn separator(context: &ViewContext) -> Rc<dyn View> {
    TemplateView::with_template(
        context,
        Template::new("span").class("ck").class("ck-toolbar__separator"),
    )
}

fn line_break(context: &ViewContext) -> Rc<dyn View> {
    TemplateView::with_template(
        context,
        Template::new("span").class("ck").class("ck-toolbar__line-break"),
    )
}

impl View for ToolbarView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn render(&self) -> Result<()> {
        self.base.render()?;
        for item in self.items.to_vec() {
            self.focus_tracker.add(item.trackable())?;
        }
        if let Some(element) = self.base.element() {
            // Bubbling, so widgets nested inside handle their keys first.
            self.keystrokes.listen_to_dom_with(&element, DomListenOptions::default());
        }
        Ok(())
    }

    fn is_focusable(&self) -> bool {
        self.is_rendered() && self.focus_cycler.first().is_some()
    }

    /// Focus the first focusable item.
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

impl tessera_utils::HasOwnFocusTracker for ToolbarView {
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
    use crate::button::ButtonView;
    use tessera_utils::keyboard::KeyEventData;
    use tessera_utils::{Env, LanguageDirection, Locale};

    fn factory(context: &ViewContext) -> ComponentFactory {
        let factory = ComponentFactory::new(context);
        for name in ["bold", "italic", "link"] {
            factory
                .add(name, move |context| Ok(ButtonView::with_label(context, name)))
                .unwrap();
        }
        factory
    }

    #[test]
    fn config_accepts_both_shapes() {
        let list = ToolbarConfig::from_value(Some(&serde_json::json!(["bold", "|", "italic"])));
        assert_eq!(list.items, vec!["bold", "|", "italic"]);
        assert!(!list.should_not_group_when_full);

        let object = ToolbarConfig::from_value(Some(&serde_json::json!({
            "items": ["bold", "italic"],
            "removeItems": ["italic"],
            "shouldNotGroupWhenFull": true
        })));
        assert!(object.should_not_group_when_full);
        assert_eq!(object.effective_items().collect::<Vec<_>>(), vec!["bold"]);

        assert_eq!(ToolbarConfig::from_value(None), ToolbarConfig::default());
    }

    #[test]
    fn fills_from_config_and_skips_unknown_items() {
        let context = ViewContext::default();
        let toolbar = ToolbarView::new(&context, ToolbarOptions::default()).unwrap();
        let config = ToolbarConfig {
            items: ["bold", "|", "missing", "-", "italic"].map(String::from).to_vec(),
            ..ToolbarConfig::default()
        };

        toolbar.fill_from_config(&config, &factory(&context)).unwrap();
        toolbar.render().unwrap();

        let html = toolbar.element().unwrap().outer_html();
        assert!(html.starts_with(
            r#"<div class="ck ck-toolbar" role="toolbar" aria-label="Editor toolbar">"#
        ));
        assert_eq!(toolbar.items.len(), 4);
        assert!(html.contains("ck-toolbar__separator"));
        assert!(html.contains("ck-toolbar__line-break"));
    }

    #[test]
    fn grouping_follows_the_option() {
        let context = ViewContext::default();
        let options = ToolbarOptions {
            should_group_when_full: true,
        };
        let toolbar = ToolbarView::new(&context, options).unwrap();
        toolbar.render().unwrap();
        assert!(toolbar.element().unwrap().has_class("ck-toolbar_grouping"));
        toolbar.is_grouping.set(false);
        assert!(!toolbar.element().unwrap().has_class("ck-toolbar_grouping"));
    }

    fn rendered_toolbar(context: &ViewContext) -> Rc<ToolbarView> {
        let toolbar = ToolbarView::new(context, ToolbarOptions::default()).unwrap();
        let config = ToolbarConfig {
            items: ["bold", "|", "italic", "link"].map(String::from).to_vec(),
            ..ToolbarConfig::default()
        };
        toolbar.fill_from_config(&config, &factory(context)).unwrap();
        toolbar.render().unwrap();
        context.document.body().append_child(&toolbar.element().unwrap());
        toolbar
    }

    fn focused_label(context: &ViewContext) -> String {
        context.document.active_element().map(|el| el.text_content()).unwrap_or_default()
    }

    #[test]
    fn arrows_cycle_over_items_skipping_separators() {
        let context = ViewContext {
            env: Env::other(),
            ..ViewContext::default()
        };
        let toolbar = rendered_toolbar(&context);

        toolbar.focus();
        assert_eq!(focused_label(&context), "bold");
        assert!(toolbar.focus_tracker.is_focused());

        let element = toolbar.element().unwrap();
        let active = context.document.active_element().unwrap();
        active.dispatch_event(&KeyEventData::new(ARROW_RIGHT).to_dom_event("keydown"));
        assert_eq!(focused_label(&context), "italic");
        toolbar.keystrokes.press(&KeyEventData::new(ARROW_DOWN));
        assert_eq!(focused_label(&context), "link");
        toolbar.keystrokes.press(&KeyEventData::new(ARROW_RIGHT));
        assert_eq!(focused_label(&context), "bold");
        toolbar.keystrokes.press(&KeyEventData::new(ARROW_LEFT));
        assert_eq!(focused_label(&context), "link");
        assert!(element.contains(&context.document.active_element().unwrap()));
    }

    #[test]
    fn right_to_left_mirrors_horizontal_arrows() {
        let context = ViewContext {
            locale: Locale::new("ar", None),
            env: Env::other(),
            ..ViewContext::default()
        };
        assert_eq!(context.locale.ui_language_direction(), LanguageDirection::Rtl);
        let toolbar = rendered_toolbar(&context);

        toolbar.focus();
        toolbar.keystrokes.press(&KeyEventData::new(ARROW_LEFT));
        assert_eq!(focused_label(&context), "italic");
        toolbar.keystrokes.press(&KeyEventData::new(ARROW_RIGHT));
        assert_eq!(focused_label(&context), "bold");
    }

    #[test]
    fn items_added_after_render_are_tracked() {
        let context = ViewContext::default();
        let toolbar = rendered_toolbar(&context);
        let late = ButtonView::with_label(&context, "late");
        toolbar.items.add(late.clone()).unwrap();

        late.focus();
        assert_eq!(toolbar.focus_tracker.focused_element(), late.element());

        toolbar.items.remove(&*late);
        assert!(!toolbar.focus_tracker.elements().contains(&late.element().unwrap()));
    }
}
