//! Buttons.

use std::rc::Rc;

use smol_str::SmolStr;
use tessera_utils::keyboard::keystroke_text;
use tessera_utils::{DomListenOptions, Property};

use crate::template::{Bind, Template};
use crate::view::{View, ViewBase, ViewContext};

/// A clickable button. Fires `execute` when clicked while enabled.
pub struct ButtonView {
    base: ViewBase,
    pub label: Property<SmolStr>,
    pub is_enabled: Property<bool>,
    pub is_on: Property<bool>,
    pub is_visible: Property<bool>,
    /// Toggleable buttons expose `is_on` as `aria-pressed`.
    pub is_toggleable: Property<bool>,
    pub with_text: Property<bool>,
    /// Show the label (and keystroke) as a tooltip.
    pub tooltip: Property<bool>,
    pub keystroke: Property<Option<SmolStr>>,
    pub tab_index: Property<i32>,
    pub class: Property<Option<SmolStr>>,
    tooltip_text: Property<Option<String>>,
}

impl ButtonView {
    pub fn new(context: &ViewContext) -> Rc<Self> {
        let base = ViewBase::new(context);
        let emitter = base.emitter().clone();
        let button = Self {
            label: Property::new(&emitter, "label", SmolStr::default()),
            is_enabled: Property::new(&emitter, "isEnabled", true),
            is_on: Property::new(&emitter, "isOn", false),
            is_visible: Property::new(&emitter, "isVisible", true),
            is_toggleable: Property::new(&emitter, "isToggleable", false),
            with_text: Property::new(&emitter, "withText", false),
            tooltip: Property::new(&emitter, "tooltip", false),
            keystroke: Property::new(&emitter, "keystroke", None),
            tab_index: Property::new(&emitter, "tabindex", -1),
            class: Property::new(&emitter, "class", None),
            tooltip_text: Property::new(&emitter, "tooltipText", None),
            base,
        };

        {
            let (label, keystroke, tooltip) = (
                button.label.clone(),
                button.keystroke.clone(),
                button.tooltip.clone(),
            );
            let env = button.base.context().env;
            button.tooltip_text.bind_computed(
                &[
                    button.label.trigger(),
                    button.keystroke.trigger(),
                    button.tooltip.trigger(),
                ],
                move || {
                    if !tooltip.get() || label.with(SmolStr::is_empty) {
                        return None;
                    }
                    let mut text = label.get().to_string();
                    if let Some(keystroke) = keystroke.get() {
                        text.push_str(&format!(" ({})", keystroke_text(&keystroke, env)));
                    }
                    Some(text)
                },
            );
        }

        let is_toggleable = button.is_toggleable.clone();
        let is_enabled = button.is_enabled.clone();
        let target = emitter.downgrade();
        button.base.set_template(
            Template::new("button")
                .class("ck")
                .class("ck-button")
                .attr("class", Bind::unless(&button.is_enabled, "ck-disabled"))
                .attr("class", Bind::unless(&button.is_visible, "ck-hidden"))
                .attr("class", Bind::when(&button.is_on, "ck-on"))
                .attr("class", Bind::unless(&button.is_on, "ck-off"))
                .attr("class", Bind::when(&button.with_text, "ck-button_with-text"))
                .attr(
                    "class",
                    Bind::to_with(&button.class, |class| class.as_ref().map(|c| c.to_string())),
                )
                .attr("type", "button")
                .attr("tabindex", Bind::to(&button.tab_index))
                .attr("aria-disabled", Bind::unless(&button.is_enabled, "true"))
                .attr(
                    "aria-pressed",
                    Bind::to_with(&button.is_on, move |on| {
                        is_toggleable.get().then(|| on.to_string())
                    }),
                )
                .attr(
                    "data-cke-tooltip-text",
                    Bind::to_with(&button.tooltip_text, |text| text.clone()),
                )
                .child(
                    Template::new("span")
                        .class("ck")
                        .class("ck-button__label")
                        .text(Bind::to(&button.label)),
                )
                .on_dom("click", DomListenOptions::default(), move |event| {
                    if is_enabled.get() {
                        if let Some(target) = target.upgrade() {
                            target.fire("execute", &());
                        }
                    } else {
                        event.prevent_default();
                    }
                }),
        );
        Rc::new(button)
    }

    /// A button showing `label` as text.
    pub fn with_label(context: &ViewContext, label: &str) -> Rc<Self> {
        let button = Self::new(context);
        button.label.set(SmolStr::new(label));
        button.with_text.set(true);
        button
    }
}

impl View for ButtonView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn is_focusable(&self) -> bool {
        self.is_rendered() && self.is_enabled.get() && self.is_visible.get()
    }

    fn focus(&self) {
        if let Some(element) = self.element() {
            element.focus();
        }
    }
}
