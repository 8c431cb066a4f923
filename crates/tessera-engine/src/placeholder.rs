//! Placeholder text shown in empty editing roots.
//!
//! The text is exposed as `data-placeholder` on the host element, and the
//! host carries the `ck-placeholder` class while it needs to show it (empty,
//! and either unfocused or configured to keep the placeholder on focus).

use smol_str::SmolStr;
use tessera_utils::dom::Node;

use crate::view::EditingView;

#[derive(Clone)]
pub(crate) struct PlaceholderConfig {
    element: Node,
    text: SmolStr,
    keep_on_focus: bool,
}

/// Whether `element` should currently show its placeholder.
pub fn needs_placeholder(element: &Node, keep_on_focus: bool, is_view_focused: bool) -> bool {
    if !element.text_content().trim_matches('\u{a0}').trim().is_empty() {
        return false;
    }
    keep_on_focus || !is_view_focused || !element.is_focused()
}

impl EditingView {
    /// Show `text` in `element` whenever it is empty.
    pub fn enable_placeholder(&self, element: &Node, text: &str, keep_on_focus: bool) {
        element.set_attribute("data-placeholder", text);
        {
            let mut placeholders = self.inner().placeholders.borrow_mut();
            placeholders.retain(|config| config.element != *element);
            placeholders.push(PlaceholderConfig {
                element: element.clone(),
                text: SmolStr::new(text),
                keep_on_focus,
            });
        }
        self.update_placeholders();
    }

    pub fn disable_placeholder(&self, element: &Node) {
        let removed = {
            let mut placeholders = self.inner().placeholders.borrow_mut();
            let before = placeholders.len();
            placeholders.retain(|config| config.element != *element);
            placeholders.len() != before
        };
        if removed {
            element.remove_attribute("data-placeholder");
            element.remove_class("ck-placeholder");
        }
    }

    pub fn placeholder_text(&self, element: &Node) -> Option<SmolStr> {
        self.inner()
            .placeholders
            .borrow()
            .iter()
            .find(|config| config.element == *element)
            .map(|config| config.text.clone())
    }

    pub(crate) fn update_placeholders(&self) {
        let configs = self.inner().placeholders.borrow().clone();
        let is_focused = self.is_focused();
        for config in configs {
            let show = needs_placeholder(&config.element, config.keep_on_focus, is_focused);
            config.element.toggle_class("ck-placeholder", show);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::Conversion;
    use crate::model::{Model, ModelElement};
    use tessera_utils::Document;

    #[test]
    fn class_follows_content_and_focus() {
        let doc = Document::new();
        let editable = doc.create_element("div");
        doc.body().append_child(&editable);
        let view = EditingView::new(&doc);
        let model = Model::new();
        model.create_root("main");
        let conversion = Conversion::new();
        conversion.element_to_element("paragraph", "p");
        view.attach_dom_root(&editable, "main");

        view.enable_placeholder(&editable, "Type here", false);
        assert!(editable.has_class("ck-placeholder"));
        assert_eq!(editable.get_attribute("data-placeholder").as_deref(), Some("Type here"));

        editable.focus();
        assert!(!editable.has_class("ck-placeholder"));
        doc.body().focus();
        assert!(editable.has_class("ck-placeholder"));

        model.change(|writer| {
            writer
                .append("main", ModelElement::new("paragraph").with_text("x"))
                .unwrap()
        });
        view.render(&model, &conversion);
        assert!(!editable.has_class("ck-placeholder"));

        view.disable_placeholder(&editable);
        assert!(!editable.has_attribute("data-placeholder"));
    }
}
