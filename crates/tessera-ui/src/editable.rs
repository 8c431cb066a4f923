//! Editable areas: the views hosting editing roots.
//!
//! An editable either creates its own element or adopts one that already
//! lives in the page. An adopted element gets the editable's classes and
//! attributes on render and loses them again on destroy.

use std::rc::Rc;

use smol_str::SmolStr;
use tessera_engine::EditingView;
use tessera_utils::dom::Node;
use tessera_utils::{LanguageDirection, Property, Result};

use crate::template::{Bind, Template};
use crate::view::{View, ViewBase, ViewContext};

fn direction_attr(direction: LanguageDirection) -> &'static str {
    match direction {
        LanguageDirection::Ltr => "ltr",
        LanguageDirection::Rtl => "rtl",
    }
}

pub struct EditableUIView {
    base: ViewBase,
    editing_view: EditingView,
    external_element: Option<Node>,
    /// Name of the model root this editable hosts.
    pub name: Property<SmolStr>,
    pub is_focused: Property<bool>,
    /// Mirrors the editing view's read-only state.
    pub is_read_only: Property<bool>,
}

impl EditableUIView {
    pub fn new(
        context: &ViewContext,
        editing_view: &EditingView,
        editable_element: Option<&Node>,
    ) -> Rc<Self> {
        let base = ViewBase::new(context);
        let emitter = base.emitter().clone();
        let editable = Self {
            name: Property::new(&emitter, "name", SmolStr::new_static("main")),
            is_focused: Property::new(&emitter, "isFocused", false),
            is_read_only: Property::new(&emitter, "isReadOnly", false),
            editing_view: editing_view.clone(),
            external_element: editable_element.cloned(),
            base,
        };
        editable
            .is_read_only
            .bind_to(editing_view.is_read_only_property());

        let locale = context.locale.clone();
        editable.base.set_template(
            Template::new("div")
                .class("ck")
                .class("ck-content")
                .class("ck-editor__editable")
                .class("ck-rounded-corners")
                .attr("class", Bind::when(&editable.is_focused, "ck-focused"))
                .attr("class", Bind::unless(&editable.is_focused, "ck-blurred"))
                .attr("class", Bind::when(&editable.is_read_only, "ck-read-only"))
                .attr("lang", locale.content_language())
                .attr("dir", direction_attr(locale.content_language_direction())),
        );
        Rc::new(editable)
    }

    pub fn editing_view(&self) -> &EditingView {
        &self.editing_view
    }

    /// Whether the element was supplied by the page rather than created.
    pub fn has_external_element(&self) -> bool {
        self.external_element.is_some()
    }
}

impl View for EditableUIView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn render(&self) -> Result<()> {
        match &self.external_element {
            Some(element) => self.base.adopt_element(element),
            None => self.base.render(),
        }
    }

    fn is_focusable(&self) -> bool {
        self.is_rendered()
    }

    fn focus(&self) {
        self.editing_view.focus();
    }
}

/// An editable shown in the flow of the page, labelled for assistive
/// technology with `aria-label`.
pub struct InlineEditableUIView {
    editable: Rc<EditableUIView>,
}

impl InlineEditableUIView {
    /// Without `label` the editable is announced as
    /// "Rich Text Editor. Editing area: <root name>".
    pub fn new(
        context: &ViewContext,
        editing_view: &EditingView,
        editable_element: Option<&Node>,
        label: Option<&str>,
    ) -> Rc<Self> {
        let editable = EditableUIView::new(context, editing_view, editable_element);
        let locale = context.locale.clone();
        let label = label.map(str::to_owned);
        let name = editable.name.clone();
        editable.base().extend_template(move |template| {
            template
                .class("ck-editor__editable_inline")
                .attr("role", "textbox")
                .attr(
                    "aria-label",
                    Bind::to_with(&name, move |name| {
                        Some(label.clone().unwrap_or_else(|| {
                            locale.t("Rich Text Editor. Editing area: %0", &[name.as_str()])
                        }))
                    }),
                )
        });
        Rc::new(Self { editable })
    }

    pub fn editable(&self) -> &Rc<EditableUIView> {
        &self.editable
    }
}

impl std::ops::Deref for InlineEditableUIView {
    type Target = EditableUIView;

    fn deref(&self) -> &EditableUIView {
        &self.editable
    }
}

impl View for InlineEditableUIView {
    fn base(&self) -> &ViewBase {
        self.editable.base()
    }

    fn render(&self) -> Result<()> {
        self.editable.render()
    }

    fn is_focusable(&self) -> bool {
        self.editable.is_focusable()
    }

    fn focus(&self) {
        self.editable.focus();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_utils::Locale;

    #[test]
    fn renders_its_own_element() {
        let context = ViewContext::default();
        let editing_view = EditingView::new(&context.document);
        let editable = InlineEditableUIView::new(&context, &editing_view, None, None);
        editable.render().unwrap();

        insta::assert_snapshot!(
            editable.element().unwrap().outer_html(),
            @r#"<div class="ck ck-content ck-editor__editable ck-rounded-corners ck-blurred ck-editor__editable_inline" lang="en" dir="ltr" role="textbox" aria-label="Rich Text Editor. Editing area: main"></div>"#
        );
        assert!(!editable.has_external_element());
    }

    #[test]
    fn focus_and_read_only_classes_follow_state() {
        let context = ViewContext::default();
        let editing_view = EditingView::new(&context.document);
        let editable = EditableUIView::new(&context, &editing_view, None);
        editable.render().unwrap();
        let element = editable.element().unwrap();

        editable.is_focused.set(true);
        assert!(element.has_class("ck-focused"));
        assert!(!element.has_class("ck-blurred"));

        editing_view.is_read_only_property().set(true);
        assert!(editable.is_read_only.get());
        assert!(element.has_class("ck-read-only"));
    }

    #[test]
    fn adopted_element_is_restored_on_destroy() {
        let context = ViewContext::default();
        let editing_view = EditingView::new(&context.document);
        let host = context.document.create_element("div");
        host.set_attribute("id", "editor");
        let editable =
            InlineEditableUIView::new(&context, &editing_view, Some(&host), Some("Article body"));

        editable.render().unwrap();
        assert_eq!(editable.element(), Some(host.clone()));
        assert!(editable.has_external_element());
        assert_eq!(host.get_attribute("aria-label").as_deref(), Some("Article body"));
        assert!(host.has_class("ck-editor__editable"));

        editable.destroy();
        assert_eq!(host.outer_html(), r#"<div id="editor"></div>"#);
    }

    #[test]
    fn label_follows_the_root_name_and_content_language() {
        let context = ViewContext {
            locale: Locale::new("en", Some("ar")),
            ..ViewContext::default()
        };
        let editing_view = EditingView::new(&context.document);
        let editable = InlineEditableUIView::new(&context, &editing_view, None, None);
        editable.name.set("sidebar".into());
        editable.render().unwrap();

        let element = editable.element().unwrap();
        assert_eq!(
            element.get_attribute("aria-label").as_deref(),
            Some("Rich Text Editor. Editing area: sidebar")
        );
        assert_eq!(element.get_attribute("dir").as_deref(), Some("rtl"));
        assert_eq!(element.get_attribute("lang").as_deref(), Some("ar"));
    }
}
