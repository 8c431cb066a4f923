use std::rc::Rc;

use tessera_engine::EditingView;
use tessera_ui::{
    InlineEditableUIView, MenuBarView, ToolbarOptions, ToolbarView, View, ViewBase, ViewContext,
};
use tessera_utils::dom::Node;
use tessera_utils::{LanguageDirection, Result};

/// Options the decoupled editor builds its view with.
#[derive(Debug, Clone, Default)]
pub struct DecoupledViewOptions {
    /// A page element to host the editable instead of a new one.
    pub editable_element: Option<Node>,
    pub should_toolbar_group_when_full: bool,
    /// Accessible label of the editable.
    pub label: Option<String>,
}

/// The decoupled editor's view: a toolbar, a menu bar and an inline
/// editable. None of them is put into the page; the host inserts the
/// toolbar and menu bar elements where it wants them.
pub struct DecoupledEditorUIView {
    base: ViewBase,
    pub toolbar: Rc<ToolbarView>,
    pub menu_bar: Rc<MenuBarView>,
    pub editable: Rc<InlineEditableUIView>,
}

impl DecoupledEditorUIView {
    pub fn new(
        context: &ViewContext,
        editing_view: &EditingView,
        options: DecoupledViewOptions,
    ) -> Result<Rc<Self>> {
        let toolbar = ToolbarView::new(
            context,
            ToolbarOptions {
                should_group_when_full: options.should_toolbar_group_when_full,
            },
        )?;
        let menu_bar = MenuBarView::new(context)?;
        let editable = InlineEditableUIView::new(
            context,
            editing_view,
            options.editable_element.as_ref(),
            options.label.as_deref(),
        );

        let dir = match context.locale.ui_language_direction() {
            LanguageDirection::Ltr => "ltr",
            LanguageDirection::Rtl => "rtl",
        };
        for base in [toolbar.base(), menu_bar.base()] {
            base.extend_template(|template| {
                template
                    .class("ck-reset_all")
                    .class("ck-rounded-corners")
                    .attr("dir", dir)
            });
        }

        Ok(Rc::new(Self {
            base: ViewBase::new(context),
            toolbar,
            menu_bar,
            editable,
        }))
    }
}

impl View for DecoupledEditorUIView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn render(&self) -> Result<()> {
        self.base.render()?;
        self.base.register_child(self.menu_bar.clone())?;
        self.base.register_child(self.toolbar.clone())?;
        self.base.register_child(self.editable.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_utils::Locale;

    #[test]
    fn toolbar_and_menu_bar_follow_the_ui_direction() {
        let context = ViewContext {
            locale: Locale::new("ar", Some("en")),
            ..ViewContext::default()
        };
        let editing_view = EditingView::new(&context.document);
        let view =
            DecoupledEditorUIView::new(&context, &editing_view, DecoupledViewOptions::default())
                .unwrap();
        view.render().unwrap();

        let toolbar = view.toolbar.element().unwrap();
        assert!(toolbar.has_class("ck-reset_all"));
        assert!(toolbar.has_class("ck-rounded-corners"));
        assert_eq!(toolbar.get_attribute("dir").as_deref(), Some("rtl"));
        assert_eq!(view.menu_bar.element().unwrap().get_attribute("dir").as_deref(), Some("rtl"));
        assert_eq!(
            view.editable.element().unwrap().get_attribute("dir").as_deref(),
            Some("ltr")
        );
        // Nothing is attached to the page.
        assert!(!toolbar.is_connected());
    }

    #[test]
    fn grouping_follows_the_options() {
        let context = ViewContext::default();
        let editing_view = EditingView::new(&context.document);
        let options = DecoupledViewOptions {
            should_toolbar_group_when_full: true,
            ..DecoupledViewOptions::default()
        };
        let view = DecoupledEditorUIView::new(&context, &editing_view, options).unwrap();
        view.render().unwrap();
        assert!(view.toolbar.element().unwrap().has_class("ck-toolbar_grouping"));
    }
}
