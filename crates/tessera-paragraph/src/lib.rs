//! The paragraph feature.
//!
//! Registers the `paragraph` block (the default block of the schema, so
//! loose text gets wrapped in it), converts it to and from `<p>`, and adds
//! the `paragraph` command together with a toolbar button of the same name.

use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use tessera_core::{Command, CommandBase, Editor, Plugin, PluginConstructor, WeakEditor};
use tessera_engine::{Model, ModelNode, SchemaItem};
use tessera_ui::{ButtonView, View, ViewContext};
use tessera_utils::{Error, EventInfo, Result, SmolStr};

pub const PARAGRAPH: &str = "paragraph";

/// Turns the selected block into a paragraph. `value` is `true` while the
/// selected block already is one.
pub struct ParagraphCommand {
    base: CommandBase,
    model: Model,
}

impl ParagraphCommand {
    pub fn new(model: &Model) -> Self {
        Self {
            base: CommandBase::new(),
            model: model.clone(),
        }
    }

    /// Name of the top-level block the selection is in.
    fn selected_block(&self) -> Option<SmolStr> {
        let selection = self.model.selection()?;
        let root = self.model.root(&selection.root)?;
        match root.children.get(selection.index)? {
            ModelNode::Element(element) => Some(element.name.clone()),
            ModelNode::Text(_) => None,
        }
    }
}

impl Command for ParagraphCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn refresh(&self) {
        let block = self.selected_block();
        let is_block = block
            .as_deref()
            .is_some_and(|name| self.model.schema().is_block(name));
        self.base
            .value
            .set(Value::Bool(block.as_deref() == Some(PARAGRAPH)));
        self.base.is_enabled.set(is_block);
    }

    fn execute(&self, _options: &Value) -> Result<()> {
        let Some(selection) = self.model.selection() else {
            return Ok(());
        };
        if self.selected_block().as_deref() == Some(PARAGRAPH) {
            return Ok(());
        }
        let renamed = self
            .model
            .change(|writer| writer.rename(&selection.root, selection.index, PARAGRAPH))?;
        if !renamed {
            tracing::debug!(
                root = %selection.root,
                index = selection.index,
                "nothing to turn into a paragraph"
            );
        }
        self.refresh();
        Ok(())
    }
}

pub struct Paragraph {
    editor: WeakEditor,
}

impl PluginConstructor for Paragraph {
    const NAME: &'static str = "Paragraph";

    fn new(editor: &Editor) -> Result<Self> {
        let schema = editor.model().schema();
        schema.register(PARAGRAPH, SchemaItem::block());
        schema.set_default_block(PARAGRAPH);
        editor.conversion().element_to_element(PARAGRAPH, "p");
        editor
            .commands()
            .add(PARAGRAPH, Rc::new(ParagraphCommand::new(editor.model())));
        Ok(Self {
            editor: editor.downgrade(),
        })
    }
}

impl Plugin for Paragraph {
    fn init<'a>(&'a self, editor: &'a Editor) -> LocalBoxFuture<'a, Result<()>> {
        let weak = self.editor.clone();
        let registered = editor
            .ui()
            .component_factory()
            .add(PARAGRAPH, move |context| paragraph_button(&weak, context));
        futures_util::future::ready(registered).boxed_local()
    }
}

fn paragraph_button(editor: &WeakEditor, context: &ViewContext) -> Result<Rc<dyn View>> {
    let live = editor.upgrade().ok_or(Error::EditorDestroyed)?;
    let command = live.commands().get(PARAGRAPH).ok_or_else(|| Error::CommandNotFound {
        name: SmolStr::new(PARAGRAPH),
    })?;

    let button = ButtonView::with_label(context, &context.t("Paragraph"));
    button.is_toggleable.set(true);
    button
        .is_on
        .bind_to_with(&command.base().value, |value: &Value| value == &Value::Bool(true));
    button.is_enabled.bind_to(&command.base().is_enabled);

    let editor = editor.clone();
    button
        .base()
        .emitter()
        .on("execute", move |_: &mut EventInfo, _: &()| {
            let Some(editor) = editor.upgrade() else {
                return;
            };
            if let Err(err) = editor.execute(PARAGRAPH, &Value::Null) {
                tracing::warn!(%err, "paragraph button failed");
            }
            editor.focus();
        });
    Ok(button)
}
