//! Mapping between model elements and DOM elements.
//!
//! Features register one-to-one element mappings. Downcast renders a model
//! subtree into DOM nodes; upcast reads DOM nodes back into the model,
//! unwrapping unknown elements and wrapping loose text in the schema's
//! default block.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use smol_str::SmolStr;
use tessera_utils::Document;
use tessera_utils::dom::{Node, NodeKind};

use crate::model::{ModelElement, ModelNode};
use crate::schema::Schema;

/// How empty blocks are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBlock {
    /// Leave the element empty (editing view).
    Empty,
    /// Fill with a non-breaking space so the block survives a round trip
    /// through plain HTML (data output).
    Nbsp,
}

#[derive(Clone, Default)]
pub struct Conversion {
    inner: Rc<RefCell<ConversionInner>>,
}

#[derive(Default)]
struct ConversionInner {
    to_view: HashMap<SmolStr, SmolStr>,
    to_model: HashMap<SmolStr, SmolStr>,
}

impl Conversion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map model element `model` to DOM tag `view` in both directions.
    pub fn element_to_element(&self, model: &str, view: &str) {
        let mut inner = self.inner.borrow_mut();
        inner
            .to_view
            .insert(SmolStr::new(model), SmolStr::new(view));
        inner
            .to_model
            .insert(SmolStr::new(view.to_ascii_lowercase()), SmolStr::new(model));
    }

    pub fn view_name(&self, model: &str) -> Option<SmolStr> {
        self.inner.borrow().to_view.get(model).cloned()
    }

    pub fn model_name(&self, view: &str) -> Option<SmolStr> {
        self.inner.borrow().to_model.get(view).cloned()
    }

    /// Render the children of `element` into `into`, replacing its content.
    pub fn downcast_children(
        &self,
        element: &ModelElement,
        document: &Document,
        into: &Node,
        empty: EmptyBlock,
    ) {
        into.clear_children();
        for child in &element.children {
            if let Some(node) = self.downcast(child, document, empty) {
                into.append_child(&node);
            }
        }
    }

    fn downcast(&self, node: &ModelNode, document: &Document, empty: EmptyBlock) -> Option<Node> {
        match node {
            ModelNode::Text(text) => Some(document.create_text_node(text)),
            ModelNode::Element(element) => {
                let Some(tag) = self.view_name(&element.name) else {
                    tracing::warn!(element = %element.name, "no view conversion for model element");
                    return None;
                };
                let view = document.create_element(&tag);
                if element.children.is_empty() && empty == EmptyBlock::Nbsp {
                    view.append_child(&document.create_text_node("\u{a0}"));
                }
                for child in &element.children {
                    if let Some(child) = self.downcast(child, document, empty) {
                        view.append_child(&child);
                    }
                }
                Some(view)
            }
        }
    }

    /// Read DOM nodes into model nodes.
    pub fn upcast(&self, nodes: &[Node], schema: &Schema) -> Vec<ModelNode> {
        let mut converted = Vec::new();
        for node in nodes {
            self.upcast_node(node, &mut converted);
        }
        autoparagraph(converted, schema)
    }

    fn upcast_node(&self, node: &Node, out: &mut Vec<ModelNode>) {
        match node.kind() {
            NodeKind::Text => {
                let text = node.text_content();
                if !text.trim().is_empty() {
                    push_text(out, &text);
                }
            }
            NodeKind::Element => match self.model_name(node.local_name()) {
                Some(name) => {
                    let mut element = ModelElement::new(&name);
                    for child in node.children() {
                        self.upcast_node(&child, &mut element.children);
                    }
                    // `&nbsp;` fillers of empty blocks.
                    if element.text_content().trim_matches('\u{a0}').is_empty() {
                        element.children.clear();
                    }
                    out.push(ModelNode::Element(element));
                }
                None => {
                    for child in node.children() {
                        self.upcast_node(&child, out);
                    }
                }
            },
            NodeKind::Document | NodeKind::Window => {}
        }
    }
}

fn push_text(out: &mut Vec<ModelNode>, text: &str) {
    if let Some(ModelNode::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(ModelNode::text(text));
    }
}

/// Wrap top-level text runs in the default block, if there is one. Without a
/// default block loose text cannot live in a root and is dropped.
fn autoparagraph(nodes: Vec<ModelNode>, schema: &Schema) -> Vec<ModelNode> {
    let default_block = schema.default_block();
    nodes
        .into_iter()
        .filter_map(|node| match node {
            ModelNode::Text(text) => match &default_block {
                Some(block) => Some(ModelNode::Element(
                    ModelElement::new(block).with_text(text.trim()),
                )),
                None => {
                    tracing::debug!(text = %text, "dropping text outside of any block");
                    None
                }
            },
            element => Some(element),
        })
        .collect()
}
