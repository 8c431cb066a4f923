//! Reading and writing editor data as HTML.

use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::{Document, Emitter, Error, ListenOptions, Priority, Result};

use crate::conversion::{Conversion, EmptyBlock};
use crate::model::{Model, ModelElement};

/// Parses HTML into DOM nodes and serializes them back, using a document
/// separate from the one the editor renders into.
#[derive(Clone, Debug, Default)]
pub struct HtmlDataProcessor {
    document: Document,
}

impl HtmlDataProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn to_view(&self, data: &str) -> Vec<Node> {
        self.document.parse_fragment(data)
    }

    pub fn to_data(&self, nodes: &[Node]) -> String {
        nodes.iter().map(Node::outer_html).collect()
    }
}

/// Whether [`DataController::get_with`] reports an empty root as `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trim {
    #[default]
    Empty,
    None,
}

/// The data pipeline: HTML in, model, HTML out.
///
/// Fires `init` and then `ready` on its emitter when the initial data has
/// been loaded.
#[derive(Clone)]
pub struct DataController {
    inner: Rc<DataInner>,
}

struct DataInner {
    emitter: Emitter,
    model: Model,
    conversion: Conversion,
    processor: HtmlDataProcessor,
}

impl DataController {
    pub fn new(model: &Model, conversion: &Conversion) -> Self {
        let emitter = Emitter::new();
        {
            let relay = emitter.downgrade();
            emitter.on_with(
                "init",
                ListenOptions::priority(Priority::Lowest),
                move |_: &mut tessera_utils::EventInfo, _: &()| {
                    if let Some(emitter) = relay.upgrade() {
                        emitter.fire("ready", &());
                    }
                },
            );
        }
        Self {
            inner: Rc::new(DataInner {
                emitter,
                model: model.clone(),
                conversion: conversion.clone(),
                processor: HtmlDataProcessor::new(),
            }),
        }
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn processor(&self) -> &HtmlDataProcessor {
        &self.inner.processor
    }

    /// Load initial data. Every named root must exist and still be empty.
    pub fn init<'a>(&self, data: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<()> {
        let data: Vec<(&str, &str)> = data.into_iter().collect();
        for (root, _) in &data {
            if !self.inner.model.is_root_empty(root)? {
                return Err(Error::DataNotInitialized);
            }
        }

        let converted: Vec<_> = data
            .iter()
            .map(|(root, html)| (*root, self.to_model(html)))
            .collect();
        self.inner.model.change(|writer| {
            converted
                .into_iter()
                .try_for_each(|(root, children)| writer.set_root_children(root, children))
        })?;

        tracing::debug!(roots = data.len(), "data initialized");
        self.inner.emitter.fire("init", &());
        Ok(())
    }

    /// Replace the content of the named roots.
    pub fn set<'a>(&self, data: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<()> {
        let converted = data
            .into_iter()
            .map(|(root, html)| {
                if self.inner.model.has_root(root) {
                    Ok((root, self.to_model(html)))
                } else {
                    Err(Error::RootNotFound {
                        root: SmolStr::new(root),
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        self.inner.model.change(|writer| {
            converted
                .into_iter()
                .try_for_each(|(root, children)| writer.set_root_children(root, children))
        })?;
        self.inner.emitter.fire("set", &());
        Ok(())
    }

    /// Data of a root. An empty root yields `""`.
    pub fn get(&self, root: &str) -> Result<String> {
        self.get_with(root, Trim::Empty)
    }

    pub fn get_with(&self, root: &str, trim: Trim) -> Result<String> {
        let element = self.inner.model.root(root).ok_or_else(|| Error::RootNotFound {
            root: SmolStr::new(root),
        })?;
        if trim == Trim::Empty && element.is_empty() {
            return Ok(String::new());
        }
        Ok(self.stringify(&element))
    }

    /// Serialize a model element's children to HTML.
    pub fn stringify(&self, element: &ModelElement) -> String {
        let document = self.inner.processor.document();
        let container = document.create_element("div");
        self.inner
            .conversion
            .downcast_children(element, document, &container, EmptyBlock::Nbsp);
        container.inner_html()
    }

    pub fn to_model(&self, data: &str) -> Vec<crate::model::ModelNode> {
        let nodes = self.inner.processor.to_view(data);
        self.inner
            .conversion
            .upcast(&nodes, self.inner.model.schema())
    }

    pub fn destroy(&self) {
        self.inner.emitter.stop_listening(None, None, None);
    }
}

impl fmt::Debug for DataController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataController")
            .field("model", &self.inner.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::schema::SchemaItem;
    use tessera_utils::{ErrorKind, EventInfo};

    fn setup() -> (Model, DataController) {
        let model = Model::new();
        model.create_root("main");
        model.schema().register("paragraph", SchemaItem::block());
        model.schema().set_default_block("paragraph");
        let conversion = Conversion::new();
        conversion.element_to_element("paragraph", "p");
        let data = DataController::new(&model, &conversion);
        (model, data)
    }

    #[test]
    fn init_then_get_round_trips_and_fires_ready_last() {
        let (_model, data) = setup();
        let events = std::rc::Rc::new(RefCell::new(Vec::new()));
        for event in ["init", "ready"] {
            let events = events.clone();
            data.emitter().on(event, move |info: &mut EventInfo, _: &()| {
                events.borrow_mut().push(info.name().to_owned())
            });
        }

        data.init([("main", "<p>hello</p>")]).unwrap();

        assert_eq!(data.get("main").unwrap(), "<p>hello</p>");
        assert_eq!(*events.borrow(), vec!["init", "ready"]);
    }

    #[test]
    fn init_requires_an_empty_existing_root() {
        let (_model, data) = setup();
        let missing = data.init([("aside", "<p>x</p>")]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::RootNotFound);

        data.init([("main", "<p>x</p>")]).unwrap();
        let twice = data.init([("main", "<p>y</p>")]).unwrap_err();
        assert_eq!(twice.code(), "datacontroller-init-document-not-empty");
    }

    #[test]
    fn empty_content_trims_to_empty_string() {
        let (_model, data) = setup();
        data.set([("main", "<p></p>")]).unwrap();
        assert_eq!(data.get("main").unwrap(), "");
        assert_eq!(data.get_with("main", Trim::None).unwrap(), "<p>&nbsp;</p>");
    }

    #[test]
    fn set_replaces_content() {
        let (model, data) = setup();
        data.init([("main", "<p>a</p>")]).unwrap();
        data.set([("main", "<p>b</p><p>c</p>")]).unwrap();
        assert_eq!(data.get("main").unwrap(), "<p>b</p><p>c</p>");
        assert_eq!(model.version(), 2);
    }
}
