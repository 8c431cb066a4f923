//! Editors created on an element of the page.
//!
//! The element's content is the initial data, the element is bound to the
//! editor for as long as it lives, and on destroy it may receive the final
//! data back.

use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::{Error, Result};

/// What an editor is created from.
#[derive(Debug, Clone)]
pub enum EditorSource {
    Element(Node),
    Data(String),
}

impl EditorSource {
    pub fn element(&self) -> Option<&Node> {
        match self {
            Self::Element(element) => Some(element),
            Self::Data(_) => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }
}

impl From<&Node> for EditorSource {
    fn from(element: &Node) -> Self {
        Self::Element(element.clone())
    }
}

impl From<Node> for EditorSource {
    fn from(element: Node) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for EditorSource {
    fn from(data: &str) -> Self {
        Self::Data(data.to_owned())
    }
}

impl From<String> for EditorSource {
    fn from(data: String) -> Self {
        Self::Data(data)
    }
}

pub fn get_data_from_element(element: &Node) -> String {
    element.inner_html()
}

pub fn set_data_in_element(element: &Node, data: &str) {
    element.set_inner_html(data);
}

/// Bind `element` to editor `editor_id`. Fails if another editor holds it.
pub fn secure_source_element(element: &Node, editor_id: u64) -> Result<()> {
    if element.editor_instance().is_some() {
        return Err(Error::SourceElementAlreadyUsed);
    }
    element.set_editor_instance(Some(editor_id));
    Ok(())
}

/// Release `element` if it is bound to editor `editor_id`.
pub fn release_source_element(element: &Node, editor_id: u64) {
    if element.editor_instance() == Some(editor_id) {
        element.set_editor_instance(None);
    }
}

/// Reject elements an editor flavor cannot be created on.
pub fn check_source_element(element: &Node, disallowed: &[&str]) -> Result<()> {
    let tag = element.local_name();
    if disallowed.iter().any(|name| name.eq_ignore_ascii_case(tag)) {
        return Err(Error::WrongElement {
            tag: SmolStr::new(tag),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_utils::{Document, ErrorKind};

    #[test]
    fn an_element_serves_one_editor_at_a_time() {
        let document = Document::new();
        let element = document.create_element("div");

        secure_source_element(&element, 1).unwrap();
        let err = secure_source_element(&element, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceElementAlreadyUsed);

        release_source_element(&element, 2);
        assert_eq!(element.editor_instance(), Some(1));
        release_source_element(&element, 1);
        secure_source_element(&element, 2).unwrap();
    }

    #[test]
    fn disallowed_tags_are_rejected() {
        let document = Document::new();
        let textarea = document.create_element("textarea");
        let err = check_source_element(&textarea, &["textarea"]).unwrap_err();
        assert_eq!(err.code(), "editor-wrong-element");
        assert!(check_source_element(&document.create_element("div"), &["textarea"]).is_ok());
    }

    #[test]
    fn data_round_trips_through_the_element() {
        let document = Document::new();
        let element = document.create_element("div");
        set_data_in_element(&element, "<p>foo</p>");
        assert_eq!(get_data_from_element(&element), "<p>foo</p>");
    }
}
