//! Lifecycle scenarios of the decoupled editor: creation order, constructor
//! validation, destroy write-back and keyboard access to the toolbar.

use std::cell::RefCell;
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use serde_json::{Value, json};
use tessera_core::{Editor, EditorConfig, EditorState, Plugin, PluginConstructor, PluginDefinition};
use tessera_editor_decoupled::DecoupledEditor;
use tessera_engine::ModelPosition;
use tessera_paragraph::Paragraph;
use tessera_ui::View;
use tessera_utils::keyboard::{ESC, KeyEventData};
use tessera_utils::{Document, Env, Error, ErrorKind, EventInfo, SmolStr};

fn config(values: Value) -> EditorConfig {
    tessera_utils::init_tracing();
    EditorConfig::new(values)
        .with_plugins([PluginDefinition::of::<Paragraph>()])
        .with_env(Env::other())
}

fn source_element(document: &Document, html: &str) -> tessera_utils::Node {
    let element = document.create_element("div");
    element.set_inner_html(html);
    document.body().append_child(&element);
    element
}

#[tokio::test]
async fn creation_fires_ready_in_order() {
    let document = Document::new();
    let editor = DecoupledEditor::new(&document, "<p>hello</p>", config(Value::Null)).unwrap();

    let fired = Rc::new(RefCell::new(Vec::new()));
    let record = |emitter: &tessera_utils::Emitter, name: &'static str| {
        let fired = fired.clone();
        emitter.on("ready", move |_: &mut EventInfo, _: &()| fired.borrow_mut().push(name));
    };
    record(editor.ui().emitter(), "ui:ready");
    record(editor.data().emitter(), "data:ready");
    record(editor.emitter(), "editor:ready");

    editor.initialize().await.unwrap();

    assert_eq!(*fired.borrow(), vec!["ui:ready", "data:ready", "editor:ready"]);
    assert_eq!(editor.state(), EditorState::Ready);
    assert_eq!(editor.get_data().unwrap(), "<p>hello</p>");
}

#[tokio::test]
async fn data_source_conflicts_with_initial_data() {
    let document = Document::new();
    let err = DecoupledEditor::new(
        &document,
        "<p>Foo</p>",
        config(json!({ "initialData": "<p>Bar</p>" })),
    )
    .unwrap_err();
    assert_eq!(err.code(), "editor-create-initial-data");
    assert!(err.kind().is_configuration());
}

#[tokio::test]
async fn initial_data_overrides_the_element_content() {
    let document = Document::new();
    let element = source_element(&document, "<p>Foo</p>");
    let editor = DecoupledEditor::create(
        &document,
        &element,
        config(json!({ "initialData": "<p>Bar</p>" })),
    )
    .await
    .unwrap();
    assert_eq!(editor.get_data().unwrap(), "<p>Bar</p>");
    assert_eq!(element.inner_html(), "<p>Bar</p>");
}

#[tokio::test]
async fn destroy_writes_data_back_when_configured() {
    let document = Document::new();
    let element = source_element(&document, "<p>initial</p>");
    let editor = DecoupledEditor::create(
        &document,
        &element,
        config(json!({ "updateSourceElementOnDestroy": true })),
    )
    .await
    .unwrap();

    editor.set_data("<p>foo</p>").unwrap();
    editor.destroy().await.unwrap();

    assert_eq!(element.inner_html(), "<p>foo</p>");
    assert_eq!(element.editor_instance(), None);
    assert!(!element.has_class("ck-editor__editable"));
    assert_eq!(editor.state(), EditorState::Destroyed);
}

#[tokio::test]
async fn destroy_empties_the_source_element_by_default() {
    let document = Document::new();
    let element = source_element(&document, "<p>initial</p>");
    let editor = DecoupledEditor::create(&document, &element, config(Value::Null))
        .await
        .unwrap();

    editor.set_data("<p>foo</p>").unwrap();
    editor.destroy().await.unwrap();
    assert_eq!(element.inner_html(), "");

    // Destroying twice is harmless.
    editor.destroy().await.unwrap();
}

#[tokio::test]
async fn source_element_serves_one_editor() {
    let document = Document::new();
    let element = source_element(&document, "<p>Foo</p>");
    let first = DecoupledEditor::create(&document, &element, config(Value::Null))
        .await
        .unwrap();

    let err = DecoupledEditor::create(&document, &element, config(Value::Null))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceElementAlreadyUsed);
    assert_eq!(element.editor_instance(), Some(first.id()));

    first.destroy().await.unwrap();
    DecoupledEditor::create(&document, &element, config(Value::Null))
        .await
        .unwrap();
}

#[tokio::test]
async fn textarea_is_rejected() {
    let document = Document::new();
    let textarea = document.create_element("textarea");
    let err = DecoupledEditor::create(&document, &textarea, config(Value::Null))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongElement);
    assert_eq!(err.code(), "editor-wrong-element");
    assert_eq!(textarea.editor_instance(), None);
}

struct Broken;

impl Plugin for Broken {}

impl PluginConstructor for Broken {
    const NAME: &'static str = "Broken";

    fn new(_editor: &Editor) -> tessera_utils::Result<Self> {
        Err(Error::plugin_init(Self::NAME, "missing service"))
    }
}

#[tokio::test]
async fn failing_plugin_rejects_creation_and_releases_the_element() {
    let document = Document::new();
    let element = source_element(&document, "<p>Foo</p>");
    let config = config(Value::Null).with_plugins([PluginDefinition::of::<Broken>()]);

    let err = DecoupledEditor::create(&document, &element, config).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PluginInit);
    assert_eq!(element.editor_instance(), None);
}

struct BrokenButton;

impl PluginConstructor for BrokenButton {
    const NAME: &'static str = "BrokenButton";

    fn new(_editor: &Editor) -> tessera_utils::Result<Self> {
        Ok(Self)
    }
}

impl Plugin for BrokenButton {
    fn init<'a>(&'a self, editor: &'a Editor) -> LocalBoxFuture<'a, tessera_utils::Result<()>> {
        let registered = editor.ui().component_factory().add("broken", |_| {
            Err(Error::plugin_init("BrokenButton", "no icon"))
        });
        futures_util::future::ready(registered).boxed_local()
    }
}

#[tokio::test]
async fn failing_toolbar_component_tears_the_ui_down() {
    let document = Document::new();
    let element = source_element(&document, "<p>Foo</p>");
    let broken_config = config(json!({ "toolbar": ["paragraph", "broken"] }))
        .with_plugins([PluginDefinition::of::<BrokenButton>()]);

    let err = DecoupledEditor::create(&document, &element, broken_config)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PluginInit);
    assert_eq!(element.editor_instance(), None);
    assert_eq!(element.get_attribute("contenteditable"), None);
    assert!(!element.has_class("ck-editor__editable"));
    assert_eq!(element.native_listener_count(), 0);

    // The element is free for the next editor.
    let editor = DecoupledEditor::create(&document, &element, config(Value::Null))
        .await
        .unwrap();
    assert_eq!(element.editor_instance(), Some(editor.id()));
}

#[tokio::test]
async fn removed_plugins_are_not_loaded() {
    let document = Document::new();
    let editor = DecoupledEditor::create(
        &document,
        "<p>Foo</p>",
        config(Value::Null).without_plugins(["Paragraph"]),
    )
    .await
    .unwrap();
    assert!(!editor.plugins().has("Paragraph"));
    assert!(editor.ui().view().toolbar.items.to_vec().is_empty());
}

#[tokio::test]
async fn ui_is_wired_to_the_editor() {
    let document = Document::new();
    let element = source_element(&document, "<p>Foo</p>");
    let editor = DecoupledEditor::create(
        &document,
        &element,
        config(json!({
            "toolbar": { "items": ["paragraph", "|", "unknown"], "shouldNotGroupWhenFull": true },
            "placeholder": "Type here",
            "label": { "main": "Article body" }
        })),
    )
    .await
    .unwrap();

    let view = editor.ui().view();
    assert_eq!(view.editable.element(), Some(element.clone()));
    assert_eq!(editor.ui().get_editable_element("main"), Some(element.clone()));
    assert_eq!(element.get_attribute("aria-label").as_deref(), Some("Article body"));
    assert_eq!(element.get_attribute("data-placeholder").as_deref(), Some("Type here"));
    assert_eq!(element.get_attribute("contenteditable").as_deref(), Some("true"));
    assert_eq!(view.toolbar.items.len(), 2);
    assert!(!view.toolbar.element().unwrap().has_class("ck-toolbar_grouping"));
    assert!(editor.ui().is_ready());

    editor.enable_read_only_mode("test");
    assert_eq!(element.get_attribute("contenteditable").as_deref(), Some("false"));
    assert!(element.has_class("ck-read-only"));
}

#[tokio::test]
async fn editable_focus_follows_the_focus_tracker() {
    let document = Document::new();
    let element = source_element(&document, "<p>Foo</p>");
    let editor = DecoupledEditor::create(&document, &element, config(Value::Null))
        .await
        .unwrap();

    element.focus();
    assert!(editor.ui().view().editable.is_focused.get());
    assert!(element.has_class("ck-focused"));

    element.blur();
    document.run_timers();
    assert!(!editor.ui().view().editable.is_focused.get());
    assert!(element.has_class("ck-blurred"));
}

#[tokio::test]
async fn alt_f10_moves_between_content_and_toolbar() {
    let document = Document::new();
    let element = source_element(&document, "<p>Foo</p>");
    let config = config(json!({ "toolbar": ["paragraph"] }));
    let editor = DecoupledEditor::create(&document, &element, config)
        .await
        .unwrap();
    let toolbar = editor.ui().view().toolbar.clone();
    document.body().append_child(&toolbar.element().unwrap());

    editor.model().change(|writer| {
        writer.set_selection(Some(ModelPosition {
            root: SmolStr::new("main"),
            index: 0,
        }))
    });
    editor.commands().refresh_all();

    element.focus();
    let alt_f10 = KeyEventData::from_keystroke("Alt+F10", Env::other()).unwrap();
    element.dispatch_event(&alt_f10.to_dom_event("keydown"));

    let button = toolbar.items.first().unwrap().element();
    assert_eq!(document.active_element(), button);
    assert!(editor.ui().focus_tracker().is_focused());

    let button = button.unwrap();
    button.dispatch_event(&KeyEventData::new(ESC).to_dom_event("keydown"));
    assert_eq!(document.active_element(), Some(element.clone()));
}
