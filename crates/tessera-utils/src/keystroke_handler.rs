//! Keystroke-specific callbacks dispatched from `keydown` events.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::dom::Node;
use crate::dom_emitter::DomListenOptions;
use crate::emitter::{Emitter, EventInfo, ListenOptions, ListenerId};
use crate::env::Env;
use crate::error::Result;
use crate::keyboard::{KeyEventData, Keystroke, keystroke_code, parse_keystroke};
use crate::priorities::Priority;

/// Options for [`KeystrokeHandler::set`].
#[derive(Clone, Default)]
pub struct KeystrokeOptions {
    pub priority: Priority,
    /// Only run the callback when the filter accepts the event.
    pub filter: Option<Rc<dyn Fn(&KeyEventData) -> bool>>,
}

impl KeystrokeOptions {
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Fn(&KeyEventData) -> bool + 'static) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }
}

/// Registers callbacks for keystrokes and runs them for `keydown` events
/// coming from DOM nodes or emitters it listens to.
///
/// Callbacks for one keystroke run in priority order. Each receives the key
/// data and a `cancel` function. Calling `cancel` prevents the default action
/// and propagation of the native event and stops the remaining callbacks for
/// that keystroke.
#[derive(Clone)]
pub struct KeystrokeHandler {
    inner: Rc<HandlerInner>,
}

struct HandlerInner {
    emitter: Emitter,
    env: Env,
}

fn dispatch_event(code: u32) -> String {
    format!("_keydown:{code}")
}

impl KeystrokeHandler {
    pub fn new() -> Self {
        Self::with_env(Env::detect())
    }

    pub fn with_env(env: Env) -> Self {
        Self {
            inner: Rc::new(HandlerInner {
                emitter: Emitter::new(),
                env,
            }),
        }
    }

    pub fn env(&self) -> Env {
        self.inner.env
    }

    fn downgrade(&self) -> Weak<HandlerInner> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<HandlerInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Handle native `keydown` events targeted at `node` or anything inside
    /// it. Listens in the capture phase, so a descendant stopping
    /// propagation cannot hide a keystroke from this handler.
    pub fn listen_to_dom(&self, node: &Node) {
        self.listen_to_dom_with(node, DomListenOptions::capture());
    }

    /// Like [`listen_to_dom`](Self::listen_to_dom) with explicit listener
    /// options. Widgets that contain other keystroke-handling widgets listen
    /// in the bubbling phase so the innermost one decides first.
    pub fn listen_to_dom_with(&self, node: &Node, options: DomListenOptions) {
        let weak = self.downgrade();
        self.inner.emitter.listen_to_dom(
            node,
            "keydown",
            options,
            move |_: &mut EventInfo, event| {
                if let Some(handler) = Self::upgrade(&weak) {
                    handler.press(&KeyEventData::from_dom(event));
                }
            },
        );
    }

    /// Handle `keydown` events fired by `emitter` with a [`KeyEventData`]
    /// payload. Handled events are stopped on that emitter.
    pub fn listen_to(&self, emitter: &Emitter) {
        let weak = self.downgrade();
        self.inner.emitter.listen_to(
            emitter,
            "keydown",
            move |info: &mut EventInfo, data: &KeyEventData| {
                if Self::upgrade(&weak).is_some_and(|handler| handler.press(data)) {
                    info.stop();
                }
            },
        );
    }

    /// Register `callback` for `keystroke`.
    pub fn set(
        &self,
        keystroke: impl Into<Keystroke>,
        options: KeystrokeOptions,
        callback: impl Fn(&KeyEventData, &dyn Fn()) + 'static,
    ) -> Result<ListenerId> {
        let code = parse_keystroke(&keystroke.into(), self.inner.env)?;
        let filter = options.filter;
        let id = self.inner.emitter.on_with(
            &dispatch_event(code),
            ListenOptions::priority(options.priority),
            move |info: &mut EventInfo, data: &KeyEventData| {
                if filter.as_ref().is_some_and(|filter| !filter(data)) {
                    return;
                }
                let cancelled = Cell::new(false);
                let cancel = || {
                    data.prevent_default();
                    data.stop_propagation();
                    cancelled.set(true);
                };
                callback(data, &cancel);
                if cancelled.get() {
                    info.set_return(true);
                    info.stop();
                }
            },
        );
        Ok(id)
    }

    /// Remove a callback registered with [`set`](Self::set).
    pub fn remove(&self, keystroke: impl Into<Keystroke>, listener: ListenerId) -> Result<bool> {
        let code = parse_keystroke(&keystroke.into(), self.inner.env)?;
        let removed = self.inner.emitter.off(&dispatch_event(code), listener);
        if !removed {
            tracing::warn!(code, "removing a keystroke callback that is not registered");
        }
        Ok(removed)
    }

    /// Run the callbacks for the keystroke in `data`.
    ///
    /// Returns `true` only if a callback called `cancel`.
    pub fn press(&self, data: &KeyEventData) -> bool {
        let code = keystroke_code(data);
        let handled = self
            .inner
            .emitter
            .fire(&dispatch_event(code), data)
            .and_then(|value| value.downcast::<bool>().ok())
            .is_some_and(|handled| *handled);
        tracing::trace!(code, handled, "keystroke");
        handled
    }

    /// Detach from every source and drop all callbacks.
    pub fn destroy(&self) {
        self.inner.emitter.stop_listening(None, None, None);
        self.inner.emitter.clear_listeners();
    }
}

impl Default for KeystrokeHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dom::{Document, ListenerOptions};
    use crate::keyboard::{CTRL, TAB};

    fn handler() -> KeystrokeHandler {
        KeystrokeHandler::with_env(Env::other())
    }

    #[test]
    fn callbacks_run_by_priority_and_cancel_stops_the_rest() {
        let keystrokes = handler();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, priority, cancels) in [
            ("low", Priority::Low, false),
            ("normal", Priority::Normal, false),
            ("high", Priority::High, false),
        ] {
            let log = log.clone();
            keystrokes
                .set("Ctrl+A", KeystrokeOptions::priority(priority), move |_, cancel| {
                    log.borrow_mut().push(name);
                    if cancels {
                        cancel();
                    }
                })
                .unwrap();
        }

        let data = KeyEventData::from_keystroke("Ctrl+A", Env::other()).unwrap();
        assert!(!keystrokes.press(&data));
        assert_eq!(*log.borrow(), vec!["high", "normal", "low"]);

        log.borrow_mut().clear();
        keystrokes
            .set("Ctrl+A", KeystrokeOptions::priority(Priority::Highest), |_, cancel| cancel())
            .unwrap();
        assert!(keystrokes.press(&data));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cancel_in_high_priority_callback_blocks_lower_ones() {
        let keystrokes = handler();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            keystrokes
                .set("Tab", KeystrokeOptions::priority(Priority::High), move |_, cancel| {
                    log.borrow_mut().push("high");
                    cancel();
                })
                .unwrap();
        }
        for (name, priority) in [("normal", Priority::Normal), ("low", Priority::Low)] {
            let log = log.clone();
            keystrokes
                .set("Tab", KeystrokeOptions::priority(priority), move |_, _| {
                    log.borrow_mut().push(name)
                })
                .unwrap();
        }

        assert!(keystrokes.press(&KeyEventData::new(TAB)));
        assert_eq!(*log.borrow(), vec!["high"]);
    }

    #[test]
    fn dom_keydown_is_cancelled_natively() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let input = doc.create_element("input");
        root.append_child(&input);
        doc.body().append_child(&root);
        let keystrokes = handler();
        keystrokes.listen_to_dom(&root);
        keystrokes
            .set("Ctrl+B", KeystrokeOptions::default(), |_, cancel| cancel())
            .unwrap();
        let reached_body = Rc::new(Cell::new(false));
        {
            let reached_body = reached_body.clone();
            doc.body()
                .add_event_listener("keydown", ListenerOptions::default(), move |_| {
                    reached_body.set(true)
                });
        }

        let event = KeyEventData::from_keystroke("Ctrl+B", Env::other())
            .unwrap()
            .to_dom_event("keydown");
        let not_prevented = input.dispatch_event(&event);

        assert!(!not_prevented);
        assert!(!reached_body.get());
    }

    #[test]
    fn container_sees_keys_a_descendant_stops() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let input = doc.create_element("input");
        root.append_child(&input);
        doc.body().append_child(&root);
        input.add_event_listener("keydown", ListenerOptions::default(), |event| {
            event.stop_propagation()
        });

        let container = handler();
        container.listen_to_dom(&root);
        let bubbling = handler();
        bubbling.listen_to_dom_with(&root, DomListenOptions::default());
        let ran = Rc::new(RefCell::new(Vec::new()));
        for (keystrokes, name) in [(&container, "container"), (&bubbling, "bubbling")] {
            let ran = ran.clone();
            keystrokes
                .set("Ctrl+B", KeystrokeOptions::default(), move |_, _| {
                    ran.borrow_mut().push(name)
                })
                .unwrap();
        }

        let event = KeyEventData::from_keystroke("Ctrl+B", Env::other())
            .unwrap()
            .to_dom_event("keydown");
        input.dispatch_event(&event);

        assert_eq!(*ran.borrow(), vec!["container"]);
    }

    #[test]
    fn filter_and_emitter_sources() {
        let keystrokes = handler();
        let source = Emitter::new();
        keystrokes.listen_to(&source);
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            keystrokes
                .set(
                    [CTRL, 75],
                    KeystrokeOptions::default().with_filter(|data| !data.shift_key),
                    move |_, cancel| {
                        hits.set(hits.get() + 1);
                        cancel();
                    },
                )
                .unwrap();
        }
        let stopped_later = Rc::new(Cell::new(true));
        {
            let stopped_later = stopped_later.clone();
            source.on_with(
                "keydown",
                ListenOptions::priority(Priority::Low),
                move |_: &mut EventInfo, _: &KeyEventData| stopped_later.set(false),
            );
        }

        source.fire("keydown", &KeyEventData::from_keystroke("Ctrl+K", Env::other()).unwrap());
        source.fire(
            "keydown",
            &KeyEventData::from_keystroke("Ctrl+Shift+K", Env::other()).unwrap(),
        );

        assert_eq!(hits.get(), 1);
        // The unhandled Ctrl+Shift+K reached the low priority listener.
        assert!(!stopped_later.get());
    }

    #[test]
    fn remove_and_destroy() {
        let keystrokes = handler();
        let id = keystrokes
            .set("Esc", KeystrokeOptions::default(), |_, cancel| cancel())
            .unwrap();
        assert!(keystrokes.remove("Esc", id).unwrap());
        assert!(!keystrokes.remove("Esc", id).unwrap());
        assert!(!keystrokes.press(&KeyEventData::from_keystroke("Esc", Env::other()).unwrap()));

        let doc = Document::new();
        let root = doc.create_element("div");
        keystrokes.listen_to_dom(&root);
        keystrokes.set("Esc", KeystrokeOptions::default(), |_, cancel| cancel()).unwrap();
        keystrokes.destroy();
        keystrokes.destroy();

        assert_eq!(root.native_listener_count(), 0);
        assert!(!keystrokes.press(&KeyEventData::from_keystroke("Esc", Env::other()).unwrap()));
    }

    #[test]
    fn unknown_keystrokes_are_rejected() {
        let err = handler()
            .set("Ctrl+Banana", KeystrokeOptions::default(), |_, _| {})
            .unwrap_err();
        assert_eq!(err.code(), "keyboard-unknown-key");
    }
}
