//! Listening to native DOM events through an [`Emitter`].
//!
//! A host emitter never attaches its callbacks to DOM nodes directly. For every
//! `(node, capture, passive)` combination it owns one proxy emitter, and each
//! proxy attaches at most one native listener per event name. Host callbacks
//! are registered on the proxy, so they get emitter semantics (priorities,
//! `stop`, `off`) and many host listeners cost one native listener.
//!
//! The native listener is detached once the last host listener for that event
//! name goes away.

use std::cell::RefCell;
use std::collections::HashMap;

use smol_str::SmolStr;

use crate::dom::{DomEvent, ListenerOptions, NativeListenerId, Node, NodeId};
use crate::emitter::{Emitter, EventInfo, ListenOptions, ListenerId, typed};
use crate::priorities::Priority;

/// Options for [`Emitter::listen_to_dom`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DomListenOptions {
    pub use_capture: bool,
    pub use_passive: bool,
    pub priority: Priority,
}

impl DomListenOptions {
    pub fn capture() -> Self {
        Self {
            use_capture: true,
            ..Self::default()
        }
    }

    pub fn passive() -> Self {
        Self {
            use_passive: true,
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ProxyKey {
    node: NodeId,
    options: ListenerOptions,
}

/// Relays native events of one node and listener flavour into an emitter.
struct ProxyEmitter {
    node: Node,
    options: ListenerOptions,
    emitter: Emitter,
    native: RefCell<HashMap<SmolStr, NativeListenerId>>,
}

impl ProxyEmitter {
    fn new(node: &Node, options: ListenerOptions) -> Self {
        Self {
            node: node.clone(),
            options,
            emitter: Emitter::new(),
            native: RefCell::new(HashMap::new()),
        }
    }

    /// Attach the native listener for `event` unless one is attached already.
    fn attach(&self, event: &str) {
        if self.native.borrow().contains_key(event) {
            return;
        }
        let weak = self.emitter.downgrade();
        let name = SmolStr::new(event);
        let id = self
            .node
            .add_event_listener(event, self.options, move |dom_event: &DomEvent| {
                if let Some(emitter) = weak.upgrade() {
                    emitter.fire(&name, dom_event);
                }
            });
        tracing::trace!(
            node = ?self.node,
            event,
            capture = self.options.capture,
            "attached native listener"
        );
        self.native.borrow_mut().insert(SmolStr::new(event), id);
    }

    /// Detach the native listener for `event` if no host listens to it anymore.
    fn detach_if_unused(&self, event: &str) {
        if self.emitter.has_listeners(event) {
            return;
        }
        if let Some(id) = self.native.borrow_mut().remove(event) {
            self.node.remove_event_listener(id);
            tracing::trace!(node = ?self.node, event, "detached native listener");
        }
    }

    fn is_idle(&self) -> bool {
        self.native.borrow().is_empty()
    }
}

struct DomSubscription {
    key: ProxyKey,
    event: SmolStr,
    listener: ListenerId,
}

/// Per-host DOM bookkeeping: proxies keyed by node and flavour, plus the
/// host's registrations on them.
#[derive(Default)]
pub(crate) struct DomBridge {
    proxies: RefCell<HashMap<ProxyKey, ProxyEmitter>>,
    subscriptions: RefCell<Vec<DomSubscription>>,
}

impl Emitter {
    /// Listen to the native `event` on `node`.
    ///
    /// Registrations from this emitter for the same node and the same
    /// capture/passive flags share one native listener.
    pub fn listen_to_dom(
        &self,
        node: &Node,
        event: &str,
        options: DomListenOptions,
        callback: impl Fn(&mut EventInfo, &DomEvent) + 'static,
    ) -> ListenerId {
        let key = ProxyKey {
            node: node.id(),
            options: ListenerOptions {
                capture: options.use_capture,
                passive: options.use_passive,
            },
        };
        let bridge = &self.inner().dom;
        let listener = {
            let mut proxies = bridge.proxies.borrow_mut();
            let proxy = proxies
                .entry(key)
                .or_insert_with(|| ProxyEmitter::new(node, key.options));
            let listener = proxy.emitter.add_listener(
                event,
                ListenOptions::priority(options.priority),
                typed(callback),
            );
            proxy.attach(event);
            listener
        };
        bridge.subscriptions.borrow_mut().push(DomSubscription {
            key,
            event: SmolStr::new(event),
            listener,
        });
        listener
    }

    /// Remove DOM subscriptions. Omitting arguments widens the scope; a node
    /// without further arguments covers every capture/passive combination.
    pub fn stop_listening_dom(
        &self,
        node: Option<&Node>,
        event: Option<&str>,
        listener: Option<ListenerId>,
    ) {
        let bridge = &self.inner().dom;
        let removed: Vec<DomSubscription> = {
            let mut subscriptions = bridge.subscriptions.borrow_mut();
            let (removed, kept) = subscriptions.drain(..).partition(|sub: &DomSubscription| {
                node.is_none_or(|n| n.id() == sub.key.node)
                    && event.is_none_or(|e| e == sub.event)
                    && listener.is_none_or(|l| l == sub.listener)
            });
            *subscriptions = kept;
            removed
        };
        if removed.is_empty() {
            return;
        }

        let mut proxies = bridge.proxies.borrow_mut();
        for sub in &removed {
            if let Some(proxy) = proxies.get(&sub.key) {
                proxy.emitter.off(&sub.event, sub.listener);
                proxy.detach_if_unused(&sub.event);
            }
        }
        proxies.retain(|_, proxy| !proxy.is_idle());
    }

    /// Whether this emitter has any DOM subscription on `node`.
    pub fn is_listening_to_dom(&self, node: &Node) -> bool {
        self.inner()
            .dom
            .subscriptions
            .borrow()
            .iter()
            .any(|sub| sub.key.node == node.id())
    }
}
