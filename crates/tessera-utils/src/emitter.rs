//! Named-event publish/subscribe.
//!
//! An [`Emitter`] keeps priority-ordered listeners per event name. Event names
//! are namespaced with `:`: firing `change:isFocused` also notifies the
//! listeners of `change`. Listeners from every namespace level are merged into
//! one dispatch order:
//!
//! 1. higher priority first,
//! 2. at equal priority, the more specific namespace level first,
//! 3. at equal priority and level, registration order.
//!
//! Listeners receive the event payload as `&dyn Any`; the typed registration
//! helpers downcast it and skip listeners registered for another payload type.
//!
//! Listener panics are not caught. They unwind through [`Emitter::fire`] to
//! whoever triggered the event, so a misbehaving listener surfaces to the
//! host's own error handling.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smol_str::SmolStr;

use crate::dom_emitter::DomBridge;
use crate::priorities::Priority;

static NEXT_EMITTER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity tag of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId(u64);

/// Handle of a registered listener, unique across all emitters.
///
/// Ids grow monotonically, which is what "registration order" means when
/// listeners are merged across namespace levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub type AnyCallback = Rc<dyn Fn(&mut EventInfo, &dyn Any)>;

/// Decides, per fired event, whether a listener runs.
pub type EventFilter = Rc<dyn Fn(&EventInfo, &dyn Any) -> bool>;

/// Options for registering a listener.
#[derive(Clone, Default)]
pub struct ListenOptions {
    pub priority: Priority,
    /// Skip the listener for events the filter rejects. A skipped listener
    /// cannot stop the event.
    pub filter: Option<EventFilter>,
}

impl ListenOptions {
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Fn(&EventInfo, &dyn Any) -> bool + 'static) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }
}

impl fmt::Debug for ListenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenOptions")
            .field("priority", &self.priority)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// Information about a fired event, passed to every listener.
pub struct EventInfo {
    name: SmolStr,
    source: EmitterId,
    path: Vec<EmitterId>,
    stopped: bool,
    off_requested: bool,
    return_value: Option<Box<dyn Any>>,
}

impl EventInfo {
    pub fn new(source: EmitterId, name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            source,
            path: Vec::new(),
            stopped: false,
            off_requested: false,
            return_value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The emitter that originally fired the event.
    pub fn source(&self) -> EmitterId {
        self.source
    }

    /// Emitters the event passed through, including delegation hops.
    pub fn path(&self) -> &[EmitterId] {
        &self.path
    }

    /// Stop the event: no further listeners run. Delegation still happens.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Remove the currently running listener once it returns.
    pub fn off(&mut self) {
        self.off_requested = true;
    }

    pub fn set_return<T: Any>(&mut self, value: T) {
        self.return_value = Some(Box::new(value));
    }

    pub fn return_value<T: Any>(&self) -> Option<&T> {
        self.return_value.as_ref()?.downcast_ref()
    }

    pub fn take_return(&mut self) -> Option<Box<dyn Any>> {
        self.return_value.take()
    }
}

impl fmt::Debug for EventInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventInfo")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("stopped", &self.stopped)
            .finish()
    }
}

#[derive(Clone)]
struct Listener {
    id: ListenerId,
    priority: i32,
    filter: Option<EventFilter>,
    callback: AnyCallback,
}

/// Something this emitter subscribed to on another emitter.
struct Subscription {
    target: Weak<EmitterInner>,
    target_id: EmitterId,
    event: SmolStr,
    listener: ListenerId,
}

#[derive(Clone)]
enum Rename {
    Keep,
    To(SmolStr),
    With(Rc<dyn Fn(&str) -> SmolStr>),
}

impl Rename {
    fn apply(&self, name: &str) -> SmolStr {
        match self {
            Self::Keep => SmolStr::new(name),
            Self::To(to) => to.clone(),
            Self::With(f) => f(name),
        }
    }
}

struct Delegation {
    event: SmolStr,
    target: Weak<EmitterInner>,
    target_id: EmitterId,
    rename: Rename,
}

/// Named-event emitter. Cloning yields another handle to the same emitter.
#[derive(Clone)]
pub struct Emitter {
    inner: Rc<EmitterInner>,
}

/// Non-owning handle to an [`Emitter`].
#[derive(Clone)]
pub struct WeakEmitter {
    inner: Weak<EmitterInner>,
}

pub(crate) struct EmitterInner {
    id: EmitterId,
    listeners: RefCell<HashMap<SmolStr, Vec<Listener>>>,
    listening_to: RefCell<Vec<Subscription>>,
    delegations: RefCell<Vec<Delegation>>,
    pub(crate) dom: DomBridge,
}

/// Wrap a typed callback so it can be stored as an [`AnyCallback`].
pub(crate) fn typed<T: 'static>(callback: impl Fn(&mut EventInfo, &T) + 'static) -> AnyCallback {
    Rc::new(move |info: &mut EventInfo, data: &dyn Any| match data.downcast_ref::<T>() {
        Some(data) => callback(info, data),
        None => tracing::trace!(
            event = %info.name(),
            expected = std::any::type_name::<T>(),
            "skipping listener registered for another payload type"
        ),
    })
}

/// The chain of namespace levels for `name`, most specific first.
fn namespace_levels(name: &str) -> Vec<&str> {
    let mut levels = vec![name];
    let mut current = name;
    while let Some(index) = current.rfind(':') {
        current = &current[..index];
        levels.push(current);
    }
    levels
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                id: EmitterId(NEXT_EMITTER_ID.fetch_add(1, Ordering::Relaxed)),
                listeners: RefCell::new(HashMap::new()),
                listening_to: RefCell::new(Vec::new()),
                delegations: RefCell::new(Vec::new()),
                dom: DomBridge::default(),
            }),
        }
    }

    pub fn id(&self) -> EmitterId {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakEmitter {
        WeakEmitter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn inner(&self) -> &EmitterInner {
        &self.inner
    }

    // === Own listeners ===

    /// Register a listener for `event` with a typed payload at normal priority.
    pub fn on<T: 'static>(
        &self,
        event: &str,
        callback: impl Fn(&mut EventInfo, &T) + 'static,
    ) -> ListenerId {
        self.add_listener(event, ListenOptions::default(), typed(callback))
    }

    pub fn on_with<T: 'static>(
        &self,
        event: &str,
        options: ListenOptions,
        callback: impl Fn(&mut EventInfo, &T) + 'static,
    ) -> ListenerId {
        self.add_listener(event, options, typed(callback))
    }

    /// Register a listener that receives the untyped payload.
    pub fn on_any(
        &self,
        event: &str,
        options: ListenOptions,
        callback: impl Fn(&mut EventInfo, &dyn Any) + 'static,
    ) -> ListenerId {
        self.add_listener(event, options, Rc::new(callback))
    }

    /// Register a listener that removes itself after its first call.
    pub fn once<T: 'static>(
        &self,
        event: &str,
        callback: impl Fn(&mut EventInfo, &T) + 'static,
    ) -> ListenerId {
        self.on(event, move |info: &mut EventInfo, data: &T| {
            info.off();
            callback(info, data);
        })
    }

    /// Remove one of this emitter's own listeners.
    pub fn off(&self, event: &str, listener: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != listener);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Remove every listener registered on this emitter, by anyone.
    pub fn clear_listeners(&self) {
        self.inner.listeners.borrow_mut().clear();
    }

    /// Whether any listener is registered for exactly this event name.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.inner
            .listeners
            .borrow()
            .get(event)
            .is_some_and(|list| !list.is_empty())
    }

    pub(crate) fn add_listener(
        &self,
        event: &str,
        options: ListenOptions,
        callback: AnyCallback,
    ) -> ListenerId {
        let id = ListenerId::next();
        self.inner
            .listeners
            .borrow_mut()
            .entry(SmolStr::new(event))
            .or_default()
            .push(Listener {
                id,
                priority: options.priority.get(),
                filter: options.filter,
                callback,
            });
        id
    }

    fn is_registered(&self, event: &str, listener: ListenerId) -> bool {
        self.inner
            .listeners
            .borrow()
            .get(event)
            .is_some_and(|list| list.iter().any(|l| l.id == listener))
    }

    /// Listeners for `event` and its namespaces in dispatch order.
    fn dispatch_order(&self, event: &str) -> Vec<(SmolStr, Listener)> {
        let listeners = self.inner.listeners.borrow();
        let mut ordered: Vec<(usize, SmolStr, Listener)> = Vec::new();
        for (level, name) in namespace_levels(event).into_iter().enumerate() {
            if let Some((key, list)) = listeners.get_key_value(name) {
                ordered.extend(list.iter().map(|l| (level, key.clone(), l.clone())));
            }
        }
        ordered.sort_by(|(level_a, _, a), (level_b, _, b)| {
            b.priority
                .cmp(&a.priority)
                .then(level_a.cmp(level_b))
                .then(a.id.cmp(&b.id))
        });
        ordered
            .into_iter()
            .map(|(_, name, listener)| (name, listener))
            .collect()
    }

    // === Firing ===

    /// Fire `event` with `data` as payload. Returns the value a listener set
    /// with [`EventInfo::set_return`], if any.
    pub fn fire<T: 'static>(&self, event: &str, data: &T) -> Option<Box<dyn Any>> {
        let info = EventInfo::new(self.id(), event);
        self.fire_event(info, data).take_return()
    }

    /// Fire a prepared [`EventInfo`] and hand it back for inspection.
    pub fn fire_event(&self, mut info: EventInfo, data: &dyn Any) -> EventInfo {
        info.path.push(self.id());

        for (level, listener) in self.dispatch_order(&info.name) {
            // Listeners removed by an earlier listener of this round do not run.
            if !self.is_registered(&level, listener.id) {
                continue;
            }
            if listener.filter.as_ref().is_some_and(|filter| !filter(&info, data)) {
                continue;
            }
            (listener.callback)(&mut info, data);
            if info.off_requested {
                info.off_requested = false;
                self.off(&level, listener.id);
            }
            if info.stopped {
                break;
            }
        }

        let destinations: Vec<(Emitter, SmolStr)> = {
            let delegations = self.inner.delegations.borrow();
            let specific = delegations.iter().filter(|d| d.event == info.name);
            let catch_all = delegations.iter().filter(|d| d.event == "*");
            specific
                .chain(catch_all)
                .filter_map(|d| {
                    d.target
                        .upgrade()
                        .map(|inner| (Emitter { inner }, d.rename.apply(&info.name)))
                })
                .collect()
        };
        for (destination, name) in destinations {
            let mut delegated = EventInfo::new(info.source, name);
            delegated.path = info.path.clone();
            destination.fire_event(delegated, data);
        }

        info
    }

    // === Listening to other emitters ===

    /// Listen to `event` on `target`. The subscription is recorded so that
    /// [`stop_listening`](Self::stop_listening) can remove it later.
    pub fn listen_to<T: 'static>(
        &self,
        target: &Emitter,
        event: &str,
        callback: impl Fn(&mut EventInfo, &T) + 'static,
    ) -> ListenerId {
        self.listen_to_any(target, event, ListenOptions::default(), typed(callback))
    }

    pub fn listen_to_with<T: 'static>(
        &self,
        target: &Emitter,
        event: &str,
        options: ListenOptions,
        callback: impl Fn(&mut EventInfo, &T) + 'static,
    ) -> ListenerId {
        self.listen_to_any(target, event, options, typed(callback))
    }

    pub fn listen_to_any(
        &self,
        target: &Emitter,
        event: &str,
        options: ListenOptions,
        callback: AnyCallback,
    ) -> ListenerId {
        let listener = target.add_listener(event, options, callback);
        self.inner.listening_to.borrow_mut().push(Subscription {
            target: Rc::downgrade(&target.inner),
            target_id: target.id(),
            event: SmolStr::new(event),
            listener,
        });
        listener
    }

    /// Remove subscriptions made with `listen_to*`.
    ///
    /// Omitting trailing arguments widens the scope: a specific listener, all
    /// listeners for an event on `target`, everything on `target`, or every
    /// subscription this emitter holds (including DOM subscriptions).
    pub fn stop_listening(
        &self,
        target: Option<&Emitter>,
        event: Option<&str>,
        listener: Option<ListenerId>,
    ) {
        let removed: Vec<Subscription> = {
            let mut subscriptions = self.inner.listening_to.borrow_mut();
            let (removed, kept) = subscriptions.drain(..).partition(|sub: &Subscription| {
                target.is_none_or(|t| t.id() == sub.target_id)
                    && event.is_none_or(|e| e == sub.event)
                    && listener.is_none_or(|l| l == sub.listener)
            });
            *subscriptions = kept;
            removed
        };
        for sub in removed {
            if let Some(inner) = sub.target.upgrade() {
                Emitter { inner }.off(&sub.event, sub.listener);
            }
        }
        if target.is_none() {
            self.stop_listening_dom(None, None, None);
        }
    }

    /// Whether this emitter holds any subscription on `target`.
    pub fn is_listening_to(&self, target: &Emitter) -> bool {
        self.inner
            .listening_to
            .borrow()
            .iter()
            .any(|sub| sub.target_id == target.id())
    }

    // === Delegation ===

    /// Start re-firing the given events on other emitters.
    ///
    /// `"*"` delegates every event. Delegated events keep the original
    /// source and carry the path they travelled.
    pub fn delegate<'a>(&'a self, events: &[&str]) -> DelegateChain<'a> {
        DelegateChain {
            emitter: self,
            events: events.iter().map(|e| SmolStr::new(e)).collect(),
        }
    }

    /// Stop delegating. Omitting arguments widens the scope.
    pub fn stop_delegating(&self, event: Option<&str>, target: Option<&Emitter>) {
        self.inner.delegations.borrow_mut().retain(|d| {
            !(event.is_none_or(|e| e == d.event) && target.is_none_or(|t| t.id() == d.target_id))
        });
    }

    fn add_delegation(&self, event: SmolStr, target: &Emitter, rename: Rename) {
        self.inner.delegations.borrow_mut().push(Delegation {
            event,
            target: Rc::downgrade(&target.inner),
            target_id: target.id(),
            rename,
        });
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Emitter {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.inner.id)
            .field("events", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl WeakEmitter {
    pub fn upgrade(&self) -> Option<Emitter> {
        self.inner.upgrade().map(|inner| Emitter { inner })
    }
}

/// Builder returned by [`Emitter::delegate`].
pub struct DelegateChain<'a> {
    emitter: &'a Emitter,
    events: Vec<SmolStr>,
}

impl DelegateChain<'_> {
    /// Re-fire under the same name on `target`.
    pub fn to(self, target: &Emitter) {
        for event in self.events {
            self.emitter.add_delegation(event, target, Rename::Keep);
        }
    }

    /// Re-fire under `name` on `target`.
    pub fn to_renamed(self, target: &Emitter, name: &str) {
        for event in self.events {
            self.emitter
                .add_delegation(event, target, Rename::To(SmolStr::new(name)));
        }
    }

    /// Re-fire under a name computed from the original one.
    pub fn to_with(self, target: &Emitter, rename: impl Fn(&str) -> SmolStr + 'static) {
        let rename: Rc<dyn Fn(&str) -> SmolStr> = Rc::new(rename);
        for event in self.events {
            self.emitter
                .add_delegation(event, target, Rename::With(rename.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn listeners_fire_in_priority_then_registration_order() {
        let emitter = Emitter::new();
        let log = recorder();
        for (name, priority) in [
            ("low", Priority::Low),
            ("normal-1", Priority::Normal),
            ("high", Priority::High),
            ("normal-2", Priority::Normal),
            ("custom", Priority::Custom(10)),
        ] {
            let log = log.clone();
            emitter.on_with(
                "ping",
                ListenOptions::priority(priority),
                move |_: &mut EventInfo, _: &()| log.borrow_mut().push(name),
            );
        }

        emitter.fire("ping", &());

        assert_eq!(
            *log.borrow(),
            vec!["high", "custom", "normal-1", "normal-2", "low"]
        );
    }

    #[test]
    fn namespace_listeners_merge_by_priority_specific_first_on_ties() {
        let emitter = Emitter::new();
        let log = recorder();
        let add = |event: &'static str, name: &'static str, priority: Priority| {
            let log = log.clone();
            emitter.on_any(event, ListenOptions::priority(priority), move |_, _| {
                log.borrow_mut().push(name)
            });
        };
        // Registered generic-first on purpose: ties must still favour the
        // specific level.
        add("change", "generic-normal", Priority::Normal);
        add("change", "generic-high", Priority::High);
        add("change:isFocused", "specific-normal", Priority::Normal);
        add("change:isFocused", "specific-low", Priority::Low);
        add("change:other", "unrelated", Priority::Highest);

        emitter.fire("change:isFocused", &());

        assert_eq!(
            *log.borrow(),
            vec![
                "generic-high",
                "specific-normal",
                "generic-normal",
                "specific-low"
            ]
        );
    }

    #[test]
    fn deeper_namespaces_notify_every_prefix() {
        let emitter = Emitter::new();
        let log = recorder();
        for event in ["a", "a:b", "a:b:c", "a:x"] {
            let log = log.clone();
            emitter.on_any(event, ListenOptions::default(), move |info, _| {
                assert_eq!(info.name(), "a:b:c");
                log.borrow_mut().push(event);
            });
        }

        emitter.fire("a:b:c", &());

        assert_eq!(*log.borrow(), vec!["a:b:c", "a:b", "a"]);
    }

    #[test]
    fn stop_halts_remaining_listeners_and_return_value_is_reported() {
        let emitter = Emitter::new();
        let reached = Rc::new(Cell::new(false));
        emitter.on_with(
            "ask",
            ListenOptions::priority(Priority::High),
            |info: &mut EventInfo, question: &&str| {
                info.set_return(format!("answer to {question}"));
                info.stop();
            },
        );
        {
            let reached = reached.clone();
            emitter.on("ask", move |_: &mut EventInfo, _: &&str| reached.set(true));
        }

        let answer = emitter.fire("ask", &"life");

        assert!(!reached.get());
        assert_eq!(
            answer.and_then(|a| a.downcast::<String>().ok()).as_deref(),
            Some(&"answer to life".to_owned())
        );
    }

    #[test]
    fn filtered_listeners_only_see_accepted_events() {
        let emitter = Emitter::new();
        let listener = Emitter::new();
        let log = recorder();
        {
            let log = log.clone();
            emitter.on_with(
                "key",
                ListenOptions::priority(Priority::High)
                    .with_filter(|_, data| data.downcast_ref::<u32>() == Some(&13)),
                move |info: &mut EventInfo, _: &u32| {
                    log.borrow_mut().push("enter");
                    info.stop();
                },
            );
        }
        {
            let log = log.clone();
            listener.listen_to_with(
                &emitter,
                "key",
                ListenOptions::default()
                    .with_filter(|info, _| info.source() != info.path()[0]),
                move |_: &mut EventInfo, _: &u32| log.borrow_mut().push("delegated only"),
            );
        }
        {
            let log = log.clone();
            emitter.on("key", move |_: &mut EventInfo, _: &u32| log.borrow_mut().push("any"));
        }

        emitter.fire("key", &65u32);
        emitter.fire("key", &13u32);

        // A rejected listener neither runs nor stops the event.
        assert_eq!(*log.borrow(), vec!["any", "enter"]);
    }

    #[test]
    fn typed_listeners_skip_other_payloads() {
        let emitter = Emitter::new();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            emitter.on("data", move |_: &mut EventInfo, value: &u32| {
                hits.set(hits.get() + *value)
            });
        }

        emitter.fire("data", &"not a number");
        emitter.fire("data", &5u32);

        assert_eq!(hits.get(), 5);
    }

    #[test]
    fn once_and_off() {
        let emitter = Emitter::new();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            emitter.once("tick", move |_: &mut EventInfo, _: &()| hits.set(hits.get() + 1));
        }
        let removable = {
            let hits = hits.clone();
            emitter.on("tick", move |_: &mut EventInfo, _: &()| hits.set(hits.get() + 10))
        };

        emitter.fire("tick", &());
        assert!(emitter.off("tick", removable));
        assert!(!emitter.off("tick", removable));
        emitter.fire("tick", &());

        assert_eq!(hits.get(), 11);
        assert!(!emitter.has_listeners("tick"));
    }

    #[test]
    fn listener_removed_mid_dispatch_does_not_run() {
        let emitter = Emitter::new();
        let second_ran = Rc::new(Cell::new(false));
        let second = Rc::new(Cell::new(None));
        {
            let emitter_handle = emitter.clone();
            let second = second.clone();
            emitter.on("go", move |_: &mut EventInfo, _: &()| {
                if let Some(id) = second.get() {
                    emitter_handle.off("go", id);
                }
            });
        }
        {
            let second_ran = second_ran.clone();
            second.set(Some(
                emitter.on("go", move |_: &mut EventInfo, _: &()| second_ran.set(true)),
            ));
        }

        emitter.fire("go", &());

        assert!(!second_ran.get());
    }

    #[test]
    fn stop_listening_widens_with_fewer_arguments() {
        let host = Emitter::new();
        let a = Emitter::new();
        let b = Emitter::new();
        let log = recorder();
        let listen = |target: &Emitter, event: &str, name: &'static str| {
            let log = log.clone();
            host.listen_to(target, event, move |_: &mut EventInfo, _: &()| {
                log.borrow_mut().push(name)
            })
        };
        let a_foo_1 = listen(&a, "foo", "a-foo-1");
        listen(&a, "foo", "a-foo-2");
        listen(&a, "bar", "a-bar");
        listen(&b, "foo", "b-foo");

        host.stop_listening(Some(&a), Some("foo"), Some(a_foo_1));
        a.fire("foo", &());
        assert_eq!(*log.borrow(), vec!["a-foo-2"]);

        host.stop_listening(Some(&a), Some("foo"), None);
        a.fire("foo", &());
        a.fire("bar", &());
        assert_eq!(*log.borrow(), vec!["a-foo-2", "a-bar"]);

        host.stop_listening(Some(&a), None, None);
        a.fire("bar", &());
        b.fire("foo", &());
        assert_eq!(*log.borrow(), vec!["a-foo-2", "a-bar", "b-foo"]);
        assert!(!host.is_listening_to(&a));

        host.stop_listening(None, None, None);
        b.fire("foo", &());
        assert_eq!(log.borrow().len(), 3);
        assert!(!b.has_listeners("foo"));
    }

    #[test]
    fn delegation_refires_with_path_and_rename() {
        let child = Emitter::new();
        let parent = Emitter::new();
        let grandparent = Emitter::new();
        child.delegate(&["execute"]).to(&parent);
        parent.delegate(&["*"]).to_renamed(&grandparent, "child:execute");

        let seen = Rc::new(RefCell::new(None));
        {
            let seen = seen.clone();
            grandparent.on("child:execute", move |info: &mut EventInfo, value: &i32| {
                *seen.borrow_mut() = Some((info.source(), info.path().to_vec(), *value));
            });
        }
        // Stopping at the source does not prevent delegation.
        child.on("execute", |info: &mut EventInfo, _: &i32| info.stop());

        child.fire("execute", &7);

        let (source, path, value) = seen.borrow().clone().expect("delegated");
        assert_eq!(source, child.id());
        assert_eq!(path, vec![child.id(), parent.id(), grandparent.id()]);
        assert_eq!(value, 7);

        child.stop_delegating(Some("execute"), None);
        *seen.borrow_mut() = None;
        child.fire("execute", &8);
        assert!(seen.borrow().is_none());
    }
}
