//! Observable properties.
//!
//! A [`Property`] is a named slot living on an owning [`Emitter`]. Writing it
//! fires `set:<name>` (listeners may replace the incoming value through
//! [`EventInfo::set_return`]) and then, if the value actually changed,
//! `change:<name>` with a [`PropertyChange`] payload.
//!
//! Writes of an equal value (`PartialEq`) are not announced. Reads never have
//! side effects.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::emitter::{Emitter, EventInfo, ListenerId, WeakEmitter};

/// Payload of `change:<name>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange<T> {
    pub name: SmolStr,
    pub old: T,
    pub new: T,
}

/// Payload of `set:<name>`, fired before the value is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySet<T> {
    pub name: SmolStr,
    pub value: T,
    pub old: T,
}

/// An emitter plus an event name: something a computed binding can follow.
#[derive(Clone)]
pub struct Trigger {
    emitter: Emitter,
    event: SmolStr,
}

impl Trigger {
    pub fn new(emitter: &Emitter, event: impl Into<SmolStr>) -> Self {
        Self {
            emitter: emitter.clone(),
            event: event.into(),
        }
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn event(&self) -> &str {
        &self.event
    }
}

struct Binding {
    owner: WeakEmitter,
    subscriptions: Vec<(Emitter, ListenerId)>,
}

/// A named observable value. Cloning yields another handle to the same slot.
#[derive(Clone)]
pub struct Property<T> {
    name: SmolStr,
    value: Rc<RefCell<T>>,
    owner: Emitter,
    binding: Rc<RefCell<Option<Binding>>>,
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    pub fn new(owner: &Emitter, name: impl Into<SmolStr>, initial: T) -> Self {
        Self {
            name: name.into(),
            value: Rc::new(RefCell::new(initial)),
            owner: owner.clone(),
            binding: Rc::new(RefCell::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &Emitter {
        &self.owner
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Write the value. Returns whether `change:<name>` was fired.
    pub fn set(&self, value: T) -> bool {
        let old = self.get();
        let mut value = value;

        let set_event = format!("set:{}", self.name);
        if self.owner.has_listeners(&set_event) {
            let payload = PropertySet {
                name: self.name.clone(),
                value: value.clone(),
                old: old.clone(),
            };
            if let Some(replaced) = self
                .owner
                .fire(&set_event, &payload)
                .and_then(|r| r.downcast::<T>().ok())
            {
                value = *replaced;
            }
        }

        if value == old {
            return false;
        }
        *self.value.borrow_mut() = value.clone();
        self.owner.fire(
            &self.change_event(),
            &PropertyChange {
                name: self.name.clone(),
                old,
                new: value,
            },
        );
        true
    }

    /// `change:<name>`
    pub fn change_event(&self) -> SmolStr {
        smol_str::format_smolstr!("change:{}", self.name)
    }

    pub fn trigger(&self) -> Trigger {
        Trigger::new(&self.owner, self.change_event())
    }

    /// Listen to changes on the owning emitter.
    pub fn on_change(&self, callback: impl Fn(&PropertyChange<T>) + 'static) -> ListenerId {
        self.owner
            .on(&self.change_event(), move |_: &mut EventInfo, change: &PropertyChange<T>| {
                callback(change)
            })
    }

    /// Listen to changes as `listener`, so that `listener.stop_listening()`
    /// removes the subscription.
    pub fn listen_change(
        &self,
        listener: &Emitter,
        callback: impl Fn(&PropertyChange<T>) + 'static,
    ) -> ListenerId {
        listener.listen_to(
            &self.owner,
            &self.change_event(),
            move |_: &mut EventInfo, change: &PropertyChange<T>| callback(change),
        )
    }

    /// Mirror `source` one way. The current value is copied immediately.
    /// Any previous binding is replaced.
    pub fn bind_to(&self, source: &Property<T>) {
        self.bind_to_with(source, T::clone);
    }

    /// Mirror `source` through `map`.
    pub fn bind_to_with<S: Clone + PartialEq + 'static>(
        &self,
        source: &Property<S>,
        map: impl Fn(&S) -> T + 'static,
    ) {
        let source_value = source.clone();
        self.bind_computed(&[source.trigger()], move || source_value.with(&map));
    }

    /// Recompute the value with `compute` whenever any trigger fires.
    pub fn bind_computed(&self, triggers: &[Trigger], compute: impl Fn() -> T + 'static) {
        self.unbind();
        let compute = Rc::new(compute);
        let mut subscriptions = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            let target = self.clone();
            let compute = compute.clone();
            let id = self.owner.listen_to_any(
                &trigger.emitter,
                &trigger.event,
                Default::default(),
                Rc::new(move |_: &mut EventInfo, _: &dyn std::any::Any| {
                    target.set(compute());
                }),
            );
            subscriptions.push((trigger.emitter.clone(), id));
        }
        *self.binding.borrow_mut() = Some(Binding {
            owner: self.owner.downgrade(),
            subscriptions,
        });
        self.set(compute());
    }

    pub fn is_bound(&self) -> bool {
        self.binding.borrow().is_some()
    }

    /// Drop the binding. The current value stays.
    pub fn unbind(&self) {
        let Some(binding) = self.binding.borrow_mut().take() else {
            return;
        };
        let Some(owner) = binding.owner.upgrade() else {
            return;
        };
        for (emitter, id) in binding.subscriptions {
            owner.stop_listening(Some(&emitter), None, Some(id));
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &self.value.borrow())
            .finish()
    }
}
