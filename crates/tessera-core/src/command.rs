//! Commands: named editing actions with observable state.
//!
//! A command exposes `value` and `is_enabled` as properties so UI components
//! can bind to them. `is_enabled` can be locked to `false` with
//! [`Command::force_disabled`]; while any lock is held every attempt to
//! enable the command is overridden.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use smol_str::SmolStr;
use tessera_utils::observable::PropertySet;
use tessera_utils::{Emitter, Error, EventInfo, ListenOptions, Priority, Property, Result};

/// Lock held on data-changing commands while the editor is read-only.
pub const READ_ONLY_LOCK: &str = "readOnlyMode";

/// State shared by every command.
pub struct CommandBase {
    emitter: Emitter,
    pub value: Property<Value>,
    pub is_enabled: Property<bool>,
    affects_data: Cell<bool>,
    locks: Rc<RefCell<Vec<SmolStr>>>,
}

impl CommandBase {
    pub fn new() -> Self {
        let emitter = Emitter::new();
        let locks: Rc<RefCell<Vec<SmolStr>>> = Rc::default();
        {
            let locks = locks.clone();
            emitter.on_with(
                "set:isEnabled",
                ListenOptions::priority(Priority::Highest),
                move |info: &mut EventInfo, _: &PropertySet<bool>| {
                    if !locks.borrow().is_empty() {
                        info.set_return(false);
                        info.stop();
                    }
                },
            );
        }
        Self {
            value: Property::new(&emitter, "value", Value::Null),
            is_enabled: Property::new(&emitter, "isEnabled", false),
            affects_data: Cell::new(true),
            locks,
            emitter,
        }
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled.get()
    }

    pub fn value(&self) -> Value {
        self.value.get()
    }

    /// Whether executing the command changes editor data. Such commands are
    /// disabled in read-only mode.
    pub fn affects_data(&self) -> bool {
        self.affects_data.get()
    }

    pub fn set_affects_data(&self, affects_data: bool) {
        self.affects_data.set(affects_data);
    }

    pub fn is_locked(&self) -> bool {
        !self.locks.borrow().is_empty()
    }

    fn add_lock(&self, id: &str) {
        {
            let mut locks = self.locks.borrow_mut();
            if !locks.iter().any(|lock| lock == id) {
                locks.push(SmolStr::new(id));
            }
        }
        self.is_enabled.set(false);
    }

    /// Returns whether `id` was held.
    fn remove_lock(&self, id: &str) -> bool {
        let mut locks = self.locks.borrow_mut();
        let before = locks.len();
        locks.retain(|lock| lock != id);
        locks.len() != before
    }
}

impl Default for CommandBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBase")
            .field("value", &self.value.get())
            .field("is_enabled", &self.is_enabled.get())
            .field("locks", &self.locks.borrow())
            .finish()
    }
}

pub trait Command: 'static {
    fn base(&self) -> &CommandBase;

    /// Recompute `value` and `is_enabled` from the editor state. The default
    /// simply enables the command.
    fn refresh(&self) {
        self.base().is_enabled.set(true);
    }

    fn execute(&self, options: &Value) -> Result<()>;

    /// Disable the command until `clear_force_disabled` is called with the
    /// same `id`. Locks with different ids stack.
    fn force_disabled(&self, id: &str) {
        self.base().add_lock(id);
    }

    fn clear_force_disabled(&self, id: &str) {
        if self.base().remove_lock(id) {
            self.refresh();
        }
    }

    fn destroy(&self) {
        self.base().emitter().stop_listening(None, None, None);
    }
}

/// The commands registered in an editor, by name.
#[derive(Clone, Default)]
pub struct CommandCollection {
    inner: Rc<CommandsInner>,
}

#[derive(Default)]
struct CommandsInner {
    commands: RefCell<Vec<(SmolStr, Rc<dyn Command>)>>,
    read_only: Cell<bool>,
}

impl CommandCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` as `name`, replacing a previous registration.
    pub fn add(&self, name: &str, command: Rc<dyn Command>) {
        if self.inner.read_only.get() && command.base().affects_data() {
            command.force_disabled(READ_ONLY_LOCK);
        }
        command.refresh();
        let mut commands = self.inner.commands.borrow_mut();
        match commands.iter_mut().find(|(registered, _)| registered == name) {
            Some((_, slot)) => {
                tracing::debug!(command = name, "replacing command");
                *slot = command;
            }
            None => commands.push((SmolStr::new(name), command)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Command>> {
        self.inner
            .commands
            .borrow()
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, command)| command.clone())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<SmolStr> {
        self.inner
            .commands
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Execute `name` if it is enabled. Returns whether it ran.
    pub fn execute(&self, name: &str, options: &Value) -> Result<bool> {
        let command = self.get(name).ok_or_else(|| Error::CommandNotFound {
            name: SmolStr::new(name),
        })?;
        if !command.base().is_enabled() {
            tracing::debug!(command = name, "not executing a disabled command");
            return Ok(false);
        }
        command.execute(options)?;
        command.base().emitter().fire("execute", options);
        Ok(true)
    }

    pub fn refresh_all(&self) {
        for command in self.commands() {
            command.refresh();
        }
    }

    /// Lock or unlock every data-changing command, now and when added
    /// later.
    pub(crate) fn set_read_only(&self, read_only: bool) {
        self.inner.read_only.set(read_only);
        for command in self.commands() {
            if !command.base().affects_data() {
                continue;
            }
            if read_only {
                command.force_disabled(READ_ONLY_LOCK);
            } else {
                command.clear_force_disabled(READ_ONLY_LOCK);
            }
        }
    }

    fn commands(&self) -> Vec<Rc<dyn Command>> {
        self.inner
            .commands
            .borrow()
            .iter()
            .map(|(_, command)| command.clone())
            .collect()
    }

    pub fn destroy(&self) {
        let commands = std::mem::take(&mut *self.inner.commands.borrow_mut());
        for (_, command) in commands {
            command.destroy();
        }
    }
}

impl fmt::Debug for CommandCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use tessera_utils::ErrorKind;

    #[derive(Default)]
    struct Counter {
        base: CommandBase,
        runs: Cell<u32>,
    }

    impl Command for Counter {
        fn base(&self) -> &CommandBase {
            &self.base
        }

        fn execute(&self, _options: &Value) -> Result<()> {
            self.runs.set(self.runs.get() + 1);
            self.base.value.set(Value::from(self.runs.get()));
            Ok(())
        }
    }

    #[test]
    fn force_disabled_locks_stack() {
        let command = Counter::default();
        command.refresh();
        assert!(command.base.is_enabled());

        command.force_disabled("a");
        command.force_disabled("b");
        command.refresh();
        assert!(!command.base.is_enabled());

        command.clear_force_disabled("a");
        assert!(!command.base.is_enabled());
        command.clear_force_disabled("b");
        assert!(command.base.is_enabled());
    }

    #[test]
    fn disabled_commands_do_not_execute() {
        let commands = CommandCollection::new();
        let counter = Rc::new(Counter::default());
        commands.add("count", counter.clone());

        assert!(commands.execute("count", &Value::Null).unwrap());
        counter.force_disabled("test");
        assert!(!commands.execute("count", &Value::Null).unwrap());
        assert_eq!(counter.runs.get(), 1);
        assert_eq!(counter.base.value(), Value::from(1));

        let missing = commands.execute("bold", &Value::Null).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::CommandNotFound);
    }

    #[test]
    fn read_only_locks_data_commands_only() {
        let commands = CommandCollection::new();
        let edit = Rc::new(Counter::default());
        let find = Rc::new(Counter::default());
        find.base.set_affects_data(false);
        commands.add("edit", edit.clone());
        commands.add("find", find.clone());

        commands.set_read_only(true);
        assert!(!edit.base.is_enabled());
        assert!(find.base.is_enabled());

        let late = Rc::new(Counter::default());
        commands.add("late", late.clone());
        assert!(!late.base.is_enabled());

        commands.set_read_only(false);
        assert!(edit.base.is_enabled());
        assert!(late.base.is_enabled());
    }
}
