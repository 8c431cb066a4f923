//! Editor-wide keystrokes, bound either to callbacks or to commands.

use std::fmt;

use serde_json::Value;
use smol_str::SmolStr;
use tessera_utils::dom::Node;
use tessera_utils::keyboard::KeyEventData;
use tessera_utils::{
    Emitter, Env, Keystroke, KeystrokeHandler, KeystrokeOptions, ListenerId, Result,
};

use crate::command::CommandCollection;

/// A [`KeystrokeHandler`] that can also execute commands by name.
#[derive(Clone)]
pub struct EditingKeystrokeHandler {
    handler: KeystrokeHandler,
    commands: CommandCollection,
}

impl EditingKeystrokeHandler {
    pub fn new(commands: &CommandCollection, env: Env) -> Self {
        Self {
            handler: KeystrokeHandler::with_env(env),
            commands: commands.clone(),
        }
    }

    pub fn handler(&self) -> &KeystrokeHandler {
        &self.handler
    }

    pub fn env(&self) -> Env {
        self.handler.env()
    }

    pub fn set(
        &self,
        keystroke: impl Into<Keystroke>,
        options: KeystrokeOptions,
        callback: impl Fn(&KeyEventData, &dyn Fn()) + 'static,
    ) -> Result<ListenerId> {
        self.handler.set(keystroke, options, callback)
    }

    /// Execute `command` on `keystroke` and cancel the key event. A disabled
    /// command leaves the event alone.
    pub fn set_command(
        &self,
        keystroke: impl Into<Keystroke>,
        command: &str,
        options: KeystrokeOptions,
    ) -> Result<ListenerId> {
        let commands = self.commands.clone();
        let command = SmolStr::new(command);
        self.handler.set(keystroke, options, move |_, cancel| {
            match commands.execute(&command, &Value::Null) {
                Ok(true) => cancel(),
                Ok(false) => {}
                Err(err) => tracing::warn!(%err, %command, "keystroke command failed"),
            }
        })
    }

    pub fn remove(&self, keystroke: impl Into<Keystroke>, listener: ListenerId) -> Result<bool> {
        self.handler.remove(keystroke, listener)
    }

    pub fn listen_to(&self, emitter: &Emitter) {
        self.handler.listen_to(emitter);
    }

    pub fn listen_to_dom(&self, node: &Node) {
        self.handler.listen_to_dom(node);
    }

    pub fn press(&self, data: &KeyEventData) -> bool {
        self.handler.press(data)
    }

    pub fn destroy(&self) {
        self.handler.destroy();
    }
}

impl fmt::Debug for EditingKeystrokeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditingKeystrokeHandler")
            .field("env", &self.env())
            .finish()
    }
}
