//! Foundation layer of the tessera editor framework.
//!
//! Everything above this crate is built from a few primitives:
//!
//! - [`Emitter`]: named events with priorities, namespaces and delegation
//! - [`Property`]: observable values announcing `change:<name>`
//! - [`dom`]: the headless document the UI renders into
//! - the DOM emitter bridge ([`Emitter::listen_to_dom`])
//! - [`FocusTracker`] and [`KeystrokeHandler`]

pub mod dom;
pub mod dom_emitter;
pub mod emitter;
pub mod env;
pub mod error;
pub mod focus_tracker;
pub mod keyboard;
pub mod keystroke_handler;
pub mod locale;
pub mod observable;
pub mod priorities;

pub use dom::{Document, DomEvent, Node, NodeId};
pub use dom_emitter::DomListenOptions;
pub use emitter::{
    Emitter, EmitterId, EventFilter, EventInfo, ListenOptions, ListenerId, WeakEmitter,
};
pub use env::Env;
pub use error::{Error, ErrorKind, Result};
pub use focus_tracker::{FocusTracker, HasOwnFocusTracker, Trackable};
pub use keyboard::{KeyEventData, Keystroke};
pub use keystroke_handler::{KeystrokeHandler, KeystrokeOptions};
pub use locale::{LanguageDirection, Locale};
pub use observable::{Property, PropertyChange, Trigger};
pub use priorities::Priority;

pub use smol_str::SmolStr;

/// Install a `tracing` subscriber for tests, honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
#[cfg(feature = "test-tracing")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
