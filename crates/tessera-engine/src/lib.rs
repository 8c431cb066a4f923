//! The editing engine tessera editors are assembled around.
//!
//! A deliberately small engine: a [`Model`] of named roots holding block
//! elements and text, a [`Conversion`] between model elements and DOM tags,
//! the [`DataController`] reading and writing HTML, and the
//! [`EditingView`] rendering model roots into attached DOM roots.

pub mod controller;
pub mod conversion;
pub mod data;
pub mod model;
pub mod placeholder;
pub mod schema;
pub mod view;

pub use controller::EditingController;
pub use conversion::{Conversion, EmptyBlock};
pub use data::{DataController, HtmlDataProcessor, Trim};
pub use model::{ChangedRoots, Model, ModelElement, ModelNode, ModelPosition, Writer};
pub use placeholder::needs_placeholder;
pub use schema::{Schema, SchemaItem};
pub use view::EditingView;

pub use tessera_utils::{Error, Result};
