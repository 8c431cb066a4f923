//! View framework and UI components.
//!
//! Views are built from a [`Template`] whose attributes and text can be
//! bound to [`Property`](tessera_utils::Property) values, and composed
//! through [`ViewCollection`]s. Components that manage focus among their
//! children own a [`FocusTracker`](tessera_utils::FocusTracker) and a
//! [`KeystrokeHandler`](tessera_utils::KeystrokeHandler), and expose them to
//! parent trackers through [`View::focus_scope`].

pub mod button;
pub mod colorgrid;
pub mod colorselector;
pub mod component_factory;
pub mod dropdown;
pub mod editable;
pub mod focus_cycler;
pub mod menubar;
pub mod template;
pub mod toolbar;
pub mod view;
pub mod view_collection;

pub use button::ButtonView;
pub use colorgrid::{ColorDefinition, ColorGridView, ColorPick, ColorPickSource, ColorTileView};
pub use colorselector::ColorSelectorView;
pub use component_factory::ComponentFactory;
pub use dropdown::{DropdownPanelView, DropdownView};
pub use editable::{EditableUIView, InlineEditableUIView};
pub use focus_cycler::{FocusCycler, FocusCyclerActions};
pub use menubar::{MenuBarConfig, MenuBarView, MenuDefinition};
pub use template::{AttrPart, Bind, Template};
pub use toolbar::{ToolbarConfig, ToolbarOptions, ToolbarView};
pub use view::{TemplateView, View, ViewBase, ViewContext};
pub use view_collection::{CollectionChange, ViewCollection};

pub use tessera_utils::{Error, Result};
