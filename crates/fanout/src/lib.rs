//! Press-and-hold radial action menus: layout, hover tracking, gesture
//! recognition and a single-slot overlay host, independent of any toolkit.

#[macro_use]
mod macros;

pub mod action;
pub mod anim;
pub mod config;
pub mod dispatch;
pub mod geom;
pub mod gesture;
pub mod haptics;
pub mod hover;
pub mod layout;
pub mod menu;
pub mod overlay;
pub mod replay;
pub mod services;
pub mod signal;

pub use action::{ActionId, ActionSpec, Icon, Symbol};
pub use config::RadialConfig;
pub use geom::{Point, Rect, Size};
