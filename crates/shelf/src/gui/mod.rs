pub mod app;
pub mod card;
pub mod nav;
pub mod radial;
pub mod theme;
pub mod toast;
