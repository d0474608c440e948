pub mod view;

pub use view::{IconCache, draw};
