pub mod entity;
pub mod loader;
pub mod registry;

pub use entity::*;
pub use loader::*;
pub use registry::*;
