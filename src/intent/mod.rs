pub mod finalized_plan;

pub use finalized_plan::*;
