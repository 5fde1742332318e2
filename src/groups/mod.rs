//! Group ordering: sequences, validation orders and the generator that
//! builds them from requested groups.

pub mod generator;
pub mod order;
pub mod sequence;

pub use generator::ValidationOrderGenerator;
pub use order::ValidationOrder;
pub use sequence::{GroupWithInheritance, Sequence};
