pub mod engine;
pub mod model;
pub mod policy;
pub mod predicates;

pub use engine::*;
pub use model::*;
pub use policy::*;
pub use predicates::*;
