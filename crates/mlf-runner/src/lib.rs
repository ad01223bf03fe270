pub mod config;
pub mod doctor;
pub mod report;
pub mod runner;
pub mod util;

pub use config::*;
pub use doctor::*;
pub use report::*;
pub use runner::*;
pub use util::*;
