#![forbid(unsafe_code)]

pub mod gesture;
pub mod model;
pub mod time;
pub mod working_set;

pub use time::Clock;
pub use working_set::derive_working_set;
