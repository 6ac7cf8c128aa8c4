//! Type definitions for telcoask

mod error;
mod record;
mod report;

pub use error::*;
pub use record::*;
pub use report::*;
