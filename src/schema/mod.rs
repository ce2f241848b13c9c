pub mod job;
pub mod log_entry;

pub use job::*;
pub use log_entry::*;
