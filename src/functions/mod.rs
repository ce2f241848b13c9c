pub mod correlate;
pub mod launcher;
pub mod lister;
pub mod triage;

#[cfg(test)]
pub(crate) mod testing;

pub use correlate::*;
pub use launcher::*;
pub use lister::*;
pub use triage::*;
