pub mod clock;
pub mod dataflow;
pub mod http;
pub mod logging;
pub mod summarizer;

pub use clock::*;
pub use dataflow::*;
pub use logging::*;
pub use summarizer::*;
