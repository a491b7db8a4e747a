pub mod recorder;
pub mod strategies;
pub mod taxonomy;

pub use recorder::*;
pub use strategies::*;
pub use taxonomy::*;
