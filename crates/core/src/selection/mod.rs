//! Media file selection and candidate ranking.

mod classifier;
mod media;
mod preference;
mod ranking;
mod types;

pub use classifier::*;
pub use media::*;
pub use preference::*;
pub use ranking::*;
pub use types::*;
