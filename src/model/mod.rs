pub use comment::*;
pub use timestamp::*;
pub use video::*;

mod comment;
mod timestamp;
mod video;
