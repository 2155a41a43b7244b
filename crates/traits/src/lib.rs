pub mod consumer;
pub mod input;

pub use consumer::Consumer;
pub use input::{Input, SeekFrom};
