pub mod border;
pub mod length;
pub mod parsers;
pub mod prop_map;
pub mod style;
pub mod tabstop;

pub use border::{Border, BorderStyle};
pub use length::{Length, Unit};
pub use prop_map::PropMap;
pub use style::{Style, StyleTable};
pub use tabstop::{Leader, TabAlign, TabStop};
