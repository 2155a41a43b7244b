// --- Module Structure ---
// `abw-traits`: `Input`/`Consumer`, the two seams between this crate and
//                the host application's own I/O and document model.
// `abw-types`:  Primitive value types (color) shared across passes.
// `abw-style`:  Property-string parsing and the style/list tables.
// `abw-idf`:    The output event vocabulary (`OutputElement`) and
//                `PropertyList`.
// `abw-core`:   The two-pass parsing engine itself: decompression, the
//                XML pull parser, both collectors, and the dispatcher.
//
// This crate is a thin facade over `abw-core`; it exists so a consumer
// depends on one package name and gets the whole stack's public surface
// through a single `use`.

pub use abw_core::{is_file_format_supported, parse, ConvertError, ConvertOptions, Location};
pub use abw_idf::{OutputElement, PropertyList, PropertyValue};
pub use abw_traits::{Consumer, Input, SeekFrom};
