//! `Input` trait for abstracting the byte-stream a document is read from.
//!
//! This abstraction allows the converter to run over a file, an in-memory
//! buffer, or any other random-access byte source without being tied to
//! `std::fs`. The two-pass core needs `seek` (it rewinds to the start
//! between the styles pre-pass and the content pass); it does not need
//! anything else from the underlying transport.

use std::fmt::Debug;

/// The origin a [`Input::seek`] offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Set,
    Cur,
}

/// A random-access byte stream.
///
/// # Implementations
///
/// - A wrapper over `std::fs::File` or `std::io::Cursor` (host-provided;
///   out of scope for this crate, see spec.md §1's "external collaborators").
/// - `abw-core`'s `Decompressor`, which wraps an `Input` and transparently
///   materializes gzip-compressed streams into a seekable memory buffer.
pub trait Input: Debug {
    /// Reads up to `n` bytes, advancing the stream position. Short reads
    /// are allowed; an empty return means end of stream.
    fn read(&mut self, n: usize) -> Vec<u8>;

    /// Repositions the stream. `whence == Cur` offsets are relative to the
    /// current position; `whence == Set` offsets are absolute.
    fn seek(&mut self, offset: i64, whence: SeekFrom);

    /// The current stream position, in bytes from the start.
    fn tell(&self) -> u64;

    /// True once no further bytes are available to `read`.
    fn eof(&self) -> bool;
}

/// Forwards through a trait-object reference so owning wrappers generic
/// over `I: Input` (e.g. `abw-core`'s `Decompressor`) can wrap a caller's
/// `&mut dyn Input` without the caller giving up ownership of the real
/// stream.
impl Input for &mut dyn Input {
    fn read(&mut self, n: usize) -> Vec<u8> {
        (**self).read(n)
    }

    fn seek(&mut self, offset: i64, whence: SeekFrom) {
        (**self).seek(offset, whence)
    }

    fn tell(&self) -> u64 {
        (**self).tell()
    }

    fn eof(&self) -> bool {
        (**self).eof()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SliceInput<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl Input for SliceInput<'_> {
        fn read(&mut self, n: usize) -> Vec<u8> {
            let end = (self.pos + n).min(self.data.len());
            let chunk = self.data[self.pos..end].to_vec();
            self.pos = end;
            chunk
        }

        fn seek(&mut self, offset: i64, whence: SeekFrom) {
            let base = match whence {
                SeekFrom::Set => 0,
                SeekFrom::Cur => self.pos as i64,
            };
            self.pos = (base + offset).clamp(0, self.data.len() as i64) as usize;
        }

        fn tell(&self) -> u64 {
            self.pos as u64
        }

        fn eof(&self) -> bool {
            self.pos >= self.data.len()
        }
    }

    #[test]
    fn reads_advance_position_and_report_eof() {
        let mut input = SliceInput {
            data: b"hello",
            pos: 0,
        };
        assert_eq!(input.read(3), b"hel".to_vec());
        assert!(!input.eof());
        assert_eq!(input.read(10), b"lo".to_vec());
        assert!(input.eof());
    }

    #[test]
    fn seek_set_rewinds_to_absolute_offset() {
        let mut input = SliceInput {
            data: b"hello",
            pos: 4,
        };
        input.seek(0, SeekFrom::Set);
        assert_eq!(input.tell(), 0);
    }

    #[test]
    fn trait_object_reference_forwards_every_call() {
        let mut input = SliceInput {
            data: b"hello",
            pos: 0,
        };
        let mut dyn_input: &mut dyn Input = &mut input;
        assert_eq!(Input::read(&mut dyn_input, 2), b"he".to_vec());
        Input::seek(&mut dyn_input, 0, SeekFrom::Set);
        assert_eq!(Input::tell(&dyn_input), 0);
        assert!(!Input::eof(&dyn_input));
    }
}
