//! Gzip auto-detecting wrapper over [`Input`] (spec.md §4.1).
//!
//! The two-pass core needs `seek(0)` between the styles pre-pass and the
//! content pass; a gzip member is not seekable in general, so a detected
//! stream is fully inflated into memory up front and served from that
//! buffer. A stream that does not start with the gzip magic is served as a
//! transparent pass-through with no extra copy.

use std::io::Read;

use flate2::read::GzDecoder;

use abw_traits::{Input, SeekFrom};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

enum Mode<I: Input> {
    PassThrough(I),
    Inflated { buffer: Vec<u8>, pos: usize },
}

/// `Input` implementation that is either the raw stream or a fully
/// materialized inflated buffer, selected once at construction time.
pub struct Decompressor<I: Input> {
    mode: Mode<I>,
}

impl<I: Input> Decompressor<I> {
    pub fn new(mut input: I) -> Self {
        let magic = input.read(2);
        input.seek(0, SeekFrom::Set);
        if magic.as_slice() == GZIP_MAGIC {
            match inflate_all(&mut input) {
                Ok(buffer) => {
                    return Decompressor {
                        mode: Mode::Inflated { buffer, pos: 0 },
                    };
                }
                Err(_) => {
                    // InflateFailed never propagates (spec.md §7): fall
                    // back to treating the bytes as plain XML.
                    input.seek(0, SeekFrom::Set);
                }
            }
        }
        Decompressor {
            mode: Mode::PassThrough(input),
        }
    }
}

fn inflate_all<I: Input>(input: &mut I) -> std::io::Result<Vec<u8>> {
    struct Adapter<'a, I: Input> {
        input: &'a mut I,
    }
    impl<I: Input> Read for Adapter<'_, I> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let chunk = self.input.read(buf.len());
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    let mut decoder = GzDecoder::new(Adapter { input });
    let mut buffer = Vec::new();
    decoder.read_to_end(&mut buffer)?;
    Ok(buffer)
}

impl<I: Input> Input for Decompressor<I> {
    fn read(&mut self, n: usize) -> Vec<u8> {
        match &mut self.mode {
            Mode::PassThrough(inner) => inner.read(n),
            Mode::Inflated { buffer, pos } => {
                let end = (*pos + n).min(buffer.len());
                let chunk = buffer[*pos..end].to_vec();
                *pos = end;
                chunk
            }
        }
    }

    fn seek(&mut self, offset: i64, whence: SeekFrom) {
        match &mut self.mode {
            Mode::PassThrough(inner) => inner.seek(offset, whence),
            Mode::Inflated { buffer, pos } => {
                let base = match whence {
                    SeekFrom::Set => 0,
                    SeekFrom::Cur => *pos as i64,
                };
                *pos = (base + offset).clamp(0, buffer.len() as i64) as usize;
            }
        }
    }

    fn tell(&self) -> u64 {
        match &self.mode {
            Mode::PassThrough(inner) => inner.tell(),
            Mode::Inflated { pos, .. } => *pos as u64,
        }
    }

    fn eof(&self) -> bool {
        match &self.mode {
            Mode::PassThrough(inner) => inner.eof(),
            Mode::Inflated { buffer, pos } => *pos >= buffer.len(),
        }
    }
}

impl<I: Input> std::fmt::Debug for Decompressor<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.mode {
            Mode::PassThrough(_) => write!(f, "Decompressor::PassThrough"),
            Mode::Inflated { buffer, pos } => {
                write!(f, "Decompressor::Inflated({}/{})", pos, buffer.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SliceInput {
        data: Vec<u8>,
        pos: usize,
    }

    impl Input for SliceInput {
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

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn plain_xml_is_served_unchanged() {
        let xml = b"<abiword></abiword>".to_vec();
        let mut dec = Decompressor::new(SliceInput {
            data: xml.clone(),
            pos: 0,
        });
        assert_eq!(dec.read(xml.len()), xml);
    }

    #[test]
    fn gzip_stream_inflates_transparently() {
        let xml = b"<abiword><section><p/></section></abiword>".to_vec();
        let compressed = gzip(&xml);
        let mut dec = Decompressor::new(SliceInput {
            data: compressed,
            pos: 0,
        });
        assert_eq!(dec.read(xml.len()), xml);
    }

    #[test]
    fn seek_to_zero_rewinds_an_inflated_stream() {
        let xml = b"<a><b/></a>".to_vec();
        let compressed = gzip(&xml);
        let mut dec = Decompressor::new(SliceInput {
            data: compressed,
            pos: 0,
        });
        dec.read(3);
        dec.seek(0, SeekFrom::Set);
        assert_eq!(dec.tell(), 0);
        assert_eq!(dec.read(xml.len()), xml);
    }
}
