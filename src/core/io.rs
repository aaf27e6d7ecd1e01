//! Input/output plumbing
//!
//! Opens annotation and table inputs with the right decoder (plain,
//! memory-mapped, gzip, bzip2 or stdin) and hands out buffered writers.

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Threshold for using memory mapping (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Compression format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Plain,
    Gzip,
    Bzip2,
}

/// Detect compression from the extension, falling back to magic bytes
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if extension == "gz" {
        return Ok(CompressionFormat::Gzip);
    }
    if extension == "bz2" {
        return Ok(CompressionFormat::Bzip2);
    }

    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let bytes_read = file.read(&mut magic)?;

    Ok(compression_from_magic(&magic[..bytes_read]))
}

fn compression_from_magic(magic: &[u8]) -> CompressionFormat {
    if magic.starts_with(&[0x1f, 0x8b]) {
        CompressionFormat::Gzip
    } else if magic.starts_with(b"BZh") {
        CompressionFormat::Bzip2
    } else {
        CompressionFormat::Plain
    }
}

/// Memory-mapped file reader
pub struct MappedReader {
    mmap: Mmap,
    position: usize,
}

impl MappedReader {
    /// Create a new memory-mapped reader
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: We assume the file won't be modified while mapped
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap, position: 0 })
    }

    /// Get file size
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.mmap[self.position..];
        let to_read = std::cmp::min(buf.len(), remaining.len());
        buf[..to_read].copy_from_slice(&remaining[..to_read]);
        self.position += to_read;
        Ok(to_read)
    }
}

impl BufRead for MappedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.mmap[self.position..])
    }

    fn consume(&mut self, amt: usize) {
        self.position = std::cmp::min(self.position + amt, self.mmap.len());
    }
}

/// A reader that picks its decoding strategy from the input
pub enum InputReader {
    /// Plain file, buffered
    Buffered(BufReader<File>),
    /// Plain file above [`MMAP_THRESHOLD`]
    Mapped(MappedReader),
    /// gzip or bgzip compressed file
    Gzip(BufReader<MultiGzDecoder<File>>),
    /// bzip2 compressed file
    Bzip2(BufReader<BzDecoder<File>>),
    /// Standard input
    Stdin(BufReader<io::Stdin>),
}

impl InputReader {
    /// Open a file, detecting compression
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let format = detect_compression(path)?;
        let file = File::open(path)?;
        debug!("Opening {:?} as {:?}", path, format);

        match format {
            CompressionFormat::Gzip => Ok(InputReader::Gzip(BufReader::with_capacity(
                DEFAULT_BUFFER_SIZE,
                MultiGzDecoder::new(file),
            ))),
            CompressionFormat::Bzip2 => Ok(InputReader::Bzip2(BufReader::with_capacity(
                DEFAULT_BUFFER_SIZE,
                BzDecoder::new(file),
            ))),
            CompressionFormat::Plain => {
                if file.metadata()?.len() >= MMAP_THRESHOLD {
                    Ok(InputReader::Mapped(MappedReader::new(&file)?))
                } else {
                    Ok(InputReader::Buffered(BufReader::with_capacity(
                        DEFAULT_BUFFER_SIZE,
                        file,
                    )))
                }
            }
        }
    }

    /// Read from standard input
    pub fn stdin() -> Self {
        InputReader::Stdin(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, io::stdin()))
    }

    /// Open `path`, or standard input when no path is given
    pub fn open_or_stdin<P: AsRef<Path>>(path: Option<P>) -> io::Result<Self> {
        match path {
            Some(p) => Self::open(p),
            None => Ok(Self::stdin()),
        }
    }

    /// Check if using memory mapping
    pub fn is_mapped(&self) -> bool {
        matches!(self, InputReader::Mapped(_))
    }
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputReader::Buffered(reader) => reader.read(buf),
            InputReader::Mapped(reader) => reader.read(buf),
            InputReader::Gzip(reader) => reader.read(buf),
            InputReader::Bzip2(reader) => reader.read(buf),
            InputReader::Stdin(reader) => reader.read(buf),
        }
    }
}

impl BufRead for InputReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            InputReader::Buffered(reader) => reader.fill_buf(),
            InputReader::Mapped(reader) => reader.fill_buf(),
            InputReader::Gzip(reader) => reader.fill_buf(),
            InputReader::Bzip2(reader) => reader.fill_buf(),
            InputReader::Stdin(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            InputReader::Buffered(reader) => reader.consume(amt),
            InputReader::Mapped(reader) => reader.consume(amt),
            InputReader::Gzip(reader) => reader.consume(amt),
            InputReader::Bzip2(reader) => reader.consume(amt),
            InputReader::Stdin(reader) => reader.consume(amt),
        }
    }
}

/// Buffered writer to `path`, or standard output when no path is given
pub fn create_writer<P: AsRef<Path>>(path: Option<P>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            let file = File::create(p.as_ref())?;
            Ok(Box::new(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file)))
        }
        None => Ok(Box::new(BufWriter::with_capacity(
            DEFAULT_BUFFER_SIZE,
            io::stdout(),
        ))),
    }
}

/// Line iterator that reuses a buffer to avoid allocations
pub struct LineIterator<R: BufRead> {
    reader: R,
    buffer: String,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next line into the internal buffer
    /// Returns None at EOF, Some(Ok(&str)) on success, Some(Err) on error
    pub fn next_line(&mut self) -> Option<io::Result<&str>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None, // EOF
            Ok(_) => {
                // Remove trailing newline
                if self.buffer.ends_with('\n') {
                    self.buffer.pop();
                    if self.buffer.ends_with('\r') {
                        self.buffer.pop();
                    }
                }
                Some(Ok(&self.buffer))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_compression_from_magic() {
        assert_eq!(compression_from_magic(&[0x1f, 0x8b, 0x08]), CompressionFormat::Gzip);
        assert_eq!(compression_from_magic(b"BZh"), CompressionFormat::Bzip2);
        assert_eq!(compression_from_magic(b"##g"), CompressionFormat::Plain);
        assert_eq!(compression_from_magic(b""), CompressionFormat::Plain);
    }

    #[test]
    fn test_detect_compression_by_extension() -> io::Result<()> {
        let temp = tempfile::Builder::new().suffix(".gz").tempfile()?;
        assert_eq!(detect_compression(temp.path())?, CompressionFormat::Gzip);
        Ok(())
    }

    #[test]
    fn test_plain_input_is_buffered() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "small file content")?;

        let reader = InputReader::open(temp.path())?;
        assert!(!reader.is_mapped());
        Ok(())
    }

    #[test]
    fn test_gzip_input_without_extension() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"line1\nline2\n")?;
        temp.write_all(&encoder.finish()?)?;
        temp.flush()?;

        let mut iter = LineIterator::new(InputReader::open(temp.path())?);
        assert_eq!(iter.next_line().unwrap()?, "line1");
        assert_eq!(iter.next_line().unwrap()?, "line2");
        assert!(iter.next_line().is_none());
        Ok(())
    }

    #[test]
    fn test_line_iterator_strips_line_endings() -> io::Result<()> {
        let data = "line1\r\nline2\n\nline4";
        let mut iter = LineIterator::new(data.as_bytes());

        assert_eq!(iter.next_line().unwrap()?, "line1");
        assert_eq!(iter.next_line().unwrap()?, "line2");
        assert_eq!(iter.next_line().unwrap()?, "");
        assert_eq!(iter.next_line().unwrap()?, "line4");
        assert!(iter.next_line().is_none());
        Ok(())
    }

    #[test]
    fn test_mapped_reader_reads_all() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(b"test content")?;
        temp.flush()?;

        let file = File::open(temp.path())?;
        let mut reader = MappedReader::new(&file)?;
        assert_eq!(reader.len(), 12);
        assert!(!reader.is_empty());

        let mut out = String::new();
        reader.read_to_string(&mut out)?;
        assert_eq!(out, "test content");
        Ok(())
    }
}
