//! GFF3 format adapter
//!
//! Reading happens in two phases. [`GffReader::new`] consumes the leading
//! `#`/`##` header block eagerly; the reader is then a lazy, single-pass
//! iterator over the feature rows. Data lines are split strictly on tabs:
//! the first eight fields are the positional columns and everything from
//! the ninth field on (re-joined with tabs) is the attribute text.
//!
//! GFF uses 1-based coordinates, closed interval [start, end].

use crate::core::{
    FeatureColumns, FeatureRecord, GffError, GffResult, InputReader, LineIterator, LookupTable,
    MetadataBlock, MetadataLine,
};
use crate::formats::table::{write_feature_table, TableFormat};
use indexmap::IndexMap;
use log::{debug, trace};
use memchr::memchr_iter;
use std::borrow::Borrow;
use std::cell::OnceCell;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Split a line on tab characters only
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(9);
    let mut start = 0;
    for tab in memchr_iter(b'\t', line.as_bytes()) {
        fields.push(&line[start..tab]);
        start = tab + 1;
    }
    fields.push(&line[start..]);
    fields
}

/// Parse one data line into a record
///
/// `line_number` is only used for error reporting.
pub fn parse_record_line(line: &str, line_number: usize) -> GffResult<FeatureRecord> {
    let fields = split_fields(line);
    let positional = &fields[..fields.len().min(8)];

    let columns = FeatureColumns::from_fields(positional)
        .map_err(|e| GffError::malformed(line_number, e.to_string(), line))?;

    let attributes = if fields.len() > 8 {
        fields[8..].join("\t")
    } else {
        String::new()
    };

    Ok(FeatureRecord::with_raw_attributes(columns, &attributes))
}

/// Streaming GFF reader
///
/// ```
/// use bioino::formats::gff::GffReader;
///
/// let text = "##gff-version\t3\nseqA\tsrc\tgene\t1\t10\t.\t+\t.\tID=g1;Name=g1\n";
/// let reader = GffReader::new(text.as_bytes())?;
/// assert_eq!(reader.metadata().len(), 1);
///
/// let records = reader.collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(records[0].attribute("Name"), Some("g1"));
/// # Ok::<(), bioino::core::GffError>(())
/// ```
pub struct GffReader<R: BufRead> {
    lines: LineIterator<R>,
    metadata: MetadataBlock,
    pending: Option<GffResult<FeatureRecord>>,
    line_number: usize,
    records_read: usize,
    finished: bool,
}

impl GffReader<InputReader> {
    /// Open a (possibly compressed) GFF file
    pub fn open<P: AsRef<Path>>(path: P) -> GffResult<Self> {
        Self::new(InputReader::open(path)?)
    }
}

impl<R: BufRead> GffReader<R> {
    /// Read the header block; stops at the first data line
    pub fn new(reader: R) -> GffResult<Self> {
        let mut this = Self {
            lines: LineIterator::new(reader),
            metadata: MetadataBlock::default(),
            pending: None,
            line_number: 0,
            records_read: 0,
            finished: false,
        };

        while let Some(line) = this.lines.next_line() {
            let line = line?;
            this.line_number += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                this.metadata.push(MetadataLine::from_header_line(line)?);
                continue;
            }

            this.pending = Some(parse_record_line(line, this.line_number));
            break;
        }

        if this.pending.is_none() {
            this.finished = true;
        }
        debug!("GFF header: {} metadata lines", this.metadata.len());

        Ok(this)
    }

    /// The header block read by [`GffReader::new`]
    pub fn metadata(&self) -> &MetadataBlock {
        &self.metadata
    }

    /// Hand the header block out once, keeping the record stream
    pub fn into_parts(mut self) -> (MetadataBlock, Self) {
        let metadata = std::mem::take(&mut self.metadata);
        (metadata, self)
    }

    /// Records yielded so far
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn emit(&mut self, result: GffResult<FeatureRecord>) -> GffResult<FeatureRecord> {
        match &result {
            Ok(_) => self.records_read += 1,
            Err(_) => self.finished = true,
        }
        result
    }
}

impl<R: BufRead> Iterator for GffReader<R> {
    type Item = GffResult<FeatureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            return Some(self.emit(pending));
        }
        if self.finished {
            return None;
        }

        loop {
            let line = match self.lines.next_line() {
                None => {
                    self.finished = true;
                    debug!("GFF body: {} records", self.records_read);
                    return None;
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
                Some(Ok(line)) => line,
            };
            self.line_number += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                trace!("Skipping comment at line {}", self.line_number);
                continue;
            }

            let result = parse_record_line(line, self.line_number);
            return Some(self.emit(result));
        }
    }
}

/// Split a GFF stream into its header block and lazy record stream
pub fn read_gff<R: BufRead>(reader: R) -> GffResult<(MetadataBlock, GffReader<R>)> {
    Ok(GffReader::new(reader)?.into_parts())
}

/// Write the header block then one line per record
pub fn write_gff<W, I, B>(writer: &mut W, metadata: &MetadataBlock, records: I) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = B>,
    B: Borrow<FeatureRecord>,
{
    for line in metadata.lines() {
        writeln!(writer, "{}", line)?;
    }
    for record in records {
        writeln!(writer, "{}", record.borrow())?;
    }
    Ok(())
}

/// A fully read GFF file
///
/// Holds the header block and the materialized records. The lookup table
/// is built on first request and cached.
#[derive(Debug, Default)]
pub struct GffFile {
    metadata: MetadataBlock,
    records: Vec<FeatureRecord>,
    lookup: OnceCell<LookupTable>,
}

impl GffFile {
    pub fn new(metadata: MetadataBlock, records: Vec<FeatureRecord>) -> Self {
        Self {
            metadata,
            records,
            lookup: OnceCell::new(),
        }
    }

    /// Read and materialize every record
    pub fn from_reader<R: BufRead>(reader: R) -> GffResult<Self> {
        let (metadata, records) = read_gff(reader)?;
        let records = records.collect::<GffResult<Vec<_>>>()?;
        Ok(Self::new(metadata, records))
    }

    /// Read a (possibly compressed) GFF file
    pub fn open<P: AsRef<Path>>(path: P) -> GffResult<Self> {
        Self::from_reader(InputReader::open(path)?)
    }

    pub fn metadata(&self) -> &MetadataBlock {
        &self.metadata
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Coordinate lookup table over the parent features
    pub fn lookup_table(&self) -> GffResult<&LookupTable> {
        if let Some(table) = self.lookup.get() {
            return Ok(table);
        }
        let table = LookupTable::build(self.records.iter().cloned())?;
        Ok(self.lookup.get_or_init(|| table))
    }

    /// Records as flat column/attribute mappings
    pub fn flat_records(&self) -> impl Iterator<Item = IndexMap<String, String>> + '_ {
        self.records.iter().map(FeatureRecord::to_flat)
    }

    /// Re-serialize as GFF
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_gff(writer, &self.metadata, &self.records)
    }

    /// Write the flattened delimited table
    pub fn write_table<W: Write>(
        &self,
        writer: W,
        format: TableFormat,
        write_metadata: bool,
    ) -> crate::core::Result<()> {
        let metadata = write_metadata.then_some(&self.metadata);
        write_feature_table(writer, metadata, &self.records, format)
    }
}
