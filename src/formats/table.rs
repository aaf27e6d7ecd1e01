//! Table formats: flattened GFF export and table input
//!
//! Records are written one row each: the eight GFF columns, then the
//! sorted union of attribute keys. Attributes a row lacks are left empty.
//! Input tables may also be XLSX workbooks, read one worksheet at a time.

use crate::core::{
    BioinoError, FeatureRecord, GffError, LookupHit, LookupTable, MetadataBlock, Result,
    TableError, TableResult, COLUMN_NAMES,
};
use calamine::{Reader, Xlsx};
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;

/// Worksheet read from XLSX input unless another is named
pub const DEFAULT_WORKSHEET: &str = "Sheet 1";

/// Table flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TableFormat {
    #[default]
    Tsv,
    Csv,
    /// Excel workbook, input only
    Xlsx,
}

impl TableFormat {
    /// Field delimiter; `None` for workbooks
    pub fn delimiter(&self) -> Option<u8> {
        match self {
            TableFormat::Tsv => Some(b'\t'),
            TableFormat::Csv => Some(b','),
            TableFormat::Xlsx => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableFormat::Tsv => "tsv",
            TableFormat::Csv => "csv",
            TableFormat::Xlsx => "xlsx",
        }
    }

    fn output_delimiter(&self) -> TableResult<u8> {
        self.delimiter().ok_or(TableError::UnsupportedOutput(self.name()))
    }

    /// Guess the format from a file extension, ignoring a compression suffix
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bz2"))
            .unwrap_or(&name);

        if name.ends_with(".xlsx") {
            Some(TableFormat::Xlsx)
        } else if name.ends_with(".csv") {
            Some(TableFormat::Csv)
        } else if name.ends_with(".tsv") || name.ends_with(".txt") || name.ends_with(".tab") {
            Some(TableFormat::Tsv)
        } else {
            None
        }
    }
}

fn csv_error(error: csv::Error) -> BioinoError {
    TableError::from(error).into()
}

enum TableRows<R: Read> {
    Delimited(csv::StringRecordsIntoIter<R>),
    Sheet(std::vec::IntoIter<Vec<String>>),
}

/// Header plus row stream of an input table
///
/// Delimited tables stream row by row. Workbooks are read whole and
/// their cells rendered as text.
pub struct TableReader<R: Read> {
    header: Vec<String>,
    rows: TableRows<R>,
}

impl<R: Read> TableReader<R> {
    /// Read the header row; `worksheet` only applies to XLSX input
    pub fn new(reader: R, format: TableFormat, worksheet: &str) -> TableResult<Self> {
        let delimiter = match format.delimiter() {
            Some(delimiter) => delimiter,
            None => return Self::from_workbook(reader, worksheet),
        };

        let mut table = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);
        let header = table.headers()?.iter().map(str::to_string).collect();

        Ok(Self {
            header,
            rows: TableRows::Delimited(table.into_records()),
        })
    }

    fn from_workbook(mut reader: R, worksheet: &str) -> TableResult<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let mut workbook = Xlsx::new(Cursor::new(bytes))?;
        let range = workbook.worksheet_range(worksheet)?;
        debug!(
            "Worksheet {:?}: {} rows x {} columns",
            worksheet,
            range.height(),
            range.width()
        );

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
        let header = rows.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = rows.collect();

        Ok(Self {
            header,
            rows: TableRows::Sheet(rows.into_iter()),
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl<R: Read> Iterator for TableReader<R> {
    type Item = TableResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.rows {
            TableRows::Delimited(records) => records.next().map(|record| {
                record
                    .map(|record| record.iter().map(str::to_string).collect())
                    .map_err(TableError::from)
            }),
            TableRows::Sheet(rows) => rows.next().map(Ok),
        }
    }
}

/// Header for a set of records: fixed columns then sorted attribute keys
pub fn table_header<'a, I>(attribute_keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let extra: BTreeSet<&str> = attribute_keys
        .into_iter()
        .filter(|key| !COLUMN_NAMES.iter().any(|name| name == key))
        .collect();

    let mut header: Vec<String> = COLUMN_NAMES.iter().map(|name| name.to_string()).collect();
    header.extend(extra.into_iter().map(str::to_string));
    header
}

fn row_values<'a>(
    header: &'a [String],
    flat: &'a IndexMap<String, String>,
) -> impl Iterator<Item = &'a str> + 'a {
    header
        .iter()
        .map(move |column| flat.get(column).map(String::as_str).unwrap_or(""))
}

/// Write records as a delimited table
///
/// When `metadata` is given its lines are written verbatim before the
/// table header.
pub fn write_feature_table<W: Write>(
    mut writer: W,
    metadata: Option<&MetadataBlock>,
    records: &[FeatureRecord],
    format: TableFormat,
) -> Result<()> {
    if records.is_empty() {
        return Err(GffError::EmptyInput.into());
    }
    let delimiter = format.output_delimiter()?;

    if let Some(metadata) = metadata {
        for line in metadata.lines() {
            writeln!(writer, "{}", line)?;
        }
    }

    let header = table_header(
        records
            .iter()
            .flat_map(|record| record.attributes().keys().map(String::as_str)),
    );
    debug!("Table header: {} columns", header.len());

    let mut table = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    table.write_record(&header).map_err(csv_error)?;

    for record in records {
        let flat = record.to_flat();
        table
            .write_record(row_values(&header, &flat))
            .map_err(csv_error)?;
    }

    table.flush()?;
    Ok(())
}

/// Leading column of a lookup dump
pub const POSITION_COLUMN: &str = "position";

/// Dump a lookup table, one row per hit, keyed by a leading `position` column
///
/// With `positions`, only those coordinates are written (in the given
/// order); coordinates outside the table are reported and skipped. The
/// coordinate always fills `position`, even when a feature carries an
/// attribute of the same name.
pub fn write_lookup_table<W: Write>(
    writer: W,
    table: &LookupTable,
    positions: Option<&[i64]>,
    format: TableFormat,
) -> Result<()> {
    let delimiter = format.output_delimiter()?;
    let selected: Vec<(i64, &[LookupHit])> = match positions {
        Some(positions) => positions
            .iter()
            .filter_map(|&position| match table.get(position) {
                Some(hits) => Some((position, hits)),
                None => {
                    debug!("Position {} is not in the lookup table", position);
                    None
                }
            })
            .collect(),
        None => table.iter().collect(),
    };

    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for (_, hits) in &selected {
        for hit in hits.iter() {
            keys.extend(hit.feature().attributes().keys().map(String::as_str));
            if hit.is_synthetic() {
                keys.insert("locus_tag");
            }
        }
    }
    keys.insert("offset");
    keys.remove(POSITION_COLUMN);

    let mut header = vec![POSITION_COLUMN.to_string()];
    header.extend(table_header(keys));

    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    out.write_record(&header).map_err(csv_error)?;

    let mut rows = 0usize;
    for (position, hits) in selected {
        let position = position.to_string();
        for hit in hits {
            let mut flat = hit.to_flat();
            flat.insert(POSITION_COLUMN.to_string(), position.clone());
            out.write_record(row_values(&header, &flat))
                .map_err(csv_error)?;
            rows += 1;
        }
    }
    debug!("Wrote {} lookup rows", rows);

    out.flush()?;
    Ok(())
}
