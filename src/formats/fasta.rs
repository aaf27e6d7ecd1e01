//! Table to FASTA conversion
//!
//! Each table row becomes one sequence. The name joins the chosen name
//! columns with `_`, the description lists `column=value` pairs joined
//! with `;`.

use crate::core::{TableError, TableResult};
use crate::formats::table::{TableFormat, TableReader, DEFAULT_WORKSHEET};
use log::debug;
use std::fmt;
use std::io::{self, Read, Write};

const NAME_SEPARATOR: &str = "_";
const DESCRIPTION_SEPARATOR: &str = ";";

/// Normalize a column name: spaces become `_`, parentheses are dropped
pub fn sanitize_column(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// A single FASTA sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub name: String,
    pub description: String,
    pub sequence: String,
}

impl fmt::Display for FastaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">{}", self.name)?;
        if !self.description.is_empty() {
            write!(f, " {}", self.description)?;
        }
        write!(f, "\n{}", self.sequence)
    }
}

/// Write records, one header line and one sequence line each
pub fn write_fasta<W, I>(writer: &mut W, records: I) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = FastaRecord>,
{
    for record in records {
        writeln!(writer, "{}", record)?;
    }
    Ok(())
}

/// Column selection for [`table_to_fasta`]
#[derive(Debug, Clone)]
pub struct FastaColumns {
    pub sequence: String,
    pub names: Vec<String>,
    pub descriptions: Vec<String>,
}

impl FastaColumns {
    pub fn new<S: AsRef<str>>(sequence: &str, names: &[S]) -> Self {
        Self {
            sequence: sequence.to_string(),
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            descriptions: Vec::new(),
        }
    }

    pub fn with_descriptions<S: AsRef<str>>(mut self, descriptions: &[S]) -> Self {
        self.descriptions = descriptions.iter().map(|d| d.as_ref().to_string()).collect();
        self
    }
}

/// Row-by-row FASTA conversion of a table
pub struct TableToFasta<R: Read> {
    rows: TableReader<R>,
    sequence: usize,
    names: Vec<usize>,
    descriptions: Vec<(String, usize)>,
}

impl<R: Read> TableToFasta<R> {
    /// Resolve the requested columns against the table header
    ///
    /// Header names and requested columns are both sanitized before
    /// matching. Every requested column missing from the header is
    /// reported in one error.
    pub fn new(table: TableReader<R>, columns: &FastaColumns) -> TableResult<Self> {
        let header: Vec<String> = table.header().iter().map(|h| sanitize_column(h)).collect();
        if header.iter().all(String::is_empty) {
            return Err(TableError::EmptyInput);
        }

        let names: Vec<String> = columns.names.iter().map(|c| sanitize_column(c)).collect();
        let descriptions: Vec<String> = columns
            .descriptions
            .iter()
            .map(|c| sanitize_column(c))
            .collect();
        let sequence = sanitize_column(&columns.sequence);

        let position = |column: &str| header.iter().position(|h| h == column);

        let missing: Vec<String> = names
            .iter()
            .chain(&descriptions)
            .chain(std::iter::once(&sequence))
            .filter(|column| position(column).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TableError::MissingColumns(missing));
        }

        let lookup = |column: &str| position(column).unwrap_or_default();
        let converter = TableToFasta {
            sequence: lookup(&sequence),
            names: names.iter().map(|c| lookup(c)).collect(),
            descriptions: descriptions
                .iter()
                .map(|c| (c.clone(), lookup(c)))
                .collect(),
            rows: table,
        };
        debug!(
            "FASTA from {} columns: name {:?}, description {:?}, sequence {:?}",
            header.len(),
            names,
            descriptions,
            sequence
        );

        Ok(converter)
    }

    fn convert(&self, row: &[String]) -> FastaRecord {
        let field = |index: usize| row.get(index).map(String::as_str).unwrap_or("");

        let name = self
            .names
            .iter()
            .map(|&index| field(index).replace(' ', "-"))
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR);

        let description = self
            .descriptions
            .iter()
            .map(|(column, index)| format!("{}={}", column, field(*index).replace(' ', "_")))
            .collect::<Vec<_>>()
            .join(DESCRIPTION_SEPARATOR);

        FastaRecord {
            name,
            description,
            sequence: field(self.sequence).to_string(),
        }
    }
}

impl<R: Read> Iterator for TableToFasta<R> {
    type Item = TableResult<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(row.map(|row| self.convert(&row)))
    }
}

/// Start converting a table with a header row
///
/// XLSX input is read from [`DEFAULT_WORKSHEET`]; build a [`TableReader`]
/// and call [`TableToFasta::new`] to pick another sheet.
pub fn table_to_fasta<R: Read>(
    reader: R,
    format: TableFormat,
    columns: &FastaColumns,
) -> TableResult<TableToFasta<R>> {
    let table = TableReader::new(reader, format, DEFAULT_WORKSHEET)?;
    TableToFasta::new(table, columns)
}
