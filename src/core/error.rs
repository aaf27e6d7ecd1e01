//! Error types for bioino
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Main error type for bioino operations
#[derive(Debug, Error)]
pub enum BioinoError {
    /// GFF parsing and lookup-table errors
    #[error("GFF error: {0}")]
    Gff(#[from] GffError),

    /// Delimited table / FASTA conversion errors
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing GFF text or building a lookup table
#[derive(Debug, Error)]
pub enum GffError {
    /// A data line does not resolve to the positional columns
    #[error("Malformed GFF line {line}: {message}\n  last line read: {}", preview(.content))]
    MalformedLine {
        line: usize,
        message: String,
        content: String,
    },

    /// Metadata flag outside {free, constrained}
    #[error("Invalid metadata flag '{0}': must be one of 'free', 'constrained'")]
    InvalidMetadataFlag(String),

    /// Raw metadata entry that is not a `#`-prefixed header line
    #[error("Cannot convert '{0}' to a metadata line")]
    InvalidMetadataLine(String),

    /// Parent feature lacks an attribute needed to build the lookup table
    #[error("Feature {seqid}:{start}-{end} has no '{attribute}' attribute")]
    MissingAttribute {
        attribute: &'static str,
        seqid: String,
        start: i64,
        end: i64,
    },

    /// Flat mapping lacks one of the required GFF columns
    #[error("Missing required GFF column '{0}'")]
    MissingColumn(String),

    /// Flat mapping column that cannot be coerced (non-integer start/end)
    #[error("Invalid value '{value}' for GFF column '{column}'")]
    InvalidColumn { column: &'static str, value: String },

    /// Lookup table has coordinates without any record
    #[error("Chromosome locations {} are missing from lookup table", format_ranges(.missing))]
    IncompleteCoverage { missing: Vec<i64> },

    /// Record stream produced no rows
    #[error("GFF stream is empty")]
    EmptyInput,

    /// No record qualifies as an indexable parent feature
    #[error("No parent features to index (need a Name attribute, no Parent, type not blocklisted)")]
    NoParentFeatures,

    /// I/O error during parsing or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while converting delimited tables
#[derive(Debug, Error)]
pub enum TableError {
    /// Requested columns absent from the table header
    #[error("Some requested columns not in the table: \"{}\"", .0.join("\", \""))]
    MissingColumns(Vec<String>),

    /// Table has no header row
    #[error("Table is empty")]
    EmptyInput,

    /// Format that can be read but not written
    #[error("Cannot write {0} tables")]
    UnsupportedOutput(&'static str),

    /// Unreadable workbook or missing worksheet
    #[error("XLSX error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    /// Malformed delimited record
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GffError {
    /// Build a malformed-line error carrying the full raw line
    pub fn malformed(line: usize, message: impl Into<String>, content: &str) -> Self {
        GffError::MalformedLine {
            line,
            message: message.into(),
            content: content.to_string(),
        }
    }
}

/// Longest raw line echoed verbatim in error messages
const PREVIEW_CHARS: usize = 200;

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Collapse sorted coordinates into `a-b` ranges for error messages
fn format_ranges(positions: &[i64]) -> String {
    let mut parts = Vec::new();
    let mut iter = positions.iter().copied().peekable();

    while let Some(first) = iter.next() {
        let mut last = first;
        while let Some(&next) = iter.peek() {
            if next != last + 1 {
                break;
            }
            last = next;
            iter.next();
        }
        if first == last {
            parts.push(first.to_string());
        } else {
            parts.push(format!("{}-{}", first, last));
        }
    }

    parts.join(", ")
}

/// Result type alias for bioino operations
pub type Result<T> = std::result::Result<T, BioinoError>;

/// Result type alias for GFF operations
pub type GffResult<T> = std::result::Result<T, GffError>;

/// Result type alias for table operations
pub type TableResult<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ranges() {
        assert_eq!(format_ranges(&[]), "");
        assert_eq!(format_ranges(&[5]), "5");
        assert_eq!(format_ranges(&[1, 2, 3, 7, 9, 10]), "1-3, 7, 9-10");
    }

    #[test]
    fn test_incomplete_coverage_message() {
        let err = GffError::IncompleteCoverage { missing: vec![4, 5, 6, 12] };
        assert_eq!(
            err.to_string(),
            "Chromosome locations 4-6, 12 are missing from lookup table"
        );
    }

    #[test]
    fn test_missing_columns_message() {
        let err = TableError::MissingColumns(vec!["seq".to_string(), "name".to_string()]);
        assert_eq!(
            err.to_string(),
            "Some requested columns not in the table: \"seq\", \"name\""
        );
    }

    #[test]
    fn test_malformed_keeps_full_line() {
        let long = format!("{}tail", "x".repeat(500));
        let err = GffError::malformed(3, "too few fields", &long);
        match &err {
            GffError::MalformedLine { line, content, .. } => {
                assert_eq!(*line, 3);
                assert_eq!(content, &long);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let message = err.to_string();
        assert!(message.ends_with(&format!("{}...", "x".repeat(200))));
        assert!(!message.contains("tail"));
    }

    #[test]
    fn test_short_line_shown_whole() {
        let err = GffError::malformed(1, "bad start", "seq\tsrc\tgene\tx\t5");
        assert!(err.to_string().ends_with("last line read: seq\tsrc\tgene\tx\t5"));
    }
}
