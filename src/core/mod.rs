//! Core annotation model
//!
//! This module contains the record and metadata types, the error
//! types, input/output plumbing and the coordinate lookup table.

mod error;
pub mod io;
mod lookup;
mod metadata;
mod record;

pub use error::{
    BioinoError, GffError, GffResult, Result, TableError, TableResult,
};
pub use io::{create_writer, detect_compression, CompressionFormat, InputReader, LineIterator};
pub use lookup::{
    FlankRule, LookupHit, LookupTable, LookupTableBuilder, DOWNSTREAM_PREFIX, TRAILING_WINDOW,
    UPSTREAM_PREFIX,
};
pub use metadata::{MetadataBlock, MetadataEntry, MetadataFlag, MetadataLine};
pub use record::{
    format_attributes, parse_attributes, Attributes, ColumnParseError, FeatureColumns,
    FeatureRecord, Strand, COLUMN_NAMES, FEATURE_BLOCKLIST, REQUIRED_COLUMNS,
};
