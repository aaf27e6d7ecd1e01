//! bioino - GFF3 annotation I/O and coordinate lookup
//!
//! Reads GFF3 files into typed records, flattens them into delimited
//! tables, converts sequence tables to FASTA, and builds a per-position
//! lookup table that maps every chromosome coordinate to the nearest
//! parent feature.
//!
//! # Features
//!
//! - Lazy, single-pass record stream after an eager header read
//! - Transparent gzip/bzip2 input, memory-mapped large files
//! - Gap-filling lookup table with strand-relative offsets
//!
//! # Example
//!
//! ```
//! use bioino::formats::gff::GffFile;
//!
//! let text = "##gff-version\t3\n\
//!             seqA\tsrc\tgene\t1\t10\t.\t+\t.\tID=g1;Name=g1\n\
//!             seqA\tsrc\tgene\t21\t30\t.\t-\t.\tID=g2;Name=g2\n";
//!
//! let gff = GffFile::from_reader(text.as_bytes())?;
//! let table = gff.lookup_table()?;
//!
//! let hit = &table.get(25).unwrap()[0];
//! assert_eq!(hit.feature().attribute("Name"), Some("g2"));
//! assert_eq!(hit.offset(), 5);
//! # Ok::<(), bioino::core::GffError>(())
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    BioinoError, FeatureColumns, FeatureRecord, GffError, LookupHit, LookupTable,
    LookupTableBuilder, MetadataBlock, MetadataFlag, MetadataLine, Strand, TableError,
};
pub use formats::{fasta, gff, table};
