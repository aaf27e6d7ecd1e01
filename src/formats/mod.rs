//! File format adapters
//!
//! Adapters for GFF3 annotations, flattened delimited tables and FASTA.

pub mod fasta;
pub mod gff;
pub mod table;

pub use fasta::{
    sanitize_column, table_to_fasta, write_fasta, FastaColumns, FastaRecord, TableToFasta,
};
pub use gff::{read_gff, write_gff, GffFile, GffReader};
pub use table::{
    write_feature_table, write_lookup_table, TableFormat, TableReader, DEFAULT_WORKSHEET,
};
