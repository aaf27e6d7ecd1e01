//! bioino CLI entry point
//!
//! Converts GFF3 annotations to tables, sequence tables to FASTA, and
//! dumps per-position lookup tables.

use anyhow::Context;
use bioino::core::{create_writer, InputReader, LookupTable, TableError};
use bioino::formats::{
    self, FastaColumns, GffFile, TableFormat, TableReader, TableToFasta, DEFAULT_WORKSHEET,
};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "bioino")]
#[command(about = "Interconvert GFF3, delimited tables and FASTA")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a GFF3 file to a flattened table
    Gff2table {
        /// Input GFF file (default: stdin)
        input: Option<PathBuf>,
        /// Output table format (default: from output extension, else tsv)
        #[arg(short = 'f', long)]
        format: Option<TableFormat>,
        /// Write the GFF header block before the table
        #[arg(short = 'm', long)]
        metadata: bool,
        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Convert a delimited table of sequences to FASTA
    Table2fasta {
        /// Input table with a header row (default: stdin)
        input: Option<PathBuf>,
        /// Column(s) joined with "_" to form the sequence name
        #[arg(short = 'n', long = "name", required = true, num_args = 1..)]
        names: Vec<String>,
        /// Column(s) added to the description as key=value pairs
        #[arg(short = 'd', long = "description", num_args = 0..)]
        descriptions: Vec<String>,
        /// Column holding the sequence
        #[arg(short = 's', long, default_value = "sequence")]
        sequence: String,
        /// Input table format (default: from input extension, else tsv)
        #[arg(short = 'f', long)]
        format: Option<TableFormat>,
        /// Worksheet to read from XLSX input
        #[arg(short = 'w', long, default_value = DEFAULT_WORKSHEET)]
        worksheet: String,
        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Build the coordinate lookup table of a single-chromosome GFF
    Lookup {
        /// Input GFF file (default: stdin)
        input: Option<PathBuf>,
        /// Only report these positions (default: every position)
        #[arg(short = 'p', long = "position", num_args = 1..)]
        positions: Vec<i64>,
        /// Output table format (default: from output extension, else tsv)
        #[arg(short = 'f', long)]
        format: Option<TableFormat>,
        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

fn resolve_format(explicit: Option<TableFormat>, path: Option<&Path>) -> TableFormat {
    explicit
        .or_else(|| path.and_then(TableFormat::from_path))
        .unwrap_or_default()
}

/// Output format, rejecting input-only formats before anything is written
fn output_format(
    explicit: Option<TableFormat>,
    path: Option<&Path>,
) -> Result<TableFormat, TableError> {
    let format = resolve_format(explicit, path);
    match format.delimiter() {
        Some(_) => Ok(format),
        None => Err(TableError::UnsupportedOutput(format.name())),
    }
}

fn describe(path: &Option<PathBuf>, fallback: &str) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn is_broken_pipe(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let start = Instant::now();

    match cli.command {
        Commands::Gff2table { input, format, metadata, output } => {
            let format = output_format(format, output.as_deref())?;
            eprintln!("Converting GFF to table with the following parameters:");
            eprintln!("\tinput: {}", describe(&input, "<stdin>"));
            eprintln!("\toutput: {}", describe(&output, "<stdout>"));
            eprintln!("\tformat: {:?}", format);
            eprintln!("\tmetadata: {}", metadata);

            let reader = InputReader::open_or_stdin(input.as_ref())
                .with_context(|| format!("Failed to open {}", describe(&input, "stdin")))?;
            let gff = GffFile::from_reader(reader)?;
            let writer = create_writer(output.as_ref())?;
            gff.write_table(writer, format, metadata)?;

            eprintln!("\n=== Conversion Statistics ===");
            eprintln!("Metadata lines:  {}", gff.metadata().len());
            eprintln!("Records:         {}", gff.len());
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Table2fasta {
            input,
            names,
            descriptions,
            sequence,
            format,
            worksheet,
            output,
        } => {
            let format = resolve_format(format, input.as_deref());
            eprintln!("Generating FASTA from table with the following parameters:");
            eprintln!("\tinput: {}", describe(&input, "<stdin>"));
            eprintln!("\toutput: {}", describe(&output, "<stdout>"));
            eprintln!("\tformat: {:?}", format);
            if format == TableFormat::Xlsx {
                eprintln!("\tworksheet: {}", worksheet);
            }
            eprintln!("\tsequence: {}", sequence);
            eprintln!("\tname: {:?}", names);
            eprintln!("\tdescription: {:?}", descriptions);

            let reader = InputReader::open_or_stdin(input.as_ref())
                .with_context(|| format!("Failed to open {}", describe(&input, "stdin")))?;
            let columns = FastaColumns::new(&sequence, &names).with_descriptions(&descriptions);
            let table = TableReader::new(reader, format, &worksheet)?;
            let converter = TableToFasta::new(table, &columns)?;
            let mut writer = create_writer(output.as_ref())?;

            let mut written = 0usize;
            for record in converter {
                writeln!(writer, "{}", record?)?;
                written += 1;
            }
            writer.flush()?;

            eprintln!("\n=== Conversion Statistics ===");
            eprintln!("Sequences:       {}", written);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Lookup { input, positions, format, output } => {
            let format = output_format(format, output.as_deref())?;
            eprintln!("Building lookup table with the following parameters:");
            eprintln!("\tinput: {}", describe(&input, "<stdin>"));
            eprintln!("\toutput: {}", describe(&output, "<stdout>"));
            eprintln!("\tformat: {:?}", format);
            eprintln!("\tpositions: {:?}", positions);

            let reader = InputReader::open_or_stdin(input.as_ref())
                .with_context(|| format!("Failed to open {}", describe(&input, "stdin")))?;
            let (_, records) = formats::read_gff(reader)?;
            let table = LookupTable::try_build(records)?;

            let selection = (!positions.is_empty()).then_some(positions.as_slice());
            let writer = create_writer(output.as_ref())?;
            formats::write_lookup_table(writer, &table, selection, format)?;

            eprintln!("\n=== Lookup Statistics ===");
            eprintln!("Positions:       {}", table.len());
            eprintln!("Max position:    {}", table.max_position().unwrap_or(0));
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Err(e) if is_broken_pipe(&e) => Ok(()),
        result => result,
    }
}
