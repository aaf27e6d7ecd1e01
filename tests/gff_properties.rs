//! Property-based tests for GFF3 parsing and serialization
//!
//! Covers line parsing, the attribute grammar, header handling and
//! compressed file input.

use bioino::core::{parse_attributes, FeatureRecord, GffError, MetadataFlag, COLUMN_NAMES};
use bioino::formats::gff::{parse_record_line, read_gff, GffFile, GffReader};
use flate2::write::GzEncoder;
use flate2::Compression;
use proptest::prelude::*;
use std::io::Write;

/// Generate a sequence identifier
fn arb_seqid() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u8..=22).prop_map(|n| format!("chr{}", n)),
        Just("NC_000913.3".to_string()),
        "[A-Za-z][A-Za-z0-9_.]{0,11}",
    ]
}

/// Generate a GFF source field
fn arb_source() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("RefSeq".to_string()),
        Just("Prodigal".to_string()),
        Just(".".to_string()),
    ]
}

/// Generate a GFF feature type
fn arb_feature() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("gene".to_string()),
        Just("CDS".to_string()),
        Just("region".to_string()),
        Just("exon".to_string()),
        Just("repeat_region".to_string()),
    ]
}

fn arb_score() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(".".to_string()),
        (0u32..1000).prop_map(|n| n.to_string()),
        (0.0f64..100.0).prop_map(|f| format!("{:.2}", f)),
    ]
}

fn arb_strand() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("+".to_string()),
        Just("-".to_string()),
        Just(".".to_string()),
    ]
}

fn arb_phase() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(".".to_string()),
        Just("0".to_string()),
        Just("1".to_string()),
        Just("2".to_string()),
    ]
}

/// Generate unique attribute pairs without reserved characters
fn arb_attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[A-Za-z][A-Za-z0-9_]{0,7}", "[A-Za-z0-9_.:+-]{1,12}", 1..6)
        .prop_filter("attribute keys must not shadow columns", |map| {
            !map.keys().any(|key| COLUMN_NAMES.contains(&key.as_str()))
        })
        .prop_map(|map| map.into_iter().collect())
}

/// Generate a complete data line and its parts
fn arb_gff_line() -> impl Strategy<Value = (String, Vec<String>, Vec<(String, String)>)> {
    (
        arb_seqid(),
        arb_source(),
        arb_feature(),
        1i64..1_000_000,
        0i64..10_000,
        arb_score(),
        arb_strand(),
        arb_phase(),
        arb_attributes(),
    )
        .prop_map(|(seqid, source, feature, start, len, score, strand, phase, attributes)| {
            let columns = vec![
                seqid,
                source,
                feature,
                start.to_string(),
                (start + len).to_string(),
                score,
                strand,
                phase,
            ];
            let attribute_text = attributes
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(";");
            let line = format!("{}\t{}", columns.join("\t"), attribute_text);
            (line, columns, attributes)
        })
}

proptest! {
    /// Property: positional columns and attributes are recovered exactly
    #[test]
    fn test_parse_recovers_fields((line, columns, attributes) in arb_gff_line()) {
        let record = parse_record_line(&line, 1).unwrap();

        prop_assert_eq!(&record.columns().seqid, &columns[0]);
        prop_assert_eq!(&record.columns().feature, &columns[2]);
        prop_assert_eq!(record.columns().start.to_string(), columns[3].clone());
        prop_assert_eq!(record.columns().end.to_string(), columns[4].clone());
        prop_assert_eq!(&record.columns().strand, &columns[6]);

        let parsed: Vec<(String, String)> = record
            .attributes()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        prop_assert_eq!(parsed, attributes);
    }

    /// Property: rendering a parsed line reproduces it byte for byte
    #[test]
    fn test_display_round_trip((line, _, _) in arb_gff_line()) {
        let record = parse_record_line(&line, 1).unwrap();
        prop_assert_eq!(record.to_string(), line);
    }

    /// Property: flat mappings rebuild the same record
    #[test]
    fn test_flat_round_trip((line, _, _) in arb_gff_line()) {
        let record = parse_record_line(&line, 1).unwrap();
        let rebuilt = FeatureRecord::from_flat(record.to_flat()).unwrap();

        prop_assert_eq!(rebuilt.columns(), record.columns());
        for (key, value) in record.attributes() {
            prop_assert_eq!(rebuilt.attribute(key), Some(value.as_str()));
        }
    }

    /// Property: the record stream yields one record per data line
    #[test]
    fn test_stream_counts_records(lines in prop::collection::vec(arb_gff_line(), 0..20)) {
        let mut text = String::from("##gff-version\t3\n#free comment\n");
        for (line, _, _) in &lines {
            text.push_str(line);
            text.push('\n');
        }

        let (metadata, records) = read_gff(text.as_bytes()).unwrap();
        prop_assert_eq!(metadata.len(), 2);
        let records: Vec<_> = records.collect::<Result<_, _>>().unwrap();
        prop_assert_eq!(records.len(), lines.len());
    }

    /// Property: a line with fewer than five fields is rejected with its number
    #[test]
    fn test_short_lines_rejected(fields in prop::collection::vec("[a-z0-9]{1,6}", 1..5)) {
        let line = fields.join("\t");
        let text = format!("##meta\tv\n{}\n", line);
        let mut reader = GffReader::new(text.as_bytes()).unwrap();
        match reader.next() {
            Some(Err(GffError::MalformedLine { line: number, .. })) => prop_assert_eq!(number, 2),
            _ => prop_assert!(false, "expected a malformed line error"),
        }
    }
}

#[test]
fn test_attribute_grammar_edge_cases() {
    let attributes = parse_attributes("ID=a;Name=b=c;Note=x;y");
    assert_eq!(attributes.get("ID").map(String::as_str), Some("a"));
    assert_eq!(attributes.get("Name").map(String::as_str), Some("b"));
    assert_eq!(attributes.get("b").map(String::as_str), Some("c"));
    assert_eq!(attributes.get("Note").map(String::as_str), Some("x"));
    assert!(!attributes.contains_key("y"));

    let attributes = parse_attributes("ID=1;ID=2;Name=n");
    let keys: Vec<&str> = attributes.keys().map(String::as_str).collect();
    assert_eq!(keys, ["ID", "Name"]);
    assert_eq!(attributes["ID"], "2");

    assert!(parse_attributes("").is_empty());
    assert!(parse_attributes("no_pairs_here").is_empty());
}

#[test]
fn test_metadata_flags_from_prefix() {
    let text = "##sequence-region\tseqA\t1\t5000\n#comment\tfree text\n";
    let (metadata, _) = read_gff(text.as_bytes()).unwrap();

    let lines = metadata.lines();
    assert_eq!(lines[0].flag(), MetadataFlag::Constrained);
    assert_eq!(lines[0].name(), "sequence-region");
    assert_eq!(lines[0].values(), ["seqA", "1", "5000"]);
    assert_eq!(lines[1].flag(), MetadataFlag::Free);
    assert_eq!(metadata.to_string(), text.trim_end());
}

#[test]
fn test_open_gzip_file() {
    let text = "##gff-version\t3\nseqA\tsrc\tgene\t1\t10\t.\t+\t.\tID=g1;Name=g1\n";
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();

    let mut temp = tempfile::Builder::new().suffix(".gff.gz").tempfile().unwrap();
    temp.write_all(&encoder.finish().unwrap()).unwrap();
    temp.flush().unwrap();

    let gff = GffFile::open(temp.path()).unwrap();
    assert_eq!(gff.metadata().len(), 1);
    assert_eq!(gff.records()[0].name().unwrap(), "g1");

    let mut out = Vec::new();
    gff.write(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), text);
}

#[test]
fn test_open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = GffFile::open(dir.path().join("absent.gff"));
    assert!(matches!(result, Err(GffError::Io(_))));
}
