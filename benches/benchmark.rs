//! Performance benchmarks for bioino
//!
//! Run with: cargo bench

use bioino::core::{parse_attributes, LookupTable};
use bioino::formats::gff::{parse_record_line, GffFile};
use bioino::formats::table::{write_feature_table, TableFormat};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Synthetic single-chromosome annotation with a gene and CDS per locus
fn synthetic_gff(genes: usize) -> String {
    let mut text = String::from("##gff-version\t3\n##sequence-region\tchr\t1\t10000000\n");
    for i in 0..genes {
        let start = i * 1000 + 200;
        let end = start + 600;
        let strand = if i % 2 == 0 { '+' } else { '-' };
        text.push_str(&format!(
            "chr\tsrc\tgene\t{}\t{}\t.\t{}\t.\tID=gene{};Name=g{};locus_tag=L{:05}\n",
            start, end, strand, i, i, i
        ));
        text.push_str(&format!(
            "chr\tsrc\tCDS\t{}\t{}\t.\t{}\t0\tID=cds{};Parent=gene{};product=hypothetical protein\n",
            start, end, strand, i, i
        ));
    }
    text
}

fn bench_line_parsing(c: &mut Criterion) {
    let lines = [
        ("short", "chr1\tsrc\tgene\t1\t100"),
        ("typical", "chr1\tRefSeq\tgene\t190\t255\t.\t+\t.\tID=gene-b0001;Name=thrL;gbkey=Gene;gene_biotype=protein_coding;locus_tag=b0001"),
        ("tabbed_attributes", "chr1\tsrc\tCDS\t1\t9\t.\t-\t0\tID=a;Note=one\ttwo;Name=b"),
    ];

    let mut group = c.benchmark_group("gff_line_parsing");
    for (name, line) in lines.iter() {
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| black_box(parse_record_line(black_box(line), 1)))
        });
    }
    group.finish();
}

fn bench_attribute_parsing(c: &mut Criterion) {
    let raw = "ID=cds-NP_414542.1;Parent=gene-b0001;Dbxref=UniProtKB/Swiss-Prot:P0AD86;Name=NP_414542.1;gbkey=CDS;product=thr operon leader peptide";
    c.bench_function("parse_attributes", |b| {
        b.iter(|| black_box(parse_attributes(black_box(raw))))
    });
}

fn bench_lookup_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_build");
    group.sample_size(20);
    for genes in [100usize, 1000] {
        let gff = GffFile::from_reader(synthetic_gff(genes).as_bytes()).unwrap();
        group.throughput(Throughput::Elements(genes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(genes), &gff, |b, gff| {
            b.iter(|| black_box(LookupTable::build(gff.records().iter().cloned()).unwrap()))
        });
    }
    group.finish();
}

fn bench_table_export(c: &mut Criterion) {
    let gff = GffFile::from_reader(synthetic_gff(1000).as_bytes()).unwrap();
    c.bench_function("write_feature_table_1000", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(256 * 1024);
            write_feature_table(&mut out, None, gff.records(), TableFormat::Tsv).unwrap();
            black_box(out)
        })
    });
}

criterion_group!(
    benches,
    bench_line_parsing,
    bench_attribute_parsing,
    bench_lookup_build,
    bench_table_export,
);
criterion_main!(benches);
