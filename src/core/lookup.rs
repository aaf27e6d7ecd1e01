//! Coordinate lookup tables
//!
//! Resolves every position of a single chromosome to the parent features
//! covering it. Positions between features are attributed to the nearer
//! neighbour: each gap is split at its midpoint, the left half tagged
//! against the upstream feature and the right half against the downstream
//! one. The table also runs [`TRAILING_WINDOW`] positions past the last
//! feature.
//!
//! Offsets are measured from a strand-relative anchor (`start` on plus,
//! `end` on minus). Inside a feature the offset is the absolute distance
//! to the anchor; in gaps it is signed, see [`FlankRule`].
//!
//! # Example
//!
//! ```
//! use bioino::core::{FeatureColumns, FeatureRecord, LookupTable};
//!
//! let records = vec![
//!     FeatureRecord::with_raw_attributes(
//!         FeatureColumns::new("seqA", "src", "gene", 1, 10), "ID=g1;Name=g1"),
//!     FeatureRecord::with_raw_attributes(
//!         FeatureColumns::new("seqA", "src", "gene", 21, 30), "ID=g2;Name=g2"),
//! ];
//! let table = LookupTable::build(records)?;
//! assert_eq!(table.max_position(), Some(1030));
//! assert_eq!(table.get(15).unwrap()[0].locus_tag(), Some("_down-g1"));
//! # Ok::<(), bioino::core::GffError>(())
//! ```

use crate::core::error::{GffError, GffResult};
use crate::core::record::{FeatureColumns, FeatureRecord, Strand};
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Number of synthetic positions appended after the last parent feature
pub const TRAILING_WINDOW: i64 = 1000;

/// Locus-tag prefix for positions upstream of a feature
pub const UPSTREAM_PREFIX: &str = "_up-";

/// Locus-tag prefix for positions downstream of a feature
pub const DOWNSTREAM_PREFIX: &str = "_down-";

/// A record found at a coordinate
///
/// The canonical feature is shared; `offset` and (for gap positions)
/// `locus_tag` are carried alongside and applied by [`LookupHit::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupHit {
    feature: Arc<FeatureRecord>,
    offset: i64,
    locus_tag: Option<String>,
}

impl LookupHit {
    /// The unmodified feature this hit derives from
    pub fn feature(&self) -> &FeatureRecord {
        &self.feature
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn locus_tag(&self) -> Option<&str> {
        self.locus_tag.as_deref()
    }

    /// True for gap-filling placeholders
    pub fn is_synthetic(&self) -> bool {
        self.locus_tag.is_some()
    }

    /// Copy of the feature with `locus_tag` and `offset` attributes applied
    pub fn record(&self) -> FeatureRecord {
        let mut overrides = Vec::with_capacity(2);
        if let Some(tag) = &self.locus_tag {
            overrides.push(("locus_tag", tag.clone()));
        }
        overrides.push(("offset", self.offset.to_string()));
        self.feature.with_attributes(overrides)
    }

    /// Flat mapping of [`LookupHit::record`]
    pub fn to_flat(&self) -> IndexMap<String, String> {
        self.record().to_flat()
    }
}

/// Anchor, sign and tag prefix used to label one half of a gap
///
/// | half       | strand | anchor | sign | prefix (neighbour / none) |
/// |------------|--------|--------|------|---------------------------|
/// | upstream   | +      | start  | +1   | `_down-` / `_up-`         |
/// | upstream   | -      | end    | -1   | `_up-` / `_down-`         |
/// | downstream | +      | start  | -1   | `_up-`                    |
/// | downstream | -      | end    | +1   | `_down-`                  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlankRule {
    pub anchor: i64,
    pub sign: i64,
    pub prefix: &'static str,
}

impl FlankRule {
    /// Rule for positions after `feature`; without a real upstream
    /// neighbour the current feature stands in and the prefixes swap
    pub fn upstream(feature: &FeatureColumns, has_neighbor: bool) -> Self {
        match (feature.orientation(), has_neighbor) {
            (Strand::Plus, true) => Self::new(feature.start, 1, DOWNSTREAM_PREFIX),
            (Strand::Plus, false) => Self::new(feature.start, 1, UPSTREAM_PREFIX),
            (Strand::Minus, true) => Self::new(feature.end, -1, UPSTREAM_PREFIX),
            (Strand::Minus, false) => Self::new(feature.end, -1, DOWNSTREAM_PREFIX),
        }
    }

    /// Rule for positions before `feature`
    pub fn downstream(feature: &FeatureColumns) -> Self {
        match feature.orientation() {
            Strand::Plus => Self::new(feature.start, -1, UPSTREAM_PREFIX),
            Strand::Minus => Self::new(feature.end, 1, DOWNSTREAM_PREFIX),
        }
    }

    fn new(anchor: i64, sign: i64, prefix: &'static str) -> Self {
        Self { anchor, sign, prefix }
    }

    /// Signed offset of `position`
    pub fn offset(&self, position: i64) -> i64 {
        (position - self.anchor) * self.sign
    }
}

type Entries = BTreeMap<i64, Vec<LookupHit>>;

fn insert(entries: &mut Entries, position: i64, hit: LookupHit) {
    entries.entry(position).or_default().push(hit);
}

/// Fill positions `first..=last` with synthetic hits on `feature`
fn fill_flank(
    entries: &mut Entries,
    feature: &Arc<FeatureRecord>,
    rule: FlankRule,
    locus_tag: &str,
    first: i64,
    last: i64,
) {
    for position in first..=last {
        insert(
            entries,
            position,
            LookupHit {
                feature: Arc::clone(feature),
                offset: rule.offset(position),
                locus_tag: Some(locus_tag.to_string()),
            },
        );
    }
}

/// Split the gap between `last_feature` and `current` at its midpoint
///
/// The gap is `last_end + 1 ..= current.start - 1` with `last_end = 0`
/// when there is no previous feature, in which case `current` labels both
/// halves. Overlapping or adjacent features leave both halves empty.
pub(crate) fn gap_fill(
    entries: &mut Entries,
    current: &Arc<FeatureRecord>,
    last_feature: Option<&Arc<FeatureRecord>>,
) -> GffResult<()> {
    let this_start = current.columns().start;
    let (last_end, upstream) = match last_feature {
        Some(last) => (last.columns().end, last),
        None => (0, current),
    };

    let gap_span = (this_start - 1) - (last_end + 1);
    let gap_midpoint = last_end + 1 + gap_span.div_euclid(2);

    let pre_rule = FlankRule::upstream(upstream.columns(), last_feature.is_some());
    let post_rule = FlankRule::downstream(current.columns());
    let pre_tag = format!("{}{}", pre_rule.prefix, upstream.name()?);
    let post_tag = format!("{}{}", post_rule.prefix, current.name()?);

    fill_flank(entries, upstream, pre_rule, &pre_tag, last_end + 1, gap_midpoint);
    fill_flank(entries, current, post_rule, &post_tag, gap_midpoint + 1, this_start - 1);

    Ok(())
}

/// Every position in `1..=max` must have at least one hit
fn validate_coverage(entries: &Entries) -> GffResult<()> {
    let max = match entries.keys().next_back() {
        Some(&max) => max,
        None => return Ok(()),
    };

    let missing: Vec<i64> = (1..=max)
        .filter(|position| entries.get(position).map_or(true, Vec::is_empty))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(GffError::IncompleteCoverage { missing })
    }
}

/// Incremental construction of a [`LookupTable`]
///
/// Records must arrive in file order; only parent features (see
/// [`FeatureRecord::is_parent_feature`]) are indexed.
#[derive(Debug, Default)]
pub struct LookupTableBuilder {
    entries: Entries,
    last_feature: Option<Arc<FeatureRecord>>,
    records_seen: usize,
    parents_indexed: usize,
}

impl LookupTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one record, gap-filling back to the previous parent feature
    pub fn push(&mut self, record: FeatureRecord) -> GffResult<()> {
        self.records_seen += 1;
        if !record.is_parent_feature() {
            return Ok(());
        }

        let current = Arc::new(record);
        gap_fill(&mut self.entries, &current, self.last_feature.as_ref())?;

        let anchor = current.columns().anchor();
        for position in current.columns().start..=current.columns().end {
            insert(
                &mut self.entries,
                position,
                LookupHit {
                    feature: Arc::clone(&current),
                    offset: (position - anchor).abs(),
                    locus_tag: None,
                },
            );
        }

        self.parents_indexed += 1;
        self.last_feature = Some(current);
        Ok(())
    }

    /// Append the trailing window and validate coverage
    pub fn finish(mut self) -> GffResult<LookupTable> {
        if self.records_seen == 0 {
            return Err(GffError::EmptyInput);
        }
        let last = self.last_feature.take().ok_or(GffError::NoParentFeatures)?;

        let rule = FlankRule::upstream(last.columns(), true);
        let tag = format!("{}{}", rule.prefix, last.name()?);
        let end = last.columns().end;
        fill_flank(&mut self.entries, &last, rule, &tag, end + 1, end + TRAILING_WINDOW);

        validate_coverage(&self.entries)?;

        debug!(
            "Lookup table: {} positions from {} parent features ({} records)",
            self.entries.len(),
            self.parents_indexed,
            self.records_seen
        );

        Ok(LookupTable {
            entries: self.entries,
        })
    }
}

/// Mapping from chromosome position to the hits covering it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: Entries,
}

impl LookupTable {
    /// Build from records in file order
    pub fn build<I>(records: I) -> GffResult<Self>
    where
        I: IntoIterator<Item = FeatureRecord>,
    {
        let mut builder = LookupTableBuilder::new();
        for record in records {
            builder.push(record)?;
        }
        builder.finish()
    }

    /// Build straight from a fallible record stream such as a GFF reader
    pub fn try_build<I>(records: I) -> GffResult<Self>
    where
        I: IntoIterator<Item = GffResult<FeatureRecord>>,
    {
        let mut builder = LookupTableBuilder::new();
        for record in records {
            builder.push(record?)?;
        }
        builder.finish()
    }

    /// Hits at `position`, in insertion order
    pub fn get(&self, position: i64) -> Option<&[LookupHit]> {
        self.entries.get(&position).map(Vec::as_slice)
    }

    pub fn max_position(&self) -> Option<i64> {
        self.entries.keys().next_back().copied()
    }

    /// Number of positions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Positions in ascending order with their hits
    pub fn iter(&self) -> impl Iterator<Item = (i64, &[LookupHit])> + '_ {
        self.entries.iter().map(|(pos, hits)| (*pos, hits.as_slice()))
    }
}
