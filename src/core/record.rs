//! Annotation records
//!
//! A [`FeatureRecord`] is one GFF data row: the eight positional columns
//! plus a key/value attribute map. GFF uses 1-based, closed coordinates.

use crate::core::error::{GffError, GffResult};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;

/// Names of the eight positional GFF columns, in file order
pub const COLUMN_NAMES: [&str; 8] = [
    "seqid", "source", "feature", "start", "end", "score", "strand", "phase",
];

/// Number of leading columns that have no default
///
/// Only `seqid`, `source`, `feature`, `start` and `end` must be present.
/// `score`, `strand` and `phase` fall back to `.`, `+` and `.`, so a data
/// line with 5 to 7 fields still parses. This is looser than treating
/// "fewer than 8 resolvable columns" as fatal: a line is rejected only
/// with fewer than 5 fields or a non-integer `start`/`end`.
pub const REQUIRED_COLUMNS: usize = 5;

/// Attribute map; keeps insertion order for output, compares as a set
pub type Attributes = IndexMap<String, String>;

/// Strand orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl Strand {
    /// Parse strand from char
    ///
    /// # Examples
    /// ```
    /// use bioino::core::Strand;
    /// assert_eq!(Strand::from_char('+'), Some(Strand::Plus));
    /// assert_eq!(Strand::from_char('-'), Some(Strand::Minus));
    /// assert_eq!(Strand::from_char('.'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Plus),
            '-' => Some(Strand::Minus),
            _ => None,
        }
    }

    /// Convert to char
    pub fn to_char(&self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
        }
    }
}

/// Error converting raw tab-separated fields into [`FeatureColumns`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnParseError {
    TooFewFields { expected: usize, found: usize },
    InvalidNumber(&'static str, String),
}

impl fmt::Display for ColumnParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnParseError::TooFewFields { expected, found } => {
                write!(f, "Too few fields: expected at least {}, found {}", expected, found)
            }
            ColumnParseError::InvalidNumber(field, value) => {
                write!(f, "Invalid number in field {}: {}", field, value)
            }
        }
    }
}

impl std::error::Error for ColumnParseError {}

/// The eight positional GFF columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureColumns {
    /// Sequence (chromosome) name
    pub seqid: String,
    /// Database or program that produced the annotation
    pub source: String,
    /// Feature type, e.g. gene, CDS
    pub feature: String,
    /// Start position (1-based)
    pub start: i64,
    /// End position (1-based, inclusive); `end < start` is allowed
    pub end: i64,
    pub score: String,
    /// Raw strand text, `+` or `-` in practice
    pub strand: String,
    pub phase: String,
}

impl FeatureColumns {
    /// Columns with default score (`.`), strand (`+`) and phase (`.`)
    pub fn new<S: Into<String>>(seqid: S, source: S, feature: S, start: i64, end: i64) -> Self {
        Self {
            seqid: seqid.into(),
            source: source.into(),
            feature: feature.into(),
            start,
            end,
            score: ".".to_string(),
            strand: "+".to_string(),
            phase: ".".to_string(),
        }
    }

    pub fn with_score<S: Into<String>>(mut self, score: S) -> Self {
        self.score = score.into();
        self
    }

    pub fn with_strand<S: Into<String>>(mut self, strand: S) -> Self {
        self.strand = strand.into();
        self
    }

    pub fn with_phase<S: Into<String>>(mut self, phase: S) -> Self {
        self.phase = phase.into();
        self
    }

    /// Build from positional fields; the first five are required, missing
    /// score/strand/phase take their defaults and extra fields are ignored
    pub fn from_fields(fields: &[&str]) -> Result<Self, ColumnParseError> {
        if fields.len() < REQUIRED_COLUMNS {
            return Err(ColumnParseError::TooFewFields {
                expected: REQUIRED_COLUMNS,
                found: fields.len(),
            });
        }

        let start = parse_coordinate("start", fields[3])?;
        let end = parse_coordinate("end", fields[4])?;

        let mut columns = Self::new(fields[0], fields[1], fields[2], start, end);
        if let Some(score) = fields.get(5) {
            columns.score = score.to_string();
        }
        if let Some(strand) = fields.get(6) {
            columns.strand = strand.to_string();
        }
        if let Some(phase) = fields.get(7) {
            columns.phase = phase.to_string();
        }

        Ok(columns)
    }

    /// Strand used for offset arithmetic; anything but `+` counts as minus
    pub fn orientation(&self) -> Strand {
        if self.strand == "+" {
            Strand::Plus
        } else {
            Strand::Minus
        }
    }

    /// Strand-relative anchor: `start` on plus, `end` on minus
    pub fn anchor(&self) -> i64 {
        match self.orientation() {
            Strand::Plus => self.start,
            Strand::Minus => self.end,
        }
    }

    /// Column value by name, as text
    pub fn get(&self, name: &str) -> Option<String> {
        match name {
            "seqid" => Some(self.seqid.clone()),
            "source" => Some(self.source.clone()),
            "feature" => Some(self.feature.clone()),
            "start" => Some(self.start.to_string()),
            "end" => Some(self.end.to_string()),
            "score" => Some(self.score.clone()),
            "strand" => Some(self.strand.clone()),
            "phase" => Some(self.phase.clone()),
            _ => None,
        }
    }
}

fn parse_coordinate(field: &'static str, value: &str) -> Result<i64, ColumnParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| ColumnParseError::InvalidNumber(field, value.to_string()))
}

impl fmt::Display for FeatureColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.seqid,
            self.source,
            self.feature,
            self.start,
            self.end,
            self.score,
            self.strand,
            self.phase
        )
    }
}

/// Parse a raw attribute column
///
/// The text is split on `=` first and each piece is then split on `;`.
/// A key is the last `;`-segment of one piece and its value is the first
/// `;`-segment of the next piece. Consequences:
///
/// - `ID=test01;attr1=+` gives `ID -> test01`, `attr1 -> +`
/// - text before the first `=` contributes only its last `;`-segment as a
///   key, so `junk;ID=x` gives `ID -> x`
/// - `;`-segments between a value and the next key are dropped, so
///   `Note=a;b;Name=c` gives `Note -> a`, `Name -> c`
/// - a repeated key keeps its first position and takes the later value
///
/// ```
/// use bioino::core::parse_attributes;
/// let attrs = parse_attributes("ID=test01;attr1=+");
/// assert_eq!(attrs.get("ID").map(String::as_str), Some("test01"));
/// assert_eq!(attrs.get("attr1").map(String::as_str), Some("+"));
/// ```
pub fn parse_attributes(raw: &str) -> Attributes {
    let pieces: Vec<Vec<&str>> = raw.split('=').map(|piece| piece.split(';').collect()).collect();

    let mut attributes = Attributes::new();
    for pair in pieces.windows(2) {
        if let (Some(key), Some(value)) = (pair[0].last(), pair[1].first()) {
            attributes.insert(key.to_string(), value.to_string());
        }
    }
    attributes
}

/// Render attributes as `key=value` pairs joined by `;`
pub fn format_attributes(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(";")
}

/// Feature types never indexed as parent features
pub const FEATURE_BLOCKLIST: [&str; 2] = ["region", "repeat_region"];

/// One annotation row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    columns: FeatureColumns,
    attributes: Attributes,
}

impl FeatureRecord {
    pub fn new(columns: FeatureColumns, attributes: Attributes) -> Self {
        Self { columns, attributes }
    }

    /// Build with a raw `key=value;key=value` attribute column
    pub fn with_raw_attributes(columns: FeatureColumns, raw: &str) -> Self {
        Self::new(columns, parse_attributes(raw))
    }

    pub fn columns(&self) -> &FeatureColumns {
        &self.columns
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Attribute that must be present
    pub fn require_attribute(&self, key: &'static str) -> GffResult<&str> {
        self.attribute(key).ok_or_else(|| GffError::MissingAttribute {
            attribute: key,
            seqid: self.columns.seqid.clone(),
            start: self.columns.start,
            end: self.columns.end,
        })
    }

    /// The `Name` attribute, required for locus tags
    pub fn name(&self) -> GffResult<&str> {
        self.require_attribute("Name")
    }

    /// Parent features have a `Name`, no `Parent` and a non-blocklisted type
    pub fn is_parent_feature(&self) -> bool {
        !FEATURE_BLOCKLIST.contains(&self.columns.feature.as_str())
            && self.attributes.contains_key("Name")
            && !self.attributes.contains_key("Parent")
    }

    /// Copy of this record with some attributes overridden or added
    pub fn with_attributes<I, K, V>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut attributes = self.attributes.clone();
        for (key, value) in overrides {
            attributes.insert(key.into(), value.into());
        }
        Self {
            columns: self.columns.clone(),
            attributes,
        }
    }

    /// Flat mapping: the eight columns followed by the attributes
    pub fn to_flat(&self) -> IndexMap<String, String> {
        let mut flat: IndexMap<String, String> = COLUMN_NAMES
            .iter()
            .filter_map(|name| self.columns.get(name).map(|value| (name.to_string(), value)))
            .collect();
        for (key, value) in &self.attributes {
            flat.insert(key.clone(), value.clone());
        }
        flat
    }

    /// Rebuild a record from a flat mapping
    ///
    /// `seqid`, `source`, `feature`, `start` and `end` are required; the
    /// other columns default. Every non-column key becomes an attribute,
    /// in sorted key order.
    pub fn from_flat<I, K, V>(entries: I) -> GffResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut columns: BTreeMap<&'static str, String> = BTreeMap::new();
        let mut extra: BTreeMap<String, String> = BTreeMap::new();

        for (key, value) in entries {
            let key = key.as_ref();
            match COLUMN_NAMES.iter().find(|name| **name == key) {
                Some(name) => {
                    columns.insert(*name, value.as_ref().to_string());
                }
                None => {
                    extra.insert(key.to_string(), value.as_ref().to_string());
                }
            }
        }

        let mut take = |name: &'static str| {
            columns
                .remove(name)
                .ok_or_else(|| GffError::MissingColumn(name.to_string()))
        };
        let seqid = take("seqid")?;
        let source = take("source")?;
        let feature = take("feature")?;
        let start = take("start")?;
        let end = take("end")?;

        let coordinate = |column: &'static str, value: String| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|_| GffError::InvalidColumn { column, value })
        };
        let start = coordinate("start", start)?;
        let end = coordinate("end", end)?;

        let mut record_columns = FeatureColumns::new(seqid, source, feature, start, end);
        if let Some(score) = columns.remove("score") {
            record_columns.score = score;
        }
        if let Some(strand) = columns.remove("strand") {
            record_columns.strand = strand;
        }
        if let Some(phase) = columns.remove("phase") {
            record_columns.phase = phase;
        }

        Ok(Self::new(record_columns, extra.into_iter().collect()))
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.columns, format_attributes(&self.attributes))
    }
}
