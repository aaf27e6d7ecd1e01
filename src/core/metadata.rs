//! GFF header metadata
//!
//! Leading `#`/`##` lines of an annotation file. `##` lines are
//! "constrained" (GFF directives), single `#` lines are "free" comments.

use crate::core::error::{GffError, GffResult};
use std::fmt;
use std::str::FromStr;

/// Whether a metadata line is a GFF directive or a free comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum MetadataFlag {
    /// Single `#` prefix
    Free,
    /// Double `##` prefix
    #[default]
    Constrained,
}

impl MetadataFlag {
    /// Line prefix used when rendering
    pub fn prefix(&self) -> &'static str {
        match self {
            MetadataFlag::Free => "#",
            MetadataFlag::Constrained => "##",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataFlag::Free => "free",
            MetadataFlag::Constrained => "constrained",
        }
    }
}

impl FromStr for MetadataFlag {
    type Err = GffError;

    fn from_str(s: &str) -> GffResult<Self> {
        match s {
            "free" => Ok(MetadataFlag::Free),
            "constrained" => Ok(MetadataFlag::Constrained),
            other => Err(GffError::InvalidMetadataFlag(other.to_string())),
        }
    }
}

impl fmt::Display for MetadataFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataLine {
    name: String,
    flag: MetadataFlag,
    values: Vec<String>,
}

impl MetadataLine {
    pub fn new<S: Into<String>>(name: S, flag: MetadataFlag, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            flag,
            values,
        }
    }

    /// Construct from a textual flag, rejecting anything but `free`/`constrained`
    pub fn try_new<S: Into<String>>(name: S, flag: &str, values: Vec<String>) -> GffResult<Self> {
        Ok(Self::new(name, flag.parse()?, values))
    }

    /// Parse a raw header line such as `##gff-version\t3`
    ///
    /// All leading hashes and any whitespace after them are stripped, then
    /// the rest is split on tabs into the name and its values.
    pub fn from_header_line(line: &str) -> GffResult<Self> {
        let line = line.trim();
        if !line.starts_with('#') {
            return Err(GffError::InvalidMetadataLine(line.to_string()));
        }

        let flag = if line.starts_with("##") {
            MetadataFlag::Constrained
        } else {
            MetadataFlag::Free
        };

        let body = line.trim_start_matches('#').trim_start();
        let mut parts = body.split('\t');
        let name = parts.next().unwrap_or_default().to_string();
        let values = parts.map(str::to_string).collect();

        Ok(Self { name, flag, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flag(&self) -> MetadataFlag {
        self.flag
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl fmt::Display for MetadataLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.flag.prefix(), self.name)?;
        for value in &self.values {
            write!(f, "\t{}", value)?;
        }
        Ok(())
    }
}

/// Anything that may be coerced into a [`MetadataLine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEntry {
    /// Already constructed
    Line(MetadataLine),
    /// Raw `#`-prefixed header text
    Raw(String),
    /// `(name, flag, values)` with a textual flag
    Parts(String, String, Vec<String>),
}

impl MetadataEntry {
    pub fn into_line(self) -> GffResult<MetadataLine> {
        match self {
            MetadataEntry::Line(line) => Ok(line),
            MetadataEntry::Raw(text) => MetadataLine::from_header_line(&text),
            MetadataEntry::Parts(name, flag, values) => MetadataLine::try_new(name, &flag, values),
        }
    }
}

impl From<MetadataLine> for MetadataEntry {
    fn from(line: MetadataLine) -> Self {
        MetadataEntry::Line(line)
    }
}

impl From<&str> for MetadataEntry {
    fn from(text: &str) -> Self {
        MetadataEntry::Raw(text.to_string())
    }
}

impl<N, F> From<(N, F, Vec<String>)> for MetadataEntry
where
    N: Into<String>,
    F: Into<String>,
{
    fn from((name, flag, values): (N, F, Vec<String>)) -> Self {
        MetadataEntry::Parts(name.into(), flag.into(), values)
    }
}

/// Ordered header block of a GFF file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBlock {
    lines: Vec<MetadataLine>,
}

impl MetadataBlock {
    pub fn new(lines: Vec<MetadataLine>) -> Self {
        Self { lines }
    }

    /// Coerce every entry, failing on the first one that is not a metadata line
    pub fn try_from_entries<I, E>(entries: I) -> GffResult<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<MetadataEntry>,
    {
        let lines = entries
            .into_iter()
            .map(|entry| entry.into().into_line())
            .collect::<GffResult<Vec<_>>>()?;
        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[MetadataLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn push(&mut self, line: MetadataLine) {
        self.lines.push(line);
    }
}

impl fmt::Display for MetadataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_free_and_constrained() {
        let free = MetadataLine::new("Meta_name", MetadataFlag::Free, strings(&["v1", "v2"]));
        let constrained =
            MetadataLine::new("Meta_name", MetadataFlag::Constrained, strings(&["v1", "v2"]));

        assert_eq!(free.to_string(), "#Meta_name\tv1\tv2");
        assert_eq!(constrained.to_string(), "##Meta_name\tv1\tv2");
    }

    #[test]
    fn test_render_without_values() {
        let line = MetadataLine::new("gff-version 3", MetadataFlag::Constrained, vec![]);
        assert_eq!(line.to_string(), "##gff-version 3");
    }

    #[test]
    fn test_invalid_flag() {
        let result = MetadataLine::try_new("meta", "strict", vec![]);
        assert!(matches!(result, Err(GffError::InvalidMetadataFlag(f)) if f == "strict"));
    }

    #[test]
    fn test_from_header_line() {
        let line = MetadataLine::from_header_line("##sequence-region\tseqA\t1\t1000").unwrap();
        assert_eq!(line.flag(), MetadataFlag::Constrained);
        assert_eq!(line.name(), "sequence-region");
        assert_eq!(line.values(), strings(&["seqA", "1", "1000"]).as_slice());

        let line = MetadataLine::from_header_line("#  comment\tmore").unwrap();
        assert_eq!(line.flag(), MetadataFlag::Free);
        assert_eq!(line.name(), "comment");
        assert_eq!(line.values(), strings(&["more"]).as_slice());
    }

    #[test]
    fn test_block_from_mixed_entries() {
        let block = MetadataBlock::try_from_entries(vec![
            MetadataEntry::from(("meta1", "constrained", strings(&["item1"]))),
            MetadataEntry::from(("meta2", "free", strings(&["item2", "comment"]))),
            MetadataEntry::from("##meta3\titem3"),
            MetadataEntry::from(MetadataLine::new("meta4", MetadataFlag::Free, vec![])),
        ])
        .unwrap();

        assert_eq!(block.len(), 4);
        assert_eq!(
            block.to_string(),
            "##meta1\titem1\n#meta2\titem2\tcomment\n##meta3\titem3\n#meta4"
        );
    }

    #[test]
    fn test_block_rejects_non_header_text() {
        let result = MetadataBlock::try_from_entries(vec!["seqA\tsrc\tgene"]);
        assert!(matches!(result, Err(GffError::InvalidMetadataLine(_))));
    }

    #[test]
    fn test_block_rejects_bad_flag() {
        let result = MetadataBlock::try_from_entries(vec![("meta", "other", Vec::<String>::new())]);
        assert!(matches!(result, Err(GffError::InvalidMetadataFlag(_))));
    }
}
