use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::policy::PolicyError;

/// MISRA classification carried by a report line.
///
/// Ordered from least to most severe so that `max` picks the dominant tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTag {
    None,
    Advisory,
    Required,
    Mandatory,
}

impl SeverityTag {
    pub const KEYWORDS: [(SeverityTag, &'static str); 3] = [
        (SeverityTag::Mandatory, "mandatory"),
        (SeverityTag::Required, "required"),
        (SeverityTag::Advisory, "advisory"),
    ];

    /// Case-insensitive keyword search. The most severe keyword present wins.
    pub fn classify(line: &str) -> SeverityTag {
        let lower = line.to_lowercase();
        Self::classify_lowered(&lower)
    }

    pub(crate) fn classify_lowered(lower: &str) -> SeverityTag {
        Self::KEYWORDS
            .iter()
            .find(|(_, kw)| lower.contains(kw))
            .map(|(tag, _)| *tag)
            .unwrap_or(SeverityTag::None)
    }

    /// Every keyword present on the line, or `{none}` when there is none.
    pub fn all_in(line: &str) -> SeveritySet {
        Self::all_in_lowered(&line.to_lowercase())
    }

    pub(crate) fn all_in_lowered(lower: &str) -> SeveritySet {
        let tags: SeveritySet = Self::KEYWORDS
            .iter()
            .filter(|(_, kw)| lower.contains(kw))
            .map(|(tag, _)| *tag)
            .collect();
        if tags.is_empty() {
            SeveritySet::from([SeverityTag::None])
        } else {
            tags
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTag::None => "none",
            SeverityTag::Advisory => "advisory",
            SeverityTag::Required => "required",
            SeverityTag::Mandatory => "mandatory",
        }
    }
}

impl fmt::Display for SeverityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityTag {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(SeverityTag::None),
            "advisory" => Ok(SeverityTag::Advisory),
            "required" => Ok(SeverityTag::Required),
            "mandatory" => Ok(SeverityTag::Mandatory),
            other => Err(PolicyError::UnknownSeverity(other.to_string())),
        }
    }
}

/// A set of severity tags, serialized as a list of lowercase names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeveritySet(BTreeSet<SeverityTag>);

impl SeveritySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: SeverityTag) -> bool {
        self.0.insert(tag)
    }

    pub fn contains(&self, tag: SeverityTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn intersects(&self, other: &SeveritySet) -> bool {
        self.0.iter().any(|t| other.0.contains(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = SeverityTag> + '_ {
        self.0.iter().copied()
    }

    /// Parse a list of names such as `["advisory", "required"]`.
    pub fn parse_names<I, S>(names: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().map(|n| n.as_ref().parse::<SeverityTag>()).collect()
    }
}

impl FromIterator<SeverityTag> for SeveritySet {
    fn from_iter<T: IntoIterator<Item = SeverityTag>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[SeverityTag; N]> for SeveritySet {
    fn from(tags: [SeverityTag; N]) -> Self {
        tags.into_iter().collect()
    }
}

impl fmt::Display for SeveritySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("-");
        }
        let names: Vec<&str> = self.0.iter().map(|t| t.as_str()).collect();
        f.write_str(&names.join(","))
    }
}
