use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Invalid version format: '{0}'")]
    InvalidFormat(String),
    #[error("Version parse error: {0}")]
    ParseError(String),
}

/// Strips a core compatibility prefix such as `8.x-` from a version string.
fn strip_core_prefix(raw: &str) -> &str {
    match raw.find(".x-") {
        Some(idx) => &raw[idx + 3..],
        None => raw,
    }
}

/// Splits a declared version into its padded semver form and the number of
/// numeric components actually given.
fn split_version(raw: &str) -> Result<(String, usize), VersionError> {
    let trimmed = raw.trim();
    let without_core = strip_core_prefix(trimmed);

    let (numeric, extra) = match without_core.split_once('-') {
        Some((numeric, extra)) => (numeric, Some(extra)),
        None => (without_core, None),
    };

    let mut parts: Vec<&str> = numeric.split('.').collect();
    let given = parts.len();
    let well_formed = given <= 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(VersionError::InvalidFormat(raw.to_string()));
    }
    while parts.len() < 3 {
        parts.push("0");
    }

    let mut normalized = parts.join(".");
    if let Some(extra) = extra {
        if extra.is_empty() {
            return Err(VersionError::InvalidFormat(raw.to_string()));
        }
        normalized.push('-');
        normalized.push_str(extra);
    }
    Ok((normalized, given))
}

/// Normalizes a declared extension version into a full semver string.
///
/// Accepts `1.2.3`, partial `1.2`, core-prefixed `8.x-1.2` and a trailing
/// pre-release suffix as in `1.0-beta1`.
pub fn normalize_version(raw: &str) -> Result<String, VersionError> {
    split_version(raw).map(|(normalized, _)| normalized)
}

fn parse_split(raw: &str) -> Result<(Version, usize), VersionError> {
    let (normalized, given) = split_version(raw)?;
    let version = Version::parse(&normalized)
        .map_err(|e| VersionError::ParseError(format!("Invalid version '{}': {}", raw, e)))?;
    Ok((version, given))
}

/// Parses a declared extension version into a `semver::Version`.
pub fn parse_version(raw: &str) -> Result<Version, VersionError> {
    parse_split(raw).map(|(version, _)| version)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Exact,
    NotEqual,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Caret,
    Tilde,
}

const OPERATORS: [(&str, Op); 9] = [
    (">=", Op::GreaterEq),
    ("<=", Op::LessEq),
    ("!=", Op::NotEqual),
    ("==", Op::Exact),
    ("=", Op::Exact),
    (">", Op::Greater),
    ("<", Op::Less),
    ("^", Op::Caret),
    ("~", Op::Tilde),
];

/// One `op version` term of a constraint.
///
/// Terms compare by plain version precedence, so pre-releases take part in
/// ranges like any other version (`1.2.0-beta2` satisfies `>=1.0`).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
    /// Numeric components given in the operand, for `^` and `~`
    given: usize,
}

impl Comparator {
    /// Parses `>=8.x-1.0`, `1.2`, `!=1.0-beta1` and similar; `*` is `None`.
    fn parse(term: &str) -> Result<Option<Self>, VersionError> {
        let term = term.trim();
        if term == "*" {
            return Ok(None);
        }

        let (op, operand) = OPERATORS
            .iter()
            .find_map(|(symbol, op)| term.strip_prefix(*symbol).map(|rest| (*op, rest)))
            .unwrap_or((Op::Exact, term));

        let operand = operand.trim();
        if operand.is_empty() {
            return Err(VersionError::InvalidFormat(term.to_string()));
        }
        let (version, given) = parse_split(operand)?;
        Ok(Some(Self { op, version, given }))
    }

    /// Exclusive upper bound of a `^` term
    fn caret_bound(&self) -> Version {
        let v = &self.version;
        if v.major > 0 || self.given == 1 {
            Version::new(v.major + 1, 0, 0)
        } else if v.minor > 0 || self.given == 2 {
            Version::new(0, v.minor + 1, 0)
        } else {
            Version::new(0, 0, v.patch + 1)
        }
    }

    /// Exclusive upper bound of a `~` term
    fn tilde_bound(&self) -> Version {
        let v = &self.version;
        if self.given == 1 {
            Version::new(v.major + 1, 0, 0)
        } else {
            Version::new(v.major, v.minor + 1, 0)
        }
    }

    fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Exact => *version == self.version,
            Op::NotEqual => *version != self.version,
            Op::Greater => *version > self.version,
            Op::GreaterEq => *version >= self.version,
            Op::Less => *version < self.version,
            Op::LessEq => *version <= self.version,
            Op::Caret => *version >= self.version && *version < self.caret_bound(),
            Op::Tilde => *version >= self.version && *version < self.tilde_bound(),
        }
    }
}

/// Represents a version requirement as a set of comparators.
///
/// Constraints are comma separated comparators that must all hold. A
/// comparator without an operator means an exact match. Operands take the
/// same forms as declared versions, core prefix and pre-release included.
#[derive(Debug, Clone)]
pub struct VersionRange {
    /// The declared constraint string (e.g., ">=8.x-1.0", "^1.2")
    constraint: String,
    /// Parsed comparators; empty means any version
    comparators: Vec<Comparator>,
}

impl VersionRange {
    /// Creates a new version range from a constraint string.
    pub fn from_constraint(constraint: &str) -> Result<Self, VersionError> {
        let mut comparators = Vec::new();
        for term in constraint.split(',') {
            if let Some(comparator) = Comparator::parse(term)? {
                comparators.push(comparator);
            }
        }
        Ok(Self {
            constraint: constraint.trim().to_string(),
            comparators,
        })
    }

    /// Checks if a specific `semver::Version` satisfies this range.
    pub fn includes(&self, version: &Version) -> bool {
        self.comparators.iter().all(|c| c.matches(version))
    }

    /// Parses a declared version string and checks it against this range.
    pub fn includes_str(&self, version: &str) -> Result<bool, VersionError> {
        parse_version(version).map(|v| self.includes(&v))
    }

    /// Returns the declared constraint string.
    pub fn constraint_string(&self) -> &str {
        &self.constraint
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.constraint == other.constraint
    }
}

impl Eq for VersionRange {}

/// Implement Display to show the declared constraint string.
impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constraint)
    }
}

/// Allow parsing directly from a string slice.
impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionRange::from_constraint(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.constraint)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        VersionRange::from_constraint(&raw).map_err(serde::de::Error::custom)
    }
}
