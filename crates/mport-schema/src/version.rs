//! Version algebra: parsing, ordering, and range-predicate matching.
//!
//! A version string is `[epoch,]body[_revision]`, where epoch and revision
//! are optional integers separated from the body by the *rightmost* `,` and
//! `_` respectively. Comparison walks the body lockstep, treating maximal
//! digit runs as integers and everything else byte-by-byte.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A parsed, comparable package version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    raw: String,
    epoch: i64,
    body: String,
    revision: i64,
}

impl Version {
    /// Parse a raw version string.
    ///
    /// Never fails: a body with no discernible epoch/revision parses those
    /// as `0`, matching the original's `strtol`-based behavior.
    pub fn parse(raw: &str) -> Self {
        // Strip an embedded predicate tail (`<...`/`>...`) if present; only
        // relevant when parsing one side of a dependency specifier.
        let trimmed = raw
            .find(['<', '>'])
            .map_or(raw, |idx| &raw[..idx]);

        let (rest, revision) = match trimmed.rfind('_') {
            Some(idx) => (&trimmed[..idx], parse_int(&trimmed[idx + 1..])),
            None => (trimmed, 0),
        };
        let (body, epoch) = match rest.rfind(',') {
            Some(idx) => (&rest[..idx], parse_int(&rest[idx + 1..])),
            None => (rest, 0),
        };

        Self {
            raw: raw.to_string(),
            epoch,
            body: body.to_string(),
            revision,
        }
    }

    /// The original, unparsed version string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_int(s: &str) -> i64 {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Version::parse(&raw))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| cmp_bodies(&self.body, &other.body))
            .then_with(|| self.revision.cmp(&other.revision))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version bodies lockstep: digit runs as integers, `.`/`+` as
/// separators, everything else by code point.
fn cmp_bodies(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        while matches!(ai.peek(), Some('.') | Some('+')) {
            ai.next();
        }
        while matches!(bi.peek(), Some('.') | Some('+')) {
            bi.next();
        }

        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => {
                let n = if next_is_digit(&mut bi) { take_number(&mut bi) } else { bi.next(); 1 };
                return 0u64.cmp(&n);
            }
            (Some(_), None) => {
                let n = if next_is_digit(&mut ai) { take_number(&mut ai) } else { ai.next(); 1 };
                return n.cmp(&0u64);
            }
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let na = take_number(&mut ai);
                    let nb = take_number(&mut bi);
                    match na.cmp(&nb) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                ai.next();
                bi.next();
                match ca.cmp(&cb) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
        }
    }
}

fn next_is_digit(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    it.peek().is_some_and(char::is_ascii_digit)
}

fn take_number(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut n: u64 = 0;
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        n = n.saturating_mul(10).saturating_add(u64::from(c as u8 - b'0'));
        it.next();
    }
    n
}

/// The result of checking a version against a dependency predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// The version satisfies the predicate.
    Met,
    /// The version does not satisfy the predicate.
    Unmet,
}

/// An error parsing a dependency version predicate.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VersionError {
    /// The predicate string had no recognizable comparison operator.
    #[error("malformed version predicate: {0:?}")]
    Malformed(String),
}

/// Parse and evaluate a (possibly compound) range predicate, e.g. `>=1.2<2.0`.
///
/// Locates clause boundaries by scanning for `>`, `<`, `=` exactly as the
/// original implementation does, rather than via a formal grammar.
pub fn require_check(version: &Version, predicate: &str) -> Result<VersionCheck, VersionError> {
    let clauses = split_clauses(predicate)?;
    for (op, bound) in &clauses {
        if !eval_clause(version, *op, bound) {
            return Ok(VersionCheck::Unmet);
        }
    }
    Ok(VersionCheck::Met)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

fn split_clauses(predicate: &str) -> Result<Vec<(Op, Version)>, VersionError> {
    let bytes = predicate.as_bytes();
    let mut clauses = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let (op, op_len) = match bytes[i] {
            b'>' if bytes.get(i + 1) == Some(&b'=') => (Op::Ge, 2),
            b'<' if bytes.get(i + 1) == Some(&b'=') => (Op::Le, 2),
            b'>' => (Op::Gt, 1),
            b'<' => (Op::Lt, 1),
            b'=' => (Op::Eq, 1),
            _ => return Err(VersionError::Malformed(predicate.to_string())),
        };
        let start = i + op_len;
        let end = predicate[start..]
            .find(['>', '<', '='])
            .map_or(predicate.len(), |rel| start + rel);
        if start == end {
            return Err(VersionError::Malformed(predicate.to_string()));
        }
        clauses.push((op, Version::parse(&predicate[start..end])));
        i = end;
    }
    if clauses.is_empty() {
        return Err(VersionError::Malformed(predicate.to_string()));
    }
    Ok(clauses)
}

fn eval_clause(version: &Version, op: Op, bound: &Version) -> bool {
    match op {
        Op::Lt => version < bound,
        Op::Le => version <= bound,
        Op::Gt => version > bound,
        Op::Ge => version >= bound,
        Op::Eq => version == bound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_numeric_ordering() {
        assert!(Version::parse("1.2.3") < Version::parse("1.2.4"));
        assert!(Version::parse("1.9") < Version::parse("1.10"));
        assert!(Version::parse("2.0") > Version::parse("1.99"));
    }

    #[test]
    fn epoch_dominates() {
        assert!(Version::parse("1,1.0") < Version::parse("2,0.1"));
    }

    #[test]
    fn revision_breaks_ties() {
        assert!(Version::parse("1.0_1") < Version::parse("1.0_2"));
        assert_eq!(Version::parse("1.0_1"), Version::parse("1.0_1"));
    }

    #[test]
    fn missing_side_is_shorter() {
        assert!(Version::parse("1.2") < Version::parse("1.2.1"));
    }

    #[test]
    fn non_numeric_epoch_is_zero() {
        assert_eq!(Version::parse("garbage,1.0").epoch, 0);
    }

    #[test]
    fn single_clause_predicate() {
        let v = Version::parse("1.5.0");
        assert_eq!(require_check(&v, ">=1.0").unwrap(), VersionCheck::Met);
        assert_eq!(require_check(&v, "<1.0").unwrap(), VersionCheck::Unmet);
    }

    #[test]
    fn compound_range_predicate() {
        let v = Version::parse("1.5.0");
        assert_eq!(
            require_check(&v, ">=1.0<2.0").unwrap(),
            VersionCheck::Met
        );
        assert_eq!(
            require_check(&v, ">=1.0<1.5").unwrap(),
            VersionCheck::Unmet
        );
    }

    #[test]
    fn malformed_predicate_errors() {
        assert!(require_check(&Version::parse("1.0"), "nope").is_err());
    }
}
