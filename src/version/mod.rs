// src/version/mod.rs

//! Version handling and selector admission for Portage-style packages
//!
//! Versions follow the ebuild grammar `<base>[_suffix...][-rN][+build]`:
//! - "1.2.3" → base=[1, 2, 3]
//! - "1.2.3_pre1" → base=[1, 2, 3], suffix=pre1
//! - "2.0_p20240101-r2" → base=[2, 0], suffix=p20240101, revision=2
//! - "1.0+gentoo" → base=[1, 0], build="gentoo"
//!
//! Ordering compares the base components (numeric ones as integers, the rest
//! as strings), then the suffixes (`_alpha < _beta < _pre < _rc < none < _p`),
//! then the revision and finally the build tag.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use tracing::warn;

/// Release suffix kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuffixKind {
    Alpha,
    Beta,
    Pre,
    Rc,
    P,
}

impl SuffixKind {
    /// Rank relative to a version without suffix (which ranks 0)
    fn rank(self) -> i8 {
        match self {
            SuffixKind::Alpha => -4,
            SuffixKind::Beta => -3,
            SuffixKind::Pre => -2,
            SuffixKind::Rc => -1,
            SuffixKind::P => 1,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SuffixKind::Alpha => "alpha",
            SuffixKind::Beta => "beta",
            SuffixKind::Pre => "pre",
            SuffixKind::Rc => "rc",
            SuffixKind::P => "p",
        }
    }

    /// Split a suffix token (without the leading `_`) into kind and digits
    fn split_token(token: &str) -> Option<(Self, &str)> {
        // "pre" must be tried before "p"
        const KINDS: [(&str, SuffixKind); 5] = [
            ("alpha", SuffixKind::Alpha),
            ("beta", SuffixKind::Beta),
            ("pre", SuffixKind::Pre),
            ("rc", SuffixKind::Rc),
            ("p", SuffixKind::P),
        ];

        KINDS
            .iter()
            .find_map(|(prefix, kind)| token.strip_prefix(prefix).map(|rest| (*kind, rest)))
    }
}

/// A release suffix such as `_rc2` or `_p20240101`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suffix {
    pub kind: SuffixKind,
    /// Digits following the kind, kept as text so long dates never overflow
    pub number: Option<String>,
}

impl Suffix {
    fn compare(&self, other: &Suffix) -> Ordering {
        self.kind.rank().cmp(&other.kind.rank()).then_with(|| {
            cmp_numeric(
                self.number.as_deref().unwrap_or("0"),
                other.number.as_deref().unwrap_or("0"),
            )
        })
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.kind.as_str())?;
        if let Some(ref number) = self.number {
            write!(f, "{}", number)?;
        }
        Ok(())
    }
}

/// Compare two digit strings by numeric value without parsing them
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Compare two dot-separated base components
fn cmp_component(a: &str, b: &str) -> Ordering {
    if is_digits(a) && is_digits(b) {
        cmp_numeric(a, b)
    } else {
        a.cmp(b)
    }
}

/// A parsed Portage package version
#[derive(Debug, Clone)]
pub struct PortageVersion {
    base: String,
    suffixes: Vec<Suffix>,
    revision: Option<u64>,
    build: Option<String>,
}

impl PortageVersion {
    /// Parse a plain version string (no leading comparator)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::ParseError("Empty version string".to_string()));
        }

        let (rest, build) = match s.split_once('+') {
            Some((_, b)) if b.is_empty() => {
                return Err(Error::ParseError(format!("Empty build tag in version '{}'", s)));
            }
            Some((v, b)) => (v, Some(b.to_string())),
            None => (s, None),
        };

        let (rest, revision) = match rest.rfind("-r") {
            Some(pos) if is_digits(&rest[pos + 2..]) => {
                let rev = rest[pos + 2..].parse::<u64>().map_err(|e| {
                    Error::ParseError(format!("Invalid revision in version '{}': {}", s, e))
                })?;
                (&rest[..pos], Some(rev))
            }
            _ => (rest, None),
        };

        if rest.contains('-') {
            return Err(Error::ParseError(format!(
                "Invalid revision in version '{}'",
                s
            )));
        }

        let mut tokens = rest.split('_');
        let base = tokens.next().unwrap_or_default();
        Self::validate_base(base, s)?;

        let mut suffixes = Vec::new();
        for token in tokens {
            let (kind, digits) = SuffixKind::split_token(token).ok_or_else(|| {
                Error::ParseError(format!("Invalid suffix '_{}' in version '{}'", token, s))
            })?;
            if !digits.is_empty() && !is_digits(digits) {
                return Err(Error::ParseError(format!(
                    "Invalid suffix '_{}' in version '{}'",
                    token, s
                )));
            }
            suffixes.push(Suffix {
                kind,
                number: (!digits.is_empty()).then(|| digits.to_string()),
            });
        }

        Ok(Self {
            base: base.to_string(),
            suffixes,
            revision,
            build,
        })
    }

    fn validate_base(base: &str, original: &str) -> Result<()> {
        let starts_with_digit = base.bytes().next().is_some_and(|b| b.is_ascii_digit());
        let components_ok = base
            .split('.')
            .all(|c| !c.is_empty() && c.bytes().all(|b| b.is_ascii_alphanumeric()));

        if starts_with_digit && components_ok {
            Ok(())
        } else {
            Err(Error::ParseError(format!(
                "Invalid base version '{}' in '{}'",
                base, original
            )))
        }
    }

    /// The dot-separated base, e.g. "1.2.3"
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn suffixes(&self) -> &[Suffix] {
        &self.suffixes
    }

    /// Revision number; a version without `-rN` has revision 0
    pub fn revision(&self) -> u64 {
        self.revision.unwrap_or(0)
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    fn cmp_base(&self, other: &Self) -> Ordering {
        let mut a = self.base.split('.');
        let mut b = other.base.split('.');
        loop {
            match (a.next(), b.next()) {
                (Some(x), Some(y)) => match cmp_component(x, y) {
                    Ordering::Equal => {}
                    ord => return ord,
                },
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (None, None) => return Ordering::Equal,
            }
        }
    }

    fn cmp_suffixes(&self, other: &Self) -> Ordering {
        let len = self.suffixes.len().max(other.suffixes.len());
        for i in 0..len {
            let ord = match (self.suffixes.get(i), other.suffixes.get(i)) {
                (Some(x), Some(y)) => x.compare(y),
                (Some(x), None) => x.kind.rank().cmp(&0),
                (None, Some(y)) => 0.cmp(&y.kind.rank()),
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Compare base and suffixes only, ignoring revision and build
    pub fn cmp_release(&self, other: &Self) -> Ordering {
        self.cmp_base(other).then_with(|| self.cmp_suffixes(other))
    }

    /// Compare two versions with ebuild semantics
    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp_release(other)
            .then_with(|| self.revision().cmp(&other.revision()))
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl fmt::Display for PortageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for suffix in &self.suffixes {
            write!(f, "{}", suffix)?;
        }
        if let Some(rev) = self.revision {
            write!(f, "-r{}", rev)?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl PartialEq for PortageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for PortageVersion {}

impl Ord for PortageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for PortageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Leading comparator of a selector string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    /// `~` / `~=`: same release, any revision
    Tilde,
}

impl Comparator {
    /// Split a leading comparator off `s`
    fn strip(s: &str) -> (Option<Self>, &str) {
        const PREFIXES: [(&str, Comparator); 7] = [
            (">=", Comparator::GreaterOrEqual),
            ("<=", Comparator::LessOrEqual),
            ("~=", Comparator::Tilde),
            (">", Comparator::Greater),
            ("<", Comparator::Less),
            ("=", Comparator::Equal),
            ("~", Comparator::Tilde),
        ];

        for (prefix, cmp) in PREFIXES {
            if let Some(rest) = s.strip_prefix(prefix) {
                return (Some(cmp), rest.trim_start());
            }
        }
        (None, s)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::Less => "<",
            Comparator::LessOrEqual => "<=",
            Comparator::Greater => ">",
            Comparator::GreaterOrEqual => ">=",
            Comparator::Equal => "=",
            Comparator::Tilde => "~",
        };
        write!(f, "{}", s)
    }
}

/// Parse a version string that may carry a leading comparator
///
/// ">=1.2-r1" → (Some(GreaterOrEqual), 1.2-r1); "1.2" → (None, 1.2)
pub fn parse_version(s: &str) -> Result<(Option<Comparator>, PortageVersion)> {
    let (cmp, rest) = Comparator::strip(s.trim());
    let version = PortageVersion::parse(rest)?;
    Ok((cmp, version))
}

/// A version constraint evaluated against candidate versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// `>=0`, `*` or empty: every version is admitted
    Any,
    /// Bare version or `=`
    Exact(PortageVersion),
    /// `=1.2*`: string prefix of the candidate
    Prefix(String),
    /// `~1.2`: same release, any revision or build
    Release(PortageVersion),
    GreaterThan(PortageVersion),
    GreaterOrEqual(PortageVersion),
    LessThan(PortageVersion),
    LessOrEqual(PortageVersion),
}

impl VersionSelector {
    /// Parse a selector string
    ///
    /// Examples:
    /// - ">=0" → Any
    /// - "1.2" → Exact(1.2)
    /// - "<2.0_rc1" → LessThan(2.0_rc1)
    /// - "=1.2*" → Prefix("1.2")
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Ok(VersionSelector::Any);
        }

        let (cmp, rest) = Comparator::strip(s);

        if cmp == Some(Comparator::Equal) {
            if let Some(prefix) = rest.strip_suffix('*') {
                // Validate what precedes the glob
                PortageVersion::parse(prefix.trim_end_matches('.'))?;
                return Ok(VersionSelector::Prefix(prefix.to_string()));
            }
        }

        let version = PortageVersion::parse(rest)?;
        Ok(match cmp {
            None | Some(Comparator::Equal) => VersionSelector::Exact(version),
            Some(Comparator::GreaterOrEqual) if rest == "0" => VersionSelector::Any,
            Some(Comparator::GreaterOrEqual) => VersionSelector::GreaterOrEqual(version),
            Some(Comparator::Greater) => VersionSelector::GreaterThan(version),
            Some(Comparator::LessOrEqual) => VersionSelector::LessOrEqual(version),
            Some(Comparator::Less) => VersionSelector::LessThan(version),
            Some(Comparator::Tilde) => VersionSelector::Release(version),
        })
    }

    /// Check whether `candidate` satisfies this selector
    pub fn admits(&self, candidate: &PortageVersion) -> bool {
        match self {
            VersionSelector::Any => true,
            VersionSelector::Exact(v) => candidate == v,
            VersionSelector::Prefix(p) => candidate.to_string().starts_with(p.as_str()),
            VersionSelector::Release(v) => candidate.cmp_release(v) == Ordering::Equal,
            VersionSelector::GreaterThan(v) => candidate > v,
            VersionSelector::GreaterOrEqual(v) => candidate >= v,
            VersionSelector::LessThan(v) => candidate < v,
            VersionSelector::LessOrEqual(v) => candidate <= v,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, VersionSelector::Any)
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Any => write!(f, ">=0"),
            VersionSelector::Exact(v) => write!(f, "={}", v),
            VersionSelector::Prefix(p) => write!(f, "={}*", p),
            VersionSelector::Release(v) => write!(f, "~{}", v),
            VersionSelector::GreaterThan(v) => write!(f, ">{}", v),
            VersionSelector::GreaterOrEqual(v) => write!(f, ">={}", v),
            VersionSelector::LessThan(v) => write!(f, "<{}", v),
            VersionSelector::LessOrEqual(v) => write!(f, "<={}", v),
        }
    }
}

/// Total order over version strings
///
/// Parseable versions use ebuild ordering and sort before unparseable ones,
/// which fall back to plain string order among themselves.
pub fn cmp_version_str(a: &str, b: &str) -> Ordering {
    match (PortageVersion::parse(a), PortageVersion::parse(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Evaluate a selector string against a candidate version string
///
/// Unparseable input never aborts the caller: it is logged and the
/// candidate is treated as not admitted.
pub fn admit(selector: &str, candidate: &str) -> bool {
    let selector = match VersionSelector::parse(selector) {
        Ok(s) => s,
        Err(e) => {
            warn!("Ignoring selector '{}': {}", selector, e);
            return false;
        }
    };

    match PortageVersion::parse(candidate) {
        Ok(v) => selector.admits(&v),
        Err(e) => {
            warn!("Cannot evaluate version '{}': {}", candidate, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PortageVersion {
        PortageVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let ver = v("1.2.3");
        assert_eq!(ver.base(), "1.2.3");
        assert!(ver.suffixes().is_empty());
        assert_eq!(ver.revision(), 0);
        assert_eq!(ver.build(), None);
    }

    #[test]
    fn test_parse_full() {
        let ver = v("2.0_p20240101-r2+gentoo");
        assert_eq!(ver.base(), "2.0");
        assert_eq!(ver.suffixes().len(), 1);
        assert_eq!(ver.suffixes()[0].kind, SuffixKind::P);
        assert_eq!(ver.suffixes()[0].number.as_deref(), Some("20240101"));
        assert_eq!(ver.revision(), 2);
        assert_eq!(ver.build(), Some("gentoo"));
    }

    #[test]
    fn test_parse_with_comparator() {
        let (cmp, ver) = parse_version(">=1.2-r1").unwrap();
        assert_eq!(cmp, Some(Comparator::GreaterOrEqual));
        assert_eq!(ver.to_string(), "1.2-r1");

        let (cmp, ver) = parse_version("~3.0").unwrap();
        assert_eq!(cmp, Some(Comparator::Tilde));
        assert_eq!(ver.base(), "3.0");

        let (cmp, _) = parse_version("1.0").unwrap();
        assert_eq!(cmp, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "abc", "1.0_foo", "1.0-beta", "1..2", "1.0+", "1.0_rcX", ">="] {
            assert!(PortageVersion::parse(bad).is_err() || parse_version(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_display_roundtrip() {
        for s in ["1.2.3", "1.0_alpha", "1.0_rc2-r3", "0.9_pre1_p2", "5.4+build7"] {
            assert_eq!(v(s).to_string(), s);
        }
    }

    #[test]
    fn test_ordering_table() {
        // Each row is strictly ascending
        let rows: &[&[&str]] = &[
            &["1.0", "1.0.1", "1.1", "1.10", "2"],
            &["1.0_alpha", "1.0_alpha2", "1.0_beta", "1.0_pre", "1.0_rc1", "1.0", "1.0_p1"],
            &["1.0_rc1", "1.0_rc2", "1.0_rc10"],
            &["1.0", "1.0-r1", "1.0-r2", "1.0-r10"],
            &["1.0", "1.0+a", "1.0+b"],
            &["1.0_p20231231", "1.0_p20240101"],
            &["1.9", "1.10_alpha", "1.10"],
        ];

        for row in rows {
            for pair in row.windows(2) {
                assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(v("1.0"), v("1.00"));
        assert_eq!(v("1.0"), v("1.0-r0"));
        assert_ne!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn test_non_numeric_components() {
        assert!(v("1.2a") > v("1.2"));
        assert!(v("1.2b") > v("1.2a"));
    }

    #[test]
    fn test_cmp_version_str_total() {
        let mut versions = vec!["zzz", "1.10", "??", "1.2", "abc", "1.9_rc1"];
        versions.sort_by(|a, b| cmp_version_str(a, b));
        assert_eq!(versions, vec!["1.2", "1.9_rc1", "1.10", "??", "abc", "zzz"]);

        // Antisymmetric across the parseable/unparseable boundary
        assert_eq!(cmp_version_str("1.0", "abc"), Ordering::Less);
        assert_eq!(cmp_version_str("abc", "1.0"), Ordering::Greater);
        assert_eq!(cmp_version_str("1.0", "1.00"), Ordering::Equal);
    }

    #[test]
    fn test_selector_any() {
        for s in [">=0", "", "*"] {
            let sel = VersionSelector::parse(s).unwrap();
            assert!(sel.is_any());
            assert!(sel.admits(&v("0_alpha")));
            assert!(sel.admits(&v("99.9")));
        }
    }

    #[test]
    fn test_selector_comparators() {
        let cases = [
            (">=1.2", "1.2", true),
            (">=1.2", "1.1", false),
            (">1.2", "1.2", false),
            (">1.2", "1.2-r1", true),
            ("<2.0", "2.0_rc1", true),
            ("<2.0", "2.0", false),
            ("<=2.0", "2.0", true),
            ("=1.5", "1.5", true),
            ("1.5", "1.5-r1", false),
            ("~1.5", "1.5-r3", true),
            ("~=1.5", "1.5+x", true),
            ("~1.5", "1.6", false),
            ("=1.2*", "1.2.7", true),
            ("=1.2*", "1.3", false),
        ];

        for (sel, cand, expected) in cases {
            assert_eq!(admit(sel, cand), expected, "{} admits {}", sel, cand);
        }
    }

    #[test]
    fn test_admit_parse_failure_is_not_admitted() {
        assert!(!admit(">=not-a-version", "1.0"));
        assert!(!admit(">=1.0", "garbage"));
    }

    #[test]
    fn test_selector_monotone() {
        let ladder = ["0.9", "1.0_rc1", "1.0", "1.0-r1", "1.0_p1", "1.1", "2.0"];
        for op in [">=", ">", "<=", "<"] {
            let sel = VersionSelector::parse(&format!("{}1.0", op)).unwrap();
            let results: Vec<bool> = ladder.iter().map(|c| sel.admits(&v(c))).collect();
            let changes = results.windows(2).filter(|w| w[0] != w[1]).count();
            assert!(changes <= 1, "{} is not monotone: {:?}", op, results);
        }
    }

    #[test]
    fn test_exact_commutative() {
        let versions = ["1.0", "1.00", "1.0-r0", "1.0-r1", "1.0_p1"];
        for a in versions {
            for b in versions {
                assert_eq!(admit(&format!("={}", a), b), admit(&format!("={}", b), a));
            }
        }
    }

    #[test]
    fn test_selector_display() {
        assert_eq!(VersionSelector::parse(">= 1.2").unwrap().to_string(), ">=1.2");
        assert_eq!(VersionSelector::parse("=1.2*").unwrap().to_string(), "=1.2*");
        assert_eq!(VersionSelector::parse(">=0").unwrap().to_string(), ">=0");
    }
}
