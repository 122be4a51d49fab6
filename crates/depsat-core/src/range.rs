//! npm version range parsing and matching.
//!
//! A range is a union (`||`) of comparator sets. Every comparator in a set
//! must hold for a version to match the set. The sugared forms are lowered to
//! primitive comparators at parse time:
//!
//! - x-ranges: `*`, `1.x`, `1.2.*`, partial versions like `1` or `1.2`
//! - tilde: `~1.2.3` := `>=1.2.3 <1.3.0`
//! - caret: `^1.2.3` := `>=1.2.3 <2.0.0`, `^0.2.3` := `>=0.2.3 <0.3.0`
//! - hyphen: `1.2 - 2.3.4` := `>=1.2.0 <=2.3.4`
//!
//! Versions carrying a prerelease tag only match a set when one of its
//! comparators names the same `major.minor.patch` with a prerelease.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use semver::{Prerelease, Version};
use thiserror::Error;

/// Reasons a string is not a valid range.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid version component `{0}`")]
    Component(String),
    #[error("invalid prerelease `{0}`")]
    Prerelease(String),
    #[error("empty comparator after `{0}`")]
    DanglingOperator(String),
    #[error("too many version components in `{0}`")]
    TooManyComponents(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn new(op: Op, major: u64, minor: u64, patch: u64, pre: Prerelease) -> Self {
        let mut version = Version::new(major, minor, patch);
        version.pre = pre;
        Self { op, version }
    }

    fn plain(op: Op, major: u64, minor: u64, patch: u64) -> Self {
        Self::new(op, major, minor, patch, Prerelease::EMPTY)
    }

    fn matches(&self, version: &Version) -> bool {
        let ord = precedence(version, &self.version);
        match self.op {
            Op::Eq => ord == Ordering::Equal,
            Op::Lt => ord == Ordering::Less,
            Op::Le => ord != Ordering::Greater,
            Op::Gt => ord == Ordering::Greater,
            Op::Ge => ord != Ordering::Less,
        }
    }
}

/// Compare two versions by semver precedence, ignoring build metadata.
pub fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// A version with possibly missing (or wildcard) trailing components.
#[derive(Debug, Clone)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    fn is_full(&self) -> bool {
        self.patch.is_some()
    }

    fn floor(&self) -> (u64, u64, u64) {
        (
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        )
    }
}

/// Largest component npm accepts (`Number.MAX_SAFE_INTEGER`). Bounds are
/// computed with `+ 1`, so anything larger must be rejected here.
const MAX_COMPONENT: u64 = (1 << 53) - 1;

fn parse_partial(text: &str) -> Result<Partial, RangeError> {
    let text = text.trim_start_matches('=').trim_start_matches(&['v', 'V'][..]);
    let (core, rest) = match text.find(|c: char| c == '-' || c == '+') {
        Some(idx) => text.split_at(idx),
        None => (text, ""),
    };
    let pre_text = rest
        .strip_prefix('-')
        .map(|p| p.split('+').next().unwrap_or_default())
        .unwrap_or_default();
    let pre = if pre_text.is_empty() {
        Prerelease::EMPTY
    } else {
        Prerelease::new(pre_text).map_err(|_| RangeError::Prerelease(pre_text.to_string()))?
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err(RangeError::TooManyComponents(text.to_string()));
    }

    let mut numbers = [None; 3];
    let mut wildcard = false;
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if wildcard || matches!(*part, "x" | "X" | "*") {
            wildcard = true;
            continue;
        }
        let n = part
            .parse::<u64>()
            .ok()
            .filter(|n| *n <= MAX_COMPONENT)
            .ok_or_else(|| RangeError::Component(part.to_string()))?;
        *slot = Some(n);
    }

    Ok(Partial {
        major: numbers[0],
        minor: numbers[1],
        patch: numbers[2],
        pre,
    })
}

fn any() -> Vec<Comparator> {
    vec![Comparator::plain(Op::Ge, 0, 0, 0)]
}

fn nothing() -> Vec<Comparator> {
    vec![Comparator::plain(Op::Lt, 0, 0, 0)]
}

/// `>=floor <ceiling` for an incomplete version.
fn x_range(p: &Partial) -> Vec<Comparator> {
    match (p.major, p.minor) {
        (None, _) => any(),
        (Some(major), None) => vec![
            Comparator::plain(Op::Ge, major, 0, 0),
            Comparator::plain(Op::Lt, major + 1, 0, 0),
        ],
        (Some(major), Some(minor)) => vec![
            Comparator::plain(Op::Ge, major, minor, 0),
            Comparator::plain(Op::Lt, major, minor + 1, 0),
        ],
    }
}

fn tilde(p: &Partial) -> Vec<Comparator> {
    if !p.is_full() {
        return x_range(p);
    }
    let (major, minor, patch) = p.floor();
    vec![
        Comparator::new(Op::Ge, major, minor, patch, p.pre.clone()),
        Comparator::plain(Op::Lt, major, minor + 1, 0),
    ]
}

fn caret(p: &Partial) -> Vec<Comparator> {
    let Some(major) = p.major else {
        return any();
    };
    let (_, minor, patch) = p.floor();
    let lower = Comparator::new(Op::Ge, major, minor, patch, p.pre.clone());
    let upper = match (major, p.minor, p.patch) {
        (0, None, _) => Comparator::plain(Op::Lt, 1, 0, 0),
        (0, Some(0), None) => Comparator::plain(Op::Lt, 0, 1, 0),
        (0, Some(0), Some(patch)) => Comparator::plain(Op::Lt, 0, 0, patch + 1),
        (0, Some(minor), _) => Comparator::plain(Op::Lt, 0, minor + 1, 0),
        _ => Comparator::plain(Op::Lt, major + 1, 0, 0),
    };
    vec![lower, upper]
}

fn primitive(op: Op, p: &Partial) -> Vec<Comparator> {
    if p.is_full() {
        let (major, minor, patch) = p.floor();
        return vec![Comparator::new(op, major, minor, patch, p.pre.clone())];
    }
    let Some(major) = p.major else {
        return match op {
            Op::Lt | Op::Gt => nothing(),
            _ => any(),
        };
    };
    match (op, p.minor) {
        (Op::Eq, _) => x_range(p),
        (Op::Ge, minor) => vec![Comparator::plain(Op::Ge, major, minor.unwrap_or(0), 0)],
        (Op::Lt, minor) => vec![Comparator::plain(Op::Lt, major, minor.unwrap_or(0), 0)],
        (Op::Gt, None) | (Op::Le, None) => {
            vec![Comparator::plain(flip_to_bound(op), major + 1, 0, 0)]
        }
        (Op::Gt, Some(minor)) | (Op::Le, Some(minor)) => {
            vec![Comparator::plain(flip_to_bound(op), major, minor + 1, 0)]
        }
    }
}

/// `>1.2` is `>=1.3.0`, `<=1.2` is `<1.3.0`.
fn flip_to_bound(op: Op) -> Op {
    if op == Op::Gt {
        Op::Ge
    } else {
        Op::Lt
    }
}

fn hyphen(lower: &Partial, upper: &Partial) -> Vec<Comparator> {
    let mut set = Vec::new();
    if lower.major.is_some() {
        let (major, minor, patch) = lower.floor();
        set.push(Comparator::new(Op::Ge, major, minor, patch, lower.pre.clone()));
    }
    match (upper.major, upper.minor) {
        (None, _) => {}
        (Some(major), None) => set.push(Comparator::plain(Op::Lt, major + 1, 0, 0)),
        (Some(major), Some(minor)) if upper.patch.is_none() => {
            set.push(Comparator::plain(Op::Lt, major, minor + 1, 0))
        }
        _ => {
            let (major, minor, patch) = upper.floor();
            set.push(Comparator::new(Op::Le, major, minor, patch, upper.pre.clone()));
        }
    }
    if set.is_empty() {
        any()
    } else {
        set
    }
}

const OPERATORS: [&str; 8] = ["~>", "~", "^", ">=", "<=", ">", "<", "="];

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

fn parse_comparator(token: &str) -> Result<Vec<Comparator>, RangeError> {
    let (op, version) = split_operator(token);
    if version.is_empty() {
        return Err(RangeError::DanglingOperator(token.to_string()));
    }
    let partial = parse_partial(version)?;
    Ok(match op {
        "~" | "~>" => tilde(&partial),
        "^" => caret(&partial),
        ">=" => primitive(Op::Ge, &partial),
        "<=" => primitive(Op::Le, &partial),
        ">" => primitive(Op::Gt, &partial),
        "<" => primitive(Op::Lt, &partial),
        _ => primitive(Op::Eq, &partial),
    })
}

fn parse_set(text: &str) -> Result<Vec<Comparator>, RangeError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(any());
    }

    if let [lower, "-", upper] = tokens.as_slice() {
        return Ok(hyphen(&parse_partial(lower)?, &parse_partial(upper)?));
    }

    // Re-attach operators written apart from their version (`>= 1.2.3`).
    let mut set = Vec::new();
    let mut pending: Option<&str> = None;
    for token in tokens {
        if OPERATORS.contains(&token) {
            if let Some(op) = pending {
                return Err(RangeError::DanglingOperator(op.to_string()));
            }
            pending = Some(token);
            continue;
        }
        let joined = match pending.take() {
            Some(op) => format!("{op}{token}"),
            None => token.to_string(),
        };
        set.extend(parse_comparator(&joined)?);
    }
    if let Some(op) = pending {
        return Err(RangeError::DanglingOperator(op.to_string()));
    }
    Ok(set)
}

fn set_matches(set: &[Comparator], version: &Version) -> bool {
    if !set.iter().all(|c| c.matches(version)) {
        return false;
    }
    if version.pre.is_empty() {
        return true;
    }
    set.iter().any(|c| {
        !c.version.pre.is_empty()
            && (c.version.major, c.version.minor, c.version.patch)
                == (version.major, version.minor, version.patch)
    })
}

/// A parsed npm range expression.
///
/// Equality and hashing go through the normalized source text, which is also
/// what [`fmt::Display`] prints.
#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    sets: Vec<Vec<Comparator>>,
}

impl VersionRange {
    /// Parse an npm range. Whitespace runs are collapsed in the stored text.
    pub fn parse(spec: &str) -> Result<Self, RangeError> {
        let raw = spec.split_whitespace().collect::<Vec<_>>().join(" ");
        let sets = raw
            .split("||")
            .map(parse_set)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { raw, sets })
    }

    /// The normalized range text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Check if a version satisfies any comparator set of this range.
    pub fn contains(&self, version: &Version) -> bool {
        self.sets.iter().any(|set| set_matches(set, version))
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for VersionRange {}

impl Hash for VersionRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
