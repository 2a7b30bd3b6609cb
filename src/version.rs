//! Debian version comparison, Debian Policy §5.6.12.
//!
//! An empty version string is a valid input here (used for virtual
//! placeholder packages); it compares less than any non-empty version.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    upstream: String,
    revision: String,
}

/// Equality follows `cmp`, not field equality: `1.01` and `1.1` compare
/// `Equal` under the Debian Policy segment rule and must also be `==`, or
/// `dedup`/`BTreeSet`/binary-search over `Version` would disagree with sort
/// order.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Version {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.epoch == 0 && self.upstream.is_empty() && self.revision.is_empty()
    }

    /// Parses a Debian version string. Never fails: an unparseable
    /// epoch is treated as 0 and the remainder is taken as upstream.
    pub fn parse(s: &str) -> Version {
        let s = s.trim();
        if s.is_empty() {
            return Version {
                epoch: 0,
                upstream: String::new(),
                revision: String::new(),
            };
        }

        let (epoch, rest) = match s.split_once(':') {
            Some((e, r)) => (e.parse::<u64>().unwrap_or(0), r),
            None => (0, s),
        };

        let (upstream, revision) = match rest.rfind('-') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };

        Version {
            epoch,
            upstream: upstream.to_string(),
            revision: revision.to_string(),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| debian_cmp_str(&self.upstream, &other.upstream))
            .then_with(|| debian_cmp_str(&self.revision, &other.revision))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if !self.revision.is_empty() {
            write!(f, "-{}", self.revision)?;
        }
        Ok(())
    }
}

/// Implements the Debian version segment-comparison rule: alternating
/// non-digit and digit runs, non-digit runs ordered by `order_char`.
fn debian_cmp_str(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        let diff = compare_non_digits(&mut a_chars, &mut b_chars);
        if diff != Ordering::Equal {
            return diff;
        }

        let diff = compare_digits(&mut a_chars, &mut b_chars);
        if diff != Ordering::Equal {
            return diff;
        }

        if a_chars.peek().is_none() && b_chars.peek().is_none() {
            return Ordering::Equal;
        }
    }
}

fn compare_digits(a: &mut Peekable<Chars>, b: &mut Peekable<Chars>) -> Ordering {
    parse_leading_digits(a).cmp(&parse_leading_digits(b))
}

fn parse_leading_digits(chars: &mut Peekable<Chars>) -> u64 {
    let mut num: u64 = 0;
    while let Some(&c) = chars.peek() {
        if let Some(d) = c.to_digit(10) {
            chars.next();
            num = num.saturating_mul(10).saturating_add(d as u64);
        } else {
            break;
        }
    }
    num
}

fn compare_non_digits(a: &mut Peekable<Chars>, b: &mut Peekable<Chars>) -> Ordering {
    loop {
        let ca = a.next_if(|c| !c.is_ascii_digit());
        let cb = b.next_if(|c| !c.is_ascii_digit());

        match (ca, cb) {
            (None, None) => return Ordering::Equal,
            (Some(char_a), Some(char_b)) => {
                let ord = order_char(char_a).cmp(&order_char(char_b));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(char_a), None) => return order_char(char_a).cmp(&0),
            (None, Some(char_b)) => return 0.cmp(&order_char(char_b)),
        }
    }
}

/// `~` sorts below end-of-segment; letters sort below everything else.
fn order_char(c: char) -> i32 {
    if c == '~' {
        -1
    } else if c.is_ascii_alphabetic() {
        c as i32
    } else {
        c as i32 + 256
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl VersionOp {
    pub fn parse(op: &str) -> Option<VersionOp> {
        match op {
            "<<" | "<" => Some(VersionOp::Lt),
            "<=" => Some(VersionOp::Le),
            "=" => Some(VersionOp::Eq),
            ">=" => Some(VersionOp::Ge),
            ">>" | ">" => Some(VersionOp::Gt),
            _ => None,
        }
    }

    pub fn matches(&self, ord: Ordering) -> bool {
        match self {
            VersionOp::Lt => ord == Ordering::Less,
            VersionOp::Le => ord != Ordering::Greater,
            VersionOp::Eq => ord == Ordering::Equal,
            VersionOp::Ge => ord != Ordering::Less,
            VersionOp::Gt => ord == Ordering::Greater,
        }
    }

    /// Evaluates `candidate OP reference`.
    pub fn evaluate(&self, candidate: &Version, reference: &Version) -> bool {
        if candidate.is_empty() && !reference.is_empty() {
            return self.matches(Ordering::Less);
        }
        self.matches(candidate.cmp(reference))
    }
}
