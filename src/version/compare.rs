// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! Total ordering of [Version]s.
//!
//! Upstream and revision strings are decomposed into alternating runs of
//! non-digit text and decimal digits. The text runs order the tilde before
//! the end of the string, the end of the string before letters, and letters
//! before the remaining symbols. Digit runs compare as integers. A shorter
//! decomposition is padded with zero parts, where the integer `0` and the
//! text runs `""` and `"."` all count as zero.

use super::Version;
use std::cmp::Ordering;

/// One run of a decomposed version string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Part {
    /// A run of non-digit characters (possibly empty).
    Text(String),

    /// A run of decimal digits, kept as text so arbitrarily large numbers
    /// still compare correctly.
    Digits(String),
}

impl Part {
    /// Whether this part counts as zero for padding purposes.
    pub(super) fn is_zero(&self) -> bool {
        match self {
            Part::Text(text) => text.is_empty() || text == ".",
            Part::Digits(digits) => digits.chars().all(|ch| ch == '0'),
        }
    }
}

/// Decompose a version string into its alternating parts. The first part is
/// always a [Part::Text], which is empty when the string starts with a
/// digit.
pub(super) fn parts(version: &str) -> Vec<Part> {
    let mut ret = vec![];
    let mut rest = version;
    while !rest.is_empty() {
        let split = rest
            .find(|ch: char| ch.is_ascii_digit())
            .unwrap_or(rest.len());
        ret.push(Part::Text(rest[..split].to_owned()));
        rest = &rest[split..];
        if rest.is_empty() {
            break;
        }
        let split = rest
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(rest.len());
        ret.push(Part::Digits(rest[..split].to_owned()));
        rest = &rest[split..];
    }
    ret
}

/// Rank of one text-run character. `None` stands for the end of the run,
/// which orders after the tilde but before everything else.
fn rank(ch: Option<char>) -> u32 {
    match ch {
        Some('~') => 0,
        None => 1,
        Some(ch) if ch.is_ascii_alphabetic() => 2 + ch as u32,
        Some(ch) => 0x200 + ch as u32,
    }
}

fn compare_text(left: &str, right: &str) -> Ordering {
    let mut left = left.chars();
    let mut right = right.chars();
    loop {
        let (l, r) = (left.next(), right.next());
        if l.is_none() && r.is_none() {
            return Ordering::Equal;
        }
        match rank(l).cmp(&rank(r)) {
            Ordering::Equal => {}
            v => return v,
        }
    }
}

fn compare_digits(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    match left.len().cmp(&right.len()) {
        Ordering::Equal => left.cmp(right),
        v => v,
    }
}

fn compare_parts(left: &[Part], right: &[Part]) -> Ordering {
    for (l, r) in left.iter().zip(right.iter()) {
        let cmp = match (l, r) {
            (Part::Text(l), Part::Text(r)) => compare_text(l, r),
            (Part::Digits(l), Part::Digits(r)) => compare_digits(l, r),
            // the decompositions strictly alternate starting with text, so
            // aligned parts always agree in kind
            _ => unreachable!(),
        };
        match cmp {
            Ordering::Equal => {}
            v => return v,
        }
    }
    // the shorter side is padded with zeros
    if left.len() > right.len() {
        for part in &left[right.len()..] {
            if !part.is_zero() {
                // a trailing text part may still order below zero padding
                // when it starts with a tilde
                return match part {
                    Part::Text(text) if text.starts_with('~') => Ordering::Less,
                    _ => Ordering::Greater,
                };
            }
        }
    } else {
        for part in &right[left.len()..] {
            if !part.is_zero() {
                return match part {
                    Part::Text(text) if text.starts_with('~') => Ordering::Greater,
                    _ => Ordering::Less,
                };
            }
        }
    }
    Ordering::Equal
}

fn compare_version_str(left: &str, right: &str) -> Ordering {
    compare_parts(&parts(left), &parts(right))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.epoch().cmp(&other.epoch()) {
            Ordering::Equal => {}
            v => return v,
        }
        match compare_version_str(self.upstream(), other.upstream()) {
            Ordering::Equal => {}
            v => return v,
        }
        compare_version_str(
            self.revision().unwrap_or("0"),
            other.revision().unwrap_or("0"),
        )
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality must agree with the ordering: "1.0" and "1.0.0" are the same
// version even though their stored parts differ.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_cmp {
        ($name:ident, $version1:expr, $version2:expr, $check:expr) => {
            #[test]
            fn $name() {
                let v1: Version = $version1.parse().unwrap();
                let v2: Version = $version2.parse().unwrap();
                let cmp = v1.cmp(&v2);
                assert_eq!(
                    $check, cmp,
                    "{} should be {:?} than {} but is reported as {:?}",
                    v1, $check, v2, cmp
                );
                assert_eq!($check.reverse(), v2.cmp(&v1));
            }
        };
    }

    #[test]
    fn check_decompose() {
        assert_eq!(
            vec![
                Part::Text("".to_owned()),
                Part::Digits("1".to_owned()),
                Part::Text(".".to_owned()),
                Part::Digits("2".to_owned()),
                Part::Text("foo+bar~".to_owned()),
                Part::Digits("1".to_owned()),
                Part::Text("~".to_owned()),
            ],
            parts("1.2foo+bar~1~")
        );
    }

    check_cmp!(cmp_simple_eq, "1.0", "1.0", Ordering::Equal);
    check_cmp!(cmp_simple_l, "1.0", "1.2", Ordering::Less);
    check_cmp!(cmp_simple_alpha, "1a2b", "1a2b", Ordering::Equal);
    check_cmp!(cmp_simple_alpha_l, "1a2a", "1a2b", Ordering::Less);
    check_cmp!(cmp_letters_before_symbols, "1.0a", "1.0+", Ordering::Less);

    check_cmp!(cmp_tilde, "0~~a", "0~a", Ordering::Less);
    check_cmp!(cmp_tilde_eof, "0~~", "0~", Ordering::Less);
    check_cmp!(cmp_tilde_l1, "0.1a", "0.1aa", Ordering::Less);
    check_cmp!(cmp_tilde_l2, "0.1a~", "0.1aa", Ordering::Less);
    check_cmp!(cmp_tilde_end, "1.0~", "1.0", Ordering::Less);
    check_cmp!(cmp_tilde_rc, "1.0~rc1", "1.0", Ordering::Less);
    check_cmp!(cmp_tilde_rc_rc, "1.0~rc1", "1.0~rc2", Ordering::Less);

    check_cmp!(cmp_revision_eq, "1.0-1", "1.0-1", Ordering::Equal);
    check_cmp!(cmp_revision_l, "1.0-1", "1.0-2", Ordering::Less);
    check_cmp!(cmp_revision_absent, "1.0", "1.0-1", Ordering::Less);
    check_cmp!(cmp_revision_zero, "1.0", "1.0-0", Ordering::Equal);

    check_cmp!(cmp_epoch_dominates, "1:0.1", "2.0", Ordering::Greater);
    check_cmp!(cmp_epoch_zero, "0:1.0", "1.0", Ordering::Equal);

    check_cmp!(cmp_zero_padding, "1.0", "1.0.0", Ordering::Equal);
    check_cmp!(cmp_zero_padding_dot, "1.0", "1.0.", Ordering::Equal);
    check_cmp!(cmp_zero_padding_plus, "1.0", "1.0+", Ordering::Less);
    check_cmp!(cmp_big_numbers, "9", "10", Ordering::Less);
    check_cmp!(cmp_leading_zeros, "1.01", "1.1", Ordering::Equal);
    check_cmp!(
        cmp_huge_numbers,
        "1.18446744073709551616",
        "1.18446744073709551615",
        Ordering::Greater
    );

    #[test]
    fn version_sort() {
        let mut versions = [
            "1.3",
            "1.0",
            "1.0+dfsg1-1",
            "1.0-1",
            "1.1",
            "0:1.2",
            "1:0.1",
            "1.0+dfsg1",
            "1.0~dfsg1",
        ]
        .into_iter()
        .map(|v| v.parse::<Version>().unwrap())
        .collect::<Vec<_>>();

        versions.sort();

        assert_eq!(
            vec![
                "1.0~dfsg1",
                "1.0",
                "1.0-1",
                "1.0+dfsg1",
                "1.0+dfsg1-1",
                "1.1",
                "0:1.2",
                "1.3",
                "1:0.1",
            ]
            .into_iter()
            .map(|v| v.parse::<Version>().unwrap())
            .collect::<Vec<_>>(),
            versions
        );
    }

    #[test]
    fn ordering_is_antisymmetric_and_transitive() {
        let versions = ["1.0~rc1", "1.0", "1.0-1", "1.0.0", "1.1", "1:0.1"]
            .into_iter()
            .map(|v| v.parse::<Version>().unwrap())
            .collect::<Vec<_>>();
        for a in &versions {
            assert_eq!(Ordering::Equal, a.cmp(a));
            for b in &versions {
                assert_eq!(a.cmp(b).reverse(), b.cmp(a));
                for c in &versions {
                    if a.cmp(b) == b.cmp(c) {
                        assert_eq!(a.cmp(b), a.cmp(c));
                    }
                }
            }
        }
    }
}

// vim: foldmethod=marker
