//! Natural (human) filename ordering
//!
//! Splits names into alternating digit/non-digit runs; digit runs compare
//! as integers, text runs case-insensitively. "frame2" sorts before
//! "frame10", and "frame2_v9" before "frame2_v10".

use std::cmp::Ordering;

/// One run of a filename: either a number or a chunk of text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Run {
    /// Digit run, kept as the raw string so arbitrarily long numbers
    /// never overflow. Leading zeros are insignificant for ordering.
    Number(String),
    /// Non-digit run, lowercased for case-insensitive comparison.
    Text(String),
}

impl Run {
    fn cmp_run(&self, other: &Run) -> Ordering {
        match (self, other) {
            (Run::Number(a), Run::Number(b)) => cmp_number_str(a, b),
            (Run::Text(a), Run::Text(b)) => a.cmp(b),
            // Mixed runs at the same position: numbers sort before text,
            // matching how "a1" orders against "ab".
            (Run::Number(_), Run::Text(_)) => Ordering::Less,
            (Run::Text(_), Run::Number(_)) => Ordering::Greater,
        }
    }
}

/// Compare two digit strings as integers without parsing them.
///
/// Strips leading zeros, then compares by length (more digits = larger),
/// then lexically. Equal values with different padding ("007" vs "7")
/// compare equal.
fn cmp_number_str(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Split a name into its digit/non-digit runs.
fn runs(name: &str) -> Vec<Run> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_digits = false;

    for ch in name.chars() {
        let digit = ch.is_ascii_digit();
        if !buf.is_empty() && digit != in_digits {
            out.push(finish_run(std::mem::take(&mut buf), in_digits));
        }
        in_digits = digit;
        buf.push(ch);
    }
    if !buf.is_empty() {
        out.push(finish_run(buf, in_digits));
    }
    out
}

fn finish_run(buf: String, in_digits: bool) -> Run {
    if in_digits {
        Run::Number(buf)
    } else {
        Run::Text(buf.to_lowercase())
    }
}

/// Total order over filenames treating embedded digit runs as numbers.
///
/// Falls back to a raw byte comparison when all runs compare equal, so the
/// order stays deterministic for names like "f7.png" vs "f007.png".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ra = runs(a);
    let rb = runs(b);

    for (x, y) in ra.iter().zip(rb.iter()) {
        match x.cmp_run(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    ra.len().cmp(&rb.len()).then_with(|| a.cmp(b))
}
