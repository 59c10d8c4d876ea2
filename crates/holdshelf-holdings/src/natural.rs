//! Natural-order string comparison ("2020:10" after "2020:9").

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

lazy_static! {
    /// Alternating ASCII digit and non-digit runs
    static ref CHUNKS: Regex = Regex::new(r"[0-9]+|[^0-9]+").unwrap();
}

/// Compare two strings chunk by chunk; digit runs compare by value.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = CHUNKS.find_iter(a).map(|m| m.as_str());
    let mut right = CHUNKS.find_iter(b).map(|m| m.as_str());

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digits(x), is_digits(y)) {
                    (true, true) => cmp_digits(x, y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn is_digits(chunk: &str) -> bool {
    chunk.bytes().all(|b| b.is_ascii_digit())
}

// Compares arbitrarily long digit runs without overflowing.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
