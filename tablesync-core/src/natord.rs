//! Natural, case-insensitive string ordering.
//!
//! Digit runs compare by numeric value (`"item2" < "item10"`), everything
//! else compares by lowercased character.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare `a` and `b` in natural, case-insensitive order.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    let mut left = a.trim_start().chars().peekable();
    let mut right = b.trim_start().chars().peekable();

    loop {
        let (ca, cb) = match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => (ca, cb),
        };

        if ca.is_ascii_digit() && cb.is_ascii_digit() {
            let run_a = take_digits(&mut left);
            let run_b = take_digits(&mut right);
            let ord = compare_digit_runs(&run_a, &run_b);
            if ord != Ordering::Equal {
                return ord;
            }
            continue;
        }

        let ord = ca.to_lowercase().cmp(cb.to_lowercase());
        if ord != Ordering::Equal {
            return ord;
        }
        left.next();
        right.next();
    }
}

/// Sort `items` in place with [`compare_ignore_case`]. Stable.
pub fn sort_ignore_case<S: AsRef<str>>(items: &mut [S]) {
    items.sort_by(|a, b| compare_ignore_case(a.as_ref(), b.as_ref()));
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let ta = a.trim_start_matches('0');
    let tb = b.trim_start_matches('0');
    ta.len()
        .cmp(&tb.len())
        .then_with(|| ta.cmp(tb))
        .then_with(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(compare_ignore_case("item2", "item10"), Ordering::Less);
        assert_eq!(compare_ignore_case("item10", "item2"), Ordering::Greater);
        assert_eq!(compare_ignore_case("10", "9"), Ordering::Greater);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(compare_ignore_case("Beta", "alpha"), Ordering::Greater);
        assert_eq!(compare_ignore_case("ABC", "abc"), Ordering::Equal);
    }

    #[test]
    fn leading_zeros_break_ties_only() {
        assert_eq!(compare_ignore_case("a007", "a7"), Ordering::Greater);
        assert_eq!(compare_ignore_case("a007", "a8"), Ordering::Less);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(compare_ignore_case("abc", "abcd"), Ordering::Less);
        assert_eq!(compare_ignore_case("", "a"), Ordering::Less);
    }

    #[test]
    fn non_ascii_letters_compare_lowercased() {
        assert_eq!(compare_ignore_case("Äänekoski", "äänekoski"), Ordering::Equal);
    }

    #[test]
    fn sort_orders_mixed_identifiers() {
        let mut ids = vec!["APP10", "app2", "App1", "B"];
        sort_ignore_case(&mut ids);
        assert_eq!(ids, vec!["App1", "app2", "APP10", "B"]);
    }
}
