//! Primitive signature transformations and their interpreter

use serde::{Deserialize, Serialize};
use std::fmt;

/// One primitive step of a signature cipher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg", rename_all = "snake_case")]
pub enum Operation {
    /// Reverse the working array
    Reverse,
    /// Remove the first `n` elements
    Drop(usize),
    /// Swap element 0 with the element at `index % len`
    SwapFirstWith(usize),
}

impl Operation {
    /// Apply this operation to a working array in place.
    ///
    /// Never fails: over-long drops empty the array and swaps on an empty
    /// array are no-ops.
    pub fn apply_in_place(&self, chars: &mut Vec<char>) {
        match *self {
            Operation::Reverse => chars.reverse(),
            Operation::Drop(n) => {
                let n = n.min(chars.len());
                chars.drain(..n);
            }
            Operation::SwapFirstWith(index) => {
                if !chars.is_empty() {
                    let idx = index % chars.len();
                    chars.swap(0, idx);
                }
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Reverse => write!(f, "reverse"),
            Operation::Drop(n) => write!(f, "drop({})", n),
            Operation::SwapFirstWith(i) => write!(f, "swap({})", i),
        }
    }
}

/// Run `ops` left to right over the characters of `input`
pub fn apply(input: &str, ops: &[Operation]) -> String {
    let mut chars: Vec<char> = input.chars().collect();
    for op in ops {
        op.apply_in_place(&mut chars);
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_algorithm_is_identity() {
        for s in ["", "a", "abc123", "ÄÖü-_="] {
            assert_eq!(apply(s, &[]), s);
        }
    }

    #[test]
    fn test_double_reverse_is_identity() {
        for s in ["", "x", "abc123", "AOq0QJ8wRAIgXmPlOPSBkkUs1bYFYlJCfe29xx8j7v1pDL0QwbdV96sCIEzpWqMGkFR20CFOg51Tp-7vj_EMu-m37KtXJ2OySqa0q"] {
            assert_eq!(apply(s, &[Operation::Reverse, Operation::Reverse]), s);
        }
    }

    #[test]
    fn test_swap_drop_reverse_sequence() {
        let ops = [
            Operation::SwapFirstWith(3),
            Operation::Drop(2),
            Operation::Reverse,
        ];
        assert_eq!(apply("ABCDEFGH", &ops), "HGFEAC");
    }

    #[test]
    fn test_order_is_significant() {
        let forward = [Operation::Drop(1), Operation::Reverse];
        let backward = [Operation::Reverse, Operation::Drop(1)];
        assert_eq!(apply("abcd", &forward), "dcb");
        assert_eq!(apply("abcd", &backward), "cba");
    }

    #[test]
    fn test_drop_past_end_empties() {
        assert_eq!(apply("abc", &[Operation::Drop(3)]), "");
        assert_eq!(apply("abc", &[Operation::Drop(50)]), "");
        assert_eq!(apply("", &[Operation::Drop(1)]), "");
        assert_eq!(apply("abc", &[Operation::Drop(usize::MAX)]), "");
    }

    #[test]
    fn test_swap_zero_is_noop() {
        for s in ["", "a", "ab", "abc123"] {
            assert_eq!(apply(s, &[Operation::SwapFirstWith(0)]), s);
        }
    }

    #[test]
    fn test_swap_wraps_index() {
        // 7 % 4 == 3
        assert_eq!(apply("abcd", &[Operation::SwapFirstWith(7)]), "dbca");
        // 4 % 4 == 0
        assert_eq!(apply("abcd", &[Operation::SwapFirstWith(4)]), "abcd");
    }

    #[test]
    fn test_swap_after_emptying_is_noop() {
        let ops = [Operation::Drop(10), Operation::SwapFirstWith(5)];
        assert_eq!(apply("abc", &ops), "");
    }

    #[test]
    fn test_multibyte_characters() {
        assert_eq!(apply("äbç", &[Operation::Reverse]), "çbä");
        assert_eq!(apply("äbç", &[Operation::Drop(1)]), "bç");
    }

    #[test]
    fn test_no_failure_path_exists() {
        // Sweep every operation kind over many lengths and arguments; any
        // bounds violation would panic here.
        let input = "0123456789";
        for len in 0..=input.len() {
            let s = &input[..len];
            for arg in [0, 1, 2, 5, 9, 10, 11, 100, usize::MAX] {
                for op in [
                    Operation::Reverse,
                    Operation::Drop(arg),
                    Operation::SwapFirstWith(arg),
                ] {
                    let out = apply(s, &[op, op, Operation::Reverse, op]);
                    assert!(out.chars().count() <= len);
                }
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Operation::Reverse.to_string(), "reverse");
        assert_eq!(Operation::Drop(3).to_string(), "drop(3)");
        assert_eq!(Operation::SwapFirstWith(12).to_string(), "swap(12)");
    }

    #[test]
    fn test_serialize_shape() {
        let json = serde_json::to_string(&[Operation::Reverse, Operation::Drop(2)]).unwrap();
        assert_eq!(json, r#"[{"op":"reverse"},{"op":"drop","arg":2}]"#);
    }
}
