//! Phone number alphabet.
//!
//! A number is a non-empty string over twelve symbols: the digits `0`-`9`,
//! `*` and `#`. Every symbol has a dense index in `0..SYMBOL_COUNT`, which is
//! also the child slot it selects in a trie node. Ordering between numbers
//! follows that index, so `*` and `#` sort after `9`.

use std::cmp::Ordering;

/// Number of distinct symbols (and child slots per trie node).
pub const SYMBOL_COUNT: usize = 12;

const STAR: usize = 10;
const HASH: usize = 11;

#[inline]
pub fn is_valid_symbol(c: u8) -> bool {
    c.is_ascii_digit() || c == b'*' || c == b'#'
}

/// Dense index of a symbol: `0`-`9` map to 0-9, `*` to 10 and `#` to 11.
#[inline]
pub fn encode(c: u8) -> Option<usize> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as usize),
        b'*' => Some(STAR),
        b'#' => Some(HASH),
        _ => None,
    }
}

#[inline]
pub fn decode(index: usize) -> Option<u8> {
    match index {
        0..=9 => Some(b'0' + index as u8),
        STAR => Some(b'*'),
        HASH => Some(b'#'),
        _ => None,
    }
}

/// Symbol indices of the leading run of valid symbols in `number`.
#[inline]
pub(crate) fn symbols(number: &str) -> impl Iterator<Item = usize> + '_ {
    number.bytes().map_while(encode)
}

/// Length of the leading run of valid symbols.
#[inline]
pub fn valid_len(number: &str) -> usize {
    number.bytes().take_while(|&c| is_valid_symbol(c)).count()
}

/// True iff `s` is non-empty and made only of valid symbols.
pub fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_valid_symbol)
}

pub fn are_equal(a: &str, b: &str) -> bool {
    let a = &a.as_bytes()[..valid_len(a)];
    let b = &b.as_bytes()[..valid_len(b)];
    a == b
}

/// True iff the symbols of `prefix` are a prefix of the symbols of `full`.
pub fn is_prefix_of(prefix: &str, full: &str) -> bool {
    let prefix = &prefix.as_bytes()[..valid_len(prefix)];
    let full = &full.as_bytes()[..valid_len(full)];
    full.starts_with(prefix)
}

/// Both are numbers and they differ: a number cannot be forwarded to itself.
pub fn are_suitable_for_rewrite(a: &str, b: &str) -> bool {
    is_number(a) && is_number(b) && a != b
}

/// Symbol-wise lexicographic order; a proper prefix sorts first.
pub fn compare(a: &str, b: &str) -> Ordering {
    symbols(a).cmp(symbols(b))
}
