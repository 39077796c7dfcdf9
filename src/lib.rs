//! # phone-forward
//!
//! Phone number forwarding by prefix rewrite rules.
//!
//! A rule `from -> to` says that every number starting with `from` is
//! reported with that prefix replaced by `to`. Lookups resolve by longest
//! matching prefix; reverse lookups list the numbers that could have been
//! forwarded to a given one.
//!
//! Rules are kept in two tries that mirror each other: the forward trie maps
//! a source prefix to its target, the reverse trie maps a target to every
//! source currently forwarded there. Every mutation keeps both sides in step,
//! and a failed mutation leaves neither side touched.
//!
//! ## Example
//!
//! ```rust
//! use phone_forward::ForwardingTable;
//!
//! let mut table = ForwardingTable::new();
//! table.add("601", "602").unwrap();
//! table.add("60", "70").unwrap();
//!
//! let got = table.get("601123").unwrap();
//! assert_eq!(got.get(0), Some("602123"));
//!
//! let rev = table.reverse("70555").unwrap();
//! assert_eq!(rev.iter().collect::<Vec<_>>(), ["60555", "70555"]);
//!
//! table.remove("60");
//! assert_eq!(table.get("601123").unwrap().get(0), Some("601123"));
//! ```

#![warn(clippy::all)]

mod alloc;
pub mod error;
pub mod forward;
pub mod numbers;
pub mod symbol;
mod trie;

pub use error::{Error, Result};
pub use forward::ForwardingTable;
pub use numbers::{AppendError, NumberList, Removal};

/// Configuration for a [`ForwardingTable`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Node capacity reserved up front in each of the two tries.
    pub initial_nodes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { initial_nodes: 64 }
    }
}

#[cfg(test)]
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod proptests;
