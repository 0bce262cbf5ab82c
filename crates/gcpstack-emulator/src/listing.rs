//! Prefix and delimiter listing.
//!
//! Every name that starts with `prefix` is either emitted as an item or, when
//! the remainder after the prefix contains `delimiter`, folded into a common
//! prefix ending at (and including) the first delimiter occurrence. Items and
//! prefixes both come out ascending and deduplicated.

use std::collections::BTreeSet;

/// Result of a listing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    /// Emitted entries, in input order.
    pub items: Vec<T>,
    /// Common prefixes, ascending.
    pub prefixes: Vec<String>,
}

/// Partition `entries` into items and common prefixes.
///
/// `entries` must be sorted ascending by name (a `BTreeMap` iteration is).
/// Empty `prefix`/`delimiter` values behave as if absent.
///
/// # Examples
///
/// ```
/// use gcpstack_emulator::listing::list_with_delimiter;
///
/// let names = ["f/1.txt", "f/2.txt", "root.txt"];
/// let listing = list_with_delimiter(names.iter().map(|n| (*n, *n)), None, Some("/"));
/// assert_eq!(listing.items, vec!["root.txt"]);
/// assert_eq!(listing.prefixes, vec!["f/".to_owned()]);
/// ```
pub fn list_with_delimiter<'a, T, I>(
    entries: I,
    prefix: Option<&str>,
    delimiter: Option<&str>,
) -> Listing<T>
where
    I: IntoIterator<Item = (&'a str, T)>,
{
    let prefix = prefix.unwrap_or("");
    let delimiter = delimiter.filter(|d| !d.is_empty());

    let mut items = Vec::new();
    let mut prefixes = BTreeSet::new();

    for (name, entry) in entries {
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };

        if let Some(delim) = delimiter {
            if let Some(pos) = rest.find(delim) {
                let end = prefix.len() + pos + delim.len();
                prefixes.insert(name[..end].to_owned());
                continue;
            }
        }

        items.push(entry);
    }

    Listing {
        items,
        prefixes: prefixes.into_iter().collect(),
    }
}
