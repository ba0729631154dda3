//! In-memory derivations over already-fetched lists: free-text search,
//! dropdown equality filters and stable sorting.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// True when `term` is blank or occurs, ignoring case, in any present field.
pub fn matches_text<'a, I>(fields: I, term: &str) -> bool
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
}

/// `None` means the dropdown is on "all".
pub fn matches_choice<V: PartialEq + ?Sized>(value: &V, selected: Option<&V>) -> bool {
    selected.is_none_or(|selected| value == selected)
}

/// Stable: items with equal keys keep their relative order in both directions.
pub fn sort_by_key<T, K, F>(items: &mut [T], key: F, direction: SortDirection)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| {
        let ordering = key(a).cmp(&key(b));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Owned filtered copy of `items`.
pub fn filter_view<T: Clone, P>(items: &[T], predicate: P) -> Vec<T>
where
    P: Fn(&T) -> bool,
{
    items.iter().filter(|item| predicate(item)).cloned().collect()
}
