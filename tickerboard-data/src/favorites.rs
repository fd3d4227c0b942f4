use crate::symbol::{self, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Symbols the user pinned.
///
/// Membership only affects display prioritisation and merge retention, it never
/// deletes data. Persisted as a plain JSON array of strings.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FavoriteSet(BTreeSet<Symbol>);

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains(symbol)
    }

    /// Pin `symbol` if absent, unpin it otherwise. Returns whether it is now pinned.
    pub fn toggle(&mut self, symbol: &str) -> bool {
        let symbol = symbol::normalise(symbol);
        if self.0.remove(&symbol) {
            false
        } else {
            self.0.insert(symbol);
            true
        }
    }

    pub fn insert(&mut self, symbol: &str) -> bool {
        self.0.insert(symbol::normalise(symbol))
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        self.0.remove(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for FavoriteSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|symbol| symbol::normalise(symbol.as_ref()))
                .collect(),
        )
    }
}
