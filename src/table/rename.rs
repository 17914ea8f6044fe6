//! Explicit column rename mapping, validated once before it touches a table.

use crate::error::{FeatureError, Result};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
    pairs: BTreeMap<String, String>,
}

impl RenameMap {
    /// Build from `(from, to)` pairs. Sources and targets must each be unique.
    pub fn new<I, A, B>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut map = BTreeMap::new();
        let mut targets = HashSet::new();
        for (from, to) in pairs {
            let (from, to) = (from.into(), to.into());
            if !targets.insert(to.clone()) {
                return Err(FeatureError::Schema(format!(
                    "rename target '{to}' is used more than once"
                )));
            }
            if map.insert(from.clone(), to).is_some() {
                return Err(FeatureError::Schema(format!(
                    "column '{from}' is renamed more than once"
                )));
            }
        }
        Ok(Self { pairs: map })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn target(&self, from: &str) -> Option<&str> {
        self.pairs.get(from).map(String::as_str)
    }

    /// Whether `name` is a source that this mapping moves away.
    pub fn renames(&self, name: &str) -> bool {
        self.pairs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }
}
