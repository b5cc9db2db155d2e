use std::{
    collections::{btree_map::IntoIter as BTreeMapIter, BTreeMap},
    ops::{Deref, DerefMut},
};

use serde::{Deserialize, Serialize};

/// Caller owned key-value store that url labels are consumed from.
///
/// Values are kept in their string form, so anything implementing [`ToString`] can be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping {
    entries: BTreeMap<String, String>,
}

impl Deref for Mapping {
    type Target = BTreeMap<String, String>;
    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}
impl DerefMut for Mapping {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entries
    }
}
impl IntoIterator for Mapping {
    type Item = (String, String);
    type IntoIter = BTreeMapIter<String, String>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
impl<K: ToString, V: ToString> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect() }
    }
}
impl<K: ToString, V: ToString, const N: usize> From<[(K, V); N]> for Mapping {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl Mapping {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set<K: ToString, V: ToString>(&mut self, key: K, value: V) -> Option<String> {
        self.entries.insert(key.to_string(), value.to_string())
    }

    /// Remove the key and return its value.
    pub fn pop(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.entries.values().any(|v| v == value)
    }

    /// `application/x-www-form-urlencoded` form of the entries.
    pub fn to_query(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(&self.entries)
    }
}

/// Pop the key from the first mapping that owns it. Mappings after that one are left untouched even if they
/// also own the key.
pub fn pop_first<'a, I>(mappings: I, key: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a mut Mapping>,
{
    mappings.into_iter().find(|mapping| mapping.contains_key(key)).and_then(|mapping| mapping.pop(key))
}
