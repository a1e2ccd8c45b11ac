//! # Catalog
//!
//! An ordered, name-unique collection of [`ParameterInfo`] records.
//! Records are always held ascending by name; the reconciler's merge and
//! [`Catalog::get`] both rely on that order.

use crate::error::LoadError;
use crate::model::ParameterInfo;

/// Parameters sorted ascending by name, no two sharing a name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    params: Vec<ParameterInfo>,
}

impl Catalog {
    /// Build a catalog from records in any order.
    ///
    /// Sorts by name and rejects duplicate names.
    pub fn from_records(mut params: Vec<ParameterInfo>) -> Result<Self, LoadError> {
        params.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(dup) = params.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(LoadError::DuplicateName(dup[0].name.clone()));
        }
        Ok(Self { params })
    }

    /// Wrap records the caller has already ordered (merge output)
    pub(crate) fn from_sorted(params: Vec<ParameterInfo>) -> Self {
        debug_assert!(
            params.windows(2).all(|w| w[0].name < w[1].name),
            "catalog records must be strictly ascending by name"
        );
        Self { params }
    }

    /// Look up a parameter by exact name
    pub fn get(&self, name: &str) -> Option<&ParameterInfo> {
        self.params
            .binary_search_by(|p| p.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.params[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParameterInfo> {
        self.params.iter()
    }

    pub fn as_slice(&self) -> &[ParameterInfo] {
        &self.params
    }

    /// Parameter names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn into_records(self) -> Vec<ParameterInfo> {
        self.params
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ParameterInfo;
    type IntoIter = std::slice::Iter<'a, ParameterInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
