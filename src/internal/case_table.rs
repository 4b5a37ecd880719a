use std::any::{Any, type_name};
use std::collections::HashSet;

use crate::error::TableError;
use crate::utils::naming::is_valid_identifier;

/// One untyped argument of a flat `name, state, name, state, ...` declaration.
pub struct Entry {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Entry {
    pub fn new<V: Any + Send>(value: V) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<V>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn into_name(self) -> Result<String, &'static str> {
        let found = self.type_name;
        match self.value.downcast::<String>() {
            Ok(name) => Ok(*name),
            Err(value) => value.downcast::<&'static str>().map(|name| name.to_string()).map_err(|_| found),
        }
    }

    fn into_state<T: Any>(self) -> Result<T, &'static str> {
        let found = self.type_name;
        self.value.downcast::<T>().map(|state| *state).map_err(|_| found)
    }
}

/// Flat declaration of alternating case names and states.
///
/// ```
/// use tui_state_snapshots::{CaseTable, states};
///
/// let table: CaseTable<Option<u8>> = CaseTable::build(states![
///     "Empty", None::<u8>,
///     "Full", Some(9u8),
/// ])
/// .unwrap();
/// assert_eq!(table.names(), vec!["Empty", "Full"]);
/// ```
#[macro_export]
macro_rules! states {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::Entry::new($value)),*]
    };
}

/// Ordered, name-unique list of `(case name, state)` pairs for one component type.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseTable<T> {
    cases: Vec<(String, T)>,
}

impl<T> Default for CaseTable<T> {
    fn default() -> Self {
        Self { cases: Vec::new() }
    }
}

impl<T: Any> CaseTable<T> {
    /// Re-associate a flat entry list into typed pairs.
    /// Argument positions in errors are 1-based.
    pub fn build(entries: Vec<Entry>) -> Result<Self, TableError> {
        let mut pairs = Vec::with_capacity(entries.len() / 2);
        let mut iter = entries.into_iter();
        let mut position = 0;

        while let Some(name_entry) = iter.next() {
            position += 1;
            let name_position = position;
            let name = name_entry.into_name().map_err(|found| TableError::UnexpectedType {
                position,
                found,
                expected: "String",
            })?;

            let Some(state_entry) = iter.next() else {
                return Err(TableError::MissingState {
                    position: name_position,
                });
            };
            position += 1;
            let state = state_entry.into_state::<T>().map_err(|found| TableError::UnexpectedType {
                position,
                found,
                expected: type_name::<T>(),
            })?;

            pairs.push((name, state));
        }

        Self::from_pairs(pairs)
    }
}

impl<T> CaseTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CaseTableBuilder<T> {
        CaseTableBuilder { cases: Vec::new() }
    }

    pub fn from_pairs<N: Into<String>>(pairs: Vec<(N, T)>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        let mut cases = Vec::with_capacity(pairs.len());

        for (index, (name, state)) in pairs.into_iter().enumerate() {
            let name = name.into();
            let position = index * 2 + 1;
            if !is_valid_identifier(&name) {
                return Err(TableError::InvalidName { position, name });
            }
            if !seen.insert(name.clone()) {
                return Err(TableError::DuplicateName { position, name });
            }
            cases.push((name, state));
        }

        Ok(Self { cases })
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.cases.iter().map(|(name, state)| (name.as_str(), state))
    }

    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl<T> IntoIterator for CaseTable<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.into_iter()
    }
}

/// Typed `.case(name, state)` chain, validated on `build()`.
pub struct CaseTableBuilder<T> {
    cases: Vec<(String, T)>,
}

impl<T> CaseTableBuilder<T> {
    pub fn case(mut self, name: impl Into<String>, state: T) -> Self {
        self.cases.push((name.into(), state));
        self
    }

    pub fn build(self) -> Result<CaseTable<T>, TableError> {
        CaseTable::from_pairs(self.cases)
    }
}
