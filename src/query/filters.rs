use std::collections::BTreeMap;

use crate::error::{PayloadError, Result};

/// Value of a single filter criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
    Flag(bool),
}

impl FilterValue {
    fn into_values(self) -> Vec<String> {
        match self {
            FilterValue::One(value) => vec![value],
            FilterValue::Many(values) => values,
            FilterValue::Flag(flag) => vec![flag.to_string()],
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::One(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::One(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Flag(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::Many(value)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(value: Vec<&str>) -> Self {
        FilterValue::Many(value.into_iter().map(String::from).collect())
    }
}

/// Filter criteria for list, prune and events calls.
///
/// The service accepts them as a map, as `name=value` items, or as a single
/// `name=value` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filters {
    Map(BTreeMap<String, FilterValue>),
    List(Vec<String>),
    Single(String),
}

impl Filters {
    pub fn new() -> Filters {
        Filters::Map(BTreeMap::new())
    }

    /// Adds a criterion; a list or single-string set is converted to a map
    /// first.
    pub fn with(self, name: impl Into<String>, value: impl Into<FilterValue>) -> Result<Filters> {
        let mut map = match self {
            Filters::Map(map) => map,
            other => other
                .criteria()?
                .into_iter()
                .map(|(key, values)| (key, FilterValue::Many(values)))
                .collect(),
        };
        let name = name.into();
        let value = value.into();
        match (map.remove(&name), value) {
            (Some(existing), value) => {
                let mut values = existing.into_values();
                values.extend(value.into_values());
                map.insert(name, FilterValue::Many(values));
            }
            (None, value) => {
                map.insert(name, value);
            }
        }
        Ok(Filters::Map(map))
    }

    fn criteria(self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut criteria = BTreeMap::<String, Vec<String>>::new();
        match self {
            Filters::Map(map) => {
                for (key, value) in map {
                    let values = value.into_values();
                    if values.is_empty() {
                        continue;
                    }
                    criteria.entry(key).or_default().extend(values);
                }
            }
            Filters::List(items) => {
                for item in items {
                    let (key, value) = split_item(&item)?;
                    criteria.entry(key.to_string()).or_default().push(value.to_string());
                }
            }
            Filters::Single(item) => {
                let (key, value) = split_item(&item)?;
                criteria.insert(key.to_string(), vec![value.to_string()]);
            }
        }
        Ok(criteria)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Filters::Map(map) => map.values().all(|value| matches!(value, FilterValue::Many(values) if values.is_empty())),
            Filters::List(items) => items.is_empty(),
            Filters::Single(item) => item.is_empty(),
        }
    }
}

impl Default for Filters {
    fn default() -> Self {
        Filters::new()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for Filters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Filters::Map(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}

fn split_item(item: &str) -> Result<(&str, &str)> {
    item.split_once('=').ok_or_else(|| PayloadError::InvalidFilter(item.to_string()))
}

/// JSON value of the `filters` query parameter: an object from filter name to
/// an array of strings, keys sorted. Empty criteria give an empty string so
/// the parameter can be left out.
pub fn format_filters(filters: &Filters) -> Result<String> {
    if filters.is_empty() {
        return Ok(String::new());
    }
    let criteria = filters.clone().criteria()?;
    if criteria.is_empty() {
        return Ok(String::new());
    }
    serde_json::to_string(&criteria).map_err(PayloadError::Serialization)
}
