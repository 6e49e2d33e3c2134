use std::collections::HashMap;

/// One row's worth of extracted values. `None` means the field's
/// sub-selector matched nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMatch {
    values: HashMap<String, Option<String>>,
}

impl RawMatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        self.values.insert(field.into(), value);
    }

    /// The value for `field`, or `None` when it was absent or null.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|value| value.as_deref())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for RawMatch {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Free-text period or date range shown on the page; empty when unknown.
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub rows: Vec<RawMatch>,
    pub metadata: PageMetadata,
    /// Rows dropped because reading them failed.
    pub skipped_rows: usize,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
