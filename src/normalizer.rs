//! Coerces raw matches into fixed-schema records.

use serde::Serialize;

use crate::extractor::RawMatch;

/// One output row. Values line up with the schema it was normalized against;
/// every column is present, missing ones as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One record per raw match, in input order. Fields outside `columns` are
/// dropped; columns with no value become `""`. No sorting, no deduplication.
pub fn normalize(rows: &[RawMatch], columns: &[String]) -> Vec<Record> {
    rows.iter()
        .map(|raw| {
            Record::new(
                columns
                    .iter()
                    .map(|column| raw.get(column).unwrap_or_default().to_string())
                    .collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_missing_and_null_fields_become_empty() {
        let rows = vec![
            RawMatch::from_iter([("event", Some("CPI")), ("actual", None)]),
            RawMatch::from_iter([("actual", Some("0.4%"))]),
        ];
        let records = normalize(&rows, &columns(&["event", "actual", "forecast"]));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values(), ["CPI", "", ""]);
        assert_eq!(records[1].values(), ["", "0.4%", ""]);
    }

    #[test]
    fn test_extra_fields_are_dropped() {
        let rows = vec![RawMatch::from_iter([
            ("symbol", Some("JPM")),
            ("tracking_id", Some("x1")),
        ])];
        let records = normalize(&rows, &columns(&["symbol"]));
        assert_eq!(records[0].values(), ["JPM"]);
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let rows = vec![
            RawMatch::from_iter([("symbol", Some("BAC"))]),
            RawMatch::from_iter([("symbol", Some("JPM"))]),
            RawMatch::from_iter([("symbol", Some("BAC"))]),
        ];
        let records = normalize(&rows, &columns(&["symbol"]));
        let symbols: Vec<_> = records.iter().filter_map(|r| r.get(0)).collect();
        assert_eq!(symbols, vec!["BAC", "JPM", "BAC"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(&[], &columns(&["a"])).is_empty());
    }

    #[cfg(feature = "fuzz")]
    mod fuzz {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_every_record_has_every_column(
                schema in proptest::collection::vec("[a-z]{1,6}", 1..8),
                rows in proptest::collection::vec(
                    proptest::collection::vec(("[a-z]{1,6}", proptest::option::of(".*")), 0..10),
                    0..20,
                ),
            ) {
                let raw: Vec<RawMatch> = rows.into_iter().map(RawMatch::from_iter).collect();
                let records = normalize(&raw, &schema);
                prop_assert_eq!(records.len(), raw.len());
                for record in &records {
                    prop_assert_eq!(record.len(), schema.len());
                }
            }
        }
    }
}
