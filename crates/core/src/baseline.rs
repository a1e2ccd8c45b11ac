//! # Baseline Loader
//!
//! Turns the shipped parameter dataset (a JSON array of records, ascending
//! by name) into the initial [`Catalog`]. The dataset is injected as bytes or
//! read from a path; nothing is baked in at compile time.
//!
//! A dataset that does not parse is a packaging defect: no partial catalog is
//! ever produced and callers are expected to refuse to start.

use crate::catalog::Catalog;
use crate::error::LoadError;
use crate::model::ParameterInfo;
use std::path::Path;
use tokio::fs;

/// Parse a baseline dataset held in memory
pub fn load_baseline(data: &[u8]) -> Result<Catalog, LoadError> {
    let records: Vec<ParameterInfo> = serde_json::from_slice(data)?;
    Catalog::from_records(records)
}

/// Read and parse a baseline dataset from disk
pub async fn load_baseline_file(path: impl AsRef<Path>) -> Result<Catalog, LoadError> {
    let path = path.as_ref();
    let data = fs::read(path).await.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let catalog = load_baseline(&data)?;
    tracing::info!(
        path = %path.display(),
        params = catalog.len(),
        "Loaded baseline parameter catalog"
    );
    Ok(catalog)
}

/// Serialize a catalog in the baseline dataset format
pub fn to_baseline_json(catalog: &Catalog) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(catalog.as_slice())?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KNOWN_LEVELS, KNOWN_SERVICES, KNOWN_TYPES};
    use std::collections::HashSet;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    const SHIPPED: &[u8] = include_bytes!("../data/config-index.json");

    #[test]
    fn test_shipped_dataset_loads() {
        let catalog = assert_ok!(load_baseline(SHIPPED));
        let raw: Vec<serde_json::Value> = serde_json::from_slice(SHIPPED).unwrap();
        assert_eq!(catalog.len(), raw.len());
    }

    #[test]
    fn test_shipped_dataset_sorted_by_name() {
        let raw: Vec<ParameterInfo> = serde_json::from_slice(SHIPPED).unwrap();
        for pair in raw.windows(2) {
            assert!(
                pair[0].name < pair[1].name,
                "config-index.json is not sorted at '{}' / '{}'",
                pair[0].name,
                pair[1].name
            );
        }
    }

    fn lowered<'a>(values: impl IntoIterator<Item = &'a String>) -> HashSet<String> {
        values
            .into_iter()
            .filter(|v| !v.is_empty())
            .map(|v| v.to_lowercase())
            .collect()
    }

    fn assert_same_vocabulary(axis: &str, shipped: &HashSet<String>, known: &[&str]) {
        let known: HashSet<String> = known.iter().map(|v| v.to_string()).collect();
        for value in shipped {
            assert!(known.contains(value), "{} '{}' in dataset but not known", axis, value);
        }
        for value in &known {
            assert!(shipped.contains(value), "known {} '{}' missing from dataset", axis, value);
        }
    }

    #[test]
    fn test_shipped_vocabulary_matches_known() {
        let catalog = load_baseline(SHIPPED).unwrap();

        let types = lowered(catalog.iter().map(|p| &p.param_type));
        let levels = lowered(catalog.iter().map(|p| &p.level));
        let services = lowered(catalog.iter().flat_map(|p| &p.services));

        assert_same_vocabulary("type", &types, KNOWN_TYPES);
        assert_same_vocabulary("level", &levels, KNOWN_LEVELS);
        assert_same_vocabulary("service", &services, KNOWN_SERVICES);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let data = br#"[{"name": "osd_max_backfills"}, {"name": "fsid"}, {"name": "mon_host"}]"#;
        let catalog = load_baseline(data).unwrap();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["fsid", "mon_host", "osd_max_backfills"]);
    }

    #[test]
    fn test_malformed_dataset_is_fatal() {
        assert!(matches!(
            load_baseline(b"{\"name\": \"fsid\"}"),
            Err(LoadError::Parse(_))
        ));
        assert!(matches!(load_baseline(b"[{"), Err(LoadError::Parse(_))));
        assert!(matches!(
            load_baseline(br#"[{"name": "a"}, {"name": "a"}]"#),
            Err(LoadError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_round_trip_through_baseline_format() {
        let catalog = load_baseline(SHIPPED).unwrap();
        let json = to_baseline_json(&catalog).unwrap();
        assert_eq!(load_baseline(json.as_bytes()).unwrap(), catalog);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SHIPPED).unwrap();

        let catalog = assert_ok!(load_baseline_file(file.path()).await);
        assert!(catalog.contains("fsid"));

        let missing = load_baseline_file(file.path().with_extension("missing")).await;
        assert!(matches!(assert_err!(missing), LoadError::Read { .. }));
    }
}
