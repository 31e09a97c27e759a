use std::fs;

use assert_matches::assert_matches;
use tempfile::TempDir;

use sadd_disagg::config::ConfigLoader;
use sadd_disagg::error::SaddError;
use sadd_disagg::interval::AgeBound;

#[test]
fn resolve_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sadd-gen.json");
    fs::write(
        &path,
        r#"{
            "age_labels": ["0-4", "65+"],
            "datasets": {
                "population": "pop.csv",
                "female_ratios": "f.csv",
                "male_ratios": "m.csv",
                "reference": "geo.csv"
            },
            "overrides": [{ "name": "Somewhere, SAR", "iso3": "SMW" }],
            "output": "result.csv"
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(resolved.age_labels.len(), 2);
    assert_eq!(resolved.age_labels[1].as_str(), "65+");
    assert_eq!(resolved.age_labels[1].interval().upper, AgeBound::Unbounded);
    assert_eq!(resolved.datasets.population, "pop.csv");
    assert_eq!(resolved.overrides.len(), 1);
    assert_eq!(resolved.overrides[0].iso3, "SMW");
    assert_eq!(resolved.output.as_str(), "result.csv");
}

#[test]
fn malformed_label_fails_at_config_time() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sadd-gen.json");
    fs::write(&path, r#"{ "age_labels": ["0-4", "elderly"] }"#).unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, SaddError::InvalidAgeLabel(ref label) if label == "elderly");
}

#[test]
fn invalid_json_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sadd-gen.json");
    fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, SaddError::ConfigParse(_));
}

#[test]
fn missing_explicit_path_is_a_read_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/sadd-gen.json")).unwrap_err();
    assert_matches!(err, SaddError::ConfigRead(_));
}
