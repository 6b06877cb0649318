use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use ntarc_index::aggregate::{self, BaseFeatures, CountMode, FieldPath};
use ntarc_index::{Corpus, DocumentKey, Error, Scalar};
use serde_json::{json, Value};

fn write(root: &Path, year: &str, name: &str, value: Value) {
    let dir = root.join(year);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn paper(version: &str, algorithms: &[&str], features: Value) -> Value {
    let algorithms: Vec<_> = algorithms.iter().map(|a| json!({"algorithm": a})).collect();
    json!({
        "version": version,
        "reference": {"title": "T", "year": 2019},
        "analysis_method": {"algorithms": algorithms},
        "preprocessing": {"packets": [{"features": features}]}
    })
}

#[test]
fn documents_are_ordered_by_year_then_filename() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "2020", "c.json", paper("2.0", &[], json!([])));
    write(root, "2019", "b.json", paper("2.0", &[], json!([])));
    write(root, "2019", "a.json", paper("2.0", &[], json!([])));
    fs::write(root.join("2019").join("notes.txt"), "ignored").unwrap();
    fs::write(root.join("README.json"), "{}").unwrap();

    let keys: Vec<String> = Corpus::open(root)
        .documents()
        .unwrap()
        .map(|doc| doc.unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["2019/a.json", "2019/b.json", "2020/c.json"]);
}

#[test]
fn limit_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for name in ["a.json", "b.json", "c.json"] {
        write(root, "2018", name, paper("2.0", &[], json!([])));
    }
    assert_eq!(Corpus::open(root).documents().unwrap().count(), 3);
    assert_eq!(Corpus::open(root).limit(2).documents().unwrap().count(), 2);
    assert_eq!(Corpus::open(root).limit(2).paths().unwrap().len(), 2);
}

#[test]
fn counts_and_groups_across_versions() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "2017", "one.json", paper("v2", &["svm", "svm", "rf"], json!(["ttl", "ttl"])));
    write(
        root,
        "2018",
        "two.json",
        paper("2.1.4", &["svm"], json!([{"mean": ["ipTotalLength"]}, "ttl"])),
    );
    write(
        root,
        "2019",
        "three.json",
        paper("3.0", &["knn"], json!([{"function": "max", "args": ["ttl"]}])),
    );

    let algorithms = FieldPath::new("analysis_method.algorithms.algorithm");
    let corpus = Corpus::open(root);

    let counts = aggregate::count(corpus.documents().unwrap(), &algorithms, CountMode::Occurrences).unwrap();
    assert_eq!(counts[&Scalar::from("svm")], 3);
    assert_eq!(counts[&Scalar::from("knn")], 1);

    let counts = aggregate::count(corpus.documents().unwrap(), &algorithms, CountMode::PerPaper).unwrap();
    assert_eq!(counts[&Scalar::from("svm")], 2);

    let features = aggregate::count(corpus.documents().unwrap(), &BaseFeatures, CountMode::Occurrences).unwrap();
    assert_eq!(features["ttl"], 4);
    assert_eq!(features["ipTotalLength"], 1);

    let groups = aggregate::group(corpus.documents().unwrap(), &BaseFeatures).unwrap();
    assert_eq!(
        groups["ttl"],
        BTreeSet::from([
            DocumentKey::new("2017", "one.json"),
            DocumentKey::new("2018", "two.json"),
            DocumentKey::new("2019", "three.json"),
        ])
    );
    let rows = aggregate::by_set_size_desc(groups);
    assert_eq!(rows[0].0, "ttl");
}

#[test]
fn unknown_version_aborts_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "2017", "a.json", paper("2.0", &["svm"], json!([])));
    write(root, "2017", "b.json", paper("1.9", &["svm"], json!([])));

    let result = aggregate::count(
        Corpus::open(root).documents().unwrap(),
        &FieldPath::new("analysis_method.algorithms.algorithm"),
        CountMode::Occurrences,
    );
    assert!(matches!(result, Err(Error::UnknownSchemaVersion { .. })));
}

#[test]
fn malformed_json_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("2020")).unwrap();
    fs::write(root.join("2020").join("bad.json"), "{not json").unwrap();

    let err = Corpus::open(root).documents().unwrap().next().unwrap().unwrap_err();
    match err {
        Error::Json { path, .. } => assert!(path.ends_with("2020/bad.json")),
        other => panic!("unexpected error: {other}"),
    }
}
