/// Integration tests for datacards-core
///
/// These tests verify:
/// 1. The full extract pipeline against a temporary directory
/// 2. The single-run guarantee (archive once, never reprocess)
/// 3. Batch processing past broken documents
/// 4. Localization and weapon key renaming over pipeline output
/// 5. Round-trip and key-shape properties over generated documents

use std::fs;
use std::path::{Path, PathBuf};

use datacards_core::{
    collect_inputs, localize, normalize, process_batch, process_document, rekey_base,
    rewrite_document, ArtifactLayout, Config, DocumentKind, DocumentOutcome, NameIndex,
    PipelineError, TranslationTable,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_bytes(name: &str) -> Vec<u8> {
    fs::read(fixture_path(name)).unwrap()
}

/// Temp workspace with `in/`, `out/` and `archive/` and a config pointing at them.
fn workspace() -> (TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("in")).unwrap();
    let config = Config {
        output_dir: dir.path().join("out"),
        archive_dir: dir.path().join("archive"),
        ..Config::default()
    };
    (dir, config)
}

fn place_input(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join("in").join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn strip_links(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.shift_remove("link");
            for (_, v) in map.iter_mut() {
                strip_links(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_links),
        _ => {}
    }
}

fn contains_field(value: &Value, field: &str) -> bool {
    match value {
        Value::Object(map) => map.contains_key(field) || map.values().any(|v| contains_field(v, field)),
        Value::Array(items) => items.iter().any(|v| contains_field(v, field)),
        _ => false,
    }
}

fn processed(outcome: DocumentOutcome) -> datacards_core::DocumentSummary {
    match outcome {
        DocumentOutcome::Processed(summary) => summary,
        other => panic!("expected a processed document, got {:?}", other),
    }
}

// ============================================================================
// Extract pipeline
// ============================================================================

#[test]
fn test_extract_writes_all_artifacts() {
    let (dir, config) = workspace();
    let original = fixture_bytes("space_marines.json");
    let input = place_input(dir.path(), "space_marines.json", &original);

    let summary = processed(process_document(&input, &config).unwrap());
    assert_eq!(summary.base_name, "SM");
    assert_eq!(summary.kind, DocumentKind::Faction);
    assert_eq!(summary.layout, ArtifactLayout::for_base(&config, "SM"));

    assert!(dir.path().join("out/SM.translated.json").is_file());
    let source = fs::read_to_string(dir.path().join("out/en/SM.flat.json")).unwrap();
    let target = fs::read_to_string(dir.path().join("out/fr/SM.flat.json")).unwrap();
    assert_eq!(source, target);

    // original archived byte for byte, input consumed
    assert_eq!(fs::read(dir.path().join("archive/space_marines.json")).unwrap(), original);
    assert!(!input.exists());

    let table = read_json(&dir.path().join("out/en/SM.flat.json"));
    assert_eq!(table.as_object().unwrap().len(), summary.translations);
}

#[test]
fn test_extract_keys_and_structure() {
    let (dir, config) = workspace();
    let input = place_input(dir.path(), "space_marines.json", &fixture_bytes("space_marines.json"));
    process_document(&input, &config).unwrap();

    let doc = read_json(&dir.path().join("out/SM.translated.json"));
    let table = read_json(&dir.path().join("out/en/SM.flat.json"));

    // root namespacing and name-addressed datasheets
    assert_eq!(doc["name"], "root.name");
    assert_eq!(table["root.name"], "Space Marines");
    assert_eq!(doc["datasheets"][0]["name"], "datasheets.Captain.name");
    assert_eq!(table["datasheets.Captain.name"], "Captain");

    // identical text shares one key
    assert_eq!(doc["datasheets"][0]["stats"][0]["name"], "datasheets.Captain.name");
    assert_eq!(
        doc["datasheets"][1]["abilities"]["other"][0]["name"],
        "datasheets.Captain.abilities.other.0.name"
    );

    // profile zone: only the name is extracted
    let profile = &doc["datasheets"][0]["rangedWeapons"][0]["profiles"][0];
    assert_eq!(profile["name"], "datasheets.Captain.rangedWeapons.0.profiles.0.name");
    assert_eq!(profile["range"], "12\"");
    assert_eq!(profile["strength"], "4");
    assert_eq!(profile["keywords"], json!(["Pistol"]));

    // priority literals and keywords are their own keys
    assert_eq!(table["Infantry"], "Infantry");
    assert_eq!(table["Deep Strike"], "Deep Strike");
    assert_eq!(doc["datasheets"][0]["keywords"], json!(["Infantry", "Character", "Imperium", "Captain"]));

    // regrouped under detachments, back-references gone
    let gladius = &doc["detachments"][0];
    assert_eq!(gladius["name"], "detachments.Gladius_Task_Force.name");
    assert_eq!(
        gladius["enhancements"][0]["name"],
        "detachments.Gladius_Task_Force.enhancements.Artificer_Armour.name"
    );
    assert_eq!(gladius["enhancements"][0]["cost"], "10");
    assert_eq!(gladius["stratagems"][0]["when"], "stratagems.Armour_of_Contempt.when");
    assert_eq!(gladius["rules"][0]["name"], "detachments.Gladius_Task_Force.rules.0.name");
    assert_eq!(doc["detachments"][1]["stratagems"][0]["name"], "stratagems.Storm_of_Fire.name");
    assert!(doc.get("enhancements").is_none());
    assert!(doc.get("stratagems").is_none());
    assert!(doc["rules"].get("detachment").is_none());
    assert!(!contains_field(&doc["detachments"], "detachment"));

    // invulnerable save hoisted into every stat line
    assert_eq!(doc["datasheets"][0]["stats"][0]["invul"], "4+");
    assert_eq!(doc["datasheets"][0]["stats"][1]["invul"], "4+");
    assert!(doc["datasheets"][0]["abilities"].get("invul").is_none());

    // untouched subtree, stripped links
    assert_eq!(doc["datasheets"][0]["meta"], json!({"hidden": false, "position": [1, 2, 3]}));
    assert!(!contains_field(&doc, "link"));
}

#[test]
fn test_dropped_relation_items_are_reported() {
    let (dir, config) = workspace();
    let input = place_input(dir.path(), "space_marines.json", &fixture_bytes("space_marines.json"));
    let summary = processed(process_document(&input, &config).unwrap());

    let report = &summary.normalize;
    assert_eq!(report.enhancements_moved, 1);
    assert_eq!(report.rules_moved, 1);
    assert_eq!(report.stratagems_moved, 2);
    assert_eq!(report.detachments_upgraded, 2);
    assert_eq!(report.detachments_created, 0);
    assert_eq!(report.invul_hoisted, 1);
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].identifier, "Adept of the Codex");
}

#[test]
fn test_round_trip_restores_normalized_document() {
    let (dir, config) = workspace();
    let input = place_input(dir.path(), "space_marines.json", &fixture_bytes("space_marines.json"));
    process_document(&input, &config).unwrap();

    let mut translated = read_json(&dir.path().join("out/SM.translated.json"));
    let table = TranslationTable::from_value(&read_json(&dir.path().join("out/en/SM.flat.json"))).unwrap();
    localize(&mut translated, &table);

    let mut expected = read_json(&fixture_path("space_marines.json"));
    let mut names = NameIndex::build(&expected);
    normalize(&mut expected, &mut names);
    strip_links(&mut expected);

    assert_eq!(translated, expected);
}

#[test]
fn test_core_document_is_not_normalized() {
    let (dir, config) = workspace();
    let core = json!({
        "id": "core-rules-10th",
        "name": "Core Rules",
        "stratagems": [
            {"name": "Command Re-roll", "detachment": "Core", "when": "Any phase.", "cost": 1}
        ]
    });
    let input = place_input(dir.path(), "core.json", core.to_string().as_bytes());

    let summary = processed(process_document(&input, &config).unwrap());
    assert_eq!(summary.kind, DocumentKind::Core);
    assert_eq!(summary.base_name, "core");

    let doc = read_json(&dir.path().join("out/core.translated.json"));
    assert!(doc.get("detachments").is_none());
    let stratagem = &doc["stratagems"][0];
    assert_eq!(stratagem["name"], "stratagems.Command_Re_roll.name");
    assert_eq!(stratagem["detachment"], "stratagems.Command_Re_roll.detachment");
    assert!(dir.path().join("out/fr/core.flat.json").is_file());
}

// ============================================================================
// Single-run guarantee
// ============================================================================

#[test]
fn test_second_run_reports_already_processed() {
    let (dir, config) = workspace();
    let input = place_input(dir.path(), "space_marines.json", &fixture_bytes("space_marines.json"));
    process_document(&input, &config).unwrap();

    let before = fs::read(dir.path().join("out/SM.translated.json")).unwrap();
    let outcome = process_document(&input, &config).unwrap();
    assert!(matches!(outcome, DocumentOutcome::AlreadyProcessed { .. }));
    assert_eq!(fs::read(dir.path().join("out/SM.translated.json")).unwrap(), before);
}

#[test]
fn test_keep_source_uses_done_marker() {
    let (dir, mut config) = workspace();
    config.remove_processed = false;
    let input = place_input(dir.path(), "space_marines.json", &fixture_bytes("space_marines.json"));

    processed(process_document(&input, &config).unwrap());
    assert!(input.exists());
    assert!(dir.path().join("archive/space_marines.json.done").is_file());

    let outcome = process_document(&input, &config).unwrap();
    assert!(matches!(outcome, DocumentOutcome::AlreadyProcessed { .. }));
}

#[test]
fn test_existing_archive_is_not_overwritten() {
    let (dir, config) = workspace();
    fs::create_dir_all(&config.archive_dir).unwrap();
    fs::write(config.archive_dir.join("space_marines.json"), b"{\"id\": \"first\"}").unwrap();

    let input = place_input(dir.path(), "space_marines.json", &fixture_bytes("space_marines.json"));
    assert!(matches!(
        process_document(&input, &config),
        Err(PipelineError::ArchiveConflict { .. })
    ));

    assert_eq!(
        fs::read_to_string(config.archive_dir.join("space_marines.json")).unwrap(),
        "{\"id\": \"first\"}"
    );
    assert!(input.exists());
    assert!(!dir.path().join("out/SM.translated.json").exists());
}

#[test]
fn test_identical_archived_copy_is_processed() {
    let (dir, config) = workspace();
    let original = fixture_bytes("space_marines.json");
    fs::create_dir_all(&config.archive_dir).unwrap();
    fs::write(config.archive_dir.join("space_marines.json"), &original).unwrap();

    let input = place_input(dir.path(), "space_marines.json", &original);
    processed(process_document(&input, &config).unwrap());
    assert!(!input.exists());
    assert_eq!(fs::read(config.archive_dir.join("space_marines.json")).unwrap(), original);
}

#[test]
fn test_same_file_name_in_two_directories_keeps_second_input() {
    let (dir, config) = workspace();
    let first = dir.path().join("a/sm.json");
    let second = dir.path().join("b/sm.json");
    fs::create_dir_all(first.parent().unwrap()).unwrap();
    fs::create_dir_all(second.parent().unwrap()).unwrap();
    fs::write(&first, b"{\"id\": \"A\", \"name\": \"Alpha\"}").unwrap();
    fs::write(&second, b"{\"id\": \"B\", \"name\": \"Beta\"}").unwrap();

    let report = process_batch(&[first.clone(), second.clone()], &config);
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.failed[0].1, PipelineError::ArchiveConflict { .. }));

    assert!(!first.exists());
    assert_eq!(fs::read_to_string(&second).unwrap(), "{\"id\": \"B\", \"name\": \"Beta\"}");
    assert!(!dir.path().join("out/B.translated.json").exists());
    assert_eq!(
        fs::read_to_string(config.archive_dir.join("sm.json")).unwrap(),
        "{\"id\": \"A\", \"name\": \"Alpha\"}"
    );
}

#[test]
fn test_refetched_file_under_consumed_name_is_kept() {
    let (dir, config) = workspace();
    let input = place_input(dir.path(), "sm.json", b"{\"id\": \"SM\", \"name\": \"Old\"}");
    processed(process_document(&input, &config).unwrap());
    assert!(!input.exists());

    fs::write(&input, b"{\"id\": \"SM\", \"name\": \"New\"}").unwrap();
    assert!(matches!(
        process_document(&input, &config),
        Err(PipelineError::ArchiveConflict { .. })
    ));
    assert_eq!(fs::read_to_string(&input).unwrap(), "{\"id\": \"SM\", \"name\": \"New\"}");
    assert_eq!(
        fs::read_to_string(config.archive_dir.join("sm.json")).unwrap(),
        "{\"id\": \"SM\", \"name\": \"Old\"}"
    );
    let table = read_json(&dir.path().join("out/en/SM.flat.json"));
    assert_eq!(table["root.name"], "Old");
}

#[test]
fn test_artifact_and_missing_inputs_are_errors() {
    let (dir, config) = workspace();
    let artifact = dir.path().join("out/SM.translated.json");
    assert!(matches!(
        process_document(&artifact, &config),
        Err(PipelineError::OutputAsInput { .. })
    ));
    assert!(matches!(
        process_document(&dir.path().join("in/nothing.json"), &config),
        Err(PipelineError::Missing { .. })
    ));
}

#[test]
fn test_scalar_document_is_rejected() {
    let (dir, config) = workspace();
    let input = place_input(dir.path(), "scalar.json", b"\"just text\"");
    assert!(matches!(
        process_document(&input, &config),
        Err(PipelineError::NotADocument { .. })
    ));
    assert!(input.exists());
}

// ============================================================================
// Batch processing
// ============================================================================

#[test]
fn test_batch_continues_past_broken_document() {
    let (dir, config) = workspace();
    place_input(dir.path(), "a_broken.json", b"{ not json");
    place_input(dir.path(), "b_marines.json", &fixture_bytes("space_marines.json"));

    let files = collect_inputs(&[dir.path().join("in").to_string_lossy().into_owned()]);
    assert_eq!(files.len(), 2);

    let report = process_batch(&files, &config);
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.is_success());
    assert!(matches!(report.failed[0].1, PipelineError::Json { .. }));

    // broken input untouched and not archived
    assert!(dir.path().join("in/a_broken.json").exists());
    assert!(!dir.path().join("archive/a_broken.json").exists());

    let rerun = process_batch(&files, &config);
    assert_eq!(rerun.skipped.len(), 1);
    assert_eq!(rerun.failed.len(), 1);
}

#[test]
fn test_collect_inputs_glob_skips_artifacts() {
    let (dir, _) = workspace();
    place_input(dir.path(), "a.json", b"{}");
    place_input(dir.path(), "a.translated.json", b"{}");
    let pattern = dir.path().join("in").join("*.json").to_string_lossy().into_owned();
    let files = collect_inputs(&[pattern]);
    assert_eq!(files, vec![dir.path().join("in").join("a.json")]);
}

// ============================================================================
// Weapon key renaming
// ============================================================================

#[test]
fn test_rekey_weapons_after_extract() {
    let (dir, config) = workspace();
    let input = place_input(dir.path(), "space_marines.json", &fixture_bytes("space_marines.json"));
    process_document(&input, &config).unwrap();

    let summary = rekey_base(&config, "SM").unwrap();
    assert_eq!(summary.renamed, 3);
    assert_eq!(summary.merged, 1);

    let doc = read_json(&dir.path().join("out/SM.translated.json"));
    assert_eq!(doc["datasheets"][0]["rangedWeapons"][0]["profiles"][0]["name"], "bolt_pistol");
    assert_eq!(doc["datasheets"][1]["rangedWeapons"][0]["profiles"][0]["name"], "bolt_pistol");
    assert_eq!(
        doc["datasheets"][0]["meleeWeapons"][0]["profiles"][0]["name"],
        "master_crafted_power_weapon"
    );

    for locale in ["en", "fr"] {
        let table = read_json(&dir.path().join("out").join(locale).join("SM.flat.json"));
        assert_eq!(table["bolt_pistol"], "Bolt pistol");
        assert!(table.get("datasheets.Captain.rangedWeapons.0.profiles.0.name").is_none());
        assert_eq!(table["root.name"], "Space Marines");
    }
}

// ============================================================================
// Properties
// ============================================================================

fn text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ,'!?-]{0,24}"
}

fn field_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_filter("link fields are dropped", |f| f != "link")
}

fn document_strategy() -> impl Strategy<Value = Value> {
    let sheet = (
        "\\PC{1,16}",
        proptest::collection::btree_map(field_strategy(), text_strategy(), 0..4),
        proptest::collection::vec(text_strategy(), 0..3),
    )
        .prop_map(|(name, fields, list)| {
            let mut map = serde_json::Map::new();
            map.insert("name".to_string(), Value::String(name));
            for (field, text) in fields {
                map.entry(field).or_insert(Value::String(text));
            }
            map.insert("notes".to_string(), json!(list));
            Value::Object(map)
        });
    (
        proptest::collection::btree_map(field_strategy(), text_strategy(), 0..4),
        proptest::collection::vec(sheet, 0..4),
    )
        .prop_map(|(fields, sheets)| {
            let mut root = serde_json::Map::new();
            for (field, text) in fields {
                root.insert(field, Value::String(text));
            }
            root.insert("datasheets".to_string(), Value::Array(sheets));
            Value::Object(root)
        })
}

proptest! {
    #[test]
    fn prop_round_trip_recovers_every_leaf(doc in document_strategy()) {
        let names = NameIndex::build(&doc);
        let mut rewrite = rewrite_document(doc.clone(), &names);
        localize(&mut rewrite.document, &rewrite.table);
        prop_assert_eq!(rewrite.document, doc);
    }

    #[test]
    fn prop_synthesized_keys_are_identifier_safe(doc in document_strategy()) {
        let names = NameIndex::build(&doc);
        let rewrite = rewrite_document(doc, &names);
        for (key, text) in rewrite.table.iter() {
            if key == text {
                continue;
            }
            prop_assert!(
                key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
                "unexpected character in key {:?}", key
            );
        }
    }
}
