/// Catalog integration tests — RON loading, merging and detection over
/// file-based attribute sets.

use aidchaos::core::catalog::{AttributeCatalog, CatalogError};
use aidchaos::core::matcher::TriggerMatcher;
use aidchaos::schema::attribute::OutcomeTier;
use std::path::Path;

const FIXTURE: &str = "tests/fixtures/test_catalog.ron";

#[test]
fn fixture_loads() {
    let catalog = AttributeCatalog::load_from_ron(Path::new(FIXTURE)).unwrap();
    assert_eq!(catalog.names(), vec!["Magic", "Strength"]);
    for tier in OutcomeTier::ALL {
        assert!(catalog.guidance("Magic", tier).is_some());
    }
    let magic = catalog.triggers("Magic").unwrap();
    assert!(magic.singles.contains("conjure"));
    assert!(magic.phrases.contains(&"weave a spell".to_string()));
}

#[test]
fn fixture_merges_over_defaults() {
    let mut catalog = AttributeCatalog::default();
    catalog.merge(AttributeCatalog::load_from_ron(Path::new(FIXTURE)).unwrap());

    assert_eq!(
        catalog.names(),
        vec!["Strength", "Dexterity", "Intelligence", "Charisma", "Perception", "Magic"]
    );
    assert_eq!(
        catalog.guidance("Strength", OutcomeTier::Success),
        Some("The effort pays off.")
    );
    // the replacement drops the built-in trigger list
    assert!(!catalog.triggers("Strength").unwrap().singles.contains("smash"));
}

#[test]
fn merged_catalog_detects_new_attribute() {
    let mut catalog = AttributeCatalog::default();
    catalog.merge(AttributeCatalog::load_from_ron(Path::new(FIXTURE)).unwrap());
    let matcher = TriggerMatcher::new(&catalog);

    assert_eq!(
        matcher.detect_all_attributes("I try to weave a spell and sneak away"),
        vec!["Dexterity", "Magic"]
    );
    assert_eq!(
        matcher.detect_all_attributes("I challenge him to arm wrestle"),
        vec!["Strength"]
    );
    assert_eq!(
        matcher.detect_all_attributes("My magic is weak today."),
        vec!["Magic"]
    );
}

#[test]
fn missing_file_is_io_error() {
    assert!(matches!(
        AttributeCatalog::load_from_ron(Path::new("tests/fixtures/nope.ron")),
        Err(CatalogError::Io(_))
    ));
}

#[test]
fn duplicate_names_rejected() {
    let ron = r#"[
        (name: "Luck", triggers: ["gamble"]),
        (name: "luck", triggers: ["bet"]),
    ]"#;
    assert!(matches!(
        AttributeCatalog::parse_ron(ron),
        Err(CatalogError::DuplicateAttribute(_))
    ));
}
