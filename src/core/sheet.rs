/// Character sheet resolution. Turns the settings record, or failing that
/// the character's base and modifier records, into a configuration snapshot.

use regex::Regex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::core::catalog::AttributeCatalog;
use crate::core::config::ResolverConfig;
use crate::core::store::{RecordStore, StoreError};
use crate::schema::attribute::RawScore;
use crate::schema::record::StoryRecord;
use crate::schema::sections;
use crate::schema::settings::{
    attribute_entries, ConfigurationSnapshot, SettingsText, ATTRIBUTES_HEADER, MODIFIERS_HEADER,
};

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid record type pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Which branch of the load produced the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPath {
    /// Composed from base and modifier records, then persisted.
    Derived,
    /// Read from a settings record already in canonical form.
    Loaded,
    /// Read from the settings record, which was then rewritten canonically.
    Normalized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub snapshot: ConfigurationSnapshot,
    pub path: LoadPath,
    /// Record store writes made during the load.
    pub writes: usize,
}

/// A source record consulted during derivation, with the section it fed.
struct SourceRecord {
    record: StoryRecord,
    header: &'static str,
}

pub struct CharacterSheetResolver<'a> {
    catalog: &'a AttributeCatalog,
    config: &'a ResolverConfig,
}

impl<'a> CharacterSheetResolver<'a> {
    pub fn new(catalog: &'a AttributeCatalog, config: &'a ResolverConfig) -> Self {
        Self { catalog, config }
    }

    /// Enabled, display off, every attribute at the default score.
    pub fn defaults(&self) -> ConfigurationSnapshot {
        ConfigurationSnapshot::defaults(self.catalog.names(), self.config.default_score)
    }

    /// Loads the snapshot, deriving it from the character's records the
    /// first time and normalizing the stored text afterwards.
    pub fn try_load(
        &self,
        store: &mut dyn RecordStore,
        memory: &str,
    ) -> Result<LoadReport, SheetError> {
        let names = self.catalog.names();
        let record = store.find(&self.config.settings_title)?;
        let parsed = record
            .as_ref()
            .map(|r| SettingsText::parse(&r.body))
            .unwrap_or_default();

        if !parsed.has_attribute_data() && !parsed.inheritance_resolved.unwrap_or(false) {
            return self.derive(store, memory, &parsed, &names);
        }

        let snapshot =
            ConfigurationSnapshot::from_settings(&parsed, &names, self.config.default_score);
        let canonical = snapshot.render(&names);
        let stored = record.map(|r| r.body).unwrap_or_default();
        if stored == canonical {
            tracing::debug!("settings record already canonical");
            return Ok(LoadReport {
                snapshot,
                path: LoadPath::Loaded,
                writes: 0,
            });
        }

        store.upsert(
            &self.config.settings_title,
            &canonical,
            &self.config.settings_type,
        )?;
        tracing::debug!("settings record normalized");
        Ok(LoadReport {
            snapshot,
            path: LoadPath::Normalized,
            writes: 1,
        })
    }

    /// Like `try_load`, but any failure yields the default snapshot.
    pub fn load(&self, store: &mut dyn RecordStore, memory: &str) -> ConfigurationSnapshot {
        match self.try_load(store, memory) {
            Ok(report) => report.snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "configuration load failed, using defaults");
                self.defaults()
            }
        }
    }

    fn derive(
        &self,
        store: &mut dyn RecordStore,
        memory: &str,
        parsed: &SettingsText,
        names: &[&str],
    ) -> Result<LoadReport, SheetError> {
        let mut raw: FxHashMap<String, RawScore> = names
            .iter()
            .map(|n| (n.to_string(), RawScore::Number(self.config.default_score as f64)))
            .collect();
        let mut sources = Vec::new();
        let is_known = |key: &str| self.catalog.canonical_name(key).is_some();

        if let Some(record) = self.referenced_record(store, memory, &self.config.base_type)? {
            for (key, value) in attribute_entries(&record.body, ATTRIBUTES_HEADER, is_known) {
                if let Some(name) = self.catalog.canonical_name(&key) {
                    raw.insert(name.to_string(), value);
                }
            }
            tracing::debug!(record = %record.title, "applied base record");
            sources.push(SourceRecord {
                record,
                header: ATTRIBUTES_HEADER,
            });
        }

        for modifier_type in &self.config.modifier_types {
            let Some(record) = self.referenced_record(store, memory, modifier_type)? else {
                continue;
            };
            for (key, delta) in attribute_entries(&record.body, MODIFIERS_HEADER, is_known) {
                if let Some(value) = self
                    .catalog
                    .canonical_name(&key)
                    .and_then(|name| raw.get_mut(name))
                {
                    *value = value.compose(delta);
                }
            }
            tracing::debug!(record = %record.title, "applied modifier record");
            sources.push(SourceRecord {
                record,
                header: MODIFIERS_HEADER,
            });
        }

        let mut snapshot =
            ConfigurationSnapshot::from_settings(parsed, names, self.config.default_score);
        snapshot.attributes = raw
            .into_iter()
            .map(|(name, value)| (name, value.finalize()))
            .collect();
        snapshot.inheritance_resolved = true;

        store.upsert(
            &self.config.settings_title,
            &snapshot.render(names),
            &self.config.settings_type,
        )?;
        let writes = 1 + self.strip_sources(store, &sources);
        tracing::debug!(sources = sources.len(), writes, "derived configuration");

        Ok(LoadReport {
            snapshot,
            path: LoadPath::Derived,
            writes,
        })
    }

    /// Looks up the record named by a `<record_type>: <Name>` memory line.
    fn referenced_record(
        &self,
        store: &dyn RecordStore,
        memory: &str,
        record_type: &str,
    ) -> Result<Option<StoryRecord>, SheetError> {
        let Some(name) = find_reference(memory, record_type)? else {
            return Ok(None);
        };
        let record = store.find_by_type(record_type, &name)?;
        if record.is_none() {
            tracing::debug!(record_type, name = %name, "referenced record not found");
        }
        Ok(record)
    }

    /// Removes consumed attribute sections from the source records. The
    /// derived snapshot is already persisted, so a failed write is logged
    /// and skipped.
    fn strip_sources(&self, store: &mut dyn RecordStore, sources: &[SourceRecord]) -> usize {
        let is_known = |key: &str| self.catalog.canonical_name(key).is_some();
        let mut writes = 0;
        for source in sources {
            let Some(stripped) = sections::strip_section(&source.record.body, source.header, is_known)
            else {
                continue;
            };
            if stripped == source.record.body {
                continue;
            }
            match store.mutate(source.record.id, &stripped) {
                Ok(()) => writes += 1,
                Err(e) => tracing::warn!(
                    record = %source.record.title,
                    error = %e,
                    "could not strip attribute section from source record"
                ),
            }
        }
        writes
    }
}

/// Finds the first `<record_type>: <Name>` line in the memory text.
pub fn find_reference(memory: &str, record_type: &str) -> Result<Option<String>, regex::Error> {
    let pattern = format!(
        r"(?im)^[ \t]*>?[ \t]*-?[ \t]*{}[ \t]*:[ \t]*(\S[^\r\n]*?)[ \t]*\r?$",
        regex::escape(record_type.trim())
    );
    let re = Regex::new(&pattern)?;
    Ok(re.captures(memory).map(|c| c[1].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryRecordStore;
    use crate::schema::attribute::AttributeValue;

    const MEMORY: &str = "You are Brakka, a half-orc.\nClass: Warrior\n> Race: Orc\n";

    fn store_with_sheets() -> MemoryRecordStore {
        MemoryRecordStore::new()
            .with_record(
                "Class",
                "Warrior",
                "Warriors fight up front.\n\nAttributes:\n- Strength: 8\n- Intelligence: 3\n\n\nThey never retreat.",
            )
            .with_record(
                "Race",
                "Orc",
                "Attribute-Modifiers:\n- Strength: +3\n- Charisma: disabled\n\nOrcs are proud.",
            )
    }

    #[test]
    fn find_reference_variants() {
        assert_eq!(find_reference(MEMORY, "Class").unwrap(), Some("Warrior".to_string()));
        assert_eq!(find_reference(MEMORY, "race").unwrap(), Some("Orc".to_string()));
        assert_eq!(find_reference("- Class:  Dark Knight  ", "Class").unwrap(), Some("Dark Knight".to_string()));
        assert_eq!(find_reference("Class:", "Class").unwrap(), None);
        assert_eq!(find_reference("Class:\nRace: Orc", "Class").unwrap(), None);
        assert_eq!(find_reference("My class: is hidden", "Class").unwrap(), None);
    }

    #[test]
    fn no_records_derives_defaults_once() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = MemoryRecordStore::new();

        let report = resolver.try_load(&mut store, "").unwrap();
        assert_eq!(report.path, LoadPath::Derived);
        assert_eq!(report.writes, 1);
        assert!(report.snapshot.inheritance_resolved);
        assert!(report.snapshot.enabled);
        assert!(!report.snapshot.result_display);
        assert!(report
            .snapshot
            .attributes
            .values()
            .all(|v| *v == AttributeValue::Score(5)));

        let record = store.by_title("AidChaos Configuration").unwrap();
        assert_eq!(record.record_type, "settings");
        assert!(record.body.contains("Inheritance processed: true"));
    }

    #[test]
    fn derives_from_base_and_modifier() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = store_with_sheets();

        let report = resolver.try_load(&mut store, MEMORY).unwrap();
        let attrs = &report.snapshot.attributes;
        assert_eq!(attrs["Strength"], AttributeValue::Score(10));
        assert_eq!(attrs["Intelligence"], AttributeValue::Score(3));
        assert_eq!(attrs["Charisma"], AttributeValue::Disabled);
        assert_eq!(attrs["Dexterity"], AttributeValue::Score(5));
        assert_eq!(report.writes, 3);

        assert_eq!(
            store.by_title("Warrior").unwrap().body,
            "Warriors fight up front.\n\nThey never retreat."
        );
        assert_eq!(store.by_title("Orc").unwrap().body, "Orcs are proud.");
    }

    #[test]
    fn derivation_keeps_flags_from_partial_record() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = store_with_sheets().with_record(
            "settings",
            "AidChaos Configuration",
            "Result Output enabled: true",
        );
        let report = resolver.try_load(&mut store, MEMORY).unwrap();
        assert_eq!(report.path, LoadPath::Derived);
        assert!(report.snapshot.result_display);
    }

    #[test]
    fn existing_data_is_normalized_then_stable() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = MemoryRecordStore::new().with_record(
            "settings",
            "AidChaos Configuration",
            "aidchaos enabled: TRUE\nAttributes:\n- strength: 14\n- perception: 2.7",
        );

        let first = resolver.try_load(&mut store, MEMORY).unwrap();
        assert_eq!(first.path, LoadPath::Normalized);
        assert_eq!(first.writes, 1);
        assert_eq!(first.snapshot.attributes["Strength"], AttributeValue::Score(10));
        assert_eq!(first.snapshot.attributes["Perception"], AttributeValue::Score(2));
        assert!(!first.snapshot.inheritance_resolved);

        let second = resolver.try_load(&mut store, MEMORY).unwrap();
        assert_eq!(second.path, LoadPath::Loaded);
        assert_eq!(second.writes, 0);
        assert_eq!(second.snapshot, first.snapshot);
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn resolved_flag_prevents_rederivation() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = store_with_sheets().with_record(
            "settings",
            "AidChaos Configuration",
            "Inheritance processed: true",
        );
        let report = resolver.try_load(&mut store, MEMORY).unwrap();
        assert_eq!(report.path, LoadPath::Normalized);
        assert_eq!(report.snapshot.attributes["Strength"], AttributeValue::Score(5));
        assert!(store.by_title("Warrior").unwrap().body.contains("Attributes:"));
    }

    #[test]
    fn custom_record_types() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig {
            base_type: "Profession".to_string(),
            modifier_types: vec!["Blessing".to_string(), "Curse".to_string()],
            ..ResolverConfig::default()
        };
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = MemoryRecordStore::new()
            .with_record("Profession", "Scholar", "Attributes:\n- Intelligence: 7")
            .with_record("Blessing", "Owl", "Attribute-Modifiers:\n- Intelligence: +2")
            .with_record("Curse", "Fog", "Attribute-Modifiers:\n- Intelligence: -4");
        let memory = "Profession: Scholar\nBlessing: Owl\nCurse: Fog";
        let snapshot = resolver.load(&mut store, memory);
        assert_eq!(snapshot.attributes["Intelligence"], AttributeValue::Score(5));
    }

    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn find(&self, _: &str) -> Result<Option<StoryRecord>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
        fn find_all_by_type(&self, _: &str) -> Result<Vec<StoryRecord>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
        fn upsert(&mut self, _: &str, _: &str, _: &str) -> Result<crate::schema::record::RecordId, StoreError> {
            Err(StoreError::Rejected("read-only".to_string()))
        }
        fn mutate(&mut self, _: crate::schema::record::RecordId, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Rejected("read-only".to_string()))
        }
    }

    #[test]
    fn store_failure_falls_back_to_defaults() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        assert!(matches!(
            resolver.try_load(&mut BrokenStore, MEMORY),
            Err(SheetError::Store(StoreError::Unavailable(_)))
        ));
        assert_eq!(resolver.load(&mut BrokenStore, MEMORY), resolver.defaults());
    }

    /// Reads and upserts normally but rejects every body mutation.
    struct NoMutateStore(MemoryRecordStore);

    impl RecordStore for NoMutateStore {
        fn find(&self, title: &str) -> Result<Option<StoryRecord>, StoreError> {
            self.0.find(title)
        }
        fn find_all_by_type(&self, record_type: &str) -> Result<Vec<StoryRecord>, StoreError> {
            self.0.find_all_by_type(record_type)
        }
        fn upsert(&mut self, title: &str, body: &str, record_type: &str) -> Result<crate::schema::record::RecordId, StoreError> {
            self.0.upsert(title, body, record_type)
        }
        fn mutate(&mut self, _: crate::schema::record::RecordId, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Rejected("locked".to_string()))
        }
    }

    #[test]
    fn failed_strip_still_returns_derived_values() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = NoMutateStore(store_with_sheets());

        let report = resolver.try_load(&mut store, MEMORY).unwrap();
        assert_eq!(report.path, LoadPath::Derived);
        assert_eq!(report.writes, 1);
        assert_eq!(report.snapshot.attributes["Strength"], AttributeValue::Score(10));

        let second = resolver.load(&mut store, MEMORY);
        assert_eq!(second, report.snapshot);
        assert!(store.0.by_title("Warrior").unwrap().body.contains("Attributes:"));
    }

    #[test]
    fn blank_line_after_header_is_applied_and_stripped() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = MemoryRecordStore::new().with_record(
            "Class",
            "Fighter",
            "Fighter.\n\nAttributes:\n\n- Strength: 8\n- Dexterity: 6\n\nLoves ale.",
        );

        let snapshot = resolver.load(&mut store, "Class: Fighter");
        assert_eq!(snapshot.attributes["Strength"], AttributeValue::Score(8));
        assert_eq!(snapshot.attributes["Dexterity"], AttributeValue::Score(6));
        assert_eq!(store.by_title("Fighter").unwrap().body, "Fighter.\n\nLoves ale.");
    }

    #[test]
    fn prose_after_section_is_not_read_as_a_value() {
        let catalog = AttributeCatalog::default();
        let config = ResolverConfig::default();
        let resolver = CharacterSheetResolver::new(&catalog, &config);
        let mut store = MemoryRecordStore::new().with_record(
            "Class",
            "Archer",
            "Attributes:\n- Strength: 5\nFavoured weapon: longbow\nDexterity: 2 arrows per turn",
        );

        let snapshot = resolver.load(&mut store, "Class: Archer");
        assert_eq!(snapshot.attributes["Dexterity"], AttributeValue::Score(5));
        assert_eq!(
            store.by_title("Archer").unwrap().body,
            "Favoured weapon: longbow\nDexterity: 2 arrows per turn"
        );
    }
}
