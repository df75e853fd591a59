/// Catalog Linter — validates attribute catalogs before they ship.
///
/// Usage: catalog_linter <catalog.ron | dir> [--defaults]

use aidchaos::core::catalog::AttributeCatalog;
use aidchaos::core::matcher::tokenize;
use aidchaos::schema::attribute::OutcomeTier;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: catalog_linter <catalog.ron | dir> [--defaults]");
        println!("       catalog_linter --defaults");
        process::exit(0);
    }

    let mut path = None;
    let mut with_defaults = false;
    for arg in &args[1..] {
        if arg == "--defaults" {
            with_defaults = true;
        } else {
            path = Some(arg.clone());
        }
    }

    let mut catalog = if with_defaults {
        AttributeCatalog::default()
    } else {
        AttributeCatalog::empty()
    };

    if let Some(ref path) = path {
        let catalog_path = Path::new(path);
        if catalog_path.is_file() {
            match AttributeCatalog::load_from_ron(catalog_path) {
                Ok(loaded) => catalog.merge(loaded),
                Err(e) => {
                    eprintln!("ERROR: Failed to load catalog file: {}", e);
                    process::exit(1);
                }
            }
        } else if catalog_path.is_dir() {
            load_catalogs_recursive(catalog_path, &mut catalog);
        } else {
            eprintln!("ERROR: Path '{}' does not exist", path);
            process::exit(1);
        }
    }

    println!("Loaded {} attributes", catalog.len());

    let (errors, warnings) = lint_catalog(&catalog);

    println!("\n=== Catalog Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_catalogs_recursive(dir: &Path, catalog: &mut AttributeCatalog) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_catalogs_recursive(&path, catalog);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match AttributeCatalog::load_from_ron(&path) {
                    Ok(loaded) => {
                        println!("  Loaded: {}", path.display());
                        catalog.merge(loaded);
                    }
                    Err(e) => {
                        eprintln!("  ERROR loading {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

fn lint_catalog(catalog: &AttributeCatalog) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if catalog.is_empty() {
        errors.push("Catalog defines no attributes".to_string());
    }

    // Tier coverage and trigger presence
    for def in catalog.definitions() {
        for tier in OutcomeTier::ALL {
            if catalog.guidance(&def.name, tier).is_none() {
                errors.push(format!(
                    "Attribute '{}' has no guidance for {}",
                    def.name, tier
                ));
            }
        }

        if def.triggers.iter().all(|t| t.trim().is_empty()) {
            errors.push(format!("Attribute '{}' has no triggers", def.name));
        }
    }

    // Single triggers must survive tokenization to ever match
    let mut owners: FxHashMap<String, Vec<&str>> = FxHashMap::default();
    for (name, triggers) in catalog.trigger_sets() {
        for single in &triggers.singles {
            if tokenize(single) != [single.as_str()] {
                warnings.push(format!(
                    "Attribute '{}' trigger '{}' can never match a token",
                    name, single
                ));
            }
            owners.entry(single.clone()).or_default().push(name);
        }
        for phrase in &triggers.phrases {
            owners.entry(phrase.clone()).or_default().push(name);
        }
    }

    // Shared triggers roll every owner at once
    let mut shared: Vec<_> = owners.into_iter().filter(|(_, o)| o.len() > 1).collect();
    shared.sort();
    for (trigger, names) in shared {
        warnings.push(format!(
            "Trigger '{}' is shared by {}",
            trigger,
            names.join(", ")
        ));
    }

    (errors, warnings)
}
