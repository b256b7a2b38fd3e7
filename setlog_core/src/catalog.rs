//! Built-in exercise catalog.
//!
//! Used at save time to tag each recorded exercise as static (timed) or
//! dynamic (rep-counted). Lookups are case-insensitive on both id and name.

use crate::config::CustomExercise;
use crate::repository::{CatalogEntry, ExerciseCatalog};
use crate::ExerciseType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused
static DEFAULT_CATALOG: Lazy<BuiltinCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static BuiltinCatalog {
    &DEFAULT_CATALOG
}

/// In-memory catalog keyed by lowercased id, with a name index
#[derive(Clone, Debug)]
pub struct BuiltinCatalog {
    entries: HashMap<String, CatalogEntry>,
    names: HashMap<String, String>,
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        get_default_catalog().clone()
    }
}

impl BuiltinCatalog {
    /// A catalog holding exactly `entries`
    pub fn with_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut catalog = Self {
            entries: HashMap::new(),
            names: HashMap::new(),
        };
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Add or replace an entry
    pub fn insert(&mut self, entry: CatalogEntry) {
        let key = normalize(&entry.exercise_id);
        self.names.insert(normalize(&entry.name), key.clone());
        self.entries.insert(key, entry);
    }

    /// Add the user's custom exercises from the config file
    pub fn extend_with_custom(&mut self, custom: &[CustomExercise]) {
        for exercise in custom {
            self.insert(CatalogEntry {
                exercise_id: exercise.id.clone(),
                name: exercise.name.clone(),
                kind: exercise.kind,
            });
        }
        if !custom.is_empty() {
            tracing::debug!("Added {} custom exercises to catalog", custom.len());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate catalog integrity
    ///
    /// Returns a list of validation errors, empty if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, entry) in &self.entries {
            if key.is_empty() || entry.exercise_id.trim().is_empty() {
                errors.push("Catalog entry has empty ID".to_string());
            }
            if entry.name.trim().is_empty() {
                errors.push(format!("Catalog entry '{}' has empty name", key));
            }
        }

        let mut name_counts: HashMap<String, usize> = HashMap::new();
        for entry in self.entries.values() {
            *name_counts.entry(normalize(&entry.name)).or_default() += 1;
        }
        for (name, count) in name_counts {
            if count > 1 {
                errors.push(format!("Catalog name '{}' is used {} times", name, count));
            }
        }

        errors
    }
}

impl ExerciseCatalog for BuiltinCatalog {
    fn lookup(&self, name_or_id: &str) -> Option<CatalogEntry> {
        let key = normalize(name_or_id);
        self.entries
            .get(&key)
            .or_else(|| self.names.get(&key).and_then(|id| self.entries.get(id)))
            .cloned()
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

fn build_default_catalog() -> BuiltinCatalog {
    use ExerciseType::{Dynamic, Static};

    let defaults: &[(&str, &str, ExerciseType)] = &[
        // Upper body
        ("push_up", "Push-up", Dynamic),
        ("pull_up", "Pull-up", Dynamic),
        ("chin_up", "Chin-up", Dynamic),
        ("dip", "Dip", Dynamic),
        ("bench_press", "Bench Press", Dynamic),
        ("overhead_press", "Overhead Press", Dynamic),
        ("bent_over_row", "Bent-over Row", Dynamic),
        ("bicep_curl", "Bicep Curl", Dynamic),
        // Lower body
        ("squat", "Squat", Dynamic),
        ("deadlift", "Deadlift", Dynamic),
        ("lunge", "Lunge", Dynamic),
        ("glute_bridge", "Glute Bridge", Dynamic),
        ("calf_raise", "Calf Raise", Dynamic),
        // Core
        ("crunch", "Crunch", Dynamic),
        ("leg_raise", "Leg Raise", Dynamic),
        ("plank", "Plank", Static),
        ("side_plank", "Side Plank", Static),
        ("hollow_hold", "Hollow Hold", Static),
        // Isometrics
        ("wall_sit", "Wall Sit", Static),
        ("dead_hang", "Dead Hang", Static),
        ("l_sit", "L-sit", Static),
    ];

    BuiltinCatalog::with_entries(
        defaults
            .iter()
            .map(|(id, name, kind)| CatalogEntry {
                exercise_id: (*id).to_string(),
                name: (*name).to_string(),
                kind: *kind,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_validates() {
        let catalog = get_default_catalog();
        let errors = catalog.validate();
        assert!(errors.is_empty(), "Catalog validation errors: {:?}", errors);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_lookup_by_id_and_name() {
        let catalog = BuiltinCatalog::default();
        let by_id = catalog.lookup("plank").unwrap();
        let by_name = catalog.lookup("  PLANK ").unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(by_id.kind, ExerciseType::Static);

        assert_eq!(
            catalog.lookup("Push-up").map(|e| e.exercise_id),
            Some("push_up".to_string())
        );
        assert!(catalog.lookup("Underwater basket weaving").is_none());
    }

    #[test]
    fn test_custom_exercises_extend_catalog() {
        let mut catalog = BuiltinCatalog::default();
        let before = catalog.len();
        catalog.extend_with_custom(&[CustomExercise {
            id: "ring_support".into(),
            name: "Ring Support Hold".into(),
            kind: ExerciseType::Static,
        }]);
        assert_eq!(catalog.len(), before + 1);
        assert_eq!(
            catalog.lookup("ring support hold").map(|e| e.kind),
            Some(ExerciseType::Static)
        );
    }

    #[test]
    fn test_duplicate_names_flagged() {
        let catalog = BuiltinCatalog::with_entries(vec![
            CatalogEntry {
                exercise_id: "a".into(),
                name: "Plank".into(),
                kind: ExerciseType::Static,
            },
            CatalogEntry {
                exercise_id: "b".into(),
                name: "plank".into(),
                kind: ExerciseType::Static,
            },
        ]);
        assert_eq!(catalog.validate().len(), 1);
    }
}
