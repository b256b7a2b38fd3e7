//! File-backed plan repository with file locking.
//!
//! All plans live in one JSON document together with the per-user active
//! plan. Reads take a shared lock; writes go to a locked temp file that is
//! renamed over the original.

use crate::repository::PlanRepository;
use crate::{Error, Plan, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// On-disk layout of the plan store
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
struct PlanDocument {
    #[serde(default)]
    plans: Vec<Plan>,
    /// user id -> active plan id
    #[serde(default)]
    active: BTreeMap<String, Uuid>,
}

/// Plan repository stored in a single JSON file
#[derive(Clone, Debug)]
pub struct FilePlanStore {
    path: PathBuf,
}

impl FilePlanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored plans
    pub fn plans(&self) -> Result<Vec<Plan>> {
        Ok(self.load()?.plans)
    }

    /// Read the document under a shared lock
    ///
    /// A missing file is an empty store. A corrupted file is an error: it is
    /// never silently replaced, since the next write would drop every plan.
    fn load(&self) -> Result<PlanDocument> {
        if !self.path.exists() {
            tracing::debug!("No plan store at {:?}, starting empty", self.path);
            return Ok(PlanDocument::default());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<PlanDocument>(&contents) {
            Ok(document) => {
                tracing::debug!(
                    "Loaded {} plans from {:?}",
                    document.plans.len(),
                    self.path
                );
                Ok(document)
            }
            Err(e) => {
                tracing::warn!("Plan store {:?} is unreadable: {}", self.path, e);
                Err(Error::Json(e))
            }
        }
    }

    /// Atomically write the document (temp file, fsync, rename)
    fn save(&self, document: &PlanDocument) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Repository(format!("plan store path {:?} has no parent", self.path))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(document)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} plans to {:?}", document.plans.len(), self.path);
        Ok(())
    }

    /// Load, modify and save the document
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PlanDocument) -> Result<T>,
    {
        let mut document = self.load()?;
        let value = f(&mut document)?;
        self.save(&document)?;
        Ok(value)
    }
}

impl PlanRepository for FilePlanStore {
    fn active_plan(&self, user_id: &str) -> Result<Option<Plan>> {
        let document = self.load()?;
        let Some(id) = document.active.get(user_id) else {
            return Ok(None);
        };
        Ok(document.plans.into_iter().find(|p| p.id == *id))
    }

    fn plan(&self, id: Uuid) -> Result<Option<Plan>> {
        Ok(self.load()?.plans.into_iter().find(|p| p.id == id))
    }

    fn save_plan(&mut self, plan: &Plan) -> Result<()> {
        plan.ensure_valid()?;
        self.update(|document| {
            if document.plans.iter().any(|p| p.id == plan.id) {
                return Err(Error::Repository(format!(
                    "plan {} already exists",
                    plan.id
                )));
            }
            document.plans.push(plan.clone());
            Ok(())
        })?;
        tracing::info!("Stored plan '{}' ({})", plan.name, plan.id);
        Ok(())
    }

    fn update_plan(&mut self, plan: &Plan) -> Result<()> {
        plan.ensure_valid()?;
        self.update(|document| {
            let existing = document
                .plans
                .iter_mut()
                .find(|p| p.id == plan.id)
                .ok_or_else(|| Error::Repository(format!("no plan with id {}", plan.id)))?;
            *existing = plan.clone();
            Ok(())
        })?;
        tracing::info!("Updated plan '{}' ({})", plan.name, plan.id);
        Ok(())
    }

    fn delete_plan(&mut self, id: Uuid) -> Result<bool> {
        let removed = self.update(|document| {
            let before = document.plans.len();
            document.plans.retain(|p| p.id != id);
            document.active.retain(|_, active| *active != id);
            Ok(document.plans.len() != before)
        })?;
        if removed {
            tracing::info!("Deleted plan {}", id);
        }
        Ok(removed)
    }

    fn activate_plan(&mut self, user_id: &str, id: Uuid) -> Result<()> {
        self.update(|document| {
            if !document.plans.iter().any(|p| p.id == id) {
                return Err(Error::Repository(format!("no plan with id {}", id)));
            }
            document.active.insert(user_id.to_string(), id);
            Ok(())
        })?;
        tracing::info!("Activated plan {} for user '{}'", id, user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_plan;
    use crate::PlanType;

    fn store() -> (tempfile::TempDir, FilePlanStore) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FilePlanStore::new(temp_dir.path().join("plans.json"));
        (temp_dir, store)
    }

    #[test]
    fn test_empty_store() {
        let (_dir, store) = store();
        assert!(store.active_plan("local").unwrap().is_none());
        assert!(store.plans().unwrap().is_empty());
    }

    #[test]
    fn test_save_activate_and_fetch() {
        let (_dir, mut store) = store();
        let plan = sample_plan(PlanType::Repeat);

        store.save_plan(&plan).unwrap();
        assert!(store.active_plan("local").unwrap().is_none());

        store.activate_plan("local", plan.id).unwrap();
        assert_eq!(store.active_plan("local").unwrap(), Some(plan.clone()));
        assert_eq!(store.plan(plan.id).unwrap(), Some(plan.clone()));
        assert!(store.active_plan("someone-else").unwrap().is_none());

        assert!(store.save_plan(&plan).is_err());
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, mut store) = store();
        let mut plan = sample_plan(PlanType::Once);
        store.save_plan(&plan).unwrap();
        store.activate_plan("local", plan.id).unwrap();

        plan.name = "Renamed".into();
        store.update_plan(&plan).unwrap();
        assert_eq!(store.plan(plan.id).unwrap().unwrap().name, "Renamed");

        assert!(store.delete_plan(plan.id).unwrap());
        assert!(!store.delete_plan(plan.id).unwrap());
        assert!(store.active_plan("local").unwrap().is_none());
        assert!(store.update_plan(&plan).is_err());
    }

    #[test]
    fn test_invalid_plan_rejected() {
        let (_dir, mut store) = store();
        let mut plan = sample_plan(PlanType::Repeat);
        plan.schedule.pop();
        assert!(matches!(
            store.save_plan(&plan),
            Err(Error::PlanValidation(_))
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupted_store_is_an_error() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.active_plan("local").is_err());
    }

    #[test]
    fn test_activate_unknown_plan() {
        let (_dir, mut store) = store();
        assert!(store.activate_plan("local", Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let (dir, mut store) = store();
        store.save_plan(&sample_plan(PlanType::Repeat)).unwrap();

        let extras: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "plans.json")
            .collect();
        assert!(extras.is_empty(), "Found extras: {:?}", extras);
    }
}
