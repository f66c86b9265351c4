//! # Store File
//!
//! The JSON document the CLI operates on: known users and reviewable
//! records. Loaded into an [`InMemoryStore`] for a command and written back
//! only when the command succeeds.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use brit_core::{ObjectId, ObjectRef, ObjectType, UserId};
use brit_policy::User;
use brit_publication::InMemoryStore;
use brit_state::{Reviewable, ReviewableRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreFile {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub records: Vec<ReviewableRecord>,
}

impl StoreFile {
    /// Read and parse the store file. A missing file, malformed JSON, or two
    /// records with the same reference are errors.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read store: {}", path.display()))?;
        let file: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid store JSON in {}", path.display()))?;
        file.check_unique()
            .with_context(|| format!("invalid store: {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            users = file.users.len(),
            records = file.records.len(),
            "loaded store"
        );
        Ok(file)
    }

    /// Write the store file, replacing it via a sibling temp file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace store: {}", path.display()))?;
        tracing::debug!(path = %path.display(), records = self.records.len(), "saved store");
        Ok(())
    }

    fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for record in &self.records {
            let object = record.object_ref();
            if !seen.insert(object.clone()) {
                bail!("duplicate record {object}");
            }
        }
        Ok(())
    }

    /// Give records owned by the built-in sentinel the configured owner.
    pub fn assign_default_owner(&mut self, owner: &UserId) {
        if owner.is_default_owner() {
            return;
        }
        for record in &mut self.records {
            if record.owner.is_default_owner() {
                record.owner = owner.clone();
            }
        }
    }

    /// Resolve `--user`: `None` is the anonymous user.
    pub fn user(&self, id: Option<&str>) -> Result<User> {
        let Some(id) = id else {
            return Ok(User::anonymous());
        };
        let id = UserId::new(id).context("invalid user id")?;
        self.users
            .iter()
            .find(|u| u.id.as_ref() == Some(&id))
            .cloned()
            .with_context(|| format!("unknown user: {id}"))
    }

    /// The records as an object store.
    pub fn to_store(&self) -> InMemoryStore<ReviewableRecord> {
        InMemoryStore::from_objects(self.records.iter().cloned())
    }

    /// Copy the store's versions back over the records, keeping file order.
    pub fn set_records(&mut self, store: &InMemoryStore<ReviewableRecord>) {
        for record in &mut self.records {
            if let Some(updated) = store.get(&record.object_ref()) {
                *record = updated;
            }
        }
    }
}

/// Parse `--model` and `--id` into a reference.
pub fn object_ref(model: &str, id: &str) -> Result<ObjectRef> {
    let object_type =
        ObjectType::parse(model).with_context(|| format!("invalid model: {model:?}"))?;
    let id = ObjectId::new(id).with_context(|| format!("invalid object id: {id:?}"))?;
    Ok(ObjectRef::new(object_type, id))
}
