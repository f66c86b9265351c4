//! # Configuration
//!
//! `brit.yaml` names the object store file, the sentinel owner, and the
//! dependency declarations per model:
//!
//! ```yaml
//! store: brit-store.json
//! default_owner: brit-default-owner
//! dependencies:
//!   - model: soilcom.collection
//!     requires_published:
//!       - { accessor: catchment, label: Catchment }
//!     follows_parent:
//!       - { accessor: properties, label: Property values, optional: true }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use brit_core::{ObjectType, UserId, DEFAULT_OWNER_ID};
use brit_publication::{DependencyConfig, DependencyRegistry, RegistryBuilder, RelationRule};
use brit_state::ReviewableRecord;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "brit.yaml";

/// Store file used when the config does not name one.
pub const DEFAULT_STORE_FILE: &str = "brit-store.json";

/// One relation rule as written in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Relation slot on the record.
    pub accessor: String,
    /// Display label; defaults to the accessor.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl RuleEntry {
    fn to_rule(&self) -> RelationRule<ReviewableRecord> {
        let label = self.label.as_deref().unwrap_or(&self.accessor);
        RelationRule::slot(&self.accessor, label, self.optional)
    }
}

/// Dependency declarations for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// `<domain>.<model>`.
    pub model: String,
    #[serde(default)]
    pub requires_published: Vec<RuleEntry>,
    #[serde(default)]
    pub follows_parent: Vec<RuleEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BritConfig {
    #[serde(default = "default_store")]
    pub store: PathBuf,
    #[serde(default = "default_owner")]
    pub default_owner: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

fn default_store() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_FILE)
}

fn default_owner() -> String {
    DEFAULT_OWNER_ID.to_string()
}

impl Default for BritConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            default_owner: default_owner(),
            dependencies: Vec::new(),
        }
    }
}

impl BritConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, `brit.yaml` in `cwd` is
    /// used if present, defaults otherwise. A relative `store` path is
    /// resolved against the directory holding the config file.
    pub fn load(path: Option<&Path>, cwd: &Path) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (cwd.join(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if required {
                anyhow::bail!("config file not found: {}", path.display());
            }
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            let mut config = Self::default();
            config.store = cwd.join(&config.store);
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?;
        if config.store.is_relative() {
            let base = path.parent().unwrap_or(cwd);
            config.store = base.join(&config.store);
        }
        tracing::debug!(
            path = %path.display(),
            store = %config.store.display(),
            models = config.dependencies.len(),
            "loaded config"
        );
        Ok(config)
    }

    pub fn default_owner(&self) -> Result<UserId> {
        UserId::new(self.default_owner.as_str()).context("invalid default_owner in config")
    }

    /// Register every configured model into a dependency registry.
    pub fn registry(&self) -> Result<DependencyRegistry<ReviewableRecord>> {
        let mut builder = RegistryBuilder::new();
        for entry in &self.dependencies {
            let object_type = ObjectType::parse(&entry.model)
                .with_context(|| format!("invalid model in dependencies: {:?}", entry.model))?;
            let mut config = DependencyConfig::new();
            for rule in &entry.requires_published {
                config = config.requires(rule.to_rule());
            }
            for rule in &entry.follows_parent {
                config = config.follows(rule.to_rule());
            }
            builder.register(object_type, config)?;
        }
        Ok(builder.build())
    }
}
