//! Inventory configuration, optionally loaded from `trellis.toml`
//!
//! # Example
//!
//! ```toml
//! # Feed id strategy: "accept" (default) or "uuid"
//! feed_id_strategy = "uuid"
//!
//! [implementation]
//! "backend.name" = "memory"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use trellis_core::{Blueprint, CanonicalPath, Entity, Error, Result};

/// Config file name conventionally used by embedders
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

// ============================================================================
// Feed id strategies
// ============================================================================

/// Chooses the id of a newly registered feed
pub trait FeedIdStrategy: Send + Sync + fmt::Debug {
    /// The id for `proposed`, to be placed under `parent`
    ///
    /// `is_taken` reports whether a candidate id is already used by a feed
    /// under `parent`.
    ///
    /// # Errors
    ///
    /// `EntityAlreadyExists` if no acceptable id is free.
    fn generate(
        &self,
        parent: &CanonicalPath,
        proposed: &Blueprint,
        is_taken: &dyn Fn(&str) -> Result<bool>,
    ) -> Result<String>;
}

fn claim(
    parent: &CanonicalPath,
    candidate: String,
    is_taken: &dyn Fn(&str) -> Result<bool>,
) -> Result<String> {
    if is_taken(&candidate)? {
        let path = parent.extend(trellis_core::SegmentType::Feed, candidate)?;
        return Err(Error::already_exists(path));
    }
    Ok(candidate)
}

/// Uses the proposed id as it is
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptWhateverFeedIdStrategy;

impl FeedIdStrategy for AcceptWhateverFeedIdStrategy {
    fn generate(
        &self,
        parent: &CanonicalPath,
        proposed: &Blueprint,
        is_taken: &dyn Fn(&str) -> Result<bool>,
    ) -> Result<String> {
        claim(parent, proposed.id.clone(), is_taken)
    }
}

/// Uses the proposed id when given, a random UUID otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidFeedIdStrategy;

impl FeedIdStrategy for UuidFeedIdStrategy {
    fn generate(
        &self,
        parent: &CanonicalPath,
        proposed: &Blueprint,
        is_taken: &dyn Fn(&str) -> Result<bool>,
    ) -> Result<String> {
        let candidate = if proposed.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            proposed.id.clone()
        };
        claim(parent, candidate, is_taken)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Predicate applied to every fetched entity; rejected entities are invisible
pub type ResultFilter = Arc<dyn Fn(&Entity) -> bool + Send + Sync>;

/// Settings of one inventory
#[derive(Clone)]
pub struct Configuration {
    feed_id_strategy: Arc<dyn FeedIdStrategy>,
    implementation_config: BTreeMap<String, String>,
    result_filter: Option<ResultFilter>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            feed_id_strategy: Arc::new(AcceptWhateverFeedIdStrategy),
            implementation_config: BTreeMap::new(),
            result_filter: None,
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("feed_id_strategy", &self.feed_id_strategy)
            .field("implementation_config", &self.implementation_config)
            .field("result_filter", &self.result_filter.is_some())
            .finish()
    }
}

/// On-disk form of [`Configuration`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feed_id_strategy: Option<String>,
    #[serde(default)]
    implementation: BTreeMap<String, String>,
}

impl Configuration {
    /// Start building a configuration
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Parse a `trellis.toml` document
    ///
    /// # Errors
    ///
    /// `Configuration` if the document is malformed or names an unknown
    /// feed id strategy.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("invalid trellis.toml: {}", e)))?;
        let mut builder = Configuration::builder().implementation_config(file.implementation);
        if let Some(strategy) = file.feed_id_strategy {
            builder = builder.feed_id_strategy_arc(strategy_by_name(&strategy)?);
        }
        Ok(builder.build())
    }

    /// Read and parse a `trellis.toml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// The feed id strategy
    pub fn feed_id_strategy(&self) -> &dyn FeedIdStrategy {
        self.feed_id_strategy.as_ref()
    }

    /// Backend-specific settings
    pub fn implementation_config(&self) -> &BTreeMap<String, String> {
        &self.implementation_config
    }

    /// The result filter, if any
    pub fn result_filter(&self) -> Option<&ResultFilter> {
        self.result_filter.as_ref()
    }

    /// True if `entity` passes the result filter
    pub fn accepts(&self, entity: &Entity) -> bool {
        self.result_filter.as_ref().map_or(true, |f| f(entity))
    }

    /// Look up `key` in the implementation config, falling back to the
    /// environment variable `env_fallback`
    pub fn property(&self, key: &str, env_fallback: Option<&str>) -> Option<String> {
        self.implementation_config
            .get(key)
            .cloned()
            .or_else(|| env_fallback.and_then(|var| std::env::var(var).ok()))
    }
}

fn strategy_by_name(name: &str) -> Result<Arc<dyn FeedIdStrategy>> {
    match name {
        "accept" => Ok(Arc::new(AcceptWhateverFeedIdStrategy)),
        "uuid" => Ok(Arc::new(UuidFeedIdStrategy)),
        other => Err(Error::configuration(format!(
            "unknown feed_id_strategy '{}' in trellis.toml. Expected \"accept\" or \"uuid\".",
            other
        ))),
    }
}

/// Builder for [`Configuration`]
#[derive(Default)]
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    /// Use `strategy` for feed ids
    pub fn feed_id_strategy(self, strategy: impl FeedIdStrategy + 'static) -> Self {
        self.feed_id_strategy_arc(Arc::new(strategy))
    }

    fn feed_id_strategy_arc(mut self, strategy: Arc<dyn FeedIdStrategy>) -> Self {
        self.config.feed_id_strategy = strategy;
        self
    }

    /// Replace the implementation config
    pub fn implementation_config(mut self, config: BTreeMap<String, String>) -> Self {
        self.config.implementation_config = config;
        self
    }

    /// Set one implementation config entry
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .implementation_config
            .insert(key.into(), value.into());
        self
    }

    /// Hide entities rejected by `filter` from every read
    pub fn result_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Entity) -> bool + Send + Sync + 'static,
    {
        self.config.result_filter = Some(Arc::new(filter));
        self
    }

    /// Finish
    pub fn build(self) -> Configuration {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> CanonicalPath {
        CanonicalPath::of_tenant("t")
    }

    #[test]
    fn test_accept_whatever_rejects_taken_id() {
        let strategy = AcceptWhateverFeedIdStrategy;
        let free = strategy
            .generate(&tenant(), &Blueprint::feed("f1"), &|_| Ok(false))
            .unwrap();
        assert_eq!(free, "f1");
        let err = strategy
            .generate(&tenant(), &Blueprint::feed("f1"), &|id| Ok(id == "f1"))
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_uuid_strategy_fills_empty_id() {
        let id = UuidFeedIdStrategy
            .generate(&tenant(), &Blueprint::feed(""), &|_| Ok(false))
            .unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        let kept = UuidFeedIdStrategy
            .generate(&tenant(), &Blueprint::feed("mine"), &|_| Ok(false))
            .unwrap();
        assert_eq!(kept, "mine");
    }

    #[test]
    fn test_from_toml_str() {
        let config = Configuration::from_toml_str(
            r#"
feed_id_strategy = "uuid"

[implementation]
"backend.name" = "memory"
"#,
        )
        .unwrap();
        assert_eq!(
            config.property("backend.name", None).as_deref(),
            Some("memory")
        );
        assert!(format!("{:?}", config.feed_id_strategy()).contains("Uuid"));
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = Configuration::from_toml_str("feed_id_strategy = \"random\"").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_property_env_fallback() {
        let config = Configuration::builder().property("a", "1").build();
        assert_eq!(config.property("a", Some("TRELLIS_TEST_UNSET_VAR")).as_deref(), Some("1"));
        std::env::set_var("TRELLIS_TEST_CONFIG_FALLBACK", "from-env");
        assert_eq!(
            config
                .property("b", Some("TRELLIS_TEST_CONFIG_FALLBACK"))
                .as_deref(),
            Some("from-env")
        );
        assert_eq!(config.property("b", None), None);
    }

    #[test]
    fn test_result_filter() {
        let config = Configuration::builder()
            .result_filter(|e| e.id() != "hidden")
            .build();
        let visible: Entity = trellis_core::Tenant::new(CanonicalPath::of_tenant("a")).into();
        let hidden: Entity = trellis_core::Tenant::new(CanonicalPath::of_tenant("hidden")).into();
        assert!(config.accepts(&visible));
        assert!(!config.accepts(&hidden));
    }
}
