//! Per-IdP configuration and the resolved lookup table.

use fnv::FnvHashMap;
use serde::Deserialize;
use tracing::debug;

/// The reserved configuration key holding the fallback configuration.
pub const DEFAULT_KEY: &str = "default";

/// The language tag used when a fact does not configure one.
pub const DEFAULT_LANG: &str = "en";

/// How one derived fact is exposed as an internal attribute.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FactConfig {
    /// The internal attribute name the fact value is assigned under.
    pub internal_attribute_name: String,

    /// Preferred language tag for language-tagged metadata elements.
    #[serde(default)]
    pub lang: Option<String>,
}

impl FactConfig {
    /// The configured language tag, or [DEFAULT_LANG].
    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANG)
    }
}

/// A raw per-IdP configuration block, before merging with the default.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIdpConfig {
    #[serde(default)]
    ignore: Option<bool>,

    #[serde(default)]
    entity_id: Option<FactConfig>,

    #[serde(default)]
    display_name: Option<FactConfig>,

    #[serde(default)]
    organization_name: Option<FactConfig>,

    #[serde(default)]
    organization_display_name: Option<FactConfig>,
}

/// The effective configuration for one IdP after merging.
///
/// Unset facts are inherited from the default block; fact blocks that are
/// set replace the inherited block wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdpConfig {
    /// Skip enrichment entirely for this IdP.
    pub ignore: bool,

    /// Expose the IdP's entityID.
    pub entity_id: Option<FactConfig>,

    /// Expose the IdP's mdui:DisplayName.
    pub display_name: Option<FactConfig>,

    /// Expose the IdP's OrganizationName.
    pub organization_name: Option<FactConfig>,

    /// Expose the IdP's OrganizationDisplayName.
    pub organization_display_name: Option<FactConfig>,
}

impl IdpConfig {
    /// Overlay a raw block on top of this configuration, key by key.
    fn overlay(&mut self, raw: &RawIdpConfig) {
        if let Some(ignore) = raw.ignore {
            self.ignore = ignore;
        }
        if raw.entity_id.is_some() {
            self.entity_id = raw.entity_id.clone();
        }
        if raw.display_name.is_some() {
            self.display_name = raw.display_name.clone();
        }
        if raw.organization_name.is_some() {
            self.organization_name = raw.organization_name.clone();
        }
        if raw.organization_display_name.is_some() {
            self.organization_display_name = raw.organization_display_name.clone();
        }
    }

    pub(crate) fn wants_metadata(&self) -> bool {
        self.display_name.is_some()
            || self.organization_name.is_some()
            || self.organization_display_name.is_some()
    }
}

/// Configuration errors. These are fatal: the step must not run with an
/// invalid configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The top-level configuration is not a mapping.
    #[error("configuration must be a mapping")]
    NotAMapping,

    /// A per-IdP configuration value is not a mapping.
    #[error("configuration value for {0:?} must be a mapping")]
    IdpBlockNotAMapping(String),

    /// Both `default` and the empty-string alias were supplied.
    #[error(r#"use either "default" or "" in the configuration but not both"#)]
    AmbiguousDefault,

    /// No default configuration block is present.
    #[error("no default configuration is present")]
    MissingDefault,

    /// A configured fact has an empty internal attribute name.
    #[error("{fact} for {idp:?} has an empty internal_attribute_name")]
    EmptyAttributeName {
        /// The IdP key carrying the invalid fact.
        idp: String,
        /// The fact key.
        fact: &'static str,
    },

    /// A per-IdP block does not match the configuration schema.
    #[error("invalid configuration block for {idp:?}: {source}")]
    InvalidBlock {
        /// The IdP key carrying the invalid block.
        idp: String,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },

    /// The configuration text is not valid TOML.
    #[error("configuration is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// The fully resolved per-IdP configuration table.
///
/// Built once at startup from the raw configuration mapping; read-only
/// afterwards, so concurrent requests may resolve against it freely.
#[derive(Debug)]
pub struct ConfigTable {
    idps: FnvHashMap<String, IdpConfig>,
}

impl ConfigTable {
    /// Build the table from a generic nested configuration mapping.
    ///
    /// Top-level keys are IdP entityIDs or the literal `default` (the
    /// empty string is accepted as an alias for `default`). The default
    /// block is resolved first; every other block then inherits from it.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let map = value.as_object().ok_or(ConfigError::NotAMapping)?;

        if map.contains_key(DEFAULT_KEY) && map.contains_key("") {
            return Err(ConfigError::AmbiguousDefault);
        }

        let normalized: Vec<(&str, &serde_json::Value)> = map
            .iter()
            .map(|(key, block)| {
                let key = if key.is_empty() { DEFAULT_KEY } else { key.as_str() };
                (key, block)
            })
            .collect();

        if !normalized.iter().any(|(key, _)| *key == DEFAULT_KEY) {
            return Err(ConfigError::MissingDefault);
        }

        let mut idps: FnvHashMap<String, IdpConfig> = FnvHashMap::default();

        // The default block first, then per-IdP overrides.
        let ordered = normalized
            .iter()
            .filter(|(key, _)| *key == DEFAULT_KEY)
            .chain(normalized.iter().filter(|(key, _)| *key != DEFAULT_KEY));

        for (key, block) in ordered {
            if !block.is_object() {
                return Err(ConfigError::IdpBlockNotAMapping(key.to_string()));
            }

            let raw: RawIdpConfig =
                serde_json::from_value((*block).clone()).map_err(|source| {
                    ConfigError::InvalidBlock {
                        idp: key.to_string(),
                        source,
                    }
                })?;
            validate_fact_names(key, &raw)?;

            let mut resolved = match idps.get(DEFAULT_KEY) {
                Some(default) if *key != DEFAULT_KEY => default.clone(),
                _ => IdpConfig::default(),
            };
            resolved.overlay(&raw);

            idps.insert(key.to_string(), resolved);
        }

        debug!(idps = idps.len(), "IdP configuration table resolved");

        Ok(Self { idps })
    }

    /// Build the table from TOML configuration text.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = toml::from_str(toml)?;
        Self::from_value(&value)
    }

    /// Resolve the effective configuration for an IdP.
    ///
    /// Falls back to the default entry for IdPs without an override, so
    /// this never fails.
    pub fn resolve(&self, entity_id: &str) -> &IdpConfig {
        self.idps
            .get(entity_id)
            .unwrap_or_else(|| &self.idps[DEFAULT_KEY])
    }
}

fn validate_fact_names(idp: &str, raw: &RawIdpConfig) -> Result<(), ConfigError> {
    let facts = [
        ("entity_id", &raw.entity_id),
        ("display_name", &raw.display_name),
        ("organization_name", &raw.organization_name),
        ("organization_display_name", &raw.organization_display_name),
    ];

    for (fact, config) in facts {
        if let Some(config) = config {
            if config.internal_attribute_name.is_empty() {
                return Err(ConfigError::EmptyAttributeName {
                    idp: idp.to_string(),
                    fact,
                });
            }
        }
    }

    Ok(())
}
