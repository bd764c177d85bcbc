//! The assertion-enrichment pipeline step.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::config::{ConfigTable, FactConfig, IdpConfig};
use crate::metadata::{self, MetadataRecord, MetadataSource};
use crate::text::{select_text, LocalizedText};

/// The internal attribute bag carried by an assertion.
///
/// Internal attributes are multi-valued; this step writes single-element
/// values and never removes or overwrites unrelated keys.
pub type AttributeBag = HashMap<String, Vec<String>>;

/// The slice of per-request assertion state this step reads and writes.
#[derive(Clone, Debug, Default)]
pub struct AssertionData {
    /// The entityID of the IdP that issued the assertion, taken from the
    /// assertion's authentication info.
    pub issuer: Option<String>,

    /// The internal attributes forwarded to the requesting service.
    pub attributes: AttributeBag,
}

/// Pipeline step that enriches assertions with facts about the issuing
/// IdP, taken from its federation metadata.
///
/// Holds the configuration table resolved at startup; per-request state
/// is owned by the caller, so one instance serves concurrent requests.
pub struct IdpMetadataAttributeStore {
    config: ConfigTable,
}

impl IdpMetadataAttributeStore {
    /// Construct the step from a resolved configuration table.
    pub fn new(config: ConfigTable) -> Self {
        info!("IdP metadata attribute store initialized");
        Self { config }
    }

    /// Process one assertion.
    ///
    /// Returns the assertion data unchanged or with additional
    /// attributes; failures below configuration level are logged and
    /// never abort the pipeline step.
    pub fn process(&self, mut data: AssertionData, source: &impl MetadataSource) -> AssertionData {
        let Some(entity_id) = data.issuer.clone() else {
            error!("unable to determine the entityID for the IdP issuer");
            return data;
        };
        info!(idp = %entity_id, "entityID for authenticating IdP");

        let config = self.config.resolve(&entity_id);
        debug!(idp = %entity_id, ?config, "using config");

        if config.ignore {
            info!(idp = %entity_id, "ignoring IdP");
            return data;
        }

        // The entityID fact needs no metadata lookup.
        if let Some(fact) = &config.entity_id {
            data.attributes
                .insert(fact.internal_attribute_name.clone(), vec![entity_id.clone()]);
        }

        if config.wants_metadata() {
            match source.lookup(&entity_id) {
                Ok(record) => {
                    apply_metadata_facts(&entity_id, config, &record, &mut data.attributes)
                }
                Err(err) => {
                    error!(idp = %entity_id, %err, "unable to retrieve metadata for IdP");
                }
            }
        }

        debug!(attributes = ?data.attributes, "returning attributes");
        data
    }
}

/// Apply the metadata-derived facts, each as an independent extraction
/// attempt so one malformed section never blocks the others.
fn apply_metadata_facts(
    entity_id: &str,
    config: &IdpConfig,
    record: &MetadataRecord,
    attributes: &mut AttributeBag,
) {
    if let Some(fact) = &config.display_name {
        match metadata::display_name_elements(record) {
            Ok(elements) => assign_fact(attributes, fact, &elements),
            Err(err) => {
                warn!(idp = %entity_id, %err, "unable to determine display name");
            }
        }
    }

    if let Some(fact) = &config.organization_name {
        match metadata::organization_elements(record, "organization_name") {
            Ok(elements) => assign_fact(attributes, fact, &elements),
            Err(err) => {
                warn!(idp = %entity_id, %err, "unable to determine organization name");
            }
        }
    }

    if let Some(fact) = &config.organization_display_name {
        match metadata::organization_elements(record, "organization_display_name") {
            Ok(elements) => assign_fact(attributes, fact, &elements),
            Err(err) => {
                warn!(idp = %entity_id, %err, "unable to determine organization display name");
            }
        }
    }
}

fn assign_fact(attributes: &mut AttributeBag, fact: &FactConfig, elements: &[LocalizedText]) {
    let value = select_text(elements, fact.lang());
    if value.is_empty() {
        return;
    }

    debug!(attribute = %fact.internal_attribute_name, value, "assigning metadata fact");
    attributes.insert(
        fact.internal_attribute_name.clone(),
        vec![value.to_string()],
    );
}
