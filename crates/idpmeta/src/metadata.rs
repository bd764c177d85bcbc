//! Metadata collaborator seam and per-fact candidate extraction.

use serde_json::Value;

use crate::text::LocalizedText;

/// Class discriminator carried by mdui:UIInfo extension elements in
/// parsed metadata records.
const MDUI_UIINFO_CLASS: &str = "urn:oasis:names:tc:SAML:metadata:ui&UIInfo";

/// A parsed federation metadata record for one entity.
///
/// The record is a generic nested mapping/sequence structure produced by
/// the metadata collaborator; this crate only reads it.
pub type MetadataRecord = Value;

/// The external metadata collaborator.
///
/// Implemented by whatever metadata repository the surrounding proxy
/// uses. All lookup failures are treated identically by the caller.
pub trait MetadataSource {
    /// Look up the metadata record published for the given entity.
    fn lookup(&self, entity_id: &str) -> anyhow::Result<MetadataRecord>;
}

/// Structural mismatch while extracting one fact from a metadata record.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// The record carries no SSO descriptor.
    #[error("no SSO descriptor present")]
    NoSsoDescriptor,

    /// The SSO descriptor carries no UIInfo extension element.
    #[error("no UIInfo extension element present")]
    NoUiInfo,

    /// The record carries no organization section.
    #[error("no organization section present")]
    NoOrganization,

    /// A candidate element sequence is missing or malformed.
    #[error("metadata element {0:?} is missing or malformed")]
    MalformedElements(&'static str),
}

/// Extract the mdui:DisplayName candidates from a metadata record.
///
/// Only the first IDPSSODescriptor is consulted; multi-descriptor
/// records are out of scope.
pub fn display_name_elements(record: &MetadataRecord) -> Result<Vec<LocalizedText>, ExtractError> {
    let descriptor = record
        .get("idpsso_descriptor")
        .and_then(Value::as_array)
        .and_then(|descriptors| descriptors.first())
        .ok_or(ExtractError::NoSsoDescriptor)?;

    let extensions = descriptor
        .get("extensions")
        .and_then(|extensions| extensions.get("extension_elements"))
        .and_then(Value::as_array)
        .ok_or(ExtractError::NoUiInfo)?;

    let ui_info = extensions
        .iter()
        .find(|element| element.get("__class__").and_then(Value::as_str) == Some(MDUI_UIINFO_CLASS))
        .ok_or(ExtractError::NoUiInfo)?;

    localized_elements(ui_info, "display_name")
}

/// Extract an organization candidate sequence from a metadata record.
///
/// `element` is `"organization_name"` or `"organization_display_name"`.
pub fn organization_elements(
    record: &MetadataRecord,
    element: &'static str,
) -> Result<Vec<LocalizedText>, ExtractError> {
    let organization = record
        .get("organization")
        .ok_or(ExtractError::NoOrganization)?;

    localized_elements(organization, element)
}

fn localized_elements(
    container: &Value,
    key: &'static str,
) -> Result<Vec<LocalizedText>, ExtractError> {
    let elements = container
        .get(key)
        .and_then(Value::as_array)
        .ok_or(ExtractError::MalformedElements(key))?;

    elements
        .iter()
        .map(|element| {
            serde_json::from_value(element.clone())
                .map_err(|_| ExtractError::MalformedElements(key))
        })
        .collect()
}
