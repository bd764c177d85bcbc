use idpmeta::config::{ConfigError, ConfigTable, DEFAULT_KEY};
use indoc::indoc;
use serde_json::json;

const CONFIG: &str = indoc! {r#"
    [default.entity_id]
    internal_attribute_name = "idpentityid"

    [default.display_name]
    internal_attribute_name = "idpdisplayname"
    lang = "en"

    [default.organization_name]
    internal_attribute_name = "idporgname"
    lang = "en"

    ["https://login.myorg.edu/idp/shibboleth".display_name]
    internal_attribute_name = "othername"
    lang = "jp"

    ["https://login.other.org.edu/idp/shibboleth"]
    ignore = true
"#};

#[test]
fn unknown_idp_falls_back_to_default() {
    let table = ConfigTable::from_toml(CONFIG).unwrap();

    assert_eq!(
        table.resolve("https://unknown.example.org/idp"),
        table.resolve(DEFAULT_KEY),
    );
}

#[test]
fn override_is_a_shallow_merge() {
    let table = ConfigTable::from_toml(CONFIG).unwrap();
    let config = table.resolve("https://login.myorg.edu/idp/shibboleth");

    // The overridden fact block replaces the default wholesale.
    let display_name = config.display_name.as_ref().unwrap();
    assert_eq!(display_name.internal_attribute_name, "othername");
    assert_eq!(display_name.lang(), "jp");

    // Unset keys are inherited from the default.
    assert_eq!(
        config.entity_id.as_ref().unwrap().internal_attribute_name,
        "idpentityid"
    );
    assert_eq!(
        config
            .organization_name
            .as_ref()
            .unwrap()
            .internal_attribute_name,
        "idporgname"
    );
    assert!(!config.ignore);
}

#[test]
fn ignored_idp_still_inherits_facts() {
    let table = ConfigTable::from_toml(CONFIG).unwrap();
    let config = table.resolve("https://login.other.org.edu/idp/shibboleth");

    assert!(config.ignore);
    assert!(config.entity_id.is_some());
}

#[test]
fn empty_string_key_is_an_alias_for_default() {
    let table = ConfigTable::from_value(&json!({
        "": {
            "entity_id": { "internal_attribute_name": "idpentityid" },
        },
    }))
    .unwrap();

    let config = table.resolve("https://unknown.example.org/idp");
    assert_eq!(
        config.entity_id.as_ref().unwrap().internal_attribute_name,
        "idpentityid"
    );
}

#[test]
fn both_default_and_empty_string_keys_are_rejected() {
    let result = ConfigTable::from_value(&json!({
        "default": {},
        "": {},
    }));

    assert!(matches!(result, Err(ConfigError::AmbiguousDefault)));
}

#[test]
fn missing_default_is_rejected() {
    let result = ConfigTable::from_value(&json!({
        "https://login.myorg.edu/idp/shibboleth": { "ignore": true },
    }));

    assert!(matches!(result, Err(ConfigError::MissingDefault)));
}

#[test]
fn non_mapping_idp_block_is_rejected() {
    let result = ConfigTable::from_value(&json!({
        "default": {},
        "https://login.myorg.edu/idp/shibboleth": "ignore",
    }));

    assert!(matches!(
        result,
        Err(ConfigError::IdpBlockNotAMapping(idp)) if idp == "https://login.myorg.edu/idp/shibboleth"
    ));
}

#[test]
fn non_mapping_top_level_is_rejected() {
    let result = ConfigTable::from_value(&json!(["default"]));

    assert!(matches!(result, Err(ConfigError::NotAMapping)));
}

#[test]
fn empty_internal_attribute_name_is_rejected() {
    let result = ConfigTable::from_value(&json!({
        "default": {
            "display_name": { "internal_attribute_name": "" },
        },
    }));

    assert!(matches!(
        result,
        Err(ConfigError::EmptyAttributeName { fact: "display_name", .. })
    ));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let result = ConfigTable::from_value(&json!({
        "default": {
            "displayname": { "internal_attribute_name": "idpdisplayname" },
        },
    }));

    assert!(matches!(result, Err(ConfigError::InvalidBlock { .. })));
}
