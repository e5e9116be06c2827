//! TOML-backed mapping configuration.
//!
//! Two independent documents feed the registry: the site document
//! (page actions, global forwards, models, settings) and an optional
//! direct document (data actions only, no forwards). Parse failures,
//! including a non-integer `history_stack_size` or an unknown scope,
//! surface as [`DispatchError::ConfigParse`].

use std::path::Path;

use serde::Deserialize;

use crate::descriptor::{
    ActionDescriptor, DirectActionDescriptor, ForwardDescriptor, MappingRegistry, ModelDescriptor,
    ModelScope, DEFAULT_DIRECT_SUFFIX, DEFAULT_HISTORY_STACK_SIZE, DEFAULT_PAGE_SUFFIX,
};
use crate::error::{DispatchError, DispatchResult};

/// The site mapping document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteDocument {
    #[serde(default = "default_history_stack_size")]
    pub history_stack_size: usize,
    #[serde(default = "default_page_suffix")]
    pub page_suffix: String,
    #[serde(default = "default_direct_suffix")]
    pub direct_suffix: String,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
    #[serde(default)]
    pub global_forwards: Vec<ForwardEntry>,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub type_key: String,
    #[serde(default)]
    pub forwards: Vec<ForwardEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardEntry {
    pub name: String,
    /// Empty for back-to-caller and custom-URL forwards.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub redirect: bool,
    #[serde(default)]
    pub back_to_caller: bool,
    #[serde(default)]
    pub avoid_history_save: bool,
    #[serde(default)]
    pub custom_url: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_key: String,
    pub scope: ModelScope,
}

/// The direct-action document. Deliberately minimal: direct actions have
/// no forwards, the handler writes its own payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectDocument {
    #[serde(default)]
    pub actions: Vec<DirectActionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectActionEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub type_key: String,
}

fn default_history_stack_size() -> usize {
    DEFAULT_HISTORY_STACK_SIZE
}

fn default_page_suffix() -> String {
    DEFAULT_PAGE_SUFFIX.to_string()
}

fn default_direct_suffix() -> String {
    DEFAULT_DIRECT_SUFFIX.to_string()
}

/// Parse the site document from TOML text.
pub fn parse_site(text: &str) -> DispatchResult<SiteDocument> {
    toml::from_str(text).map_err(|e| DispatchError::ConfigParse {
        detail: e.to_string(),
    })
}

/// Parse the direct document from TOML text.
pub fn parse_direct(text: &str) -> DispatchResult<DirectDocument> {
    toml::from_str(text).map_err(|e| DispatchError::ConfigParse {
        detail: e.to_string(),
    })
}

fn read_file(path: &Path) -> DispatchResult<String> {
    std::fs::read_to_string(path).map_err(|e| DispatchError::ConfigIo {
        path: path.display().to_string(),
        source: e,
    })
}

/// Build a registry from TOML text. Entries are applied in document
/// order, so a repeated path or name is last-wins.
pub fn mappings_from_toml(site: &str, direct: Option<&str>) -> DispatchResult<MappingRegistry> {
    let site = parse_site(site)?;
    let direct = direct.map(parse_direct).transpose()?;
    Ok(build_registry(site, direct))
}

/// Build a registry from files on disk.
pub fn load_mappings(site: &Path, direct: Option<&Path>) -> DispatchResult<MappingRegistry> {
    let site_text = read_file(site)?;
    let direct_text = direct.map(read_file).transpose()?;
    mappings_from_toml(&site_text, direct_text.as_deref())
}

fn build_registry(site: SiteDocument, direct: Option<DirectDocument>) -> MappingRegistry {
    let mut registry = MappingRegistry::new();
    registry.set_history_stack_size(site.history_stack_size);
    registry.set_suffixes(site.page_suffix, site.direct_suffix);

    for entry in site.actions {
        let mut action = ActionDescriptor::new(entry.path, entry.type_key);
        for fwd in entry.forwards {
            action.add_forward(forward_from_entry(fwd));
        }
        registry.add_action(action);
    }
    for fwd in site.global_forwards {
        registry.add_global_forward(forward_from_entry(fwd));
    }
    for model in site.models {
        registry.add_model(ModelDescriptor {
            name: model.name,
            type_key: model.type_key,
            scope: model.scope,
        });
    }
    if let Some(direct) = direct {
        for entry in direct.actions {
            registry.add_direct_action(DirectActionDescriptor {
                path: entry.path,
                type_key: entry.type_key,
            });
        }
    }
    registry
}

fn forward_from_entry(entry: ForwardEntry) -> ForwardDescriptor {
    ForwardDescriptor {
        name: entry.name,
        path: entry.path,
        redirect: entry.redirect,
        back_to_caller: entry.back_to_caller,
        avoid_history_save: entry.avoid_history_save,
        custom_url: entry.custom_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = r#"
        history_stack_size = 5

        [[actions]]
        path = "login"
        type = "LoginAction"

        [[actions.forwards]]
        name = "success"
        path = "/home.html"
        redirect = true

        [[actions.forwards]]
        name = "failure"
        path = "/login.html"

        [[global_forwards]]
        name = "error"
        path = "/error.html"

        [[models]]
        name = "person"
        type = "Person"
        scope = "session"
    "#;

    const DIRECT: &str = r#"
        [[actions]]
        path = "suggest"
        type = "SuggestAction"
    "#;

    #[test]
    fn full_document_round_trip() {
        let registry = mappings_from_toml(SITE, Some(DIRECT)).unwrap();

        assert_eq!(registry.history_stack_size(), 5);
        let login = registry.action("login").unwrap();
        assert_eq!(login.type_key, "LoginAction");
        assert!(login.forward("success").unwrap().redirect);
        assert!(!login.forward("failure").unwrap().redirect);
        assert_eq!(registry.global_forward("error").unwrap().path, "/error.html");
        assert_eq!(
            registry.model("person").unwrap().scope,
            ModelScope::Session
        );
        assert_eq!(registry.direct_action("suggest").unwrap().type_key, "SuggestAction");
    }

    #[test]
    fn settings_default_when_absent() {
        let registry = mappings_from_toml("", None).unwrap();
        assert_eq!(registry.history_stack_size(), DEFAULT_HISTORY_STACK_SIZE);
        assert_eq!(registry.page_suffix(), ".act");
        assert_eq!(registry.direct_suffix(), ".ajx");
        assert_eq!(registry.actions().count(), 0);
    }

    #[test]
    fn bad_history_stack_size_fails_parse() {
        let err = mappings_from_toml("history_stack_size = \"ten\"", None).unwrap_err();
        assert_eq!(err.code(), 1000);
    }

    #[test]
    fn unknown_scope_fails_parse() {
        let doc = r#"
            [[models]]
            name = "person"
            type = "Person"
            scope = "global"
        "#;
        let err = mappings_from_toml(doc, None).unwrap_err();
        assert_eq!(err.code(), 1000);
    }

    #[test]
    fn unknown_field_fails_parse() {
        let err = mappings_from_toml("history_depth = 3", None).unwrap_err();
        assert!(matches!(err, DispatchError::ConfigParse { .. }));
    }

    #[test]
    fn duplicate_action_is_last_wins() {
        let doc = r#"
            [[actions]]
            path = "login"
            type = "OldLogin"

            [[actions]]
            path = "login"
            type = "NewLogin"
        "#;
        let registry = mappings_from_toml(doc, None).unwrap();
        assert_eq!(registry.actions().count(), 1);
        assert_eq!(registry.action("login").unwrap().type_key, "NewLogin");
    }

    #[test]
    fn missing_file_is_config_io() {
        let err = load_mappings(Path::new("/nonexistent/signpost.toml"), None).unwrap_err();
        assert_eq!(err.code(), 1001);
    }
}
