//! Lint filter document.
//!
//! The plugin gets a `.moodle-plugin-ci.yml` describing which files the lint
//! tools skip. Global exclusions live under `filter`; a tool with its own
//! exclusions gets a `filter-<tool>` section holding only its own values.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// File name the filter document is written to inside the plugin
pub const PLUGIN_CONFIG_FILE: &str = ".moodle-plugin-ci.yml";

/// Scope name for exclusions shared by every tool
pub const GLOBAL_SCOPE: &str = "filter";

/// Lint tools that read a per-tool filter section
pub const LINT_TOOLS: &[&str] = &[
    "phplint",
    "phpcpd",
    "phpmd",
    "codechecker",
    "phpdoc",
    "savepoints",
    "mustache",
    "grunt",
];

/// Which filter list a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    NotPaths,
    NotNames,
}

/// Exclusions for one scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_names: Option<Vec<String>>,
}

/// Scope name for a tool's own section, e.g. `filter-phplint`
pub fn tool_scope(tool: &str) -> String {
    format!("{}-{}", GLOBAL_SCOPE, tool)
}

/// Environment variable prefix for a tool, e.g. `PHPLINT`
pub fn tool_env_prefix(tool: &str) -> String {
    tool.replace('-', "").to_uppercase()
}

/// Ordered collection of filter sections, dumped as YAML.
///
/// Sections keep insertion order so `filter` always comes first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDumper {
    sections: Vec<(String, FilterSection)>,
}

impl ConfigDumper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one list of a section, creating the section on first use
    pub fn add_section(&mut self, scope: &str, key: FilterKey, values: Vec<String>) {
        let index = match self.sections.iter().position(|(name, _)| name == scope) {
            Some(index) => index,
            None => {
                self.sections.push((scope.to_string(), FilterSection::default()));
                self.sections.len() - 1
            }
        };
        let section = &mut self.sections[index].1;
        match key {
            FilterKey::NotPaths => section.not_paths = Some(values),
            FilterKey::NotNames => section.not_names = Some(values),
        }
    }

    pub fn section(&self, scope: &str) -> Option<&FilterSection> {
        self.sections
            .iter()
            .find(|(name, _)| name == scope)
            .map(|(_, section)| section)
    }

    /// Section names in document order
    pub fn scopes(&self) -> Vec<&str> {
        self.sections.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the document to `path`, replacing any existing file
    pub fn dump(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path, yaml)?;
        debug!(path = %path.display(), scopes = ?self.scopes(), "Wrote filter config");
        Ok(())
    }
}

impl Serialize for ConfigDumper {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (scope, section) in &self.sections {
            map.serialize_entry(scope, section)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_tool_naming() {
        assert_eq!(tool_scope("phplint"), "filter-phplint");
        assert_eq!(tool_env_prefix("phplint"), "PHPLINT");
        assert_eq!(tool_env_prefix("code-checker"), "CODECHECKER");
    }

    #[test]
    fn test_add_section_keeps_order_and_merges_keys() {
        let mut dumper = ConfigDumper::new();
        dumper.add_section("filter", FilterKey::NotPaths, vec!["a".into()]);
        dumper.add_section("filter-phpmd", FilterKey::NotNames, vec!["b.php".into()]);
        dumper.add_section("filter", FilterKey::NotNames, vec![]);

        assert_eq!(dumper.scopes(), vec!["filter", "filter-phpmd"]);
        let global = dumper.section("filter").unwrap();
        assert_eq!(global.not_paths, Some(vec!["a".to_string()]));
        assert_eq!(global.not_names, Some(vec![]));
        let tool = dumper.section("filter-phpmd").unwrap();
        assert_eq!(tool.not_paths, None);
    }

    #[test]
    fn test_yaml_omits_unset_keys() {
        let mut dumper = ConfigDumper::new();
        dumper.add_section("filter-grunt", FilterKey::NotNames, vec!["x.js".into()]);
        let yaml = dumper.to_yaml().unwrap();
        assert!(yaml.contains("notNames"));
        assert!(!yaml.contains("notPaths"));
    }

    #[test]
    fn test_dump_writes_parseable_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PLUGIN_CONFIG_FILE);

        let mut dumper = ConfigDumper::new();
        dumper.add_section("filter", FilterKey::NotPaths, vec!["global/path".into()]);
        dumper.dump(&path).unwrap();

        let parsed: BTreeMap<String, FilterSection> =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            parsed["filter"].not_paths,
            Some(vec!["global/path".to_string()])
        );
    }
}
