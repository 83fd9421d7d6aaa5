//! Configuration handling for tugstyle

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::RuleId;
use crate::error::ConfigError;

/// Name of the configuration file looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = "tugstyle.toml";

/// tugstyle configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StyleConfig {
    /// Naming policy settings
    #[serde(default)]
    pub naming: NamingConfig,

    /// Rule selection
    #[serde(default)]
    pub rules: RulesConfig,

    /// Workspace discovery settings
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

/// Naming policy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// Word separator of the `x_name` prefix convention
    #[serde(default = "default_separator")]
    pub separator: char,
}

/// Rule selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Rules to run, in order
    #[serde(default = "default_enabled_rules")]
    pub enabled: Vec<RuleId>,
}

/// Workspace discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Glob patterns (workspace-relative) of files to ignore
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_separator() -> char {
    '_'
}

fn default_enabled_rules() -> Vec<RuleId> {
    RuleId::ALL.to_vec()
}

fn default_exclude() -> Vec<String> {
    vec!["bin/**".to_string(), "obj/**".to_string()]
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_rules(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
        }
    }
}

impl StyleConfig {
    /// Parse configuration from TOML text. `origin` names the source in errors.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Load `tugstyle.toml` from the workspace root, or defaults if there is none
    pub fn load_from_workspace(workspace_root: &Path) -> Result<Self, ConfigError> {
        let config_path = workspace_root.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Whether `rule` is enabled.
    pub fn is_enabled(&self, rule: RuleId) -> bool {
        self.rules.enabled.contains(&rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StyleConfig::default();
        assert_eq!(config.naming.separator, '_');
        assert!(config.is_enabled(RuleId::MethodNaming));
        assert!(config.is_enabled(RuleId::StaticAccess));
        assert_eq!(config.workspace.exclude, vec!["bin/**", "obj/**"]);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = StyleConfig::from_toml_str(
            r#"
[naming]
separator = "-"

[rules]
enabled = ["static-access"]
"#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.naming.separator, '-');
        assert!(!config.is_enabled(RuleId::MethodNaming));
        assert!(config.is_enabled(RuleId::StaticAccess));
        assert_eq!(config.workspace, WorkspaceConfig::default());
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let err = StyleConfig::from_toml_str("[rules]\nenabled = [\"camel\"]\n", "tugstyle.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = StyleConfig::from_toml_str("[naming]\nseparator = \"__\"\n", "x").unwrap_err();
        assert!(err.to_string().starts_with("invalid config x:"));
    }

    #[test]
    fn test_load_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            StyleConfig::load_from_workspace(dir.path()).unwrap(),
            StyleConfig::default()
        );

        let mut file = fs::File::create(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        writeln!(file, "[workspace]\nexclude = [\"generated/**\"]").unwrap();
        let config = StyleConfig::load_from_workspace(dir.path()).unwrap();
        assert_eq!(config.workspace.exclude, vec!["generated/**"]);
        assert!(config.is_enabled(RuleId::MethodNaming));
    }
}
