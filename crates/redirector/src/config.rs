//! Configuration management for the redirector host.
//!
//! A configuration declares the runtime classes the host knows about, the
//! redirections to install and the probes to run against them:
//!
//! ```toml
//! [logging]
//! level = "info"
//! json_format = false
//!
//! [[classes]]
//! name = "com.example.Renderer"
//! kind = "interface"
//! methods = ["draw(I)V", "name()Ljava/lang/String;"]
//!
//! [[redirections]]
//! descriptor = "Lcom/example/Game;score()I"
//! action = "constant"
//! value = { int = 42 }
//!
//! [[probes]]
//! descriptor = "Lcom/example/Game;score()I"
//! ```

use redirection_system::{parse_method_descriptor, parse_type_descriptor, type_descriptor, ClassCatalog, TypeRef, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Runtime classes, in declaration order
    #[serde(default)]
    pub classes: Vec<ClassSettings>,
    /// Redirections installed before probing
    #[serde(default)]
    pub redirections: Vec<RuleSettings>,
    /// Calls and synthesis requests to run
    #[serde(default)]
    pub probes: Vec<ProbeSettings>,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKindSetting {
    Interface,
    Abstract,
    Concrete,
}

/// A runtime class description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSettings {
    /// Fully-qualified name, e.g. `com.example.Renderer`
    pub name: String,
    pub kind: ClassKindSetting,
    /// Methods as `name(params)ret`, e.g. `draw(I)V`
    #[serde(default)]
    pub methods: Vec<String>,
    /// Super-interfaces; each must be declared earlier
    #[serde(default)]
    pub extends: Vec<String>,
    /// Whether a zero-argument constructor is registered (concrete classes)
    #[serde(default)]
    pub constructible: bool,
}

impl ClassSettings {
    /// Full descriptor of one of this class's declared methods.
    pub fn method_descriptor(&self, method: &str) -> String {
        format!("{}{}", type_descriptor(&TypeRef::named(self.name.as_str())), method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Return `value`
    Constant,
    /// Return null
    Null,
    /// Return the zero value of the return type
    Default,
    /// Synthesize an object of the return type
    Synthesize,
    /// Run the call's original behavior
    Defer,
}

/// One redirection to install.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Method descriptor, e.g. `Lcom/example/Game;score()I`
    pub descriptor: String,
    pub action: RuleAction,
    /// Returned value for `constant`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConstantSetting>,
}

/// A literal value in configuration: `"null"`, `{ int = 42 }`,
/// `{ string = "text" }` and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstantSetting {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
}

impl ConstantSetting {
    pub fn to_value(&self) -> Value {
        match self {
            ConstantSetting::Null => Value::Null,
            ConstantSetting::Bool(value) => Value::Bool(*value),
            ConstantSetting::Int(value) => Value::Int(*value),
            ConstantSetting::Long(value) => Value::Long(*value),
            ConstantSetting::Double(value) => Value::Double(*value),
            ConstantSetting::String(value) => Value::from(value.as_str()),
        }
    }
}

/// A call or synthesis request to run against the configured registry.
///
/// Method descriptors are invoked; type descriptors are synthesized. When
/// the result is a proxy, `call` names a method to invoke on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSettings {
    pub descriptor: String,
    #[serde(default)]
    pub args: Vec<ConstantSetting>,
    /// Original behavior used when no redirection matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<ConstantSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,
    #[serde(default)]
    pub call_args: Vec<ConstantSetting>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingSettings::default(),
            classes: vec![
                ClassSettings {
                    name: "com.example.Renderer".to_string(),
                    kind: ClassKindSetting::Interface,
                    methods: vec!["draw(I)V".to_string(), "name()Ljava/lang/String;".to_string()],
                    extends: vec![],
                    constructible: false,
                },
                ClassSettings {
                    name: "com.example.Screen".to_string(),
                    kind: ClassKindSetting::Abstract,
                    methods: vec![],
                    extends: vec![],
                    constructible: false,
                },
            ],
            redirections: vec![
                RuleSettings {
                    descriptor: "Lcom/example/Game;score()I".to_string(),
                    action: RuleAction::Constant,
                    value: Some(ConstantSetting::Int(42)),
                },
                RuleSettings {
                    descriptor: "Lcom/example/Game;renderer()Lcom/example/Renderer;".to_string(),
                    action: RuleAction::Synthesize,
                    value: None,
                },
                RuleSettings {
                    descriptor: "Lcom/example/Renderer;name()Ljava/lang/String;".to_string(),
                    action: RuleAction::Constant,
                    value: Some(ConstantSetting::String("headless".to_string())),
                },
            ],
            probes: vec![
                ProbeSettings {
                    descriptor: "Lcom/example/Game;score()I".to_string(),
                    args: vec![],
                    fallback: Some(ConstantSetting::Int(0)),
                    call: None,
                    call_args: vec![],
                },
                ProbeSettings {
                    descriptor: "Lcom/example/Game;renderer()Lcom/example/Renderer;".to_string(),
                    args: vec![],
                    fallback: None,
                    call: Some("name".to_string()),
                    call_args: vec![],
                },
                ProbeSettings {
                    descriptor: "[[I".to_string(),
                    args: vec![],
                    fallback: None,
                    call: None,
                    call_args: vec![],
                },
                ProbeSettings {
                    descriptor: "Lcom/example/Screen;".to_string(),
                    args: vec![],
                    fallback: None,
                    call: None,
                    call_args: vec![],
                },
            ],
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration is written to
    /// `path` and returned.
    pub async fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        // Descriptor syntax does not depend on resolution.
        let catalog = ClassCatalog::new();
        let mut declared: HashSet<&str> = HashSet::new();
        let mut interfaces: HashSet<&str> = HashSet::new();

        for class in &self.classes {
            if class.name.trim().is_empty() {
                return Err("Class name cannot be empty".to_string());
            }
            if !declared.insert(class.name.as_str()) {
                return Err(format!("Class declared twice: {}", class.name));
            }
            for method in &class.methods {
                if parse_method_descriptor(&class.method_descriptor(method), &catalog).is_none() {
                    return Err(format!("Invalid method {method} on class {}", class.name));
                }
            }
            for parent in &class.extends {
                if !interfaces.contains(parent.as_str()) {
                    return Err(format!(
                        "Class {} extends {parent}, which is not an interface declared before it",
                        class.name
                    ));
                }
            }
            if class.constructible && class.kind != ClassKindSetting::Concrete {
                return Err(format!("Only concrete classes can be constructible: {}", class.name));
            }
            if class.kind == ClassKindSetting::Interface {
                interfaces.insert(class.name.as_str());
            }
        }

        for rule in &self.redirections {
            if parse_method_descriptor(&rule.descriptor, &catalog).is_none() {
                return Err(format!("Invalid method descriptor in redirection: {}", rule.descriptor));
            }
            match (rule.action, &rule.value) {
                (RuleAction::Constant, None) => {
                    return Err(format!("Constant redirection needs a value: {}", rule.descriptor));
                }
                (RuleAction::Constant, Some(_)) | (_, None) => {}
                (_, Some(_)) => {
                    return Err(format!(
                        "Only constant redirections take a value: {}",
                        rule.descriptor
                    ));
                }
            }
        }

        for probe in &self.probes {
            let is_method = parse_method_descriptor(&probe.descriptor, &catalog).is_some();
            if !is_method && parse_type_descriptor(&probe.descriptor, &catalog).is_none() {
                return Err(format!("Invalid descriptor in probe: {}", probe.descriptor));
            }
            if !is_method && (!probe.args.is_empty() || probe.fallback.is_some()) {
                return Err(format!(
                    "Type probes take no arguments or fallback: {}",
                    probe.descriptor
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use tokio::fs;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.classes.len(), 2);
        assert_eq!(config.redirections[0].value, Some(ConstantSetting::Int(42)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_constant_values() {
        assert_eq!(ConstantSetting::Null.to_value(), Value::Null);
        assert_eq!(ConstantSetting::Long(7).to_value(), Value::Long(7));
        assert_eq!(ConstantSetting::String("x".to_string()).to_value(), Value::from("x"));
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redirector.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        // The written default loads back unchanged.
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[logging]
level = "debug"
json_format = true

[[classes]]
name = "com.example.Listener"
kind = "interface"
methods = ["onEvent(I)V"]

[[classes]]
name = "com.example.Unit"
kind = "concrete"
constructible = true

[[redirections]]
descriptor = "Lcom/example/Game;label()Ljava/lang/String;"
action = "constant"
value = { string = "stub" }

[[redirections]]
descriptor = "Lcom/example/Game;owner()Lcom/example/Unit;"
action = "constant"
value = "null"

[[probes]]
descriptor = "Lcom/example/Game;level(I)I"
args = [{ int = 3 }]
fallback = { int = 1 }
"#;

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(&temp_file.path().to_path_buf())
            .await
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.classes[0].kind, ClassKindSetting::Interface);
        assert!(config.classes[1].constructible);
        assert_eq!(
            config.redirections[0].value,
            Some(ConstantSetting::String("stub".to_string()))
        );
        assert_eq!(config.redirections[1].value, Some(ConstantSetting::Null));
        assert_eq!(config.probes[0].args, vec![ConstantSetting::Int(3)]);
        assert_eq!(config.probes[0].fallback, Some(ConstantSetting::Int(1)));
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_kind() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(
            temp_file.path(),
            "[[classes]]\nname = \"a.B\"\nkind = \"enum\"\n",
        )
        .await
        .unwrap();

        assert!(AppConfig::load_from_file(&temp_file.path().to_path_buf())
            .await
            .is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.classes[0].methods.push("draw(".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.redirections[0].value = None;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.redirections[1].value = Some(ConstantSetting::Int(1));
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.redirections[0].descriptor = "Foo#bar(int)".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.probes[2].args.push(ConstantSetting::Int(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_class_ordering_validation() {
        let mut config = AppConfig::default();
        config.classes[1].extends.push("com.example.Renderer".to_string());
        assert!(config.validate().is_ok());

        config.classes[1].extends = vec!["com.example.Missing".to_string()];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.classes[1].constructible = true;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.classes.push(config.classes[0].clone());
        assert!(config.validate().is_err());
    }
}
