//! Loader for extractor configuration with YAML + environment overlays.
//!
//! Every field has a default, so an empty source set yields the stock
//! Luogu/lentille settings. Files are merged in the order they are added and
//! `LUOGU__<FIELD>` environment variables win over all of them. String values
//! may reference `${VAR}` placeholders, which are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use luogu_common::DEFAULT_SERVICE_LABEL;
use luogu_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "LUOGU";

/// Knobs for the response classifier and the embedded payload extractor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Label carried by every `StructureError`.
    pub service_label: String,
    /// Id prefix shared by the context marker and the state partitions.
    pub namespace: String,
    /// Key inside `data` holding the active state partition index.
    pub state_index_key: String,
    /// Selector tried after the state partitions.
    pub generic_fallback_selector: String,
    /// How many JSON-in-string decode hops a judgement payload may take.
    pub max_decode_depth: usize,
    /// Character cap for structures dumped into diagnostics.
    pub snippet_limit: usize,
    pub logging: LoggingConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            service_label: DEFAULT_SERVICE_LABEL.to_string(),
            namespace: "lentille".to_string(),
            state_index_key: ":".to_string(),
            generic_fallback_selector: r#"script[type="application/json"]"#.to_string(),
            max_decode_depth: 2,
            snippet_limit: 1000,
            logging: LoggingConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Id of the element hosting the hydration payload, e.g. `lentille-context`.
    pub fn context_marker_id(&self) -> String {
        format!("{}-context", self.namespace)
    }

    /// Selectors for a numbered state partition, state before data.
    pub fn state_selectors(&self, index: &str) -> [String; 2] {
        [
            format!("#{}-state-{}", self.namespace, index),
            format!("#{}-data-{}", self.namespace, index),
        ]
    }
}

/// Logging section consumed by binaries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
    pub dir: Option<PathBuf>,
    pub emit_stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".to_string(),
            dir: None,
            emit_stderr: false,
        }
    }
}

/// `<config_dir>/luogu/luogu.yaml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("luogu").join("luogu.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ExtractorConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ExtractorConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorConfigLoader {
    /// Start from defaults; `LUOGU__` env overrides are applied at load time.
    ///
    /// ```
    /// use luogu_config::ExtractorConfigLoader;
    ///
    /// let config = ExtractorConfigLoader::new()
    ///     .with_yaml_str("namespace: island\nmax_decode_depth: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.context_marker_id(), "island-context");
    /// assert_eq!(config.max_decode_depth, 3);
    /// assert_eq!(config.service_label, "Luogu API");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge every source and deserialize into [`ExtractorConfig`].
    ///
    /// ```
    /// use luogu_config::ExtractorConfigLoader;
    ///
    /// unsafe { std::env::set_var("LUOGU_DOC_LABEL", "Luogu mirror"); }
    ///
    /// let config = ExtractorConfigLoader::new()
    ///     .with_yaml_str("service_label: \"${LUOGU_DOC_LABEL}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.service_label, "Luogu mirror");
    ///
    /// unsafe { std::env::remove_var("LUOGU_DOC_LABEL"); }
    /// ```
    pub fn load(self) -> Result<ExtractorConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
