//! Configuration management for doblock using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::extraction::{DEFAULT_CROP_FRACTION, DEFAULT_RENDER_DPI};

/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "DOBLOCK_OUTPUT_DIR";
/// Environment variable overriding the qpdf binary.
pub const QPDF_ENV: &str = "DOBLOCK_QPDF";

/// External tool locations. Bare names are looked up on `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftotext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftoppm: Option<String>,
    /// When unset, a bundled qpdf next to the executable is tried first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qpdf: Option<String>,
}

/// Header screenshot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Render resolution in DPI.
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Fraction of the page height kept from the top.
    #[serde(default = "default_crop_fraction")]
    pub crop_fraction: f32,
}

fn default_dpi() -> u32 {
    DEFAULT_RENDER_DPI
}

fn default_crop_fraction() -> f32 {
    DEFAULT_CROP_FRACTION
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            crop_fraction: default_crop_fraction(),
        }
    }
}

impl RenderConfig {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory encrypted copies are written to. Unset means next to each input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default, skip_serializing_if = "RenderConfig::is_default")]
    pub render: RenderConfig,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers doblock config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("doblock").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let fraction = self.render.crop_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(format!(
                "render.crop_fraction must be in (0, 1], got {}",
                fraction
            ));
        }
        if self.render.dpi == 0 {
            return Err("render.dpi must be positive".to_string());
        }
        Ok(())
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Resolve a tool setting. Bare names stay bare so they go through `PATH`.
    fn resolve_tool(&self, value: &str, base_dir: &Path) -> PathBuf {
        if value.contains(['/', '\\']) || value.starts_with('~') {
            self.resolve_path(value, base_dir)
        } else {
            PathBuf::from(value)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref dir) = self.output_dir {
            settings.output_dir = Some(self.resolve_path(dir, base_dir));
        }
        if let Some(ref tool) = self.tools.pdftotext {
            settings.pdftotext = self.resolve_tool(tool, base_dir);
        }
        if let Some(ref tool) = self.tools.pdftoppm {
            settings.pdftoppm = self.resolve_tool(tool, base_dir);
        }
        if let Some(ref tool) = self.tools.qpdf {
            settings.qpdf = Some(self.resolve_tool(tool, base_dir));
        }
        settings.render_dpi = self.render.dpi;
        settings.crop_fraction = self.render.crop_fraction;
    }
}

/// Resolved runtime settings handed to services.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Custom output directory; `None` writes next to each input.
    pub output_dir: Option<PathBuf>,
    pub pdftotext: PathBuf,
    pub pdftoppm: PathBuf,
    /// Explicit qpdf binary; `None` means discover it.
    pub qpdf: Option<PathBuf>,
    pub render_dpi: u32,
    pub crop_fraction: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: None,
            pdftotext: PathBuf::from("pdftotext"),
            pdftoppm: PathBuf::from("pdftoppm"),
            qpdf: None,
            render_dpi: DEFAULT_RENDER_DPI,
            crop_fraction: DEFAULT_CROP_FRACTION,
        }
    }
}

impl Settings {
    /// Apply environment overrides using `lookup` to read variables.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(OUTPUT_DIR_ENV).filter(|s| !s.is_empty()) {
            tracing::debug!("Using {} from environment: {}", OUTPUT_DIR_ENV, dir);
            self.output_dir = Some(PathBuf::from(shellexpand::tilde(&dir).as_ref()));
        }
        if let Some(qpdf) = lookup(QPDF_ENV).filter(|s| !s.is_empty()) {
            tracing::debug!("Using {} from environment: {}", QPDF_ENV, qpdf);
            self.qpdf = Some(PathBuf::from(shellexpand::tilde(&qpdf).as_ref()));
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Output directory from the command line. Beats config and environment.
    pub output_dir: Option<PathBuf>,
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions) -> Result<Config, String> {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path).await;
    }

    // Priority 2: Auto-discover via prefer
    Ok(Config::load().await)
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Build settings from a loaded config, the environment and CLI options.
fn resolve_settings(
    config: &Config,
    options: &LoadOptions,
    lookup: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    let base_dir = config.base_dir().unwrap_or_else(current_dir);
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env_overrides(lookup);

    // --output-dir takes highest precedence
    if let Some(ref dir) = options.output_dir {
        settings.output_dir = Some(dir.clone());
    }

    settings
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple. An explicit config path that cannot be
/// loaded is an error; a broken auto-discovered file is ignored.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), String> {
    let config = load_file_config(&options).await?;
    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let settings = resolve_settings(&config, &options, |key| std::env::var(key).ok());
    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::parse(
            r#"
output_dir = "protected"

[tools]
qpdf = "/opt/qpdf/bin/qpdf"

[render]
dpi = 200
"#,
            Path::new("doblock.toml"),
        )
        .unwrap();
        assert_eq!(config.output_dir.as_deref(), Some("protected"));
        assert_eq!(config.tools.qpdf.as_deref(), Some("/opt/qpdf/bin/qpdf"));
        assert_eq!(config.render.dpi, 200);
        assert_eq!(config.render.crop_fraction, DEFAULT_CROP_FRACTION);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = Config::parse(
            "tools:\n  pdftotext: /usr/local/bin/pdftotext\n",
            Path::new("doblock.yaml"),
        )
        .unwrap();
        assert_eq!(
            yaml.tools.pdftotext.as_deref(),
            Some("/usr/local/bin/pdftotext")
        );

        let json = Config::parse(r#"{"render": {"crop_fraction": 0.5}}"#, Path::new("cfg"))
            .unwrap();
        assert_eq!(json.render.crop_fraction, 0.5);
        assert_eq!(json.render.dpi, DEFAULT_RENDER_DPI);
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = Config::parse("not = [valid", Path::new("doblock.toml")).unwrap_err();
        assert!(err.starts_with("Failed to parse TOML config"));
    }

    #[test]
    fn test_validate_crop_fraction() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.render.crop_fraction = 0.0;
        assert!(config.validate().is_err());
        config.render.crop_fraction = 1.5;
        assert!(config.validate().is_err());
        config.render.crop_fraction = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_relative_to_config() {
        let config = Config {
            output_dir: Some("out".to_string()),
            tools: ToolsConfig {
                pdftotext: Some("pdftotext".to_string()),
                pdftoppm: Some("bin/pdftoppm".to_string()),
                qpdf: None,
            },
            source_path: Some(PathBuf::from("/etc/doblock/doblock.toml")),
            ..Default::default()
        };
        let settings = resolve_settings(&config, &LoadOptions::default(), no_env);
        assert_eq!(settings.output_dir, Some(PathBuf::from("/etc/doblock/out")));
        assert_eq!(settings.pdftotext, PathBuf::from("pdftotext"));
        assert_eq!(
            settings.pdftoppm,
            PathBuf::from("/etc/doblock/bin/pdftoppm")
        );
        assert_eq!(settings.qpdf, None);
    }

    #[test]
    fn test_precedence() {
        let config = Config {
            output_dir: Some("/from/config".to_string()),
            tools: ToolsConfig {
                qpdf: Some("/from/config/qpdf".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [
            (OUTPUT_DIR_ENV, "/from/env"),
            (QPDF_ENV, "/from/env/qpdf"),
        ]
        .into_iter()
        .collect();
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let settings = resolve_settings(&config, &LoadOptions::default(), lookup);
        assert_eq!(settings.output_dir, Some(PathBuf::from("/from/env")));
        assert_eq!(settings.qpdf, Some(PathBuf::from("/from/env/qpdf")));

        let options = LoadOptions {
            output_dir: Some(PathBuf::from("/from/cli")),
            ..Default::default()
        };
        let settings = resolve_settings(&config, &options, lookup);
        assert_eq!(settings.output_dir, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn test_defaults() {
        let settings = resolve_settings(&Config::default(), &LoadOptions::default(), no_env);
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doblock.toml");
        tokio::fs::write(&path, "output_dir = \"~/protected\"\n")
            .await
            .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_explicit_config_missing_is_error() {
        let options = LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/doblock.toml")),
            ..Default::default()
        };
        assert!(load_settings_with_options(options).await.is_err());
    }
}
