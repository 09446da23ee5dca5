use restyle_core::session::DEFAULT_MAX_SESSIONS;
use restyle_core::studio::{DEFAULT_MODEL, SamplingParams, StudioSettings};
use restyle_core::transcript::DEFAULT_TRANSCRIPT_LIMIT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_VERSION: u32 = 1;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory not found; set HOME or pass --config")]
    HomeMissing,
    #[error("config io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
}

impl ConfigPaths {
    pub fn from_home() -> Result<Self, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::HomeMissing)?;
        Ok(Self::from_base(PathBuf::from(home).join(".restyle")))
    }

    pub fn from_base(base_dir: PathBuf) -> Self {
        let config_path = base_dir.join("config.toml");
        Self {
            base_dir,
            config_path,
        }
    }

    /// Paths for an explicit `--config` file.
    pub fn from_file(config_path: PathBuf) -> Self {
        let base_dir = config_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            base_dir,
            config_path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub analysis: AnalysisConfig,
    pub generation: GenerationConfig,
    pub transcript: TranscriptConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            analysis: AnalysisConfig::default(),
            generation: GenerationConfig::default(),
            transcript: TranscriptConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Style profiles kept in memory; the least recently analyzed session is
    /// dropped beyond this.
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "groq".to_string(),
            base_url: String::new(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub transcript_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let params = SamplingParams::analysis();
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            transcript_limit: DEFAULT_TRANSCRIPT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let params = SamplingParams::generation();
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    pub languages: Vec<String>,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
        }
    }
}

impl Config {
    pub fn load_or_create(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        ensure_dirs(paths)?;
        if paths.config_path.exists() {
            let config = Self::load(paths)?;
            return Ok(config);
        }

        let config = Self::default();
        Self::write(paths, &config)?;
        Ok(config)
    }

    pub fn load(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        ensure_dirs(paths)?;
        let content = fs::read_to_string(&paths.config_path)?;
        let raw: toml::Value = toml::from_str(&content)?;
        let file_version = match raw.get("version") {
            None => 0,
            Some(value) => value
                .as_integer()
                .and_then(|version| u32::try_from(version).ok())
                .ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "version must be a non-negative integer (got {value})"
                    ))
                })?,
        };

        let mut config: Config = toml::from_str(&content)?;
        let mut migrated = false;

        if file_version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
            migrated = true;
        } else if file_version > CONFIG_VERSION {
            tracing::warn!(
                file_version,
                supported = CONFIG_VERSION,
                "config version is newer than supported; proceeding"
            );
        }

        warn_if_loose_permissions(&paths.config_path)?;

        if migrated {
            Self::write(paths, &config)?;
        }

        Ok(config)
    }

    pub fn write(paths: &ConfigPaths, config: &Config) -> Result<(), ConfigError> {
        ensure_dirs(paths)?;
        let content = toml::to_string_pretty(config)?;
        write_atomic(&paths.config_path, content.as_bytes())?;
        Ok(())
    }

    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        if !redacted.provider.api_key.trim().is_empty() {
            redacted.provider.api_key = "<redacted>".to_string();
        }
        redacted
    }

    /// Apply environment overrides. An empty value never overrides.
    ///
    /// `GROQ_API_KEY` / `OPENROUTER_API_KEY` only fill a key that is still
    /// empty after `RESTYLE_API_KEY`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let env = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(value) = env("RESTYLE_BIND") {
            self.server.bind = value;
        }
        if let Some(value) = env("RESTYLE_PROVIDER") {
            self.provider.name = value;
        }
        if let Some(value) = env("RESTYLE_BASE_URL") {
            self.provider.base_url = value;
        }
        if let Some(value) = env("RESTYLE_MODEL") {
            self.provider.model = value;
        }
        if let Some(value) = env("RESTYLE_API_KEY") {
            self.provider.api_key = value;
        }
        if self.provider.api_key.trim().is_empty() {
            let fallback = match self.provider.name.as_str() {
                "openrouter" => "OPENROUTER_API_KEY",
                _ => "GROQ_API_KEY",
            };
            if let Some(value) = env(fallback) {
                self.provider.api_key = value;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.bind must not be empty".into(),
            ));
        }
        if self.server.max_sessions == 0 {
            return Err(ConfigError::Validation(
                "server.max_sessions must be greater than 0".into(),
            ));
        }
        match self.provider.name.as_str() {
            "groq" | "openrouter" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "provider.name must be groq or openrouter (got {other})"
                )));
            }
        }
        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "provider.model must not be empty".into(),
            ));
        }
        validate_sampling(
            "analysis",
            self.analysis.temperature,
            self.analysis.top_p,
            self.analysis.max_tokens,
        )?;
        validate_sampling(
            "generation",
            self.generation.temperature,
            self.generation.top_p,
            self.generation.max_tokens,
        )?;
        if self.analysis.transcript_limit == 0 {
            return Err(ConfigError::Validation(
                "analysis.transcript_limit must be greater than 0".into(),
            ));
        }
        if self.transcript.languages.is_empty() {
            return Err(ConfigError::Validation(
                "transcript.languages must include at least one language".into(),
            ));
        }
        for language in &self.transcript.languages {
            if language.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "transcript.languages entries must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Validation for commands that talk to the provider.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        if self.provider.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "provider.api_key required for provider.name={} (or set RESTYLE_API_KEY)",
                self.provider.name
            )));
        }
        Ok(())
    }

    pub fn studio_settings(&self) -> StudioSettings {
        StudioSettings {
            model: self.provider.model.trim().to_string(),
            analysis: SamplingParams {
                temperature: self.analysis.temperature,
                top_p: self.analysis.top_p,
                max_tokens: self.analysis.max_tokens,
            },
            generation: SamplingParams {
                temperature: self.generation.temperature,
                top_p: self.generation.top_p,
                max_tokens: self.generation.max_tokens,
            },
            transcript_limit: self.analysis.transcript_limit,
        }
    }
}

fn validate_sampling(
    label: &str,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
) -> Result<(), ConfigError> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::Validation(format!(
            "{label}.temperature must be between 0 and 2"
        )));
    }
    if !(top_p > 0.0 && top_p <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "{label}.top_p must be in (0, 1]"
        )));
    }
    if max_tokens == 0 {
        return Err(ConfigError::Validation(format!(
            "{label}.max_tokens must be greater than 0"
        )));
    }
    Ok(())
}

fn ensure_dirs(paths: &ConfigPaths) -> Result<(), ConfigError> {
    fs::create_dir_all(&paths.base_dir)?;
    Ok(())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("config path missing parent directory"))?;
    let tmp_path = parent.join("config.toml.tmp");
    fs::write(&tmp_path, contents)?;
    set_strict_permissions(&tmp_path)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn set_strict_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perm)?;
    }
    Ok(())
}

fn warn_if_loose_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let metadata = fs::metadata(path)?;
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                "config file is group/world readable; set permissions to 0600"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_VERSION, Config, ConfigPaths};
    use std::collections::HashMap;
    use std::fs;

    #[test]
    fn load_or_create_writes_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("restyle");
        let paths = ConfigPaths::from_base(base);
        let config = Config::load_or_create(&paths).unwrap();

        assert!(paths.config_path.exists());
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.provider.name, "groq");
        assert_eq!(config.provider.model, "deepseek-r1-distill-llama-70b");
        assert_eq!(config.analysis.max_tokens, 500);
        assert_eq!(config.generation.max_tokens, 1000);
        assert_eq!(config.analysis.transcript_limit, 5000);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&paths.config_path)
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn load_updates_version_and_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::from_file(temp.path().join("custom.toml"));
        let content = r#"[provider]
name = "openrouter"
model = "deepseek/deepseek-r1"
"#;
        fs::write(&paths.config_path, content).unwrap();

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.provider.name, "openrouter");
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.transcript.languages, vec!["en".to_string()]);

        let updated = fs::read_to_string(&paths.config_path).unwrap();
        assert!(updated.contains("version = 1"));
        assert!(updated.contains("[generation]"));
    }

    #[test]
    fn load_rejects_out_of_range_version() {
        let temp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::from_file(temp.path().join("config.toml"));
        for version in ["-1", "4294967296", "\"one\""] {
            fs::write(&paths.config_path, format!("version = {version}\n")).unwrap();
            let err = Config::load(&paths).unwrap_err();
            assert!(
                err.to_string().contains("version must be a non-negative integer"),
                "version {version}: {err}"
            );
        }
    }

    #[test]
    fn load_migrates_missing_version() {
        let temp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::from_file(temp.path().join("config.toml"));
        fs::write(&paths.config_path, "[server]\nmax_sessions = 16\n").unwrap();
        let config = Config::load(&paths).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.server.max_sessions, 16);
    }

    #[test]
    fn redacted_hides_api_key() {
        let mut config = Config::default();
        config.provider.api_key = "secret".to_string();
        assert_eq!(config.redacted().provider.api_key, "<redacted>");
        assert_eq!(Config::default().redacted().provider.api_key, "");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.provider.name = "bad".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generation.top_p = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.transcript.languages.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.max_sessions = 0;
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn env_overrides_fill_provider_fields() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RESTYLE_MODEL", "llama-3.3-70b-versatile"),
            ("RESTYLE_BIND", " "),
            ("GROQ_API_KEY", "gsk_test"),
        ]);
        let mut config = Config::default();
        config.apply_overrides_from(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(config.provider.model, "llama-3.3-70b-versatile");
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.provider.api_key, "gsk_test");
    }

    #[test]
    fn explicit_key_wins_over_provider_env() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RESTYLE_API_KEY", "primary"),
            ("GROQ_API_KEY", "fallback"),
        ]);
        let mut config = Config::default();
        config.apply_overrides_from(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(config.provider.api_key, "primary");
        assert!(config.validate_credentials().is_ok());
        assert!(Config::default().validate_credentials().is_err());
    }

    #[test]
    fn studio_settings_follow_config() {
        let mut config = Config::default();
        config.analysis.transcript_limit = 1200;
        config.generation.max_tokens = 2048;
        let settings = config.studio_settings();
        assert_eq!(settings.transcript_limit, 1200);
        assert_eq!(settings.generation.max_tokens, 2048);
        assert_eq!(settings.analysis.max_tokens, 500);
    }
}
