// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! TOML configuration: server connection and session defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use crate::logic::transcode::SchemaFormat;

pub const APP_NAME: &str = "kbmeta";
pub const CONFIG_PATH_ENV: &str = "KBMETA_CONFIG_PATH";
pub const DEFAULT_BASE_URL: &str = "http://localhost:9380";
const DEFAULT_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub session: Session,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<String>,
    #[serde(default)]
    pub schema_format: SchemaFormat,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            api_key: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            schema_format: SchemaFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub legacy_document_meta: bool,
}

impl Config {
    /// `$KBMETA_CONFIG_PATH`, or `config.toml` under the platform config directory.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    /// Load and validate `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let config: Config =
            toml::from_str(&raw).with_context(|| format!("parse TOML config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.server.base_url {
            validate_base_url(base_url)
                .with_context(|| format!("server.base_url in {}", path.display()))?;
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("server.timeout in {}", path.display()))?;
            if parsed.is_zero() {
                bail!(
                    "server.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.server
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_key(&self) -> Option<&str> {
        self.server
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.server.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn schema_format(&self) -> SchemaFormat {
        self.server.schema_format
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.session
            .dataset_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn legacy_document_meta(&self) -> bool {
        self.session.legacy_document_meta
    }
}

/// Accept absolute `http`/`https` URLs only.
pub fn validate_base_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw.trim()).with_context(|| format!("invalid URL {raw:?}"))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        scheme => bail!("expected an http(s) URL with a host, got scheme {scheme:?} in {raw:?}"),
    }
}

/// Parse `<N>ms`, `<N>s` or `<N>m`.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .with_context(|| format!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;

        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.schema_format(), SchemaFormat::Array);
        assert!(config.api_key().is_none());
        assert!(config.dataset_id().is_none());
        assert!(!config.legacy_document_meta());
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "[server]\nbase_url = \"https://kb.example.org/\"\napi_key = \" secret \"\ntimeout = \"1500ms\"\nschema_format = \"json_schema\"\n[session]\ndataset_id = \"kb1\"\nlegacy_document_meta = true\n",
        )?;

        let config = Config::load(&path)?;

        assert_eq!(config.base_url(), "https://kb.example.org");
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.timeout()?, Duration::from_millis(1500));
        assert_eq!(config.schema_format(), SchemaFormat::JsonSchema);
        assert_eq!(config.dataset_id(), Some("kb1"));
        assert!(config.legacy_document_meta());
        Ok(())
    }

    #[test]
    fn partial_server_section_keeps_other_defaults() -> Result<()> {
        let (_temp, path) = write_config("[server]\napi_key = \"k\"\n")?;

        let config = Config::load(&path)?;

        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unknown_schema_format_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("[server]\nschema_format = \"yaml\"\n")?;
        assert!(Config::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn non_http_base_url_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("[server]\nbase_url = \"ftp://kb.example.org\"\n")?;
        let error = Config::load(&path).expect_err("ftp base url should fail");
        assert!(format!("{error:#}").contains("http(s)"));
        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("[server]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        assert!(parse_duration("soon").is_err());
        Ok(())
    }

    #[test]
    fn oversized_minute_timeout_is_rejected() {
        let raw = format!("{}m", u64::MAX);
        let err = parse_duration(&raw).map(|_| ()).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved?, override_path);
        Ok(())
    }
}
