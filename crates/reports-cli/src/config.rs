// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging;

pub const APP_NAME: &str = "reports-assistant";
pub const CONFIG_PATH_ENV: &str = "REPORTS_CONFIG_PATH";
pub const BACKEND_URL_ENV: &str = "REPORTS_BACKEND_URL";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: &str = "120s";
const DEFAULT_HISTORY_LIMIT: i64 = 200;
const DEFAULT_LOG_LEVEL: &str = "warn";
const LOG_FILE_NAME: &str = "reports.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: Backend::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    /// Left unset by default so `REPORTS_BACKEND_URL` can fill it in.
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub show_welcome: Option<bool>,
    pub history_limit: Option<i64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            show_welcome: Some(true),
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` at the top and keep values under [backend], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.backend.base_url {
            reports_client::validate_base_url(base_url.trim())
                .with_context(|| format!("invalid [backend] in {}", path.display()))?;
        }

        if let Some(timeout) = &self.backend.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "backend.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(limit) = self.ui.history_limit
            && limit <= 0
        {
            bail!(
                "ui.history_limit in {} must be positive, got {}",
                path.display(),
                limit
            );
        }

        if let Some(level) = &self.log.level {
            logging::validate_level(level)
                .with_context(|| format!("invalid log.level in {}", path.display()))?;
        }

        if let Some(file) = &self.log.file
            && file.trim().is_empty()
        {
            bail!(
                "log.file in {} must not be empty; remove it to use the default",
                path.display()
            );
        }

        Ok(())
    }

    /// File value first, then `REPORTS_BACKEND_URL`, then the local default.
    pub fn backend_base_url(&self) -> String {
        let configured = self
            .backend
            .base_url
            .clone()
            .or_else(|| env::var(BACKEND_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty());
        configured
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim()
            .trim_end_matches('/')
            .to_owned()
    }

    pub fn backend_timeout(&self) -> Result<Duration> {
        parse_duration(self.backend.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn show_welcome(&self) -> bool {
        self.ui.show_welcome.unwrap_or(true)
    }

    pub fn history_limit(&self) -> usize {
        self.ui
            .history_limit
            .and_then(|limit| usize::try_from(limit).ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(reports_tui::DEFAULT_HISTORY_LIMIT)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let cache_root = dirs::cache_dir().ok_or_else(|| {
            anyhow!("cannot resolve cache directory; set [log] file to an absolute path")
        })?;
        Ok(cache_root.join(APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# reports-assistant config\n# Place this file at: {}\n\nversion = 1\n\n[backend]\n# Falls back to {BACKEND_URL_ENV}, then {DEFAULT_BASE_URL}\nbase_url = \"{DEFAULT_BASE_URL}\"\ntimeout = \"{DEFAULT_TIMEOUT}\"\n\n[ui]\nshow_welcome = true\nhistory_limit = {DEFAULT_HISTORY_LIMIT}\n\n[log]\n# REPORTS_LOG overrides this with a full filter, e.g. reports_client=debug\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# Optional. Default is the platform cache dir (for example ~/.cache/{APP_NAME}/{LOG_FILE_NAME})\n# file = \"/absolute/path/to/{LOG_FILE_NAME}\"\n",
            path.display(),
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
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
        return Ok(Duration::from_secs(mins.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 120s)")
}

#[cfg(test)]
mod tests {
    use super::{BACKEND_URL_ENV, CONFIG_PATH_ENV, Config, parse_duration};
    use anyhow::Result;
    use reports_testkit::write_temp_file;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        write_temp_file("config.toml", content)
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(BACKEND_URL_ENV);
        }
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.backend_base_url(), "http://localhost:8000");
        assert_eq!(config.backend_timeout()?, Duration::from_secs(120));
        assert!(config.show_welcome());
        assert_eq!(config.history_limit(), 200);
        assert_eq!(config.log_level(), "warn");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[backend]\nbase_url = \"http://localhost:8000\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[backend], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
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
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[backend]\nbase_url = \"https://reports.example.com/\"\ntimeout = \"30s\"\n[ui]\nshow_welcome = false\nhistory_limit = 50\n[log]\nlevel = \"reports_client=debug,info\"\nfile = \"/tmp/reports.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.backend_base_url(), "https://reports.example.com");
        assert_eq!(config.backend_timeout()?, Duration::from_secs(30));
        assert!(!config.show_welcome());
        assert_eq!(config.history_limit(), 50);
        assert_eq!(config.log_level(), "reports_client=debug,info");
        assert_eq!(config.log_file()?, PathBuf::from("/tmp/reports.log"));
        Ok(())
    }

    #[test]
    fn invalid_base_url_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[backend]\nbase_url = \"localhost:8000\"\n")?;
        let error = Config::load(&path).expect_err("scheme-less url should fail");
        let message = format!("{error:#}");
        assert!(message.contains("invalid [backend]"));
        assert!(message.contains("backend.base_url"));
        Ok(())
    }

    #[test]
    fn non_positive_values_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[backend]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));

        let (_temp, path) = write_config("version = 1\n[ui]\nhistory_limit = 0\n")?;
        let error = Config::load(&path).expect_err("zero history limit should fail");
        assert!(error.to_string().contains("ui.history_limit"));
        Ok(())
    }

    #[test]
    fn bad_log_settings_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"reports=loud\"\n")?;
        let error = Config::load(&path).expect_err("bad level should fail");
        assert!(error.to_string().contains("invalid log.level"));

        let (_temp, path) = write_config("version = 1\n[log]\nfile = \"  \"\n")?;
        let error = Config::load(&path).expect_err("blank file should fail");
        assert!(error.to_string().contains("log.file"));
        Ok(())
    }

    #[test]
    fn backend_url_env_applies_only_when_file_leaves_it_unset() -> Result<()> {
        let _guard = env_lock();
        let (_temp, unset) = write_config("version = 1\n")?;
        let (_temp2, explicit) =
            write_config("version = 1\n[backend]\nbase_url = \"http://from-file:8000\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(BACKEND_URL_ENV, "http://from-env:9000/");
        }
        let from_env = Config::load(&unset)?.backend_base_url();
        let from_file = Config::load(&explicit)?.backend_base_url();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(BACKEND_URL_ENV);
        }
        assert_eq!(from_env, "http://from-env:9000");
        assert_eq!(from_file, "http://from-file:8000");
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("reports-assistant/config.toml"));
        Ok(())
    }

    #[test]
    fn default_log_file_lives_under_app_cache_dir() -> Result<()> {
        let config = Config::default();
        let path = config.log_file()?;
        assert!(path.ends_with("reports-assistant/reports.log"));
        Ok(())
    }

    #[test]
    fn timeout_parses_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("120s")?, Duration::from_secs(120));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        assert!(error.to_string().contains("invalid"));
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[backend]"));
        assert!(example.contains("[ui]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.backend_base_url(), "http://localhost:8000");
        Ok(())
    }
}
