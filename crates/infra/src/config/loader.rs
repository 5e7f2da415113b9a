//! Configuration loader
//!
//! Loads application configuration from a file and environment variables.
//!
//! ## Loading Strategy
//! 1. Read the file named by `SUITELINK_CONFIG`, or the first probed path
//! 2. Start from defaults when no file exists
//! 3. Overlay `SUITELINK_*` environment variables
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `SUITELINK_DATABASE_PATH`, `SUITELINK_DB_POOL_SIZE`
//! - `SUITELINK_ACCOUNTS_URL`, `SUITELINK_CLIENT_ID`, `SUITELINK_CLIENT_SECRET`,
//!   `SUITELINK_REDIRECT_URI`, `SUITELINK_ORGANIZATION_ID`
//! - `SUITELINK_STATIC_ACCESS_TOKEN`: deployment token used when no stored
//!   token resolves
//! - `SUITELINK_<SERVICE>_URL`: base URL of a sub-service, e.g.
//!   `SUITELINK_INVENTORY_URL`
//! - `SUITELINK_MIN_INTERVAL_MS`, `SUITELINK_REQUEST_TIMEOUT_SECS`
//! - `SUITELINK_LOG_FILTER`, `SUITELINK_LOG_JSON`
//!
//! ## File Locations
//! The loader probes `suitelink.toml`, `suitelink.json` and
//! `config/suitelink.toml` in the current working directory, then next to
//! the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use suitelink_domain::{Config, Result, SuiteLinkError};

const CONFIG_ENV: &str = "SUITELINK_CONFIG";
const CANDIDATES: &[&str] = &["suitelink.toml", "suitelink.json", "config/suitelink.toml"];

/// Load, overlay and validate configuration.
///
/// # Errors
/// Returns `SuiteLinkError::Config` if an explicitly named file is missing,
/// a file cannot be parsed, an environment value is malformed, or the final
/// configuration fails validation.
pub fn load() -> Result<Config> {
    load_with(None)
}

/// As [`load`], with `explicit` taking precedence over `SUITELINK_CONFIG`.
///
/// # Errors
/// See [`load`].
pub fn load_with(explicit: Option<&Path>) -> Result<Config> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::info!("No config file found, starting from defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a TOML or JSON file.
///
/// # Errors
/// Returns `SuiteLinkError::Config` if the file is missing or invalid.
pub fn load_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(SuiteLinkError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| SuiteLinkError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse configuration from string content, choosing the format by
/// extension (`.toml` or `.json`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SuiteLinkError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SuiteLinkError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SuiteLinkError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| CANDIDATES.iter().map(move |candidate| root.join(candidate)))
        .find(|path| path.exists())
}

/// Overlay `SUITELINK_*` variables read through `lookup`.
///
/// # Errors
/// Returns `SuiteLinkError::Config` for values that fail to parse.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let text = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(path) = text("SUITELINK_DATABASE_PATH") {
        config.database.path = path;
    }
    if let Some(size) = text("SUITELINK_DB_POOL_SIZE") {
        config.database.pool_size = parse("SUITELINK_DB_POOL_SIZE", &size)?;
    }

    if let Some(url) = text("SUITELINK_ACCOUNTS_URL") {
        config.vendor.accounts_url = url;
    }
    if let Some(id) = text("SUITELINK_CLIENT_ID") {
        config.vendor.client_id = id;
    }
    if let Some(secret) = text("SUITELINK_CLIENT_SECRET") {
        config.vendor.client_secret = secret;
    }
    if let Some(uri) = text("SUITELINK_REDIRECT_URI") {
        config.vendor.redirect_uri = Some(uri);
    }
    if let Some(org) = text("SUITELINK_ORGANIZATION_ID") {
        config.vendor.organization_id = Some(org);
    }
    if let Some(token) = text("SUITELINK_STATIC_ACCESS_TOKEN") {
        config.vendor.static_access_token = Some(token);
    }
    for service in ["inventory", "books", "crm", "desk"] {
        let key = format!("SUITELINK_{}_URL", service.to_ascii_uppercase());
        if let Some(url) = text(&key) {
            config.vendor.services.insert(service.to_string(), url);
        }
    }

    if let Some(interval) = text("SUITELINK_MIN_INTERVAL_MS") {
        config.gateway.min_interval_ms = parse("SUITELINK_MIN_INTERVAL_MS", &interval)?;
    }
    if let Some(timeout) = text("SUITELINK_REQUEST_TIMEOUT_SECS") {
        config.gateway.request_timeout_secs = parse("SUITELINK_REQUEST_TIMEOUT_SECS", &timeout)?;
    }

    if let Some(filter) = text("SUITELINK_LOG_FILTER") {
        config.logging.filter = filter;
    }
    if let Some(json) = text("SUITELINK_LOG_JSON") {
        config.logging.json = matches!(json.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }

    Ok(())
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| SuiteLinkError::Config(format!("Invalid {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suitelink.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[reorder]\nlook_back_days = 30.0\n\n[vendor]\norganization_id = \"600\"\n\n[vendor.services]\ninventory = \"http://localhost:9000/inventory/v1\""
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert!((config.reorder.look_back_days - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.vendor.organization_id.as_deref(), Some("600"));
        assert_eq!(config.vendor.service_url("inventory"), Some("http://localhost:9000/inventory/v1"));
        assert_eq!(config.gateway.min_interval_ms, 1000);
    }

    #[test]
    fn json_files_are_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suitelink.json");
        std::fs::write(&path, r#"{"database": {"path": "/tmp/x.db"}}"#).unwrap();
        assert_eq!(load_from_file(&path).unwrap().database.path, "/tmp/x.db");
    }

    #[test]
    fn invalid_files_are_config_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "reorder = [").unwrap();
        assert!(matches!(load_from_file(&path), Err(SuiteLinkError::Config(_))));

        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, "a: 1").unwrap();
        assert!(matches!(load_from_file(&yaml), Err(SuiteLinkError::Config(_))));
        assert!(matches!(load_from_file(&dir.path().join("absent.toml")), Err(SuiteLinkError::Config(_))));
    }

    #[test]
    fn env_overrides_apply_on_top() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SUITELINK_CLIENT_ID", "cid"),
                ("SUITELINK_STATIC_ACCESS_TOKEN", "static"),
                ("SUITELINK_CRM_URL", "http://crm.local"),
                ("SUITELINK_MIN_INTERVAL_MS", "250"),
                ("SUITELINK_LOG_JSON", "true"),
                ("SUITELINK_DATABASE_PATH", "  "),
            ]),
        )
        .unwrap();

        assert_eq!(config.vendor.client_id, "cid");
        assert_eq!(config.vendor.static_access_token.as_deref(), Some("static"));
        assert_eq!(config.vendor.service_url("crm"), Some("http://crm.local"));
        assert_eq!(config.gateway.min_interval_ms, 250);
        assert!(config.logging.json);
        assert_eq!(config.database.path, "suitelink.db");
    }

    #[test]
    fn malformed_env_numbers_are_rejected() {
        let mut config = Config::default();
        let err = apply_env_overrides(&mut config, env(&[("SUITELINK_DB_POOL_SIZE", "many")])).unwrap_err();
        assert!(err.to_string().contains("SUITELINK_DB_POOL_SIZE"));
    }
}
