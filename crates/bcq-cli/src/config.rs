//! CLI configuration loading and resolution.
//!
//! Profiles live in `~/.bcq/config.huml`; a `.bcq/config.huml` found in the
//! working directory (or any parent) can pin account, project and todolist
//! defaults for a checkout. Priority order: CLI flags > environment
//! variables > local file > profile > defaults.

use anyhow::{bail, Context, Result};
use bcq_core::BcqError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://3.basecampapi.com";

const LOCAL_CONFIG: &str = ".bcq/config.huml";

/// CLI configuration loaded from config.huml file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// Name of the default profile to use.
    pub default_profile: String,
    /// Map of profile name to profile configuration.
    pub profiles: HashMap<String, Profile>,
}

/// A named profile: one Basecamp account and its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todolist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Per-directory defaults. Never carries a base URL or credentials.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LocalConfig {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub todolist_id: Option<String>,
}

/// Where the API token came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Env,
    Profile(String),
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Env => write!(f, "BASECAMP_TOKEN"),
            TokenSource::Profile(name) => write!(f, "profile '{}'", name),
        }
    }
}

/// Resolved configuration after applying priority rules.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub account_id: Option<String>,
    pub project_id: Option<String>,
    pub todolist_id: Option<String>,
    pub token: Option<SecretString>,
    pub token_source: Option<TokenSource>,
    /// Profile the values were taken from, if any.
    pub profile: Option<String>,
    /// Every profile defined in the config file, sorted.
    pub profiles: Vec<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            account_id: None,
            project_id: None,
            todolist_id: None,
            token: None,
            token_source: None,
            profile: None,
            profiles: Vec::new(),
        }
    }
}

/// Command-line overrides fed into [`resolve_config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFlags<'a> {
    pub profile: Option<&'a str>,
    pub account: Option<&'a str>,
    pub base_url: Option<&'a str>,
}

/// Returns the default config file path (~/.bcq/config.huml).
pub fn default_config_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".bcq/config.huml"))
        .context("Could not determine home directory")
}

/// The config file in effect: `$BCQ_CONFIG` or the default path.
pub fn config_path() -> Result<PathBuf> {
    match std::env::var("BCQ_CONFIG") {
        Ok(p) if !p.is_empty() => Ok(PathBuf::from(p)),
        _ => default_config_path(),
    }
}

/// Load configuration from the config file.
///
/// Returns `Ok(None)` if the config file doesn't exist.
/// Returns an error if the file exists but is invalid.
pub fn load_config() -> Result<Option<CliConfig>> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(None);
    }

    let content =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let config: CliConfig = huml_rs::serde::from_str(&content)
        .with_context(|| format!("Invalid HUML in {}", path.display()))?;

    validate_config(&config)?;
    check_file_permissions(&path);

    Ok(Some(config))
}

/// Find `.bcq/config.huml` in `start` or its nearest ancestor.
pub fn find_local_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(LOCAL_CONFIG))
        .find(|candidate| candidate.is_file())
}

/// Load the per-directory config nearest to the working directory.
pub fn load_local_config() -> Result<Option<LocalConfig>> {
    let cwd = std::env::current_dir().context("Could not determine working directory")?;
    let Some(path) = find_local_config(&cwd) else {
        return Ok(None);
    };

    let content =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let local: LocalConfig = huml_rs::serde::from_str(&content)
        .with_context(|| format!("Invalid HUML in {}", path.display()))?;

    tracing::debug!(path = %path.display(), "loaded local config");
    Ok(Some(local))
}

/// Validate that the config has at least one profile and the default profile exists.
fn validate_config(config: &CliConfig) -> Result<()> {
    if config.profiles.is_empty() {
        bail!("Config file must contain at least one profile");
    }

    if !config.profiles.contains_key(&config.default_profile) {
        bail!(
            "Default profile '{}' not found in profiles",
            config.default_profile
        );
    }

    for (name, profile) in &config.profiles {
        if profile.base_url.as_deref().is_some_and(str::is_empty) {
            bail!("Profile '{}' has an empty base_url", name);
        }
    }

    Ok(())
}

/// Warn if config file has overly permissive permissions (on Unix).
#[cfg(unix)]
fn check_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode();
        // Group or others can read a file that may hold a token
        if mode & 0o077 != 0 {
            tracing::warn!(
                "{} has overly permissive permissions ({:o}). Consider running: chmod 600 {}",
                path.display(),
                mode & 0o777,
                path.display()
            );
        }
    }
}

#[cfg(not(unix))]
fn check_file_permissions(_path: &Path) {}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve configuration by applying priority rules.
///
/// Priority order (highest to lowest):
/// 1. CLI flags (`--account`, `--base-url`)
/// 2. Environment variables (`BASECAMP_TOKEN`, `BASECAMP_ACCOUNT_ID`, ...)
/// 3. Local `.bcq/config.huml`
/// 4. Config file profile
/// 5. Defaults (`https://3.basecampapi.com`)
pub fn resolve_config(
    flags: &ConfigFlags<'_>,
    file_config: Option<CliConfig>,
    local_config: Option<LocalConfig>,
) -> Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::default();
    let mut token: Option<String> = None;

    // Apply config file (lowest priority)
    if let Some(config) = file_config {
        resolved.profiles = config.profiles.keys().cloned().collect();
        resolved.profiles.sort();
        let profile_name = flags.profile.unwrap_or(&config.default_profile).to_string();
        if let Some(profile) = config.profiles.get(&profile_name) {
            if let Some(url) = &profile.base_url {
                resolved.base_url = url.clone();
            }
            resolved.account_id = profile.account_id.clone();
            resolved.project_id = profile.project_id.clone();
            resolved.todolist_id = profile.todolist_id.clone();
            if let Some(t) = &profile.token {
                token = Some(t.clone());
                resolved.token_source = Some(TokenSource::Profile(profile_name.clone()));
            }
            resolved.profile = Some(profile_name);
        } else if flags.profile.is_some() {
            bail!(
                "Profile '{}' not found. Run 'bcq profile list' to see available profiles.",
                profile_name
            );
        }
    } else if let Some(requested_profile) = flags.profile {
        if requested_profile != "default" {
            bail!(
                "Profile '{}' not found. No config file exists at {}.",
                requested_profile,
                config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "~/.bcq/config.huml".to_string())
            );
        }
    }

    // Per-directory defaults
    if let Some(local) = local_config {
        if local.account_id.is_some() {
            resolved.account_id = local.account_id;
        }
        if local.project_id.is_some() {
            resolved.project_id = local.project_id;
        }
        if local.todolist_id.is_some() {
            resolved.todolist_id = local.todolist_id;
        }
    }

    // Environment
    if let Some(t) = env_var("BASECAMP_TOKEN") {
        token = Some(t);
        resolved.token_source = Some(TokenSource::Env);
    }
    if let Some(v) = env_var("BASECAMP_ACCOUNT_ID") {
        resolved.account_id = Some(v);
    }
    if let Some(v) = env_var("BASECAMP_PROJECT_ID") {
        resolved.project_id = Some(v);
    }
    if let Some(v) = env_var("BASECAMP_TODOLIST_ID") {
        resolved.todolist_id = Some(v);
    }
    if let Some(v) = env_var("BASECAMP_BASE_URL") {
        resolved.base_url = v;
    }

    // CLI flags (highest priority)
    if let Some(a) = flags.account {
        resolved.account_id = Some(a.to_string());
    }
    if let Some(u) = flags.base_url {
        resolved.base_url = u.to_string();
    }

    resolved.token = token.map(SecretString::from);
    Ok(resolved)
}

/// Load the profile file and the per-directory file, then resolve them
/// against `flags`. A broken config file is a usage error.
pub fn load(flags: &ConfigFlags<'_>) -> bcq_core::Result<ResolvedConfig> {
    let usage = |e: anyhow::Error| {
        BcqError::usage_hint(format!("{:#}", e), "Fix the file or point BCQ_CONFIG elsewhere")
    };
    let file_config = load_config().map_err(usage)?;
    let local_config = load_local_config().map_err(usage)?;
    resolve_config(flags, file_config, local_config).map_err(|e| BcqError::usage(format!("{:#}", e)))
}

/// Mask a secret for display, keeping the last four characters.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const CLEAN_ENV: [(&str, Option<&str>); 5] = [
        ("BASECAMP_TOKEN", None),
        ("BASECAMP_ACCOUNT_ID", None),
        ("BASECAMP_PROJECT_ID", None),
        ("BASECAMP_TODOLIST_ID", None),
        ("BASECAMP_BASE_URL", None),
    ];

    fn profile(account: &str, token: Option<&str>) -> Profile {
        Profile {
            account_id: Some(account.to_string()),
            token: token.map(str::to_string),
            ..Default::default()
        }
    }

    fn config_with(profiles: Vec<(&str, Profile)>) -> CliConfig {
        CliConfig {
            default_profile: "default".to_string(),
            profiles: profiles
                .into_iter()
                .map(|(name, p)| (name.to_string(), p))
                .collect(),
        }
    }

    #[test]
    fn test_resolve_with_no_config() {
        temp_env::with_vars(CLEAN_ENV, || {
            let resolved = resolve_config(&ConfigFlags::default(), None, None).unwrap();
            assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
            assert!(resolved.account_id.is_none());
            assert!(resolved.token.is_none());
            assert!(resolved.token_source.is_none());
        });
    }

    #[test]
    fn test_resolve_with_config_file() {
        temp_env::with_vars(CLEAN_ENV, || {
            let config = config_with(vec![("default", profile("111", Some("file-token")))]);
            let resolved = resolve_config(&ConfigFlags::default(), Some(config), None).unwrap();
            assert_eq!(resolved.account_id.as_deref(), Some("111"));
            assert_eq!(resolved.token.unwrap().expose_secret(), "file-token");
            assert_eq!(
                resolved.token_source,
                Some(TokenSource::Profile("default".to_string()))
            );
        });
    }

    #[test]
    fn test_env_overrides_file_and_flags_override_env() {
        let vars = [
            ("BASECAMP_TOKEN", Some("env-token")),
            ("BASECAMP_ACCOUNT_ID", Some("222")),
            ("BASECAMP_PROJECT_ID", Some("77")),
            ("BASECAMP_TODOLIST_ID", None),
            ("BASECAMP_BASE_URL", None),
        ];
        temp_env::with_vars(vars, || {
            let config = config_with(vec![("default", profile("111", Some("file-token")))]);
            let flags = ConfigFlags {
                account: Some("333"),
                ..Default::default()
            };
            let resolved = resolve_config(&flags, Some(config), None).unwrap();
            assert_eq!(resolved.account_id.as_deref(), Some("333"));
            assert_eq!(resolved.project_id.as_deref(), Some("77"));
            assert_eq!(resolved.token.unwrap().expose_secret(), "env-token");
            assert_eq!(resolved.token_source, Some(TokenSource::Env));
        });
    }

    #[test]
    fn test_local_config_overrides_profile() {
        temp_env::with_vars(CLEAN_ENV, || {
            let mut p = profile("111", None);
            p.project_id = Some("1".to_string());
            let config = config_with(vec![("default", p)]);
            let local = LocalConfig {
                project_id: Some("2".to_string()),
                todolist_id: Some("3".to_string()),
                ..Default::default()
            };
            let resolved =
                resolve_config(&ConfigFlags::default(), Some(config), Some(local)).unwrap();
            assert_eq!(resolved.account_id.as_deref(), Some("111"));
            assert_eq!(resolved.project_id.as_deref(), Some("2"));
            assert_eq!(resolved.todolist_id.as_deref(), Some("3"));
        });
    }

    #[test]
    fn test_resolve_profile_selection() {
        temp_env::with_vars(CLEAN_ENV, || {
            let config = config_with(vec![
                ("default", profile("111", None)),
                ("work", profile("999", Some("work-token"))),
            ]);
            let flags = ConfigFlags {
                profile: Some("work"),
                ..Default::default()
            };
            let resolved = resolve_config(&flags, Some(config), None).unwrap();
            assert_eq!(resolved.account_id.as_deref(), Some("999"));
            assert_eq!(resolved.profile.as_deref(), Some("work"));
        });
    }

    #[test]
    fn test_resolve_nonexistent_profile_error() {
        temp_env::with_vars(CLEAN_ENV, || {
            let config = config_with(vec![("default", profile("111", None))]);
            let flags = ConfigFlags {
                profile: Some("nonexistent"),
                ..Default::default()
            };
            let result = resolve_config(&flags, Some(config), None);
            assert!(result.unwrap_err().to_string().contains("not found"));
        });
    }

    #[test]
    fn test_validate_empty_profiles() {
        let config = config_with(vec![]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_missing_default_profile() {
        let config = config_with(vec![("other", profile("1", None))]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_base_url() {
        let mut p = profile("1", None);
        p.base_url = Some(String::new());
        let config = config_with(vec![("default", p)]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_find_local_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".bcq")).unwrap();
        std::fs::write(dir.path().join(LOCAL_CONFIG), "project_id: \"42\"\n").unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_local_config(&nested).unwrap();
        assert_eq!(found, dir.path().join(LOCAL_CONFIG));
    }

    #[test]
    fn test_malformed_config_file_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.huml");
        std::fs::write(&path, "project_id: \"42\"\n").unwrap();
        let path = path.to_string_lossy().to_string();

        let mut vars: Vec<(&str, Option<&str>)> = CLEAN_ENV.to_vec();
        vars.push(("BCQ_CONFIG", Some(path.as_str())));
        temp_env::with_vars(vars, || {
            let flags = ConfigFlags {
                profile: Some("work"),
                ..Default::default()
            };
            let err = load(&flags).unwrap_err();
            assert_eq!(err.code(), bcq_core::ErrorCode::Usage);
            assert!(err.to_string().contains("Invalid HUML"));
            assert!(!err.to_string().contains("No config file"));
        });
    }

    #[test]
    fn test_missing_config_file_resolves_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.huml").to_string_lossy().to_string();

        let mut vars: Vec<(&str, Option<&str>)> = CLEAN_ENV.to_vec();
        vars.push(("BCQ_CONFIG", Some(path.as_str())));
        temp_env::with_vars(vars, || {
            let resolved = load(&ConfigFlags::default()).unwrap();
            assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
            assert!(resolved.profiles.is_empty());
        });
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(mask_token("abcdefghijkl"), "********ijkl");
    }
}
