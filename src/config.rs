use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Defaults read from flag files and merged under the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub fixture: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub perf: bool,
}

impl ConfigFlags {
    /// Merge `other` over `self`: options from `other` win, switches add up.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            host: other.host.clone().or_else(|| self.host.clone()),
            port: other.port.or(self.port),
            fixture: other.fixture.clone().or_else(|| self.fixture.clone()),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
            perf: self.perf || other.perf,
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("docnav").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("docnav")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("docnav").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("docnav").join("config");
        }
    }

    PathBuf::from(".docnavrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".docnavrc")
}

/// Read flags from `path`; a missing file yields the defaults.
///
/// # Errors
///
/// Fails if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` to `path`, one flag per line.
///
/// # Errors
///
/// Fails if the parent directory cannot be created or the file written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# docnav defaults (saved with --save)".to_string());
    if let Some(host) = &flags.host {
        lines.push(format!("--host {host}"));
    }
    if let Some(port) = flags.port {
        lines.push(format!("--port {port}"));
    }
    if let Some(fixture) = &flags.fixture {
        lines.push(format!("--fixture {}", fixture.display()));
    }
    if let Some(log_file) = &flags.log_file {
        lines.push(format!("--log-file {}", log_file.display()));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove the flag file at `path` if there is one.
///
/// # Errors
///
/// Fails if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list; anything else is skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        if name == "--perf" {
            flags.perf = true;
        } else if matches!(name, "--host" | "--port" | "--fixture" | "--log-file") {
            let value = match inline {
                Some(value) => Some(value),
                None => {
                    i += 1;
                    tokens.get(i).map(String::as_str)
                }
            };
            if let Some(value) = value {
                match name {
                    "--host" => flags.host = Some(value.to_string()),
                    "--port" => flags.port = value.parse().ok(),
                    "--fixture" => flags.fixture = Some(PathBuf::from(value)),
                    _ => flags.log_file = Some(PathBuf::from(value)),
                }
            }
        }
        i += 1;
    }
    flags
}
