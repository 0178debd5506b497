//! INI configuration with built-in defaults and `${section:key}` interpolation.
//!
//! # Lookup order
//!
//! ```text
//! --config <path>                                  (must exist)
//! ./rclone-ctl.ini
//! <config_dir>/rclone-ctl/rclone-ctl.ini
//! built-in defaults only                           (recorded as a diagnostic)
//! ```
//!
//! The user file is layered over [`DEFAULT_INI`] key by key, so a file that
//! only sets `rc_pass` keeps every other default.
//!
//! # Interpolation
//!
//! Values are interpolated when read, not when loaded: a broken reference
//! in a section nobody asks for never fails the invocation.
//!
//! - `${key}` — `key` in the same section
//! - `${section:key}` — `key` in `section`
//! - `$$` — a literal `$`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};

use crate::error::ConfigError;
use crate::types::{CTL_SECTION, LEGACY_SERVICE_PREFIX, RCLONE_SECTION, UNIT_PREFIX};

pub const CONFIG_FILE_NAME: &str = "rclone-ctl.ini";
pub const CONFIG_DIR_NAME: &str = "rclone-ctl";

/// Nested `${...}` references deeper than this are treated as a cycle.
pub const MAX_INTERPOLATION_DEPTH: usize = 10;

pub const DEFAULT_INI: &str = "\
[rclone]
exec_file = rclone
rc_addr = localhost:5572
rc_user = u-rclone-ctl
rc_pass = forty-two
cache_dir = /tmp/rclone-ctl

[rclone-ctl]
pid_file = ${rclone:cache_dir}/rclone-ctl.pid
";

type Sections = BTreeMap<String, BTreeMap<String, String>>;

// ---------------------------------------------------------------------------
// Access interface
// ---------------------------------------------------------------------------

/// Read-only access to resolved configuration values.
pub trait ConfigSource {
    /// Interpolated value of `[section] key`.
    fn get(&self, section: &str, key: &str) -> Result<String, ConfigError>;

    /// All section names, sorted.
    fn sections(&self) -> Vec<String>;

    /// All keys declared in `section`, sorted. Empty when the section is absent.
    fn keys(&self, section: &str) -> Vec<String>;

    fn has_section(&self, section: &str) -> bool {
        self.sections().iter().any(|s| s == section)
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Non-fatal findings produced while loading. Owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Config {
    path: Option<PathBuf>,
    sections: Sections,
}

impl Config {
    /// Load using the current directory and the platform config directory.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Diagnostics), ConfigError> {
        let cwd = std::env::current_dir().ok();
        let config_dir = dirs::config_dir();
        Self::load_at(explicit, cwd.as_deref(), config_dir.as_deref())
    }

    /// Load with explicit search roots. Tests use this with temporary directories.
    pub fn load_at(
        explicit: Option<&Path>,
        cwd: Option<&Path>,
        config_dir: Option<&Path>,
    ) -> Result<(Self, Diagnostics), ConfigError> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => Some(path.to_path_buf()),
            None => discover(cwd, config_dir),
        };

        let text = match &path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|source| {
                ConfigError::Io {
                    path: path.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let (mut config, mut diagnostics) = Self::from_layers(text.as_deref(), path.clone())?;
        match &path {
            Some(path) => tracing::debug!(path = %path.display(), "loaded configuration"),
            None => diagnostics.warn(format!(
                "no {CONFIG_FILE_NAME} found; using built-in defaults"
            )),
        }
        config.path = path;
        Ok((config, diagnostics))
    }

    /// Parse an INI document layered over the defaults.
    pub fn from_ini_str(text: &str) -> Result<(Self, Diagnostics), ConfigError> {
        Self::from_layers(Some(text), None)
    }

    /// The built-in defaults alone.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_layers(None, None).map(|(config, _)| config)
    }

    fn from_layers(
        user_ini: Option<&str>,
        path: Option<PathBuf>,
    ) -> Result<(Self, Diagnostics), ConfigError> {
        let mut sections = Sections::new();
        let mut diagnostics = Diagnostics::default();

        merge_layer(&mut sections, DEFAULT_INI, &mut diagnostics).map_err(|source| {
            ConfigError::Load { path: None, source }
        })?;
        if let Some(text) = user_ini {
            merge_layer(&mut sections, text, &mut diagnostics).map_err(|source| {
                ConfigError::Load {
                    path: path.clone(),
                    source,
                }
            })?;
        }

        for name in sections.keys() {
            check_section_name(name, &mut diagnostics);
        }

        Ok((Self { path, sections }, diagnostics))
    }

    /// The file the configuration was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn raw(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        self.sections
            .get(section)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
            .ok_or_else(|| ConfigError::missing(section, key))
    }

    fn interpolate(
        &self,
        section: &str,
        key: &str,
        raw: &str,
        depth: usize,
    ) -> Result<String, ConfigError> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(ConfigError::InterpolationDepth {
                section: section.to_owned(),
                key: key.to_owned(),
            });
        }

        let bad = |reason: &str| ConfigError::Interpolation {
            section: section.to_owned(),
            key: key.to_owned(),
            reason: reason.to_owned(),
        };

        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];

            if let Some(after) = tail.strip_prefix('$') {
                out.push('$');
                rest = after;
                continue;
            }

            let Some(body) = tail.strip_prefix('{') else {
                return Err(bad("'$' must be followed by '$' or '{'"));
            };
            let Some(end) = body.find('}') else {
                return Err(bad("unterminated '${'"));
            };

            let reference = &body[..end];
            let (ref_section, ref_key) = reference.split_once(':').unwrap_or((section, reference));
            if ref_key.is_empty() {
                return Err(bad("empty reference"));
            }
            let ref_key = ref_key.to_lowercase();
            let value = self.raw(ref_section, &ref_key)?;
            out.push_str(&self.interpolate(ref_section, &ref_key, value, depth + 1)?);
            rest = &body[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl ConfigSource for Config {
    fn get(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        let raw = self.raw(section, key)?;
        self.interpolate(section, key, raw, 0)
    }

    fn sections(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    fn keys(&self, section: &str) -> Vec<String> {
        self.sections
            .get(section)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn discover(cwd: Option<&Path>, config_dir: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.map(|dir| dir.join(CONFIG_FILE_NAME));
    let user = config_dir.map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    [local, user].into_iter().flatten().find(|p| p.is_file())
}

/// Section names keep their case; keys are folded to lowercase. Values are
/// taken verbatim: no quote stripping, no backslash escapes.
fn merge_layer(
    sections: &mut Sections,
    text: &str,
    diagnostics: &mut Diagnostics,
) -> Result<(), ini::ParseError> {
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let document = Ini::load_from_str_opt(text, options)?;

    for (name, properties) in document.iter() {
        let Some(name) = name else {
            if properties.iter().next().is_some() {
                diagnostics.warn("keys before the first section header ignored");
            }
            continue;
        };
        let keys = sections.entry(name.to_owned()).or_default();
        for (key, value) in properties.iter() {
            keys.insert(key.to_lowercase(), value.to_owned());
        }
    }
    Ok(())
}

fn check_section_name(name: &str, diagnostics: &mut Diagnostics) {
    if name == RCLONE_SECTION || name == CTL_SECTION {
        return;
    }
    let unit_name = name
        .strip_prefix(UNIT_PREFIX)
        .or_else(|| name.strip_prefix(LEGACY_SERVICE_PREFIX));
    match unit_name {
        Some("") => diagnostics.warn(format!("section [{name}] declares a unit without a name")),
        Some(_) => {}
        None => diagnostics.warn(format!("unknown section [{name}] ignored")),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
