// AWS shared config file model and profile merge
use crate::error::{Result, SsoError};
use crate::models::ProfileRecord;
use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Get the default AWS config file path
pub fn config_file_path() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        Ok(home.join(".aws").join("config"))
    } else {
        Err(SsoError::ConfigError(
            "Could not determine home directory".to_string(),
        ))
    }
}

/// Blank out comment lines and trailing comments after section headers.
///
/// The parser only accepts comments at the start of a line; line count is
/// kept so parse errors still point at the right line.
fn strip_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                return "";
            }
            if trimmed.starts_with('[') {
                if let Some(end) = trimmed.find(']') {
                    let rest = trimmed[end + 1..].trim_start();
                    if rest.starts_with('#') || rest.starts_with(';') {
                        return &trimmed[..=end];
                    }
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ordered view of an AWS config file backed by `rust-ini`.
///
/// Section order and key order within a section survive a load/save cycle.
/// Comments and alignment do not.
#[derive(Debug)]
pub struct ConfigDocument {
    ini: Ini,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self { ini: Ini::new() }
    }
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config file contents. Both `=` and `:` separate keys from values.
    pub fn load(content: &str) -> Result<Self> {
        let option = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(&strip_comments(content), option)?;
        Ok(Self { ini })
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.ini.sections().flatten().collect()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.ini.section(Some(name)).is_some()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.section(Some(section))?.get(key)
    }

    pub fn keys(&self, section: &str) -> Vec<&str> {
        self.ini
            .section(Some(section))
            .map(|props| props.iter().map(|(key, _)| key).collect())
            .unwrap_or_default()
    }

    /// Overwrite `key`, creating the section at the end of the document
    /// when it is missing.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Render the document back to config file text
    pub fn save(&self) -> Result<String> {
        let option = WriteOption {
            escape_policy: EscapePolicy::Nothing,
            kv_separator: " = ",
            ..Default::default()
        };
        let mut buf = Vec::new();
        self.ini.write_to_opt(&mut buf, option)?;
        String::from_utf8(buf).map_err(|e| {
            SsoError::ConfigError(format!("Rendered config is not UTF-8: {}", e))
        })
    }
}

/// Write every profile record into its `[profile <name>]` section.
///
/// Existing sections keep their position and any keys other than the five
/// managed ones. Missing sections are appended in record order. When two
/// records share a name the later one wins.
pub fn merge_profiles(doc: &mut ConfigDocument, profiles: &[ProfileRecord]) {
    let mut seen = HashSet::new();

    for profile in profiles {
        let section_name = profile.section_name();
        if !seen.insert(section_name.clone()) {
            tracing::warn!(
                "Profile name '{}' generated more than once; keeping the last one",
                profile.name
            );
        }

        for (key, value) in profile.entries() {
            if let Some(previous) = doc.get(&section_name, key).filter(|v| *v != value) {
                tracing::debug!("[{}] {}: {} -> {}", section_name, key, previous, value);
            }
            doc.set(&section_name, key, value);
        }
        tracing::debug!(
            "Merged [{}] ({} keys)",
            section_name,
            doc.keys(&section_name).len()
        );
    }
}

/// Load the config file, treating a missing file as an empty document
pub fn load_config_file(path: &Path) -> Result<ConfigDocument> {
    match fs::read_to_string(path) {
        Ok(content) => ConfigDocument::load(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} does not exist, starting empty", path.display());
            Ok(ConfigDocument::new())
        }
        Err(e) => Err(SsoError::ConfigError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Replace the config file with the rendered document.
///
/// The new contents go to a temporary file next to the target which is then
/// renamed over it, so readers see either the old file or the new one.
pub fn write_config_file(path: &Path, doc: &ConfigDocument) -> Result<()> {
    // Follow a symlinked config to the real file
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| {
            SsoError::ConfigError(format!("Failed to create {}: {}", dir.display(), e))
        })?;
    }

    let write_err =
        |e: std::io::Error| SsoError::ConfigError(format!("Failed to write config file: {}", e));

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(doc.save()?.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    if let Ok(meta) = fs::metadata(&target) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(write_err)?;
    }

    tmp.persist(&target).map_err(|e| write_err(e.error))?;
    tracing::debug!("Wrote {}", target.display());
    Ok(())
}
