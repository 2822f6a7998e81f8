use crate::error::{Result, SsoError};
use crate::models::CachedCredential;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const CACHE_FILE_SUFFIX: &str = ".json";

/// Read-only view of the AWS CLI v2 token cache (~/.aws/sso/cache/)
pub struct TokenCache {
    cache_dir: PathBuf,
}

/// Outcome of scanning the cache directory
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Usable entry with the latest expiry, first seen on ties
    pub best: Option<CachedCredential>,
    /// One line per inspected or skipped entry, in scan order
    pub trail: Vec<String>,
}

impl ScanReport {
    fn note(&mut self, line: String) {
        tracing::debug!("{}", line);
        self.trail.push(line);
    }

    fn offer(&mut self, candidate: CachedCredential) {
        if !candidate.is_usable() {
            return;
        }
        let newer = match &self.best {
            Some(best) => candidate.expires_at > best.expires_at,
            None => true,
        };
        if newer {
            self.best = Some(candidate);
        }
    }

    /// Convert the scan into the selected session, or an error carrying
    /// the whole trail.
    pub fn into_session(mut self) -> Result<CachedCredential> {
        match self.best.take() {
            Some(session) => Ok(session),
            None => {
                self.note("no usable tokens".to_string());
                Err(SsoError::NoSessionFound(self.trail.join("\n")))
            }
        }
    }
}

impl TokenCache {
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::home_dir()
            .ok_or_else(|| {
                SsoError::ConfigError("Could not determine home directory".to_string())
            })?
            .join(".aws")
            .join("sso")
            .join("cache");

        Ok(Self { cache_dir })
    }

    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Pick the cached session with the latest expiry that still carries
    /// an access token.
    pub fn find_session(&self) -> Result<CachedCredential> {
        let report = self.scan();
        if let Some(best) = &report.best {
            tracing::info!(
                "Using SSO session for {} ({}), expires {}",
                best.start_url,
                best.region,
                best.expiration_display()
            );
        }
        report.into_session()
    }

    /// Inspect every `*.json` entry in the cache directory.
    ///
    /// Nothing here is fatal: an unreadable directory counts as empty and a
    /// bad entry is recorded in the trail and skipped.
    pub fn scan(&self) -> ScanReport {
        let mut report = ScanReport::default();

        let mut names = match self.list_cache_files() {
            Ok(names) => names,
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    tracing::warn!(
                        "SSO cache directory {} does not exist",
                        self.cache_dir.display()
                    );
                } else {
                    tracing::warn!("Failed to list {}: {}", self.cache_dir.display(), e);
                }
                report.note(format!("read dir {}: {}", self.cache_dir.display(), e));
                return report;
            }
        };
        names.sort();

        for name in names {
            let path = self.cache_dir.join(&name);

            let data = match fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    report.note(format!("read file {}: {}", name, e));
                    continue;
                }
            };

            let candidate: CachedCredential = match serde_json::from_slice(&data) {
                Ok(candidate) => candidate,
                Err(e) => {
                    report.note(format!("parse json {}: {}", name, e));
                    continue;
                }
            };

            report.note(format!(
                "{}: expires {} (token length {})",
                name,
                candidate.expiration_display(),
                candidate.access_token.len()
            ));
            report.offer(candidate);
        }

        report
    }

    /// File names in the cache directory ending in `.json`
    fn list_cache_files(&self) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.cache_dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.ends_with(CACHE_FILE_SUFFIX) {
                names.push(name);
            }
        }
        Ok(names)
    }
}
