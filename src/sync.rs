// Session discovery -> role enumeration -> config merge
use crate::auth::TokenCache;
use crate::aws_config::{self, ConfigDocument};
use crate::credentials::AccountRoleSource;
use crate::error::Result;
use crate::models::{build_profiles, ProfileRecord};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub cache_dir: PathBuf,
    pub config_file: PathBuf,
    /// Print the resulting config instead of writing it
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
}

/// Run the full pipeline.
///
/// The config file is read only after every account and role has been
/// listed, and written once at the end; any earlier failure leaves it as is.
pub async fn run<S>(options: &SyncOptions, source: &S) -> Result<SyncSummary>
where
    S: AccountRoleSource,
{
    let cache = TokenCache::with_dir(&options.cache_dir);
    tracing::debug!("Scanning {}", cache.cache_dir().display());
    let session = cache.find_session()?;

    let roles = source.list_account_roles(&session).await?;
    let profiles = build_profiles(&session, &roles);
    tracing::info!("Found {} account roles", profiles.len());

    let mut doc = aws_config::load_config_file(&options.config_file)?;
    tracing::debug!(
        "Loaded {} sections from {}",
        doc.section_names().len(),
        options.config_file.display()
    );
    let summary = summarize(&doc, &profiles);
    aws_config::merge_profiles(&mut doc, &profiles);

    if options.dry_run {
        print!("{}", doc.save()?);
        return Ok(summary);
    }

    aws_config::write_config_file(&options.config_file, &doc)?;
    tracing::info!(
        "Updated {}: {} new, {} existing profiles",
        options.config_file.display(),
        summary.created,
        summary.updated
    );

    Ok(summary)
}

fn summarize(doc: &ConfigDocument, profiles: &[ProfileRecord]) -> SyncSummary {
    let mut summary = SyncSummary::default();
    let mut seen = HashSet::new();
    for profile in profiles {
        let section_name = profile.section_name();
        if !seen.insert(section_name.clone()) {
            continue;
        }
        if doc.has_section(&section_name) {
            summary.updated += 1;
        } else {
            summary.created += 1;
        }
    }
    summary
}
