// CLI interface
use crate::auth::TokenCache;
use crate::aws_config;
use crate::credentials::SsoAccountLister;
use crate::error::Result;
use crate::sync::{self, SyncOptions};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sso-profile-sync")]
#[command(
    about = "Write an AWS config profile for every account and role your cached SSO session can assume",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// AWS config file to update (defaults to ~/.aws/config)
    #[arg(long, env = "AWS_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Directory holding cached SSO tokens (defaults to ~/.aws/sso/cache)
    #[arg(long, env = "AWS_SSO_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Print the updated config to stdout instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose/debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Fill in default locations for anything not given on the command line
    /// or through the environment. Empty values count as unset.
    pub fn sync_options(&self) -> Result<SyncOptions> {
        let config_file = match non_empty(&self.config_file) {
            Some(path) => path,
            None => aws_config::config_file_path()?,
        };

        let cache_dir = match non_empty(&self.cache_dir) {
            Some(path) => path,
            None => TokenCache::new()?.cache_dir().to_path_buf(),
        };

        Ok(SyncOptions {
            cache_dir,
            config_file,
            dry_run: self.dry_run,
        })
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.as_ref()
        .filter(|p| !p.as_os_str().is_empty())
        .cloned()
}

pub async fn execute(args: Cli) -> Result<()> {
    let options = args.sync_options()?;
    tracing::debug!("Using config file {}", options.config_file.display());

    let source = SsoAccountLister::new();
    sync::run(&options, &source).await?;
    Ok(())
}
