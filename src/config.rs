use anyhow::{ensure, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::INDEX_DELAY;
use crate::storage::STATS_KEY;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings resolved once at startup and handed to the components that need them.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub verbose: bool,
    pub stats_file: PathBuf,
    pub index_delay: Duration,
    pub fetch_timeout: Duration,
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: Option<String>,
    /// Uploaded objects are world readable. On by default; review before enabling a bucket.
    pub public_read: bool,
    pub upload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            stats_file: PathBuf::from(STATS_KEY),
            index_delay: INDEX_DELAY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            s3: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let defaults = Self::default();

        let index_delay = match var("INDEX_DELAY_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse()
                    .with_context(|| format!("INDEX_DELAY_MS is not a number: {}", ms))?,
            ),
            None => defaults.index_delay,
        };

        let fetch_timeout = match var("FETCH_TIMEOUT_SECS") {
            Some(secs) => {
                let secs: u64 = secs
                    .parse()
                    .with_context(|| format!("FETCH_TIMEOUT_SECS is not a number: {}", secs))?;
                ensure!(secs > 0, "FETCH_TIMEOUT_SECS must be greater than zero");
                Duration::from_secs(secs)
            }
            None => defaults.fetch_timeout,
        };

        let s3 = var("S3_BUCKET").map(|bucket| S3Config {
            bucket,
            endpoint: var("S3_ENDPOINT"),
            public_read: var("S3_PUBLIC_READ").map_or(true, |v| parse_flag(&v)),
            upload: true,
        });

        Ok(Self {
            verbose: var("VERBOSE").is_some(),
            stats_file: var("STATS_FILE").map_or(defaults.stats_file, PathBuf::from),
            index_delay,
            fetch_timeout,
            s3,
        })
    }

    /// Applies command-line flags on top of the environment settings.
    ///
    /// A bucket given on the command line keeps the environment's endpoint and
    /// public-read setting. An endpoint only matters once some bucket is set.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.verbose |= overrides.verbose;
        if let Some(output) = overrides.output {
            self.stats_file = output;
        }
        if let Some(ms) = overrides.delay_ms {
            self.index_delay = Duration::from_millis(ms);
        }
        if let Some(bucket) = overrides.bucket {
            let previous = self.s3.take();
            self.s3 = Some(S3Config {
                bucket,
                endpoint: previous.as_ref().and_then(|s3| s3.endpoint.clone()),
                public_read: previous.map_or(true, |s3| s3.public_read),
                upload: true,
            });
        }
        if let Some(s3) = self.s3.as_mut() {
            if overrides.endpoint.is_some() {
                s3.endpoint = overrides.endpoint;
            }
            s3.upload &= !overrides.no_upload;
        }
        self
    }
}

/// Command-line settings; `None` and `false` leave the environment value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub verbose: bool,
    pub delay_ms: Option<u64>,
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub no_upload: bool,
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
