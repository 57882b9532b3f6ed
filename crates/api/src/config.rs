//! Runtime configuration loaded from environment variables.
//!
//! Unset variables fall back to defaults; unparsable ones are logged and
//! ignored.

use std::net::SocketAddr;
use std::path::PathBuf;

pub const BIND_ADDR: &str = "LITHOS_BIND_ADDR";
pub const EXPORT_DIR: &str = "LITHOS_EXPORT_DIR";
pub const STAGING_DIR: &str = "LITHOS_STAGING_DIR";
pub const MAX_CONCURRENT_JOBS: &str = "LITHOS_MAX_CONCURRENT_JOBS";
pub const JOB_STORE_PATH: &str = "LITHOS_JOB_STORE_PATH";
pub const MAX_UPLOAD_BYTES: &str = "LITHOS_MAX_UPLOAD_BYTES";
pub const SEED_SAMPLE_DATA: &str = "LITHOS_SEED_SAMPLE_DATA";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Where export artifacts are allocated.
    pub export_dir: PathBuf,
    /// Where uploads wait for their import job.
    pub staging_dir: PathBuf,
    /// Worker pool size.
    pub max_concurrent_jobs: usize,
    /// Persist jobs to this JSON file instead of memory.
    pub job_store_path: Option<PathBuf>,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
    /// Store two sample sections when the section store starts empty.
    pub seed_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let base = std::env::temp_dir().join("lithos");
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            export_dir: base.join("exports"),
            staging_dir: base.join("staging"),
            max_concurrent_jobs: 4,
            job_store_path: None,
            max_upload_bytes: 16 * 1024 * 1024,
            seed_sample_data: true,
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_addr: parsed(get(BIND_ADDR), BIND_ADDR).unwrap_or(defaults.bind_addr),
            export_dir: get(EXPORT_DIR).map(PathBuf::from).unwrap_or(defaults.export_dir),
            staging_dir: get(STAGING_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),
            max_concurrent_jobs: parsed::<usize>(get(MAX_CONCURRENT_JOBS), MAX_CONCURRENT_JOBS)
                .unwrap_or(defaults.max_concurrent_jobs)
                .max(1),
            job_store_path: get(JOB_STORE_PATH).map(PathBuf::from),
            max_upload_bytes: parsed(get(MAX_UPLOAD_BYTES), MAX_UPLOAD_BYTES)
                .unwrap_or(defaults.max_upload_bytes),
            seed_sample_data: parsed(get(SEED_SAMPLE_DATA), SEED_SAMPLE_DATA)
                .unwrap_or(defaults.seed_sample_data),
        }
    }
}

fn parsed<T>(value: Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "ignoring invalid configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let c = config(&[]);
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.max_concurrent_jobs, 4);
        assert!(c.job_store_path.is_none());
        assert!(c.export_dir.ends_with("exports"));
        assert!(c.seed_sample_data);
    }

    #[test]
    fn values_are_read() {
        let c = config(&[
            (BIND_ADDR, "127.0.0.1:9000"),
            (EXPORT_DIR, "/data/out"),
            (STAGING_DIR, "/data/in"),
            (MAX_CONCURRENT_JOBS, "8"),
            (JOB_STORE_PATH, "/data/jobs.json"),
            (SEED_SAMPLE_DATA, "false"),
        ]);
        assert_eq!(c.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(c.export_dir, PathBuf::from("/data/out"));
        assert_eq!(c.staging_dir, PathBuf::from("/data/in"));
        assert_eq!(c.max_concurrent_jobs, 8);
        assert_eq!(c.job_store_path, Some(PathBuf::from("/data/jobs.json")));
        assert!(!c.seed_sample_data);
    }

    #[test]
    fn invalid_values_fall_back() {
        let c = config(&[(BIND_ADDR, "nowhere"), (MAX_CONCURRENT_JOBS, "many")]);
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.max_concurrent_jobs, 4);
    }

    #[test]
    fn pool_size_is_at_least_one() {
        assert_eq!(config(&[(MAX_CONCURRENT_JOBS, "0")]).max_concurrent_jobs, 1);
    }
}
