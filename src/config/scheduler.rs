//! Scheduler configuration structures.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{AdmissionPolicy, PipelineSettings};

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Concurrent attempt slots; one is held back for high priority.
    pub capacity: usize,
    /// Levels of detail generated for full-resolution jobs.
    pub mip_count: u8,
    /// Memory pressure above which no additional attempt starts.
    pub memory_pressure_threshold: f64,
    /// Failed attempts tolerated per task before it is dropped; `None` retries forever.
    pub max_retries: Option<u32>,
    /// Mesh generation watchdog in seconds; `None` disables it.
    pub generation_timeout_secs: Option<u64>,
    /// Interval between queue status log lines.
    pub telemetry_interval_secs: u64,
    /// Base URL of the object store serving segmentations.
    pub storage_base_url: String,
    /// Segmentation file name appended to `{bucket}/{path}`.
    pub segmentation_file: String,
    /// Prefix of published mesh objects.
    pub output_prefix: String,
    /// Extension of published mesh objects.
    pub mesh_extension: String,
    /// Completion callback URL, `{task_id}` is substituted.
    pub notify_url_template: Option<String>,
    /// Entries kept by the in-memory fetch cache store.
    pub cache_max_entries: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            mip_count: 4,
            memory_pressure_threshold: 0.90,
            max_retries: None,
            generation_timeout_secs: None,
            telemetry_interval_secs: 30,
            storage_base_url: "https://storage.googleapis.com".into(),
            segmentation_file: "segmentation.lzma".into(),
            output_prefix: "meshes".into(),
            mesh_extension: "dstrip".into(),
            notify_url_template: None,
            cache_max_entries: 64,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity < AdmissionPolicy::MIN_CAPACITY {
            return Err(format!(
                "capacity must be at least {}",
                AdmissionPolicy::MIN_CAPACITY
            ));
        }
        if self.mip_count == 0 {
            return Err("mip_count must be greater than 0".into());
        }
        if !(self.memory_pressure_threshold > 0.0 && self.memory_pressure_threshold <= 1.0) {
            return Err("memory_pressure_threshold must be in (0, 1]".into());
        }
        if self.max_retries == Some(0) {
            return Err("max_retries must be greater than 0; omit it to retry forever".into());
        }
        if self.generation_timeout_secs == Some(0) {
            return Err("generation_timeout_secs must be greater than 0".into());
        }
        if self.telemetry_interval_secs == 0 {
            return Err("telemetry_interval_secs must be greater than 0".into());
        }
        if self.storage_base_url.is_empty() {
            return Err("storage_base_url must not be empty".into());
        }
        if self.segmentation_file.is_empty() {
            return Err("segmentation_file must not be empty".into());
        }
        if let Some(template) = &self.notify_url_template {
            if !template.contains("{task_id}") {
                return Err("notify_url_template must contain `{task_id}`".into());
            }
        }
        if self.cache_max_entries == 0 {
            return Err("cache_max_entries must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `.env` if present, then overlay `REMESH_*` environment variables on the defaults.
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(format!("failed to load .env: {e}"));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay variables resolved by `lookup` on the defaults, then validate.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut cfg = Self::default();
        if let Some(v) = parsed(&lookup, "REMESH_THREADS")? {
            cfg.capacity = v;
        }
        if let Some(v) = parsed(&lookup, "REMESH_MIP_COUNT")? {
            cfg.mip_count = v;
        }
        if let Some(v) = parsed(&lookup, "REMESH_MEMORY_THRESHOLD")? {
            cfg.memory_pressure_threshold = v;
        }
        if let Some(v) = parsed(&lookup, "REMESH_MAX_RETRIES")? {
            cfg.max_retries = Some(v);
        }
        if let Some(v) = parsed(&lookup, "REMESH_GENERATION_TIMEOUT_SECS")? {
            cfg.generation_timeout_secs = Some(v);
        }
        if let Some(v) = parsed(&lookup, "REMESH_TELEMETRY_INTERVAL_SECS")? {
            cfg.telemetry_interval_secs = v;
        }
        if let Some(v) = lookup("REMESH_STORAGE_BASE_URL") {
            cfg.storage_base_url = v;
        }
        if let Some(v) = lookup("REMESH_SEGMENTATION_FILE") {
            cfg.segmentation_file = v;
        }
        if let Some(v) = lookup("REMESH_OUTPUT_PREFIX") {
            cfg.output_prefix = v;
        }
        if let Some(v) = lookup("REMESH_MESH_EXTENSION") {
            cfg.mesh_extension = v;
        }
        if let Some(v) = lookup("REMESH_NOTIFY_URL") {
            cfg.notify_url_template = Some(v);
        }
        if let Some(v) = parsed(&lookup, "REMESH_CACHE_MAX_ENTRIES")? {
            cfg.cache_max_entries = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Admission policy derived from `capacity` and `memory_pressure_threshold`.
    #[must_use]
    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::new(self.capacity, self.memory_pressure_threshold)
    }

    /// Pipeline settings derived from this configuration.
    #[must_use]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            storage_base_url: self.storage_base_url.clone(),
            segmentation_file: self.segmentation_file.clone(),
            mip_count: self.mip_count,
            generation_timeout: self.generation_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Interval between queue status log lines.
    #[must_use]
    pub const fn telemetry_interval(&self) -> Duration {
        Duration::from_secs(self.telemetry_interval_secs)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| format!("{key}={raw:?} is invalid: {e}"))
        })
        .transpose()
}
