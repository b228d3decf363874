use anyhow::{Context, Result, bail};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ErrorCode;
use crate::model::status::Status;

/// Engine configuration, read from `.civic/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub flight: FlightConfig,
}

/// Largest accepted milestone offset: one year.
pub const MAX_OFFSET_MINUTES: i64 = 60 * 24 * 365;

/// Offsets and copy used by the timeline reconstructor.
///
/// Offsets are minutes after submission and are the approximate position
/// of each milestone when the real time was not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_pending_offset")]
    pub pending_offset_minutes: i64,
    #[serde(default = "default_processing_offset")]
    pub processing_offset_minutes: i64,
    #[serde(default = "default_ready_offset")]
    pub ready_offset_minutes: i64,
    #[serde(default = "default_completed_offset")]
    pub completed_offset_minutes: i64,
    /// Gap between the last milestone and a rejection without a timestamp.
    #[serde(default = "default_rejected_offset")]
    pub rejected_offset_minutes: i64,
    #[serde(default = "default_rejection_placeholder")]
    pub rejection_placeholder: String,
    #[serde(default = "default_unassigned_staff")]
    pub unassigned_staff: String,
    #[serde(default = "default_pickup_location")]
    pub pickup_location: String,
    #[serde(default = "default_pickup_requirement")]
    pub pickup_requirement: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            pending_offset_minutes: default_pending_offset(),
            processing_offset_minutes: default_processing_offset(),
            ready_offset_minutes: default_ready_offset(),
            completed_offset_minutes: default_completed_offset(),
            rejected_offset_minutes: default_rejected_offset(),
            rejection_placeholder: default_rejection_placeholder(),
            unassigned_staff: default_unassigned_staff(),
            pickup_location: default_pickup_location(),
            pickup_requirement: default_pickup_requirement(),
        }
    }
}

impl TimelineConfig {
    /// Synthesized distance from submission for a forward-track tier.
    #[must_use]
    pub fn offset(&self, status: Status) -> Duration {
        let minutes = match status {
            Status::Submitted => 0,
            Status::Pending => self.pending_offset_minutes,
            Status::Processing => self.processing_offset_minutes,
            Status::Ready => self.ready_offset_minutes,
            Status::Completed => self.completed_offset_minutes,
            Status::Rejected => self.rejected_offset_minutes,
        };
        Duration::try_minutes(minutes.max(0)).unwrap_or(Duration::MAX)
    }

    /// Check that forward-track offsets strictly increase and stay within
    /// [`MAX_OFFSET_MINUTES`].
    ///
    /// # Errors
    ///
    /// Returns an error naming the first pair of tiers out of order, or the
    /// first offset that is too large.
    pub fn validate(&self) -> Result<()> {
        for (name, minutes) in [
            ("pending", self.pending_offset_minutes),
            ("processing", self.processing_offset_minutes),
            ("ready", self.ready_offset_minutes),
            ("completed", self.completed_offset_minutes),
            ("rejected", self.rejected_offset_minutes),
        ] {
            if minutes > MAX_OFFSET_MINUTES {
                bail!(
                    "timeline.{name}_offset_minutes ({minutes}) must not exceed {MAX_OFFSET_MINUTES}"
                );
            }
        }
        let tiers = [
            ("pending", self.pending_offset_minutes),
            ("processing", self.processing_offset_minutes),
            ("ready", self.ready_offset_minutes),
            ("completed", self.completed_offset_minutes),
        ];
        if tiers[0].1 <= 0 {
            bail!("timeline.pending_offset_minutes must be positive");
        }
        for pair in tiers.windows(2) {
            if pair[1].1 <= pair[0].1 {
                bail!(
                    "timeline.{}_offset_minutes ({}) must exceed timeline.{}_offset_minutes ({})",
                    pair[1].0,
                    pair[1].1,
                    pair[0].0,
                    pair[0].1
                );
            }
        }
        if self.rejected_offset_minutes <= 0 {
            bail!("timeline.rejected_offset_minutes must be positive");
        }
        Ok(())
    }
}

/// Pagination defaults for the admin lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_resident_page_size")]
    pub resident_page_size: usize,
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<usize>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            resident_page_size: default_resident_page_size(),
            page_size_options: default_page_size_options(),
        }
    }
}

/// Single-flight coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightConfig {
    /// Advisory lock lifetime; a fetch running longer than this no longer
    /// blocks new callers.
    #[serde(default = "default_release_after_ms")]
    pub release_after_ms: u64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            release_after_ms: default_release_after_ms(),
        }
    }
}

impl FlightConfig {
    #[must_use]
    pub const fn release_after(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.release_after_ms)
    }
}

fn read_config_file(path: &Path) -> Result<Option<EngineConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<EngineConfig>(&content)
        .with_context(|| {
            format!(
                "{}: failed to parse {}",
                ErrorCode::ConfigParseError.code(),
                path.display()
            )
        })?;
    config
        .timeline
        .validate()
        .with_context(|| format!("Invalid timeline settings in {}", path.display()))?;
    Ok(Some(config))
}

/// Load `.civic/config.toml` under `project_root`, defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed or
/// validated.
pub fn load_project_config(project_root: &Path) -> Result<EngineConfig> {
    Ok(read_config_file(&project_config_path(project_root))?.unwrap_or_default())
}

/// Load `<config dir>/civic/config.toml`, defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed or
/// validated.
pub fn load_user_config() -> Result<EngineConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(EngineConfig::default());
    };
    Ok(read_config_file(&config_dir.join("civic/config.toml"))?.unwrap_or_default())
}

#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".civic/config.toml")
}

/// Resolve the effective configuration: project file, else user file, else
/// defaults, with `CIVIC_PAGE_SIZE` applied on top.
///
/// # Errors
///
/// Returns an error if a present config file is invalid.
pub fn resolve_config(project_root: &Path) -> Result<EngineConfig> {
    let mut config = match read_config_file(&project_config_path(project_root))? {
        Some(config) => config,
        None => load_user_config()?,
    };
    apply_env_overrides(&mut config, env::var("CIVIC_PAGE_SIZE").ok().as_deref());
    Ok(config)
}

fn apply_env_overrides(config: &mut EngineConfig, page_size: Option<&str>) {
    let Some(raw) = page_size else {
        return;
    };
    match raw.trim().parse::<usize>() {
        Ok(size) if size > 0 => {
            debug!(page_size = size, "page size overridden from environment");
            config.query.default_page_size = size;
        }
        _ => debug!(value = raw, "ignoring invalid CIVIC_PAGE_SIZE"),
    }
}

const fn default_pending_offset() -> i64 {
    30
}

const fn default_processing_offset() -> i64 {
    120
}

const fn default_ready_offset() -> i64 {
    240
}

const fn default_completed_offset() -> i64 {
    24 * 60
}

const fn default_rejected_offset() -> i64 {
    60
}

fn default_rejection_placeholder() -> String {
    "No reason was provided.".to_string()
}

fn default_unassigned_staff() -> String {
    "Municipal staff".to_string()
}

fn default_pickup_location() -> String {
    "Municipal Hall, Civil Registry window".to_string()
}

fn default_pickup_requirement() -> String {
    "Bring one valid government-issued ID".to_string()
}

const fn default_page_size() -> usize {
    10
}

const fn default_resident_page_size() -> usize {
    25
}

fn default_page_size_options() -> Vec<usize> {
    vec![10, 25, 50, 100]
}

const fn default_release_after_ms() -> u64 {
    10_000
}
