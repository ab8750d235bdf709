//! Configuration types for edfgpu

use serde::{Deserialize, Serialize};

/// Annotation holding the absolute RFC 3339 deadline
pub const DEFAULT_DEADLINE_ANNOTATION: &str = "scheduling.ui.ac.id/deadline";
/// Annotation holding the requested relative deadline (e.g. "600s")
pub const DEFAULT_DURATION_ANNOTATION: &str = "scheduling.ui.ac.id/deadline-duration";
/// Extended resource name for GPUs
pub const DEFAULT_GPU_RESOURCE: &str = "nvidia.com/gpu";

/// Top-level plugin configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// EDF queue sort and deadline assignment
    pub edf: EdfArgs,
    /// GPU-aware filter and score
    pub gpu: GpuAwareArgs,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl SchedulerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::EdfGpuError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::EdfGpuError::Config(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, crate::EdfGpuError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no plugin can work with
    pub fn validate(&self) -> Result<(), crate::EdfGpuError> {
        if self.edf.default_duration_secs <= 0 {
            return Err(crate::EdfGpuError::Config(format!(
                "default_duration_secs must be positive, got {}",
                self.edf.default_duration_secs
            )));
        }
        if self.edf.deadline_annotation.is_empty() || self.edf.duration_annotation.is_empty() {
            return Err(crate::EdfGpuError::Config(
                "annotation keys must not be empty".to_string(),
            ));
        }
        if self.gpu.resource_name.is_empty() {
            return Err(crate::EdfGpuError::Config(
                "gpu resource_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Arguments for the EDF queue sort plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdfArgs {
    /// Annotation key for the absolute deadline
    pub deadline_annotation: String,
    /// Annotation key for the requested duration
    pub duration_annotation: String,
    /// Deadline duration used when none (or an invalid one) is requested
    pub default_duration_secs: i64,
    /// Upper bound on a single conditional update round-trip
    pub store_timeout_ms: u64,
    /// Extra attempts after a version conflict (0 = give up on first conflict)
    pub conflict_retries: u32,
}

impl Default for EdfArgs {
    fn default() -> Self {
        Self {
            deadline_annotation: DEFAULT_DEADLINE_ANNOTATION.to_string(),
            duration_annotation: DEFAULT_DURATION_ANNOTATION.to_string(),
            default_duration_secs: 600,
            store_timeout_ms: 5000,
            conflict_retries: 0,
        }
    }
}

/// Arguments for the GPU-aware filter and score plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuAwareArgs {
    /// Resource name GPUs are requested and reported under
    pub resource_name: String,
    /// Node label holding GPU memory size
    pub memory_label: String,
    /// Node label holding interconnect kind
    pub interconnect_label: String,
    /// Interconnect value that earns the bandwidth bonus
    pub interconnect_value: String,
    /// Node label holding GPU generation
    pub generation_label: String,
    /// Minimum GPU memory (GB) a node must report
    pub min_gpu_memory_gb: i64,
}

impl Default for GpuAwareArgs {
    fn default() -> Self {
        Self {
            resource_name: DEFAULT_GPU_RESOURCE.to_string(),
            memory_label: "gpu-memory-gb".to_string(),
            interconnect_label: "gpu-interconnect".to_string(),
            interconnect_value: "nvlink".to_string(),
            generation_label: "gpu-generation".to_string(),
            min_gpu_memory_gb: 8,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
