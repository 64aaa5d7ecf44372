use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: f64,
    #[serde(default = "default_max_step_seconds")]
    pub max_step_seconds: f64,
    #[serde(default = "default_placement_range")]
    pub placement_range: u32,
    #[serde(default = "default_oxygen_range")]
    pub oxygen_range: u32,
    #[serde(default = "default_oxygen_seconds")]
    pub oxygen_seconds: f64,
    #[serde(default = "default_snapshot_directory")]
    pub snapshot_directory: String,
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_frame_rate() -> f64 {
    60.0
}
fn default_max_step_seconds() -> f64 {
    0.25
}
fn default_placement_range() -> u32 {
    3
}
fn default_oxygen_range() -> u32 {
    16
}
fn default_oxygen_seconds() -> f64 {
    16.0
}
fn default_snapshot_directory() -> String {
    "./saves".to_string()
}
fn default_max_snapshots() -> u32 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            frame_rate_hz: default_frame_rate(),
            max_step_seconds: default_max_step_seconds(),
            placement_range: default_placement_range(),
            oxygen_range: default_oxygen_range(),
            oxygen_seconds: default_oxygen_seconds(),
            snapshot_directory: default_snapshot_directory(),
            max_snapshots: default_max_snapshots(),
            log_level: default_log_level(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Milliseconds between driver frames.
    pub fn frame_interval_ms(&self) -> u64 {
        (1000.0 / self.frame_rate_hz).round().max(1.0) as u64
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if !(self.frame_rate_hz > 0.0 && self.frame_rate_hz <= 1000.0) {
            errors.push(format!(
                "frame_rate_hz must be in (0, 1000], got {}. Example: frame_rate_hz = 60.0",
                self.frame_rate_hz
            ));
        }

        if !(self.max_step_seconds > 0.0) {
            errors.push(format!(
                "max_step_seconds must be > 0.0, got {}. Example: max_step_seconds = 0.25",
                self.max_step_seconds
            ));
        }

        if self.placement_range == 0 {
            errors.push(format!(
                "placement_range must be > 0, got {}. Example: placement_range = 3",
                self.placement_range
            ));
        }

        if self.oxygen_range == 0 {
            errors.push(format!(
                "oxygen_range must be > 0, got {}. Example: oxygen_range = 16",
                self.oxygen_range
            ));
        }

        if !(self.oxygen_seconds > 0.0) {
            errors.push(format!(
                "oxygen_seconds must be > 0.0, got {}. Example: oxygen_seconds = 16.0",
                self.oxygen_seconds
            ));
        }

        if self.max_snapshots == 0 {
            errors.push(format!(
                "max_snapshots must be > 0, got {}. Example: max_snapshots = 10",
                self.max_snapshots
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
