use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest width or height accepted for a grid.
pub const MIN_GRID_SIDE: u32 = 8;

/// Parameters used to generate a session grid.
/// Stored with every snapshot so the deposit layout can be regenerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    /// 0 picks a random seed at generation time.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_deposit_chance")]
    pub deposit_chance: f64,
}

fn default_width() -> u32 {
    200
}

fn default_height() -> u32 {
    150
}

fn default_deposit_chance() -> f64 {
    0.02
}

impl Default for GridParams {
    fn default() -> Self {
        GridParams {
            seed: 0,
            width: default_width(),
            height: default_height(),
            deposit_chance: default_deposit_chance(),
        }
    }
}

impl GridParams {
    pub fn with_seed(seed: u64) -> Self {
        GridParams {
            seed,
            ..Self::default()
        }
    }

    /// Load grid parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self = toml::from_str(&content)
            .map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges, reporting every problem at once.
    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        if self.width < MIN_GRID_SIDE {
            errors.push(format!(
                "width must be >= {}, got {}",
                MIN_GRID_SIDE, self.width
            ));
        }
        if self.height < MIN_GRID_SIDE {
            errors.push(format!(
                "height must be >= {}, got {}",
                MIN_GRID_SIDE, self.height
            ));
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            errors.push("grid dimensions must fit in i32".to_string());
        }
        if !(0.0..=1.0).contains(&self.deposit_chance) {
            errors.push(format!(
                "deposit_chance must be 0.0-1.0, got {}",
                self.deposit_chance
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let params = GridParams::default();
        assert_eq!(params.width, 200);
        assert_eq!(params.height, 150);
        assert_eq!(params.deposit_chance, 0.02);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn invalid_width() {
        let params = GridParams {
            width: 4,
            ..GridParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("width"), "Error should mention width: {}", err);
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        for (width, height) in [(0, 150), (200, 0), (0, 0)] {
            let params = GridParams {
                width,
                height,
                ..GridParams::default()
            };
            assert!(params.validate().is_err(), "{}x{} accepted", width, height);
        }
    }

    #[test]
    fn all_errors_reported_together() {
        let params = GridParams {
            seed: 1,
            width: 2,
            height: 3,
            deposit_chance: 1.5,
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("width"), "Error: {}", err);
        assert!(err.contains("height"), "Error: {}", err);
        assert!(err.contains("deposit_chance"), "Error: {}", err);
        assert_eq!(err.lines().count(), 3);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let params: GridParams = toml::from_str("seed = 42\n").unwrap();
        assert_eq!(params.seed, 42);
        assert_eq!(params.width, 200);
        params.validate().unwrap();
    }

    #[test]
    fn from_file_valid() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmpfile,
            r#"
seed = 7
width = 64
height = 32
deposit_chance = 0.08
"#
        )
        .unwrap();

        let params = GridParams::from_file(tmpfile.path()).unwrap();
        assert_eq!(params.seed, 7);
        assert_eq!(params.width, 64);
        assert_eq!(params.deposit_chance, 0.08);
    }

    #[test]
    fn from_file_missing() {
        let err = GridParams::from_file(Path::new("/nonexistent/grid.toml")).unwrap_err();
        assert!(err.contains("Cannot read"), "Error: {}", err);
    }

    #[test]
    fn from_file_invalid_toml() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "this is not valid toml {{{{").unwrap();

        let err = GridParams::from_file(tmpfile.path()).unwrap_err();
        assert!(err.contains("Invalid TOML"), "Error: {}", err);
    }

    #[test]
    fn from_file_out_of_range() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "width = 3\n").unwrap();

        let err = GridParams::from_file(tmpfile.path()).unwrap_err();
        assert!(err.contains("width"), "Error: {}", err);
    }
}
