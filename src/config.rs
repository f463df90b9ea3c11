use crate::error::ConvertError;

use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

/// How a line's highlight is split into `\k` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Per character when a line carries a single timestamp, per syllable otherwise.
    Auto,
    /// One unit per timed fragment.
    Syllable,
    /// Every character of a fragment gets an equal share of its duration.
    Character,
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::Auto
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptInfo {
    pub title: String,
    pub play_res_x: u32,
    pub play_res_y: u32,
}

impl Default for ScriptInfo {
    fn default() -> Self {
        Self {
            title: "LRC to ASS".to_string(),
            play_res_x: 1280,
            play_res_y: 720,
        }
    }
}

/// Style fields after the name column, written out as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Styles {
    pub default: String,
    pub next_line: String,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            default: "Arial,17,&H00FFFFFF,&H000000FF,&H00000000,&H64000000,-1,0,0,0,100,100,0,0,1,3,0,2,10,10,50,1"
                .to_string(),
            next_line: "Arial,15,&H00666666,&H000000FF,&H00000000,&H64000000,0,0,0,0,100,100,0,0,1,1,0,2,10,10,100,1"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub granularity: Granularity,
    /// Seconds given to the last fragment of a line that has no successor.
    pub syllable_tail: f64,
    /// Seconds the final line stays on screen after its last timestamp.
    pub final_line_hold: f64,
    pub next_line_preview: bool,
    pub script_info: ScriptInfo,
    pub styles: Styles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            syllable_tail: 1.0,
            final_line_hold: 5.0,
            next_line_preview: true,
            script_info: ScriptInfo::default(),
            styles: Styles::default(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConvertError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConvertError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        seconds("syllable_tail", self.syllable_tail)?;
        seconds("final_line_hold", self.final_line_hold)?;
        Ok(())
    }

    pub fn syllable_tail(&self) -> Duration {
        Duration::from_secs_f64(self.syllable_tail)
    }

    pub fn final_line_hold(&self) -> Duration {
        Duration::from_secs_f64(self.final_line_hold)
    }
}

/// Rejects values `Duration::from_secs_f64` would panic on.
fn seconds(field: &'static str, value: f64) -> Result<Duration, ConvertError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConvertError::InvalidDuration { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = Config::from_toml(
            r#"
            granularity = "character"
            syllable_tail = 0.5
            next_line_preview = false

            [script_info]
            title = "My Song"
            "#,
        )
        .unwrap();

        assert_eq!(config.granularity, Granularity::Character);
        assert_eq!(config.syllable_tail(), Duration::from_millis(500));
        assert_eq!(config.final_line_hold(), Duration::from_secs(5));
        assert!(!config.next_line_preview);
        assert_eq!(config.script_info.title, "My Song");
        assert_eq!(config.script_info.play_res_x, 1280);
    }

    #[test]
    fn negative_fallback_is_rejected() {
        let err = Config::from_toml("final_line_hold = -3.0").unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InvalidDuration {
                field: "final_line_hold",
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml("fallback = 3").unwrap_err(),
            ConvertError::Config(_)
        ));
    }
}
