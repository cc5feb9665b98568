//! Configuration for a capture run.
//!
//! Loads settings from config.json at startup, applies command-line
//! overrides and validates everything against the screen size once. The
//! result is an immutable `CaptureConfig` that is passed to every component.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use serde::Deserialize;

use crate::capture::{CaptureRegion, Rect, RegionPair, Role};
use crate::error::ConfigError;
use crate::input::KeyCode;

/// A region as written in the config file.
///
/// `[x1, x2, y1, y2]` is a full rectangle, `[x1, x2]` keeps the whole screen
/// height and only crops columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RegionSpec {
    Bounds([u32; 4]),
    Columns([u32; 2]),
}

impl RegionSpec {
    /// Resolves the region to absolute bounds on a screen of the given height.
    pub fn to_rect(self, screen_height: u32) -> Rect {
        match self {
            RegionSpec::Bounds([x1, x2, y1, y2]) => Rect { x1, x2, y1, y2 },
            RegionSpec::Columns([x1, x2]) => Rect {
                x1,
                x2,
                y1: 0,
                y2: screen_height,
            },
        }
    }
}

/// Raw contents of config.json.
#[derive(Clone, Debug, Deserialize)]
pub struct FileConfig {
    pub player_region: RegionSpec,
    pub opponent_region: RegionSpec,
    /// Key polling period in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: f64,
    /// Directory that holds the `sequence_<n>` folders
    #[serde(default)]
    pub output_root: Option<PathBuf>,
    #[serde(default = "default_trigger_key")]
    pub trigger_key: String,
    #[serde(default = "default_stop_key")]
    pub stop_key: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_poll_interval() -> f64 {
    0.05
}

fn default_trigger_key() -> String {
    "space".to_string()
}

fn default_stop_key() -> String {
    "f12".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line. They take precedence over the file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub output_root: Option<PathBuf>,
    pub poll_interval_seconds: Option<f64>,
}

/// Validated, immutable run configuration.
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub regions: RegionPair,
    pub poll_interval: Duration,
    pub output_root: PathBuf,
    pub trigger_key: KeyCode,
    pub stop_key: KeyCode,
    pub log_level: LevelFilter,
}

/// Reads and parses a config file.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl FileConfig {
    /// Applies overrides and validates against the screen size.
    ///
    /// `default_root` is used when neither the file nor the overrides name an
    /// output root.
    pub fn validate(
        self,
        overrides: &Overrides,
        screen: (u32, u32),
        default_root: &Path,
    ) -> Result<CaptureConfig, ConfigError> {
        let player =
            CaptureRegion::new(Role::Player, self.player_region.to_rect(screen.1), screen)?;
        let opponent =
            CaptureRegion::new(Role::Opponent, self.opponent_region.to_rect(screen.1), screen)?;

        let seconds = overrides
            .poll_interval_seconds
            .unwrap_or(self.poll_interval_seconds);
        let poll_interval = parse_poll_interval(seconds)?;

        let output_root = overrides
            .output_root
            .clone()
            .or(self.output_root)
            .unwrap_or_else(|| default_root.to_path_buf());

        let log_level = LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::UnknownLogLevel(self.log_level.clone()))?;

        let trigger_key: KeyCode = self.trigger_key.parse()?;
        let stop_key: KeyCode = self.stop_key.parse()?;
        if trigger_key == stop_key {
            return Err(ConfigError::KeyConflict(trigger_key));
        }

        Ok(CaptureConfig {
            regions: RegionPair { player, opponent },
            poll_interval,
            output_root,
            trigger_key,
            stop_key,
            log_level,
        })
    }
}

fn parse_poll_interval(seconds: f64) -> Result<Duration, ConfigError> {
    if seconds.is_nan() || seconds <= 0.0 {
        return Err(ConfigError::InvalidPollInterval(seconds));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| ConfigError::InvalidPollInterval(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SCREEN: (u32, u32) = (1280, 720);

    fn parse(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    fn minimal() -> FileConfig {
        parse(r#"{ "player_region": [0, 600, 450, 625], "opponent_region": [680, 1280] }"#)
    }

    #[test]
    fn test_defaults() {
        let config = minimal()
            .validate(&Overrides::default(), SCREEN, Path::new("out"))
            .unwrap();

        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.output_root, PathBuf::from("out"));
        assert_eq!(config.trigger_key, KeyCode::SPACE);
        assert_eq!(config.stop_key, KeyCode::F12);
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_region_forms() {
        let config = minimal()
            .validate(&Overrides::default(), SCREEN, Path::new("out"))
            .unwrap();

        assert_eq!(
            config.regions.player.rect(),
            Rect { x1: 0, x2: 600, y1: 450, y2: 625 }
        );
        // Column-only form spans the full screen height
        assert_eq!(
            config.regions.opponent.rect(),
            Rect { x1: 680, x2: 1280, y1: 0, y2: 720 }
        );
        assert_eq!(config.regions.opponent.role(), Role::Opponent);
    }

    #[test]
    fn test_region_with_three_values_is_rejected() {
        let result = serde_json::from_str::<FileConfig>(
            r#"{ "player_region": [0, 600, 450], "opponent_region": [0, 10] }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_region_is_fatal() {
        let config = parse(r#"{ "player_region": [0, 600, 450, 625], "opponent_region": [900, 1400] }"#);
        let err = config
            .validate(&Overrides::default(), SCREEN, Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegion { role: Role::Opponent, .. }));
    }

    #[test]
    fn test_invalid_poll_interval() {
        for bad in ["0", "-0.5"] {
            let config = parse(&format!(
                r#"{{ "player_region": [0, 10], "opponent_region": [10, 20], "poll_interval_seconds": {} }}"#,
                bad
            ));
            let err = config
                .validate(&Overrides::default(), SCREEN, Path::new("out"))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPollInterval(_)), "{}", bad);
        }

        let overrides = Overrides {
            poll_interval_seconds: Some(f64::NAN),
            ..Default::default()
        };
        assert!(minimal().validate(&overrides, SCREEN, Path::new("out")).is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = parse(
            r#"{
                "player_region": [0, 600, 450, 625],
                "opponent_region": [680, 1280, 450, 625],
                "poll_interval_seconds": 0.1,
                "output_root": "from_file",
                "trigger_key": "f5",
                "log_level": "debug"
            }"#,
        );
        let overrides = Overrides {
            output_root: Some(PathBuf::from("from_cli")),
            poll_interval_seconds: Some(0.02),
        };

        let config = config.validate(&overrides, SCREEN, Path::new("out")).unwrap();
        assert_eq!(config.output_root, PathBuf::from("from_cli"));
        assert_eq!(config.poll_interval, Duration::from_millis(20));
        assert_eq!(config.trigger_key, KeyCode(0x74));
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_unknown_key_and_level() {
        let config = parse(r#"{ "player_region": [0, 10], "opponent_region": [10, 20], "trigger_key": "meta" }"#);
        let err = config
            .validate(&Overrides::default(), SCREEN, Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));

        let config = parse(r#"{ "player_region": [0, 10], "opponent_region": [10, 20], "log_level": "loud" }"#);
        let err = config
            .validate(&Overrides::default(), SCREEN, Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLogLevel(_)));
    }

    #[test]
    fn test_trigger_and_stop_must_differ() {
        // "enter" and "return" name the same key
        let config = parse(
            r#"{ "player_region": [0, 10], "opponent_region": [10, 20], "trigger_key": "enter", "stop_key": "return" }"#,
        );
        let err = config
            .validate(&Overrides::default(), SCREEN, Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::KeyConflict(KeyCode(0x0D))));

        let config = parse(r#"{ "player_region": [0, 10], "opponent_region": [10, 20], "stop_key": "space" }"#);
        assert!(config.validate(&Overrides::default(), SCREEN, Path::new("out")).is_err());
    }

    #[test]
    fn test_load_file_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let err = load_file_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        std::fs::write(&path, "{ not json").unwrap();
        let err = load_file_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        std::fs::write(&path, r#"{ "player_region": [0, 10], "opponent_region": [10, 20] }"#)
            .unwrap();
        let config = load_file_config(&path).unwrap();
        assert_eq!(config.player_region, RegionSpec::Columns([0, 10]));
    }
}
