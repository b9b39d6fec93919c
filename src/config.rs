use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// How long each slide stays up while the slideshow runs.
    #[serde(with = "humantime_serde")]
    pub delay_time: Duration,
    /// Length of each half of the cross-fade.
    #[serde(with = "humantime_serde")]
    pub animation_duration: Duration,
    /// Scale images to the display area.
    pub fit_to_window: bool,
    /// Resize the window to each image's natural size. Wins over
    /// `fit-to-window` when both are set.
    pub resize_window_to_image: bool,
    /// Where remote images are downloaded before being queued.
    pub download_dir: Option<PathBuf>,
    /// Upper bound on a single remote download.
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    /// Remote images larger than this are refused.
    pub max_download_bytes: u64,
    /// Buffer between the controller task and the UI consumer.
    pub ui_channel_capacity: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            delay_time: Self::default_delay_time(),
            animation_duration: Self::default_animation_duration(),
            fit_to_window: false,
            resize_window_to_image: false,
            download_dir: None,
            fetch_timeout: Self::default_fetch_timeout(),
            max_download_bytes: 64 * 1024 * 1024,
            ui_channel_capacity: 64,
        }
    }
}

impl Configuration {
    const fn default_delay_time() -> Duration {
        Duration::from_secs(5)
    }

    const fn default_animation_duration() -> Duration {
        Duration::from_millis(250)
    }

    const fn default_fetch_timeout() -> Duration {
        Duration::from_secs(30)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.delay_time.is_zero(),
            "delay-time must be greater than zero"
        );
        ensure!(
            !self.fetch_timeout.is_zero(),
            "fetch-timeout must be greater than zero"
        );
        ensure!(
            self.max_download_bytes > 0,
            "max-download-bytes must be greater than zero"
        );
        ensure!(
            self.ui_channel_capacity > 0,
            "ui-channel-capacity must be greater than zero"
        );
        if let Some(dir) = &self.download_dir {
            ensure!(
                !dir.as_os_str().is_empty(),
                "download-dir must not be empty"
            );
        }
        Ok(self)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
