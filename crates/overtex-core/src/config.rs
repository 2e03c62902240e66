#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`EngineConfig`] carries everything that must be agreed with the native
//! consumer before the first surface is created: the channel permutation,
//! the pixel width, the row orientation of the backing store, and how the
//! dirty-rect encoder behaves when its output buffer is too small.
//!
//! Values come from `Default`, from the `with_*` builder methods, or from the
//! process environment:
//!
//! | Variable                  | Values                                   |
//! |---------------------------|------------------------------------------|
//! | `OVERTEX_CHANNEL_ORDER`   | `rgba`, `bgra`, `argb`, `abgr`           |
//! | `OVERTEX_PIXEL_BYTES`     | `3`, `4`                                 |
//! | `OVERTEX_BOTTOM_UP`       | `1/0`, `true/false`, `yes/no`, `on/off`  |
//! | `OVERTEX_OVERFLOW`        | `discard`, `retain`                      |
//! | `OVERTEX_MAX_DIRTY_RECTS` | positive integer                         |

use core::fmt;
use core::str::FromStr;

use crate::pixel::{ChannelOrder, PixelFormat};

/// Environment variable selecting the channel order.
pub const ENV_CHANNEL_ORDER: &str = "OVERTEX_CHANNEL_ORDER";
/// Environment variable selecting 3- or 4-byte pixels.
pub const ENV_PIXEL_BYTES: &str = "OVERTEX_PIXEL_BYTES";
/// Environment variable selecting bottom-up row storage.
pub const ENV_BOTTOM_UP: &str = "OVERTEX_BOTTOM_UP";
/// Environment variable selecting the dirty-rect overflow policy.
pub const ENV_OVERFLOW: &str = "OVERTEX_OVERFLOW";
/// Environment variable sizing the per-frame dirty-rect buffer.
pub const ENV_MAX_DIRTY_RECTS: &str = "OVERTEX_MAX_DIRTY_RECTS";

/// Default capacity (in rectangles) of the per-frame dirty-rect buffer.
pub const DEFAULT_MAX_DIRTY_RECTS: usize = 64;

/// Errors raised while building a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Channel order name is not one of the presets.
    UnknownChannelOrder(String),
    /// Channel offsets are not a permutation of `0..4`.
    InvalidChannelOffsets([u8; 4]),
    /// Pixel width other than 3 or 4.
    InvalidPixelBytes(String),
    /// Overflow policy name is not recognized.
    UnknownOverflowPolicy(String),
    /// A variable that should hold a boolean doesn't.
    InvalidBool {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
    /// A variable that should hold a positive integer doesn't.
    InvalidCount {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChannelOrder(name) => write!(f, "unknown channel order: {name:?}"),
            Self::InvalidChannelOffsets(offsets) => {
                write!(f, "channel offsets {offsets:?} are not a permutation of 0..4")
            }
            Self::InvalidPixelBytes(value) => {
                write!(f, "pixel width must be 3 or 4 bytes, got {value:?}")
            }
            Self::UnknownOverflowPolicy(name) => write!(f, "unknown overflow policy: {name:?}"),
            Self::InvalidBool { key, value } => write!(f, "{key}: expected a boolean, got {value:?}"),
            Self::InvalidCount { key, value } => {
                write!(f, "{key}: expected a positive integer, got {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// What the dirty-rect encoder does with pending rectangles when the output
/// buffer cannot hold them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OverflowPolicy {
    /// Empty the region list anyway. The consumer is expected to fall back
    /// to a full redraw on the next frame.
    #[default]
    Discard,
    /// Keep the pending rectangles until an encode succeeds.
    Retain,
}

impl FromStr for OverflowPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "retain" => Ok(Self::Retain),
            other => Err(ConfigError::UnknownOverflowPolicy(other.to_string())),
        }
    }
}

/// Process-wide engine settings, fixed before any surface exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Logical channel to byte offset mapping shared with the consumer.
    pub channel_order: ChannelOrder,
    /// Pixel width of surfaces created from this config.
    pub pixel_format: PixelFormat,
    /// Store rows bottom-up (GL texture convention).
    pub bottom_up: bool,
    /// Dirty-rect encoder behavior on buffer overflow.
    pub overflow_policy: OverflowPolicy,
    /// Capacity of the per-frame dirty-rect buffer, in rectangles.
    pub max_dirty_rects: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_order: ChannelOrder::RGBA,
            pixel_format: PixelFormat::Rgba,
            bottom_up: false,
            overflow_policy: OverflowPolicy::Discard,
            max_dirty_rects: DEFAULT_MAX_DIRTY_RECTS,
        }
    }
}

impl EngineConfig {
    /// Set the channel order.
    #[must_use]
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    /// Set the pixel format.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Set bottom-up row storage.
    #[must_use]
    pub fn with_bottom_up(mut self, bottom_up: bool) -> Self {
        self.bottom_up = bottom_up;
        self
    }

    /// Set the overflow policy.
    #[must_use]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Set the per-frame dirty-rect capacity (clamped to at least 1).
    #[must_use]
    pub fn with_max_dirty_rects(mut self, max: usize) -> Self {
        self.max_dirty_rects = max.max(1);
        self
    }

    /// Read overrides from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read overrides using a custom environment lookup (for tests).
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = get_env(ENV_CHANNEL_ORDER) {
            config.channel_order = value.parse()?;
        }
        if let Some(value) = get_env(ENV_PIXEL_BYTES) {
            config.pixel_format = value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(PixelFormat::from_bytes_per_pixel)
                .ok_or(ConfigError::InvalidPixelBytes(value))?;
        }
        if let Some(value) = get_env(ENV_BOTTOM_UP) {
            config.bottom_up = parse_bool(ENV_BOTTOM_UP, &value)?;
        }
        if let Some(value) = get_env(ENV_OVERFLOW) {
            config.overflow_policy = value.parse()?;
        }
        if let Some(value) = get_env(ENV_MAX_DIRTY_RECTS) {
            config.max_dirty_rects = match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidCount {
                        key: ENV_MAX_DIRTY_RECTS,
                        value,
                    });
                }
            };
        }

        crate::debug!(
            channel_order = ?config.channel_order,
            pixel_bytes = config.pixel_format.bytes_per_pixel(),
            bottom_up = config.bottom_up,
            max_dirty_rects = config.max_dirty_rects,
            "engine config resolved"
        );
        Ok(config)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_env_gives_defaults() {
        let config = EngineConfig::from_env_with(env(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn env_overrides_every_field() {
        let config = EngineConfig::from_env_with(env(&[
            (ENV_CHANNEL_ORDER, "bgra"),
            (ENV_PIXEL_BYTES, "3"),
            (ENV_BOTTOM_UP, "yes"),
            (ENV_OVERFLOW, "retain"),
            (ENV_MAX_DIRTY_RECTS, "128"),
        ]))
        .unwrap();
        assert_eq!(config.channel_order, ChannelOrder::BGRA);
        assert_eq!(config.pixel_format, PixelFormat::Rgb);
        assert!(config.bottom_up);
        assert_eq!(config.overflow_policy, OverflowPolicy::Retain);
        assert_eq!(config.max_dirty_rects, 128);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            EngineConfig::from_env_with(env(&[(ENV_CHANNEL_ORDER, "rgb")])),
            Err(ConfigError::UnknownChannelOrder(_))
        ));
        assert!(matches!(
            EngineConfig::from_env_with(env(&[(ENV_PIXEL_BYTES, "2")])),
            Err(ConfigError::InvalidPixelBytes(_))
        ));
        assert!(matches!(
            EngineConfig::from_env_with(env(&[(ENV_BOTTOM_UP, "maybe")])),
            Err(ConfigError::InvalidBool { .. })
        ));
        assert!(matches!(
            EngineConfig::from_env_with(env(&[(ENV_MAX_DIRTY_RECTS, "0")])),
            Err(ConfigError::InvalidCount { .. })
        ));
        assert!(matches!(
            EngineConfig::from_env_with(env(&[(ENV_OVERFLOW, "drop")])),
            Err(ConfigError::UnknownOverflowPolicy(_))
        ));
    }

    #[test]
    fn builder_clamps_capacity() {
        let config = EngineConfig::default().with_max_dirty_rects(0);
        assert_eq!(config.max_dirty_rects, 1);
    }

    #[test]
    fn error_display_names_the_variable() {
        let err = ConfigError::InvalidBool {
            key: ENV_BOTTOM_UP,
            value: "maybe".into(),
        };
        assert!(err.to_string().contains(ENV_BOTTOM_UP));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip_uses_lowercase_policy() {
        let config = EngineConfig::default().with_overflow_policy(OverflowPolicy::Retain);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"retain\""));
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
