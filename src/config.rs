//! Board configuration file
//!
//! Describes where the card's flash window and the Kickstart ROM live in the
//! host address space:
//!
//! ```toml
//! flash_base = 0xA00000
//! flash_size = "1 MiB"
//! rom_base = 0xF80000
//! rom_size = "512 KiB"
//! poll_limit = 1000000
//! ```
//!
//! Every key is optional. Missing keys take the board defaults.

use std::fs;
use std::path::{Path, PathBuf};

use sfflash_core::chip::{DEFAULT_FLASH_BASE, DEFAULT_ROM_BASE, FLASH_SIZE};
use sfflash_core::flash::ROM_512K;
use sfflash_core::protocol::PollMode;
use thiserror::Error;

/// Errors from loading a board configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unsupported flash size {0:#x}, the card carries 1 MiB")]
    FlashSize(u64),

    #[error("poll_limit must be at least 1")]
    PollLimit,
}

/// Board addresses and driver tuning
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    /// Physical base of the flash window
    #[serde(deserialize_with = "deserialize_number")]
    pub flash_base: u64,
    /// Size of the flash window
    #[serde(deserialize_with = "deserialize_number")]
    pub flash_size: u64,
    /// Physical base of the running Kickstart ROM
    #[serde(deserialize_with = "deserialize_number")]
    pub rom_base: u64,
    /// Bytes copied from the ROM by `--rom`
    #[serde(deserialize_with = "deserialize_number")]
    pub rom_size: u64,
    /// Give up on a busy chip after this many poll pairs
    pub poll_limit: Option<u32>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            flash_base: DEFAULT_FLASH_BASE,
            flash_size: FLASH_SIZE as u64,
            rom_base: DEFAULT_ROM_BASE,
            rom_size: ROM_512K as u64,
            poll_limit: None,
        }
    }
}

impl BoardConfig {
    /// Load a configuration file, or the defaults when `path` is `None`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ParseError::Toml(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseError::Invalid(e) => e,
        })?;

        log::debug!("Loaded board configuration from {}", path.display());
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, ParseError> {
        let config: Self = toml::from_str(content).map_err(ParseError::Toml)?;
        config.validate().map_err(ParseError::Invalid)?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.flash_size != FLASH_SIZE as u64 {
            return Err(ConfigError::FlashSize(self.flash_size));
        }
        if self.poll_limit == Some(0) {
            return Err(ConfigError::PollLimit);
        }
        Ok(())
    }

    /// Poll mode for the chip driver
    pub fn poll_mode(&self) -> PollMode {
        match self.poll_limit {
            Some(limit) => PollMode::Bounded(limit),
            None => PollMode::Unbounded,
        }
    }
}

enum ParseError {
    Toml(toml::de::Error),
    Invalid(ConfigError),
}

/// Deserialize a number given as an integer or a string ("0xA00000", "512 KiB")
fn deserialize_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(u64),
        Str(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n),
        NumberOrString::Str(s) => parse_number(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a hex or decimal number with an optional KiB/MiB suffix
pub fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (digits, multiplier) = if let Some(n) = s.strip_suffix("MiB") {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KiB") {
        (n.trim(), 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('K') {
        (n.trim(), 1024)
    } else {
        (s, 1)
    };

    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).map_err(|e| format!("invalid hex value '{}': {}", s, e))?
    } else {
        digits
            .parse::<u64>()
            .map_err(|e| format!("invalid number '{}': {}", s, e))?
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("value '{}' is too large", s))
}
