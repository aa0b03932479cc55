//! Programmer registration and dispatch
//!
//! A programmer provides the flash window as a [`sfflash_core::bus::FlashBus`] plus a source
//! for the running Kickstart ROM. Which programmers exist is decided at
//! compile time through cargo features.

use std::collections::HashMap;
use std::path::PathBuf;

use sfflash_core::bus::BoxedFlashBus;
use sfflash_core::chip::FLASH_SIZE;
use sfflash_core::protocol::SdpFlash;

use crate::config::{parse_number, BoardConfig};

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
    /// Accepted parameters
    pub params: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "physmap")]
    programmers.push(ProgrammerInfo {
        name: "physmap",
        aliases: &["internal"],
        description: "Card flash window through /dev/mem - requires root",
        params: "base=<addr>,rom=<addr>",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory SST39 emulator for testing",
        params: "manufacturer=<id>,device=<id>,fill=<word>,busy=<reads>,image=<file>,rom=<file>,save=<file>",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:10} - {}\n", p.name, p.description));
    }
    help
}

/// Find the canonical name for a programmer name or alias
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Parsed programmer parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerParams {
    /// Programmer name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl ProgrammerParams {
    fn number(&self, key: &str) -> Result<Option<u64>, Box<dyn std::error::Error>> {
        self.params
            .get(key)
            .map(|v| {
                parse_number(v).map_err(|e| format!("Invalid value for {}: {}", key, e).into())
            })
            .transpose()
    }

    fn word(&self, key: &str) -> Result<Option<u16>, Box<dyn std::error::Error>> {
        match self.number(key)? {
            Some(n) => u16::try_from(n)
                .map(Some)
                .map_err(|_| format!("Value for {} does not fit in 16 bits: {:#x}", key, n).into()),
            None => Ok(None),
        }
    }

    fn path(&self, key: &str) -> Option<PathBuf> {
        self.params.get(key).map(PathBuf::from)
    }

    fn reject_unknown(&self, known: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
        match self.params.keys().find(|k| !known.contains(&k.as_str())) {
            Some(key) => Err(format!(
                "Unknown parameter '{}' for programmer {} (accepted: {})",
                key,
                self.name,
                known.join(", ")
            )
            .into()),
            None => Ok(()),
        }
    }
}

/// Parse a programmer string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// Where `--rom` takes its image from
enum RomSource {
    #[cfg(feature = "physmap")]
    Physical { base: u64, len: usize },
    #[cfg_attr(not(feature = "dummy"), allow(dead_code))]
    Buffer(Vec<u8>),
    #[cfg_attr(not(feature = "dummy"), allow(dead_code))]
    Unavailable(&'static str),
}

/// An opened programmer
pub struct Programmer {
    name: &'static str,
    chip: SdpFlash<BoxedFlashBus>,
    flash_base: u64,
    rom: RomSource,
    save: Option<PathBuf>,
}

impl Programmer {
    fn new(
        name: &'static str,
        bus: BoxedFlashBus,
        flash_base: u64,
        config: &BoardConfig,
        rom: RomSource,
    ) -> Self {
        Self {
            name,
            chip: SdpFlash::with_poll(bus, config.poll_mode()),
            flash_base,
            rom,
            save: None,
        }
    }

    /// Canonical programmer name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Host address of the start of the flash window
    pub fn flash_base(&self) -> u64 {
        self.flash_base
    }

    /// The chip driver
    pub fn chip(&mut self) -> &mut SdpFlash<BoxedFlashBus> {
        &mut self.chip
    }

    /// Copy the running Kickstart ROM
    pub fn read_rom(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        match &self.rom {
            #[cfg(feature = "physmap")]
            RomSource::Physical { base, len } => Ok(sfflash_physmap::read_rom(*base, *len)?),
            RomSource::Buffer(data) => Ok(data.clone()),
            RomSource::Unavailable(hint) => {
                Err(format!("No ROM source for programmer {}: {}", self.name, hint).into())
            }
        }
    }

    /// Release the programmer, saving the flash contents when requested
    pub fn finish(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(path) = self.save.take() else {
            return Ok(());
        };

        let mut data = Vec::with_capacity(FLASH_SIZE as usize);
        for address in (0..FLASH_SIZE).step_by(2) {
            data.extend_from_slice(&self.chip.read_word(address).to_ne_bytes());
        }
        std::fs::write(&path, &data)
            .map_err(|e| format!("Failed to save flash contents to {}: {}", path.display(), e))?;

        log::info!("Saved flash contents to {}", path.display());
        Ok(())
    }
}

/// Open a programmer
///
/// `programmer` is a programmer name optionally followed by parameters
/// (e.g. "physmap:base=0x200000"). Parameters override the board
/// configuration.
pub fn open_programmer(
    programmer: &str,
    config: &BoardConfig,
) -> Result<Programmer, Box<dyn std::error::Error>> {
    let params = parse_programmer_params(programmer)?;

    let Some(name) = find_programmer(&params.name) else {
        return Err(unknown_programmer_error(&params.name));
    };

    match name {
        #[cfg(feature = "physmap")]
        "physmap" => open_physmap(&params, config),

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params, config),

        _ => Err(unknown_programmer_error(&params.name)),
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'sfflash list-programmers' for more details");
    msg.into()
}

#[cfg(feature = "physmap")]
fn open_physmap(
    params: &ProgrammerParams,
    config: &BoardConfig,
) -> Result<Programmer, Box<dyn std::error::Error>> {
    use sfflash_core::chip::{BOARD_MANUFACTURER, BOARD_PRODUCT};

    params.reject_unknown(&["base", "rom"])?;

    let base = params.number("base")?.unwrap_or(config.flash_base);
    let rom_base = params.number("rom")?.unwrap_or(config.rom_base);
    let rom_len = usize::try_from(config.rom_size)?;

    log::info!(
        "Opening flash window of board {}/{} at {:#08x}...",
        BOARD_MANUFACTURER,
        BOARD_PRODUCT,
        base
    );
    let window = sfflash_physmap::FlashWindow::open(base).map_err(|e| {
        format!(
            "{} at {:#08x}: {}\nMake sure the card is present and you have root privileges.",
            sfflash_core::Error::DeviceNotFound,
            base,
            e
        )
    })?;

    Ok(Programmer::new(
        "physmap",
        Box::new(window),
        base,
        config,
        RomSource::Physical {
            base: rom_base,
            len: rom_len,
        },
    ))
}

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &ProgrammerParams,
    config: &BoardConfig,
) -> Result<Programmer, Box<dyn std::error::Error>> {
    use sfflash_dummy::{DummyConfig, DummyFlash};

    params.reject_unknown(&[
        "manufacturer",
        "device",
        "fill",
        "busy",
        "image",
        "rom",
        "save",
    ])?;

    let defaults = DummyConfig::default();
    let dummy_config = DummyConfig {
        manufacturer_id: params.word("manufacturer")?.unwrap_or(defaults.manufacturer_id),
        device_id: params.word("device")?.unwrap_or(defaults.device_id),
        initial_fill: params.word("fill")?.unwrap_or(defaults.initial_fill),
        busy_reads: match params.number("busy")? {
            Some(n) => u32::try_from(n)?,
            None => defaults.busy_reads,
        },
    };

    let flash = match params.path("image") {
        Some(path) => {
            let data = crate::image::load_image(&path)?;
            log::debug!("Preloading dummy flash from {}", path.display());
            DummyFlash::with_data(dummy_config, &data)
        }
        None => DummyFlash::new(dummy_config),
    };

    let rom = match params.path("rom") {
        Some(path) => RomSource::Buffer(crate::image::load_image(&path)?),
        None => RomSource::Unavailable("pass rom=<file>"),
    };

    log::info!("Using dummy flash");
    let mut programmer = Programmer::new("dummy", Box::new(flash), config.flash_base, config, rom);
    programmer.save = params.path("save");
    Ok(programmer)
}
