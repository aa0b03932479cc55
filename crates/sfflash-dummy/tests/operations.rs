//! Bank operations against the emulated chip

use sfflash_core::chip::{Bank, BANK_SIZE};
use sfflash_core::error::{Error, VerifyFailure};
use sfflash_core::flash::{self, NoProgress, ProgramOptions, Progress};
use sfflash_core::protocol::{PollMode, SdpFlash};
use sfflash_dummy::{DummyConfig, DummyFlash, FlashEvent};

/// Records every progress callback
#[derive(Default)]
struct Recorder {
    banks: Vec<Bank>,
    erase: Vec<u32>,
    chip_erases: usize,
    writing: Vec<u32>,
    write: Vec<u32>,
    verifying: Vec<u32>,
    verify: Vec<u32>,
    verified: usize,
}

impl Progress for Recorder {
    fn erasing_bank(&mut self, bank: Bank) {
        self.banks.push(bank);
    }
    fn erase_progress(&mut self, percent: u32) {
        self.erase.push(percent);
    }
    fn erasing_chip(&mut self) {}
    fn chip_erased(&mut self) {
        self.chip_erases += 1;
    }
    fn writing(&mut self, total_bytes: u32) {
        self.writing.push(total_bytes);
    }
    fn write_progress(&mut self, percent: u32) {
        self.write.push(percent);
    }
    fn verifying(&mut self, total_bytes: u32) {
        self.verifying.push(total_bytes);
    }
    fn verify_progress(&mut self, percent: u32) {
        self.verify.push(percent);
    }
    fn verified(&mut self) {
        self.verified += 1;
    }
}

/// Deterministic pseudo-random image
fn test_image(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

fn chip() -> SdpFlash<DummyFlash> {
    SdpFlash::new(DummyFlash::new_default())
}

fn sector_erases(events: &[FlashEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            FlashEvent::SectorErase { sector } => Some(*sector),
            _ => None,
        })
        .collect()
}

fn first_program_address(events: &[FlashEvent]) -> Option<u32> {
    events.iter().find_map(|e| match e {
        FlashEvent::Program { address, .. } => Some(*address),
        _ => None,
    })
}

#[test]
fn test_erase_bank_erases_each_sector_once_in_order() {
    let mut chip = chip();
    let mut progress = Recorder::default();

    flash::erase_bank(&mut chip, Bank::Bank1.address(), &mut progress).unwrap();

    assert_eq!(sector_erases(chip.bus().events()), (128..256).collect::<Vec<_>>());
    assert_eq!(progress.banks, vec![Bank::Bank1]);
    assert_eq!(progress.erase.len(), 128);
    assert_eq!(progress.erase.first(), Some(&0));
    assert_eq!(progress.erase.last(), Some(&100));
    assert!(progress.erase.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_erase_bank_aligns_address() {
    let mut chip = chip();
    flash::erase_bank(&mut chip, 0x0_1234, &mut NoProgress).unwrap();
    assert_eq!(sector_erases(chip.bus().events()), (0..128).collect::<Vec<_>>());
}

#[test]
fn test_erase_bank_leaves_other_bank() {
    let image = test_image(0x10_0000, 7);
    let mut chip = SdpFlash::new(DummyFlash::with_data(DummyConfig::default(), &image));

    flash::erase_bank(&mut chip, Bank::Bank0.address(), &mut NoProgress).unwrap();

    let bytes = chip.bus().to_bytes();
    assert!(bytes[..BANK_SIZE as usize].iter().all(|&b| b == 0xFF));
    assert_eq!(&bytes[BANK_SIZE as usize..], &image[BANK_SIZE as usize..]);
}

#[test]
fn test_erase_chip() {
    let image = test_image(0x10_0000, 3);
    let mut chip = SdpFlash::new(DummyFlash::with_data(DummyConfig::default(), &image));
    let mut progress = Recorder::default();

    flash::erase_chip(&mut chip, &mut progress).unwrap();

    assert!(chip.bus().words().iter().all(|&w| w == 0xFFFF));
    assert_eq!(chip.bus().events(), &[FlashEvent::ChipErase]);
    assert_eq!(progress.chip_erases, 1);
}

#[test]
fn test_program_and_verify_all_sizes() {
    for (len, seed) in [(0x4_0000, 11), (0x8_0000, 12), (0x10_0000, 13)] {
        let image = test_image(len, seed);
        let mut chip = chip();
        let mut progress = Recorder::default();

        flash::program(
            &mut chip,
            &image,
            Bank::Bank0.address(),
            ProgramOptions::default(),
            &mut progress,
        )
        .unwrap();

        assert_eq!(progress.verified, 1, "size {len:#x}");
        assert_eq!(progress.write.last(), Some(&100));
        assert_eq!(progress.verify.last(), Some(&100));
        assert_eq!(chip.bus().rejected_writes(), 0);
        assert_eq!(chip.bus().writes_while_busy(), 0);

        // Independent verify pass agrees
        flash::verify(&mut chip, &image, Bank::Bank0.address(), &mut NoProgress).unwrap();
    }
}

#[test]
fn test_program_reports_each_percent_once() {
    let image = test_image(0x8_0000, 5);
    let mut chip = chip();
    let mut progress = Recorder::default();

    flash::program(
        &mut chip,
        &image,
        Bank::Bank1.address(),
        ProgramOptions { skip_verify: true },
        &mut progress,
    )
    .unwrap();

    assert_eq!(progress.writing, vec![0x8_0000]);
    assert_eq!(progress.write, (0..=100).collect::<Vec<_>>());
}

#[test]
fn test_skip_verify() {
    let image = test_image(0x8_0000, 21);
    let mut chip = chip();
    let mut progress = Recorder::default();

    flash::program(
        &mut chip,
        &image,
        Bank::Bank1.address(),
        ProgramOptions { skip_verify: true },
        &mut progress,
    )
    .unwrap();

    assert!(progress.verifying.is_empty());
    assert_eq!(progress.verified, 0);
}

#[test]
fn test_corrupted_word_reports_address() {
    let image = test_image(0x8_0000, 31);
    let mut chip = chip();
    flash::program(
        &mut chip,
        &image,
        Bank::Bank1.address(),
        ProgramOptions::default(),
        &mut NoProgress,
    )
    .unwrap();

    let address = 0x8_0000 + 0x1_2346;
    let expected = chip.bus().word_at(address);
    let corrupted = !expected;
    chip.bus_mut().words_mut()[(address / 2) as usize] = corrupted;

    let result = flash::verify(&mut chip, &image, Bank::Bank1.address(), &mut NoProgress);
    assert_eq!(
        result,
        Err(Error::Verify(VerifyFailure {
            address,
            expected,
            found: corrupted,
        }))
    );
}

#[test]
fn test_verify_stops_at_first_mismatch() {
    let image = test_image(0x8_0000, 41);
    let mut chip = chip();
    let mut progress = Recorder::default();

    // Erased chip: the first non-0xFFFF word of the image fails
    let first = image
        .chunks_exact(2)
        .position(|w| w != [0xFF, 0xFF])
        .unwrap() as u32
        * 2;

    let result = flash::verify(&mut chip, &image, Bank::Bank0.address(), &mut progress);
    match result {
        Err(Error::Verify(failure)) => {
            assert_eq!(failure.address, first);
            assert_eq!(failure.found, 0xFFFF);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(progress.verified, 0);
}

#[test]
fn test_256k_image_is_mirrored() {
    let image = test_image(0x4_0000, 51);
    let mut chip = chip();

    flash::program(
        &mut chip,
        &image,
        Bank::Bank1.address(),
        ProgramOptions::default(),
        &mut NoProgress,
    )
    .unwrap();

    let bytes = chip.bus().to_bytes();
    assert_eq!(&bytes[0x8_0000..0xC_0000], &image[..]);
    assert_eq!(&bytes[0xC_0000..0x10_0000], &image[..]);
    // Bank 0 untouched
    assert!(bytes[..0x8_0000].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_1m_image_forces_bank_0_and_chip_erase() {
    let image = test_image(0x10_0000, 61);
    let mut chip = chip();

    flash::program(
        &mut chip,
        &image,
        Bank::Bank1.address(),
        ProgramOptions::default(),
        &mut NoProgress,
    )
    .unwrap();

    let events = chip.bus().events();
    assert_eq!(events.first(), Some(&FlashEvent::ChipErase));
    assert!(sector_erases(events).is_empty());
    assert_eq!(first_program_address(events), Some(0));
    assert_eq!(chip.bus().to_bytes(), image);
}

#[test]
fn test_512k_image_uses_bank_erase() {
    let image = test_image(0x8_0000, 71);
    let mut chip = chip();

    flash::program(
        &mut chip,
        &image,
        Bank::Bank0.address(),
        ProgramOptions::default(),
        &mut NoProgress,
    )
    .unwrap();

    let events = chip.bus().events();
    assert!(!events.contains(&FlashEvent::ChipErase));
    assert_eq!(sector_erases(events), (0..128).collect::<Vec<_>>());
    assert_eq!(first_program_address(events), Some(0));
}

#[test]
fn test_rejected_sizes_touch_nothing() {
    for len in [0usize, 131_072, 1_048_577] {
        let image = vec![0u8; len];
        let mut chip = chip();

        let result = flash::program(
            &mut chip,
            &image,
            Bank::Bank1.address(),
            ProgramOptions::default(),
            &mut NoProgress,
        );
        assert_eq!(result, Err(Error::BadImageSize(len)));

        let result = flash::verify(&mut chip, &image, Bank::Bank1.address(), &mut NoProgress);
        assert_eq!(result, Err(Error::BadImageSize(len)));

        assert!(chip.bus().events().is_empty());
        assert!(chip.bus().words().iter().all(|&w| w == 0xFFFF));
    }
}

#[test]
fn test_identify_mismatch_keeps_device_id() {
    let mut chip = SdpFlash::new(DummyFlash::new(DummyConfig {
        manufacturer_id: 0x0001,
        device_id: 0x22DA,
        ..DummyConfig::default()
    }));

    let id = chip.identify();
    assert!(!id.matches_expected());
    assert_eq!(id.device, 0x22DA);
    assert_eq!(
        id.check(),
        Err(Error::IdentityMismatch {
            expected: 0x00BF,
            found: 0x0001
        })
    );

    // Back in array mode afterwards
    assert_eq!(chip.read_word(0), 0xFFFF);
}

#[test]
fn test_stuck_chip_times_out_with_bounded_poll() {
    let mut dummy = DummyFlash::new_default();
    dummy.set_stuck(true);
    let mut chip = SdpFlash::with_poll(dummy, PollMode::Bounded(100));

    let result = flash::erase_bank(&mut chip, Bank::Bank0.address(), &mut NoProgress);
    assert_eq!(result, Err(Error::PollTimeout { address: 0 }));
}

#[test]
fn test_slow_chip_completes() {
    let dummy = DummyFlash::new(DummyConfig {
        busy_reads: 64,
        ..DummyConfig::default()
    });
    let mut chip = SdpFlash::new(dummy);

    chip.write_word(0x8_0000, 0x1234).unwrap();
    assert_eq!(chip.read_word(0x8_0000), 0x1234);
    assert_eq!(chip.bus().writes_while_busy(), 0);
}

#[test]
fn test_command_words_as_data_round_trip() {
    let command_words = [
        0xAAAA, 0x5555, 0xA0A0, 0x8080, 0x5050, 0x1010, 0x9090, 0x9898, 0xF0F0,
    ];

    for word in command_words {
        let image: Vec<u8> = std::iter::repeat(u16::to_ne_bytes(word))
            .take(0x8_0000 / 2)
            .flatten()
            .collect();
        let mut chip = chip();

        flash::program(
            &mut chip,
            &image,
            Bank::Bank1.address(),
            ProgramOptions::default(),
            &mut NoProgress,
        )
        .unwrap_or_else(|e| panic!("word {word:04X}: {e}"));

        assert_eq!(chip.bus().rejected_writes(), 0, "word {word:04X}");
        assert_eq!(&chip.bus().to_bytes()[0x8_0000..], &image[..]);
    }
}

#[test]
fn test_mixed_command_words_at_command_addresses() {
    // Command words land on the unlock addresses themselves
    let mut image = test_image(0x4_0000, 81);
    for (offset, word) in [(0xAAA, 0xAAAA), (0x554, 0x5555), (0xAAC, 0xF0F0), (0x556, 0x9090)] {
        image[offset..offset + 2].copy_from_slice(&u16::to_ne_bytes(word));
    }
    let mut chip = chip();

    flash::program(
        &mut chip,
        &image,
        Bank::Bank0.address(),
        ProgramOptions::default(),
        &mut NoProgress,
    )
    .unwrap();

    assert_eq!(chip.read_word(0xAAA), 0xAAAA);
    assert_eq!(chip.read_word(0x554), 0x5555);
    assert_eq!(chip.read_word(0xAAC), 0xF0F0);
    assert_eq!(chip.read_word(0x4_0000 + 0x556), 0x9090);
}
