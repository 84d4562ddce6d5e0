//! Board configuration.

use std::path::PathBuf;

/// Which board variant to emulate.
///
/// The two differ in on-board peripherals that sit outside this core
/// (RTC, second serial header); the emulated behavior is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sc126Model {
    Sc126,
    Sc131,
}

/// Configuration for building an [`crate::Sc126`] board.
#[derive(Clone)]
pub struct Sc126Config {
    pub model: Sc126Model,
    /// ROM image, up to 512 KiB; shorter images are zero-padded.
    pub rom: Vec<u8>,
    /// Where the RAM snapshot lives, if persistence is wanted. The
    /// board restores from it at construction and `persist_ram`
    /// writes back to it.
    pub snapshot_path: Option<PathBuf>,
}

impl Sc126Config {
    #[must_use]
    pub fn new(rom: Vec<u8>) -> Self {
        Self {
            model: Sc126Model::Sc126,
            rom,
            snapshot_path: None,
        }
    }
}
