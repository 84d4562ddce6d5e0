//! The SC126 motherboard.
//!
//! Owns the CPU and the bus and advances them in timed bursts: a host
//! driver calls [`Sc126::run_burst`] at roughly 100 Hz, each burst
//! executing a fixed number of instructions, advancing the PRT by the
//! cycles that elapsed, pacing host keystrokes into ASCI channel 0 and
//! draining its transmit side to the console.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use emu_core::Cpu;
use zilog_z180::Z180;

use crate::bus::Sc126Bus;
use crate::config::Sc126Config;
use crate::console;
use crate::snapshot;

/// Instructions per burst at the ~100 Hz driver tick.
pub const STEPS_PER_BURST: usize = 5000;

/// Minimum virtual cycles between host bytes fed into ASCI0. RomWBW
/// polls the channel; feeding faster than this drops keys.
pub const INPUT_INTERVAL: u64 = 10_000;

/// Internal I/O window base the firmware expects after reset.
const INTERNAL_BASE: u8 = 0xC0;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// An SC126/SC131 board instance.
pub struct Sc126 {
    cpu: Z180,
    bus: Sc126Bus,
    /// ROM image kept for reloads on reset.
    rom: Vec<u8>,
    /// Where RAM is restored from and persisted to, if anywhere.
    snapshot_path: Option<PathBuf>,
    /// Host bytes waiting to be fed to ASCI0.
    input_queue: VecDeque<u8>,
    /// Cycle stamp of the last byte fed.
    last_fed: u64,
    /// Everything the guest has written to the console.
    transcript: Vec<u8>,
    id: u64,
}

impl Sc126 {
    #[must_use]
    pub fn new(config: &Sc126Config) -> Self {
        let mut bus = Sc126Bus::new();
        bus.mmu.load_rom(&config.rom);
        bus.io.set_base(INTERNAL_BASE);

        if let Some(ref path) = config.snapshot_path
            && let Some(ram) = snapshot::load(path)
        {
            bus.mmu.restore_ram(&ram);
            tracing::info!(path = %path.display(), "RAM snapshot restored");
        }

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::info!(id, rom_len = config.rom.len(), "board constructed");

        Self {
            cpu: Z180::new(),
            bus,
            rom: config.rom.clone(),
            snapshot_path: config.snapshot_path.clone(),
            input_queue: VecDeque::new(),
            last_fed: 0,
            transcript: Vec::new(),
            id,
        }
    }

    /// Unique identifier of this board instance.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Execute one instruction. Returns the cycles consumed.
    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.bus)
    }

    /// Run one timed burst of `steps` instructions.
    ///
    /// After the burst the PRT advances by the elapsed cycles, at most
    /// one queued host byte is delivered to ASCI0, and the bytes the
    /// guest transmitted are returned (and appended to the transcript).
    pub fn run_burst(&mut self, steps: usize) -> Vec<u8> {
        let start = self.cpu.cycles().get();
        for _ in 0..steps {
            self.cpu.step(&mut self.bus);
        }
        let now = self.cpu.cycles().get();
        self.bus.io.prt.step(now - start);

        if !self.input_queue.is_empty() && now.saturating_sub(self.last_fed) >= INPUT_INTERVAL
            && let Some(byte) = self.input_queue.pop_front()
        {
            self.bus.io.asci0.receive(byte);
            self.last_fed = now;
        }

        let out = self.bus.io.asci0.drain_tx();
        self.transcript.extend_from_slice(&out);
        out
    }

    /// Queue one host byte for the guest console.
    pub fn send_byte(&mut self, byte: u8) {
        self.input_queue.push_back(byte);
    }

    /// Queue pasted text, normalizing line endings to carriage returns.
    pub fn paste(&mut self, text: &str) {
        for byte in console::normalize_paste(text) {
            self.input_queue.push_back(byte);
        }
    }

    /// Bytes still waiting in the host input queue.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input_queue.len()
    }

    /// Everything the guest has emitted since construction (or the last
    /// [`Sc126::take_transcript`]).
    #[must_use]
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    /// Drain the console transcript.
    pub fn take_transcript(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.transcript)
    }

    /// Reset the board: CPU state zeroed, MMU and on-chip peripherals
    /// reset, internal window back at the firmware default, input queue
    /// cleared, ROM reloaded. RAM contents survive.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.mmu.reset();
        self.bus.io.reset();
        self.bus.io.set_base(INTERNAL_BASE);
        self.bus.mmu.load_rom(&self.rom);
        self.input_queue.clear();
        tracing::info!(id = self.id, "board reset");
    }

    /// A consistent copy of guest RAM for the snapshot writer.
    #[must_use]
    pub fn ram_snapshot(&self) -> Vec<u8> {
        self.bus.mmu.ram().to_vec()
    }

    /// Restore guest RAM from a snapshot. Anything but an exact-size
    /// image is ignored; returns whether the restore happened.
    pub fn restore_ram(&mut self, data: &[u8]) -> bool {
        self.bus.mmu.restore_ram(data)
    }

    /// Persist RAM to the configured snapshot path, copying first.
    /// A write failure is logged and the emulation continues; without a
    /// configured path this is a no-op.
    pub fn persist_ram(&self) {
        let Some(ref path) = self.snapshot_path else {
            return;
        };
        let ram = self.ram_snapshot();
        if let Err(err) = snapshot::save(path, &ram) {
            tracing::error!(%err, "snapshot write failed, continuing");
        }
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &Z180 {
        &self.cpu
    }

    /// Mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Z180 {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &Sc126Bus {
        &self.bus
    }

    /// Mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut Sc126Bus {
        &mut self.bus
    }

    /// Total virtual cycles executed.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles().get()
    }
}
