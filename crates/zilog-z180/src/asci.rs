//! ASCI: one of the Z180's two on-chip async serial channels.
//!
//! Transmission is instantaneous from the guest's point of view: TDRE is
//! always asserted and written bytes queue for the host to drain. On the
//! receive side bytes queue behind an optional single-byte latch that
//! models the receive data register proper.

use std::collections::VecDeque;

/// STAT: transmit data register empty (always set here).
pub const STAT_TDRE: u8 = 0x02;

/// STAT: data carrier detect (always asserted).
pub const STAT_DCD: u8 = 0x04;

/// STAT bit 0: transmit interrupt enable.
pub const STAT_TIE: u8 = 0x01;

/// STAT / CNTLA bit 3: receive interrupt enable.
pub const RIE: u8 = 0x08;

/// STAT: receive data register full.
pub const STAT_RDRF: u8 = 0x80;

/// One ASCI channel.
pub struct Asci {
    cntla: u8,
    cntlb: u8,
    asext: u8,
    ier: u8,
    tie: bool,
    rie: bool,
    /// The receive data register: holds the byte most recently promoted
    /// from the queue.
    latch: Option<u8>,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl Asci {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cntla: 0,
            cntlb: 0,
            asext: 0,
            ier: 0,
            tie: false,
            rie: false,
            latch: None,
            rx: VecDeque::new(),
            tx: Vec::new(),
        }
    }

    /// Reset control registers. Queued bytes are dropped.
    pub fn reset(&mut self) {
        self.cntla = 0;
        self.cntlb = 0;
        self.asext = 0;
        self.ier = 0;
        self.tie = false;
        self.rie = false;
        self.latch = None;
        self.rx.clear();
        self.tx.clear();
    }

    pub fn write_cntla(&mut self, value: u8) {
        self.cntla = value;
        self.rie = value & RIE != 0;
    }

    #[must_use]
    pub fn read_cntla(&self) -> u8 {
        self.cntla
    }

    pub fn write_cntlb(&mut self, value: u8) {
        self.cntlb = value;
    }

    #[must_use]
    pub fn read_cntlb(&self) -> u8 {
        self.cntlb
    }

    /// Read STAT, computed on the fly.
    ///
    /// TDRE and DCD are always set, RDRF reflects buffered receive data.
    /// Reading promotes the head of the receive queue into the data
    /// register latch; a second read with the latch occupied is a no-op.
    pub fn read_stat(&mut self) -> u8 {
        self.promote_rx();

        let mut stat = STAT_TDRE | STAT_DCD;
        if self.latch.is_some() || !self.rx.is_empty() {
            stat |= STAT_RDRF;
        }
        if self.rie {
            stat |= RIE;
        }
        if self.tie {
            stat |= STAT_TIE;
        }
        stat
    }

    /// Write STAT. Only TIE and RIE are writable; RIE mirrors back into
    /// CNTLA bit 3.
    pub fn write_stat(&mut self, value: u8) {
        self.tie = value & STAT_TIE != 0;
        self.rie = value & RIE != 0;
        self.cntla = (self.cntla & !RIE) | (value & RIE);
    }

    /// Read the receive data register.
    ///
    /// Returns the latched byte if present, else pops the queue head,
    /// else 0.
    pub fn read_rdr(&mut self) -> u8 {
        if let Some(byte) = self.latch.take() {
            return byte;
        }
        self.rx.pop_front().unwrap_or(0)
    }

    /// Write the transmit data register.
    pub fn write_tdr(&mut self, value: u8) {
        self.tx.push(value);
    }

    pub fn write_asext(&mut self, value: u8) {
        self.asext = value;
    }

    #[must_use]
    pub fn read_asext(&self) -> u8 {
        self.asext
    }

    pub fn write_ier(&mut self, value: u8) {
        self.ier = value;
    }

    #[must_use]
    pub fn read_ier(&self) -> u8 {
        self.ier
    }

    /// Queue a byte arriving from the host console.
    pub fn receive(&mut self, byte: u8) {
        self.rx.push_back(byte);
    }

    /// Take everything the guest has transmitted so far.
    pub fn drain_tx(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }

    /// True when a receive interrupt should be requested.
    #[must_use]
    pub fn interrupt_pending(&self) -> bool {
        self.rie && (self.latch.is_some() || !self.rx.is_empty())
    }

    fn promote_rx(&mut self) {
        if self.latch.is_none() {
            self.latch = self.rx.pop_front();
        }
    }
}

impl Default for Asci {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_reset_shape() {
        let mut asci = Asci::new();
        let stat = asci.read_stat();
        assert_ne!(stat & STAT_TDRE, 0);
        assert_ne!(stat & STAT_DCD, 0);
        assert_eq!(stat & STAT_RDRF, 0);
    }

    #[test]
    fn rdrf_tracks_buffered_data() {
        let mut asci = Asci::new();
        asci.receive(0x5A);
        assert_ne!(asci.read_stat() & STAT_RDRF, 0);
        assert_eq!(asci.read_rdr(), 0x5A);
        assert_eq!(asci.read_stat() & STAT_RDRF, 0);
        assert_eq!(asci.read_rdr(), 0);
    }

    #[test]
    fn stat_read_latches_head_idempotently() {
        let mut asci = Asci::new();
        asci.receive(1);
        asci.receive(2);
        asci.read_stat();
        asci.read_stat(); // latch already occupied; no byte lost
        assert_eq!(asci.read_rdr(), 1);
        assert_eq!(asci.read_rdr(), 2);
    }

    #[test]
    fn rie_mirrors_between_cntla_and_stat() {
        let mut asci = Asci::new();
        asci.write_cntla(RIE);
        assert_ne!(asci.read_stat() & RIE, 0);

        asci.write_stat(0);
        assert_eq!(asci.read_cntla() & RIE, 0);
        assert_eq!(asci.read_stat() & RIE, 0);
    }

    #[test]
    fn interrupt_requires_rie_and_data() {
        let mut asci = Asci::new();
        assert!(!asci.interrupt_pending());
        asci.receive(0x41);
        assert!(!asci.interrupt_pending());
        asci.write_cntla(RIE);
        assert!(asci.interrupt_pending());
        asci.read_rdr();
        assert!(!asci.interrupt_pending());
    }

    #[test]
    fn tx_drains_in_order() {
        let mut asci = Asci::new();
        asci.write_tdr(b'O');
        asci.write_tdr(b'K');
        assert_eq!(asci.drain_tx(), b"OK");
        assert!(asci.drain_tx().is_empty());
    }
}
