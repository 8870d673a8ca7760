//! MFRC522 proximity reader over SPI.
//!
//! Implements [`BadgeReaderPort`] for ISO 14443A cards: REQA wake-up,
//! cascaded anticollision/select for 4, 7 and 10 byte UIDs, and HLTA.
//! Register access follows the MFRC522 datasheet SPI framing
//! (address byte `0b1AAAAAA0` for reads, `0b0AAAAAA0` for writes).
//!
//! Every bus or protocol failure reads as "no card" at the port boundary;
//! the next poll simply tries again.

use embedded_hal::spi::SpiDevice;
use log::{debug, info, warn};

use crate::app::ports::{BadgeReaderPort, MAX_UID_BYTES, RawUid};

// ── Registers ─────────────────────────────────────────────────

mod reg {
    pub const COMMAND: u8 = 0x01;
    pub const COM_IRQ: u8 = 0x04;
    pub const DIV_IRQ: u8 = 0x05;
    pub const ERROR: u8 = 0x06;
    pub const STATUS2: u8 = 0x08;
    pub const FIFO_DATA: u8 = 0x09;
    pub const FIFO_LEVEL: u8 = 0x0A;
    pub const BIT_FRAMING: u8 = 0x0D;
    pub const COLL: u8 = 0x0E;
    pub const MODE: u8 = 0x11;
    pub const TX_MODE: u8 = 0x12;
    pub const RX_MODE: u8 = 0x13;
    pub const TX_CONTROL: u8 = 0x14;
    pub const TX_ASK: u8 = 0x15;
    pub const CRC_RESULT_H: u8 = 0x21;
    pub const CRC_RESULT_L: u8 = 0x22;
    pub const MOD_WIDTH: u8 = 0x24;
    pub const T_MODE: u8 = 0x2A;
    pub const T_PRESCALER: u8 = 0x2B;
    pub const T_RELOAD_H: u8 = 0x2C;
    pub const T_RELOAD_L: u8 = 0x2D;
    pub const VERSION: u8 = 0x37;
}

mod cmd {
    pub const IDLE: u8 = 0x00;
    pub const CALC_CRC: u8 = 0x03;
    pub const TRANSCEIVE: u8 = 0x0C;
    pub const SOFT_RESET: u8 = 0x0F;
}

mod picc {
    pub const REQA: u8 = 0x26;
    pub const SEL_CL1: u8 = 0x93;
    pub const SEL_CL2: u8 = 0x95;
    pub const SEL_CL3: u8 = 0x97;
    pub const HLTA: u8 = 0x50;
    pub const CASCADE_TAG: u8 = 0x88;
}

/// Poll budget for command completion.  The on-chip timer (25 ms) expires
/// well before this runs out.
const POLL_BUDGET: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderError {
    Spi,
    Timeout,
    Protocol,
    Collision,
    Crc,
    /// Block check character mismatch in an anticollision answer.
    Bcc,
}

pub const fn read_address(register: u8) -> u8 {
    ((register << 1) & 0x7E) | 0x80
}

pub const fn write_address(register: u8) -> u8 {
    (register << 1) & 0x7E
}

/// Anticollision answer: four UID bytes plus their XOR.
pub fn bcc_ok(answer: &[u8; 5]) -> bool {
    answer[..4].iter().fold(0u8, |acc, b| acc ^ b) == answer[4]
}

/// UID bytes carried by one cascade level.  A leading cascade tag means the
/// UID continues at the next level and only three bytes belong to it.
pub fn level_uid_bytes(answer: &[u8; 5]) -> &[u8] {
    if answer[0] == picc::CASCADE_TAG {
        &answer[1..4]
    } else {
        &answer[..4]
    }
}

pub struct Mfrc522<S: SpiDevice> {
    spi: S,
}

impl<S: SpiDevice> Mfrc522<S> {
    /// Reset the chip, configure the timeout timer and switch the antenna on.
    pub fn new(spi: S) -> Result<Self, ReaderError> {
        let mut dev = Self { spi };
        dev.write(reg::COMMAND, cmd::SOFT_RESET)?;
        let mut budget = POLL_BUDGET;
        while dev.read(reg::COMMAND)? & 0x10 != 0 {
            budget -= 1;
            if budget == 0 {
                return Err(ReaderError::Timeout);
            }
        }
        dev.write(reg::TX_MODE, 0x00)?;
        dev.write(reg::RX_MODE, 0x00)?;
        dev.write(reg::MOD_WIDTH, 0x26)?;
        // TAuto, prescaler 0xA9 → 40 kHz, reload 1000 → 25 ms
        dev.write(reg::T_MODE, 0x80)?;
        dev.write(reg::T_PRESCALER, 0xA9)?;
        dev.write(reg::T_RELOAD_H, 0x03)?;
        dev.write(reg::T_RELOAD_L, 0xE8)?;
        dev.write(reg::TX_ASK, 0x40)?;
        dev.write(reg::MODE, 0x3D)?;
        dev.set_bits(reg::TX_CONTROL, 0x03)?;
        let version = dev.read(reg::VERSION)?;
        info!("MFRC522: ready (version 0x{:02X})", version);
        Ok(dev)
    }

    // ── Register access ───────────────────────────────────────

    fn read(&mut self, register: u8) -> Result<u8, ReaderError> {
        let mut buf = [read_address(register), 0];
        self.spi.transfer_in_place(&mut buf).map_err(|_| ReaderError::Spi)?;
        Ok(buf[1])
    }

    fn write(&mut self, register: u8, value: u8) -> Result<(), ReaderError> {
        self.spi
            .write(&[write_address(register), value])
            .map_err(|_| ReaderError::Spi)
    }

    fn write_fifo(&mut self, data: &[u8]) -> Result<(), ReaderError> {
        for &b in data {
            self.write(reg::FIFO_DATA, b)?;
        }
        Ok(())
    }

    fn set_bits(&mut self, register: u8, mask: u8) -> Result<(), ReaderError> {
        let v = self.read(register)?;
        self.write(register, v | mask)
    }

    fn clear_bits(&mut self, register: u8, mask: u8) -> Result<(), ReaderError> {
        let v = self.read(register)?;
        self.write(register, v & !mask)
    }

    // ── Transceive ────────────────────────────────────────────

    /// Send `tx` (last byte carrying `tx_last_bits`, 0 = all 8) and collect
    /// the answer into `rx`.  Returns the number of bytes received.
    fn transceive(&mut self, tx: &[u8], rx: &mut [u8], tx_last_bits: u8) -> Result<usize, ReaderError> {
        self.write(reg::COMMAND, cmd::IDLE)?;
        self.write(reg::COM_IRQ, 0x7F)?;
        self.write(reg::FIFO_LEVEL, 0x80)?;
        self.write_fifo(tx)?;
        self.write(reg::BIT_FRAMING, tx_last_bits & 0x07)?;
        self.write(reg::COMMAND, cmd::TRANSCEIVE)?;
        self.set_bits(reg::BIT_FRAMING, 0x80)?;

        let mut budget = POLL_BUDGET;
        loop {
            let irq = self.read(reg::COM_IRQ)?;
            if irq & 0x30 != 0 {
                break;
            }
            if irq & 0x01 != 0 {
                return Err(ReaderError::Timeout);
            }
            budget -= 1;
            if budget == 0 {
                return Err(ReaderError::Timeout);
            }
        }

        let err = self.read(reg::ERROR)?;
        if err & 0x13 != 0 {
            return Err(ReaderError::Protocol);
        }
        if err & 0x08 != 0 {
            return Err(ReaderError::Collision);
        }

        let level = self.read(reg::FIFO_LEVEL)? as usize;
        let n = level.min(rx.len());
        for slot in rx.iter_mut().take(n) {
            *slot = self.read(reg::FIFO_DATA)?;
        }
        Ok(n)
    }

    fn crc(&mut self, data: &[u8]) -> Result<[u8; 2], ReaderError> {
        self.write(reg::COMMAND, cmd::IDLE)?;
        self.write(reg::DIV_IRQ, 0x04)?;
        self.write(reg::FIFO_LEVEL, 0x80)?;
        self.write_fifo(data)?;
        self.write(reg::COMMAND, cmd::CALC_CRC)?;
        let mut budget = POLL_BUDGET;
        while self.read(reg::DIV_IRQ)? & 0x04 == 0 {
            budget -= 1;
            if budget == 0 {
                return Err(ReaderError::Timeout);
            }
        }
        self.write(reg::COMMAND, cmd::IDLE)?;
        Ok([self.read(reg::CRC_RESULT_L)?, self.read(reg::CRC_RESULT_H)?])
    }

    // ── PICC commands ─────────────────────────────────────────

    fn request_a(&mut self) -> Result<(), ReaderError> {
        self.clear_bits(reg::COLL, 0x80)?;
        let mut atqa = [0u8; 2];
        let n = self.transceive(&[picc::REQA], &mut atqa, 7)?;
        if n != 2 {
            return Err(ReaderError::Protocol);
        }
        Ok(())
    }

    fn select_level(&mut self, sel: u8) -> Result<([u8; 5], bool), ReaderError> {
        let mut answer = [0u8; 5];
        let n = self.transceive(&[sel, 0x20], &mut answer, 0)?;
        if n != 5 {
            return Err(ReaderError::Protocol);
        }
        if !bcc_ok(&answer) {
            return Err(ReaderError::Bcc);
        }

        let mut frame = [sel, 0x70, answer[0], answer[1], answer[2], answer[3], answer[4], 0, 0];
        let crc = self.crc(&frame[..7])?;
        frame[7] = crc[0];
        frame[8] = crc[1];
        let mut sak = [0u8; 3];
        let n = self.transceive(&frame, &mut sak, 0)?;
        if n != 3 {
            return Err(ReaderError::Protocol);
        }
        if self.crc(&sak[..1])? != [sak[1], sak[2]] {
            return Err(ReaderError::Crc);
        }
        // SAK bit 2: UID not complete, continue at the next cascade level.
        Ok((answer, sak[0] & 0x04 != 0))
    }

    fn read_uid_inner(&mut self) -> Result<RawUid, ReaderError> {
        let mut uid = RawUid::new();
        for sel in [picc::SEL_CL1, picc::SEL_CL2, picc::SEL_CL3] {
            let (answer, more) = self.select_level(sel)?;
            let bytes = if more { level_uid_bytes(&answer) } else { &answer[..4] };
            uid.extend_from_slice(bytes).map_err(|_| ReaderError::Protocol)?;
            if !more {
                return Ok(uid);
            }
        }
        Err(ReaderError::Protocol)
    }

    fn halt_inner(&mut self) -> Result<(), ReaderError> {
        let mut frame = [picc::HLTA, 0x00, 0, 0];
        let crc = self.crc(&frame[..2])?;
        frame[2] = crc[0];
        frame[3] = crc[1];
        let mut none = [0u8; 1];
        // A halted card stays silent; only an answer is an error.
        let halted = match self.transceive(&frame, &mut none, 0) {
            Err(ReaderError::Timeout) => Ok(()),
            Ok(_) => Err(ReaderError::Protocol),
            Err(e) => Err(e),
        };
        // Crypto1 off
        self.clear_bits(reg::STATUS2, 0x08)?;
        halted
    }
}

impl<S: SpiDevice> BadgeReaderPort for Mfrc522<S> {
    fn is_new_card_present(&mut self) -> bool {
        match self.request_a() {
            Ok(()) => true,
            Err(ReaderError::Timeout) => false,
            Err(e) => {
                debug!("MFRC522: REQA {:?}", e);
                // Several cards answering at once still means a card is there.
                e == ReaderError::Collision
            }
        }
    }

    fn read_uid(&mut self) -> Option<RawUid> {
        match self.read_uid_inner() {
            Ok(uid) if uid.len() <= MAX_UID_BYTES => Some(uid),
            Ok(_) => None,
            Err(e) => {
                debug!("MFRC522: select failed: {:?}", e);
                None
            }
        }
    }

    fn halt(&mut self) {
        if let Err(e) = self.halt_inner() {
            warn!("MFRC522: halt failed: {:?}", e);
        }
    }
}
