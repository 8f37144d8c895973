//! LC-3 memory subsystem.
//!
//! The full 16-bit address space is backed: 65536 words, every address
//! valid. Two addresses are intercepted as memory-mapped keyboard device
//! registers; everything else is plain storage with no protected regions.

use std::io;

use thiserror::Error;

use crate::io::Keyboard;

/// Number of addressable words.
pub const MEMORY_SIZE: usize = 1 << 16;

/// Keyboard status register. Bit 15 set iff a key is pending.
pub const KBSR: u16 = 0xFE00;

/// Keyboard data register. Holds the most recently latched key.
pub const KBDR: u16 = 0xFE02;

/// Ready bit asserted in KBSR when input is available.
pub const KEY_READY: u16 = 1 << 15;

/// LC-3 memory: 65536 sixteen-bit words.
#[derive(Clone)]
pub struct Memory {
    words: Vec<u16>,
}

impl Memory {
    /// Create a new memory with all words zeroed.
    pub fn new() -> Self {
        Self {
            words: vec![0; MEMORY_SIZE],
        }
    }

    /// Device-aware read.
    ///
    /// Reading KBSR polls the keyboard without blocking and latches the
    /// result into both device registers before returning the status
    /// word; this is the one read with a side effect, which is why the
    /// keyboard collaborator appears in the signature. Any other address
    /// (KBDR included) is a plain lookup.
    pub fn read(&mut self, addr: u16, keyboard: &mut dyn Keyboard) -> io::Result<u16> {
        if addr == KBSR {
            match keyboard.poll()? {
                Some(key) => {
                    self.words[KBSR as usize] = KEY_READY;
                    self.words[KBDR as usize] = key as u16;
                }
                None => {
                    self.words[KBSR as usize] = 0;
                }
            }
        }
        Ok(self.words[addr as usize])
    }

    /// Plain lookup with no device poll. Used where the architecture
    /// walks memory directly, e.g. the PUTS/PUTSP string traps.
    #[inline]
    pub fn fetch(&self, addr: u16) -> u16 {
        self.words[addr as usize]
    }

    /// Write a word. Every address is writable, device registers too.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u16) {
        self.words[addr as usize] = value;
    }

    /// Load a program image from its raw bytes.
    ///
    /// The first big-endian word is the load origin; the remaining
    /// big-endian words are placed contiguously from there. Words past
    /// the top of the address space are dropped, as is a trailing odd
    /// byte. Overlapping an earlier image simply overwrites it.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<LoadedImage, ImageError> {
        if bytes.len() < 2 {
            return Err(ImageError::MissingOrigin);
        }
        let origin = u16::from_be_bytes([bytes[0], bytes[1]]);

        let mut addr = origin as usize;
        let mut count = 0;
        for pair in bytes[2..].chunks_exact(2) {
            if addr >= MEMORY_SIZE {
                break;
            }
            self.words[addr] = u16::from_be_bytes([pair[0], pair[1]]);
            addr += 1;
            count += 1;
        }

        Ok(LoadedImage { origin, words: count })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.words.iter().filter(|&&w| w != 0).count();
        f.debug_struct("Memory")
            .field("non_zero_words", &non_zero)
            .field("total_words", &MEMORY_SIZE)
            .finish()
    }
}

/// Placement of a successfully loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    /// Address the first word was placed at.
    pub origin: u16,
    /// Number of words actually stored.
    pub words: usize,
}

/// Errors that can occur while loading a program image.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("image too short: missing origin word")]
    MissingOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::QueuedKeyboard;

    #[test]
    fn test_read_write() {
        let mut mem = Memory::new();
        mem.write(0x1234, 42);
        assert_eq!(mem.fetch(0x1234), 42);
    }

    #[test]
    fn test_plain_read_has_no_side_effect() {
        let mut mem = Memory::new();
        let mut kb = QueuedKeyboard::new(*b"x");
        mem.write(0x4000, 7);
        assert_eq!(mem.read(0x4000, &mut kb).unwrap(), 7);
        // The pending key was not consumed.
        assert!(!kb.is_empty());
    }

    #[test]
    fn test_kbsr_read_latches_key() {
        let mut mem = Memory::new();
        let mut kb = QueuedKeyboard::new(*b"k");

        let status = mem.read(KBSR, &mut kb).unwrap();
        assert_eq!(status, KEY_READY);
        assert_eq!(mem.read(KBDR, &mut kb).unwrap(), b'k' as u16);
        assert!(kb.is_empty());
    }

    #[test]
    fn test_kbsr_read_clears_when_idle() {
        let mut mem = Memory::new();
        let mut kb = QueuedKeyboard::default();

        // Simulate a stale ready bit from an earlier poll.
        mem.write(KBSR, KEY_READY);
        assert_eq!(mem.read(KBSR, &mut kb).unwrap(), 0);
    }

    #[test]
    fn test_load_image_origin_and_order() {
        let mut mem = Memory::new();
        // Origin 0x3000, words 0x1234 and 0xABCD, big-endian.
        let image = [0x30, 0x00, 0x12, 0x34, 0xAB, 0xCD];

        let loaded = mem.load_image(&image).unwrap();
        assert_eq!(loaded.origin, 0x3000);
        assert_eq!(loaded.words, 2);
        assert_eq!(mem.fetch(0x3000), 0x1234);
        assert_eq!(mem.fetch(0x3001), 0xABCD);
    }

    #[test]
    fn test_load_image_overlap_last_wins() {
        let mut mem = Memory::new();
        mem.load_image(&[0x30, 0x00, 0x11, 0x11, 0x22, 0x22]).unwrap();
        mem.load_image(&[0x30, 0x01, 0x33, 0x33]).unwrap();

        assert_eq!(mem.fetch(0x3000), 0x1111);
        assert_eq!(mem.fetch(0x3001), 0x3333);
    }

    #[test]
    fn test_load_image_truncates_at_top_of_memory() {
        let mut mem = Memory::new();
        // Origin at the last word; only one of the two words fits.
        let loaded = mem.load_image(&[0xFF, 0xFF, 0x00, 0x01, 0x00, 0x02]).unwrap();
        assert_eq!(loaded.words, 1);
        assert_eq!(mem.fetch(0xFFFF), 1);
    }

    #[test]
    fn test_load_image_ignores_trailing_byte() {
        let mut mem = Memory::new();
        let loaded = mem.load_image(&[0x30, 0x00, 0x00, 0x05, 0xAA]).unwrap();
        assert_eq!(loaded.words, 1);
        assert_eq!(mem.fetch(0x3000), 5);
    }

    #[test]
    fn test_load_image_missing_origin() {
        let mut mem = Memory::new();
        assert!(mem.load_image(&[0x30]).is_err());
    }
}
