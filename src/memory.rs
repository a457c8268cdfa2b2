//! The memory backend interface.
//!
//! `Memory` is the capability trait the architectural core is generic over
//! (`HasMemory` in the teacher's `core_concepts.h`). A backend only needs to
//! answer byte/halfword/word reads and writes over a 32-bit address space;
//! this crate composes any implementation underneath `Cpu<M>`.

use thiserror::Error;

/// A failed memory access, carrying the address that faulted. The caller
/// (the executor, or the fetch step) decides whether this becomes a load or
/// store access fault, since the same backend error is shared by both paths.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("memory access fault at address 0x{address:08x}")]
pub struct MemoryFault {
    pub address: u32,
}

/// Byte/halfword/word read and write operations over a flat 32-bit address
/// space. All multi-byte accesses are little-endian.
pub trait Memory {
    fn read_byte(&self, addr: u32) -> Result<u8, MemoryFault>;
    fn read_halfword(&self, addr: u32) -> Result<u16, MemoryFault>;
    fn read_word(&self, addr: u32) -> Result<u32, MemoryFault>;

    fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), MemoryFault>;
    fn write_halfword(&mut self, addr: u32, value: u16) -> Result<(), MemoryFault>;
    fn write_word(&mut self, addr: u32, value: u32) -> Result<(), MemoryFault>;

    /// Write a word bypassing any write-only-region check the backend may
    /// otherwise apply. Used only by the pre-decoded cache's Remix variant
    /// when it rewrites code in place (see `dcode`/`remix`). The default
    /// implementation just forwards to `write_word`.
    fn unprotected_write_word(&mut self, addr: u32, value: u32) -> Result<(), MemoryFault> {
        self.write_word(addr, value)
    }
}
