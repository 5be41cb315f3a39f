//! Free heap probe

use hydria_core::traits::MemoryProbe;

pub struct HeapProbe;

impl MemoryProbe for HeapProbe {
    fn free_bytes(&self) -> Option<u32> {
        Some(crate::HEAP.free() as u32)
    }
}
