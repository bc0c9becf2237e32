//! Arming the trap through a RAM copy of the vector table

/// Index of the HardFault entry in a Cortex-M vector table
pub const HARD_FAULT: usize = 3;

/// Entries in a [`VectorTable`]: 16 system exceptions and 112 interrupts
pub const VECTOR_TABLE_WORDS: usize = 128;

/// VTOR (*Vector Table Offset Register*)
#[cfg(arm_profile = "m")]
const VTOR: *mut u32 = 0xE000_ED08 as *mut u32;

/// A vector table in RAM.
///
/// VTOR needs the table aligned to its size rounded up to a power of two,
/// so 128 entries means 512 bytes.
#[repr(C, align(512))]
pub struct VectorTable([u32; VECTOR_TABLE_WORDS]);

impl VectorTable {
    /// A table full of zeroes. Fill it with [`VectorTable::copy_from`].
    pub const fn new() -> VectorTable {
        VectorTable([0; VECTOR_TABLE_WORDS])
    }

    /// Copy the first `len` entries of another table.
    ///
    /// At most [`VECTOR_TABLE_WORDS`] entries are copied.
    ///
    /// # Safety
    ///
    /// `table` must point at `len` readable words.
    pub unsafe fn copy_from(&mut self, table: *const u32, len: usize) {
        if core::ptr::eq(table, self.0.as_ptr()) {
            return;
        }
        for (i, entry) in self.0.iter_mut().take(len).enumerate() {
            *entry = unsafe { table.add(i).read_volatile() };
        }
    }

    /// Point the HardFault entry at `handler` (a Thumb address)
    pub fn set_hard_fault(&mut self, handler: u32) {
        self.0[HARD_FAULT] = handler;
    }

    pub fn hard_fault(&self) -> u32 {
        self.0[HARD_FAULT]
    }

    pub fn as_ptr(&self) -> *const u32 {
        self.0.as_ptr()
    }
}

impl Default for VectorTable {
    fn default() -> Self {
        VectorTable::new()
    }
}

#[cfg(arm_profile = "m")]
extern "C" {
    fn _stack_trap();
}

/// Make `_stack_trap` the HardFault handler.
///
/// Copies the first `len` entries of the table VTOR currently points at into
/// `table`, patches in `_stack_trap`, then moves VTOR to `table`.
///
/// # Safety
///
/// `len` must not exceed the size of the live vector table, and the core
/// must implement VTOR (it is optional on Armv6-M).
#[cfg(arm_profile = "m")]
pub unsafe fn arm(table: &'static mut VectorTable, len: usize) {
    let live = unsafe { VTOR.read_volatile() } as *const u32;
    unsafe { table.copy_from(live, len) };
    table.set_hard_fault(_stack_trap as unsafe extern "C" fn() as usize as u32);
    stack_trap::asm::dsb();
    unsafe { VTOR.write_volatile(table.as_ptr() as u32) };
    stack_trap::asm::dsb();
    stack_trap::asm::isb();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_for_vtor() {
        assert_eq!(core::mem::align_of::<VectorTable>(), 512);
        assert_eq!(core::mem::size_of::<VectorTable>(), VECTOR_TABLE_WORDS * 4);
    }

    #[test]
    fn copy_then_patch() {
        let live: [u32; 48] = core::array::from_fn(|i| 0x1000_0001 + (i as u32) * 4);
        let mut table = VectorTable::new();
        unsafe { table.copy_from(live.as_ptr(), live.len()) };
        assert_eq!(table.hard_fault(), live[HARD_FAULT]);
        table.set_hard_fault(0x1000_2001);
        assert_eq!(table.hard_fault(), 0x1000_2001);
        assert_eq!(table.0[0], live[0]);
        assert_eq!(table.0[47], live[47]);
        assert_eq!(table.0[48], 0);
    }

    #[test]
    fn copy_is_clamped() {
        let live = [0xAAAA_AAAAu32; VECTOR_TABLE_WORDS + 16];
        let mut table = VectorTable::new();
        unsafe { table.copy_from(live.as_ptr(), live.len()) };
        assert!(table.0.iter().all(|&entry| entry == 0xAAAA_AAAA));
    }

    #[test]
    fn copy_from_itself_is_a_no_op() {
        let mut table = VectorTable::new();
        table.set_hard_fault(0x1234_5679);
        let ptr = table.as_ptr();
        unsafe { table.copy_from(ptr, VECTOR_TABLE_WORDS) };
        assert_eq!(table.hard_fault(), 0x1234_5679);
    }
}
