//! Thread-safe chip handle
//!
//! Emulated host CPU and audio thread usually live on different threads: one
//! pokes the register window, the other pulls sample blocks. Both go through a
//! single lock so every access sees a consistent chip.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::ics2115::Ics2115;

/// Shared, lockable ICS2115
#[derive(Clone)]
pub struct SharedIcs2115 {
    chip: Arc<Mutex<Ics2115>>,
}

impl SharedIcs2115 {
    /// Wrap a chip for sharing between threads
    pub fn new(chip: Ics2115) -> Self {
        SharedIcs2115 {
            chip: Arc::new(Mutex::new(chip)),
        }
    }

    /// Read from a host port
    pub fn read(&self, addr: u8) -> u8 {
        self.chip.lock().read(addr)
    }

    /// Write to a host port
    pub fn write(&self, addr: u8, data: u8) {
        self.chip.lock().write(addr, data);
    }

    /// Render a stereo block
    pub fn generate(&self, out_l: &mut [i32], out_r: &mut [i32]) {
        self.chip.lock().generate(out_l, out_r);
    }

    /// Advance the timers without rendering audio
    pub fn run_timers(&self, nanos: u64) {
        self.chip.lock().run_timers(nanos);
    }

    /// Current interrupt line level
    pub fn irq_line(&self) -> bool {
        self.chip.lock().irq_line()
    }

    /// Run a closure with exclusive access to the chip
    pub fn with_chip<R>(&self, f: impl FnOnce(&mut Ics2115) -> R) -> R {
        let mut chip = self.chip.lock();
        f(&mut chip)
    }
}

impl From<Ics2115> for SharedIcs2115 {
    fn from(chip: Ics2115) -> Self {
        SharedIcs2115::new(chip)
    }
}
