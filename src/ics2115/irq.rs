//! Interrupt aggregation
//!
//! The chip has a single level-sensitive interrupt output fed by the two timers
//! and by the per-voice oscillator/envelope boundary flags.

use std::fmt;

use log::debug;

use super::voice::{OscConf, VolCtrl, Voice};

/// Host notification for interrupt line changes
pub type IrqCallback = Box<dyn FnMut(bool) + Send>;

/// Compute the interrupt line level.
///
/// A voice only contributes when its envelope *and* oscillator interrupts are
/// both pending, and all 32 voices are scanned regardless of the active voice
/// count. This mirrors the reverse-engineered behavior and is kept as is.
pub fn line_level(irq_pending: u8, irq_enabled: u8, voices: &[Voice]) -> bool {
    if irq_pending & irq_enabled != 0 {
        return true;
    }
    voices.iter().any(|voice| {
        voice.vol.ctrl.contains(VolCtrl::IRQ_PENDING)
            && voice.osc.conf.contains(OscConf::IRQ_PENDING)
    })
}

/// Latched interrupt output
#[derive(Default)]
pub struct IrqLine {
    asserted: bool,
    callback: Option<IrqCallback>,
}

impl IrqLine {
    /// Create a deasserted line with no listener
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the host listener, replacing any previous one
    pub fn set_callback(&mut self, callback: IrqCallback) {
        self.callback = Some(callback);
    }

    /// Remove the host listener
    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Current latched level
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// Latch a new level, notifying the host only on change. Returns true if the level changed.
    pub fn update(&mut self, level: bool) -> bool {
        if level == self.asserted {
            return false;
        }
        self.asserted = level;
        debug!(target: "ics2115", "irq line {}", if level { "asserted" } else { "cleared" });
        if let Some(callback) = self.callback.as_mut() {
            callback(level);
        }
        true
    }
}

impl fmt::Debug for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqLine")
            .field("asserted", &self.asserted)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_timer_bits_need_enable() {
        let voices = [Voice::default(); 32];
        assert!(!line_level(0b01, 0b10, &voices));
        assert!(line_level(0b01, 0b01, &voices));
        assert!(line_level(0b11, 0b10, &voices));
    }

    #[test]
    fn test_single_voice_flags_do_not_assert() {
        let mut voices = [Voice::default(); 32];
        for (i, voice) in voices.iter_mut().enumerate() {
            if i % 2 == 0 {
                voice.osc.conf.insert(OscConf::IRQ_PENDING);
            } else {
                voice.vol.ctrl.insert(VolCtrl::IRQ_PENDING);
            }
        }
        assert!(!line_level(0, 0xFF, &voices));
    }

    #[test]
    fn test_both_flags_on_last_voice_assert() {
        let mut voices = [Voice::default(); 32];
        voices[31].osc.conf.insert(OscConf::IRQ_PENDING);
        voices[31].vol.ctrl.insert(VolCtrl::IRQ_PENDING);
        assert!(line_level(0, 0, &voices));
    }

    #[test]
    fn test_callback_only_on_change() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut line = IrqLine::new();
        line.set_callback(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(!line.update(false));
        assert!(line.update(true));
        assert!(!line.update(true));
        assert!(line.update(false));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!line.is_asserted());
    }
}
