//! Dead-key aware Unicode translation.
//!
//! The OS translation primitive is itself stateful: when it sees a dead key
//! (an accent such as `´`) it buffers it and returns a negative count, then
//! combines the buffer with whatever key it translates next. Calling it from
//! a hook therefore steals the dead key from the application that is about
//! to receive the same keystroke.
//!
//! [`DeadKeyTranslator`] compensates for that:
//!
//! - When a dead key is struck it remembers the keystroke in a
//!   [`DeadKeyAccumulator`] and drains the primitive back to neutral with a
//!   commit key, so the application's own translation starts from a clean
//!   buffer.
//! - When the next key produces output, the remembered dead key is replayed
//!   once so the primitive holds the same buffered state the application
//!   expects. The replay output is discarded.
//!
//! The accumulator is owned by the translator instance, so independent
//! capture sessions never see each other's pending dead keys.

use crate::backend::{Keyboard, KeyboardState, LayoutHandle};
use crate::config::InterceptorConfig;
use crate::keycode::vk;
use crate::modifiers::is_altgr_combo;
use log::{debug, trace, warn};
use std::cmp::Ordering;

/// A dead-key keystroke whose composition is still pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadKeyAccumulator {
    pub vk: u32,
    pub scan_code: u32,
    /// Keyboard state captured when the dead key was struck.
    pub state: KeyboardState,
}

/// Converts key-down events into the characters the user sees typed.
pub struct DeadKeyTranslator<K> {
    keyboard: K,
    pending: Option<DeadKeyAccumulator>,
    drain_limit: usize,
    commit_key: u8,
}

impl<K: Keyboard> DeadKeyTranslator<K> {
    pub fn new(keyboard: K, config: &InterceptorConfig) -> Self {
        Self {
            keyboard,
            pending: None,
            drain_limit: config.drain_limit.max(1),
            commit_key: config.commit_key,
        }
    }

    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    /// A dead key was struck and has not been combined yet.
    pub fn has_pending_dead_key(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&DeadKeyAccumulator> {
        self.pending.as_ref()
    }

    /// Forget any pending dead key.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Translate one key-down event.
    ///
    /// Returns the produced characters; empty for non-printable keys, for a
    /// freshly struck dead key, and when the keyboard state is unavailable.
    pub fn translate(&mut self, vk: u32, scan_code: u32) -> String {
        let mut state = match self.keyboard.keyboard_state() {
            Ok(state) => state,
            Err(e) => {
                warn!("skipping translation of vk 0x{:02X}: {}", vk, e);
                return String::new();
            }
        };

        if is_altgr_combo(&self.keyboard) {
            // The primitive only maps AltGr characters when it sees Ctrl+Alt
            for key in [vk::LCONTROL, vk::LMENU, vk::CONTROL, vk::MENU] {
                state.press(key);
            }
        }

        let layout = self.keyboard.foreground_layout();
        let result = self.keyboard.to_unicode(vk, scan_code, &state, layout);

        match result.count.cmp(&0) {
            Ordering::Greater => {
                if let Some(dead) = self.pending.take() {
                    trace!("replaying dead key vk 0x{:02X}", dead.vk);
                    // Output is the composed text we already have; only the
                    // primitive's buffer matters here.
                    let _ = self
                        .keyboard
                        .to_unicode(dead.vk, dead.scan_code, &dead.state, layout);
                }
                result.text
            }
            Ordering::Less => {
                if let Some(previous) = &self.pending {
                    debug!(
                        "dead key vk 0x{:02X} replaces pending vk 0x{:02X}",
                        vk, previous.vk
                    );
                } else {
                    debug!("dead key vk 0x{:02X} pending", vk);
                }
                self.pending = Some(DeadKeyAccumulator {
                    vk,
                    scan_code,
                    state,
                });
                self.drain(layout);
                String::new()
            }
            Ordering::Equal => String::new(),
        }
    }

    /// Feed the commit key until the primitive stops reporting a buffered
    /// dead key.
    fn drain(&self, layout: LayoutHandle) {
        let commit = u32::from(self.commit_key);
        let scan_code = self.keyboard.scan_code(commit);
        let empty = KeyboardState::empty();

        for _ in 0..self.drain_limit {
            let result = self.keyboard.to_unicode(commit, scan_code, &empty, layout);
            if result.count >= 0 {
                return;
            }
        }

        warn!(
            "translation primitive still buffering a dead key after {} drain attempts",
            self.drain_limit
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FAKE_LAYOUT, FakeKeyboard};

    const DEAD: u32 = vk::OEM_6 as u32;
    const DEAD_SCAN: u32 = 0x0D;
    const KEY_E: u32 = vk::KEY_E as u32;
    const KEY_E_SCAN: u32 = 0x12;

    fn translator(kb: FakeKeyboard) -> DeadKeyTranslator<FakeKeyboard> {
        DeadKeyTranslator::new(kb, &InterceptorConfig::default())
    }

    #[test]
    fn test_plain_key() {
        let mut t = translator(FakeKeyboard::new().with_script(&[(1, "a")]));
        assert_eq!(t.translate(0x41, 0x1E), "a");

        let calls = t.keyboard().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].vk, 0x41);
        assert_eq!(calls[0].scan_code, 0x1E);
        assert_eq!(calls[0].layout, FAKE_LAYOUT);
        assert!(!t.has_pending_dead_key());
    }

    #[test]
    fn test_non_printable_key() {
        let mut t = translator(FakeKeyboard::new().with_script(&[(0, "")]));
        assert_eq!(t.translate(vk::F1 as u32, 0x3B), "");
        assert!(!t.has_pending_dead_key());
        assert_eq!(t.keyboard().call_count(), 1);
    }

    #[test]
    fn test_dead_key_then_base_key() {
        let kb = FakeKeyboard::new().with_script(&[
            (-1, ""),   // dead key buffered
            (2, "´."),  // drained with the commit key
            (1, "é"),   // base key
            (-1, ""),   // replay, discarded
        ]);
        let mut t = translator(kb);

        assert_eq!(t.translate(DEAD, DEAD_SCAN), "");
        assert!(t.has_pending_dead_key());
        assert_eq!(t.pending().map(|p| p.vk), Some(DEAD));

        assert_eq!(t.translate(KEY_E, KEY_E_SCAN), "é");
        assert!(!t.has_pending_dead_key());

        let calls = t.keyboard().calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].vk, DEAD);
        assert_eq!(calls[1].vk, vk::DECIMAL as u32);
        assert_eq!(calls[2].vk, KEY_E);
        // exactly one replay of the stored dead key
        assert_eq!(calls[3].vk, DEAD);
        assert_eq!(calls[3].scan_code, DEAD_SCAN);
        assert_eq!(calls[3].state, calls[0].state);
        assert_eq!(t.keyboard().remaining_script(), 0);
    }

    #[test]
    fn test_drain_uses_commit_key_with_empty_state() {
        let kb = FakeKeyboard::new()
            .with_pressed(&[vk::LSHIFT])
            .with_script(&[(-1, ""), (-1, ""), (2, "^.")]);
        let mut t = translator(kb);

        assert_eq!(t.translate(DEAD, DEAD_SCAN), "");

        let calls = t.keyboard().calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].state.is_down(vk::LSHIFT));
        for call in &calls[1..] {
            assert_eq!(call.vk, vk::DECIMAL as u32);
            assert_eq!(call.scan_code, vk::DECIMAL as u32 + 0x100);
            assert_eq!(call.state, KeyboardState::empty());
            assert_eq!(call.layout, FAKE_LAYOUT);
        }
    }

    #[test]
    fn test_drain_is_capped() {
        let kb = FakeKeyboard::new();
        for _ in 0..10 {
            kb.respond(-1, "");
        }
        let config = InterceptorConfig::new().drain_limit(3);
        let mut t = DeadKeyTranslator::new(kb, &config);

        assert_eq!(t.translate(DEAD, DEAD_SCAN), "");
        // the dead key itself plus three drain attempts
        assert_eq!(t.keyboard().call_count(), 4);
        assert!(t.has_pending_dead_key());
    }

    #[test]
    fn test_second_dead_key_wins() {
        let kb = FakeKeyboard::new().with_script(&[
            (-1, ""),
            (2, "´."),
            (-1, ""),
            (2, "`."),
            (1, "è"),
            (-1, ""),
        ]);
        let mut t = translator(kb);

        assert_eq!(t.translate(DEAD, DEAD_SCAN), "");
        t.keyboard().press(vk::LSHIFT);
        assert_eq!(t.translate(DEAD, DEAD_SCAN), "");
        t.keyboard().release(vk::LSHIFT);

        let pending = t.pending().cloned().unwrap();
        assert!(pending.state.is_down(vk::LSHIFT));

        assert_eq!(t.translate(KEY_E, KEY_E_SCAN), "è");
        assert!(!t.has_pending_dead_key());

        let calls = t.keyboard().calls();
        assert_eq!(calls.len(), 6);
        // only the second dead key is replayed
        let replays: Vec<_> = calls[4..].iter().filter(|c| c.vk == DEAD).collect();
        assert_eq!(replays.len(), 1);
        assert_eq!(replays[0].state, pending.state);
    }

    #[test]
    fn test_zero_count_keeps_pending_dead_key() {
        let kb = FakeKeyboard::new().with_script(&[
            (-1, ""),
            (2, "´."),
            (0, ""), // shift pressed before the base key
            (1, "É"),
            (-1, ""),
        ]);
        let mut t = translator(kb);

        assert_eq!(t.translate(DEAD, DEAD_SCAN), "");
        assert_eq!(t.translate(vk::LSHIFT as u32, 0x2A), "");
        assert!(t.has_pending_dead_key());
        assert_eq!(t.keyboard().call_count(), 3);

        assert_eq!(t.translate(KEY_E, KEY_E_SCAN), "É");
        assert!(!t.has_pending_dead_key());
        assert_eq!(t.keyboard().calls()[4].vk, DEAD);
    }

    #[test]
    fn test_state_failure_yields_empty_result() {
        let kb = FakeKeyboard::new().with_script(&[(1, "a")]);
        kb.fail_state(true);
        let mut t = translator(kb);

        assert_eq!(t.translate(0x41, 0x1E), "");
        assert_eq!(t.keyboard().call_count(), 0);

        t.keyboard().fail_state(false);
        assert_eq!(t.translate(0x41, 0x1E), "a");
    }

    #[test]
    fn test_state_failure_keeps_pending_dead_key() {
        let kb = FakeKeyboard::new().with_script(&[(-1, ""), (2, "´.")]);
        let mut t = translator(kb);
        t.translate(DEAD, DEAD_SCAN);

        t.keyboard().fail_state(true);
        assert_eq!(t.translate(KEY_E, KEY_E_SCAN), "");
        assert!(t.has_pending_dead_key());
    }

    #[test]
    fn test_altgr_forces_control_and_alt() {
        let kb = FakeKeyboard::new()
            .with_pressed(&[vk::RMENU, vk::LCONTROL])
            .with_script(&[(1, "€")]);
        let mut t = translator(kb);

        assert_eq!(t.translate(KEY_E, KEY_E_SCAN), "€");
        let state = &t.keyboard().calls()[0].state;
        assert!(state.is_down(vk::LCONTROL));
        assert!(state.is_down(vk::LMENU));
        assert!(state.is_down(vk::CONTROL));
        assert!(state.is_down(vk::MENU));
    }

    #[test]
    fn test_plain_ctrl_alt_is_not_adjusted() {
        let kb = FakeKeyboard::new()
            .with_pressed(&[vk::RMENU, vk::RCONTROL])
            .with_script(&[(0, "")]);
        let mut t = translator(kb);

        t.translate(KEY_E, KEY_E_SCAN);
        let state = &t.keyboard().calls()[0].state;
        assert!(!state.is_down(vk::LMENU));
        assert!(!state.is_down(vk::LCONTROL));
    }

    #[test]
    fn test_multiple_characters() {
        // dead key followed by a key it cannot combine with
        let kb = FakeKeyboard::new().with_script(&[(-1, ""), (2, "^."), (2, "^q"), (-1, "")]);
        let mut t = translator(kb);

        t.translate(DEAD, DEAD_SCAN);
        assert_eq!(t.translate(0x51, 0x10), "^q");
    }

    #[test]
    fn test_reset() {
        let kb = FakeKeyboard::new().with_script(&[(-1, ""), (2, "´."), (1, "e")]);
        let mut t = translator(kb);
        t.translate(DEAD, DEAD_SCAN);
        t.reset();
        assert!(!t.has_pending_dead_key());

        assert_eq!(t.translate(KEY_E, KEY_E_SCAN), "e");
        // no replay after a reset
        assert_eq!(t.keyboard().call_count(), 3);
    }
}
