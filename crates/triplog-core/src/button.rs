//! Debounced start/stop button.
//!
//! The raw pin level is sampled once per control cycle; a level must hold
//! for the debounce window before it is committed as the stable state.
//! Releases classify the press by duration into one of two one-shot events.

use crate::config::{DEBOUNCE_MS, LONG_PRESS_MS};

/// One-shot operator gestures produced by the debouncer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Press shorter than the long-press threshold: toggles logging.
    ShortClick,
    /// Press held past the threshold: status only, never a toggle.
    LongPress,
}

/// Time-domain debouncer for a single push button.
///
/// Only one event can be pending at a time; the consumer must take it in
/// the same cycle it is observed. Unconsumed events do not accumulate.
pub struct ButtonDebouncer {
    raw_pressed: bool,
    stable_pressed: bool,
    last_change_ms: u64,
    press_start_ms: u64,
    pending: Option<ButtonEvent>,
}

impl ButtonDebouncer {
    pub const fn new() -> Self {
        Self {
            raw_pressed: false,
            stable_pressed: false,
            last_change_ms: 0,
            press_start_ms: 0,
            pending: None,
        }
    }

    /// Feed one raw sample (true = pressed).
    pub fn update(&mut self, pressed: bool, now_ms: u64) {
        if pressed != self.raw_pressed {
            self.raw_pressed = pressed;
            self.last_change_ms = now_ms;
        }

        if self.raw_pressed != self.stable_pressed
            && now_ms.wrapping_sub(self.last_change_ms) >= DEBOUNCE_MS
        {
            self.stable_pressed = self.raw_pressed;
            if self.stable_pressed {
                self.press_start_ms = now_ms;
            } else {
                let held_ms = now_ms.wrapping_sub(self.press_start_ms);
                self.pending = Some(if held_ms >= LONG_PRESS_MS {
                    ButtonEvent::LongPress
                } else {
                    ButtonEvent::ShortClick
                });
            }
        }
    }

    /// Take the pending event, clearing it.
    pub fn take_event(&mut self) -> Option<ButtonEvent> {
        self.pending.take()
    }

    pub fn is_pressed(&self) -> bool {
        self.stable_pressed
    }
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold(button: &mut ButtonDebouncer, pressed: bool, from_ms: u64, until_ms: u64) {
        let mut t = from_ms;
        while t <= until_ms {
            button.update(pressed, t);
            t += 10;
        }
    }

    #[test]
    fn short_press_yields_one_short_click() {
        let mut button = ButtonDebouncer::new();
        hold(&mut button, true, 0, 200);
        assert!(button.is_pressed());
        assert_eq!(button.take_event(), None);

        hold(&mut button, false, 210, 400);
        assert_eq!(button.take_event(), Some(ButtonEvent::ShortClick));
        assert_eq!(button.take_event(), None);
    }

    #[test]
    fn long_press_yields_one_long_press_and_no_click() {
        let mut button = ButtonDebouncer::new();
        hold(&mut button, true, 0, 1_500);
        assert_eq!(button.take_event(), None);

        hold(&mut button, false, 1_510, 1_700);
        assert_eq!(button.take_event(), Some(ButtonEvent::LongPress));
        assert_eq!(button.take_event(), None);
    }

    #[test]
    fn bounce_inside_debounce_window_yields_nothing() {
        let mut button = ButtonDebouncer::new();
        // Raw level flips every 10 ms, never stable for the full window.
        for t in 0..10u64 {
            button.update(t % 2 == 0, t * 10);
        }
        button.update(false, 100);
        hold(&mut button, false, 110, 300);
        assert!(!button.is_pressed());
        assert_eq!(button.take_event(), None);
    }

    #[test]
    fn event_is_one_shot() {
        let mut button = ButtonDebouncer::new();
        hold(&mut button, true, 0, 100);
        hold(&mut button, false, 110, 300);
        assert!(button.take_event().is_some());
        // Further samples without a new press produce nothing.
        hold(&mut button, false, 310, 500);
        assert_eq!(button.take_event(), None);
    }
}
