//! Hook event processing.
//!
//! [`Processor`] is what the hook backend calls for every keyboard event. It
//! composes the modifier-aware key code, notifies subscribers and drives the
//! dead-key translator on key down. Whatever happens inside, the event is
//! forwarded to the next hook exactly once.

use crate::backend::{HookProc, Keyboard};
use crate::config::InterceptorConfig;
use crate::event::{KeyEvent, RawKeyEvent};
use crate::hook::{Subscribers, panic_message};
use crate::keycode::KeyCode;
use crate::modifiers::compose_modifiers;
use crate::translate::DeadKeyTranslator;
use log::{error, trace};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// `HC_ACTION`: the hook code for a regular event. Negative codes must be
/// passed on without processing.
pub const HC_ACTION: i32 = 0;

/// Calls the next hook when dropped, unless it was already called.
struct ForwardGuard<'a> {
    next: Option<&'a mut dyn FnMut() -> isize>,
}

impl<'a> ForwardGuard<'a> {
    fn new(next: &'a mut dyn FnMut() -> isize) -> Self {
        Self { next: Some(next) }
    }

    fn forward(mut self) -> isize {
        match self.next.take() {
            Some(next) => next(),
            None => 0,
        }
    }
}

impl Drop for ForwardGuard<'_> {
    fn drop(&mut self) {
        if let Some(next) = self.next.take() {
            next();
        }
    }
}

/// Turns raw hook invocations into subscriber notifications.
pub struct Processor<K> {
    keyboard: Arc<K>,
    translator: Mutex<DeadKeyTranslator<Arc<K>>>,
    subscribers: Arc<Subscribers>,
    active: AtomicBool,
    ignore_injected: bool,
}

impl<K: Keyboard> Processor<K> {
    pub fn new(keyboard: Arc<K>, config: &InterceptorConfig) -> Self {
        Self {
            translator: Mutex::new(DeadKeyTranslator::new(keyboard.clone(), config)),
            keyboard,
            subscribers: Arc::new(Subscribers::new()),
            active: AtomicBool::new(false),
            ignore_injected: config.ignore_injected,
        }
    }

    pub fn subscribers(&self) -> &Arc<Subscribers> {
        &self.subscribers
    }

    /// Inactive processors forward events without looking at them.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Drop any pending dead key.
    pub fn reset(&self) {
        self.translator().reset();
    }

    pub fn has_pending_dead_key(&self) -> bool {
        self.translator().has_pending_dead_key()
    }

    /// Handle one hook invocation and forward it with `next`.
    ///
    /// Returns the value produced by `next`.
    pub fn process(
        &self,
        code: i32,
        event: &RawKeyEvent,
        next: &mut dyn FnMut() -> isize,
    ) -> isize {
        let forward = ForwardGuard::new(next);

        if code < HC_ACTION || !self.is_active() {
            return forward.forward();
        }
        if self.ignore_injected && event.is_injected() {
            trace!("forwarding injected vk 0x{:02X}", event.vk_code);
            return forward.forward();
        }

        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(event))) {
            error!(
                "processing vk 0x{:02X} failed: {}",
                event.vk_code,
                panic_message(&*panic)
            );
        }

        forward.forward()
    }

    fn dispatch(&self, event: &RawKeyEvent) {
        let modifiers = compose_modifiers(&*self.keyboard);
        let key_event = KeyEvent {
            key_code: KeyCode::with_modifiers(event.vk_code, modifiers),
            time: event.time,
        };
        trace!("{:?} {}", event.kind, key_event.key_code);

        if event.kind.is_down() {
            self.subscribers.notify_key_down(&key_event);

            let text = self.translator().translate(event.vk_code, event.scan_code);
            for ch in text.chars() {
                self.subscribers.notify_key_press(ch);
            }
        } else if event.kind.is_up() {
            self.subscribers.notify_key_up(&key_event);
        }
    }

    fn translator(&self) -> MutexGuard<'_, DeadKeyTranslator<Arc<K>>> {
        self.translator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Keyboard> HookProc for Processor<K> {
    fn call(&self, code: i32, event: &RawKeyEvent, next: &mut dyn FnMut() -> isize) -> isize {
        self.process(code, event, next)
    }
}
