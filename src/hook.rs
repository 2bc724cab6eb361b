//! Capture session and subscriber handling.

use crate::backend::{HookBackend, HookProc, Keyboard, UninstallError};
use crate::config::InterceptorConfig;
use crate::error::{Error, Result};
use crate::event::KeyEvent;
use crate::processor::Processor;
use log::{debug, error, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

#[cfg(target_os = "windows")]
use crate::platform::{WindowsHook, WindowsKeyboard};

/// Receives key down or key up notifications.
pub trait KeyHandler: Send + Sync {
    /// Called synchronously on the hook thread. Must return promptly.
    fn handle_key(&self, event: &KeyEvent);
}

/// Implement KeyHandler for closures.
impl<F> KeyHandler for F
where
    F: Fn(&KeyEvent) + Send + Sync,
{
    fn handle_key(&self, event: &KeyEvent) {
        self(event);
    }
}

/// Receives typed characters.
pub trait CharHandler: Send + Sync {
    /// Called synchronously on the hook thread. Must return promptly.
    fn handle_char(&self, ch: char);
}

/// Implement CharHandler for closures.
impl<F> CharHandler for F
where
    F: Fn(char) + Send + Sync,
{
    fn handle_char(&self, ch: char) {
        self(ch);
    }
}

/// Identifies a subscription for [`KeyboardInterceptor::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of handlers for one notification channel.
pub struct Listeners<H: ?Sized> {
    entries: RwLock<Vec<(SubscriptionId, Arc<H>)>>,
}

impl<H: ?Sized> Default for Listeners<H> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<H: ?Sized> Listeners<H> {
    fn add(&self, id: SubscriptionId, handler: Arc<H>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every handler in registration order.
    ///
    /// Handlers added or removed during dispatch take effect from the next
    /// dispatch. A panicking handler is logged and skipped.
    fn notify(&self, channel: &str, call: impl Fn(&H)) {
        let handlers: Vec<Arc<H>> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| call(&*handler))) {
                error!("{} handler panicked: {}", channel, panic_message(&*panic));
            }
        }
    }
}

/// The three notification channels.
#[derive(Default)]
pub struct Subscribers {
    key_down: Listeners<dyn KeyHandler>,
    key_up: Listeners<dyn KeyHandler>,
    key_press: Listeners<dyn CharHandler>,
    next_id: AtomicU64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn on_key_down<H: KeyHandler + 'static>(&self, handler: H) -> SubscriptionId {
        let id = self.next_id();
        self.key_down.add(id, Arc::new(handler));
        id
    }

    pub fn on_key_up<H: KeyHandler + 'static>(&self, handler: H) -> SubscriptionId {
        let id = self.next_id();
        self.key_up.add(id, Arc::new(handler));
        id
    }

    pub fn on_key_press<H: CharHandler + 'static>(&self, handler: H) -> SubscriptionId {
        let id = self.next_id();
        self.key_press.add(id, Arc::new(handler));
        id
    }

    /// Remove a subscription from whichever channel holds it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.key_down.remove(id) || self.key_up.remove(id) || self.key_press.remove(id)
    }

    pub fn key_down_listeners(&self) -> &Listeners<dyn KeyHandler> {
        &self.key_down
    }

    pub fn key_up_listeners(&self) -> &Listeners<dyn KeyHandler> {
        &self.key_up
    }

    pub fn key_press_listeners(&self) -> &Listeners<dyn CharHandler> {
        &self.key_press
    }

    pub(crate) fn notify_key_down(&self, event: &KeyEvent) {
        self.key_down.notify("key down", |h| h.handle_key(event));
    }

    pub(crate) fn notify_key_up(&self, event: &KeyEvent) {
        self.key_up.notify("key up", |h| h.handle_key(event));
    }

    pub(crate) fn notify_key_press(&self, ch: char) {
        self.key_press.notify("key press", |h| h.handle_char(ch));
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// System-wide keyboard capture session.
///
/// Owns at most one hook registration at a time. Subscriptions survive
/// stopping and restarting capture.
///
/// # Example
///
/// ```no_run
/// # #[cfg(target_os = "windows")]
/// # fn main() -> keyintercept::Result<()> {
/// use keyintercept::{KeyEvent, KeyboardInterceptor};
///
/// let interceptor = KeyboardInterceptor::new();
/// interceptor.on_key_down(|event: &KeyEvent| println!("down: {}", event.key_code));
/// interceptor.on_key_press(|ch: char| println!("typed: {:?}", ch));
/// interceptor.start()?;
/// # Ok(())
/// # }
/// # #[cfg(not(target_os = "windows"))]
/// # fn main() {}
/// ```
pub struct KeyboardInterceptor<H: HookBackend, K: Keyboard + 'static> {
    hook: H,
    processor: Arc<Processor<K>>,
    handle: Mutex<Option<H::Handle>>,
}

impl<H: HookBackend, K: Keyboard + 'static> KeyboardInterceptor<H, K> {
    /// Create an interceptor on top of the given collaborators.
    pub fn with_backend(hook: H, keyboard: K, config: InterceptorConfig) -> Self {
        Self {
            hook,
            processor: Arc::new(Processor::new(Arc::new(keyboard), &config)),
            handle: Mutex::new(None),
        }
    }

    /// Install the keyboard hook.
    ///
    /// Fails with [`Error::AlreadyRunning`] if this interceptor is already
    /// capturing; the existing hook is left in place.
    pub fn start(&self) -> Result<()> {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return Err(Error::AlreadyRunning);
        }

        self.processor.reset();
        self.processor.set_active(true);

        let proc: Arc<dyn HookProc> = self.processor.clone();
        match self.hook.install(proc) {
            Ok(installed) => {
                debug!("keyboard capture started");
                *handle = Some(installed);
                Ok(())
            }
            Err(e) => {
                self.processor.set_active(false);
                Err(e)
            }
        }
    }

    /// Remove the keyboard hook. Events arriving after this call are only
    /// forwarded.
    ///
    /// May be called from a subscriber. If the hook cannot be removed the
    /// interceptor keeps running and the call can be retried.
    pub fn stop(&self) -> Result<()> {
        let installed = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(Error::NotRunning)?;

        self.processor.set_active(false);
        match self.hook.uninstall(installed) {
            Ok(()) => {
                debug!("keyboard capture stopped");
                Ok(())
            }
            Err(UninstallError { error, handle }) => {
                if let Some(handle) = handle {
                    warn!("keyboard hook is still installed: {}", error);
                    self.processor.set_active(true);
                    *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                }
                Err(error)
            }
        }
    }

    /// Check if the hook is currently installed.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn on_key_down<F: KeyHandler + 'static>(&self, handler: F) -> SubscriptionId {
        self.processor.subscribers().on_key_down(handler)
    }

    pub fn on_key_up<F: KeyHandler + 'static>(&self, handler: F) -> SubscriptionId {
        self.processor.subscribers().on_key_up(handler)
    }

    pub fn on_key_press<F: CharHandler + 'static>(&self, handler: F) -> SubscriptionId {
        self.processor.subscribers().on_key_press(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.processor.subscribers().unsubscribe(id)
    }

    /// Shared subscriber registry, e.g. for [`crate::channel::event_channel`].
    pub fn subscribers(&self) -> &Arc<Subscribers> {
        self.processor.subscribers()
    }

    /// Whether a dead key was struck and not yet combined.
    pub fn has_pending_dead_key(&self) -> bool {
        self.processor.has_pending_dead_key()
    }
}

#[cfg(target_os = "windows")]
impl KeyboardInterceptor<WindowsHook, WindowsKeyboard> {
    /// Interceptor backed by the Win32 low-level keyboard hook.
    pub fn new() -> Self {
        Self::with_config(InterceptorConfig::default())
    }

    pub fn with_config(config: InterceptorConfig) -> Self {
        Self::with_backend(WindowsHook::new(), WindowsKeyboard::new(), config)
    }
}

#[cfg(target_os = "windows")]
impl Default for KeyboardInterceptor<WindowsHook, WindowsKeyboard> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HookBackend, K: Keyboard + 'static> Drop for KeyboardInterceptor<H, K> {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}
