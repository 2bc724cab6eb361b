//! Scripted stand-ins for the OS collaborators, used by unit tests.

use crate::backend::{
    HookBackend, HookProc, KeyStateSource, Keyboard, KeyboardState, LayoutHandle, RawTranslation,
    UninstallError,
};
use crate::error::{Error, Result};
use crate::event::RawKeyEvent;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FAKE_LAYOUT: LayoutHandle = LayoutHandle(0x0407_0407);

/// One recorded call to [`Keyboard::to_unicode`].
#[derive(Debug, Clone)]
pub struct TranslateCall {
    pub vk: u32,
    pub scan_code: u32,
    pub state: KeyboardState,
    pub layout: LayoutHandle,
}

/// Keyboard whose translation primitive replays scripted responses in call
/// order. Once the script runs out every call returns a zero count.
#[derive(Default)]
pub struct FakeKeyboard {
    pressed: Mutex<HashSet<u8>>,
    script: Mutex<VecDeque<RawTranslation>>,
    calls: Mutex<Vec<TranslateCall>>,
    state_fails: AtomicBool,
    panic_on_query: AtomicBool,
    panic_on_translate: AtomicBool,
}

impl FakeKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pressed(self, keys: &[u8]) -> Self {
        self.pressed.lock().unwrap().extend(keys.iter().copied());
        self
    }

    pub fn with_script(self, responses: &[(i32, &str)]) -> Self {
        for &(count, text) in responses {
            self.respond(count, text);
        }
        self
    }

    pub fn respond(&self, count: i32, text: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(RawTranslation::new(count, text));
    }

    pub fn press(&self, vk: u8) {
        self.pressed.lock().unwrap().insert(vk);
    }

    pub fn release(&self, vk: u8) {
        self.pressed.lock().unwrap().remove(&vk);
    }

    pub fn fail_state(&self, fail: bool) {
        self.state_fails.store(fail, Ordering::SeqCst);
    }

    /// Make every key state query panic.
    pub fn panic_on_query(&self, panic: bool) {
        self.panic_on_query.store(panic, Ordering::SeqCst);
    }

    /// Make the next translation call panic.
    pub fn panic_on_next_translate(&self) {
        self.panic_on_translate.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<TranslateCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn remaining_script(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl KeyStateSource for FakeKeyboard {
    fn is_pressed(&self, vk: u8) -> bool {
        if self.panic_on_query.load(Ordering::SeqCst) {
            panic!("key state query failed");
        }
        self.pressed.lock().unwrap().contains(&vk)
    }

    fn keyboard_state(&self) -> Result<KeyboardState> {
        if self.state_fails.load(Ordering::SeqCst) {
            return Err(Error::KeyboardStateUnavailable("scripted failure".into()));
        }
        let mut state = KeyboardState::empty();
        for &vk in self.pressed.lock().unwrap().iter() {
            state.press(vk);
        }
        Ok(state)
    }
}

impl Keyboard for FakeKeyboard {
    fn foreground_layout(&self) -> LayoutHandle {
        FAKE_LAYOUT
    }

    fn to_unicode(
        &self,
        vk: u32,
        scan_code: u32,
        state: &KeyboardState,
        layout: LayoutHandle,
    ) -> RawTranslation {
        if self.panic_on_translate.swap(false, Ordering::SeqCst) {
            panic!("translation failed");
        }
        self.calls.lock().unwrap().push(TranslateCall {
            vk,
            scan_code,
            state: state.clone(),
            layout,
        });
        self.script.lock().unwrap().pop_front().unwrap_or_default()
    }

    fn scan_code(&self, vk: u32) -> u32 {
        vk + 0x100
    }
}

#[derive(Default)]
struct FakeHookInner {
    proc: Mutex<Option<Arc<dyn HookProc>>>,
    fail_install: AtomicBool,
    fail_uninstall: AtomicBool,
    dispatching: AtomicBool,
    installs: AtomicUsize,
    uninstalls_during_dispatch: AtomicUsize,
    uninstalls: AtomicUsize,
    next_handle: AtomicU32,
}

/// Hook backend that lets tests deliver events by hand.
#[derive(Clone, Default)]
pub struct FakeHook {
    inner: Arc<FakeHookInner>,
}

impl FakeHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_install(&self, fail: bool) {
        self.inner.fail_install.store(fail, Ordering::SeqCst);
    }

    /// Make uninstall fail with the hook left in place.
    pub fn fail_uninstall(&self, fail: bool) {
        self.inner.fail_uninstall.store(fail, Ordering::SeqCst);
    }

    /// Uninstalls requested from inside [`FakeHook::fire`].
    pub fn uninstalls_during_dispatch(&self) -> usize {
        self.inner.uninstalls_during_dispatch.load(Ordering::SeqCst)
    }

    pub fn installs(&self) -> usize {
        self.inner.installs.load(Ordering::SeqCst)
    }

    pub fn uninstalls(&self) -> usize {
        self.inner.uninstalls.load(Ordering::SeqCst)
    }

    pub fn is_installed(&self) -> bool {
        self.inner.proc.lock().unwrap().is_some()
    }

    /// Deliver an event the way the OS would. Returns how many times the
    /// event was forwarded to the next hook.
    pub fn fire(&self, code: i32, event: &RawKeyEvent) -> usize {
        let proc = self.inner.proc.lock().unwrap().clone();
        let mut forwarded = 0;
        let mut next = || {
            forwarded += 1;
            0isize
        };
        match proc {
            Some(proc) => {
                self.inner.dispatching.store(true, Ordering::SeqCst);
                proc.call(code, event, &mut next);
                self.inner.dispatching.store(false, Ordering::SeqCst);
            }
            None => {
                next();
            }
        }
        forwarded
    }
}

impl HookBackend for FakeHook {
    type Handle = u32;

    fn install(&self, proc: Arc<dyn HookProc>) -> Result<u32> {
        if self.inner.fail_install.load(Ordering::SeqCst) {
            return Err(Error::HookInstallFailed {
                code: 5,
                message: "Access is denied.".into(),
            });
        }
        *self.inner.proc.lock().unwrap() = Some(proc);
        self.inner.installs.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.next_handle.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn uninstall(&self, handle: u32) -> std::result::Result<(), UninstallError<u32>> {
        if self.inner.fail_uninstall.load(Ordering::SeqCst) {
            return Err(UninstallError::installed(
                Error::HookUninstallFailed("Invalid thread identifier.".into()),
                handle,
            ));
        }
        if self.inner.dispatching.load(Ordering::SeqCst) {
            self.inner
                .uninstalls_during_dispatch
                .fetch_add(1, Ordering::SeqCst);
        }
        *self.inner.proc.lock().unwrap() = None;
        self.inner.uninstalls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
