//! Windows low-level keyboard hook using SetWindowsHookEx.
//!
//! Each installation runs its own thread with a message loop. The OS calls
//! the hook procedure on that thread, so the processor and hook handle are
//! kept in thread-locals and several capture sessions can coexist.

use crate::backend::{HookBackend, HookProc, UninstallError};
use crate::error::{Error, Result};
use crate::event::{KeyEventKind, RawKeyEvent};
use crate::platform::join_hook_thread;
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, HHOOK, KBDLLHOOKSTRUCT, MSG, PM_NOREMOVE, PeekMessageW,
    PostThreadMessageW, SetWindowsHookExW, UnhookWindowsHookEx, WH_KEYBOARD_LL, WM_QUIT, WM_USER,
};

thread_local! {
    /// Processor receiving the events of the hook installed on this thread.
    static HOOK_PROC: RefCell<Option<Arc<dyn HookProc>>> = const { RefCell::new(None) };

    /// Hook handle installed on this thread.
    static HOOK: Cell<Option<HHOOK>> = const { Cell::new(None) };
}

/// Extract the Win32 error code from a windows-rs error.
fn os_error_code(error: &windows::core::Error) -> i32 {
    let hresult = error.code().0;
    // HRESULT_FROM_WIN32 packs the code into FACILITY_WIN32
    if (hresult as u32) & 0xFFFF_0000 == 0x8007_0000 {
        hresult & 0xFFFF
    } else {
        hresult
    }
}

/// Keyboard hook callback
unsafe extern "system" fn keyboard_callback(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let hook = HOOK.with(Cell::get);
    let mut next = || unsafe { CallNextHookEx(hook, code, wparam, lparam) }.0;

    if code < 0 {
        return LRESULT(next());
    }

    let Some(proc) = HOOK_PROC.with(|p| p.borrow().clone()) else {
        return LRESULT(next());
    };

    // SAFETY: lparam points to a KBDLLHOOKSTRUCT for non-negative codes.
    let kb = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
    let event = RawKeyEvent {
        vk_code: kb.vkCode,
        scan_code: kb.scanCode,
        flags: kb.flags.0,
        time: kb.time,
        extra_info: kb.dwExtraInfo,
        kind: KeyEventKind::from_message(wparam.0 as u32),
    };

    LRESULT(proc.call(code, &event, &mut next))
}

/// Install the hook on the current thread and pump messages until WM_QUIT.
fn run_hook_thread(proc: Arc<dyn HookProc>, ready: mpsc::Sender<Result<u32>>) -> Result<()> {
    HOOK_PROC.with(|p| *p.borrow_mut() = Some(proc));

    let hook = match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_callback), None, 0) }
    {
        Ok(hook) => hook,
        Err(e) => {
            HOOK_PROC.with(|p| p.borrow_mut().take());
            let _ = ready.send(Err(Error::HookInstallFailed {
                code: os_error_code(&e),
                message: e.message(),
            }));
            return Ok(());
        }
    };
    HOOK.with(|h| h.set(Some(hook)));

    // Force creation of the message queue so WM_QUIT can be posted to us
    let mut msg = MSG::default();
    unsafe {
        let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
    }

    let thread_id = unsafe { GetCurrentThreadId() };
    debug!("keyboard hook installed on thread {}", thread_id);
    let _ = ready.send(Ok(thread_id));

    // GetMessageW returns 0 for WM_QUIT and -1 on error
    loop {
        let ret = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        if ret.0 == 0 || ret.0 == -1 {
            break;
        }
    }

    HOOK.with(|h| h.set(None));
    HOOK_PROC.with(|p| p.borrow_mut().take());

    unsafe { UnhookWindowsHookEx(hook) }.map_err(|e| Error::HookUninstallFailed(e.message()))?;
    debug!("keyboard hook removed from thread {}", thread_id);
    Ok(())
}

/// Handle of an installed hook: the thread running its message loop.
pub struct WindowsHookHandle {
    thread_id: u32,
    thread: JoinHandle<Result<()>>,
}

impl WindowsHookHandle {
    /// Thread the hook callback runs on.
    pub fn thread_id(&self) -> u32 {
        self.thread_id
    }
}

/// `WH_KEYBOARD_LL` hook backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsHook;

impl WindowsHook {
    pub fn new() -> Self {
        Self
    }
}

impl HookBackend for WindowsHook {
    type Handle = WindowsHookHandle;

    fn install(&self, proc: Arc<dyn HookProc>) -> Result<WindowsHookHandle> {
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("keyintercept-hook".into())
            .spawn(move || run_hook_thread(proc, ready_tx))
            .map_err(|e| Error::ThreadError(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(WindowsHookHandle { thread_id, thread }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::ThreadError(
                    "hook thread exited before installing the hook".into(),
                ))
            }
        }
    }

    fn uninstall(
        &self,
        handle: WindowsHookHandle,
    ) -> std::result::Result<(), UninstallError<WindowsHookHandle>> {
        if let Err(e) =
            unsafe { PostThreadMessageW(handle.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }
        {
            warn!("could not stop hook thread {}: {}", handle.thread_id, e);
            return Err(UninstallError::installed(
                Error::HookUninstallFailed(e.message()),
                handle,
            ));
        }

        Ok(join_hook_thread(handle.thread)?)
    }
}
