//! Windows key state, layout and Unicode translation queries.

use crate::backend::{KeyStateSource, Keyboard, KeyboardState, LayoutHandle, RawTranslation};
use crate::error::{Error, Result};
use crate::keycode::vk;
use std::ffi::c_void;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyState, GetKeyboardLayout, GetKeyboardState, MAPVK_VK_TO_VSC,
    MapVirtualKeyW, ToUnicodeEx,
};
use windows::Win32::UI::TextServices::HKL;
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};

/// Size of the ToUnicodeEx output buffer, in UTF-16 units.
const TRANSLATE_BUFFER_LEN: usize = 64;

/// Modifiers whose pressed bit is refreshed from the physical state.
const MODIFIER_KEYS: [u8; 9] = [
    vk::SHIFT,
    vk::CONTROL,
    vk::MENU,
    vk::LSHIFT,
    vk::RSHIFT,
    vk::LCONTROL,
    vk::RCONTROL,
    vk::LMENU,
    vk::RMENU,
];

/// Keys whose toggle bit is refreshed from the system-wide state.
const LOCK_KEYS: [u8; 3] = [vk::CAPITAL, vk::NUMLOCK, vk::SCROLL];

/// Win32 implementation of the keyboard queries.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsKeyboard;

impl WindowsKeyboard {
    pub fn new() -> Self {
        Self
    }
}

impl KeyStateSource for WindowsKeyboard {
    fn is_pressed(&self, vk: u8) -> bool {
        // High bit: the key is down right now
        unsafe { GetAsyncKeyState(i32::from(vk)) } < 0
    }

    fn keyboard_state(&self) -> Result<KeyboardState> {
        let mut state = KeyboardState::empty();
        unsafe { GetKeyboardState(&mut state.0) }
            .map_err(|e| Error::KeyboardStateUnavailable(e.message()))?;

        // The hook thread's queue state lags behind for modifiers the user
        // is holding, which would translate `A` as `a` with Shift down.
        for key in MODIFIER_KEYS {
            state.set_pressed(key, self.is_pressed(key));
        }
        // Same for Caps Lock and the other lock keys toggled since.
        for key in LOCK_KEYS {
            let toggled = unsafe { GetKeyState(i32::from(key)) } & 1 != 0;
            state.set_toggled(key, toggled);
        }

        Ok(state)
    }
}

impl Keyboard for WindowsKeyboard {
    fn foreground_layout(&self) -> LayoutHandle {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            return LayoutHandle::NONE;
        }

        let thread_id = unsafe { GetWindowThreadProcessId(hwnd, None) };
        let hkl = unsafe { GetKeyboardLayout(thread_id) };
        LayoutHandle(hkl.0 as isize)
    }

    fn to_unicode(
        &self,
        vk: u32,
        scan_code: u32,
        state: &KeyboardState,
        layout: LayoutHandle,
    ) -> RawTranslation {
        let mut buffer = [0u16; TRANSLATE_BUFFER_LEN];
        let hkl = HKL(layout.0 as *mut c_void);
        let count =
            unsafe { ToUnicodeEx(vk, scan_code, state.as_bytes(), &mut buffer, 0, Some(hkl)) };

        let text = if count > 0 {
            let len = (count as usize).min(buffer.len());
            String::from_utf16_lossy(&buffer[..len])
        } else {
            String::new()
        };

        RawTranslation { count, text }
    }

    fn scan_code(&self, vk: u32) -> u32 {
        unsafe { MapVirtualKeyW(vk, MAPVK_VK_TO_VSC) }
    }
}
