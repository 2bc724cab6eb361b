//! Win32 implementations of the hook and keyboard collaborators.

mod hook;
mod keyboard;

pub use hook::{WindowsHook, WindowsHookHandle};
pub use keyboard::WindowsKeyboard;
