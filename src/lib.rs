//! # keyintercept
//!
//! System-wide keyboard interception with modifier-aware key codes and
//! dead-key aware Unicode translation.
//!
//! ## Features
//!
//! - Global low-level keyboard hook (Windows `WH_KEYBOARD_LL`)
//! - Key codes combined with the Ctrl/Shift/Alt/AltGr modifiers held at the time
//! - Typed characters as the user sees them, including dead-key accents
//!   (`´` followed by `e` gives `é`)
//! - Multiple ordered subscribers per notification, or channel-based consumption
//! - Events are always passed on to the next hook, even if processing fails
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(target_os = "windows")]
//! # fn main() -> keyintercept::Result<()> {
//! use keyintercept::{KeyEvent, KeyboardInterceptor};
//!
//! let interceptor = KeyboardInterceptor::new();
//! interceptor.on_key_down(|event: &KeyEvent| {
//!     if event.key_code.has_control() {
//!         println!("shortcut: {}", event.key_code);
//!     }
//! });
//! interceptor.on_key_press(|ch: char| print!("{}", ch));
//! interceptor.start()?;
//! # Ok(())
//! # }
//! # #[cfg(not(target_os = "windows"))]
//! # fn main() {}
//! ```
//!
//! ## Architecture
//!
//! The OS collaborators live behind the traits in [`backend`]. The
//! [`processor`] turns each hook invocation into notifications, using the
//! [`modifiers`] reader for key codes and the [`translate`] module for
//! characters. [`KeyboardInterceptor`] owns the hook registration.

pub mod backend;
pub mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod hook;
pub mod keycode;
pub mod modifiers;
pub mod processor;
pub mod translate;

mod platform;

#[cfg(test)]
mod testing;

// Re-exports
pub use backend::{
    HookBackend, HookProc, KeyStateSource, Keyboard, KeyboardState, LayoutHandle, RawTranslation,
    UninstallError,
};
pub use config::InterceptorConfig;
pub use error::{Error, Result};
pub use event::{InterceptorEvent, KeyEvent, KeyEventKind, RawKeyEvent};
pub use hook::{CharHandler, KeyHandler, KeyboardInterceptor, SubscriptionId, Subscribers};
pub use keycode::KeyCode;
pub use modifiers::ModifierState;
pub use processor::Processor;
pub use translate::{DeadKeyAccumulator, DeadKeyTranslator};

#[cfg(target_os = "windows")]
pub use platform::{WindowsHook, WindowsHookHandle, WindowsKeyboard};
