//! Interceptor configuration.

use crate::keycode::vk;

/// Default cap on the dead-key drain loop.
pub const DEFAULT_DRAIN_LIMIT: usize = 16;

/// Tunables for a [`KeyboardInterceptor`](crate::KeyboardInterceptor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorConfig {
    /// Maximum number of commit-key translations issued to flush a buffered
    /// dead key out of the translation primitive.
    pub drain_limit: usize,
    /// Neutral key used to flush the primitive. Translated with an empty
    /// keyboard state, so it must produce a character on every layout.
    pub commit_key: u8,
    /// Forward synthesized events without processing them.
    pub ignore_injected: bool,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            drain_limit: DEFAULT_DRAIN_LIMIT,
            commit_key: vk::DECIMAL,
            ignore_injected: false,
        }
    }
}

impl InterceptorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain_limit(mut self, limit: usize) -> Self {
        // at least one drain call is always needed
        self.drain_limit = limit.max(1);
        self
    }

    pub fn commit_key(mut self, key: u8) -> Self {
        self.commit_key = key;
        self
    }

    pub fn ignore_injected(mut self, ignore: bool) -> Self {
        self.ignore_injected = ignore;
        self
    }
}
