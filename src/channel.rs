//! Channel-based event receiving.
//!
//! Subscribers run on the hook thread and must return quickly. Forwarding
//! the notifications into a channel lets the application consume them on
//! its own thread or task instead.
//!
//! # Example (Sync)
//!
//! ```no_run
//! # #[cfg(target_os = "windows")]
//! # fn main() -> keyintercept::Result<()> {
//! use keyintercept::KeyboardInterceptor;
//! use keyintercept::channel::event_channel;
//!
//! let interceptor = KeyboardInterceptor::new();
//! let (_subscription, rx) = event_channel(interceptor.subscribers(), 100);
//! interceptor.start()?;
//!
//! for event in rx.iter() {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(target_os = "windows"))]
//! # fn main() {}
//! ```
//!
//! # Example (Async with Tokio)
//!
//! ```ignore
//! use keyintercept::KeyboardInterceptor;
//! use keyintercept::channel::async_event_channel;
//!
//! #[tokio::main]
//! async fn main() {
//!     let interceptor = KeyboardInterceptor::new();
//!     let (_subscription, mut rx) = async_event_channel(interceptor.subscribers(), 100);
//!     interceptor.start().expect("Failed to start capture");
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

use crate::event::{InterceptorEvent, KeyEvent};
use crate::hook::{SubscriptionId, Subscribers};
use log::trace;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};

/// Keeps the channel subscribed. Dropping it removes the three handlers.
pub struct ChannelSubscription {
    subscribers: Arc<Subscribers>,
    ids: [SubscriptionId; 3],
}

impl ChannelSubscription {
    /// Stop forwarding events into the channel.
    pub fn unsubscribe(self) {}
}

impl Drop for ChannelSubscription {
    fn drop(&mut self) {
        for id in self.ids {
            self.subscribers.unsubscribe(id);
        }
    }
}

/// Destination for forwarded notifications. Must never block.
trait EventSink: Send + Sync + 'static {
    fn send(&self, event: InterceptorEvent);
}

/// Sends events to a bounded sync channel.
struct BoundedSink {
    sender: SyncSender<InterceptorEvent>,
}

impl EventSink for BoundedSink {
    fn send(&self, event: InterceptorEvent) {
        // Never block the hook thread
        if let Err(TrySendError::Full(event)) = self.sender.try_send(event) {
            trace!("event channel full, dropping {:?}", event);
        }
    }
}

/// Sends events to an unbounded sync channel.
struct UnboundedSink {
    sender: Sender<InterceptorEvent>,
}

impl EventSink for UnboundedSink {
    fn send(&self, event: InterceptorEvent) {
        let _ = self.sender.send(event);
    }
}

fn subscribe_sink<S: EventSink>(subscribers: &Arc<Subscribers>, sink: S) -> ChannelSubscription {
    let sink = Arc::new(sink);

    let down = {
        let sink = sink.clone();
        subscribers.on_key_down(move |e: &KeyEvent| sink.send(InterceptorEvent::KeyDown(*e)))
    };
    let up = {
        let sink = sink.clone();
        subscribers.on_key_up(move |e: &KeyEvent| sink.send(InterceptorEvent::KeyUp(*e)))
    };
    let press = subscribers.on_key_press(move |ch: char| sink.send(InterceptorEvent::KeyPress(ch)));

    ChannelSubscription {
        subscribers: subscribers.clone(),
        ids: [down, up, press],
    }
}

/// Forward all notifications to a bounded channel.
///
/// # Arguments
///
/// * `capacity` - Maximum number of events to buffer. If the buffer is full,
///   new events are dropped to prevent blocking input.
pub fn event_channel(
    subscribers: &Arc<Subscribers>,
    capacity: usize,
) -> (ChannelSubscription, Receiver<InterceptorEvent>) {
    let (sender, receiver) = mpsc::sync_channel(capacity);
    (subscribe_sink(subscribers, BoundedSink { sender }), receiver)
}

/// Forward all notifications to an unbounded channel.
///
/// No event is ever dropped, so memory grows if the consumer falls behind.
pub fn unbounded_event_channel(
    subscribers: &Arc<Subscribers>,
) -> (ChannelSubscription, Receiver<InterceptorEvent>) {
    let (sender, receiver) = mpsc::channel();
    (subscribe_sink(subscribers, UnboundedSink { sender }), receiver)
}

// ============================================================================
// Tokio async support (behind feature flag)
// ============================================================================

#[cfg(feature = "tokio")]
pub use tokio_channel::*;

#[cfg(feature = "tokio")]
mod tokio_channel {
    use super::*;
    use tokio::sync::mpsc as tokio_mpsc;

    /// Sends events to a tokio async channel.
    struct TokioSink {
        sender: tokio_mpsc::Sender<InterceptorEvent>,
    }

    impl EventSink for TokioSink {
        fn send(&self, event: InterceptorEvent) {
            // Never block the hook thread
            let _ = self.sender.try_send(event);
        }
    }

    /// Forward all notifications to a tokio channel.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer
    pub fn async_event_channel(
        subscribers: &Arc<Subscribers>,
        capacity: usize,
    ) -> (ChannelSubscription, tokio_mpsc::Receiver<InterceptorEvent>) {
        let (sender, receiver) = tokio_mpsc::channel(capacity);
        (subscribe_sink(subscribers, TokioSink { sender }), receiver)
    }
}
