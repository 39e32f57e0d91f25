//! Minimal channel-keyed event emitter the Event pattern leaks onto.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

/// A listener callback. Handlers are synchronous and fire inline on emit.
pub type Handler = Box<dyn Fn() + Send + Sync>;

struct RegisteredListener {
    id: u64,
    handler: Handler,
}

/// Listener registry keyed by channel name.
///
/// The Event pattern registers handlers here and deliberately never calls
/// [`Emitter::off`]; [`Emitter::remove_channel`] exists so a stop can
/// sweep an entire channel at once.
pub struct Emitter {
    channels: RwLock<HashMap<String, Vec<RegisteredListener>>>,
    next_id: RwLock<u64>,
}

impl Emitter {
    /// Create an empty emitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            next_id: RwLock::new(0),
        }
    }

    /// Register a listener on a channel; returns its id.
    pub async fn on(&self, channel: &str, handler: Handler) -> u64 {
        let mut next_id = self.next_id.write().await;
        let id = *next_id;
        *next_id += 1;
        drop(next_id);

        let mut channels = self.channels.write().await;
        channels
            .entry(channel.to_string())
            .or_default()
            .push(RegisteredListener { id, handler });
        debug!(channel, listener_id = id, "listener registered");
        id
    }

    /// Fire every listener on a channel; returns how many ran.
    pub async fn emit(&self, channel: &str) -> usize {
        let channels = self.channels.read().await;
        let listeners = channels.get(channel).map_or(&[][..], Vec::as_slice);
        for listener in listeners {
            (listener.handler)();
        }
        listeners.len()
    }

    /// Remove one listener by id; returns whether it was registered.
    pub async fn off(&self, channel: &str, id: u64) -> bool {
        let mut channels = self.channels.write().await;
        let Some(listeners) = channels.get_mut(channel) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|listener| listener.id != id);
        before != listeners.len()
    }

    /// Drop a whole channel; returns how many listeners went with it.
    pub async fn remove_channel(&self, channel: &str) -> usize {
        let mut channels = self.channels.write().await;
        let removed = channels.remove(channel).map_or(0, |listeners| listeners.len());
        if removed > 0 {
            debug!(channel, removed, "channel swept");
        }
        removed
    }

    /// Listeners currently registered on a channel.
    pub async fn listener_count(&self, channel: &str) -> usize {
        let channels = self.channels.read().await;
        channels.get(channel).map_or(0, Vec::len)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> Handler {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[tokio::test]
    async fn should_register_listeners_and_count_them() {
        let emitter = Emitter::new();
        let counter = Arc::new(AtomicUsize::new(0));

        emitter.on("orders", counting_handler(&counter)).await;
        emitter.on("orders", counting_handler(&counter)).await;

        assert_eq!(emitter.listener_count("orders").await, 2);
        assert_eq!(emitter.listener_count("refunds").await, 0);
    }

    #[tokio::test]
    async fn should_fire_every_listener_on_emit() {
        let emitter = Emitter::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            emitter.on("orders", counting_handler(&counter)).await;
        }

        let fired = emitter.emit("orders").await;

        assert_eq!(fired, 3);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn should_emit_zero_on_unknown_channel() {
        let emitter = Emitter::new();

        assert_eq!(emitter.emit("nobody-home").await, 0);
    }

    #[tokio::test]
    async fn should_remove_a_single_listener_by_id() {
        let emitter = Emitter::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let first = emitter.on("orders", counting_handler(&counter)).await;
        emitter.on("orders", counting_handler(&counter)).await;

        assert!(emitter.off("orders", first).await);
        assert!(!emitter.off("orders", first).await);
        assert_eq!(emitter.listener_count("orders").await, 1);
    }

    #[tokio::test]
    async fn should_sweep_a_channel_in_one_call() {
        let emitter = Emitter::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            emitter.on("orders", counting_handler(&counter)).await;
        }

        let removed = emitter.remove_channel("orders").await;

        assert_eq!(removed, 4);
        assert_eq!(emitter.listener_count("orders").await, 0);
        assert_eq!(emitter.emit("orders").await, 0);
    }
}
