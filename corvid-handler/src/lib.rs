//! Typed event handler registry.
//!
//! Subscribers register against a concrete payload type `T`, either as a
//! synchronous pre-handler (run before the cabinet reducer, in registration
//! order, on the caller's thread) or as a post-handler (run after the
//! reducer): a spawned async closure, or an [`mpsc`](tokio::sync::mpsc)
//! channel. A handler invocation that panics is caught and logged; it never
//! takes down the dispatching task.

mod event;

pub use event::{
    ChannelCreated, ChannelDeleted, ChannelUpdated, GuildCreated, GuildUpdated, ReactionAdded,
    ReactionRemoved, RoleCreated, RoleUpdated,
};

use futures_util::{future::BoxFuture, FutureExt};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};
use tokio::sync::mpsc;
use tracing::error;

/// Blanket marker for payloads that can flow through a [`Handlers`] registry.
pub trait Event: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Event for T {}

/// Behavior of a channel subscriber when its buffer is full.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Overflow {
    /// Wait for room (applies backpressure to the dispatcher).
    Block,
    /// Drop the event and move on.
    Drop,
}

type PreFn<T> = Box<dyn Fn(&T) + Send + Sync>;
type PostFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

enum PostSubscriber<T> {
    Func(PostFn<T>),
    Channel {
        sender: mpsc::Sender<T>,
        overflow: Overflow,
    },
}

struct Bucket<T> {
    pre: Vec<(u64, PreFn<T>)>,
    post: Vec<(u64, PostSubscriber<T>)>,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self {
            pre: Vec::new(),
            post: Vec::new(),
        }
    }
}

/// Removes a registration when invoked; safe to call concurrently with
/// dispatch. Dropping it without calling it leaves the registration active.
pub struct Unsubscribe(Box<dyn FnOnce() + Send>);

impl Unsubscribe {
    fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Remove the registration.
    pub fn unsubscribe(self) {
        (self.0)();
    }
}

impl Debug for Unsubscribe {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe").finish_non_exhaustive()
    }
}

/// A typed multiplexer of event subscribers.
///
/// Cloning a [`Handlers`] is not provided; wrap it in an [`Arc`] and share
/// that instead, the same way a cabinet or shard cluster is shared across
/// tasks.
#[derive(Default)]
pub struct Handlers {
    buckets: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    next_id: AtomicU64,
}

impl Debug for Handlers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers").finish_non_exhaustive()
    }
}

impl Handlers {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket<T: Event>(&self) -> Arc<RwLock<Bucket<T>>> {
        let type_id = TypeId::of::<T>();

        let existing = self
            .buckets
            .read()
            .expect("handlers poisoned")
            .get(&type_id)
            .cloned();

        let any = existing.unwrap_or_else(|| {
            Arc::clone(
                self.buckets
                    .write()
                    .expect("handlers poisoned")
                    .entry(type_id)
                    .or_insert_with(|| Arc::new(RwLock::new(Bucket::<T>::default()))),
            )
        });

        any.downcast::<RwLock<Bucket<T>>>()
            .expect("bucket type mismatch")
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a synchronous pre-handler for `T`, called in registration
    /// order on the dispatching thread, before the cabinet reducer runs.
    pub fn on_pre<T: Event>(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Unsubscribe {
        let bucket = self.bucket::<T>();
        let id = self.next_id();

        bucket
            .write()
            .expect("bucket poisoned")
            .pre
            .push((id, Box::new(handler)));

        Unsubscribe::new(move || {
            bucket
                .write()
                .expect("bucket poisoned")
                .pre
                .retain(|(existing, _)| *existing != id);
        })
    }

    /// Registers an async post-handler for `T`. Each dispatched event runs
    /// the handler in its own spawned task; a panic inside it is caught and
    /// logged rather than propagated.
    pub fn on_post<T, F>(&self, handler: impl Fn(T) -> F + Send + Sync + 'static) -> Unsubscribe
    where
        T: Event,
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bucket = self.bucket::<T>();
        let id = self.next_id();
        let handler: PostFn<T> = Arc::new(move |event| handler(event).boxed());

        bucket
            .write()
            .expect("bucket poisoned")
            .post
            .push((id, PostSubscriber::Func(handler)));

        Unsubscribe::new(move || {
            bucket
                .write()
                .expect("bucket poisoned")
                .post
                .retain(|(existing, _)| *existing != id);
        })
    }

    /// Subscribes a channel to `T`, returning its receiver. `overflow`
    /// controls behavior when the channel's buffer is full; the default
    /// policy elsewhere in the ecosystem is [`Overflow::Block`].
    pub fn subscribe<T: Event>(
        &self,
        capacity: usize,
        overflow: Overflow,
    ) -> (mpsc::Receiver<T>, Unsubscribe) {
        let (sender, receiver) = mpsc::channel(capacity);
        let bucket = self.bucket::<T>();
        let id = self.next_id();

        bucket
            .write()
            .expect("bucket poisoned")
            .post
            .push((id, PostSubscriber::Channel { sender, overflow }));

        let unsubscribe = Unsubscribe::new(move || {
            bucket
                .write()
                .expect("bucket poisoned")
                .post
                .retain(|(existing, _)| *existing != id);
        });

        (receiver, unsubscribe)
    }

    /// Runs every registered pre-handler for `T`, in registration order, on
    /// the caller's thread. Call this before mutating the cabinet.
    pub fn dispatch_pre<T: Event>(&self, event: &T) {
        if !self.buckets.read().expect("handlers poisoned").contains_key(&TypeId::of::<T>()) {
            return;
        }

        let bucket = self.bucket::<T>();
        let bucket = bucket.read().expect("bucket poisoned");

        for (_, handler) in &bucket.pre {
            if std::panic::catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!("pre-handler panicked");
            }
        }
    }

    /// Fans `event` out to every registered post-handler for `T`. Call this
    /// after the cabinet reducer has applied the event.
    pub fn dispatch_post<T: Event>(&self, event: T) {
        if !self.buckets.read().expect("handlers poisoned").contains_key(&TypeId::of::<T>()) {
            return;
        }

        let bucket = self.bucket::<T>();
        let bucket = bucket.read().expect("bucket poisoned");

        for (_, subscriber) in &bucket.post {
            match subscriber {
                PostSubscriber::Func(handler) => {
                    let handler = Arc::clone(handler);
                    let event = event.clone();

                    tokio::spawn(async move {
                        if AssertUnwindSafe(handler(event)).catch_unwind().await.is_err() {
                            error!("post-handler panicked");
                        }
                    });
                }
                PostSubscriber::Channel { sender, overflow } => {
                    let sender = sender.clone();
                    let event = event.clone();

                    match overflow {
                        Overflow::Block => {
                            tokio::spawn(async move {
                                let _ = sender.send(event).await;
                            });
                        }
                        Overflow::Drop => {
                            let _ = sender.try_send(event);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, Handlers, Overflow};
    use static_assertions::assert_impl_all;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    assert_impl_all!(Handlers: Send, Sync);

    #[derive(Clone)]
    struct Ping(u32);

    #[test]
    fn pre_handlers_run_synchronously_in_registration_order() {
        let handlers = Handlers::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let a = Arc::clone(&seen);
        handlers.on_pre::<Ping>(move |p| a.lock().unwrap().push(("a", p.0)));
        let b = Arc::clone(&seen);
        handlers.on_pre::<Ping>(move |p| b.lock().unwrap().push(("b", p.0)));

        handlers.dispatch_pre(&Ping(1));

        assert_eq!(*seen.lock().unwrap(), vec![("a", 1), ("b", 1)]);
    }

    #[test]
    fn unsubscribing_a_pre_handler_stops_future_invocations() {
        let handlers = Handlers::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);

        let unsubscribe = handlers.on_pre::<Ping>(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        handlers.dispatch_pre(&Ping(1));
        unsubscribe.unsubscribe();
        handlers.dispatch_pre(&Ping(2));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn post_handler_panic_is_caught_and_does_not_stop_other_subscribers() {
        let handlers = Handlers::new();

        handlers.on_post::<Ping, _>(|_| async { panic!("boom") });

        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        handlers.on_post::<Ping, _>(move |_| {
            let counted = Arc::clone(&counted);
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
            }
        });

        handlers.dispatch_post(Ping(1));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn channel_subscriber_with_drop_overflow_discards_past_capacity() {
        let handlers = Handlers::new();
        let (mut receiver, _unsubscribe) = handlers.subscribe::<Ping>(1, Overflow::Drop);

        handlers.dispatch_post(Ping(1));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        handlers.dispatch_post(Ping(2));

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.0, 1);
    }

    fn _assert_event<T: Event>() {}
}
