use crate::LoadingState;
use futures_core::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// An object that loads a value and publishes its loading state.
///
/// A `load()` call should promptly emit `Loading` (optionally with
/// progress), then exactly one of `Loaded` or `Failed`, unless the
/// consumer cancels first, in which case the stream terminates with no
/// terminal state at all. Failures always travel on the stream; `load()`
/// itself never reports one.
///
/// ```no_run
/// use loadrx::{Loadable, LoadingState, StateChannel, StateStream};
/// use tokio_util::sync::CancellationToken;
///
/// struct UserLoader {
///     channel: StateChannel<String>,
///     token: CancellationToken,
/// }
///
/// impl Loadable for UserLoader {
///     type Value = String;
///
///     fn state(&self) -> StateStream<String> {
///         self.channel.subscribe()
///     }
///
///     fn cancellation_token(&self) -> &CancellationToken {
///         &self.token
///     }
///
///     fn load(&self) {
///         let channel = self.channel.clone();
///         let token = self.token.clone();
///         tokio::spawn(async move {
///             channel.send(LoadingState::Loading(None));
///             let user = fetch_user().await;
///             if !token.is_cancelled() {
///                 channel.send(LoadingState::Loaded(user));
///             }
///         });
///     }
/// }
/// # async fn fetch_user() -> String { String::new() }
/// ```
pub trait Loadable: Send + Sync + 'static {
    /// Loaded value.
    type Value: Clone + Send + 'static;

    /// Subscribes to the loading states of `Value`.
    ///
    /// The stream is live: a subscriber observes state changes from the
    /// point of subscription forward, never a replay of past states.
    fn state(&self) -> StateStream<Self::Value>;

    /// Token through which a consumer requests cooperative cancellation.
    ///
    /// Implementations consult it at every suspension point and, once it is
    /// observed cancelled, stop emitting and terminate their stream.
    fn cancellation_token(&self) -> &CancellationToken;

    /// Initiates one loading attempt.
    ///
    /// Invoking `load()` while previous work is still outstanding is
    /// tolerated; how the calls interact is owner-defined unless a wrapper
    /// pins it down.
    fn load(&self);

    /// True once a consumer has requested cancellation.
    fn is_cancelled(&self) -> bool {
        self.cancellation_token().is_cancelled()
    }

    /// Requests cooperative cancellation of in-flight and future work.
    fn cancel(&self) {
        self.cancellation_token().cancel();
    }
}

/// Sharing a loader between its owner and a wrapper goes through `Arc`.
impl<L: Loadable> Loadable for Arc<L> {
    type Value = L::Value;

    fn state(&self) -> StateStream<Self::Value> {
        (**self).state()
    }

    fn cancellation_token(&self) -> &CancellationToken {
        (**self).cancellation_token()
    }

    fn load(&self) {
        (**self).load()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer endpoint of a loading-state stream.
///
/// One `StateChannel` belongs to exactly one producing instance; cloning
/// shares the same endpoint so spawned tasks can emit into it. Each
/// [`subscribe`](StateChannel::subscribe) hands out an independent, ordered
/// live stream. There is no replay: a subscriber only sees states sent
/// after it subscribed.
pub struct StateChannel<V> {
    shared: Arc<Mutex<Subscribers<V>>>,
}

struct Subscribers<V> {
    senders: Vec<UnboundedSender<LoadingState<V>>>,
    closed: bool,
}

impl<V> Clone for StateChannel<V> {
    fn clone(&self) -> Self {
        StateChannel {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> Default for StateChannel<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> StateChannel<V> {
    pub fn new() -> Self {
        StateChannel {
            shared: Arc::new(Mutex::new(Subscribers {
                senders: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Opens a live subscription.
    ///
    /// Subscribing to a closed channel yields a stream that ends
    /// immediately.
    pub fn subscribe(&self) -> StateStream<V> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = lock(&self.shared);
        if !subscribers.closed {
            subscribers.senders.push(tx);
        }
        StateStream { receiver: rx }
    }

    /// Terminates the stream for every current and future subscriber.
    ///
    /// Idempotent; pending receivers unblock with stream-end.
    pub fn close(&self) {
        let mut subscribers = lock(&self.shared);
        subscribers.closed = true;
        subscribers.senders.clear();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }
}

impl<V: Clone> StateChannel<V> {
    /// Delivers `state` to every live subscriber, in subscription order.
    ///
    /// No-op once the channel is closed. Subscribers that dropped their
    /// stream are pruned here.
    pub fn send(&self, state: LoadingState<V>) {
        let mut subscribers = lock(&self.shared);
        if subscribers.closed {
            return;
        }
        subscribers
            .senders
            .retain(|tx| tx.send(state.clone()).is_ok());
    }
}

/// Consumer endpoint of a loading-state stream.
///
/// Implements [`Stream`]; [`recv`](StateStream::recv) is the combinator-free
/// way to await the next state.
#[derive(Debug)]
pub struct StateStream<V> {
    receiver: UnboundedReceiver<LoadingState<V>>,
}

impl<V> StateStream<V> {
    /// Awaits the next state; `None` means the producer closed the stream.
    pub async fn recv(&mut self) -> Option<LoadingState<V>> {
        self.receiver.recv().await
    }
}

impl<V> Stream for StateStream<V> {
    type Item = LoadingState<V>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
