use crate::LoadingState;
use futures_core::stream::Stream;
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Extension methods for streams of [`LoadingState`].
pub trait LoadStateStreamExt<V>: Stream<Item = LoadingState<V>> {
    /// Passes states through until the first terminal state, yields it,
    /// then ends.
    ///
    /// This is the standard way for a consumer to observe exactly one load
    /// attempt from a live stream that would otherwise stay open:
    ///
    /// ```no_run
    /// use futures::StreamExt;
    /// use loadrx::{Loadable, LoadStateStreamExt};
    ///
    /// async fn await_outcome<L: Loadable>(loader: &L) {
    ///     let mut states = loader.state().until_terminal();
    ///     loader.load();
    ///     while let Some(state) = states.next().await {
    ///         // last observed state is Loaded or Failed
    ///     }
    /// }
    /// ```
    fn until_terminal(self) -> UntilTerminal<Self>
    where
        Self: Sized,
    {
        UntilTerminal {
            stream: self,
            done: false,
        }
    }
}

impl<S, V> LoadStateStreamExt<V> for S where S: Stream<Item = LoadingState<V>> {}

/// Stream for the [`until_terminal`](LoadStateStreamExt::until_terminal)
/// method.
#[pin_project(project = UntilTerminalProj)]
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct UntilTerminal<S> {
    #[pin]
    stream: S,
    done: bool,
}

impl<S, V> Stream for UntilTerminal<S>
where
    S: Stream<Item = LoadingState<V>>,
{
    type Item = LoadingState<V>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let UntilTerminalProj { stream, done } = self.project();

        if *done {
            return Poll::Ready(None);
        }
        match stream.poll_next(cx) {
            Poll::Ready(Some(state)) => {
                if state.is_terminal() {
                    *done = true;
                }
                Poll::Ready(Some(state))
            }
            Poll::Ready(None) => {
                *done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
