//! Streaming helpers for large listings
//!
//! [`YieldOrStop`] turns a fallible record stream into an infallible one that
//! ends at the first error. [`chunked_flush`] batches rendered fragments into
//! body chunks so a listing is sent while it is still being fetched.

use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use pin_project_lite::pin_project;

pin_project! {
    /// Passes records through until the inner stream yields an error, then ends.
    ///
    /// The error is logged and dropped. Nothing is retried.
    #[must_use = "streams do nothing unless polled"]
    pub struct YieldOrStop<S> {
        #[pin]
        inner: S,
        done: bool,
        yielded: usize,
    }
}

impl<S> YieldOrStop<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            done: false,
            yielded: 0,
        }
    }
}

impl<S, T, E> Stream for YieldOrStop<S>
where
    S: Stream<Item = Result<T, E>>,
    E: Display,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => {
                *this.yielded += 1;
                Poll::Ready(Some(item))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(
                    error = %e,
                    records = *this.yielded,
                    "Fetch failed mid-stream, truncating listing"
                );
                *this.done = true;
                Poll::Ready(None)
            }
            Poll::Ready(None) => {
                *this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, self.inner.size_hint().1)
        }
    }
}

/// Group rendered fragments into chunks of at least `flush_every` fragments.
///
/// A chunk is emitted as soon as `flush_every` fragments are buffered; the
/// remainder goes out when the input ends. No empty chunk is emitted.
pub fn chunked_flush<S>(
    fragments: S,
    flush_every: usize,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = String> + Send + 'static,
{
    let flush_every = flush_every.max(1);
    async_stream::stream! {
        let mut fragments = std::pin::pin!(fragments);
        let mut buffer = String::new();
        let mut buffered = 0usize;

        while let Some(fragment) = fragments.next().await {
            buffer.push_str(&fragment);
            buffered += 1;
            if buffered >= flush_every {
                tracing::trace!(fragments = buffered, bytes = buffer.len(), "Flushing chunk");
                yield Ok(Bytes::from(std::mem::take(&mut buffer)));
                buffered = 0;
            }
        }

        if buffered > 0 {
            tracing::trace!(fragments = buffered, bytes = buffer.len(), "Flushing final chunk");
            yield Ok(Bytes::from(buffer));
        }
    }
}

/// Fragments of a streamed page: `header`, one per record, then `footer`
pub fn page_fragments<T, S, F>(
    header: String,
    records: S,
    mut row: F,
    footer: String,
) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = T> + Send + 'static,
    F: FnMut(T) -> String + Send + 'static,
{
    stream::once(async move { header })
        .chain(records.map(move |record| row(record)))
        .chain(stream::once(async move { footer }))
}
