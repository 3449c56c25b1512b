//! Lazily fetched record sequences

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, Stream, StreamExt};

use crate::error::Error;

/// One-shot sequence of records fetched on demand from PuppetDB.
///
/// Advancing the stream may perform network I/O and may yield an error at
/// any position, not only the first. The stream is consumed by value;
/// callers that need several passes over the records use [`try_collect`].
///
/// [`try_collect`]: RecordStream::try_collect
pub struct RecordStream<T> {
    inner: Pin<Box<dyn Stream<Item = Result<T, Error>> + Send>>,
}

impl<T> RecordStream<T> {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Build a stream from already materialised results
    pub fn from_results(items: Vec<Result<T, Error>>) -> Self
    where
        T: Send + 'static,
    {
        Self::new(stream::iter(items))
    }

    /// Apply `f` to every successfully fetched record
    pub fn map_records<U, F>(self, mut f: F) -> RecordStream<U>
    where
        F: FnMut(T) -> U + Send + 'static,
        T: 'static,
        U: 'static,
    {
        RecordStream::new(self.map(move |item| item.map(&mut f)))
    }

    /// Drain the stream into a vector, stopping at the first error
    pub async fn try_collect(mut self) -> Result<Vec<T>, Error> {
        let mut records = Vec::new();
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        Ok(records)
    }
}

impl<T> Stream for RecordStream<T> {
    type Item = Result<T, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> fmt::Debug for RecordStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream").finish_non_exhaustive()
    }
}
