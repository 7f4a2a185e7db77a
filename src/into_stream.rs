//! IntoStream adapter
//!
//! Converts any [`Observable`] into a `futures::Stream`, so a consumer can
//! await values instead of registering a callback.
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use rxmux::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let subject = Subject::<u8>::new();
//! let mut stream = subject.into_stream().unwrap();
//!
//! subject.next(7);
//! assert_eq!(stream.next().await, Some(7));
//! # });
//! ```

use std::{
  collections::VecDeque,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll, Waker},
};

use futures::stream::Stream;
use parking_lot::Mutex;

use crate::{
  error::Result,
  observable::Observable,
  observer::{FnMutObserver, IntoBoxedObserver},
  subscription::SubscriptionLike,
};

/// Buffer shared between the subscription and the stream consumer.
struct State<T> {
  queue: VecDeque<T>,
  waker: Option<Waker>,
}

/// A `Stream` yielding the values emitted by a hot source.
///
/// Values emitted faster than they are polled are buffered. The stream never
/// ends on its own; it stops receiving when dropped.
pub struct IntoStream<T, U: SubscriptionLike> {
  state: Arc<Mutex<State<T>>>,
  unsub: Option<U>,
}

impl<T, U> IntoStream<T, U>
where
  T: Send + 'static,
  U: SubscriptionLike,
{
  /// Subscribes to `source` and buffers what it emits.
  pub fn new<O>(source: &O) -> Result<Self>
  where
    O: Observable<T, Unsub = U> + ?Sized,
  {
    let state = Arc::new(Mutex::new(State { queue: VecDeque::new(), waker: None }));
    let c_state = state.clone();
    let observer = FnMutObserver(move |value: T| {
      let mut state = c_state.lock();
      state.queue.push_back(value);
      if let Some(waker) = state.waker.take() {
        waker.wake();
      }
    });
    let unsub = source.actual_subscribe(observer.into_boxed())?;
    Ok(IntoStream { state, unsub: Some(unsub) })
  }
}

impl<T, U: SubscriptionLike> IntoStream<T, U> {
  /// Number of values received but not yet polled.
  pub fn queued(&self) -> usize { self.state.lock().queue.len() }
}

impl<T, U: SubscriptionLike> Stream for IntoStream<T, U> {
  type Item = T;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
    let mut state = self.state.lock();
    if let Some(item) = state.queue.pop_front() {
      return Poll::Ready(Some(item));
    }
    state.waker = Some(cx.waker().clone());
    Poll::Pending
  }
}

impl<T, U: SubscriptionLike> Drop for IntoStream<T, U> {
  fn drop(&mut self) {
    if let Some(mut unsub) = self.unsub.take() {
      unsub.unsubscribe();
    }
  }
}

#[cfg(test)]
mod tests {
  use futures::StreamExt;

  use crate::prelude::*;

  #[rxmux_macro::test(local)]
  async fn receives_values_in_order() {
    let subject = Subject::<i32>::new();
    let mut stream = subject.into_stream().unwrap();

    subject.next(1);
    subject.next(2);
    subject.next(3);
    assert_eq!(stream.queued(), 3);

    let values: Vec<i32> = stream.by_ref().take(3).collect().await;
    assert_eq!(values, vec![1, 2, 3]);
  }

  #[rxmux_macro::test(local)]
  async fn dropping_stream_unsubscribes() {
    let subject = Subject::<i32>::new();
    let stream = subject.into_stream().unwrap();
    assert_eq!(subject.subscriber_count(), 1);
    drop(stream);
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[cfg(not(target_arch = "wasm32"))]
  #[rxmux_macro::test(shared)]
  async fn wakes_on_value_from_another_thread() {
    let subject = Subject::<&'static str>::new();
    let mut stream = subject.into_stream().unwrap();

    let producer = subject.clone();
    let handle = std::thread::spawn(move || {
      std::thread::sleep(std::time::Duration::from_millis(20));
      producer.next("online");
    });

    assert_eq!(stream.next().await, Some("online"));
    handle.join().unwrap();
  }
}
