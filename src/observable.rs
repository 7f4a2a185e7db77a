//! The hot-source abstraction
//!
//! Every source in this crate is hot: it emits whether or not anyone is
//! listening, and a subscriber only sees what is emitted after it attached
//! (plus a replay, for caching sources). [`Observable`] is the seam the
//! multiplexer is generic over.

use crate::{
  error::Result,
  into_stream::IntoStream,
  observer::{BoxedObserver, FnMutObserver, IntoBoxedObserver, Observer},
  subscription::{SubscriptionLike, SubscriptionWrapper},
};

/// A source that observers can attach to.
pub trait Observable<Item> {
  /// Handle returned for each attached observer.
  type Unsub: SubscriptionLike;

  /// Attach a boxed observer.
  ///
  /// Fails only when attaching has a side effect that can fail, such as the
  /// activation edge of a multiplexer.
  fn actual_subscribe(&self, observer: BoxedObserver<Item>) -> Result<Self::Unsub>;

  /// Subscribe a closure that receives every value.
  ///
  /// ```rust
  /// use std::sync::{Arc, Mutex};
  ///
  /// use rxmux::prelude::*;
  ///
  /// let subject = Subject::<i32>::new();
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let c_seen = seen.clone();
  ///
  /// let mut subscription = subject.subscribe(move |v| c_seen.lock().unwrap().push(v)).unwrap();
  /// subject.next(1);
  /// subscription.unsubscribe();
  /// subject.next(2);
  ///
  /// assert_eq!(*seen.lock().unwrap(), vec![1]);
  /// ```
  fn subscribe<F>(&self, next: F) -> Result<SubscriptionWrapper<Self::Unsub>>
  where
    F: FnMut(Item) + Send + 'static,
  {
    self.subscribe_observer(FnMutObserver(next))
  }

  /// Subscribe any [`Observer`] implementation.
  fn subscribe_observer<O>(&self, observer: O) -> Result<SubscriptionWrapper<Self::Unsub>>
  where
    O: Observer<Item> + Send + 'static,
  {
    self.actual_subscribe(observer.into_boxed()).map(SubscriptionWrapper)
  }

  /// Consume the values as a `futures::Stream`.
  ///
  /// The stream holds its own subscription; dropping it unsubscribes.
  fn into_stream(&self) -> Result<IntoStream<Item, Self::Unsub>>
  where
    Item: Send + 'static,
  {
    IntoStream::new(self)
  }
}
