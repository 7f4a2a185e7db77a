//! Hot multicasting sources
//!
//! - [`Subject`] fans every value out to the observers attached at the time
//!   of emission.
//! - [`DistinctSubject`] adds a distinct-value cache: it suppresses values
//!   equal to the last accepted one and replays that value to each new
//!   observer.

mod distinct_subject;
mod subject_subscription;
pub(crate) mod subscribers;

use std::sync::Arc;

pub(crate) use distinct_subject::Comparer;
pub use distinct_subject::DistinctSubject;
use parking_lot::Mutex;
pub use subject_subscription::SubjectSubscription;
use subscribers::{broadcast_value, Slot, Subscribers};

use crate::{
  error::Result,
  observable::Observable,
  observer::{BoxedObserver, Observer},
};

/// Subject: a hot source that multicasts values to many observers.
///
/// Clones share the same observer list, so one clone can be handed to a
/// producer while another is handed to consumers.
///
/// # Re-Entrancy Policy
///
/// - Subscribing and unsubscribing from inside an observer callback is
///   allowed. A subscriber added during a broadcast does not receive the
///   value being broadcast; an observer unsubscribing itself receives nothing
///   after `unsubscribe` returns.
/// - Emitting into the same subject from inside one of its observer
///   callbacks is not supported. The nested delivery to the observer that is
///   still running panics, and that panic is reported as a failure of the
///   outer observer. [`DistinctSubject::ingest`] queues nested values
///   instead.
/// - Unsubscribing another observer from inside a callback marks it closed
///   without waiting for a delivery it may have running on another thread.
///   Outside callbacks, `unsubscribe` waits for that delivery to finish.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxmux::prelude::*;
///
/// let subject = Subject::<&str>::new();
/// let keys = Arc::new(Mutex::new(vec![]));
/// let c_keys = keys.clone();
///
/// subject.subscribe(move |key| c_keys.lock().unwrap().push(key)).unwrap();
/// subject.next("theme");
/// subject.next("theme");
///
/// assert_eq!(*keys.lock().unwrap(), vec!["theme", "theme"]);
/// ```
pub struct Subject<Item> {
  observers: Arc<Mutex<Subscribers<Item>>>,
}

impl<Item> Subject<Item> {
  pub fn new() -> Self { Self { observers: Arc::new(Mutex::new(Subscribers::default())) } }

  /// Get the number of current subscribers.
  pub fn subscriber_count(&self) -> usize { self.observers.lock().len() }

  /// Check if there are no subscribers.
  pub fn is_empty(&self) -> bool { self.subscriber_count() == 0 }

  /// Register an observer and return its handle and slot.
  pub(crate) fn attach(&self, observer: BoxedObserver<Item>) -> SubjectSubscription<Item> {
    let (id, slot) = self.observers.lock().add(observer);
    SubjectSubscription::new(self.observers.clone(), id, slot)
  }

  fn snapshot(&self) -> smallvec::SmallVec<[Arc<Slot<Item>>; 2]> { self.observers.lock().snapshot() }
}

impl<Item: Clone> Subject<Item> {
  /// Emit a value to every attached observer.
  ///
  /// The observer list is snapshotted first; observers run without the list
  /// lock held.
  pub fn next(&self, value: Item) {
    let slots = self.snapshot();
    broadcast_value(&slots, value);
  }
}

impl<Item> Clone for Subject<Item> {
  fn clone(&self) -> Self { Self { observers: self.observers.clone() } }
}

impl<Item> Default for Subject<Item> {
  fn default() -> Self { Self::new() }
}

impl<Item: Clone> Observer<Item> for Subject<Item> {
  #[inline]
  fn next(&mut self, value: Item) { Subject::next(self, value) }
}

impl<Item> Observable<Item> for Subject<Item> {
  type Unsub = SubjectSubscription<Item>;

  fn actual_subscribe(&self, observer: BoxedObserver<Item>) -> Result<Self::Unsub> {
    Ok(self.attach(observer))
  }
}
