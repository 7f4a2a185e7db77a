use std::{cell::RefCell, collections::VecDeque, sync::Arc};

use parking_lot::ReentrantMutex;

use super::{Subject, SubjectSubscription};
use crate::{error::Result, observable::Observable, observer::BoxedObserver};

/// Equality used to decide whether an ingested value is a duplicate.
pub(crate) type Comparer<Item> = Arc<dyn Fn(&Item, &Item) -> bool + Send + Sync>;

/// A subject with a distinct-value cache.
///
/// - A value equal to the cached one is suppressed; anything else replaces
///   the cache and is emitted. The first value is always emitted.
/// - Each new observer receives the cached value, if any, synchronously
///   while attaching and before any later value.
///
/// Ingestion and attach share one re-entrant lock per instance, which gives
/// both orderings: two concurrent ingestions can never both see the same
/// stale cache, and a value ingested concurrently with an attach is
/// delivered to the new observer either as its replay or after it, never
/// both. The cache lives for as long as the subject; it is never cleared.
///
/// A value ingested from inside an observer callback is queued and emitted
/// to every observer once the current broadcast has finished, so all
/// observers see accepted values in the same order.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxmux::prelude::*;
///
/// let subject = DistinctSubject::<u8>::new();
/// subject.ingest(1);
/// subject.ingest(2);
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// subject.subscribe(move |v| c_seen.lock().unwrap().push(v)).unwrap();
/// subject.ingest(2);
/// subject.ingest(3);
///
/// assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
/// ```
pub struct DistinctSubject<Item> {
  inner: Arc<Inner<Item>>,
}

struct Inner<Item> {
  cache: ReentrantMutex<RefCell<Cache<Item>>>,
  subject: Subject<Item>,
  comparer: Comparer<Item>,
}

struct Cache<Item> {
  latest: Option<Item>,
  /// Accepted values not yet broadcast, in acceptance order.
  pending: VecDeque<Item>,
  draining: bool,
}

impl<Item: PartialEq> DistinctSubject<Item> {
  /// Distinct subject comparing values with `PartialEq`.
  pub fn new() -> Self { Self::with_comparer(|a: &Item, b: &Item| a == b) }
}

impl<Item: PartialEq> Default for DistinctSubject<Item> {
  fn default() -> Self { Self::new() }
}

impl<Item> DistinctSubject<Item> {
  /// Distinct subject with a custom equality; `comparer(cached, candidate)`
  /// returning `true` suppresses the candidate.
  pub fn with_comparer<F>(comparer: F) -> Self
  where
    F: Fn(&Item, &Item) -> bool + Send + Sync + 'static,
  {
    Self::from_comparer(Arc::new(comparer))
  }

  pub(crate) fn from_comparer(comparer: Comparer<Item>) -> Self {
    Self {
      inner: Arc::new(Inner {
        cache: ReentrantMutex::new(RefCell::new(Cache {
          latest: None,
          pending: VecDeque::new(),
          draining: false,
        })),
        subject: Subject::new(),
        comparer,
      }),
    }
  }

  pub fn subscriber_count(&self) -> usize { self.inner.subject.subscriber_count() }
}

impl<Item: Clone> DistinctSubject<Item> {
  /// Offer a candidate value.
  ///
  /// Returns `true` when the value was distinct, cached and emitted, `false`
  /// when it was suppressed as a duplicate.
  pub fn ingest(&self, value: Item) -> bool { self.ingest_with(move || value) }

  /// Evaluate a candidate under the ingestion lock and offer it.
  ///
  /// Evaluating inside the lock keeps concurrent refreshes from racing: the
  /// value evaluated last is the value compared last. The candidate is
  /// compared with the last accepted value, including accepted values still
  /// queued behind the current broadcast.
  pub fn ingest_with<F>(&self, evaluate: F) -> bool
  where
    F: FnOnce() -> Item,
  {
    let cache = self.inner.cache.lock();
    let value = evaluate();
    let draining = {
      let mut state = cache.borrow_mut();
      let duplicate = match state.pending.back().or(state.latest.as_ref()) {
        Some(last) => (self.inner.comparer)(last, &value),
        None => false,
      };
      if duplicate {
        tracing::trace!("duplicate value suppressed");
        return false;
      }
      state.pending.push_back(value);
      std::mem::replace(&mut state.draining, true)
    };
    if draining {
      tracing::trace!("value queued behind the current broadcast");
      return true;
    }

    loop {
      let next = {
        let mut state = cache.borrow_mut();
        let next = state.pending.pop_front();
        match &next {
          Some(value) => state.latest = Some(value.clone()),
          None => state.draining = false,
        }
        next
      };
      match next {
        Some(value) => self.inner.subject.next(value),
        None => return true,
      }
    }
  }

  /// The cached value, if any value was ever accepted.
  pub fn latest(&self) -> Option<Item> { self.inner.cache.lock().borrow().latest.clone() }
}

impl<Item> Clone for DistinctSubject<Item> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<Item: Clone> Observable<Item> for DistinctSubject<Item> {
  type Unsub = SubjectSubscription<Item>;

  fn actual_subscribe(&self, observer: BoxedObserver<Item>) -> Result<Self::Unsub> {
    let cache = self.inner.cache.lock();
    let replay = cache.borrow().latest.clone();
    let subscription = self.inner.subject.attach(observer);
    if let Some(value) = replay {
      tracing::trace!("replaying cached value to new subscriber");
      subscription.slot().deliver(value);
    }
    Ok(subscription)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use super::*;
  use crate::prelude::*;

  fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(T) + Send + 'static) {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    (seen, move |v| c_seen.lock().push(v))
  }

  #[rxmux_macro::test]
  fn suppresses_consecutive_duplicates() {
    let subject = DistinctSubject::<i32>::new();
    let (seen, next) = recorder();
    subject.subscribe(next).unwrap();

    let accepted: Vec<bool> = [1, 1, 2, 2, 2, 3].into_iter().map(|v| subject.ingest(v)).collect();

    assert_eq!(*seen.lock(), vec![1, 2, 3]);
    assert_eq!(accepted, vec![true, false, true, false, false, true]);
  }

  #[rxmux_macro::test]
  fn non_consecutive_repeats_are_emitted() {
    let subject = DistinctSubject::<i32>::new();
    let (seen, next) = recorder();
    subject.subscribe(next).unwrap();
    [1, 2, 1].into_iter().for_each(|v| {
      subject.ingest(v);
    });
    assert_eq!(*seen.lock(), vec![1, 2, 1]);
  }

  #[rxmux_macro::test]
  fn late_subscriber_gets_replay_then_live_values() {
    let subject = DistinctSubject::<i32>::new();
    subject.ingest(1);
    subject.ingest(2);

    let (seen, next) = recorder();
    subject.subscribe(next).unwrap();
    assert_eq!(*seen.lock(), vec![2]);

    subject.ingest(2);
    subject.ingest(3);
    assert_eq!(*seen.lock(), vec![2, 3]);
  }

  #[rxmux_macro::test]
  fn no_replay_before_first_value() {
    let subject = DistinctSubject::<i32>::new();
    let (seen, next) = recorder();
    subject.subscribe(next).unwrap();
    assert!(seen.lock().is_empty());
    assert_eq!(subject.latest(), None);
  }

  #[rxmux_macro::test]
  fn custom_comparer() {
    let subject = DistinctSubject::with_comparer(|a: &f64, b: &f64| (a - b).abs() < 0.5);
    let (seen, next) = recorder();
    subject.subscribe(next).unwrap();
    [1.0, 1.2, 1.4, 2.0].into_iter().for_each(|v| {
      subject.ingest(v);
    });
    assert_eq!(*seen.lock(), vec![1.0, 2.0]);
  }

  #[rxmux_macro::test]
  fn cache_survives_unsubscribe_of_everyone() {
    let subject = DistinctSubject::<&'static str>::new();
    let mut first = subject.subscribe(|_| {}).unwrap();
    subject.ingest("wifi");
    first.unsubscribe();
    assert_eq!(subject.subscriber_count(), 0);

    let (seen, next) = recorder();
    subject.subscribe(next).unwrap();
    assert_eq!(*seen.lock(), vec!["wifi"]);
  }

  #[rxmux_macro::test]
  fn subscribe_inside_callback_gets_value_once() {
    let subject = DistinctSubject::<i32>::new();
    let (late, late_next) = recorder();
    let late_next = Arc::new(Mutex::new(Some(late_next)));
    let c_subject = subject.clone();
    subject
      .subscribe(move |_: i32| {
        if let Some(next) = late_next.lock().take() {
          c_subject.subscribe(next).unwrap();
        }
      })
      .unwrap();

    subject.ingest(1);
    subject.ingest(2);
    assert_eq!(*late.lock(), vec![1, 2]);
  }

  #[rxmux_macro::test]
  fn ingest_from_inside_callback_reaches_every_observer() {
    let subject = DistinctSubject::<i32>::new();
    subject.ingest(0);
    let c_subject = subject.clone();
    let nested = Arc::new(Mutex::new(vec![]));
    let c_nested = nested.clone();
    let (x_seen, mut x_next) = recorder();
    subject
      .subscribe(move |v| {
        x_next(v);
        if v == 1 {
          c_nested.lock().push(c_subject.ingest(2));
          c_nested.lock().push(c_subject.ingest(2));
        }
      })
      .unwrap();
    let (y_seen, y_next) = recorder();
    subject.subscribe(y_next).unwrap();

    assert!(subject.ingest(1));
    assert_eq!(*nested.lock(), vec![true, false]);
    assert_eq!(subject.latest(), Some(2));
    assert_eq!(*x_seen.lock(), vec![0, 1, 2]);
    assert_eq!(*y_seen.lock(), vec![0, 1, 2]);

    assert!(!subject.ingest(2));
    assert!(subject.ingest(3));
    assert_eq!(*y_seen.lock(), vec![0, 1, 2, 3]);
  }

  #[rxmux_macro::test]
  fn nested_ingest_dedups_against_queued_value() {
    let subject = DistinctSubject::<i32>::new();
    let c_subject = subject.clone();
    let mut fired = false;
    subject
      .subscribe(move |v| {
        if v == 1 && !fired {
          fired = true;
          c_subject.ingest(5);
          c_subject.ingest(5);
          c_subject.ingest(1);
        }
      })
      .unwrap();
    let (seen, next) = recorder();
    subject.subscribe(next).unwrap();

    subject.ingest(1);
    assert_eq!(*seen.lock(), vec![1, 5, 1]);
    assert_eq!(subject.latest(), Some(1));
  }

  #[cfg(not(target_arch = "wasm32"))]
  #[rxmux_macro::test]
  fn concurrent_ingestion_never_duplicates() {
    let subject = DistinctSubject::<i32>::new();
    let (seen, next) = recorder();
    subject.subscribe(next).unwrap();

    let handles: Vec<_> = (0..8)
      .map(|_| {
        let producer = subject.clone();
        std::thread::spawn(move || {
          for v in 0..200 {
            producer.ingest(v / 50);
          }
        })
      })
      .collect();
    handles.into_iter().for_each(|h| h.join().unwrap());

    let seen = seen.lock();
    assert!(seen.windows(2).all(|w| w[0] != w[1]), "consecutive duplicate in {seen:?}");
  }

  #[cfg(not(target_arch = "wasm32"))]
  #[rxmux_macro::test]
  fn attach_racing_ingestion_sees_no_gap_or_duplicate() {
    for _ in 0..50 {
      let subject = DistinctSubject::<u32>::new();
      subject.ingest(0);
      let producer = subject.clone();
      let handle = std::thread::spawn(move || {
        for v in 1..=100 {
          producer.ingest(v);
        }
      });
      let (seen, next) = recorder();
      subject.subscribe(next).unwrap();
      handle.join().unwrap();

      let seen = seen.lock();
      assert_eq!(seen.last(), Some(&100));
      assert!(seen.windows(2).all(|w| w[1] == w[0] + 1), "gap or duplicate in {seen:?}");
    }
  }
}
