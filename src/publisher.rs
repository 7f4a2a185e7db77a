//! Distinct caching publisher
//!
//! [`DistinctCachingPublisher`] is a [`SubscriptionMultiplexer`] over a
//! [`DistinctSubject`]: the producer is only active while someone listens,
//! consecutive equal states are emitted once, and every new subscriber starts
//! from the latest state.
//!
//! The publisher reads state through a supplier closure. On the activation
//! edge it refreshes (evaluates the supplier and ingests the result) and then
//! runs the producer's `on_activate` hook; after that, producer callbacks
//! push changes through an [`Ingestor`].
//!
//! ```rust
//! use std::sync::{
//!   atomic::{AtomicU8, Ordering},
//!   Arc,
//! };
//!
//! use rxmux::prelude::*;
//!
//! let level = Arc::new(AtomicU8::new(1));
//! let c_level = level.clone();
//! let publisher = DistinctCachingPublisher::builder(move || c_level.load(Ordering::SeqCst)).build();
//!
//! let mut subscription = publisher.subscribe(|v| println!("level {v}")).unwrap();
//! assert_eq!(publisher.latest(), Some(1));
//!
//! level.store(2, Ordering::SeqCst);
//! assert!(publisher.refresh());
//! assert!(!publisher.refresh());
//! subscription.unsubscribe();
//! ```

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::Mutex;

use crate::{
  error::{BoxError, Result},
  multiplexer::{Hook, MultiplexSubscription, SubscriptionMultiplexer},
  observable::Observable,
  observer::BoxedObserver,
  subject::{Comparer, DistinctSubject, SubjectSubscription},
};

type Supplier<Item> = Box<dyn FnMut() -> Item + Send>;
type ActivateHook<Item> = Box<dyn FnMut(&Ingestor<Item>) -> std::result::Result<(), BoxError> + Send>;

/// What a subscriber that re-activates an idle publisher receives first.
///
/// The cache outlives activation windows, so on re-activation it may hold a
/// state that went stale while nobody was listening.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReactivationPolicy {
  /// Refresh on the activation edge, before the subscriber is attached. The
  /// replay is the fresh state; the stale one is never delivered.
  #[default]
  RefreshBeforeReplay,
  /// Replay the retained state first, then refresh once the subscriber is
  /// attached; the fresh state follows if it differs.
  ReplayThenRefresh,
}

/// Producer-side handle of a publisher.
///
/// Holds the cache and the supplier but none of the hooks, so a platform
/// listener can own one without keeping its own registration alive.
pub struct Ingestor<Item> {
  subject: DistinctSubject<Item>,
  supplier: Arc<Mutex<Supplier<Item>>>,
}

impl<Item: Clone> Ingestor<Item> {
  /// Offer a value; `true` when it was distinct and emitted.
  pub fn ingest(&self, value: Item) -> bool { self.subject.ingest(value) }

  /// Evaluate the supplier and offer the result.
  ///
  /// The supplier runs under the ingestion lock, so concurrent refreshes are
  /// compared in the order they evaluated. The supplier must not refresh the
  /// same publisher.
  pub fn refresh(&self) -> bool { self.subject.ingest_with(|| (self.supplier.lock())()) }

  pub fn latest(&self) -> Option<Item> { self.subject.latest() }
}

impl<Item> Clone for Ingestor<Item> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), supplier: self.supplier.clone() } }
}

/// Configures a [`DistinctCachingPublisher`].
pub struct PublisherBuilder<Item> {
  supplier: Supplier<Item>,
  comparer: Comparer<Item>,
  on_activate: Option<ActivateHook<Item>>,
  on_deactivate: Option<Hook>,
  reactivation: ReactivationPolicy,
}

impl<Item> PublisherBuilder<Item>
where
  Item: Clone + Send + 'static,
{
  /// Hook run on every activation edge, after the refresh.
  pub fn on_activate<F>(self, mut hook: F) -> Self
  where
    F: FnMut() -> std::result::Result<(), BoxError> + Send + 'static,
  {
    self.on_activate_with(move |_| hook())
  }

  /// Like [`on_activate`](Self::on_activate), for a producer that needs an
  /// [`Ingestor`] to register its listener.
  pub fn on_activate_with<F>(mut self, hook: F) -> Self
  where
    F: FnMut(&Ingestor<Item>) -> std::result::Result<(), BoxError> + Send + 'static,
  {
    self.on_activate = Some(Box::new(hook));
    self
  }

  /// Hook run on every teardown edge.
  pub fn on_deactivate<F>(mut self, hook: F) -> Self
  where
    F: FnMut() -> std::result::Result<(), BoxError> + Send + 'static,
  {
    self.on_deactivate = Some(Box::new(hook));
    self
  }

  /// Replace `PartialEq` with a custom equality; `comparer(cached, candidate)`
  /// returning `true` suppresses the candidate.
  pub fn comparer<F>(mut self, comparer: F) -> Self
  where
    F: Fn(&Item, &Item) -> bool + Send + Sync + 'static,
  {
    self.comparer = Arc::new(comparer);
    self
  }

  pub fn reactivation(mut self, policy: ReactivationPolicy) -> Self {
    self.reactivation = policy;
    self
  }

  pub fn build(self) -> DistinctCachingPublisher<Item> {
    let PublisherBuilder { supplier, comparer, mut on_activate, on_deactivate, reactivation } = self;
    let subject = DistinctSubject::from_comparer(comparer);
    let ingestor = Ingestor { subject: subject.clone(), supplier: Arc::new(Mutex::new(supplier)) };
    let pending_refresh = Arc::new(AtomicBool::new(false));

    let c_ingestor = ingestor.clone();
    let c_pending = pending_refresh.clone();
    let mut multiplexer = SubscriptionMultiplexer::new(subject).on_first_subscribe(move || {
      if reactivation == ReactivationPolicy::RefreshBeforeReplay {
        c_ingestor.refresh();
      }
      if let Some(activate) = on_activate.as_mut() {
        activate(&c_ingestor)?;
      }
      if reactivation == ReactivationPolicy::ReplayThenRefresh {
        c_pending.store(true, Ordering::Release);
      }
      Ok(())
    });
    if let Some(deactivate) = on_deactivate {
      multiplexer = multiplexer.on_last_unsubscribe(deactivate);
    }

    DistinctCachingPublisher { multiplexer, ingestor, pending_refresh, reactivation }
  }
}

/// A hot, de-duplicating, replaying source with lazy activation.
///
/// Clones share the cache, the counter and the hooks.
///
/// - Idle until the first subscriber; the first subscribe refreshes and
///   activates, the last unsubscribe deactivates.
/// - A value equal to the cached one is suppressed; the first value ever is
///   always emitted.
/// - A subscriber receives the cached value, if any, inside `subscribe`
///   before any later value.
/// - The cache is retained while idle. [`ReactivationPolicy`] decides what a
///   re-activating subscriber sees first.
pub struct DistinctCachingPublisher<Item> {
  multiplexer: SubscriptionMultiplexer<Item, DistinctSubject<Item>>,
  ingestor: Ingestor<Item>,
  pending_refresh: Arc<AtomicBool>,
  reactivation: ReactivationPolicy,
}

impl<Item> DistinctCachingPublisher<Item>
where
  Item: PartialEq + Clone + Send + 'static,
{
  /// Start configuring a publisher that reads its state from `supplier`.
  pub fn builder<F>(supplier: F) -> PublisherBuilder<Item>
  where
    F: FnMut() -> Item + Send + 'static,
  {
    PublisherBuilder {
      supplier: Box::new(supplier),
      comparer: Arc::new(|a: &Item, b: &Item| a == b),
      on_activate: None,
      on_deactivate: None,
      reactivation: ReactivationPolicy::default(),
    }
  }

  /// Publisher with the producer's activation hooks and default settings.
  pub fn new<F, A, D>(supplier: F, on_activate: A, on_deactivate: D) -> Self
  where
    F: FnMut() -> Item + Send + 'static,
    A: FnMut() -> std::result::Result<(), BoxError> + Send + 'static,
    D: FnMut() -> std::result::Result<(), BoxError> + Send + 'static,
  {
    Self::builder(supplier).on_activate(on_activate).on_deactivate(on_deactivate).build()
  }
}

impl<Item: Clone> DistinctCachingPublisher<Item> {
  /// Offer a value; `true` when it was distinct and emitted.
  pub fn ingest(&self, value: Item) -> bool { self.ingestor.ingest(value) }

  /// Evaluate the supplier and offer the result.
  pub fn refresh(&self) -> bool { self.ingestor.refresh() }

  /// The cached value, if any value was ever accepted.
  pub fn latest(&self) -> Option<Item> { self.ingestor.latest() }
}

impl<Item> DistinctCachingPublisher<Item> {
  /// A producer handle for platform callbacks.
  pub fn ingestor(&self) -> Ingestor<Item> { self.ingestor.clone() }

  pub fn subscriber_count(&self) -> usize { self.multiplexer.subscriber_count() }

  pub fn is_active(&self) -> bool { self.multiplexer.is_active() }

  pub fn reactivation(&self) -> ReactivationPolicy { self.reactivation }
}

impl<Item> Clone for DistinctCachingPublisher<Item> {
  fn clone(&self) -> Self {
    Self {
      multiplexer: self.multiplexer.clone(),
      ingestor: self.ingestor.clone(),
      pending_refresh: self.pending_refresh.clone(),
      reactivation: self.reactivation,
    }
  }
}

impl<Item: Clone> Observable<Item> for DistinctCachingPublisher<Item> {
  type Unsub = MultiplexSubscription<SubjectSubscription<Item>>;

  fn actual_subscribe(&self, observer: BoxedObserver<Item>) -> Result<Self::Unsub> {
    let subscription = self.multiplexer.actual_subscribe(observer)?;
    if self.pending_refresh.swap(false, Ordering::AcqRel) {
      tracing::trace!("refreshing after replay to the re-activating subscriber");
      self.ingestor.refresh();
    }
    Ok(subscription)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicI32, AtomicUsize, Ordering},
    Arc,
  };

  use parking_lot::Mutex;

  use crate::prelude::*;

  fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(T) + Send + 'static) {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    (seen, move |v| c_seen.lock().push(v))
  }

  struct Probe {
    state: Arc<AtomicI32>,
    log: Arc<Mutex<Vec<&'static str>>>,
  }

  fn probed(policy: ReactivationPolicy) -> (Probe, DistinctCachingPublisher<i32>) {
    let state = Arc::new(AtomicI32::new(0));
    let log = Arc::new(Mutex::new(vec![]));
    let (c_state, c_log) = (state.clone(), log.clone());
    let (a_log, d_log) = (log.clone(), log.clone());
    let publisher = DistinctCachingPublisher::builder(move || {
      c_log.lock().push("supply");
      c_state.load(Ordering::SeqCst)
    })
    .on_activate(move || {
      a_log.lock().push("activate");
      Ok(())
    })
    .on_deactivate(move || {
      d_log.lock().push("deactivate");
      Ok(())
    })
    .reactivation(policy)
    .build();
    (Probe { state, log }, publisher)
  }

  #[rxmux_macro::test]
  fn subscriber_lifecycle_scenario() {
    let (probe, publisher) = probed(ReactivationPolicy::default());
    let (a_seen, a_next) = recorder();

    let mut a = publisher.subscribe(a_next).unwrap();
    assert_eq!(*probe.log.lock(), vec!["supply", "activate"]);
    assert_eq!(*a_seen.lock(), vec![0]);

    let mut b = publisher.subscribe(|_| {}).unwrap();
    assert_eq!(*probe.log.lock(), vec!["supply", "activate"]);

    a.unsubscribe();
    assert!(publisher.is_active());
    assert!(!probe.log.lock().contains(&"deactivate"));

    b.unsubscribe();
    assert!(!publisher.is_active());
    assert_eq!(*probe.log.lock(), vec!["supply", "activate", "deactivate"]);
  }

  #[rxmux_macro::test]
  fn duplicates_from_producer_are_suppressed() {
    let (_probe, publisher) = probed(ReactivationPolicy::default());
    let (seen, next) = recorder();
    let _s = publisher.subscribe(next).unwrap();
    let ingestor = publisher.ingestor();

    [0, 1, 1, 2, 2, 2, 3].into_iter().for_each(|v| {
      ingestor.ingest(v);
    });
    assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
  }

  #[rxmux_macro::test]
  fn late_subscriber_replays_latest() {
    let (_probe, publisher) = probed(ReactivationPolicy::default());
    let _first = publisher.subscribe(|_| {}).unwrap();
    publisher.ingest(1);
    publisher.ingest(2);

    let (seen, next) = recorder();
    let _late = publisher.subscribe(next).unwrap();
    publisher.ingest(3);
    assert_eq!(*seen.lock(), vec![2, 3]);
  }

  #[rxmux_macro::test]
  fn refresh_before_replay_never_replays_stale_state() {
    let (probe, publisher) = probed(ReactivationPolicy::RefreshBeforeReplay);
    let mut first = publisher.subscribe(|_| {}).unwrap();
    first.unsubscribe();

    probe.state.store(5, Ordering::SeqCst);
    let (seen, next) = recorder();
    let _again = publisher.subscribe(next).unwrap();
    assert_eq!(*seen.lock(), vec![5]);
  }

  #[rxmux_macro::test]
  fn replay_then_refresh_delivers_stale_then_fresh() {
    let (probe, publisher) = probed(ReactivationPolicy::ReplayThenRefresh);
    let mut first = publisher.subscribe(|_| {}).unwrap();
    assert_eq!(publisher.latest(), Some(0));
    first.unsubscribe();

    probe.state.store(5, Ordering::SeqCst);
    let (seen, next) = recorder();
    let _again = publisher.subscribe(next).unwrap();
    assert_eq!(*seen.lock(), vec![0, 5]);
  }

  #[rxmux_macro::test]
  fn replay_then_refresh_unchanged_state_emits_once() {
    let (_probe, publisher) = probed(ReactivationPolicy::ReplayThenRefresh);
    let mut first = publisher.subscribe(|_| {}).unwrap();
    first.unsubscribe();

    let (seen, next) = recorder();
    let _again = publisher.subscribe(next).unwrap();
    assert_eq!(*seen.lock(), vec![0]);
  }

  #[rxmux_macro::test]
  fn cache_retained_while_idle() {
    let (_probe, publisher) = probed(ReactivationPolicy::default());
    let mut s = publisher.subscribe(|_| {}).unwrap();
    publisher.ingest(9);
    s.unsubscribe();
    assert_eq!(publisher.latest(), Some(9));
  }

  #[rxmux_macro::test]
  fn failed_activation_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let c_attempts = attempts.clone();
    let publisher = DistinctCachingPublisher::builder(|| "offline")
      .on_activate(move || match c_attempts.fetch_add(1, Ordering::SeqCst) {
        0 => Err("no permission".into()),
        _ => Ok(()),
      })
      .build();

    assert!(publisher.subscribe(|_| {}).unwrap_err().is_activation());
    assert!(!publisher.is_active());

    let (seen, next) = recorder();
    let _s = publisher.subscribe(next).unwrap();
    assert_eq!(*seen.lock(), vec!["offline"]);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
  }

  #[rxmux_macro::test]
  fn custom_comparer_drives_suppression() {
    let publisher = DistinctCachingPublisher::builder(|| String::from("Theme"))
      .comparer(|a: &String, b: &String| a.eq_ignore_ascii_case(b))
      .build();
    let (seen, next) = recorder();
    let _s = publisher.subscribe(next).unwrap();
    publisher.ingest("THEME".to_string());
    publisher.ingest("locale".to_string());
    assert_eq!(*seen.lock(), vec!["Theme".to_string(), "locale".to_string()]);
  }

  #[rxmux_macro::test]
  fn ingestor_from_activation_hook() {
    let registered: Arc<Mutex<Option<Ingestor<i32>>>> = Arc::new(Mutex::new(None));
    let c_registered = registered.clone();
    let publisher = DistinctCachingPublisher::builder(|| 1)
      .on_activate_with(move |ingestor| {
        ingestor.ingest(2);
        *c_registered.lock() = Some(ingestor.clone());
        Ok(())
      })
      .build();

    let (seen, next) = recorder();
    let _s = publisher.subscribe(next).unwrap();
    assert_eq!(*seen.lock(), vec![2]);

    let listener = registered.lock().clone().unwrap();
    listener.ingest(3);
    assert_eq!(*seen.lock(), vec![2, 3]);
  }

  #[cfg(not(target_arch = "wasm32"))]
  #[rxmux_macro::test]
  fn concurrent_refresh_never_emits_duplicates() {
    let (probe, publisher) = probed(ReactivationPolicy::default());
    let (seen, next) = recorder();
    let _s = publisher.subscribe(next).unwrap();

    let handles: Vec<_> = (0..4)
      .map(|i| {
        let ingestor = publisher.ingestor();
        let state = probe.state.clone();
        std::thread::spawn(move || {
          for v in 0..100 {
            state.store((v + i) / 10, Ordering::SeqCst);
            ingestor.refresh();
          }
        })
      })
      .collect();
    handles.into_iter().for_each(|h| h.join().unwrap());

    let seen = seen.lock();
    assert!(seen.windows(2).all(|w| w[0] != w[1]), "consecutive duplicate in {seen:?}");
  }

  #[rxmux_macro::test(local)]
  async fn publisher_as_stream() {
    use futures::StreamExt;

    let (probe, publisher) = probed(ReactivationPolicy::default());
    let mut stream = publisher.into_stream().unwrap();
    probe.state.store(1, Ordering::SeqCst);
    publisher.refresh();

    assert_eq!(stream.next().await, Some(0));
    assert_eq!(stream.next().await, Some(1));
    drop(stream);
    assert!(!publisher.is_active());
  }
}
