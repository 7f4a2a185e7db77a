use std::sync::Arc;

use super::model::{CellularNetworkData, NetworkData, NetworkType, NoNetworkData, WifiNetworkData};
use crate::{
  error::BoxError,
  publisher::{DistinctCachingPublisher, Ingestor, ReactivationPolicy},
};

/// Platform side of a [`NetworkRepository`].
///
/// Reads the current network state and (un)registers for connectivity
/// callbacks. A registered probe calls [`NetworkNotifier::notify`] whenever
/// the platform reports a change; it must drop the notifier in
/// [`unregister`](ConnectivityProbe::unregister).
pub trait ConnectivityProbe: Send + Sync + 'static {
  /// The active network, `None` when offline.
  fn active_network_type(&self) -> Option<NetworkType>;

  fn wifi_data(&self) -> WifiNetworkData;

  fn cellular_data(&self) -> CellularNetworkData;

  fn no_network_data(&self) -> NoNetworkData;

  /// Start delivering platform events to `notifier`.
  fn register(&self, notifier: NetworkNotifier) -> Result<(), BoxError>;

  /// Stop delivering platform events.
  fn unregister(&self) -> Result<(), BoxError>;
}

/// Handle a registered probe calls on every platform network event.
#[derive(Clone)]
pub struct NetworkNotifier {
  ingestor: Ingestor<NetworkData>,
}

impl NetworkNotifier {
  /// Re-read the network state; `true` when it changed and was published.
  pub fn notify(&self) -> bool { refresh_logged(&self.ingestor) }
}

/// Publishes the device's network state to any number of subscribers.
///
/// ```rust
/// use rxmux::{network::*, prelude::*};
///
/// struct Offline;
///
/// impl ConnectivityProbe for Offline {
///   fn active_network_type(&self) -> Option<NetworkType> { None }
///   fn wifi_data(&self) -> WifiNetworkData { WifiNetworkData::default() }
///   fn cellular_data(&self) -> CellularNetworkData { CellularNetworkData::connected(None, false) }
///   fn no_network_data(&self) -> NoNetworkData { NoNetworkData { airplane_mode: true } }
///   fn register(&self, _: NetworkNotifier) -> Result<(), BoxError> { Ok(()) }
///   fn unregister(&self) -> Result<(), BoxError> { Ok(()) }
/// }
///
/// let repository = NetworkRepository::new(Offline);
/// let _subscription = repository
///   .find()
///   .subscribe(|state| assert!(state.is_airplane_mode()))
///   .unwrap()
///   .unsubscribe_when_dropped();
/// ```
pub struct NetworkRepository<P> {
  probe: Arc<P>,
  publisher: DistinctCachingPublisher<NetworkData>,
}

impl<P: ConnectivityProbe> NetworkRepository<P> {
  pub fn new(probe: P) -> Self { Self::with_policy(probe, ReactivationPolicy::default()) }

  pub fn with_policy(probe: P, reactivation: ReactivationPolicy) -> Self {
    let probe = Arc::new(probe);
    let (c_probe, register_probe, unregister_probe) = (probe.clone(), probe.clone(), probe.clone());
    let publisher = DistinctCachingPublisher::builder(move || current_state(&*c_probe))
      .on_activate_with(move |ingestor| {
        register_probe.register(NetworkNotifier { ingestor: ingestor.clone() })?;
        tracing::info!(
          connected = ingestor.latest().map(|state| state.is_connected()),
          "network listener registered"
        );
        Ok(())
      })
      .on_deactivate(move || {
        unregister_probe.unregister()?;
        tracing::info!("network listener unregistered");
        Ok(())
      })
      .reactivation(reactivation)
      .build();
    Self { probe, publisher }
  }

  /// The network state stream. Subscribing starts listening to the platform.
  pub fn find(&self) -> DistinctCachingPublisher<NetworkData> { self.publisher.clone() }

  /// Re-read the network state; `true` when it changed and was published.
  pub fn on_event(&self) -> bool { refresh_logged(&self.publisher.ingestor()) }

  /// The last published state.
  pub fn latest(&self) -> Option<NetworkData> { self.publisher.latest() }

  pub fn probe(&self) -> &P { &self.probe }
}

fn current_state<P: ConnectivityProbe + ?Sized>(probe: &P) -> NetworkData {
  match probe.active_network_type() {
    Some(NetworkType::Wifi) => probe.wifi_data().into(),
    Some(NetworkType::Cellular) => probe.cellular_data().into(),
    None => probe.no_network_data().into(),
  }
}

fn refresh_logged(ingestor: &Ingestor<NetworkData>) -> bool {
  let accepted = ingestor.refresh();
  if accepted {
    tracing::info!(connected = ingestor.latest().map(|state| state.is_connected()), "network state changed");
  }
  accepted
}
