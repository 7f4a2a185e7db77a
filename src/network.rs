//! Network state
//!
//! A [`NetworkRepository`] publishes the device's current [`NetworkData`]
//! while anyone listens, backed by a platform [`ConnectivityProbe`]. The
//! probe is registered on the first subscription and unregistered after the
//! last one; between those, every platform callback re-reads the state and
//! subscribers see each distinct state once.

mod model;
mod repository;

pub use model::{
  CellularNetworkData, NetworkData, NetworkSignalStrength, NetworkType, NoNetworkData, WifiNetworkData,
};
pub use repository::{ConnectivityProbe, NetworkNotifier, NetworkRepository};
