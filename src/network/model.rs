use std::net::IpAddr;

use crate::error::Error;

/// Coarse signal quality of a wireless network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NetworkSignalStrength {
  Poor,
  Good,
  Excellent,
}

impl NetworkSignalStrength {
  /// Number of levels, for platform APIs that bucket a raw signal into N
  /// levels.
  pub const LEVELS: usize = 3;

  pub fn level(self) -> i32 {
    match self {
      NetworkSignalStrength::Poor => 0,
      NetworkSignalStrength::Good => 1,
      NetworkSignalStrength::Excellent => 2,
    }
  }
}

impl TryFrom<i32> for NetworkSignalStrength {
  type Error = Error;

  fn try_from(level: i32) -> Result<Self, Self::Error> {
    match level {
      0 => Ok(NetworkSignalStrength::Poor),
      1 => Ok(NetworkSignalStrength::Good),
      2 => Ok(NetworkSignalStrength::Excellent),
      other => Err(Error::InvalidSignalLevel(other)),
    }
  }
}

/// Kind of the active network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkType {
  Wifi,
  Cellular,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WifiNetworkData {
  pub ssid: Option<String>,
  pub signal: Option<NetworkSignalStrength>,
  pub connected: bool,
  pub ip: Option<IpAddr>,
  pub mac_address: Option<String>,
  pub airplane_mode: bool,
}

impl WifiNetworkData {
  /// A Wi-Fi network the device is connected to.
  pub fn connected(
    ssid: impl Into<String>, signal: NetworkSignalStrength, ip: Option<IpAddr>,
    mac_address: Option<String>, airplane_mode: bool,
  ) -> Self {
    Self { ssid: Some(ssid.into()), signal: Some(signal), connected: true, ip, mac_address, airplane_mode }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellularNetworkData {
  pub connected: bool,
  pub ip: Option<IpAddr>,
  pub airplane_mode: bool,
}

impl CellularNetworkData {
  pub fn connected(ip: Option<IpAddr>, airplane_mode: bool) -> Self {
    Self { connected: true, ip, airplane_mode }
  }
}

/// No active network. Never connected, never has an address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoNetworkData {
  pub airplane_mode: bool,
}

/// Snapshot of the device's network state.
///
/// Equality is structural: two snapshots that differ in any field, such as
/// the signal level or the address, are distinct states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkData {
  Wifi(WifiNetworkData),
  Cellular(CellularNetworkData),
  Offline(NoNetworkData),
}

impl NetworkData {
  pub fn is_connected(&self) -> bool {
    match self {
      NetworkData::Wifi(wifi) => wifi.connected,
      NetworkData::Cellular(cellular) => cellular.connected,
      NetworkData::Offline(_) => false,
    }
  }

  pub fn ip(&self) -> Option<IpAddr> {
    match self {
      NetworkData::Wifi(wifi) => wifi.ip,
      NetworkData::Cellular(cellular) => cellular.ip,
      NetworkData::Offline(_) => None,
    }
  }

  pub fn is_airplane_mode(&self) -> bool {
    match self {
      NetworkData::Wifi(wifi) => wifi.airplane_mode,
      NetworkData::Cellular(cellular) => cellular.airplane_mode,
      NetworkData::Offline(offline) => offline.airplane_mode,
    }
  }

  /// The kind of network, `None` when offline.
  pub fn network_type(&self) -> Option<NetworkType> {
    match self {
      NetworkData::Wifi(_) => Some(NetworkType::Wifi),
      NetworkData::Cellular(_) => Some(NetworkType::Cellular),
      NetworkData::Offline(_) => None,
    }
  }
}

impl From<WifiNetworkData> for NetworkData {
  fn from(data: WifiNetworkData) -> Self { NetworkData::Wifi(data) }
}

impl From<CellularNetworkData> for NetworkData {
  fn from(data: CellularNetworkData) -> Self { NetworkData::Cellular(data) }
}

impl From<NoNetworkData> for NetworkData {
  fn from(data: NoNetworkData) -> Self { NetworkData::Offline(data) }
}
