use proxykit_containers::IpInfo;
use serde::{Deserialize, Serialize};

/// The two strings shown for a container: IP and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpReport {
    pub ip: String,
    pub location: String,
}

impl IpReport {
    pub fn new(ip: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            location: location.into(),
        }
    }

    /// Shown while a batch is in flight.
    pub fn detecting() -> Self {
        Self::new("Detecting...", "Detecting...")
    }

    /// Neither a probe nor the background cache produced anything.
    pub fn no_active_tab() -> Self {
        Self::new("No active tab", "Open tab in container")
    }

    pub fn error() -> Self {
        Self::new("Error", "Unknown")
    }
}

impl From<&IpInfo> for IpReport {
    fn from(info: &IpInfo) -> Self {
        Self::new(info.ip.clone(), info.place())
    }
}
