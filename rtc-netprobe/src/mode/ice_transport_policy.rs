use std::fmt;

use serde::{Deserialize, Serialize};

/// ICE transport policy controlling which candidate types an endpoint gathers.
///
/// Every probe configures both of its endpoints with the same policy. The
/// policy is derived from the [`ConnectionMode`](super::ConnectionMode) under
/// test: relay-only modes restrict gathering to TURN allocations so that a
/// successful connection proves the relay path on its own.
///
/// ## Specifications
///
/// * [W3C RTCIceTransportPolicy](https://w3c.github.io/webrtc-pc/#rtcicetransportpolicy-enum)
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum RTCIceTransportPolicy {
    /// Use all types of ICE candidates: host, server reflexive and relay.
    #[default]
    #[serde(rename = "all")]
    All,

    /// Only use relay candidates obtained from TURN servers.
    #[serde(rename = "relay")]
    Relay,
}

const ICE_TRANSPORT_POLICY_RELAY_STR: &str = "relay";
const ICE_TRANSPORT_POLICY_ALL_STR: &str = "all";

/// takes a string and converts it to RTCIceTransportPolicy, anything but
/// "relay" gathers every candidate type
impl From<&str> for RTCIceTransportPolicy {
    fn from(raw: &str) -> Self {
        match raw {
            ICE_TRANSPORT_POLICY_RELAY_STR => RTCIceTransportPolicy::Relay,
            _ => RTCIceTransportPolicy::All,
        }
    }
}

impl fmt::Display for RTCIceTransportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCIceTransportPolicy::Relay => ICE_TRANSPORT_POLICY_RELAY_STR,
            RTCIceTransportPolicy::All => ICE_TRANSPORT_POLICY_ALL_STR,
        };
        write!(f, "{s}")
    }
}
