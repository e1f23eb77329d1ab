pub mod ice_transport_policy;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use ice_transport_policy::RTCIceTransportPolicy;

/// Selects which subset of the supplied ICE servers a probe uses and which
/// transport policy its endpoints gather candidates under.
///
/// | mode       | servers kept                               | policy  |
/// |------------|--------------------------------------------|---------|
/// | `any`      | all                                        | `all`   |
/// | `stun`     | `stun:` URLs                               | `all`   |
/// | `turn-udp` | `turn:` URLs ending in `udp`               | `relay` |
/// | `turn-tcp` | `turn:` URLs ending in `tcp`               | `relay` |
/// | `turn-tls` | URLs containing `turns:`                   | `relay` |
/// | `relay`    | all                                        | `relay` |
///
/// A mode string that is not recognized parses to [`ConnectionMode::Unspecified`],
/// which behaves exactly like [`ConnectionMode::Any`].
///
/// ```
/// use rtc_netprobe::mode::{ConnectionMode, RTCIceTransportPolicy};
///
/// let mode: ConnectionMode = "turn-tls".into();
/// assert_eq!(mode, ConnectionMode::TurnTls);
/// assert_eq!(mode.ice_transport_policy(), RTCIceTransportPolicy::Relay);
/// ```
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectionMode {
    /// Gather every candidate type with every supplied server.
    #[serde(rename = "any")]
    Any,

    /// Server reflexive reachability through STUN servers only. Host
    /// candidates are never reported in this mode.
    #[serde(rename = "stun")]
    Stun,

    /// Relayed connectivity through TURN over UDP.
    #[serde(rename = "turn-udp")]
    TurnUdp,

    /// Relayed connectivity through TURN over TCP.
    #[serde(rename = "turn-tcp")]
    TurnTcp,

    /// Relayed connectivity through TURN over TLS.
    #[serde(rename = "turn-tls")]
    TurnTls,

    /// Relayed connectivity through any supplied TURN server.
    #[serde(rename = "relay")]
    Relay,

    /// Not a recognized mode; filters and configures like `Any`.
    #[default]
    #[serde(other, rename = "unspecified")]
    Unspecified,
}

const CONNECTION_MODE_ANY_STR: &str = "any";
const CONNECTION_MODE_STUN_STR: &str = "stun";
const CONNECTION_MODE_TURN_UDP_STR: &str = "turn-udp";
const CONNECTION_MODE_TURN_TCP_STR: &str = "turn-tcp";
const CONNECTION_MODE_TURN_TLS_STR: &str = "turn-tls";
const CONNECTION_MODE_RELAY_STR: &str = "relay";

impl ConnectionMode {
    /// Every mode a full network test probes, in reporting order.
    pub const ALL: [ConnectionMode; 6] = [
        ConnectionMode::Any,
        ConnectionMode::Relay,
        ConnectionMode::Stun,
        ConnectionMode::TurnUdp,
        ConnectionMode::TurnTcp,
        ConnectionMode::TurnTls,
    ];

    /// Transport policy both endpoints of a probe are configured with.
    pub fn ice_transport_policy(&self) -> RTCIceTransportPolicy {
        if self.is_relay_only() {
            RTCIceTransportPolicy::Relay
        } else {
            RTCIceTransportPolicy::All
        }
    }

    pub fn is_relay_only(&self) -> bool {
        matches!(
            self,
            ConnectionMode::TurnUdp
                | ConnectionMode::TurnTcp
                | ConnectionMode::TurnTls
                | ConnectionMode::Relay
        )
    }

    /// Whether host candidates discovered by the local endpoint are dropped.
    pub fn suppresses_host_candidates(&self) -> bool {
        *self == ConnectionMode::Stun
    }
}

impl From<&str> for ConnectionMode {
    fn from(raw: &str) -> Self {
        match raw {
            CONNECTION_MODE_ANY_STR => ConnectionMode::Any,
            CONNECTION_MODE_STUN_STR => ConnectionMode::Stun,
            CONNECTION_MODE_TURN_UDP_STR => ConnectionMode::TurnUdp,
            CONNECTION_MODE_TURN_TCP_STR => ConnectionMode::TurnTcp,
            CONNECTION_MODE_TURN_TLS_STR => ConnectionMode::TurnTls,
            CONNECTION_MODE_RELAY_STR => ConnectionMode::Relay,
            _ => ConnectionMode::Unspecified,
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ConnectionMode::Any => CONNECTION_MODE_ANY_STR,
            ConnectionMode::Stun => CONNECTION_MODE_STUN_STR,
            ConnectionMode::TurnUdp => CONNECTION_MODE_TURN_UDP_STR,
            ConnectionMode::TurnTcp => CONNECTION_MODE_TURN_TCP_STR,
            ConnectionMode::TurnTls => CONNECTION_MODE_TURN_TLS_STR,
            ConnectionMode::Relay => CONNECTION_MODE_RELAY_STR,
            ConnectionMode::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}
