use std::fmt;

use serde::{Deserialize, Serialize};

/// Indicates how an ICE candidate was obtained.
///
/// Probes only ever inspect the type to keep host candidates out of STUN mode
/// reports, but the full set is parsed so results can be summarized.
///
/// # Specifications
///
/// - [RFC 8445 Section 5.1.1.1] - Candidate Types
///
/// [RFC 8445 Section 5.1.1.1]: https://datatracker.ietf.org/doc/html/rfc8445#section-5.1.1.1
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RTCIceCandidateType {
    /// Type not present or not understood.
    #[default]
    Unspecified,

    /// Candidate bound to a local network interface.
    #[serde(rename = "host")]
    Host,

    /// Public address of a NAT binding, learned from a STUN server.
    #[serde(rename = "srflx")]
    Srflx,

    /// NAT binding learned from the peer during connectivity checks.
    #[serde(rename = "prflx")]
    Prflx,

    /// Address allocated on a TURN server.
    #[serde(rename = "relay")]
    Relay,
}

const ICE_CANDIDATE_TYPE_HOST_STR: &str = "host";
const ICE_CANDIDATE_TYPE_SRFLX_STR: &str = "srflx";
const ICE_CANDIDATE_TYPE_PRFLX_STR: &str = "prflx";
const ICE_CANDIDATE_TYPE_RELAY_STR: &str = "relay";

///  takes a string and converts it into RTCIceCandidateType
impl From<&str> for RTCIceCandidateType {
    fn from(raw: &str) -> Self {
        match raw {
            ICE_CANDIDATE_TYPE_HOST_STR => RTCIceCandidateType::Host,
            ICE_CANDIDATE_TYPE_SRFLX_STR => RTCIceCandidateType::Srflx,
            ICE_CANDIDATE_TYPE_PRFLX_STR => RTCIceCandidateType::Prflx,
            ICE_CANDIDATE_TYPE_RELAY_STR => RTCIceCandidateType::Relay,
            _ => RTCIceCandidateType::Unspecified,
        }
    }
}

impl fmt::Display for RTCIceCandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCIceCandidateType::Host => write!(f, "{ICE_CANDIDATE_TYPE_HOST_STR}"),
            RTCIceCandidateType::Srflx => write!(f, "{ICE_CANDIDATE_TYPE_SRFLX_STR}"),
            RTCIceCandidateType::Prflx => write!(f, "{ICE_CANDIDATE_TYPE_PRFLX_STR}"),
            RTCIceCandidateType::Relay => write!(f, "{ICE_CANDIDATE_TYPE_RELAY_STR}"),
            RTCIceCandidateType::Unspecified => write!(f, "{}", crate::UNSPECIFIED_STR),
        }
    }
}
