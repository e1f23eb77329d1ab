use std::fmt;

use serde::{Deserialize, Serialize};

/// Describes the type of a session description exchanged between the two
/// endpoints of a probe.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum RTCSdpType {
    #[default]
    Unspecified,

    /// The description is the initial proposal from `local`.
    #[serde(rename = "offer")]
    Offer,

    /// The description is the definitive answer from `remote`.
    #[serde(rename = "answer")]
    Answer,
}

const SDP_TYPE_OFFER_STR: &str = "offer";
const SDP_TYPE_ANSWER_STR: &str = "answer";

impl From<&str> for RTCSdpType {
    fn from(raw: &str) -> Self {
        match raw {
            SDP_TYPE_OFFER_STR => RTCSdpType::Offer,
            SDP_TYPE_ANSWER_STR => RTCSdpType::Answer,
            _ => RTCSdpType::Unspecified,
        }
    }
}

impl fmt::Display for RTCSdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RTCSdpType::Offer => write!(f, "{SDP_TYPE_OFFER_STR}"),
            RTCSdpType::Answer => write!(f, "{SDP_TYPE_ANSWER_STR}"),
            RTCSdpType::Unspecified => write!(f, "{}", crate::UNSPECIFIED_STR),
        }
    }
}

/// A session description handed from one probe endpoint to the other.
///
/// The probe never inspects the SDP text; it only moves it between the pair,
/// so no parsed form is kept alongside it.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCSessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: RTCSdpType,

    pub sdp: String,
}

impl RTCSessionDescription {
    /// Wraps offer SDP text produced by an endpoint.
    pub fn offer(sdp: String) -> Self {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Offer,
            sdp,
        }
    }

    /// Wraps answer SDP text produced by an endpoint.
    pub fn answer(sdp: String) -> Self {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Answer,
            sdp,
        }
    }
}

impl fmt::Display for RTCSessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sdp_type, self.sdp)
    }
}
