pub mod buffer;
pub mod candidate_type;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use buffer::CandidateBuffer;
pub use candidate_type::RTCIceCandidateType;

const CANDIDATE_TYPE_KEYWORD: &str = "typ";

/// An ICE candidate as exchanged between the two endpoints of a probe and as
/// reported in a [`ProbeOutcome`](crate::probe::ProbeOutcome).
///
/// Serializes with the browser field names (`sdpMid`, `sdpMLineIndex`,
/// `usernameFragment`) so reports can be compared with ones taken in a browser.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidateInit {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

impl RTCIceCandidateInit {
    /// An empty candidate string is the end-of-candidates marker some stacks
    /// emit in place of a null candidate.
    pub fn is_end_of_candidates(&self) -> bool {
        self.candidate.trim().is_empty()
    }

    /// Parses the `typ` field of the candidate attribute.
    ///
    /// ```
    /// use rtc_netprobe::candidate::{RTCIceCandidateInit, RTCIceCandidateType};
    ///
    /// let candidate = RTCIceCandidateInit {
    ///     candidate: "candidate:1 1 udp 2130706431 192.168.1.100 54321 typ host".to_owned(),
    ///     ..Default::default()
    /// };
    /// assert_eq!(candidate.candidate_type(), RTCIceCandidateType::Host);
    /// ```
    pub fn candidate_type(&self) -> RTCIceCandidateType {
        let mut fields = self.candidate.split_whitespace();
        while let Some(field) = fields.next() {
            if field == CANDIDATE_TYPE_KEYWORD {
                return fields.next().map(RTCIceCandidateType::from).unwrap_or_default();
            }
        }
        RTCIceCandidateType::Unspecified
    }
}

impl fmt::Display for RTCIceCandidateInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.candidate)
    }
}
