use std::fmt;

use serde::{Deserialize, Serialize};

use crate::candidate::RTCIceCandidateInit;

/// How a probe run ended.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeStatus {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,

    /// The local endpoint reached `connected` (or ICE `connected`/`completed`).
    #[serde(rename = "connected")]
    Connected,

    /// The local endpoint reached `failed`, or the deadline passed first.
    #[serde(rename = "failed")]
    Failed,

    /// The run was stopped before it ended on its own.
    #[serde(rename = "stopped")]
    Stopped,
}

const PROBE_STATUS_CONNECTED_STR: &str = "connected";
const PROBE_STATUS_FAILED_STR: &str = "failed";
const PROBE_STATUS_STOPPED_STR: &str = "stopped";

impl From<&str> for ProbeStatus {
    fn from(raw: &str) -> Self {
        match raw {
            PROBE_STATUS_CONNECTED_STR => ProbeStatus::Connected,
            PROBE_STATUS_FAILED_STR => ProbeStatus::Failed,
            PROBE_STATUS_STOPPED_STR => ProbeStatus::Stopped,
            _ => ProbeStatus::Unspecified,
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ProbeStatus::Connected => PROBE_STATUS_CONNECTED_STR,
            ProbeStatus::Failed => PROBE_STATUS_FAILED_STR,
            ProbeStatus::Stopped => PROBE_STATUS_STOPPED_STR,
            ProbeStatus::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// The single result a probe run delivers.
///
/// `ice_candidates` holds the candidates the local endpoint gathered up to the
/// moment of resolution, in gathering order.
///
/// ```
/// use rtc_netprobe::probe::{ProbeOutcome, ProbeStatus};
///
/// let outcome = ProbeOutcome::new(ProbeStatus::Failed, vec![]);
/// assert_eq!(
///     serde_json::to_string(&outcome).unwrap(),
///     r#"{"status":"failed","iceCandidates":[]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    status: ProbeStatus,
    ice_candidates: Vec<RTCIceCandidateInit>,
}

impl ProbeOutcome {
    pub fn new(status: ProbeStatus, ice_candidates: Vec<RTCIceCandidateInit>) -> Self {
        ProbeOutcome { status, ice_candidates }
    }

    pub fn status(&self) -> ProbeStatus {
        self.status
    }

    pub fn ice_candidates(&self) -> &[RTCIceCandidateInit] {
        &self.ice_candidates
    }

    pub fn is_connected(&self) -> bool {
        self.status == ProbeStatus::Connected
    }

    pub fn into_ice_candidates(self) -> Vec<RTCIceCandidateInit> {
        self.ice_candidates
    }
}
