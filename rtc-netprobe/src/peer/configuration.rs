use serde::{Deserialize, Serialize};

use crate::mode::RTCIceTransportPolicy;
use crate::server::RTCIceServer;

/// Configuration shared by both endpoints of a probe.
///
/// Both endpoints of a pair are always created from the same value, so a
/// relay-only policy applies to the offering and the answering side alike.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerConfiguration {
    pub(crate) ice_servers: Vec<RTCIceServer>,
    pub(crate) ice_transport_policy: RTCIceTransportPolicy,
}

impl PeerConfiguration {
    pub fn ice_servers(&self) -> &[RTCIceServer] {
        &self.ice_servers
    }

    pub fn ice_transport_policy(&self) -> RTCIceTransportPolicy {
        self.ice_transport_policy
    }
}

/// Builder for [`PeerConfiguration`].
///
/// ```
/// use rtc_netprobe::mode::RTCIceTransportPolicy;
/// use rtc_netprobe::peer::PeerConfigurationBuilder;
///
/// let config = PeerConfigurationBuilder::new()
///     .with_ice_transport_policy(RTCIceTransportPolicy::Relay)
///     .build();
/// assert!(config.ice_servers().is_empty());
/// assert_eq!(config.ice_transport_policy(), RTCIceTransportPolicy::Relay);
/// ```
#[derive(Default, Debug, Clone)]
pub struct PeerConfigurationBuilder {
    configuration: PeerConfiguration,
}

impl PeerConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<RTCIceServer>) -> Self {
        self.configuration.ice_servers = ice_servers;
        self
    }

    pub fn with_ice_transport_policy(
        mut self,
        ice_transport_policy: RTCIceTransportPolicy,
    ) -> Self {
        self.configuration.ice_transport_policy = ice_transport_policy;
        self
    }

    pub fn build(self) -> PeerConfiguration {
        self.configuration
    }
}

/// Options for `create_offer` and `create_answer`.
///
/// A probe attaches no media of its own; it asks to receive audio and video
/// so that the descriptions carry media sections to gather candidates for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCOfferAnswerOptions {
    pub offer_to_receive_audio: bool,
    pub offer_to_receive_video: bool,
}

impl Default for RTCOfferAnswerOptions {
    fn default() -> Self {
        RTCOfferAnswerOptions {
            offer_to_receive_audio: true,
            offer_to_receive_video: true,
        }
    }
}
