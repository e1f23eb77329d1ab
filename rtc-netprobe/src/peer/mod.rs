//! The peer-connection substrate a probe drives.
//!
//! A probe never talks to a WebRTC stack directly. It asks a [`PeerConnector`]
//! for two [`PeerEndpoint`]s built from the same [`PeerConfiguration`], and the
//! stack reports candidates and state changes back through a [`PeerEventSink`].
//! Events only enqueue into the run's channel; the run task is their sole
//! consumer, so no state is shared with the stack's callback threads.

pub mod configuration;
pub mod sdp;
#[cfg(feature = "webrtc")]
pub mod webrtc;

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::candidate::RTCIceCandidateInit;
use crate::error::Result;
use crate::state::{RTCIceConnectionState, RTCPeerConnectionState};

pub use configuration::{PeerConfiguration, PeerConfigurationBuilder, RTCOfferAnswerOptions};
pub use sdp::{RTCSdpType, RTCSessionDescription};

const PEER_SIDE_LOCAL_STR: &str = "local";
const PEER_SIDE_REMOTE_STR: &str = "remote";

/// Which endpoint of the probe pair an event or operation belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PeerSide {
    /// Creates the offer; its candidates are the ones reported.
    Local,
    /// Answers the offer.
    Remote,
}

impl PeerSide {
    pub fn opposite(&self) -> PeerSide {
        match self {
            PeerSide::Local => PeerSide::Remote,
            PeerSide::Remote => PeerSide::Local,
        }
    }
}

impl fmt::Display for PeerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerSide::Local => write!(f, "{PEER_SIDE_LOCAL_STR}"),
            PeerSide::Remote => write!(f, "{PEER_SIDE_REMOTE_STR}"),
        }
    }
}

/// Notification raised by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A gathered candidate, or `None` once gathering completed.
    IceCandidate(Option<RTCIceCandidateInit>),
    /// The unified connection state changed.
    ConnectionStateChange(RTCPeerConnectionState),
    /// The ICE connection state changed.
    IceConnectionStateChange(RTCIceConnectionState),
}

/// Delivers the events of one endpoint to the probe run that owns it.
#[derive(Debug, Clone)]
pub struct PeerEventSink {
    side: PeerSide,
    tx: mpsc::UnboundedSender<(PeerSide, PeerEvent)>,
}

impl PeerEventSink {
    pub(crate) fn new(side: PeerSide, tx: mpsc::UnboundedSender<(PeerSide, PeerEvent)>) -> Self {
        PeerEventSink { side, tx }
    }

    pub fn side(&self) -> PeerSide {
        self.side
    }

    /// Queues `event` for the run. Returns `false` if the run is already gone,
    /// in which case the event is dropped.
    pub fn send(&self, event: PeerEvent) -> bool {
        match self.tx.send((self.side, event)) {
            Ok(()) => true,
            Err(mpsc::error::SendError((side, event))) => {
                log::trace!("{side} endpoint event after teardown dropped: {event:?}");
                false
            }
        }
    }
}

/// One endpoint of a probe pair.
#[async_trait]
pub trait PeerEndpoint: Send + Sync {
    async fn create_offer(&self, options: &RTCOfferAnswerOptions) -> Result<RTCSessionDescription>;

    async fn create_answer(&self, options: &RTCOfferAnswerOptions) -> Result<RTCSessionDescription>;

    async fn set_local_description(&self, description: RTCSessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: RTCSessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: RTCIceCandidateInit) -> Result<()>;

    /// The unified connection state, or `None` for stacks that only report
    /// ICE connection state. A probe picks its classification path from the
    /// value this returns when the endpoint is created.
    fn connection_state(&self) -> Option<RTCPeerConnectionState>;

    fn ice_connection_state(&self) -> RTCIceConnectionState;

    async fn close(&self) -> Result<()>;
}

/// Creates probe endpoints.
#[async_trait]
pub trait PeerConnector: Send + Sync + 'static {
    type Endpoint: PeerEndpoint + 'static;

    /// Creates an endpoint that reports its candidates and state changes into
    /// `events`.
    async fn new_endpoint(
        &self,
        configuration: &PeerConfiguration,
        events: PeerEventSink,
    ) -> Result<Self::Endpoint>;
}
