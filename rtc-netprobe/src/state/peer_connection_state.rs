use std::fmt;

/// Indicates the overall state of a probe endpoint.
///
/// This is the aggregate of the ICE and DTLS transport states. A probe treats
/// [`Connected`](RTCPeerConnectionState::Connected) and
/// [`Failed`](RTCPeerConnectionState::Failed) on its local endpoint as terminal.
///
/// ```text
/// New → Connecting → Connected
/// Connected → Disconnected → (may recover to Connected)
/// Connected → Failed (permanent failure)
/// Any state → Closed (connection closed)
/// ```
///
/// # Specifications
///
/// - [W3C RTCPeerConnection.connectionState]
///
/// [W3C RTCPeerConnection.connectionState]: https://w3c.github.io/webrtc-pc/#dom-peerconnection-connection-state
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCPeerConnectionState {
    /// State not specified. This should not occur in normal operation.
    #[default]
    Unspecified,

    /// No transport has started connectivity checks yet.
    New,

    /// ICE checks and/or the DTLS handshake are in progress.
    Connecting,

    /// ICE and DTLS are established; media could flow.
    Connected,

    /// Connectivity was lost and may recover.
    Disconnected,

    /// Connectivity cannot be established without an ICE restart.
    Failed,

    /// The endpoint has been closed.
    Closed,
}

const PEER_CONNECTION_STATE_NEW_STR: &str = "new";
const PEER_CONNECTION_STATE_CONNECTING_STR: &str = "connecting";
const PEER_CONNECTION_STATE_CONNECTED_STR: &str = "connected";
const PEER_CONNECTION_STATE_DISCONNECTED_STR: &str = "disconnected";
const PEER_CONNECTION_STATE_FAILED_STR: &str = "failed";
const PEER_CONNECTION_STATE_CLOSED_STR: &str = "closed";

impl RTCPeerConnectionState {
    /// Whether a probe stops observing once its local endpoint reaches this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RTCPeerConnectionState::Connected | RTCPeerConnectionState::Failed
        )
    }
}

impl From<&str> for RTCPeerConnectionState {
    fn from(raw: &str) -> Self {
        match raw {
            PEER_CONNECTION_STATE_NEW_STR => RTCPeerConnectionState::New,
            PEER_CONNECTION_STATE_CONNECTING_STR => RTCPeerConnectionState::Connecting,
            PEER_CONNECTION_STATE_CONNECTED_STR => RTCPeerConnectionState::Connected,
            PEER_CONNECTION_STATE_DISCONNECTED_STR => RTCPeerConnectionState::Disconnected,
            PEER_CONNECTION_STATE_FAILED_STR => RTCPeerConnectionState::Failed,
            PEER_CONNECTION_STATE_CLOSED_STR => RTCPeerConnectionState::Closed,
            _ => RTCPeerConnectionState::Unspecified,
        }
    }
}

impl fmt::Display for RTCPeerConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCPeerConnectionState::New => PEER_CONNECTION_STATE_NEW_STR,
            RTCPeerConnectionState::Connecting => PEER_CONNECTION_STATE_CONNECTING_STR,
            RTCPeerConnectionState::Connected => PEER_CONNECTION_STATE_CONNECTED_STR,
            RTCPeerConnectionState::Disconnected => PEER_CONNECTION_STATE_DISCONNECTED_STR,
            RTCPeerConnectionState::Failed => PEER_CONNECTION_STATE_FAILED_STR,
            RTCPeerConnectionState::Closed => PEER_CONNECTION_STATE_CLOSED_STR,
            RTCPeerConnectionState::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}
