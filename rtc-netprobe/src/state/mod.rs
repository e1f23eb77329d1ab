pub mod ice_connection_state;
pub mod peer_connection_state;

pub use ice_connection_state::RTCIceConnectionState;
pub use peer_connection_state::RTCPeerConnectionState;
