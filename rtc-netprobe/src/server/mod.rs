//! STUN/TURN server descriptors: provider shapes, normalization and the
//! per-mode filter that picks the servers a probe is configured with.

pub mod filter;
pub mod ice_server;
pub mod provider;

pub use filter::{filter_ice_servers, url_matches_mode};
pub use ice_server::RTCIceServer;
pub use provider::{
    NatServiceProvider, ServerListInput, TwilioIceServer, TwilioUrls, XirsysIceServers,
};
