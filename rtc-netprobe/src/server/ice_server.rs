use serde::{Deserialize, Serialize};

/// A normalized STUN/TURN server description handed to both probe endpoints.
///
/// Each URL is prefixed `stun:`, `turn:` or `turns:`. A `turn:` URL may carry a
/// `?transport=udp` or `?transport=tcp` suffix; without one the transport is UDP.
///
/// ## Specifications
///
/// * [W3C RTCIceServer](https://w3c.github.io/webrtc-pc/#rtciceserver-dictionary)
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCIceServer {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub credential: String,
}

impl RTCIceServer {
    pub(crate) fn new(urls: Vec<String>, username: Option<&str>, credential: Option<&str>) -> Self {
        RTCIceServer {
            urls,
            username: username.unwrap_or_default().to_owned(),
            credential: credential.unwrap_or_default().to_owned(),
        }
    }
}
