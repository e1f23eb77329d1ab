use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("server list: descriptor has neither url nor urls")]
    ErrServerDescriptorMissingUrl,
    #[error("server list: data does not match the {0} provider shape: {1}")]
    ErrServerListShapeMismatch(String, String),
    #[error("server list: unknown NAT service provider {0}")]
    ErrUnknownNatServiceProvider(String),
    #[error("probe: endpoint pair was torn down before an outcome was delivered")]
    ErrProbeTornDown,
    #[error("probe: outcome was already taken from this handle")]
    ErrOutcomeAlreadyTaken,

    #[error("json: {0}")]
    Json(String),
    #[error("peer connection: {0}")]
    PeerConnection(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}

#[cfg(feature = "webrtc")]
impl From<webrtc::Error> for Error {
    fn from(e: webrtc::Error) -> Self {
        Error::PeerConnection(e.to_string())
    }
}
