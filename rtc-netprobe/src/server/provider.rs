use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ice_server::RTCIceServer;
use crate::error::{Error, Result};

/// The NAT traversal credential service a server list was issued by.
///
/// The two services return structurally different JSON, see
/// [`ServerListInput`].
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NatServiceProvider {
    #[default]
    #[serde(rename = "twilio")]
    Twilio,
    #[serde(rename = "xirsys")]
    Xirsys,
}

const NAT_SERVICE_TWILIO_STR: &str = "twilio";
const NAT_SERVICE_XIRSYS_STR: &str = "xirsys";

impl FromStr for NatServiceProvider {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            NAT_SERVICE_TWILIO_STR => Ok(NatServiceProvider::Twilio),
            NAT_SERVICE_XIRSYS_STR => Ok(NatServiceProvider::Xirsys),
            _ => Err(Error::ErrUnknownNatServiceProvider(raw.to_owned())),
        }
    }
}

impl fmt::Display for NatServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            NatServiceProvider::Twilio => NAT_SERVICE_TWILIO_STR,
            NatServiceProvider::Xirsys => NAT_SERVICE_XIRSYS_STR,
        };
        write!(f, "{s}")
    }
}

/// `urls` is a plain string in Twilio tokens, but tolerate a list as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TwilioUrls {
    One(String),
    Many(Vec<String>),
}

/// One entry of a Twilio `ice_servers` array.
///
/// Twilio repeats the same address under the legacy `url` key and the
/// standard `urls` key; either one is enough.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwilioIceServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<TwilioUrls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl TwilioIceServer {
    fn normalize(&self) -> Result<RTCIceServer> {
        let urls = match (&self.urls, &self.url) {
            (Some(TwilioUrls::One(url)), _) => vec![url.clone()],
            (Some(TwilioUrls::Many(urls)), _) if !urls.is_empty() => urls.clone(),
            (_, Some(url)) => vec![url.clone()],
            _ => return Err(Error::ErrServerDescriptorMissingUrl),
        };

        Ok(RTCIceServer::new(
            urls,
            self.username.as_deref(),
            self.credential.as_deref(),
        ))
    }
}

/// The single descriptor object Xirsys returns, every address in one `urls` list.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XirsysIceServers {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Server descriptors exactly as a credential service issued them.
///
/// The shape is decided by the provider the caller names, never guessed from
/// the data. [`ServerListInput::normalize`] turns either shape into the uniform
/// list the filter and the endpoints consume.
///
/// ```
/// use rtc_netprobe::server::{NatServiceProvider, ServerListInput};
///
/// # fn example() -> rtc_netprobe::Result<()> {
/// let input = ServerListInput::from_json(
///     NatServiceProvider::Xirsys,
///     r#"{"username": "u", "credential": "c",
///         "urls": ["stun:eu.example.com", "turn:eu.example.com:80?transport=udp"]}"#,
/// )?;
/// assert_eq!(input.normalize()?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerListInput {
    Twilio(Vec<TwilioIceServer>),
    Xirsys(XirsysIceServers),
}

impl ServerListInput {
    pub fn provider(&self) -> NatServiceProvider {
        match self {
            ServerListInput::Twilio(_) => NatServiceProvider::Twilio,
            ServerListInput::Xirsys(_) => NatServiceProvider::Xirsys,
        }
    }

    pub fn from_json(provider: NatServiceProvider, raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        Self::from_value(provider, value)
    }

    /// Interprets already parsed JSON with the shape of `provider`.
    pub fn from_value(provider: NatServiceProvider, value: serde_json::Value) -> Result<Self> {
        let mismatch = |e: serde_json::Error| {
            Error::ErrServerListShapeMismatch(provider.to_string(), e.to_string())
        };

        match provider {
            NatServiceProvider::Twilio => Ok(ServerListInput::Twilio(
                serde_json::from_value(value).map_err(mismatch)?,
            )),
            NatServiceProvider::Xirsys => Ok(ServerListInput::Xirsys(
                serde_json::from_value(value).map_err(mismatch)?,
            )),
        }
    }

    /// Converts the provider shape into a list of descriptors with URL lists.
    pub fn normalize(&self) -> Result<Vec<RTCIceServer>> {
        match self {
            ServerListInput::Twilio(servers) => {
                servers.iter().map(TwilioIceServer::normalize).collect()
            }
            ServerListInput::Xirsys(server) => Ok(vec![RTCIceServer::new(
                server.urls.clone(),
                server.username.as_deref(),
                server.credential.as_deref(),
            )]),
        }
    }
}
