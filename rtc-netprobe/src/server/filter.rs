use super::ice_server::RTCIceServer;
use super::provider::ServerListInput;
use crate::error::Result;
use crate::mode::ConnectionMode;

const STUN_SCHEME_PREFIX: &str = "stun:";
const TURN_SCHEME_PREFIX: &str = "turn:";
const TURNS_SCHEME_PREFIX: &str = "turns:";
const UDP_TRANSPORT_SUFFIX: &str = "udp";
const TCP_TRANSPORT_SUFFIX: &str = "tcp";

/// Reports whether a single server URL is relevant to `mode`.
///
/// The checks are plain prefix/suffix tests on the URL text, so
/// `turn:host:3478?transport=udp` is a TURN-UDP address while a bare
/// `turn:host:3478` (implicitly UDP) is only used by the unfiltered modes.
pub fn url_matches_mode(mode: ConnectionMode, url: &str) -> bool {
    match mode {
        ConnectionMode::Stun => url.starts_with(STUN_SCHEME_PREFIX),
        ConnectionMode::TurnUdp => {
            url.starts_with(TURN_SCHEME_PREFIX) && url.ends_with(UDP_TRANSPORT_SUFFIX)
        }
        ConnectionMode::TurnTcp => {
            url.starts_with(TURN_SCHEME_PREFIX) && url.ends_with(TCP_TRANSPORT_SUFFIX)
        }
        ConnectionMode::TurnTls => url.contains(TURNS_SCHEME_PREFIX),
        ConnectionMode::Any | ConnectionMode::Relay | ConnectionMode::Unspecified => true,
    }
}

/// Normalizes `input` and keeps only the servers relevant to `mode`.
///
/// URLs are filtered inside every descriptor and descriptors left without any
/// URL are dropped, which filters Twilio lists descriptor by descriptor and
/// the single Xirsys descriptor URL by URL. An empty result is valid: the
/// probe then runs without ICE servers.
pub fn filter_ice_servers(
    mode: ConnectionMode,
    input: &ServerListInput,
) -> Result<Vec<RTCIceServer>> {
    let servers = input.normalize()?;
    let total = servers.len();

    let filtered: Vec<RTCIceServer> = servers
        .into_iter()
        .filter_map(|mut server| {
            server.urls.retain(|url| url_matches_mode(mode, url));
            if server.urls.is_empty() {
                None
            } else {
                Some(server)
            }
        })
        .collect();

    log::debug!(
        "{} of {} server descriptors kept for {mode} probe",
        filtered.len(),
        total,
    );

    Ok(filtered)
}
