//! [`PeerConnector`] over the async `webrtc` crate.

use std::sync::Arc;

use async_trait::async_trait;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine as WebrtcMediaEngine;
use webrtc::api::setting_engine::SettingEngine as WebrtcSettingEngine;
use webrtc::ice_transport::ice_candidate::{
    RTCIceCandidate as WebrtcIceCandidate, RTCIceCandidateInit as WebrtcIceCandidateInit,
};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState as WebrtcIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer as WebrtcIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection as WebrtcPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration as WebrtcRTCConfiguration;
use webrtc::peer_connection::{
    peer_connection_state::RTCPeerConnectionState as WebrtcRTCPeerConnectionState,
    policy::ice_transport_policy::RTCIceTransportPolicy as WebrtcIceTransportPolicy,
    sdp::session_description::RTCSessionDescription as WebrtcRTCSessionDescription,
};
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;

use super::{
    PeerConfiguration, PeerConnector, PeerEndpoint, PeerEvent, PeerEventSink, PeerSide,
    RTCOfferAnswerOptions, RTCSdpType, RTCSessionDescription,
};
use crate::candidate::RTCIceCandidateInit;
use crate::error::{Error, Result};
use crate::mode::RTCIceTransportPolicy;
use crate::state::{RTCIceConnectionState, RTCPeerConnectionState};

/// Creates endpoints backed by `webrtc::peer_connection::RTCPeerConnection`.
///
/// Each endpoint gets its own media engine with the default codecs and
/// interceptors, so the offer carries the usual audio and video sections.
#[derive(Default, Debug, Clone)]
pub struct WebrtcConnector {
    include_loopback_candidates: bool,
}

impl WebrtcConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gathers candidates on loopback interfaces too. Useful when probing on a
    /// host without any other interface, such as a CI container.
    pub fn with_loopback_candidates(mut self, include_loopback_candidates: bool) -> Self {
        self.include_loopback_candidates = include_loopback_candidates;
        self
    }
}

#[async_trait]
impl PeerConnector for WebrtcConnector {
    type Endpoint = WebrtcEndpoint;

    async fn new_endpoint(
        &self,
        configuration: &PeerConfiguration,
        events: PeerEventSink,
    ) -> Result<WebrtcEndpoint> {
        let mut media_engine = WebrtcMediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let mut setting_engine = WebrtcSettingEngine::default();
        setting_engine.set_include_loopback_candidate(self.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .with_setting_engine(setting_engine)
            .build();

        let ice_servers = configuration
            .ice_servers()
            .iter()
            .map(|server| WebrtcIceServer {
                urls: server.urls.clone(),
                username: server.username.clone(),
                credential: server.credential.clone(),
                ..Default::default()
            })
            .collect();
        let ice_transport_policy = match configuration.ice_transport_policy() {
            RTCIceTransportPolicy::All => WebrtcIceTransportPolicy::All,
            RTCIceTransportPolicy::Relay => WebrtcIceTransportPolicy::Relay,
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(WebrtcRTCConfiguration {
                ice_servers,
                ice_transport_policy,
                ..Default::default()
            })
            .await?,
        );

        let side = events.side();
        wire_events(&peer_connection, events);
        log::debug!(
            "{side} webrtc endpoint created with {} ice server(s), policy {}",
            configuration.ice_servers().len(),
            configuration.ice_transport_policy()
        );

        Ok(WebrtcEndpoint { side, peer_connection })
    }
}

fn wire_events(peer_connection: &WebrtcPeerConnection, events: PeerEventSink) {
    let candidate_events = events.clone();
    peer_connection.on_ice_candidate(Box::new(move |candidate: Option<WebrtcIceCandidate>| {
        let candidate_events = candidate_events.clone();
        Box::pin(async move {
            let candidate = match candidate {
                Some(candidate) => match candidate.to_json() {
                    Ok(init) => Some(from_webrtc_candidate(init)),
                    Err(err) => {
                        log::warn!(
                            "{} endpoint gathered an unserializable candidate: {err}",
                            candidate_events.side()
                        );
                        return;
                    }
                },
                None => None,
            };
            candidate_events.send(PeerEvent::IceCandidate(candidate));
        })
    }));

    let state_events = events.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |state: WebrtcRTCPeerConnectionState| {
            let state = from_webrtc_connection_state(state);
            state_events.send(PeerEvent::ConnectionStateChange(state));
            Box::pin(async {})
        },
    ));

    peer_connection.on_ice_connection_state_change(Box::new(
        move |state: WebrtcIceConnectionState| {
            let state = from_webrtc_ice_connection_state(state);
            events.send(PeerEvent::IceConnectionStateChange(state));
            Box::pin(async {})
        },
    ));
}

/// A probe endpoint backed by a `webrtc` peer connection.
pub struct WebrtcEndpoint {
    side: PeerSide,
    peer_connection: Arc<WebrtcPeerConnection>,
}

impl WebrtcEndpoint {
    async fn add_receive_transceivers(&self, options: &RTCOfferAnswerOptions) -> Result<()> {
        let kinds = [
            (options.offer_to_receive_audio, RTPCodecType::Audio),
            (options.offer_to_receive_video, RTPCodecType::Video),
        ];
        for (_, kind) in kinds.into_iter().filter(|(requested, _)| *requested) {
            self.peer_connection
                .add_transceiver_from_kind(
                    kind,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PeerEndpoint for WebrtcEndpoint {
    async fn create_offer(&self, options: &RTCOfferAnswerOptions) -> Result<RTCSessionDescription> {
        self.add_receive_transceivers(options).await?;
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(from_webrtc_description(offer))
    }

    async fn create_answer(
        &self,
        _options: &RTCOfferAnswerOptions,
    ) -> Result<RTCSessionDescription> {
        // The answer mirrors the media sections of the applied offer.
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(from_webrtc_description(answer))
    }

    async fn set_local_description(&self, description: RTCSessionDescription) -> Result<()> {
        let description = to_webrtc_description(description)?;
        self.peer_connection.set_local_description(description).await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: RTCSessionDescription) -> Result<()> {
        let description = to_webrtc_description(description)?;
        self.peer_connection.set_remote_description(description).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: RTCIceCandidateInit) -> Result<()> {
        log::trace!("{} endpoint adding remote candidate {candidate}", self.side);
        self.peer_connection
            .add_ice_candidate(WebrtcIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_mline_index,
                username_fragment: candidate.username_fragment,
            })
            .await?;
        Ok(())
    }

    fn connection_state(&self) -> Option<RTCPeerConnectionState> {
        Some(from_webrtc_connection_state(self.peer_connection.connection_state()))
    }

    fn ice_connection_state(&self) -> RTCIceConnectionState {
        from_webrtc_ice_connection_state(self.peer_connection.ice_connection_state())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn from_webrtc_candidate(init: WebrtcIceCandidateInit) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_mline_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

// Both crates share the W3C string forms of these enums.
fn from_webrtc_connection_state(state: WebrtcRTCPeerConnectionState) -> RTCPeerConnectionState {
    RTCPeerConnectionState::from(state.to_string().as_str())
}

fn from_webrtc_ice_connection_state(state: WebrtcIceConnectionState) -> RTCIceConnectionState {
    RTCIceConnectionState::from(state.to_string().as_str())
}

fn from_webrtc_description(description: WebrtcRTCSessionDescription) -> RTCSessionDescription {
    RTCSessionDescription {
        sdp_type: RTCSdpType::from(description.sdp_type.to_string().as_str()),
        sdp: description.sdp,
    }
}

fn to_webrtc_description(
    description: RTCSessionDescription,
) -> Result<WebrtcRTCSessionDescription> {
    match description.sdp_type {
        RTCSdpType::Offer => Ok(WebrtcRTCSessionDescription::offer(description.sdp)?),
        RTCSdpType::Answer => Ok(WebrtcRTCSessionDescription::answer(description.sdp)?),
        RTCSdpType::Unspecified => Err(Error::PeerConnection(format!(
            "session description of type {} cannot be applied",
            description.sdp_type
        ))),
    }
}
