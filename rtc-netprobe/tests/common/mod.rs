//! Scripted in-memory peer connector for driving probe runs in tests.
//!
//! Endpoints record every call made on them and let the test raise candidate
//! and state events by hand. A [`MockBehavior`] scripts the parts a real stack
//! would do on its own: gathering after `set_local_description`, connecting
//! once the answer is applied, failing a step.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use rtc_netprobe::candidate::RTCIceCandidateInit;
use rtc_netprobe::mode::RTCIceTransportPolicy;
use rtc_netprobe::peer::{
    PeerConfiguration, PeerConnector, PeerEndpoint, PeerEvent, PeerEventSink, PeerSide,
    RTCOfferAnswerOptions, RTCSdpType, RTCSessionDescription,
};
use rtc_netprobe::probe::ProbeHandle;
use rtc_netprobe::server::{NatServiceProvider, ServerListInput};
use rtc_netprobe::state::{RTCIceConnectionState, RTCPeerConnectionState};
use rtc_netprobe::{Error, Result};

pub const HOST_CANDIDATE: &str = "candidate:1 1 udp 2130706431 192.168.1.100 54321 typ host";
pub const SRFLX_CANDIDATE: &str =
    "candidate:2 1 udp 1694498815 203.0.113.7 61000 typ srflx raddr 192.168.1.100 rport 54321";
pub const RELAY_CANDIDATE: &str =
    "candidate:3 1 udp 16777215 198.51.100.20 3478 typ relay raddr 203.0.113.7 rport 61000";
pub const REMOTE_HOST_CANDIDATE: &str = "candidate:4 1 udp 2130706431 192.168.1.101 40000 typ host";

pub fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init()
        .ok();
}

pub fn candidate(raw: &str) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: raw.to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_mline_index: Some(0),
        username_fragment: None,
    }
}

/// A Twilio token's server list without any TURN-over-UDP server.
pub fn twilio_servers_without_turn_udp() -> ServerListInput {
    ServerListInput::from_json(
        NatServiceProvider::Twilio,
        r#"[
            {"url": "stun:global.stun.twilio.com:3478?transport=udp",
             "urls": "stun:global.stun.twilio.com:3478?transport=udp"},
            {"url": "turn:global.turn.twilio.com:3478?transport=tcp",
             "urls": "turn:global.turn.twilio.com:3478?transport=tcp",
             "username": "token-user", "credential": "token-secret"},
            {"url": "turns:global.turn.twilio.com:443?transport=tcp",
             "urls": "turns:global.turn.twilio.com:443?transport=tcp",
             "username": "token-user", "credential": "token-secret"}
        ]"#,
    )
    .expect("fixture parses")
}

pub fn xirsys_servers() -> ServerListInput {
    ServerListInput::from_json(
        NatServiceProvider::Xirsys,
        r#"{"username": "xirsys-user", "credential": "xirsys-secret",
            "urls": ["stun:us-turn1.xirsys.com",
                     "turn:us-turn1.xirsys.com:80?transport=udp",
                     "turn:us-turn1.xirsys.com:3478?transport=tcp",
                     "turns:us-turn1.xirsys.com:443?transport=tcp"]}"#,
    )
    .expect("fixture parses")
}

/// Waits until the run task behind `handle` has torn its endpoints down.
pub async fn wait_finished(handle: &ProbeHandle) {
    while !handle.is_finished() {
        settle().await;
    }
}

/// Lets the run task drain its event queue. Time is paused in these tests, so
/// this only advances the clock by a millisecond.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateOffer(RTCOfferAnswerOptions),
    CreateAnswer(RTCOfferAnswerOptions),
    SetLocalDescription(RTCSdpType),
    SetRemoteDescription(RTCSdpType),
    AddIceCandidate(String),
    Close,
}

#[derive(Default, Debug, Clone)]
pub struct MockBehavior {
    /// Endpoints report no unified connection state.
    pub ice_state_only: bool,
    pub fail_new_endpoint: bool,
    /// Creating the endpoint for this side never completes.
    pub stall_new_endpoint: Option<PeerSide>,
    pub fail_create_offer: bool,
    pub fail_close: bool,
    /// Candidates the local endpoint gathers once its local description is
    /// set, followed by end-of-candidates.
    pub local_gather: Option<Vec<String>>,
    /// Same for the remote endpoint.
    pub remote_gather: Option<Vec<String>>,
    /// The local endpoint connects as soon as the answer is applied, if it was
    /// configured with this policy.
    pub connect_with_policy: Option<RTCIceTransportPolicy>,
}

pub struct MockEndpointState {
    side: PeerSide,
    sink: PeerEventSink,
    configuration: PeerConfiguration,
    ice_state_only: bool,
    calls: Mutex<Vec<Call>>,
    connection_state: Mutex<RTCPeerConnectionState>,
    ice_connection_state: Mutex<RTCIceConnectionState>,
}

pub type MockHandle = Arc<MockEndpointState>;

impl MockEndpointState {
    pub fn side(&self) -> PeerSide {
        self.side
    }

    pub fn configuration(&self) -> &PeerConfiguration {
        &self.configuration
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn added_candidates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AddIceCandidate(candidate) => Some(candidate),
                _ => None,
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.calls().contains(&Call::Close)
    }

    pub fn emit(&self, event: PeerEvent) -> bool {
        self.sink.send(event)
    }

    pub fn emit_candidate(&self, raw: &str) -> bool {
        self.emit(PeerEvent::IceCandidate(Some(candidate(raw))))
    }

    pub fn emit_end_of_candidates(&self) -> bool {
        self.emit(PeerEvent::IceCandidate(None))
    }

    /// Moves the endpoint to `state` and raises the matching event, unless the
    /// endpoint only reports ICE state.
    pub fn set_connection_state(&self, state: RTCPeerConnectionState) {
        *self.connection_state.lock().unwrap() = state;
        if !self.ice_state_only {
            self.emit(PeerEvent::ConnectionStateChange(state));
        }
    }

    pub fn set_ice_connection_state(&self, state: RTCIceConnectionState) {
        *self.ice_connection_state.lock().unwrap() = state;
        self.emit(PeerEvent::IceConnectionStateChange(state));
    }

    /// Changes the reported states without raising any event.
    pub fn set_state_silently(
        &self,
        state: RTCPeerConnectionState,
        ice_state: RTCIceConnectionState,
    ) {
        *self.connection_state.lock().unwrap() = state;
        *self.ice_connection_state.lock().unwrap() = ice_state;
    }

    pub fn connect(&self) {
        self.set_ice_connection_state(RTCIceConnectionState::Connected);
        self.set_connection_state(RTCPeerConnectionState::Connected);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn gather(&self, candidates: &[String]) {
        for raw in candidates {
            self.emit_candidate(raw);
        }
        self.emit_end_of_candidates();
    }
}

pub struct MockEndpoint {
    state: MockHandle,
    behavior: MockBehavior,
}

#[async_trait]
impl PeerEndpoint for MockEndpoint {
    async fn create_offer(&self, options: &RTCOfferAnswerOptions) -> Result<RTCSessionDescription> {
        self.state.record(Call::CreateOffer(*options));
        if self.behavior.fail_create_offer {
            return Err(Error::PeerConnection("scripted create_offer failure".to_owned()));
        }
        Ok(RTCSessionDescription::offer(
            "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n".to_owned(),
        ))
    }

    async fn create_answer(
        &self,
        options: &RTCOfferAnswerOptions,
    ) -> Result<RTCSessionDescription> {
        self.state.record(Call::CreateAnswer(*options));
        Ok(RTCSessionDescription::answer(
            "v=0\r\no=- 2 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n".to_owned(),
        ))
    }

    async fn set_local_description(&self, description: RTCSessionDescription) -> Result<()> {
        self.state.record(Call::SetLocalDescription(description.sdp_type));
        let gather = match self.state.side {
            PeerSide::Local => &self.behavior.local_gather,
            PeerSide::Remote => &self.behavior.remote_gather,
        };
        if let Some(candidates) = gather {
            self.state.gather(candidates);
        }
        Ok(())
    }

    async fn set_remote_description(&self, description: RTCSessionDescription) -> Result<()> {
        self.state.record(Call::SetRemoteDescription(description.sdp_type));
        let policy = self.state.configuration.ice_transport_policy();
        if self.state.side == PeerSide::Local && self.behavior.connect_with_policy == Some(policy) {
            self.state.connect();
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: RTCIceCandidateInit) -> Result<()> {
        self.state.record(Call::AddIceCandidate(candidate.candidate));
        Ok(())
    }

    fn connection_state(&self) -> Option<RTCPeerConnectionState> {
        if self.state.ice_state_only {
            None
        } else {
            Some(*self.state.connection_state.lock().unwrap())
        }
    }

    fn ice_connection_state(&self) -> RTCIceConnectionState {
        *self.state.ice_connection_state.lock().unwrap()
    }

    async fn close(&self) -> Result<()> {
        self.state.record(Call::Close);
        if self.behavior.fail_close {
            return Err(Error::PeerConnection("scripted close failure".to_owned()));
        }
        Ok(())
    }
}

pub struct MockConnector {
    behavior: MockBehavior,
    created: mpsc::UnboundedSender<MockHandle>,
}

/// Receives the endpoints a [`MockConnector`] creates, in creation order.
pub struct MockEndpoints {
    rx: mpsc::UnboundedReceiver<MockHandle>,
}

impl MockEndpoints {
    pub async fn next(&mut self) -> MockHandle {
        self.rx.recv().await.expect("connector dropped")
    }

    /// The next local and remote endpoint of a single probe.
    pub async fn next_pair(&mut self) -> (MockHandle, MockHandle) {
        let local = self.next().await;
        let remote = self.next().await;
        assert_eq!(local.side(), PeerSide::Local);
        assert_eq!(remote.side(), PeerSide::Remote);
        (local, remote)
    }

    pub fn try_next(&mut self) -> Option<MockHandle> {
        self.rx.try_recv().ok()
    }
}

impl MockConnector {
    pub fn new(behavior: MockBehavior) -> (Arc<Self>, MockEndpoints) {
        let (created, rx) = mpsc::unbounded_channel();
        (Arc::new(MockConnector { behavior, created }), MockEndpoints { rx })
    }
}

#[async_trait]
impl PeerConnector for MockConnector {
    type Endpoint = MockEndpoint;

    async fn new_endpoint(
        &self,
        configuration: &PeerConfiguration,
        events: PeerEventSink,
    ) -> Result<MockEndpoint> {
        if self.behavior.fail_new_endpoint && events.side() == PeerSide::Remote {
            return Err(Error::PeerConnection("scripted endpoint failure".to_owned()));
        }
        if self.behavior.stall_new_endpoint == Some(events.side()) {
            std::future::pending::<()>().await;
        }

        let state = Arc::new(MockEndpointState {
            side: events.side(),
            sink: events,
            configuration: configuration.clone(),
            ice_state_only: self.behavior.ice_state_only,
            calls: Mutex::new(vec![]),
            connection_state: Mutex::new(RTCPeerConnectionState::New),
            ice_connection_state: Mutex::new(RTCIceConnectionState::New),
        });
        let _ = self.created.send(Arc::clone(&state));

        Ok(MockEndpoint {
            state,
            behavior: self.behavior.clone(),
        })
    }
}
