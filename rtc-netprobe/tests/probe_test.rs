//! Probe runs driven over the scripted connector with paused time.

mod common;

use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;

use common::*;
use rtc_netprobe::Error;
use rtc_netprobe::candidate::RTCIceCandidateType;
use rtc_netprobe::mode::{ConnectionMode, RTCIceTransportPolicy};
use rtc_netprobe::peer::{PeerEvent, PeerSide, RTCOfferAnswerOptions, RTCSdpType};
use rtc_netprobe::probe::{Probe, ProbeConfig, ProbeConfigBuilder, ProbeStatus, run_probe};
use rtc_netprobe::server::{NatServiceProvider, ServerListInput};
use rtc_netprobe::state::{RTCIceConnectionState, RTCPeerConnectionState};

#[tokio::test(start_paused = true)]
async fn test_any_mode_connects_with_gathered_candidates() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        local_gather: Some(vec![HOST_CANDIDATE.to_owned(), SRFLX_CANDIDATE.to_owned()]),
        remote_gather: Some(vec![REMOTE_HOST_CANDIDATE.to_owned()]),
        ..Default::default()
    });
    let probe = Probe::new(connector, ProbeConfig::default());

    let started = Instant::now();
    let mut handle = probe.start_with_servers(ConnectionMode::Any, &xirsys_servers())?;
    let (local, remote) = endpoints.next_pair().await;

    assert_eq!(local.configuration(), remote.configuration());
    assert_eq!(local.configuration().ice_transport_policy(), RTCIceTransportPolicy::All);
    assert_eq!(local.configuration().ice_servers()[0].urls.len(), 4);

    settle().await;
    local.connect();

    let outcome = handle.outcome().await?;
    assert_eq!(outcome.status(), ProbeStatus::Connected);
    assert_eq!(
        outcome.ice_candidates(),
        &[candidate(HOST_CANDIDATE), candidate(SRFLX_CANDIDATE)]
    );
    assert!(started.elapsed() < Duration::from_secs(1));

    wait_finished(&handle).await;
    assert!(local.is_closed());
    assert!(remote.is_closed());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_offer_answer_and_candidate_flush_order() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        local_gather: Some(vec![HOST_CANDIDATE.to_owned(), SRFLX_CANDIDATE.to_owned()]),
        remote_gather: Some(vec![REMOTE_HOST_CANDIDATE.to_owned()]),
        connect_with_policy: Some(RTCIceTransportPolicy::All),
        ..Default::default()
    });
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Any, vec![]);
    let (local, remote) = endpoints.next_pair().await;

    assert_eq!(handle.outcome().await?.status(), ProbeStatus::Connected);
    wait_finished(&handle).await;

    // Candidates reach an endpoint only after its remote description is set.
    let options = RTCOfferAnswerOptions::default();
    assert_eq!(
        local.calls(),
        vec![
            Call::CreateOffer(options),
            Call::SetLocalDescription(RTCSdpType::Offer),
            Call::SetRemoteDescription(RTCSdpType::Answer),
            Call::AddIceCandidate(REMOTE_HOST_CANDIDATE.to_owned()),
            Call::Close,
        ]
    );
    assert_eq!(
        remote.calls(),
        vec![
            Call::SetRemoteDescription(RTCSdpType::Offer),
            Call::CreateAnswer(options),
            Call::SetLocalDescription(RTCSdpType::Answer),
            Call::AddIceCandidate(HOST_CANDIDATE.to_owned()),
            Call::AddIceCandidate(SRFLX_CANDIDATE.to_owned()),
            Call::Close,
        ]
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_turn_udp_without_servers_fails_at_deadline() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior::default());
    let probe = Probe::new(connector, ProbeConfig::default());

    let started = Instant::now();
    let mut handle =
        probe.start_with_servers(ConnectionMode::TurnUdp, &twilio_servers_without_turn_udp())?;
    let (local, remote) = endpoints.next_pair().await;

    assert!(local.configuration().ice_servers().is_empty());
    assert_eq!(local.configuration().ice_transport_policy(), RTCIceTransportPolicy::Relay);

    let outcome = handle.outcome().await?;
    let elapsed = started.elapsed();
    assert_eq!(outcome.status(), ProbeStatus::Failed);
    assert!(outcome.ice_candidates().is_empty());
    assert!(elapsed >= Duration::from_secs(15), "resolved after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(15_100), "resolved after {elapsed:?}");

    wait_finished(&handle).await;
    assert!(local.is_closed());
    assert!(remote.is_closed());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stun_mode_never_reports_host_candidates() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        local_gather: Some(vec![
            HOST_CANDIDATE.to_owned(),
            SRFLX_CANDIDATE.to_owned(),
            "candidate:5 1 tcp 1518280447 192.168.1.100 9 typ host tcptype active".to_owned(),
        ]),
        connect_with_policy: Some(RTCIceTransportPolicy::All),
        ..Default::default()
    });
    let probe = Probe::new(connector, ProbeConfig::default());

    let mut handle =
        probe.start_with_servers(ConnectionMode::Stun, &twilio_servers_without_turn_udp())?;
    let (local, remote) = endpoints.next_pair().await;

    let servers = local.configuration().ice_servers();
    assert_eq!(servers.len(), 1);
    assert!(servers[0].urls[0].starts_with("stun:"));

    let outcome = handle.outcome().await?;
    assert_eq!(outcome.status(), ProbeStatus::Connected);
    assert_eq!(outcome.ice_candidates(), &[candidate(SRFLX_CANDIDATE)]);
    assert!(
        outcome
            .ice_candidates()
            .iter()
            .all(|c| c.candidate_type() != RTCIceCandidateType::Host)
    );

    wait_finished(&handle).await;
    assert_eq!(remote.added_candidates(), vec![SRFLX_CANDIDATE.to_owned()]);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_delivers_nothing_and_closes_both_endpoints() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior::default());
    let handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Any, vec![]);
    let (local, remote) = endpoints.next_pair().await;

    remote.emit_candidate(REMOTE_HOST_CANDIDATE);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!handle.is_finished());

    handle.stop().await;
    assert!(local.is_closed());
    assert!(remote.is_closed());

    // Timers are gone with the run: the flush at 7.5s never applies anything.
    let calls = local.calls();
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(local.calls(), calls);
    assert!(local.added_candidates().is_empty());

    // Events after teardown are dropped.
    assert!(!local.emit_candidate(SRFLX_CANDIDATE));
    assert!(!remote.emit_end_of_candidates());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_first_terminal_state_wins() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior::default());
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Any, vec![]);
    let (local, _remote) = endpoints.next_pair().await;

    local.set_connection_state(RTCPeerConnectionState::Connected);
    local.set_connection_state(RTCPeerConnectionState::Failed);

    assert_eq!(handle.outcome().await?.status(), ProbeStatus::Connected);
    assert_eq!(handle.outcome().await, Err(Error::ErrOutcomeAlreadyTaken));

    wait_finished(&handle).await;
    tokio::time::sleep(Duration::from_secs(20)).await;
    let closes = local.calls().into_iter().filter(|call| *call == Call::Close).count();
    assert_eq!(closes, 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_connection_state_resolves_failed() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        local_gather: Some(vec![RELAY_CANDIDATE.to_owned()]),
        ..Default::default()
    });
    let started = Instant::now();
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Relay, vec![]);
    let (local, _remote) = endpoints.next_pair().await;

    settle().await;
    local.set_connection_state(RTCPeerConnectionState::Connecting);
    local.set_connection_state(RTCPeerConnectionState::Failed);

    let outcome = handle.outcome().await?;
    assert_eq!(outcome.status(), ProbeStatus::Failed);
    assert_eq!(outcome.ice_candidates(), &[candidate(RELAY_CANDIDATE)]);
    assert!(started.elapsed() < Duration::from_secs(1));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_ice_state_fallback_classifies_and_tears_down() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        ice_state_only: true,
        ..Default::default()
    });
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Any, vec![]);
    let (local, remote) = endpoints.next_pair().await;

    // Without a unified state, connection state events are not consulted.
    local.emit(PeerEvent::ConnectionStateChange(RTCPeerConnectionState::Failed));
    local.set_ice_connection_state(RTCIceConnectionState::Checking);
    settle().await;
    assert!(!handle.is_finished());

    local.set_ice_connection_state(RTCIceConnectionState::Completed);
    assert_eq!(handle.outcome().await?.status(), ProbeStatus::Connected);

    wait_finished(&handle).await;
    assert!(local.is_closed());
    assert!(remote.is_closed());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_ice_state_fallback_failed() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        ice_state_only: true,
        ..Default::default()
    });
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::TurnTls, vec![]);
    let (local, _remote) = endpoints.next_pair().await;

    local.set_ice_connection_state(RTCIceConnectionState::Failed);
    assert_eq!(handle.outcome().await?.status(), ProbeStatus::Failed);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_deadline_classifies_current_state() -> Result<()> {
    init_logger();

    let tests = vec![
        (
            false,
            RTCPeerConnectionState::Connected,
            RTCIceConnectionState::Connected,
            ProbeStatus::Connected,
        ),
        (
            false,
            RTCPeerConnectionState::Connecting,
            RTCIceConnectionState::Completed,
            ProbeStatus::Failed,
        ),
        (
            true,
            RTCPeerConnectionState::New,
            RTCIceConnectionState::Completed,
            ProbeStatus::Connected,
        ),
        (
            true,
            RTCPeerConnectionState::Connected,
            RTCIceConnectionState::Disconnected,
            ProbeStatus::Failed,
        ),
    ];

    for (ice_state_only, state, ice_state, expected_status) in tests {
        let (connector, mut endpoints) = MockConnector::new(MockBehavior {
            ice_state_only,
            ..Default::default()
        });
        let config = ProbeConfigBuilder::new().with_deadline(Duration::from_secs(3)).build();

        let started = Instant::now();
        let mut handle = Probe::new(connector, config).start(ConnectionMode::Any, vec![]);
        let (local, _remote) = endpoints.next_pair().await;
        local.set_state_silently(state, ice_state);

        let outcome = handle.outcome().await?;
        assert_eq!(
            outcome.status(),
            expected_status,
            "testCase: {ice_state_only} {state} {ice_state}"
        );
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_flush_timer_applies_buffered_candidates() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior::default());
    let _handle = Probe::new(connector, ProbeConfig::default()).start(ConnectionMode::Any, vec![]);
    let (local, remote) = endpoints.next_pair().await;

    local.emit_candidate(SRFLX_CANDIDATE);
    remote.emit_candidate(REMOTE_HOST_CANDIDATE);
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert!(local.added_candidates().is_empty());
    assert!(remote.added_candidates().is_empty());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(local.added_candidates(), vec![REMOTE_HOST_CANDIDATE.to_owned()]);
    assert_eq!(remote.added_candidates(), vec![SRFLX_CANDIDATE.to_owned()]);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_empty_candidate_ends_gathering() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior::default());
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Any, vec![]);
    let (local, remote) = endpoints.next_pair().await;

    local.emit_candidate(SRFLX_CANDIDATE);
    local.emit_candidate("");
    settle().await;
    assert_eq!(remote.added_candidates(), vec![SRFLX_CANDIDATE.to_owned()]);

    local.connect();
    assert_eq!(handle.outcome().await?.ice_candidates(), &[candidate(SRFLX_CANDIDATE)]);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_negotiation_failure_rejects_and_closes() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        fail_create_offer: true,
        ..Default::default()
    });
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Any, vec![]);
    let (local, remote) = endpoints.next_pair().await;

    let result = handle.outcome().await;
    assert!(matches!(result, Err(Error::PeerConnection(_))), "{result:?}");

    wait_finished(&handle).await;
    assert!(local.is_closed());
    assert!(remote.is_closed());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_endpoint_creation_failure_rejects() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        fail_new_endpoint: true,
        ..Default::default()
    });
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Stun, vec![]);

    let result = handle.outcome().await;
    assert!(matches!(result, Err(Error::PeerConnection(_))), "{result:?}");

    let local = endpoints.next().await;
    wait_finished(&handle).await;
    assert!(local.is_closed());
    assert!(endpoints.try_next().is_none());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stalled_endpoint_creation_fails_at_deadline() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior {
        stall_new_endpoint: Some(PeerSide::Remote),
        ..Default::default()
    });
    let started = Instant::now();
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::Any, vec![]);
    let local = endpoints.next().await;

    let outcome = tokio::time::timeout(Duration::from_secs(60), handle.outcome()).await??;
    let elapsed = started.elapsed();
    assert_eq!(outcome.status(), ProbeStatus::Failed);
    assert!(outcome.ice_candidates().is_empty());
    assert!(elapsed >= Duration::from_secs(15), "resolved after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(15_100), "resolved after {elapsed:?}");

    wait_finished(&handle).await;
    assert!(local.is_closed());
    assert!(endpoints.try_next().is_none());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_stalled_endpoint_creation() -> Result<()> {
    init_logger();

    let tests = vec![PeerSide::Local, PeerSide::Remote];

    for stalled in tests {
        let (connector, mut endpoints) = MockConnector::new(MockBehavior {
            stall_new_endpoint: Some(stalled),
            ..Default::default()
        });
        let handle = Probe::new(connector, ProbeConfig::default())
            .start(ConnectionMode::Any, vec![]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!handle.is_finished(), "testCase: {stalled}");

        let stopped = tokio::time::timeout(Duration::from_secs(60), handle.stop()).await;
        assert!(stopped.is_ok(), "testCase: {stalled}");

        let created = endpoints.try_next();
        match stalled {
            PeerSide::Local => assert!(created.is_none(), "testCase: {stalled}"),
            PeerSide::Remote => {
                let local = created.expect("local endpoint created");
                assert!(local.is_closed(), "testCase: {stalled}");
                assert!(endpoints.try_next().is_none(), "testCase: {stalled}");
            }
        }
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_close_failure_is_swallowed() -> Result<()> {
    init_logger();

    let (connector, _endpoints) = MockConnector::new(MockBehavior {
        fail_close: true,
        connect_with_policy: Some(RTCIceTransportPolicy::Relay),
        ..Default::default()
    });
    let mut handle = Probe::new(connector, ProbeConfig::default())
        .start(ConnectionMode::TurnTcp, vec![]);

    assert_eq!(handle.outcome().await?.status(), ProbeStatus::Connected);
    wait_finished(&handle).await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_run_probe_rejects_malformed_server_list() -> Result<()> {
    init_logger();

    let (connector, mut endpoints) = MockConnector::new(MockBehavior::default());
    let servers = ServerListInput::from_json(
        NatServiceProvider::Twilio,
        r#"[{"username": "token-user", "credential": "token-secret"}]"#,
    )?;

    let result = run_probe(
        connector,
        ConnectionMode::TurnUdp,
        &servers,
        ProbeConfig::default(),
    )
    .await;
    assert_eq!(result, Err(Error::ErrServerDescriptorMissingUrl));
    assert!(endpoints.try_next().is_none());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_run_probe_connects() -> Result<()> {
    init_logger();

    let (connector, _endpoints) = MockConnector::new(MockBehavior {
        local_gather: Some(vec![RELAY_CANDIDATE.to_owned()]),
        connect_with_policy: Some(RTCIceTransportPolicy::Relay),
        ..Default::default()
    });

    let outcome = run_probe(
        connector,
        ConnectionMode::TurnUdp,
        &xirsys_servers(),
        ProbeConfig::default(),
    )
    .await?;
    assert!(outcome.is_connected());

    let json = serde_json::to_value(&outcome)?;
    assert_eq!(json["status"], "connected");
    assert_eq!(json["iceCandidates"][0]["candidate"], RELAY_CANDIDATE);

    Ok(())
}
