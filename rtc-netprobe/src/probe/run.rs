use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use super::config::ProbeConfig;
use super::outcome::{ProbeOutcome, ProbeStatus};
use super::resolver::OutcomeSlot;
use crate::candidate::{CandidateBuffer, RTCIceCandidateInit, RTCIceCandidateType};
use crate::error::{Error, Result};
use crate::mode::ConnectionMode;
use crate::peer::{
    PeerConfiguration, PeerConfigurationBuilder, PeerConnector, PeerEndpoint, PeerEvent,
    PeerEventSink, PeerSide,
};
use crate::server::RTCIceServer;
use crate::state::{RTCIceConnectionState, RTCPeerConnectionState};

/// Progress of a probe run.
///
/// ```text
/// Idle → OfferCreated → AnswerCreated → Gathering → Terminal(status)
/// ```
///
/// Any state moves to `Terminal` on stop, deadline or a negotiation error.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProbeState {
    #[default]
    Idle,
    OfferCreated,
    AnswerCreated,
    Gathering,
    Terminal(ProbeStatus),
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeState::Idle => write!(f, "idle"),
            ProbeState::OfferCreated => write!(f, "offer_created"),
            ProbeState::AnswerCreated => write!(f, "answer_created"),
            ProbeState::Gathering => write!(f, "gathering"),
            ProbeState::Terminal(status) => write!(f, "terminal({status})"),
        }
    }
}

/// One endpoint of the pair and the candidates received for it from the
/// opposite endpoint.
struct Endpoint<E> {
    side: PeerSide,
    peer: E,
    buffer: CandidateBuffer,
}

impl<E: PeerEndpoint> Endpoint<E> {
    fn new(side: PeerSide, peer: E) -> Self {
        Endpoint {
            side,
            peer,
            buffer: CandidateBuffer::new(),
        }
    }

    async fn flush(&mut self) {
        let candidates = self.buffer.flush();
        if candidates.is_empty() && self.buffer.is_flush_deferred() {
            log::trace!("{} endpoint flush deferred until remote description is set", self.side);
        }
        self.apply(candidates).await;
    }

    async fn set_remote_description_applied(&mut self) {
        let released = self.buffer.remote_description_set();
        self.apply(released).await;
    }

    async fn apply(&self, candidates: Vec<RTCIceCandidateInit>) {
        for candidate in candidates {
            if let Err(err) = self.peer.add_ice_candidate(candidate).await {
                log::warn!("{} endpoint rejected remote candidate: {err}", self.side);
            }
        }
    }

    async fn close(&self) {
        if let Err(err) = self.peer.close().await {
            log::warn!("{} endpoint close failed: {err}", self.side);
        }
    }
}

/// Why a run ended before both endpoints existed.
enum Interrupted {
    Stopped,
    DeadlineReached,
    Failed(Error),
}

impl Interrupted {
    fn settle(self, mode: ConnectionMode, slot: &mut OutcomeSlot) {
        match self {
            Interrupted::Stopped => {
                log::debug!("probe {mode}: stopped while creating endpoints");
                slot.abandon();
            }
            Interrupted::DeadlineReached => {
                log::info!("probe {mode}: failed, endpoints not created before the deadline");
                slot.resolve(Ok(ProbeOutcome::new(ProbeStatus::Failed, vec![])));
            }
            Interrupted::Failed(err) => {
                log::warn!("probe {mode}: endpoint creation failed: {err}");
                slot.resolve(Err(err));
            }
        }
    }
}

/// The task-side state of one probe.
///
/// The run task exclusively owns both endpoints, their candidate buffers and
/// the outcome slot. Endpoint callbacks only reach it through `events`.
pub(crate) struct ProbeRun<E: PeerEndpoint> {
    mode: ConnectionMode,
    config: ProbeConfig,
    state: ProbeState,
    local: Endpoint<E>,
    remote: Endpoint<E>,
    reported: Vec<RTCIceCandidateInit>,
    ice_state_only: bool,
    events: mpsc::UnboundedReceiver<(PeerSide, PeerEvent)>,
    slot: OutcomeSlot,
}

impl<E: PeerEndpoint> ProbeRun<E> {
    /// Creates the endpoint pair and drives it until it resolves, is stopped,
    /// or the deadline passes. Both endpoints are closed before returning.
    pub(crate) async fn execute<C>(
        connector: Arc<C>,
        mode: ConnectionMode,
        ice_servers: Vec<RTCIceServer>,
        config: ProbeConfig,
        mut slot: OutcomeSlot,
        stop: CancellationToken,
    ) where
        C: PeerConnector<Endpoint = E>,
    {
        let started = Instant::now();
        let deadline = started + config.deadline();
        let flush_at = started + config.flush_delay();

        let configuration = PeerConfigurationBuilder::new()
            .with_ice_servers(ice_servers)
            .with_ice_transport_policy(mode.ice_transport_policy())
            .build();

        let (tx, events) = mpsc::unbounded_channel();
        let pair = Self::new_pair(&*connector, &configuration, tx, &stop, deadline).await;
        let (local, remote) = match pair {
            Ok(pair) => pair,
            Err(interrupted) => {
                interrupted.settle(mode, &mut slot);
                return;
            }
        };

        let ice_state_only = local.connection_state().is_none();
        if ice_state_only {
            log::debug!("probe {mode}: no connection state, classifying on ice connection state");
        }

        let mut run = ProbeRun {
            mode,
            config,
            state: ProbeState::Idle,
            local: Endpoint::new(PeerSide::Local, local),
            remote: Endpoint::new(PeerSide::Remote, remote),
            reported: vec![],
            ice_state_only,
            events,
            slot,
        };

        run.drive(stop, deadline, flush_at).await;
        run.teardown().await;
    }

    /// Creates the local endpoint, then the remote one. Creation is raced
    /// against stop and the deadline; an endpoint that already exists when the
    /// other one cannot be created is closed.
    async fn new_pair<C>(
        connector: &C,
        configuration: &PeerConfiguration,
        tx: mpsc::UnboundedSender<(PeerSide, PeerEvent)>,
        stop: &CancellationToken,
        deadline: Instant,
    ) -> std::result::Result<(E, E), Interrupted>
    where
        C: PeerConnector<Endpoint = E>,
    {
        let local_events = PeerEventSink::new(PeerSide::Local, tx.clone());
        let local =
            Self::new_endpoint(connector, configuration, local_events, stop, deadline).await?;

        let remote_events = PeerEventSink::new(PeerSide::Remote, tx);
        match Self::new_endpoint(connector, configuration, remote_events, stop, deadline).await {
            Ok(remote) => Ok((local, remote)),
            Err(interrupted) => {
                if let Err(err) = local.close().await {
                    log::warn!("local endpoint close failed: {err}");
                }
                Err(interrupted)
            }
        }
    }

    async fn new_endpoint<C>(
        connector: &C,
        configuration: &PeerConfiguration,
        events: PeerEventSink,
        stop: &CancellationToken,
        deadline: Instant,
    ) -> std::result::Result<E, Interrupted>
    where
        C: PeerConnector<Endpoint = E>,
    {
        tokio::select! {
            biased;
            _ = stop.cancelled() => Err(Interrupted::Stopped),
            _ = sleep_until(deadline) => Err(Interrupted::DeadlineReached),
            endpoint = connector.new_endpoint(configuration, events) => {
                endpoint.map_err(Interrupted::Failed)
            }
        }
    }

    async fn drive(&mut self, stop: CancellationToken, deadline: Instant, flush_at: Instant) {
        let negotiated = tokio::select! {
            biased;
            _ = stop.cancelled() => {
                self.abandon();
                return;
            }
            _ = sleep_until(deadline) => {
                self.resolve_at_deadline();
                return;
            }
            negotiated = self.negotiate() => negotiated,
        };
        if let Err(err) = negotiated {
            log::warn!(
                "probe {}: description exchange failed in state {}: {err}",
                self.mode,
                self.state
            );
            self.state = ProbeState::Terminal(ProbeStatus::Failed);
            self.slot.resolve(Err(err));
            return;
        }
        self.state = ProbeState::Gathering;

        let flush_timer = sleep_until(flush_at);
        tokio::pin!(flush_timer);
        let mut flush_timer_fired = false;

        while !self.slot.is_resolved() {
            tokio::select! {
                biased;
                _ = stop.cancelled() => self.abandon(),
                _ = sleep_until(deadline) => self.resolve_at_deadline(),
                _ = &mut flush_timer, if !flush_timer_fired => {
                    flush_timer_fired = true;
                    log::debug!("probe {}: flush timer fired", self.mode);
                    self.local.flush().await;
                    self.remote.flush().await;
                }
                Some((side, event)) = self.events.recv() => self.handle_event(side, event).await,
            }
        }
    }

    /// Local offers, remote answers. Any candidate flush requested before an
    /// endpoint has its remote description is released right after it is set.
    async fn negotiate(&mut self) -> Result<()> {
        let options = *self.config.offer_answer_options();

        let offer = self.local.peer.create_offer(&options).await?;
        self.local.peer.set_local_description(offer.clone()).await?;
        self.state = ProbeState::OfferCreated;

        self.remote.peer.set_remote_description(offer).await?;
        self.remote.set_remote_description_applied().await;

        let answer = self.remote.peer.create_answer(&options).await?;
        self.remote.peer.set_local_description(answer.clone()).await?;
        self.state = ProbeState::AnswerCreated;

        self.local.peer.set_remote_description(answer).await?;
        self.local.set_remote_description_applied().await;

        log::debug!("probe {}: offer/answer exchange complete", self.mode);
        Ok(())
    }

    async fn handle_event(&mut self, side: PeerSide, event: PeerEvent) {
        log::trace!("probe {}: {side} event {event:?}", self.mode);
        match (side, event) {
            (side, PeerEvent::IceCandidate(candidate)) => self.on_candidate(side, candidate).await,
            (PeerSide::Local, PeerEvent::ConnectionStateChange(state)) if !self.ice_state_only => {
                self.on_connection_state_change(state)
            }
            (PeerSide::Local, PeerEvent::IceConnectionStateChange(state))
                if self.ice_state_only =>
            {
                self.on_ice_connection_state_change(state)
            }
            _ => {}
        }
    }

    fn endpoint_mut(&mut self, side: PeerSide) -> &mut Endpoint<E> {
        match side {
            PeerSide::Local => &mut self.local,
            PeerSide::Remote => &mut self.remote,
        }
    }

    /// A candidate gathered by `side` is buffered for the opposite endpoint.
    /// End of gathering flushes the opposite endpoint's buffer. Only local
    /// candidates are reported, and `stun` mode drops local host candidates.
    async fn on_candidate(&mut self, side: PeerSide, candidate: Option<RTCIceCandidateInit>) {
        match candidate {
            Some(candidate) if !candidate.is_end_of_candidates() => {
                if side == PeerSide::Local {
                    if self.mode.suppresses_host_candidates()
                        && candidate.candidate_type() == RTCIceCandidateType::Host
                    {
                        log::trace!("probe {}: host candidate suppressed: {candidate}", self.mode);
                        return;
                    }
                    self.reported.push(candidate.clone());
                }
                self.endpoint_mut(side.opposite()).buffer.push(candidate);
            }
            _ => {
                log::debug!("probe {}: {side} gathering complete", self.mode);
                self.endpoint_mut(side.opposite()).flush().await;
            }
        }
    }

    fn on_connection_state_change(&mut self, state: RTCPeerConnectionState) {
        log::debug!("probe {}: local connection state {state}", self.mode);
        if state.is_terminal() {
            let status = if state == RTCPeerConnectionState::Connected {
                ProbeStatus::Connected
            } else {
                ProbeStatus::Failed
            };
            self.finish(status);
        }
    }

    fn on_ice_connection_state_change(&mut self, state: RTCIceConnectionState) {
        log::debug!("probe {}: local ice connection state {state}", self.mode);
        if state == RTCIceConnectionState::Failed {
            self.finish(ProbeStatus::Failed);
        } else if state.is_connected() {
            self.finish(ProbeStatus::Connected);
        }
    }

    fn resolve_at_deadline(&mut self) {
        let status = if self.local_is_connected() {
            ProbeStatus::Connected
        } else {
            ProbeStatus::Failed
        };
        log::debug!("probe {}: deadline reached in state {}", self.mode, self.state);
        self.finish(status);
    }

    fn local_is_connected(&self) -> bool {
        match self.local.peer.connection_state() {
            Some(state) if state != RTCPeerConnectionState::Unspecified => {
                state == RTCPeerConnectionState::Connected
            }
            _ => self.local.peer.ice_connection_state().is_connected(),
        }
    }

    fn finish(&mut self, status: ProbeStatus) {
        let outcome = ProbeOutcome::new(status, self.reported.clone());
        if self.slot.resolve(Ok(outcome)) {
            self.state = ProbeState::Terminal(status);
            log::info!(
                "probe {}: {status} with {} local candidate(s)",
                self.mode,
                self.reported.len()
            );
        }
    }

    fn abandon(&mut self) {
        log::debug!("probe {}: stopped in state {}", self.mode, self.state);
        self.slot.abandon();
        self.state = ProbeState::Terminal(ProbeStatus::Stopped);
    }

    async fn teardown(&mut self) {
        self.events.close();
        self.local.close().await;
        self.remote.close().await;
        log::trace!("probe {}: endpoints closed", self.mode);
    }
}
