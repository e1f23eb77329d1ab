//! The connectivity probe.
//!
//! A probe creates two endpoints configured with the servers and transport
//! policy of one [`ConnectionMode`], has them negotiate with each other
//! in-process, trades their candidates, and reports whether the pair reached
//! a connected state before the deadline.
//!
//! ```no_run
//! # #[cfg(feature = "webrtc")]
//! # async fn example() -> rtc_netprobe::Result<()> {
//! use std::sync::Arc;
//! use rtc_netprobe::mode::ConnectionMode;
//! use rtc_netprobe::peer::webrtc::WebrtcConnector;
//! use rtc_netprobe::probe::{ProbeConfig, run_probe};
//! use rtc_netprobe::server::{NatServiceProvider, ServerListInput};
//!
//! let servers = ServerListInput::from_json(
//!     NatServiceProvider::Twilio,
//!     r#"[{"urls": "stun:global.stun.twilio.com:3478"}]"#,
//! )?;
//! let outcome = run_probe(
//!     Arc::new(WebrtcConnector::new()),
//!     ConnectionMode::Stun,
//!     &servers,
//!     ProbeConfig::default(),
//! )
//! .await?;
//! println!("{}", serde_json::to_string(&outcome)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod outcome;
pub(crate) mod resolver;
pub mod run;

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::mode::ConnectionMode;
use crate::peer::PeerConnector;
use crate::server::{RTCIceServer, ServerListInput, filter_ice_servers};

pub use config::{
    DEFAULT_CANDIDATE_FLUSH_DELAY, DEFAULT_PROBE_DEADLINE, ProbeConfig, ProbeConfigBuilder,
};
pub use outcome::{ProbeOutcome, ProbeStatus};
pub use run::ProbeState;

use resolver::OutcomeSlot;
use run::ProbeRun;

/// Starts probe runs over endpoints from one connector.
pub struct Probe<C: PeerConnector> {
    connector: Arc<C>,
    config: ProbeConfig,
}

impl<C: PeerConnector> Clone for Probe<C> {
    fn clone(&self) -> Self {
        Probe {
            connector: Arc::clone(&self.connector),
            config: self.config.clone(),
        }
    }
}

impl<C: PeerConnector> Probe<C> {
    pub fn new(connector: Arc<C>, config: ProbeConfig) -> Self {
        Probe { connector, config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Starts a run against an already filtered server list.
    ///
    /// Returns immediately; endpoint creation and negotiation happen on the
    /// spawned run task. Must be called within a tokio runtime.
    pub fn start(&self, mode: ConnectionMode, ice_servers: Vec<RTCIceServer>) -> ProbeHandle {
        let (slot, outcome) = OutcomeSlot::new();
        let stop = CancellationToken::new();

        log::debug!("probe {mode}: starting with {} ice server(s)", ice_servers.len());
        let task = tokio::spawn(ProbeRun::<C::Endpoint>::execute(
            Arc::clone(&self.connector),
            mode,
            ice_servers,
            self.config.clone(),
            slot,
            stop.clone(),
        ));

        ProbeHandle {
            mode,
            outcome: Some(outcome),
            stop,
            task,
        }
    }

    /// Filters `servers` for `mode` and starts a run with the result.
    ///
    /// Fails synchronously if the server list cannot be normalized.
    pub fn start_with_servers(
        &self,
        mode: ConnectionMode,
        servers: &ServerListInput,
    ) -> Result<ProbeHandle> {
        let ice_servers = filter_ice_servers(mode, servers)?;
        Ok(self.start(mode, ice_servers))
    }
}

/// Pending result of a started run.
pub struct ProbeHandle {
    mode: ConnectionMode,
    outcome: Option<oneshot::Receiver<Result<ProbeOutcome>>>,
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl ProbeHandle {
    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Whether the run task has finished, including endpoint teardown.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run's result.
    ///
    /// Cancel safe: dropping the returned future before it completes leaves
    /// the result in place for a later call. Once a result was returned,
    /// further calls fail with [`Error::ErrOutcomeAlreadyTaken`]. A run that
    /// was stopped or whose task ended without resolving yields
    /// [`Error::ErrProbeTornDown`].
    pub async fn outcome(&mut self) -> Result<ProbeOutcome> {
        let Some(rx) = self.outcome.as_mut() else {
            return Err(Error::ErrOutcomeAlreadyTaken);
        };
        let received = rx.await;
        self.outcome = None;
        received.map_err(|_| Error::ErrProbeTornDown)?
    }

    /// Stops the run and waits until both endpoints are closed. No outcome is
    /// delivered for a run stopped before it resolved.
    pub async fn stop(self) {
        self.stop.cancel();
        if let Err(err) = self.task.await {
            log::warn!("probe {}: run task ended abnormally: {err}", self.mode);
        }
    }
}

/// Runs a single probe for `mode` and waits for its outcome.
pub async fn run_probe<C: PeerConnector>(
    connector: Arc<C>,
    mode: ConnectionMode,
    servers: &ServerListInput,
    config: ProbeConfig,
) -> Result<ProbeOutcome> {
    let mut handle = Probe::new(connector, config).start_with_servers(mode, servers)?;
    handle.outcome().await
}
