//! Runs one probe per connection mode and collects the results.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::candidate::RTCIceCandidateInit;
use crate::error::Result;
use crate::mode::ConnectionMode;
use crate::peer::PeerConnector;
use crate::probe::{Probe, ProbeConfig, ProbeOutcome, ProbeStatus};
use crate::server::{ServerListInput, filter_ice_servers};

/// Result of one mode in a suite.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ProbeStatus>,
    #[serde(default)]
    pub ice_candidates: Vec<RTCIceCandidateInit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SuiteEntry {
    fn stopped() -> Self {
        SuiteEntry {
            result: Some(ProbeStatus::Stopped),
            ..Default::default()
        }
    }
}

impl From<Result<ProbeOutcome>> for SuiteEntry {
    fn from(result: Result<ProbeOutcome>) -> Self {
        match result {
            Ok(outcome) => SuiteEntry {
                result: Some(outcome.status()),
                ice_candidates: outcome.into_ice_candidates(),
                error: None,
            },
            Err(err) => SuiteEntry {
                result: None,
                ice_candidates: vec![],
                error: Some(err.to_string()),
            },
        }
    }
}

/// Per-mode results of a suite, serialized as an object keyed by mode name.
///
/// ```json
/// {
///   "any": { "result": "connected", "iceCandidates": [ ... ] },
///   "turn-udp": { "result": "failed", "iceCandidates": [] }
/// }
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuiteReport {
    entries: BTreeMap<ConnectionMode, SuiteEntry>,
}

impl SuiteReport {
    pub fn get(&self, mode: ConnectionMode) -> Option<&SuiteEntry> {
        self.entries.get(&mode)
    }

    pub fn status(&self, mode: ConnectionMode) -> Option<ProbeStatus> {
        self.get(mode).and_then(|entry| entry.result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConnectionMode, &SuiteEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Probes every mode in `modes` concurrently and waits for all of them.
///
/// The server list is filtered once per mode before anything starts, so a
/// malformed list fails the whole suite up front. Once `stop` is cancelled,
/// probes that have not resolved yet are stopped and reported as
/// [`ProbeStatus::Stopped`]. A probe that rejects is reported with its error
/// and does not affect the others.
pub async fn run_suite<C: PeerConnector>(
    connector: Arc<C>,
    modes: &[ConnectionMode],
    servers: &ServerListInput,
    config: ProbeConfig,
    stop: CancellationToken,
) -> Result<SuiteReport> {
    let probe = Probe::new(connector, config);

    let mut filtered: Vec<(ConnectionMode, _)> = Vec::with_capacity(modes.len());
    for &mode in modes {
        if filtered.iter().any(|(seen, _)| *seen == mode) {
            continue;
        }
        filtered.push((mode, filter_ice_servers(mode, servers)?));
    }

    let mut probes = JoinSet::new();
    for (mode, ice_servers) in filtered {
        let mut handle = probe.start(mode, ice_servers);
        let stop = stop.clone();
        probes.spawn(async move {
            let entry = tokio::select! {
                biased;
                result = handle.outcome() => SuiteEntry::from(result),
                _ = stop.cancelled() => {
                    handle.stop().await;
                    SuiteEntry::stopped()
                }
            };
            (mode, entry)
        });
    }

    let mut report = SuiteReport::default();
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((mode, entry)) => {
                log::debug!("suite: {mode} finished with {:?}", entry.result);
                report.entries.insert(mode, entry);
            }
            Err(err) => log::error!("suite: probe task failed: {err}"),
        }
    }
    Ok(report)
}
