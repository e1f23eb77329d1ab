use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::peer::RTCOfferAnswerOptions;

/// Time after which a run that has not reached a terminal state is classified
/// from the local endpoint's current state.
pub const DEFAULT_PROBE_DEADLINE: Duration = Duration::from_secs(15);

/// Time after which both candidate buffers are flushed even if gathering has
/// not completed.
pub const DEFAULT_CANDIDATE_FLUSH_DELAY: Duration = Duration::from_millis(7500);

/// Timing and negotiation settings of a probe run.
///
/// Both timers are measured from the moment the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeConfig {
    pub(crate) deadline: Duration,
    pub(crate) flush_delay: Duration,
    pub(crate) offer_answer_options: RTCOfferAnswerOptions,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            deadline: DEFAULT_PROBE_DEADLINE,
            flush_delay: DEFAULT_CANDIDATE_FLUSH_DELAY,
            offer_answer_options: RTCOfferAnswerOptions::default(),
        }
    }
}

impl ProbeConfig {
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn flush_delay(&self) -> Duration {
        self.flush_delay
    }

    pub fn offer_answer_options(&self) -> &RTCOfferAnswerOptions {
        &self.offer_answer_options
    }
}

/// Builder for [`ProbeConfig`].
///
/// ```
/// use std::time::Duration;
/// use rtc_netprobe::probe::ProbeConfigBuilder;
///
/// let config = ProbeConfigBuilder::new()
///     .with_deadline(Duration::from_secs(5))
///     .with_flush_delay(Duration::from_millis(2500))
///     .build();
/// assert_eq!(config.deadline(), Duration::from_secs(5));
/// ```
#[derive(Default, Debug, Clone)]
pub struct ProbeConfigBuilder {
    config: ProbeConfig,
}

impl ProbeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = deadline;
        self
    }

    pub fn with_flush_delay(mut self, flush_delay: Duration) -> Self {
        self.config.flush_delay = flush_delay;
        self
    }

    pub fn with_offer_answer_options(
        mut self,
        offer_answer_options: RTCOfferAnswerOptions,
    ) -> Self {
        self.config.offer_answer_options = offer_answer_options;
        self
    }

    pub fn build(self) -> ProbeConfig {
        if self.config.flush_delay > self.config.deadline {
            log::warn!(
                "candidate flush delay {:?} is past the probe deadline {:?}; \
                 buffers only flush on gathering completion",
                self.config.flush_delay,
                self.config.deadline
            );
        }
        self.config
    }
}
