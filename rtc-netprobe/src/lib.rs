//! # rtc-netprobe - WebRTC Connectivity Probe
//!
//! Diagnoses, from the network the code runs on, which transport strategies
//! can establish a peer-to-peer WebRTC connection: direct or STUN-assisted
//! connectivity, and relayed (TURN) connectivity over UDP, TCP and TLS.
//!
//! A probe builds two endpoints in the same process, restricts their ICE
//! servers and transport policy to one [`ConnectionMode`](mode::ConnectionMode),
//! has them exchange an offer and an answer, trades their candidates, and
//! classifies the result as connected or failed. No media is attached; the
//! probe only exercises signaling and ICE.
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "webrtc")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use rtc_netprobe::mode::ConnectionMode;
//! use rtc_netprobe::peer::webrtc::WebrtcConnector;
//! use rtc_netprobe::probe::ProbeConfig;
//! use rtc_netprobe::server::{NatServiceProvider, ServerListInput};
//! use rtc_netprobe::suite::run_suite;
//! use tokio_util::sync::CancellationToken;
//!
//! // 1. Obtain a server list from the credential provider
//! let servers = ServerListInput::from_json(
//!     NatServiceProvider::Xirsys,
//!     r#"{"urls": ["stun:us-turn1.xirsys.com", "turn:us-turn1.xirsys.com:80?transport=udp"],
//!         "username": "user", "credential": "secret"}"#,
//! )?;
//!
//! // 2. Probe every mode concurrently
//! let report = run_suite(
//!     Arc::new(WebrtcConnector::new()),
//!     &ConnectionMode::ALL,
//!     &servers,
//!     ProbeConfig::default(),
//!     CancellationToken::new(),
//! )
//! .await?;
//!
//! // 3. Report
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mode`]: connection modes and the transport policy each implies
//! - [`server`]: provider server-list shapes and the per-mode filter
//! - [`candidate`]: ICE candidates and the per-endpoint candidate buffer
//! - [`state`]: connection and ICE connection states
//! - [`peer`]: the endpoint traits a probe drives, and the `webrtc` implementation
//! - [`probe`]: the probe run itself
//! - [`suite`]: running every mode at once
//!
//! ## Feature Flags
//!
//! - `webrtc` (default): [`peer::webrtc::WebrtcConnector`] over the `webrtc` crate

#![warn(rust_2018_idioms)]

pub mod candidate;
mod error;
pub mod mode;
pub mod peer;
pub mod probe;
pub mod server;
pub mod state;
pub mod suite;

pub use error::{Error, Result};

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";
