//! Replay driver: the strict send-then-receive loop.
//!
//! Flow:
//! 1. Load the timeframe array wholesale from the input file
//! 2. Bind the endpoint, wait for the scheduler to connect
//! 3. For each timeframe in order: send it, then block for its tick
//! 4. On disconnect or error: stop sending, persist whatever arrived
//! 5. Tear down the connection and the endpoint artifact on every exit path
//!
//! The driver never sends timeframe *i+1* before the response (or the
//! disconnect, or the error) for timeframe *i* has been resolved.

use std::io;
use std::path::Path;

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio::net::unix::OwnedReadHalf;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::codec::JsonLineCodec;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::listener::EndpointListener;
use crate::protocol::{Tick, Timeframe};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub timeframes_loaded: usize,
    pub timeframes_sent: usize,
    pub ticks_received: usize,
}

impl RunSummary {
    /// A run is partial when the peer stopped answering before the input
    /// list ran out. Partial runs are not failures.
    pub fn is_partial(&self) -> bool {
        self.ticks_received < self.timeframes_loaded
    }
}

struct StreamOutcome {
    ticks: Vec<Tick>,
    sent: usize,
    error: Option<HarnessError>,
}

pub struct ReplayDriver {
    config: HarnessConfig,
}

impl ReplayDriver {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Run one full session: load input, accept one connection, replay every
    /// timeframe, persist results, tear everything down.
    ///
    /// Partial results are persisted before any error is returned, and the
    /// endpoint artifact is removed no matter how the loop exits. A graceful
    /// peer disconnect ends the run early with `Ok`.
    pub async fn run(&self) -> Result<RunSummary, HarnessError> {
        let timeframes = load_timeframes(&self.config.input)?;
        tracing::info!(
            count = timeframes.len(),
            input = %self.config.input.display(),
            "loaded timeframes"
        );

        let mut listener = EndpointListener::bind(&self.config.endpoint)?;
        tracing::info!(endpoint = %listener.path().display(), "waiting for scheduler to connect");

        let outcome = match listener.accept(self.config.accept_timeout).await {
            Ok(stream) => self.stream_timeframes(stream, &timeframes).await,
            Err(err) => StreamOutcome {
                ticks: Vec::new(),
                sent: 0,
                error: Some(err),
            },
        };

        // The connection is gone by now; release the endpoint before
        // reporting so a follow-up run can rebind the same path immediately.
        listener.close();

        let summary = RunSummary {
            timeframes_loaded: timeframes.len(),
            timeframes_sent: outcome.sent,
            ticks_received: outcome.ticks.len(),
        };

        // An aborted run with nothing received has nothing worth writing;
        // every other exit persists the (possibly empty, possibly partial)
        // result so the run is diagnosable.
        let output_path = self.config.output_path();
        if outcome.error.is_none() || !outcome.ticks.is_empty() {
            match persist_ticks(&output_path, &outcome.ticks) {
                Ok(()) => tracing::info!(
                    path = %output_path.display(),
                    ticks = outcome.ticks.len(),
                    "results written"
                ),
                Err(err) => match &outcome.error {
                    // The transport error that aborted the run stays the
                    // primary diagnosis.
                    Some(_) => tracing::warn!(error = %err, "failed to persist partial results"),
                    None => return Err(err),
                },
            }
        }

        tracing::info!(
            loaded = summary.timeframes_loaded,
            sent = summary.timeframes_sent,
            received = summary.ticks_received,
            partial = summary.is_partial(),
            "replay finished"
        );

        match outcome.error {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    async fn stream_timeframes(
        &self,
        stream: UnixStream,
        timeframes: &[Timeframe],
    ) -> StreamOutcome {
        let (read_half, write_half) = stream.into_split();
        let mut sink = FramedWrite::new(write_half, JsonLineCodec::<Timeframe>::new());
        let mut source = FramedRead::new(read_half, JsonLineCodec::<Tick>::new());

        let mut ticks = Vec::with_capacity(timeframes.len());
        let mut sent = 0;

        for frame in timeframes {
            if let Err(err) = sink.send(frame.clone()).await {
                return StreamOutcome {
                    ticks,
                    sent,
                    error: Some(err.into()),
                };
            }
            sent += 1;
            tracing::info!(vtime = frame.vtime, events = frame.events.len(), "sent timeframe");

            match self.receive_tick(&mut source).await {
                Ok(Some(tick)) => {
                    tracing::info!(vtime = tick.vtime, schedule = ?tick.schedule, "received tick");
                    if tick.meta.is_some() {
                        tracing::debug!(
                            preemptions = tick.preemptions(),
                            migrations = tick.migrations(),
                            "tick counters"
                        );
                    }
                    ticks.push(tick);
                }
                Ok(None) => {
                    tracing::info!(sent, received = ticks.len(), "scheduler disconnected, draining");
                    break;
                }
                Err(err) => {
                    return StreamOutcome {
                        ticks,
                        sent,
                        error: Some(err),
                    };
                }
            }
        }

        StreamOutcome {
            ticks,
            sent,
            error: None,
        }
    }

    /// One blocking receive, bounded by the configured timeout. `Ok(None)`
    /// means the peer closed the connection before a terminator arrived.
    async fn receive_tick(
        &self,
        source: &mut FramedRead<OwnedReadHalf, JsonLineCodec<Tick>>,
    ) -> Result<Option<Tick>, HarnessError> {
        let next = match self.config.receive_timeout {
            Some(limit) => tokio::time::timeout(limit, source.next())
                .await
                .map_err(|_| {
                    HarnessError::Transport(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "no tick within the receive timeout",
                    ))
                })?,
            None => source.next().await,
        };

        match next {
            Some(Ok(tick)) => Ok(Some(tick)),
            Some(Err(err)) => Err(err.into()),
            None => Ok(None),
        }
    }
}

fn load_timeframes(path: &Path) -> Result<Vec<Timeframe>, HarnessError> {
    let bytes = std::fs::read(path).map_err(|err| HarnessError::Config {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|err| HarnessError::Config {
        path: path.to_path_buf(),
        reason: format!("not a valid timeframe array: {err}"),
    })
}

fn persist_ticks(path: &Path, ticks: &[Tick]) -> Result<(), HarnessError> {
    let json = serde_json::to_vec_pretty(ticks).map_err(|err| HarnessError::Output {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, err),
    })?;
    std::fs::write(path, json).map_err(|source| HarnessError::Output {
        path: path.to_path_buf(),
        source,
    })
}
