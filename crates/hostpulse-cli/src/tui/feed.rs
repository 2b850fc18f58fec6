//! Background reader: pulls messages off an [`EventSource`] and hands them
//! to the UI thread over a channel.
//!
//! Live streams are forwarded as they arrive. Replays sleep one sample
//! period (divided by the speed factor) before each status update, with the
//! period taken from the most recent `status_init`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use hostpulse_core::{EventSource, Message, WireError};

/// Longest single sleep, so a stop request is noticed quickly.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub enum FeedEvent {
    Message(Message),
    /// A line that did not decode. The stream continues.
    Malformed(String),
    /// End of stream, with the transport error if there was one.
    Closed(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    Live,
    Replay { speed: f64, fallback_period: f64 },
}

impl Pacing {
    /// Delay before delivering `msg`. Tracks the advertised period in `period`.
    pub fn delay_for(&self, msg: &Message, period: &mut f64) -> Option<Duration> {
        let Pacing::Replay {
            speed,
            fallback_period,
        } = *self
        else {
            return None;
        };
        match msg {
            Message::SessionInit(init) => {
                *period = match init.sample_period_secs {
                    Some(p) if p.is_finite() && p > 0.0 => p,
                    _ => fallback_period,
                };
                None
            }
            Message::StatusUpdate(_) => Duration::try_from_secs_f64(*period / speed).ok(),
            _ => None,
        }
    }

    fn initial_period(&self) -> f64 {
        match *self {
            Pacing::Live => 0.0,
            Pacing::Replay {
                fallback_period, ..
            } => fallback_period,
        }
    }
}

pub struct Feed {
    rx: Receiver<FeedEvent>,
    stop: Arc<AtomicBool>,
}

impl Feed {
    pub fn spawn<S>(mut source: S, pacing: Pacing) -> Self
    where
        S: EventSource + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        thread::spawn(move || pump(&mut source, pacing, &tx, &flag));
        Self { rx, stop }
    }

    /// Next pending event without blocking.
    pub fn try_recv(&self) -> Option<FeedEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reader loop. Returns when the source ends, the receiver goes away, or
/// `stop` is raised.
pub fn pump<S: EventSource + ?Sized>(
    source: &mut S,
    pacing: Pacing,
    tx: &Sender<FeedEvent>,
    stop: &AtomicBool,
) {
    let mut period = pacing.initial_period();
    while !stop.load(Ordering::Relaxed) {
        let event = match source.next_message() {
            Ok(Some(msg)) => {
                if let Some(delay) = pacing.delay_for(&msg, &mut period) {
                    if !sleep_unless_stopped(delay, stop) {
                        return;
                    }
                }
                FeedEvent::Message(msg)
            }
            Ok(None) => {
                let _ = tx.send(FeedEvent::Closed(None));
                return;
            }
            Err(WireError::Io(e)) => {
                let _ = tx.send(FeedEvent::Closed(Some(e.to_string())));
                return;
            }
            Err(e) => FeedEvent::Malformed(e.to_string()),
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}

/// Sleep in slices; `false` if `stop` was raised meanwhile.
fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) -> bool {
    let mut left = total;
    while !left.is_zero() {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let step = left.min(SLEEP_SLICE);
        thread::sleep(step);
        left -= step;
    }
    !stop.load(Ordering::Relaxed)
}
