use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::diagram::Diagram;
use crate::geometry::{ConnectorPath, Size};
use crate::legend::{LegendEntry, legend};
use crate::measure::{LayoutProvider, compute_connectors};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Delays after mount at which layout is measured again, letting fonts and
    /// images settle.
    pub settle_delays_ms: Vec<u64>,
    /// Minimum quiet time after a resize before recomputing.
    pub coalesce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delays_ms: vec![100, 500],
            coalesce_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unmeasured,
    Measuring,
    Rendered,
    Unmounted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Mounted,
    ContainerResized(Size),
    WindowResized(Size),
    Unmounted,
}

/// Collapses a burst of resize notifications into one recompute.
///
/// A recompute becomes due once `interval` has passed since the most recent
/// notification.
#[derive(Debug, Clone)]
pub struct ResizeCoalescer {
    interval: Duration,
    last_event: Option<Instant>,
}

impl ResizeCoalescer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_event: None,
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.last_event.map(|t| t + self.interval)
    }

    /// True once per burst, after the quiet interval has elapsed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    pub fn clear(&mut self) {
        self.last_event = None;
    }
}

/// Output of one measurement pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub container: Size,
    pub paths: Vec<ConnectorPath>,
    pub legend: Vec<LegendEntry>,
}

/// Lifecycle of a single diagram: decides when its connectors are recomputed.
///
/// The host feeds events with [`DiagramSession::handle`] and calls
/// [`DiagramSession::poll`] with the current layout; time is passed in so the
/// session never reads the clock itself.
pub struct DiagramSession {
    diagram: Diagram,
    config: Config,
    legend: Vec<LegendEntry>,
    state: SessionState,
    settle: Vec<Instant>,
    coalescer: ResizeCoalescer,
    frame: Option<Frame>,
    recomputes: usize,
}

impl DiagramSession {
    pub fn new(diagram: Diagram, config: Config) -> Self {
        let legend = legend(&diagram);
        let coalescer = ResizeCoalescer::new(Duration::from_millis(config.session.coalesce_ms));
        Self {
            diagram,
            config,
            legend,
            state: SessionState::Unmeasured,
            settle: Vec::new(),
            coalescer,
            frame: None,
            recomputes: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn recomputes(&self) -> usize {
        self.recomputes
    }

    pub fn handle(&mut self, event: SessionEvent, now: Instant) {
        match (self.state, event) {
            (SessionState::Unmounted, _) => {}
            (_, SessionEvent::Unmounted) => {
                self.state = SessionState::Unmounted;
                self.settle.clear();
                self.coalescer.clear();
                self.frame = None;
            }
            (SessionState::Unmeasured, SessionEvent::Mounted) => {
                self.settle = self
                    .config
                    .session
                    .settle_delays_ms
                    .iter()
                    .map(|ms| now + Duration::from_millis(*ms))
                    .collect();
                if self.settle.is_empty() {
                    self.settle.push(now);
                }
                self.state = SessionState::Measuring;
            }
            (_, SessionEvent::Mounted) => {}
            // Nothing is on screen before mount.
            (SessionState::Unmeasured, _) => {}
            (_, SessionEvent::ContainerResized(size)) | (_, SessionEvent::WindowResized(size)) => {
                tracing::trace!(width = size.width, height = size.height, "resize observed");
                self.coalescer.record(now);
                self.state = SessionState::Measuring;
            }
        }
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.settle
            .iter()
            .copied()
            .chain(self.coalescer.deadline())
            .min()
    }

    /// Recompute if a settle pass or a coalesced resize is due.
    pub fn poll<P: LayoutProvider + ?Sized>(
        &mut self,
        now: Instant,
        provider: &P,
    ) -> Option<&Frame> {
        if matches!(
            self.state,
            SessionState::Unmeasured | SessionState::Unmounted
        ) {
            return None;
        }

        let before = self.settle.len();
        self.settle.retain(|deadline| *deadline > now);
        let settle_due = self.settle.len() != before;
        let resize_due = self.coalescer.take_due(now);

        if !settle_due && !resize_due {
            return None;
        }
        Some(self.recompute(provider))
    }

    /// Measure and rebuild connectors right away.
    pub fn recompute<P: LayoutProvider + ?Sized>(&mut self, provider: &P) -> &Frame {
        let paths = compute_connectors(
            provider,
            &self.diagram,
            self.config.policy,
            &self.config.connector,
        );
        self.recomputes += 1;
        tracing::debug!(
            pass = self.recomputes,
            connectors = paths.len(),
            legend = self.legend.len(),
            "diagram measured"
        );

        if self.state != SessionState::Unmounted {
            self.state = SessionState::Rendered;
        }
        self.frame.insert(Frame {
            container: provider.container(),
            paths,
            legend: self.legend.clone(),
        })
    }
}
