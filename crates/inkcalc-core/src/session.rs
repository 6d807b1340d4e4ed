//! Solve orchestration.
//!
//! A [`SketchSession`] owns the surface, input router, label overlay and
//! variable bindings, and runs the `Idle -> Solving -> Idle` cycle.
//!
//! The network round-trip and each staged result delivery run as Tokio tasks
//! that report back over a channel as [`SessionEvent`]s. Every event carries the
//! epoch it was scheduled in; [`SketchSession::reset`] bumps the epoch, so
//! anything arriving afterwards from before the reset is dropped without
//! touching bindings or labels.

use crate::bindings::VariableBindings;
use crate::bounds::find_bounds;
use crate::color::InkColor;
use crate::config::SessionConfig;
use crate::input::{DrawMode, InputRouter, PointerEvent};
use crate::overlay::{DisplayLabel, MathTypesetter, OverlayError, OverlayPlacer};
use crate::solver::{ResultItem, SolveError, SolveRequest, Solver};
use crate::surface::{Surface, SurfaceError};
use kurbo::Point;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Solve state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveStatus {
    #[default]
    Idle,
    Solving,
}

/// Asynchronous completions fed back into the session.
#[derive(Debug)]
pub enum SessionEvent {
    /// The solver answered (or failed).
    Solved {
        epoch: u64,
        result: Result<Vec<ResultItem>, SolveError>,
    },
    /// A staged result is due for display.
    Deliver {
        epoch: u64,
        item: ResultItem,
        anchor: Point,
    },
}

impl SessionEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            Self::Solved { epoch, .. } | Self::Deliver { epoch, .. } => *epoch,
        }
    }
}

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    /// A response was accepted and this many results were staged.
    Scheduled { count: usize },
    /// A staged result became the label at `index`.
    Placed { index: usize },
    /// The event predates the last reset and was ignored.
    Discarded,
}

/// One drawing session.
pub struct SketchSession {
    config: SessionConfig,
    surface: Surface,
    input: InputRouter,
    overlay: OverlayPlacer,
    bindings: VariableBindings,
    solver: Arc<dyn Solver>,
    status: SolveStatus,
    /// Bumped on every reset.
    epoch: u64,
    /// Anchor for the next placed results.
    anchor: Point,
    /// Delivery timers, aborted on reset.
    deliveries: Vec<JoinHandle<()>>,
    /// Staged results not yet placed.
    undelivered: usize,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl std::fmt::Debug for SketchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SketchSession")
            .field("surface", &self.surface)
            .field("input", &self.input)
            .field("overlay", &self.overlay)
            .field("bindings", &self.bindings)
            .field("status", &self.status)
            .field("epoch", &self.epoch)
            .field("anchor", &self.anchor)
            .field("undelivered", &self.undelivered)
            .finish_non_exhaustive()
    }
}

impl SketchSession {
    /// Create a session with an empty surface of the configured size.
    pub fn new(
        config: SessionConfig,
        solver: Arc<dyn Solver>,
        typesetter: Box<dyn MathTypesetter>,
    ) -> Result<Self, SurfaceError> {
        let surface = Surface::new(config.width, config.height)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            anchor: config.default_anchor,
            config,
            surface,
            input: InputRouter::new(),
            overlay: OverlayPlacer::new(typesetter),
            bindings: VariableBindings::new(),
            solver,
            status: SolveStatus::Idle,
            epoch: 0,
            deliveries: Vec::new(),
            undelivered: 0,
            events_tx,
            events_rx,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn input(&self) -> &InputRouter {
        &self.input
    }

    pub fn bindings(&self) -> &VariableBindings {
        &self.bindings
    }

    pub fn labels(&self) -> &[DisplayLabel] {
        self.overlay.labels()
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Anchor the next results will be placed at.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Number of staged results not yet placed.
    pub fn pending_deliveries(&self) -> usize {
        self.undelivered
    }

    // --- Input ---

    /// Route a pointer event to the surface.
    /// Returns true if the host should suppress the platform default action.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> bool {
        self.input.handle_pointer_event(event, &mut self.surface)
    }

    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.input.set_canvas_origin(origin);
    }

    pub fn set_color(&mut self, color: impl Into<InkColor>) {
        self.input.set_color(color);
    }

    pub fn toggle_eraser(&mut self) {
        self.input.toggle_eraser();
    }

    pub fn mode(&self) -> DrawMode {
        self.input.mode()
    }

    /// Resize the surface. Existing ink is discarded.
    pub fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.surface.resize(width, height)
    }

    /// Record a label position reported by the drag widget.
    pub fn update_label_anchor(&mut self, index: usize, position: Point) -> Result<(), OverlayError> {
        self.overlay.update_label_anchor(index, position)
    }

    // --- Solving ---

    /// Send the current sketch and bindings to the solver.
    ///
    /// Rejected with [`SolveError::AlreadySolving`] while a request is in
    /// flight. The outcome arrives later as a [`SessionEvent::Solved`].
    pub fn trigger_solve(&mut self) -> Result<(), SolveError> {
        if self.status == SolveStatus::Solving {
            log::warn!("Solve requested while another is in flight");
            return Err(SolveError::AlreadySolving);
        }

        let runtime = Handle::try_current().map_err(|e| SolveError::Runtime(e.to_string()))?;
        let request = SolveRequest {
            image: self.surface.to_image_data()?,
            bindings: self.bindings.clone(),
        };

        let epoch = self.epoch;
        let solver = Arc::clone(&self.solver);
        let tx = self.events_tx.clone();
        runtime.spawn(async move {
            let result = solver.solve(request).await;
            if tx.send(SessionEvent::Solved { epoch, result }).is_err() {
                log::debug!("Session dropped before solve (epoch {}) returned", epoch);
            }
        });

        self.status = SolveStatus::Solving;
        log::info!("Solve started (epoch {})", epoch);
        Ok(())
    }

    /// Wait for the next asynchronous completion.
    pub async fn next_event(&mut self) -> SessionEvent {
        match self.events_rx.recv().await {
            Some(event) => event,
            // Unreachable while `self` holds a sender.
            None => std::future::pending().await,
        }
    }

    /// Apply a completion to the session.
    ///
    /// A failed solve is returned as an error after the session has gone back
    /// to idle; bindings and labels are untouched.
    pub fn handle_event(&mut self, event: SessionEvent) -> Result<SessionUpdate, SolveError> {
        if event.epoch() != self.epoch {
            log::debug!("Dropping event from epoch {} (now {})", event.epoch(), self.epoch);
            return Ok(SessionUpdate::Discarded);
        }

        match event {
            SessionEvent::Solved { result, .. } => {
                self.status = SolveStatus::Idle;
                let items = result.inspect_err(|e| log::warn!("Solve failed: {}", e))?;
                self.accept_results(items)
            }
            SessionEvent::Deliver { item, anchor, .. } => {
                self.deliveries.retain(|h| !h.is_finished());
                self.undelivered = self.undelivered.saturating_sub(1);
                let index = self.overlay.place(&item, anchor, &mut self.surface);
                Ok(SessionUpdate::Placed { index })
            }
        }
    }

    /// Wait for the next completion and apply it.
    pub async fn process_next(&mut self) -> Result<SessionUpdate, SolveError> {
        let event = self.next_event().await;
        self.handle_event(event)
    }

    fn accept_results(&mut self, items: Vec<ResultItem>) -> Result<SessionUpdate, SolveError> {
        let runtime = Handle::try_current().map_err(|e| SolveError::Runtime(e.to_string()))?;

        self.bindings.apply(&items);

        match find_bounds(&self.surface.snapshot_pixels()) {
            Some(bounds) => self.anchor = bounds.center(),
            None => log::debug!("No ink found, keeping anchor {:?}", self.anchor),
        }

        // One timer per response: all results surface together, in order.
        let delay = self.config.delivery_delay();
        let count = items.len();
        if count > 0 {
            let tx = self.events_tx.clone();
            let epoch = self.epoch;
            let anchor = self.anchor;
            self.undelivered += count;
            self.deliveries.push(runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                for item in items {
                    if tx.send(SessionEvent::Deliver { epoch, item, anchor }).is_err() {
                        log::debug!("Session dropped before delivery (epoch {})", epoch);
                        return;
                    }
                }
            }));
        }

        log::info!("Solve returned {} result(s)", count);
        Ok(SessionUpdate::Scheduled { count })
    }

    /// Clear the sketch, labels and bindings, and forget anything in flight.
    pub fn reset(&mut self) {
        self.epoch += 1;
        for handle in self.deliveries.drain(..) {
            handle.abort();
        }
        self.undelivered = 0;
        while self.events_rx.try_recv().is_ok() {}

        self.surface.clear();
        self.overlay.clear();
        self.bindings.clear();
        self.anchor = self.config.default_anchor;
        self.status = SolveStatus::Idle;
        log::info!("Session reset (epoch {})", self.epoch);
    }
}
