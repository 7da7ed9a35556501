//! Interactive tiling session
//!
//! An async command loop that owns the pattern source and current
//! options, recomputes the tile set when inputs change, and serves
//! export requests. Configuration changes are debounced and coalesced:
//! while one recompute is pending, newer option updates replace it
//! rather than queue behind it, and results are tagged with a
//! generation so consumers can discard stale ones.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task;

use crate::compose::{render_tiles, TileSet};
use crate::constants::DEBOUNCE_WINDOW;
use crate::debounce::Debouncer;
use crate::export::{export_tiles, ExportArtifact};
use crate::layout::{plan_layout, ResolvedLayout};
use crate::options::TileOptions;
use crate::source::{SourceDecode, SourceKind};
use crate::stats::{calculate_statistics, TilingStatistics};
use crate::types::*;

/// Commands accepted by the session loop
pub enum SessionCommand {
    /// Install a new pattern source, replacing any current one
    SetSource {
        kind: SourceKind,
        decoder: Box<dyn SourceDecode>,
    },
    /// Remove the pattern source and drop the current tile set
    ClearSource,
    /// Replace the tiling options; recompute after the debounce window
    UpdateOptions(TileOptions),
    /// Serialize the current tile set in the configured output format
    Export,
    Shutdown,
}

/// Updates emitted by the session loop
pub enum SessionUpdate {
    /// A recompute finished; stale generations should be discarded
    TilesReady {
        generation: u64,
        layout: ResolvedLayout,
        tiles: Arc<TileSet>,
        statistics: TilingStatistics,
    },
    ExportReady {
        artifact: ExportArtifact,
    },
    Error {
        message: String,
    },
    /// The source was cleared and no tile set remains
    Cleared,
}

struct ActiveSource {
    kind: SourceKind,
    decoder: Box<dyn SourceDecode>,
}

struct SessionState {
    options: TileOptions,
    source: Option<ActiveSource>,
    current: Option<(ResolvedLayout, Arc<TileSet>)>,
    generation: u64,
}

impl SessionState {
    fn new(options: TileOptions) -> Self {
        Self {
            options,
            source: None,
            current: None,
            generation: 0,
        }
    }
}

/// Run the session loop until `Shutdown` or the command channel closes
pub async fn run_session(
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    update_tx: mpsc::UnboundedSender<SessionUpdate>,
) {
    let mut state = SessionState::new(TileOptions::default());

    while let Some(cmd) = command_rx.recv().await {
        if !process_command(cmd, &mut state, &mut command_rx, &update_tx).await {
            break;
        }
    }
}

async fn process_command(
    cmd: SessionCommand,
    state: &mut SessionState,
    command_rx: &mut mpsc::UnboundedReceiver<SessionCommand>,
    update_tx: &mpsc::UnboundedSender<SessionUpdate>,
) -> bool {
    match cmd {
        SessionCommand::SetSource { kind, decoder } => {
            state.source = Some(ActiveSource { kind, decoder });
            recompute(state, update_tx).await;
        }
        SessionCommand::ClearSource => {
            state.source = None;
            state.current = None;
            let _ = update_tx.send(SessionUpdate::Cleared);
        }
        SessionCommand::UpdateOptions(options) => {
            return debounce_options(options, state, command_rx, update_tx).await;
        }
        SessionCommand::Export => {
            export_current(state, update_tx).await;
        }
        SessionCommand::Shutdown => return false,
    }
    true
}

/// Hold option updates for the debounce window, keeping only the most
/// recent one, then recompute. Unrelated commands that arrive while
/// waiting are processed in order.
async fn debounce_options(
    options: TileOptions,
    state: &mut SessionState,
    command_rx: &mut mpsc::UnboundedReceiver<SessionCommand>,
    update_tx: &mpsc::UnboundedSender<SessionUpdate>,
) -> bool {
    let mut debouncer = Debouncer::new(DEBOUNCE_WINDOW);
    debouncer.trigger(options, Instant::now());

    loop {
        let Some(deadline) = debouncer.deadline() else {
            return true;
        };
        let now = Instant::now();
        if let Some(options) = debouncer.poll(now) {
            state.options = options;
            recompute(state, update_tx).await;
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(deadline - now) => {}
            cmd = command_rx.recv() => match cmd {
                Some(SessionCommand::UpdateOptions(newer)) => {
                    log::debug!("Superseding pending option update");
                    debouncer.trigger(newer, Instant::now());
                }
                Some(SessionCommand::Shutdown) | None => return false,
                Some(other) => {
                    if !Box::pin(process_command(other, state, command_rx, update_tx)).await {
                        return false;
                    }
                }
            },
        }
    }
}

/// Re-plan the layout and re-render the grid from the current inputs
async fn recompute(state: &mut SessionState, update_tx: &mpsc::UnboundedSender<SessionUpdate>) {
    state.generation += 1;
    let generation = state.generation;

    let dims_entered =
        state.options.pattern_width_cm > 0.0 && state.options.pattern_height_cm > 0.0;

    let Some(active) = state.source.take() else {
        if dims_entered {
            state.current = None;
            let _ = update_tx.send(SessionUpdate::Error {
                message: "Upload a pattern before entering dimensions.".to_string(),
            });
        }
        return;
    };

    if !dims_entered {
        // Source present but the pattern size is not set yet; stay idle.
        state.source = Some(active);
        return;
    }

    let layout = match plan_layout(&state.options) {
        Ok(layout) => layout,
        Err(e) => {
            state.source = Some(active);
            state.current = None;
            let _ = update_tx.send(SessionUpdate::Error {
                message: e.to_string(),
            });
            return;
        }
    };

    let statistics = match calculate_statistics(&state.options) {
        Ok(statistics) => statistics,
        Err(e) => {
            state.source = Some(active);
            state.current = None;
            let _ = update_tx.send(SessionUpdate::Error {
                message: e.to_string(),
            });
            return;
        }
    };

    let ActiveSource { kind, mut decoder } = active;
    let options = state.options.clone();
    let handle = task::spawn_blocking(move || {
        let result = render_tiles(decoder.as_mut(), kind, &layout, &options);
        (decoder, result)
    });

    let (decoder, result) = match handle.await {
        Ok(output) => output,
        Err(e) => {
            let _ = update_tx.send(SessionUpdate::Error {
                message: TileError::TaskJoin(e).to_string(),
            });
            return;
        }
    };
    state.source = Some(ActiveSource { kind, decoder });

    match result {
        Ok(tile_set) => {
            for failure in &tile_set.failures {
                let _ = update_tx.send(SessionUpdate::Error {
                    message: TileError::Decode {
                        col: failure.col,
                        row: failure.row,
                        reason: failure.reason.clone(),
                    }
                    .to_string(),
                });
            }
            let tiles = Arc::new(tile_set);
            state.current = Some((layout, Arc::clone(&tiles)));
            let _ = update_tx.send(SessionUpdate::TilesReady {
                generation,
                layout,
                tiles,
                statistics,
            });
        }
        Err(e) => {
            state.current = None;
            let _ = update_tx.send(SessionUpdate::Error {
                message: e.to_string(),
            });
        }
    }
}

/// Serialize the current tile set on the blocking pool
async fn export_current(state: &SessionState, update_tx: &mpsc::UnboundedSender<SessionUpdate>) {
    let Some((layout, tiles)) = state.current.as_ref() else {
        let _ = update_tx.send(SessionUpdate::Error {
            message: "No tiles to export.".to_string(),
        });
        return;
    };

    let layout = *layout;
    let tiles = Arc::clone(tiles);
    let options = state.options.clone();
    let handle = task::spawn_blocking(move || export_tiles(&tiles, &layout, &options));

    match handle.await {
        Ok(Ok(artifact)) => {
            let _ = update_tx.send(SessionUpdate::ExportReady { artifact });
        }
        Ok(Err(e)) => {
            let _ = update_tx.send(SessionUpdate::Error {
                message: e.to_string(),
            });
        }
        Err(e) => {
            let _ = update_tx.send(SessionUpdate::Error {
                message: TileError::TaskJoin(e).to_string(),
            });
        }
    }
}
