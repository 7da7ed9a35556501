use std::time::Duration;

use image::{Rgba, RgbaImage};
use tokio::sync::mpsc;
use tokio::time::timeout;

use tilepress::*;

struct SolidDecoder;

impl SourceDecode for SolidDecoder {
    fn decode(&mut self, width: u32, height: u32) -> Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(width, height, Rgba([30, 90, 160, 255])))
    }

    fn native_size(&self) -> Option<(u32, u32)> {
        None
    }
}

fn small_options(pattern_w: f32, pattern_h: f32) -> TileOptions {
    TileOptions {
        pattern_width_cm: pattern_w,
        pattern_height_cm: pattern_h,
        page_size: PageSize::Custom {
            width_cm: 4.0,
            height_cm: 4.0,
        },
        orientation: OrientationPref::Portrait,
        bleed_margin_cm: 0.5,
        notch_size_cm: 0.5,
        overlap_enabled: false,
        quality: Quality::Low,
        ..Default::default()
    }
}

fn start_session() -> (
    mpsc::UnboundedSender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionUpdate>,
    tokio::task::JoinHandle<()>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_session(command_rx, update_tx));
    (command_tx, update_rx, handle)
}

async fn next_update(rx: &mut mpsc::UnboundedReceiver<SessionUpdate>) -> SessionUpdate {
    timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for session update")
        .expect("session update channel closed")
}

#[tokio::test]
async fn test_set_source_then_options_produces_tiles() {
    let (tx, mut rx, handle) = start_session();

    tx.send(SessionCommand::SetSource {
        kind: SourceKind::Raster,
        decoder: Box::new(SolidDecoder),
    })
    .unwrap();
    tx.send(SessionCommand::UpdateOptions(small_options(10.0, 10.0)))
        .unwrap();

    match next_update(&mut rx).await {
        SessionUpdate::TilesReady {
            layout,
            tiles,
            statistics,
            ..
        } => {
            assert_eq!((layout.cols, layout.rows), (4, 4));
            assert_eq!(tiles.len(), 16);
            assert!(!tiles.is_degraded());
            assert_eq!(statistics.output_pages, 17);
        }
        SessionUpdate::Error { message } => panic!("unexpected error: {message}"),
        _ => panic!("expected TilesReady"),
    }

    tx.send(SessionCommand::Shutdown).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_rapid_option_updates_coalesce() {
    let (tx, mut rx, handle) = start_session();

    tx.send(SessionCommand::SetSource {
        kind: SourceKind::Raster,
        decoder: Box::new(SolidDecoder),
    })
    .unwrap();
    // Three edits in quick succession; only the last should render.
    tx.send(SessionCommand::UpdateOptions(small_options(20.0, 20.0)))
        .unwrap();
    tx.send(SessionCommand::UpdateOptions(small_options(15.0, 15.0)))
        .unwrap();
    tx.send(SessionCommand::UpdateOptions(small_options(6.0, 6.0)))
        .unwrap();

    match next_update(&mut rx).await {
        SessionUpdate::TilesReady { layout, tiles, .. } => {
            assert_eq!((layout.cols, layout.rows), (2, 2));
            assert_eq!(tiles.len(), 4);
        }
        SessionUpdate::Error { message } => panic!("unexpected error: {message}"),
        _ => panic!("expected TilesReady"),
    }

    tx.send(SessionCommand::Shutdown).unwrap();
    handle.await.unwrap();

    // No further tile sets were produced for the superseded edits.
    while let Some(update) = rx.recv().await {
        assert!(!matches!(update, SessionUpdate::TilesReady { .. }));
    }
}

#[tokio::test]
async fn test_dimensions_without_source_is_an_error() {
    let (tx, mut rx, handle) = start_session();

    tx.send(SessionCommand::UpdateOptions(small_options(10.0, 10.0)))
        .unwrap();

    match next_update(&mut rx).await {
        SessionUpdate::Error { message } => {
            assert_eq!(message, "Upload a pattern before entering dimensions.");
        }
        _ => panic!("expected Error"),
    }

    tx.send(SessionCommand::Shutdown).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_invalid_layout_clears_tiles_and_blocks_export() {
    let (tx, mut rx, handle) = start_session();

    tx.send(SessionCommand::SetSource {
        kind: SourceKind::Raster,
        decoder: Box::new(SolidDecoder),
    })
    .unwrap();
    tx.send(SessionCommand::UpdateOptions(small_options(10.0, 10.0)))
        .unwrap();
    assert!(matches!(
        next_update(&mut rx).await,
        SessionUpdate::TilesReady { .. }
    ));

    // Bleed larger than the page kills the printable area.
    let mut bad = small_options(10.0, 10.0);
    bad.bleed_margin_cm = 5.0;
    tx.send(SessionCommand::UpdateOptions(bad)).unwrap();
    match next_update(&mut rx).await {
        SessionUpdate::Error { message } => {
            assert!(message.starts_with("Invalid dimensions:"), "{message}");
        }
        _ => panic!("expected Error"),
    }

    tx.send(SessionCommand::Export).unwrap();
    match next_update(&mut rx).await {
        SessionUpdate::Error { message } => {
            assert_eq!(message, "No tiles to export.");
        }
        _ => panic!("expected Error"),
    }

    tx.send(SessionCommand::Shutdown).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_export_produces_pdf_artifact() {
    let (tx, mut rx, handle) = start_session();

    tx.send(SessionCommand::SetSource {
        kind: SourceKind::Raster,
        decoder: Box::new(SolidDecoder),
    })
    .unwrap();
    tx.send(SessionCommand::UpdateOptions(small_options(6.0, 6.0)))
        .unwrap();
    assert!(matches!(
        next_update(&mut rx).await,
        SessionUpdate::TilesReady { .. }
    ));

    tx.send(SessionCommand::Export).unwrap();
    match next_update(&mut rx).await {
        SessionUpdate::ExportReady { artifact } => {
            assert_eq!(artifact.file_name, "tiled_pattern.pdf");
            let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
            // 2 x 2 tiles plus the assembly guide page
            assert_eq!(doc.get_pages().len(), 5);
        }
        SessionUpdate::Error { message } => panic!("unexpected error: {message}"),
        _ => panic!("expected ExportReady"),
    }

    tx.send(SessionCommand::Shutdown).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_clear_source_drops_tiles() {
    let (tx, mut rx, handle) = start_session();

    tx.send(SessionCommand::SetSource {
        kind: SourceKind::Raster,
        decoder: Box::new(SolidDecoder),
    })
    .unwrap();
    tx.send(SessionCommand::UpdateOptions(small_options(6.0, 6.0)))
        .unwrap();
    assert!(matches!(
        next_update(&mut rx).await,
        SessionUpdate::TilesReady { .. }
    ));

    tx.send(SessionCommand::ClearSource).unwrap();
    assert!(matches!(next_update(&mut rx).await, SessionUpdate::Cleared));

    tx.send(SessionCommand::Export).unwrap();
    match next_update(&mut rx).await {
        SessionUpdate::Error { message } => {
            assert_eq!(message, "No tiles to export.");
        }
        _ => panic!("expected Error"),
    }

    tx.send(SessionCommand::Shutdown).unwrap();
    handle.await.unwrap();
}
