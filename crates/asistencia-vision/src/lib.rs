//! QR code recognition abstractions.

use std::{
    collections::VecDeque,
    fs,
    path::PathBuf,
    sync::Mutex,
};

use async_trait::async_trait;
use asistencia_types::{
    config::VisionConfig,
    detect::{DecodeResult, Point, Quad},
    frame::ImageFrame,
    AsistenciaError, Result,
};
use chrono::Utc;
use image::{ImageBuffer, Rgba};
use tracing::{debug, info, warn};

#[async_trait]
pub trait CodeDetector: Send + Sync {
    /// Locate and decode at most one code in the frame.
    async fn detect(&self, frame: &ImageFrame) -> Result<DecodeResult>;
}

/// QR detector backed by the `rqrr` crate.
///
/// Frames are reduced to grayscale and scanned on a blocking task so the
/// decode never stalls the capture loop's executor.
pub struct RqrrDetector {
    capture_dir: Option<PathBuf>,
}

impl RqrrDetector {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            capture_dir: config.capture_dir.map(PathBuf::from),
        }
    }

    fn persist_capture(&self, frame: &ImageFrame) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.capture_dir else {
            return Ok(None);
        };

        fs::create_dir_all(dir)
            .map_err(|err| vision_error(format!("fallo al crear {:?}: {err}", dir)))?;
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let path = dir.join(format!("scan_{}.png", timestamp));
        let Some(buffer) =
            ImageBuffer::<Rgba<u8>, _>::from_raw(frame.width, frame.height, frame.data.clone())
        else {
            return Err(vision_error("el buffer del frame no coincide con sus dimensiones"));
        };
        buffer
            .save(&path)
            .map_err(|err| vision_error(format!("fallo al guardar la captura: {err}")))?;
        Ok(Some(path))
    }
}

#[async_trait]
impl CodeDetector for RqrrDetector {
    async fn detect(&self, frame: &ImageFrame) -> Result<DecodeResult> {
        let width = frame.width as usize;
        let height = frame.height as usize;
        let luma = rgba_to_luma(frame);

        let result = tokio::task::spawn_blocking(move || detect_sync(width, height, luma))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "QR detection task panicked");
                DecodeResult::default()
            });

        if result.region.is_some() {
            if let Ok(Some(path)) = self.persist_capture(frame) {
                info!("Captura guardada en {:?}", path);
            }
        }
        Ok(result)
    }
}

/// Synchronous detection pass (runs in a blocking task).
fn detect_sync(width: usize, height: usize, luma: Vec<u8>) -> DecodeResult {
    if width == 0 || height == 0 || luma.len() != width * height {
        return DecodeResult::default();
    }

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);
    let grids = prepared.detect_grids();
    let Some(grid) = grids.into_iter().next() else {
        return DecodeResult::default();
    };

    let region: Quad = [
        quad_corner(&grid.bounds[0]),
        quad_corner(&grid.bounds[1]),
        quad_corner(&grid.bounds[2]),
        quad_corner(&grid.bounds[3]),
    ];

    match grid.decode() {
        Ok((_, content)) => DecodeResult {
            payload: Some(content),
            region: Some(region),
        },
        Err(err) => {
            // Located but unreadable, keep the outline and skip the payload.
            debug!(error = %err, "Failed to decode located QR code");
            DecodeResult {
                payload: None,
                region: Some(region),
            }
        }
    }
}

fn quad_corner(point: &rqrr::Point) -> Point {
    Point::new(point.x as i32, point.y as i32)
}

/// ITU-R BT.601 luma from the RGBA buffer.
fn rgba_to_luma(frame: &ImageFrame) -> Vec<u8> {
    frame
        .data
        .chunks_exact(4)
        .map(|px| {
            let r = px[0] as u32;
            let g = px[1] as u32;
            let b = px[2] as u32;
            ((77 * r + 150 * g + 29 * b) >> 8) as u8
        })
        .collect()
}

/// Scripted detector used for integration testing.
pub struct ScriptedDetector {
    results: Mutex<VecDeque<DecodeResult>>,
}

impl ScriptedDetector {
    /// Returns the given results in order, then "nothing found".
    pub fn with_results(results: Vec<DecodeResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
        }
    }
}

#[async_trait]
impl CodeDetector for ScriptedDetector {
    async fn detect(&self, _frame: &ImageFrame) -> Result<DecodeResult> {
        let result = self
            .results
            .lock()
            .map_err(|_| vision_error("failed to lock scripted results"))?
            .pop_front()
            .unwrap_or_default();
        Ok(result)
    }
}

pub fn vision_error(message: impl Into<String>) -> AsistenciaError {
    AsistenciaError::Vision(message.into())
}
