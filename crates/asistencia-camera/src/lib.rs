//! Frame acquisition abstraction layer.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use asistencia_types::{frame::ImageFrame, AsistenciaError, Result};
use tracing::info;

mod ffmpeg;

pub use ffmpeg::FfmpegCamera;

/// Aggregated capture counters.
#[derive(Debug, Default, Clone)]
pub struct CaptureMetrics {
    pub frames_read: u64,
    pub failed_reads: u64,
}

#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Acquire the device. Failure here is fatal: the scan loop is never
    /// entered.
    async fn open(&mut self) -> Result<()>;

    /// Produce the next frame. `Ok(None)` marks a clean end of the stream;
    /// `Err` is a fatal device failure.
    async fn next_frame(&self) -> Result<Option<ImageFrame>>;

    fn metrics(&self) -> CaptureMetrics;
}

/// Scripted frame source used for integration testing.
pub struct MockCamera {
    frames: Mutex<VecDeque<ImageFrame>>,
    fail_open: bool,
    fail_read_when_empty: bool,
    metrics: Arc<Mutex<CaptureMetrics>>,
}

impl MockCamera {
    /// Serves the given frames in order, then reports end of stream.
    pub fn with_frames(frames: Vec<ImageFrame>) -> Self {
        Self {
            frames: Mutex::new(frames.into()),
            fail_open: false,
            fail_read_when_empty: false,
            metrics: Arc::new(Mutex::new(CaptureMetrics::default())),
        }
    }

    /// Serves the given frames in order, then fails the read.
    pub fn with_frames_then_failure(frames: Vec<ImageFrame>) -> Self {
        Self {
            frames: Mutex::new(frames.into()),
            fail_open: false,
            fail_read_when_empty: true,
            metrics: Arc::new(Mutex::new(CaptureMetrics::default())),
        }
    }

    /// A camera whose device cannot be opened.
    pub fn failing() -> Self {
        Self {
            frames: Mutex::new(VecDeque::new()),
            fail_open: true,
            fail_read_when_empty: false,
            metrics: Arc::new(Mutex::new(CaptureMetrics::default())),
        }
    }
}

#[async_trait]
impl FrameSource for MockCamera {
    async fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(camera_error("no se pudo acceder a la cámara simulada"));
        }
        info!("Opening mock camera");
        Ok(())
    }

    async fn next_frame(&self) -> Result<Option<ImageFrame>> {
        let frame = self
            .frames
            .lock()
            .map_err(|_| camera_error("failed to lock mock frame queue"))?
            .pop_front();
        match frame {
            Some(frame) => {
                if let Ok(mut metrics) = self.metrics.lock() {
                    metrics.frames_read += 1;
                }
                Ok(Some(frame))
            }
            None if self.fail_read_when_empty => {
                if let Ok(mut metrics) = self.metrics.lock() {
                    metrics.failed_reads += 1;
                }
                Err(camera_error("error al capturar el frame simulado"))
            }
            None => Ok(None),
        }
    }

    fn metrics(&self) -> CaptureMetrics {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

/// Generate an error aligned with camera semantics.
pub fn camera_error(message: impl Into<String>) -> AsistenciaError {
    AsistenciaError::Camera(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_camera_serves_frames_then_ends() {
        let mut camera = MockCamera::with_frames(vec![
            ImageFrame::from_rgba(2, 2, vec![0; 16]),
            ImageFrame::from_rgba(2, 2, vec![255; 16]),
        ]);
        camera.open().await.expect("open mock camera");

        assert!(camera.next_frame().await.unwrap().is_some());
        assert!(camera.next_frame().await.unwrap().is_some());
        assert!(camera.next_frame().await.unwrap().is_none());
        assert_eq!(camera.metrics().frames_read, 2);
    }

    #[tokio::test]
    async fn failing_camera_rejects_open() {
        let mut camera = MockCamera::failing();
        assert!(camera.open().await.is_err());
    }
}
