use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use asistencia_types::{config::CameraConfig, frame::ImageFrame, Result};
use image::ImageFormat;
use tokio::process::Command;

use crate::{camera_error, CaptureMetrics, FrameSource};

const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Webcam frame source that grabs one PNG per tick by running `ffmpeg`
/// against the V4L2 node and decoding its stdout.
pub struct FfmpegCamera {
    config: CameraConfig,
    ffmpeg_path: PathBuf,
    metrics: Arc<Mutex<CaptureMetrics>>,
}

impl FfmpegCamera {
    pub fn new(config: CameraConfig) -> Self {
        let ffmpeg_path = config
            .ffmpeg_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG));

        Self {
            config,
            ffmpeg_path,
            metrics: Arc::new(Mutex::new(CaptureMetrics::default())),
        }
    }

    fn device_node(&self) -> PathBuf {
        PathBuf::from(format!("/dev/video{}", self.config.device_index))
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.ffmpeg_path);
        command.args(args);
        let output = command.output().await.map_err(|err| {
            camera_error(format!(
                "no se pudo ejecutar ffmpeg ({:?}): {err}",
                self.ffmpeg_path
            ))
        })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            self.record_failure();
            Err(camera_error(format!(
                "fallo al capturar el frame: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn record_success(&self) {
        if let Ok(mut guard) = self.metrics.lock() {
            guard.frames_read += 1;
        }
    }

    fn record_failure(&self) {
        if let Ok(mut guard) = self.metrics.lock() {
            guard.failed_reads += 1;
        }
    }

    fn capture_args(&self) -> Vec<String> {
        vec![
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "v4l2".into(),
            "-video_size".into(),
            format!("{}x{}", self.config.frame_width, self.config.frame_height),
            "-i".into(),
            self.device_node().display().to_string(),
            "-frames:v".into(),
            "1".into(),
            "-f".into(),
            "image2pipe".into(),
            "-vcodec".into(),
            "png".into(),
            "-".into(),
        ]
    }
}

#[async_trait]
impl FrameSource for FfmpegCamera {
    async fn open(&mut self) -> Result<()> {
        let node = self.device_node();
        tracing::info!("Abriendo cámara en {:?}", node);
        if !Path::new(&node).exists() {
            return Err(camera_error(format!(
                "no se pudo acceder a la cámara: {} no existe",
                node.display()
            )));
        }
        Ok(())
    }

    async fn next_frame(&self) -> Result<Option<ImageFrame>> {
        let raw = self.run_ffmpeg(&self.capture_args()).await?;
        let img = image::load_from_memory_with_format(&raw, ImageFormat::Png).map_err(|err| {
            self.record_failure();
            camera_error(format!("fallo al decodificar el frame: {err}"))
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();
        self.record_success();
        Ok(Some(ImageFrame::from_rgba(width, height, data)))
    }

    fn metrics(&self) -> CaptureMetrics {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_default()
    }
}
