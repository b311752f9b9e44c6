use std::{env, path::PathBuf};

use anyhow::Result;
use asistencia_camera::FfmpegCamera;
use asistencia_ops::{init_tracing, ScanJournal};
use asistencia_reporter::HttpReporter;
use asistencia_scanner::Scanner;
use asistencia_types::config::{
    AsistenciaConfig, CameraConfig, OpsConfig, ReporterConfig, ScannerConfig, VisionConfig,
};
use asistencia_vision::RqrrDetector;
use clap::Parser;

mod ui;

use ui::TerminalDisplay;

/// Escáner QR para el registro de asistencia.
#[derive(Parser)]
#[command(name = "asistencia-cli")]
struct Args {
    /// Ruta del archivo de configuración TOML.
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config);
    init_tracing(&config.ops)?;

    let camera = FfmpegCamera::new(config.camera.clone());
    let detector = RqrrDetector::new(config.vision.clone());
    let reporter = HttpReporter::new(&config.reporter);
    let journal = ScanJournal::new();
    let display = TerminalDisplay::new()?;

    let mut scanner = Scanner::new(
        &config.scanner,
        camera,
        detector,
        reporter,
        display,
        journal,
    );
    scanner.boot(&config).await?;
    scanner.run().await?;
    Ok(())
}

fn load_config(from_args: Option<PathBuf>) -> AsistenciaConfig {
    let from_env = env::var("ASISTENCIA_CONFIG").ok().map(PathBuf::from);
    let path = from_args
        .or(from_env)
        .unwrap_or_else(|| PathBuf::from("configs/dev.toml"));
    match AsistenciaConfig::from_file(&path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    path.display()
                );
                default_config()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                path.display()
            );
            default_config()
        }
    }
}

fn default_config() -> AsistenciaConfig {
    let config = AsistenciaConfig {
        camera: CameraConfig {
            device_index: 0,
            frame_width: 640,
            frame_height: 480,
            ffmpeg_path: None,
        },
        vision: VisionConfig { capture_dir: None },
        reporter: ReporterConfig {
            endpoint_url: "http://localhost:5000/api/asistencia".into(),
            timeout_secs: 5,
        },
        scanner: ScannerConfig { cooldown_secs: 3 },
        ops: OpsConfig {
            log_level: "info".into(),
        },
    };
    debug_assert!(config.validate().is_ok());
    config
}
