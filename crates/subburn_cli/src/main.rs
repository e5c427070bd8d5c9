//! `subburn` command-line driver.
//!
//! Usage:
//!   subburn burn --video clip.mp4 --transcript clip.json --mode phrase
//!   subburn subs --transcript clip.json --format vtt
//!   subburn config --init

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use subburn_core::config::{ConfigManager, Settings, DEFAULT_CONFIG_PATH};
use subburn_core::export::{CancelHandle, ExportContext, ExportJob, ExportOutcome, ExportRequest, Exporter};
use subburn_core::logging::{self, JobLogger, LogConfig, LogLevel};
use subburn_core::media::ffmpeg::FfmpegBackend;
use subburn_core::media::{OutputFormat, Quality};
use subburn_core::style::StylePreset;
use subburn_core::subtitles::{self, SubtitleFormat};
use subburn_core::transcript::DisplayMode;

#[derive(Parser)]
#[command(author, version, about = "Burn word-timed captions into video", long_about = None)]
struct Cli {
    /// Settings file (created with defaults when missing)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Debug-level logging and uncompacted job logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a copy of a video with captions burned into every frame
    Burn {
        #[arg(long)]
        video: PathBuf,
        /// Transcript JSON, or an .srt/.vtt file
        #[arg(long)]
        transcript: PathBuf,
        #[arg(long)]
        mode: Option<DisplayMode>,
        /// mp4 or webm
        #[arg(long)]
        format: Option<OutputFormat>,
        /// low, medium, high or very_high
        #[arg(long)]
        quality: Option<Quality>,
        #[arg(long)]
        fps: Option<u32>,
        /// green, gold, subtitle or gamer
        #[arg(long)]
        preset: Option<StylePreset>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write the transcript as a subtitle file
    Subs {
        #[arg(long)]
        transcript: PathBuf,
        /// srt, vtt or json
        #[arg(long, default_value = "srt")]
        format: SubtitleFormat,
        #[arg(long)]
        mode: Option<DisplayMode>,
        /// Output file (defaults to the output folder)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Manage the settings file
    Config {
        /// Write a fresh settings file with defaults
        #[arg(long)]
        init: bool,
        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { init, force } = cli.command {
        logging::init_tracing(level_for(cli.verbose, LogLevel::Info));
        return run_config(&cli.config, init, force);
    }

    let mut manager = ConfigManager::new(&cli.config);
    manager
        .load_or_create()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    manager
        .ensure_dirs_exist()
        .context("creating configured folders")?;

    let settings = manager.settings().clone();
    let _guard = logging::init_tracing_with_file(
        level_for(cli.verbose, settings.logging.level),
        manager.logs_folder(),
    )
    .context("opening the application log")?;
    tracing::debug!("subburn {}", subburn_core::version());

    match cli.command {
        Commands::Burn {
            video,
            transcript,
            mode,
            format,
            quality,
            fps,
            preset,
            output_dir,
        } => {
            let options = BurnOptions {
                mode: mode.unwrap_or(settings.export.mode),
                format: format.unwrap_or(settings.export.format),
                quality: quality.unwrap_or(settings.export.quality),
                fps: fps.unwrap_or(settings.export.fps),
                preset,
                output_dir: output_dir.unwrap_or_else(|| manager.output_folder()),
            };
            run_burn(&settings, &manager, &video, &transcript, options, cli.verbose)
        }
        Commands::Subs {
            transcript,
            format,
            mode,
            output,
        } => {
            let mode = mode.unwrap_or(settings.export.mode);
            let output = output
                .unwrap_or_else(|| manager.output_folder().join(format.default_file_name()));
            run_subs(&settings, &transcript, format, mode, &output)
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn level_for(verbose: bool, configured: LogLevel) -> LogLevel {
    if verbose {
        LogLevel::Debug.min(configured)
    } else {
        configured
    }
}

fn run_config(path: &Path, init: bool, force: bool) -> Result<()> {
    if !init {
        bail!("nothing to do (try `subburn config --init`)");
    }
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    ConfigManager::new(path)
        .save()
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}

struct BurnOptions {
    mode: DisplayMode,
    format: OutputFormat,
    quality: Quality,
    fps: u32,
    preset: Option<StylePreset>,
    output_dir: PathBuf,
}

fn run_burn(
    settings: &Settings,
    manager: &ConfigManager,
    video: &Path,
    transcript_path: &Path,
    options: BurnOptions,
    verbose: bool,
) -> Result<()> {
    if !FfmpegBackend::is_available() {
        bail!("ffmpeg and ffprobe must be installed and on PATH");
    }

    let transcript = subtitles::import_file(transcript_path)
        .with_context(|| format!("reading transcript {}", transcript_path.display()))?;
    let style = match options.preset {
        Some(preset) => preset.apply(&settings.style),
        None => settings.style.clone(),
    };

    let job_name = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let log_config = if verbose {
        LogConfig::debug()
    } else {
        LogConfig::from(&settings.logging)
    };
    let logger = JobLogger::new(&job_name, manager.logs_folder(), log_config, None)
        .context("creating the job log")?;

    let backend = Arc::new(FfmpegBackend::new(Some(PathBuf::from(
        &settings.paths.temp_root,
    ))));
    let exporter =
        Exporter::with_fonts(backend, &manager.fonts_folder(), &settings.paths.fallback_font)
            .with_context(|| format!("loading fonts from {}", manager.fonts_folder().display()))?;

    let request = ExportRequest::new(video, transcript)
        .with_style(style)
        .with_mode(options.mode)
        .with_grouping(settings.phrases.clone())
        .with_format(options.format, options.quality)
        .with_fps(options.fps);
    let ctx = ExportContext::new(request, &job_name, Arc::new(logger)).with_progress_callback(
        Box::new(|_phase, _percent, status: &str| {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r\x1b[2K{}", status);
            let _ = stderr.flush();
        }),
    );

    let mut job = ExportJob::new();
    ctrlc::set_handler(interrupt_handler(job.cancel_handle()))
        .context("installing the Ctrl-C handler")?;
    let outcome = exporter.run(&ctx, &mut job);
    eprintln!();

    match outcome.with_context(|| format!("exporting {}", video.display()))? {
        ExportOutcome::Complete(artifact) => {
            let path = artifact
                .write_to(&options.output_dir)
                .with_context(|| format!("writing to {}", options.output_dir.display()))?;
            println!("{}", path.display());
        }
        ExportOutcome::Cancelled => println!("Export cancelled"),
    }
    Ok(())
}

/// First Ctrl-C cancels the export cooperatively so the encoder and scratch
/// files are cleaned up; a second one exits immediately.
fn interrupt_handler(handle: CancelHandle) -> impl FnMut() + Send + 'static {
    move || {
        if handle.is_cancelled() {
            std::process::exit(130);
        }
        tracing::warn!("[Export] Interrupted, cancelling (press Ctrl-C again to abort)");
        handle.cancel();
    }
}

fn run_subs(
    settings: &Settings,
    transcript_path: &Path,
    format: SubtitleFormat,
    mode: DisplayMode,
    output: &Path,
) -> Result<()> {
    let transcript = subtitles::import_file(transcript_path)
        .with_context(|| format!("reading transcript {}", transcript_path.display()))?;
    let content = subtitles::write_content(&transcript, format, mode, &settings.phrases)?;
    subtitles::write_file(output, &content)?;

    tracing::info!("Wrote {} captions to {}", format, output.display());
    println!("{}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_cancels_the_running_job() {
        let job = ExportJob::new();
        let mut on_interrupt = interrupt_handler(job.cancel_handle());
        assert!(!job.is_cancelled());

        on_interrupt();
        assert!(job.is_cancelled());
    }

    #[test]
    fn verbose_lowers_but_never_raises_level() {
        assert_eq!(level_for(true, LogLevel::Warn), LogLevel::Debug);
        assert_eq!(level_for(true, LogLevel::Trace), LogLevel::Trace);
        assert_eq!(level_for(false, LogLevel::Warn), LogLevel::Warn);
    }
}
