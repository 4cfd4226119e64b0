use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use console::style;
use creator_briefs_core::{
    BriefArtifact, BriefError, BriefProcessor, Dispatcher, HttpModelClient,
    OutputSpec, Settings, TranscriptCache, TranscriptSource, VideoTask, WhisperTranscriber,
    config::{DEFAULT_TRANSCRIPT_PROMPT, DEFAULT_VIDEO_PROMPT},
    discover_videos, format_duration, run_batch,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

/// What the models are given for each video
#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Upload the video itself
    #[default]
    Video,
    /// Transcribe locally with Whisper and send the transcript
    Transcript,
}

#[derive(Parser)]
#[command(name = "creator-briefs")]
#[command(about = "Turn a folder of videos into creator briefs with multimodal LLMs and model fallback")]
struct Cli {
    /// Process a single video instead of scanning the input directory
    #[arg(long)]
    video: Option<PathBuf>,

    /// Directory to scan for videos
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory where briefs are written
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (defaults to the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Primary model
    #[arg(short, long)]
    model: Option<String>,

    /// Fallback model, tried in the order given (repeatable)
    #[arg(long = "fallback")]
    fallbacks: Vec<String>,

    /// Send the video or a local transcript
    #[arg(long, value_enum, default_value = "video")]
    mode: Mode,

    /// Only produce transcripts, without calling any model
    #[arg(long)]
    transcribe_only: bool,

    /// Re-transcribe even if a cached transcript exists
    #[arg(short, long)]
    force: bool,

    /// Videos processed at the same time
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn create_progress(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

extern "C" fn whisper_log_callback(
    _level: u32,
    _message: *const std::ffi::c_char,
    _user_data: *mut std::ffi::c_void,
) {
    // silent
}

fn collect_tasks(cli: &Cli, settings: &Settings) -> Result<Vec<VideoTask>> {
    if let Some(video) = &cli.video {
        if !video.is_file() {
            bail!("video not found: {}", video.display());
        }
        return Ok(vec![VideoTask::new(video.clone())]);
    }

    let input_dir = settings.paths.input_dir();
    discover_videos(
        &input_dir,
        &settings.files.video_extensions,
        settings.files.recursive,
    )
    .with_context(|| format!("cannot scan {}", input_dir.display()))
}

fn transcript_source(settings: &Settings, force: bool) -> TranscriptSource {
    let cache_dir = settings.paths.cache_dir();
    let transcriber = WhisperTranscriber::new(
        settings.whisper.clone(),
        settings.paths.model_dir(),
        cache_dir.join("work"),
    );
    TranscriptSource::new(
        Arc::new(transcriber),
        TranscriptCache::new(settings.paths.transcript_dir()),
        force,
    )
}

fn print_outcome(pb: &ProgressBar, task: &VideoTask, result: &Result<BriefArtifact, BriefError>) {
    match result {
        Ok(artifact) => pb.println(format!(
            "{} {} {} {}",
            style("✓").green().bold(),
            task.file_name(),
            style("→").dim(),
            style(artifact.file_name()).cyan()
        )),
        Err(e) => pb.println(format!(
            "{} {}: {}",
            style("✗").red().bold(),
            task.file_name(),
            style(e).red()
        )),
    }
}

async fn transcribe_only(cli: &Cli, settings: &Settings, tasks: &[VideoTask]) -> Result<bool> {
    let source = transcript_source(settings, cli.force);
    let pb = create_progress(tasks.len());

    let summary = run_batch(
        tasks,
        cli.jobs,
        |task| source.ensure_saved(task),
        |_, task, result| {
            match result {
                Ok(path) => pb.println(format!(
                    "{} {} {} {}",
                    style("✓").green().bold(),
                    task.file_name(),
                    style("→").dim(),
                    style(path.display()).cyan()
                )),
                Err(e) => pb.println(format!(
                    "{} {}: {}",
                    style("✗").red().bold(),
                    task.file_name(),
                    style(e).red()
                )),
            }
            pb.inc(1);
        },
    )
    .await;
    pb.finish_and_clear();

    println!(
        "\n{} {}/{} transcribed",
        style("Done:").dim(),
        style(summary.succeeded).cyan().bold(),
        summary.total
    );
    Ok(summary.all_succeeded())
}

async fn generate_briefs(cli: &Cli, settings: &Settings, tasks: &[VideoTask]) -> Result<bool> {
    let candidates = settings.llm.candidates()?;
    let client = HttpModelClient::new(settings.llm.request_timeout(), settings.llm.tags())
        .context("failed to build HTTP client")?;
    let dispatcher = Dispatcher::new(Arc::new(client))
        .with_min_response_chars(settings.llm.min_response_chars);

    let default_prompt = match cli.mode {
        Mode::Video => DEFAULT_VIDEO_PROMPT,
        Mode::Transcript => DEFAULT_TRANSCRIPT_PROMPT,
    };
    let output = OutputSpec {
        dir: settings.paths.output_dir(),
        extension: settings.files.brief_extension.clone(),
    };

    println!(
        "{} {} {}",
        style("Models:").dim(),
        style(&candidates.primary().model).yellow(),
        style(format!("(+{} fallbacks)", candidates.fallbacks().len())).dim()
    );
    println!(
        "{} {}",
        style("Output:").dim(),
        style(output.dir.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    let mut processor = BriefProcessor::new(
        dispatcher,
        candidates,
        settings.system_prompt(default_prompt),
        output,
    );
    if cli.mode == Mode::Transcript {
        processor = processor.with_transcripts(transcript_source(settings, cli.force));
    }

    let pb = create_progress(tasks.len());
    let mut models_used: Vec<String> = Vec::new();
    let summary = run_batch(
        tasks,
        cli.jobs,
        |task| processor.process_video(task),
        |_, task, result| {
            print_outcome(&pb, task, result);
            if let Ok(artifact) = result {
                models_used.push(artifact.model_used.clone());
            }
            pb.inc(1);
        },
    )
    .await;
    pb.finish_and_clear();

    println!(
        "\n{} {}/{} briefs written",
        style("Done:").dim(),
        style(summary.succeeded).cyan().bold(),
        summary.total
    );

    models_used.sort();
    models_used.dedup();
    for model in &models_used {
        println!("{} {}", style("Model used:").dim(), style(model).yellow());
    }

    for failure in &summary.failures {
        println!(
            "{} {}: {}",
            style("Failed:").red().bold(),
            failure.video,
            failure.error
        );
    }

    Ok(summary.all_succeeded())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    unsafe {
        whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(input) = &cli.input {
        settings.paths.input_dir = input.clone();
    }
    if let Some(output) = &cli.output {
        settings.paths.output_dir = output.clone();
    }
    if let Some(model) = &cli.model {
        settings.llm.primary_model = model.clone();
    }
    if !cli.fallbacks.is_empty() {
        settings.llm.fallback_models = cli.fallbacks.clone();
    }

    println!(
        "\n{}  {}\n",
        style("creator-briefs").cyan().bold(),
        style("Video Brief Generator").dim()
    );

    let tasks = collect_tasks(&cli, &settings)?;
    if tasks.is_empty() {
        println!(
            "{} no videos found in {}",
            style("!").yellow().bold(),
            settings.paths.input_dir().display()
        );
        return Ok(());
    }
    println!(
        "{} {} video(s) to process",
        style("✓").green().bold(),
        tasks.len()
    );

    let total_start = Instant::now();
    let ok = if cli.transcribe_only {
        transcribe_only(&cli, &settings, &tasks).await?
    } else {
        generate_briefs(&cli, &settings, &tasks).await?
    };

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
