use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seedpost_core::{
    load_config, resolve_config_path, validate_config, Category, Config, FfmpegExtractor,
    HttpProviderApi, JikanResolver, JobOptions, JobReport, JobRunner, KekClient, MediaInfoCli,
    Provider, ProviderOutcome, RentryClient, RetryPolicy, SanitizedConfig, SnapshotOptions,
    SnapshotPipeline, TelegramNotifier, TorrentPackager, UploadOrchestrator,
};

#[derive(Debug, Parser)]
#[command(name = "seedpost", version, about = "Package releases and upload them to torrent providers")]
struct Cli {
    /// Configuration file (default: $SEEDPOST_CONFIG or ./seedpost.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Package and upload one or more releases
    Up(UpArgs),
    /// List upload categories
    Categories,
}

#[derive(Debug, Args)]
struct UpArgs {
    /// Media files or release directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Category code, provider id or label
    #[arg(short, long)]
    category: String,

    #[arg(long)]
    uncensored: bool,
    #[arg(long)]
    multi_subs: bool,
    #[arg(long)]
    dual_audio: bool,
    #[arg(long)]
    multi_audio: bool,
    /// Do not derive audio and subtitle tags from the tracks
    #[arg(long)]
    no_auto: bool,

    #[arg(long)]
    anonymous: bool,
    #[arg(long)]
    hidden: bool,
    #[arg(long)]
    complete: bool,
    #[arg(long)]
    remake: bool,

    /// Package and describe without uploading
    #[arg(long)]
    skip_upload: bool,
    /// Copy uploaded torrents into this directory
    #[arg(long)]
    watch_dir: Option<PathBuf>,
    /// Edit code of the media report paste
    #[arg(long)]
    edit_code: Option<String>,
    /// Information link
    #[arg(short, long)]
    info: Option<String>,
    /// Quoted at the top of the description
    #[arg(long)]
    note: Option<String>,
    #[arg(long)]
    advert: Option<String>,
    /// Catalog page to take metadata from
    #[arg(long)]
    link: Option<String>,
    /// Send a Telegram notification
    #[arg(long)]
    telegram: bool,
    #[arg(long)]
    skip_metadata: bool,
    /// Number of snapshots (0 disables them)
    #[arg(long)]
    pictures_number: Option<usize>,
    #[arg(long)]
    picture_extension: Option<String>,
    /// Do not publish the full media report
    #[arg(long)]
    no_mediainfo: bool,
    /// Regenerate an existing torrent
    #[arg(long)]
    overwrite: bool,
}

impl UpArgs {
    fn job_options(&self, config: &Config, category: Category) -> JobOptions {
        let mut options = JobOptions::from_config(config, category);

        options.tags.uncensored = self.uncensored;
        options.tags.multi_subs = self.multi_subs;
        options.tags.dual_audio = self.dual_audio;
        options.tags.multi_audio = self.multi_audio;
        options.tags.auto = !self.no_auto;

        options.flags.anonymous = self.anonymous;
        options.flags.hidden = self.hidden;
        options.flags.complete = self.complete;
        options.flags.remake = self.remake;

        if self.note.is_some() {
            options.note = self.note.clone();
        }
        if self.advert.is_some() {
            options.advert = self.advert.clone();
        }
        if self.info.is_some() {
            options.info = self.info.clone();
        }
        if self.edit_code.is_some() {
            options.edit_code = self.edit_code.clone();
        }
        options.metadata_link = self.link.clone();
        options.metadata &= !self.skip_metadata;
        options.media_report &= !self.no_mediainfo;
        options.overwrite = self.overwrite;
        options.skip_upload = self.skip_upload;
        options
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Returns whether every job and provider succeeded.
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Categories => {
            print_categories();
            Ok(true)
        }
        Command::Up(args) => {
            let config = load_and_validate(cli.config)?;
            up(&config, &args).await
        }
    }
}

fn print_categories() {
    for category in Category::ALL {
        println!(
            "{:>2}  {:<4} {}",
            category.code(),
            category.provider_id(),
            category.label()
        );
    }
}

fn load_and_validate(explicit: Option<PathBuf>) -> Result<Config> {
    let config_path = resolve_config_path(explicit.as_deref());
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    debug!(
        config = %serde_json::to_string(&sanitized).unwrap_or_default(),
        "Configuration loaded"
    );
    Ok(config)
}

async fn up(config: &Config, args: &UpArgs) -> Result<bool> {
    let category: Category = args.category.parse()?;
    let runner = build_runner(config, args)?;
    let options = args.job_options(config, category);

    let mut all_ok = true;
    for path in &args.paths {
        match runner.run(path, &options).await {
            Ok(report) => {
                print_report(&report);
                all_ok &= report.is_success();
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    stage = e.category(),
                    error = %e,
                    "Job failed"
                );
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn build_runner(config: &Config, args: &UpArgs) -> Result<JobRunner> {
    let prefs = &config.preferences;

    let providers = config
        .providers
        .iter()
        .map(Provider::from_config)
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid provider configuration")?;

    let packager =
        TorrentPackager::from_config(&config.torrent).context("Failed to create packager")?;
    info!("Using torrent backend: {}", packager.backend_name());

    let api = HttpProviderApi::new(config.upload.timeout_secs)
        .context("Failed to create provider client")?;
    let mut orchestrator = UploadOrchestrator::new(
        Arc::new(api),
        RetryPolicy::exponential(
            config.upload.submit_attempts,
            Duration::from_millis(config.upload.submit_backoff_ms),
        ),
        RetryPolicy::fixed(
            config.upload.edit_attempts,
            Duration::from_millis(config.upload.edit_delay_ms),
        ),
    );

    if let Some(watch_dir) = args.watch_dir.clone().or_else(|| prefs.watch_dir.clone()) {
        orchestrator = orchestrator.with_watch_dir(watch_dir);
    }

    if args.telegram || prefs.telegram {
        match &config.telegram {
            Some(telegram) => {
                let notifier =
                    TelegramNotifier::new(telegram).context("Failed to create notifier")?;
                orchestrator = orchestrator.with_notifier(Arc::new(notifier));
            }
            None => warn!("Telegram notifications requested but [telegram] is not configured"),
        }
    }

    let probe = Arc::new(MediaInfoCli::new(config.probe.mediainfo_path.clone()));
    let mut runner = JobRunner::new(
        probe,
        packager,
        orchestrator,
        providers,
        config.cache_dir.clone(),
    );

    let mut snapshots = config.snapshots.clone();
    if let Some(count) = args.pictures_number {
        snapshots.count = count;
    }
    if let Some(extension) = &args.picture_extension {
        snapshots.extension = extension.trim_start_matches('.').to_string();
    }
    if snapshots.count > 0 {
        let host = KekClient::new(&config.image_host).context("Failed to create image host")?;
        runner = runner.with_snapshots(SnapshotPipeline::new(
            Arc::new(FfmpegExtractor::new(snapshots.ffmpeg_path.clone())),
            Arc::new(host),
            SnapshotOptions::from_config(&snapshots, prefs.random_snapshots),
        ));
    }

    let paste = RentryClient::new(&config.paste).context("Failed to create paste client")?;
    runner = runner.with_paste(Arc::new(paste));

    let resolver =
        JikanResolver::new(&config.metadata).context("Failed to create metadata resolver")?;
    runner = runner.with_resolver(
        Arc::new(resolver),
        RetryPolicy::exponential(
            config.metadata.max_attempts,
            Duration::from_millis(config.metadata.backoff_ms),
        ),
    );

    Ok(runner)
}

fn print_report(report: &JobReport) {
    println!();
    println!("{}", report.display_name);
    println!("  torrent: {}", report.torrent.path.display());
    if !report.information.is_empty() {
        println!("  information: {}", report.information);
    }
    if let Some(url) = &report.media_report_url {
        println!("  media report: {}", url);
    }
    for outcome in &report.outcomes {
        match outcome {
            ProviderOutcome::Succeeded {
                provider,
                result,
                edited,
            } => {
                println!("  {}: {} ({})", provider, result.url, result.download_url);
                if *edited {
                    println!("  {}: snapshots attached", provider);
                }
            }
            ProviderOutcome::Failed { provider, error } => {
                println!("  {}: FAILED ({})", provider, error);
            }
        }
    }
}
