pub mod category;
pub mod config;
pub mod description;
pub mod error;
pub mod job;
pub mod media;
pub mod metadata;
pub mod naming;
pub mod notify;
pub mod paste;
pub mod retry;
pub mod snapshot;
pub mod testing;
pub mod torrent;
pub mod upload;

pub use category::{Category, UnknownCategory};
pub use config::{
    load_config, load_config_from_str, resolve_config_path, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use error::JobError;
pub use job::{resolve_input, JobOptions, JobReport, JobRunner, ReleaseInput};
pub use media::{MediaInfoCli, MediaProbe, TrackSummary};
pub use metadata::{JikanResolver, MetadataResolver};
pub use naming::TagOptions;
pub use notify::{Notifier, TelegramNotifier};
pub use paste::{PasteService, RentryClient};
pub use retry::RetryPolicy;
pub use snapshot::{FfmpegExtractor, KekClient, SnapshotOptions, SnapshotPipeline};
pub use torrent::TorrentPackager;
pub use upload::{
    HttpProviderApi, Provider, ProviderOutcome, ReleaseFlags, UploadOrchestrator, UploadResult,
};
