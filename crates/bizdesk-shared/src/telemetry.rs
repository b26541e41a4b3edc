//! Native `tracing` setup used by test runs and desktop tooling. In the
//! browser the embedding front end installs its own subscriber

use anyhow::Context;
use std::{
    fs::{create_dir_all, File},
    path::{Path, PathBuf},
};
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

/// Folder, relative to the working directory, that trace files are written to
pub const TRACE_FOLDER: &str = "traces";

/// Builds a subscriber that writes bunyan formatted JSON lines to `sink`
///
/// `RUST_LOG` takes precedence over `default_directive` when set. See
/// <https://docs.rs/tracing-subscriber/0.3.19/tracing_subscriber/filter/struct.EnvFilter.html#directives>
pub fn get_subscriber<Sink, S>(
    name: String,
    default_directive: S,
    sink: Sink,
) -> impl Subscriber + Sync + Send
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    S: AsRef<str>,
{
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    Registry::default()
        .with(filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name, sink))
}

/// Installs `subscriber` for the whole process and routes `log` records
/// through it. Fails if called a second time
pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> anyhow::Result<()> {
    LogTracer::init().context("failed to install the log bridge")?;
    tracing::subscriber::set_global_default(subscriber)
        .context("a global subscriber is already set")?;
    Ok(())
}

/// Creates `traces/<timestamp>_<app_name>.log` and returns it with its path
pub fn create_trace_file(app_name: &str) -> anyhow::Result<(File, PathBuf)> {
    let folder = Path::new(TRACE_FOLDER);
    create_dir_all(folder)
        .with_context(|| format!("failed to create trace folder {folder:?}"))?;
    let path = folder.join(trace_file_name(app_name, chrono::Local::now()));
    let file =
        File::create(&path).with_context(|| format!("failed to create trace file {path:?}"))?;
    Ok((file, path))
}

fn trace_file_name<Tz>(app_name: &str, now: chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{app_name}.log", now.format("%Y-%m-%dT%H-%M-%S"))
}
