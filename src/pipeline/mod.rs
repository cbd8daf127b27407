//! Background update runs.
//!
//! [`UpdatePipeline::start`] checks the shared config, then hands the run to
//! a dedicated worker thread and returns an [`UpdateHandle`] at once. The
//! worker walks the stages
//!
//! ```text
//! Idle -> Fetching -> Deciding -> Downloading -> Expanding -> Merging -> Done
//! ```
//!
//! stopping at the first terminal status. Errors never leave the worker;
//! the caller only sees an [`UpdateStatus`]. When a completion callback is
//! given it receives the final [`UpdateReport`] through a
//! [`CompletionDispatcher`].
//!
//! # Example
//!
//! ```no_run
//! use plugin_updater::config::UpdateOptions;
//! use plugin_updater::pipeline::{queue, UpdatePipeline};
//!
//! let options = UpdateOptions::new(
//!     31043,
//!     "1.0",
//!     "plugins/MyPlugin.jar",
//!     "plugins/update",
//!     "plugins",
//! )
//! .with_config_path("plugins/Updater/config.yml");
//!
//! let (dispatcher, callbacks) = queue();
//! let handle = UpdatePipeline::start(
//!     options,
//!     dispatcher,
//!     Some(Box::new(|report| println!("update finished: {}", report.status))),
//! );
//!
//! // later, on the host thread
//! callbacks.run_pending();
//! println!("latest release: {:?}", handle.latest_name());
//! ```

pub mod dispatch;
pub mod handle;
mod runner;
pub mod status;

use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, error, warn};

use crate::config::{UpdateOptions, UpdaterConfig};
use crate::fetch::{MetadataClient, UpdateMetadata};
use runner::Run;

pub use dispatch::{queue, CallbackQueue, CompletionDispatcher, InlineDispatcher, QueueDispatcher};
pub use handle::{UpdateHandle, UpdateReport};
pub use status::{Stage, UpdateStatus};

/// Completion callback, called once with the final report.
pub type Callback = Box<dyn FnOnce(&UpdateReport) + Send + 'static>;

/// Entry point for update runs.
pub struct UpdatePipeline;

impl UpdatePipeline {
    /// Start a run without blocking the caller.
    ///
    /// Disabled configurations and project ids that cannot form a feed URL
    /// finish immediately without a worker thread; the callback is still
    /// dispatched.
    pub fn start<D>(
        options: UpdateOptions,
        dispatcher: D,
        callback: Option<Callback>,
    ) -> UpdateHandle
    where
        D: CompletionDispatcher + 'static,
    {
        let config = load_config(&options);

        if config.disable {
            debug!("Updates are disabled in the updater configuration");
            return finish_now(UpdateStatus::Disabled, &dispatcher, callback);
        }

        let client = match MetadataClient::new(&options, config.api_key()) {
            Ok(client) => client,
            Err(e) => {
                error!("Could not create the release feed client: {}", e);
                return finish_now(UpdateStatus::FailRemoteUnreachable, &dispatcher, callback);
            }
        };

        if let Err(e) = client.query_url(options.project_id) {
            warn!("{}", e);
            return finish_now(UpdateStatus::FailBadId, &dispatcher, callback);
        }

        let project_id = options.project_id;
        let spawned = thread::Builder::new()
            .name(format!("updater-{}", project_id))
            .spawn(move || {
                let run = Run::new(options, client);
                work(project_id, || run.execute(), &dispatcher, callback)
            });

        match spawned {
            Ok(worker) => UpdateHandle::spawned(worker),
            Err(e) => {
                // the closure (and with it the callback) is gone at this point
                error!("Could not start the updater worker: {}", e);
                UpdateHandle::finished(UpdateReport::new(UpdateStatus::FailDownload, None))
            }
        }
    }
}

/// Read the shared config, falling back to defaults on any problem.
fn load_config(options: &UpdateOptions) -> UpdaterConfig {
    let Some(path) = &options.config_path else {
        return UpdaterConfig::default();
    };

    UpdaterConfig::load_or_create(path).unwrap_or_else(|e| {
        warn!("The updater could not load its configuration: {}", e);
        UpdaterConfig::default()
    })
}

/// Body of the worker thread: run the stages, then hand over the report.
///
/// A panic in the stages becomes `FailDownload`. The report is fixed before
/// the callback is delivered, so a panicking callback cannot change it.
fn work<F>(
    project_id: u32,
    stages: F,
    dispatcher: &dyn CompletionDispatcher,
    callback: Option<Callback>,
) -> UpdateReport
where
    F: FnOnce() -> (UpdateStatus, Option<UpdateMetadata>),
{
    let report = match panic::catch_unwind(AssertUnwindSafe(stages)) {
        Ok((status, metadata)) => UpdateReport::new(status, metadata),
        Err(_) => {
            error!("The updater worker for project {} panicked", project_id);
            UpdateReport::new(UpdateStatus::FailDownload, None)
        }
    };
    deliver(dispatcher, callback, &report);
    report
}

fn finish_now(
    status: UpdateStatus,
    dispatcher: &dyn CompletionDispatcher,
    callback: Option<Callback>,
) -> UpdateHandle {
    let report = UpdateReport::new(status, None);
    deliver(dispatcher, callback, &report);
    UpdateHandle::finished(report)
}

fn deliver(
    dispatcher: &dyn CompletionDispatcher,
    callback: Option<Callback>,
    report: &UpdateReport,
) {
    let Some(callback) = callback else {
        return;
    };

    let report = report.clone();
    let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
        dispatcher.dispatch(Box::new(move || callback(&report)));
    }));
    if delivered.is_err() {
        error!("The update completion callback panicked");
    }
}
