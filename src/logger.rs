use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use std::sync::OnceLock;

/// Route log lines through the progress bars so spinners and logs don't
/// clobber each other
pub struct Logger {
    multi_progress: MultiProgress,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

impl Logger {
    pub fn init() -> &'static Self {
        LOGGER.get_or_init(|| {
            // Quiet by default, "export RUST_LOG=debug" shows the SDK conversation
            let logger = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("off"),
            )
            .build();

            let level = logger.filter();
            let multi_progress = MultiProgress::new();

            LogWrapper::new(multi_progress.clone(), logger).try_init().ok();
            log::set_max_level(level);

            Logger { multi_progress }
        })
    }

    pub fn multi_progress() -> &'static MultiProgress {
        &Self::init().multi_progress
    }
}
