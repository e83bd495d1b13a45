use env_logger::{Builder, WriteStyle};
use log::error;
use std::process::ExitCode;
use sysinsight::config::AppConfig;
use sysinsight::error::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration first (without logging)
    let config = AppConfig::new().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {:#}", e);
        // Fall back to default configuration
        AppConfig::default()
    });

    Builder::new()
        .filter_level(config.get_log_level())
        .write_style(WriteStyle::Always)
        .format_timestamp_secs()
        .init();

    match sysinsight::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(AppError::Config(message)) = e.downcast_ref::<AppError>() {
                error!("Configuration error: {}", message);
            } else {
                error!("Application error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}
