use anyhow::Context;
use carwash_desk::config::LogFormat;
use carwash_desk::utils::error::ErrorSeverity;
use carwash_desk::utils::{logger, validation::Validate};
use carwash_desk::{start_server, AppState, CliConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 設定檔讀不到時 logger 還沒初始化，直接印到 stderr
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    };

    // 初始化日誌
    match config.logging.format {
        LogFormat::Json => logger::init_json_logger(config.logging.verbose),
        LogFormat::Compact => logger::init_cli_logger(config.logging.verbose),
    }

    tracing::info!("Starting carwash-desk");
    tracing::debug!("Resolved config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(e.severity()));
    }

    let state = AppState::from_config(&config).context("failed to initialize application state")?;

    start_server(&config, state)
        .await
        .context("server error")?;

    Ok(())
}

// 根據錯誤嚴重程度決定退出碼
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
