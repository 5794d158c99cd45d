//! Status Board 主程序入口
//!
//! 服务状态页

use anyhow::{Context, Result};
use clap::Parser;
use status_board::cli::args::{Args, Commands};
use status_board::cli::commands::{
    load_config, CheckCommand, Command, InitCommand, ServeCommand, ValidateCommand,
    VersionCommand,
};
use status_board::config::Config;
use status_board::logging::{LogConfig, LoggingSystem};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 需要服务列表的命令先加载配置，日志级别可能来自配置文件
    let config = if args.needs_config() {
        Some(load_config(&args).await.context("加载配置失败")?)
    } else {
        None
    };

    // 初始化日志系统
    let log_config = build_log_config(&args, config.as_ref());
    let logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("Status Board v{} 启动", status_board::VERSION);
    if logging_system.writes_to_file() {
        info!("日志写入文件: {:?}", args.log_file);
    }
    if let Some(config) = &config {
        info!("配置加载完成，服务数量: {}", config.services.len());
    }

    // 执行命令
    if let Err(e) = execute_command(&args, config).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 命令行级别优先，其次是配置文件中的 global.log_level
fn build_log_config(args: &Args, config: Option<&Config>) -> LogConfig {
    let mut log_config = LogConfig {
        console: args.log_file.is_none(),
        file_path: args.log_file.clone(),
        json_format: args.json_logs,
        ..Default::default()
    };

    if let Some(level) = &args.log_level {
        log_config.level = level.clone().into();
    } else if let Some(config) = config {
        log_config = log_config.with_level_str(&config.global.log_level);
    }

    log_config
}

/// 执行CLI命令
async fn execute_command(args: &Args, config: Option<Config>) -> Result<()> {
    let config = config.unwrap_or_default();
    match &args.command {
        Commands::Serve { .. } => {
            let command = ServeCommand::new(config);
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
        Commands::Check { .. } => {
            let command = CheckCommand::new(config);
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
        Commands::Init { .. } => {
            let command = InitCommand;
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
        Commands::Validate { .. } => {
            let command = ValidateCommand;
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
        Commands::Version { .. } => {
            let command = VersionCommand;
            command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
        }
    }
}
