//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{
    render_config_template, validate_config, Config, ConfigLoader, ServiceDescriptor,
    TomlConfigLoader,
};
use crate::error::{ConfigError, Result, StatusBoardError};
use crate::health::{HealthChecker, ProbeState, Snapshot, StatusView};
use crate::web::WebServer;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 加载服务配置
///
/// 显式指定的配置文件必须存在；未指定且默认位置没有文件时使用内置服务列表。
pub async fn load_config(args: &Args) -> Result<Config> {
    let config_path = args.get_config_path();
    let loader = TomlConfigLoader::new(true);

    if !args.has_explicit_config() && !config_path.exists() {
        return Ok(Config::default());
    }

    loader.load_from_file(&config_path).await
}

/// 把命令行覆盖项合并进配置并重新验证
pub fn apply_overrides(
    config: &mut Config,
    bind: Option<&str>,
    port: Option<u16>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    if let Some(bind) = bind {
        config.global.web.bind_address = bind.to_string();
    }
    if let Some(port) = port {
        config.global.web.port = port;
    }
    if let Some(timeout) = timeout_secs {
        config.global.request_timeout_seconds = timeout;
    }

    validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
}

/// 收到 Ctrl-C 时触发取消
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("收到中断信号");
            token.cancel();
        }
    });
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Init { config_path, force } = &args.command {
            self.create_config_file(config_path, *force).await
        } else {
            Ok(())
        }
    }
}

impl InitCommand {
    /// 写入包含内置服务列表的配置文件
    async fn create_config_file(&self, config_path: &Path, force: bool) -> Result<()> {
        if config_path.exists() && !force {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = render_config_template(&Config::default())?;
        tokio::fs::write(config_path, content).await?;

        println!("配置文件已创建: {}", config_path.display());
        println!("请编辑配置文件以添加您的服务配置");

        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        {
            let config_file = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, *verbose).await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(config_path).await?;

        if verbose {
            println!("配置验证通过！");
            println!("全局配置:");
            println!("  日志级别: {}", config.global.log_level);
            println!("  探测超时: {}秒", config.global.request_timeout_seconds);
            println!(
                "  监听地址: {}:{}",
                config.global.web.bind_address, config.global.web.port
            );

            println!("服务配置:");
            for (i, service) in config.services.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, service.name, service.url);
                if let Some(description) = &service.description {
                    println!("     描述: {description}");
                }
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 找到 {} 个服务配置", config.services.len());
        }

        Ok(())
    }
}

/// 启动 Web 服务命令
pub struct ServeCommand {
    /// 已加载的配置
    config: Config,
}

impl ServeCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Command for ServeCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let mut config = self.config.clone();
        if let Commands::Serve {
            bind,
            port,
            timeout,
        } = &args.command
        {
            apply_overrides(&mut config, bind.as_deref(), *port, *timeout)?;
        }

        if config.services.is_empty() {
            warn!("没有配置任何服务，状态页将为空");
        }

        let checker = HealthChecker::http(config.global.request_timeout())?;
        let shutdown = CancellationToken::new();
        cancel_on_ctrl_c(shutdown.clone());

        WebServer::new(&config, checker, shutdown).start().await
    }
}

/// 一次性检测命令
pub struct CheckCommand {
    /// 已加载的配置
    config: Config,
}

/// JSON 输出中的一行
#[derive(Debug, Serialize)]
struct CheckReportEntry {
    #[serde(flatten)]
    view: StatusView,
    state: ProbeState,
    response_time_ms: u64,
}

/// JSON 输出
#[derive(Debug, Serialize)]
struct CheckReport {
    generated_at: String,
    services: Vec<CheckReportEntry>,
}

impl CheckCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 按名称筛选服务，指定的名称不存在时返回错误
    fn select_services(&self, service_name: Option<&str>) -> Result<Vec<ServiceDescriptor>> {
        let Some(name) = service_name else {
            return Ok(self.config.services.clone());
        };

        let selected: Vec<_> = self
            .config
            .services
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect();

        if selected.is_empty() {
            return Err(StatusBoardError::ServiceNotFound {
                name: name.to_string(),
            });
        }
        Ok(selected)
    }

    /// 合并命令行超时，与 serve 使用相同的校验
    fn probe_timeout(&self, timeout_secs: Option<u64>) -> Result<Duration> {
        let mut config = self.config.clone();
        apply_overrides(&mut config, None, None, timeout_secs)?;
        Ok(config.global.request_timeout())
    }

    /// 打印文本格式结果
    fn print_text_results(&self, snapshot: &Snapshot) {
        for record in snapshot.records() {
            let status_icon = if record.state().is_online() {
                "✓"
            } else {
                "✗"
            };
            println!(
                "{} {} ({}) - {} - {}ms",
                status_icon,
                record.name(),
                record.url(),
                record.state(),
                record.response_time_ms()
            );
        }
        println!(
            "检测时间 {}：{} 个在线，{} 个离线",
            snapshot.generated_at_display(),
            snapshot.online_count(),
            snapshot.offline_count()
        );
    }

    /// 打印JSON格式结果
    fn print_json_results(&self, snapshot: &Snapshot) -> Result<()> {
        let report = CheckReport {
            generated_at: snapshot.generated_at_display(),
            services: snapshot
                .records()
                .iter()
                .map(|record| CheckReportEntry {
                    view: record.to_view(),
                    state: record.state(),
                    response_time_ms: record.response_time_ms(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Check {
            service,
            format,
            timeout,
        } = &args.command
        else {
            return Ok(());
        };

        let services = self.select_services(service.as_deref())?;
        let probe_timeout = self.probe_timeout(*timeout)?;
        if services.is_empty() {
            eprintln!("未找到任何服务");
            return Ok(());
        }

        let checker = HealthChecker::http(probe_timeout)?;

        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(cancel.clone());

        let snapshot = checker
            .check_all_with_cancel(&services, probe_timeout, &cancel)
            .await;

        match format {
            OutputFormat::Json => self.print_json_results(&snapshot),
            OutputFormat::Text => {
                self.print_text_results(&snapshot);
                Ok(())
            }
        }
    }
}
