//! Status Board - 服务状态页
//!
//! 对一组固定的服务地址发起 HTTP 探测并展示结果：
//! - 每次请求并发探测所有服务，结果按配置顺序排列
//! - 超时、连接失败和非 2xx 响应都归类为离线
//! - Web 状态页与 JSON 接口
//! - 命令行一次性检测
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod web;

// 重新导出主要类型
pub use config::{Config, GlobalConfig, ServiceDescriptor};
pub use error::StatusBoardError;
pub use health::{HealthChecker, ProbeState, Snapshot, StatusRecord};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
