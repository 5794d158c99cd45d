//! 错误处理模块
//!
//! 定义应用程序的统一错误类型。单个服务的探测失败不属于错误，
//! 它们会被归类为 [`crate::health::ProbeState`] 的某个变体。

use thiserror::Error;

/// Status Board 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum StatusBoardError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// Web 服务相关错误
    #[error("Web服务错误: {0}")]
    Web(String),

    /// 命令行指定的服务不在配置中
    #[error("未找到服务: {name}")]
    ServiceNotFound { name: String },

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, StatusBoardError>;
