//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// 主配置结构，包含全局配置和服务列表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 监控的服务列表，顺序即页面展示顺序
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
}

impl Default for Config {
    /// 内置的默认服务列表
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            services: vec![
                ServiceDescriptor::new("Google", "https://www.google.com"),
                ServiceDescriptor::new("GitHub", "https://www.github.com"),
                ServiceDescriptor::new("RNP", "https://www.rnp.br"),
                ServiceDescriptor::new("Status Board", "http://localhost:5000"),
            ],
        }
    }
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 单次探测超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// Web 服务器配置
    #[serde(default)]
    pub web: WebConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_timeout(),
            web: WebConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// 探测超时时间
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// 服务描述，启动后只读
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// 服务名称
    pub name: String,
    /// 服务URL
    pub url: String,
    /// 服务描述
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: None,
        }
    }

    /// 设置服务描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Web 服务器配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebConfig {
    /// 监听端口
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 绑定地址
    #[serde(default = "default_web_bind_address")]
    pub bind_address: String,
    /// 页面标题
    #[serde(default = "default_web_title")]
    pub title: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            bind_address: default_web_bind_address(),
            title: default_web_title(),
        }
    }
}

impl WebConfig {
    /// 解析监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| format!("无效的监听地址 {}:{}: {}", self.bind_address, self.port, e))
    }
}

// 默认值函数
fn default_log_level() -> String {
    "info".to_string()
}
fn default_timeout() -> u64 {
    5
}
fn default_web_port() -> u16 {
    5000
}
fn default_web_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_web_title() -> String {
    "Service Status".to_string()
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.global.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    // 验证日志级别
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    let web = &config.global.web;
    if web.port == 0 {
        return Err("无效的Web服务器端口: 0，端口不能为0".to_string());
    }
    if web.bind_address.trim().is_empty() {
        return Err("Web服务器绑定地址不能为空".to_string());
    }

    // 空服务列表和重名服务都是合法的，行按列表位置区分
    for service in &config.services {
        if service.name.trim().is_empty() {
            return Err("服务名称不能为空".to_string());
        }

        match reqwest::Url::parse(&service.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(format!("服务 {} 的URL格式无效", service.name)),
        }
    }

    Ok(())
}
