//! Web界面模块
//!
//! 每个请求触发一轮检测，并把快照渲染为页面或 JSON

use crate::config::{ServiceDescriptor, WebConfig};
use crate::health::HealthChecker;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod server;

pub use server::WebServer;

/// Web 应用共享状态
#[derive(Debug, Clone)]
pub struct WebAppState {
    /// 健康检测器
    pub checker: HealthChecker,
    /// 监控的服务列表，启动后只读
    pub services: Arc<[ServiceDescriptor]>,
    /// 单次探测超时
    pub probe_timeout: Duration,
    /// Web配置
    pub config: WebConfig,
    /// 服务器关闭信号，取消时中止进行中的探测
    pub shutdown: CancellationToken,
}

impl WebAppState {
    /// 创建新的Web应用状态
    pub fn new(
        checker: HealthChecker,
        services: Vec<ServiceDescriptor>,
        probe_timeout: Duration,
        config: WebConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            checker,
            services: services.into(),
            probe_timeout,
            config,
            shutdown,
        }
    }
}

/// 创建路由
pub fn create_router(state: WebAppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/status", get(handlers::api_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
