//! Web服务器实现
//!
//! 提供HTTP服务器和优雅关闭

use super::{create_router, WebAppState};
use crate::config::Config;
use crate::error::{Result, StatusBoardError};
use crate::health::HealthChecker;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Web服务器
#[derive(Debug)]
pub struct WebServer {
    /// 共享状态
    state: WebAppState,
}

impl WebServer {
    /// 创建新的Web服务器
    ///
    /// # 参数
    /// * `config` - 完整配置，服务列表在此之后不再变化
    /// * `checker` - 健康检测器
    /// * `shutdown` - 关闭信号
    pub fn new(config: &Config, checker: HealthChecker, shutdown: CancellationToken) -> Self {
        let state = WebAppState::new(
            checker,
            config.services.clone(),
            config.global.request_timeout(),
            config.global.web.clone(),
            shutdown,
        );
        Self { state }
    }

    /// 配置中的监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.state.config.socket_addr().map_err(StatusBoardError::Web)
    }

    /// 绑定配置地址并启动
    pub async fn start(self) -> Result<()> {
        let addr = self.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| StatusBoardError::Web(format!("绑定地址 {} 失败: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// 在已绑定的监听器上运行，直到关闭信号触发
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(
            address = %addr,
            services = self.state.services.len(),
            "Web服务器已启动: http://{}",
            addr
        );

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("接收到关闭信号，正在关闭Web服务器...");
            })
            .await?;

        info!("Web服务器已关闭");
        Ok(())
    }
}
