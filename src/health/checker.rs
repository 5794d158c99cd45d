//! HTTP健康检测器实现
//!
//! 对服务列表并发发起一次探测，按输入顺序汇总为快照

use crate::config::ServiceDescriptor;
use crate::error::{Result, StatusBoardError};
use crate::health::result::{ProbeState, Snapshot, StatusRecord, UnexpectedFault};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{redirect, Client, Url};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 默认探测超时时间
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// 最大重定向次数
const MAX_REDIRECTS: usize = 10;

/// 单次探测接口
///
/// 实现方必须把所有故障归类为 [`ProbeState`]，不能返回错误。
#[async_trait]
pub trait Prober: Send + Sync {
    /// 对 `url` 发起一次探测
    ///
    /// # 参数
    /// * `url` - 目标地址
    /// * `timeout` - 本次探测的超时时间
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeState;
}

/// 基于 reqwest 的 HTTP GET 探测器
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// HTTP客户端
    client: Client,
}

impl HttpProber {
    /// 创建新的HTTP探测器
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| StatusBoardError::Other(anyhow::anyhow!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self { client })
    }

    /// 解析并检查目标地址，只接受 http/https
    fn parse_url(url: &str) -> std::result::Result<Url, UnexpectedFault> {
        let parsed = Url::parse(url).map_err(|_| UnexpectedFault::InvalidUrl)?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            _ => Err(UnexpectedFault::UnsupportedScheme),
        }
    }

    /// 将请求错误归类为探测状态
    fn classify_error(error: &reqwest::Error) -> ProbeState {
        if error.is_builder() {
            ProbeState::OfflineUnexpected(UnexpectedFault::InvalidUrl)
        } else if error.is_redirect() {
            ProbeState::OfflineUnexpected(UnexpectedFault::Redirect)
        } else if error.is_timeout() || error.is_connect() || error.is_request() {
            // DNS、拒绝连接、TLS 握手失败以及响应前断开都属于连接层故障
            ProbeState::OfflineConnection
        } else {
            ProbeState::OfflineUnexpected(UnexpectedFault::Other)
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeState {
        let target = match Self::parse_url(url) {
            Ok(target) => target,
            Err(fault) => {
                debug!(url, %fault, "目标地址无效，跳过请求");
                return ProbeState::OfflineUnexpected(fault);
            }
        };

        match self.client.get(target).timeout(timeout).send().await {
            Ok(response) => ProbeState::from_status_code(response.status().as_u16()),
            Err(e) => {
                let state = Self::classify_error(&e);
                debug!(url, error = %e, %state, "探测请求失败");
                state
            }
        }
    }
}

/// 健康检测器：每次调用独立完成一轮检测，不保留任何状态
#[derive(Clone)]
pub struct HealthChecker {
    /// 探测器
    prober: Arc<dyn Prober>,
    /// 默认超时时间
    default_timeout: Duration,
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthChecker")
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

impl HealthChecker {
    /// 使用指定探测器创建检测器
    ///
    /// # 参数
    /// * `prober` - 探测器实现
    /// * `default_timeout` - 默认超时时间，必须大于0
    pub fn new(prober: Arc<dyn Prober>, default_timeout: Duration) -> Result<Self> {
        if default_timeout.is_zero() {
            return Err(StatusBoardError::Config(
                crate::error::ConfigError::ValidationError("探测超时时间必须大于0".to_string()),
            ));
        }

        Ok(Self {
            prober,
            default_timeout,
        })
    }

    /// 创建使用 HTTP 探测器的检测器
    pub fn http(default_timeout: Duration) -> Result<Self> {
        Self::new(Arc::new(HttpProber::new()?), default_timeout)
    }

    /// 默认超时时间
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// 检测所有服务
    ///
    /// 返回的快照长度与 `descriptors` 相同，顺序一致。单个服务的任何故障
    /// 都会被记录为离线状态，整个调用不会失败。
    pub async fn check_all(&self, descriptors: &[ServiceDescriptor], timeout: Duration) -> Snapshot {
        self.check_all_with_cancel(descriptors, timeout, &CancellationToken::new())
            .await
    }

    /// 检测所有服务，支持由调用方取消
    ///
    /// `cancel` 被触发后，尚未完成的探测立即记为
    /// `OfflineUnexpected(Cancelled)`，快照依然完整。丢弃返回的 future
    /// 同样会取消本轮所有探测任务。
    pub async fn check_all_with_cancel(
        &self,
        descriptors: &[ServiceDescriptor],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Snapshot {
        let limit = self.effective_timeout(timeout);
        let started = Instant::now();

        let round = cancel.child_token();
        let _guard = round.clone().drop_guard();

        // 每个服务一个任务，按下标收集结果
        let handles: Vec<_> = descriptors
            .iter()
            .map(|descriptor| {
                let prober = Arc::clone(&self.prober);
                let url = descriptor.url.clone();
                let token = round.clone();
                tokio::spawn(async move { probe_once(prober.as_ref(), &url, limit, &token).await })
            })
            .collect();

        let outcomes = join_all(handles).await;

        let records: Vec<StatusRecord> = descriptors
            .iter()
            .zip(outcomes)
            .map(|(descriptor, outcome)| {
                let (state, elapsed) = outcome.unwrap_or_else(|e| {
                    warn!(service = %descriptor.name, error = %e, "探测任务异常终止");
                    (
                        ProbeState::OfflineUnexpected(UnexpectedFault::ProbeFailed),
                        Duration::ZERO,
                    )
                });

                debug!(
                    service = %descriptor.name,
                    url = %descriptor.url,
                    %state,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "探测完成"
                );

                StatusRecord::new(descriptor.name.clone(), descriptor.url.clone(), state, elapsed)
            })
            .collect();

        let snapshot = Snapshot::new(records);

        info!(
            total = snapshot.len(),
            online = snapshot.online_count(),
            offline = snapshot.offline_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "本轮检测完成"
        );

        snapshot
    }

    /// 零超时视为未指定，回退到默认值
    fn effective_timeout(&self, requested: Duration) -> Duration {
        if requested.is_zero() {
            warn!(
                default_ms = self.default_timeout.as_millis() as u64,
                "探测超时为0，使用默认超时"
            );
            self.default_timeout
        } else {
            requested
        }
    }
}

/// 执行一次带超时和取消的探测
async fn probe_once(
    prober: &dyn Prober,
    url: &str,
    limit: Duration,
    cancel: &CancellationToken,
) -> (ProbeState, Duration) {
    let start = Instant::now();

    let state = tokio::select! {
        biased;
        _ = cancel.cancelled() => ProbeState::OfflineUnexpected(UnexpectedFault::Cancelled),
        outcome = timeout(limit, prober.probe(url, limit)) => {
            outcome.unwrap_or(ProbeState::OfflineConnection)
        }
    };

    (state, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 按 URL 返回预设结果的探测器
    struct ScriptedProber {
        script: HashMap<String, (Duration, ProbeState)>,
    }

    impl ScriptedProber {
        fn new(entries: &[(&str, u64, ProbeState)]) -> Arc<Self> {
            let script = entries
                .iter()
                .map(|(url, delay_ms, state)| {
                    (url.to_string(), (Duration::from_millis(*delay_ms), *state))
                })
                .collect();
            Arc::new(Self { script })
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, url: &str, _timeout: Duration) -> ProbeState {
            let (delay, state) = self.script[url];
            tokio::time::sleep(delay).await;
            state
        }
    }

    struct PanickingProber;

    #[async_trait]
    impl Prober for PanickingProber {
        async fn probe(&self, url: &str, _timeout: Duration) -> ProbeState {
            if url.contains("boom") {
                panic!("probe exploded");
            }
            ProbeState::Online
        }
    }

    fn descriptors(urls: &[&str]) -> Vec<ServiceDescriptor> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| ServiceDescriptor::new(format!("svc-{i}"), *url))
            .collect()
    }

    fn states(snapshot: &Snapshot) -> Vec<ProbeState> {
        snapshot.records().iter().map(StatusRecord::state).collect()
    }

    #[test]
    fn test_zero_default_timeout_rejected() {
        let prober = ScriptedProber::new(&[]);
        assert!(HealthChecker::new(prober, Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_http_checker_creation() {
        let checker = HealthChecker::http(DEFAULT_PROBE_TIMEOUT).unwrap();
        assert_eq!(checker.default_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_empty_descriptor_list() {
        let checker = HealthChecker::new(ScriptedProber::new(&[]), DEFAULT_PROBE_TIMEOUT).unwrap();
        let snapshot = checker.check_all(&[], DEFAULT_PROBE_TIMEOUT).await;

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.generated_at_display().len(), 8);
    }

    #[tokio::test]
    async fn test_order_follows_input_not_completion() {
        let prober = ScriptedProber::new(&[
            ("http://slow", 80, ProbeState::OfflineHttp(500)),
            ("http://medium", 40, ProbeState::OfflineConnection),
            ("http://fast", 0, ProbeState::Online),
        ]);
        let checker = HealthChecker::new(prober, DEFAULT_PROBE_TIMEOUT).unwrap();
        let input = descriptors(&["http://slow", "http://medium", "http://fast"]);

        let snapshot = checker.check_all(&input, Duration::from_secs(1)).await;

        let names: Vec<_> = snapshot.records().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["svc-0", "svc-1", "svc-2"]);
        assert_eq!(
            states(&snapshot),
            vec![
                ProbeState::OfflineHttp(500),
                ProbeState::OfflineConnection,
                ProbeState::Online
            ]
        );
    }

    #[tokio::test]
    async fn test_timeout_in_the_middle() {
        let prober = ScriptedProber::new(&[
            ("http://a", 0, ProbeState::Online),
            ("http://b", 10_000, ProbeState::Online),
            ("http://c", 0, ProbeState::OfflineHttp(404)),
        ]);
        let checker = HealthChecker::new(prober, DEFAULT_PROBE_TIMEOUT).unwrap();
        let input = descriptors(&["http://a", "http://b", "http://c"]);

        let started = Instant::now();
        let snapshot = checker.check_all(&input, Duration::from_millis(100)).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(
            states(&snapshot),
            vec![
                ProbeState::Online,
                ProbeState::OfflineConnection,
                ProbeState::OfflineHttp(404)
            ]
        );
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let prober = ScriptedProber::new(&[
            ("http://a", 300, ProbeState::Online),
            ("http://b", 300, ProbeState::Online),
            ("http://c", 300, ProbeState::Online),
            ("http://d", 300, ProbeState::Online),
        ]);
        let checker = HealthChecker::new(prober, DEFAULT_PROBE_TIMEOUT).unwrap();
        let input = descriptors(&["http://a", "http://b", "http://c", "http://d"]);

        let started = Instant::now();
        let snapshot = checker.check_all(&input, Duration::from_secs(2)).await;

        assert_eq!(snapshot.online_count(), 4);
        // 串行执行至少需要 1200ms
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_cancellation_keeps_snapshot_complete() {
        let prober = ScriptedProber::new(&[
            ("http://fast", 0, ProbeState::Online),
            ("http://hang-1", 10_000, ProbeState::Online),
            ("http://hang-2", 10_000, ProbeState::Online),
        ]);
        let checker = HealthChecker::new(prober, DEFAULT_PROBE_TIMEOUT).unwrap();
        let input = descriptors(&["http://fast", "http://hang-1", "http://hang-2"]);

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let snapshot = checker
            .check_all_with_cancel(&input, Duration::from_secs(30), &token)
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        let cancelled = ProbeState::OfflineUnexpected(UnexpectedFault::Cancelled);
        assert_eq!(
            states(&snapshot),
            vec![ProbeState::Online, cancelled, cancelled]
        );
    }

    /// 记录启动和被丢弃次数的慢速探测器
    #[derive(Default)]
    struct TrackingProber {
        started: AtomicUsize,
        dropped: Arc<AtomicUsize>,
    }

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Prober for TrackingProber {
        async fn probe(&self, _url: &str, _timeout: Duration) -> ProbeState {
            self.started.fetch_add(1, Ordering::SeqCst);
            let _counter = DropCounter(Arc::clone(&self.dropped));
            tokio::time::sleep(Duration::from_secs(10)).await;
            ProbeState::Online
        }
    }

    #[tokio::test]
    async fn test_dropping_check_stops_inflight_probes() {
        let prober = Arc::new(TrackingProber::default());
        let checker = HealthChecker::new(prober.clone(), DEFAULT_PROBE_TIMEOUT).unwrap();
        let input = descriptors(&["http://a", "http://b"]);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            checker.check_all(&input, Duration::from_secs(30)),
        )
        .await;
        assert!(abandoned.is_err());

        let deadline = Instant::now() + Duration::from_secs(2);
        while prober.dropped.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(prober.started.load(Ordering::SeqCst), 2);
        assert_eq!(prober.dropped.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token() {
        let prober = ScriptedProber::new(&[("http://a", 50, ProbeState::Online)]);
        let checker = HealthChecker::new(prober, DEFAULT_PROBE_TIMEOUT).unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let snapshot = checker
            .check_all_with_cancel(&descriptors(&["http://a"]), DEFAULT_PROBE_TIMEOUT, &token)
            .await;
        assert_eq!(
            states(&snapshot),
            vec![ProbeState::OfflineUnexpected(UnexpectedFault::Cancelled)]
        );
    }

    #[tokio::test]
    async fn test_panicking_probe_is_isolated() {
        let checker = HealthChecker::new(Arc::new(PanickingProber), DEFAULT_PROBE_TIMEOUT).unwrap();
        let input = descriptors(&["http://ok", "http://boom", "http://ok-too"]);

        let snapshot = checker.check_all(&input, DEFAULT_PROBE_TIMEOUT).await;

        assert_eq!(
            states(&snapshot),
            vec![
                ProbeState::Online,
                ProbeState::OfflineUnexpected(UnexpectedFault::ProbeFailed),
                ProbeState::Online
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_timeout_falls_back_to_default() {
        let prober = ScriptedProber::new(&[("http://a", 50, ProbeState::Online)]);
        let checker = HealthChecker::new(prober, Duration::from_secs(1)).unwrap();

        let snapshot = checker
            .check_all(&descriptors(&["http://a"]), Duration::ZERO)
            .await;
        assert_eq!(states(&snapshot), vec![ProbeState::Online]);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_independent() {
        let prober = ScriptedProber::new(&[
            ("http://a", 0, ProbeState::OfflineHttp(503)),
            ("http://b", 0, ProbeState::Online),
        ]);
        let checker = HealthChecker::new(prober, DEFAULT_PROBE_TIMEOUT).unwrap();
        let input = descriptors(&["http://a", "http://b"]);

        let first = checker.check_all(&input, DEFAULT_PROBE_TIMEOUT).await;
        let second = checker.check_all(&input, DEFAULT_PROBE_TIMEOUT).await;

        assert_eq!(states(&first), states(&second));
        assert_eq!(input[0].url, "http://a");
    }

    #[test]
    fn test_parse_url() {
        assert!(HttpProber::parse_url("https://example.com/health").is_ok());
        assert_eq!(
            HttpProber::parse_url("not a url").unwrap_err(),
            UnexpectedFault::InvalidUrl
        );
        assert_eq!(
            HttpProber::parse_url("ftp://example.com").unwrap_err(),
            UnexpectedFault::UnsupportedScheme
        );
    }

    #[tokio::test]
    async fn test_http_prober_rejects_malformed_url_without_network() {
        let prober = HttpProber::new().unwrap();

        let state = prober.probe("://missing-scheme", Duration::from_secs(1)).await;
        assert_eq!(
            state,
            ProbeState::OfflineUnexpected(UnexpectedFault::InvalidUrl)
        );

        let state = prober.probe("file:///etc/passwd", Duration::from_secs(1)).await;
        assert_eq!(
            state,
            ProbeState::OfflineUnexpected(UnexpectedFault::UnsupportedScheme)
        );
    }
}
