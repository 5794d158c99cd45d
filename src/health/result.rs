//! 健康检测结果数据结构
//!
//! 定义探测状态、展示分类、单条状态记录以及一次检测的快照

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// 非预期故障的分类
///
/// 每个变体对应一个固定、简短的诊断字符串，原始错误文本只写入日志。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnexpectedFault {
    /// URL 无法解析
    InvalidUrl,
    /// 不支持的 URL 协议（仅支持 http/https）
    UnsupportedScheme,
    /// 重定向次数过多
    Redirect,
    /// 探测被调用方取消
    Cancelled,
    /// 探测任务异常终止
    ProbeFailed,
    /// 其他客户端错误
    Other,
}

impl UnexpectedFault {
    /// 稳定的诊断字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            UnexpectedFault::InvalidUrl => "invalid URL",
            UnexpectedFault::UnsupportedScheme => "unsupported URL scheme",
            UnexpectedFault::Redirect => "redirect loop",
            UnexpectedFault::Cancelled => "probe cancelled",
            UnexpectedFault::ProbeFailed => "probe task failed",
            UnexpectedFault::Other => "unexpected client error",
        }
    }
}

impl fmt::Display for UnexpectedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单次探测的结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeState {
    /// 收到 2xx 响应
    Online,
    /// 收到非 2xx 响应，携带实际状态码
    OfflineHttp(u16),
    /// 连接层故障：DNS、拒绝连接、超时、TLS 等
    OfflineConnection,
    /// 其他无法归类的故障
    OfflineUnexpected(UnexpectedFault),
}

impl ProbeState {
    /// 根据 HTTP 状态码分类
    pub fn from_status_code(code: u16) -> Self {
        if (200..300).contains(&code) {
            ProbeState::Online
        } else {
            ProbeState::OfflineHttp(code)
        }
    }

    /// 判断是否在线
    pub fn is_online(&self) -> bool {
        matches!(self, ProbeState::Online)
    }

    /// 对应的展示分类
    pub fn display_class(&self) -> DisplayClass {
        match self {
            ProbeState::Online => DisplayClass::Online,
            ProbeState::OfflineHttp(_)
            | ProbeState::OfflineConnection
            | ProbeState::OfflineUnexpected(_) => DisplayClass::Offline,
        }
    }
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeState::Online => write!(f, "Online"),
            ProbeState::OfflineHttp(code) => write!(f, "Offline ({code})"),
            ProbeState::OfflineConnection => write!(f, "Offline (Connection Error)"),
            ProbeState::OfflineUnexpected(fault) => {
                write!(f, "Offline (Unexpected Error: {fault})")
            }
        }
    }
}

/// 展示分类，仅供渲染层使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayClass {
    Online,
    Offline,
}

impl DisplayClass {
    /// CSS 类名
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayClass::Online => "online",
            DisplayClass::Offline => "offline",
        }
    }
}

impl fmt::Display for DisplayClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个服务的检测记录，创建后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    name: String,
    url: String,
    state: ProbeState,
    response_time: Duration,
}

impl StatusRecord {
    /// 创建新的检测记录
    ///
    /// # 参数
    /// * `name` - 服务名称
    /// * `url` - 服务URL
    /// * `state` - 探测状态
    /// * `response_time` - 探测耗时
    pub fn new(name: String, url: String, state: ProbeState, response_time: Duration) -> Self {
        Self {
            name,
            url,
            state,
            response_time,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// 展示分类，由状态唯一决定
    pub fn display_class(&self) -> DisplayClass {
        self.state.display_class()
    }

    pub fn response_time(&self) -> Duration {
        self.response_time
    }

    /// 获取响应时间（毫秒）
    pub fn response_time_ms(&self) -> u64 {
        self.response_time.as_millis() as u64
    }

    /// 转换为渲染层使用的视图
    pub fn to_view(&self) -> StatusView {
        StatusView {
            name: self.name.clone(),
            url: self.url.clone(),
            status: self.state.to_string(),
            class: self.display_class().as_str(),
        }
    }
}

/// 渲染层消费的单行数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    /// 服务名称
    pub name: String,
    /// 服务URL
    pub url: String,
    /// 状态展示文本
    pub status: String,
    /// CSS 类名
    pub class: &'static str,
}

/// 一次检测的快照：记录顺序与输入顺序一致
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Vec<StatusRecord>,
    generated_at: DateTime<Local>,
}

impl Snapshot {
    /// 以当前本地时间创建快照
    pub fn new(records: Vec<StatusRecord>) -> Self {
        Self::with_timestamp(records, Local::now())
    }

    /// 以指定时间创建快照
    pub fn with_timestamp(records: Vec<StatusRecord>, generated_at: DateTime<Local>) -> Self {
        Self {
            records,
            generated_at,
        }
    }

    pub fn records(&self) -> &[StatusRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generated_at(&self) -> DateTime<Local> {
        self.generated_at
    }

    /// 生成时间，格式为 `HH:MM:SS`
    pub fn generated_at_display(&self) -> String {
        self.generated_at.format("%H:%M:%S").to_string()
    }

    /// 在线服务数量
    pub fn online_count(&self) -> usize {
        self.records.iter().filter(|r| r.state().is_online()).count()
    }

    /// 离线服务数量
    pub fn offline_count(&self) -> usize {
        self.records.len() - self.online_count()
    }

    /// 按顺序生成渲染视图
    pub fn views(&self) -> Vec<StatusView> {
        self.records.iter().map(StatusRecord::to_view).collect()
    }
}
