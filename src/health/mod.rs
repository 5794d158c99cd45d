//! 健康检测模块
//!
//! 提供探测、结果分类和快照汇总功能

pub mod checker;
pub mod result;

// 重新导出主要类型
pub use checker::{HealthChecker, HttpProber, Prober, DEFAULT_PROBE_TIMEOUT};
pub use result::{DisplayClass, ProbeState, Snapshot, StatusRecord, StatusView, UnexpectedFault};
