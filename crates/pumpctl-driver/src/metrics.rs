//! 桥接性能指标模块
//!
//! 提供原子计数器，用于监控事件分发与动画的运行状况。
//! 所有计数器都使用原子操作，可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 桥接实时指标
///
/// # 使用示例
///
/// ```rust
/// use pumpctl_driver::BridgeMetrics;
/// use std::sync::Arc;
/// use std::sync::atomic::Ordering;
///
/// let metrics = Arc::new(BridgeMetrics::default());
/// metrics.replies_total.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.replies_total, 1);
/// ```
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// 处理的回报总数
    pub replies_total: AtomicU64,

    /// 非事件回报数（记录为 Unhandled）
    pub replies_unhandled: AtomicU64,

    /// 不在映射表中的事件回报数
    pub replies_ignored: AtomicU64,

    /// 成功完成一次收发的泵命令数（含握手）
    pub commands_sent: AtomicU64,

    /// 泵链路 IO 失败次数
    pub pump_errors: AtomicU64,

    /// 显示屏写失败次数（写回 + 动画）
    pub display_errors: AtomicU64,

    /// 成功写出的动画帧数
    pub animation_frames: AtomicU64,
}

impl BridgeMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            replies_total: self.replies_total.load(Ordering::Relaxed),
            replies_unhandled: self.replies_unhandled.load(Ordering::Relaxed),
            replies_ignored: self.replies_ignored.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            pump_errors: self.pump_errors.load(Ordering::Relaxed),
            display_errors: self.display_errors.load(Ordering::Relaxed),
            animation_frames: self.animation_frames.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.replies_total.store(0, Ordering::Relaxed);
        self.replies_unhandled.store(0, Ordering::Relaxed);
        self.replies_ignored.store(0, Ordering::Relaxed);
        self.commands_sent.store(0, Ordering::Relaxed);
        self.pump_errors.store(0, Ordering::Relaxed);
        self.display_errors.store(0, Ordering::Relaxed);
        self.animation_frames.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变，用于读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub replies_total: u64,
    pub replies_unhandled: u64,
    pub replies_ignored: u64,
    pub commands_sent: u64,
    pub pump_errors: u64,
    pub display_errors: u64,
    pub animation_frames: u64,
}

impl MetricsSnapshot {
    /// 被转发给泵的回报数（含失败的）
    pub fn replies_forwarded(&self) -> u64 {
        self.replies_total
            .saturating_sub(self.replies_unhandled)
            .saturating_sub(self.replies_ignored)
    }
}
