//! Pipeline 循环模块
//!
//! 两个长期运行的循环：
//! - `dispatch_loop`：轮询显示屏回报，逐条交给 `Dispatcher`（翻译 + 写回 + 发泵命令）
//! - `animation_loop`：以固定间隔把三角波写到 Cool Gauge
//!
//! 二者只共享显示屏传输层，各自通过运行标志 `is_running` 退出。

use crate::animation::AnimationState;
use crate::error::DriverError;
use crate::link::PumpLink;
use crate::metrics::BridgeMetrics;
use crate::translator::{ObjectMap, Translation, translate};
use pumpctl_display::{DisplayError, DisplayTransport};
use pumpctl_protocol::{DisplayReply, GenieObject, ObjectWrite, PumpCommand};
use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Pipeline 配置
///
/// # Example
///
/// ```
/// use pumpctl_driver::PipelineConfig;
///
/// // 默认：10ms 轮询间隔，10ms 动画间隔
/// let config = PipelineConfig::default();
/// assert_eq!(config.poll_interval_ms, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 无回报时两次轮询之间的休眠（毫秒）
    pub poll_interval_ms: u64,
    /// 动画两帧之间的休眠（毫秒）
    pub animation_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            animation_interval_ms: 10,
        }
    }
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn animation_interval(&self) -> Duration {
        Duration::from_millis(self.animation_interval_ms)
    }
}

/// 事件分发器
///
/// 持有泵链路，把翻译结果落实为显示屏写回和泵命令。
pub struct Dispatcher<S> {
    link: PumpLink<S>,
    objects: ObjectMap,
    metrics: Arc<BridgeMetrics>,
}

impl<S: Read + Write> Dispatcher<S> {
    pub fn new(link: PumpLink<S>, objects: ObjectMap, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            link,
            objects,
            metrics,
        }
    }

    /// 处理一条回报
    ///
    /// 返回实际执行的翻译结果。显示屏写回失败只记录告警，不影响泵命令。
    ///
    /// # Errors
    /// - `DriverError::PumpIo`: 泵链路收发失败（回报本身已被消费，不重试）
    pub fn handle<D: DisplayTransport + ?Sized>(
        &mut self,
        display: &D,
        reply: &DisplayReply,
    ) -> Result<Translation, DriverError> {
        self.metrics.replies_total.fetch_add(1, Ordering::Relaxed);
        debug!("Event: {}", reply);

        let translation = translate(reply, &self.objects);
        match translation {
            Translation::Unhandled => {
                self.metrics.replies_unhandled.fetch_add(1, Ordering::Relaxed);
                info!("Unhandled event: {}", reply);
            },
            Translation::Ignored => {
                self.metrics.replies_ignored.fetch_add(1, Ordering::Relaxed);
                trace!("No action for event: {}", reply);
            },
            Translation::Forward {
                write_back,
                command,
            } => {
                if let Some(write) = write_back
                    && let Err(e) = display.write_object(write)
                {
                    self.metrics.display_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to write back {:?}: {}", write, e);
                }
                self.send(&command)?;
            },
        }
        Ok(translation)
    }

    /// 发送一条泵命令（握手也走这里）
    pub fn send(&mut self, command: &PumpCommand) -> Result<(), DriverError> {
        match self.link.send_command(command) {
            Ok(_) => {
                self.metrics.commands_sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            },
            Err(e) => {
                self.metrics.pump_errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            },
        }
    }
}

/// 事件分发循环
///
/// 每轮：只要显示屏有回报就逐条取出并同步处理；没有回报时休眠 `poll_interval`。
/// 泵链路错误记录后继续处理下一条；显示屏传输层失效时返回错误。
///
/// # 参数
/// - `display`: 显示屏传输层
/// - `dispatcher`: 事件分发器
/// - `is_running`: 运行标志（清除后在下一轮退出）
/// - `config`: Pipeline 配置
pub fn dispatch_loop<D, S>(
    display: &D,
    dispatcher: &mut Dispatcher<S>,
    is_running: &AtomicBool,
    config: &PipelineConfig,
) -> Result<(), DriverError>
where
    D: DisplayTransport + ?Sized,
    S: Read + Write,
{
    let poll_interval = config.poll_interval();

    while is_running.load(Ordering::Acquire) {
        while display.reply_available() {
            let reply = match display.next_reply()? {
                Some(reply) => reply,
                None => break,
            };
            if let Err(e) = dispatcher.handle(display, &reply) {
                error!("{}", e);
            }
            if !is_running.load(Ordering::Acquire) {
                break;
            }
        }

        if !display.is_healthy() {
            error!("Display transport is no longer healthy, stopping dispatch");
            return Err(DisplayError::Closed.into());
        }

        spin_sleep::sleep(poll_interval);
    }

    debug!("Dispatch loop stopped");
    Ok(())
}

/// 空闲动画循环
///
/// 写当前值 → 休眠 `interval` → 前进一步，直到运行标志被清除。
/// 写失败不会中断动画；连续失败只在第一次以 warn 级别记录。
pub fn animation_loop<D: DisplayTransport + ?Sized>(
    display: &D,
    gauge_index: u8,
    interval: Duration,
    is_running: &AtomicBool,
    metrics: &BridgeMetrics,
) {
    let mut state = AnimationState::new();
    let mut failing = false;

    while is_running.load(Ordering::Acquire) {
        let write = ObjectWrite::new(GenieObject::CoolGauge, gauge_index, state.value());
        match display.write_object(write) {
            Ok(()) => {
                metrics.animation_frames.fetch_add(1, Ordering::Relaxed);
                if failing {
                    info!("Gauge animation writes recovered");
                    failing = false;
                }
            },
            Err(e) => {
                metrics.display_errors.fetch_add(1, Ordering::Relaxed);
                if failing {
                    trace!("Gauge write failed: {}", e);
                } else {
                    warn!("Gauge write failed: {}", e);
                    failing = true;
                }
            },
        }

        spin_sleep::sleep(interval);
        state.advance();
    }

    debug!("Animation loop stopped");
}
