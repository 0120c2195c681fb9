//! 桥接编排
//!
//! 启动顺序：动画线程 → 握手 `"i"` → 在调用线程上运行分发循环。
//! 分发循环退出后清除运行标志，并在限定时间内回收动画线程。

use crate::error::DriverError;
use crate::link::PumpLink;
use crate::metrics::BridgeMetrics;
use crate::pipeline::{Dispatcher, PipelineConfig, animation_loop, dispatch_loop};
use crate::translator::ObjectMap;
use pumpctl_display::DisplayTransport;
use pumpctl_protocol::PumpCommand;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::Duration;
use tracing::{error, info};

/// 回收动画线程的最长等待时间
const ANIMATION_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 带超时的线程 join
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();

        // 看门狗线程代为 join，超时后它会继续等待，进程退出时回收
        spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 桥接配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    pub pipeline: PipelineConfig,
    pub objects: ObjectMap,
}

/// 停止句柄
///
/// 可克隆、可跨线程，典型用法是交给 Ctrl+C 处理函数。
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    is_running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// 请求两个循环退出（幂等）
    pub fn shutdown(&self) {
        self.is_running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }
}

/// 显示屏与泵之间的桥
///
/// # Example
///
/// ```no_run
/// use pumpctl_driver::{Bridge, BridgeConfig, PumpLink, PumpLinkConfig};
/// use pumpctl_display::MockDisplay;
/// use std::sync::Arc;
///
/// let link = PumpLink::connect("192.168.0.116:23", PumpLinkConfig::default())?;
/// let bridge = Bridge::new(Arc::new(MockDisplay::new()), link, BridgeConfig::default());
///
/// let shutdown = bridge.shutdown_handle();
/// std::thread::spawn(move || {
///     std::thread::sleep(std::time::Duration::from_secs(5));
///     shutdown.shutdown();
/// });
/// bridge.run()?;
/// # Ok::<(), pumpctl_driver::DriverError>(())
/// ```
pub struct Bridge<D, S = TcpStream> {
    display: Arc<D>,
    dispatcher: Dispatcher<S>,
    config: BridgeConfig,
    is_running: Arc<AtomicBool>,
    metrics: Arc<BridgeMetrics>,
}

impl<D, S> Bridge<D, S>
where
    D: DisplayTransport + 'static,
    S: Read + Write,
{
    pub fn new(display: Arc<D>, link: PumpLink<S>, config: BridgeConfig) -> Self {
        let metrics = Arc::new(BridgeMetrics::new());
        let dispatcher = Dispatcher::new(link, config.objects, metrics.clone());
        Self {
            display,
            dispatcher,
            config,
            is_running: Arc::new(AtomicBool::new(true)),
            metrics,
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            is_running: self.is_running.clone(),
        }
    }

    pub fn metrics(&self) -> Arc<BridgeMetrics> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// 运行桥接，直到停止句柄被触发或发生致命错误
    ///
    /// # Errors
    /// - `DriverError::Io`: 动画线程创建失败
    /// - `DriverError::PumpIo`: 启动握手失败
    /// - `DriverError::Display`: 显示屏传输层失效
    /// - `DriverError::AnimationThread`: 动画线程 panic 或未能按时退出
    pub fn run(self) -> Result<(), DriverError> {
        let Self {
            display,
            mut dispatcher,
            config,
            is_running,
            metrics,
        } = self;

        let animation = {
            let display = display.clone();
            let is_running = is_running.clone();
            let metrics = metrics.clone();
            let gauge = config.objects.gauge;
            let interval = config.pipeline.animation_interval();
            std::thread::Builder::new().name("gauge-animation".into()).spawn(move || {
                animation_loop(&*display, gauge, interval, &is_running, &metrics);
            })?
        };
        info!("Gauge animation started");

        let result = dispatcher.send(&PumpCommand::Handshake).and_then(|_| {
            info!("Handshake sent, dispatching display events");
            dispatch_loop(&*display, &mut dispatcher, &is_running, &config.pipeline)
        });

        is_running.store(false, Ordering::Release);
        let joined = animation.join_timeout(ANIMATION_JOIN_TIMEOUT);

        let snapshot = metrics.snapshot();
        info!(
            "Bridge stopped: {} replies ({} forwarded), {} commands sent, {} pump errors, {} display errors",
            snapshot.replies_total,
            snapshot.replies_forwarded(),
            snapshot.commands_sent,
            snapshot.pump_errors,
            snapshot.display_errors
        );

        result?;
        if joined.is_err() {
            error!(
                "Animation thread panicked or failed to shut down within {:?}",
                ANIMATION_JOIN_TIMEOUT
            );
            return Err(DriverError::AnimationThread(format!(
                "not joined within {:?}",
                ANIMATION_JOIN_TIMEOUT
            )));
        }
        Ok(())
    }
}
