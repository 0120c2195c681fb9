//! # pumpctl Display Adapter Layer
//!
//! 显示屏传输抽象层，提供统一的 ViSi-Genie 显示屏接口。
//!
//! 上层（事件分发循环、空闲动画线程）只依赖 [`DisplayTransport`] trait：
//! - 轮询是否有回报（`reply_available`）
//! - 取出下一条回报（`next_reply`）
//! - 写对象值 / 写字符串（`write_object` / `write_string`）
//!
//! 写操作会被两个线程同时调用，实现必须保证单次调用的原子性（一帧不会被另一帧打断）。

use pumpctl_protocol::{DisplayReply, ObjectWrite, ProtocolError};
use thiserror::Error;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockDisplay, MockWrite};

#[cfg(all(unix, feature = "serial"))]
pub mod serial;

#[cfg(all(unix, feature = "serial"))]
pub use serial::{GenieSerialDisplay, SerialLinkStats, SerialStatsSnapshot};

// 重新导出 pumpctl-protocol 中的显示屏类型
pub use pumpctl_protocol::{GenieCommand, GenieObject};

/// 显示屏适配层统一错误类型
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Unsupported configuration: {0}")]
    Config(String),
    #[error("Display transport closed")]
    Closed,
}

/// 显示屏传输接口
///
/// 所有方法都取 `&self`，实现内部自行同步，便于以 `Arc<D>` 在线程间共享。
pub trait DisplayTransport: Send + Sync {
    /// 是否有待取的回报（非阻塞）
    fn reply_available(&self) -> bool;

    /// 取出下一条回报
    ///
    /// 队列为空时返回 `Ok(None)`；传输层已失效时返回 `DisplayError::Closed`。
    fn next_reply(&self) -> Result<Option<DisplayReply>, DisplayError>;

    /// 写对象值
    fn write_object(&self, write: ObjectWrite) -> Result<(), DisplayError>;

    /// 写字符串框
    fn write_string(&self, index: u8, text: &str) -> Result<(), DisplayError>;

    /// 传输层是否仍然可用（例如串口读取线程是否存活）
    fn is_healthy(&self) -> bool {
        true
    }
}

impl<T: DisplayTransport + ?Sized> DisplayTransport for std::sync::Arc<T> {
    fn reply_available(&self) -> bool {
        (**self).reply_available()
    }

    fn next_reply(&self) -> Result<Option<DisplayReply>, DisplayError> {
        (**self).next_reply()
    }

    fn write_object(&self, write: ObjectWrite) -> Result<(), DisplayError> {
        (**self).write_object(write)
    }

    fn write_string(&self, index: u8, text: &str) -> Result<(), DisplayError> {
        (**self).write_string(index, text)
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}
