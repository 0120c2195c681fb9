//! 驱动层模块
//!
//! 本模块把 ViSi-Genie 触摸屏的回报翻译为泵控制器命令，包括：
//! - 泵链路（TCP，一条命令对应一次应答）
//! - 事件翻译（纯函数决策表）
//! - 事件分发循环与空闲动画循环
//! - `Bridge` 编排（线程管理、握手、停止）
//!
//! # 线程模型
//!
//! ```text
//! 调用线程:        dispatch_loop ──PumpLink──> 泵
//!                      │  ▲
//!                      ▼  │ write-back / next_reply
//!                   DisplayTransport (Arc<D>)
//!                      ▲
//! gauge-animation:  animation_loop（只写 Cool Gauge）
//! ```

mod animation;
mod bridge;
mod builder;
mod error;
pub mod link;
pub mod metrics;
pub mod pipeline;
pub mod translator;

pub use animation::{AnimationState, Direction, GAUGE_MAX, GAUGE_MIN};
pub use bridge::{Bridge, BridgeConfig, ShutdownHandle};
pub use builder::{BridgeBuilder, DEFAULT_PUMP_ADDR};
pub use error::DriverError;
pub use link::{DEFAULT_MAX_REPLY_LEN, PumpLink, PumpLinkConfig, PumpReply};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use pipeline::{Dispatcher, PipelineConfig, animation_loop, dispatch_loop};
pub use translator::{ObjectMap, Translation, translate};
