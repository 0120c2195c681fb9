//! Builder 模式实现
//!
//! 提供链式构造 `Bridge` 实例的便捷方式。

use crate::bridge::{Bridge, BridgeConfig};
use crate::error::DriverError;
use crate::link::{PumpLink, PumpLinkConfig};
use crate::pipeline::PipelineConfig;
use crate::translator::ObjectMap;
use pumpctl_display::DisplayTransport;
use std::io::{Read, Write};
use std::sync::Arc;

/// 泵控制器默认地址
pub const DEFAULT_PUMP_ADDR: &str = "192.168.0.116:23";

/// Bridge Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use pumpctl_driver::{BridgeBuilder, PipelineConfig};
/// use pumpctl_display::MockDisplay;
/// use std::sync::Arc;
///
/// let bridge = BridgeBuilder::new()
///     .pump_addr("10.0.0.7:23")
///     .pipeline_config(PipelineConfig {
///         poll_interval_ms: 5,
///         animation_interval_ms: 20,
///     })
///     .build(Arc::new(MockDisplay::new()))?;
/// # Ok::<(), pumpctl_driver::DriverError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BridgeBuilder {
    /// 泵控制器地址（`host:port`）
    pump_addr: String,
    link_config: PumpLinkConfig,
    pipeline_config: PipelineConfig,
    objects: ObjectMap,
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self {
            pump_addr: DEFAULT_PUMP_ADDR.to_string(),
            link_config: PumpLinkConfig::default(),
            pipeline_config: PipelineConfig::default(),
            objects: ObjectMap::default(),
        }
    }

    /// 设置泵控制器地址（默认 `192.168.0.116:23`）
    pub fn pump_addr(mut self, addr: impl Into<String>) -> Self {
        self.pump_addr = addr.into();
        self
    }

    pub fn link_config(mut self, config: PumpLinkConfig) -> Self {
        self.link_config = config;
        self
    }

    pub fn pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = config;
        self
    }

    /// 设置显示屏控件编号映射
    pub fn objects(mut self, objects: ObjectMap) -> Self {
        self.objects = objects;
        self
    }

    /// 连接泵控制器并构造 `Bridge`
    ///
    /// # Errors
    /// - `DriverError::Connect`: 连接失败（不重试）
    pub fn build<D>(self, display: Arc<D>) -> Result<Bridge<D>, DriverError>
    where
        D: DisplayTransport + 'static,
    {
        let link = PumpLink::connect(&self.pump_addr, self.link_config.clone())?;
        Ok(self.build_with_link(display, link))
    }

    /// 使用已建立的流构造 `Bridge`（不做连接）
    ///
    /// # Errors
    /// - `DriverError::Config`: 链路配置非法
    pub fn build_with_stream<D, S>(
        self,
        display: Arc<D>,
        stream: S,
    ) -> Result<Bridge<D, S>, DriverError>
    where
        D: DisplayTransport + 'static,
        S: Read + Write,
    {
        let link = PumpLink::new(stream, self.link_config.clone())?;
        Ok(self.build_with_link(display, link))
    }

    fn build_with_link<D, S>(self, display: Arc<D>, link: PumpLink<S>) -> Bridge<D, S>
    where
        D: DisplayTransport + 'static,
        S: Read + Write,
    {
        let config = BridgeConfig {
            pipeline: self.pipeline_config,
            objects: self.objects,
        };
        Bridge::new(display, link, config)
    }

    pub fn get_pump_addr(&self) -> &str {
        &self.pump_addr
    }
}
