//! 显示屏回报记录与写回操作

use crate::ids::{GenieCommand, GenieObject};
use std::fmt;

/// 显示屏回报记录
///
/// 由显示屏传输层每收到一帧创建一次，交给事件翻译器消费一次后丢弃。
///
/// # 设计特性
///
/// - **Copy trait**：4 个字段，零成本复制
/// - **无生命周期**：自包含数据结构
///
/// # Example
///
/// ```rust
/// use pumpctl_protocol::{DisplayReply, GenieObject};
///
/// let reply = DisplayReply::report_event(GenieObject::Slider, 0, 42);
/// assert!(reply.is_report_event());
/// assert_eq!(reply.payload, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayReply {
    /// 命令字节（事件回报或其它）
    pub command: GenieCommand,
    /// 来源对象类型
    pub object: GenieObject,
    /// 对象编号
    pub index: u8,
    /// 16 位数值
    pub payload: u16,
}

impl DisplayReply {
    /// 通用构造器
    pub fn new(command: GenieCommand, object: GenieObject, index: u8, payload: u16) -> Self {
        Self {
            command,
            object,
            index,
            payload,
        }
    }

    /// 创建事件回报
    pub fn report_event(object: GenieObject, index: u8, payload: u16) -> Self {
        Self::new(GenieCommand::ReportEvent, object, index, payload)
    }

    /// 是否为事件回报
    pub fn is_report_event(&self) -> bool {
        self.command.is_report_event()
    }
}

impl fmt::Display for DisplayReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "command: {:2}, object: {:2}, index: {}, data: {}",
            u8::from(self.command),
            u8::from(self.object),
            self.index,
            self.payload
        )
    }
}

/// 写对象操作（主机 -> 显示屏）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectWrite {
    pub object: GenieObject,
    pub index: u8,
    pub value: u16,
}

impl ObjectWrite {
    pub fn new(object: GenieObject, index: u8, value: u16) -> Self {
        Self {
            object,
            index,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_event_constructor() {
        let reply = DisplayReply::report_event(GenieObject::Button4D, 2, 1);
        assert_eq!(reply.command, GenieCommand::ReportEvent);
        assert_eq!(reply.object, GenieObject::Button4D);
        assert_eq!(reply.index, 2);
        assert_eq!(reply.payload, 1);
        assert!(reply.is_report_event());
    }

    #[test]
    fn test_non_report_event() {
        let reply = DisplayReply::new(GenieCommand::ReportObject, GenieObject::Slider, 0, 1);
        assert!(!reply.is_report_event());
    }

    #[test]
    fn test_display_format_uses_raw_codes() {
        let reply = DisplayReply::report_event(GenieObject::Slider, 0, 42);
        assert_eq!(
            reply.to_string(),
            "command:  7, object:  4, index: 0, data: 42"
        );
    }
}
