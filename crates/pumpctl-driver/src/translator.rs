//! 事件翻译器
//!
//! 把一条显示屏回报映射为"零或一条泵命令 + 可选的显示屏写回"。
//! 纯函数，无内部状态。
//!
//! | 条件 | 结果 |
//! |---|---|
//! | 非事件回报 | `Unhandled` |
//! | 滑块 #0 | 写回 LED 数码管 + `S<值>` |
//! | 按钮 #0 | `I` |
//! | 按钮 #1 | 0 → `C`，非 0 → `A` |
//! | 按钮 #2 | 0 → `G`，1 → `E`，其它 → `Ignored` |
//! | 按钮 #3 | 0 → `U`，1 → `B`，其它 → `Ignored` |
//! | 其它对象 / 编号 | `Ignored` |

use pumpctl_protocol::{DisplayReply, GenieObject, ObjectWrite, PumpCommand};

/// 初始化按钮
pub const BUTTON_INIT: u8 = 0;
/// 方向开关
pub const BUTTON_DIRECTION: u8 = 1;
/// 启动 / 停止
pub const BUTTON_RUN: u8 = 2;
/// 刹车 / 松开
pub const BUTTON_BRAKE: u8 = 3;

/// 显示屏控件编号映射
///
/// 默认值与显示屏工程的布线一致（全部为 0 号控件）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectMap {
    /// 泵速滑块
    pub speed_slider: u8,
    /// 回显泵速的 LED 数码管
    pub speed_readout: u8,
    /// 空闲动画的 Cool Gauge
    pub gauge: u8,
}

/// 翻译结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// 非事件回报：记录日志，不发命令
    Unhandled,
    /// 事件回报但不在映射表中：静默忽略
    Ignored,
    /// 转发给泵（可选先写回显示屏）
    Forward {
        write_back: Option<ObjectWrite>,
        command: PumpCommand,
    },
}

impl Translation {
    fn command_only(command: PumpCommand) -> Self {
        Self::Forward {
            write_back: None,
            command,
        }
    }

    /// 要发送的泵命令
    pub fn command(&self) -> Option<PumpCommand> {
        match self {
            Self::Forward { command, .. } => Some(*command),
            _ => None,
        }
    }

    /// 要执行的显示屏写回
    pub fn write_back(&self) -> Option<ObjectWrite> {
        match self {
            Self::Forward { write_back, .. } => *write_back,
            _ => None,
        }
    }
}

/// 翻译一条显示屏回报
pub fn translate(reply: &DisplayReply, objects: &ObjectMap) -> Translation {
    if !reply.is_report_event() {
        return Translation::Unhandled;
    }

    match (reply.object, reply.index, reply.payload) {
        (GenieObject::Slider, index, value) if index == objects.speed_slider => {
            Translation::Forward {
                write_back: Some(ObjectWrite::new(
                    GenieObject::LedDigits,
                    objects.speed_readout,
                    value,
                )),
                command: PumpCommand::Speed(value),
            }
        },
        (GenieObject::Button4D, BUTTON_INIT, _) => Translation::command_only(PumpCommand::Init),
        (GenieObject::Button4D, BUTTON_DIRECTION, 0) => {
            Translation::command_only(PumpCommand::Clockwise)
        },
        (GenieObject::Button4D, BUTTON_DIRECTION, _) => {
            Translation::command_only(PumpCommand::Anticlockwise)
        },
        (GenieObject::Button4D, BUTTON_RUN, 0) => Translation::command_only(PumpCommand::Start),
        (GenieObject::Button4D, BUTTON_RUN, 1) => Translation::command_only(PumpCommand::Stop),
        (GenieObject::Button4D, BUTTON_BRAKE, 0) => {
            Translation::command_only(PumpCommand::Release)
        },
        (GenieObject::Button4D, BUTTON_BRAKE, 1) => Translation::command_only(PumpCommand::Brake),
        _ => Translation::Ignored,
    }
}
