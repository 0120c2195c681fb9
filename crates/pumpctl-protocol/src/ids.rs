//! Genie 命令字节与对象类型定义
//!
//! 数值来自 ViSi-Genie 串口协议。未知取值不会报错，而是落入 `Unknown(u8)`，
//! 由上层决定是否处理。

use num_enum::{FromPrimitive, IntoPrimitive};

/// 显示屏确认字节
pub const GENIE_ACK: u8 = 0x06;
/// 显示屏否认字节（校验错误或对象不存在）
pub const GENIE_NAK: u8 = 0x15;

/// Genie 命令字节（帧的第一个字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum GenieCommand {
    /// 读取对象值（主机 -> 显示屏）
    ReadObject = 0x00,
    /// 写对象值（主机 -> 显示屏）
    WriteObject = 0x01,
    /// 写 ASCII 字符串（主机 -> 显示屏）
    WriteString = 0x02,
    /// 写 Unicode 字符串（主机 -> 显示屏）
    WriteStringUnicode = 0x03,
    /// 设置背光对比度
    WriteContrast = 0x04,
    /// 对象值回报（读取请求的应答）
    ReportObject = 0x05,
    /// 事件回报（控件状态变化）
    ReportEvent = 0x07,
    /// 未知命令
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl GenieCommand {
    /// 是否为事件回报
    pub fn is_report_event(self) -> bool {
        self == Self::ReportEvent
    }

    /// 显示屏主动发送的 6 字节帧（回报类）
    pub fn is_inbound_frame(self) -> bool {
        matches!(self, Self::ReportEvent | Self::ReportObject)
    }
}

/// Genie 对象类型（帧的第二个字节）
///
/// 只列出 ViSi-Genie 定义的常用控件；其余取值落入 `Unknown`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum GenieObject {
    DipSwitch = 0,
    Knob = 1,
    RockerSwitch = 2,
    RotarySwitch = 3,
    /// 滑块（本系统：泵速设定）
    Slider = 4,
    TrackBar = 5,
    WinButton = 6,
    AngularMeter = 7,
    /// Cool Gauge（本系统：空闲动画）
    CoolGauge = 8,
    CustomDigits = 9,
    Form = 10,
    Gauge = 11,
    Image = 12,
    Keyboard = 13,
    Led = 14,
    /// LED 数码管（本系统：回显滑块值）
    LedDigits = 15,
    Meter = 16,
    /// 字符串框
    Strings = 17,
    Thermometer = 18,
    UserLed = 19,
    Video = 20,
    StaticText = 21,
    Sound = 22,
    Timer = 23,
    Spectrum = 24,
    Scope = 25,
    Tank = 26,
    UserImages = 27,
    PinOutput = 28,
    PinInput = 29,
    /// 4D 按钮（本系统：初始化/方向/启停/刹车）
    Button4D = 30,
    AniButton = 31,
    ColorPicker = 32,
    UserButton = 33,
    #[num_enum(catch_all)]
    Unknown(u8),
}
