//! # pumpctl Protocol
//!
//! 触摸屏（4D Systems ViSi-Genie）与泵控制器之间的协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: Genie 命令字节与对象类型常量
//! - `reply`: 显示屏回报记录（`DisplayReply`）与写回操作（`ObjectWrite`）
//! - `frame`: Genie 串口帧编解码（6 字节帧 + XOR 校验）
//! - `command`: 泵命令词表（`PumpCommand`）
//!
//! ## 校验
//!
//! Genie 帧最后一个字节是前面所有字节的 XOR，
//! 因此一个合法帧的全部字节异或结果为 0。

pub mod command;
pub mod frame;
pub mod ids;
pub mod reply;

// 重新导出常用类型
pub use command::*;
pub use frame::*;
pub use ids::*;
pub use reply::*;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("String too long for a single frame: {len} bytes (max {max})")]
    StringTooLong { len: usize, max: usize },

    #[error("Unknown pump command token: {0:?}")]
    UnknownCommand(String),
}

/// 计算 Genie 校验字节（所有字节的 XOR）
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// 大端字节序转 u16（Genie 的 16 位数值：高字节在前）
pub fn bytes_to_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// u16 转大端字节序
pub fn u16_to_bytes_be(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}
