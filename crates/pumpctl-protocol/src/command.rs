//! 泵命令词表
//!
//! 泵控制器只理解短 ASCII 令牌，没有结束符也没有长度前缀，
//! 令牌按原样写入 TCP 连接。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 泵命令
///
/// | 变体 | 令牌 |
/// |---|---|
/// | `Handshake` | `i` |
/// | `Init` | `I` |
/// | `Clockwise` | `C` |
/// | `Anticlockwise` | `A` |
/// | `Start` | `G` |
/// | `Stop` | `E` |
/// | `Release` | `U` |
/// | `Brake` | `B` |
/// | `Speed(n)` | `S<n>`（十进制，无前导零） |
///
/// # Example
///
/// ```rust
/// use pumpctl_protocol::PumpCommand;
///
/// assert_eq!(PumpCommand::Speed(42).token(), "S42");
/// assert_eq!("E".parse::<PumpCommand>().unwrap(), PumpCommand::Stop);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PumpCommand {
    /// 启动握手（进入主循环前发送一次）
    Handshake,
    /// 初始化
    Init,
    /// 顺时针
    Clockwise,
    /// 逆时针
    Anticlockwise,
    /// 启动
    Start,
    /// 停止
    Stop,
    /// 松开刹车
    Release,
    /// 刹车
    Brake,
    /// 速度设定（滑块值）
    Speed(u16),
}

impl PumpCommand {
    /// 线上令牌
    pub fn token(&self) -> String {
        match self {
            Self::Speed(value) => format!("S{value}"),
            other => other.letter().to_string(),
        }
    }

    /// 单字母命令的字母（`Speed` 返回前缀 `S`）
    pub fn letter(&self) -> char {
        match self {
            Self::Handshake => 'i',
            Self::Init => 'I',
            Self::Clockwise => 'C',
            Self::Anticlockwise => 'A',
            Self::Start => 'G',
            Self::Stop => 'E',
            Self::Release => 'U',
            Self::Brake => 'B',
            Self::Speed(_) => 'S',
        }
    }

    /// 令牌字节（写入 socket）
    pub fn to_bytes(&self) -> Vec<u8> {
        self.token().into_bytes()
    }
}

impl fmt::Display for PumpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for PumpCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s {
            "i" => Self::Handshake,
            "I" => Self::Init,
            "C" => Self::Clockwise,
            "A" => Self::Anticlockwise,
            "G" => Self::Start,
            "E" => Self::Stop,
            "U" => Self::Release,
            "B" => Self::Brake,
            _ => {
                let digits = s
                    .strip_prefix('S')
                    .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))?;
                // 十进制、无符号、无前导零（"0" 本身除外）
                let canonical = !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit())
                    && (digits == "0" || !digits.starts_with('0'));
                if !canonical {
                    return Err(ProtocolError::UnknownCommand(s.to_string()));
                }
                let value = digits
                    .parse::<u16>()
                    .map_err(|_| ProtocolError::UnknownCommand(s.to_string()))?;
                Self::Speed(value)
            },
        };
        Ok(command)
    }
}
