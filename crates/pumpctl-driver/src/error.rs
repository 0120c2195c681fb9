//! 驱动层错误类型定义

use pumpctl_display::DisplayError;
use pumpctl_protocol::PumpCommand;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 建立泵连接失败（地址解析 / socket 创建 / connect）
    #[error("Failed to connect to pump at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// 与泵交换命令时 IO 失败
    #[error("Pump I/O failed while sending {command:?}: {source}")]
    PumpIo {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置非法
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// 显示屏传输层错误
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    /// 线程创建等通用 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 动画线程异常退出
    #[error("Animation thread error: {0}")]
    AnimationThread(String),
}

impl DriverError {
    pub(crate) fn pump_io(command: &PumpCommand, source: std::io::Error) -> Self {
        Self::PumpIo {
            command: command.token(),
            source,
        }
    }
}
