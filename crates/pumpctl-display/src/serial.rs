//! ViSi-Genie 串口后端
//!
//! 打开串口设备（如树莓派的 `/dev/ttyAMA0`），配置为 raw 模式，
//! 并启动后台读取线程：
//!
//! ```text
//! 串口 --read--> [读取线程] --FrameDecoder--> crossbeam 通道 --> next_reply()
//!                               └─ ACK/NAK 只计数
//! write_object()/write_string() --Mutex<File>--> 串口
//! ```
//!
//! 写端由互斥锁保护，保证分发循环和动画线程的帧不会交错。

use crate::{DisplayError, DisplayTransport};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use nix::fcntl::OFlag;
use nix::sys::termios::{
    BaudRate, ControlFlags, FlushArg, SetArg, SpecialCharacterIndices, cfmakeraw, cfsetspeed,
    tcflush, tcgetattr, tcsetattr,
};
use parking_lot::Mutex;
use pumpctl_protocol::{
    DisplayReply, FrameDecoder, Inbound, ObjectWrite, encode_write_object, encode_write_string,
};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{Builder as ThreadBuilder, JoinHandle};
use tracing::{debug, error, info, trace, warn};

/// 回报队列容量（超出后丢弃最新回报并告警）
const REPLY_QUEUE_CAPACITY: usize = 256;

/// 读取超时（VTIME，单位 0.1s），读取线程借此周期性检查运行标志
const READ_TIMEOUT_DECISECONDS: u8 = 1;

/// 串口链路统计（原子计数器）
#[derive(Debug, Default)]
pub struct SerialLinkStats {
    /// 收到的 ACK 数
    pub acks: AtomicU64,
    /// 收到的 NAK 数
    pub naks: AtomicU64,
    /// 解码出的回报帧数
    pub replies: AtomicU64,
    /// 因队列满被丢弃的回报数
    pub replies_dropped: AtomicU64,
    /// 为重新同步丢弃的字节数
    pub bytes_discarded: AtomicU64,
}

impl SerialLinkStats {
    /// 获取统计快照
    pub fn snapshot(&self) -> SerialStatsSnapshot {
        SerialStatsSnapshot {
            acks: self.acks.load(Ordering::Relaxed),
            naks: self.naks.load(Ordering::Relaxed),
            replies: self.replies.load(Ordering::Relaxed),
            replies_dropped: self.replies_dropped.load(Ordering::Relaxed),
            bytes_discarded: self.bytes_discarded.load(Ordering::Relaxed),
        }
    }
}

/// 串口链路统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerialStatsSnapshot {
    pub acks: u64,
    pub naks: u64,
    pub replies: u64,
    pub replies_dropped: u64,
    pub bytes_discarded: u64,
}

/// ViSi-Genie 串口显示屏
pub struct GenieSerialDisplay {
    writer: Mutex<File>,
    replies: Receiver<DisplayReply>,
    stats: Arc<SerialLinkStats>,
    is_running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl GenieSerialDisplay {
    /// 打开串口并启动读取线程
    ///
    /// # 参数
    /// - `device`: 串口设备路径（如 `/dev/ttyAMA0`）
    /// - `baud_rate`: 波特率，必须与显示屏工程配置一致（常用 115200）
    ///
    /// # Errors
    /// - `DisplayError::Config`: 不支持的波特率
    /// - `DisplayError::Io`: 打开或配置串口失败
    pub fn open(device: impl AsRef<Path>, baud_rate: u32) -> Result<Self, DisplayError> {
        let device = device.as_ref();
        let speed = baud_rate_from_u32(baud_rate)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_NOCTTY.bits())
            .open(device)?;

        let mut termios = tcgetattr(&file).map_err(std::io::Error::from)?;
        cfmakeraw(&mut termios);
        cfsetspeed(&mut termios, speed).map_err(std::io::Error::from)?;
        termios.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
        termios.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        termios.control_chars[SpecialCharacterIndices::VTIME as usize] = READ_TIMEOUT_DECISECONDS;
        tcsetattr(&file, SetArg::TCSANOW, &termios).map_err(std::io::Error::from)?;
        tcflush(&file, FlushArg::TCIOFLUSH).map_err(std::io::Error::from)?;

        let reader_file = file.try_clone()?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(REPLY_QUEUE_CAPACITY);
        let stats = Arc::new(SerialLinkStats::default());
        let is_running = Arc::new(AtomicBool::new(true));

        let stats_clone = stats.clone();
        let is_running_clone = is_running.clone();
        let reader = ThreadBuilder::new()
            .name("genie-rx".to_string())
            .spawn(move || read_loop(reader_file, reply_tx, stats_clone, is_running_clone))?;

        info!(
            "Genie display opened on {} at {} baud",
            device.display(),
            baud_rate
        );

        Ok(Self {
            writer: Mutex::new(file),
            replies: reply_rx,
            stats,
            is_running,
            reader: Some(reader),
        })
    }

    /// 链路统计
    pub fn stats(&self) -> &SerialLinkStats {
        &self.stats
    }

    fn write_frame(&self, frame: &[u8]) -> Result<(), DisplayError> {
        let mut writer = self.writer.lock();
        writer.write_all(frame)?;
        writer.flush()?;
        trace!("Genie TX {:02X?}", frame);
        Ok(())
    }
}

impl DisplayTransport for GenieSerialDisplay {
    fn reply_available(&self) -> bool {
        !self.replies.is_empty()
    }

    fn next_reply(&self) -> Result<Option<DisplayReply>, DisplayError> {
        match self.replies.try_recv() {
            Ok(reply) => Ok(Some(reply)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(DisplayError::Closed),
        }
    }

    fn write_object(&self, write: ObjectWrite) -> Result<(), DisplayError> {
        self.write_frame(&encode_write_object(&write))
    }

    fn write_string(&self, index: u8, text: &str) -> Result<(), DisplayError> {
        let frame = encode_write_string(index, text)?;
        self.write_frame(&frame)
    }

    fn is_healthy(&self) -> bool {
        self.reader.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl Drop for GenieSerialDisplay {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::Release);
        // 读取超时为 VTIME，线程最多在一个超时周期后退出
        if let Some(handle) = self.reader.take()
            && handle.join().is_err()
        {
            error!("Genie reader thread panicked");
        }
    }
}

/// 读取线程循环
fn read_loop<R: Read>(
    mut port: R,
    reply_tx: Sender<DisplayReply>,
    stats: Arc<SerialLinkStats>,
    is_running: Arc<AtomicBool>,
) {
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; 64];

    while is_running.load(Ordering::Acquire) {
        let n = match port.read(&mut buf) {
            // VMIN=0 时超时返回 0 字节，属于正常情况
            Ok(0) => continue,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted || e.kind() == ErrorKind::WouldBlock => {
                continue;
            },
            Err(e) => {
                error!("Genie serial read failed, reader exiting: {}", e);
                break;
            },
        };

        for unit in decoder.push(&buf[..n]) {
            match unit {
                Inbound::Ack => {
                    stats.acks.fetch_add(1, Ordering::Relaxed);
                },
                Inbound::Nak => {
                    stats.naks.fetch_add(1, Ordering::Relaxed);
                    warn!("Genie display rejected a write (NAK)");
                },
                Inbound::Reply(reply) => {
                    stats.replies.fetch_add(1, Ordering::Relaxed);
                    trace!("Genie RX {}", reply);
                    if reply_tx.try_send(reply).is_err() {
                        stats.replies_dropped.fetch_add(1, Ordering::Relaxed);
                        warn!("Reply queue full, dropping {}", reply);
                    }
                },
            }
        }
        stats.bytes_discarded.store(decoder.discarded(), Ordering::Relaxed);
    }

    debug!("Genie reader thread stopped");
}

/// 波特率映射
fn baud_rate_from_u32(baud_rate: u32) -> Result<BaudRate, DisplayError> {
    let speed = match baud_rate {
        9_600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        other => {
            return Err(DisplayError::Config(format!(
                "unsupported baud rate {other}"
            )));
        },
    };
    Ok(speed)
}
