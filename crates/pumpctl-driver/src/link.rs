//! 泵链路
//!
//! 持有唯一一条到泵控制器的 TCP 连接，提供同步的"发送命令、读取一次应答"操作。
//!
//! 线上格式没有长度前缀也没有分隔符：命令令牌按原样写出，
//! 随后做一次阻塞读取，读到多少字节（包括 0 字节）都视为一次应答，不重试。
//! 读取不设超时，泵不应答时调用方会一直阻塞。

use crate::error::DriverError;
use pumpctl_protocol::PumpCommand;
use std::borrow::Cow;
use std::io::{Read, Write};
use std::net::TcpStream;
use tracing::{debug, info};

/// 默认应答缓冲区大小（字节）
pub const DEFAULT_MAX_REPLY_LEN: usize = 80;

/// 泵链路配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpLinkConfig {
    /// 单次应答最多读取的字节数
    pub max_reply_len: usize,
}

impl Default for PumpLinkConfig {
    fn default() -> Self {
        Self {
            max_reply_len: DEFAULT_MAX_REPLY_LEN,
        }
    }
}

impl PumpLinkConfig {
    /// 校验配置
    ///
    /// 缓冲区为 0 字节时 `read` 会立即返回 0，不再等待泵的应答，因此必须拒绝。
    ///
    /// # Errors
    /// - `DriverError::Config`: `max_reply_len` 为 0
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.max_reply_len == 0 {
            return Err(DriverError::Config(
                "max_reply_len must be at least 1 byte".to_string(),
            ));
        }
        Ok(())
    }
}

/// 泵的一次应答（原始字节）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PumpReply {
    bytes: Vec<u8>,
}

impl PumpReply {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 以文本形式查看（非 UTF-8 字节被替换）
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// 泵链路
///
/// 对流类型泛型，生产环境使用 `TcpStream`，测试可替换为内存流。
pub struct PumpLink<S = TcpStream> {
    stream: S,
    config: PumpLinkConfig,
    buf: Vec<u8>,
}

impl PumpLink<TcpStream> {
    /// 连接泵控制器
    ///
    /// # 参数
    /// - `addr`: `host:port`（如 `"192.168.0.116:23"`），主机名会被解析
    ///
    /// # Errors
    /// - `DriverError::Config`: 配置非法（在连接之前检查）
    /// - `DriverError::Connect`: 地址解析、socket 创建或连接失败
    pub fn connect(addr: &str, config: PumpLinkConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let stream = TcpStream::connect(addr).map_err(|source| DriverError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        // 命令只有几个字节，关闭 Nagle 避免攒包延迟
        stream.set_nodelay(true).map_err(|source| DriverError::Connect {
            addr: addr.to_string(),
            source,
        })?;

        info!("Connected to pump at {}", addr);
        Self::new(stream, config)
    }
}

impl<S: Read + Write> PumpLink<S> {
    /// 用已建立的流创建链路
    ///
    /// # Errors
    /// - `DriverError::Config`: 配置非法
    pub fn new(stream: S, config: PumpLinkConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let buf = vec![0u8; config.max_reply_len];
        Ok(Self {
            stream,
            config,
            buf,
        })
    }

    /// 发送命令并读取一次应答
    ///
    /// # Errors
    /// - `DriverError::PumpIo`: 写出或读取失败
    pub fn send_command(&mut self, command: &PumpCommand) -> Result<PumpReply, DriverError> {
        let token = command.to_bytes();
        debug!("Pump TX {:?}", command.token());

        self.stream
            .write_all(&token)
            .and_then(|_| self.stream.flush())
            .map_err(|e| DriverError::pump_io(command, e))?;

        let n = self.stream.read(&mut self.buf).map_err(|e| DriverError::pump_io(command, e))?;
        let reply = PumpReply {
            bytes: self.buf[..n].to_vec(),
        };
        debug!("Pump RX {:?} ({} bytes)", reply.text(), n);
        Ok(reply)
    }

    pub fn config(&self) -> &PumpLinkConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind};

    /// 内存双工流：写入被记录，读取按脚本返回
    #[derive(Default)]
    struct ScriptedStream {
        written: Vec<u8>,
        reads: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                },
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_writes_token_verbatim() {
        let mut stream = ScriptedStream::default();
        stream.reads.push_back(Ok(b"OK".to_vec()));
        let mut link = PumpLink::new(stream, PumpLinkConfig::default()).unwrap();

        let reply = link.send_command(&PumpCommand::Speed(42)).unwrap();
        assert_eq!(reply.as_bytes(), b"OK");
        assert_eq!(reply.text(), "OK");
        assert_eq!(link.get_ref().written, b"S42");
    }

    #[test]
    fn test_zero_byte_reply_is_accepted() {
        let mut link =
            PumpLink::new(ScriptedStream::default(), PumpLinkConfig::default()).unwrap();
        let reply = link.send_command(&PumpCommand::Init).unwrap();
        assert!(reply.is_empty());
        assert_eq!(link.into_inner().written, b"I");
    }

    #[test]
    fn test_reply_capped_at_max_len() {
        let mut stream = ScriptedStream::default();
        stream.reads.push_back(Ok(vec![b'x'; 200]));
        let mut link = PumpLink::new(stream, PumpLinkConfig::default()).unwrap();

        let reply = link.send_command(&PumpCommand::Handshake).unwrap();
        assert_eq!(reply.len(), DEFAULT_MAX_REPLY_LEN);
    }

    #[test]
    fn test_custom_max_reply_len() {
        let mut stream = ScriptedStream::default();
        stream.reads.push_back(Ok(b"ABCDEFGH".to_vec()));
        let mut link = PumpLink::new(stream, PumpLinkConfig { max_reply_len: 4 }).unwrap();

        let reply = link.send_command(&PumpCommand::Brake).unwrap();
        assert_eq!(reply.as_bytes(), b"ABCD");
        assert_eq!(link.config().max_reply_len, 4);
    }

    #[test]
    fn test_exactly_one_read_per_command() {
        let mut stream = ScriptedStream::default();
        stream.reads.push_back(Ok(b"first".to_vec()));
        stream.reads.push_back(Ok(b"second".to_vec()));
        let mut link = PumpLink::new(stream, PumpLinkConfig::default()).unwrap();

        assert_eq!(link.send_command(&PumpCommand::Start).unwrap().text(), "first");
        assert_eq!(link.send_command(&PumpCommand::Stop).unwrap().text(), "second");
        assert_eq!(link.get_ref().written, b"GE");
    }

    #[test]
    fn test_read_error_maps_to_pump_io() {
        let mut stream = ScriptedStream::default();
        stream
            .reads
            .push_back(Err(io::Error::new(ErrorKind::ConnectionReset, "reset")));
        let mut link = PumpLink::new(stream, PumpLinkConfig::default()).unwrap();

        match link.send_command(&PumpCommand::Clockwise) {
            Err(DriverError::PumpIo { command, source }) => {
                assert_eq!(command, "C");
                assert_eq!(source.kind(), ErrorKind::ConnectionReset);
            },
            other => panic!("Expected PumpIo, got {:?}", other),
        }
    }

    #[test]
    fn test_connect_refused_is_connect_error() {
        // 绑定后立即释放端口，随后连接应被拒绝
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        match PumpLink::connect(&addr, PumpLinkConfig::default()) {
            Err(DriverError::Connect { addr: a, .. }) => assert_eq!(a, addr),
            Err(other) => panic!("Expected Connect, got {:?}", other),
            Ok(_) => panic!("Expected connection failure"),
        }
    }

    #[test]
    fn test_zero_reply_len_rejected() {
        let stream = ScriptedStream::default();
        let config = PumpLinkConfig { max_reply_len: 0 };
        assert!(matches!(
            PumpLink::new(stream, config),
            Err(DriverError::Config(_))
        ));
    }

    #[test]
    fn test_zero_reply_len_rejected_before_connecting() {
        // 对端在监听，连接本身会成功；配置检查必须先于连接
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let result = PumpLink::connect(&addr, PumpLinkConfig { max_reply_len: 0 });
        assert!(matches!(result, Err(DriverError::Config(_))));
    }

    #[test]
    fn test_one_byte_reply_len_waits_for_pump() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let pump = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 8];
            let n = stream.read(&mut buf).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(20));
            stream.write_all(b"ACK").unwrap();
            buf[..n].to_vec()
        });

        let mut link = PumpLink::connect(&addr, PumpLinkConfig { max_reply_len: 1 }).unwrap();
        let reply = link.send_command(&PumpCommand::Init).unwrap();
        assert_eq!(reply.as_bytes(), b"A");
        assert_eq!(pump.join().unwrap(), b"I");
    }

    #[test]
    fn test_connect_bad_address() {
        assert!(matches!(
            PumpLink::connect("not an address", PumpLinkConfig::default()),
            Err(DriverError::Connect { .. })
        ));
    }
}
