//! 集成测试公共设施
//!
//! - `FakePump`: 本地 `TcpListener` 上的假泵，记录收到的每条命令并回 `"OK"`
//! - `ScriptedStream`: 按脚本返回读取结果的内存流
#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// 假泵控制器
pub struct FakePump {
    addr: String,
    received: Arc<Mutex<Vec<String>>>,
    _handle: JoinHandle<()>,
}

impl FakePump {
    /// 在随机端口上监听，只接受一个连接
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake pump");
        let addr = listener.local_addr().expect("local addr").to_string();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let handle = std::thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut buf = [0u8; 64];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let token = String::from_utf8_lossy(&buf[..n]).into_owned();
                        received_clone.lock().push(token);
                        if stream.write_all(b"OK").is_err() {
                            break;
                        }
                    },
                }
            }
        });

        Self {
            addr,
            received,
            _handle: handle,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// 已收到的命令（按到达顺序）
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }
}

/// 内存双工流：写入被记录，读取按脚本返回，脚本耗尽后回 `"OK"`
#[derive(Clone, Default)]
pub struct ScriptedStream {
    pub written: Arc<Mutex<Vec<u8>>>,
    reads: Arc<Mutex<VecDeque<io::Result<Vec<u8>>>>>,
}

impl ScriptedStream {
    pub fn with_reads(reads: impl IntoIterator<Item = io::Result<Vec<u8>>>) -> Self {
        Self {
            written: Arc::default(),
            reads: Arc::new(Mutex::new(reads.into_iter().collect())),
        }
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.lock().clone()
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = match self.reads.lock().pop_front() {
            Some(Err(e)) => return Err(e),
            Some(Ok(bytes)) => bytes,
            None => b"OK".to_vec(),
        };
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn reset_error() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by pump")
}

/// 轮询直到条件成立或超时
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// 初始化测试日志（重复调用无害）
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("pumpctl=debug")
        .try_init();
}
