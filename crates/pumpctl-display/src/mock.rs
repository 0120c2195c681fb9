//! Mock 显示屏
//!
//! 用于测试的内存显示屏：回报从队列中取出，所有写操作按顺序记录。

use crate::{DisplayError, DisplayTransport};
use parking_lot::Mutex;
use pumpctl_protocol::{DisplayReply, GenieObject, ObjectWrite};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 记录下来的写操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockWrite {
    Object(ObjectWrite),
    String { index: u8, text: String },
}

/// 内存显示屏
#[derive(Debug, Default)]
pub struct MockDisplay {
    inbox: Mutex<VecDeque<DisplayReply>>,
    writes: Mutex<Vec<MockWrite>>,
    fail_writes: AtomicBool,
    closed: AtomicBool,
    polls: AtomicU64,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置回报队列
    pub fn with_replies(replies: impl IntoIterator<Item = DisplayReply>) -> Self {
        let display = Self::new();
        display.inbox.lock().extend(replies);
        display
    }

    /// 追加一条回报（模拟用户操作）
    pub fn push_reply(&self, reply: DisplayReply) {
        self.inbox.lock().push_back(reply);
    }

    /// 剩余未取出的回报数
    pub fn pending_replies(&self) -> usize {
        self.inbox.lock().len()
    }

    /// `reply_available` 被调用的次数
    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    /// 所有写操作（按发生顺序）
    pub fn writes(&self) -> Vec<MockWrite> {
        self.writes.lock().clone()
    }

    /// 写入指定对象类型的值（按发生顺序）
    pub fn values_written_to(&self, object: GenieObject) -> Vec<u16> {
        self.writes
            .lock()
            .iter()
            .filter_map(|w| match w {
                MockWrite::Object(o) if o.object == object => Some(o.value),
                _ => None,
            })
            .collect()
    }

    /// 让后续写操作失败
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// 模拟传输层失效
    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    fn record(&self, write: MockWrite) -> Result<(), DisplayError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(DisplayError::Closed);
        }
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(DisplayError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        self.writes.lock().push(write);
        Ok(())
    }
}

impl DisplayTransport for MockDisplay {
    fn reply_available(&self) -> bool {
        self.polls.fetch_add(1, Ordering::Relaxed);
        !self.inbox.lock().is_empty()
    }

    fn next_reply(&self) -> Result<Option<DisplayReply>, DisplayError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(DisplayError::Closed);
        }
        Ok(self.inbox.lock().pop_front())
    }

    fn write_object(&self, write: ObjectWrite) -> Result<(), DisplayError> {
        self.record(MockWrite::Object(write))
    }

    fn write_string(&self, index: u8, text: &str) -> Result<(), DisplayError> {
        self.record(MockWrite::String {
            index,
            text: text.to_string(),
        })
    }

    fn is_healthy(&self) -> bool {
        !self.closed.load(Ordering::Relaxed)
    }
}
