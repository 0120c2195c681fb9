//! Genie 串口帧编解码
//!
//! 帧格式：
//!
//! ```text
//! 写对象 / 回报：[cmd, object, index, msb, lsb, checksum]   （6 字节）
//! 写字符串：    [0x02, index, len, bytes..., checksum]
//! 确认：        [0x06] / [0x15]                          （1 字节）
//! ```
//!
//! `checksum` 为前面所有字节的 XOR。

use crate::ids::{GENIE_ACK, GENIE_NAK, GenieCommand, GenieObject};
use crate::reply::{DisplayReply, ObjectWrite};
use crate::{ProtocolError, bytes_to_u16_be, checksum, u16_to_bytes_be};

/// 6 字节对象帧长度
pub const GENIE_FRAME_LEN: usize = 6;

/// 单帧写字符串的最大长度（长度字段为 1 字节）
pub const GENIE_MAX_STRING_LEN: usize = u8::MAX as usize;

/// 编码写对象帧
///
/// # Example
///
/// ```rust
/// use pumpctl_protocol::{GenieObject, ObjectWrite, encode_write_object, checksum};
///
/// let frame = encode_write_object(&ObjectWrite::new(GenieObject::LedDigits, 0, 42));
/// assert_eq!(&frame[..5], &[0x01, 15, 0, 0, 42]);
/// assert_eq!(checksum(&frame), 0);
/// ```
pub fn encode_write_object(write: &ObjectWrite) -> [u8; GENIE_FRAME_LEN] {
    let [msb, lsb] = u16_to_bytes_be(write.value);
    let mut frame = [
        GenieCommand::WriteObject.into(),
        write.object.into(),
        write.index,
        msb,
        lsb,
        0,
    ];
    frame[5] = checksum(&frame[..5]);
    frame
}

/// 编码写字符串帧（ASCII）
///
/// # Errors
/// - `ProtocolError::StringTooLong`: 字符串超过 255 字节
pub fn encode_write_string(index: u8, text: &str) -> Result<Vec<u8>, ProtocolError> {
    let bytes = text.as_bytes();
    if bytes.len() > GENIE_MAX_STRING_LEN {
        return Err(ProtocolError::StringTooLong {
            len: bytes.len(),
            max: GENIE_MAX_STRING_LEN,
        });
    }

    let mut frame = Vec::with_capacity(bytes.len() + 4);
    frame.push(GenieCommand::WriteString.into());
    frame.push(index);
    frame.push(bytes.len() as u8);
    frame.extend_from_slice(bytes);
    frame.push(checksum(&frame));
    Ok(frame)
}

/// 解码一个完整的 6 字节回报帧
pub fn decode_reply(frame: &[u8]) -> Result<DisplayReply, ProtocolError> {
    if frame.len() != GENIE_FRAME_LEN {
        return Err(ProtocolError::InvalidLength {
            expected: GENIE_FRAME_LEN,
            actual: frame.len(),
        });
    }

    let sum = checksum(frame);
    if sum != 0 {
        return Err(ProtocolError::ChecksumMismatch {
            expected: checksum(&frame[..5]),
            actual: frame[5],
        });
    }

    Ok(DisplayReply {
        command: GenieCommand::from(frame[0]),
        object: GenieObject::from(frame[1]),
        index: frame[2],
        payload: bytes_to_u16_be([frame[3], frame[4]]),
    })
}

/// 显示屏发来的一个单元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// 写操作被确认
    Ack,
    /// 写操作被拒绝
    Nak,
    /// 回报帧
    Reply(DisplayReply),
}

/// 流式帧解码器
///
/// 串口读到的字节可能在任意位置被截断，解码器负责缓存并切分出完整单元：
/// - ACK / NAK 单字节直接产出
/// - 回报命令字节开头的 6 字节帧校验通过后产出
/// - 其它字节（噪声、校验失败帧的首字节）被丢弃并计数，随后重新同步
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    discarded: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加字节并取出所有已完整的单元
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Inbound> {
        self.buffer.extend_from_slice(bytes);

        let mut out = Vec::new();
        let mut pos = 0;
        while pos < self.buffer.len() {
            let head = self.buffer[pos];
            match head {
                GENIE_ACK => {
                    out.push(Inbound::Ack);
                    pos += 1;
                },
                GENIE_NAK => {
                    out.push(Inbound::Nak);
                    pos += 1;
                },
                _ if GenieCommand::from(head).is_inbound_frame() => {
                    if self.buffer.len() - pos < GENIE_FRAME_LEN {
                        // 等待更多字节
                        break;
                    }
                    match decode_reply(&self.buffer[pos..pos + GENIE_FRAME_LEN]) {
                        Ok(reply) => {
                            out.push(Inbound::Reply(reply));
                            pos += GENIE_FRAME_LEN;
                        },
                        Err(_) => {
                            // 校验失败：丢弃首字节，从下一个字节重新同步
                            self.discarded += 1;
                            pos += 1;
                        },
                    }
                },
                _ => {
                    self.discarded += 1;
                    pos += 1;
                },
            }
        }

        self.buffer.drain(..pos);
        out
    }

    /// 为重新同步丢弃的字节数
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// 当前缓存中尚未成帧的字节数
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(object: u8, index: u8, value: u16) -> Vec<u8> {
        let [msb, lsb] = value.to_be_bytes();
        let mut frame = vec![0x07, object, index, msb, lsb];
        frame.push(checksum(&frame));
        frame
    }

    #[test]
    fn test_encode_write_object_layout() {
        let frame = encode_write_object(&ObjectWrite::new(GenieObject::CoolGauge, 0, 0x0163));
        assert_eq!(frame[0], 0x01);
        assert_eq!(frame[1], 8);
        assert_eq!(frame[2], 0);
        assert_eq!(frame[3], 0x01);
        assert_eq!(frame[4], 0x63);
        assert_eq!(checksum(&frame), 0);
    }

    #[test]
    fn test_encode_write_string() {
        let frame = encode_write_string(0, "OK").unwrap();
        assert_eq!(&frame[..5], &[0x02, 0x00, 0x02, b'O', b'K']);
        assert_eq!(checksum(&frame), 0);
    }

    #[test]
    fn test_encode_write_string_too_long() {
        let text = "x".repeat(256);
        let err = encode_write_string(0, &text).unwrap_err();
        assert_eq!(err, ProtocolError::StringTooLong { len: 256, max: 255 });
    }

    #[test]
    fn test_decode_reply_ok() {
        let reply = decode_reply(&report(4, 0, 42)).unwrap();
        assert_eq!(reply, DisplayReply::report_event(GenieObject::Slider, 0, 42));
    }

    #[test]
    fn test_decode_reply_bad_checksum() {
        let mut frame = report(30, 2, 1);
        frame[5] ^= 0xFF;
        assert!(matches!(
            decode_reply(&frame),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_reply_bad_length() {
        assert_eq!(
            decode_reply(&[0x07, 4, 0]),
            Err(ProtocolError::InvalidLength {
                expected: 6,
                actual: 3
            })
        );
    }

    #[test]
    fn test_decoder_split_across_reads() {
        let mut decoder = FrameDecoder::new();
        let frame = report(4, 0, 300);

        assert!(decoder.push(&frame[..2]).is_empty());
        assert_eq!(decoder.pending(), 2);
        let out = decoder.push(&frame[2..]);
        assert_eq!(
            out,
            vec![Inbound::Reply(DisplayReply::report_event(
                GenieObject::Slider,
                0,
                300
            ))]
        );
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_decoder_ack_nak_interleaved() {
        let mut decoder = FrameDecoder::new();
        let mut bytes = vec![GENIE_ACK];
        bytes.extend(report(30, 1, 0));
        bytes.push(GENIE_NAK);

        let out = decoder.push(&bytes);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Inbound::Ack);
        assert!(matches!(out[1], Inbound::Reply(r) if r.index == 1));
        assert_eq!(out[2], Inbound::Nak);
    }

    #[test]
    fn test_decoder_resyncs_after_garbage() {
        let mut decoder = FrameDecoder::new();
        let mut bytes = vec![0xAA, 0xBB];
        bytes.extend(report(30, 3, 1));

        let out = decoder.push(&bytes);
        assert_eq!(
            out,
            vec![Inbound::Reply(DisplayReply::report_event(
                GenieObject::Button4D,
                3,
                1
            ))]
        );
        assert_eq!(decoder.discarded(), 2);
    }

    #[test]
    fn test_decoder_resyncs_after_bad_checksum() {
        let mut decoder = FrameDecoder::new();
        let mut bad = report(4, 0, 1);
        bad[5] ^= 0x01;
        let mut bytes = bad;
        bytes.extend(report(4, 0, 2));

        let out = decoder.push(&bytes);
        let replies: Vec<_> = out
            .iter()
            .filter_map(|i| match i {
                Inbound::Reply(r) => Some(r.payload),
                _ => None,
            })
            .collect();
        assert_eq!(replies, vec![2]);
        assert!(decoder.discarded() >= 1);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encoded_write_object_xors_to_zero(obj in any::<u8>(), idx in any::<u8>(), value in any::<u16>()) {
                let frame = encode_write_object(&ObjectWrite::new(GenieObject::from(obj), idx, value));
                prop_assert_eq!(checksum(&frame), 0);
            }

            #[test]
            fn report_frames_survive_arbitrary_chunking(value in any::<u16>(), split in 0usize..6) {
                let frame = report(4, 0, value);
                let mut decoder = FrameDecoder::new();
                let mut out = decoder.push(&frame[..split]);
                out.extend(decoder.push(&frame[split..]));
                prop_assert_eq!(out, vec![Inbound::Reply(DisplayReply::report_event(GenieObject::Slider, 0, value))]);
            }
        }
    }
}
