use bytes::{Bytes, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

use super::packet::Packet;
use super::FramingError;

/// Lines longer than this are dropped without waiting for the line end.
const MAX_LINE_LEN: usize = 256;

/// One input line and the packet framed from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Line as received, without surrounding whitespace
    pub line: Bytes,
    pub packet: Result<Packet, FramingError>,
}

impl Frame {
    fn new(raw: Bytes) -> Self {
        let start = raw
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(raw.len());
        let end = raw
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(start, |n| n + 1);
        let line = raw.slice(start..end);

        let packet = if line.is_empty() {
            Err(FramingError::Empty)
        } else if !line.is_ascii() {
            Err(FramingError::NonAscii)
        } else {
            Packet::try_from(line.as_ref())
        };
        Self { line, packet }
    }
}

/// Splits the byte stream of a meter into line based frames.
#[derive(Debug, Default)]
pub struct PacketCodec {
    // Inside an overlong line that was already reported
    discarding: bool,
}

impl Decoder for PacketCodec {
    type Item = Frame;
    // Framing problems are reported inside the frame, only the
    // transport can fail here.
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match src.iter().position(|b| *b == b'\n') {
                Some(offset) => {
                    let line = src.split_to(offset + 1).freeze();
                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }
                    return Ok(Some(Frame::new(line)));
                }
                None if src.len() > MAX_LINE_LEN => {
                    let line = src.split().freeze();
                    if self.discarding {
                        return Ok(None);
                    }
                    self.discarding = true;
                    let len = line.len();
                    return Ok(Some(Frame {
                        line,
                        packet: Err(FramingError::InvalidLength(len)),
                    }));
                }
                None => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() || self.discarding {
            src.clear();
            self.discarding = false;
            Ok(None)
        } else {
            Ok(Some(Frame::new(src.split().freeze())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<Frame> {
        let mut codec = PacketCodec::default();
        let mut buf = BytesMut::from(input);
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            frames.push(frame);
        }
        while let Some(frame) = codec.decode_eof(&mut buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_lines() {
        let frames = decode_all(b"06000;008\r\n06000;008");
        assert_eq!(frames.len(), 2);
        for frame in frames {
            assert_eq!(frame.line.as_ref(), b"06000;008");
            assert!(frame.packet.is_ok());
        }
    }

    #[test]
    fn test_partial_line() {
        let mut codec = PacketCodec::default();
        let mut buf = BytesMut::from(&b"0600"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"0;008\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(
            frame.packet.unwrap().as_bytes(),
            &[0x30, 0x36, 0x30, 0x30, 0x30, 0x3b, 0x30, 0x30, 0x38]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_framing_errors() {
        let frames = decode_all(b"\r\n0600\n06000;008\xb0\n");
        let errors: Vec<_> = frames.into_iter().map(|f| f.packet.unwrap_err()).collect();
        assert_eq!(
            errors,
            vec![
                FramingError::Empty,
                FramingError::InvalidLength(4),
                FramingError::NonAscii
            ]
        );
    }

    #[test]
    fn test_overlong_line() {
        let mut input = vec![b'0'; MAX_LINE_LEN + 10];
        input.extend_from_slice(b"\n06000;008\n");
        let mut codec = PacketCodec::default();
        let mut buf = BytesMut::from(&input[..MAX_LINE_LEN + 1]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(
            frame.packet,
            Err(FramingError::InvalidLength(MAX_LINE_LEN + 1))
        );
        buf.extend_from_slice(&input[MAX_LINE_LEN + 1..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.line.as_ref(), b"06000;008");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }
}
