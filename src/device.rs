use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::{io, pin::Pin};
use tokio::io::AsyncRead;
use tokio_serial::{DataBits, Parity, SerialPort, SerialPortBuilderExt, StopBits};
use tokio_util::codec::FramedRead;
use tracing::{debug, trace};

use crate::measurement::Measurement;
use crate::proto::codec::{Frame, PacketCodec};
use crate::proto::{DecodeError, Result};

type FrameStream = Pin<Box<dyn Stream<Item = std::result::Result<Frame, io::Error>> + Send>>;

/// Decode result of one input line
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Offending or accepted raw line
    pub raw: Bytes,
    pub result: std::result::Result<Measurement, DecodeError>,
}

impl From<Frame> for Reading {
    fn from(frame: Frame) -> Self {
        let result = frame
            .packet
            .map_err(DecodeError::from)
            .and_then(|packet| packet.decode());
        Self {
            raw: frame.line,
            result,
        }
    }
}

/// Packet source, a serial port or any byte stream carrying one packet per line.
pub struct Device {
    stream: FrameStream,
}

impl Device {
    /// Open a serial port with the 7O1 line settings used by ES51922 meters.
    pub fn new(com: impl AsRef<str>, baudrate: u32) -> Result<Self> {
        let mut port = tokio_serial::new(com.as_ref(), baudrate)
            .data_bits(DataBits::Seven)
            .parity(Parity::Odd)
            .stop_bits(StopBits::One)
            .open_native_async()?;

        #[cfg(unix)]
        port.set_exclusive(false)?;

        // The optocoupler of the cable is powered by DTR
        port.write_data_terminal_ready(true)?;
        port.write_request_to_send(false)?;

        Ok(Self::from_reader(port))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            stream: Box::pin(FramedRead::new(reader, PacketCodec::default())),
        }
    }

    #[cfg(test)]
    pub fn new_faked(response_buf: Vec<u8>) -> Self {
        Self::from_reader(std::io::Cursor::new(response_buf))
    }

    /// Next framed line, `None` at end of input
    pub async fn next_frame(&mut self) -> Option<Result<Frame>> {
        let frame = self.stream.next().await?;
        if let Ok(frame) = &frame {
            trace!(line = ?frame.line, "frame received");
            if let Err(err) = &frame.packet {
                debug!(line = ?frame.line, "framing failed: {}", err);
            }
        }
        Some(frame.map_err(Into::into))
    }

    /// Next decoded line, `None` at end of input
    pub async fn next_reading(&mut self) -> Option<Result<Reading>> {
        self.next_frame()
            .await
            .map(|frame| frame.map(Reading::from))
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::measurement::Operation;
    use crate::proto::FramingError;

    #[tokio::test]
    async fn test_read_measurements() {
        let mut device = Device::new_faked(b"06000;008\r\n06000;108\r\n".to_vec());
        let first = device.next_reading().await.unwrap().unwrap();
        assert_eq!(first.result.unwrap().to_string(), "6.000 V");
        let second = device.next_reading().await.unwrap().unwrap();
        assert_eq!(second.result.unwrap().operation, Operation::Overload);
        assert!(device.next_reading().await.is_none());
    }

    #[tokio::test]
    async fn test_bad_lines_keep_stream_alive() {
        let mut device = Device::new_faked(b"0600\r\n06000:008\r\n\r\n06000;008\r\n".to_vec());
        let short = device.next_reading().await.unwrap().unwrap();
        assert_eq!(short.raw.as_ref(), b"0600");
        assert_eq!(
            short.result,
            Err(DecodeError::Framing(FramingError::InvalidLength(4)))
        );
        let unknown = device.next_reading().await.unwrap().unwrap();
        assert_eq!(unknown.result, Err(DecodeError::UnknownFunction(0x0a)));
        let empty = device.next_reading().await.unwrap().unwrap();
        assert_eq!(
            empty.result,
            Err(DecodeError::Framing(FramingError::Empty))
        );
        let good = device.next_reading().await.unwrap().unwrap();
        assert!(good.result.is_ok());
        assert!(device.next_reading().await.is_none());
    }
}
