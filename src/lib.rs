//!
//! This library decodes the packets of digital multimeters based on the
//! Cyrustek ES51922 chipset.
//!
//! <br>
//!
//! # Details
//!
//! - A packet is 9 bytes, usually received as one ASCII line from the
//!   meter's optical cable. There is no checksum, only the fixed bits of
//!   the option bytes are checked.
//!
//! - Decoding a single packet
//!
//!   ```
//!   let mea = es51922::parse(&[0x00, 6, 0, 0, 0, 0x0b, 0x00, 0x00, 0x08])?;
//!   assert_eq!(mea.to_string(), "6.000 V");
//!   assert_eq!(mea.value, Some(6.0));
//!   # Ok::<(), es51922::DecodeError>(())
//!   ```
//!
//! - Reading from a meter
//!
//!   ```no_run
//!   use es51922::{Device, DEFAULT_BAUDRATE};
//!   #[tokio::main]
//!   async fn main() -> es51922::Result<()> {
//!       let mut device = Device::new("/dev/ttyUSB0", DEFAULT_BAUDRATE)?;
//!       while let Some(reading) = device.next_reading().await {
//!           if let Ok(mea) = reading?.result {
//!               println!("{}", mea);
//!           }
//!       }
//!       Ok(())
//!   }
//!   ```
//!
//! # Supported devices
//!
//!  * UNI-T UT61E
//!  * other meters built on the ES51922
//!

pub mod device;
pub mod measurement;
pub mod proto;

pub use device::{Device, Reading};
pub use measurement::Measurement;
pub use proto::packet::{parse, Packet};
pub use proto::{DecodeError, Error, Result};

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Default Baudrate for UT61E.
pub const DEFAULT_BAUDRATE: u32 = 19200;
