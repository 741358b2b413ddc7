//!
//! This library provides communication with Pfeiffer TPG 261/262 vacuum gauge controllers.
//!
//! <br>
//!
//! # Details
//!
//! - The controller is connected through its RS-232 interface (9600 baud, 8N1).
//!
//! - Basic setup and connection
//!
//!   ```no_run
//!   use tpg26x::{Device, DEFAULT_BAUDRATE};
//!   #[tokio::main]
//!   async fn main() -> tpg26x::Result<()> {
//!       let path = "/dev/ttyUSB0".to_string();
//!       let mut device = Device::new(&path, DEFAULT_BAUDRATE)?;
//!       let (first, second) = device.identification().await?;
//!       eprintln!("Gauges: {}, {}\n", first, second);
//!       eprintln!("Pressure: {}", device.pressure_measurement(1).await?);
//!       Ok(())
//!   }
//!   ```
//!
//! - Continuous mode
//!
//!   ```no_run
//!   # async fn stream(device: &mut tpg26x::Device) -> tpg26x::Result<()> {
//!   let mut stream = device.start_continuous_measurement(1).await?;
//!   for _ in 0..10 {
//!       let (first, second) = stream.read_frame().await?;
//!       println!("{} {}", first, second);
//!   }
//!   stream.stop().await?;
//!   # Ok(())
//!   # }
//!   ```
//!
//! # Supported devices
//!
//!  * Pfeiffer TPG 261
//!  * Pfeiffer TPG 262
//!

use std::time::Duration;

pub mod continuous;
pub mod device;
pub mod measurement;
pub mod proto;

pub use continuous::ContinuousMeasurement;
pub use device::{Device, Settings};
pub use measurement::Measurement;
pub use proto::Result;

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Default Baudrate for TPG 261 and 262.
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Default timeout for a single read or write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
