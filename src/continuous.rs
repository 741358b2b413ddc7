//! Continuous mode: the controller sends a measurement frame for both gauges
//! at a fixed rate without being asked.
//!
//! While streaming, the gauge answers no regular command, so the stream
//! borrows the [`Device`] mutably until it is stopped.

use tracing::debug;

use crate::device::Device;
use crate::measurement::Measurement;
use crate::proto::command::{Command, ContinuousMode};
use crate::proto::{ProtoError, Result};

/// A running continuous measurement.
///
/// Dropping it without calling [`ContinuousMeasurement::stop`] leaves the
/// controller streaming; [`Device::stop_continuous_measurement`] recovers.
pub struct ContinuousMeasurement<'a> {
    device: &'a mut Device,
    mode: ContinuousMode,
}

impl Device {
    /// Starts streaming. `mode` selects the rate: 0 every 100 ms, 1 every
    /// second, 2 every minute.
    pub async fn start_continuous_measurement(
        &mut self,
        mode: u8,
    ) -> Result<ContinuousMeasurement<'_>> {
        let mode = ContinuousMode::try_from(mode)?;
        // An enquiry would interrupt the stream the gauge starts after ACK.
        self.protocol.skip_next_enquiry(true);
        self.protocol
            .query::<&str>(&Command::ContinuousMeasurement(mode).header(), &[])
            .await?;
        debug!("Continuous measurement started: {:?}", mode);
        Ok(ContinuousMeasurement { device: self, mode })
    }

    /// Interrupts a continuous measurement and drops whatever it left on the
    /// line. Safe to call when the controller is not streaming.
    pub async fn stop_continuous_measurement(&mut self) -> Result<()> {
        // Any command ends the stream; it is never acknowledged though.
        let interrupted = self.protocol.query::<&str>(&Command::Reset.header(), &[]).await;
        let cleared = self.protocol.clear_buffer().await;
        match interrupted {
            Ok(_) => {}
            Err(ProtoError::Communication(err)) => {
                debug!("Stream interrupted: {}", err);
            }
            Err(err) => return Err(err),
        }
        cleared
    }
}

impl ContinuousMeasurement<'_> {
    pub fn mode(&self) -> ContinuousMode {
        self.mode
    }

    /// Waits for the next frame and returns the readings of gauge 1 and 2.
    pub async fn read_frame(&mut self) -> Result<(Measurement, Measurement)> {
        let tokens = self.device.protocol.read_response().await?;
        let values = Command::ContinuousMeasurement(self.mode)
            .shape()
            .decode(&tokens)?;
        Measurement::pair_from_values(values)
    }

    pub async fn stop(self) -> Result<()> {
        self.device.stop_continuous_measurement().await
    }
}
