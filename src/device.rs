use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::measurement::Measurement;
use crate::proto::command::{Command, Gauge};
use crate::proto::lock::InterProcessLock;
use crate::proto::protocol::Protocol;
use crate::proto::transport::{SharedTransport, Transport};
use crate::proto::types::{
    ErrorStatus, GaugeStatus, Identification, PressureUnit, ResetCause, Value,
};
use crate::proto::{ProtoError, Result};
use crate::{DEFAULT_BAUDRATE, DEFAULT_TIMEOUT, DEFAULT_TTY};

/// How to reach the gauge controller.
#[derive(Debug, Clone)]
pub struct Settings {
    pub tty: String,
    pub baudrate: u32,
    /// Applies to every single read and write.
    pub timeout: Duration,
    /// Advisory lock file shared with other processes using the same port.
    pub lock_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tty: DEFAULT_TTY.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            timeout: DEFAULT_TIMEOUT,
            lock_file: None,
        }
    }
}

/// A Pfeiffer TPG 261/262 controller.
pub struct Device {
    pub(crate) protocol: Protocol,
}

impl Device {
    pub fn new(com: impl AsRef<str>, baudrate: u32) -> Result<Self> {
        Self::open(&Settings {
            tty: com.as_ref().to_string(),
            baudrate,
            ..Settings::default()
        })
    }

    pub fn open(settings: &Settings) -> Result<Self> {
        let transport = Transport::open(&settings.tty, settings.baudrate, settings.timeout)?;
        let lock = match &settings.lock_file {
            Some(path) => InterProcessLock::open(path)?,
            None => InterProcessLock::disabled(),
        };
        Ok(Self::with_transport(transport.shared(), lock))
    }

    /// Attaches to a transport that may be shared with other devices.
    pub fn with_transport(transport: SharedTransport, lock: InterProcessLock) -> Self {
        Self {
            protocol: Protocol::new(transport, lock),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_faked(response_buf: &[&[u8]]) -> (Self, crate::proto::fake::FakeHandle) {
        let (fake, handle) = crate::proto::fake::FakeSerial::new(response_buf);
        let transport = Transport::new(fake, Duration::from_millis(20));
        (
            Self::with_transport(transport.shared(), InterProcessLock::disabled()),
            handle,
        )
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut Protocol {
        &mut self.protocol
    }

    pub(crate) async fn query(&mut self, cmd: Command) -> Result<Vec<Value>> {
        let tokens = self.protocol.query::<&str>(&cmd.header(), &[]).await?;
        let values = cmd.shape().decode(&tokens)?;
        debug!("{:?}: {:?}", cmd, values);
        Ok(values)
    }

    pub async fn identification(&mut self) -> Result<(Identification, Identification)> {
        let values = self.query(Command::Identification).await?;
        if let [Value::Identification(first), Value::Identification(second)] = values.as_slice()
        {
            return Ok((*first, *second));
        }
        Err(ProtoError::Unexpected(values))
    }

    pub async fn turn_on_first_gauge(&mut self) -> Result<(GaugeStatus, GaugeStatus)> {
        self.switch(Command::TurnOnFirstGauge).await
    }

    pub async fn turn_off_first_gauge(&mut self) -> Result<(GaugeStatus, GaugeStatus)> {
        self.switch(Command::TurnOffFirstGauge).await
    }

    async fn switch(&mut self, cmd: Command) -> Result<(GaugeStatus, GaugeStatus)> {
        let values = self.query(cmd).await?;
        if let [Value::GaugeStatus(first), Value::GaugeStatus(second)] = values.as_slice() {
            return Ok((*first, *second));
        }
        Err(ProtoError::Unexpected(values))
    }

    pub async fn error_status(&mut self) -> Result<ErrorStatus> {
        let values = self.query(Command::ErrorStatus).await?;
        if let [Value::ErrorStatus(status)] = values.as_slice() {
            return Ok(*status);
        }
        Err(ProtoError::Unexpected(values))
    }

    /// Resets the controller and returns the errors that were pending.
    pub async fn reset(&mut self) -> Result<Vec<ResetCause>> {
        let values = self.query(Command::Reset).await?;
        let causes: Option<Vec<ResetCause>> = values
            .iter()
            .map(|value| match value {
                Value::ResetCause(cause) => Some(*cause),
                _ => None,
            })
            .collect();
        causes.ok_or(ProtoError::Unexpected(values))
    }

    /// Selects the unit by its wire code: 0 mbar/bar, 1 Torr, 2 Pascal.
    pub async fn set_pressure_unit(&mut self, unit: u8) -> Result<PressureUnit> {
        let values = self.query(Command::set_pressure_unit(unit)?).await?;
        if let [Value::PressureUnit(unit)] = values.as_slice() {
            return Ok(*unit);
        }
        Err(ProtoError::Unexpected(values))
    }

    pub async fn set_unit(&mut self, unit: PressureUnit) -> Result<PressureUnit> {
        let values = self.query(Command::SetPressureUnit(unit)).await?;
        if let [Value::PressureUnit(unit)] = values.as_slice() {
            return Ok(*unit);
        }
        Err(ProtoError::Unexpected(values))
    }

    /// Reads gauge 1 or 2.
    pub async fn pressure_measurement(&mut self, gauge: u8) -> Result<Measurement> {
        let cmd = Command::pressure_measurement(gauge)?;
        Measurement::from_values(self.query(cmd).await?)
    }

    pub async fn measure(&mut self, gauge: Gauge) -> Result<Measurement> {
        Measurement::from_values(self.query(Command::PressureMeasurement(gauge)).await?)
    }

    /// Pressure of the first gauge, whatever its status.
    pub async fn pressure(&mut self) -> Result<f64> {
        Ok(self.measure(Gauge::First).await?.pressure)
    }

    /// Sends `<ETX>` to reset the serial interface of the controller.
    pub async fn reset_line(&mut self) -> Result<()> {
        self.protocol.reset_line().await
    }

    pub async fn clear_buffer(&mut self) -> Result<()> {
        self.protocol.clear_buffer().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::types::{Mapping, PressureStatus};
    use crate::proto::{CommunicationError, DecodingError};

    #[tokio::test]
    async fn test_get_identification() {
        let (mut device, handle) = Device::new_faked(&[b"\x06\r\n", b"TPR,noid\r\n"]);
        let (first, second) = device.identification().await.unwrap();
        assert_eq!(first.label(), "Pirani Gauge or Pirani Capacitive gauge");
        assert_eq!(second.label(), "no identifier");
        assert_eq!(handle.written(), b"TID\r\n\x05");
    }

    #[tokio::test]
    async fn test_get_pressure_measurement() {
        let (mut device, handle) = Device::new_faked(&[b"\x06\r\n", b"0,1.013e+00\r\n"]);
        let mea = device.pressure_measurement(1).await.unwrap();
        assert_eq!(mea.status.label(), "Measurement data okay");
        assert_eq!(mea.pressure, 1.013);
        assert_eq!(handle.written(), b"PR1\r\n\x05");
    }

    #[tokio::test]
    async fn test_get_pressure() {
        let (mut device, handle) = Device::new_faked(&[b"\x06\r\n1,2.0000E-04\r\n"]);
        assert_eq!(device.pressure().await.unwrap(), 2.0e-4);
        assert_eq!(handle.written(), b"PR1\r\n\x05");
    }

    #[tokio::test]
    async fn test_second_gauge() {
        let (mut device, handle) = Device::new_faked(&[b"\x06\r\n5,0.0000E+00\r\n"]);
        let mea = device.measure(Gauge::Second).await.unwrap();
        assert_eq!(mea.status, PressureStatus::NoSensor);
        assert_eq!(handle.written(), b"PR2\r\n\x05");
    }

    #[tokio::test]
    async fn test_invalid_arguments_do_no_io() {
        let (mut device, handle) = Device::new_faked(&[]);
        assert!(matches!(
            device.pressure_measurement(3).await,
            Err(ProtoError::InvalidArgument { .. })
        ));
        assert!(matches!(
            device.set_pressure_unit(5).await,
            Err(ProtoError::InvalidArgument { .. })
        ));
        assert!(matches!(
            device.start_continuous_measurement(9).await,
            Err(ProtoError::InvalidArgument { .. })
        ));
        assert!(handle.written().is_empty());
    }

    #[tokio::test]
    async fn test_switch_gauge() {
        let (mut device, handle) = Device::new_faked(&[b"\x06\r\n2,0\r\n", b"\x06\r\n1,0\r\n"]);
        assert_eq!(
            device.turn_on_first_gauge().await.unwrap(),
            (GaugeStatus::On, GaugeStatus::NotSwitchable)
        );
        assert_eq!(
            device.turn_off_first_gauge().await.unwrap(),
            (GaugeStatus::Off, GaugeStatus::NotSwitchable)
        );
        assert_eq!(handle.written(), b"SEN,2,0\r\n\x05SEN,1,0\r\n\x05");
    }

    #[tokio::test]
    async fn test_error_status() {
        let (mut device, _handle) = Device::new_faked(&[b"\x06\r\n0010\r\n"]);
        assert_eq!(device.error_status().await.unwrap(), ErrorStatus::Parameter);
    }

    #[tokio::test]
    async fn test_reset() {
        let (mut device, handle) = Device::new_faked(&[b"\x06\r\n0,9,12\r\n"]);
        assert_eq!(
            device.reset().await.unwrap(),
            vec![
                ResetCause::NoError,
                ResetCause::Gauge1,
                ResetCause::Gauge2Identification
            ]
        );
        assert_eq!(handle.written(), b"RES\r\n\x05");
    }

    #[tokio::test]
    async fn test_set_pressure_unit() {
        let (mut device, handle) = Device::new_faked(&[b"\x06\r\n1\r\n", b"\x06\r\n2\r\n"]);
        assert_eq!(device.set_pressure_unit(1).await.unwrap(), PressureUnit::Torr);
        assert_eq!(
            device.set_unit(PressureUnit::Pascal).await.unwrap(),
            PressureUnit::Pascal
        );
        assert_eq!(handle.written(), b"UNI,1\r\n\x05UNI,2\r\n\x05");
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decoding_error() {
        let (mut device, _handle) = Device::new_faked(&[b"\x06\r\n0\r\n"]);
        assert!(matches!(
            device.pressure_measurement(1).await,
            Err(ProtoError::Decoding(DecodingError::ArityMismatch {
                expected: 2,
                actual: 1
            }))
        ));

        let (mut device, _handle) = Device::new_faked(&[b"\x06\r\nXYZ,noid\r\n"]);
        assert!(matches!(
            device.identification().await,
            Err(ProtoError::Decoding(DecodingError::UnknownCode { .. }))
        ));
    }

    #[tokio::test]
    async fn test_nack() {
        let (mut device, _handle) = Device::new_faked(&[b"\x15\r\n"]);
        assert!(matches!(
            device.error_status().await,
            Err(ProtoError::Communication(CommunicationError::Nack))
        ));
    }
}
