use std::fmt;

use crate::proto::types::{PressureStatus, Value};
use crate::proto::{ProtoError, Result};

/// One pressure reading with the status the gauge reported for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub status: PressureStatus,
    /// Pressure in the unit currently selected on the controller.
    pub pressure: f64,
}

impl Measurement {
    /// Only readings with an okay status carry a meaningful pressure.
    pub fn is_valid(&self) -> bool {
        self.status == PressureStatus::Ok
    }

    fn from_pair(status: &Value, pressure: &Value) -> Option<Self> {
        match (status, pressure) {
            (Value::PressureStatus(status), Value::Float(pressure)) => Some(Self {
                status: *status,
                pressure: *pressure,
            }),
            _ => None,
        }
    }

    pub(crate) fn from_values(values: Vec<Value>) -> Result<Self> {
        if let [status, pressure] = values.as_slice() {
            if let Some(mea) = Self::from_pair(status, pressure) {
                return Ok(mea);
            }
        }
        Err(ProtoError::Unexpected(values))
    }

    /// Decodes the two channel readings of a continuous mode frame.
    pub(crate) fn pair_from_values(values: Vec<Value>) -> Result<(Self, Self)> {
        if let [s1, p1, s2, p2] = values.as_slice() {
            if let (Some(first), Some(second)) = (Self::from_pair(s1, p1), Self::from_pair(s2, p2))
            {
                return Ok((first, second));
            }
        }
        Err(ProtoError::Unexpected(values))
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{:.4E}", self.pressure)
        } else {
            write!(f, "{:.4E} ({})", self.pressure, self.status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values() {
        let mea = Measurement::from_values(vec![
            Value::PressureStatus(PressureStatus::Overrange),
            Value::Float(1100.0),
        ])
        .unwrap();
        assert_eq!(mea.status, PressureStatus::Overrange);
        assert!(!mea.is_valid());

        assert!(matches!(
            Measurement::from_values(vec![Value::Float(1.0), Value::Float(1.0)]),
            Err(ProtoError::Unexpected(_))
        ));
    }

    #[test]
    fn test_display() {
        let mea = Measurement {
            status: PressureStatus::Ok,
            pressure: 1013.0,
        };
        assert_eq!(mea.to_string(), "1.0130E3");
        let mea = Measurement {
            status: PressureStatus::SensorOff,
            pressure: 0.0,
        };
        assert_eq!(mea.to_string(), "0.0000E0 (Sensor off)");
    }
}
