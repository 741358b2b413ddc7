//! Typed values carried in the comma separated fields of a gauge response.
//!
//! Every categorical field is backed by a fixed table of wire codes. The
//! tables are plain enums, so the reverse lookup needed to send a value back
//! to the gauge is [`Mapping::code`].

use std::fmt;

use super::DecodingError;

/// A fixed bijection between wire codes and semantic values.
pub trait Mapping: Sized + Copy + 'static {
    /// Name of the table, used in error messages.
    const NAME: &'static str;
    /// Every value of the table, in wire code order.
    const ALL: &'static [Self];

    fn code(&self) -> &'static str;
    fn label(&self) -> &'static str;

    fn from_code(code: &str) -> Result<Self, DecodingError> {
        Self::ALL
            .iter()
            .find(|v| v.code() == code)
            .copied()
            .ok_or_else(|| DecodingError::UnknownCode {
                table: Self::NAME,
                code: code.to_string(),
            })
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().find(|v| v.label() == label).copied()
    }
}

macro_rules! mapping {
    (
        $(#[$meta:meta])*
        $name:ident, $table:literal {
            $($variant:ident = $code:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl Mapping for $name {
            const NAME: &'static str = $table;
            const ALL: &'static [Self] = &[$(Self::$variant,)+];

            fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

mapping! {
    /// Type of gauge connected to a channel (`TID`).
    Identification, "identification" {
        Pirani = "TPR" => "Pirani Gauge or Pirani Capacitive gauge",
        ColdCathode9 = "IKR9" => "Cold Cathode Gauge 10^-9",
        ColdCathode11 = "IKR11" => "Cold Cathode Gauge 10^-11",
        FullRangeCc = "PKR" => "FullRange CC Gauge",
        FullRangeBa = "PBR" => "FullRange BA Gauge",
        PiraniHighPressure = "IMR" => "Pirani/High Pressure Gauge",
        Linear = "CMR" => "Linear Gauge",
        NoSensor = "noSen" => "no sensor",
        NoIdentifier = "noid" => "no identifier",
    }
}

mapping! {
    /// Switching state of a gauge (`SEN`).
    GaugeStatus, "gauge status" {
        NotSwitchable = "0" => "Gauge cannot be turned on/off",
        Off = "1" => "Gauge turned off",
        On = "2" => "Gauge turned on",
    }
}

mapping! {
    /// Measurement unit selected on the controller (`UNI`).
    PressureUnit, "pressure unit" {
        MbarBar = "0" => "mbar/bar",
        Torr = "1" => "Torr",
        Pascal = "2" => "Pascal",
    }
}

mapping! {
    /// Status preceding every pressure value (`PR1`, `PR2`, `COM`).
    PressureStatus, "pressure status" {
        Ok = "0" => "Measurement data okay",
        Underrange = "1" => "Underrange",
        Overrange = "2" => "Overrange",
        SensorError = "3" => "Sensor error",
        SensorOff = "4" => "Sensor off",
        NoSensor = "5" => "No sensor",
        IdentificationError = "6" => "Identification error",
    }
}

mapping! {
    /// Error status word (`ERR`).
    ErrorStatus, "error status" {
        NoError = "0000" => "No Error",
        Error = "1000" => "Error",
        NoHardware = "0100" => "NO HWR",
        Parameter = "0010" => "PAR",
        Syntax = "0001" => "SYN",
    }
}

mapping! {
    /// Pending error reported by a reset (`RES`). Code 8 is not assigned.
    ResetCause, "reset cause" {
        NoError = "0" => "No Error",
        Watchdog = "1" => "Watchdog has responded",
        TaskFail = "2" => "Task fail error",
        Eprom = "3" => "EPROM error",
        Ram = "4" => "RAM error",
        Eeprom = "5" => "EEPROM error",
        Display = "6" => "DISPLAY error",
        AdConverter = "7" => "A/D converter error",
        Gauge1 = "9" => "Gauge 1 error",
        Gauge1Identification = "10" => "Gauge 1 identification error",
        Gauge2 = "11" => "Gauge 2 error",
        Gauge2Identification = "12" => "Gauge 2 identification error",
    }
}

/// Selects the mapping table a categorical field is decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Identification,
    GaugeStatus,
    PressureUnit,
    PressureStatus,
    ErrorStatus,
    ResetCause,
}

/// Declared kind of a single response field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Mapping(Table),
    Float,
}

/// Declared layout of a whole response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Exactly one field.
    Single(Field),
    /// A fixed number of fields, in order.
    Record(&'static [Field]),
    /// Any number of fields of one kind.
    Sequence(Field),
}

/// A decoded response field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Identification(Identification),
    GaugeStatus(GaugeStatus),
    PressureUnit(PressureUnit),
    PressureStatus(PressureStatus),
    ErrorStatus(ErrorStatus),
    ResetCause(ResetCause),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Identification(v) => fmt::Display::fmt(v, f),
            Value::GaugeStatus(v) => fmt::Display::fmt(v, f),
            Value::PressureUnit(v) => fmt::Display::fmt(v, f),
            Value::PressureStatus(v) => fmt::Display::fmt(v, f),
            Value::ErrorStatus(v) => fmt::Display::fmt(v, f),
            Value::ResetCause(v) => fmt::Display::fmt(v, f),
            Value::Float(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// Parses a decimal float as printed by the gauge, e.g. `1.0130E+03`.
pub fn decode_float(token: &str) -> Result<f64, DecodingError> {
    token
        .trim()
        .parse::<f64>()
        .map_err(|_| DecodingError::InvalidFloat(token.to_string()))
}

impl Field {
    pub fn decode(&self, token: &str) -> Result<Value, DecodingError> {
        Ok(match self {
            Field::Float => Value::Float(decode_float(token)?),
            Field::Mapping(Table::Identification) => {
                Value::Identification(Identification::from_code(token)?)
            }
            Field::Mapping(Table::GaugeStatus) => {
                Value::GaugeStatus(GaugeStatus::from_code(token)?)
            }
            Field::Mapping(Table::PressureUnit) => {
                Value::PressureUnit(PressureUnit::from_code(token)?)
            }
            Field::Mapping(Table::PressureStatus) => {
                Value::PressureStatus(PressureStatus::from_code(token)?)
            }
            Field::Mapping(Table::ErrorStatus) => {
                Value::ErrorStatus(ErrorStatus::from_code(token)?)
            }
            Field::Mapping(Table::ResetCause) => Value::ResetCause(ResetCause::from_code(token)?),
        })
    }
}

impl Shape {
    /// Decodes the raw fields of one response frame.
    pub fn decode<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<Value>, DecodingError> {
        match self {
            Shape::Single(field) => Self::decode_record(std::slice::from_ref(field), tokens),
            Shape::Record(fields) => Self::decode_record(fields, tokens),
            Shape::Sequence(field) => tokens
                .iter()
                .map(|token| field.decode(token.as_ref()))
                .collect(),
        }
    }

    fn decode_record<S: AsRef<str>>(
        fields: &[Field],
        tokens: &[S],
    ) -> Result<Vec<Value>, DecodingError> {
        if fields.len() != tokens.len() {
            return Err(DecodingError::ArityMismatch {
                expected: fields.len(),
                actual: tokens.len(),
            });
        }
        fields
            .iter()
            .zip(tokens)
            .map(|(field, token)| field.decode(token.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bijective<M: Mapping + PartialEq + fmt::Debug>() {
        for value in M::ALL {
            assert_eq!(M::from_code(value.code()).unwrap(), *value);
            assert_eq!(M::from_label(value.label()), Some(*value));
        }
        assert!(matches!(
            M::from_code("bogus"),
            Err(DecodingError::UnknownCode { table, .. }) if table == M::NAME
        ));
    }

    #[test]
    fn test_tables_round_trip() {
        assert_bijective::<Identification>();
        assert_bijective::<GaugeStatus>();
        assert_bijective::<PressureUnit>();
        assert_bijective::<PressureStatus>();
        assert_bijective::<ErrorStatus>();
        assert_bijective::<ResetCause>();
    }

    #[test]
    fn test_reset_cause_has_no_code_8() {
        assert!(ResetCause::from_code("8").is_err());
        assert_eq!(ResetCause::ALL.len(), 12);
    }

    #[test]
    fn test_decode_float() {
        assert_eq!(decode_float("1.013e+00").unwrap(), 1.013);
        assert_eq!(decode_float("5.0000E-03").unwrap(), 0.005);
        assert_eq!(decode_float(" 2.5").unwrap(), 2.5);
        assert!(matches!(
            decode_float("1,0"),
            Err(DecodingError::InvalidFloat(_))
        ));
        assert!(decode_float("").is_err());
    }

    #[test]
    fn test_decode_record() {
        let shape = Shape::Record(&[Field::Mapping(Table::PressureStatus), Field::Float]);
        assert_eq!(
            shape.decode(&["0", "1.013e+00"]).unwrap(),
            vec![Value::PressureStatus(PressureStatus::Ok), Value::Float(1.013)]
        );
        assert_eq!(
            shape.decode(&["0"]).unwrap_err(),
            DecodingError::ArityMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(matches!(
            shape.decode(&["9", "1.0"]),
            Err(DecodingError::UnknownCode { .. })
        ));
    }

    #[test]
    fn test_decode_single_rejects_extra_fields() {
        let shape = Shape::Single(Field::Mapping(Table::PressureUnit));
        assert_eq!(
            shape.decode(&["1"]).unwrap(),
            vec![Value::PressureUnit(PressureUnit::Torr)]
        );
        assert!(shape.decode(&["1", "2"]).is_err());
    }

    #[test]
    fn test_decode_sequence() {
        let shape = Shape::Sequence(Field::Mapping(Table::ResetCause));
        assert_eq!(
            shape.decode(&["0", "10"]).unwrap(),
            vec![
                Value::ResetCause(ResetCause::NoError),
                Value::ResetCause(ResetCause::Gauge1Identification)
            ]
        );
        assert!(shape.decode::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_value_display_uses_label() {
        assert_eq!(
            Value::Identification(Identification::Pirani).to_string(),
            "Pirani Gauge or Pirani Capacitive gauge"
        );
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
    }
}
