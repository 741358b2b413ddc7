use super::types::{Field, Mapping, PressureUnit, Shape, Table};
use super::{ProtoError, Result};

const IDENTIFICATION: &[Field] = &[
    Field::Mapping(Table::Identification),
    Field::Mapping(Table::Identification),
];
const GAUGE_STATUS: &[Field] = &[
    Field::Mapping(Table::GaugeStatus),
    Field::Mapping(Table::GaugeStatus),
];
const MEASUREMENT: &[Field] = &[Field::Mapping(Table::PressureStatus), Field::Float];
const CONTINUOUS: &[Field] = &[
    Field::Mapping(Table::PressureStatus),
    Field::Float,
    Field::Mapping(Table::PressureStatus),
    Field::Float,
];

/// Gauge channel of a TPG 262. The TPG 261 only has the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gauge {
    First,
    Second,
}

impl TryFrom<u8> for Gauge {
    type Error = ProtoError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Gauge::First),
            2 => Ok(Gauge::Second),
            other => Err(ProtoError::invalid("gauge", other)),
        }
    }
}

impl Gauge {
    pub fn number(&self) -> u8 {
        match self {
            Gauge::First => 1,
            Gauge::Second => 2,
        }
    }
}

/// Output rate of continuous mode (`COM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuousMode {
    /// Every 100 ms.
    Fast,
    /// Every second.
    Normal,
    /// Every minute.
    Slow,
}

impl TryFrom<u8> for ContinuousMode {
    type Error = ProtoError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ContinuousMode::Fast),
            1 => Ok(ContinuousMode::Normal),
            2 => Ok(ContinuousMode::Slow),
            other => Err(ProtoError::invalid("continuous mode", other)),
        }
    }
}

impl ContinuousMode {
    pub fn code(&self) -> u8 {
        match self {
            ContinuousMode::Fast => 0,
            ContinuousMode::Normal => 1,
            ContinuousMode::Slow => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Identification,
    TurnOnFirstGauge,
    TurnOffFirstGauge,
    ErrorStatus,
    Reset,
    SetPressureUnit(PressureUnit),
    PressureMeasurement(Gauge),
    ContinuousMeasurement(ContinuousMode),
}

impl Command {
    pub fn set_pressure_unit(unit: u8) -> Result<Self> {
        PressureUnit::from_code(&unit.to_string())
            .map(Command::SetPressureUnit)
            .map_err(|_| ProtoError::invalid("pressure unit", unit))
    }

    pub fn pressure_measurement(gauge: u8) -> Result<Self> {
        Ok(Command::PressureMeasurement(Gauge::try_from(gauge)?))
    }

    pub fn continuous_measurement(mode: u8) -> Result<Self> {
        Ok(Command::ContinuousMeasurement(ContinuousMode::try_from(mode)?))
    }

    /// Command mnemonic with its arguments already embedded.
    pub fn header(&self) -> String {
        match self {
            Command::Identification => "TID".to_string(),
            Command::TurnOnFirstGauge => "SEN,2,0".to_string(),
            Command::TurnOffFirstGauge => "SEN,1,0".to_string(),
            Command::ErrorStatus => "ERR".to_string(),
            Command::Reset => "RES".to_string(),
            Command::SetPressureUnit(unit) => format!("UNI,{}", unit.code()),
            Command::PressureMeasurement(gauge) => format!("PR{}", gauge.number()),
            Command::ContinuousMeasurement(mode) => format!("COM,{}", mode.code()),
        }
    }

    /// Layout of the data frame the gauge answers with.
    pub fn shape(&self) -> Shape {
        match self {
            Command::Identification => Shape::Record(IDENTIFICATION),
            Command::TurnOnFirstGauge | Command::TurnOffFirstGauge => Shape::Record(GAUGE_STATUS),
            Command::ErrorStatus => Shape::Single(Field::Mapping(Table::ErrorStatus)),
            Command::Reset => Shape::Sequence(Field::Mapping(Table::ResetCause)),
            Command::SetPressureUnit(_) => Shape::Single(Field::Mapping(Table::PressureUnit)),
            Command::PressureMeasurement(_) => Shape::Record(MEASUREMENT),
            Command::ContinuousMeasurement(_) => Shape::Record(CONTINUOUS),
        }
    }
}
