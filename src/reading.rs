use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether the advisory ranges shown next to each input are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Out-of-range values are accepted and reported as advisories.
    #[default]
    Advisory,
    /// Out-of-range values fail validation.
    Enforce,
}

impl FromStr for RangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advisory" => Ok(Self::Advisory),
            "enforce" => Ok(Self::Enforce),
            other => Err(format!("expected 'advisory' or 'enforce', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorField {
    SolarRadiation,
    Humidity,
    Conductivity,
    Phosphorus,
    PhValue,
    Temperature,
    Nitrogen,
    Potassium,
}

impl SensorField {
    pub const ALL: [SensorField; 8] = [
        SensorField::SolarRadiation,
        SensorField::Humidity,
        SensorField::Conductivity,
        SensorField::Phosphorus,
        SensorField::PhValue,
        SensorField::Temperature,
        SensorField::Nitrogen,
        SensorField::Potassium,
    ];

    /// Name of the user-facing input.
    pub fn input_name(self) -> &'static str {
        match self {
            SensorField::SolarRadiation => "solarRadiation",
            SensorField::Humidity => "humidity",
            SensorField::Conductivity => "conductivity",
            SensorField::Phosphorus => "phosphorous",
            SensorField::PhValue => "pHValue",
            SensorField::Temperature => "temperature",
            SensorField::Nitrogen => "nitrogen",
            SensorField::Potassium => "potassium",
        }
    }

    /// Key in the `/predict` request body.
    pub fn wire_key(self) -> &'static str {
        match self {
            SensorField::SolarRadiation => "solar_radiation",
            SensorField::Humidity => "humidity",
            SensorField::Conductivity => "conductivity",
            SensorField::Phosphorus => "phosphorus",
            SensorField::PhValue => "ph_value",
            SensorField::Temperature => "temperature",
            SensorField::Nitrogen => "nitrogen",
            SensorField::Potassium => "potassium",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorField::SolarRadiation => "kWh/m²",
            SensorField::Humidity => "%",
            SensorField::Conductivity => "mS/cm",
            SensorField::PhValue => "",
            SensorField::Temperature => "°C",
            SensorField::Phosphorus | SensorField::Nitrogen | SensorField::Potassium => "mg/L",
        }
    }

    /// Inclusive guidance range; `None` for unbounded inputs.
    pub fn advisory_range(self) -> Option<(f64, f64)> {
        match self {
            SensorField::SolarRadiation => Some((0.0, 1000.0)),
            SensorField::Humidity => Some((0.0, 100.0)),
            SensorField::Conductivity => Some((0.0, 10.0)),
            SensorField::Phosphorus => Some((0.0, 50.0)),
            SensorField::PhValue => Some((0.0, 14.0)),
            SensorField::Temperature => None,
            SensorField::Nitrogen | SensorField::Potassium => Some((0.0, 100.0)),
        }
    }

    /// Placeholder text for the input, e.g. `mg/L, range: 0-50`.
    pub fn guideline(self) -> String {
        match (self.advisory_range(), self.unit()) {
            (Some((lo, hi)), "") => format!("Value, range: {}-{}", lo, hi),
            (Some((lo, hi)), unit) => format!("{}, range: {}-{}", unit, lo, hi),
            (None, unit) => format!("Value in {}", unit),
        }
    }
}

impl fmt::Display for SensorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.input_name())
    }
}

/// The eight inputs exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSensorReading {
    #[serde(default)]
    pub solar_radiation: String,
    #[serde(default)]
    pub humidity: String,
    #[serde(default)]
    pub conductivity: String,
    #[serde(default)]
    pub phosphorous: String,
    #[serde(default, rename = "pHValue")]
    pub ph_value: String,
    #[serde(default)]
    pub temperature: String,
    #[serde(default)]
    pub nitrogen: String,
    #[serde(default)]
    pub potassium: String,
}

impl RawSensorReading {
    pub fn get(&self, field: SensorField) -> &str {
        match field {
            SensorField::SolarRadiation => &self.solar_radiation,
            SensorField::Humidity => &self.humidity,
            SensorField::Conductivity => &self.conductivity,
            SensorField::Phosphorus => &self.phosphorous,
            SensorField::PhValue => &self.ph_value,
            SensorField::Temperature => &self.temperature,
            SensorField::Nitrogen => &self.nitrogen,
            SensorField::Potassium => &self.potassium,
        }
    }

    pub fn set(&mut self, field: SensorField, value: impl Into<String>) {
        let slot = match field {
            SensorField::SolarRadiation => &mut self.solar_radiation,
            SensorField::Humidity => &mut self.humidity,
            SensorField::Conductivity => &mut self.conductivity,
            SensorField::Phosphorus => &mut self.phosphorous,
            SensorField::PhValue => &mut self.ph_value,
            SensorField::Temperature => &mut self.temperature,
            SensorField::Nitrogen => &mut self.nitrogen,
            SensorField::Potassium => &mut self.potassium,
        };
        *slot = value.into();
    }

    /// Parses every field, collecting all problems instead of stopping at the first.
    pub fn validate(&self, policy: RangePolicy) -> Result<SensorReading, ValidationErrors> {
        let mut values = [0.0f64; 8];
        let mut errors = Vec::new();
        let mut advisories = Vec::new();

        for (slot, field) in values.iter_mut().zip(SensorField::ALL) {
            let raw = self.get(field).trim();
            if raw.is_empty() {
                errors.push(FieldError { field, kind: FieldErrorKind::Missing });
                continue;
            }
            let value = match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                Ok(_) => {
                    errors.push(FieldError { field, kind: FieldErrorKind::NotFinite(raw.to_string()) });
                    continue;
                }
                Err(_) => {
                    errors.push(FieldError { field, kind: FieldErrorKind::NotANumber(raw.to_string()) });
                    continue;
                }
            };
            if let Some((min, max)) = field.advisory_range() {
                if value < min || value > max {
                    let problem = FieldError { field, kind: FieldErrorKind::OutOfRange { value, min, max } };
                    match policy {
                        RangePolicy::Enforce => errors.push(problem),
                        RangePolicy::Advisory => advisories.push(problem),
                    }
                }
            }
            *slot = value;
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        let [solar_radiation, humidity, conductivity, phosphorus, ph_value, temperature, nitrogen, potassium] =
            values;
        Ok(SensorReading {
            solar_radiation,
            humidity,
            conductivity,
            phosphorus,
            ph_value,
            temperature,
            nitrogen,
            potassium,
            advisories,
        })
    }
}

/// A reading ready to send to `/predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub solar_radiation: f64,
    pub humidity: f64,
    pub conductivity: f64,
    pub phosphorus: f64,
    pub ph_value: f64,
    pub temperature: f64,
    pub nitrogen: f64,
    pub potassium: f64,
    #[serde(skip)]
    advisories: Vec<FieldError>,
}

impl SensorReading {
    /// Coerces without validating: blank fields become 0 and unparseable ones NaN, which is sent as `null`.
    pub fn lossy_from_raw(raw: &RawSensorReading) -> Self {
        let num = |field: SensorField| match raw.get(field).trim() {
            "" => 0.0,
            s => s.parse::<f64>().unwrap_or(f64::NAN),
        };
        SensorReading {
            solar_radiation: num(SensorField::SolarRadiation),
            humidity: num(SensorField::Humidity),
            conductivity: num(SensorField::Conductivity),
            phosphorus: num(SensorField::Phosphorus),
            ph_value: num(SensorField::PhValue),
            temperature: num(SensorField::Temperature),
            nitrogen: num(SensorField::Nitrogen),
            potassium: num(SensorField::Potassium),
            advisories: Vec::new(),
        }
    }

    /// Out-of-range values accepted under `RangePolicy::Advisory`.
    pub fn advisories(&self) -> &[FieldError] {
        &self.advisories
    }

    pub fn get(&self, field: SensorField) -> f64 {
        match field {
            SensorField::SolarRadiation => self.solar_radiation,
            SensorField::Humidity => self.humidity,
            SensorField::Conductivity => self.conductivity,
            SensorField::Phosphorus => self.phosphorus,
            SensorField::PhValue => self.ph_value,
            SensorField::Temperature => self.temperature,
            SensorField::Nitrogen => self.nitrogen,
            SensorField::Potassium => self.potassium,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: SensorField,
    pub kind: FieldErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldErrorKind {
    Missing,
    NotANumber(String),
    NotFinite(String),
    OutOfRange { value: f64, min: f64, max: f64 },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::Missing => write!(f, "{} is required", self.field),
            FieldErrorKind::NotANumber(raw) => write!(f, "{} is not a number: '{}'", self.field, raw),
            FieldErrorKind::NotFinite(raw) => write!(f, "{} must be finite: '{}'", self.field, raw),
            FieldErrorKind::OutOfRange { value, min, max } => {
                write!(f, "{} = {} is outside {}-{}", self.field, value, min, max)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid sensor reading: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = SensorField> + '_ {
        self.0.iter().map(|e| e.field)
    }
}
