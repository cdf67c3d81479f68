use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::check_range;
use crate::whole_number::WholeNumber;

/// Vital signs taken at a visit. Every reading is optional, but a
/// reading that is present must be physiologically plausible.
#[serde_with::serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    /// mmHg
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[serde_as(as = "Option<WholeNumber>")]
    pub blood_pressure_systolic: Option<i32>,
    /// mmHg
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[serde_as(as = "Option<WholeNumber>")]
    pub blood_pressure_diastolic: Option<i32>,
    /// Beats per minute
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[serde_as(as = "Option<WholeNumber>")]
    pub heart_rate: Option<i32>,
    /// Degrees Celsius
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f64>,
    /// Breaths per minute
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[serde_as(as = "Option<WholeNumber>")]
    pub respiratory_rate: Option<i32>,
    /// Kilograms
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub weight: Option<f64>,
    /// Centimetres
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height: Option<f64>,
}

fn as_real(value: Option<i32>) -> Option<f64> {
    value.map(f64::from)
}

impl VitalSigns {
    /// Reject readings outside plausible ranges. Blood pressure,
    /// weight and height must be strictly positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range(as_real(self.blood_pressure_systolic), "bloodPressureSystolic", 1.0, 300.0)?;
        check_range(as_real(self.blood_pressure_diastolic), "bloodPressureDiastolic", 1.0, 250.0)?;
        check_range(as_real(self.heart_rate), "heartRate", 0.0, 300.0)?;
        check_range(self.temperature, "temperature", 30.0, 45.0)?;
        check_range(as_real(self.respiratory_rate), "respiratoryRate", 0.0, 100.0)?;
        check_range(self.weight, "weight", f64::MIN_POSITIVE, 700.0)?;
        check_range(self.height, "height", f64::MIN_POSITIVE, 300.0)?;
        Ok(())
    }

    /// Body mass index in kg/m², when both weight and height are known
    pub fn body_mass_index(&self) -> Option<f64> {
        match (self.weight, self.height) {
            (Some(weight), Some(height)) if height > 0.0 => {
                let metres = height / 100.0;
                Some(weight / (metres * metres))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn seed_vitals() -> VitalSigns {
        VitalSigns {
            blood_pressure_systolic: Some(150),
            blood_pressure_diastolic: Some(95),
            heart_rate: Some(78),
            temperature: Some(36.8),
            respiratory_rate: Some(16),
            weight: Some(85.0),
            height: Some(178.0),
        }
    }

    #[test]
    fn plausible_readings_pass() {
        assert_eq!(seed_vitals().validate(), Ok(()));
        assert_eq!(VitalSigns::default().validate(), Ok(()));
    }

    #[test]
    fn zero_blood_pressure_is_rejected() {
        let mut vitals = seed_vitals();
        vitals.blood_pressure_diastolic = Some(0);
        assert!(matches!(
            vitals.validate(),
            Err(ValidationError::OutOfRange {
                field: "bloodPressureDiastolic",
                ..
            })
        ));
    }

    #[test]
    fn implausible_temperature_and_heart_rate_are_rejected() {
        let mut vitals = seed_vitals();
        vitals.temperature = Some(98.6);
        assert!(vitals.validate().is_err());

        let mut vitals = seed_vitals();
        vitals.heart_rate = Some(301);
        assert!(vitals.validate().is_err());
    }

    #[test]
    fn zero_weight_is_rejected() {
        let mut vitals = seed_vitals();
        vitals.weight = Some(0.0);
        assert!(vitals.validate().is_err());
    }

    #[test]
    fn body_mass_index_from_weight_and_height() {
        let bmi = seed_vitals().body_mass_index().unwrap();
        assert!((bmi - 26.83).abs() < 0.01);
        assert_eq!(VitalSigns::default().body_mass_index(), None);
    }
}
