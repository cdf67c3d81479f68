use serde::{Deserialize, Serialize};

/// One laboratory test result attached to a visit.
///
/// The result and reference range are kept as the text the lab
/// reported (e.g. result "210", normal range "<200"), since results
/// are not always numeric.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LabResult {
    pub test_name: String,
    pub result: String,
    pub unit: String,
    pub normal_range: String,
    pub notes: String,
}

/// A parsed reference range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalRange {
    /// "70-100", inclusive at both ends
    Between(f64, f64),
    /// "<200"
    Below(f64),
    /// "<=200"
    AtMost(f64),
    /// ">40"
    Above(f64),
    /// ">=40"
    AtLeast(f64),
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse().ok()
}

impl NormalRange {
    /// Parse a reference range string. Returns None for ranges
    /// that are not numeric (e.g. "Negatif").
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix("<=") {
            parse_number(rest).map(Self::AtMost)
        } else if let Some(rest) = text.strip_prefix('<') {
            parse_number(rest).map(Self::Below)
        } else if let Some(rest) = text.strip_prefix(">=") {
            parse_number(rest).map(Self::AtLeast)
        } else if let Some(rest) = text.strip_prefix('>') {
            parse_number(rest).map(Self::Above)
        } else {
            let (low, high) = text.split_once('-')?;
            Some(Self::Between(parse_number(low)?, parse_number(high)?))
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Self::Between(low, high) => value >= low && value <= high,
            Self::Below(limit) => value < limit,
            Self::AtMost(limit) => value <= limit,
            Self::Above(limit) => value > limit,
            Self::AtLeast(limit) => value >= limit,
        }
    }
}

impl LabResult {
    pub fn new(
        test_name: impl Into<String>,
        result: impl Into<String>,
        unit: impl Into<String>,
        normal_range: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            result: result.into(),
            unit: unit.into(),
            normal_range: normal_range.into(),
            notes: notes.into(),
        }
    }

    /// The result as a number, if the lab reported one
    pub fn numeric_result(&self) -> Option<f64> {
        parse_number(&self.result)
    }

    /// Whether the result falls in the reference range. None if
    /// either the result or the range is not numeric.
    pub fn is_within_normal_range(&self) -> Option<bool> {
        let range = NormalRange::parse(&self.normal_range)?;
        let value = self.numeric_result()?;
        Some(range.contains(value))
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn parses_each_range_form() {
        assert_eq!(NormalRange::parse("70-100"), Some(NormalRange::Between(70.0, 100.0)));
        assert_eq!(NormalRange::parse("<200"), Some(NormalRange::Below(200.0)));
        assert_eq!(NormalRange::parse("<=6.5"), Some(NormalRange::AtMost(6.5)));
        assert_eq!(NormalRange::parse("> 40"), Some(NormalRange::Above(40.0)));
        assert_eq!(NormalRange::parse(">=1,5"), Some(NormalRange::AtLeast(1.5)));
        assert_eq!(NormalRange::parse("Negatif"), None);
    }

    #[test]
    fn blood_sugar_within_range() {
        let result = LabResult::new("Kan Şekeri", "98", "mg/dL", "70-100", "Normal");
        assert_eq!(result.is_within_normal_range(), Some(true));
    }

    #[test]
    fn cholesterol_above_threshold() {
        let result = LabResult::new("Kolesterol", "210", "mg/dL", "<200", "Hafif yüksek");
        assert_eq!(result.numeric_result(), Some(210.0));
        assert_eq!(result.is_within_normal_range(), Some(false));
    }

    #[test]
    fn non_numeric_result_has_no_verdict() {
        let result = LabResult::new("İdrar Kültürü", "Üreme yok", "", "Negatif", "");
        assert_eq!(result.is_within_normal_range(), None);
    }
}
