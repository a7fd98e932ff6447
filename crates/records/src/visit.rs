//! Clinical encounter (visit) records.
//!
//! Visits belong to exactly one patient and are never modified after they are logged.

use crate::{yaml, RecordsError, RecordsResult};
use chrono::{DateTime, NaiveDate, Utc};
use frontdesk_ids::PatientId;
use frontdesk_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckupType {
    #[serde(rename = "Follow-up")]
    FollowUp,
    Regular,
    New,
}

vocabulary!(CheckupType {
    FollowUp => "Follow-up",
    Regular => "Regular",
    New => "New",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthcareService {
    #[serde(rename = "OPD")]
    Opd,
    #[serde(rename = "IPD")]
    Ipd,
    Emergency,
}

vocabulary!(HealthcareService {
    Opd => "OPD",
    Ipd => "IPD",
    Emergency => "Emergency",
});

/// Body weight in kilograms, held exactly in hundredths.
///
/// Accepts at most three integer digits and two decimal places (`0` to `999.99`), the
/// precision of the visit form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Weight {
    hundredths: u32,
}

impl Weight {
    pub const MAX_HUNDREDTHS: u32 = 99_999;

    pub fn from_hundredths(hundredths: u32) -> RecordsResult<Self> {
        if hundredths > Self::MAX_HUNDREDTHS {
            return Err(RecordsError::InvalidInput(format!(
                "weight {}.{:02} exceeds 999.99",
                hundredths / 100,
                hundredths % 100
            )));
        }
        Ok(Self { hundredths })
    }

    pub fn hundredths(&self) -> u32 {
        self.hundredths
    }
}

impl FromStr for Weight {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            RecordsError::InvalidInput(format!(
                "weight '{s}' must be a decimal with at most 5 digits and 2 decimal places"
            ))
        };

        let trimmed = s.trim();
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) if !fraction.is_empty() => (whole, fraction),
            Some(_) => return Err(invalid()),
            None => (trimmed, ""),
        };

        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || whole.len() > 3 || fraction.len() > 2 {
            return Err(invalid());
        }
        if !digits_only(whole) || !digits_only(fraction) {
            return Err(invalid());
        }

        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let fraction: u32 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u32>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        Weight::from_hundredths(whole * 100 + fraction)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

impl Serialize for Weight {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Peripheral oxygen saturation as a whole percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct OxygenSaturation(u8);

impl OxygenSaturation {
    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for OxygenSaturation {
    type Error = RecordsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 100 {
            return Err(RecordsError::InvalidInput(format!(
                "oxygen level {value}% is above 100%"
            )));
        }
        Ok(Self(value))
    }
}

impl From<OxygenSaturation> for u8 {
    fn from(value: OxygenSaturation) -> Self {
        value.0
    }
}

impl FromStr for OxygenSaturation {
    type Err = RecordsError;

    /// Accepts `98`, `98%` or `98 %`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s.trim().trim_end_matches('%').trim_end();
        let value: u8 = number.parse().map_err(|_| {
            RecordsError::InvalidInput(format!("oxygen level '{s}' is not a percentage"))
        })?;
        OxygenSaturation::try_from(value)
    }
}

impl fmt::Display for OxygenSaturation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A single clinical encounter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisitRecord {
    /// Per-patient sequence number, starting at 1.
    pub visit_number: u64,
    pub patient_id: PatientId,
    pub doctor_name: NonEmptyText,
    pub date: NaiveDate,
    pub checkup_type: CheckupType,
    pub healthcare_service: HealthcareService,
    /// Free-form reading such as `120/80 mmHg`.
    pub blood_pressure: NonEmptyText,
    pub oxygen_level: OxygenSaturation,
    pub weight: Weight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Visit YAML operations.
pub struct VisitYaml;

impl VisitYaml {
    pub fn parse(yaml_text: &str) -> RecordsResult<VisitRecord> {
        yaml::parse("Visit", yaml_text)
    }

    pub fn render(record: &VisitRecord) -> RecordsResult<String> {
        yaml::render(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_parses_form_values() {
        assert_eq!("72.50".parse::<Weight>().unwrap().hundredths(), 7250);
        assert_eq!("72.5".parse::<Weight>().unwrap().hundredths(), 7250);
        assert_eq!("72".parse::<Weight>().unwrap().hundredths(), 7200);
        assert_eq!(" 999.99 ".parse::<Weight>().unwrap().hundredths(), 99_999);
        assert_eq!("0.05".parse::<Weight>().unwrap().to_string(), "0.05");
        assert_eq!("72.5".parse::<Weight>().unwrap().to_string(), "72.50");
    }

    #[test]
    fn test_weight_rejects_out_of_precision_values() {
        for raw in ["1000", "72.505", "72.", ".5", "-1", "7a", "", "1e2"] {
            assert!(raw.parse::<Weight>().is_err(), "expected error for {raw:?}");
        }
    }

    #[test]
    fn test_oxygen_level_accepts_percent_sign() {
        assert_eq!("98%".parse::<OxygenSaturation>().unwrap().percent(), 98);
        assert_eq!("98 %".parse::<OxygenSaturation>().unwrap().percent(), 98);
        assert_eq!("100".parse::<OxygenSaturation>().unwrap().to_string(), "100%");
        assert!("101".parse::<OxygenSaturation>().is_err());
        assert!("high".parse::<OxygenSaturation>().is_err());
    }

    #[test]
    fn test_visit_yaml_roundtrip_keeps_exact_weight() {
        let visit = VisitRecord {
            visit_number: 1,
            patient_id: PatientId::from_number(2),
            doctor_name: NonEmptyText::new("Dr Mehta").unwrap(),
            date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            checkup_type: CheckupType::FollowUp,
            healthcare_service: HealthcareService::Opd,
            blood_pressure: NonEmptyText::new("120/80 mmHg").unwrap(),
            oxygen_level: "97".parse().unwrap(),
            weight: "68.40".parse().unwrap(),
            notes: None,
            created_at: DateTime::parse_from_rfc3339("2026-03-04T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let yaml = VisitYaml::render(&visit).unwrap();
        assert!(yaml.contains("healthcare_service: OPD"));
        assert!(yaml.contains("checkup_type: Follow-up"));
        assert!(yaml.contains("68.40"));

        assert_eq!(VisitYaml::parse(&yaml).unwrap(), visit);
    }

    #[test]
    fn test_visit_yaml_rejects_oxygen_above_100() {
        let yaml = "visit_number: 1\npatient_id: PO00001\ndoctor_name: Dr A\ndate: 2026-01-01\n\
                    checkup_type: New\nhealthcare_service: IPD\nblood_pressure: 110/70\n\
                    oxygen_level: 140\nweight: '60.00'\ncreated_at: 2026-01-01T00:00:00Z\n";
        let err = VisitYaml::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("oxygen_level"), "{err}");
    }
}
