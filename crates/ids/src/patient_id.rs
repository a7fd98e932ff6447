use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};

/// Fixed prefix carried by every patient identifier.
pub const PATIENT_ID_PREFIX: &str = "PO";

/// Minimum number of digits in the numeric suffix.
pub const PATIENT_ID_WIDTH: usize = 5;

/// A sequential patient identifier (`PO#####`).
///
/// Once constructed the numeric suffix is known to be valid, so formatting and
/// incrementing cannot fail on malformed text.
///
/// # Construction
/// - [`PatientId::first`] returns `PO00001`.
/// - [`PatientId::parse`] accepts any `PO<digits>` text, including unpadded forms.
/// - [`PatientId::parse_canonical`] additionally requires the exact padded form, and is
///   what lookups by externally supplied identifiers should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatientId(u64);

impl PatientId {
    /// The identifier given to the very first registered patient.
    pub fn first() -> Self {
        Self(1)
    }

    /// Wraps a raw sequence number.
    pub fn from_number(number: u64) -> Self {
        Self(number)
    }

    /// Returns the numeric suffix.
    pub fn number(&self) -> u64 {
        self.0
    }

    /// Parses `PO` followed by one or more ASCII digits.
    ///
    /// Leading zeros are accepted in any quantity, so `PO1` and `PO00001` parse to the
    /// same identifier. Signs, whitespace, separators and any other prefix are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Format`] if the prefix is missing, the suffix is empty, contains
    /// a non-digit, or does not fit in a `u64`.
    pub fn parse(input: &str) -> IdResult<Self> {
        let digits = input
            .strip_prefix(PATIENT_ID_PREFIX)
            .ok_or_else(|| IdError::Format(input.to_string()))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::Format(input.to_string()));
        }

        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdError::Format(input.to_string()))
    }

    /// Parses an identifier that must already be in canonical (displayed) form.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Format`] if `input` is malformed or differs from the canonical
    /// rendering of its number (for example `PO1` or `PO000001`).
    pub fn parse_canonical(input: &str) -> IdResult<Self> {
        let id = Self::parse(input)?;
        if id.to_string() != input {
            return Err(IdError::Format(input.to_string()));
        }
        Ok(id)
    }

    /// Returns the identifier that follows this one.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Overflow`] if the suffix is already `u64::MAX`.
    pub fn next(&self) -> IdResult<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| IdError::Overflow(self.to_string()))
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            PATIENT_ID_PREFIX,
            self.0,
            width = PATIENT_ID_WIDTH
        )
    }
}

impl FromStr for PatientId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Computes the identifier for the next patient.
///
/// `current_max_id` is the stored identifier of the most recently inserted patient (highest
/// insertion-order key), or `None` when no patient exists yet.
///
/// # Errors
///
/// Returns [`IdError::Format`] if the stored identifier is malformed. No fallback number is
/// guessed. Returns [`IdError::Overflow`] if the sequence is exhausted.
pub fn allocate_next_id(current_max_id: Option<&str>) -> IdResult<PatientId> {
    match current_max_id {
        Some(raw) => PatientId::parse(raw)?.next(),
        None => Ok(PatientId::first()),
    }
}
