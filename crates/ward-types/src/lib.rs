/// Errors that can occur when creating validated intake types.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// The patient name was empty or contained only whitespace
    #[error("Patient name cannot be empty")]
    EmptyName,
    /// The age was outside the accepted range
    #[error("Age must be at most {max} (got {value})")]
    AgeOutOfRange {
        /// The rejected value
        value: u32,
        /// The highest accepted age
        max: u32,
    },
}

/// A patient's name as captured at intake.
///
/// Guaranteed to hold at least one non-whitespace character; surrounding
/// whitespace is stripped when the value is constructed, so two records never
/// differ only in padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientName(String);

impl PatientName {
    /// Builds a `PatientName` from raw form input.
    ///
    /// Strips surrounding whitespace first; an input that is blank once
    /// stripped is rejected with [`IntakeError::EmptyName`], so a stored
    /// record can never carry an empty name.
    pub fn new(input: impl AsRef<str>) -> Result<Self, IntakeError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IntakeError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PatientName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for PatientName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A patient age bounded to the range accepted by the intake forms.
///
/// Ages above [`Age::MAX`] are rejected at construction, so a stored record can
/// never carry a nonsensical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Age(u32);

impl Age {
    /// The highest age accepted at intake.
    pub const MAX: u32 = 120;

    /// Creates a new `Age`, rejecting values above [`Age::MAX`].
    pub fn new(value: u32) -> Result<Self, IntakeError> {
        if value > Self::MAX {
            return Err(IntakeError::AgeOutOfRange {
                value,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }

    /// Returns the age in years.
    pub fn years(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Age {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Age {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u32::deserialize(deserializer)?;
        Age::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_name_accepts_and_trims() {
        let name = PatientName::new("  Ada Lovelace ").expect("should accept");
        assert_eq!(name.as_str(), "Ada Lovelace");
    }

    #[test]
    fn test_patient_name_rejects_empty() {
        let err = PatientName::new("").expect_err("should reject empty");
        assert!(matches!(err, IntakeError::EmptyName));
    }

    #[test]
    fn test_patient_name_rejects_whitespace_only() {
        let err = PatientName::new("   ").expect_err("should reject whitespace");
        assert!(matches!(err, IntakeError::EmptyName));
    }

    #[test]
    fn test_age_accepts_bounds() {
        assert_eq!(Age::new(0).expect("zero is valid").years(), 0);
        assert_eq!(Age::new(120).expect("max is valid").years(), 120);
    }

    #[test]
    fn test_age_rejects_out_of_range() {
        let err = Age::new(121).expect_err("should reject 121");
        assert!(matches!(err, IntakeError::AgeOutOfRange { value: 121, .. }));
    }

    #[test]
    fn test_patient_name_deserialization_revalidates() {
        let ok: PatientName = serde_json::from_str("\"Grace\"").expect("valid name");
        assert_eq!(ok.as_str(), "Grace");
        assert!(serde_json::from_str::<PatientName>("\" \"").is_err());
    }

    #[test]
    fn test_age_deserialization_revalidates() {
        let ok: Age = serde_json::from_str("42").expect("valid age");
        assert_eq!(ok.years(), 42);
        assert!(serde_json::from_str::<Age>("200").is_err());
    }
}
