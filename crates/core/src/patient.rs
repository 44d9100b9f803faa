//! Patient records and the append-only request registry.
//!
//! Patients are never deleted: discharged records stay in the registry so the
//! daily summaries and dashboard counts keep working. Identifiers are assigned
//! sequentially from 1 and never reused, which is what makes id order usable as
//! submission (FIFO) order during allocation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ward_types::{Age, PatientName};

use crate::beds::BedId;
use crate::{WardError, WardResult};

/// Identifier of a patient record, stable for the record's lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PatientId(pub u32);

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Triage priority class.
///
/// The declaration order gives the total order used everywhere: `Emergency`
/// is served first, `Low` last.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    Emergency,
    Medium,
    Low,
}

impl Priority {
    /// Numeric rank used for ordering: lower is served first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Emergency => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Whether a waiting patient of this priority may preempt an admitted one.
    pub fn may_preempt(&self) -> bool {
        matches!(self, Priority::Emergency)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Emergency => "Emergency",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Priority {
    type Err = WardError;

    fn from_str(s: &str) -> WardResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emergency" => Ok(Priority::Emergency),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(WardError::Validation(format!(
                "unknown priority {:?} (expected Emergency, Medium or Low)",
                other
            ))),
        }
    }
}

/// Where a patient currently is in the admission flow.
///
/// `Waiting` is the initial state; `Discharged` is terminal. Preemption moves
/// a patient from `Admitted` back to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    Waiting,
    Admitted,
    Discharged,
}

impl std::fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PatientStatus::Waiting => "Waiting",
            PatientStatus::Admitted => "Admitted",
            PatientStatus::Discharged => "Discharged",
        };
        write!(f, "{}", s)
    }
}

/// A single patient record.
///
/// Invariant: `bed.is_some()` exactly when `status == Admitted`. All
/// transitions go through [`Patient::admit`], [`Patient::bump`] and
/// [`Patient::discharge`] so the invariant cannot be broken piecemeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: PatientName,
    pub age: Age,
    /// Free-text medical history captured at intake.
    pub history: String,
    pub priority: Priority,
    pub status: PatientStatus,
    /// The bed currently held, present exactly while admitted.
    pub bed: Option<BedId>,
    /// Date of the current admission; cleared when the patient is bumped back
    /// to waiting, retained on discharge.
    pub admitted_on: Option<NaiveDate>,
}

impl Patient {
    pub fn is_waiting(&self) -> bool {
        self.status == PatientStatus::Waiting
    }

    pub fn is_admitted(&self) -> bool {
        self.status == PatientStatus::Admitted
    }

    /// Place the patient in the given bed.
    pub(crate) fn admit(&mut self, bed: BedId, on: NaiveDate) {
        self.status = PatientStatus::Admitted;
        self.bed = Some(bed);
        self.admitted_on = Some(on);
    }

    /// Revoke the patient's bed and return them to the queue.
    pub(crate) fn bump(&mut self) {
        self.status = PatientStatus::Waiting;
        self.bed = None;
        self.admitted_on = None;
    }

    /// Terminal transition out of the ward. `admitted_on` is kept so daily
    /// summaries still count the stay.
    pub(crate) fn discharge(&mut self) {
        self.status = PatientStatus::Discharged;
        self.bed = None;
    }
}

/// Append-only arena of patient records, indexed by id.
///
/// Record `n` lives at index `n - 1`; ids are handed out sequentially so the
/// arena never has holes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    records: Vec<Patient>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a registry from previously persisted records.
    ///
    /// Records must be dense and in id order, exactly as [`Registry::records`]
    /// produces them.
    pub fn from_records(records: Vec<Patient>) -> WardResult<Self> {
        for (index, record) in records.iter().enumerate() {
            let expected = PatientId(index as u32 + 1);
            if record.id != expected {
                return Err(WardError::Validation(format!(
                    "registry records out of order: expected {} at position {}, found {}",
                    expected, index, record.id
                )));
            }
        }
        Ok(Self { records })
    }

    /// Append a new waiting patient and return its id.
    pub fn submit(
        &mut self,
        name: PatientName,
        age: Age,
        history: String,
        priority: Priority,
    ) -> PatientId {
        let id = PatientId(self.records.len() as u32 + 1);
        self.records.push(Patient {
            id,
            name,
            age,
            history,
            priority,
            status: PatientStatus::Waiting,
            bed: None,
            admitted_on: None,
        });
        id
    }

    pub fn get(&self, id: PatientId) -> Option<&Patient> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.records.get(index)
    }

    pub(crate) fn get_mut(&mut self, id: PatientId) -> Option<&mut Patient> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.records.get_mut(index)
    }

    pub fn records(&self) -> &[Patient] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
