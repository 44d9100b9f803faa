//! The ward engine: one instance owning the patient registry and the bed pool.
//!
//! Every operation here is a synchronous, total function over in-memory state.
//! Nothing in this module performs I/O; persistence and locking live in the
//! service layer so the engine itself stays trivially testable.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ward_types::{Age, PatientName};

use crate::allocation::{run_pass, PreemptionEvent};
use crate::beds::{Bed, BedId, BedPool, BedStatus, PoolSummary};
use crate::patient::{Patient, PatientId, PatientStatus, Priority, Registry};
use crate::{WardError, WardResult};

/// Registry-wide status counts for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardStats {
    pub total: u32,
    pub waiting: u32,
    pub admitted: u32,
    pub discharged: u32,
}

/// Counts of patients admitted on a given date, broken down by current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total: u32,
    pub admitted: u32,
    pub discharged: u32,
}

/// The allocation engine: both stores plus every operation over them.
///
/// The engine is an explicit instance, never ambient state; callers share one
/// behind the service layer's single-writer lock. The engine deliberately does
/// not derive `Deserialize`: restores go through [`Ward::from_parts`] so both
/// stores are re-validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ward {
    patients: Registry,
    beds: BedPool,
}

impl Ward {
    /// Create a fresh ward with an empty registry and `bed_count` available beds.
    pub fn new(bed_count: u32) -> Self {
        Self {
            patients: Registry::new(),
            beds: BedPool::new(bed_count),
        }
    }

    /// Restore a ward from persisted records, re-validating both stores.
    ///
    /// Beyond the per-store density checks, this verifies the relationship
    /// invariant across the stores: every admitted patient holds a distinct
    /// bed marked `Occupied`, and nobody else holds one. An occupied bed with
    /// no holder is accepted (a bed blocked by the external override). A
    /// snapshot violating any of this is rejected, so the engine never starts
    /// from a state it could not have produced.
    pub fn from_parts(patients: Vec<Patient>, beds: Vec<Bed>) -> WardResult<Self> {
        let patients = Registry::from_records(patients)?;
        let beds = BedPool::from_beds(beds)?;

        let mut claimed: Vec<BedId> = Vec::new();
        for patient in patients.records() {
            match (patient.is_admitted(), patient.bed) {
                (true, Some(bed)) => {
                    let record = beds.get(bed).ok_or_else(|| {
                        WardError::Validation(format!(
                            "{} is admitted to {}, which does not exist",
                            patient.id, bed
                        ))
                    })?;
                    if record.status != BedStatus::Occupied {
                        return Err(WardError::Validation(format!(
                            "{} is admitted to {}, which is marked {}",
                            patient.id, bed, record.status
                        )));
                    }
                    if claimed.contains(&bed) {
                        return Err(WardError::Validation(format!(
                            "{} is held by more than one admitted patient",
                            bed
                        )));
                    }
                    claimed.push(bed);
                }
                (true, None) => {
                    return Err(WardError::Validation(format!(
                        "{} is admitted but holds no bed",
                        patient.id
                    )));
                }
                (false, Some(bed)) => {
                    return Err(WardError::Validation(format!(
                        "{} is {} but still references {}",
                        patient.id, patient.status, bed
                    )));
                }
                (false, None) => {}
            }
        }

        Ok(Self { patients, beds })
    }

    /// Append a new waiting patient to the queue.
    ///
    /// Validation happens before any mutation, so a rejected submission leaves
    /// the registry untouched. No allocation pass is run; that is the caller's
    /// responsibility.
    pub fn submit_request(
        &mut self,
        name: &str,
        age: u32,
        history: String,
        priority: Priority,
    ) -> WardResult<PatientId> {
        let name = PatientName::new(name)?;
        let age = Age::new(age)?;
        Ok(self.patients.submit(name, age, history, priority))
    }

    /// Run one allocation pass dated today.
    pub fn run_allocation_pass(&mut self) -> Vec<PreemptionEvent> {
        self.run_allocation_pass_on(chrono::Utc::now().date_naive())
    }

    /// Run one allocation pass with an explicit admission date.
    pub fn run_allocation_pass_on(&mut self, today: NaiveDate) -> Vec<PreemptionEvent> {
        run_pass(&mut self.patients, &mut self.beds, today)
    }

    /// Discharge an admitted patient, freeing their bed.
    ///
    /// Returns the freed bed. Fails with a precondition error when the patient
    /// is not currently admitted; no automatic pass is triggered.
    pub fn discharge(&mut self, id: PatientId) -> WardResult<BedId> {
        let patient = self
            .patients
            .get(id)
            .ok_or_else(|| WardError::NotFound(format!("no such patient: {}", id)))?;
        if !patient.is_admitted() {
            return Err(WardError::Precondition(format!(
                "{} is {}, only admitted patients can be discharged",
                id, patient.status
            )));
        }
        let bed = patient.bed.ok_or_else(|| {
            WardError::Precondition(format!("{} is admitted but holds no bed", id))
        })?;

        if let Some(record) = self.patients.get_mut(id) {
            record.discharge();
        }
        self.beds.set_status(bed, BedStatus::Available)?;
        Ok(bed)
    }

    /// Externally override a bed's status.
    ///
    /// Marking an occupied bed `Available` force-discharges the patient holding
    /// it ("forced vacancy" — deliberately a discharge, not a return to the
    /// queue) and returns their id. Marking an available bed `Occupied` blocks
    /// it with no patient attached, taking it out of service. Setting the
    /// current status again is a no-op.
    pub fn set_bed_status(
        &mut self,
        id: BedId,
        status: BedStatus,
    ) -> WardResult<Option<PatientId>> {
        let bed = self
            .beds
            .get(id)
            .ok_or_else(|| WardError::NotFound(format!("no such bed: {}", id)))?;
        if bed.status == status {
            return Ok(None);
        }

        let displaced = if status == BedStatus::Available {
            let holder = self
                .patients
                .records()
                .iter()
                .find(|p| p.is_admitted() && p.bed == Some(id))
                .map(|p| p.id);
            if let Some(holder_id) = holder {
                if let Some(record) = self.patients.get_mut(holder_id) {
                    record.discharge();
                }
            }
            holder
        } else {
            None
        };

        self.beds.set_status(id, status)?;
        Ok(displaced)
    }

    /// All waiting patients in submission order.
    pub fn list_waiting(&self) -> Vec<&Patient> {
        self.patients
            .records()
            .iter()
            .filter(|p| p.is_waiting())
            .collect()
    }

    /// All admitted patients in id order.
    pub fn list_admitted(&self) -> Vec<&Patient> {
        self.patients
            .records()
            .iter()
            .filter(|p| p.is_admitted())
            .collect()
    }

    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.get(id)
    }

    pub fn patients(&self) -> &[Patient] {
        self.patients.records()
    }

    pub fn beds(&self) -> &[Bed] {
        self.beds.beds()
    }

    pub fn pool_summary(&self) -> PoolSummary {
        self.beds.summary()
    }

    /// Status counts across the whole registry.
    pub fn stats(&self) -> WardStats {
        let mut stats = WardStats {
            total: self.patients.len() as u32,
            waiting: 0,
            admitted: 0,
            discharged: 0,
        };
        for patient in self.patients.records() {
            match patient.status {
                PatientStatus::Waiting => stats.waiting += 1,
                PatientStatus::Admitted => stats.admitted += 1,
                PatientStatus::Discharged => stats.discharged += 1,
            }
        }
        stats
    }

    /// Counts of patients whose current admission date matches `date`.
    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        let mut summary = DailySummary {
            date,
            total: 0,
            admitted: 0,
            discharged: 0,
        };
        for patient in self.patients.records() {
            if patient.admitted_on != Some(date) {
                continue;
            }
            summary.total += 1;
            match patient.status {
                PatientStatus::Admitted => summary.admitted += 1,
                PatientStatus::Discharged => summary.discharged += 1,
                PatientStatus::Waiting => {}
            }
        }
        summary
    }

    /// Patient count per age, for the dashboard's age chart.
    pub fn age_distribution(&self) -> BTreeMap<u32, u32> {
        let mut distribution = BTreeMap::new();
        for patient in self.patients.records() {
            *distribution.entry(patient.age.years()).or_insert(0) += 1;
        }
        distribution
    }

    /// Drop all patients and recreate the bed pool (demo-only reset).
    pub fn reset(&mut self, bed_count: u32) {
        self.patients = Registry::new();
        self.beds = BedPool::new(bed_count);
    }
}
