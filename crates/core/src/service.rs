//! The service facade: the single-writer boundary around the engine.
//!
//! The allocation pass is not reentrant-safe, so the whole engine sits behind
//! one mutex. Every operation — mutating or read-only — takes the lock for its
//! full duration; at the expected scale (tens of patients, tens of beds) there
//! is nothing to gain from finer-grained locking. When the service was opened
//! from a data directory, each mutation persists a fresh snapshot before the
//! lock is released, so snapshots serialise with the mutations they record.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::allocation::PreemptionEvent;
use crate::beds::{Bed, BedId, BedStatus, PoolSummary};
use crate::config::CoreConfig;
use crate::patient::{Patient, PatientId, Priority};
use crate::storage;
use crate::ward::{DailySummary, Ward, WardStats};
use crate::WardResult;

/// Clonable handle to one shared ward engine.
#[derive(Clone)]
pub struct WardService {
    inner: Arc<Mutex<Ward>>,
    snapshot_path: Option<PathBuf>,
}

impl WardService {
    /// Create a service with no persistence, for tests and embedded use.
    pub fn in_memory(bed_count: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Ward::new(bed_count))),
            snapshot_path: None,
        }
    }

    /// Open the ward stored under the configured data directory, creating a
    /// fresh one with the configured bed count when no snapshot exists yet.
    pub fn open(config: &CoreConfig) -> WardResult<Self> {
        let path = config.snapshot_path();
        let ward = storage::load_or_init(&path, config.bed_count())?;
        Ok(Self {
            inner: Arc::new(Mutex::new(ward)),
            snapshot_path: Some(path),
        })
    }

    fn persist(&self, ward: &Ward) -> WardResult<()> {
        if let Some(path) = &self.snapshot_path {
            storage::save(ward, path)?;
        }
        Ok(())
    }

    /// Append a new waiting patient. Does not run an allocation pass.
    pub fn submit_request(
        &self,
        name: &str,
        age: u32,
        history: String,
        priority: Priority,
    ) -> WardResult<PatientId> {
        let mut ward = self.inner.lock();
        let id = ward.submit_request(name, age, history, priority)?;
        self.persist(&ward)?;
        tracing::info!(%id, %priority, "patient added to queue");
        Ok(id)
    }

    /// Run one allocation pass and report any preemptions.
    pub fn run_allocation_pass(&self) -> WardResult<Vec<PreemptionEvent>> {
        let mut ward = self.inner.lock();
        let events = ward.run_allocation_pass();
        self.persist(&ward)?;
        for event in &events {
            tracing::info!(
                patient = %event.patient,
                name = %event.name,
                priority = %event.priority,
                bed = %event.freed_bed,
                "patient bumped for emergency admission"
            );
        }
        Ok(events)
    }

    /// Discharge an admitted patient, returning the freed bed.
    pub fn discharge(&self, id: PatientId) -> WardResult<BedId> {
        let mut ward = self.inner.lock();
        let bed = ward.discharge(id)?;
        self.persist(&ward)?;
        tracing::info!(patient = %id, %bed, "patient discharged");
        Ok(bed)
    }

    /// Externally override a bed's status (see [`Ward::set_bed_status`]).
    pub fn set_bed_status(&self, id: BedId, status: BedStatus) -> WardResult<Option<PatientId>> {
        let mut ward = self.inner.lock();
        let displaced = ward.set_bed_status(id, status)?;
        self.persist(&ward)?;
        if let Some(patient) = displaced {
            tracing::info!(%patient, bed = %id, "patient discharged by bed override");
        }
        Ok(displaced)
    }

    /// Drop all patients and recreate the bed pool (demo-only reset).
    pub fn reset(&self, bed_count: u32) -> WardResult<()> {
        let mut ward = self.inner.lock();
        ward.reset(bed_count);
        self.persist(&ward)?;
        tracing::info!(bed_count, "ward reset");
        Ok(())
    }

    pub fn list_waiting(&self) -> Vec<Patient> {
        self.inner.lock().list_waiting().into_iter().cloned().collect()
    }

    pub fn list_admitted(&self) -> Vec<Patient> {
        self.inner.lock().list_admitted().into_iter().cloned().collect()
    }

    pub fn patient(&self, id: PatientId) -> Option<Patient> {
        self.inner.lock().patient(id).cloned()
    }

    pub fn beds(&self) -> Vec<Bed> {
        self.inner.lock().beds().to_vec()
    }

    pub fn pool_summary(&self) -> PoolSummary {
        self.inner.lock().pool_summary()
    }

    pub fn stats(&self) -> WardStats {
        self.inner.lock().stats()
    }

    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        self.inner.lock().daily_summary(date)
    }

    pub fn age_distribution(&self) -> BTreeMap<u32, u32> {
        self.inner.lock().age_distribution()
    }
}
