//! The fixed-size bed pool.
//!
//! Beds are interchangeable units of capacity created once at startup and
//! never added or removed during normal operation. The pool tracks occupancy
//! only; who holds a bed is recorded on the patient side of the relationship.

use serde::{Deserialize, Serialize};

use crate::{WardError, WardResult};

/// Identifier of a bed, fixed for the deployment's lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BedId(pub u32);

impl std::fmt::Display for BedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bed {}", self.0)
    }
}

/// Occupancy state of a single bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BedStatus {
    Available,
    Occupied,
}

impl std::fmt::Display for BedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BedStatus::Available => "Available",
            BedStatus::Occupied => "Occupied",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for BedStatus {
    type Err = WardError;

    fn from_str(s: &str) -> WardResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(BedStatus::Available),
            "occupied" => Ok(BedStatus::Occupied),
            other => Err(WardError::Validation(format!(
                "unknown bed status {:?} (expected Available or Occupied)",
                other
            ))),
        }
    }
}

/// A single bed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: BedId,
    pub status: BedStatus,
}

/// Occupancy counts for the whole pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub available: u32,
    pub occupied: u32,
}

/// The fixed set of beds, ids `1..=n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BedPool {
    beds: Vec<Bed>,
}

impl BedPool {
    /// Create a pool of `count` available beds.
    pub fn new(count: u32) -> Self {
        let beds = (1..=count)
            .map(|n| Bed {
                id: BedId(n),
                status: BedStatus::Available,
            })
            .collect();
        Self { beds }
    }

    /// Restore a pool from previously persisted records.
    ///
    /// Beds must be dense and in id order, exactly as [`BedPool::beds`]
    /// produces them.
    pub fn from_beds(beds: Vec<Bed>) -> WardResult<Self> {
        for (index, bed) in beds.iter().enumerate() {
            let expected = BedId(index as u32 + 1);
            if bed.id != expected {
                return Err(WardError::Validation(format!(
                    "bed pool out of order: expected {} at position {}, found {}",
                    expected, index, bed.id
                )));
            }
        }
        Ok(Self { beds })
    }

    pub fn get(&self, id: BedId) -> Option<&Bed> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.beds.get(index)
    }

    pub(crate) fn get_mut(&mut self, id: BedId) -> Option<&mut Bed> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.beds.get_mut(index)
    }

    pub fn beds(&self) -> &[Bed] {
        &self.beds
    }

    pub fn len(&self) -> usize {
        self.beds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beds.is_empty()
    }

    /// Lowest-id available bed, if any.
    pub fn first_available(&self) -> Option<BedId> {
        self.beds
            .iter()
            .find(|b| b.status == BedStatus::Available)
            .map(|b| b.id)
    }

    pub(crate) fn set_status(&mut self, id: BedId, status: BedStatus) -> WardResult<()> {
        let bed = self
            .get_mut(id)
            .ok_or_else(|| WardError::NotFound(format!("no such bed: {}", id)))?;
        bed.status = status;
        Ok(())
    }

    pub fn summary(&self) -> PoolSummary {
        let occupied = self
            .beds
            .iter()
            .filter(|b| b.status == BedStatus::Occupied)
            .count() as u32;
        PoolSummary {
            available: self.beds.len() as u32 - occupied,
            occupied,
        }
    }
}
