//! Snapshot persistence for the ward.
//!
//! Both stores are written as one pretty-printed JSON document under the data
//! directory. The write goes through a temporary file followed by a rename so
//! a crash mid-write never leaves a truncated snapshot behind. A save/restore
//! cycle preserves every record field and both relationship invariants.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::beds::Bed;
use crate::patient::Patient;
use crate::ward::Ward;
use crate::{WardError, WardResult};

/// On-disk layout of the snapshot file.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    patients: Vec<Patient>,
    beds: Vec<Bed>,
}

/// Write the ward's current state to `path`.
pub fn save(ward: &Ward, path: &Path) -> WardResult<()> {
    let snapshot = Snapshot {
        patients: ward.patients().to_vec(),
        beds: ward.beds().to_vec(),
    };
    let json = serde_json::to_string_pretty(&snapshot).map_err(WardError::Serialization)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(WardError::DataDirCreation)?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(WardError::SnapshotWrite)?;
    fs::rename(&tmp, path).map_err(WardError::SnapshotWrite)?;
    Ok(())
}

/// Read a ward back from `path`, re-validating both stores.
pub fn load(path: &Path) -> WardResult<Ward> {
    let contents = fs::read_to_string(path).map_err(WardError::SnapshotRead)?;
    let snapshot: Snapshot =
        serde_json::from_str(&contents).map_err(WardError::Deserialization)?;
    Ward::from_parts(snapshot.patients, snapshot.beds)
}

/// Load the snapshot at `path`, or create a fresh ward with `bed_count` beds
/// when no snapshot exists yet.
pub fn load_or_init(path: &Path, bed_count: u32) -> WardResult<Ward> {
    if path.is_file() {
        load(path)
    } else {
        Ok(Ward::new(bed_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beds::{BedId, BedStatus};
    use crate::patient::Priority;

    #[test]
    fn test_save_and_load_round_trip_preserves_state() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ward.json");

        let mut ward = Ward::new(2);
        let p1 = ward
            .submit_request("Ada", 36, "post-op observation".into(), Priority::Medium)
            .expect("valid submission");
        ward.submit_request("Grace", 47, String::new(), Priority::Low)
            .expect("valid submission");
        ward.run_allocation_pass();
        ward.discharge(p1).expect("admitted");

        save(&ward, &path).expect("save should succeed");
        let restored = load(&path).expect("load should succeed");
        assert_eq!(restored, ward);
    }

    #[test]
    fn test_load_or_init_creates_fresh_ward_without_snapshot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ward.json");

        let ward = load_or_init(&path, 7).expect("should init");
        assert!(ward.patients().is_empty());
        assert_eq!(ward.beds().len(), 7);
    }

    #[test]
    fn test_save_creates_missing_data_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("ward.json");

        let mut ward = Ward::new(1);
        ward.set_bed_status(BedId(1), BedStatus::Occupied)
            .expect("override");
        save(&ward, &path).expect("save should create directories");

        let restored = load(&path).expect("load should succeed");
        assert_eq!(restored.beds()[0].status, BedStatus::Occupied);
    }

    #[test]
    fn test_load_rejects_corrupt_snapshot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ward.json");
        fs::write(&path, "{ not json").expect("write");

        let err = load(&path).expect_err("should reject corrupt file");
        assert!(matches!(err, WardError::Deserialization(_)));
    }

    #[test]
    fn test_load_rejects_snapshot_breaking_bed_relationship() {
        // Hand-edited snapshot: the patient is admitted to bed 1 but the
        // pool says the bed is free. Loading it must fail rather than let
        // the next pass assign the bed twice.
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ward.json");

        let mut ward = Ward::new(1);
        ward.submit_request("Ada", 36, String::new(), Priority::Low)
            .expect("valid submission");
        ward.run_allocation_pass();
        save(&ward, &path).expect("save");

        let edited = fs::read_to_string(&path)
            .expect("read")
            .replace("\"Occupied\"", "\"Available\"");
        fs::write(&path, edited).expect("write");

        let err = load(&path).expect_err("should reject inconsistent snapshot");
        assert!(matches!(err, WardError::Validation(_)));
    }

    #[test]
    fn test_load_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load(&dir.path().join("absent.json")).expect_err("missing file");
        assert!(matches!(err, WardError::SnapshotRead(_)));
    }
}
