//! The allocation pass: matching waiting patients to beds.
//!
//! A single forward pass over the waiting queue in strict priority order.
//! Free beds are handed out first; when none remain, an `Emergency` patient
//! may bump an admitted `Medium`/`Low` patient out of their bed. Nobody else
//! may preempt, which keeps `Medium` from cascading `Low` patients out of the
//! ward. A bumped patient goes back to waiting and is only reconsidered on
//! the *next* pass, never within the one that bumped them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::beds::{BedId, BedPool, BedStatus};
use crate::patient::{PatientId, Priority, Registry};

/// Notification that a patient lost their bed to an emergency admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreemptionEvent {
    /// The patient who was bumped back to waiting.
    pub patient: PatientId,
    /// Their name, for caller-side notification.
    pub name: String,
    /// Their priority at the time of the bump.
    pub priority: Priority,
    /// The bed that was taken from them.
    pub freed_bed: BedId,
}

/// Run one allocation pass over the given stores.
///
/// Waiting patients are processed in `(priority rank, id)` order; id order is
/// submission order, so equal priorities are served first-come-first-served.
/// The pass is total: it never fails, and with nobody waiting it returns an
/// empty event list without touching either store.
///
/// `today` becomes the admission date of every patient admitted by this pass.
pub fn run_pass(
    registry: &mut Registry,
    pool: &mut BedPool,
    today: NaiveDate,
) -> Vec<PreemptionEvent> {
    let mut queue: Vec<(u8, PatientId, Priority)> = registry
        .records()
        .iter()
        .filter(|p| p.is_waiting())
        .map(|p| (p.priority.rank(), p.id, p.priority))
        .collect();
    if queue.is_empty() {
        return Vec::new();
    }
    queue.sort_by_key(|&(rank, id, _)| (rank, id));

    let mut events = Vec::new();
    let mut admitted = 0u32;

    for (_, id, priority) in queue {
        if let Some(bed) = pool.first_available() {
            place(registry, pool, id, bed, today);
            admitted += 1;
            continue;
        }

        if !priority.may_preempt() {
            continue;
        }

        // No free bed: evict the admitted patient with the weakest claim.
        // Lowest priority first, and among equals the largest id, i.e. the
        // most recent arrival rather than the longest-stayed patient.
        let victim = registry
            .records()
            .iter()
            .filter(|p| p.is_admitted() && !p.priority.may_preempt())
            .max_by_key(|p| (p.priority.rank(), p.id));

        let Some(victim) = victim else {
            // Every bed is held by an emergency patient (or blocked); this
            // patient stays waiting, which is a valid outcome for the pass.
            continue;
        };
        let (victim_id, victim_name, victim_priority) =
            (victim.id, victim.name.to_string(), victim.priority);
        let Some(freed_bed) = victim.bed else {
            // Unreachable while the admitted⇒bed invariant holds.
            continue;
        };

        if let Some(record) = registry.get_mut(victim_id) {
            record.bump();
        }
        place(registry, pool, id, freed_bed, today);
        admitted += 1;
        events.push(PreemptionEvent {
            patient: victim_id,
            name: victim_name,
            priority: victim_priority,
            freed_bed,
        });
    }

    tracing::debug!(
        admitted,
        preemptions = events.len(),
        "allocation pass complete"
    );
    events
}

fn place(registry: &mut Registry, pool: &mut BedPool, id: PatientId, bed: BedId, on: NaiveDate) {
    if let Some(record) = registry.get_mut(id) {
        record.admit(bed, on);
    }
    let _ = pool.set_status(bed, BedStatus::Occupied);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::PatientStatus;
    use ward_types::{Age, PatientName};

    fn today() -> NaiveDate {
        chrono::Utc::now().date_naive()
    }

    fn submit(registry: &mut Registry, name: &str, priority: Priority) -> PatientId {
        registry.submit(
            PatientName::new(name).expect("valid name"),
            Age::new(50).expect("valid age"),
            String::new(),
            priority,
        )
    }

    /// Every admitted patient maps to exactly one occupied bed and vice versa.
    fn assert_bijection(registry: &Registry, pool: &BedPool) {
        let mut held: Vec<BedId> = registry
            .records()
            .iter()
            .filter(|p| p.is_admitted())
            .map(|p| p.bed.expect("admitted patient must hold a bed"))
            .collect();
        held.sort();
        let mut unique = held.clone();
        unique.dedup();
        assert_eq!(held, unique, "two patients share a bed");

        let mut occupied: Vec<BedId> = pool
            .beds()
            .iter()
            .filter(|b| b.status == BedStatus::Occupied)
            .map(|b| b.id)
            .collect();
        occupied.sort();
        assert_eq!(held, occupied, "occupied beds and held beds disagree");

        for patient in registry.records() {
            if !patient.is_admitted() {
                assert!(patient.bed.is_none(), "non-admitted patient holds a bed");
            }
        }
    }

    #[test]
    fn test_pass_with_nobody_waiting_is_a_no_op() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(2);
        let events = run_pass(&mut registry, &mut pool, today());
        assert!(events.is_empty());
        assert_eq!(pool.summary().available, 2);
    }

    #[test]
    fn test_emergency_admitted_before_lower_priorities() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(1);
        let low = submit(&mut registry, "Low", Priority::Low);
        let emergency = submit(&mut registry, "Emergency", Priority::Emergency);

        let events = run_pass(&mut registry, &mut pool, today());
        assert!(events.is_empty());
        assert!(registry.get(emergency).unwrap().is_admitted());
        assert!(registry.get(low).unwrap().is_waiting());
        assert_bijection(&registry, &pool);
    }

    #[test]
    fn test_fifo_within_equal_priority() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(1);
        let first = submit(&mut registry, "First", Priority::Medium);
        let second = submit(&mut registry, "Second", Priority::Medium);

        run_pass(&mut registry, &mut pool, today());
        assert!(registry.get(first).unwrap().is_admitted());
        assert!(registry.get(second).unwrap().is_waiting());
    }

    #[test]
    fn test_medium_never_preempts() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(1);
        let low = submit(&mut registry, "Low", Priority::Low);
        run_pass(&mut registry, &mut pool, today());
        assert!(registry.get(low).unwrap().is_admitted());

        let medium = submit(&mut registry, "Medium", Priority::Medium);
        let events = run_pass(&mut registry, &mut pool, today());
        assert!(events.is_empty());
        assert!(registry.get(low).unwrap().is_admitted());
        assert!(registry.get(medium).unwrap().is_waiting());
        assert_bijection(&registry, &pool);
    }

    #[test]
    fn test_emergency_bumps_low_over_medium() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(2);
        let medium = submit(&mut registry, "Medium", Priority::Medium);
        let low = submit(&mut registry, "Low", Priority::Low);
        run_pass(&mut registry, &mut pool, today());

        let emergency = submit(&mut registry, "Emergency", Priority::Emergency);
        let events = run_pass(&mut registry, &mut pool, today());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].patient, low);
        assert_eq!(events[0].priority, Priority::Low);
        assert!(registry.get(emergency).unwrap().is_admitted());
        assert!(registry.get(medium).unwrap().is_admitted());
        assert!(registry.get(low).unwrap().is_waiting());
        assert_bijection(&registry, &pool);
    }

    #[test]
    fn test_bump_prefers_largest_id_among_equal_priority() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(2);
        let older = submit(&mut registry, "Older", Priority::Low);
        let newer = submit(&mut registry, "Newer", Priority::Low);
        run_pass(&mut registry, &mut pool, today());

        submit(&mut registry, "Emergency", Priority::Emergency);
        let events = run_pass(&mut registry, &mut pool, today());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].patient, newer);
        assert!(registry.get(older).unwrap().is_admitted());
        assert_bijection(&registry, &pool);
    }

    #[test]
    fn test_emergency_with_no_bed_and_no_victim_stays_waiting() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(1);
        submit(&mut registry, "First emergency", Priority::Emergency);
        run_pass(&mut registry, &mut pool, today());

        let second = submit(&mut registry, "Second emergency", Priority::Emergency);
        let events = run_pass(&mut registry, &mut pool, today());
        assert!(events.is_empty());
        assert!(registry.get(second).unwrap().is_waiting());
        assert_bijection(&registry, &pool);
    }

    #[test]
    fn test_bumped_patient_not_reconsidered_within_same_pass() {
        // One bed: a low patient is admitted, then two emergencies arrive.
        // The first emergency bumps the low patient; the second finds no free
        // bed and no bumpable victim, and the freshly bumped low patient must
        // not be re-admitted by this pass.
        let mut registry = Registry::new();
        let mut pool = BedPool::new(1);
        let low = submit(&mut registry, "Low", Priority::Low);
        run_pass(&mut registry, &mut pool, today());

        let first = submit(&mut registry, "E1", Priority::Emergency);
        let second = submit(&mut registry, "E2", Priority::Emergency);
        let events = run_pass(&mut registry, &mut pool, today());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].patient, low);
        assert!(registry.get(first).unwrap().is_admitted());
        assert!(registry.get(second).unwrap().is_waiting());
        assert!(registry.get(low).unwrap().is_waiting());
        assert_bijection(&registry, &pool);
    }

    #[test]
    fn test_pass_is_idempotent() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(1);
        submit(&mut registry, "Low", Priority::Low);
        submit(&mut registry, "Medium", Priority::Medium);
        run_pass(&mut registry, &mut pool, today());

        let before_registry = registry.clone();
        let before_pool = pool.clone();
        let events = run_pass(&mut registry, &mut pool, today());
        assert!(events.is_empty());
        assert_eq!(registry, before_registry);
        assert_eq!(pool, before_pool);
    }

    #[test]
    fn test_scenario_single_bed_emergency_bumps_only_occupant() {
        // Pool of one bed: Low is admitted, Emergency arrives and takes it.
        let mut registry = Registry::new();
        let mut pool = BedPool::new(1);
        let p1 = submit(&mut registry, "P1", Priority::Low);
        run_pass(&mut registry, &mut pool, today());
        assert_eq!(registry.get(p1).unwrap().bed, Some(BedId(1)));

        let p2 = submit(&mut registry, "P2", Priority::Emergency);
        let events = run_pass(&mut registry, &mut pool, today());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].patient, p1);
        assert_eq!(events[0].freed_bed, BedId(1));
        assert_eq!(registry.get(p2).unwrap().bed, Some(BedId(1)));
        assert_eq!(registry.get(p1).unwrap().status, PatientStatus::Waiting);
        assert_bijection(&registry, &pool);
    }

    #[test]
    fn test_scenario_zero_beds_leaves_emergency_waiting() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(0);
        let p1 = submit(&mut registry, "P1", Priority::Emergency);
        let events = run_pass(&mut registry, &mut pool, today());
        assert!(events.is_empty());
        assert!(registry.get(p1).unwrap().is_waiting());
    }

    #[test]
    fn test_scenario_two_beds_admit_both_without_events() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(2);
        let p1 = submit(&mut registry, "P1", Priority::Medium);
        let p2 = submit(&mut registry, "P2", Priority::Low);
        let events = run_pass(&mut registry, &mut pool, today());
        assert!(events.is_empty());
        assert!(registry.get(p1).unwrap().is_admitted());
        assert!(registry.get(p2).unwrap().is_admitted());
        assert_ne!(registry.get(p1).unwrap().bed, registry.get(p2).unwrap().bed);
        assert_bijection(&registry, &pool);
    }

    #[test]
    fn test_admission_date_set_on_admit() {
        let mut registry = Registry::new();
        let mut pool = BedPool::new(1);
        let id = submit(&mut registry, "P1", Priority::Low);
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
        run_pass(&mut registry, &mut pool, date);
        assert_eq!(registry.get(id).unwrap().admitted_on, Some(date));
    }
}
