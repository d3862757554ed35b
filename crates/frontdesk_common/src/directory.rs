//! Read-only practice directory snapshots and the slot store.
//!
//! The directory (patients, appointments, test results) is supplied to tool
//! execution at turn start as an immutable snapshot; the agent core never
//! owns the backing datastore. The one piece of real concurrency control
//! lives here: `SlotStore::try_book` is a single conditional update so two
//! sessions cannot double-book the same slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A medication on the patient's authorized repeat list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepeatMedication {
    pub name: String,
    pub dose: String,
    /// e.g. "one tablet twice daily"
    pub directions: String,
}

/// Disclosure tier for a test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSensitivity {
    /// Normal results the agent may read out directly.
    Deliverable,
    /// Requires a clinician callback before disclosure (abnormal results,
    /// and always cancer / STI / pregnancy classes).
    ClinicianOnly,
    /// Sample still with the lab.
    NotAvailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub patient_id: String,
    pub test_name: String,
    pub taken_on: NaiveDate,
    pub sensitivity: ResultSensitivity,
    /// Summary shown to the patient only when `Deliverable`.
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    /// NHS-style 10-digit identifier, stored unspaced.
    pub nhs_number: String,
    pub phone: String,
    pub repeat_medications: Vec<RepeatMedication>,
    /// Brief encounter history lines, newest first.
    pub history: Vec<String>,
}

/// A bookable appointment slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSlot {
    pub slot_id: String,
    pub clinician: String,
    pub start: chrono::NaiveDateTime,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_for: Option<String>,
}

/// Immutable per-turn view of the practice data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeDirectory {
    pub patients: Vec<PatientRecord>,
    pub test_results: Vec<TestResult>,
}

impl PracticeDirectory {
    pub fn find_patient(&self, patient_id: &str) -> Option<&PatientRecord> {
        self.patients.iter().find(|p| p.patient_id == patient_id)
    }

    pub fn results_for(&self, patient_id: &str) -> Vec<&TestResult> {
        self.test_results
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .collect()
    }
}

/// Outcome of a conditional booking attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum BookingOutcome {
    Booked { slot_id: String, clinician: String, start: String },
    SlotUnavailable { slot_id: String },
    UnknownSlot { slot_id: String },
}

/// Shared appointment-slot store with check-then-act atomicity.
///
/// Sessions run concurrently; the availability check and the mark-unavailable
/// write happen under one lock so the second booking of a slot always fails
/// with `SlotUnavailable` rather than silently double-booking.
#[derive(Clone)]
pub struct SlotStore {
    slots: Arc<Mutex<HashMap<String, AppointmentSlot>>>,
}

impl SlotStore {
    pub fn new(slots: Vec<AppointmentSlot>) -> Self {
        let map = slots.into_iter().map(|s| (s.slot_id.clone(), s)).collect();
        Self {
            slots: Arc::new(Mutex::new(map)),
        }
    }

    /// Snapshot of currently available slots, soonest first.
    pub fn available(&self) -> Vec<AppointmentSlot> {
        let guard = self.slots.lock().expect("slot store lock poisoned");
        let mut out: Vec<_> = guard.values().filter(|s| s.available).cloned().collect();
        out.sort_by_key(|s| s.start);
        out
    }

    /// Atomically book a slot for a patient. Single conditional update:
    /// the availability check and the write share the lock.
    pub fn try_book(&self, slot_id: &str, patient_id: &str) -> BookingOutcome {
        let mut guard = self.slots.lock().expect("slot store lock poisoned");
        match guard.get_mut(slot_id) {
            Some(slot) if slot.available => {
                slot.available = false;
                slot.booked_for = Some(patient_id.to_string());
                BookingOutcome::Booked {
                    slot_id: slot.slot_id.clone(),
                    clinician: slot.clinician.clone(),
                    start: slot.start.format("%A %e %B at %H:%M").to_string(),
                }
            }
            Some(_) => BookingOutcome::SlotUnavailable {
                slot_id: slot_id.to_string(),
            },
            None => BookingOutcome::UnknownSlot {
                slot_id: slot_id.to_string(),
            },
        }
    }

    pub fn get(&self, slot_id: &str) -> Option<AppointmentSlot> {
        self.slots
            .lock()
            .expect("slot store lock poisoned")
            .get(slot_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn slot(id: &str) -> AppointmentSlot {
        AppointmentSlot {
            slot_id: id.to_string(),
            clinician: "Dr Patel".to_string(),
            start: NaiveDate::from_ymd_opt(2026, 9, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            available: true,
            booked_for: None,
        }
    }

    #[test]
    fn test_try_book_succeeds_once() {
        let store = SlotStore::new(vec![slot("S1")]);
        let first = store.try_book("S1", "P001");
        assert!(matches!(first, BookingOutcome::Booked { .. }));
        let second = store.try_book("S1", "P002");
        assert_eq!(
            second,
            BookingOutcome::SlotUnavailable {
                slot_id: "S1".to_string()
            }
        );
        // First booking stands.
        assert_eq!(store.get("S1").unwrap().booked_for.as_deref(), Some("P001"));
    }

    #[test]
    fn test_try_book_unknown_slot() {
        let store = SlotStore::new(vec![]);
        assert_eq!(
            store.try_book("nope", "P001"),
            BookingOutcome::UnknownSlot {
                slot_id: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_available_sorted_and_filtered() {
        let mut early = slot("S1");
        early.start = NaiveDate::from_ymd_opt(2026, 9, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let late = slot("S2");
        let store = SlotStore::new(vec![late, early]);
        store.try_book("S2", "P001");
        let avail = store.available();
        assert_eq!(avail.len(), 1);
        assert_eq!(avail[0].slot_id, "S1");
    }

    #[test]
    fn test_concurrent_booking_no_double_book() {
        let store = SlotStore::new(vec![slot("S1")]);
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                store.try_book("S1", &format!("P{:03}", i))
            }));
        }
        let booked = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|o| matches!(o, BookingOutcome::Booked { .. }))
            .count();
        assert_eq!(booked, 1);
    }
}
