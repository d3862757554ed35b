//! Built-in demo practice data.
//!
//! Used when the daemon runs without an external directory feed, so every
//! operation (lookup, booking, prescriptions, results) works out of the box.

use chrono::{Duration, NaiveDate, Utc};
use frontdesk_common::directory::{
    AppointmentSlot, PatientRecord, PracticeDirectory, RepeatMedication, ResultSensitivity,
    SlotStore, TestResult,
};

pub fn demo_directory() -> PracticeDirectory {
    PracticeDirectory {
        patients: vec![
            PatientRecord {
                patient_id: "P001".to_string(),
                full_name: "Sarah Mitchell".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 5, 3).expect("valid date"),
                nhs_number: "4857773456".to_string(),
                phone: "07700900123".to_string(),
                repeat_medications: vec![
                    RepeatMedication {
                        name: "salbutamol".to_string(),
                        dose: "100mcg inhaler".to_string(),
                        directions: "two puffs as required".to_string(),
                    },
                    RepeatMedication {
                        name: "sertraline".to_string(),
                        dose: "50mg".to_string(),
                        directions: "one tablet daily".to_string(),
                    },
                ],
                history: vec![
                    "2026-07-12 asthma review with practice nurse".to_string(),
                    "2026-03-02 medication review, sertraline continued".to_string(),
                ],
            },
            PatientRecord {
                patient_id: "P002".to_string(),
                full_name: "David Okonkwo".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1958, 11, 21).expect("valid date"),
                nhs_number: "6023871190".to_string(),
                phone: "07700900456".to_string(),
                repeat_medications: vec![RepeatMedication {
                    name: "ramipril".to_string(),
                    dose: "5mg".to_string(),
                    directions: "one capsule each morning".to_string(),
                }],
                history: vec!["2026-06-30 blood pressure check, well controlled".to_string()],
            },
        ],
        test_results: vec![
            TestResult {
                patient_id: "P001".to_string(),
                test_name: "Full blood count".to_string(),
                taken_on: NaiveDate::from_ymd_opt(2026, 8, 10).expect("valid date"),
                sensitivity: ResultSensitivity::Deliverable,
                summary: "All values within the normal range. No action needed.".to_string(),
            },
            TestResult {
                patient_id: "P001".to_string(),
                test_name: "Cervical screening".to_string(),
                taken_on: NaiveDate::from_ymd_opt(2026, 8, 12).expect("valid date"),
                sensitivity: ResultSensitivity::ClinicianOnly,
                summary: String::new(),
            },
            TestResult {
                patient_id: "P002".to_string(),
                test_name: "HbA1c".to_string(),
                taken_on: NaiveDate::from_ymd_opt(2026, 8, 20).expect("valid date"),
                sensitivity: ResultSensitivity::NotAvailable,
                summary: String::new(),
            },
        ],
    }
}

pub fn demo_slots() -> SlotStore {
    let base = Utc::now().naive_utc().date();
    let mut slots = Vec::new();
    for (offset, slot_id, clinician, hour, minute) in [
        (1i64, "S1", "Dr Patel", 9, 30),
        (1, "S2", "Dr Okafor", 11, 0),
        (2, "S3", "Dr Patel", 14, 15),
        (3, "S4", "Nurse Williams", 10, 45),
        (4, "S5", "Dr Okafor", 16, 0),
    ] {
        if let Some(start) = (base + Duration::days(offset)).and_hms_opt(hour, minute, 0) {
            slots.push(AppointmentSlot {
                slot_id: slot_id.to_string(),
                clinician: clinician.to_string(),
                start,
                available: true,
                booked_for: None,
            });
        }
    }
    SlotStore::new(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_directory_is_consistent() {
        let dir = demo_directory();
        assert_eq!(dir.patients.len(), 2);
        for result in &dir.test_results {
            assert!(dir.find_patient(&result.patient_id).is_some());
        }
    }

    #[test]
    fn test_demo_slots_all_available() {
        let slots = demo_slots();
        assert_eq!(slots.available().len(), 5);
    }
}
