use crate::config::DataPaths;
use crate::errors::PortalError;
use crate::logging::append_run_log;
use crate::records::{Address, MedicalHistory, PatientRecord, UserRecord};
use crate::runtime::{FileSystem, NumberSource};
use crate::store::{generate_unique_id, write_json_array};
use crate::types::{Role, NHI_RANGE};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const DEFAULT_PATIENT_NHI: u32 = 200_001;
/// Default patient NHI written by older demo generators, outside `NHI_RANGE`.
pub const PREVIOUS_DEFAULT_PATIENT_NHI: u32 = 100_001;
pub const DEFAULT_PROFESSIONAL_ID: u32 = 22_333;
pub const DEFAULT_ADMIN_ID: u32 = 12_345;

const FIRST_NAMES: &[&str] = &[
    "Aroha", "Ben", "Chloe", "Dev", "Emma", "Finn", "Grace", "Hemi", "Isla", "Jack", "Kiri",
    "Liam", "Mia", "Noah", "Olivia", "Priya", "Quinn", "Ruby", "Sam", "Tama",
];
const LAST_NAMES: &[&str] = &[
    "Anderson", "Brown", "Chen", "Davies", "Edwards", "Fraser", "Gill", "Harris", "Ngata",
    "Patel", "Reid", "Smith", "Taylor", "Walker", "Wilson", "Young",
];
const GENDERS: &[&str] = &["Female", "Male", "Other"];
const STREETS: &[&str] = &[
    "Queen Street", "King Street", "Victoria Avenue", "Church Road", "Beach Road",
    "Hillside Crescent", "Park Lane", "Station Road",
];
const CITIES: &[&str] = &[
    "Auckland", "Wellington", "Christchurch", "Hamilton", "Dunedin", "Nelson", "Napier",
];
const REGIONS: &[&str] = &[
    "Auckland", "Wellington", "Canterbury", "Waikato", "Otago", "Nelson", "Hawke's Bay",
];
const COUNTRIES: &[&str] = &["New Zealand", "Australia", "USA", "Canada", "United Kingdom"];
const ALLERGIES: &[&str] = &["None", "Shellfish", "Peanuts", "Latex", "Dairy"];
const MEDICATIONS: &[&str] = &["None", "Aspirin", "Vitamin D", "Multivitamin", "Paracetamol"];
const BLOOD_TYPES: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
const NOTES: &[&str] = &[
    "Routine check-up recommended annually.",
    "No concerns at last visit.",
    "Follow up on blood pressure readings.",
    "Prefers morning appointments.",
    "Referred for physiotherapy.",
];
const PASSWORD_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
const PASSWORD_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct DemoData {
    pub users: Vec<UserRecord>,
    pub patients: Vec<PatientRecord>,
    pub random_patients: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSummary {
    pub users_path: PathBuf,
    pub patients_path: PathBuf,
    pub users_written: usize,
    pub patients_written: usize,
    pub random_patients: u32,
    pub replaced: Vec<PathBuf>,
}

fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, PortalError> {
    serde_json::from_value(value).map_err(|e| PortalError::Store(e.to_string()))
}

pub fn default_users() -> Result<Vec<UserRecord>, PortalError> {
    from_json(json!([
        {
            "nhi": null,
            "id": DEFAULT_ADMIN_ID,
            "email": "admin@email.com",
            "phone": "000-000-0000",
            "address": {"street": "123 Admin Street", "city": "City", "state": "State", "zipCode": "8008"},
            "password": "admin123",
            "firstName": "System",
            "lastName": "Administrator",
            "gender": "Other",
            "dateOfBirth": "0001-01-01",
            "role": "admin"
        },
        {
            "nhi": null,
            "id": DEFAULT_PROFESSIONAL_ID,
            "email": "pro@email.com",
            "phone": "000-000-0000",
            "address": {"street": "123 Pro Drive", "city": "City", "state": "State", "zipCode": "8008"},
            "password": "pro123",
            "firstName": "Mista.",
            "lastName": "Miyagi",
            "gender": "Male",
            "dateOfBirth": "1984-06-22",
            "role": "professional"
        },
        {
            "nhi": DEFAULT_PATIENT_NHI,
            "id": null,
            "firstName": "Daniel",
            "lastName": "LaRusso",
            "dateOfBirth": "1984-06-22",
            "gender": "Male",
            "phone": "021-555-0003",
            "email": "patient@email.com",
            "password": "patient123",
            "address": {"street": "888 Dojo Lane", "city": "Newark", "state": "New Jersey", "zipCode": "8008"},
            "role": "patient"
        }
    ]))
}

pub fn default_patient_record() -> PatientRecord {
    PatientRecord {
        nhi: DEFAULT_PATIENT_NHI,
        first_name: "Daniel".to_string(),
        last_name: "LaRusso".to_string(),
        date_of_birth: "1984-06-22".to_string(),
        gender: "Male".to_string(),
        phone: "021-555-0003".to_string(),
        email: "patient@email.com".to_string(),
        address: Address {
            street: "888 Dojo Lane".to_string(),
            city: "Newark".to_string(),
            state: "New Jersey".to_string(),
            zip_code: "8008".to_string(),
            country: Some("USA".to_string()),
        },
        medical_history: MedicalHistory {
            allergies: vec!["Cobra Venom".to_string()],
            current_medications: vec!["Viagra".to_string()],
            blood_type: "O+".to_string(),
            notes: "Built different.".to_string(),
        },
        assigned_gp: Some(DEFAULT_PROFESSIONAL_ID),
        extra: Map::new(),
    }
}

fn pick(numbers: &dyn NumberSource, pool: &[&'static str]) -> &'static str {
    let last = pool.len().saturating_sub(1) as u32;
    let index = numbers.next_in_range(0, last) as usize;
    pool.get(index).copied().unwrap_or_default()
}

/// Distinct picks, between `min` and `max` of them.
fn pick_several(numbers: &dyn NumberSource, pool: &[&str], min: u32, max: u32) -> Vec<String> {
    let wanted = numbers.next_in_range(min, max) as usize;
    let mut remaining = pool.to_vec();
    let mut chosen = Vec::with_capacity(wanted);
    while chosen.len() < wanted && !remaining.is_empty() {
        let last = remaining.len() - 1;
        let index = (numbers.next_in_range(0, last as u32) as usize).min(last);
        chosen.push(remaining.remove(index).to_string());
    }
    chosen
}

fn random_password(numbers: &dyn NumberSource) -> String {
    let last = (PASSWORD_CHARS.len() - 1) as u32;
    (0..PASSWORD_LEN)
        .filter_map(|_| PASSWORD_CHARS.get(numbers.next_in_range(0, last) as usize))
        .map(|byte| char::from(*byte))
        .collect()
}

fn random_address(numbers: &dyn NumberSource, with_country: bool) -> Address {
    Address {
        street: format!("{} {}", numbers.next_in_range(1, 999), pick(numbers, STREETS)),
        city: pick(numbers, CITIES).to_string(),
        state: pick(numbers, REGIONS).to_string(),
        zip_code: format!("{:04}", numbers.next_in_range(1000, 9999)),
        country: with_country.then(|| pick(numbers, COUNTRIES).to_string()),
    }
}

fn random_patient(
    numbers: &dyn NumberSource,
    nhi: u32,
) -> Result<(UserRecord, PatientRecord), PortalError> {
    let first_name = pick(numbers, FIRST_NAMES).to_string();
    let last_name = pick(numbers, LAST_NAMES).to_string();
    let date_of_birth = format!(
        "{:04}-{:02}-{:02}",
        numbers.next_in_range(1926, 2024),
        numbers.next_in_range(1, 12),
        numbers.next_in_range(1, 28)
    );
    let gender = pick(numbers, GENDERS).to_string();
    let phone = format!("021-555-{:04}", numbers.next_in_range(0, 9999));
    let email = format!(
        "{}.{}.{nhi}@example.com",
        first_name.to_lowercase(),
        last_name.to_lowercase()
    );

    let mut extra = Map::new();
    extra.insert("phone".to_string(), json!(phone));
    extra.insert(
        "address".to_string(),
        serde_json::to_value(random_address(numbers, false))
            .map_err(|e| PortalError::Store(e.to_string()))?,
    );
    extra.insert("gender".to_string(), json!(gender));
    extra.insert("dateOfBirth".to_string(), json!(date_of_birth));
    let user = UserRecord {
        nhi: Some(nhi),
        id: None,
        email: email.clone(),
        password: random_password(numbers),
        role: Role::Patient.as_str().to_string(),
        first_name: first_name.clone(),
        last_name: last_name.clone(),
        extra,
    };

    let patient = PatientRecord {
        nhi,
        first_name,
        last_name,
        date_of_birth,
        gender,
        phone,
        email,
        address: random_address(numbers, true),
        medical_history: MedicalHistory {
            allergies: pick_several(numbers, ALLERGIES, 1, 3),
            current_medications: pick_several(numbers, MEDICATIONS, 0, 3),
            blood_type: pick(numbers, BLOOD_TYPES).to_string(),
            notes: pick(numbers, NOTES).to_string(),
        },
        assigned_gp: Some(DEFAULT_PROFESSIONAL_ID),
        extra: Map::new(),
    };
    Ok((user, patient))
}

/// Default accounts plus `random_patients` generated patients, all assigned
/// to the default professional.
pub fn build_demo_data(
    numbers: &dyn NumberSource,
    random_patients: u32,
) -> Result<DemoData, PortalError> {
    let mut users = default_users()?;
    let mut patients = vec![default_patient_record()];
    let mut taken: BTreeSet<u32> = users.iter().filter_map(|user| user.nhi).collect();

    for _ in 0..random_patients {
        let nhi = generate_unique_id(numbers, NHI_RANGE, &taken)
            .ok_or_else(|| PortalError::Store("no unused NHI numbers left".to_string()))?;
        taken.insert(nhi);
        let (user, patient) = random_patient(numbers, nhi)?;
        users.push(user);
        patients.push(patient);
    }

    Ok(DemoData {
        users,
        patients,
        random_patients,
    })
}

/// Replaces both store files with `data`.
pub fn write_demo_data(
    fs: &dyn FileSystem,
    paths: &DataPaths,
    data: &DemoData,
) -> Result<DemoSummary, PortalError> {
    fs.create_dir_all(&paths.dir)?;
    let mut replaced = Vec::new();
    for path in [&paths.users, &paths.patients] {
        if fs.exists(path) {
            fs.remove_file(path)?;
            replaced.push(path.clone());
        }
    }
    write_json_array(fs, &paths.users, &data.users)?;
    write_json_array(fs, &paths.patients, &data.patients)?;

    append_run_log(
        "info",
        "demo.generated",
        json!({
            "users": data.users.len(),
            "patients": data.patients.len(),
            "replaced": replaced.len(),
        }),
    );
    Ok(DemoSummary {
        users_path: paths.users.clone(),
        patients_path: paths.patients.clone(),
        users_written: data.users.len(),
        patients_written: data.patients.len(),
        random_patients: data.random_patients,
        replaced,
    })
}

pub fn summary_lines(summary: &DemoSummary) -> Vec<String> {
    let mut lines = summary
        .replaced
        .iter()
        .map(|path| format!("Deleted existing {}", path.display()))
        .collect::<Vec<_>>();
    lines.extend([
        format!(
            "Created {} with {} users",
            summary.users_path.display(),
            summary.users_written
        ),
        format!(
            "Created {} with {} patient records",
            summary.patients_path.display(),
            summary.patients_written
        ),
        "Demo data generation complete!".to_string(),
        "Demo data includes:".to_string(),
        "1 Default Admin (admin@email.com / admin123)".to_string(),
        "1 Default Professional (pro@email.com / pro123)".to_string(),
        "1 Default Patient (patient@email.com / patient123)".to_string(),
        format!(
            "Note: the default patient's NHI is now {DEFAULT_PATIENT_NHI} (older demo data used {PREVIOUS_DEFAULT_PATIENT_NHI})"
        ),
        format!("{} Random patients", summary.random_patients),
        format!(
            "All patients assigned to default professional (Mista. Miyagi, ID: {DEFAULT_PROFESSIONAL_ID})"
        ),
    ]);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{FakeFileSystem, FakeNumberSource, ProductionNumberSource};
    use std::path::Path;

    fn paths() -> DataPaths {
        DataPaths {
            dir: PathBuf::from("/data"),
            users: PathBuf::from("/data/users.json"),
            patients: PathBuf::from("/data/patients.json"),
            log: PathBuf::from("/log/run.jsonl"),
        }
    }

    #[test]
    fn defaults_cover_every_role() {
        let users = default_users().expect("defaults");
        let roles = users.iter().filter_map(UserRecord::role).collect::<Vec<_>>();
        assert_eq!(roles, vec![Role::Admin, Role::Professional, Role::Patient]);
        assert_eq!(users[1].full_name(), "Mista. Miyagi");
        assert_eq!(users[2].nhi, Some(DEFAULT_PATIENT_NHI));
        assert_eq!(users[0].extra.get("phone"), Some(&json!("000-000-0000")));
    }

    #[test]
    fn random_patients_have_unique_nhis_in_range() {
        let data = build_demo_data(&ProductionNumberSource, 25).expect("demo");
        assert_eq!(data.users.len(), 28);
        assert_eq!(data.patients.len(), 26);

        let nhis = data.patients.iter().map(|p| p.nhi).collect::<BTreeSet<_>>();
        assert_eq!(nhis.len(), 26);
        assert!(nhis.iter().all(|n| (NHI_RANGE.0..=NHI_RANGE.1).contains(n)));
        assert!(data
            .patients
            .iter()
            .all(|p| p.assigned_gp == Some(DEFAULT_PROFESSIONAL_ID)));
        for patient in &data.patients[1..] {
            let history = &patient.medical_history;
            assert!((1..=3).contains(&history.allergies.len()));
            assert!(history.current_medications.len() <= 3);
            assert!(BLOOD_TYPES.contains(&history.blood_type.as_str()));
        }
    }

    #[test]
    fn colliding_draws_are_redrawn() {
        let numbers = FakeNumberSource::with_values([DEFAULT_PATIENT_NHI, 300_000]);
        let data = build_demo_data(&numbers, 1).expect("demo");
        assert_eq!(data.patients[1].nhi, 300_000);
        assert_eq!(data.users[3].nhi, Some(300_000));
        assert_eq!(data.users[3].email, data.patients[1].email);
    }

    #[test]
    fn write_replaces_existing_files() {
        let fs = FakeFileSystem::with_file("/data/users.json", "[{\"stale\":true}]");
        let data = build_demo_data(&FakeNumberSource::default(), 0).expect("demo");
        let summary = write_demo_data(&fs, &paths(), &data).expect("write");

        assert_eq!(summary.replaced, vec![PathBuf::from("/data/users.json")]);
        assert_eq!((summary.users_written, summary.patients_written), (3, 1));
        let users = fs.contents(Path::new("/data/users.json")).expect("users");
        assert!(!users.contains("stale"));
        assert!(users.contains("admin@email.com"));

        let lines = summary_lines(&summary);
        assert_eq!(lines[0], "Deleted existing /data/users.json");
        assert!(lines.contains(&"Demo data generation complete!".to_string()));
        assert!(lines.contains(
            &"Note: the default patient's NHI is now 200001 (older demo data used 100001)"
                .to_string()
        ));
    }
}
