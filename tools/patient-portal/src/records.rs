use crate::types::Role;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Account entry in the users file. Unknown keys are carried through
/// `extra` so saving never drops data written by other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub nhi: Option<u32>,
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl UserRecord {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn identifier_label(&self) -> String {
        match (self.nhi, self.id) {
            (Some(nhi), _) => format!("NHI {nhi}"),
            (None, Some(id)) => format!("ID {id}"),
            (None, None) => "no identifier".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub allergies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_medications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blood_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, deserialize_with = "null_as_default")]
    pub street: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub nhi: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date_of_birth: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: Address,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medical_history: MedicalHistory,
    #[serde(default, rename = "assignedGP")]
    pub assigned_gp: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PatientRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Multi-line record page. Credentials are never part of it.
pub fn format_patient_record(patient: &PatientRecord) -> String {
    let address = &patient.address;
    let mut location = [
        address.street.as_str(),
        address.city.as_str(),
        address.state.as_str(),
        address.zip_code.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>();
    if let Some(country) = address.country.as_deref().filter(|c| !c.is_empty()) {
        location.push(country);
    }
    let history = &patient.medical_history;
    let gp = patient
        .assigned_gp
        .map(|id| id.to_string())
        .unwrap_or_else(|| "Unassigned".to_string());

    [
        format!("NHI: {}", patient.nhi),
        format!("Name: {}", or_dash(&patient.full_name())),
        format!("Date of Birth: {}", or_dash(&patient.date_of_birth)),
        format!("Gender: {}", or_dash(&patient.gender)),
        format!("Phone: {}", or_dash(&patient.phone)),
        format!("Email: {}", or_dash(&patient.email)),
        format!("Address: {}", or_dash(&location.join(", "))),
        String::new(),
        "Medical History".to_string(),
        format!("  Blood Type: {}", or_dash(&history.blood_type)),
        format!("  Allergies: {}", list_or_none(&history.allergies)),
        format!(
            "  Current Medications: {}",
            list_or_none(&history.current_medications)
        ),
        format!("  Notes: {}", or_dash(&history.notes)),
        format!("Assigned GP: {gp}"),
    ]
    .join("\n")
}

pub fn patient_summary_line(patient: &PatientRecord) -> String {
    format!(
        "NHI {} | {} | DOB {} | Blood {}",
        patient.nhi,
        or_dash(&patient.full_name()),
        or_dash(&patient.date_of_birth),
        or_dash(&patient.medical_history.blood_type)
    )
}

pub fn user_summary_line(user: &UserRecord) -> String {
    format!(
        "{} | {} | {} | {}",
        user.identifier_label(),
        or_dash(&user.full_name()),
        user.email,
        user.role
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_patient() -> PatientRecord {
        serde_json::from_value(json!({
            "nhi": 200001,
            "firstName": "Daniel",
            "lastName": "LaRusso",
            "dateOfBirth": "1984-06-22",
            "gender": "Male",
            "phone": "021-555-0003",
            "email": "patient@email.com",
            "password": "patient123",
            "address": {"street": "888 Dojo Lane", "city": "Newark", "state": "New Jersey", "zipCode": "8008", "country": "USA"},
            "medicalHistory": {"allergies": ["Cobra Venom"], "currentMedications": [], "bloodType": "O+", "notes": "Built different."},
            "assignedGP": 22333
        }))
        .expect("patient json")
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let patient = sample_patient();
        assert_eq!(patient.extra.get("password"), Some(&json!("patient123")));
        let back = serde_json::to_value(&patient).expect("serialize");
        assert_eq!(back["password"], json!("patient123"));
        assert_eq!(back["assignedGP"], json!(22333));
    }

    #[test]
    fn record_page_hides_password_and_lists_history() {
        let page = format_patient_record(&sample_patient());
        assert!(page.contains("Name: Daniel LaRusso"));
        assert!(page.contains("Allergies: Cobra Venom"));
        assert!(page.contains("Current Medications: None"));
        assert!(page.contains("Address: 888 Dojo Lane, Newark, New Jersey, 8008, USA"));
        assert!(!page.contains("patient123"));
    }

    #[test]
    fn null_strings_read_as_empty() {
        let user: UserRecord = serde_json::from_value(json!({
            "nhi": 200001,
            "email": "p@x.io",
            "password": null,
            "role": "patient",
            "firstName": null,
            "lastName": "Only"
        }))
        .expect("user json");
        assert_eq!(user.full_name(), "Only");
        assert_eq!(user.password, "");

        let patient: PatientRecord = serde_json::from_value(json!({
            "nhi": 200001,
            "firstName": null,
            "medicalHistory": {"bloodType": null}
        }))
        .expect("patient json");
        assert_eq!(patient_summary_line(&patient), "NHI 200001 | - | DOB - | Blood -");
    }

    #[test]
    fn user_without_role_match_has_no_role() {
        let user: UserRecord = serde_json::from_value(json!({
            "nhi": null,
            "id": 1,
            "email": "x@y.zz",
            "password": "pw",
            "role": "janitor"
        }))
        .expect("user json");
        assert_eq!(user.role(), None);
        assert_eq!(user.identifier_label(), "ID 1");
        assert_eq!(user_summary_line(&user), "ID 1 | - | x@y.zz | janitor");
    }
}
