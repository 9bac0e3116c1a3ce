use crate::errors::PortalError;
use crate::logging::append_run_log;
use crate::records::{NewUser, PatientRecord, UserRecord};
use crate::runtime::{FileSystem, NumberSource};
use crate::types::{Role, NHI_RANGE, PROFESSIONAL_ID_RANGE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MAX_ID_ATTEMPTS: usize = 10_000;

fn read_json_array<T: DeserializeOwned>(
    fs: &dyn FileSystem,
    path: &Path,
) -> Result<Vec<T>, PortalError> {
    let raw = fs.read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| PortalError::Store(e.to_string()))
}

pub(crate) fn write_json_array<T: Serialize>(
    fs: &dyn FileSystem,
    path: &Path,
    items: &[T],
) -> Result<(), PortalError> {
    let text =
        serde_json::to_string_pretty(items).map_err(|e| PortalError::Store(e.to_string()))?;
    fs.write_string(path, &text)
}

/// Read failures degrade to an empty collection.
fn load_or_empty<T: DeserializeOwned>(fs: &dyn FileSystem, path: &Path, store: &str) -> Vec<T> {
    match read_json_array(fs, path) {
        Ok(items) => items,
        Err(error) => {
            append_run_log(
                "error",
                "store.load_failed",
                json!({
                    "store": store,
                    "path": path.display().to_string(),
                    "error": error.to_string(),
                }),
            );
            Vec::new()
        }
    }
}

fn save_or_false<T: Serialize>(fs: &dyn FileSystem, path: &Path, items: &[T], store: &str) -> bool {
    match write_json_array(fs, path, items) {
        Ok(()) => true,
        Err(error) => {
            append_run_log(
                "error",
                "store.save_failed",
                json!({
                    "store": store,
                    "path": path.display().to_string(),
                    "error": error.to_string(),
                }),
            );
            false
        }
    }
}

/// Rejection sampling against `taken`. Gives up after `MAX_ID_ATTEMPTS`
/// draws, or at once when the range is already full.
pub fn generate_unique_id(
    numbers: &dyn NumberSource,
    (low, high): (u32, u32),
    taken: &BTreeSet<u32>,
) -> Option<u32> {
    let capacity = u64::from(high - low) + 1;
    let occupied = taken.range(low..=high).count() as u64;
    if occupied >= capacity {
        return None;
    }
    (0..MAX_ID_ATTEMPTS)
        .map(|_| numbers.next_in_range(low, high))
        .find(|candidate| !taken.contains(candidate))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateUserOutcome {
    pub success: bool,
    pub message: String,
    pub user: Option<UserRecord>,
}

impl CreateUserOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            user: None,
        }
    }
}

#[derive(Clone)]
pub struct UserStore {
    fs: Arc<dyn FileSystem>,
    numbers: Arc<dyn NumberSource>,
    path: PathBuf,
}

impl UserStore {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        numbers: Arc<dyn NumberSource>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            numbers,
            path: path.into(),
        }
    }

    pub fn load_all(&self) -> Vec<UserRecord> {
        load_or_empty(self.fs.as_ref(), &self.path, "users")
    }

    pub fn save_all(&self, users: &[UserRecord]) -> bool {
        save_or_false(self.fs.as_ref(), &self.path, users, "users")
    }

    pub fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.load_all()
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
    }

    /// Users for a read-modify-write. A missing file reads as empty; a file
    /// that exists but cannot be read or parsed is an error.
    fn load_for_update(&self) -> Result<Vec<UserRecord>, PortalError> {
        if !self.fs.exists(&self.path) {
            return Ok(Vec::new());
        }
        read_json_array(self.fs.as_ref(), &self.path)
    }

    pub fn create(&self, new_user: NewUser) -> CreateUserOutcome {
        let mut users = match self.load_for_update() {
            Ok(users) => users,
            Err(error) => {
                append_run_log(
                    "error",
                    "store.update_refused",
                    json!({
                        "store": "users",
                        "path": self.path.display().to_string(),
                        "error": error.to_string(),
                    }),
                );
                return CreateUserOutcome::failed(
                    "The account file could not be read, so no account was created!",
                );
            }
        };
        if users
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(&new_user.email))
        {
            return CreateUserOutcome::failed("An account with this email already exists!");
        }

        let (nhi, id) = match new_user.role {
            Role::Patient => {
                let taken = users.iter().filter_map(|u| u.nhi).collect();
                match generate_unique_id(self.numbers.as_ref(), NHI_RANGE, &taken) {
                    Some(nhi) => (Some(nhi), None),
                    None => return CreateUserOutcome::failed("No NHI numbers are available!"),
                }
            }
            Role::Professional => {
                let taken = users.iter().filter_map(|u| u.id).collect();
                match generate_unique_id(self.numbers.as_ref(), PROFESSIONAL_ID_RANGE, &taken) {
                    Some(id) => (None, Some(id)),
                    None => {
                        return CreateUserOutcome::failed("No professional IDs are available!")
                    }
                }
            }
            Role::Admin => (None, None),
        };

        let user = UserRecord {
            nhi,
            id,
            email: new_user.email,
            password: new_user.password,
            role: new_user.role.as_str().to_string(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            extra: Map::new(),
        };
        users.push(user.clone());
        if !self.save_all(&users) {
            return CreateUserOutcome::failed("Failed to save the new account!");
        }

        append_run_log(
            "info",
            "store.user_created",
            json!({
                "role": user.role,
                "identifier": user.identifier_label(),
            }),
        );
        CreateUserOutcome {
            success: true,
            message: format!(
                "Account created successfully! ({})",
                user.identifier_label()
            ),
            user: Some(user),
        }
    }
}

#[derive(Clone)]
pub struct PatientStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl PatientStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn load_all(&self) -> Vec<PatientRecord> {
        load_or_empty(self.fs.as_ref(), &self.path, "patients")
    }

    pub fn save_all(&self, patients: &[PatientRecord]) -> bool {
        save_or_false(self.fs.as_ref(), &self.path, patients, "patients")
    }

    pub fn find_by_nhi(&self, nhi: u32) -> Option<PatientRecord> {
        self.load_all()
            .into_iter()
            .find(|patient| patient.nhi == nhi)
    }

    pub fn assigned_to(&self, gp_id: u32) -> Vec<PatientRecord> {
        self.load_all()
            .into_iter()
            .filter(|patient| patient.assigned_gp == Some(gp_id))
            .collect()
    }
}
