use serde::{Deserialize, Serialize};

/// Account roles known to the navigation layer. Stored as plain strings in
/// the user file so unrecognised roles survive a load/save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Professional,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "patient" => Some(Self::Patient),
            "professional" => Some(Self::Professional),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Professional => "professional",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Password,
}

/// Inclusive identifier ranges. NHIs and professional ids never overlap.
pub const NHI_RANGE: (u32, u32) = (200_000, 999_999);
pub const PROFESSIONAL_ID_RANGE: (u32, u32) = (10_000, 99_999);
