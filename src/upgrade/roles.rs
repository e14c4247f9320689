//! Upgradeable roles and the fields each application requires.

use super::UpgradeError;
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Document,
    /// Captured with the camera rather than picked from disk.
    Selfie,
}

impl FieldKind {
    #[must_use]
    pub fn is_file(self) -> bool {
        !matches!(self, FieldKind::Text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
}

const fn field(name: &'static str, kind: FieldKind, label: &'static str) -> FieldSpec {
    FieldSpec { name, kind, label }
}

const DRIVER_FIELDS: &[FieldSpec] = &[
    field("license_number", FieldKind::Text, "Driving license number"),
    field("license_document", FieldKind::Document, "Driving license"),
    field("vehicle_registration", FieldKind::Document, "Vehicle registration"),
    field("selfie", FieldKind::Selfie, "Selfie"),
];

const CONDUCTOR_FIELDS: &[FieldSpec] = &[
    field("employee_id", FieldKind::Text, "Employee ID"),
    field("id_document", FieldKind::Document, "National ID"),
    field("selfie", FieldKind::Selfie, "Selfie"),
];

const STATION_MANAGER_FIELDS: &[FieldSpec] = &[
    field("station_id", FieldKind::Text, "Station"),
    field("authorization_letter", FieldKind::Document, "Authorization letter"),
    field("id_document", FieldKind::Document, "National ID"),
];

const CONTRIBUTOR_FIELDS: &[FieldSpec] = &[
    field("motivation", FieldKind::Text, "Why do you want to contribute?"),
    field("id_document", FieldKind::Document, "National ID"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Driver,
    Conductor,
    StationManager,
    Contributor,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Driver,
        Role::Conductor,
        Role::StationManager,
        Role::Contributor,
    ];

    /// Identifier used in API paths and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Conductor => "conductor",
            Role::StationManager => "station_manager",
            Role::Contributor => "contributor",
        }
    }

    /// Required fields in the order the form presents them.
    #[must_use]
    pub fn required_fields(self) -> &'static [FieldSpec] {
        match self {
            Role::Driver => DRIVER_FIELDS,
            Role::Conductor => CONDUCTOR_FIELDS,
            Role::StationManager => STATION_MANAGER_FIELDS,
            Role::Contributor => CONTRIBUTOR_FIELDS,
        }
    }

    #[must_use]
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.required_fields().iter().find(|spec| spec.name == name)
    }

    #[must_use]
    pub fn needs_camera(self) -> bool {
        self.required_fields()
            .iter()
            .any(|spec| spec.kind == FieldKind::Selfie)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UpgradeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UpgradeError::UnknownRole(value.to_string()))
    }
}
