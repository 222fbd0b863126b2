use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::constants::{ROLE_ADMIN, ROLE_JUNIOR_ADMIN, ROLE_SENIOR_ADMIN};

/// Administrator role matching the `admin_role` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "admin_role")]
pub enum AdminRole {
    /// Primary administrator
    #[sqlx(rename = "Admin")]
    #[serde(rename = "Admin")]
    Admin,
    #[sqlx(rename = "Senior Admin")]
    #[serde(rename = "Senior Admin")]
    SeniorAdmin,
    #[sqlx(rename = "Junior Admin")]
    #[serde(rename = "Junior Admin")]
    JuniorAdmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => ROLE_ADMIN,
            AdminRole::SeniorAdmin => ROLE_SENIOR_ADMIN,
            AdminRole::JuniorAdmin => ROLE_JUNIOR_ADMIN,
        }
    }

    /// Create, update and delete other admins
    pub fn can_manage_admins(&self) -> bool {
        matches!(self, AdminRole::Admin)
    }

    /// Approve/reject restores, send unblock OTPs, change account status
    pub fn can_moderate(&self) -> bool {
        matches!(self, AdminRole::Admin | AdminRole::SeniorAdmin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(AdminRole::Admin),
            ROLE_SENIOR_ADMIN => Ok(AdminRole::SeniorAdmin),
            ROLE_JUNIOR_ADMIN => Ok(AdminRole::JuniorAdmin),
            other => Err(format!("Unknown admin role: {}", other)),
        }
    }
}

/// Database model for `admins`
#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub assign_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
