//! API request and response types for the auth surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role. Closed set; stored as snake_case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Contractor,
    SalesRep,
    CcmEmployee,
    Inspector,
    Guest,
}

impl Role {
    /// Roles an account may self-register as. Everything else is
    /// provisioned by an administrator.
    pub const SELF_REGISTER: &'static [Role] = &[Role::Contractor, Role::Inspector];

    /// Database / wire value (snake_case).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contractor => "contractor",
            Self::SalesRep => "sales_rep",
            Self::CcmEmployee => "ccm_employee",
            Self::Inspector => "inspector",
            Self::Guest => "guest",
        }
    }

    /// Frontend feature-map key (kebab-case).
    pub fn role_key(self) -> &'static str {
        match self {
            Self::Contractor => "contractor",
            Self::SalesRep => "sales-rep",
            Self::CcmEmployee => "ccm-employee",
            Self::Inspector => "inspector",
            Self::Guest => "guest",
        }
    }

    pub fn can_self_register(self) -> bool {
        Self::SELF_REGISTER.contains(&self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contractor" => Ok(Self::Contractor),
            "sales_rep" => Ok(Self::SalesRep),
            "ccm_employee" => Ok(Self::CcmEmployee),
            "inspector" => Ok(Self::Inspector),
            "guest" => Ok(Self::Guest),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Self-registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Token refresh request. The refresh secret travels only in request
/// bodies, never as a URL parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logout request. The refresh token is optional; logout succeeds
/// either way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Password change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// A freshly minted access/refresh pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Public view of an account, attached to login/register responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Frontend feature-map key for the role
    pub role_key: String,
}

/// Login/register response: tokens plus who just authenticated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    pub user: UserSummary,
}

/// Profile of the authenticated account (`GET /api/auth/me`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub role_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [
            Role::Contractor,
            Role::SalesRep,
            Role::CcmEmployee,
            Role::Inspector,
            Role::Guest,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_serde_is_snake_case() {
        let json = serde_json::to_string(&Role::SalesRep).unwrap();
        assert_eq!(json, "\"sales_rep\"");
        let back: Role = serde_json::from_str("\"ccm_employee\"").unwrap();
        assert_eq!(back, Role::CcmEmployee);
    }

    #[test]
    fn test_role_key_mapping() {
        assert_eq!(Role::SalesRep.role_key(), "sales-rep");
        assert_eq!(Role::CcmEmployee.role_key(), "ccm-employee");
        assert_eq!(Role::Contractor.role_key(), "contractor");
    }

    #[test]
    fn test_self_register_allow_list() {
        assert!(Role::Contractor.can_self_register());
        assert!(Role::Inspector.can_self_register());
        assert!(!Role::CcmEmployee.can_self_register());
        assert!(!Role::SalesRep.can_self_register());
        assert!(!Role::Guest.can_self_register());
    }

    #[test]
    fn test_session_response_flattens_tokens() {
        let resp = SessionResponse {
            tokens: AuthTokens {
                access_token: "a".into(),
                refresh_token: "r".into(),
                token_type: "Bearer".into(),
                expires_in: 900,
            },
            user: UserSummary {
                id: Uuid::new_v4(),
                name: "Pat".into(),
                email: "pat@example.com".into(),
                role: Role::Inspector,
                role_key: Role::Inspector.role_key().to_string(),
            },
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["access_token"], "a");
        assert_eq!(value["user"]["role"], "inspector");
    }
}
