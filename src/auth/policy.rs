use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// User role, stored in Postgres as the `user_role` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Super,
    Admin,
    Usuario,
}

/// Gated operations. Registration and login are ungated and so have no
/// entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreatePayment,
    ListPayments,
    UpdatePayment,
    DeactivatePayment,
}

impl Action {
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Action::CreatePayment => &[Role::Admin, Role::Super],
            Action::ListPayments => &[Role::Admin, Role::Super, Role::Usuario],
            Action::UpdatePayment => &[Role::Admin, Role::Super],
            Action::DeactivatePayment => &[Role::Admin, Role::Super],
        }
    }
}

/// Checks the caller's role against the table above. A mismatch is the 401
/// `not authorized` case; the 403 cases (missing/invalid token) are raised
/// earlier, by the extractor.
pub fn authorize(action: Action, role: Role) -> Result<(), ApiError> {
    if action.allowed_roles().contains(&role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usuario_can_only_list() {
        assert!(authorize(Action::ListPayments, Role::Usuario).is_ok());
        assert!(authorize(Action::CreatePayment, Role::Usuario).is_err());
        assert!(authorize(Action::UpdatePayment, Role::Usuario).is_err());
        assert!(authorize(Action::DeactivatePayment, Role::Usuario).is_err());
    }

    #[test]
    fn admin_and_super_pass_every_gate() {
        for role in [Role::Admin, Role::Super] {
            for action in [
                Action::CreatePayment,
                Action::ListPayments,
                Action::UpdatePayment,
                Action::DeactivatePayment,
            ] {
                assert!(authorize(action, role).is_ok(), "{action:?} / {role:?}");
            }
        }
    }

    #[test]
    fn mismatch_is_the_forbidden_error() {
        let err = authorize(Action::CreatePayment, Role::Usuario).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Super).unwrap(), "\"super\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::Usuario).unwrap(), "\"usuario\"");
    }
}
