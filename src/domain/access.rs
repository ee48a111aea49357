//! Access control resolver.
//!
//! Every read and mutation on church data passes through [`authorize`].
//! A super admin may act on any church; everyone else only on their own
//! church, and only when their role reaches the operation's minimum level.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::RoleCode;
use crate::errors::{AppError, AppResult};

/// The authenticated identity behind a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub church_id: Uuid,
    pub role: RoleCode,
}

/// Operations gated by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ViewDashboard,
    ViewMembers,
    ViewGroups,
    ViewActivity,
    /// Timer status, attendance and follow-up updates
    TrackNewFriends,
    ManageGroupMembership,
    /// Create groups and edit their capacity
    ManageGroups,
    /// Change member roles
    ManageMembers,
    ExportData,
    ImportData,
    /// Cross-church administration
    ManageChurches,
}

impl Operation {
    /// Lowest role allowed to perform the operation within its own church
    pub fn min_role(&self) -> RoleCode {
        match self {
            Operation::ViewDashboard => RoleCode::NewFriend,
            Operation::ViewMembers | Operation::ViewGroups => RoleCode::Cm,
            Operation::ViewActivity
            | Operation::TrackNewFriends
            | Operation::ManageGroupMembership => RoleCode::Cl,
            Operation::ManageGroups => RoleCode::Csl,
            Operation::ManageMembers | Operation::ExportData | Operation::ImportData => {
                RoleCode::Admin
            }
            Operation::ManageChurches => RoleCode::SuperAdmin,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Operation::ViewDashboard => "view the dashboard",
            Operation::ViewMembers => "view members",
            Operation::ViewGroups => "view groups",
            Operation::ViewActivity => "view activity logs",
            Operation::TrackNewFriends => "update new friend tracking",
            Operation::ManageGroupMembership => "manage group membership",
            Operation::ManageGroups => "manage groups",
            Operation::ManageMembers => "manage members",
            Operation::ExportData => "export data",
            Operation::ImportData => "import data",
            Operation::ManageChurches => "manage churches",
        }
    }
}

impl Principal {
    /// Operator identity for command-line maintenance. Acts with
    /// SUPER_ADMIN rights and is not tied to a stored user.
    pub fn system() -> Self {
        Self {
            user_id: Uuid::nil(),
            church_id: Uuid::nil(),
            role: RoleCode::SuperAdmin,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self.role, RoleCode::SuperAdmin)
    }

    pub fn can(&self, target_church_id: Uuid, operation: Operation) -> bool {
        authorize(self, target_church_id, operation).is_ok()
    }

    /// Church to scope a listing to: `None` means every church (super admin
    /// without a filter). A non-super-admin asking for another church is denied.
    pub fn scope(&self, requested: Option<Uuid>, operation: Operation) -> AppResult<Option<Uuid>> {
        match (self.is_super_admin(), requested) {
            (true, requested) => Ok(requested),
            (false, Some(church_id)) => {
                authorize(self, church_id, operation)?;
                Ok(Some(church_id))
            }
            (false, None) => {
                authorize(self, self.church_id, operation)?;
                Ok(Some(self.church_id))
            }
        }
    }
}

/// Decide whether `principal` may perform `operation` on `target_church_id`.
pub fn authorize(principal: &Principal, target_church_id: Uuid, operation: Operation) -> AppResult<()> {
    if principal.is_super_admin() {
        return Ok(());
    }

    if principal.church_id != target_church_id {
        tracing::warn!(
            user_id = %principal.user_id,
            church_id = %target_church_id,
            "Cross-church access denied"
        );
        return Err(AppError::denied(format!(
            "cannot {} for another church",
            operation.describe()
        )));
    }

    if !principal.role.at_least(operation.min_role()) {
        return Err(AppError::denied(format!(
            "{} role cannot {}",
            principal.role,
            operation.describe()
        )));
    }

    Ok(())
}

/// Check a role change: the actor needs `ManageMembers` on the member's church
/// and cannot grant a role above their own. Only a super admin can therefore
/// promote to SUPER_ADMIN.
pub fn authorize_role_assignment(
    principal: &Principal,
    target_church_id: Uuid,
    new_role: RoleCode,
) -> AppResult<()> {
    authorize(principal, target_church_id, Operation::ManageMembers)?;

    if new_role.level() > principal.role.level() {
        return Err(AppError::denied(format!(
            "{} cannot assign the {} role",
            principal.role, new_role
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: RoleCode, church_id: Uuid) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            church_id,
            role,
        }
    }

    #[test]
    fn test_super_admin_always_allowed() {
        let home = Uuid::new_v4();
        let other = Uuid::new_v4();
        let admin = principal(RoleCode::SuperAdmin, home);
        assert!(authorize(&admin, other, Operation::ManageChurches).is_ok());
        assert!(authorize(&admin, other, Operation::ImportData).is_ok());
    }

    #[test]
    fn test_other_church_denied_for_every_role() {
        let home = Uuid::new_v4();
        let other = Uuid::new_v4();
        for role in RoleCode::ALL.into_iter().filter(|r| *r != RoleCode::SuperAdmin) {
            let p = principal(role, home);
            let err = authorize(&p, other, Operation::ViewDashboard).unwrap_err();
            assert!(matches!(err, AppError::PermissionDenied(_)), "{role}");
        }
    }

    #[test]
    fn test_level_gate_within_church() {
        let church = Uuid::new_v4();
        assert!(authorize(&principal(RoleCode::Csl, church), church, Operation::ManageGroups).is_ok());
        assert!(authorize(&principal(RoleCode::Cl, church), church, Operation::ManageGroups).is_err());
        assert!(authorize(&principal(RoleCode::Cl, church), church, Operation::TrackNewFriends).is_ok());
        assert!(authorize(&principal(RoleCode::Cm, church), church, Operation::ViewMembers).is_ok());
        assert!(authorize(&principal(RoleCode::NewFriend, church), church, Operation::ViewMembers).is_err());
        assert!(authorize(&principal(RoleCode::Admin, church), church, Operation::ExportData).is_ok());
        assert!(authorize(&principal(RoleCode::Vsl, church), church, Operation::ExportData).is_err());
        assert!(authorize(&principal(RoleCode::Admin, church), church, Operation::ManageChurches).is_err());
    }

    #[test]
    fn test_role_assignment_ceiling() {
        let church = Uuid::new_v4();
        let admin = principal(RoleCode::Admin, church);
        assert!(authorize_role_assignment(&admin, church, RoleCode::Vsl).is_ok());
        assert!(authorize_role_assignment(&admin, church, RoleCode::SuperAdmin).is_err());

        let root = principal(RoleCode::SuperAdmin, Uuid::new_v4());
        assert!(authorize_role_assignment(&root, church, RoleCode::SuperAdmin).is_ok());
    }

    #[test]
    fn test_scope_resolution() {
        let home = Uuid::new_v4();
        let other = Uuid::new_v4();

        let root = principal(RoleCode::SuperAdmin, home);
        assert_eq!(root.scope(None, Operation::ExportData).unwrap(), None);
        assert_eq!(root.scope(Some(other), Operation::ExportData).unwrap(), Some(other));

        let admin = principal(RoleCode::Admin, home);
        assert_eq!(admin.scope(None, Operation::ExportData).unwrap(), Some(home));
        assert!(admin.scope(Some(other), Operation::ExportData).is_err());
    }
}
