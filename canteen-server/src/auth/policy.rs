//! Declarative role-based access policy
//!
//! One table decides which role may perform which action; handlers call
//! [`require`] before doing any privileged work instead of re-deriving
//! role checks inline. Resource-level ownership (own order, own canteen)
//! stays with the handlers since it needs the row.

use shared::error::{AppError, ErrorCode};
use shared::models::Role;

/// Privileged actions known to the policy table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateOrder,
    ViewOwnOrders,
    ViewCanteenOrders,
    ViewAllOrders,
    TransitionOrder,
    OverrideOrderStatus,
    CancelOwnOrder,
    CancelCanteenOrder,
    CancelAnyOrder,
    RefundOrder,
    ManageMenu,
    ManageCanteens,
    ManageUsers,
}

/// The single source of truth for role permissions. Admin short-circuits
/// to allow in [`allows`]; rows here list non-admin grants only.
const POLICY: &[(Role, Action)] = &[
    // Students
    (Role::Student, Action::CreateOrder),
    (Role::Student, Action::ViewOwnOrders),
    (Role::Student, Action::CancelOwnOrder),
    // Partners
    (Role::Partner, Action::ViewCanteenOrders),
    (Role::Partner, Action::TransitionOrder),
    (Role::Partner, Action::CancelCanteenOrder),
    (Role::Partner, Action::ManageMenu),
];

/// Whether `role` may perform `action`
pub fn allows(role: Role, action: Action) -> bool {
    if role == Role::Admin {
        return true;
    }
    POLICY.iter().any(|(r, a)| *r == role && *a == action)
}

/// Guard helper: error with PermissionDenied when the policy says no
pub fn require(role: Role, action: Action) -> Result<(), AppError> {
    if allows(role, action) {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::PermissionDenied))
    }
}
