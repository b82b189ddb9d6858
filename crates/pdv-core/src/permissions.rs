//! # Permissions
//!
//! Role hierarchy and the management rules checked before every mutation.
//!
//! ```text
//! ┌──────────────┬──────────┬──────────┬──────────────────────────────────┐
//! │ Actor        │ Products │ Users    │ May assign role                  │
//! ├──────────────┼──────────┼──────────┼──────────────────────────────────┤
//! │ admin   (3)  │ yes      │ yes      │ admin, manager, user             │
//! │ manager (2)  │ yes      │ yes      │ manager, user (never admin)      │
//! │ user    (1)  │ no       │ no       │ none                             │
//! │ inactive     │ no       │ no       │ none                             │
//! └──────────────┴──────────┴──────────┴──────────────────────────────────┘
//! ```
//!
//! Only an admin may modify another admin.

use crate::error::{CoreError, CoreResult};
use crate::types::{Role, User};

/// The caller of an operation, as far as permissions are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub role: Role,
    pub active: bool,
}

impl Actor {
    pub const fn new(role: Role, active: bool) -> Self {
        Actor { role, active }
    }

    fn is_staff(&self) -> bool {
        self.active && has_permission(self.role, Role::Manager)
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor::new(user.role, user.active)
    }
}

/// `true` when `role` is at or above `required` in the hierarchy.
pub fn has_permission(role: Role, required: Role) -> bool {
    role.level() >= required.level()
}

/// Product create/edit/deactivate. `action` completes the denial message
/// ("criar", "editar", "excluir").
pub fn can_manage_products(actor: Actor, action: &str) -> CoreResult<()> {
    if actor.is_staff() {
        return Ok(());
    }
    Err(denial(actor, action, "produtos"))
}

/// User list/create/update.
pub fn can_manage_users(actor: Actor, action: &str) -> CoreResult<()> {
    if actor.is_staff() {
        return Ok(());
    }
    Err(denial(actor, action, "usuários"))
}

/// Whether `actor` may give `target` role to someone.
pub fn can_assign_role(actor: Actor, target: Role) -> CoreResult<()> {
    if !actor.is_staff() {
        return Err(CoreError::denied(
            "Você não tem permissão para atribuir perfis.",
        ));
    }
    match (actor.role, target) {
        (Role::Admin, _) => Ok(()),
        (Role::Manager, Role::Manager | Role::User) => Ok(()),
        _ => Err(CoreError::denied(
            "Apenas administradores podem atribuir o perfil Administrador.",
        )),
    }
}

/// Whether `actor` may modify a user whose current role is `target_current`.
pub fn can_modify_user(actor: Actor, target_current: Role) -> CoreResult<()> {
    can_manage_users(actor, "atualizar")?;
    if target_current == Role::Admin && actor.role != Role::Admin {
        return Err(CoreError::denied(
            "Apenas administradores podem alterar outro administrador.",
        ));
    }
    Ok(())
}

fn denial(actor: Actor, action: &str, what: &str) -> CoreError {
    if actor.role == Role::User {
        CoreError::denied(format!(
            "Você precisa ser Administrador ou Gerente para {action} {what}."
        ))
    } else {
        CoreError::denied(format!("Você não tem permissão para {action} {what}."))
    }
}
