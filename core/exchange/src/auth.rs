//! Role- and ownership-based access policy. Pure functions of the actor and
//! the target's ownership fields; no side effects and no database access.

use crate::db::model::{Material, MaterialStatus, Request, RequestStatus, Role, User};
use crate::error::Error;

#[derive(Clone, Copy, Debug)]
pub enum Action<'a> {
    ListUsers,
    SetUserActive(&'a User),
    SetUserVerified(&'a User),
    CreateMaterial,
    UpdateMaterial(&'a Material),
    DeleteMaterial(&'a Material),
    CreateRequest(&'a Material),
    AcceptRequest(&'a Request),
    RejectRequest(&'a Request),
    CompleteRequest(&'a Request),
}

pub fn can(actor: &User, action: Action<'_>) -> bool {
    check(actor, action).is_ok()
}

/// Rules are evaluated in priority order: identity rules before state rules,
/// so a caller that is not permitted at all gets `Unauthorized` rather than
/// `InvalidState`.
pub fn check(actor: &User, action: Action<'_>) -> Result<(), Error> {
    match action {
        Action::ListUsers => {
            if actor.role != Role::Admin {
                return Err(Error::Unauthorized("Admin access required.".into()));
            }
        }
        Action::SetUserActive(user) | Action::SetUserVerified(user) => {
            if actor.role != Role::Admin {
                return Err(Error::Unauthorized("Admin access required.".into()));
            }
            // Admins cannot moderate their own account.
            if actor.id == user.id {
                return Err(Error::Unauthorized(
                    "Admins can't moderate their own account.".into(),
                ));
            }
        }
        Action::CreateMaterial => {
            if actor.role != Role::Industry {
                return Err(Error::Unauthorized(
                    "Only industry accounts can create materials.".into(),
                ));
            }
        }
        Action::UpdateMaterial(material) | Action::DeleteMaterial(material) => {
            if actor.id != material.owner_id {
                return Err(Error::Unauthorized(format!(
                    "Not the owner of Material [{}].",
                    material.id
                )));
            }
        }
        Action::CreateRequest(material) => {
            // Admins are never a transacting party.
            if actor.role == Role::Admin {
                return Err(Error::Unauthorized(
                    "Admins can't request materials.".into(),
                ));
            }
            if actor.id == material.owner_id {
                return Err(Error::Unauthorized(
                    "Can't request your own material.".into(),
                ));
            }
            if material.status != MaterialStatus::Available {
                return Err(Error::InvalidState(format!(
                    "Material [{}] is not available.",
                    material.id
                )));
            }
        }
        Action::AcceptRequest(request) | Action::RejectRequest(request) => {
            if actor.id != request.owner_id {
                return Err(Error::Unauthorized(format!(
                    "Not the owner of Request [{}].",
                    request.id
                )));
            }
            if request.status != RequestStatus::Pending {
                return Err(Error::InvalidState(format!(
                    "Request [{}] is not pending ({}).",
                    request.id, request.status
                )));
            }
        }
        Action::CompleteRequest(request) => {
            if actor.id != request.owner_id && actor.id != request.requester_id {
                return Err(Error::Unauthorized(format!(
                    "Not a party of Request [{}].",
                    request.id
                )));
            }
            if request.status != RequestStatus::Accepted {
                return Err(Error::InvalidState(format!(
                    "Request [{}] must be accepted before completion ({}).",
                    request.id, request.status
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::model::{NewMaterial, NewUser};

    fn user(role: Role) -> User {
        User::new(NewUser {
            email: format!("{}@test.local", role),
            name: role.to_string(),
            role,
            company_name: None,
            tax_id: None,
            location: None,
        })
    }

    fn material_of(owner: &User) -> Material {
        Material::new(
            NewMaterial {
                name: "Steel offcuts".into(),
                category: "Metals".into(),
                quantity: 100.0,
                unit: "kg".into(),
                location: "Prague".into(),
                price: 10.0,
                description: String::new(),
                images: vec![],
            },
            &owner.id,
        )
        .unwrap()
    }

    #[test]
    fn only_industry_creates_materials() {
        assert!(can(&user(Role::Industry), Action::CreateMaterial));
        assert!(!can(&user(Role::Artisan), Action::CreateMaterial));
        assert!(!can(&user(Role::Admin), Action::CreateMaterial));
    }

    #[test]
    fn owner_cannot_request_own_material() {
        let owner = user(Role::Industry);
        let material = material_of(&owner);
        assert!(!can(&owner, Action::CreateRequest(&material)));
        assert!(can(&user(Role::Artisan), Action::CreateRequest(&material)));
    }

    #[test]
    fn admin_is_never_a_transacting_party() {
        let owner = user(Role::Industry);
        let material = material_of(&owner);
        assert!(!can(&user(Role::Admin), Action::CreateRequest(&material)));
    }

    #[test]
    fn request_on_unavailable_material_is_invalid_state() {
        let owner = user(Role::Industry);
        let mut material = material_of(&owner);
        material.status = MaterialStatus::Sold;

        let artisan = user(Role::Artisan);
        match check(&artisan, Action::CreateRequest(&material)) {
            Err(Error::InvalidState(_)) => (),
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }

    #[test]
    fn only_request_owner_accepts() {
        let owner = user(Role::Industry);
        let other_industry = user(Role::Industry);
        let artisan = user(Role::Artisan);
        let material = material_of(&owner);
        let request = Request::new(&material, &artisan.id, 10.0, String::new());

        assert!(can(&owner, Action::AcceptRequest(&request)));
        assert!(!can(&other_industry, Action::AcceptRequest(&request)));
        assert!(!can(&artisan, Action::AcceptRequest(&request)));
    }

    #[test]
    fn either_party_completes_accepted_request() {
        let owner = user(Role::Industry);
        let artisan = user(Role::Artisan);
        let material = material_of(&owner);
        let mut request = Request::new(&material, &artisan.id, 10.0, String::new());

        // Pending request can't be completed by anyone.
        assert!(!can(&owner, Action::CompleteRequest(&request)));

        request.status = RequestStatus::Accepted;
        assert!(can(&owner, Action::CompleteRequest(&request)));
        assert!(can(&artisan, Action::CompleteRequest(&request)));
        assert!(!can(&user(Role::Artisan), Action::CompleteRequest(&request)));
    }

    #[test]
    fn admin_cannot_moderate_own_account() {
        let admin = user(Role::Admin);
        let other = user(Role::Artisan);
        assert!(can(&admin, Action::SetUserActive(&other)));
        assert!(!can(&admin, Action::SetUserActive(&admin)));
        assert!(!can(&other, Action::SetUserActive(&admin)));
    }
}
