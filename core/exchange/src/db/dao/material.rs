use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use scraplink_persistence::executor::{
    do_with_transaction, readonly_transaction, AsDao, ConnType, PoolType,
};

use crate::auth::{check, Action};
use crate::db::dao::user::get_user;
use crate::db::model::{Material, MaterialPatch, MaterialStatus, NewMaterial};
use crate::db::schema::exchange_material::dsl;
use crate::db::schema::exchange_request::dsl as dsl_request;
use crate::db::schema::exchange_transaction::dsl as dsl_transaction;
use crate::error::Error;

pub struct MaterialDao<'c> {
    pool: &'c PoolType,
}

impl<'a> AsDao<'a> for MaterialDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self {
        MaterialDao { pool }
    }
}

pub(super) fn get_material(conn: &ConnType, material_id: &str) -> Result<Material, Error> {
    dsl::exchange_material
        .find(material_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Material [{}]", material_id)))
}

/// Decrements the remaining quantity as a single read-modify-write against
/// the persisted row. Must run inside the caller's transaction. There is no
/// reversal: a rejected request never restores quantity.
pub(super) fn reserve(
    conn: &ConnType,
    material_id: &str,
    quantity: f64,
    now: NaiveDateTime,
) -> Result<Material, Error> {
    let material = get_material(conn, material_id)?;

    if material.status != MaterialStatus::Available {
        return Err(Error::InvalidState(format!(
            "Material [{}] is not available ({}).",
            material.id, material.status
        )));
    }
    if quantity <= 0.0 || quantity > material.quantity {
        return Err(Error::InsufficientQuantity {
            requested: quantity,
            available: material.quantity,
        });
    }

    let remaining = material.quantity - quantity;
    let status = if remaining <= 0.0 {
        MaterialStatus::Sold
    } else {
        MaterialStatus::Available
    };
    diesel::update(&material)
        .set((
            dsl::quantity.eq(remaining),
            dsl::status.eq(status),
            dsl::updated_at.eq(now),
        ))
        .execute(conn)?;

    get_material(conn, material_id)
}

impl<'c> MaterialDao<'c> {
    pub async fn create(
        &self,
        owner_id: String,
        new_material: NewMaterial,
    ) -> Result<Material, Error> {
        do_with_transaction(self.pool, move |conn| {
            let owner = get_user(conn, &owner_id)?;
            check(&owner, Action::CreateMaterial)?;

            let material = Material::new(new_material, &owner.id)?;
            diesel::insert_into(dsl::exchange_material)
                .values(&material)
                .execute(conn)?;
            Ok(material)
        })
        .await
    }

    pub async fn get(&self, material_id: String) -> Result<Option<Material>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_material
                .find(material_id)
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn list_for_owner(&self, owner_id: String) -> Result<Vec<Material>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_material
                .filter(dsl::owner_id.eq(owner_id))
                .order(dsl::created_at.desc())
                .load(conn)?)
        })
        .await
    }

    pub async fn list_available(&self) -> Result<Vec<Material>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_material
                .filter(dsl::status.eq(MaterialStatus::Available))
                .order(dsl::created_at.desc())
                .load(conn)?)
        })
        .await
    }

    pub async fn update(
        &self,
        actor_id: String,
        material_id: String,
        patch: MaterialPatch,
    ) -> Result<Material, Error> {
        do_with_transaction(self.pool, move |conn| {
            let actor = get_user(conn, &actor_id)?;
            let mut material = get_material(conn, &material_id)?;
            check(&actor, Action::UpdateMaterial(&material))?;

            if let Some(name) = patch.name {
                material.name = name;
            }
            if let Some(category) = patch.category {
                material.category = category;
            }
            if let Some(quantity) = patch.quantity {
                if quantity < 0.0 {
                    return Err(Error::Validation("Quantity can't be negative.".into()));
                }
                material.quantity = quantity;
            }
            if let Some(unit) = patch.unit {
                material.unit = unit;
            }
            if let Some(location) = patch.location {
                material.location = location;
            }
            if let Some(price) = patch.price {
                if price < 0.0 {
                    return Err(Error::Validation("Price can't be negative.".into()));
                }
                material.price = price;
            }
            if let Some(description) = patch.description {
                material.description = description;
            }
            if let Some(images) = patch.images {
                material.images = serde_json::to_string(&images)?;
            }
            if let Some(status) = patch.status {
                // Status is monotonic. Moving a listing back to Available
                // once it left that state is not a valid transition.
                if material.status != MaterialStatus::Available && status != material.status {
                    return Err(Error::InvalidState(format!(
                        "Can't change Material [{}] status from {} to {}.",
                        material.id, material.status, status
                    )));
                }
                material.status = status;
            }
            if material.status == MaterialStatus::Sold && material.quantity > 0.0 {
                return Err(Error::InvalidState(format!(
                    "Material [{}] can't be sold with {} {} remaining.",
                    material.id, material.quantity, material.unit
                )));
            }
            material.updated_at = Utc::now().naive_utc();

            diesel::update(dsl::exchange_material.find(&material.id))
                .set((
                    dsl::name.eq(&material.name),
                    dsl::category.eq(&material.category),
                    dsl::quantity.eq(material.quantity),
                    dsl::unit.eq(&material.unit),
                    dsl::location.eq(&material.location),
                    dsl::price.eq(material.price),
                    dsl::description.eq(&material.description),
                    dsl::images.eq(&material.images),
                    dsl::status.eq(material.status),
                    dsl::updated_at.eq(material.updated_at),
                ))
                .execute(conn)?;
            Ok(material)
        })
        .await
    }

    /// Deletes the listing together with its dependent rows, in fixed
    /// dependency order: Transaction, then Request, then Material.
    pub async fn delete(&self, actor_id: String, material_id: String) -> Result<(), Error> {
        do_with_transaction(self.pool, move |conn| {
            let actor = get_user(conn, &actor_id)?;
            let material = get_material(conn, &material_id)?;
            check(&actor, Action::DeleteMaterial(&material))?;

            let request_ids: Vec<String> = dsl_request::exchange_request
                .filter(dsl_request::material_id.eq(&material.id))
                .select(dsl_request::id)
                .load(conn)?;

            let num_transactions = diesel::delete(
                dsl_transaction::exchange_transaction
                    .filter(dsl_transaction::request_id.eq_any(&request_ids)),
            )
            .execute(conn)?;
            let num_requests = diesel::delete(
                dsl_request::exchange_request.filter(dsl_request::id.eq_any(&request_ids)),
            )
            .execute(conn)?;
            diesel::delete(dsl::exchange_material.find(&material.id)).execute(conn)?;

            log::info!(
                "Deleted Material [{}] with {} requests and {} transactions.",
                material.id,
                num_requests,
                num_transactions
            );
            Ok(())
        })
        .await
    }
}
