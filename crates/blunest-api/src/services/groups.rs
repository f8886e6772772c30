//! Group-buying slot allocation
//!
//! Every write runs in one transaction and moves `filled_slots` only through a
//! conditional UPDATE, so `0 <= filled_slots <= total_slots` holds under
//! concurrent joins. The CHECK constraints and the unique (group, user) index
//! back this up in the database.

use blunest_db::entities::{
    group_member::{self, MemberStatus},
    prelude::{GroupMember, Property, PropertyGroup, PropertyLead},
    property,
    property_group::{self, GroupStatus},
    property_lead::{self, LeadStatus, LeadType},
};
use blunest_db::is_unique_violation;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Slots given to groups created implicitly
pub const DEFAULT_TOTAL_SLOTS: i32 = 5;

/// Appended to a lead's notes when an admin converts it into a membership
pub const CONVERTED_NOTE: &str = "Added to property group by admin.";

/// Contact details of a user joining a group
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub investment_amount: Option<f64>,
}

/// A member row together with its group as of the same transaction
#[derive(Debug, Clone)]
pub struct Membership {
    pub member: group_member::Model,
    pub group: property_group::Model,
}

#[derive(Debug, Clone, Default)]
pub struct GroupUpdate {
    pub total_slots: Option<i32>,
    pub is_locked: Option<bool>,
    pub status: Option<GroupStatus>,
}

fn property_not_found() -> ApiError {
    ApiError::not_found("Property not found").with_code("PROPERTY_NOT_FOUND")
}

fn group_not_found() -> ApiError {
    ApiError::not_found("Group not found").with_code("GROUP_NOT_FOUND")
}

fn already_joined() -> ApiError {
    ApiError::bad_request("You have already joined this group").with_code("ALREADY_JOINED")
}

/// Resolve a property by UUID or slug
pub async fn find_property<C: ConnectionTrait>(db: &C, id_or_slug: &str) -> ApiResult<property::Model> {
    let found = match Uuid::parse_str(id_or_slug) {
        Ok(id) => Property::find_by_id(id).one(db).await?,
        Err(_) => {
            Property::find()
                .filter(property::Column::Slug.eq(id_or_slug))
                .one(db)
                .await?
        }
    };

    found.ok_or_else(property_not_found)
}

async fn load_group<C: ConnectionTrait>(db: &C, group_id: Uuid) -> ApiResult<property_group::Model> {
    PropertyGroup::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(group_not_found)
}

async fn group_for_property<C: ConnectionTrait>(
    db: &C,
    property_id: Uuid,
) -> Result<Option<property_group::Model>, DbErr> {
    PropertyGroup::find()
        .filter(property_group::Column::PropertyId.eq(property_id))
        .one(db)
        .await
}

async fn insert_group<C: ConnectionTrait>(
    db: &C,
    property_id: Uuid,
    total_slots: i32,
) -> Result<property_group::Model, DbErr> {
    let now = Utc::now();
    property_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(property_id),
        total_slots: Set(total_slots),
        filled_slots: Set(0),
        is_locked: Set(false),
        status: Set(GroupStatus::Open),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

async fn is_member<C: ConnectionTrait>(db: &C, group_id: Uuid, user_id: Uuid) -> Result<bool, DbErr> {
    let count = GroupMember::find()
        .filter(group_member::Column::GroupId.eq(group_id))
        .filter(group_member::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Store the status implied by the slot counts when it differs
async fn sync_status<C: ConnectionTrait>(
    db: &C,
    group: property_group::Model,
) -> Result<property_group::Model, DbErr> {
    let derived = GroupStatus::derive(group.status, group.filled_slots, group.total_slots);
    if derived == group.status {
        return Ok(group);
    }

    let mut active: property_group::ActiveModel = group.into();
    active.status = Set(derived);
    active.update(db).await
}

/// Take one slot if the group is open, unlocked and not full
async fn claim_slot<C: ConnectionTrait>(db: &C, group_id: Uuid) -> ApiResult<property_group::Model> {
    use property_group::Column;

    let result = PropertyGroup::update_many()
        .col_expr(Column::FilledSlots, Expr::col(Column::FilledSlots).add(1))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(group_id))
        .filter(Column::IsLocked.eq(false))
        .filter(Column::Status.ne(GroupStatus::Closed))
        .filter(Expr::col(Column::FilledSlots).lt(Expr::col(Column::TotalSlots)))
        .exec(db)
        .await?;

    let group = load_group(db, group_id).await?;

    if result.rows_affected == 0 {
        return Err(if group.is_locked {
            ApiError::bad_request("This group is locked and not accepting new members")
                .with_code("GROUP_LOCKED")
        } else if group.status == GroupStatus::Closed {
            ApiError::bad_request("This group is closed").with_code("GROUP_CLOSED")
        } else {
            ApiError::bad_request("This group is full").with_code("GROUP_FULL")
        });
    }

    Ok(sync_status(db, group).await?)
}

/// Give one slot back; never drops below zero
async fn release_slot<C: ConnectionTrait>(db: &C, group_id: Uuid) -> ApiResult<property_group::Model> {
    use property_group::Column;

    PropertyGroup::update_many()
        .col_expr(Column::FilledSlots, Expr::col(Column::FilledSlots).sub(1))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(group_id))
        .filter(Column::FilledSlots.gt(0))
        .exec(db)
        .await?;

    let group = load_group(db, group_id).await?;
    Ok(sync_status(db, group).await?)
}

/// Join the group of a property as the given user
///
/// Creates the group on first join. The member is `pending` until an admin
/// reviews it and a `join_group` lead is recorded in the same transaction.
pub async fn join_group(
    db: &DatabaseConnection,
    id_or_slug: &str,
    request: JoinRequest,
) -> ApiResult<Membership> {
    let txn = db.begin().await?;

    let property = find_property(&txn, id_or_slug).await?;

    let group = match group_for_property(&txn, property.id).await? {
        Some(group) => group,
        None => insert_group(&txn, property.id, DEFAULT_TOTAL_SLOTS)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::conflict("The group for this property was just created, please retry")
                        .with_code("GROUP_CONFLICT")
                } else {
                    e.into()
                }
            })?,
    };

    if is_member(&txn, group.id, request.user_id).await? {
        return Err(already_joined());
    }

    claim_slot(&txn, group.id).await?;

    let member = group_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        group_id: Set(group.id),
        user_id: Set(Some(request.user_id)),
        full_name: Set(request.full_name.clone()),
        email: Set(request.email.clone()),
        phone: Set(request.phone.clone()),
        investment_amount: Set(request.investment_amount),
        status: Set(MemberStatus::Pending),
        joined_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            already_joined()
        } else {
            e.into()
        }
    })?;

    let now = Utc::now();
    property_lead::ActiveModel {
        id: Set(Uuid::new_v4()),
        property_id: Set(Some(property.id)),
        user_id: Set(Some(request.user_id)),
        lead_type: Set(LeadType::JoinGroup),
        full_name: Set(request.full_name),
        email: Set(request.email),
        phone: Set(request.phone),
        message: Set(request
            .investment_amount
            .map(|amount| format!("Investment amount: ₹{}", amount))),
        status: Set(LeadStatus::New),
        notes: Set(None),
        assigned_to: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let group = load_group(&txn, group.id).await?;
    txn.commit().await?;

    info!(
        "User {} joined group {} ({}/{})",
        request.user_id, group.id, group.filled_slots, group.total_slots
    );

    Ok(Membership { member, group })
}

/// Group of a property with its approved members; `None` when there is no group
pub async fn group_view<C: ConnectionTrait>(
    db: &C,
    id_or_slug: &str,
) -> ApiResult<Option<(property_group::Model, Vec<group_member::Model>)>> {
    let property = find_property(db, id_or_slug).await?;

    let Some(group) = group_for_property(db, property.id).await? else {
        return Ok(None);
    };

    let members = group
        .find_related(GroupMember)
        .filter(group_member::Column::Status.eq(MemberStatus::Approved))
        .order_by_asc(group_member::Column::JoinedAt)
        .all(db)
        .await?;

    Ok(Some((group, members)))
}

/// Every member of a group regardless of review state
pub async fn list_members<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
) -> ApiResult<Vec<group_member::Model>> {
    let group = load_group(db, group_id).await?;

    Ok(group
        .find_related(GroupMember)
        .order_by_asc(group_member::Column::JoinedAt)
        .all(db)
        .await?)
}

pub async fn create_group(
    db: &DatabaseConnection,
    id_or_slug: &str,
    total_slots: Option<i32>,
) -> ApiResult<property_group::Model> {
    let txn = db.begin().await?;
    let property = find_property(&txn, id_or_slug).await?;

    let exists = || {
        ApiError::conflict("A group already exists for this property").with_code("GROUP_EXISTS")
    };

    if group_for_property(&txn, property.id).await?.is_some() {
        return Err(exists());
    }

    let group = insert_group(&txn, property.id, total_slots.unwrap_or(DEFAULT_TOTAL_SLOTS))
        .await
        .map_err(|e| if is_unique_violation(&e) { exists() } else { e.into() })?;

    txn.commit().await?;
    info!("Group {} created for property {}", group.id, property.id);
    Ok(group)
}

/// Apply admin changes; `total_slots` may not drop below `filled_slots`
pub async fn update_group(
    db: &DatabaseConnection,
    group_id: Uuid,
    update: GroupUpdate,
) -> ApiResult<property_group::Model> {
    use property_group::Column;

    let txn = db.begin().await?;
    let group = load_group(&txn, group_id).await?;

    let total_slots = update.total_slots.unwrap_or(group.total_slots);
    let is_locked = update.is_locked.unwrap_or(group.is_locked);
    // Only `closed` is stored as requested; `open`/`full` reopen and are derived below
    let status = match update.status {
        Some(GroupStatus::Closed) => GroupStatus::Closed,
        Some(_) => GroupStatus::Open,
        None => group.status,
    };

    let result = PropertyGroup::update_many()
        .col_expr(Column::TotalSlots, Expr::value(total_slots))
        .col_expr(Column::IsLocked, Expr::value(is_locked))
        .col_expr(Column::Status, Expr::value(status))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(group_id))
        .filter(Column::FilledSlots.lte(total_slots))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ApiError::bad_request(format!(
            "Total slots cannot be less than the {} filled slots",
            group.filled_slots
        ))
        .with_code("INVALID_SLOTS"));
    }

    let group = sync_status(&txn, load_group(&txn, group_id).await?).await?;
    txn.commit().await?;

    info!(
        "Group {} updated: {}/{} slots, locked={}, status={:?}",
        group.id, group.filled_slots, group.total_slots, group.is_locked, group.status
    );
    Ok(group)
}

/// Convert a lead into an approved membership
pub async fn add_member_from_lead(db: &DatabaseConnection, lead_id: Uuid) -> ApiResult<Membership> {
    let txn = db.begin().await?;

    let lead = PropertyLead::find_by_id(lead_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found").with_code("LEAD_NOT_FOUND"))?;

    let (Some(user_id), Some(property_id)) = (lead.user_id, lead.property_id) else {
        return Err(
            ApiError::bad_request("Lead must be linked to a registered user and a property")
                .with_code("LEAD_INCOMPLETE"),
        );
    };

    let group = match group_for_property(&txn, property_id).await? {
        Some(group) => group,
        None => insert_group(&txn, property_id, DEFAULT_TOTAL_SLOTS).await?,
    };

    if is_member(&txn, group.id, user_id).await? {
        return Err(ApiError::bad_request("User is already a member of this group")
            .with_code("ALREADY_JOINED"));
    }

    claim_slot(&txn, group.id).await?;

    let member = group_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        group_id: Set(group.id),
        user_id: Set(Some(user_id)),
        full_name: Set(lead.full_name.clone()),
        email: Set(lead.email.clone()),
        phone: Set(lead.phone.clone()),
        investment_amount: Set(None),
        status: Set(MemberStatus::Approved),
        joined_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;

    let notes = match lead.notes.as_deref().map(str::trim) {
        Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, CONVERTED_NOTE),
        _ => CONVERTED_NOTE.to_string(),
    };
    let mut lead: property_lead::ActiveModel = lead.into();
    lead.status = Set(LeadStatus::Converted);
    lead.notes = Set(Some(notes));
    lead.updated_at = Set(Utc::now());
    lead.update(&txn).await?;

    let group = load_group(&txn, group.id).await?;
    txn.commit().await?;

    info!("Lead {} converted into member {}", lead_id, member.id);
    Ok(Membership { member, group })
}

/// Approve or reject a member; moving in or out of `rejected` claims or releases a slot
pub async fn set_member_status(
    db: &DatabaseConnection,
    member_id: Uuid,
    status: MemberStatus,
) -> ApiResult<Membership> {
    let txn = db.begin().await?;

    let member = GroupMember::find_by_id(member_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found").with_code("MEMBER_NOT_FOUND"))?;

    let group = match (member.status.holds_slot(), status.holds_slot()) {
        (true, false) => release_slot(&txn, member.group_id).await?,
        (false, true) => claim_slot(&txn, member.group_id).await?,
        _ => load_group(&txn, member.group_id).await?,
    };

    let previous = member.status;
    let mut active: group_member::ActiveModel = member.into();
    active.status = Set(status);
    let member = active.update(&txn).await?;

    txn.commit().await?;
    info!("Member {} moved from {:?} to {:?}", member.id, previous, status);

    Ok(Membership { member, group })
}

/// Delete a member, releasing its slot unless it was rejected
pub async fn remove_member(
    db: &DatabaseConnection,
    member_id: Uuid,
) -> ApiResult<property_group::Model> {
    let txn = db.begin().await?;

    let member = GroupMember::find_by_id(member_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found").with_code("MEMBER_NOT_FOUND"))?;

    let group_id = member.group_id;
    let held_slot = member.status.holds_slot();
    member.delete(&txn).await?;

    let group = if held_slot {
        release_slot(&txn, group_id).await?
    } else {
        load_group(&txn, group_id).await?
    };

    txn.commit().await?;
    info!("Member {} removed from group {}", member_id, group_id);

    Ok(group)
}
