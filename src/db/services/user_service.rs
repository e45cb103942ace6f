use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::entities::{order, role, user, user_role};
use crate::db::services::page_bounds;
use crate::security::Role;

// --- User Service Functions ---

/// Profile data for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub surname: String,
    pub address: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile changes. `password_hash` and `profile_picture_filename` are only
/// applied when present.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: String,
    pub surname: String,
    pub address: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub profile_picture_filename: Option<String>,
}

/// Creates an enabled user holding `roles`, in one transaction.
pub async fn create_user(
    db: &DatabaseConnection,
    new_user: NewUser,
    roles: &[Role],
) -> Result<user::Model, DbErr> {
    let now = Utc::now();
    let txn = db.begin().await?;

    let user_model = user::ActiveModel {
        first_name: Set(new_user.first_name),
        surname: Set(new_user.surname),
        address: Set(new_user.address),
        email: Set(new_user.email),
        password_hash: Set(new_user.password_hash),
        enabled: Set(true),
        profile_picture_filename: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for wanted in roles {
        let role_model = role::Entity::find()
            .filter(role::Column::Name.eq(wanted.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("role {wanted} is not seeded")))?;

        user_role::ActiveModel {
            user_id: Set(user_model.id),
            role_id: Set(role_model.id),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(user_model)
}

/// Retrieves a user by their ID.
pub async fn find_user_by_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(user_id).one(db).await
}

/// Retrieves a user by their email.
pub async fn find_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

/// Resolves the roles held by a user. Unknown role names are ignored.
pub async fn find_user_roles(
    db: &DatabaseConnection,
    user_model: &user::Model,
) -> Result<Vec<Role>, DbErr> {
    let roles = user_model.find_related(role::Entity).all(db).await?;
    Ok(roles
        .iter()
        .filter_map(|r| Role::from_name(&r.name))
        .collect())
}

/// Page `page` (0-based) of users ordered by id.
pub async fn find_users_page(
    db: &DatabaseConnection,
    page: u64,
    page_size: u64,
) -> Result<Vec<user::Model>, DbErr> {
    let Some(page_size) = page_bounds(page, page_size) else {
        return Ok(Vec::new());
    };
    user::Entity::find()
        .order_by_asc(user::Column::Id)
        .paginate(db, page_size)
        .fetch_page(page)
        .await
}

pub async fn update_user(
    db: &DatabaseConnection,
    user_id: i32,
    update: UserUpdate,
) -> Result<Option<user::Model>, DbErr> {
    let Some(existing) = user::Entity::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };

    let mut active_user = existing.into_active_model();
    active_user.first_name = Set(update.first_name);
    active_user.surname = Set(update.surname);
    active_user.address = Set(update.address);
    active_user.email = Set(update.email);
    if let Some(password_hash) = update.password_hash {
        active_user.password_hash = Set(password_hash);
    }
    if let Some(filename) = update.profile_picture_filename {
        active_user.profile_picture_filename = Set(Some(filename));
    }
    active_user.updated_at = Set(Utc::now());
    active_user.update(db).await.map(Some)
}

/// Enables or disables login for a user.
pub async fn set_user_enabled(
    db: &DatabaseConnection,
    user_id: i32,
    enabled: bool,
) -> Result<Option<user::Model>, DbErr> {
    let Some(existing) = user::Entity::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };

    let mut active_user = existing.into_active_model();
    active_user.enabled = Set(enabled);
    active_user.updated_at = Set(Utc::now());
    active_user.update(db).await.map(Some)
}

/// Outcome of an account deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserDeletion {
    Deleted(user::Model),
    /// The user still owns orders. Orders are purchase history, so the
    /// account has to be disabled instead.
    HasOrders(u64),
    NotFound,
}

/// Deletes a user without orders, together with their role links.
pub async fn delete_user(db: &DatabaseConnection, user_id: i32) -> Result<UserDeletion, DbErr> {
    let txn = db.begin().await?;

    let Some(existing) = user::Entity::find_by_id(user_id).one(&txn).await? else {
        txn.rollback().await?;
        return Ok(UserDeletion::NotFound);
    };

    let orders = order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .count(&txn)
        .await?;
    if orders > 0 {
        txn.rollback().await?;
        return Ok(UserDeletion::HasOrders(orders));
    }

    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    existing.clone().delete(&txn).await?;
    txn.commit().await?;

    Ok(UserDeletion::Deleted(existing))
}
