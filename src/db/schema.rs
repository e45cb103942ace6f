//! Creates the marketplace tables from the entity definitions and seeds the
//! reference data every deployment needs.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Schema, Set,
};
use tracing::info;

use crate::db::entities::{
    accumulative_discount, one_time_discount, order, product, role, user, user_role,
};
use crate::security::Role;

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

/// Creates every table that does not exist yet, referenced tables first.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, product::Entity).await?;
    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, role::Entity).await?;
    create_table(db, &schema, user_role::Entity).await?;
    create_table(db, &schema, order::Entity).await?;
    create_table(db, &schema, one_time_discount::Entity).await?;
    create_table(db, &schema, accumulative_discount::Entity).await?;

    Ok(())
}

/// Inserts the known roles that are missing.
pub async fn seed_roles(db: &DatabaseConnection) -> Result<(), DbErr> {
    for known in Role::ALL {
        let existing = role::Entity::find()
            .filter(role::Column::Name.eq(known.as_str()))
            .one(db)
            .await?;
        if existing.is_none() {
            role::ActiveModel {
                name: Set(known.as_str().to_owned()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!(role = known.as_str(), "Seeded role.");
        }
    }
    Ok(())
}

/// Schema creation followed by role seeding.
pub async fn bootstrap(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_tables(db).await?;
    seed_roles(db).await
}
