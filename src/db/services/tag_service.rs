use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::db::entities::tag;

// --- Tag Service Functions ---

/// Retrieves all tags owned by a user, ordered by name descending.
pub async fn list_tags(db: &DatabaseConnection, user_id: i32) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .order_by_desc(tag::Column::Name)
        .all(db)
        .await
}

/// Updates a tag's name. Returns `Ok(None)` when the tag does not exist or is
/// not owned by `user_id`, so the handler can answer 404 without leaking
/// whether the row exists for someone else.
pub async fn update_tag(
    db: &DatabaseConnection,
    tag_id: i32,
    user_id: i32,
    name: Option<String>,
) -> Result<Option<tag::Model>, DbErr> {
    let existing = tag::Entity::find_by_id(tag_id)
        .filter(tag::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    let Some(existing) = existing else {
        return Ok(None);
    };

    let Some(name) = name else {
        // Nothing to change; echo the current row.
        return Ok(Some(existing));
    };

    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(name);
    let updated = active.update(db).await?;
    Ok(Some(updated))
}

/// Deletes a tag owned by `user_id`. Join rows in `recipe_tags` are removed by
/// the FK cascade; recipes themselves are untouched. Returns the number of
/// rows deleted (0 means not found / not owned).
pub async fn delete_tag(db: &DatabaseConnection, tag_id: i32, user_id: i32) -> Result<u64, DbErr> {
    let result = tag::Entity::delete_many()
        .filter(tag::Column::Id.eq(tag_id))
        .filter(tag::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Looks up a tag by (owner, name), inserting it when absent.
///
/// Generic over the connection so recipe writes can run it inside their own
/// transaction; the lookup-else-insert pair must not straddle a transaction
/// boundary or concurrent requests could insert duplicates.
pub async fn get_or_create_tag<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    name: &str,
) -> Result<tag::Model, DbErr> {
    let existing = tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Name.eq(name))
        .one(conn)
        .await?;

    if let Some(tag) = existing {
        return Ok(tag);
    }

    tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn tag_row(id: i32, user_id: i32, name: &str) -> tag::Model {
        tag::Model {
            id,
            user_id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn get_or_create_reuses_existing_tag() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![tag_row(7, 1, "Quick")]])
            .into_connection();

        let tag = get_or_create_tag(&db, 1, "Quick").await.unwrap();
        assert_eq!(tag.id, 7);
        assert_eq!(tag.name, "Quick");

        // Only the lookup ran; no INSERT was issued.
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn get_or_create_inserts_when_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<tag::Model>::new()])
            .append_query_results([vec![tag_row(8, 1, "Vegan")]])
            .into_connection();

        let tag = get_or_create_tag(&db, 1, "Vegan").await.unwrap();
        assert_eq!(tag.id, 8);

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn update_tag_missing_row_yields_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<tag::Model>::new()])
            .into_connection();

        let updated = update_tag(&db, 42, 1, Some("Dessert".to_string()))
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn update_tag_changes_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![tag_row(3, 1, "Brunch")]])
            .append_query_results([vec![tag_row(3, 1, "Dessert")]])
            .into_connection();

        let updated = update_tag(&db, 3, 1, Some("Dessert".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, 3);
        assert_eq!(updated.name, "Dessert");
    }

    #[tokio::test]
    async fn delete_tag_reports_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert_eq!(delete_tag(&db, 3, 1).await.unwrap(), 1);
        assert_eq!(delete_tag(&db, 3, 1).await.unwrap(), 0);
    }
}
