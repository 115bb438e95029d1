use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    LoaderTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::entities::{recipe, recipe_tag, tag};
use crate::db::services::tag_service;

/// Fields for a new recipe. Tag names are resolved against the owner's tags
/// via get-or-create when the recipe is inserted.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tag_names: Vec<String>,
}

/// Field-level changes for an update. `None` leaves a field untouched;
/// `Some(None)` on an optional field clears it. `tag_names: Some(..)`
/// replaces the whole association set.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub tag_names: Option<Vec<String>>,
}

// --- Recipe Service Functions ---

/// Retrieves all recipes owned by a user, newest first, with their tags.
pub async fn list_recipes(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<(recipe::Model, Vec<tag::Model>)>, DbErr> {
    let recipes = recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(user_id))
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await?;

    let tags = recipes
        .load_many_to_many(tag::Entity, recipe_tag::Entity, db)
        .await?;

    Ok(recipes
        .into_iter()
        .zip(tags)
        .map(|(r, mut t)| {
            t.sort_by(|a, b| a.name.cmp(&b.name));
            (r, t)
        })
        .collect())
}

/// Retrieves a single recipe with its tags. `Ok(None)` when absent or owned
/// by someone else.
pub async fn get_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<Option<(recipe::Model, Vec<tag::Model>)>, DbErr> {
    let Some(found) = recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let tags = found
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?;

    Ok(Some((found, tags)))
}

/// Creates a recipe together with its tag associations in one transaction:
/// either the row and every link commit, or nothing does.
pub async fn create_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    input: NewRecipe,
) -> Result<(recipe::Model, Vec<tag::Model>), DbErr> {
    let txn = db.begin().await?;

    let now = Utc::now();
    let created = recipe::ActiveModel {
        user_id: Set(user_id),
        title: Set(input.title),
        time_minutes: Set(input.time_minutes),
        price: Set(input.price),
        link: Set(input.link),
        description: Set(input.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let tags = attach_tags(&txn, user_id, created.id, &input.tag_names).await?;

    txn.commit().await?;
    Ok((created, tags))
}

/// Applies `changes` to a recipe owned by `user_id`. When `tag_names` is
/// present the existing associations are dropped and re-resolved through
/// get-or-create, all inside the same transaction.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
    changes: RecipeChanges,
) -> Result<Option<(recipe::Model, Vec<tag::Model>)>, DbErr> {
    let txn = db.begin().await?;

    let Some(existing) = recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
    else {
        txn.rollback().await?;
        return Ok(None);
    };

    let mut active: recipe::ActiveModel = existing.into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(time_minutes) = changes.time_minutes {
        active.time_minutes = Set(time_minutes);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(link) = changes.link {
        active.link = Set(link);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    let tags = match changes.tag_names {
        Some(names) => {
            recipe_tag::Entity::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
                .exec(&txn)
                .await?;
            attach_tags(&txn, user_id, recipe_id, &names).await?
        }
        None => {
            updated
                .find_related(tag::Entity)
                .order_by_asc(tag::Column::Name)
                .all(&txn)
                .await?
        }
    };

    txn.commit().await?;
    Ok(Some((updated, tags)))
}

/// Deletes a recipe owned by `user_id`. Join rows cascade; tag rows are never
/// deleted by a recipe delete. Returns rows deleted (0 means not found).
pub async fn delete_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<u64, DbErr> {
    let result = recipe::Entity::delete_many()
        .filter(recipe::Column::Id.eq(recipe_id))
        .filter(recipe::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Resolves each name through get-or-create and links it to the recipe.
/// Duplicate names in the payload collapse to a single association.
async fn attach_tags<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    recipe_id: i32,
    names: &[String],
) -> Result<Vec<tag::Model>, DbErr> {
    let mut tags: Vec<tag::Model> = Vec::with_capacity(names.len());
    for name in names {
        let tag = tag_service::get_or_create_tag(conn, user_id, name).await?;
        if tags.iter().any(|t| t.id == tag.id) {
            continue;
        }
        recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag.id),
        }
        .insert(conn)
        .await?;
        tags.push(tag);
    }
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}
