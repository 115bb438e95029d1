use axum::{
    Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;

use crate::db::services::{self, NewRecipe, RecipeChanges};
use crate::web::extract::Json;
use crate::web::models::{
    CreateRecipeRequest, CurrentUser, PatchRecipeRequest, RecipeDetail, RecipeSummary, TagInput,
};
use crate::web::{AppError, AppState};

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Title must not be empty.".to_string(),
        ));
    }
    Ok(())
}

fn validate_time_minutes(time_minutes: i32) -> Result<(), AppError> {
    if time_minutes < 0 {
        return Err(AppError::InvalidInput(
            "time_minutes must not be negative.".to_string(),
        ));
    }
    Ok(())
}

fn tag_names(tags: Vec<TagInput>) -> Result<Vec<String>, AppError> {
    tags.into_iter()
        .map(|t| {
            if t.name.trim().is_empty() {
                Err(AppError::InvalidInput(
                    "Tag name must not be empty.".to_string(),
                ))
            } else {
                Ok(t.name)
            }
        })
        .collect()
}

// --- Route Handlers ---

async fn list_recipes_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecipeSummary>>, AppError> {
    let recipes = services::list_recipes(&app_state.db, current_user.id).await?;
    Ok(Json(recipes.into_iter().map(RecipeSummary::from).collect()))
}

async fn get_recipe_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeDetail>, AppError> {
    let found = services::get_recipe(&app_state.db, recipe_id, current_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    Ok(Json(RecipeDetail::from(found)))
}

async fn create_recipe_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetail>), AppError> {
    validate_title(&payload.title)?;
    validate_time_minutes(payload.time_minutes)?;

    let created = services::create_recipe(
        &app_state.db,
        current_user.id,
        NewRecipe {
            title: payload.title,
            time_minutes: payload.time_minutes,
            price: payload.price,
            link: payload.link,
            description: payload.description,
            tag_names: tag_names(payload.tags)?,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(RecipeDetail::from(created))))
}

/// PUT is a full replace: omitted optional fields reset to null and an
/// omitted tag list clears the associations.
async fn replace_recipe_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    validate_title(&payload.title)?;
    validate_time_minutes(payload.time_minutes)?;

    let changes = RecipeChanges {
        title: Some(payload.title),
        time_minutes: Some(payload.time_minutes),
        price: Some(payload.price),
        link: Some(payload.link),
        description: Some(payload.description),
        tag_names: Some(tag_names(payload.tags)?),
    };

    let updated = services::update_recipe(&app_state.db, recipe_id, current_user.id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    Ok(Json(RecipeDetail::from(updated)))
}

/// PATCH touches only the supplied fields; a supplied `tags` list replaces
/// the association set through the same get-or-create resolution as create.
async fn patch_recipe_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<PatchRecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    if let Some(title) = &payload.title {
        validate_title(title)?;
    }
    if let Some(time_minutes) = payload.time_minutes {
        validate_time_minutes(time_minutes)?;
    }

    let changes = RecipeChanges {
        title: payload.title,
        time_minutes: payload.time_minutes,
        price: payload.price,
        link: payload.link,
        description: payload.description,
        tag_names: payload.tags.map(tag_names).transpose()?,
    };

    let updated = services::update_recipe(&app_state.db, recipe_id, current_user.id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    Ok(Json(RecipeDetail::from(updated)))
}

async fn delete_recipe_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows_affected =
        services::delete_recipe(&app_state.db, recipe_id, current_user.id).await?;

    if rows_affected > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Recipe not found".to_string()))
    }
}

// --- Router ---

pub fn create_recipes_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_recipes_handler).post(create_recipe_handler))
        .route(
            "/{recipe_id}",
            get(get_recipe_handler)
                .put(replace_recipe_handler)
                .patch(patch_recipe_handler)
                .delete(delete_recipe_handler),
        )
}
