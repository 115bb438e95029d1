use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::entities::{recipe, tag};

// --- Auth ---

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i32,
    pub username: String,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i32,
    pub exp: usize,
}

/// Authenticated caller, inserted into request extensions by the auth
/// middleware and threaded explicitly into every query.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

// --- Tags ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// A tag referenced by name inside a recipe payload. Any `id` the caller
/// supplies is ignored; resolution always goes through (owner, name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInput {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
}

// --- Recipes ---

/// The list-view shape: everything but `description`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<TagResponse>,
}

/// The detail-view shape: the list shape plus `description`. Composed by
/// flattening rather than re-listing the shared fields, so the two views
/// cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: Option<String>,
}

impl From<(recipe::Model, Vec<tag::Model>)> for RecipeSummary {
    fn from((model, tags): (recipe::Model, Vec<tag::Model>)) -> Self {
        Self {
            id: model.id,
            title: model.title,
            time_minutes: model.time_minutes,
            price: model.price,
            link: model.link,
            tags: tags.into_iter().map(TagResponse::from).collect(),
        }
    }
}

impl From<(recipe::Model, Vec<tag::Model>)> for RecipeDetail {
    fn from((model, tags): (recipe::Model, Vec<tag::Model>)) -> Self {
        let description = model.description.clone();
        Self {
            summary: RecipeSummary::from((model, tags)),
            description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagInput>,
}

/// Partial update: absent fields stay untouched. `link`/`description` use a
/// double Option so `"link": null` (clear) is distinguishable from omission.
#[derive(Debug, Default, Deserialize)]
pub struct PatchRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<TagInput>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
