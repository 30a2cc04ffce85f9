use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Id;

pub mod db;

pub static CATEGORY_COLLECTION_NAME: &str = "categories";

/// How many best sellers the category page lists.
pub const MOST_SELLING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub courses: Vec<Id>,
}

impl Category {
    pub fn new(name: impl ToString, description: Option<String>) -> Category {
        Category {
            id: Id::new(),
            name: name.to_string(),
            description,
            courses: vec![],
        }
    }
}

/// A category with its course references populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCourses<C> {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub courses: Vec<C>,
}

impl<C> CategoryWithCourses<C> {
    pub fn new(category: Category, courses: Vec<C>) -> Self {
        CategoryWithCourses {
            id: category.id,
            name: category.name,
            description: category.description,
            courses,
        }
    }
}
