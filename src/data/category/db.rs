use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Category, CategoryWithCourses, MOST_SELLING_LIMIT};
use crate::context::Context;
use crate::data::course::{Course, CourseQuery, CourseStatus, CourseWithReviews};
use crate::data::Id;
use crate::resp::problem::{problems, Problem};
use crate::store::views;

pub mod problem {
    use crate::data::Id;
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn not_found(id: &Id) -> Problem {
        Problem::new_untyped(Status::NotFound, "Category not found")
            .insert_str("categoryId", id)
            .clone()
    }

    #[inline]
    pub fn no_courses(id: &Id) -> Problem {
        Problem::new_untyped(
            Status::NotFound,
            "No courses found for the selected category.",
        )
        .insert_str("categoryId", id)
        .clone()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateCategoryData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.name.trim().is_empty() {
            return Err(problems::missing_fields());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPageData {
    #[schema(value_type = Option<String>)]
    pub category_id: Option<Id>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPage {
    pub selected_category: CategoryWithCourses<CourseWithReviews>,
    pub different_category: Option<CategoryWithCourses<Course>>,
    pub most_selling_courses: Vec<Course>,
}

/// Published courses across the given categories, best sellers first.
pub fn most_selling(mut courses: Vec<Course>, limit: usize) -> Vec<Course> {
    courses.sort_by(|a, b| b.sold.cmp(&a.sold));
    courses.truncate(limit);
    courses
}

pub trait CategoryDbExt {
    async fn create_category(&self, data: CreateCategoryData) -> Result<Category, Problem>;

    async fn list_categories(&self) -> Result<Vec<Category>, Problem>;

    async fn category_page_details(&self, id: &Id) -> Result<CategoryPage, Problem>;
}

impl CategoryDbExt for Context {
    #[tracing::instrument(skip(self))]
    async fn create_category(&self, data: CreateCategoryData) -> Result<Category, Problem> {
        data.validate()?;

        let description = data.description.filter(|d| !d.trim().is_empty());
        let category = Category::new(data.name.trim(), description);
        self.store().insert_category(&category).await?;

        tracing::info!("created category '{}' ({})", category.name, category.id);
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Problem> {
        Ok(self.store().list_categories().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn category_page_details(&self, id: &Id) -> Result<CategoryPage, Problem> {
        let store = self.store();

        let selected = store
            .find_category(id)
            .await?
            .ok_or_else(|| problem::not_found(id))?;

        let courses = views::category_courses(store, &selected, CourseStatus::Published).await?;
        if courses.is_empty() {
            tracing::debug!("no published courses in category {}", id);
            return Err(problem::no_courses(id));
        }
        let courses = views::courses_with_reviews(store, courses).await?;
        let selected_category = CategoryWithCourses::new(selected, courses);

        let all = store.list_categories().await?;
        let other = {
            let others: Vec<&Category> = all.iter().filter(|c| c.id != *id).collect();
            others
                .choose(&mut rand::thread_rng())
                .map(|c| (*c).clone())
        };
        let different_category = match other {
            Some(category) => {
                let courses =
                    views::category_courses(store, &category, CourseStatus::Published).await?;
                Some(CategoryWithCourses::new(category, courses))
            }
            None => None,
        };

        let referenced: Vec<Id> = all.iter().flat_map(|c| c.courses.iter().copied()).collect();
        let published = store
            .find_courses(&CourseQuery::ids(&referenced).with_status(CourseStatus::Published))
            .await?;
        let most_selling_courses = most_selling(published, MOST_SELLING_LIMIT);

        Ok(CategoryPage {
            selected_category,
            different_category,
            most_selling_courses,
        })
    }
}
