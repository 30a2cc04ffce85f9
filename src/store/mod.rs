//! Data access.
//!
//! [`Store`] is the only way operations reach the database. Every method is a
//! single-document (or single-collection) operation and is atomic on its own;
//! sequences of calls are not.

use crate::data::category::Category;
use crate::data::course::{Course, CourseQuery};
use crate::data::progress::CourseProgress;
use crate::data::rating::RatingAndReview;
use crate::data::section::{Section, SubSection};
use crate::data::user::{Profile, ProfilePatch, User, UserPatch};
use crate::data::Id;
use crate::error::StoreError;

#[cfg(test)]
pub mod memory;
pub mod mongo;
pub mod views;

pub use mongo::MongoStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[rocket::async_trait]
pub trait Store: Send + Sync {
    // Users & profiles
    async fn find_user(&self, id: &Id) -> StoreResult<Option<User>>;
    async fn find_users(&self, ids: &[Id]) -> StoreResult<Vec<User>>;
    async fn update_user(&self, id: &Id, patch: UserPatch) -> StoreResult<Option<User>>;
    /// Adds the course and optional progress record to the user's lists.
    async fn push_user_course(
        &self,
        user: &Id,
        course: &Id,
        progress: Option<&Id>,
    ) -> StoreResult<bool>;
    async fn pull_user_course(&self, user: &Id, course: &Id) -> StoreResult<()>;
    /// Removes the course from every user that lists it.
    async fn pull_course_from_users(&self, course: &Id) -> StoreResult<u64>;
    async fn delete_user(&self, id: &Id) -> StoreResult<Option<User>>;

    async fn find_profile(&self, id: &Id) -> StoreResult<Option<Profile>>;
    async fn find_profiles(&self, ids: &[Id]) -> StoreResult<Vec<Profile>>;
    async fn update_profile(&self, id: &Id, patch: ProfilePatch) -> StoreResult<Option<Profile>>;
    async fn delete_profile(&self, id: &Id) -> StoreResult<bool>;

    // Categories
    async fn insert_category(&self, category: &Category) -> StoreResult<()>;
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn find_category(&self, id: &Id) -> StoreResult<Option<Category>>;
    async fn push_category_course(&self, category: &Id, course: &Id) -> StoreResult<bool>;
    async fn pull_category_course(&self, category: &Id, course: &Id) -> StoreResult<()>;

    // Courses
    async fn insert_course(&self, course: &Course) -> StoreResult<()>;
    async fn find_course(&self, id: &Id) -> StoreResult<Option<Course>>;
    async fn find_courses(&self, query: &CourseQuery) -> StoreResult<Vec<Course>>;
    async fn replace_course(&self, course: &Course) -> StoreResult<bool>;
    async fn delete_course(&self, id: &Id) -> StoreResult<bool>;
    async fn push_course_section(&self, course: &Id, section: &Id) -> StoreResult<bool>;
    async fn pull_course_section(&self, course: &Id, section: &Id) -> StoreResult<()>;
    async fn push_course_rating(&self, course: &Id, rating: &Id) -> StoreResult<()>;
    /// Adds the student to the enrolled set and bumps the sold counter.
    /// Returns the updated course, `None` if it doesn't exist.
    async fn enroll_student(&self, course: &Id, student: &Id) -> StoreResult<Option<Course>>;
    /// Removes the student from every course's enrolled set.
    async fn pull_student_from_courses(&self, student: &Id) -> StoreResult<u64>;

    // Sections
    async fn insert_section(&self, section: &Section) -> StoreResult<()>;
    async fn find_section(&self, id: &Id) -> StoreResult<Option<Section>>;
    async fn find_sections(&self, ids: &[Id]) -> StoreResult<Vec<Section>>;
    async fn rename_section(&self, id: &Id, name: &str) -> StoreResult<bool>;
    async fn delete_sections(&self, ids: &[Id]) -> StoreResult<u64>;
    async fn push_section_sub_section(&self, section: &Id, sub: &Id) -> StoreResult<bool>;
    async fn pull_section_sub_section(&self, section: &Id, sub: &Id) -> StoreResult<()>;

    async fn insert_sub_section(&self, sub: &SubSection) -> StoreResult<()>;
    async fn find_sub_section(&self, id: &Id) -> StoreResult<Option<SubSection>>;
    async fn find_sub_sections(&self, ids: &[Id]) -> StoreResult<Vec<SubSection>>;
    async fn replace_sub_section(&self, sub: &SubSection) -> StoreResult<bool>;
    async fn delete_sub_sections(&self, ids: &[Id]) -> StoreResult<u64>;

    // Ratings
    async fn insert_rating(&self, rating: &RatingAndReview) -> StoreResult<()>;
    async fn find_rating(&self, user: &Id, course: &Id) -> StoreResult<Option<RatingAndReview>>;
    async fn find_ratings(&self, ids: &[Id]) -> StoreResult<Vec<RatingAndReview>>;
    async fn course_ratings(&self, course: &Id) -> StoreResult<Vec<RatingAndReview>>;
    async fn all_ratings(&self) -> StoreResult<Vec<RatingAndReview>>;

    // Course progress
    async fn insert_progress(&self, progress: &CourseProgress) -> StoreResult<()>;
    async fn find_progress(&self, user: &Id, course: &Id) -> StoreResult<Option<CourseProgress>>;
    async fn push_completed_video(&self, progress: &Id, sub: &Id) -> StoreResult<bool>;
    async fn delete_user_progress(&self, user: &Id) -> StoreResult<u64>;
}
