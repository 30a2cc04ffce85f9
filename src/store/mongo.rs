use bson::{doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};
use rocket::futures::TryStreamExt;
use serde::de::DeserializeOwned;

use super::{Store, StoreResult};
use crate::data::category::{Category, CATEGORY_COLLECTION_NAME};
use crate::data::course::{Course, CourseQuery, COURSE_COLLECTION_NAME};
use crate::data::filter;
use crate::data::progress::{CourseProgress, PROGRESS_COLLECTION_NAME};
use crate::data::rating::{RatingAndReview, RATING_COLLECTION_NAME};
use crate::data::section::{
    Section, SubSection, SECTION_COLLECTION_NAME, SUB_SECTION_COLLECTION_NAME,
};
use crate::data::user::{
    Profile, ProfilePatch, User, UserPatch, PROFILE_COLLECTION_NAME, USER_COLLECTION_NAME,
};
use crate::data::Id;

/// [`Store`] backed by a MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> MongoStore {
        MongoStore { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USER_COLLECTION_NAME)
    }

    fn profiles(&self) -> Collection<Profile> {
        self.db.collection(PROFILE_COLLECTION_NAME)
    }

    fn categories(&self) -> Collection<Category> {
        self.db.collection(CATEGORY_COLLECTION_NAME)
    }

    fn courses(&self) -> Collection<Course> {
        self.db.collection(COURSE_COLLECTION_NAME)
    }

    fn sections(&self) -> Collection<Section> {
        self.db.collection(SECTION_COLLECTION_NAME)
    }

    fn sub_sections(&self) -> Collection<SubSection> {
        self.db.collection(SUB_SECTION_COLLECTION_NAME)
    }

    fn ratings(&self) -> Collection<RatingAndReview> {
        self.db.collection(RATING_COLLECTION_NAME)
    }

    fn progress(&self) -> Collection<CourseProgress> {
        self.db.collection(PROGRESS_COLLECTION_NAME)
    }
}

async fn find_all<T>(
    collection: Collection<T>,
    filter: Document,
    options: Option<FindOptions>,
) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let cursor = collection.find(filter, options).await?;
    Ok(cursor.try_collect().await?)
}

fn set_present(fields: &[(&str, &Option<String>)]) -> Document {
    let mut set = Document::new();
    for (key, value) in fields {
        if let Some(value) = value {
            set.insert(*key, value.clone());
        }
    }
    set
}

fn course_filter(query: &CourseQuery) -> Document {
    let mut filter = Document::new();
    if let Some(ids) = &query.ids {
        let ids: Vec<Bson> = ids.iter().map(Bson::from).collect();
        filter.insert("_id", doc! { "$in": ids });
    }
    if let Some(status) = query.status {
        filter.insert("status", status.as_str());
    }
    if let Some(instructor) = &query.instructor {
        filter.insert("instructor", instructor);
    }
    if let Some(student) = &query.student {
        filter.insert("studentsEnrolled", student);
    }
    if let Some(section) = &query.section {
        filter.insert("courseContent", section);
    }
    filter
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn find_user(&self, id: &Id) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(filter::by_id(id), None).await?)
    }

    async fn find_users(&self, ids: &[Id]) -> StoreResult<Vec<User>> {
        find_all(self.users(), filter::by_ids(ids), None).await
    }

    async fn update_user(&self, id: &Id, patch: UserPatch) -> StoreResult<Option<User>> {
        let set = set_present(&[
            ("firstName", &patch.first_name),
            ("lastName", &patch.last_name),
            ("image", &patch.image),
        ]);
        if set.is_empty() {
            return self.find_user(id).await;
        }
        Ok(self
            .users()
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, return_updated())
            .await?)
    }

    async fn push_user_course(
        &self,
        user: &Id,
        course: &Id,
        progress: Option<&Id>,
    ) -> StoreResult<bool> {
        let mut push = doc! { "courses": course };
        if let Some(progress) = progress {
            push.insert("courseProgress", progress);
        }
        let result = self
            .users()
            .update_one(filter::by_id(user), doc! { "$addToSet": push }, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_user_course(&self, user: &Id, course: &Id) -> StoreResult<()> {
        self.users()
            .update_one(filter::by_id(user), doc! { "$pull": { "courses": course } }, None)
            .await?;
        Ok(())
    }

    async fn pull_course_from_users(&self, course: &Id) -> StoreResult<u64> {
        let result = self
            .users()
            .update_many(
                doc! { "courses": course },
                doc! { "$pull": { "courses": course } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_user(&self, id: &Id) -> StoreResult<Option<User>> {
        Ok(self.users().find_one_and_delete(filter::by_id(id), None).await?)
    }

    async fn find_profile(&self, id: &Id) -> StoreResult<Option<Profile>> {
        Ok(self.profiles().find_one(filter::by_id(id), None).await?)
    }

    async fn find_profiles(&self, ids: &[Id]) -> StoreResult<Vec<Profile>> {
        find_all(self.profiles(), filter::by_ids(ids), None).await
    }

    async fn update_profile(&self, id: &Id, patch: ProfilePatch) -> StoreResult<Option<Profile>> {
        let set = set_present(&[
            ("gender", &patch.gender),
            ("dateOfBirth", &patch.date_of_birth),
            ("about", &patch.about),
            ("contactNumber", &patch.contact_number),
        ]);
        if set.is_empty() {
            return self.find_profile(id).await;
        }
        Ok(self
            .profiles()
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, return_updated())
            .await?)
    }

    async fn delete_profile(&self, id: &Id) -> StoreResult<bool> {
        let result = self.profiles().delete_one(filter::by_id(id), None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.categories().insert_one(category, None).await?;
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        find_all(self.categories(), Document::new(), None).await
    }

    async fn find_category(&self, id: &Id) -> StoreResult<Option<Category>> {
        Ok(self.categories().find_one(filter::by_id(id), None).await?)
    }

    async fn push_category_course(&self, category: &Id, course: &Id) -> StoreResult<bool> {
        let result = self
            .categories()
            .update_one(
                filter::by_id(category),
                doc! { "$addToSet": { "courses": course } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_category_course(&self, category: &Id, course: &Id) -> StoreResult<()> {
        self.categories()
            .update_one(
                filter::by_id(category),
                doc! { "$pull": { "courses": course } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_course(&self, course: &Course) -> StoreResult<()> {
        self.courses().insert_one(course, None).await?;
        Ok(())
    }

    async fn find_course(&self, id: &Id) -> StoreResult<Option<Course>> {
        Ok(self.courses().find_one(filter::by_id(id), None).await?)
    }

    async fn find_courses(&self, query: &CourseQuery) -> StoreResult<Vec<Course>> {
        find_all(self.courses(), course_filter(query), None).await
    }

    async fn replace_course(&self, course: &Course) -> StoreResult<bool> {
        let result = self
            .courses()
            .replace_one(filter::by_id(&course.id), course, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_course(&self, id: &Id) -> StoreResult<bool> {
        let result = self.courses().delete_one(filter::by_id(id), None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn push_course_section(&self, course: &Id, section: &Id) -> StoreResult<bool> {
        let result = self
            .courses()
            .update_one(
                filter::by_id(course),
                doc! { "$push": { "courseContent": section } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_course_section(&self, course: &Id, section: &Id) -> StoreResult<()> {
        self.courses()
            .update_one(
                filter::by_id(course),
                doc! { "$pull": { "courseContent": section } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn push_course_rating(&self, course: &Id, rating: &Id) -> StoreResult<()> {
        self.courses()
            .update_one(
                filter::by_id(course),
                doc! { "$push": { "ratingAndReviews": rating } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn enroll_student(&self, course: &Id, student: &Id) -> StoreResult<Option<Course>> {
        Ok(self
            .courses()
            .find_one_and_update(
                filter::by_id(course),
                doc! {
                    "$addToSet": { "studentsEnrolled": student },
                    "$inc": { "sold": 1_i64 },
                },
                return_updated(),
            )
            .await?)
    }

    async fn pull_student_from_courses(&self, student: &Id) -> StoreResult<u64> {
        let result = self
            .courses()
            .update_many(
                doc! { "studentsEnrolled": student },
                doc! { "$pull": { "studentsEnrolled": student } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn insert_section(&self, section: &Section) -> StoreResult<()> {
        self.sections().insert_one(section, None).await?;
        Ok(())
    }

    async fn find_section(&self, id: &Id) -> StoreResult<Option<Section>> {
        Ok(self.sections().find_one(filter::by_id(id), None).await?)
    }

    async fn find_sections(&self, ids: &[Id]) -> StoreResult<Vec<Section>> {
        find_all(self.sections(), filter::by_ids(ids), None).await
    }

    async fn rename_section(&self, id: &Id, name: &str) -> StoreResult<bool> {
        let result = self
            .sections()
            .update_one(
                filter::by_id(id),
                doc! { "$set": { "sectionName": name } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_sections(&self, ids: &[Id]) -> StoreResult<u64> {
        let result = self.sections().delete_many(filter::by_ids(ids), None).await?;
        Ok(result.deleted_count)
    }

    async fn push_section_sub_section(&self, section: &Id, sub: &Id) -> StoreResult<bool> {
        let result = self
            .sections()
            .update_one(
                filter::by_id(section),
                doc! { "$push": { "subSection": sub } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_section_sub_section(&self, section: &Id, sub: &Id) -> StoreResult<()> {
        self.sections()
            .update_one(
                filter::by_id(section),
                doc! { "$pull": { "subSection": sub } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_sub_section(&self, sub: &SubSection) -> StoreResult<()> {
        self.sub_sections().insert_one(sub, None).await?;
        Ok(())
    }

    async fn find_sub_section(&self, id: &Id) -> StoreResult<Option<SubSection>> {
        Ok(self.sub_sections().find_one(filter::by_id(id), None).await?)
    }

    async fn find_sub_sections(&self, ids: &[Id]) -> StoreResult<Vec<SubSection>> {
        find_all(self.sub_sections(), filter::by_ids(ids), None).await
    }

    async fn replace_sub_section(&self, sub: &SubSection) -> StoreResult<bool> {
        let result = self
            .sub_sections()
            .replace_one(filter::by_id(&sub.id), sub, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_sub_sections(&self, ids: &[Id]) -> StoreResult<u64> {
        let result = self
            .sub_sections()
            .delete_many(filter::by_ids(ids), None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_rating(&self, rating: &RatingAndReview) -> StoreResult<()> {
        self.ratings().insert_one(rating, None).await?;
        Ok(())
    }

    async fn find_rating(&self, user: &Id, course: &Id) -> StoreResult<Option<RatingAndReview>> {
        Ok(self
            .ratings()
            .find_one(doc! { "user": user, "course": course }, None)
            .await?)
    }

    async fn find_ratings(&self, ids: &[Id]) -> StoreResult<Vec<RatingAndReview>> {
        find_all(self.ratings(), filter::by_ids(ids), None).await
    }

    async fn course_ratings(&self, course: &Id) -> StoreResult<Vec<RatingAndReview>> {
        find_all(self.ratings(), doc! { "course": course }, None).await
    }

    async fn all_ratings(&self) -> StoreResult<Vec<RatingAndReview>> {
        let options = FindOptions::builder().sort(doc! { "rating": -1 }).build();
        find_all(self.ratings(), Document::new(), Some(options)).await
    }

    async fn insert_progress(&self, progress: &CourseProgress) -> StoreResult<()> {
        self.progress().insert_one(progress, None).await?;
        Ok(())
    }

    async fn find_progress(&self, user: &Id, course: &Id) -> StoreResult<Option<CourseProgress>> {
        Ok(self
            .progress()
            .find_one(doc! { "userId": user, "courseId": course }, None)
            .await?)
    }

    async fn push_completed_video(&self, progress: &Id, sub: &Id) -> StoreResult<bool> {
        let result = self
            .progress()
            .update_one(
                filter::by_id(progress),
                doc! { "$addToSet": { "completedVideos": sub } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_user_progress(&self, user: &Id) -> StoreResult<u64> {
        let result = self
            .progress()
            .delete_many(doc! { "userId": user }, None)
            .await?;
        Ok(result.deleted_count)
    }
}
