use std::sync::{Mutex, MutexGuard};

use super::{Store, StoreResult};
use crate::data::category::Category;
use crate::data::course::{Course, CourseQuery};
use crate::data::progress::CourseProgress;
use crate::data::rating::RatingAndReview;
use crate::data::section::{Section, SubSection};
use crate::data::user::{Profile, ProfilePatch, User, UserPatch};
use crate::data::Id;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    profiles: Vec<Profile>,
    categories: Vec<Category>,
    courses: Vec<Course>,
    sections: Vec<Section>,
    sub_sections: Vec<SubSection>,
    ratings: Vec<RatingAndReview>,
    progress: Vec<CourseProgress>,
}

/// In-process [`Store`] for tests. Collections keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_on: Mutex<Option<&'static str>>,
}

fn push_unique(list: &mut Vec<Id>, id: &Id) {
    if !list.contains(id) {
        list.push(*id);
    }
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    /// Makes the named store method fail from now on.
    pub fn fail_on(&self, method: &'static str) {
        *self.fail_on.lock().expect("memory store poisoned") = Some(method);
    }

    fn check(&self, method: &'static str) -> StoreResult<()> {
        match *self.fail_on.lock().expect("memory store poisoned") {
            Some(failing) if failing == method => {
                Err(StoreError::Backend(format!("{} failed", method)))
            }
            _ => Ok(()),
        }
    }

    pub fn insert_user(&self, user: User) {
        self.tables().users.push(user);
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.tables().profiles.push(profile);
    }

    pub fn courses(&self) -> Vec<Course> {
        self.tables().courses.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.tables().users.clone()
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.tables().profiles.clone()
    }

    pub fn ratings(&self) -> Vec<RatingAndReview> {
        self.tables().ratings.clone()
    }

    pub fn progress(&self) -> Vec<CourseProgress> {
        self.tables().progress.clone()
    }

    pub fn sections(&self) -> Vec<Section> {
        self.tables().sections.clone()
    }

    pub fn sub_sections(&self) -> Vec<SubSection> {
        self.tables().sub_sections.clone()
    }
}

macro_rules! find_by_id {
    ($list:expr, $id:expr) => {
        $list.iter().find(|it| it.id == *$id).cloned()
    };
}

macro_rules! find_by_ids {
    ($list:expr, $ids:expr) => {
        $list
            .iter()
            .filter(|it| $ids.contains(&it.id))
            .cloned()
            .collect()
    };
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: &Id) -> StoreResult<Option<User>> {
        self.check("find_user")?;
        Ok(find_by_id!(self.tables().users, id))
    }

    async fn find_users(&self, ids: &[Id]) -> StoreResult<Vec<User>> {
        self.check("find_users")?;
        Ok(find_by_ids!(self.tables().users, ids))
    }

    async fn update_user(&self, id: &Id, patch: UserPatch) -> StoreResult<Option<User>> {
        self.check("update_user")?;
        let mut tables = self.tables();
        Ok(tables.users.iter_mut().find(|u| u.id == *id).map(|user| {
            patch.apply(user);
            user.clone()
        }))
    }

    async fn push_user_course(
        &self,
        user: &Id,
        course: &Id,
        progress: Option<&Id>,
    ) -> StoreResult<bool> {
        self.check("push_user_course")?;
        let mut tables = self.tables();
        match tables.users.iter_mut().find(|u| u.id == *user) {
            Some(user) => {
                push_unique(&mut user.courses, course);
                if let Some(progress) = progress {
                    push_unique(&mut user.course_progress, progress);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_user_course(&self, user: &Id, course: &Id) -> StoreResult<()> {
        self.check("pull_user_course")?;
        let mut tables = self.tables();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == *user) {
            user.courses.retain(|c| c != course);
        }
        Ok(())
    }

    async fn pull_course_from_users(&self, course: &Id) -> StoreResult<u64> {
        self.check("pull_course_from_users")?;
        let mut modified = 0;
        for user in self.tables().users.iter_mut() {
            if user.courses.contains(course) {
                user.courses.retain(|c| c != course);
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn delete_user(&self, id: &Id) -> StoreResult<Option<User>> {
        self.check("delete_user")?;
        let mut tables = self.tables();
        let pos = tables.users.iter().position(|u| u.id == *id);
        Ok(pos.map(|pos| tables.users.remove(pos)))
    }

    async fn find_profile(&self, id: &Id) -> StoreResult<Option<Profile>> {
        self.check("find_profile")?;
        Ok(find_by_id!(self.tables().profiles, id))
    }

    async fn find_profiles(&self, ids: &[Id]) -> StoreResult<Vec<Profile>> {
        self.check("find_profiles")?;
        Ok(find_by_ids!(self.tables().profiles, ids))
    }

    async fn update_profile(&self, id: &Id, patch: ProfilePatch) -> StoreResult<Option<Profile>> {
        self.check("update_profile")?;
        let mut tables = self.tables();
        Ok(tables.profiles.iter_mut().find(|p| p.id == *id).map(|profile| {
            patch.apply(profile);
            profile.clone()
        }))
    }

    async fn delete_profile(&self, id: &Id) -> StoreResult<bool> {
        self.check("delete_profile")?;
        let mut tables = self.tables();
        let before = tables.profiles.len();
        tables.profiles.retain(|p| p.id != *id);
        Ok(tables.profiles.len() < before)
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        self.check("insert_category")?;
        self.tables().categories.push(category.clone());
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.check("list_categories")?;
        Ok(self.tables().categories.clone())
    }

    async fn find_category(&self, id: &Id) -> StoreResult<Option<Category>> {
        self.check("find_category")?;
        Ok(find_by_id!(self.tables().categories, id))
    }

    async fn push_category_course(&self, category: &Id, course: &Id) -> StoreResult<bool> {
        self.check("push_category_course")?;
        let mut tables = self.tables();
        match tables.categories.iter_mut().find(|c| c.id == *category) {
            Some(category) => {
                push_unique(&mut category.courses, course);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_category_course(&self, category: &Id, course: &Id) -> StoreResult<()> {
        self.check("pull_category_course")?;
        let mut tables = self.tables();
        if let Some(category) = tables.categories.iter_mut().find(|c| c.id == *category) {
            category.courses.retain(|c| c != course);
        }
        Ok(())
    }

    async fn insert_course(&self, course: &Course) -> StoreResult<()> {
        self.check("insert_course")?;
        self.tables().courses.push(course.clone());
        Ok(())
    }

    async fn find_course(&self, id: &Id) -> StoreResult<Option<Course>> {
        self.check("find_course")?;
        Ok(find_by_id!(self.tables().courses, id))
    }

    async fn find_courses(&self, query: &CourseQuery) -> StoreResult<Vec<Course>> {
        self.check("find_courses")?;
        Ok(self
            .tables()
            .courses
            .iter()
            .filter(|c| query.matches(c))
            .cloned()
            .collect())
    }

    async fn replace_course(&self, course: &Course) -> StoreResult<bool> {
        self.check("replace_course")?;
        let mut tables = self.tables();
        match tables.courses.iter_mut().find(|c| c.id == course.id) {
            Some(existing) => {
                *existing = course.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_course(&self, id: &Id) -> StoreResult<bool> {
        self.check("delete_course")?;
        let mut tables = self.tables();
        let before = tables.courses.len();
        tables.courses.retain(|c| c.id != *id);
        Ok(tables.courses.len() < before)
    }

    async fn push_course_section(&self, course: &Id, section: &Id) -> StoreResult<bool> {
        self.check("push_course_section")?;
        let mut tables = self.tables();
        match tables.courses.iter_mut().find(|c| c.id == *course) {
            Some(course) => {
                course.course_content.push(*section);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_course_section(&self, course: &Id, section: &Id) -> StoreResult<()> {
        self.check("pull_course_section")?;
        let mut tables = self.tables();
        if let Some(course) = tables.courses.iter_mut().find(|c| c.id == *course) {
            course.course_content.retain(|s| s != section);
        }
        Ok(())
    }

    async fn push_course_rating(&self, course: &Id, rating: &Id) -> StoreResult<()> {
        self.check("push_course_rating")?;
        let mut tables = self.tables();
        if let Some(course) = tables.courses.iter_mut().find(|c| c.id == *course) {
            course.rating_and_reviews.push(*rating);
        }
        Ok(())
    }

    async fn enroll_student(&self, course: &Id, student: &Id) -> StoreResult<Option<Course>> {
        self.check("enroll_student")?;
        let mut tables = self.tables();
        Ok(tables.courses.iter_mut().find(|c| c.id == *course).map(|course| {
            push_unique(&mut course.students_enrolled, student);
            course.sold += 1;
            course.clone()
        }))
    }

    async fn pull_student_from_courses(&self, student: &Id) -> StoreResult<u64> {
        self.check("pull_student_from_courses")?;
        let mut modified = 0;
        for course in self.tables().courses.iter_mut() {
            if course.is_enrolled(student) {
                course.students_enrolled.retain(|s| s != student);
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn insert_section(&self, section: &Section) -> StoreResult<()> {
        self.check("insert_section")?;
        self.tables().sections.push(section.clone());
        Ok(())
    }

    async fn find_section(&self, id: &Id) -> StoreResult<Option<Section>> {
        self.check("find_section")?;
        Ok(find_by_id!(self.tables().sections, id))
    }

    async fn find_sections(&self, ids: &[Id]) -> StoreResult<Vec<Section>> {
        self.check("find_sections")?;
        Ok(find_by_ids!(self.tables().sections, ids))
    }

    async fn rename_section(&self, id: &Id, name: &str) -> StoreResult<bool> {
        self.check("rename_section")?;
        let mut tables = self.tables();
        match tables.sections.iter_mut().find(|s| s.id == *id) {
            Some(section) => {
                section.section_name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_sections(&self, ids: &[Id]) -> StoreResult<u64> {
        self.check("delete_sections")?;
        let mut tables = self.tables();
        let before = tables.sections.len();
        tables.sections.retain(|s| !ids.contains(&s.id));
        Ok((before - tables.sections.len()) as u64)
    }

    async fn push_section_sub_section(&self, section: &Id, sub: &Id) -> StoreResult<bool> {
        self.check("push_section_sub_section")?;
        let mut tables = self.tables();
        match tables.sections.iter_mut().find(|s| s.id == *section) {
            Some(section) => {
                section.sub_section.push(*sub);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_section_sub_section(&self, section: &Id, sub: &Id) -> StoreResult<()> {
        self.check("pull_section_sub_section")?;
        let mut tables = self.tables();
        if let Some(section) = tables.sections.iter_mut().find(|s| s.id == *section) {
            section.sub_section.retain(|s| s != sub);
        }
        Ok(())
    }

    async fn insert_sub_section(&self, sub: &SubSection) -> StoreResult<()> {
        self.check("insert_sub_section")?;
        self.tables().sub_sections.push(sub.clone());
        Ok(())
    }

    async fn find_sub_section(&self, id: &Id) -> StoreResult<Option<SubSection>> {
        self.check("find_sub_section")?;
        Ok(find_by_id!(self.tables().sub_sections, id))
    }

    async fn find_sub_sections(&self, ids: &[Id]) -> StoreResult<Vec<SubSection>> {
        self.check("find_sub_sections")?;
        Ok(find_by_ids!(self.tables().sub_sections, ids))
    }

    async fn replace_sub_section(&self, sub: &SubSection) -> StoreResult<bool> {
        self.check("replace_sub_section")?;
        let mut tables = self.tables();
        match tables.sub_sections.iter_mut().find(|s| s.id == sub.id) {
            Some(existing) => {
                *existing = sub.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_sub_sections(&self, ids: &[Id]) -> StoreResult<u64> {
        self.check("delete_sub_sections")?;
        let mut tables = self.tables();
        let before = tables.sub_sections.len();
        tables.sub_sections.retain(|s| !ids.contains(&s.id));
        Ok((before - tables.sub_sections.len()) as u64)
    }

    async fn insert_rating(&self, rating: &RatingAndReview) -> StoreResult<()> {
        self.check("insert_rating")?;
        self.tables().ratings.push(rating.clone());
        Ok(())
    }

    async fn find_rating(&self, user: &Id, course: &Id) -> StoreResult<Option<RatingAndReview>> {
        self.check("find_rating")?;
        Ok(self
            .tables()
            .ratings
            .iter()
            .find(|r| r.user == *user && r.course == *course)
            .cloned())
    }

    async fn find_ratings(&self, ids: &[Id]) -> StoreResult<Vec<RatingAndReview>> {
        self.check("find_ratings")?;
        Ok(find_by_ids!(self.tables().ratings, ids))
    }

    async fn course_ratings(&self, course: &Id) -> StoreResult<Vec<RatingAndReview>> {
        self.check("course_ratings")?;
        Ok(self
            .tables()
            .ratings
            .iter()
            .filter(|r| r.course == *course)
            .cloned()
            .collect())
    }

    async fn all_ratings(&self) -> StoreResult<Vec<RatingAndReview>> {
        self.check("all_ratings")?;
        let mut ratings = self.tables().ratings.clone();
        ratings.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(ratings)
    }

    async fn insert_progress(&self, progress: &CourseProgress) -> StoreResult<()> {
        self.check("insert_progress")?;
        self.tables().progress.push(progress.clone());
        Ok(())
    }

    async fn find_progress(&self, user: &Id, course: &Id) -> StoreResult<Option<CourseProgress>> {
        self.check("find_progress")?;
        Ok(self
            .tables()
            .progress
            .iter()
            .find(|p| p.user_id == *user && p.course_id == *course)
            .cloned())
    }

    async fn push_completed_video(&self, progress: &Id, sub: &Id) -> StoreResult<bool> {
        self.check("push_completed_video")?;
        let mut tables = self.tables();
        match tables.progress.iter_mut().find(|p| p.id == *progress) {
            Some(progress) => {
                push_unique(&mut progress.completed_videos, sub);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user_progress(&self, user: &Id) -> StoreResult<u64> {
        self.check("delete_user_progress")?;
        let mut tables = self.tables();
        let before = tables.progress.len();
        tables.progress.retain(|p| p.user_id != *user);
        Ok((before - tables.progress.len()) as u64)
    }
}
