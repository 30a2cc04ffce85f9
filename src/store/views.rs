//! Populated read models.
//!
//! Each function resolves a fixed set of references and returns a typed view,
//! so the join shape of every response is visible in its type.

use std::collections::HashMap;

use super::{Store, StoreResult};
use crate::data::category::Category;
use crate::data::course::{
    Course, CourseDetails, CourseFields, CourseQuery, CourseStatus, CourseSummary,
    CourseWithReviews,
};
use crate::data::rating::{RatingAndReview, ReviewDetails, ReviewedCourse, Reviewer};
use crate::data::section::SectionContent;
use crate::data::user::UserDetails;
use crate::data::Id;
use crate::util::order_by_ids;

pub async fn user_details(store: &dyn Store, id: &Id) -> StoreResult<Option<UserDetails>> {
    let user = match store.find_user(id).await? {
        Some(it) => it,
        None => return Ok(None),
    };
    let profile = store.find_profile(&user.additional_details).await?;
    Ok(Some(UserDetails::new(user, profile)))
}

pub async fn users_details(store: &dyn Store, ids: &[Id]) -> StoreResult<Vec<UserDetails>> {
    let users = store.find_users(ids).await?;
    let profile_ids: Vec<Id> = users.iter().map(|u| u.additional_details).collect();
    let mut profiles: HashMap<Id, _> = store
        .find_profiles(&profile_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(users
        .into_iter()
        .map(|user| {
            let profile = profiles.remove(&user.additional_details);
            UserDetails::new(user, profile)
        })
        .collect())
}

/// Sections of a course with their sub-sections, both in stored order.
pub async fn course_content(
    store: &dyn Store,
    section_ids: &[Id],
) -> StoreResult<Vec<SectionContent>> {
    let sections = order_by_ids(section_ids, store.find_sections(section_ids).await?, |s| s.id);

    let mut content = Vec::with_capacity(sections.len());
    for section in sections {
        let subs = store.find_sub_sections(&section.sub_section).await?;
        let subs = order_by_ids(&section.sub_section, subs, |s| s.id);
        content.push(SectionContent::new(section, subs));
    }
    Ok(content)
}

pub async fn section_content(store: &dyn Store, id: &Id) -> StoreResult<Option<SectionContent>> {
    let section = match store.find_section(id).await? {
        Some(it) => it,
        None => return Ok(None),
    };
    let subs = store.find_sub_sections(&section.sub_section).await?;
    let subs = order_by_ids(&section.sub_section, subs, |s| s.id);
    Ok(Some(SectionContent::new(section, subs)))
}

async fn ratings(store: &dyn Store, ids: &[Id]) -> StoreResult<Vec<RatingAndReview>> {
    Ok(order_by_ids(ids, store.find_ratings(ids).await?, |r| r.id))
}

/// Course with instructor (and profile), category, ratings and content.
pub async fn course_details(store: &dyn Store, course: Course) -> StoreResult<CourseDetails> {
    let instructor = user_details(store, &course.instructor).await?;
    let category = store.find_category(&course.category).await?;
    let rating_and_reviews = ratings(store, &course.rating_and_reviews).await?;
    let course_content = self::course_content(store, &course.course_content).await?;

    Ok(CourseDetails {
        course: CourseFields::from(&course),
        instructor,
        category,
        rating_and_reviews,
        course_content,
    })
}

pub async fn course_summaries(
    store: &dyn Store,
    courses: Vec<Course>,
) -> StoreResult<Vec<CourseSummary>> {
    let instructor_ids: Vec<Id> = courses.iter().map(|c| c.instructor).collect();
    let instructors: HashMap<Id, UserDetails> = users_details(store, &instructor_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(courses
        .into_iter()
        .map(|course| CourseSummary {
            id: course.id,
            course_name: course.course_name,
            price: course.price,
            thumbnail: course.thumbnail,
            instructor: instructors.get(&course.instructor).cloned(),
            rating_and_reviews: course.rating_and_reviews,
            students_enrolled: course.students_enrolled,
        })
        .collect())
}

pub async fn courses_with_reviews(
    store: &dyn Store,
    courses: Vec<Course>,
) -> StoreResult<Vec<CourseWithReviews>> {
    let mut populated = Vec::with_capacity(courses.len());
    for course in courses {
        let rating_and_reviews = ratings(store, &course.rating_and_reviews).await?;
        populated.push(CourseWithReviews {
            course: CourseFields::from(&course),
            instructor: course.instructor,
            category: course.category,
            course_content: course.course_content,
            rating_and_reviews,
        });
    }
    Ok(populated)
}

/// Courses referenced by the category with the given status, in category order.
pub async fn category_courses(
    store: &dyn Store,
    category: &Category,
    status: CourseStatus,
) -> StoreResult<Vec<Course>> {
    let courses = store
        .find_courses(&CourseQuery::ids(&category.courses).with_status(status))
        .await?;
    Ok(order_by_ids(&category.courses, courses, |c| c.id))
}

pub async fn review_details(
    store: &dyn Store,
    ratings: Vec<RatingAndReview>,
) -> StoreResult<Vec<ReviewDetails>> {
    let user_ids: Vec<Id> = ratings.iter().map(|r| r.user).collect();
    let course_ids: Vec<Id> = ratings.iter().map(|r| r.course).collect();

    let users: HashMap<Id, Reviewer> = store
        .find_users(&user_ids)
        .await?
        .into_iter()
        .map(|u| {
            (
                u.id,
                Reviewer {
                    id: u.id,
                    first_name: u.first_name,
                    last_name: u.last_name,
                    email: u.email,
                    image: u.image,
                },
            )
        })
        .collect();
    let courses: HashMap<Id, ReviewedCourse> = store
        .find_courses(&CourseQuery::ids(&course_ids))
        .await?
        .into_iter()
        .map(|c| {
            (
                c.id,
                ReviewedCourse {
                    id: c.id,
                    course_name: c.course_name,
                },
            )
        })
        .collect();

    Ok(ratings
        .into_iter()
        .map(|r| ReviewDetails {
            id: r.id,
            rating: r.rating,
            review: r.review,
            user: users.get(&r.user).cloned(),
            course: courses.get(&r.course).cloned(),
        })
        .collect())
}
