//! Fixtures shared by the operation and route tests.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rocket::http::{ContentType, Cookie};

use crate::config::Config;
use crate::context::Context;
use crate::data::category::Category;
use crate::data::course::{Course, CourseStatus};
use crate::data::progress::CourseProgress;
use crate::data::section::{Section, SubSection};
use crate::data::user::{Profile, User};
use crate::data::Id;
use crate::error::{MailError, MediaError};
use crate::mail::{Email, Mailer};
use crate::media::{MediaFile, MediaHost, UploadedMedia};
use crate::resp::jwt::{AuthToken, AUTH_COOKIE_NAME};
use crate::role::AccountType;
use crate::store::memory::MemoryStore;
use crate::store::Store;

pub const TEST_SECRET: &str = "studynotion-test-secret";

/// Media host that accepts everything and reports a fixed video length.
#[derive(Default)]
pub struct StubMedia {
    pub duration: Option<f64>,
    pub uploads: Mutex<Vec<String>>,
}

#[rocket::async_trait]
impl MediaHost for StubMedia {
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, MediaError> {
        self.uploads
            .lock()
            .expect("stub media poisoned")
            .push(file.file_name.clone());
        Ok(UploadedMedia {
            secure_url: format!("https://media.test/{}", file.file_name),
            duration: self.duration,
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<Email>>,
}

#[rocket::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Build("relay unavailable".to_string()));
        }
        self.sent.lock().expect("mailer poisoned").push(email);
        Ok(())
    }
}

pub fn media_file(name: &str, content_type: &str) -> MediaFile {
    MediaFile {
        bytes: b"media".to_vec(),
        file_name: name.to_string(),
        content_type: content_type.to_string(),
    }
}

pub fn sub_section(title: &str, time_duration: &str) -> SubSection {
    SubSection {
        id: Id::new(),
        title: title.to_string(),
        time_duration: time_duration.to_string(),
        description: format!("{} description", title),
        video_url: format!("https://media.test/{}.mp4", title),
    }
}

pub fn auth_cookie(user: &User) -> Cookie<'static> {
    let token = AuthToken::new(user.id, &user.email, user.account_type)
        .encode_jwt(TEST_SECRET)
        .expect("encodable claims");
    Cookie::new(AUTH_COOKIE_NAME, token)
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub media: Arc<StubMedia>,
    pub mailer: Arc<RecordingMailer>,
    pub ctx: Context,
}

impl Fixture {
    pub fn new() -> Fixture {
        Fixture::with(StubMedia::default(), RecordingMailer::default())
    }

    pub fn with(media: StubMedia, mailer: RecordingMailer) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(media);
        let mailer = Arc::new(mailer);
        let ctx = Context::new(store.clone())
            .with_media(media.clone())
            .with_mailer(mailer.clone());

        Fixture {
            store,
            media,
            mailer,
            ctx,
        }
    }

    pub fn user(&self, account_type: AccountType) -> User {
        let profile = Profile {
            id: Id::new(),
            about: Some("Hello".to_string()),
            ..Default::default()
        };
        let name = account_type.to_string();
        let user = User::new(
            &name,
            "Tester",
            format!("{}-{}@example.com", name.to_lowercase(), Id::new()),
            account_type,
            &profile,
        );
        self.store.insert_profile(profile);
        self.store.insert_user(user.clone());
        user
    }

    pub async fn category(&self, name: &str) -> Category {
        let category = Category::new(name, Some(format!("All about {}", name)));
        self.store
            .insert_category(&category)
            .await
            .expect("memory insert");
        category
    }

    /// Inserts a course and links it from its instructor and category.
    pub async fn course(
        &self,
        instructor: &User,
        category: &Category,
        status: CourseStatus,
    ) -> Course {
        let course = Course {
            id: Id::new(),
            course_name: format!("{} course", category.name),
            course_description: "Learn by building".to_string(),
            instructor: instructor.id,
            what_you_will_learn: "Everything".to_string(),
            course_content: vec![],
            rating_and_reviews: vec![],
            price: 1000,
            thumbnail: "https://media.test/thumb.png".to_string(),
            tag: vec!["test".to_string()],
            category: category.id,
            students_enrolled: vec![],
            instructions: vec!["Be curious".to_string()],
            status,
            sold: 0,
            created_at: Utc::now(),
        };
        self.store.insert_course(&course).await.expect("memory insert");
        self.store
            .push_user_course(&instructor.id, &course.id, None)
            .await
            .expect("memory update");
        self.store
            .push_category_course(&category.id, &course.id)
            .await
            .expect("memory update");
        course
    }

    /// Adds a section with one sub-section per duration to the course.
    pub async fn section(&self, course: &Id, durations: &[&str]) -> (Section, Vec<SubSection>) {
        let mut section = Section::new("Section");
        let subs: Vec<SubSection> = durations
            .iter()
            .enumerate()
            .map(|(i, d)| sub_section(&format!("lesson-{}", i), d))
            .collect();
        for sub in subs.iter() {
            self.store.insert_sub_section(sub).await.expect("memory insert");
            section.sub_section.push(sub.id);
        }
        self.store.insert_section(&section).await.expect("memory insert");
        self.store
            .push_course_section(course, &section.id)
            .await
            .expect("memory update");
        (section, subs)
    }

    /// Enrolls without going through the enrollment operation.
    pub async fn enroll(&self, course: &Id, student: &User) -> CourseProgress {
        let progress = CourseProgress::new(student.id, *course);
        self.store
            .enroll_student(course, &student.id)
            .await
            .expect("memory update");
        self.store
            .insert_progress(&progress)
            .await
            .expect("memory insert");
        self.store
            .push_user_course(&student.id, course, Some(&progress.id))
            .await
            .expect("memory update");
        progress
    }
}

/// Local client over the full route tree, backed by the fixture's services.
pub async fn client(fx: &Fixture) -> rocket::local::asynchronous::Client {
    let rocket = crate::build(Config::for_tests(TEST_SECRET), fx.ctx.clone())
        .expect("valid test configuration");
    rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .expect("valid rocket instance")
}

const BOUNDARY: &str = "studynotion-test-boundary";

/// Encodes text fields and an optional `(field, file name, content type)`
/// upload as a multipart form body.
pub fn multipart(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str)>,
) -> (ContentType, Vec<u8>) {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    if let Some((name, file_name, content_type)) = file {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\nmedia-bytes\r\n",
            BOUNDARY, name, file_name, content_type
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    let content_type = ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY));
    (content_type, body.into_bytes())
}
