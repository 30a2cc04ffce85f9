use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Id;
use crate::role::AccountType;

pub mod db;

pub static USER_COLLECTION_NAME: &str = "users";
pub static PROFILE_COLLECTION_NAME: &str = "profiles";

fn true_bool() -> bool {
    true
}

/// Account identity. Accounts are created by the auth service; this backend
/// only reads and updates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_type: AccountType,
    #[serde(default = "true_bool")]
    pub active: bool,
    #[serde(default = "true_bool")]
    pub approved: bool,
    pub additional_details: Id,
    #[serde(default)]
    pub courses: Vec<Id>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub course_progress: Vec<Id>,
}

impl User {
    pub fn new(
        first_name: impl ToString,
        last_name: impl ToString,
        email: impl ToString,
        account_type: AccountType,
        profile: &Profile,
    ) -> User {
        let id = Id::new();
        tracing::info!("Creating a new user with id: {}", id);

        let first_name = first_name.to_string();
        let last_name = last_name.to_string();
        let image = avatar_url(&first_name, &last_name);

        User {
            id,
            first_name,
            last_name,
            email: email.to_string(),
            account_type,
            active: true,
            approved: true,
            additional_details: profile.id,
            courses: vec![],
            image,
            course_progress: vec![],
        }
    }
}

/// Initials avatar used until a display picture is uploaded.
pub fn avatar_url(first_name: &str, last_name: &str) -> String {
    format!(
        "https://api.dicebear.com/5.x/initials/svg?seed={}%20{}",
        first_name, last_name
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: Id,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub about: Option<String>,
    pub contact_number: Option<String>,
}

/// Fields of [`User`] that profile updates may change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub about: Option<String>,
    pub contact_number: Option<String>,
}

impl ProfilePatch {
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(it) = &self.gender {
            profile.gender = Some(it.clone());
        }
        if let Some(it) = &self.date_of_birth {
            profile.date_of_birth = Some(it.clone());
        }
        if let Some(it) = &self.about {
            profile.about = Some(it.clone());
        }
        if let Some(it) = &self.contact_number {
            profile.contact_number = Some(it.clone());
        }
    }
}

impl UserPatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(it) = &self.first_name {
            user.first_name = it.clone();
        }
        if let Some(it) = &self.last_name {
            user.last_name = it.clone();
        }
        if let Some(it) = &self.image {
            user.image = it.clone();
        }
    }
}

/// A user with its profile populated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(rename = "_id")]
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_type: AccountType,
    pub active: bool,
    pub approved: bool,
    pub additional_details: Option<Profile>,
    pub courses: Vec<Id>,
    pub image: String,
    pub course_progress: Vec<Id>,
}

impl UserDetails {
    pub fn new(user: User, profile: Option<Profile>) -> UserDetails {
        UserDetails {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            account_type: user.account_type,
            active: user.active,
            approved: user.approved,
            additional_details: profile,
            courses: user.courses,
            image: user.image,
            course_progress: user.course_progress,
        }
    }
}
