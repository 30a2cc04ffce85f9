use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AccountType {
    Admin,
    Student,
    Instructor,
}

impl AccountType {
    /// Indicates whether accounts of this type can author courses
    pub fn can_author(self) -> bool {
        self == AccountType::Instructor
    }
}

impl std::default::Default for AccountType {
    fn default() -> Self {
        AccountType::Student
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountType::Admin => write!(f, "Admin"),
            AccountType::Student => write!(f, "Student"),
            AccountType::Instructor => write!(f, "Instructor"),
        }
    }
}
