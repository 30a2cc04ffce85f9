use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rocket::http::{CookieJar, Status};
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::data::Id;
use crate::resp::problem::Problem;
use crate::role::AccountType;

pub static AUTH_COOKIE_NAME: &str = "token";
static BEARER_PREFIX: &str = "Bearer ";

/// Claims of a token issued by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub email: String,
    pub id: Id,
    pub account_type: AccountType,
    pub exp: i64,
}

impl AuthToken {
    #[cfg(test)]
    pub fn new(id: Id, email: impl ToString, account_type: AccountType) -> AuthToken {
        AuthToken {
            email: email.to_string(),
            id,
            account_type,
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
        }
    }

    #[cfg(test)]
    pub fn encode_jwt(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }
}

/// Last authorization failure of a request, read back by the 401 catcher.
pub struct AuthFailure(pub Problem);

pub fn auth_problem(message: impl ToString) -> Problem {
    Problem::new_untyped(Status::Unauthorized, message)
}

fn bearer_token<'a>(req: &'a Request<'_>) -> Option<&'a str> {
    req.headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn extract_token(cookies: &CookieJar, req: &Request<'_>) -> Option<String> {
    cookies
        .get(AUTH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| bearer_token(req).map(str::to_string))
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthToken, Problem> {
    decode::<AuthToken>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("rejected token: {}", e);
        auth_problem("Token is invalid")
    })
}

fn fail<S>(req: &Request<'_>, problem: Problem) -> request::Outcome<S, Problem> {
    let status = problem.status;
    req.local_cache(|| AuthFailure(problem.clone()));
    Outcome::Error((status, problem))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(it) => it,
            None => {
                return fail(
                    req,
                    Problem::new_untyped(
                        Status::InternalServerError,
                        "Authentication isn't configured.",
                    ),
                )
            }
        };

        tracing::trace!("extracting auth token from request");
        let token = match extract_token(req.cookies(), req) {
            Some(it) => it,
            None => return fail(req, auth_problem("Token Missing")),
        };

        match decode_token(&token, &config.jwt_secret) {
            Ok(claims) => {
                tracing::debug!("decoded auth token for user: {}", claims.id);
                Outcome::Success(claims)
            }
            Err(problem) => fail(req, problem),
        }
    }
}

macro_rules! account_guard {
    ($name:ident, $account_type:expr, $message:literal) => {
        /// Authenticated user with a required account type.
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthToken);

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = Problem;

            async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
                let token = rocket::outcome::try_outcome!(req.guard::<AuthToken>().await);
                if token.account_type != $account_type {
                    return fail(req, auth_problem($message));
                }
                Outcome::Success($name(token))
            }
        }
    };
}

account_guard!(
    Student,
    AccountType::Student,
    "This is a Protected Route for Students"
);
account_guard!(
    Instructor,
    AccountType::Instructor,
    "This is a Protected Route for Instructor"
);
account_guard!(
    Admin,
    AccountType::Admin,
    "This is a Protected Route for Admin"
);

pub mod doc {
    use utoipa::openapi::security::*;

    #[derive(Clone, Copy)]
    pub struct JWTAuth;

    impl From<JWTAuth> for SecurityScheme {
        fn from(_: JWTAuth) -> Self {
            let mut http = Http::new(HttpAuthScheme::Bearer);
            http.bearer_format = Some("JWT".to_string());
            SecurityScheme::Http(http)
        }
    }

    impl utoipa::Modify for JWTAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(c) = openapi.components.as_mut() {
                c.add_security_scheme("jwt", *self);
                c.add_security_scheme(
                    "token_cookie",
                    SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                        super::AUTH_COOKIE_NAME,
                    ))),
                );
            }
        }
    }
}
