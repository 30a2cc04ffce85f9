use serde::Serialize;

pub mod jwt;
pub mod problem;

/// Successful response body: `{"success": true, "message"?, ...body}`.
#[derive(Debug, Clone, Serialize)]
pub struct Reply<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Empty {}

impl<T> Reply<T> {
    pub fn new(body: T) -> Reply<T> {
        Reply {
            success: true,
            message: None,
            body,
        }
    }

    pub fn message(mut self, message: impl ToString) -> Reply<T> {
        self.message = Some(message.to_string());
        self
    }
}

impl<T> Reply<Data<T>> {
    pub fn data(data: T) -> Reply<Data<T>> {
        Reply::new(Data { data })
    }
}

impl Reply<Empty> {
    pub fn ok(message: impl ToString) -> Reply<Empty> {
        Reply::new(Empty {}).message(message)
    }
}
