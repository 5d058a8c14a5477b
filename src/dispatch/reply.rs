use crate::common::Response;
use axum::{Json, http::StatusCode};
use serde::Serialize;
use serde_json::Value;

/// What a handler produced, before status mapping
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A plain value; status is derived from its shape and truthiness
    Value(Value),
    /// A response built by the handler, used as-is
    Structured(Response),
    /// Nothing at all
    Empty,
}

impl Reply {
    /// Map the reply onto a response
    ///
    /// Sequences are 200 when non-empty and 204 otherwise. Other values are
    /// 200 when truthy; `null`, `false`, `0` and `""` are 204.
    pub fn into_structured(self) -> Response {
        match self {
            Reply::Structured(response) => response.with_default_message(),
            Reply::Empty => Response::new(StatusCode::NO_CONTENT),
            Reply::Value(value) => {
                let status = match &value {
                    Value::Array(items) if items.is_empty() => StatusCode::NO_CONTENT,
                    Value::Array(_) => StatusCode::OK,
                    other if is_truthy(other) => StatusCode::OK,
                    _ => StatusCode::NO_CONTENT,
                };
                Response::new(status).body(value)
            }
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Conversion of handler return values into a [`Reply`]
///
/// Errors convert into `anyhow::Error` and become 500 responses. Arbitrary
/// `Serialize` types go through [`Json`] or a `Vec`.
pub trait IntoReply {
    fn into_reply(self) -> anyhow::Result<Reply>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(self)
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Structured(self))
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Value(self))
    }
}

impl IntoReply for () {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Empty)
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> anyhow::Result<Reply> {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(Reply::Empty),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<anyhow::Error>,
{
    fn into_reply(self) -> anyhow::Result<Reply> {
        match self {
            Ok(value) => value.into_reply(),
            Err(error) => Err(error.into()),
        }
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Value(serde_json::to_value(self.0)?))
    }
}

impl<T: Serialize> IntoReply for Vec<T> {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Value(serde_json::to_value(self)?))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Value(Value::from(self)))
    }
}

macro_rules! into_reply_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> anyhow::Result<Reply> {
                    Ok(Reply::Value(Value::from(self)))
                }
            }
        )*
    };
}

into_reply_value!(String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
