use crate::controller::ParamSource;
use crate::di::{Container, Inject, Instance};
use crate::dispatch::{Part, RequestContext};
use axum::{Json, http::HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// One extracted argument, before conversion to the handler's parameter type
#[derive(Debug, Clone)]
pub enum Arg {
    /// The request had nothing for this source
    Missing,
    Text(String),
    Body(Value),
    Headers(HeaderMap),
    Part(Part),
    Service(Instance),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Missing => "nothing",
            Arg::Text(_) => "text",
            Arg::Body(_) => "body",
            Arg::Headers(_) => "headers",
            Arg::Part(_) => "multipart part",
            Arg::Service(_) => "service",
        }
    }
}

#[derive(Debug, Error)]
pub enum ArgRejection {
    #[error("missing value")]
    Missing,

    #[error("cannot convert {found} into {expected}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid {expected}: '{value}'")]
    Parse {
        expected: &'static str,
        value: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Conversion failure for the argument at `index`
#[derive(Debug, Error)]
#[error("Invalid argument {index}: {rejection}")]
pub struct ArgError {
    pub index: usize,
    #[source]
    pub rejection: ArgRejection,
}

/// Extracted arguments, consumed in declaration order by generated handlers
#[derive(Debug, Default)]
pub struct Args {
    values: VecDeque<Arg>,
    taken: usize,
}

impl Args {
    pub fn new(values: impl IntoIterator<Item = Arg>) -> Self {
        Self {
            values: values.into_iter().collect(),
            taken: 0,
        }
    }

    /// Extract every source in order
    pub async fn extract(
        sources: &[ParamSource],
        context: &RequestContext,
        container: &Container,
    ) -> anyhow::Result<Self> {
        let mut values = Vec::with_capacity(sources.len());
        for source in sources {
            let value = match source {
                ParamSource::Path(name) => text(context.path_param(name).map(str::to_string)),
                ParamSource::Query(name) => text(context.query(name)),
                ParamSource::Body => Arg::Body(context.body()),
                ParamSource::Headers => Arg::Headers(context.headers().clone()),
                ParamSource::FormField(name) => text(context.form_field(name).await?),
                ParamSource::MultipartField(name) => context
                    .multipart_field(name)
                    .await?
                    .map_or(Arg::Missing, Arg::Part),
                ParamSource::Service(dependency) => {
                    Arg::Service(container.resolve_dependency(dependency)?)
                }
            };
            values.push(value);
        }
        Ok(Self::new(values))
    }

    /// Convert the next argument. Running past the end yields `Arg::Missing`.
    pub fn next<T: FromArg>(&mut self) -> Result<T, ArgError> {
        let index = self.taken;
        self.taken += 1;
        let arg = self.values.pop_front().unwrap_or(Arg::Missing);
        T::from_arg(arg).map_err(|rejection| ArgError { index, rejection })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn text(value: Option<String>) -> Arg {
    value.map_or(Arg::Missing, Arg::Text)
}

/// Conversion from an extracted [`Arg`] into a handler parameter
pub trait FromArg: Sized {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection>;
}

impl FromArg for Arg {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        Ok(arg)
    }
}

impl FromArg for String {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        match arg {
            Arg::Text(value) => Ok(value),
            Arg::Body(Value::String(value)) => Ok(value),
            Arg::Body(Value::Null) | Arg::Missing => Err(ArgRejection::Missing),
            Arg::Body(value) => Ok(value.to_string()),
            Arg::Part(part) => Ok(part.text()),
            other => Err(ArgRejection::WrongKind {
                expected: "String",
                found: other.kind(),
            }),
        }
    }
}

macro_rules! from_arg_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromArg for $ty {
                fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
                    let raw = match arg {
                        Arg::Text(value) => value,
                        Arg::Body(Value::String(value)) => value,
                        Arg::Body(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
                        Arg::Part(part) => part.text(),
                        Arg::Missing | Arg::Body(Value::Null) => return Err(ArgRejection::Missing),
                        other => {
                            return Err(ArgRejection::WrongKind {
                                expected: stringify!($ty),
                                found: other.kind(),
                            })
                        }
                    };
                    let parsed = raw.trim().parse::<$ty>();
                    parsed.map_err(|_| ArgRejection::Parse {
                        expected: stringify!($ty),
                        value: raw,
                    })
                }
            }
        )*
    };
}

from_arg_parse!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool);

impl<T: FromArg> FromArg for Option<T> {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        match arg {
            Arg::Missing | Arg::Body(Value::Null) => Ok(None),
            other => T::from_arg(other).map(Some),
        }
    }
}

impl FromArg for Value {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        match arg {
            Arg::Missing => Ok(Value::Null),
            Arg::Text(value) => Ok(Value::String(value)),
            Arg::Body(value) => Ok(value),
            Arg::Part(part) => Ok(Value::String(part.text())),
            Arg::Headers(headers) => {
                let map: Map<String, Value> = headers
                    .iter()
                    .filter_map(|(name, value)| {
                        let value = value.to_str().ok()?;
                        Some((name.to_string(), Value::String(value.to_string())))
                    })
                    .collect();
                Ok(Value::Object(map))
            }
            other => Err(ArgRejection::WrongKind {
                expected: "Value",
                found: other.kind(),
            }),
        }
    }
}

impl<T: DeserializeOwned> FromArg for Json<T> {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        let value = match arg {
            Arg::Body(value) => serde_json::from_value(value)?,
            Arg::Text(value) => serde_json::from_str(&value)?,
            Arg::Part(part) => serde_json::from_slice(&part.data)?,
            Arg::Missing => return Err(ArgRejection::Missing),
            other => {
                return Err(ArgRejection::WrongKind {
                    expected: "Json",
                    found: other.kind(),
                });
            }
        };
        Ok(Json(value))
    }
}

impl FromArg for HeaderMap {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        match arg {
            Arg::Headers(headers) => Ok(headers),
            other => Err(ArgRejection::WrongKind {
                expected: "HeaderMap",
                found: other.kind(),
            }),
        }
    }
}

impl FromArg for Part {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        match arg {
            Arg::Part(part) => Ok(part),
            Arg::Missing => Err(ArgRejection::Missing),
            other => Err(ArgRejection::WrongKind {
                expected: "Part",
                found: other.kind(),
            }),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> FromArg for Arc<T> {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        match arg {
            Arg::Service(instance) => instance.downcast_ref::<Arc<T>>().cloned().ok_or(
                ArgRejection::WrongKind {
                    expected: std::any::type_name::<T>(),
                    found: "another service",
                },
            ),
            other => Err(ArgRejection::WrongKind {
                expected: std::any::type_name::<T>(),
                found: other.kind(),
            }),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> FromArg for Inject<T> {
    fn from_arg(arg: Arg) -> Result<Self, ArgRejection> {
        Arc::<T>::from_arg(arg).map(Inject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Rename {
        name: String,
    }

    #[test]
    fn test_arguments_convert_in_order() {
        let mut args = Args::new([
            Arg::Text("42".into()),
            Arg::Body(json!({ "name": "x" })),
            Arg::Missing,
        ]);

        let id: u32 = args.next().unwrap();
        let Json(body): Json<Rename> = args.next().unwrap();
        let page: Option<u32> = args.next().unwrap();

        assert_eq!(id, 42);
        assert_eq!(body, Rename { name: "x".into() });
        assert_eq!(page, None);
        assert!(args.is_empty());
    }

    #[test]
    fn test_conversion_error_names_the_index() {
        let mut args = Args::new([Arg::Text("ok".into()), Arg::Text("abc".into())]);
        let _: String = args.next().unwrap();

        let error = args.next::<i64>().unwrap_err();
        assert_eq!(error.index, 1);
        assert_eq!(error.to_string(), "Invalid argument 1: invalid i64: 'abc'");
    }

    #[test]
    fn test_missing_required_value() {
        let mut args = Args::default();
        assert!(matches!(
            args.next::<String>(),
            Err(ArgError {
                rejection: ArgRejection::Missing,
                ..
            })
        ));
        assert_eq!(args.next::<Value>().unwrap(), Value::Null);
    }

    #[test]
    fn test_service_argument() {
        struct Clock(u64);

        let instance: Instance = Arc::new(Arc::new(Clock(7)));
        let mut args = Args::new([Arg::Service(instance.clone()), Arg::Service(instance)]);

        let clock: Arc<Clock> = args.next().unwrap();
        assert_eq!(clock.0, 7);
        assert!(args.next::<Arc<String>>().is_err());
    }

    #[tokio::test]
    async fn test_extract_from_context() {
        use axum::http::{Method, Uri};

        let context = RequestContext::new(Method::PATCH, Uri::from_static("/users/42?verbose=true"))
            .with_path_param("id", "42")
            .with_json(&json!({ "name": "x" }));
        let sources = [
            ParamSource::path("id"),
            ParamSource::Body,
            ParamSource::query("verbose"),
            ParamSource::query("absent"),
        ];

        let mut args = Args::extract(&sources, &context, &Container::new())
            .await
            .unwrap();
        assert_eq!(args.len(), 4);
        assert_eq!(args.next::<u64>().unwrap(), 42);
        assert_eq!(args.next::<Value>().unwrap(), json!({ "name": "x" }));
        assert!(args.next::<bool>().unwrap());
        assert_eq!(args.next::<Option<String>>().unwrap(), None);
    }
}
