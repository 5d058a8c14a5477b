use crate::di::Dependency;
use strum_macros::AsRefStr;

/// Where a handler parameter comes from
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ParamSource {
    /// A named path variable
    Path(String),
    /// A named query-string value
    Query(String),
    /// The parsed request body
    Body,
    /// The full header map
    Headers,
    /// A named url-encoded or multipart text field
    FormField(String),
    /// The first multipart part with this name
    MultipartField(String),
    /// A service resolved from the request scope
    Service(Dependency),
}

impl ParamSource {
    pub fn path(name: impl Into<String>) -> Self {
        ParamSource::Path(name.into())
    }

    pub fn query(name: impl Into<String>) -> Self {
        ParamSource::Query(name.into())
    }

    pub fn form_field(name: impl Into<String>) -> Self {
        ParamSource::FormField(name.into())
    }

    pub fn multipart_field(name: impl Into<String>) -> Self {
        ParamSource::MultipartField(name.into())
    }

    pub fn service<T: ?Sized + 'static>() -> Self {
        ParamSource::Service(Dependency::of::<T>())
    }

    /// Source kind as named in route listings, e.g. `formField`
    pub fn kind(&self) -> &str {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ParamSource::path("id").kind(), "path");
        assert_eq!(ParamSource::form_field("a").kind(), "formField");
        assert_eq!(ParamSource::multipart_field("f").kind(), "multipartField");
        assert_eq!(ParamSource::service::<String>().kind(), "service");
    }
}
