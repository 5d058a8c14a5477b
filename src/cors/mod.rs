//! Cross-origin request policy.
//!
//! The policy is evaluated by the dispatcher before any argument extraction;
//! a refused request never reaches the controller.

use axum::http::{
    HeaderMap, HeaderValue, Method,
    header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
        ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD,
        ORIGIN, VARY,
    },
};
use serde::{Deserialize, Serialize};

/// `"*"` or an explicit list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowList {
    One(String),
    Many(Vec<String>),
}

impl AllowList {
    pub fn any() -> Self {
        AllowList::One("*".to_string())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, AllowList::One(value) if value == "*")
    }

    /// Exact match, as origins are compared
    pub fn contains(&self, candidate: &str) -> bool {
        match self {
            AllowList::One(value) => value == "*" || value == candidate,
            AllowList::Many(values) => values.iter().any(|value| value == candidate),
        }
    }

    /// Case-insensitive match, as methods and header names are compared
    pub fn contains_ignore_case(&self, candidate: &str) -> bool {
        match self {
            AllowList::One(value) => value == "*" || value.eq_ignore_ascii_case(candidate),
            AllowList::Many(values) => values.iter().any(|value| value.eq_ignore_ascii_case(candidate)),
        }
    }

    fn header_value(&self) -> Option<HeaderValue> {
        let joined = match self {
            AllowList::One(value) => value.clone(),
            AllowList::Many(values) if values.is_empty() => return None,
            AllowList::Many(values) => values.join(", "),
        };
        HeaderValue::from_str(&joined).ok()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::any()
    }
}

impl From<Vec<&str>> for AllowList {
    fn from(values: Vec<&str>) -> Self {
        AllowList::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Configured CORS policy
///
/// Field names follow the config file: `origin`, `methods`, `allowHeaders`,
/// `exposeHeaders`, `credentials`, `maxAge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorsPolicy {
    pub origin: AllowList,
    pub methods: AllowList,
    pub allow_headers: AllowList,
    pub expose_headers: AllowList,
    pub credentials: bool,
    pub max_age: Option<u64>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            origin: AllowList::any(),
            methods: AllowList::any(),
            allow_headers: AllowList::any(),
            expose_headers: AllowList::any(),
            credentials: true,
            max_age: Some(5),
        }
    }
}

impl CorsPolicy {
    /// Whether a request may proceed
    ///
    /// Requests without an `Origin` header are not cross-origin and always
    /// pass. For preflights the requested method and headers are checked
    /// instead of the request's own.
    pub fn allows(&self, method: &Method, headers: &HeaderMap) -> bool {
        let Some(origin) = headers.get(ORIGIN) else {
            return true;
        };
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        if !self.origin.contains(origin) {
            return false;
        }

        let requested_method = headers
            .get(ACCESS_CONTROL_REQUEST_METHOD)
            .and_then(|value| value.to_str().ok());
        let method = match requested_method {
            Some(requested) if method == Method::OPTIONS => requested,
            _ => method.as_str(),
        };
        if !self.methods.contains_ignore_case(method) {
            return false;
        }

        headers
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .and_then(|value| value.to_str().ok())
            .map(|requested| {
                requested
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .all(|name| self.allow_headers.contains_ignore_case(name))
            })
            .unwrap_or(true)
    }

    /// Add the `Access-Control-*` headers for an allowed cross-origin response
    pub fn decorate(&self, origin: &HeaderValue, method: &Method, headers: &mut HeaderMap) {
        if self.origin.is_any() && !self.credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        } else {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }

        if self.credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        if let Some(exposed) = self.expose_headers.header_value() {
            headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, exposed);
        }

        if method == Method::OPTIONS {
            if let Some(methods) = self.methods.header_value() {
                headers.insert(ACCESS_CONTROL_ALLOW_METHODS, methods);
            }
            if let Some(allowed) = self.allow_headers.header_value() {
                headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allowed);
            }
            if let Some(max_age) = self.max_age {
                headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    fn strict() -> CorsPolicy {
        CorsPolicy {
            origin: vec!["https://app.example.com"].into(),
            methods: vec!["GET", "POST"].into(),
            allow_headers: vec!["Content-Type"].into(),
            expose_headers: AllowList::Many(Vec::new()),
            credentials: false,
            max_age: None,
        }
    }

    #[test]
    fn test_same_origin_requests_pass() {
        assert!(strict().allows(&Method::DELETE, &HeaderMap::new()));
    }

    #[test]
    fn test_origin_and_method_are_checked() {
        let policy = strict();
        let allowed = request_headers(&[("origin", "https://app.example.com")]);
        let foreign = request_headers(&[("origin", "https://evil.example.com")]);

        assert!(policy.allows(&Method::GET, &allowed));
        assert!(!policy.allows(&Method::DELETE, &allowed));
        assert!(!policy.allows(&Method::GET, &foreign));
    }

    #[test]
    fn test_preflight_checks_requested_method_and_headers() {
        let policy = strict();
        let ok = request_headers(&[
            ("origin", "https://app.example.com"),
            ("access-control-request-method", "POST"),
            ("access-control-request-headers", "content-type"),
        ]);
        let bad_header = request_headers(&[
            ("origin", "https://app.example.com"),
            ("access-control-request-method", "POST"),
            ("access-control-request-headers", "x-secret"),
        ]);

        assert!(policy.allows(&Method::OPTIONS, &ok));
        assert!(!policy.allows(&Method::OPTIONS, &bad_header));
    }

    #[test]
    fn test_decorate_echoes_origin_with_credentials() {
        let origin = HeaderValue::from_static("https://app.example.com");
        let mut headers = HeaderMap::new();
        CorsPolicy::default().decorate(&origin, &Method::GET, &mut headers);

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_EXPOSE_HEADERS], "*");
        assert!(!headers.contains_key(ACCESS_CONTROL_MAX_AGE));

        let mut preflight = HeaderMap::new();
        CorsPolicy::default().decorate(&origin, &Method::OPTIONS, &mut preflight);
        assert_eq!(preflight[ACCESS_CONTROL_MAX_AGE], "5");
    }

    #[test]
    fn test_policy_from_config_json() {
        let policy: CorsPolicy = serde_json::from_str(
            r#"{ "origin": ["https://a.dev"], "methods": "*", "credentials": false, "maxAge": 60 }"#,
        )
        .unwrap();

        assert_eq!(policy.origin, AllowList::Many(vec!["https://a.dev".into()]));
        assert!(policy.methods.is_any());
        assert!(policy.allow_headers.is_any());
        assert_eq!(policy.max_age, Some(60));
    }
}
