use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{FromRequest, FromRequestParts, Multipart, RawPathParams, Request},
    http::{HeaderMap, HeaderValue, Method, Uri, header::CONTENT_TYPE},
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::OnceCell;

/// One part of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Part {
    /// The part's content as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// A buffered request as seen by parameter extraction
///
/// The body is read once up front; multipart bodies are parsed lazily on the
/// first form or multipart lookup and cached.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: HashMap<String, String>,
    body: Bytes,
    parts: OnceCell<Vec<Part>>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            path_params: HashMap::new(),
            body: Bytes::new(),
            parts: OnceCell::new(),
        }
    }

    /// Buffer a routed request, reading at most `body_limit` bytes of body
    pub async fn from_request(request: Request, body_limit: usize) -> anyhow::Result<Self> {
        let (mut parts, body) = request.into_parts();

        let path_params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(params) => params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            Err(rejection) => {
                tracing::debug!(%rejection, "No path parameters on request");
                HashMap::new()
            }
        };
        let body = to_bytes(body, body_limit).await?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            path_params,
            body,
            parts: OnceCell::new(),
        })
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    pub fn with_body(mut self, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body.into();
        self
    }

    pub fn with_json(self, value: &Value) -> Self {
        self.with_body("application/json", value.to_string())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// First query-string value for `name`, percent-decoded
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    fn is_content_type(&self, mime: &str) -> bool {
        self.content_type()
            .is_some_and(|content_type| content_type.starts_with(mime))
    }

    /// The parsed body
    ///
    /// Empty → `null`; url-encoded → object of strings; otherwise JSON if it
    /// parses, else the raw text.
    pub fn body(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }

        if self.is_content_type("application/x-www-form-urlencoded") {
            let fields: Map<String, Value> = url::form_urlencoded::parse(&self.body)
                .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
                .collect();
            return Value::Object(fields);
        }

        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }

    pub fn raw_body(&self) -> &Bytes {
        &self.body
    }

    /// A named form field from a url-encoded or multipart body
    pub async fn form_field(&self, name: &str) -> anyhow::Result<Option<String>> {
        if self.is_content_type("application/x-www-form-urlencoded") {
            return Ok(url::form_urlencoded::parse(&self.body)
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned()));
        }

        if self.is_content_type("multipart/form-data") {
            return Ok(self
                .parts()
                .await?
                .iter()
                .find(|part| part.name == name && part.file_name.is_none())
                .map(Part::text));
        }

        Ok(None)
    }

    /// The first multipart part named `name`
    pub async fn multipart_field(&self, name: &str) -> anyhow::Result<Option<Part>> {
        if !self.is_content_type("multipart/form-data") {
            return Ok(None);
        }

        Ok(self
            .parts()
            .await?
            .iter()
            .find(|part| part.name == name)
            .cloned())
    }

    async fn parts(&self) -> anyhow::Result<&[Part]> {
        let parts = self
            .parts
            .get_or_try_init(|| parse_multipart(self.headers.clone(), self.body.clone()))
            .await?;
        Ok(parts.as_slice())
    }
}

async fn parse_multipart(headers: HeaderMap, body: Bytes) -> anyhow::Result<Vec<Part>> {
    let mut request = Request::new(Body::from(body));
    *request.headers_mut() = headers;

    let mut multipart = Multipart::from_request(request, &()).await?;
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        parts.push(Part {
            name,
            file_name,
            content_type,
            data,
        });
    }

    tracing::debug!(parts = parts.len(), "Parsed multipart body");
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(uri: &'static str) -> RequestContext {
        RequestContext::new(Method::POST, Uri::from_static(uri))
    }

    #[test]
    fn test_query_is_decoded() {
        let ctx = context("/search?q=hello%20world&page=2");
        assert_eq!(ctx.query("q").as_deref(), Some("hello world"));
        assert_eq!(ctx.query("page").as_deref(), Some("2"));
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn test_body_parsing() {
        assert_eq!(context("/").body(), Value::Null);

        let json_body = context("/").with_json(&json!({ "name": "x" }));
        assert_eq!(json_body.body(), json!({ "name": "x" }));

        let form = context("/").with_body("application/x-www-form-urlencoded", "a=1&b=two+words");
        assert_eq!(form.body(), json!({ "a": "1", "b": "two words" }));

        let text = context("/").with_body("text/plain", "plain text");
        assert_eq!(text.body(), json!("plain text"));
    }

    #[tokio::test]
    async fn test_form_field_from_urlencoded() {
        let ctx = context("/").with_body("application/x-www-form-urlencoded", "user=ann");
        assert_eq!(ctx.form_field("user").await.unwrap().as_deref(), Some("ann"));
        assert_eq!(ctx.multipart_field("user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_multipart_fields() {
        let body = concat!(
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
            "Report\r\n",
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "file contents\r\n",
            "--XYZ--\r\n",
        );
        let ctx = context("/").with_body("multipart/form-data; boundary=XYZ", body);

        assert_eq!(ctx.form_field("title").await.unwrap().as_deref(), Some("Report"));

        let file = ctx.multipart_field("file").await.unwrap().unwrap();
        assert_eq!(file.file_name.as_deref(), Some("a.txt"));
        assert_eq!(file.content_type.as_deref(), Some("text/plain"));
        assert_eq!(file.text(), "file contents");
        assert_eq!(ctx.form_field("file").await.unwrap(), None);
    }
}
