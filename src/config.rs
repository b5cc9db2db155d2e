use std::{fmt::Display, str::FromStr, sync::LazyLock, time::Duration};

use bytes::Bytes;
use http::{
    header::{HeaderName, HeaderValue, CONTENT_TYPE},
    HeaderMap, Method, Uri,
};
use mime::Mime;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    abort::CancelSignal,
    error::{BoxError, HttpiResult, RequestConfigError},
    interface::{helper::coalesce::Coalesce, setting::Setting},
    interpolate::{interpolate, Interpolated},
    mapping::Mapping,
};

/// Characters that cannot appear in a request target as is. `%` is absent so encoded values pass through.
const TARGET_ENCODE_SET: &AsciiSet =
    &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`').add(b'{').add(b'}').add(b'|').add(b'\\').add(b'^');

static ABSOLUTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").unwrap_or_else(|_| unreachable!()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Jsonp,
}
impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Jsonp => "jsonp",
        }
    }

    /// JSONP is carried by a plain `GET`.
    pub fn method(&self) -> Method {
        match self {
            Self::Get | Self::Jsonp => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
            Self::Head => Method::HEAD,
        }
    }
}
impl Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for Verb {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_ascii_lowercase() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            "head" => Ok(Self::Head),
            "jsonp" => Ok(Self::Jsonp),
            _ => Err(format!("`{}` is not supported verb", s)),
        }
    }
}

/// The timeout slot of a request. The http client stops waiting for the response when it elapses or fires.
#[derive(Debug, Clone)]
pub enum Timeout {
    Deadline(Duration),
    Signal(CancelSignal),
}
impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Deadline(d)
    }
}
impl From<CancelSignal> for Timeout {
    fn from(s: CancelSignal) -> Self {
        Self::Signal(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub url: String,
    pub method: Verb,
    pub params: Option<Mapping>,
    pub data: Option<Mapping>,
    pub headers: HeaderMap,
    pub timeout: Option<Timeout>,
    pub keep_trailing_slash: Option<bool>,
}

impl RequestConfig {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    pub fn with_method(self, method: Verb) -> Self {
        Self { method, ..self }
    }
    pub fn with_params<M: Into<Mapping>>(self, params: M) -> Self {
        Self { params: Some(params.into()), ..self }
    }
    pub fn with_data<M: Into<Mapping>>(self, data: M) -> Self {
        Self { data: Some(data.into()), ..self }
    }
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
    pub fn with_timeout<T: Into<Timeout>>(self, timeout: T) -> Self {
        Self { timeout: Some(timeout.into()), ..self }
    }
    pub fn with_keep_trailing_slash(self, keep_trailing_slash: bool) -> Self {
        Self { keep_trailing_slash: Some(keep_trailing_slash), ..self }
    }

    /// Resolve `url` with the labels consumed from `data` and `params`. Absent mappings are treated as empty
    /// and stay absent.
    pub fn interpolate(&mut self, strip_trailing_slash: bool) {
        let (params, data) = (self.params.take(), self.data.take());
        let (had_params, had_data) = (params.is_some(), data.is_some());
        let Interpolated { url, params, data } =
            interpolate(&self.url, params.unwrap_or_default(), data.unwrap_or_default(), strip_trailing_slash);
        self.url = url;
        self.params = had_params.then_some(params);
        self.data = had_data.then_some(data);
    }

    /// Build the request for an http client. Remaining params become the query string and remaining data
    /// becomes the body. A relative url is resolved against `origin` when it is given. Characters that are not
    /// allowed in a uri, such as spaces in interpolated values, are percent-encoded.
    pub fn into_request(self, origin: Option<&Uri>) -> HttpiResult<http::Request<Bytes>> {
        let RequestConfig { url, method, params, data, mut headers, timeout, .. } = self;

        let mut target = match origin {
            Some(origin) if !ABSOLUTE_URL.is_match(&url) => join_origin(origin, &url),
            _ => url,
        };
        let query = params.as_ref().map(Mapping::to_query).transpose().map_err(encode_error("params"))?;
        if let Some(query) = query {
            if !query.is_empty() {
                target.push(if target.contains('?') { '&' } else { '?' });
                target.push_str(&query);
            }
        }
        let target = utf8_percent_encode(&target, TARGET_ENCODE_SET).to_string();
        let uri = target.parse::<Uri>().map_err(|e| RequestConfigError::InvalidUri(target.clone(), e.into()))?;

        let body = match data.filter(|d| !d.is_empty()) {
            Some(data) => {
                let (content_type, body) = encode_data(&data)?;
                headers
                    .entry(CONTENT_TYPE)
                    .or_insert(content_type.as_ref().parse().unwrap_or_else(|_| unreachable!()));
                body
            }
            None => Bytes::new(),
        };

        let mut request = http::Request::builder()
            .method(method.method())
            .uri(uri)
            .body(body)
            .map_err(|e| RequestConfigError::InvalidUri(target, e))?;
        request.headers_mut().extend(headers);
        if let Some(timeout) = timeout {
            request.extensions_mut().insert(timeout);
        }
        Ok(request)
    }
}

impl Coalesce<Setting> for RequestConfig {
    fn coalesce(self, other: &Setting) -> Self {
        let mut headers = (*other.headers).clone();
        headers.extend(self.headers);
        let keep_trailing_slash = self.keep_trailing_slash.coalesce(&other.keep_trailing_slash);
        Self { headers, keep_trailing_slash, ..self }
    }
}

fn join_origin(origin: &Uri, url: &str) -> String {
    let base = origin.to_string();
    match (base.ends_with('/'), url.starts_with('/')) {
        (true, true) => format!("{}{}", base, &url[1..]),
        (false, false) if !url.is_empty() => format!("{}/{}", base, url),
        _ => format!("{}{}", base, url),
    }
}

fn encode_error<E: Into<BoxError>>(what: &'static str) -> impl FnOnce(E) -> RequestConfigError {
    move |e| RequestConfigError::FailToEncode(what, e.into())
}

#[cfg(feature = "json")]
fn encode_data(data: &Mapping) -> Result<(Mime, Bytes), RequestConfigError> {
    let body = serde_json::to_vec(data).map_err(encode_error("data"))?;
    Ok((mime::APPLICATION_JSON, body.into()))
}
#[cfg(not(feature = "json"))]
fn encode_data(data: &Mapping) -> Result<(Mime, Bytes), RequestConfigError> {
    let body = data.to_query().map_err(encode_error("data"))?;
    Ok((mime::APPLICATION_WWW_FORM_URLENCODED, body.into()))
}
