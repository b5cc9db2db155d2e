use std::{
    fmt::Debug,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures::future::BoxFuture;
use tower::{Layer, Service, ServiceExt};

use crate::{
    abort::Abort,
    config::RequestConfig,
    error::{BoxError, DispatchError, DispatchResult},
    interface::{helper::coalesce::Coalesce, setting::Setting},
    resource::Resource,
    service::cancel::CancelLayer,
};

/// Issue a request described by a [`RequestConfig`].
pub trait Dispatch {
    type Output;
    fn dispatch(&self, config: RequestConfig) -> Self::Output;
}

/// Request dispatcher over an http client `S`.
///
/// Every dispatched url is interpolated with the `params` and `data` of its configuration, and unless the
/// configuration already occupies the timeout slot, the returned [`PendingRequest`] can be aborted.
///
/// # Example
/// ```
/// use std::convert::Infallible;
///
/// use bytes::Bytes;
/// use httpi::{Dispatch, Httpi, Mapping, RequestConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let client = tower::service_fn(|req: http::Request<Bytes>| async move {
///     Ok::<_, Infallible>(http::Response::new(req.uri().to_string()))
/// });
/// let httpi = Httpi::new(client);
///
/// let config = RequestConfig::new("/users/:id").with_data(Mapping::from([("id", 42)]));
/// let response = httpi.dispatch(config).await.unwrap();
/// assert_eq!(response.body(), "/users/42");
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Httpi<S> {
    service: S,
    setting: Setting,
}

impl<S> Httpi<S> {
    pub fn new(service: S) -> Self {
        Self::with_setting(service, Default::default())
    }
    pub fn with_setting(service: S, setting: Setting) -> Self {
        Self { service, setting }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
    pub fn setting(&self) -> &Setting {
        &self.setting
    }

    /// Bind `url` so that every verb of the returned resource is dispatched to it. The trailing slash preference
    /// of the resource starts from `keep_trailing_slash` of the setting, `false` when it is not specified.
    pub fn resource<U: Into<String>>(&self, url: U) -> Resource<Self>
    where
        S: Clone,
    {
        let mut resource = Resource::new(self.clone(), url);
        resource.set_keep_trailing_slash(self.setting.keep_trailing_slash.unwrap_or_default());
        resource
    }
}

impl<S> Dispatch for Httpi<S>
where
    S: Service<http::Request<Bytes>> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
{
    type Output = PendingRequest<S::Response>;

    fn dispatch(&self, config: RequestConfig) -> Self::Output {
        let mut config = config.coalesce(&self.setting);
        config.interpolate(config.keep_trailing_slash != Some(true));
        let abort = Abort::hook(&mut config);
        tracing::debug!(method = %config.method, url = %config.url, abortable = abort.is_abortable(), "dispatch");

        let request = config.into_request(self.setting.origin());
        let service = CancelLayer.layer(self.service.clone());
        let future = Box::pin(async move {
            let request = request.map_err(|e| DispatchError::FailToMakeRequest(e.into_source()))?;
            service.oneshot(request).await
        });
        PendingRequest::new(future, abort)
    }
}

/// In-flight request returned by [`Httpi::dispatch`]. Awaiting it yields the response of the http client.
pub struct PendingRequest<R> {
    future: BoxFuture<'static, DispatchResult<R>>,
    abort: Abort,
}
impl<R> Debug for PendingRequest<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest").field("abort", &self.abort).finish_non_exhaustive()
    }
}

impl<R> PendingRequest<R> {
    pub fn new(future: BoxFuture<'static, DispatchResult<R>>, abort: Abort) -> Self {
        Self { future, abort }
    }

    /// Abort the request. When the timeout slot was occupied by the caller, only a warning is logged.
    pub fn abort(&self) {
        self.abort.abort()
    }

    /// Detached copy of the abort handle, usable after the request is moved into a task.
    pub fn abort_handle(&self) -> Abort {
        self.abort.clone()
    }

    pub fn into_parts(self) -> (BoxFuture<'static, DispatchResult<R>>, Abort) {
        (self.future, self.abort)
    }
}

impl<R> Future for PendingRequest<R> {
    type Output = DispatchResult<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use http::{header::AUTHORIZATION, HeaderValue, Uri};
    use tower::service_fn;

    use crate::{
        abort::{tests::CapturedLog, NOT_ABORTABLE},
        config::Verb,
        interface::helper::http_serde_priv,
        mapping::Mapping,
    };

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Recorder {
        requests: Arc<Mutex<Vec<http::Request<Bytes>>>>,
        delay: Duration,
    }
    impl Recorder {
        fn delayed(delay: Duration) -> Self {
            Self { delay, ..Default::default() }
        }
        fn uris(&self) -> Vec<String> {
            self.requests.lock().unwrap().iter().map(|r| r.uri().to_string()).collect()
        }
    }
    impl Service<http::Request<Bytes>> for Recorder {
        type Response = http::Response<String>;
        type Error = Infallible;
        type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<Bytes>) -> Self::Future {
            let (delay, uri) = (self.delay, req.uri().to_string());
            self.requests.lock().unwrap().push(req);
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(http::Response::new(uri))
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_interpolate() {
        let recorder = Recorder::default();
        let httpi = Httpi::new(recorder.clone());

        let config = RequestConfig::new("/users/:userID/posts/:postID/")
            .with_params([("userID", "1"), ("page", "2")])
            .with_data([("postID", "3")]);
        let res = httpi.dispatch(config).await.unwrap();
        assert_eq!(res.body(), "/users/1/posts/3?page=2");

        let config = RequestConfig::new("/users/:userID/").with_keep_trailing_slash(true);
        let res = httpi.dispatch(config).await.unwrap();
        assert_eq!(res.body(), "/users/");
        assert_eq!(recorder.uris(), vec!["/users/1/posts/3?page=2", "/users/"]);

        let request = &recorder.requests.lock().unwrap()[0];
        assert!(request.body().is_empty());
        assert_eq!(request.method(), http::Method::GET);
    }

    #[tokio::test]
    async fn test_dispatch_with_setting() {
        let recorder = Recorder::default();
        let mut headers = http::HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token"));
        let setting = Setting {
            headers: http_serde_priv::HeaderMap(headers),
            keep_trailing_slash: Some(true),
            ..Default::default()
        }
        .with_origin(Uri::from_static("http://localhost:3000/api"));
        let httpi = Httpi::with_setting(recorder.clone(), setting);

        let config = RequestConfig::new("/items/:id/").with_method(Verb::Delete).with_params([("id", 7)]);
        httpi.dispatch(config).await.unwrap();

        let request = &recorder.requests.lock().unwrap()[0];
        assert_eq!(request.uri(), "http://localhost:3000/api/items/7/");
        assert_eq!(request.method(), http::Method::DELETE);
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer token");
    }

    #[tokio::test]
    async fn test_dispatch_label_value_with_space() {
        let recorder = Recorder::default();
        let httpi = Httpi::new(recorder.clone());
        let config = RequestConfig::new("/users/:name").with_data([("name", "John Smith")]);
        let res = httpi.dispatch(config).await.unwrap();
        assert_eq!(res.body(), "/users/John%20Smith");

        let res = httpi.dispatch(RequestConfig::new("/search").with_params([("q", "John Smith")])).await.unwrap();
        assert_eq!(res.body(), "/search?q=John+Smith");
    }

    #[tokio::test]
    async fn test_dispatch_origin_with_url_in_query() {
        let setting = Setting::default().with_origin(Uri::from_static("http://localhost:3000"));
        let httpi = Httpi::with_setting(Recorder::default(), setting);
        let res = httpi.dispatch(RequestConfig::new("/login?next=http://x/y")).await.unwrap();
        assert_eq!(res.body(), "http://localhost:3000/login?next=http://x/y");
    }

    #[tokio::test]
    async fn test_resource_follows_setting_trailing_slash() {
        let setting = Setting { keep_trailing_slash: Some(true), ..Default::default() };
        let httpi = Httpi::with_setting(Recorder::default(), setting);
        let resource = httpi.resource("/users/");
        assert!(resource.keep_trailing_slash());
        assert_eq!(resource.get(None).await.unwrap().body(), "/users/");

        let resource = Httpi::new(Recorder::default()).resource("/users/");
        assert!(!resource.keep_trailing_slash());
        assert_eq!(resource.get(None).await.unwrap().body(), "/users");
    }

    #[tokio::test]
    async fn test_dispatch_abort() {
        let httpi = Httpi::new(Recorder::delayed(Duration::from_secs(60)));
        let pending = httpi.dispatch(RequestConfig::new("/wait"));

        let abort = pending.abort_handle();
        let handle = tokio::spawn(pending);
        tokio::time::sleep(Duration::from_millis(10)).await;
        abort.abort();

        let err = tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap().unwrap_err();
        assert!(err.is_aborted());
        assert!(abort.deferred().unwrap().is_resolved());
    }

    #[tokio::test]
    async fn test_dispatch_abort_attached() {
        let httpi = Httpi::new(Recorder::delayed(Duration::from_secs(60)));
        let pending = httpi.dispatch(RequestConfig::new("/wait"));
        pending.abort();
        assert!(pending.await.unwrap_err().is_aborted());
    }

    #[tokio::test]
    async fn test_dispatch_abort_after_settled() {
        let httpi = Httpi::new(Recorder::default());
        let (future, abort) = httpi.dispatch(RequestConfig::new("/done")).into_parts();
        let res = future.await.unwrap();
        abort.abort();
        abort.abort();
        assert_eq!(res.body(), "/done");
    }

    #[tokio::test]
    async fn test_dispatch_not_abortable() {
        let httpi = Httpi::new(Recorder::delayed(Duration::from_millis(30)));
        let pending = httpi.dispatch(RequestConfig::new("/wait").with_timeout(Duration::from_secs(5)));

        let log = CapturedLog::default();
        log.capture(|| pending.abort());
        assert!(log.contents().contains(NOT_ABORTABLE));

        let res = pending.await.unwrap();
        assert_eq!(res.body(), "/wait");
    }

    #[tokio::test]
    async fn test_dispatch_deadline() {
        let httpi = Httpi::new(Recorder::delayed(Duration::from_secs(60)));
        let pending = httpi.dispatch(RequestConfig::new("/wait").with_timeout(Duration::from_millis(20)));
        assert!(pending.await.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_dispatch_invalid_url() {
        let called = Arc::new(AtomicUsize::new(0));
        let counter = called.clone();
        let client = service_fn(move |_: http::Request<Bytes>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Infallible>(http::Response::new(())) }
        });
        let httpi = Httpi::new(client);

        let url = format!("/users/:id/{}", "a".repeat(u16::MAX as usize));
        let pending = httpi.dispatch(RequestConfig::new(url).with_data([("id", 1)]));
        let err = pending.await.unwrap_err();
        assert!(matches!(err, DispatchError::FailToMakeRequest(_)));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_residual_data_body() {
        let recorder = Recorder::default();
        let httpi = Httpi::new(recorder.clone());
        let config = RequestConfig::new("/users/:id").with_method(Verb::Post).with_data(Mapping::from([
            ("id", "5"),
            ("name", "hoge"),
        ]));
        httpi.dispatch(config).await.unwrap();

        let request = &recorder.requests.lock().unwrap()[0];
        assert_eq!(request.uri(), "/users/5");
        assert_eq!(request.method(), http::Method::POST);
        #[cfg(feature = "json")]
        assert_eq!(&request.body()[..], br#"{"name":"hoge"}"#);
        #[cfg(not(feature = "json"))]
        assert_eq!(&request.body()[..], b"name=hoge");
    }
}
