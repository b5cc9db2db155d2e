use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::{
    config::Timeout,
    error::{BoxError, DispatchError, DispatchResult},
};

/// Make the inner http client observe the [`Timeout`] slot stored in the request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct CancelLayer;

impl<S> Layer<S> for CancelLayer {
    type Service = CancelService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CancelService { inner }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct CancelService<S> {
    inner: S,
}

impl<S> CancelService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, B> Service<http::Request<B>> for CancelService<S>
where
    S: Service<http::Request<B>>,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
{
    type Response = S::Response;
    type Error = DispatchError;
    type Future = BoxFuture<'static, DispatchResult<Self::Response>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(|e| DispatchError::NoReady(e.into()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let timeout = req.extensions().get::<Timeout>().cloned();
        let fut = self.inner.call(req);
        Box::pin(async move {
            let response = async { fut.await.map_err(|e| DispatchError::InnerServiceError(e.into())) };
            match timeout {
                None => response.await,
                Some(Timeout::Deadline(d)) => {
                    tokio::time::timeout(d, response).await.unwrap_or(Err(DispatchError::Timeout(d)))
                }
                // once the response is settled the signal is no longer observed
                Some(Timeout::Signal(signal)) => tokio::select! {
                    biased;
                    _ = signal.cancelled() => Err(DispatchError::Aborted),
                    result = response => result,
                },
            }
        })
    }
}
