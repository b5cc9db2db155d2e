use std::{
    future::Future,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use tower::Service;

use crate::{
    dispatch::Httpi,
    error::{HttpiResult, IntoResult},
    interface::setting::Setting,
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Http client backed by [`reqwest`].
#[derive(Debug, Default)]
pub struct DefaultHttpClient<ReqB, ResB> {
    client: reqwest::Client,
    phantom: PhantomData<(ReqB, ResB)>,
}
impl<ReqB, ResB> Clone for DefaultHttpClient<ReqB, ResB> {
    fn clone(&self) -> Self {
        // derive(Clone) do not implement Clone when ReqB or ResB are not implement Clone
        // https://github.com/rust-lang/rust/issues/26925
        Self { client: self.client.clone(), phantom: PhantomData }
    }
}
impl<ReqB, ResB> DefaultHttpClient<ReqB, ResB> {
    pub fn new() -> HttpiResult<Self> {
        let client = reqwest::Client::builder().user_agent(APP_USER_AGENT).build().box_err()?;
        Ok(Self::with_client(client))
    }
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client, phantom: PhantomData }
    }
}

impl<ReqB, ResB> Service<http::Request<ReqB>> for DefaultHttpClient<ReqB, ResB>
where
    ReqB: Into<reqwest::Body>,
    ResB: From<reqwest::Body>,
{
    type Response = http::Response<ResB>;
    type Error = reqwest::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.client.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<ReqB>) -> Self::Future {
        match request.try_into() {
            Ok(req) => {
                let fut = self.client.call(req);
                Box::pin(async {
                    fut.await.map(|res| {
                        let (parts, incoming) = http::Response::<reqwest::Body>::from(res).into_parts();
                        http::Response::from_parts(parts, incoming.into())
                    })
                })
            }
            Err(e) => Box::pin(async { Err(e) }),
        }
    }
}

impl Httpi<DefaultHttpClient<Bytes, reqwest::Body>> {
    /// Dispatcher over a [`DefaultHttpClient`].
    pub fn default_client(setting: Setting) -> HttpiResult<Self> {
        Ok(Self::with_setting(DefaultHttpClient::new()?, setting))
    }
}
