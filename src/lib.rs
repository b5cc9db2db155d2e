//! Url interpolation and abortable request dispatch over [`tower::Service`] http clients.
//!
//! # Url interpolation
//! A url template carries `:label` substitution points. Before a request is issued, each label is replaced by
//! the value of the same key in the request `data` or, failing that, in the request `params`. Consumed keys are
//! removed, so whatever is left in `params` becomes the query string and whatever is left in `data` becomes the
//! body.
//! ```
//! use httpi::{interpolate::interpolate_url, Mapping};
//!
//! let mut params = Mapping::from([("id", 1), ("page", 2)]);
//! let mut data = Mapping::from([("id", 42)]);
//! let url = interpolate_url("/users/:id/", &mut params, &mut data, true);
//! assert_eq!(url, "/users/42");
//! assert!(data.is_empty());
//! assert_eq!(params, Mapping::from([("id", 1), ("page", 2)]));
//! ```
//! Parenthesis and pipes only document alternative paths and are stripped, repeated slashes are collapsed
//! (except in `scheme://`) and the trailing slash is removed unless it is asked to be kept.
//!
//! # Dispatch
//! [`Httpi`] wraps any http client implementing `Service<http::Request<Bytes>>`. Each dispatched request can be
//! aborted through the returned [`PendingRequest`], unless the caller already filled the timeout slot of the
//! [`RequestConfig`] by itself.
//!
//! # Resource
//! [`Resource`] binds one url and exposes one method per verb: `get`, `post`, `put`, `delete`, `head`, `jsonp`.
//!
//! # Features
//! - `json`, `yaml`, `toml`: formats of [`Setting`] files. `json` also encodes remaining data as a json body.
//! - `default-http-client`: [`reqwest`] backed client, see `service::client::DefaultHttpClient`.

pub mod abort;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod interface;
pub mod interpolate;
pub mod mapping;
pub mod resource;
pub mod service;

pub use {
    abort::Abort,
    config::{RequestConfig, Timeout, Verb},
    dispatch::{Dispatch, Httpi, PendingRequest},
    error::{DispatchError, HttpiError as Error, HttpiResult as Result},
    interface::setting::Setting,
    mapping::Mapping,
    resource::Resource,
};
