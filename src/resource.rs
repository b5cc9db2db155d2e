use crate::{
    config::{RequestConfig, Verb},
    dispatch::Dispatch,
    interface::helper::coalesce::Coalesce,
    mapping::Mapping,
};

/// Marker that the jsonp transport replaces with the name of its callback.
pub const JSONP_CALLBACK: &str = "JSON_CALLBACK";
pub const JSONP_CALLBACK_PARAM: &str = "callback";

/// Fixed url shared by requests of every verb.
#[derive(Debug, Clone)]
pub struct Resource<D> {
    http: D,
    url: String,
    keep_trailing_slash: bool,
}

impl<D> Resource<D> {
    pub fn new<U: Into<String>>(http: D, url: U) -> Self {
        Self { http, url: url.into(), keep_trailing_slash: false }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn keep_trailing_slash(&self) -> bool {
        self.keep_trailing_slash
    }
    pub fn set_keep_trailing_slash(&mut self, keep_trailing_slash: bool) -> &mut Self {
        self.keep_trailing_slash = keep_trailing_slash;
        self
    }

    /// Configuration that is dispatched for `verb`. The bound url and the verb always override the given ones.
    pub fn prepare(&self, verb: Verb, config: Option<RequestConfig>) -> RequestConfig {
        let mut config = config.unwrap_or_default();
        config.method = verb;
        config.url = self.url.clone();
        config.keep_trailing_slash = config.keep_trailing_slash.coalesce(&Some(self.keep_trailing_slash));
        if verb == Verb::Jsonp {
            self.param_jsonp_callback(&mut config);
        }
        config
    }

    fn param_jsonp_callback(&self, config: &mut RequestConfig) {
        if self.url.contains(JSONP_CALLBACK) {
            return;
        }
        let params = config.params.get_or_insert_with(Mapping::new);
        if !params.contains_value(JSONP_CALLBACK) {
            tracing::trace!(url = %self.url, "inject jsonp callback param");
            params.set(JSONP_CALLBACK_PARAM, JSONP_CALLBACK);
        }
    }
}

impl<D: Dispatch> Resource<D> {
    pub fn request(&self, verb: Verb, config: Option<RequestConfig>) -> D::Output {
        self.http.dispatch(self.prepare(verb, config))
    }

    pub fn get(&self, config: Option<RequestConfig>) -> D::Output {
        self.request(Verb::Get, config)
    }
    pub fn post(&self, config: Option<RequestConfig>) -> D::Output {
        self.request(Verb::Post, config)
    }
    pub fn put(&self, config: Option<RequestConfig>) -> D::Output {
        self.request(Verb::Put, config)
    }
    pub fn delete(&self, config: Option<RequestConfig>) -> D::Output {
        self.request(Verb::Delete, config)
    }
    pub fn head(&self, config: Option<RequestConfig>) -> D::Output {
        self.request(Verb::Head, config)
    }
    pub fn jsonp(&self, config: Option<RequestConfig>) -> D::Output {
        self.request(Verb::Jsonp, config)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::{Arc, Mutex},
    };

    use bytes::Bytes;
    use tower::service_fn;

    use crate::dispatch::Httpi;

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Prepared(Arc<Mutex<Vec<RequestConfig>>>);
    impl Dispatch for Prepared {
        type Output = usize;
        fn dispatch(&self, config: RequestConfig) -> Self::Output {
            let mut configs = self.0.lock().unwrap();
            configs.push(config);
            configs.len()
        }
    }
    impl Prepared {
        fn last(&self) -> RequestConfig {
            self.0.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[test]
    fn test_verbs_override_method_and_url() {
        let prepared = Prepared::default();
        let resource = Resource::new(prepared.clone(), "/users/:id");

        let verbs: [(Verb, fn(&Resource<Prepared>, Option<RequestConfig>) -> usize); 6] = [
            (Verb::Get, Resource::get),
            (Verb::Post, Resource::post),
            (Verb::Put, Resource::put),
            (Verb::Delete, Resource::delete),
            (Verb::Head, Resource::head),
            (Verb::Jsonp, Resource::jsonp),
        ];
        for (i, (verb, call)) in verbs.into_iter().enumerate() {
            let config = RequestConfig::new("/ignored").with_method(Verb::Put);
            assert_eq!(call(&resource, Some(config)), i + 1);
            let last = prepared.last();
            assert_eq!(last.method, verb);
            assert_eq!(last.url, "/users/:id");
            assert_eq!(last.keep_trailing_slash, Some(false));
        }
    }

    #[test]
    fn test_keep_trailing_slash() {
        let prepared = Prepared::default();
        let mut resource = Resource::new(prepared.clone(), "/users/");
        assert!(!resource.keep_trailing_slash());

        resource.set_keep_trailing_slash(true).get(None);
        assert_eq!(prepared.last().keep_trailing_slash, Some(true));

        resource.get(Some(RequestConfig::default().with_keep_trailing_slash(false)));
        assert_eq!(prepared.last().keep_trailing_slash, Some(false));
        assert!(resource.keep_trailing_slash());
    }

    #[test]
    fn test_jsonp_injects_callback() {
        let resource = Resource::new(Prepared::default(), "/api/posts");

        let config = resource.prepare(Verb::Jsonp, None);
        assert_eq!(config.params, Some(Mapping::from([("callback", JSONP_CALLBACK)])));

        let config = resource.prepare(Verb::Jsonp, Some(RequestConfig::default().with_params([("page", 1)])));
        assert_eq!(config.params, Some(Mapping::from([("page", "1"), ("callback", JSONP_CALLBACK)])));
        assert_eq!(config.params.unwrap().values().filter(|v| *v == JSONP_CALLBACK).count(), 1);
    }

    #[test]
    fn test_jsonp_callback_already_present() {
        let resource = Resource::new(Prepared::default(), "/api/posts?cb=JSON_CALLBACK");
        let config = resource.prepare(Verb::Jsonp, None);
        assert_eq!(config.params, None);

        let resource = Resource::new(Prepared::default(), "/api/posts");
        let params = Mapping::from([("cb", JSONP_CALLBACK)]);
        let config = resource.prepare(Verb::Jsonp, Some(RequestConfig::default().with_params(params.clone())));
        assert_eq!(config.params, Some(params));
    }

    #[test]
    fn test_callback_only_for_jsonp() {
        let resource = Resource::new(Prepared::default(), "/api/posts");
        assert_eq!(resource.prepare(Verb::Get, None).params, None);
    }

    #[tokio::test]
    async fn test_resource_dispatch() {
        let client = service_fn(|req: http::Request<Bytes>| async move {
            Ok::<_, Infallible>(http::Response::new(format!("{} {}", req.method(), req.uri())))
        });
        let httpi = Httpi::new(client);
        let mut resource = httpi.resource("/users/:id/");

        let res = resource.get(Some(RequestConfig::default().with_params([("id", 1)]))).await.unwrap();
        assert_eq!(res.body(), "GET /users/1");

        let res = resource.set_keep_trailing_slash(true).delete(None).await.unwrap();
        assert_eq!(res.body(), "DELETE /users/");

        let res = httpi.resource("/posts").jsonp(None).await.unwrap();
        assert_eq!(res.body(), "GET /posts?callback=JSON_CALLBACK");
    }
}
