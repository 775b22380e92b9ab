//! Ordered interceptor chains.
//!
//! A [`Chain`] is an immutable list of named [`Interceptor`]s. Applying it to
//! a router wraps the routes so that the first interceptor sees the request
//! first and the response last: `[a, b, c]` around `h` behaves as
//! `a(b(c(h)))`. Any interceptor may answer on its own, in which case the
//! rest of the chain and the handler never run.

use axum::{Router, extract::Request, response::IntoResponse, routing::Route};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tower::{Layer, Service};

/// How a layer is attached to a router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Every route plus the fallback (`Router::layer`)
    Router,
    /// Matched routes only (`Router::route_layer`)
    Routes,
}

type Attach<S> = dyn Fn(Router<S>, Scope) -> Router<S> + Send + Sync;

/// A named request interceptor, usually an `axum::middleware::from_fn` layer
pub struct Interceptor<S> {
    name: &'static str,
    attach: Arc<Attach<S>>,
}

impl<S> Interceptor<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new<L>(name: &'static str, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        let attach = move |router: Router<S>, scope: Scope| match scope {
            Scope::Router => router.layer(layer.clone()),
            Scope::Routes => router.route_layer(layer.clone()),
        };
        Self { name, attach: Arc::new(attach) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<S> Clone for Interceptor<S> {
    fn clone(&self) -> Self {
        Self { name: self.name, attach: Arc::clone(&self.attach) }
    }
}

impl<S> fmt::Debug for Interceptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Interceptor").field(&self.name).finish()
    }
}

/// An immutable, ordered sequence of interceptors
pub struct Chain<S> {
    interceptors: Vec<Interceptor<S>>,
}

impl<S> Chain<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(interceptors: impl IntoIterator<Item = Interceptor<S>>) -> Self {
        Self { interceptors: interceptors.into_iter().collect() }
    }

    /// A new chain running `interceptors` after this chain's own.
    /// `self` is left untouched.
    #[must_use]
    pub fn append(&self, interceptors: impl IntoIterator<Item = Interceptor<S>>) -> Self {
        let mut combined = self.interceptors.clone();
        combined.extend(interceptors);
        Self { interceptors: combined }
    }

    /// A new chain running `other` after this chain
    #[must_use]
    pub fn extend(&self, other: &Chain<S>) -> Self {
        self.append(other.interceptors.iter().cloned())
    }

    /// Interceptor names, outermost first
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(Interceptor::name).collect()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Wrap the routes already registered on `routes`. Unmatched requests
    /// do not pass through the chain. `routes` must contain at least one route.
    pub fn then(&self, routes: Router<S>) -> Router<S> {
        self.attach(routes, Scope::Routes)
    }

    /// Wrap everything `router` serves, including its fallback
    pub fn wrap(&self, router: Router<S>) -> Router<S> {
        self.attach(router, Scope::Router)
    }

    // Layers added later sit further out, so attach innermost first.
    fn attach(&self, router: Router<S>, scope: Scope) -> Router<S> {
        self.interceptors
            .iter()
            .rev()
            .fold(router, |router, interceptor| (interceptor.attach)(router, scope))
    }
}

impl<S> Clone for Chain<S> {
    fn clone(&self) -> Self {
        Self { interceptors: self.interceptors.clone() }
    }
}

impl<S> fmt::Debug for Chain<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.interceptors.iter().map(|i| i.name)).finish()
    }
}
