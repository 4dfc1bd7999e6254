//! A calculator that reads its expressions from the request path and keeps a browsable history.
//!
//! ```no_run
//! use hypercalc::{history::MemoryStore, App};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> hyper::Result<()> {
//!     let app = Arc::new(App::new(Arc::new(MemoryStore::new())));
//!
//!     // GET /5/plus/3/minus/2 => {"question":"5 + 3 - 2","answer":6}
//!     // GET /history          => the latest 20 expressions, as html
//!     // GET /                 => every expression, as html
//!     app.clone()
//!         .serve(([127, 0, 0, 1], 3000).into(), tokio::signal::ctrl_c())
//!         .await?;
//!
//!     app.shutdown().await;
//!     Ok(())
//! }
//! ```

use futures::future::{Future, FutureExt};
use handler::{Handler, HandlerFn, NotFound};
use http::Method;
use hyper::{
    server::{conn::AddrStream, Server},
    service::{make_service_fn, service_fn},
    Body,
};
use std::{convert::Infallible, net::SocketAddr, sync::Arc};

pub mod api;
pub mod config;
pub mod eval;
mod handler;
pub mod history;
pub mod reply;
pub mod route;
pub mod view;

#[doc(inline)]
pub use handler::Ctx;

use history::{HistoryStore, Recorder};
use reply::Reply;
use route::{PathSpec, Router};

/// An http request.
pub type Request = hyper::Request<Body>;

/// An http response.
pub type Response = hyper::Response<Body>;

/// State shared by every request.
#[derive(Clone)]
pub struct State {
    /// The store history is read from.
    pub store: Arc<dyn HistoryStore>,
    /// The writer history is appended through.
    pub recorder: Recorder,
}

/// The calculator application.
pub struct App {
    router: Router<Box<dyn Handler>>,
    not_found: Box<dyn Handler>,
    state: State,
}

impl App {
    /// Create an app serving the calculator routes, reading history from and appending history
    /// to `store`.
    ///
    /// # Panics
    /// This panics if called outside of a tokio runtime.
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self::empty(store)
            .get(api::index_path(), api::index)
            .get(api::history_path(), api::history)
            .get(api::compute_path(), api::compute)
    }

    /// Create an app with no routes.
    ///
    /// # Panics
    /// This panics if called outside of a tokio runtime.
    pub fn empty(store: Arc<dyn HistoryStore>) -> Self {
        let recorder = Recorder::spawn(store.clone());

        Self {
            router: Router::default(),
            not_found: Box::new(NotFound),
            state: State { store, recorder },
        }
    }

    /// Register a handler for GET requests matching `spec`. Routes are matched in the order
    /// they were registered.
    pub fn get<P, Fut, R>(self, spec: PathSpec, handler: P) -> Self
    where
        P: Fn(Ctx) -> Fut + Sync + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Reply + 'static,
    {
        self.route(Method::GET, spec, handler)
    }

    /// Register a handler for `method` requests matching `spec`.
    pub fn route<P, Fut, R>(mut self, method: Method, spec: PathSpec, handler: P) -> Self
    where
        P: Fn(Ctx) -> Fut + Sync + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Reply + 'static,
    {
        (self.router).insert(method, spec, Box::new(HandlerFn::new(handler)));
        self
    }

    /// Dispatch a request from `addr`, producing a response.
    pub async fn dispatch(&self, req: Request, addr: SocketAddr) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let fut = match self.router.lookup(&method, &path) {
            Some((handler, params)) => handler.handle(Ctx {
                params,
                state: self.state.clone(),
            }),

            None => self.not_found.handle(Ctx {
                params: Default::default(),
                state: self.state.clone(),
            }),
        };

        let resp = fut.await;

        tracing::debug!(
            %addr,
            %method,
            %path,
            status = resp.status().as_u16(),
            "handled request"
        );

        resp
    }

    /// Bind to `addr` and serve requests until `signal` resolves, then finish any in-flight
    /// requests and return.
    ///
    /// This does not stop the history writer; see [App::shutdown].
    pub async fn serve<F>(self: Arc<Self>, addr: SocketAddr, signal: F) -> hyper::Result<()>
    where F: Future + Send + 'static {
        let make_svc = make_service_fn(move |conn: &AddrStream| {
            let app = self.clone();
            let remote = conn.remote_addr();

            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let app = app.clone();
                    async move { Ok::<_, Infallible>(app.dispatch(req, remote).await) }
                }))
            }
        });

        let server = Server::try_bind(&addr)?.serve(make_svc);
        tracing::info!("listening on http://{}", server.local_addr());

        server.with_graceful_shutdown(signal.map(|_| ())).await
    }

    /// Write any history still queued and close the store. Expressions computed after this
    /// point are no longer persisted.
    pub async fn shutdown(&self) {
        self.state.recorder.shutdown().await;
    }

    /// Returns a test client for this app.
    pub fn test_client(self) -> test::Client {
        test::Client { app: self }
    }
}
