use super::{reply::Reply, route::Params, Response, State};
use futures::future::{ready, BoxFuture, FutureExt};
use hyper::StatusCode;
use std::{future::Future, marker::PhantomData};

/// Request scoped context handed to every handler.
pub struct Ctx {
    /// Parameters parsed out of the matched path.
    pub params: Params,
    /// Shared application state.
    pub state: State,
}

pub trait Handler: Sync + Send {
    fn handle(&self, cx: Ctx) -> BoxFuture<'static, Response>;
}

#[derive(Copy, Clone)]
pub struct NotFound;

impl Handler for NotFound {
    fn handle(&self, _: Ctx) -> BoxFuture<'static, Response> {
        ready("404 page not found".with_status(StatusCode::NOT_FOUND)).boxed()
    }
}

pub struct HandlerFn<P, Fut> {
    fun: P,
    tag: PhantomData<fn(Fut)>,
}

impl<P: Fn(Ctx) -> Fut, Fut> HandlerFn<P, Fut> {
    pub fn new(fun: P) -> Self {
        Self {
            fun,
            tag: PhantomData,
        }
    }
}

impl<P, Fut, Resp> Handler for HandlerFn<P, Fut>
where
    P: Fn(Ctx) -> Fut + Sync + Send,
    Fut: Future<Output = Resp> + Send + 'static,
    Resp: Reply + 'static,
{
    fn handle(&self, cx: Ctx) -> BoxFuture<'static, Response> {
        (self.fun)(cx).map(Reply::into_response).boxed()
    }
}
