use std::future::Future;

/// Application code bound to an endpoint: receives the decoded request value and produces the
/// value the endpoint's response encoder writes.
///
/// Implemented for any `Fn(A) -> Fut` where `Fut` is a `Send` future, so both `async fn` items
/// and closures returning `async` blocks can be used.
pub trait Handler<A>: Send + Sync {
    type Output;

    fn call(&self, args: A) -> impl Future<Output = Self::Output> + Send;
}

impl<F, Fut, A> Handler<A> for F
where
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future + Send,
{
    type Output = Fut::Output;

    #[inline]
    fn call(&self, args: A) -> impl Future<Output = Self::Output> + Send {
        (self)(args)
    }
}
