use core::{any::Any, future::Future};

use futures_core::future::BoxFuture;

use crate::{
    arguments::Arguments,
    error::{Failure, Unknown},
    func::Func,
    invoker::Invoker,
    resultable::Resultable,
    settled::Settled,
};

/// Runs blocking work off the async executor.
///
/// A panic in `func` must come back as `Err(payload)`; any other failure to
/// run it (a cancelled task, a runtime shutting down) should be reported as a
/// payload describing it.
pub trait Executor {
    fn spawn_blocking<F, R>(func: F) -> BoxFuture<'static, Result<R, Box<dyn Any + Send>>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static;
}

#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokio;

#[cfg(feature = "tokio")]
impl Executor for Tokio {
    fn spawn_blocking<F, R>(func: F) -> BoxFuture<'static, Result<R, Box<dyn Any + Send>>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        Box::pin(async move {
            tokio::task::spawn_blocking(func).await.map_err(|err| {
                if err.is_panic() {
                    err.into_panic()
                } else {
                    Box::new(err.to_string()) as Box<dyn Any + Send>
                }
            })
        })
    }
}

impl<E> Invoker<E>
where
    E: Failure + From<Unknown>,
{
    /// Invoke a synchronous callable on `X`'s blocking pool.
    pub fn invoke_blocking<X, F, A>(
        &self,
        func: F,
        args: A,
    ) -> impl Future<Output = Settled<<F::Output as Resultable>::Ok, E>> + Send + 'static
    where
        X: Executor + 'static,
        F: Func<A> + Send + 'static,
        F::Output: Resultable + Send + 'static,
        <F::Output as Resultable>::Error: Into<E>,
        A: Arguments + Send + 'static,
    {
        let call = self.capture(&func, &args);
        let task = X::spawn_blocking(move || func.call(args));

        async move {
            match task.await {
                Ok(output) => call.settle(output),
                Err(payload) => Settled::err(call.classify(payload)),
            }
        }
    }
}
