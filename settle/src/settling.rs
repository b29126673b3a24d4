use core::{
    any::Any,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};
use std::panic::{self, AssertUnwindSafe};

use pin_project_lite::pin_project;

use crate::{
    call::Call,
    error::{Failure, Unknown},
    resultable::Resultable,
    settled::Settled,
};

pin_project! {
    #[project = StateProj]
    enum State<F> {
        Thrown {
            payload: Option<Box<dyn Any + Send>>,
        },
        Pending {
            #[pin]
            future: F,
        },
    }
}

pin_project! {
    /// Future returned by [`invoke_async`](crate::invoke_async). Resolves to a
    /// [`Settled`] once the wrapped future completes; it never unwinds.
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Settling<F, E> {
        #[pin]
        state: State<F>,
        call: Call,
        _error: PhantomData<fn() -> E>,
    }
}

impl<F, E> Settling<F, E> {
    pub(crate) fn pending(future: F, call: Call) -> Self {
        Settling {
            state: State::Pending { future },
            call,
            _error: PhantomData,
        }
    }

    pub(crate) fn thrown(payload: Box<dyn Any + Send>, call: Call) -> Self {
        Settling {
            state: State::Thrown {
                payload: Some(payload),
            },
            call,
            _error: PhantomData,
        }
    }
}

impl<F, E> Future for Settling<F, E>
where
    F: Future,
    F::Output: Resultable,
    <F::Output as Resultable>::Error: Into<E>,
    E: Failure + From<Unknown>,
{
    type Output = Settled<<F::Output as Resultable>::Ok, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        match this.state.project() {
            StateProj::Thrown { payload } => {
                let payload = payload.take().expect("Settling polled after completion");
                Poll::Ready(Settled::err(core::mem::take(this.call).classify(payload)))
            }
            StateProj::Pending { future } => {
                match panic::catch_unwind(AssertUnwindSafe(|| future.poll(cx))) {
                    Ok(Poll::Pending) => Poll::Pending,
                    Ok(Poll::Ready(output)) => Poll::Ready(this.call.settle(output)),
                    Err(payload) => {
                        Poll::Ready(Settled::err(core::mem::take(this.call).classify(payload)))
                    }
                }
            }
        }
    }
}
