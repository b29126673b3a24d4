use core::any::Any;
use std::{backtrace::Backtrace, borrow::Cow};

use serde_json::Value;

use crate::{
    arguments::Arguments,
    error::{render, Error, Failure, Raised, Thrown, Unknown},
    func::Func,
    resultable::Resultable,
    settled::Settled,
};

/// What is known about an invocation before the callable runs.
#[derive(Debug, Clone, Default)]
pub(crate) struct Call {
    function: Cow<'static, str>,
    arguments: Vec<Value>,
    force_backtrace: bool,
}

impl Call {
    pub fn capture<F, A>(func: &F, args: &A, label: &'static str, force_backtrace: bool) -> Call
    where
        F: Func<A>,
        A: Arguments,
    {
        Call {
            function: func.name().unwrap_or(Cow::Borrowed(label)),
            arguments: args.snapshot(),
            force_backtrace,
        }
    }

    pub fn settle<R, E>(&self, output: R) -> Settled<R::Ok, E>
    where
        R: Resultable,
        R::Error: Into<E>,
        E: Failure,
    {
        match output.into_result() {
            Ok(value) => Settled::ok(value),
            Err(err) => {
                let err = err.into();
                tracing::trace!(
                    function = %self.function,
                    error = %err.message(),
                    "callable failed with a structured error"
                );
                Settled::err(err)
            }
        }
    }

    /// Turn an unwind payload into the error slot. Payloads that already are
    /// structured errors are moved out unchanged.
    pub fn classify<E>(self, payload: Box<dyn Any + Send>) -> E
    where
        E: Failure + From<Unknown>,
    {
        let payload = match payload.downcast::<E>() {
            Ok(err) => {
                tracing::trace!(function = %self.function, "structured error thrown");
                return *err;
            }
            Err(payload) => payload,
        };

        let payload = match payload.downcast::<Raised>() {
            Ok(raised) => {
                let error = match raised.into_failure::<E>().or_else(E::adopt) {
                    Ok(err) => {
                        tracing::trace!(function = %self.function, "structured error raised");
                        return err;
                    }
                    Err(error) => error,
                };
                return match error {
                    Error::Unknown(unknown) => E::from(unknown),
                    error => {
                        let thrown = Value::String(error.to_string());
                        self.wrap(Box::new(error), thrown)
                    }
                };
            }
            Err(payload) => payload,
        };

        let payload = match payload.downcast::<Unknown>() {
            Ok(unknown) => return E::from(*unknown),
            Err(payload) => payload,
        };

        match payload.downcast::<Thrown>() {
            Ok(thrown) => {
                let Thrown { value, json } = *thrown;
                self.wrap(value, json)
            }
            Err(payload) => {
                let thrown = render(&*payload);
                self.wrap(payload, thrown)
            }
        }
    }

    fn wrap<E>(self, payload: Box<dyn Any + Send>, thrown: Value) -> E
    where
        E: From<Unknown>,
    {
        let backtrace = if self.force_backtrace {
            Backtrace::force_capture()
        } else {
            Backtrace::capture()
        };

        let unknown = Unknown::new(self.function, self.arguments, payload, thrown, backtrace);
        tracing::debug!(
            function = %unknown.function(),
            thrown = %unknown.thrown(),
            "wrapped a thrown value that is not a structured error"
        );

        E::from(unknown)
    }
}
