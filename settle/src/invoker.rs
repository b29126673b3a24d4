use core::{fmt, marker::PhantomData};
use std::panic::{self, AssertUnwindSafe};

use crate::{
    arguments::Arguments,
    call::Call,
    error::{Error, Failure, Unknown},
    func::Func,
    resultable::Resultable,
    settled::Settled,
};

#[cfg(feature = "async")]
use crate::settling::Settling;

pub const ANONYMOUS: &str = "anonymous function";

/// Invokes callables and settles their outcome into a [`Settled`].
///
/// `E` is the structured error type of the error slot. Errors [`raise`]d as
/// `E`, or adopted by it, pass through untouched; everything else is wrapped
/// in [`Unknown`] and converted with `E::from`.
///
/// [`raise`]: crate::raise
pub struct Invoker<E = Error> {
    label: &'static str,
    force_backtrace: bool,
    _error: PhantomData<fn() -> E>,
}

impl<E> Clone for Invoker<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Invoker<E> {}

impl<E> fmt::Debug for Invoker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("label", &self.label)
            .field("force_backtrace", &self.force_backtrace)
            .finish()
    }
}

impl<E> Default for Invoker<E> {
    fn default() -> Self {
        Invoker {
            label: ANONYMOUS,
            force_backtrace: false,
            _error: PhantomData,
        }
    }
}

impl Invoker {
    pub const fn new() -> Invoker {
        Invoker {
            label: ANONYMOUS,
            force_backtrace: false,
            _error: PhantomData,
        }
    }
}

impl<E> Invoker<E> {
    /// Label used in place of a name for callables that have none.
    pub fn anonymous_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Capture a backtrace for wrapped values even when `RUST_BACKTRACE` is
    /// not set.
    pub fn force_backtrace(mut self, force: bool) -> Self {
        self.force_backtrace = force;
        self
    }

    /// Switch the error slot to another structured error type.
    pub fn error<E2>(self) -> Invoker<E2> {
        Invoker {
            label: self.label,
            force_backtrace: self.force_backtrace,
            _error: PhantomData,
        }
    }

    pub(crate) fn capture<F, A>(&self, func: &F, args: &A) -> Call
    where
        F: Func<A>,
        A: Arguments,
    {
        Call::capture(func, args, self.label, self.force_backtrace)
    }
}

impl<E> Invoker<E>
where
    E: Failure + From<Unknown>,
{
    pub fn invoke<F, A>(
        &self,
        func: F,
        args: A,
    ) -> Settled<<F::Output as Resultable>::Ok, E>
    where
        F: Func<A>,
        F::Output: Resultable,
        <F::Output as Resultable>::Error: Into<E>,
        A: Arguments,
    {
        let call = self.capture(&func, &args);

        match panic::catch_unwind(AssertUnwindSafe(move || func.call(args))) {
            Ok(output) => call.settle(output),
            Err(payload) => Settled::err(call.classify(payload)),
        }
    }

    #[cfg(feature = "async")]
    pub fn invoke_async<F, A>(&self, func: F, args: A) -> Settling<F::Output, E>
    where
        F: Func<A>,
        F::Output: core::future::Future,
        <F::Output as core::future::Future>::Output: Resultable,
        <<F::Output as core::future::Future>::Output as Resultable>::Error: Into<E>,
        A: Arguments,
    {
        let call = self.capture(&func, &args);

        match panic::catch_unwind(AssertUnwindSafe(move || func.call(args))) {
            Ok(future) => Settling::pending(future, call),
            Err(payload) => Settling::thrown(payload, call),
        }
    }
}

/// Invoke a synchronous callable with `args` spread positionally.
///
/// ```
/// use settle::{invoke, throw};
///
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
///
/// assert_eq!(invoke(add, (5, 7)).into_pair().1, Some(12));
///
/// let (error, value) = invoke(|| -> i32 { throw(404) }, ()).into_pair();
/// assert!(value.is_none());
/// assert!(error.unwrap().to_string().contains("404"));
/// ```
pub fn invoke<F, A>(func: F, args: A) -> Settled<<F::Output as Resultable>::Ok, Error>
where
    F: Func<A>,
    F::Output: Resultable,
    <F::Output as Resultable>::Error: Into<Error>,
    A: Arguments,
{
    Invoker::new().invoke(func, args)
}

/// Invoke an asynchronous callable; the returned future settles once the
/// callable's future completes.
#[cfg(feature = "async")]
pub fn invoke_async<F, A>(func: F, args: A) -> Settling<F::Output, Error>
where
    F: Func<A>,
    F::Output: core::future::Future,
    <F::Output as core::future::Future>::Output: Resultable,
    <<F::Output as core::future::Future>::Output as Resultable>::Error: Into<Error>,
    A: Arguments,
{
    Invoker::new().invoke_async(func, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{raise, throw},
        func::named,
    };
    use serde_json::json;

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    fn fails(code: u16) -> Result<u16, Error> {
        Err(Error::msg(format!("failed with {code}")))
    }

    fn explode() -> u8 {
        throw("kaboom")
    }

    #[test]
    fn returns_value() {
        let (error, value) = invoke(|| 42, ()).into_pair();
        assert!(error.is_none());
        assert_eq!(value, Some(42));
    }

    #[test]
    fn falsy_values_are_success() {
        assert_eq!(invoke(|| 0, ()).into_pair().1, Some(0));
        assert_eq!(invoke(|| false, ()).into_pair().1, Some(false));
        assert_eq!(invoke(|| "", ()).into_pair().1, Some(""));
        assert_eq!(invoke(Vec::<u8>::new, ()).into_pair().1, Some(vec![]));
        assert_eq!(invoke(|| Option::<u8>::None, ()).into_pair().1, Some(None));
        assert_eq!(invoke(|| (), ()).into_pair().1, Some(()));
        assert_eq!(invoke(|| json!({}), ()).into_pair().1, Some(json!({})));
    }

    #[test]
    fn spreads_arguments() {
        assert_eq!(invoke(add, (5, 7)).into_result().ok(), Some(12));
    }

    #[test]
    fn function_value_is_a_plain_success() {
        let settled = invoke(|| Box::new(|x: i32| x * 2) as Box<dyn Fn(i32) -> i32>, ());
        let double = settled.into_result().ok().expect("success");
        assert_eq!(double(21), 42);
    }

    #[test]
    fn returned_error_passes_through() {
        let (error, value) = invoke(fails, (7,)).into_pair();
        assert!(value.is_none());
        let error = error.expect("error");
        assert!(error.as_unknown().is_none());
        assert_eq!(error.to_string(), "failed with 7");
    }

    #[test]
    fn thrown_structured_error_keeps_identity() {
        let err = Error::new(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let addr = err.downcast_ref::<std::io::Error>().expect("io") as *const std::io::Error;

        let settled = invoke(move || -> u8 { raise(err) }, ());
        let error = settled.into_pair().0.expect("error");
        let back = error.downcast_ref::<std::io::Error>().expect("io") as *const std::io::Error;
        assert_eq!(addr, back);
    }

    #[test]
    fn returned_std_error_converts() {
        let (error, value) = invoke(
            || -> Result<u8, std::io::Error> { Err(std::io::Error::other("x")) },
            (),
        )
        .into_pair();
        assert!(value.is_none());
        let error = error.expect("error");
        assert!(error.as_unknown().is_none());
        assert!(error.is::<std::io::Error>());
        assert_eq!(error.to_string(), "x");
    }

    #[test]
    fn raised_std_error_passes_through() {
        let error = invoke(
            || -> u8 { raise(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")) },
            (),
        )
        .into_pair()
        .0
        .expect("error");
        assert!(error.as_unknown().is_none());
        assert_eq!(
            error.downcast_ref::<std::io::Error>().map(|e| e.kind()),
            Some(std::io::ErrorKind::NotFound)
        );
    }

    #[test]
    fn thrown_serializable_value_is_rendered() {
        #[derive(Debug, Clone, PartialEq, serde::Serialize)]
        struct Reply {
            status: u16,
            retry: bool,
        }

        let error = invoke(|| -> u8 { throw(Reply { status: 503, retry: true }) }, ())
            .into_pair()
            .0
            .expect("error");
        let unknown = error.as_unknown().expect("unknown");
        assert_eq!(unknown.thrown(), &json!({"status": 503, "retry": true}));
        assert!(unknown.message().contains(r#""error":{"status":503,"retry":true}"#));
        assert_eq!(unknown.cause::<Reply>(), Some(Reply { status: 503, retry: true }));
    }

    #[test]
    fn thrown_string_is_wrapped() {
        let error = invoke(|| -> u8 { throw("String error") }, ())
            .into_pair()
            .0
            .expect("error");
        let message = error.to_string();
        assert!(message.contains("Unknown error"));
        assert!(message.contains("String error"));
        assert!(message.contains("anonymous function"));
        assert_eq!(error.as_unknown().and_then(|u| u.cause::<&str>()), Some("String error"));
    }

    #[test]
    fn thrown_number_is_wrapped() {
        let error = invoke(|| -> u8 { throw(404) }, ()).into_pair().0.expect("error");
        assert!(error.to_string().contains("404"));
        assert_eq!(error.as_unknown().and_then(|u| u.cause::<i32>()), Some(404));
    }

    #[test]
    fn thrown_unit_and_null_are_wrapped() {
        let error = invoke(|| -> u8 { throw(()) }, ()).into_pair().0.expect("error");
        let unknown = error.as_unknown().expect("unknown");
        assert!(unknown.cause_is::<()>());
        assert!(unknown.message().contains(r#""error":null"#));

        let error = invoke(|| -> u8 { throw(serde_json::Value::Null) }, ())
            .into_pair()
            .0
            .expect("error");
        let unknown = error.as_unknown().expect("unknown");
        assert_eq!(unknown.cause::<serde_json::Value>(), Some(serde_json::Value::Null));
    }

    #[test]
    fn thrown_object_is_wrapped() {
        let error = invoke(|| -> u8 { throw(json!({"code": 7})) }, ())
            .into_pair()
            .0
            .expect("error");
        assert!(error.to_string().contains(r#"{"code":7}"#));
    }

    #[test]
    fn panics_are_caught() {
        let error = invoke(|| -> u8 { panic!("plain panic") }, ())
            .into_pair()
            .0
            .expect("error");
        assert!(error.to_string().contains("plain panic"));
    }

    #[test]
    fn named_function_in_message() {
        let error = invoke(explode, ()).into_pair().0.expect("error");
        let unknown = error.as_unknown().expect("unknown");
        assert_eq!(unknown.function(), "explode");
        assert!(unknown.message().contains("Unknown error: from explode"));

        let error = invoke(named("boom", || -> u8 { throw(1) }), ())
            .into_pair()
            .0
            .expect("error");
        assert!(error.to_string().contains("Unknown error: from boom"));
    }

    #[test]
    fn arguments_are_recorded() {
        let error = invoke(|a: i32, b: &str| -> u8 { throw(format!("{a}{b}")) }, (1, "x"))
            .into_pair()
            .0
            .expect("error");
        let unknown = error.as_unknown().expect("unknown");
        assert_eq!(unknown.arguments(), &[json!(1), json!("x")]);
        assert_eq!(unknown.thrown(), &json!("1x"));
    }

    #[test]
    fn custom_label() {
        let invoker = Invoker::new().anonymous_label("<lambda>");
        let error = invoker
            .invoke(|| -> u8 { throw(0) }, ())
            .into_pair()
            .0
            .expect("error");
        assert!(error.to_string().contains("Unknown error: from <lambda>"));
    }

    #[derive(Debug, thiserror::Error)]
    enum AppError {
        #[error("not found: {0}")]
        NotFound(String),
        #[error(transparent)]
        Unknown(#[from] Unknown),
    }

    impl Failure for AppError {}

    #[test]
    fn custom_error_type() {
        let invoker = Invoker::new().error::<AppError>();

        let settled = invoker.invoke(
            |key: &str| -> Result<u8, AppError> { Err(AppError::NotFound(key.into())) },
            ("k",),
        );
        assert!(matches!(settled.error(), Some(AppError::NotFound(key)) if key == "k"));

        let settled = invoker.invoke(
            || -> Result<u8, AppError> { raise(AppError::NotFound("t".into())) },
            (),
        );
        assert!(matches!(settled.error(), Some(AppError::NotFound(_))));

        let settled = invoker.invoke(
            || -> Result<u8, AppError> { raise(std::io::Error::other("io")) },
            (),
        );
        match settled.into_pair().0 {
            Some(AppError::Unknown(unknown)) => {
                assert!(unknown.cause_is::<Error>());
                assert_eq!(unknown.thrown(), &json!("io"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let settled = invoker.invoke(|| -> Result<u8, AppError> { throw(5u64) }, ());
        match settled.into_pair().0 {
            Some(AppError::Unknown(unknown)) => assert_eq!(unknown.cause::<u64>(), Some(5)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
