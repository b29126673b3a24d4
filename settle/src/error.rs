use core::{any::Any, fmt};
use std::{
    backtrace::Backtrace,
    borrow::Cow,
    error::Error as StdError,
    sync::{Mutex, PoisonError},
};

use serde::Serialize;
use serde_json::Value;

/// The structured-error capability: something with a human readable message
/// and, optionally, the trace of where it was raised.
///
/// Implement this for your own error type (together with `From<Unknown>`) to
/// use it as the error slot of an [`Invoker`](crate::Invoker).
pub trait Failure: fmt::Debug + fmt::Display + Send + 'static {
    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn trace(&self) -> Option<&Backtrace> {
        None
    }

    /// Take over a structured error that was [`raise`]d as another type.
    /// Errors handed back are wrapped in [`Unknown`].
    fn adopt(error: Error) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Err(error)
    }
}

/// The default structured error: any `std::error::Error`, or an [`Unknown`].
///
/// Like `anyhow::Error` it does not implement `std::error::Error` itself, so
/// every error type converts into it with `?` or `.into()`.
#[derive(Debug)]
pub enum Error {
    Unknown(Unknown),
    Runtime(Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub fn new<E>(error: E) -> Error
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::from(error)
    }

    /// An error carrying only a message.
    pub fn msg<M: fmt::Display>(message: M) -> Error {
        Error::Runtime(message.to_string().into())
    }

    pub fn as_unknown(&self) -> Option<&Unknown> {
        match self {
            Error::Unknown(unknown) => Some(unknown),
            Error::Runtime(_) => None,
        }
    }

    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Borrow the wrapped error as its concrete type. The returned reference
    /// points at the same instance the callable raised.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        match self {
            Error::Unknown(unknown) => (unknown as &(dyn StdError + 'static)).downcast_ref(),
            Error::Runtime(inner) => inner.downcast_ref(),
        }
    }
}

impl<X> From<X> for Error
where
    X: StdError + Send + Sync + 'static,
{
    fn from(error: X) -> Self {
        let boxed: Box<dyn StdError + Send + Sync> = Box::new(error);
        match boxed.downcast::<Unknown>() {
            Ok(unknown) => Error::Unknown(*unknown),
            Err(boxed) => Error::Runtime(boxed),
        }
    }
}

impl From<Error> for Box<dyn StdError + Send + Sync> {
    fn from(error: Error) -> Self {
        match error {
            Error::Unknown(unknown) => Box::new(unknown),
            Error::Runtime(inner) => inner,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unknown(unknown) => fmt::Display::fmt(unknown, f),
            Error::Runtime(inner) => fmt::Display::fmt(inner, f),
        }
    }
}

impl Failure for Error {
    fn trace(&self) -> Option<&Backtrace> {
        match self {
            Error::Unknown(unknown) => Some(&unknown.backtrace),
            Error::Runtime(_) => None,
        }
    }

    fn adopt(error: Error) -> Result<Self, Error> {
        Ok(error)
    }
}

/// A thrown value that was not a structured error.
///
/// The message embeds the callable's label, the arguments it was called with
/// and a JSON rendering of the thrown value. The same pieces are also exposed
/// as fields, and the thrown value itself is kept as the cause.
pub struct Unknown {
    message: String,
    function: Cow<'static, str>,
    arguments: Vec<Value>,
    thrown: Value,
    payload: Mutex<Box<dyn Any + Send>>,
    backtrace: Backtrace,
}

#[derive(Serialize)]
struct Payload<'a> {
    message: String,
    args: &'a [Value],
    error: &'a Value,
}

impl Unknown {
    pub(crate) fn new(
        function: Cow<'static, str>,
        arguments: Vec<Value>,
        payload: Box<dyn Any + Send>,
        thrown: Value,
        backtrace: Backtrace,
    ) -> Unknown {
        let payload_message = Payload {
            message: format!("Unknown error: from {function}"),
            args: &arguments,
            error: &thrown,
        };
        let message = serde_json::to_string(&payload_message)
            .unwrap_or_else(|_| format!("Unknown error: from {function}"));

        Unknown {
            message,
            function,
            arguments,
            thrown,
            payload: Mutex::new(payload),
            backtrace,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the callable that threw, or the anonymous label.
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// JSON rendering of the thrown value.
    pub fn thrown(&self) -> &Value {
        &self.thrown
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// A copy of the thrown value, if it is a `T`.
    pub fn cause<T: Any + Clone>(&self) -> Option<T> {
        self.payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .downcast_ref::<T>()
            .cloned()
    }

    pub fn cause_is<T: Any>(&self) -> bool {
        self.payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is::<T>()
    }

    pub fn into_cause(self) -> Box<dyn Any + Send> {
        self.payload
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unknown")
            .field("function", &self.function)
            .field("arguments", &self.arguments)
            .field("thrown", &self.thrown)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Unknown {}

impl Failure for Unknown {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn trace(&self) -> Option<&Backtrace> {
        Some(&self.backtrace)
    }
}

pub(crate) const OPAQUE: &str = "[opaque value]";

macro_rules! render_as {
    ($payload: expr, $($ty: ty),*) => {
        $(
            if let Some(value) = $payload.downcast_ref::<$ty>() {
                return serde_json::to_value(value).unwrap_or(Value::Null);
            }
        )*
    };
}

/// Render a bare unwind payload, as left by `panic!` or `panic_any`.
pub(crate) fn render(payload: &(dyn Any + Send)) -> Value {
    if let Some(value) = payload.downcast_ref::<Value>() {
        return value.clone();
    }

    render_as!(
        payload,
        &'static str,
        String,
        Cow<'static, str>,
        (),
        bool,
        char,
        i8,
        i16,
        i32,
        i64,
        isize,
        u8,
        u16,
        u32,
        u64,
        usize,
        f32,
        f64
    );

    Value::String(OPAQUE.into())
}

/// Unwind payload of [`throw`]: the value and its JSON rendering.
pub(crate) struct Thrown {
    pub value: Box<dyn Any + Send>,
    pub json: Value,
}

trait Structured: Send {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
    fn into_error(self: Box<Self>) -> Error;
}

impl<X> Structured for X
where
    X: Into<Error> + Any + Send,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn into_error(self: Box<Self>) -> Error {
        (*self).into()
    }
}

/// Unwind payload of [`raise`].
pub(crate) struct Raised(Box<dyn Structured>);

impl Raised {
    /// The raised error as `E` when it is one, as an [`Error`] otherwise.
    pub fn into_failure<E: Any>(self) -> Result<E, Error> {
        if !(*self.0).as_any().is::<E>() {
            return Err(self.0.into_error());
        }

        self.0
            .into_any()
            .downcast::<E>()
            .map(|err| *err)
            .map_err(|_| Error::msg("raised error changed type"))
    }
}

/// Throw `value` as a value that is not a structured error.
///
/// It is serialized here, so its content shows up in the [`Unknown`] message,
/// and kept as the cause. Unwinds without running the panic hook, so nothing
/// is printed.
pub fn throw<T: Serialize + Any + Send>(value: T) -> ! {
    let json = serde_json::to_value(&value).unwrap_or_else(|_| Value::String(OPAQUE.into()));
    std::panic::resume_unwind(Box::new(Thrown {
        value: Box::new(value),
        json,
    }))
}

/// Raise a structured error.
///
/// Inside [`invoke`](crate::invoke) and friends it lands in the error slot
/// unchanged when it is the invoker's error type, or when that type
/// [adopts](Failure::adopt) it (the default [`Error`] adopts every error).
/// Unwinds without running the panic hook.
pub fn raise<X: Into<Error> + Any + Send>(error: X) -> ! {
    std::panic::resume_unwind(Box::new(Raised(Box::new(error))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unknown<T: Any + Send>(function: &'static str, arguments: Vec<Value>, value: T) -> Unknown {
        let thrown = render(&value);
        Unknown::new(
            Cow::Borrowed(function),
            arguments,
            Box::new(value),
            thrown,
            Backtrace::disabled(),
        )
    }

    fn io_error(text: &str) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, text.to_owned())
    }

    #[test]
    fn message_is_a_json_payload() {
        let err = unknown("add", vec![json!(5), json!(7)], 404);
        assert_eq!(
            err.message(),
            r#"{"message":"Unknown error: from add","args":[5,7],"error":404}"#
        );
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn renders_common_payloads() {
        assert_eq!(unknown("f", vec![], "text").thrown(), &json!("text"));
        assert_eq!(unknown("f", vec![], String::from("owned")).thrown(), &json!("owned"));
        assert_eq!(unknown("f", vec![], ()).thrown(), &Value::Null);
        assert_eq!(unknown("f", vec![], Value::Null).thrown(), &Value::Null);
        assert_eq!(unknown("f", vec![], 1.5f64).thrown(), &json!(1.5));
        assert_eq!(unknown("f", vec![], json!({"a": 1})).thrown(), &json!({"a": 1}));
    }

    #[test]
    fn opaque_payload_keeps_cause() {
        #[derive(Debug, Clone, PartialEq)]
        struct Token(u8);

        let err = unknown("f", vec![], Token(3));
        assert_eq!(err.thrown(), &json!(OPAQUE));
        assert!(err.cause_is::<Token>());
        assert_eq!(err.cause::<Token>(), Some(Token(3)));
        assert_eq!(err.cause::<u8>(), None);

        let cause = err.into_cause();
        assert_eq!(cause.downcast_ref::<Token>(), Some(&Token(3)));
    }

    #[test]
    fn runtime_error_downcasts_to_source() {
        let err = Error::new(io_error("disk"));
        assert!(err.is::<std::io::Error>());
        assert_eq!(err.to_string(), "disk");
        assert!(err.as_unknown().is_none());
        assert!(err.trace().is_none());
    }

    #[test]
    fn any_std_error_converts() {
        let err: Error = io_error("x").into();
        assert!(matches!(err, Error::Runtime(_)));
        assert_eq!(err.message(), "x");

        let boxed: Box<dyn StdError + Send + Sync> = err.into();
        assert_eq!(boxed.to_string(), "x");
    }

    #[test]
    fn msg_error_keeps_text() {
        let err = Error::msg("Test error");
        assert_eq!(err.message(), "Test error");
    }

    #[test]
    fn unknown_converts_into_error() {
        let err: Error = unknown("f", vec![], 1u8).into();
        assert!(err.as_unknown().is_some());
        assert!(err.is::<Unknown>());
        assert!(err.trace().is_some());
    }

    #[test]
    fn raised_error_keeps_its_type() {
        let raised = Raised(Box::new(io_error("gone")));
        let err = raised.into_failure::<std::io::Error>().expect("same type");
        assert_eq!(err.to_string(), "gone");

        let raised = Raised(Box::new(io_error("gone")));
        let err = raised.into_failure::<Unknown>().expect_err("other type");
        assert!(err.is::<std::io::Error>());
    }

    #[test]
    fn error_adopts_everything() {
        assert!(Error::adopt(Error::msg("a")).is_ok());
        assert!(Unknown::adopt(Error::msg("a")).is_err());
    }
}
