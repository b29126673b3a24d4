//! Call a function, sync or async, and get its outcome back as a value.
//!
//! [`invoke`] and [`invoke_async`] run a callable with a tuple of arguments
//! and return a [`Settled`]: either the value, or a structured error. Errors
//! the callable returns, and errors it [`raise`]s, come back untouched. Any
//! other thrown value (see [`throw`], or a plain `panic!`) is wrapped in an
//! [`Unknown`] that records the callable's name, its arguments and the value
//! itself.
//!
//! ```
//! use settle::{invoke, throw, Error};
//!
//! fn parse(input: &str) -> Result<u16, Error> {
//!     input.parse().map_err(Error::new)
//! }
//!
//! let (error, value) = invoke(parse, ("8080",)).into_pair();
//! assert!(error.is_none());
//! assert_eq!(value, Some(8080));
//!
//! let (error, _) = invoke(|| -> u16 { throw("String error") }, ()).into_pair();
//! let message = error.unwrap().to_string();
//! assert!(message.contains("Unknown error: from anonymous function"));
//! assert!(message.contains("String error"));
//! ```
//!
//! Thrown values are caught by unwinding, so this needs `panic = "unwind"`.
//! [`throw`] and [`raise`] unwind with `resume_unwind` and skip the panic
//! hook. A plain `panic!` inside the callable is still caught, but the global
//! panic hook runs first and prints `thread '..' panicked at ..` to stderr.
//! Install a quieter hook with `std::panic::set_hook` if that matters.

mod arguments;
mod call;
mod error;
#[cfg(feature = "async")]
mod executor;
mod func;
mod invoker;
mod resultable;
mod settled;
#[cfg(feature = "async")]
mod settling;

pub use self::{
    arguments::Arguments,
    error::{raise, throw, Error, Failure, Unknown},
    func::{named, Func, Named},
    invoker::{invoke, Invoker, ANONYMOUS},
    resultable::Resultable,
    settled::Settled,
};

#[cfg(feature = "async")]
pub use self::{executor::Executor, invoker::invoke_async, settling::Settling};

#[cfg(feature = "tokio")]
pub use self::executor::Tokio;
