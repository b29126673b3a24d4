use crate::{error::Error, resultable::Resultable};

/// The settled outcome of an invocation: exactly one of an error or a value.
///
/// Destructure it with [`Settled::into_pair`] to get the `(error, value)`
/// form, or turn it back into a `Result` with [`Settled::into_result`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T, E = Error>(Result<T, E>);

impl<T, E> Settled<T, E> {
    pub const fn ok(value: T) -> Settled<T, E> {
        Settled(Ok(value))
    }

    pub const fn err(error: E) -> Settled<T, E> {
        Settled(Err(error))
    }

    pub fn is_ok(&self) -> bool {
        self.0.is_ok()
    }

    pub fn is_err(&self) -> bool {
        self.0.is_err()
    }

    pub fn value(&self) -> Option<&T> {
        self.0.as_ref().ok()
    }

    pub fn error(&self) -> Option<&E> {
        self.0.as_ref().err()
    }

    pub fn into_pair(self) -> (Option<E>, Option<T>) {
        match self.0 {
            Ok(value) => (None, Some(value)),
            Err(err) => (Some(err), None),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        self.0
    }
}

impl<T, E> From<Result<T, E>> for Settled<T, E> {
    fn from(value: Result<T, E>) -> Self {
        Settled(value)
    }
}

impl<T, E> From<Settled<T, E>> for Result<T, E> {
    fn from(value: Settled<T, E>) -> Self {
        value.0
    }
}

impl<T, E> From<Settled<T, E>> for (Option<E>, Option<T>) {
    fn from(value: Settled<T, E>) -> Self {
        value.into_pair()
    }
}

impl<T, E> Resultable for Settled<T, E> {
    type Ok = T;
    type Error = E;

    fn into_result(self) -> Result<Self::Ok, Self::Error> {
        self.0
    }
}
