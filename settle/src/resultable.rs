use core::convert::Infallible;
use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    sync::Arc,
};

/// The output contract of a callable: either a `Result`, or a plain value
/// that can never fail on its own.
pub trait Resultable {
    type Ok;
    type Error;

    fn into_result(self) -> Result<Self::Ok, Self::Error>;
}

impl<T, E> Resultable for Result<T, E> {
    type Ok = T;
    type Error = E;

    fn into_result(self) -> Result<T, E> {
        self
    }
}

macro_rules! infallible {
    ($($ty: ty),* $(,)?) => {
        $(
            impl Resultable for $ty {
                type Ok = $ty;
                type Error = Infallible;

                fn into_result(self) -> Result<Self::Ok, Self::Error> {
                    Ok(self)
                }
            }
        )*
    };
}

infallible!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
    serde_json::Value,
);

macro_rules! infallible_generic {
    ($($ty: ident < $($param: ident),+ >),* $(,)?) => {
        $(
            impl<$($param),+> Resultable for $ty<$($param),+> {
                type Ok = $ty<$($param),+>;
                type Error = Infallible;

                fn into_result(self) -> Result<Self::Ok, Self::Error> {
                    Ok(self)
                }
            }
        )*
    };
}

infallible_generic!(
    Option<T>,
    Vec<T>,
    VecDeque<T>,
    BTreeSet<T>,
    HashSet<T, S>,
    BTreeMap<K, V>,
    HashMap<K, V, S>,
);

impl<T: ?Sized> Resultable for Box<T> {
    type Ok = Box<T>;
    type Error = Infallible;

    fn into_result(self) -> Result<Self::Ok, Self::Error> {
        Ok(self)
    }
}

impl<T: ?Sized> Resultable for Arc<T> {
    type Ok = Arc<T>;
    type Error = Infallible;

    fn into_result(self) -> Result<Self::Ok, Self::Error> {
        Ok(self)
    }
}

impl<'a, T: ?Sized + ToOwned> Resultable for Cow<'a, T> {
    type Ok = Cow<'a, T>;
    type Error = Infallible;

    fn into_result(self) -> Result<Self::Ok, Self::Error> {
        Ok(self)
    }
}

macro_rules! infallible_tuple {
    ($($param: ident)+) => {
        impl<$($param),+> Resultable for ($($param,)+) {
            type Ok = ($($param,)+);
            type Error = Infallible;

            fn into_result(self) -> Result<Self::Ok, Self::Error> {
                Ok(self)
            }
        }
    };
}

infallible_tuple!(T1);
infallible_tuple!(T1 T2);
infallible_tuple!(T1 T2 T3);
infallible_tuple!(T1 T2 T3 T4);
