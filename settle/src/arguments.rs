use serde::Serialize;
use serde_json::Value;

/// An argument tuple, passed positionally to a [`Func`](crate::Func).
///
/// Every element is `Serialize` so the tuple can be recorded before it is
/// moved into the callable.
pub trait Arguments {
    fn snapshot(&self) -> Vec<Value>;
}

impl Arguments for () {
    fn snapshot(&self) -> Vec<Value> {
        Vec::new()
    }
}

fn snapshot_of<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

macro_rules! toargs {
    ($first: ident) => {
        impl<$first: Serialize> Arguments for ($first,)
        {
            fn snapshot(&self) -> Vec<Value> {
                vec![snapshot_of(&self.0)]
            }
        }
    };
    ($first: ident $($rest: ident)*) => {
        toargs!($($rest)*);

        impl<$first: Serialize, $($rest: Serialize),*> Arguments for ($first, $($rest),*)
        {
            #[allow(non_snake_case)]
            fn snapshot(&self) -> Vec<Value> {
                let ($first, $($rest),*) = self;

                vec![snapshot_of($first), $(snapshot_of($rest)),*]
            }
        }
    }
}

toargs!(T1 T2 T3 T4 T5 T6 T7 T8 T9 T10 T11 T12);
