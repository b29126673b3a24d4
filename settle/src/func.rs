use core::any::type_name;
use std::borrow::Cow;

/// A unit of work called once with the tuple `T` spread positionally.
pub trait Func<T> {
    type Output;

    fn call(self, input: T) -> Self::Output;

    /// The callable's own name, `None` when it has none.
    fn name(&self) -> Option<Cow<'static, str>> {
        name_of::<Self>().map(Cow::Borrowed)
    }
}

/// Best-effort name of a callable type: the last path segment of a fn item
/// with generic argument lists removed, `None` for closures, fn pointers and
/// trait objects.
pub(crate) fn name_of<F: ?Sized>() -> Option<&'static str> {
    let name = type_name::<F>().trim_start_matches('&');
    if ["fn(", "unsafe ", "extern "]
        .iter()
        .any(|prefix| name.starts_with(prefix))
        || name.contains("dyn ")
    {
        return None;
    }

    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in name.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' if depth > 0 && !name[..idx].ends_with('-') => depth -= 1,
            ':' if depth == 0 && name[idx..].starts_with("::") => start = idx + 2,
            _ => {}
        }
    }

    let segment = name[start..].split('<').next()?;
    if segment.is_empty() || segment.starts_with('{') {
        return None;
    }
    Some(segment)
}

impl<F, U> Func<()> for F
where
    F: FnOnce() -> U,
{
    type Output = U;

    fn call(self, _input: ()) -> Self::Output {
        (self)()
    }
}

macro_rules! funcs {
    ($first: ident) => {
        impl<F, U, $first> Func<($first,)> for F
        where
            F: FnOnce($first) -> U,
        {
            type Output = U;
            fn call(self, input: ($first,)) -> Self::Output {
               (self)(input.0)
            }
        }
    };
    ($first: ident $($rest: ident)*) => {
        funcs!($($rest)*);

        impl<F, U, $first, $($rest),*> Func<($first, $($rest),*)> for F
        where
             F: FnOnce($first, $($rest),*) -> U,
        {
            type Output = U;
            fn call(self, input: ($first, $($rest),*)) -> Self::Output {
                #[allow(non_snake_case)]
                let ($first, $($rest),*) = input;
                (self)($first, $($rest),*)
            }
        }
    };
}

funcs!(T1 T2 T3 T4 T5 T6 T7 T8 T9 T10 T11 T12);

/// A callable with an explicit name, for closures or to override the
/// detected one.
#[derive(Debug, Clone, Copy)]
pub struct Named<F> {
    name: &'static str,
    func: F,
}

impl<F> Named<F> {
    pub const fn new(name: &'static str, func: F) -> Named<F> {
        Named { name, func }
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}

pub fn named<F>(name: &'static str, func: F) -> Named<F> {
    Named::new(name, func)
}

impl<F, T> Func<T> for Named<F>
where
    F: Func<T>,
{
    type Output = F::Output;

    fn call(self, input: T) -> Self::Output {
        self.func.call(input)
    }

    fn name(&self) -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed(self.name))
    }
}
