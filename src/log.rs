#![allow(unused_macros, unused_imports)]

#[cfg(feature = "log")]
pub(crate) use ::log::trace;

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use trace;
