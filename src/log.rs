#![allow(unused)]

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "log-04")]
            ::log::trace!($s $(, $x)*);
            #[cfg(not(any(feature = "log-04")))]
            let _ = ($( & $x ),*);
        }
    };
}
pub(super) use trace;

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "log-04")]
            ::log::debug!($s $(, $x)*);
            #[cfg(not(any(feature = "log-04")))]
            let _ = ($( & $x ),*);
        }
    };
}
pub(super) use debug;

macro_rules! warn_ {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "log-04")]
            ::log::warn!($s $(, $x)*);
            #[cfg(not(any(feature = "log-04")))]
            let _ = ($( & $x ),*);
        }
    };
}
pub(super) use warn_;
