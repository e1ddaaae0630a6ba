//! Macros for building [`crate::error::ModstateError`] values with less boilerplate.

/// Creates a [`crate::error::ModstateError`] from an error kind, a static description and an
/// optional detail.
#[macro_export]
macro_rules! modstate_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::ModstateError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::ModstateError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Creates a [`crate::error::ModstateError`] and returns it from the current function.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::modstate_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::modstate_error!($kind, $desc, $detail))
    };
}
