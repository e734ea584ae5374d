/// Macro to return early with an error
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Generic(format!($($arg)*)))
    };
}

/// Return early with a construction error
#[macro_export]
macro_rules! construction_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Construction(format!($($arg)*)))
    };
}

/// Ensure a condition holds, or return a construction error
#[macro_export]
macro_rules! construction_ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::construction_bail!($($arg)*);
        }
    };
}
