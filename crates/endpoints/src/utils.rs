/// Returns early with `$error` when `$predicate` does not hold.
///
/// ```ignore
/// ensure!(buf.len() <= max_size, TransportError::ResponseTooLarge { max_size });
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
