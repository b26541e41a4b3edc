/// Logs the error of a call whose failure the client can live with, such as
/// browser storage being disabled, and carries on
///
/// An optional message literal describes what was being attempted.
#[macro_export]
macro_rules! log_err_as_warn {
    ($result:expr) => {
        if let Err(err) = $result {
            tracing::warn!(?err, "ignoring failed call");
        }
    };
    ($result:expr, $msg:literal) => {
        if let Err(err) = $result {
            tracing::warn!(?err, $msg);
        }
    };
}
