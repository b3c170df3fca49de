//! Poll an operation until its result is acceptable.

use std::future::Future;

use huddle_core::{Result, SessionError};
use tracing::debug;

use super::BackoffSchedule;

/// Invokes `operation` until `is_acceptable` accepts its result.
///
/// Only unacceptable results are retried. An `Err` from `operation` is
/// returned immediately. Waits follow `schedule` in order, without jitter;
/// once it is exhausted the error built by `on_timeout` is returned.
///
/// # Examples
///
/// ```
/// use huddle_core::SessionError;
/// use huddle_session::poll::{BackoffSchedule, poll_until};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> huddle_core::Result<()> {
/// let mut ready_after = 1;
/// let value = poll_until(
///     || {
///         ready_after -= 1;
///         let ready = ready_after < 0;
///         async move { Ok(ready.then_some("ready")) }
///     },
///     Option::is_some,
///     || SessionError::timeout("wait for ready", 3),
///     &BackoffSchedule::from_millis(&[1, 1]),
/// )
/// .await?;
/// assert_eq!(value, Some("ready"));
/// # Ok(())
/// # }
/// ```
pub async fn poll_until<T, Op, Fut, Accept, OnTimeout>(
    mut operation: Op,
    is_acceptable: Accept,
    on_timeout: OnTimeout,
    schedule: &BackoffSchedule,
) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    Accept: Fn(&T) -> bool,
    OnTimeout: FnOnce() -> SessionError,
{
    let mut delays = schedule.delays().iter();
    let mut attempt: u32 = 1;

    loop {
        let result = operation().await?;
        if is_acceptable(&result) {
            return Ok(result);
        }

        let Some(delay) = delays.next() else {
            debug!(attempts = attempt, "poll schedule exhausted");
            return Err(on_timeout());
        };

        debug!(attempt, delay = ?delay, "result not acceptable yet, retrying");
        tokio::time::sleep(*delay).await;
        attempt += 1;
    }
}
