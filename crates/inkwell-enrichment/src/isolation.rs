//! Failure isolation for single generator calls.

use std::future::Future;
use std::time::Duration;

use inkwell_core::generator::GenerationError;
use tokio_util::task::AbortOnDropHandle;

/// Runs `call` in its own task and folds every way it can go wrong into a
/// [`GenerationError`].
///
/// A panic inside the call becomes `Unavailable`, an elapsed `timeout`
/// becomes `TimedOut`. Dropping the returned future aborts the task.
///
/// # Errors
///
/// Returns the call's own error, or one of the above.
pub async fn isolate<T, F>(
    label: &'static str,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, GenerationError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, GenerationError>> + Send + 'static,
{
    let task = AbortOnDropHandle::new(tokio::spawn(async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(GenerationError::TimedOut(format!(
                    "{label} exceeded {}ms",
                    limit.as_millis()
                )))
            }),
            None => call.await,
        }
    }));

    match task.await {
        Ok(result) => result,
        Err(join_error) if join_error.is_panic() => {
            Err(GenerationError::Unavailable(format!("{label} panicked")))
        }
        Err(join_error) => Err(GenerationError::Unavailable(format!(
            "{label} aborted: {join_error}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn explode() -> Result<(), GenerationError> {
        panic!("backend exploded");
    }

    async fn stall() -> Result<(), GenerationError> {
        std::future::pending().await
    }

    #[tokio::test]
    async fn test_isolate_passes_through_success_and_error() {
        let ok = isolate("ok", None, async { Ok::<_, GenerationError>(7) }).await;
        let err = isolate("err", None, async {
            Err::<u8, _>(GenerationError::Malformed("no json".into()))
        })
        .await;

        assert_eq!(ok, Ok(7));
        assert_eq!(err, Err(GenerationError::Malformed("no json".into())));
    }

    #[tokio::test]
    async fn test_isolate_turns_panic_into_unavailable() {
        // Act
        let result = isolate("image", None, explode()).await;

        // Assert
        assert_eq!(
            result,
            Err(GenerationError::Unavailable("image panicked".into()))
        );
    }

    #[tokio::test]
    async fn test_isolate_turns_elapsed_timeout_into_timed_out() {
        // Act
        let result = isolate("voice", Some(Duration::from_millis(10)), stall()).await;

        // Assert
        assert_eq!(
            result,
            Err(GenerationError::TimedOut("voice exceeded 10ms".into()))
        );
    }
}
