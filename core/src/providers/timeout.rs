use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

/// Await a collaborator call with a deadline, mapping both failure kinds to [`ProviderError`].
pub async fn call_with_timeout<T, F>(
    what: &'static str,
    secs: u64,
    fut: F,
    map_err: fn(anyhow::Error) -> ProviderError,
) -> Result<T, ProviderError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(map_err(e)),
        Err(_) => Err(ProviderError::Timeout { what, secs }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reported() {
        let err = call_with_timeout(
            "llm",
            1,
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, anyhow::Error>(())
            },
            ProviderError::llm,
        )
        .await
        .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "llm timed out after 1s");
    }

    #[tokio::test]
    async fn test_error_mapped() {
        let err = call_with_timeout(
            "metrics",
            5,
            async { Err::<(), _>(anyhow::anyhow!("connection refused")) },
            ProviderError::metrics,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "metrics provider failed: connection refused"
        );
    }
}
