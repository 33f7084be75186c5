//! Bounded retry loop with a fixed delay between attempts.

use crate::config::ClientConfig;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The retry delay ended before its full duration.
#[derive(Debug, Error)]
#[error("retry delay interrupted")]
pub struct Interrupted;

/// Delay between attempts.
#[async_trait]
pub trait Sleep: Send + Sync {
    async fn sleep(&self, duration: Duration) -> Result<(), Interrupted>;
}

/// Waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleep;

#[async_trait]
impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        tokio::time::sleep(duration).await;
        Ok(())
    }
}

/// An attempt error that can name its category in logs.
pub trait AttemptFailure: std::fmt::Display {
    fn kind(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub interval: Duration,
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries(),
            interval: config.retry_interval(),
        }
    }
}

/// A value together with the number of failed attempts that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub retries: u32,
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: E },

    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

/// Runs an attempt until it succeeds or the budget is spent.
///
/// Every error is retried the same way. An [`Interrupted`] delay does not
/// stop the loop: the next attempt starts right away. A cancellation token,
/// when set, is checked before each attempt and races the delay.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleep: Arc<dyn Sleep>,
    cancel: Option<CancellationToken>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleep: Arc::new(TokioSleep),
            cancel: None,
        }
    }

    pub fn with_sleep(mut self, sleep: Arc<dyn Sleep>) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub async fn run<T, E, F, Fut>(&self, mut attempt: F) -> Result<Retried<T>, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: AttemptFailure,
    {
        let mut retries = 0;
        loop {
            if self.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: retries });
            }

            let error = match attempt().await {
                Ok(value) => return Ok(Retried { value, retries }),
                Err(error) => error,
            };

            if retries >= self.policy.max_retries {
                return Err(RetryError::Exhausted {
                    attempts: retries + 1,
                    last_error: error,
                });
            }
            retries += 1;

            tracing::warn!(
                attempt = retries,
                max_retries = self.policy.max_retries,
                error = %error,
                kind = error.kind(),
                "Attempt failed, retrying in {:?}",
                self.policy.interval
            );

            if self.delay().await.is_err() {
                if self.is_cancelled() {
                    return Err(RetryError::Cancelled { attempts: retries });
                }
                tracing::debug!("Retry delay interrupted, retrying immediately");
            }
        }
    }

    /// Sleep for the interval; `Err` if the sleep was cut short.
    async fn delay(&self) -> Result<(), Interrupted> {
        match &self.cancel {
            None => self.sleep.sleep(self.policy.interval).await,
            Some(token) => tokio::select! {
                res = self.sleep.sleep(self.policy.interval) => res,
                _ = token.cancelled() => Err(Interrupted),
            },
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Records requested delays and returns immediately.
    #[derive(Default)]
    struct RecordingSleep {
        calls: Mutex<Vec<Duration>>,
        interrupt: bool,
    }

    #[async_trait]
    impl Sleep for RecordingSleep {
        async fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
            self.calls.lock().unwrap().push(duration);
            if self.interrupt {
                Err(Interrupted)
            } else {
                Ok(())
            }
        }
    }

    impl AttemptFailure for String {
        fn kind(&self) -> &'static str {
            "test"
        }
    }

    fn executor(max_retries: u32, sleep: Arc<RecordingSleep>) -> RetryExecutor {
        RetryExecutor::new(RetryPolicy {
            max_retries,
            interval: Duration::from_millis(50),
        })
        .with_sleep(sleep)
    }

    /// Fails the first `failures` calls, then returns the call number.
    async fn flaky(calls: &AtomicU32, failures: u32) -> Result<u32, String> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < failures {
            Err(format!("failure {}", n))
        } else {
            Ok(n)
        }
    }

    #[tokio::test]
    async fn test_success_after_exactly_max_retries_failures() {
        for n in 0..5 {
            let sleep = Arc::new(RecordingSleep::default());
            let calls = AtomicU32::new(0);
            let result = executor(n, sleep.clone())
                .run(|| flaky(&calls, n))
                .await
                .unwrap();

            assert_eq!(result.retries, n);
            assert_eq!(calls.load(Ordering::SeqCst), n + 1);
            assert_eq!(sleep.calls.lock().unwrap().len(), n as usize);
        }
    }

    #[tokio::test]
    async fn test_exhausted_after_max_retries_plus_one_attempts() {
        for n in 0..5 {
            let sleep = Arc::new(RecordingSleep::default());
            let calls = AtomicU32::new(0);
            let err = executor(n, sleep)
                .run(|| flaky(&calls, n + 1))
                .await
                .unwrap_err();

            assert_eq!(calls.load(Ordering::SeqCst), n + 1);
            match err {
                RetryError::Exhausted {
                    attempts,
                    last_error,
                } => {
                    assert_eq!(attempts, n + 1);
                    assert_eq!(last_error, format!("failure {}", n));
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_delay_is_fixed() {
        let sleep = Arc::new(RecordingSleep::default());
        let calls = AtomicU32::new(0);
        executor(3, sleep.clone())
            .run(|| flaky(&calls, 3))
            .await
            .unwrap();

        assert_eq!(
            *sleep.calls.lock().unwrap(),
            vec![Duration::from_millis(50); 3]
        );
    }

    #[tokio::test]
    async fn test_interrupted_delay_keeps_retrying() {
        let sleep = Arc::new(RecordingSleep {
            interrupt: true,
            ..Default::default()
        });
        let calls = AtomicU32::new(0);
        let result = executor(2, sleep.clone())
            .run(|| flaky(&calls, 2))
            .await
            .unwrap();

        assert_eq!(result.retries, 2);
        assert_eq!(sleep.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = AtomicU32::new(0);
        let err = executor(3, Arc::new(RecordingSleep::default()))
            .with_cancellation(token)
            .run(|| flaky(&calls, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::Cancelled { attempts: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_delay() {
        let token = CancellationToken::new();
        let executor = RetryExecutor::new(RetryPolicy {
            max_retries: 5,
            interval: Duration::from_secs(3600),
        })
        .with_cancellation(token.clone());

        let calls = AtomicU32::new(0);
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });

        let err = executor.run(|| flaky(&calls, u32::MAX)).await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, RetryError::Cancelled { attempts: 1 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleep_waits_interval() {
        let start = tokio::time::Instant::now();
        TokioSleep.sleep(Duration::from_millis(500)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[derive(Debug)]
    struct Timeout;

    impl std::fmt::Display for Timeout {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "timed out")
        }
    }

    impl AttemptFailure for Timeout {
        fn kind(&self) -> &'static str {
            "timeout"
        }
    }

    #[tokio::test]
    async fn test_retry_warning_names_error_kind() {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || LogBuffer(writer.clone()))
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let calls = &AtomicU32::new(0);
        executor(1, Arc::new(RecordingSleep::default()))
            .run(|| async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Timeout)
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();

        let output = String::from_utf8(logs.lock().unwrap().clone()).unwrap();
        assert!(output.contains("kind=\"timeout\""), "{}", output);
        assert!(output.contains("error=timed out"), "{}", output);
    }

    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_policy_from_config() {
        let config = ClientConfig::builder()
            .address("http://vault:8200")
            .token("t")
            .max_retries(4)
            .retry_interval(Duration::from_millis(20))
            .resolve(|_| None)
            .unwrap();
        assert_eq!(
            RetryPolicy::from(&config),
            RetryPolicy {
                max_retries: 4,
                interval: Duration::from_millis(20)
            }
        );
    }
}
