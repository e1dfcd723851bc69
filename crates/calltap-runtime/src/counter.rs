use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::args::{CallArgs, Signature};
use crate::callable::{AsyncCallable, Callable, HasSignature};

/// Counts successful calls to the wrapped callable.
/// Failed calls propagate their error and are not counted, so this is not a
/// count of every attempt; wrap a `FailingFunction` and read
/// [`FailingFunction::attempts`](crate::FailingFunction::attempts) for the total.
#[derive(Debug)]
pub struct CallCounter<C> {
    inner: C,
    times_called: AtomicUsize,
}

impl<C: HasSignature> CallCounter<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            times_called: AtomicUsize::new(0),
        }
    }

    /// Number of calls completed so far
    pub fn times_called(&self) -> usize {
        self.times_called.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn record(&self, result: Result<Value>) -> Result<Value> {
        if result.is_ok() {
            let count = self.times_called.fetch_add(1, Ordering::SeqCst) + 1;
            trace!(callable = %self.inner.signature().name, count, "Call counted");
        }
        result
    }
}

impl<C: HasSignature> HasSignature for CallCounter<C> {
    fn signature(&self) -> &Signature {
        self.inner.signature()
    }
}

impl<C: Callable> Callable for CallCounter<C> {
    fn call(&self, args: CallArgs) -> Result<Value> {
        self.record(self.inner.call(args))
    }
}

#[async_trait]
impl<C: AsyncCallable> AsyncCallable for CallCounter<C> {
    async fn call_async(&self, args: CallArgs) -> Result<Value> {
        let result = self.inner.call_async(args).await;
        self.record(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Function;
    use anyhow::bail;
    use serde_json::json;

    fn square() -> Function {
        Function::new("square", ["x"], |args| {
            let x = args.get("x").and_then(Value::as_i64).unwrap_or_default();
            Ok(json!(x * x))
        })
    }

    #[test]
    fn test_counts_each_call() {
        let wrapped = CallCounter::new(square());
        assert_eq!(wrapped.times_called(), 0);

        for i in 0..5i64 {
            assert_eq!(wrapped.call(CallArgs::new().arg(i)).unwrap(), json!(i * i));
            assert_eq!(wrapped.times_called(), (i + 1) as usize);
        }
    }

    #[test]
    fn test_failed_calls_not_counted() {
        let f = Function::new("odd_only", ["x"], |args| {
            let x = args.get("x").and_then(Value::as_i64).unwrap_or_default();
            if x % 2 == 0 {
                bail!("even input: {}", x);
            }
            Ok(json!(x))
        });
        let wrapped = CallCounter::new(f);

        assert!(wrapped.call(CallArgs::new().arg(2)).is_err());
        assert!(wrapped.call(CallArgs::new().arg(3)).is_ok());
        assert_eq!(wrapped.times_called(), 1);
    }

    #[test]
    fn test_reading_count_has_no_side_effects() {
        let wrapped = CallCounter::new(square());
        wrapped.call(CallArgs::new().arg(1)).unwrap();
        assert_eq!(wrapped.times_called(), 1);
        assert_eq!(wrapped.times_called(), 1);
    }

    #[tokio::test]
    async fn test_async_calls_counted() {
        let wrapped = CallCounter::new(square());
        for _ in 0..3 {
            wrapped.call_async(CallArgs::new().arg(2)).await.unwrap();
        }
        assert_eq!(wrapped.times_called(), 3);
    }
}
