use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::args::{BoundArgs, CallArgs, CallKind, Signature};

/// Anything that can describe how it is called
pub trait HasSignature {
    fn signature(&self) -> &Signature;
}

/// Synchronous callable
pub trait Callable: HasSignature + Send + Sync {
    /// Invoke with caller arguments, returns result
    fn call(&self, args: CallArgs) -> Result<Value>;
}

/// Async callable
/// Note: Uses async_trait so wrappers can hold it behind `Arc<dyn AsyncCallable>`
#[async_trait]
pub trait AsyncCallable: HasSignature + Send + Sync {
    async fn call_async(&self, args: CallArgs) -> Result<Value>;
}

impl<T: HasSignature + ?Sized> HasSignature for Arc<T> {
    fn signature(&self) -> &Signature {
        (**self).signature()
    }
}

impl<T: Callable + ?Sized> Callable for Arc<T> {
    fn call(&self, args: CallArgs) -> Result<Value> {
        (**self).call(args)
    }
}

#[async_trait]
impl<T: AsyncCallable + ?Sized> AsyncCallable for Arc<T> {
    async fn call_async(&self, args: CallArgs) -> Result<Value> {
        (**self).call_async(args).await
    }
}

type SyncBody = dyn Fn(&BoundArgs) -> Result<Value> + Send + Sync;
type AsyncBody = dyn Fn(BoundArgs) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// Callable backed by a closure over bound arguments
#[derive(Clone)]
pub struct Function {
    signature: Signature,
    body: Arc<SyncBody>,
}

impl Function {
    /// Free function
    pub fn new<I, S, F>(name: &str, params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&BoundArgs) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_kind(CallKind::Function, name, params, body)
    }

    /// Instance method; `params` includes the receiver (e.g. `self`) first
    pub fn method<I, S, F>(name: &str, params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&BoundArgs) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_kind(CallKind::Method, name, params, body)
    }

    /// Class method; `params` includes the class parameter (e.g. `cls`) first
    pub fn class_method<I, S, F>(name: &str, params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&BoundArgs) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_kind(CallKind::ClassMethod, name, params, body)
    }

    pub fn static_method<I, S, F>(name: &str, params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&BoundArgs) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_kind(CallKind::Static, name, params, body)
    }

    pub fn with_kind<I, S, F>(kind: CallKind, name: &str, params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&BoundArgs) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(name, kind, params),
            body: Arc::new(body),
        }
    }

    /// Set a default value for a declared parameter
    pub fn with_default(mut self, param: &str, value: impl Into<Value>) -> Self {
        self.signature = self.signature.with_default(param, value);
        self
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl HasSignature for Function {
    fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl Callable for Function {
    fn call(&self, args: CallArgs) -> Result<Value> {
        let bound = self.signature.bind(&args)?;
        (self.body)(&bound)
    }
}

#[async_trait]
impl AsyncCallable for Function {
    async fn call_async(&self, args: CallArgs) -> Result<Value> {
        self.call(args)
    }
}

/// Async callable backed by a closure returning a boxed future
#[derive(Clone)]
pub struct AsyncFunction {
    signature: Signature,
    body: Arc<AsyncBody>,
}

impl AsyncFunction {
    pub fn new<I, S, F>(name: &str, params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(BoundArgs) -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(name, CallKind::Function, params),
            body: Arc::new(body),
        }
    }
}

impl fmt::Debug for AsyncFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFunction")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl HasSignature for AsyncFunction {
    fn signature(&self) -> &Signature {
        &self.signature
    }
}

#[async_trait]
impl AsyncCallable for AsyncFunction {
    async fn call_async(&self, args: CallArgs) -> Result<Value> {
        let bound = self.signature.bind(&args)?;
        (self.body)(bound).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    fn square() -> Function {
        Function::new("square", ["x"], |args| {
            let x = args.get("x").and_then(Value::as_i64).unwrap_or_default();
            Ok(json!(x * x))
        })
    }

    #[test]
    fn test_function_call_binds_arguments() {
        let f = square();
        assert_eq!(f.call(CallArgs::new().arg(4)).unwrap(), json!(16));
        assert_eq!(f.call(CallArgs::new().kwarg("x", 5)).unwrap(), json!(25));
    }

    #[test]
    fn test_function_rejects_bad_arity() {
        let f = square();
        assert!(f.call(CallArgs::new()).is_err());
        assert!(f.call(CallArgs::new().arg(1).arg(2)).is_err());
    }

    #[test]
    fn test_arc_dyn_callable_forwards() {
        let f: Arc<dyn Callable> = Arc::new(square());
        assert_eq!(f.signature().name, "square");
        assert_eq!(f.call(CallArgs::new().arg(3)).unwrap(), json!(9));
    }

    #[tokio::test]
    async fn test_function_is_async_callable() {
        let f = square();
        let result = f.call_async(CallArgs::new().arg(6)).await.unwrap();
        assert_eq!(result, json!(36));
    }

    #[tokio::test]
    async fn test_async_function() {
        let f = AsyncFunction::new("shout", ["text"], |args| {
            let text = args.str("text").unwrap_or_default().to_uppercase();
            async move { Ok(json!(text)) }.boxed()
        });
        let result = f.call_async(CallArgs::new().arg("hi")).await.unwrap();
        assert_eq!(result, json!("HI"));
    }
}
