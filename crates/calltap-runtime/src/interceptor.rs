//! Call interception: observation hooks around a wrapped callable.
//!
//! The interceptor binds the caller's arguments against the wrapped
//! callable's signature, hands the snapshot to `pre_call`, forwards the
//! original arguments unchanged, then hands snapshot and result to
//! `post_call`. The post-hook is skipped when the wrapped call fails; the
//! error is returned as-is.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::args::{BoundArgs, CallArgs, Signature};
use crate::callable::{AsyncCallable, Callable, HasSignature};

/// Observation points around an intercepted call.
/// Both default to doing nothing.
pub trait CallHooks: Send + Sync {
    /// Runs before the wrapped call
    fn pre_call(&self, _args: &BoundArgs) {}

    /// Runs after the wrapped call returned successfully
    fn post_call(&self, _args: &BoundArgs, _result: &Value) {}
}

/// Hooks that observe nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl CallHooks for NoopHooks {}

impl<T: CallHooks + ?Sized> CallHooks for Arc<T> {
    fn pre_call(&self, args: &BoundArgs) {
        (**self).pre_call(args)
    }

    fn post_call(&self, args: &BoundArgs, result: &Value) {
        (**self).post_call(args, result)
    }
}

type PreFn = Box<dyn Fn(&BoundArgs) + Send + Sync>;
type PostFn = Box<dyn Fn(&BoundArgs, &Value) + Send + Sync>;

/// Closure-based hooks
#[derive(Default)]
pub struct FnHooks {
    before: Option<PreFn>,
    after: Option<PostFn>,
}

impl FnHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(mut self, f: impl Fn(&BoundArgs) + Send + Sync + 'static) -> Self {
        self.before = Some(Box::new(f));
        self
    }

    pub fn after(mut self, f: impl Fn(&BoundArgs, &Value) + Send + Sync + 'static) -> Self {
        self.after = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for FnHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

impl CallHooks for FnHooks {
    fn pre_call(&self, args: &BoundArgs) {
        if let Some(f) = &self.before {
            f(args);
        }
    }

    fn post_call(&self, args: &BoundArgs, result: &Value) {
        if let Some(f) = &self.after {
            f(args, result);
        }
    }
}

/// Wraps a callable and runs hooks around each invocation
#[derive(Debug)]
pub struct Interceptor<C, H = NoopHooks> {
    inner: C,
    hooks: H,
}

impl<C: HasSignature> Interceptor<C, NoopHooks> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            hooks: NoopHooks,
        }
    }
}

impl<C: HasSignature, H: CallHooks> Interceptor<C, H> {
    pub fn with_hooks(inner: C, hooks: H) -> Self {
        Self { inner, hooks }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    fn before(&self, args: &CallArgs) -> Result<BoundArgs> {
        let snapshot = self.inner.signature().bind(args)?;
        debug!(callable = %self.inner.signature().name, "Intercepting call");
        self.hooks.pre_call(&snapshot);
        Ok(snapshot)
    }

    fn after(&self, snapshot: &BoundArgs, result: Result<Value>) -> Result<Value> {
        match result {
            Ok(value) => {
                self.hooks.post_call(snapshot, &value);
                Ok(value)
            }
            Err(e) => {
                debug!(
                    callable = %self.inner.signature().name,
                    error = %e,
                    "Intercepted call failed, skipping post-call hook"
                );
                Err(e)
            }
        }
    }
}

impl<C: HasSignature, H> HasSignature for Interceptor<C, H> {
    fn signature(&self) -> &Signature {
        self.inner.signature()
    }
}

impl<C: Callable, H: CallHooks> Callable for Interceptor<C, H> {
    fn call(&self, args: CallArgs) -> Result<Value> {
        let snapshot = self.before(&args)?;
        let result = self.inner.call(args);
        self.after(&snapshot, result)
    }
}

#[async_trait]
impl<C: AsyncCallable, H: CallHooks> AsyncCallable for Interceptor<C, H> {
    async fn call_async(&self, args: CallArgs) -> Result<Value> {
        let snapshot = self.before(&args)?;
        let result = self.inner.call_async(args).await;
        self.after(&snapshot, result)
    }
}
