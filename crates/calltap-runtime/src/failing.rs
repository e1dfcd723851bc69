//! Failure injection: fail the first N calls, or every call.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::args::{CallArgs, Signature};
use crate::callable::{AsyncCallable, Callable, HasSignature};

const INVALID_BUDGET: &str = "num_tries_before_success should either be an integer greater \
than or equal to 0, or FailingFunction::INFINITY";

/// How many calls fail before the wrapped callable is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureBudget {
    Finite(u64),
    Unbounded,
}

impl FailureBudget {
    /// Whether the 0-based attempt `attempt` should fail
    pub fn fails(&self, attempt: u64) -> bool {
        match self {
            FailureBudget::Finite(n) => attempt < *n,
            FailureBudget::Unbounded => true,
        }
    }
}

impl fmt::Display for FailureBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureBudget::Finite(n) => write!(f, "{n}"),
            FailureBudget::Unbounded => f.write_str("infinity"),
        }
    }
}

impl TryFrom<i64> for FailureBudget {
    type Error = anyhow::Error;

    fn try_from(n: i64) -> Result<Self> {
        u64::try_from(n)
            .map(FailureBudget::Finite)
            .map_err(|_| anyhow!(INVALID_BUDGET))
    }
}

impl TryFrom<i32> for FailureBudget {
    type Error = anyhow::Error;

    fn try_from(n: i32) -> Result<Self> {
        FailureBudget::try_from(i64::from(n))
    }
}

impl From<u64> for FailureBudget {
    fn from(n: u64) -> Self {
        FailureBudget::Finite(n)
    }
}

impl FromStr for FailureBudget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("inf") || s.eq_ignore_ascii_case("infinity") {
            return Ok(FailureBudget::Unbounded);
        }
        let n: i64 = s.parse().map_err(|_| anyhow!(INVALID_BUDGET))?;
        FailureBudget::try_from(n)
    }
}

impl TryFrom<&str> for FailureBudget {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl Serialize for FailureBudget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FailureBudget::Finite(n) => serializer.serialize_u64(*n),
            FailureBudget::Unbounded => serializer.serialize_str("infinity"),
        }
    }
}

impl<'de> Deserialize<'de> for FailureBudget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Int(n) => FailureBudget::try_from(n),
            Raw::Text(s) => s.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

type ErrorFactory = Box<dyn Fn() -> anyhow::Error + Send + Sync>;

/// Fails the first N calls with a caller-supplied error, then forwards
pub struct FailingFunction<C> {
    inner: C,
    make_error: ErrorFactory,
    budget: FailureBudget,
    attempts: AtomicU64,
}

impl FailingFunction<()> {
    /// Budget that never runs out
    pub const INFINITY: FailureBudget = FailureBudget::Unbounded;
}

impl<C: HasSignature> FailingFunction<C> {
    /// Wrap `inner`. `make_error` builds the error returned by each failing
    /// call; the budget is validated before anything is invoked.
    pub fn new<E, F, B>(inner: C, make_error: F, num_tries_before_success: B) -> Result<Self>
    where
        E: std::error::Error + Send + Sync + 'static,
        F: Fn() -> E + Send + Sync + 'static,
        B: TryInto<FailureBudget>,
        B::Error: Into<anyhow::Error>,
    {
        let budget: FailureBudget = num_tries_before_success
            .try_into()
            .map_err(Into::<anyhow::Error>::into)?;

        debug!(callable = %inner.signature().name, %budget, "Failure injection armed");

        Ok(Self {
            inner,
            make_error: Box::new(move || anyhow::Error::new(make_error())),
            budget,
            attempts: AtomicU64::new(0),
        })
    }

    pub fn budget(&self) -> FailureBudget {
        self.budget
    }

    /// Invocations so far, failed or not
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Failing calls left; `None` when unbounded
    pub fn failures_remaining(&self) -> Option<u64> {
        match self.budget {
            FailureBudget::Finite(n) => Some(n.saturating_sub(self.attempts())),
            FailureBudget::Unbounded => None,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Count the attempt; `Some(err)` when it must fail
    fn inject(&self) -> Option<anyhow::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.budget.fails(attempt) {
            warn!(
                callable = %self.inner.signature().name,
                attempt,
                budget = %self.budget,
                "Injecting failure"
            );
            Some((self.make_error)())
        } else {
            None
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for FailingFunction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailingFunction")
            .field("inner", &self.inner)
            .field("budget", &self.budget)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl<C: HasSignature> HasSignature for FailingFunction<C> {
    fn signature(&self) -> &Signature {
        self.inner.signature()
    }
}

impl<C: Callable> Callable for FailingFunction<C> {
    fn call(&self, args: CallArgs) -> Result<Value> {
        match self.inject() {
            Some(err) => Err(err),
            None => self.inner.call(args),
        }
    }
}

#[async_trait]
impl<C: AsyncCallable> AsyncCallable for FailingFunction<C> {
    async fn call_async(&self, args: CallArgs) -> Result<Value> {
        match self.inject() {
            Some(err) => Err(err),
            None => self.inner.call_async(args).await,
        }
    }
}
