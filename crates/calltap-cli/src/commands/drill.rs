use crate::catalog;
use crate::config::{Config, DrillConfig};
use anyhow::{Context, Result};
use calltap_runtime::{
    AsyncCallable, BoundArgs, CallCounter, CallHooks, FailingFunction, FailureBudget, Interceptor,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Error returned by calls that fall inside a drill's failure budget
#[derive(Debug)]
pub struct InjectedFault {
    pub drill: String,
}

impl fmt::Display for InjectedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected fault in drill '{}'", self.drill)
    }
}

impl std::error::Error for InjectedFault {}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CallOutcome {
    pub attempt: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrillReport {
    pub drill: String,
    pub function: String,
    pub budget: FailureBudget,
    pub outcomes: Vec<CallOutcome>,
    pub succeeded: usize,
    pub events: Vec<String>,
}

/// Hook log shared between the interceptor and the report
#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    fn push(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn snapshot(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl CallHooks for EventLog {
    fn pre_call(&self, args: &BoundArgs) {
        self.push(format!("before {}", args.to_json()));
    }

    fn post_call(&self, _args: &BoundArgs, result: &Value) {
        self.push(format!("after {}", result));
    }
}

/// Run a single drill
pub async fn run_drill(drill: &DrillConfig) -> Result<DrillReport> {
    let function = catalog::lookup(&drill.function)
        .context(format!("Drill '{}' has an invalid function", drill.name))?;

    let drill_name = drill.name.clone();
    let failing = FailingFunction::new(
        function,
        move || InjectedFault {
            drill: drill_name.clone(),
        },
        drill.tries_before_success,
    )?;
    let log = Arc::new(EventLog::default());
    let wrapped = Interceptor::with_hooks(CallCounter::new(failing), log.clone());

    info!(drill = %drill.name, function = %drill.function, calls = drill.calls, "Running drill");

    let mut outcomes = Vec::with_capacity(drill.calls as usize);
    for attempt in 1..=drill.calls {
        let outcome = match wrapped.call_async(drill.call_args()).await {
            Ok(value) => CallOutcome {
                attempt,
                ok: true,
                value: Some(value),
                error: None,
            },
            Err(e) => {
                if e.downcast_ref::<InjectedFault>().is_none() {
                    warn!(drill = %drill.name, attempt, error = %e, "Call failed");
                }
                CallOutcome {
                    attempt,
                    ok: false,
                    value: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    let succeeded = wrapped.inner().times_called();
    info!(drill = %drill.name, succeeded, "Drill completed");

    Ok(DrillReport {
        drill: drill.name.clone(),
        function: drill.function.clone(),
        budget: drill.tries_before_success,
        outcomes,
        succeeded,
        events: log.snapshot(),
    })
}

/// Run every configured drill (or just `only`) and print JSON reports
pub async fn execute(only: Option<String>, config: &Config) -> Result<()> {
    let drills: Vec<&DrillConfig> = config
        .drills
        .iter()
        .filter(|d| only.as_deref().map_or(true, |name| d.name == name))
        .collect();

    if drills.is_empty() {
        match only {
            Some(name) => anyhow::bail!("No drill named '{}'", name),
            None => anyhow::bail!("Config defines no drills"),
        }
    }

    for drill in drills {
        let report = run_drill(drill).await?;
        let rendered =
            serde_json::to_string_pretty(&report).context("Failed to serialize drill report")?;
        println!("{}", rendered);
    }

    Ok(())
}
