pub mod args;
pub mod assets;
pub mod callable;
pub mod counter;
pub mod failing;
pub mod interceptor;
pub mod namespace;

pub use args::{ArgKey, BoundArgs, CallArgs, CallKind, Param, Signature};
pub use assets::AssetPaths;
pub use callable::{AsyncCallable, AsyncFunction, Callable, Function, HasSignature};
pub use counter::CallCounter;
pub use failing::{FailingFunction, FailureBudget};
pub use interceptor::{CallHooks, FnHooks, Interceptor, NoopHooks};
pub use namespace::{Namespace, SwapGuard};

/// Initialize structured JSON logging on stderr
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
