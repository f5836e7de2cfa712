//! Call context handed to key derivation strategies.

use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source position of an intercepted call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
}

impl CallSite {
    /// Capture the location of whoever called the function this is used in.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            file: location.file().to_string(),
            line: location.line(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Identity and arguments of one intercepted call.
///
/// `module` is the Rust module path of the wrapped operation, `qualname` its
/// qualified name (`Type::method` or a bare function name). Both must be
/// non-empty for a strategy to derive keys from the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallContext {
    pub module: String,
    pub function: String,
    pub qualname: String,
    pub call_site: Option<CallSite>,
    pub args: Vec<Value>,
}

impl CallContext {
    pub fn new(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        let qualname = qualname.into();
        let function = qualname
            .rsplit("::")
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            module: module.into(),
            function,
            qualname,
            call_site: None,
            args: Vec::new(),
        }
    }

    /// Record the caller's source position as the call site.
    #[track_caller]
    pub fn here(mut self) -> Self {
        self.call_site = Some(CallSite::caller());
        self
    }

    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Whether the static identity is complete enough to derive keys from.
    pub fn is_resolvable(&self) -> bool {
        !self.module.trim().is_empty() && !self.qualname.trim().is_empty()
    }
}

/// Build a [`CallContext`] for the current module and source position.
///
/// ```
/// let ctx = tapedeck::call_context!("fetch_release", "v1.2", 3);
/// assert_eq!(ctx.function, "fetch_release");
/// assert_eq!(ctx.args.len(), 2);
/// ```
#[macro_export]
macro_rules! call_context {
    ($qualname:expr) => {
        $crate::keys::CallContext::new(module_path!(), $qualname).here()
    };
    ($qualname:expr, $($arg:expr),+ $(,)?) => {
        $crate::keys::CallContext::new(module_path!(), $qualname)
            .here()
            .with_args(vec![$($crate::__serde_json::json!($arg)),+])
    };
}
