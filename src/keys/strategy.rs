use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::context::CallContext;
use crate::error::{Result, StorageError};

/// How a [`CallContext`] is turned into a storage key sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Interface placeholder. Deriving keys with it always fails.
    Reference,
    /// Static call-site identity only: `[module, qualname, call_site]`.
    ///
    /// Argument values are ignored, so repeated calls from one site are told
    /// apart by the order of the list container.
    #[default]
    Default,
    /// Call-site identity plus a fingerprint of the arguments.
    Simple,
}

impl KeyStrategy {
    pub const ALL: [KeyStrategy; 3] = [Self::Reference, Self::Default, Self::Simple];

    /// Identifier written into storage metadata.
    pub fn identifier(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Default => "default",
            Self::Simple => "simple",
        }
    }

    pub fn from_identifier(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.identifier() == raw)
    }

    pub fn derive_keys(self, context: &CallContext) -> Result<Vec<String>> {
        match self {
            Self::Reference => Err(StorageError::KeyStrategyUnsupported(
                "the reference strategy is not implemented".to_string(),
            )),
            Self::Default => call_site_keys(context),
            Self::Simple => {
                let mut keys = call_site_keys(context)?;
                keys.push(args_fingerprint(&context.args));
                Ok(keys)
            }
        }
    }
}

impl fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for KeyStrategy {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_identifier(s)
            .ok_or_else(|| StorageError::KeyStrategyUnsupported(format!("unknown strategy {s:?}")))
    }
}

fn call_site_keys(context: &CallContext) -> Result<Vec<String>> {
    if !context.is_resolvable() {
        return Err(StorageError::KeyStrategyUnsupported(format!(
            "cannot resolve call-site identity (module: {:?}, qualname: {:?})",
            context.module, context.qualname
        )));
    }

    let mut keys = vec![context.module.clone(), context.qualname.clone()];
    if let Some(site) = &context.call_site {
        keys.push(site.to_string());
    }
    Ok(keys)
}

/// Stable hex digest of the arguments, independent of object key order.
pub fn args_fingerprint(args: &[Value]) -> String {
    let mut hasher = Sha256::new();
    for arg in args {
        let canonical = serde_jcs::to_string(arg).unwrap_or_else(|_| arg.to_string());
        hasher.update(canonical.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
