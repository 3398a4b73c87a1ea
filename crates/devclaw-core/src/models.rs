//! Shared model types crossing crate boundaries.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A single retrieval hit. Higher score = more relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub file_id: String,
    pub text: String,
    pub score: f64,
}

impl SearchResult {
    pub fn new(file_id: impl Into<String>, text: impl Into<String>, score: f64) -> Self {
        Self {
            file_id: file_id.into(),
            text: text.into(),
            score,
        }
    }
}

/// Script runtime, normally inferred from the file extension. Shared by
/// skill discovery and the sandbox runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Python,
    Node,
    Shell,
    Deno,
}

impl Runtime {
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Some(Self::Python),
            Some("js") | Some("mjs") => Some(Self::Node),
            Some("sh") | Some("bash") => Some(Self::Shell),
            Some("ts") => Some(Self::Deno),
            _ => None,
        }
    }

    /// Interpreter binary name, resolved through PATH by the executor.
    pub fn interpreter(&self) -> &'static str {
        match self {
            Self::Python => "python3",
            Self::Node => "node",
            Self::Shell => "bash",
            Self::Deno => "deno",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Node => "node",
            Self::Shell => "shell",
            Self::Deno => "deno",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_inferred_from_extension() {
        assert_eq!(
            Runtime::from_extension(Path::new("a/b/tool.py")),
            Some(Runtime::Python)
        );
        assert_eq!(
            Runtime::from_extension(Path::new("run.mjs")),
            Some(Runtime::Node)
        );
        assert_eq!(
            Runtime::from_extension(Path::new("setup.sh")),
            Some(Runtime::Shell)
        );
        assert_eq!(
            Runtime::from_extension(Path::new("x.ts")),
            Some(Runtime::Deno)
        );
        assert_eq!(Runtime::from_extension(Path::new("binary")), None);
    }
}
