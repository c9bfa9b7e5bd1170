//! Error types for the prerender host

use thiserror::Error;

/// The configuration source cannot be turned into a loader configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigFormatError {
    /// No `<identifier>.config(...)` call in the source.
    #[error("No config call found in configuration source")]
    MissingConfigCall,

    /// The config call's parentheses never balance.
    #[error("Unterminated config call starting at byte {offset}")]
    UnterminatedCall { offset: usize },

    /// The captured literal is not valid relaxed-literal syntax.
    #[error("Invalid config literal at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// The captured literal is valid but not an object.
    #[error("Config literal must be an object, found {found}")]
    NotAnObject { found: &'static str },

    /// The `deps` field is not a list of module names.
    #[error("Invalid deps field: {0}")]
    InvalidDependencies(String),
}

/// DOM collaborator failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Document construction failed: {0}")]
pub struct DomError(pub String);

/// Module loader failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// The loader rejected the configuration.
    #[error("Loader configuration rejected: {0}")]
    Configure(String),

    /// One or more modules failed to resolve.
    #[error("Failed to load {modules:?}: {message}")]
    Load {
        modules: Vec<String>,
        message: String,
    },

    /// The host-side require hook has no such package.
    #[error("Host module not found: {0}")]
    HostModuleNotFound(String),
}

/// Routing backend failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// `start` was called on a history that is already running.
    #[error("History has already been started")]
    AlreadyStarted,

    /// Framework-specific failure.
    #[error("Routing failed: {0}")]
    Backend(String),
}

/// Initialization queue failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializerError {
    /// The grant for a queued request was dropped without being delivered.
    #[error("Initialization queue dropped request {ticket}")]
    GrantLost { ticket: u64 },
}

/// All errors surfaced by an app instance.
#[derive(Debug, Error)]
pub enum HostError {
    /// An operation that needs a loaded runtime was called before `init`
    /// completed.
    #[error("App instance is not initialized")]
    NotInitialized,

    /// The configuration source is malformed.
    #[error(transparent)]
    ConfigFormat(#[from] ConfigFormatError),

    /// The configuration source could not be read.
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// A core module resolved to something other than what the host expects.
    #[error("Module {module} is not a {expected}")]
    ModuleShape {
        module: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Serializer(#[from] SerializerError),
}

impl HostError {
    /// Short outcome label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::ConfigFormat(_) => "config_format",
            Self::ConfigRead { .. } => "config_read",
            Self::Dom(_) => "dom",
            Self::Loader(_) => "loader",
            Self::ModuleShape { .. } => "module_shape",
            Self::Routing(_) => "routing",
            Self::Serializer(_) => "serializer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = ConfigFormatError::Syntax {
            line: 3,
            column: 7,
            message: "expected ':'".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid config literal at 3:7: expected ':'");
    }

    #[test]
    fn test_config_format_is_transparent() {
        let err = HostError::from(ConfigFormatError::MissingConfigCall);
        assert_eq!(err.to_string(), "No config call found in configuration source");
        assert_eq!(err.kind(), "config_format");
    }

    #[test]
    fn test_config_read_keeps_source() {
        let err = HostError::ConfigRead {
            path: "app/config.js".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("app/config.js"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_loader_error_lists_modules() {
        let err = LoaderError::Load {
            modules: vec!["app".to_string()],
            message: "timeout".to_string(),
        };
        assert!(err.to_string().contains("\"app\""));
    }
}
