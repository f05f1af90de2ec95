//! Chainlog: structured logging with immutable context chains
//!
//! Provides a leveled logging facade on top of `tracing`, built around
//! copy-on-write context chains and a lock-guarded shared registry.
//!
//! # Features
//!
//! - **Context Chains**: [`Chain`] accumulates typed fields; every `with_*`
//!   returns a new chain and leaves the original untouched
//! - **Legacy Call Conventions**: printf-style messages, flat key/value
//!   pairs and tag dispatch through [`Chain::log`]
//! - **Shared Registry**: [`Registry`] holds the configuration and active
//!   logger; [`global`] exposes a process-wide default
//! - **Multiple Output Formats**: JSON, pretty and compact records written to
//!   stdout, stderr, files or memory
//!
//! # Example
//!
//! ```ignore
//! use chainlog::{Log, LogConfig, Value, WrappedLogger};
//!
//! let logger = WrappedLogger::new("api", &LogConfig::from_env()?, &[])?;
//!
//! let request = logger.chain().with_string("request_id", "req-001");
//! request.info("handled in %dms", &[Value::from(12)]);
//!
//! logger.infow("ready", &[Value::from("port"), Value::from(8080)]);
//! ```

pub mod chain;
pub mod config;
pub mod engine;
pub mod field;
pub mod format;
pub mod global;
mod json;
pub mod keyvals;
pub mod level;
pub mod logger;
pub mod macros;
pub mod registry;
pub mod sink;

pub use chain::Chain;
pub use config::{EncoderConfig, FatalAction, LogConfig, LogError, LogFormat, LogResult, OutputTarget};
pub use engine::Core;
pub use field::{Field, Fields, Value};
pub use keyvals::chain_with;
pub use level::Level;
pub use logger::{Log, WrappedLogger};
pub use registry::Registry;
pub use sink::MemorySink;
