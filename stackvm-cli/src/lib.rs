//! # Stack VM Front-End Support
//!
//! The [`Session`] facade that front-ends drive, and the built-in task
//! catalogue. The `stackvm` binary in this crate is a thin clap wrapper
//! around both.
//!
//! ## Example
//!
//! ```rust
//! use stackvm_cli::Session;
//! use stackvm_runtime::EngineConfig;
//!
//! let session = Session::new(EngineConfig::default()).unwrap();
//! session.load_task(1).unwrap();
//! session.run();
//! assert!(session.verify_task(1).unwrap().passed);
//! ```

pub mod session;
pub mod tasks;

pub use session::{Session, TaskInfo};
pub use tasks::{catalogue, Expectation, Seed, Task, TaskCheck};
