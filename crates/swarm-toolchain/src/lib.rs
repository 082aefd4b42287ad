//! External toolchain plumbing for the contract swarm.
//!
//! - `CommandRunner` / `LocalCommandRunner`: spawn a program without a shell
//! - `ArtifactWriter`: persist generated text under a project root
//! - `BuildRunner`: `anchor build` then `anchor test`, reduced to pass/fail
//! - `AnchorProject`: `anchor init` and `Anchor.toml` registration

pub mod anchor;
pub mod artifact;
pub mod build;
pub mod runner;

pub use anchor::{AnchorProject, InitOutcome};
pub use artifact::ArtifactWriter;
pub use build::{BuildReport, BuildRunner, DEFAULT_PROGRAM, INSTALL_HINT};
pub use runner::{CommandRunner, ExecResult, LocalCommandRunner};
