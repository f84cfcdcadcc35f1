//! CLI subcommand implementations
//!
//! One module per subcommand, each exposing a `run(...) -> Result<()>` entry
//! point called from `main`. Commands that need async build their own tokio
//! runtime and `block_on`.

pub mod bot;
pub mod dca;
pub mod grid;
pub mod price;
pub mod replay;
pub mod run;
pub mod sweep;
