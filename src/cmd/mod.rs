//! CLI command implementations.
//!
//! | Module    | Commands handled     |
//! |-----------|----------------------|
//! | `compile` | `Compile` (default)  |
//! | `config`  | `Config`             |

pub mod compile;
pub mod config;

pub use compile::cmd_compile;
pub use config::cmd_config;

use orgcompile::config::CliOverrides;

fn cli_overrides(cli: &super::Cli) -> CliOverrides {
    CliOverrides {
        target_org: cli.target_org.clone(),
        sf_cmd: cli.sf_cmd.clone(),
        concurrency: cli.concurrency,
        poll_interval_ms: cli.poll_interval_ms,
        verbose: cli.verbose,
    }
}
