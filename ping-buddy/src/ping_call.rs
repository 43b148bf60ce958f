use clap::Args;
use log::debug;

use crate::model::RunConfig;

pub use self::caller::{Caller, Prober};
pub use self::command::{Platform, ProbeCommand};

mod caller;
mod command;
pub mod parser;

#[derive(Args, Clone, Debug)]
#[group(id = "ping")]
pub struct Params {
    /// Name or FQ path of the system ping binary
    #[arg(long, default_value = "ping", env = "PING_BIN_PATH")]
    bin_path: String,
}

impl Params {
    pub fn to_caller(&self, config: &RunConfig) -> Caller {
        let command = ProbeCommand::single_echo(
            Platform::current(),
            &self.bin_path,
            &config.target,
            Some(config.timeout_secs),
        );
        let caller = Caller::new(command, config.target.to_string());
        debug!("Using ping caller: {:?}", caller);
        caller
    }
}
