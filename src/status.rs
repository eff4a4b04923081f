use anyhow::Result;

use crate::config::Config;
use crate::credentials::{Credentials, ALL_VARIABLES};

/// One row of `check` output.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableStatus {
    pub name: &'static str,
    pub set: bool,
}

pub fn variable_statuses(credentials: &Credentials) -> Vec<VariableStatus> {
    ALL_VARIABLES
        .iter()
        .map(|&name| VariableStatus {
            name,
            set: credentials.is_set(name),
        })
        .collect()
}

pub fn run_check(config: &Config, credentials: &Credentials) -> Result<()> {
    println!("{:<26} STATUS", "VARIABLE");
    for status in variable_statuses(credentials) {
        let label = if status.set { "SET" } else { "NOT SET" };
        println!("{:<26} {}", status.name, label);
    }

    println!();
    println!("resolved configuration:");
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
