//! `tablesync config show` and `tablesync config set`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use tablesync_core::settings::{self, Settings};

use super::home_dir;

/// Show or change the stored settings.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print current settings (password masked).
    Show,

    /// Update one or more settings; unspecified values are kept.
    Set(SetArgs),
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub pass: Option<String>,

    #[arg(long)]
    pub table: Option<i64>,

    /// HTTP timeout in seconds.
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Status excluded when set on both sides; repeat to list several.
    /// Replaces the stored list.
    #[arg(long = "skip-status", value_name = "STATUS")]
    pub skip_status: Vec<String>,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(),
        ConfigCommand::Set(args) => set(args),
    }
}

fn show() -> Result<()> {
    let settings = settings::load().context("failed to load settings")?;
    print_settings(&settings);
    Ok(())
}

fn set(args: SetArgs) -> Result<()> {
    let mut settings = settings::load().context("failed to load settings")?;

    if let Some(url) = args.url {
        settings.api_url = url.trim().to_string();
    }
    if let Some(user) = args.user {
        settings.api_user = user.trim().to_string();
    }
    if let Some(pass) = args.pass {
        settings.api_pass = pass;
    }
    if let Some(table) = args.table {
        settings.table_id = table;
    }
    if let Some(timeout) = args.timeout {
        settings.timeout_secs = timeout;
    }
    if !args.skip_status.is_empty() {
        settings.skip_statuses = args.skip_status;
    }

    settings::save(&settings).context("failed to save settings")?;
    println!(
        "Settings saved to {}",
        settings::settings_path_at(&home_dir()?).display()
    );
    print_settings(&settings);
    Ok(())
}

fn print_settings(settings: &Settings) {
    let or_unset = |s: &str| {
        if s.is_empty() {
            "(not set)".to_string()
        } else {
            s.to_string()
        }
    };
    println!("API URL:       {}", or_unset(&settings.api_url));
    println!("API user:      {}", or_unset(&settings.api_user));
    println!("API password:  {}", or_unset(&settings.masked_pass()));
    println!("Table ID:      {}", settings.table_id);
    println!("Timeout:       {}s", settings.timeout_secs);
    println!("Skip statuses: {}", settings.skip_statuses.join(", "));
}
