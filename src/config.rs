//! Server configuration from CLI flags / environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use daysync_core::scheduler::SchedulerConfig;

#[derive(Parser, Debug)]
#[command(
    name = "daysync-server",
    about = "Calendar backend with recurring events and email reminders"
)]
pub struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 4280, env = "DAYSYNC_PORT")]
    pub port: u16,

    /// JSON snapshot file for the event store (in-memory only when omitted)
    #[arg(long, env = "DAYSYNC_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// How often the reminder scheduler ticks
    #[arg(long, default_value = "1m", value_parser = humantime::parse_duration)]
    pub poll_interval: Duration,

    /// Reminder lookahead tolerance window; must be at least the poll
    /// interval or events starting between ticks are missed
    #[arg(long, default_value = "90s", value_parser = humantime::parse_duration)]
    pub tolerance: Duration,

    /// Upper bound on a single notification send attempt
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub send_timeout: Duration,
}

impl Args {
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: self.poll_interval,
            tolerance: self.tolerance,
            send_timeout: self.send_timeout,
        }
    }
}
