//! dmctl library
//!
//! Client side of the DM master control API:
//!
//! - [`channel`]: dial a TLS-secured gRPC connection with a bounded timeout
//! - [`context`]: the single active config and connection
//! - [`render`]: print responses as indented JSON without mangling
//!   embedded pre-check reports
//! - [`statements`]: split free-form arguments into SQL statements

pub mod channel;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod files;
pub mod render;
pub mod retry;
pub mod statements;
pub mod tls;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};
use dmctl_proto::TaskOp;

use crate::commands::GlobalArgs;
use crate::context::CtlContext;

/// dmctl - control a DM cluster through dm-master
#[derive(Parser, Debug)]
#[command(name = "dmctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a task from a task file
    StartTask(commands::task::StartTaskArgs),
    /// Update a task from a task file
    UpdateTask(commands::task::UpdateTaskArgs),
    /// Run the pre-check for a task file
    CheckTask(commands::task::CheckTaskArgs),
    /// Pause a running task
    PauseTask(commands::operate_task::OperateTaskArgs),
    /// Resume a paused task
    ResumeTask(commands::operate_task::OperateTaskArgs),
    /// Stop a task
    StopTask(commands::operate_task::OperateTaskArgs),
    /// Show the status of one or all tasks
    QueryStatus(commands::query_status::QueryStatusArgs),
    /// Skip, replace or revert the binlog event a task is stuck on
    HandleError(commands::handle_error::HandleErrorArgs),
}

impl Cli {
    /// Connect to dm-master and run the command
    pub async fn run(self) -> Result<()> {
        let config = self.global.load_config()?;
        let ctx = CtlContext::new();
        ctx.init(config).await?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match self.command {
            Commands::StartTask(args) => commands::task::start(&ctx, args, &mut out).await,
            Commands::UpdateTask(args) => commands::task::update(&ctx, args, &mut out).await,
            Commands::CheckTask(args) => commands::task::check(&ctx, args, &mut out).await,
            Commands::PauseTask(args) => {
                commands::operate_task::run(&ctx, TaskOp::Pause, args, &mut out).await
            }
            Commands::ResumeTask(args) => {
                commands::operate_task::run(&ctx, TaskOp::Resume, args, &mut out).await
            }
            Commands::StopTask(args) => {
                commands::operate_task::run(&ctx, TaskOp::Stop, args, &mut out).await
            }
            Commands::QueryStatus(args) => commands::query_status::run(&ctx, args, &mut out).await,
            Commands::HandleError(args) => commands::handle_error::run(&ctx, args, &mut out).await,
        }
    }
}
