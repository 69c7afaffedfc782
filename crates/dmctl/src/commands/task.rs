//! Task file commands: start-task, update-task, check-task
//!
//! Each command sends the content of a task file to dm-master. The responses
//! may carry a pre-check report, so they are printed through
//! [`print_task_response`].

use std::io::Write;

use clap::Args;
use dmctl_proto::{CheckTaskRequest, StartTaskRequest, UpdateTaskRequest};
use tracing::debug;

use super::{print_task_response, rpc_request, SourceArgs};
use crate::context::CtlContext;
use crate::files::get_file_content;
use crate::render::Response;
use crate::{Error, Result};

/// Default cap on error items in a check report
const DEFAULT_ERROR_COUNT: i64 = 10;

/// Default cap on warning items in a check report
const DEFAULT_WARN_COUNT: i64 = 10;

/// start-task arguments
#[derive(Args, Debug)]
pub struct StartTaskArgs {
    /// Path of the task file
    pub config_file: String,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Remove the task's previous checkpoints and metadata before starting
    #[arg(long)]
    pub remove_meta: bool,
}

/// update-task arguments
#[derive(Args, Debug)]
pub struct UpdateTaskArgs {
    /// Path of the task file
    pub config_file: String,

    #[command(flatten)]
    pub sources: SourceArgs,
}

/// check-task arguments
#[derive(Args, Debug)]
pub struct CheckTaskArgs {
    /// Path of the task file
    pub config_file: String,

    /// Maximum number of error items to report
    #[arg(short = 'e', long = "error", default_value_t = DEFAULT_ERROR_COUNT)]
    pub error_count: i64,

    /// Maximum number of warning items to report
    #[arg(short = 'w', long = "warn", default_value_t = DEFAULT_WARN_COUNT)]
    pub warn_count: i64,
}

fn read_task(path: &str) -> Result<String> {
    let content = get_file_content(path)?;
    String::from_utf8(content)
        .map_err(|_| Error::validation(format!("task file {} is not valid UTF-8", path)))
}

/// Run start-task
pub async fn start(ctx: &CtlContext, args: StartTaskArgs, out: &mut impl Write) -> Result<()> {
    let task = read_task(&args.config_file)?;
    debug!(file = %args.config_file, sources = ?args.sources.sources, "Starting task");

    let request = StartTaskRequest {
        task,
        sources: args.sources.sources,
        remove_meta: args.remove_meta,
    };
    let resp = ctx
        .master_client()?
        .start_task(rpc_request(ctx, request))
        .await?
        .into_inner();

    print_task_response(out, Response::StartTask(resp));
    Ok(())
}

/// Run update-task
pub async fn update(ctx: &CtlContext, args: UpdateTaskArgs, out: &mut impl Write) -> Result<()> {
    let task = read_task(&args.config_file)?;

    let request = UpdateTaskRequest {
        task,
        sources: args.sources.sources,
    };
    let resp = ctx
        .master_client()?
        .update_task(rpc_request(ctx, request))
        .await?
        .into_inner();

    print_task_response(out, Response::UpdateTask(resp));
    Ok(())
}

/// Run check-task
pub async fn check(ctx: &CtlContext, args: CheckTaskArgs, out: &mut impl Write) -> Result<()> {
    if args.error_count < 0 || args.warn_count < 0 {
        return Err(Error::validation("--error and --warn must not be negative"));
    }
    let task = read_task(&args.config_file)?;

    let request = CheckTaskRequest {
        task,
        err_cnt: args.error_count,
        warn_cnt: args.warn_count,
    };
    let resp = ctx
        .master_client()?
        .check_task(rpc_request(ctx, request))
        .await?
        .into_inner();

    print_task_response(out, Response::CheckTask(resp));
    Ok(())
}
