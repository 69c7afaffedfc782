//! pause-task, resume-task and stop-task

use std::io::Write;

use clap::Args;
use dmctl_proto::{OperateTaskRequest, TaskOp};
use tracing::debug;

use super::{print_task_response, rpc_request, SourceArgs};
use crate::context::CtlContext;
use crate::files::task_name_from_arg_or_file;
use crate::render::Response;
use crate::Result;

/// Arguments shared by the task operation commands
#[derive(Args, Debug)]
pub struct OperateTaskArgs {
    /// Task name, or path of the task file
    pub task: String,

    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Apply `op` to the task named by `args`
pub async fn run(
    ctx: &CtlContext,
    op: TaskOp,
    args: OperateTaskArgs,
    out: &mut impl Write,
) -> Result<()> {
    let name = task_name_from_arg_or_file(&args.task);
    debug!(task = %name, op = op.as_str_name(), "Operating task");

    let request = OperateTaskRequest {
        op: op as i32,
        name,
        sources: args.sources.sources,
    };
    let resp = ctx
        .master_client()?
        .operate_task(rpc_request(ctx, request))
        .await?
        .into_inner();

    print_task_response(out, Response::OperateTask(resp));
    Ok(())
}
