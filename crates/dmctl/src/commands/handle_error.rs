//! handle-error: skip, replace or revert a failing binlog event
//!
//! `replace` takes the replacement statements as free-form trailing
//! arguments, e.g.
//!
//! ```text
//! dmctl handle-error test replace "ALTER TABLE tb ADD COLUMN c INT; ALTER TABLE tb ADD INDEX idx(c)"
//! ```

use std::io::Write;

use clap::Args;
use dmctl_proto::{ErrorOp, HandleErrorRequest};
use tracing::debug;

use super::{print_task_response, rpc_request, SourceArgs};
use crate::context::CtlContext;
use crate::files::task_name_from_arg_or_file;
use crate::render::Response;
use crate::statements::extract_sqls_from_args;
use crate::{Error, Result};

/// handle-error arguments
#[derive(Args, Debug)]
pub struct HandleErrorArgs {
    /// Task name, or path of the task file
    pub task: String,

    /// skip, replace or revert
    pub op: String,

    /// Replacement SQL for `replace`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub sqls: Vec<String>,

    /// Binlog position of the failing event, e.g. mysql-bin.000001:2345
    #[arg(short = 'b', long)]
    pub binlog_pos: Option<String>,

    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Turn parsed arguments into the request to send
fn build_request(args: HandleErrorArgs) -> Result<HandleErrorRequest> {
    let op = match ErrorOp::from_cli_name(&args.op) {
        Some(op @ (ErrorOp::Skip | ErrorOp::Replace | ErrorOp::Revert)) => op,
        _ => {
            return Err(Error::validation(format!(
                "invalid op '{}', expected skip, replace or revert",
                args.op
            )))
        }
    };

    let sqls = if op == ErrorOp::Replace {
        extract_sqls_from_args(&args.sqls)?
    } else if !args.sqls.is_empty() {
        return Err(Error::validation(format!(
            "op '{}' does not take SQL statements",
            args.op
        )));
    } else {
        Vec::new()
    };

    Ok(HandleErrorRequest {
        op: op as i32,
        task: task_name_from_arg_or_file(&args.task),
        binlog_pos: args.binlog_pos.unwrap_or_default(),
        sqls,
        sources: args.sources.sources,
    })
}

/// Run handle-error
pub async fn run(ctx: &CtlContext, args: HandleErrorArgs, out: &mut impl Write) -> Result<()> {
    let request = build_request(args)?;
    debug!(task = %request.task, op = request.op().as_str_name(), sqls = request.sqls.len(), "Handling error");

    let resp = ctx
        .master_client()?
        .handle_error(rpc_request(ctx, request))
        .await?
        .into_inner();

    print_task_response(out, Response::HandleError(resp));
    Ok(())
}
