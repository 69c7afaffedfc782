//! query-status

use std::io::Write;

use clap::Args;
use dmctl_proto::QueryStatusListRequest;

use super::{print_task_response, rpc_request, SourceArgs};
use crate::context::CtlContext;
use crate::files::task_name_from_arg_or_file;
use crate::render::Response;
use crate::Result;

/// query-status arguments
#[derive(Args, Debug)]
pub struct QueryStatusArgs {
    /// Task name or task file; all tasks when omitted
    pub task: Option<String>,

    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Run query-status
pub async fn run(ctx: &CtlContext, args: QueryStatusArgs, out: &mut impl Write) -> Result<()> {
    let name = args
        .task
        .as_deref()
        .map(task_name_from_arg_or_file)
        .unwrap_or_default();

    let request = QueryStatusListRequest {
        name,
        sources: args.sources.sources,
    };
    let resp = ctx
        .master_client()?
        .query_status(rpc_request(ctx, request))
        .await?
        .into_inner();

    print_task_response(out, Response::QueryStatus(resp));
    Ok(())
}
