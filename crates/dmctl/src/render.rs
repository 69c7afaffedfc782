//! Rendering of RPC responses as indented text.
//!
//! Responses are written in the proto3 JSON form with a 4-space indent. Start,
//! update and check responses may carry a pre-check report that is itself a
//! JSON document inside their `msg` field; [`render_with_diagnostic_preservation`]
//! keeps that document byte-for-byte instead of escaping it as a string.

use std::io::Write;

use dmctl_proto::{
    CheckTaskResponse, HandleErrorResponse, OperateTaskResponse, QueryStatusListResponse,
    StartTaskResponse, UpdateTaskResponse,
};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::error;

use crate::Result;

const INDENT: &[u8] = b"    ";

/// Base of the token swapped into `msg` while serializing
const PLACEHOLDER: &str = "PLACEHOLDER";

/// Nested report header and its re-indented form.
///
/// This is a text patch over serialized output and assumes the 4-space
/// indent above.
const DETAIL_HEADER: &str = "detail: {";
const DETAIL_HEADER_INDENTED: &str = "   \tdetail: {";

/// Every response kind dmctl knows how to print.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    StartTask(StartTaskResponse),
    UpdateTask(UpdateTaskResponse),
    CheckTask(CheckTaskResponse),
    OperateTask(OperateTaskResponse),
    HandleError(HandleErrorResponse),
    QueryStatus(QueryStatusListResponse),
}

impl Response {
    /// The `msg` field of kinds whose message may embed a JSON report
    fn diagnostic_msg_mut(&mut self) -> Option<&mut String> {
        match self {
            Response::StartTask(resp) => Some(&mut resp.msg),
            Response::UpdateTask(resp) => Some(&mut resp.msg),
            Response::CheckTask(resp) => Some(&mut resp.msg),
            Response::OperateTask(_) | Response::HandleError(_) | Response::QueryStatus(_) => {
                None
            }
        }
    }

    fn diagnostic_msg(&self) -> Option<&str> {
        match self {
            Response::StartTask(resp) => Some(&resp.msg),
            Response::UpdateTask(resp) => Some(&resp.msg),
            Response::CheckTask(resp) => Some(&resp.msg),
            Response::OperateTask(_) | Response::HandleError(_) | Response::QueryStatus(_) => {
                None
            }
        }
    }
}

macro_rules! impl_from_response {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Response {
                fn from(resp: $ty) -> Self {
                    Response::$variant(resp)
                }
            }
        )*
    };
}

impl_from_response! {
    StartTask => StartTaskResponse,
    UpdateTask => UpdateTaskResponse,
    CheckTask => CheckTaskResponse,
    OperateTask => OperateTaskResponse,
    HandleError => HandleErrorResponse,
    QueryStatus => QueryStatusListResponse,
}

/// Serialize `value` as JSON with a 4-space indent.
///
/// Works for any `Serialize` type; for proto messages it yields enum names
/// and keeps default-valued fields.
pub fn render_generic<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    // serde_json only writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render `resp` keeping a JSON report embedded in its `msg` verbatim.
///
/// Returns `Ok(None)` when the kind has no such message or the message does
/// not contain `marker`; the caller should then use [`render_generic`].
pub fn render_with_diagnostic_preservation(resp: &Response, marker: &str) -> Result<Option<String>> {
    let Some(raw_msg) = resp.diagnostic_msg() else {
        return Ok(None);
    };
    if !raw_msg.contains(marker) {
        return Ok(None);
    }

    let (placeholder, serialized) = serialize_with_placeholder(resp)?;
    let restored = serialized.replacen(&placeholder, raw_msg, 1);
    Ok(Some(restored.replace(DETAIL_HEADER, DETAIL_HEADER_INDENTED)))
}

/// Serialize a copy of `resp` whose `msg` holds a token found nowhere else
/// in the output.
fn serialize_with_placeholder(resp: &Response) -> Result<(String, String)> {
    let mut copy = resp.clone();
    let mut n = 0u64;
    loop {
        let placeholder = format!("{}{}", PLACEHOLDER, n);
        if let Some(msg) = copy.diagnostic_msg_mut() {
            msg.clone_from(&placeholder);
        }
        let serialized = render_generic(&copy)?;
        if serialized.matches(placeholder.as_str()).count() == 1 {
            return Ok((placeholder, serialized));
        }
        n += 1;
    }
}

/// Write a single formatted line
pub fn print_lines(out: &mut impl Write, line: impl std::fmt::Display) {
    let _ = writeln!(out, "{}", line);
}

/// Write `value` rendered generically.
///
/// A serialization failure is written as a one-line diagnostic instead.
pub fn print_response<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) {
    match render_generic(value) {
        Ok(text) => print_lines(out, text),
        Err(e) => {
            error!(error = %e, "Failed to render response");
            print_lines(out, e);
        }
    }
}

/// Write `resp` through the diagnostic-preserving path.
///
/// Returns `false` when nothing was written because the marker is absent or
/// rendering failed; the caller should fall back to [`print_response`].
pub fn print_response_with_check_task(
    out: &mut impl Write,
    resp: &Response,
    marker: &str,
) -> bool {
    match render_with_diagnostic_preservation(resp, marker) {
        Ok(Some(text)) => {
            print_lines(out, text);
            true
        }
        Ok(None) => false,
        Err(e) => {
            error!(error = %e, "Failed to render response");
            print_lines(out, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use dmctl_proto::{CommonWorkerResponse, TaskOp};

    use super::*;

    const REPORT: &str = r#"{"results":[{"id":1,"name":"mysql_version","state":"fail","errors":[{"severity":"fail","short_error":"version too low \"5.5\""}]}],"summary":{"passed":false,"total":1}}"#;

    fn check_response(msg: &str) -> Response {
        Response::CheckTask(CheckTaskResponse {
            result: false,
            msg: msg.to_string(),
        })
    }

    #[test]
    fn test_generic_uses_four_space_indent() {
        let text = render_generic(&CheckTaskResponse {
            result: true,
            msg: "ok".to_string(),
        })
        .expect("render should succeed");
        assert_eq!(text, "{\n    \"result\": true,\n    \"msg\": \"ok\"\n}");
    }

    #[test]
    fn test_generic_keeps_default_fields() {
        let text = render_generic(&CheckTaskResponse::default()).expect("render should succeed");
        assert!(text.contains("\"result\": false"));
        assert!(text.contains("\"msg\": \"\""));
    }

    #[test]
    fn test_generic_expands_enum_names() {
        let resp = OperateTaskResponse {
            op: TaskOp::Stop as i32,
            result: true,
            ..Default::default()
        };
        let text = render_generic(&Response::from(resp)).expect("render should succeed");
        assert!(text.contains("\"op\": \"Stop\""));
        assert!(text.contains("\"sources\": []"));
    }

    #[test]
    fn test_embedded_report_kept_verbatim() {
        let resp = check_response(REPORT);
        let text = render_with_diagnostic_preservation(&resp, "results")
            .expect("render should succeed")
            .expect("marker should be found");

        assert!(text.contains(REPORT));
        assert!(text.contains("\"result\": false"));
        assert!(!text.contains(PLACEHOLDER));
    }

    #[test]
    fn test_generic_path_would_escape_report() {
        let text = render_generic(&check_response(REPORT)).expect("render should succeed");
        assert!(!text.contains(REPORT));
    }

    #[test]
    fn test_marker_absent_is_not_rendered() {
        let resp = check_response("pre-check is passed");
        let rendered =
            render_with_diagnostic_preservation(&resp, "detail").expect("render should succeed");
        assert!(rendered.is_none());
    }

    #[test]
    fn test_generic_kind_is_not_rendered() {
        let resp = Response::OperateTask(OperateTaskResponse {
            msg: "detail: {}".to_string(),
            ..Default::default()
        });
        let rendered =
            render_with_diagnostic_preservation(&resp, "detail").expect("render should succeed");
        assert!(rendered.is_none());
    }

    #[test]
    fn test_detail_header_reindented() {
        let msg = "fail to check synchronization configuration with type: no errors but some warnings\n detail: {\"results\":[]}";
        let resp = Response::StartTask(StartTaskResponse {
            result: false,
            msg: msg.to_string(),
            sources: vec![],
        });

        let text = render_with_diagnostic_preservation(&resp, "detail")
            .expect("render should succeed")
            .expect("marker should be found");
        assert!(text.contains("\n    \tdetail: {\"results\":[]}"));
    }

    #[test]
    fn test_placeholder_collision_in_other_fields() {
        let resp = Response::UpdateTask(UpdateTaskResponse {
            result: false,
            msg: REPORT.to_string(),
            sources: vec![CommonWorkerResponse {
                result: true,
                msg: "PLACEHOLDER0".to_string(),
                source: "mysql-replica-01".to_string(),
                worker: "worker1".to_string(),
            }],
        });

        let text = render_with_diagnostic_preservation(&resp, "results")
            .expect("render should succeed")
            .expect("marker should be found");
        assert!(text.contains(REPORT));
        assert!(text.contains("\"msg\": \"PLACEHOLDER0\""));
        assert_eq!(text.matches(REPORT).count(), 1);
    }

    #[test]
    fn test_caller_response_unchanged() {
        let resp = check_response(REPORT);
        let _ = render_with_diagnostic_preservation(&resp, "results");
        match resp {
            Response::CheckTask(inner) => assert_eq!(inner.msg, REPORT),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_print_with_check_task_writes_newline_terminated_block() {
        let mut out = Vec::new();
        let printed = print_response_with_check_task(&mut out, &check_response(REPORT), "results");

        assert!(printed);
        let text = String::from_utf8(out).expect("output should be UTF-8");
        assert!(text.ends_with("}\n"));
        assert!(text.contains(REPORT));
    }

    #[test]
    fn test_print_with_check_task_falls_back() {
        let mut out = Vec::new();
        let resp = check_response("pre-check is passed");

        if !print_response_with_check_task(&mut out, &resp, "detail") {
            print_response(&mut out, &resp);
        }
        let text = String::from_utf8(out).expect("output should be UTF-8");
        assert!(text.contains("\"msg\": \"pre-check is passed\""));
    }
}
