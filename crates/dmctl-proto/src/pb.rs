//! Messages of the `pb` package.

use serde::Serialize;

use crate::json::{self, ProtoEnum};

/// Operation applied to a task by `OperateTask`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TaskOp {
    InvalidOp = 0,
    Stop = 1,
    Pause = 2,
    Resume = 3,
    Start = 4,
    Update = 5,
    AutoResume = 6,
}

impl TaskOp {
    /// Name of the value as it appears in the proto definition.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            TaskOp::InvalidOp => "InvalidOp",
            TaskOp::Stop => "Stop",
            TaskOp::Pause => "Pause",
            TaskOp::Resume => "Resume",
            TaskOp::Start => "Start",
            TaskOp::Update => "Update",
            TaskOp::AutoResume => "AutoResume",
        }
    }
}

impl ProtoEnum for TaskOp {
    fn as_str_name(&self) -> &'static str {
        TaskOp::as_str_name(self)
    }
}

/// Operation applied to a failing binlog event by `HandleError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorOp {
    InvalidErrorOp = 0,
    Skip = 1,
    Replace = 2,
    Revert = 3,
    Inject = 4,
    List = 5,
}

impl ErrorOp {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            ErrorOp::InvalidErrorOp => "InvalidErrorOp",
            ErrorOp::Skip => "Skip",
            ErrorOp::Replace => "Replace",
            ErrorOp::Revert => "Revert",
            ErrorOp::Inject => "Inject",
            ErrorOp::List => "List",
        }
    }

    /// Parses the lower-case command-line spelling (`skip`, `replace`, ...).
    pub fn from_cli_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "skip" => Some(ErrorOp::Skip),
            "replace" => Some(ErrorOp::Replace),
            "revert" => Some(ErrorOp::Revert),
            "inject" => Some(ErrorOp::Inject),
            "list" => Some(ErrorOp::List),
            _ => None,
        }
    }
}

impl ProtoEnum for ErrorOp {
    fn as_str_name(&self) -> &'static str {
        ErrorOp::as_str_name(self)
    }
}

/// Lifecycle stage of a subtask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Stage {
    InvalidStage = 0,
    New = 1,
    Running = 2,
    Paused = 3,
    Stopped = 4,
    Finished = 5,
}

impl Stage {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Stage::InvalidStage => "InvalidStage",
            Stage::New => "New",
            Stage::Running => "Running",
            Stage::Paused => "Paused",
            Stage::Stopped => "Stopped",
            Stage::Finished => "Finished",
        }
    }
}

impl ProtoEnum for Stage {
    fn as_str_name(&self) -> &'static str {
        Stage::as_str_name(self)
    }
}

/// Per-source result shared by most task operations.
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonWorkerResponse {
    #[prost(bool, tag = "1")]
    pub result: bool,
    #[prost(string, tag = "2")]
    pub msg: String,
    #[prost(string, tag = "3")]
    pub source: String,
    #[prost(string, tag = "4")]
    pub worker: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTaskRequest {
    /// Task file content (YAML)
    #[prost(string, tag = "1")]
    pub task: String,
    #[prost(string, repeated, tag = "2")]
    pub sources: Vec<String>,
    #[prost(bool, tag = "3")]
    pub remove_meta: bool,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTaskResponse {
    #[prost(bool, tag = "1")]
    pub result: bool,
    #[prost(string, tag = "2")]
    pub msg: String,
    #[prost(message, repeated, tag = "3")]
    pub sources: Vec<CommonWorkerResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[prost(string, tag = "1")]
    pub task: String,
    #[prost(string, repeated, tag = "2")]
    pub sources: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskResponse {
    #[prost(bool, tag = "1")]
    pub result: bool,
    #[prost(string, tag = "2")]
    pub msg: String,
    #[prost(message, repeated, tag = "3")]
    pub sources: Vec<CommonWorkerResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTaskRequest {
    #[prost(string, tag = "1")]
    pub task: String,
    /// Maximum number of error items in the report
    #[prost(int64, tag = "2")]
    #[serde(serialize_with = "json::int64")]
    pub err_cnt: i64,
    /// Maximum number of warning items in the report
    #[prost(int64, tag = "3")]
    #[serde(serialize_with = "json::int64")]
    pub warn_cnt: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTaskResponse {
    #[prost(bool, tag = "1")]
    pub result: bool,
    #[prost(string, tag = "2")]
    pub msg: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperateTaskRequest {
    #[prost(enumeration = "TaskOp", tag = "1")]
    #[serde(serialize_with = "json::task_op")]
    pub op: i32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, repeated, tag = "3")]
    pub sources: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperateTaskResponse {
    #[prost(enumeration = "TaskOp", tag = "1")]
    #[serde(serialize_with = "json::task_op")]
    pub op: i32,
    #[prost(bool, tag = "2")]
    pub result: bool,
    #[prost(string, tag = "3")]
    pub msg: String,
    #[prost(message, repeated, tag = "4")]
    pub sources: Vec<CommonWorkerResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleErrorRequest {
    #[prost(enumeration = "ErrorOp", tag = "1")]
    #[serde(serialize_with = "json::error_op")]
    pub op: i32,
    #[prost(string, tag = "2")]
    pub task: String,
    /// Binlog position of the failing event, empty for the current one
    #[prost(string, tag = "3")]
    pub binlog_pos: String,
    /// Replacement statements for `Replace` and `Inject`
    #[prost(string, repeated, tag = "4")]
    pub sqls: Vec<String>,
    #[prost(string, repeated, tag = "5")]
    pub sources: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleErrorResponse {
    #[prost(bool, tag = "1")]
    pub result: bool,
    #[prost(string, tag = "2")]
    pub msg: String,
    #[prost(message, repeated, tag = "3")]
    pub sources: Vec<CommonWorkerResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatusListRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, repeated, tag = "2")]
    pub sources: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskStatus {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(enumeration = "Stage", tag = "2")]
    #[serde(serialize_with = "json::stage")]
    pub stage: i32,
    /// Processing unit currently active (dump, load, sync)
    #[prost(string, tag = "3")]
    pub unit: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatusResponse {
    #[prost(bool, tag = "1")]
    pub result: bool,
    #[prost(string, tag = "2")]
    pub msg: String,
    #[prost(string, tag = "3")]
    pub source: String,
    #[prost(string, tag = "4")]
    pub worker: String,
    #[prost(message, repeated, tag = "5")]
    pub sub_task_status: Vec<SubTaskStatus>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatusListResponse {
    #[prost(bool, tag = "1")]
    pub result: bool,
    #[prost(string, tag = "2")]
    pub msg: String,
    #[prost(message, repeated, tag = "3")]
    pub sources: Vec<QueryStatusResponse>,
}
