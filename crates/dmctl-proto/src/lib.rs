//! Protocol buffer definitions for the DM master control API.
//!
//! This crate provides the message types and the gRPC client for the
//! `pb.Master` service that `dmctl` talks to.
//!
//! # Message Families
//!
//! - [`StartTaskRequest`] / [`StartTaskResponse`]: start a task from a task file
//! - [`UpdateTaskRequest`] / [`UpdateTaskResponse`]: update a running task
//! - [`CheckTaskRequest`] / [`CheckTaskResponse`]: run the pre-check for a task
//! - [`OperateTaskRequest`] / [`OperateTaskResponse`]: pause, resume or stop
//! - [`HandleErrorRequest`] / [`HandleErrorResponse`]: skip or replace a failing DDL
//! - [`QueryStatusListRequest`] / [`QueryStatusListResponse`]: task status per source
//!
//! Start, update and check responses may carry a JSON-encoded pre-check
//! report inside their `msg` field.
//!
//! # JSON Form
//!
//! Every message implements [`serde::Serialize`] following the proto3 JSON
//! mapping: camelCase field names, enums by symbolic name, `int64` as strings,
//! and default values always emitted.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use dmctl_proto::{MasterClient, OperateTaskRequest, TaskOp};
//!
//! let mut client = MasterClient::new(channel);
//! let resp = client
//!     .operate_task(OperateTaskRequest {
//!         op: TaskOp::Pause as i32,
//!         name: "test".to_string(),
//!         sources: vec![],
//!     })
//!     .await?;
//! ```

mod client;
mod json;
mod pb;

pub use client::MasterClient;
pub use pb::*;
