//! gRPC client for the `pb.Master` service.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::codegen::{Body, Bytes, GrpcMethod, StdError};

use crate::pb::{
    CheckTaskRequest, CheckTaskResponse, HandleErrorRequest, HandleErrorResponse,
    OperateTaskRequest, OperateTaskResponse, QueryStatusListRequest, QueryStatusListResponse,
    StartTaskRequest, StartTaskResponse, UpdateTaskRequest, UpdateTaskResponse,
};

const SERVICE: &str = "pb.Master";

/// Client for the DM master control API.
///
/// Cloning is cheap; clones share the underlying transport.
#[derive(Debug, Clone)]
pub struct MasterClient<T> {
    inner: tonic::client::Grpc<T>,
}

impl<T> MasterClient<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    /// Wrap an established transport
    pub fn new(inner: T) -> Self {
        Self {
            inner: tonic::client::Grpc::new(inner),
        }
    }

    pub async fn start_task(
        &mut self,
        request: impl tonic::IntoRequest<StartTaskRequest>,
    ) -> Result<tonic::Response<StartTaskResponse>, tonic::Status> {
        self.unary(request.into_request(), "StartTask", "/pb.Master/StartTask")
            .await
    }

    pub async fn update_task(
        &mut self,
        request: impl tonic::IntoRequest<UpdateTaskRequest>,
    ) -> Result<tonic::Response<UpdateTaskResponse>, tonic::Status> {
        self.unary(request.into_request(), "UpdateTask", "/pb.Master/UpdateTask")
            .await
    }

    pub async fn check_task(
        &mut self,
        request: impl tonic::IntoRequest<CheckTaskRequest>,
    ) -> Result<tonic::Response<CheckTaskResponse>, tonic::Status> {
        self.unary(request.into_request(), "CheckTask", "/pb.Master/CheckTask")
            .await
    }

    pub async fn operate_task(
        &mut self,
        request: impl tonic::IntoRequest<OperateTaskRequest>,
    ) -> Result<tonic::Response<OperateTaskResponse>, tonic::Status> {
        self.unary(request.into_request(), "OperateTask", "/pb.Master/OperateTask")
            .await
    }

    pub async fn handle_error(
        &mut self,
        request: impl tonic::IntoRequest<HandleErrorRequest>,
    ) -> Result<tonic::Response<HandleErrorResponse>, tonic::Status> {
        self.unary(request.into_request(), "HandleError", "/pb.Master/HandleError")
            .await
    }

    pub async fn query_status(
        &mut self,
        request: impl tonic::IntoRequest<QueryStatusListRequest>,
    ) -> Result<tonic::Response<QueryStatusListResponse>, tonic::Status> {
        self.unary(
            request.into_request(),
            "QueryStatus",
            "/pb.Master/QueryStatus",
        )
        .await
    }

    async fn unary<Req, Resp>(
        &mut self,
        mut request: tonic::Request<Req>,
        method: &'static str,
        path: &'static str,
    ) -> Result<tonic::Response<Resp>, tonic::Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
        })?;
        let codec = tonic::codec::ProstCodec::default();
        request
            .extensions_mut()
            .insert(GrpcMethod::new(SERVICE, method));
        self.inner
            .unary(request, PathAndQuery::from_static(path), codec)
            .await
    }
}
