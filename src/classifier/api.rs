//! 分类服务客户端抽象
//!
//! 视图只依赖 ClassifierApi；真实实现（HttpClassifierApi）与 Mock 实现在组装阶段二选一绑定。

use std::sync::Arc;

use async_trait::async_trait;

use crate::classifier::dto::{ClassificationSchemaDto, ClassifiedMessageDto, ClassifyingMessageDto};
use crate::core::{ApiError, ApiService, FetchRequest};

pub const SCHEMA_ENDPOINT: &str = "classifier/schema";
pub const CLASSIFY_ENDPOINT: &str = "classifier/classify";

/// 分类服务能力：获取属性 schema、提交文本分类
#[async_trait]
pub trait ClassifierApi: Send + Sync {
    async fn get_classification_schema(&self) -> Result<ClassificationSchemaDto, ApiError>;

    async fn classify(
        &self,
        request: &ClassifyingMessageDto,
    ) -> Result<ClassifiedMessageDto, ApiError>;
}

/// 通过 ApiService 访问后端
pub struct HttpClassifierApi {
    api: Arc<ApiService>,
}

impl HttpClassifierApi {
    pub fn new(api: Arc<ApiService>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ClassifierApi for HttpClassifierApi {
    async fn get_classification_schema(&self) -> Result<ClassificationSchemaDto, ApiError> {
        self.api.fetch(FetchRequest::get(SCHEMA_ENDPOINT)).await
    }

    async fn classify(
        &self,
        request: &ClassifyingMessageDto,
    ) -> Result<ClassifiedMessageDto, ApiError> {
        self.api.fetch(FetchRequest::post(CLASSIFY_ENDPOINT, request)?).await
    }
}
