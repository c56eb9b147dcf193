//! 分类功能：DTO、客户端（HTTP / Mock）、属性表与服务端分类逻辑

pub mod api;
pub mod dto;
pub mod mock;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;
pub mod service;

pub use api::{ClassifierApi, HttpClassifierApi};
pub use dto::{
    ClassificationSchemaDto, ClassifiedMessageDto, ClassifierAttributeDto, ClassifyingMessageDto,
};
pub use mock::MockClassifierApi;
pub use service::{ClassifierError, ClassifierService};
