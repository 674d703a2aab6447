//! OCR 服务 - 业务能力层
//!
//! 只负责"识别一页图片中的文字"能力，不关心重试和流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务
//!
//! 失败在这一层被分成 `RateLimited` 和 `Other` 两类，上层重试只看类型。
//! async-openai 自带的退避重试被关掉，每次 `extract` 只发一次请求。

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use backoff::ExponentialBackoff;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ExtractFailure;
use crate::models::ImageKind;

/// 固定的识别提示词
pub const OCR_PROMPT: &str = "Extract all text from this scanned document image. \
Preserve the original structure and formatting as much as possible. \
Return only the extracted text, no commentary.";

/// 待识别的一页图片
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 文件名（仅用于日志）
    pub file_name: String,
    /// MIME 类型
    pub mime_type: &'static str,
    /// `data:{mime};base64,...` 形式的图片
    pub data_url: String,
}

impl PageImage {
    /// 编码图片内容
    pub fn encode(file_name: impl Into<String>, kind: ImageKind, bytes: &[u8]) -> Self {
        let mime_type = kind.mime_type();
        Self {
            file_name: file_name.into(),
            mime_type,
            data_url: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
        }
    }
}

/// 文字识别能力
pub trait TextExtractor {
    /// 识别一页图片
    ///
    /// # 参数
    /// - `prompt`: 提示词
    /// - `image`: 已编码的图片
    fn extract(
        &self,
        prompt: &str,
        image: &PageImage,
    ) -> impl Future<Output = Result<String, ExtractFailure>>;
}

/// OpenAI 兼容接口的 OCR 服务
pub struct OcrService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OcrService {
    /// 创建新的 OCR 服务
    ///
    /// 没有 API key 时也能创建，是否发请求由流程层根据配置决定
    pub fn new(config: &Config) -> Self {
        let mut openai_config =
            OpenAIConfig::new().with_api_key(config.openai_api_key.clone().unwrap_or_default());
        if let Some(api_base) = &config.openai_api_base {
            openai_config = openai_config.with_api_base(api_base);
        }

        Self {
            client: Client::with_config(openai_config).with_backoff(single_attempt()),
            model_name: config.openai_model.clone(),
        }
    }

    /// 使用的模型名称
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn send(&self, prompt: &str, image: &PageImage) -> Result<String, OpenAIError> {
        debug!(
            "调用 OCR API，模型: {}, 图片: {} ({})",
            self.model_name, image.file_name, image.mime_type
        );

        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: prompt.to_string(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: image.data_url.clone(),
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .build()?;

        let response = self.client.chat().create(request).await?;

        debug!("OCR API 调用成功");

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

impl TextExtractor for OcrService {
    async fn extract(&self, prompt: &str, image: &PageImage) -> Result<String, ExtractFailure> {
        match self.send(prompt, image).await {
            Ok(content) if content.trim().is_empty() => Err(ExtractFailure::Other(format!(
                "OCR 返回内容为空 (模型: {})",
                self.model_name
            ))),
            Ok(content) => Ok(content.trim().to_string()),
            Err(e) => {
                let failure = classify(e);
                warn!("OCR API 调用失败: {}", failure);
                Err(failure)
            }
        }
    }
}

/// 不重试的退避策略：任何失败都立即返回
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    }
}

/// 把 async-openai 的错误归为可重试 / 不可重试
fn classify(err: OpenAIError) -> ExtractFailure {
    match err {
        OpenAIError::ApiError(api) if is_rate_limit(&api) => ExtractFailure::RateLimited(api.message),
        other => ExtractFailure::Other(other.to_string()),
    }
}

/// 限流：OpenAI 的 `rate_limit_exceeded`，或兼容服务（如 Azure）直接给出的 `429`
///
/// 额度用尽（`insufficient_quota`）同样是 429，但重试无用
fn is_rate_limit(api: &ApiError) -> bool {
    matches!(api.code.as_deref(), Some("rate_limit_exceeded") | Some("429"))
        || matches!(api.r#type.as_deref(), Some("requests") | Some("tokens"))
}
