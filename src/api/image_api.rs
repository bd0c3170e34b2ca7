use super::client::HttpClient;
use crate::errors::AppResult;
use crate::models::image::{
    ImageAdjustmentRequest, ImageGeneration, ImageGenerationList, ImageGenerationRequest,
};

#[derive(Clone)]
pub struct ImageApi {
    http: HttpClient,
}

impl ImageApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn generate_image(&self, request: &ImageGenerationRequest) -> AppResult<ImageGeneration> {
        self.http.post("/images/generate", request).await
    }

    pub async fn adjust_image(&self, request: &ImageAdjustmentRequest) -> AppResult<ImageGeneration> {
        self.http.post("/images/adjust", request).await
    }

    pub async fn get_conversation_images(
        &self,
        conversation_id: i64,
        skip: u32,
        limit: u32,
    ) -> AppResult<ImageGenerationList> {
        self.http
            .get_with_query(
                &format!("/images/conversation/{conversation_id}"),
                &[("skip", skip), ("limit", limit)],
            )
            .await
    }

    pub async fn get_image(&self, image_id: i64) -> AppResult<ImageGeneration> {
        self.http.get(&format!("/images/{image_id}")).await
    }
}
