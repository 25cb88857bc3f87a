use super::PetTravelClient;
use crate::ApiResult;
use crate::endpoints::Endpoint;
use crate::error::ApiError;
use crate::models::{
    Country, CreateUserQueryRequest, PetType, QueryFeedbackRequest, Requirement, RequirementFilter,
    RequirementInput, UserQuery,
};

/// Accepted range of a feedback rating.
const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

impl PetTravelClient {
    pub async fn countries(&self) -> ApiResult<Vec<Country>> {
        self.query_list(Endpoint::Countries).await
    }

    pub async fn country(&self, id: u64) -> ApiResult<Country> {
        self.query(Endpoint::Country(id)).await
    }

    pub async fn pet_types(&self) -> ApiResult<Vec<PetType>> {
        self.query_list(Endpoint::PetTypes).await
    }

    pub async fn pet_type(&self, id: u64) -> ApiResult<PetType> {
        self.query(Endpoint::PetType(id)).await
    }

    pub async fn requirements(&self, filter: RequirementFilter) -> ApiResult<Vec<Requirement>> {
        self.query_list(Endpoint::Requirements(filter)).await
    }

    pub async fn requirement(&self, id: u64) -> ApiResult<Requirement> {
        self.query(Endpoint::Requirement(id)).await
    }

    pub async fn create_requirement(&self, input: &RequirementInput) -> ApiResult<Requirement> {
        self.mutate_json(Endpoint::CreateRequirement, input).await
    }

    pub async fn update_requirement(
        &self,
        id: u64,
        input: &RequirementInput,
    ) -> ApiResult<Requirement> {
        self.mutate_json(Endpoint::UpdateRequirement(id), input).await
    }

    pub async fn delete_requirement(&self, id: u64) -> ApiResult<()> {
        self.mutate_unit(Endpoint::DeleteRequirement(id)).await
    }

    pub async fn user_queries(&self) -> ApiResult<Vec<UserQuery>> {
        self.query_list(Endpoint::Queries).await
    }

    pub async fn user_query(&self, id: u64) -> ApiResult<UserQuery> {
        self.query(Endpoint::Query(id)).await
    }

    pub async fn create_user_query(
        &self,
        request: &CreateUserQueryRequest,
    ) -> ApiResult<UserQuery> {
        self.mutate_json(Endpoint::CreateQuery, request).await
    }

    /// Rates an answer. Ratings outside 1..=5 are rejected before sending.
    pub async fn update_query_feedback(
        &self,
        id: u64,
        request: &QueryFeedbackRequest,
    ) -> ApiResult<UserQuery> {
        if !RATING_RANGE.contains(&request.feedback_rating) {
            return Err(ApiError::Validation {
                status: 400,
                message: "Rating must be between 1 and 5".to_string(),
                fields: [(
                    "feedback_rating".to_string(),
                    vec!["Rating must be between 1 and 5".to_string()],
                )]
                .into_iter()
                .collect(),
            });
        }
        self.mutate_json(Endpoint::QueryFeedback(id), request).await
    }
}
