use super::{PetTravelClient, json_body};
use crate::ApiResult;
use crate::endpoints::Endpoint;
use crate::executor::{FilePart, MultipartForm, RequestBody};
use crate::models::{
    CreateTravelPlanRequest, PlanFilter, PlanRequirement, PlanRequirements, ProofUpload,
    TravelPlan, TravelRequirement, UpdatePlanRequirementRequest, UpdateTravelPlanRequest,
};

/// Multipart field carrying the proof file.
const PROOF_FIELD: &str = "proof_document";

impl PetTravelClient {
    pub async fn travel_plans(&self, filter: PlanFilter) -> ApiResult<Vec<TravelPlan>> {
        self.query_list(Endpoint::TravelPlans(filter)).await
    }

    pub async fn travel_plan(&self, id: u64) -> ApiResult<TravelPlan> {
        self.query(Endpoint::TravelPlan(id)).await
    }

    pub async fn create_travel_plan(
        &self,
        request: &CreateTravelPlanRequest,
    ) -> ApiResult<TravelPlan> {
        self.mutate_json(Endpoint::CreateTravelPlan, request).await
    }

    pub async fn update_travel_plan(
        &self,
        id: u64,
        request: &UpdateTravelPlanRequest,
    ) -> ApiResult<TravelPlan> {
        self.mutate_json(Endpoint::UpdateTravelPlan(id), request)
            .await
    }

    pub async fn delete_travel_plan(&self, id: u64) -> ApiResult<()> {
        self.mutate_unit(Endpoint::DeleteTravelPlan(id)).await
    }

    /// Every catalogue requirement of the plan's destination and pet type,
    /// with the plan's progress on each.
    pub async fn plan_requirements(&self, plan_id: u64) -> ApiResult<Vec<PlanRequirement>> {
        let detail: PlanRequirements = self.query(Endpoint::PlanRequirements(plan_id)).await?;
        Ok(detail.requirements)
    }

    pub async fn update_plan_requirement(
        &self,
        plan_id: u64,
        request: &UpdatePlanRequirementRequest,
    ) -> ApiResult<TravelRequirement> {
        self.mutate(
            Endpoint::UpdatePlanRequirement(plan_id),
            Some(json_body(request)?),
        )
        .await
    }

    /// Uploads a proof document for one requirement of a plan.
    pub async fn upload_requirement_proof(
        &self,
        plan_id: u64,
        upload: ProofUpload,
    ) -> ApiResult<TravelRequirement> {
        let form = MultipartForm::new()
            .text("requirement_id", upload.requirement_id.to_string())
            .file(FilePart {
                name: PROOF_FIELD.to_string(),
                file_name: upload.file_name,
                content_type: upload.content_type,
                bytes: upload.bytes,
            });
        self.mutate(
            Endpoint::UploadProof(plan_id),
            Some(RequestBody::Multipart(form)),
        )
        .await
    }
}
