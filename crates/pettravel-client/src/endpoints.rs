//! Endpoint registry.
//!
//! Every REST operation the client knows about is an [`Endpoint`]. Its route,
//! the cache tags its result provides and the tags a successful call
//! invalidates are pure functions of the variant, so the invalidation graph
//! can be checked without a network.

use reqwest::Method;
use serde_json::Value;

use crate::cache::{QueryKey, Tag, TagType};
use crate::executor::ApiRequest;
use crate::models::{PlanFilter, RequirementFilter};
use crate::refresh::REFRESH_PATH;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    // auth
    Register,
    Login,
    RefreshToken,
    VerifyToken,
    GetProfile,
    UpdateProfile,
    ChangePassword,
    RequestPasswordReset,
    ConfirmPasswordReset,
    VerifyEmail,
    /// Local only: drops the session and the cache.
    Logout,

    // travel catalogue
    Countries,
    Country(u64),
    PetTypes,
    PetType(u64),
    Requirements(RequirementFilter),
    Requirement(u64),
    CreateRequirement,
    UpdateRequirement(u64),
    DeleteRequirement(u64),
    Queries,
    Query(u64),
    CreateQuery,
    QueryFeedback(u64),

    // pets
    Pets,
    Pet(u64),
    CreatePet,
    UpdatePet(u64),
    DeletePet(u64),

    // travel plans
    TravelPlans(PlanFilter),
    TravelPlan(u64),
    CreateTravelPlan,
    UpdateTravelPlan(u64),
    DeleteTravelPlan(u64),
    PlanRequirements(u64),
    UpdatePlanRequirement(u64),
    UploadProof(u64),
}

impl Endpoint {
    /// Stable name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::RefreshToken => "refresh_token",
            Self::VerifyToken => "verify_token",
            Self::GetProfile => "get_profile",
            Self::UpdateProfile => "update_profile",
            Self::ChangePassword => "change_password",
            Self::RequestPasswordReset => "request_password_reset",
            Self::ConfirmPasswordReset => "confirm_password_reset",
            Self::VerifyEmail => "verify_email",
            Self::Logout => "logout",
            Self::Countries => "get_countries",
            Self::Country(_) => "get_country",
            Self::PetTypes => "get_pet_types",
            Self::PetType(_) => "get_pet_type",
            Self::Requirements(_) => "get_requirements",
            Self::Requirement(_) => "get_requirement",
            Self::CreateRequirement => "create_requirement",
            Self::UpdateRequirement(_) => "update_requirement",
            Self::DeleteRequirement(_) => "delete_requirement",
            Self::Queries => "get_user_queries",
            Self::Query(_) => "get_user_query",
            Self::CreateQuery => "create_user_query",
            Self::QueryFeedback(_) => "update_query_feedback",
            Self::Pets => "get_pets",
            Self::Pet(_) => "get_pet",
            Self::CreatePet => "create_pet",
            Self::UpdatePet(_) => "update_pet",
            Self::DeletePet(_) => "delete_pet",
            Self::TravelPlans(_) => "get_travel_plans",
            Self::TravelPlan(_) => "get_travel_plan",
            Self::CreateTravelPlan => "create_travel_plan",
            Self::UpdateTravelPlan(_) => "update_travel_plan",
            Self::DeleteTravelPlan(_) => "delete_travel_plan",
            Self::PlanRequirements(_) => "get_plan_requirements",
            Self::UpdatePlanRequirement(_) => "update_plan_requirement",
            Self::UploadProof(_) => "upload_requirement_proof",
        }
    }

    /// HTTP method and path relative to the base URL. `None` for local-only
    /// operations.
    pub fn route(&self) -> Option<(Method, String)> {
        let route = match self {
            Self::Register => (Method::POST, "auth/register/".to_string()),
            Self::Login => (Method::POST, "auth/login/".to_string()),
            Self::RefreshToken => (Method::POST, REFRESH_PATH.to_string()),
            Self::VerifyToken => (Method::POST, "auth/token/verify/".to_string()),
            Self::GetProfile => (Method::GET, "auth/profile/".to_string()),
            Self::UpdateProfile => (Method::PATCH, "auth/profile/".to_string()),
            Self::ChangePassword => (Method::POST, "auth/profile/change-password/".to_string()),
            Self::RequestPasswordReset => (Method::POST, "auth/password/reset/".to_string()),
            Self::ConfirmPasswordReset => {
                (Method::POST, "auth/password/reset/confirm/".to_string())
            }
            Self::VerifyEmail => (Method::POST, "auth/verify-email/".to_string()),
            Self::Logout => return None,

            Self::Countries => (Method::GET, "countries/".to_string()),
            Self::Country(id) => (Method::GET, format!("countries/{id}/")),
            Self::PetTypes => (Method::GET, "pet-types/".to_string()),
            Self::PetType(id) => (Method::GET, format!("pet-types/{id}/")),
            Self::Requirements(_) => (Method::GET, "requirements/".to_string()),
            Self::Requirement(id) => (Method::GET, format!("requirements/{id}/")),
            Self::CreateRequirement => (Method::POST, "requirements/".to_string()),
            Self::UpdateRequirement(id) => (Method::PATCH, format!("requirements/{id}/")),
            Self::DeleteRequirement(id) => (Method::DELETE, format!("requirements/{id}/")),
            Self::Queries => (Method::GET, "queries/".to_string()),
            Self::Query(id) => (Method::GET, format!("queries/{id}/")),
            Self::CreateQuery => (Method::POST, "queries/".to_string()),
            Self::QueryFeedback(id) => (Method::PATCH, format!("queries/{id}/")),

            Self::Pets => (Method::GET, "pets/".to_string()),
            Self::Pet(id) => (Method::GET, format!("pets/{id}/")),
            Self::CreatePet => (Method::POST, "pets/".to_string()),
            Self::UpdatePet(id) => (Method::PATCH, format!("pets/{id}/")),
            Self::DeletePet(id) => (Method::DELETE, format!("pets/{id}/")),

            Self::TravelPlans(_) => (Method::GET, "travel/plans/".to_string()),
            Self::TravelPlan(id) => (Method::GET, format!("travel/plans/{id}/")),
            Self::CreateTravelPlan => (Method::POST, "travel/plans/".to_string()),
            Self::UpdateTravelPlan(id) => (Method::PATCH, format!("travel/plans/{id}/")),
            Self::DeleteTravelPlan(id) => (Method::DELETE, format!("travel/plans/{id}/")),
            Self::PlanRequirements(id) => (Method::GET, format!("travel/plans/{id}/requirements/")),
            Self::UpdatePlanRequirement(id) => {
                (Method::POST, format!("travel/plans/{id}/update_requirement/"))
            }
            Self::UploadProof(id) => (Method::POST, format!("travel/plans/{id}/upload_proof/")),
        };
        Some(route)
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self {
            Self::Requirements(filter) => filter.query_pairs(),
            Self::TravelPlans(filter) => filter.query_pairs(),
            _ => Vec::new(),
        }
    }

    /// Builds the request for this endpoint, without a body.
    pub fn request(&self) -> Option<ApiRequest> {
        let (method, path) = self.route()?;
        Some(ApiRequest::new(method, path).with_query(self.query_pairs()))
    }

    /// Reads are cached; everything else is a mutation.
    pub fn is_query(&self) -> bool {
        matches!(self.route(), Some((method, _)) if method == Method::GET)
    }

    /// Whether the bearer token is attached. Credential bootstrap endpoints
    /// are sent anonymously.
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Self::Register
                | Self::Login
                | Self::RefreshToken
                | Self::VerifyToken
                | Self::RequestPasswordReset
                | Self::ConfirmPasswordReset
                | Self::VerifyEmail
        )
    }

    /// Cache key of a read: path plus query string.
    pub fn cache_key(&self) -> Option<QueryKey> {
        if !self.is_query() {
            return None;
        }
        let (_, path) = self.route()?;
        let pairs = self.query_pairs();
        if pairs.is_empty() {
            return Some(QueryKey::new(path));
        }
        let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Some(QueryKey::new(format!("{path}?{}", query.join("&"))))
    }

    /// Tags provided by a successful read returning `result`.
    pub fn provides(&self, result: &Value) -> Vec<Tag> {
        match self {
            Self::GetProfile => vec![Tag::of(TagType::Profile)],
            Self::Countries => list_tags(TagType::Countries, result),
            Self::Country(id) => vec![Tag::item(TagType::Countries, *id)],
            Self::PetTypes => list_tags(TagType::PetTypes, result),
            Self::PetType(id) => vec![Tag::item(TagType::PetTypes, *id)],
            Self::Requirements(_) => list_tags(TagType::Requirements, result),
            Self::Requirement(id) => vec![Tag::item(TagType::Requirements, *id)],
            Self::Queries => list_tags(TagType::Queries, result),
            Self::Query(id) => vec![Tag::item(TagType::Queries, *id)],
            Self::Pets => list_tags(TagType::Pets, result),
            Self::Pet(id) => vec![Tag::item(TagType::Pets, *id)],
            Self::TravelPlans(_) => list_tags(TagType::TravelPlans, result),
            Self::TravelPlan(id) => vec![Tag::item(TagType::TravelPlans, *id)],
            Self::PlanRequirements(id) => vec![
                Tag::item(TagType::TravelPlans, *id),
                Tag::plan_scoped(TagType::Requirements, *id),
            ],
            _ => Vec::new(),
        }
    }

    /// Tags invalidated once this mutation succeeds.
    pub fn invalidates(&self) -> Vec<Tag> {
        match self {
            Self::Register | Self::Login | Self::UpdateProfile | Self::Logout => {
                vec![Tag::of(TagType::Profile)]
            }
            Self::CreateRequirement => vec![Tag::list(TagType::Requirements)],
            Self::UpdateRequirement(id) | Self::DeleteRequirement(id) => vec![
                Tag::item(TagType::Requirements, *id),
                Tag::list(TagType::Requirements),
            ],
            Self::CreateQuery => vec![Tag::list(TagType::Queries)],
            Self::QueryFeedback(id) => vec![Tag::item(TagType::Queries, *id)],
            Self::CreatePet => vec![Tag::list(TagType::Pets)],
            Self::UpdatePet(id) | Self::DeletePet(id) => {
                vec![Tag::item(TagType::Pets, *id), Tag::list(TagType::Pets)]
            }
            Self::CreateTravelPlan => vec![Tag::list(TagType::TravelPlans)],
            Self::UpdateTravelPlan(id) | Self::DeleteTravelPlan(id) => vec![
                Tag::item(TagType::TravelPlans, *id),
                Tag::list(TagType::TravelPlans),
            ],
            Self::UpdatePlanRequirement(id) | Self::UploadProof(id) => vec![
                Tag::plan_scoped(TagType::Requirements, *id),
                Tag::item(TagType::TravelPlans, *id),
            ],
            _ => Vec::new(),
        }
    }
}

/// The item array of a list response, plain or paginated (`{"results": [...]}`).
pub fn list_items(result: &Value) -> Option<&Vec<Value>> {
    match result {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("results").and_then(Value::as_array),
        _ => None,
    }
}

fn list_tags(kind: TagType, result: &Value) -> Vec<Tag> {
    let mut tags: Vec<Tag> = list_items(result)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("id").and_then(Value::as_u64))
        .map(|id| Tag::item(kind, id))
        .collect();
    tags.push(Tag::list(kind));
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TravelPlanStatus;
    use serde_json::json;

    #[test]
    fn test_list_provides_items_and_list() {
        let tags = Endpoint::Pets.provides(&json!([{"id": 1}, {"id": 2}]));
        assert_eq!(
            tags,
            vec![
                Tag::item(TagType::Pets, 1),
                Tag::item(TagType::Pets, 2),
                Tag::list(TagType::Pets)
            ]
        );

        let paginated = json!({"count": 1, "results": [{"id": 9}]});
        assert_eq!(
            Endpoint::Countries.provides(&paginated),
            vec![Tag::item(TagType::Countries, 9), Tag::list(TagType::Countries)]
        );
    }

    #[test]
    fn test_mutations_invalidate_after_success_only_their_tags() {
        assert_eq!(
            Endpoint::CreateRequirement.invalidates(),
            vec![Tag::list(TagType::Requirements)]
        );
        assert_eq!(
            Endpoint::UpdatePet(4).invalidates(),
            vec![Tag::item(TagType::Pets, 4), Tag::list(TagType::Pets)]
        );
        assert_eq!(
            Endpoint::UploadProof(7).invalidates(),
            vec![
                Tag::plan_scoped(TagType::Requirements, 7),
                Tag::item(TagType::TravelPlans, 7)
            ]
        );
        assert!(Endpoint::ChangePassword.invalidates().is_empty());
        assert!(Endpoint::Pets.invalidates().is_empty());
    }

    #[test]
    fn test_plan_requirement_update_hits_plan_requirements_read() {
        let provided = Endpoint::PlanRequirements(7).provides(&json!([]));
        let hits = Endpoint::UpdatePlanRequirement(7)
            .invalidates()
            .iter()
            .any(|inv| provided.iter().any(|p| inv.invalidates(p)));
        assert!(hits);

        let other_plan = Endpoint::PlanRequirements(8).provides(&json!([]));
        assert!(
            !Endpoint::UpdatePlanRequirement(7)
                .invalidates()
                .iter()
                .any(|inv| other_plan.iter().any(|p| inv.invalidates(p)))
        );
    }

    #[test]
    fn test_routes() {
        assert_eq!(
            Endpoint::UpdatePlanRequirement(3).route(),
            Some((Method::POST, "travel/plans/3/update_requirement/".to_string()))
        );
        assert_eq!(
            Endpoint::RefreshToken.route(),
            Some((Method::POST, "auth/token/refresh/".to_string()))
        );
        assert_eq!(Endpoint::Logout.route(), None);
        assert!(Endpoint::Requirements(RequirementFilter::default()).is_query());
        assert!(!Endpoint::DeletePet(1).is_query());
    }

    #[test]
    fn test_cache_keys_include_filters() {
        let filter = PlanFilter {
            status: Some(TravelPlanStatus::Ready),
            upcoming: None,
        };
        assert_eq!(
            Endpoint::TravelPlans(filter).cache_key(),
            Some(QueryKey::new("travel/plans/?status=ready"))
        );
        assert_eq!(Endpoint::Pet(2).cache_key(), Some(QueryKey::new("pets/2/")));
        assert_eq!(Endpoint::CreatePet.cache_key(), None);
    }

    #[test]
    fn test_anonymous_endpoints() {
        assert!(!Endpoint::Login.requires_auth());
        assert!(!Endpoint::RequestPasswordReset.requires_auth());
        assert!(Endpoint::GetProfile.requires_auth());
        assert!(Endpoint::Countries.requires_auth());
    }
}
