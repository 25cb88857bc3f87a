use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), &format)
}

/// Lifecycle of a travel plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelPlanStatus {
    Planning,
    Ready,
    InProgress,
    Completed,
    Cancelled,
}

impl TravelPlanStatus {
    pub const ALL: [TravelPlanStatus; 5] = [
        Self::Planning,
        Self::Ready,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Plans that still need attention.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Planning | Self::Ready | Self::InProgress)
    }
}

impl fmt::Display for TravelPlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelPlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(&needle))
            .ok_or_else(|| format!("unknown plan status '{s}'"))
    }
}

/// Progress of one requirement inside a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    NotStarted,
    InProgress,
    Completed,
    NotApplicable,
}

impl RequirementStatus {
    pub const ALL: [RequirementStatus; 4] = [
        Self::NotStarted,
        Self::InProgress,
        Self::Completed,
        Self::NotApplicable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::NotApplicable => "not_applicable",
        }
    }

    /// Completed or not applicable.
    pub fn is_done(self) -> bool {
        matches!(self, Self::Completed | Self::NotApplicable)
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(&needle))
            .ok_or_else(|| format!("unknown requirement status '{s}'"))
    }
}

/// A requirement attached to a travel plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub requirement_id: u64,
    pub description: String,
    pub status: RequirementStatus,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub has_proof: bool,
}

/// Body of `travel/plans/{id}/requirements/`: the plan detail, of which only
/// the requirement list is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequirements {
    pub id: u64,
    #[serde(default)]
    pub requirements: Vec<PlanRequirement>,
}

/// Tracking entry of one catalogue requirement inside a plan, as returned by
/// requirement updates and proof uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequirement {
    pub id: u64,
    pub travel_plan: u64,
    /// Catalogue requirement id.
    pub requirement: u64,
    #[serde(default)]
    pub requirement_description: String,
    pub status: RequirementStatus,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// URL of the uploaded document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_document: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl TravelRequirement {
    pub fn has_proof(&self) -> bool {
        self.proof_document.as_deref().is_some_and(|doc| !doc.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPlan {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub pet: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_name: Option<String>,
    pub origin_country: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_country_name: Option<String>,
    pub destination_country: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_country_name: Option<String>,
    #[serde(with = "iso_date")]
    pub departure_date: Date,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub return_date: Option<Date>,
    pub status: TravelPlanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_departure: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<PlanRequirement>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTravelPlanRequest {
    pub name: String,
    pub pet: u64,
    pub origin_country: u64,
    pub destination_country: u64,
    #[serde(with = "iso_date")]
    pub departure_date: Date,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub return_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTravelPlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_country: Option<u64>,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<Date>,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub return_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TravelPlanStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Filter for the plan list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PlanFilter {
    pub status: Option<TravelPlanStatus>,
    pub upcoming: Option<bool>,
}

impl PlanFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.to_string()));
        }
        if let Some(upcoming) = self.upcoming {
            pairs.push(("upcoming".to_string(), upcoming.to_string()));
        }
        pairs
    }
}

/// Body of `travel/plans/{id}/update_requirement/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePlanRequirementRequest {
    pub requirement_id: u64,
    pub status: RequirementStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<Date>,
}

/// A proof document attached to a plan requirement.
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub requirement_id: u64,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn test_plan_dates_are_iso() {
        let plan: TravelPlan = serde_json::from_value(json!({
            "id": 1,
            "name": "Summer in Lisbon",
            "pet": 2,
            "origin_country": 10,
            "destination_country": 20,
            "departure_date": "2025-07-01",
            "status": "in_progress"
        }))
        .unwrap();
        assert_eq!(plan.departure_date, date!(2025 - 07 - 01));
        assert_eq!(plan.return_date, None);
        assert_eq!(plan.status, TravelPlanStatus::InProgress);

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["departure_date"], "2025-07-01");
        assert!(value.get("return_date").is_none());
    }

    #[test]
    fn test_plan_requirements_reads_detail_object() {
        let detail: PlanRequirements = serde_json::from_value(json!({
            "id": 7,
            "name": "Summer in Lisbon",
            "pet": {"id": 2, "name": "Rex", "type": "dog"},
            "origin_country": {"id": 10, "name": "France", "code": "FR"},
            "destination_country": {"id": 20, "name": "Portugal", "code": "PT"},
            "departure_date": "2030-07-01",
            "status": "planning",
            "requirements": [
                {"id": 11, "requirement_id": 5, "description": "Rabies", "status": "completed",
                 "completion_date": "2030-05-01", "notes": "", "has_proof": true},
                {"requirement_id": 6, "description": "Microchip", "status": "not_started",
                 "completion_date": null, "notes": "", "has_proof": false}
            ]
        }))
        .unwrap();
        assert_eq!(detail.id, 7);
        assert_eq!(detail.requirements.len(), 2);
        assert_eq!(detail.requirements[0].completion_date, Some(date!(2030 - 05 - 01)));
        assert_eq!(detail.requirements[1].id, None);
    }

    #[test]
    fn test_travel_requirement_shape() {
        let entry: TravelRequirement = serde_json::from_value(json!({
            "id": 11,
            "travel_plan": 7,
            "requirement": 5,
            "requirement_description": "Rabies vaccination",
            "status": "in_progress",
            "completion_date": null,
            "notes": "",
            "proof_document": null,
            "created_at": "2030-01-01T00:00:00Z",
            "updated_at": "2030-01-02T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(entry.requirement, 5);
        assert_eq!(entry.status, RequirementStatus::InProgress);
        assert_eq!(entry.completion_date, None);
        assert!(!entry.has_proof());

        let uploaded = TravelRequirement {
            proof_document: Some("/media/proofs/rabies.pdf".into()),
            ..entry
        };
        assert!(uploaded.has_proof());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "in-progress".parse::<TravelPlanStatus>().unwrap(),
            TravelPlanStatus::InProgress
        );
        assert_eq!(
            "NOT_APPLICABLE".parse::<RequirementStatus>().unwrap(),
            RequirementStatus::NotApplicable
        );
        assert!("lost".parse::<TravelPlanStatus>().is_err());
    }

    #[test]
    fn test_plan_filter_pairs() {
        let filter = PlanFilter {
            status: Some(TravelPlanStatus::Ready),
            upcoming: Some(true),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("status".to_string(), "ready".to_string()),
                ("upcoming".to_string(), "true".to_string())
            ]
        );
        assert!(PlanFilter::default().query_pairs().is_empty());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-29").unwrap(), date!(2024 - 02 - 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("29/02/2024").is_err());
    }
}
