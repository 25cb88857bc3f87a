use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: u64,
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetType {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Entry requirement for a pet type travelling to a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: u64,
    pub country: u64,
    pub pet_type: u64,
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub documentation_needed: Vec<String>,
    /// Days before departure within which the requirement must be met.
    #[serde(default)]
    pub validity_period: u32,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Body for creating or replacing a catalogue requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementInput {
    pub country: u64,
    pub pet_type: u64,
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub documentation_needed: Vec<String>,
    #[serde(default)]
    pub validity_period: u32,
    #[serde(default)]
    pub is_mandatory: bool,
}

/// Filter for the requirement catalogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RequirementFilter {
    pub country: Option<u64>,
    pub pet_type: Option<u64>,
    pub is_mandatory: Option<bool>,
}

impl RequirementFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(country) = self.country {
            pairs.push(("country".to_string(), country.to_string()));
        }
        if let Some(pet_type) = self.pet_type {
            pairs.push(("pet_type".to_string(), pet_type.to_string()));
        }
        if let Some(mandatory) = self.is_mandatory {
            pairs.push(("is_mandatory".to_string(), mandatory.to_string()));
        }
        pairs
    }
}

/// A question put to the travel assistant and its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQuery {
    pub id: u64,
    #[serde(default)]
    pub user: Option<u64>,
    pub origin_country: u64,
    pub destination_country: u64,
    pub pet_type: u64,
    pub query: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_comments: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserQueryRequest {
    pub origin_country: u64,
    pub destination_country: u64,
    pub pet_type: u64,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFeedbackRequest {
    /// 1 to 5.
    pub feedback_rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_comments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_filter_pairs() {
        let filter = RequirementFilter {
            country: Some(4),
            pet_type: None,
            is_mandatory: Some(false),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("country".to_string(), "4".to_string()),
                ("is_mandatory".to_string(), "false".to_string())
            ]
        );
    }
}
