use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Species accepted by the pets endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetKind {
    Dog,
    Cat,
    Ferret,
    Bird,
    Other,
}

impl PetKind {
    pub const ALL: [PetKind; 5] = [Self::Dog, Self::Cat, Self::Ferret, Self::Bird, Self::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Ferret => "ferret",
            Self::Bird => "bird",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown pet type '{s}' (expected dog, cat, ferret, bird or other)"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microchip_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccination_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Body for creating a pet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePetRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microchip_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaccination_status: Option<String>,
}

/// Partial update for a pet; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PetKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microchip_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaccination_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pet_kind_parse() {
        assert_eq!("Dog".parse::<PetKind>().unwrap(), PetKind::Dog);
        assert_eq!(" ferret ".parse::<PetKind>().unwrap(), PetKind::Ferret);
        assert!("dragon".parse::<PetKind>().is_err());
    }

    #[test]
    fn test_pet_uses_type_field() {
        let pet: Pet = serde_json::from_value(json!({
            "id": 3,
            "name": "Rex",
            "type": "dog",
            "age": 4,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(pet.kind, PetKind::Dog);
        assert_eq!(pet.age, Some(4));

        let update = UpdatePetRequest {
            kind: Some(PetKind::Cat),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"type": "cat"}));
    }
}
