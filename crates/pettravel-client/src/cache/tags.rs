//! Typed cache tags.

use std::fmt;

/// Resource families that cached reads can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagType {
    Profile,
    Countries,
    PetTypes,
    Requirements,
    Queries,
    Pets,
    TravelPlans,
}

impl TagType {
    pub const ALL: [TagType; 7] = [
        Self::Profile,
        Self::Countries,
        Self::PetTypes,
        Self::Requirements,
        Self::Queries,
        Self::Pets,
        Self::TravelPlans,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "Profile",
            Self::Countries => "Countries",
            Self::PetTypes => "PetTypes",
            Self::Requirements => "Requirements",
            Self::Queries => "Queries",
            Self::Pets => "Pets",
            Self::TravelPlans => "TravelPlans",
        }
    }
}

/// Identifier narrowing a tag to part of a resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagId {
    /// The collection as a whole; changes on create and delete.
    List,
    /// A single entity.
    Id(u64),
    /// Everything scoped to one travel plan.
    Plan(u64),
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("LIST"),
            Self::Id(id) => write!(f, "{id}"),
            Self::Plan(id) => write!(f, "plan-{id}"),
        }
    }
}

/// A resource type, optionally narrowed to an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub kind: TagType,
    pub id: Option<TagId>,
}

impl Tag {
    /// Tag covering the whole resource type.
    pub const fn of(kind: TagType) -> Self {
        Self { kind, id: None }
    }

    pub const fn list(kind: TagType) -> Self {
        Self {
            kind,
            id: Some(TagId::List),
        }
    }

    pub const fn item(kind: TagType, id: u64) -> Self {
        Self {
            kind,
            id: Some(TagId::Id(id)),
        }
    }

    pub const fn plan_scoped(kind: TagType, plan_id: u64) -> Self {
        Self {
            kind,
            id: Some(TagId::Plan(plan_id)),
        }
    }

    /// Whether invalidating `self` invalidates a read that provided `provided`.
    ///
    /// A bare type tag hits every tag of that type; a tag with an id only
    /// hits the identical tag.
    pub fn invalidates(&self, provided: &Tag) -> bool {
        if self.kind != provided.kind {
            return false;
        }
        match self.id {
            None => true,
            Some(id) => provided.id == Some(id),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            None => f.write_str(self.kind.as_str()),
            Some(id) => write!(f, "{}:{id}", self.kind.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Tag::of(TagType::Requirements).to_string(), "Requirements");
        assert_eq!(Tag::list(TagType::Requirements).to_string(), "Requirements:LIST");
        assert_eq!(Tag::item(TagType::Requirements, 7).to_string(), "Requirements:7");
        assert_eq!(
            Tag::plan_scoped(TagType::Requirements, 7).to_string(),
            "Requirements:plan-7"
        );
    }

    #[test]
    fn test_type_tag_hits_every_id() {
        let bare = Tag::of(TagType::Pets);
        assert!(bare.invalidates(&Tag::of(TagType::Pets)));
        assert!(bare.invalidates(&Tag::list(TagType::Pets)));
        assert!(bare.invalidates(&Tag::item(TagType::Pets, 3)));
        assert!(!bare.invalidates(&Tag::item(TagType::TravelPlans, 3)));
    }

    #[test]
    fn test_id_tags_are_specific() {
        let list = Tag::list(TagType::Requirements);
        assert!(list.invalidates(&Tag::list(TagType::Requirements)));
        assert!(!list.invalidates(&Tag::item(TagType::Requirements, 5)));
        assert!(!list.invalidates(&Tag::of(TagType::Requirements)));

        let item = Tag::item(TagType::Requirements, 7);
        assert!(item.invalidates(&Tag::item(TagType::Requirements, 7)));
        assert!(!item.invalidates(&Tag::item(TagType::Requirements, 5)));
        assert!(!item.invalidates(&Tag::plan_scoped(TagType::Requirements, 7)));
    }
}
