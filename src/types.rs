use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Closed enumeration of skills. Extensions are appended at the end so
/// existing discriminants never shift.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Skill {
    Woodcutting,
    Fishing,
    Mining,
    Thieving,
    Firemaking,
    Cooking,
    Smithing,
}

impl Skill {
    pub const ALL: [Skill; 7] = [
        Skill::Woodcutting,
        Skill::Fishing,
        Skill::Mining,
        Skill::Thieving,
        Skill::Firemaking,
        Skill::Cooking,
        Skill::Smithing,
    ];

    /// True for skills whose actions consume item inputs rather than just
    /// producing them.
    pub fn is_consuming(self) -> bool {
        matches!(self, Skill::Firemaking | Skill::Cooking | Skill::Smithing)
    }
}

/// Namespace half of a stable two-part identifier (`namespace:local`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamespaceId(pub u16);

/// A stable, globally unique identifier for an action, item, or shop
/// purchase. Interned as a small `Copy` pair rather than a heap string so
/// it is cheap to use as a hash-map / cache key on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id {
    pub namespace: NamespaceId,
    pub local: u32,
}

impl Id {
    pub const fn new(namespace: u16, local: u32) -> Self {
        Self {
            namespace: NamespaceId(namespace),
            local,
        }
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace.0, self.local)
    }
}

pub type ActionId = Id;
pub type ItemId = Id;
pub type ShopPurchaseId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consuming_skills_match_spec_examples() {
        assert!(Skill::Firemaking.is_consuming());
        assert!(Skill::Cooking.is_consuming());
        assert!(!Skill::Woodcutting.is_consuming());
        assert!(!Skill::Thieving.is_consuming());
    }

    #[test]
    fn id_round_trips_through_display() {
        let id = Id::new(3, 42);
        assert_eq!(id.to_string(), "3:42");
    }
}
