use serde::{Deserialize, Serialize};

/// Who holds a seat.
///
/// Administrative holds consume inventory like a purchase but are not sales,
/// so the inventory projection counts them separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "uid", rename_all = "snake_case")]
pub enum Owner {
    /// A purchaser identified by the identity provider's stable uid.
    RealUser(String),
    /// Seat held back by an administrator (comps, staff).
    AdminReserved,
    /// Seat taken out of sale (broken seat, camera position).
    AdminUnavailable,
}

impl Owner {
    /// Creates an owner for a real user.
    pub fn user(uid: impl Into<String>) -> Self {
        Owner::RealUser(uid.into())
    }

    /// Returns true for the administrative hold variants.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Owner::RealUser(_))
    }

    /// Returns the user ID for real users.
    pub fn uid(&self) -> Option<&str> {
        match self {
            Owner::RealUser(uid) => Some(uid),
            _ => None,
        }
    }

    /// Short storage tag for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Owner::RealUser(_) => "user",
            Owner::AdminReserved => "admin_reserved",
            Owner::AdminUnavailable => "admin_unavailable",
        }
    }

    /// Rebuilds an owner from its storage tag and optional uid.
    ///
    /// Returns None for an unknown tag or a user row without uid.
    pub fn from_parts(kind: &str, uid: Option<String>) -> Option<Self> {
        match (kind, uid) {
            ("user", Some(uid)) => Some(Owner::RealUser(uid)),
            ("admin_reserved", _) => Some(Owner::AdminReserved),
            ("admin_unavailable", _) => Some(Owner::AdminUnavailable),
            _ => None,
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::RealUser(uid) => write!(f, "{uid}"),
            Owner::AdminReserved => write!(f, "admin:reserved"),
            Owner::AdminUnavailable => write!(f, "admin:unavailable"),
        }
    }
}
