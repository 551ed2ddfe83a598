//! Closed-set string enums for issue status, type, and dependency type.
//!
//! Each enum serializes as its snake_case/kebab-case wire string and rejects
//! anything outside its known variants at the validation boundary (see
//! `validation.rs`); the types themselves stay permissive on deserialize so
//! that stale cache rows or pre-migration payloads still parse.

use std::fmt;

/// Declares a closed-set string enum with `Display`, `as_str`, and
/// `From<&str>`/`From<String>` conversions (unknown strings fall back to the
/// first variant's wire form being overridden by an explicit `Unknown`
/// payload so round-tripping a bad cache row never panics).
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $wire:expr ),+ $(,)?
        }
        default = $default_variant:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            /// Anything that doesn't match a known wire string.
            Unknown(String),
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s))
            }
        }

        impl $name {
            /// The wire representation used in JSON, JSONL, and SQL storage.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Unknown(s) => s.as_str(),
                }
            }

            /// True if `self` is one of the named closed-set variants.
            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }

            /// All known (non-`Unknown`) variants, in declaration order.
            pub fn known_variants() -> &'static [&'static str] {
                &[ $( $wire ),+ ]
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default_variant
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $wire => Self::$variant, )+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from(s.as_str())
            }
        }
    };
}

define_enum! {
    /// The three canonical issue statuses (§3.1). No other workflow states
    /// are modelled -- the Remote's richer state machine is collapsed onto
    /// this set by the Remote client (§4.3).
    Status {
        Open => "open",
        InProgress => "in_progress",
        Closed => "closed",
    }
    default = Open
}

define_enum! {
    /// Optional issue classification, stored as a first-class field.
    IssueType {
        Bug => "bug",
        Feature => "feature",
        Task => "task",
        Epic => "epic",
        Chore => "chore",
    }
    default = Task
}

define_enum! {
    /// Dependency edge kind. Only `Blocks` and `ParentChild` affect
    /// reachability (§4.8); `Related` and `DiscoveredFrom` are informational.
    DependencyType {
        Blocks => "blocks",
        Related => "related",
        ParentChild => "parent-child",
        DiscoveredFrom => "discovered-from",
    }
    default = Blocks
}

impl DependencyType {
    /// Whether cycle detection and blocked-set computation must consider
    /// edges of this type (§4.8, §9 "Graph with cycles").
    pub fn affects_reachability(&self) -> bool {
        matches!(self, Self::Blocks | Self::ParentChild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in Status::known_variants() {
            let status = Status::from(*s);
            assert_eq!(status.as_str(), *s);
            assert!(status.is_known());
        }
    }

    #[test]
    fn status_unknown_falls_back() {
        let status = Status::from("frobnicated");
        assert!(!status.is_known());
        assert_eq!(status.as_str(), "frobnicated");
    }

    #[test]
    fn dependency_type_reachability() {
        assert!(DependencyType::Blocks.affects_reachability());
        assert!(DependencyType::ParentChild.affects_reachability());
        assert!(!DependencyType::Related.affects_reachability());
        assert!(!DependencyType::DiscoveredFrom.affects_reachability());
    }

    #[test]
    fn issue_type_default_is_task() {
        assert_eq!(IssueType::default(), IssueType::Task);
    }

    #[test]
    fn serde_round_trip() {
        let s = Status::InProgress;
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
