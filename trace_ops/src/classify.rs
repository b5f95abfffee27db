//! Groups trace types by how they move value.

use std::str::FromStr as _;

use crate::TraceType;

/// Emission policy group of a trace type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraceCategory {
    /// `CALL`, `CALLCODE`, `DELEGATECALL`, `STATICCALL`.
    CallLike,
    /// `CREATE`, `CREATE2`.
    CreateLike,
    SelfDestruct,
    /// Never emits monetary operations.
    Other,
}

impl TraceType {
    pub fn category(self) -> TraceCategory {
        match self {
            TraceType::Call | TraceType::CallCode | TraceType::DelegateCall | TraceType::StaticCall => {
                TraceCategory::CallLike
            }
            TraceType::Create | TraceType::Create2 => TraceCategory::CreateLike,
            TraceType::SelfDestruct => TraceCategory::SelfDestruct,
        }
    }

    pub fn is_call_like(self) -> bool {
        self.category() == TraceCategory::CallLike
    }

    pub fn is_create_like(self) -> bool {
        self.category() == TraceCategory::CreateLike
    }
}

/// Classify a raw `traceType` tag, as the node spells it.
///
/// Unknown tags are [`TraceCategory::Other`].
pub fn categorize(tag: &str) -> TraceCategory {
    TraceType::from_str(tag)
        .map(TraceType::category)
        .unwrap_or(TraceCategory::Other)
}

pub fn is_call_like(tag: &str) -> bool {
    categorize(tag) == TraceCategory::CallLike
}

pub fn is_create_like(tag: &str) -> bool {
    categorize(tag) == TraceCategory::CreateLike
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator as _;

    use super::*;

    #[test]
    fn tags() {
        for tag in ["CALL", "CALLCODE", "DELEGATECALL", "STATICCALL", "call"] {
            assert!(is_call_like(tag), "{tag}");
            assert!(!is_create_like(tag), "{tag}");
        }
        for tag in ["CREATE", "CREATE2", "create2"] {
            assert!(is_create_like(tag), "{tag}");
            assert!(!is_call_like(tag), "{tag}");
        }
        assert_eq!(categorize("SELFDESTRUCT"), TraceCategory::SelfDestruct);
        assert_eq!(categorize("SUICIDE"), TraceCategory::SelfDestruct);
        for tag in ["", "NONE", "PRECOMPILE", "CALL2"] {
            assert_eq!(categorize(tag), TraceCategory::Other, "{tag:?}");
        }
    }

    #[test]
    fn display_round_trips_through_the_tag_classifier() {
        for ty in TraceType::iter() {
            assert_eq!(categorize(&ty.to_string()), ty.category());
        }
    }
}
