use serde::{Deserialize, Serialize};

/// Audit lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

/// Who is driving a status change. Colleges edit and submit; admins review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    College,
    Admin,
}

impl AuditStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AuditStatus::Draft => "draft",
            AuditStatus::Submitted => "submitted",
            AuditStatus::Approved => "approved",
            AuditStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Sections may only be changed by the owning college in these states.
    pub const fn is_editable(self) -> bool {
        matches!(self, AuditStatus::Draft | AuditStatus::Rejected)
    }

    /// Checks `self -> to` against the transition table for `actor`.
    pub fn transition(self, to: AuditStatus, actor: Actor) -> Result<AuditStatus, InvalidTransition> {
        use AuditStatus::*;

        let allowed = match actor {
            Actor::College => matches!(
                (self, to),
                (Draft, Draft) | (Draft, Submitted) | (Rejected, Draft) | (Rejected, Submitted)
            ),
            Actor::Admin => matches!(
                (self, to),
                (Submitted, Submitted)
                    | (Submitted, Approved)
                    | (Submitted, Rejected)
                    | (Rejected, Rejected)
                    | (Approved, Approved)
            ),
        };

        if allowed {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move audit from {} to {}", .from.label(), .to.label())]
pub struct InvalidTransition {
    pub from: AuditStatus,
    pub to: AuditStatus,
}

#[cfg(test)]
mod tests {
    use super::AuditStatus::*;
    use super::*;

    const ALL: [AuditStatus; 4] = [Draft, Submitted, Approved, Rejected];

    #[test]
    fn union_of_actor_tables_matches_lifecycle() {
        let legal = [
            (Draft, Draft),
            (Draft, Submitted),
            (Submitted, Submitted),
            (Submitted, Approved),
            (Submitted, Rejected),
            (Approved, Approved),
            (Rejected, Rejected),
            (Rejected, Draft),
            (Rejected, Submitted),
        ];

        for from in ALL {
            for to in ALL {
                let ok = from.transition(to, Actor::College).is_ok()
                    || from.transition(to, Actor::Admin).is_ok();
                assert_eq!(
                    ok,
                    legal.contains(&(from, to)),
                    "{} -> {}",
                    from.label(),
                    to.label()
                );
            }
        }
    }

    #[test]
    fn approved_is_terminal() {
        for to in [Draft, Submitted, Rejected] {
            assert_eq!(
                Approved.transition(to, Actor::Admin),
                Err(InvalidTransition { from: Approved, to })
            );
            assert!(Approved.transition(to, Actor::College).is_err());
        }
    }

    #[test]
    fn colleges_cannot_review_and_admins_cannot_edit() {
        assert!(Submitted.transition(Approved, Actor::College).is_err());
        assert!(Draft.transition(Draft, Actor::Admin).is_err());
        assert!(Draft.transition(Submitted, Actor::Admin).is_err());
    }

    #[test]
    fn editable_only_in_draft_or_rejected() {
        assert!(Draft.is_editable());
        assert!(Rejected.is_editable());
        assert!(!Submitted.is_editable());
        assert!(!Approved.is_editable());
    }
}
