//! Role-based permission gate.
//!
//! A pure pass from the restored role to a visibility decision over tagged
//! affordances, evaluated exactly once at startup. The gate never contacts
//! the backend; the backend enforces its own checks and the guard handles
//! the 401 when the two disagree.

use crate::session::Role;
use crate::ui::View;

/// Role requirement carried by a UI affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordanceTag {
    Open,
    PremiumOnly,
    AdminOnly,
}

/// Outcome of the permission pass for one affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    /// Not shown at all. Admin-only affordances for non-admins.
    Hidden,
    /// Shown but muted and non-interactive, with an explanatory hint.
    Restricted,
}

/// Hint attached to restricted affordances.
pub const RESTRICTED_HINT: &str = "This feature is only available to premium users";

/// A gated UI element: a nav entry, button or section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordance {
    pub id: String,
    pub tag: AffordanceTag,
    pub visibility: Visibility,
}

impl Affordance {
    pub fn new(id: impl Into<String>, tag: AffordanceTag) -> Self {
        Self {
            id: id.into(),
            tag,
            visibility: Visibility::Visible,
        }
    }
}

/// Rule table, first match wins:
///
/// 1. admin sees everything;
/// 2. admin-only affordances are hidden for everyone else;
/// 3. premium gets everything that is left;
/// 4. premium-only affordances are restricted for normal users.
pub fn visibility(role: Role, tag: AffordanceTag) -> Visibility {
    if role == Role::Admin {
        return Visibility::Visible;
    }
    if tag == AffordanceTag::AdminOnly {
        return Visibility::Hidden;
    }
    if role == Role::Premium {
        return Visibility::Visible;
    }
    if tag == AffordanceTag::PremiumOnly {
        return Visibility::Restricted;
    }
    Visibility::Visible
}

/// Apply the role pass over every affordance, then correct the active view.
/// Returns the view that should actually be active afterwards.
pub fn apply(role: Role, affordances: &mut [Affordance], active: View) -> View {
    for affordance in affordances.iter_mut() {
        affordance.visibility = visibility(role, affordance.tag);
    }
    correct_active_view(role, active)
}

/// Post-pass correction: never leave a restricted view active. Falls back
/// to the search view.
pub fn correct_active_view(role: Role, active: View) -> View {
    if visibility(role, active.tag()) == Visibility::Visible {
        active
    } else {
        View::Search
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn nav() -> Vec<Affordance> {
        View::ALL
            .iter()
            .map(|v| Affordance::new(v.id(), v.tag()))
            .collect()
    }

    fn visibility_of(affordances: &[Affordance], id: &str) -> Visibility {
        affordances
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.visibility)
            .unwrap_or_else(|| panic!("no affordance '{id}'"))
    }

    #[test]
    fn admin_sees_everything() {
        let mut affordances = nav();
        let active = apply(Role::Admin, &mut affordances, View::Admin);

        assert_eq!(active, View::Admin);
        assert!(
            affordances
                .iter()
                .all(|a| a.visibility == Visibility::Visible)
        );
    }

    #[test]
    fn premium_loses_only_admin_affordances() {
        let mut affordances = nav();
        apply(Role::Premium, &mut affordances, View::Pleading);

        assert_eq!(visibility_of(&affordances, "admin"), Visibility::Hidden);
        assert_eq!(visibility_of(&affordances, "pleading"), Visibility::Visible);
        assert_eq!(visibility_of(&affordances, "search"), Visibility::Visible);
    }

    #[test]
    fn normal_gets_premium_affordances_restricted_not_hidden() {
        let mut affordances = nav();
        apply(Role::Normal, &mut affordances, View::Search);

        assert_eq!(visibility_of(&affordances, "admin"), Visibility::Hidden);
        assert_eq!(
            visibility_of(&affordances, "pleading"),
            Visibility::Restricted
        );
        assert_eq!(
            visibility_of(&affordances, "jurisprudence"),
            Visibility::Restricted
        );
        assert_eq!(visibility_of(&affordances, "upload"), Visibility::Visible);
    }

    #[test]
    fn active_premium_view_falls_back_to_search_for_normal_users() {
        let mut affordances = nav();
        let active = apply(Role::Normal, &mut affordances, View::Pleading);
        assert_eq!(active, View::Search);
    }

    #[test]
    fn active_admin_view_falls_back_for_premium_users() {
        assert_eq!(
            correct_active_view(Role::Premium, View::Admin),
            View::Search
        );
    }

    #[test]
    fn open_active_view_is_untouched() {
        assert_eq!(correct_active_view(Role::Normal, View::Cases), View::Cases);
    }
}
