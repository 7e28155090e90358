//! Canonical system roles seeded into every new tenant.
//!
//! The matrices are pure data. The storage adapter writes them inside the
//! tenant provisioning unit of work.

use crate::models::permission::{Action, Feature};

pub const SYSTEM_ADMIN: &str = "system_admin";
pub const BUSINESS_ADMIN: &str = "business_admin";
pub const MEMBER: &str = "member";
pub const READONLY: &str = "readonly";

/// A system role and the `(feature, action)` pairs it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRole {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub grants: Vec<(Feature, Action)>,
}

/// The four system roles in seeding order.
pub fn system_roles() -> Vec<SeedRole> {
    vec![system_admin(), business_admin(), member(), readonly()]
}

/// Every feature, every action.
pub fn system_admin() -> SeedRole {
    SeedRole {
        code: SYSTEM_ADMIN,
        name: "System Administrator",
        description: "Full access to every feature including system settings",
        grants: all_permissions(),
    }
}

/// Everything except writing system settings.
pub fn business_admin() -> SeedRole {
    let mut grants = vec![(Feature::SystemSettings, Action::Read)];
    for feature in Feature::ALL {
        if feature == Feature::SystemSettings {
            continue;
        }
        grants.extend(Action::ALL.into_iter().map(|action| (feature, action)));
    }
    SeedRole {
        code: BUSINESS_ADMIN,
        name: "Business Administrator",
        description: "Full access to business features, read-only system settings",
        grants,
    }
}

/// Read/write/delete on business features. Members never approve.
pub fn member() -> SeedRole {
    let mut grants = vec![
        (Feature::SystemSettings, Action::Read),
        (Feature::Approvals, Action::Read),
    ];
    for feature in Feature::ALL {
        if matches!(feature, Feature::SystemSettings | Feature::Approvals) {
            continue;
        }
        grants.extend(
            [Action::Read, Action::Write, Action::Delete]
                .into_iter()
                .map(|action| (feature, action)),
        );
    }
    SeedRole {
        code: MEMBER,
        name: "Member",
        description: "Day-to-day business access without approval rights",
        grants,
    }
}

pub fn readonly() -> SeedRole {
    SeedRole {
        code: READONLY,
        name: "Read Only",
        description: "Read access to every feature",
        grants: Feature::ALL
            .into_iter()
            .map(|feature| (feature, Action::Read))
            .collect(),
    }
}

fn all_permissions() -> Vec<(Feature, Action)> {
    Feature::ALL
        .into_iter()
        .flat_map(|feature| Action::ALL.into_iter().map(move |action| (feature, action)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn distinct(role: &SeedRole) -> usize {
        role.grants.iter().collect::<HashSet<_>>().len()
    }

    #[test]
    fn row_counts() {
        assert_eq!(system_admin().grants.len(), 36);
        assert_eq!(business_admin().grants.len(), 33);
        assert_eq!(member().grants.len(), 23);
        assert_eq!(readonly().grants.len(), 9);
    }

    #[test]
    fn no_duplicate_rows() {
        for role in system_roles() {
            assert_eq!(distinct(&role), role.grants.len(), "{}", role.code);
        }
    }

    #[test]
    fn member_never_approves() {
        let role = member();
        assert!(role.grants.iter().all(|(_, action)| *action != Action::Approve));
        let approvals: Vec<_> = role
            .grants
            .iter()
            .filter(|(feature, _)| *feature == Feature::Approvals)
            .collect();
        assert_eq!(approvals, vec![&(Feature::Approvals, Action::Read)]);
    }

    #[test]
    fn business_admin_reads_system_settings_only() {
        let settings: Vec<_> = business_admin()
            .grants
            .into_iter()
            .filter(|(feature, _)| *feature == Feature::SystemSettings)
            .collect();
        assert_eq!(settings, vec![(Feature::SystemSettings, Action::Read)]);
    }

    #[test]
    fn readonly_only_reads() {
        assert!(
            readonly()
                .grants
                .iter()
                .all(|(_, action)| *action == Action::Read)
        );
    }

    #[test]
    fn role_codes_are_unique() {
        let codes: HashSet<_> = system_roles().iter().map(|r| r.code).collect();
        assert_eq!(codes.len(), 4);
    }
}
