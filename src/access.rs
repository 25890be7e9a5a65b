use std::str::FromStr;

use crate::error::AppError;
use crate::session::Identity;
use crate::task::Task;

/// Who may edit or delete a task.
///
/// `Open` lets any logged-in user change any task. `OwnerOnly` restricts
/// changes to the user recorded as the task's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    #[default]
    Open,
    OwnerOnly,
}

impl AccessPolicy {
    pub fn authorize(&self, identity: &Identity, task: &Task) -> Result<(), AppError> {
        match self {
            AccessPolicy::Open => Ok(()),
            AccessPolicy::OwnerOnly if task.owner_username == identity.username() => Ok(()),
            AccessPolicy::OwnerOnly => {
                log::warn!(
                    "{} denied access to task {} owned by {}",
                    identity.username(),
                    task.id,
                    task.owner_username
                );
                Err(AppError::Forbidden)
            }
        }
    }
}

impl FromStr for AccessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(AccessPolicy::Open),
            "owner" | "owner_only" => Ok(AccessPolicy::OwnerOnly),
            other => Err(format!("unknown task access policy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_owned_by(owner: &str) -> Task {
        Task {
            id: "t1".to_string(),
            category_name: "Work".to_string(),
            task_name: "Ship".to_string(),
            task_description: String::new(),
            due_date: "01 January, 2024".to_string(),
            is_urgent: false,
            owner_username: owner.to_string(),
        }
    }

    #[test]
    fn open_policy_allows_anyone() {
        let bob = Identity::new("bob");
        assert!(AccessPolicy::Open
            .authorize(&bob, &task_owned_by("alice"))
            .is_ok());
    }

    #[test]
    fn owner_policy_rejects_other_users() {
        let task = task_owned_by("alice");
        assert!(AccessPolicy::OwnerOnly
            .authorize(&Identity::new("alice"), &task)
            .is_ok());
        assert!(matches!(
            AccessPolicy::OwnerOnly.authorize(&Identity::new("bob"), &task),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("open".parse::<AccessPolicy>(), Ok(AccessPolicy::Open));
        assert_eq!("Owner".parse::<AccessPolicy>(), Ok(AccessPolicy::OwnerOnly));
        assert!("everyone".parse::<AccessPolicy>().is_err());
    }
}
