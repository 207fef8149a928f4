use serde::{Deserialize, Serialize};
use crate::media::MediaType;
use crate::media_ids::MediaIds;

/// A user request for a movie or show, as reported by the request source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRequest {
    pub media_type: MediaType,
    #[serde(default)]
    pub ids: MediaIds,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<Requester>,
}

/// Lifecycle state of a request in the request source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
    Processing,
    Available,
}

impl RequestStatus {
    /// Only approved or fulfilled requests mark an item as requested
    pub fn marks_requested(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Available)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requester {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Requester {
    pub fn is_identified(&self) -> bool {
        self.user_id.is_some()
            || self.username.as_deref().is_some_and(|u| !u.is_empty())
            || self.email.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Best human label for log lines and reasons
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            return email.to_string();
        }
        match self.user_id {
            Some(id) => format!("user {}", id),
            None => "unknown user".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_requested() {
        assert!(RequestStatus::Approved.marks_requested());
        assert!(RequestStatus::Available.marks_requested());
        assert!(!RequestStatus::Pending.marks_requested());
        assert!(!RequestStatus::Declined.marks_requested());
        assert!(!RequestStatus::Processing.marks_requested());
    }

    #[test]
    fn test_requester_identity() {
        assert!(!Requester::default().is_identified());

        let blank = Requester {
            username: Some(String::new()),
            ..Requester::default()
        };
        assert!(!blank.is_identified());

        let by_id = Requester {
            user_id: Some(42),
            ..Requester::default()
        };
        assert!(by_id.is_identified());
        assert_eq!(by_id.display_name(), "user 42");

        let by_email = Requester {
            email: Some("ana@example.com".to_string()),
            ..Requester::default()
        };
        assert_eq!(by_email.display_name(), "ana@example.com");
    }
}
