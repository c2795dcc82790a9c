/// Data models for the issue service
///
/// Rows are string-backed where the database stores plain TEXT; the enums
/// below own the legal values and conversions.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Issue category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCategory {
    Road,
    Water,
    Electricity,
    Waste,
    Other,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Road => "Road",
            IssueCategory::Water => "Water",
            IssueCategory::Electricity => "Electricity",
            IssueCategory::Waste => "Waste",
            IssueCategory::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Road" => Some(IssueCategory::Road),
            "Water" => Some(IssueCategory::Water),
            "Electricity" => Some(IssueCategory::Electricity),
            "Waste" => Some(IssueCategory::Waste),
            "Other" => Some(IssueCategory::Other),
            _ => None,
        }
    }
}

/// Issue lifecycle status, admin-mutated only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueStatus {
    Pending,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "Pending",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::Resolved => "Resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(IssueStatus::Pending),
            "In Progress" => Some(IssueStatus::InProgress),
            "Resolved" => Some(IssueStatus::Resolved),
            _ => None,
        }
    }
}

/// Priority label derived from the final score via fixed thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLabel {
    Low,
    Medium,
    High,
}

impl PriorityLabel {
    /// High at >= 70, Medium at >= 45, else Low
    pub fn from_score(score: i32) -> Self {
        if score >= 70 {
            PriorityLabel::High
        } else if score >= 45 {
            PriorityLabel::Medium
        } else {
            PriorityLabel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLabel::Low => "Low",
            PriorityLabel::Medium => "Medium",
            PriorityLabel::High => "High",
        }
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Citizen,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Citizen => "citizen",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "citizen" => Some(UserRole::Citizen),
            "admin" => Some(UserRole::Admin),
            "super_admin" => Some(UserRole::SuperAdmin),
            _ => None,
        }
    }
}

/// Issue row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub priority_score: i32,
    pub priority: String,
    pub status: String,
    pub severity_score: i32,
    pub frequency_score: i32,
    pub location_impact: i32,
    pub time_pending: i32,
    pub ai_adjustment: i32,
    pub reported_by: Uuid,
    pub reported_as_fake: bool,
    pub reported_as_fake_by: Option<Uuid>,
    pub reported_as_fake_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Score components retained for auditability
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub severity: i32,
    pub frequency: i32,
    pub location_impact: i32,
    pub time_pending: i32,
    pub ai_adjustment: i32,
}

/// User row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub city: Option<String>,
    pub trust_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> UserRole {
        UserRole::parse(&self.role).unwrap_or(UserRole::Citizen)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role(), UserRole::Admin | UserRole::SuperAdmin)
    }
}

/// Banned email row (append-only blacklist)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BannedEmail {
    pub id: Uuid,
    pub email: String,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub reason: String,
    pub banned_by: Option<Uuid>,
    pub banned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_label_thresholds() {
        assert_eq!(PriorityLabel::from_score(100), PriorityLabel::High);
        assert_eq!(PriorityLabel::from_score(70), PriorityLabel::High);
        assert_eq!(PriorityLabel::from_score(69), PriorityLabel::Medium);
        assert_eq!(PriorityLabel::from_score(45), PriorityLabel::Medium);
        assert_eq!(PriorityLabel::from_score(44), PriorityLabel::Low);
        assert_eq!(PriorityLabel::from_score(0), PriorityLabel::Low);
    }

    #[test]
    fn test_category_round_trip() {
        for category in [
            IssueCategory::Road,
            IssueCategory::Water,
            IssueCategory::Electricity,
            IssueCategory::Waste,
            IssueCategory::Other,
        ] {
            assert_eq!(IssueCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(IssueCategory::parse("Garbage"), None);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(IssueStatus::parse("In Progress"), Some(IssueStatus::InProgress));
        assert_eq!(IssueStatus::parse("Closed"), None);
    }

    #[test]
    fn test_admin_roles() {
        let mut user = User {
            id: Uuid::new_v4(),
            name: "a".into(),
            email: "a@example.com".into(),
            password_hash: "x".into(),
            role: "citizen".into(),
            city: Some("Pune".into()),
            trust_score: 100,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!user.is_admin());
        user.role = "admin".into();
        assert!(user.is_admin());
        user.role = "super_admin".into();
        assert!(user.is_admin());
    }
}
