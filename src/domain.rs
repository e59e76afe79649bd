use serde::{Deserialize, Serialize};

/// One time-boxed promotional event. At most one row is active at any time;
/// the ledger enforces that transition-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Giveaway {
    pub id: i64,
    pub name: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub is_active: bool,
    pub created_by: i64,
}

/// A participant as first seen by the system. The id is platform-assigned
/// and stable; the handle may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: i64,
    pub handle: Option<String>,
    pub joined_at: i64,
}

impl Participant {
    /// Handle when we have one, otherwise a fallback label built from the id.
    pub fn display_label(&self) -> String {
        match &self.handle {
            Some(handle) => format!("@{handle}"),
            None => format!("ID{}", self.user_id),
        }
    }
}

/// How a ticket was earned. Base and video are granted at most once per
/// (user, giveaway); referral repeats once per distinct referred user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketCategory {
    Base,
    Referral,
    Video,
}

impl TicketCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::Base => "base",
            TicketCategory::Referral => "referral",
            TicketCategory::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "base" => Some(TicketCategory::Base),
            "referral" => Some(TicketCategory::Referral),
            "video" => Some(TicketCategory::Video),
            _ => None,
        }
    }
}

/// One entry unit in the draw pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub user_id: i64,
    pub giveaway_id: i64,
    pub category: TicketCategory,
    pub source_url: Option<String>,
    pub verified: bool,
}

/// Row of the admin top list.
#[derive(Debug, Clone)]
pub struct TopEntry {
    pub user_id: i64,
    pub handle: Option<String>,
    pub tickets: i64,
}

impl TopEntry {
    pub fn display_label(&self) -> String {
        match &self.handle {
            Some(handle) => format!("@{handle}"),
            None => format!("ID{}", self.user_id),
        }
    }
}

/// Aggregate counters for the admin stats view.
#[derive(Debug, Clone, Copy, Default)]
pub struct GiveawayStats {
    pub participants: i64,
    pub total_tickets: i64,
    pub video_tickets: i64,
}
