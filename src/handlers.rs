use crate::constants::DEFAULT_TOP_LIMIT;
use crate::draw::DrawEngine;
use crate::engine::{
    DebugPayload, EligibilityEngine, RejectReason, SubmissionOutcome, SubmissionReport,
};
use crate::error::{GiveawayError, Result};
use chrono::{TimeZone, Utc};
use std::fmt::Write as _;

/// Prompt a transport shows before awaiting the URL line of a submission.
/// The next raw text line from that user is routed back in as
/// `Command::Submit`.
pub const SUBMIT_PROMPT: &str = "Send a link to your video:\n\
    • YouTube Shorts\n\
    • TikTok\n\
    • VK Clips\n\n\
    Important: the video must be published AFTER the giveaway started!";

/// Button actions a transport may render next to a reply. Exactly one today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    RefreshProfile,
}

/// What the transport collaborator gets back for every operation: a
/// plain-text body plus optional buttons. An empty reply means "say
/// nothing"; unauthorized administrative commands get one.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<ButtonAction>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    fn with_profile_button(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: vec![ButtonAction::RefreshProfile],
        }
    }

    fn silent() -> Self {
        Self::text("")
    }

    pub fn is_silent(&self) -> bool {
        self.text.is_empty()
    }
}

/// One dispatched command, already split from transport syntax.
#[derive(Debug, Clone)]
pub enum Command {
    /// Join, with the optional referral payload from a deep link.
    Start { payload: Option<String> },
    Profile,
    /// The conversational continuation: the URL the user sent after the
    /// submit prompt.
    Submit { url: String },
    Create { name: String, hours: i64 },
    Draw,
    Stats,
    Top { limit: usize },
    Cancel,
    RemoveVideo { user_id: i64 },
}

impl Command {
    fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::Create { .. }
                | Command::Draw
                | Command::Stats
                | Command::Top { .. }
                | Command::Cancel
                | Command::RemoveVideo { .. }
        )
    }
}

/// Maps commands onto the engine and formats replies. This is the whole
/// user-facing surface; everything below it returns data, not text.
pub struct CommandHandlers {
    engine: EligibilityEngine,
}

impl CommandHandlers {
    pub fn new(engine: EligibilityEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    pub async fn dispatch(&mut self, user_id: i64, handle: Option<&str>, command: Command) -> Result<Reply> {
        // Unauthorized admin commands observe no effect and no error
        if command.requires_admin() && !self.engine.is_admin(user_id) {
            return Ok(Reply::silent());
        }

        match command {
            Command::Start { payload } => self.handle_start(user_id, handle, payload.as_deref()),
            Command::Profile => self.handle_profile(user_id),
            Command::Submit { url } => self.handle_submit(user_id, &url).await,
            Command::Create { name, hours } => self.handle_create(user_id, &name, hours),
            Command::Draw => self.handle_draw(),
            Command::Stats => self.handle_stats(),
            Command::Top { limit } => self.handle_top(limit),
            Command::Cancel => self.handle_cancel(),
            Command::RemoveVideo { user_id } => self.handle_remove_video(user_id),
        }
    }

    fn handle_start(&mut self, user_id: i64, handle: Option<&str>, payload: Option<&str>) -> Result<Reply> {
        let summary = self.engine.join(user_id, handle, payload)?;

        let Some(gw) = summary.giveaway else {
            let mut text = String::from("No giveaway is running right now.");
            if self.engine.is_admin(user_id) {
                text.push_str(
                    "\n\nYou are the administrator.\n\n\
                     Admin commands:\n\
                     • create <name> <hours> — start a giveaway\n\
                     • draw — pick a winner\n\
                     • stats — participants and tickets\n\
                     • top [limit] — top participants\n\
                     • cancel — cancel the current giveaway\n\
                     • remove-video <user id> — revoke a video ticket",
                );
            }
            return Ok(Reply::text(text));
        };

        let mut text = String::new();
        if summary.referral_credited {
            text.push_str("You joined through a referral link — the referrer gets +1 ticket.\n\n");
        }
        let _ = write!(text, "Active giveaway: {}\n\nYou are in!\n", gw.name);
        text.push_str(
            "• Base ticket — granted\n\
             • +1 ticket for every friend who joins with your link\n\
             • +1 ticket for a fresh video\n\n",
        );
        if let Some(link) = summary.referral_link {
            let _ = write!(text, "Your referral link:\n{link}");
        }
        Ok(Reply::with_profile_button(text))
    }

    fn handle_profile(&mut self, user_id: i64) -> Result<Reply> {
        match self.engine.profile(user_id)? {
            None => Ok(Reply::text("No active giveaway")),
            Some(view) => Ok(Reply::with_profile_button(format!(
                "Your tickets: {}\nFriends referred: {}\nVideo: {}",
                view.total_tickets,
                view.referral_count,
                if view.has_video { "yes" } else { "no" }
            ))),
        }
    }

    async fn handle_submit(&mut self, user_id: i64, url: &str) -> Result<Reply> {
        let report = self.engine.submit_video(user_id, url).await?;
        Ok(Reply::text(format_submission(&report)))
    }

    fn handle_create(&mut self, user_id: i64, name: &str, hours: i64) -> Result<Reply> {
        if name.trim().is_empty() || hours <= 0 {
            return Ok(Reply::text("Usage: create <name> <hours>"));
        }
        let gw = self.engine.ledger_mut().create_giveaway(name, hours, user_id)?;
        Ok(Reply::text(format!(
            "Giveaway \"{}\" started, running for {hours} h.",
            gw.name
        )))
    }

    fn handle_draw(&mut self) -> Result<Reply> {
        let Some(gw) = self.engine.ledger().active_giveaway()? else {
            return Ok(Reply::text("No active giveaway"));
        };
        match DrawEngine::draw(self.engine.ledger_mut(), &gw, &mut rand::thread_rng()) {
            Ok(winner) => {
                let label = self
                    .engine
                    .ledger()
                    .participant(winner)?
                    .map(|p| p.display_label())
                    .unwrap_or_else(|| format!("ID{winner}"));
                Ok(Reply::text(format!("Winner: {label} (user {winner})")))
            }
            Err(GiveawayError::NoParticipants) => Ok(Reply::text(
                "No participants yet — the giveaway stays active.",
            )),
            Err(e) => Err(e),
        }
    }

    fn handle_stats(&mut self) -> Result<Reply> {
        let Some(gw) = self.engine.ledger().active_giveaway()? else {
            return Ok(Reply::text("No active giveaway"));
        };
        let stats = self.engine.ledger().stats(gw.id)?;
        Ok(Reply::text(format!(
            "Statistics\nParticipants: {}\nTickets: {}\nVideo tickets: {}",
            stats.participants, stats.total_tickets, stats.video_tickets
        )))
    }

    fn handle_top(&mut self, limit: usize) -> Result<Reply> {
        let Some(gw) = self.engine.ledger().active_giveaway()? else {
            return Ok(Reply::text("No active giveaway"));
        };
        let limit = if limit == 0 { DEFAULT_TOP_LIMIT } else { limit };
        let entries = self.engine.ledger().top_participants(gw.id, limit)?;
        if entries.is_empty() {
            return Ok(Reply::text("No participants yet"));
        }
        let mut text = format!("Top {}\n\n", entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let _ = writeln!(text, "{}. {} — {}", i + 1, entry.display_label(), entry.tickets);
        }
        Ok(Reply::text(text.trim_end().to_string()))
    }

    fn handle_cancel(&mut self) -> Result<Reply> {
        if self.engine.ledger().deactivate_active()? == 0 {
            Ok(Reply::text("No active giveaway"))
        } else {
            Ok(Reply::text("Giveaway cancelled"))
        }
    }

    fn handle_remove_video(&mut self, target: i64) -> Result<Reply> {
        let Some(gw) = self.engine.ledger().active_giveaway()? else {
            return Ok(Reply::text("No active giveaway"));
        };
        let removed = self.engine.ledger().revoke_video_ticket(target, gw.id)?;
        Ok(Reply::text(format!(
            "Removed {removed} video ticket(s) for user {target}."
        )))
    }
}

fn format_submission(report: &SubmissionReport) -> String {
    let mut text = match &report.outcome {
        SubmissionOutcome::Accepted { publish_time } => format!(
            "Video accepted!\nPublished: {}\nYou earned +1 ticket",
            format_timestamp(*publish_time)
        ),
        SubmissionOutcome::Rejected { reason } => match reason {
            RejectReason::NoActiveGiveaway => "No active giveaway".to_string(),
            RejectReason::DuplicateSubmission => {
                "Video NOT accepted\nReason: you already submitted a video for this giveaway"
                    .to_string()
            }
            RejectReason::Provenance(diagnostic) => {
                format!("Video NOT accepted\nReason: {diagnostic}")
            }
            RejectReason::PublishedBeforeStart {
                publish_time,
                start_time,
            } => format!(
                "Video NOT accepted\nReason: published before the giveaway started\n\n\
                 Video published: {}\nGiveaway started: {}",
                format_timestamp(*publish_time),
                format_timestamp(*start_time)
            ),
        },
    };
    if let Some(debug) = &report.debug {
        text.push_str(&format_debug(debug));
    }
    text
}

fn format_debug(debug: &DebugPayload) -> String {
    format!(
        "\n\nDEBUG\nURL: {}\nPublish time: {}\nGiveaway start: {}\nDelta: {}",
        debug.url,
        debug
            .publish_time
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
        debug.start_time,
        debug
            .delta
            .map(|d| format!("{d} s"))
            .unwrap_or_else(|| "n/a".to_string()),
    )
}

fn format_timestamp(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%d.%m.%Y %H:%M UTC").to_string(),
        None => format!("{ts}"),
    }
}
