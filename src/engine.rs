use crate::config::Config;
use crate::domain::Giveaway;
use crate::error::{GiveawayError, Result};
use crate::ledger::TicketLedger;
use crate::sources::{ResolveError, ResolvePublishTime};
use tracing::{debug, info};

/// Terminal states of one video submission. Every rejection carries the
/// reason shown to the submitting user; nothing here escalates past the
/// submission itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted { publish_time: i64 },
    Rejected { reason: RejectReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NoActiveGiveaway,
    DuplicateSubmission,
    Provenance(ResolveError),
    PublishedBeforeStart { publish_time: i64, start_time: i64 },
}

/// Raw numbers behind a submission decision. Attached to the administrator's
/// own submissions to make false rejections from the pattern-scrape strategy
/// auditable without reading logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugPayload {
    pub url: String,
    pub publish_time: Option<i64>,
    pub start_time: i64,
    pub delta: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub outcome: SubmissionOutcome,
    pub debug: Option<DebugPayload>,
}

/// What a join produced, for the transport layer to render.
#[derive(Debug, Clone)]
pub struct JoinSummary {
    pub giveaway: Option<Giveaway>,
    pub base_granted: bool,
    pub referral_credited: bool,
    pub referral_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileView {
    pub total_tickets: i64,
    pub referral_count: i64,
    pub has_video: bool,
}

/// Orchestrates joins, referrals and video submissions against the ledger
/// and the provenance resolvers. Owns the ledger; administrative reads and
/// transitions go through the accessors.
pub struct EligibilityEngine {
    ledger: TicketLedger,
    resolver: Box<dyn ResolvePublishTime>,
    admin_id: i64,
    bot_handle: String,
}

impl EligibilityEngine {
    pub fn new(ledger: TicketLedger, resolver: Box<dyn ResolvePublishTime>, config: &Config) -> Self {
        Self {
            ledger,
            resolver,
            admin_id: config.admin_id,
            bot_handle: config.bot_handle.clone(),
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin_id
    }

    pub fn ledger(&self) -> &TicketLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut TicketLedger {
        &mut self.ledger
    }

    /// Registers the user, applies an optional referral payload, and grants
    /// the base ticket when a giveaway is running.
    ///
    /// The payload is the `<giveawayId>_<referrerId>` argument carried by a
    /// referral link. It is machine-generated, so anything unparseable is
    /// dropped silently; a payload naming a past giveaway or the user
    /// themselves is ignored as well.
    pub fn join(&mut self, user_id: i64, handle: Option<&str>, payload: Option<&str>) -> Result<JoinSummary> {
        self.ledger.record_user(user_id, handle)?;

        let giveaway = self.ledger.active_giveaway()?;

        let mut referral_credited = false;
        if let (Some(arg), Some(gw)) = (payload, giveaway.as_ref()) {
            match parse_referral_payload(arg) {
                Some((giveaway_id, referrer_id))
                    if giveaway_id == gw.id && referrer_id != user_id =>
                {
                    referral_credited =
                        self.ledger.record_referral(referrer_id, user_id, giveaway_id)?;
                }
                Some(_) => debug!("Referral payload '{arg}' does not match the running giveaway"),
                None => debug!("Ignoring malformed referral payload '{arg}'"),
            }
        }

        let mut base_granted = false;
        let mut referral_link = None;
        if let Some(gw) = giveaway.as_ref() {
            base_granted = self.ledger.grant_base_ticket(user_id, gw.id)?;
            referral_link = Some(format!(
                "https://t.me/{}?start={}_{}",
                self.bot_handle, gw.id, user_id
            ));
        }

        Ok(JoinSummary {
            giveaway,
            base_granted,
            referral_credited,
            referral_link,
        })
    }

    /// Ticket standing of one user in the running giveaway.
    pub fn profile(&self, user_id: i64) -> Result<Option<ProfileView>> {
        let Some(gw) = self.ledger.active_giveaway()? else {
            return Ok(None);
        };
        Ok(Some(ProfileView {
            total_tickets: self.ledger.user_ticket_count(user_id, gw.id)?,
            referral_count: self.ledger.referral_count(user_id, gw.id)?,
            has_video: self.ledger.has_video_ticket(user_id, gw.id)?,
        }))
    }

    /// The submission state machine: Verifying ends in Accepted or Rejected,
    /// and every path through here terminates the submission. Resolver
    /// failures become rejections, not errors.
    pub async fn submit_video(&mut self, user_id: i64, url: &str) -> Result<SubmissionReport> {
        let Some(gw) = self.ledger.active_giveaway()? else {
            return Ok(SubmissionReport {
                outcome: SubmissionOutcome::Rejected {
                    reason: RejectReason::NoActiveGiveaway,
                },
                debug: None,
            });
        };

        let url = url.trim();
        let is_admin = self.is_admin(user_id);
        let debug_for = |publish_time: Option<i64>| {
            is_admin.then(|| DebugPayload {
                url: url.to_string(),
                publish_time,
                start_time: gw.start_time,
                delta: publish_time.map(|ts| ts - gw.start_time),
            })
        };

        // Duplicate check comes before any network call; a second submission
        // must not spend resolver quota.
        if self.ledger.has_video_ticket(user_id, gw.id)? {
            return Ok(SubmissionReport {
                outcome: SubmissionOutcome::Rejected {
                    reason: RejectReason::DuplicateSubmission,
                },
                debug: debug_for(None),
            });
        }

        let publish_time = match self.resolver.resolve(url).await {
            Ok(ts) => ts,
            Err(reason) => {
                info!("Submission by user {user_id} rejected: {reason}");
                return Ok(SubmissionReport {
                    outcome: SubmissionOutcome::Rejected {
                        reason: RejectReason::Provenance(reason),
                    },
                    debug: debug_for(None),
                });
            }
        };

        // Strictly before the start is out; publishing at the exact start
        // second still counts.
        if publish_time < gw.start_time {
            info!(
                "Submission by user {user_id} rejected: published {} before giveaway start {}",
                publish_time, gw.start_time
            );
            return Ok(SubmissionReport {
                outcome: SubmissionOutcome::Rejected {
                    reason: RejectReason::PublishedBeforeStart {
                        publish_time,
                        start_time: gw.start_time,
                    },
                },
                debug: debug_for(Some(publish_time)),
            });
        }

        match self.ledger.grant_video_ticket(user_id, gw.id, url) {
            Ok(()) => Ok(SubmissionReport {
                outcome: SubmissionOutcome::Accepted { publish_time },
                debug: debug_for(Some(publish_time)),
            }),
            // Lost the race against a near-simultaneous submission
            Err(GiveawayError::DuplicateSubmission) => Ok(SubmissionReport {
                outcome: SubmissionOutcome::Rejected {
                    reason: RejectReason::DuplicateSubmission,
                },
                debug: debug_for(Some(publish_time)),
            }),
            Err(e) => Err(e),
        }
    }
}

fn parse_referral_payload(arg: &str) -> Option<(i64, i64)> {
    let (giveaway_id, referrer_id) = arg.split_once('_')?;
    Some((
        giveaway_id.trim().parse().ok()?,
        referrer_id.trim().parse().ok()?,
    ))
}
