//! Retention policy evaluation
//!
//! Tiers are evaluated in order and the first that applies decides:
//! exclusion, tag rule, user rule, watched rule, standard retention.
//! Every decision carries a `DecisionBasis` so that display text is always
//! rendered from structured data.

use chrono::{DateTime, Duration, Utc};
use media_retention_config::{AdvancedRule, Config, ConfigProvider, RuleKind, UserRule};
use media_retention_models::{DeletionCandidate, MediaItem, Requester};
use std::sync::Arc;
use tracing::warn;
use crate::error::EngineError;

/// Parse a retention string: `<n>d`, `<n>h`, `<n>m`, `<n>s` or `never`
///
/// `never` is the zero duration. Whitespace around the value and the case of
/// the unit letter are ignored.
pub fn parse_duration(value: &str) -> Result<Duration, EngineError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("never") {
        return Ok(Duration::zero());
    }

    let invalid = || EngineError::InvalidDuration(value.to_string());
    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let digits = &trimmed[..trimmed.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let magnitude: i64 = digits.parse().map_err(|_| invalid())?;

    let duration = match unit.to_ascii_lowercase() {
        'd' => Duration::try_days(magnitude),
        'h' => Duration::try_hours(magnitude),
        'm' => Duration::try_minutes(magnitude),
        's' => Duration::try_seconds(magnitude),
        _ => None,
    };
    duration.ok_or_else(invalid)
}

/// Which tier decided, with the data needed to explain it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionBasis {
    Excluded,
    TagRule { rule: String, tag: String, retention: String },
    UserRule { rule: String, user: String, retention: String },
    WatchedRule { rule: String, retention: String },
    Standard { retention: String },
    RetentionDisabled,
    Requested,
    NotWatchedYet { rule: String },
    InvalidRetention { retention: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub should_delete: bool,
    pub delete_after: Option<DateTime<Utc>>,
    pub basis: DecisionBasis,
}

impl PolicyDecision {
    fn keep(basis: DecisionBasis) -> Self {
        Self {
            should_delete: false,
            delete_after: None,
            basis,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.delete_after.is_some()
    }

    /// Short machine-friendly reason for this decision
    pub fn reason(&self) -> String {
        let state = if self.should_delete {
            "retention period expired"
        } else {
            "within retention period"
        };
        match &self.basis {
            DecisionBasis::Excluded => "excluded".to_string(),
            DecisionBasis::RetentionDisabled => "retention disabled".to_string(),
            DecisionBasis::Requested => "requested".to_string(),
            DecisionBasis::NotWatchedYet { .. } => "not watched yet".to_string(),
            DecisionBasis::InvalidRetention { .. } => "invalid retention".to_string(),
            DecisionBasis::Standard { retention } => format!("{} ({})", state, retention),
            DecisionBasis::TagRule { rule, tag, retention } => {
                format!("tag rule '{}' matched tag '{}': {} ({})", rule, tag, state, retention)
            }
            DecisionBasis::UserRule { rule, user, retention } => {
                format!("user rule '{}' for {}: {} ({})", rule, user, state, retention)
            }
            DecisionBasis::WatchedRule { rule, retention } => {
                format!("watched rule '{}': {} ({})", rule, state, retention)
            }
        }
    }
}

/// Render a decision as a sentence for people
///
/// The sentence states how long ago the item was last watched (or added, if
/// never watched) and which rule produced `delete_after`.
pub fn generate_deletion_reason(
    item: &MediaItem,
    delete_after: DateTime<Utc>,
    decision: &PolicyDecision,
    now: DateTime<Utc>,
) -> String {
    let base_age = days_label((now - item.retention_base()).num_days());
    let history = match item.last_watched {
        Some(_) => format!("Last watched {} ago", base_age),
        None => format!("Added {} ago and never watched", base_age),
    };

    let rule = match &decision.basis {
        DecisionBasis::Standard { retention } => {
            format!("the standard {} retention of {}", item.media_type, retention)
        }
        DecisionBasis::TagRule { rule, tag, retention } => {
            format!("tag rule '{}' (tag '{}', {})", rule, tag, retention)
        }
        DecisionBasis::UserRule { rule, user, retention } => {
            format!("user rule '{}' for {} ({})", rule, user, retention)
        }
        DecisionBasis::WatchedRule { rule, retention } => {
            format!("watched rule '{}' ({})", rule, retention)
        }
        _ => return decision.reason(),
    };

    if now > delete_after {
        format!(
            "{}; overdue by {} under {}",
            history,
            days_label((now - delete_after).num_days()),
            rule
        )
    } else {
        format!(
            "{}; will be deleted in {} under {}",
            history,
            days_label((delete_after - now).num_days()),
            rule
        )
    }
}

fn days_label(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", days)
    }
}

/// Evaluates retention policy against the live configuration
pub struct RulesEngine {
    config: Arc<dyn ConfigProvider>,
}

impl RulesEngine {
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, item: &MediaItem) -> PolicyDecision {
        self.evaluate_at(item, Utc::now())
    }

    /// Evaluate one item at a fixed instant
    pub fn evaluate_at(&self, item: &MediaItem, now: DateTime<Utc>) -> PolicyDecision {
        let config = self.config.snapshot();
        evaluate_with(&config, item, now)
    }

    /// Evaluate and write the schedule back onto the item; returns whether a
    /// deletion time is scheduled
    pub fn apply_to(&self, item: &mut MediaItem, now: DateTime<Utc>) -> bool {
        let decision = self.evaluate_at(item, now);
        match decision.delete_after {
            Some(delete_after) => {
                item.delete_after = Some(delete_after);
                item.days_until_due = Some((delete_after - now).num_days());
                item.deletion_reason = Some(generate_deletion_reason(item, delete_after, &decision, now));
                true
            }
            None => {
                item.clear_schedule();
                false
            }
        }
    }

    /// Items past their deletion time, most overdue first
    pub fn get_deletion_candidates<'a, I>(&self, items: I, now: DateTime<Utc>) -> Vec<DeletionCandidate>
    where
        I: IntoIterator<Item = &'a MediaItem>,
    {
        let mut due: Vec<&MediaItem> = items
            .into_iter()
            .filter(|item| !item.is_excluded && item.delete_after.is_some_and(|d| d < now))
            .collect();
        due.sort_by(|a, b| a.delete_after.cmp(&b.delete_after).then_with(|| a.title.cmp(&b.title)));
        due.into_iter().map(|item| DeletionCandidate::from_item(item, now)).collect()
    }

    /// Items that will become due within `window_days`, soonest first,
    /// re-evaluated against the current configuration
    pub fn get_leaving_soon<'a, I>(&self, items: I, window_days: u32, now: DateTime<Utc>) -> Vec<MediaItem>
    where
        I: IntoIterator<Item = &'a MediaItem>,
    {
        let config = self.config.snapshot();
        let horizon = now
            .checked_add_signed(Duration::days(i64::from(window_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut leaving: Vec<MediaItem> = items
            .into_iter()
            .filter_map(|item| {
                let decision = evaluate_with(&config, item, now);
                let delete_after = decision.delete_after?;
                if delete_after <= now || delete_after > horizon {
                    return None;
                }
                let mut annotated = item.clone();
                annotated.delete_after = Some(delete_after);
                annotated.days_until_due = Some((delete_after - now).num_days());
                annotated.deletion_reason = Some(generate_deletion_reason(item, delete_after, &decision, now));
                Some(annotated)
            })
            .collect();
        leaving.sort_by(|a, b| a.delete_after.cmp(&b.delete_after).then_with(|| a.title.cmp(&b.title)));
        leaving
    }
}

fn evaluate_with(config: &Config, item: &MediaItem, now: DateTime<Utc>) -> PolicyDecision {
    if item.is_excluded {
        return PolicyDecision::keep(DecisionBasis::Excluded);
    }

    let rules: &[AdvancedRule] = &config.advanced_rules;
    let enabled = move |kind: RuleKind| rules.iter().filter(move |rule| rule.enabled && rule.kind == kind);

    // Tag rules
    for rule in enabled(RuleKind::Tag) {
        let Some(wanted) = rule.tag.as_deref() else {
            continue;
        };
        if let Some(tag) = item.tags.iter().find(|t| t.eq_ignore_ascii_case(wanted)) {
            let retention = rule.retention.clone().unwrap_or_default();
            return schedule(item, now, &retention, |retention| DecisionBasis::TagRule {
                rule: rule.name.clone(),
                tag: tag.clone(),
                retention,
            });
        }
    }

    // User rules
    if item.is_requested {
        if let Some(requester) = item.requested_by.as_ref().filter(|r| r.is_identified()) {
            if let Some((rule, user)) = find_user_rule(enabled(RuleKind::User), requester) {
                if user.require_watched && !item.has_been_watched() {
                    return PolicyDecision::keep(DecisionBasis::NotWatchedYet {
                        rule: rule.name.clone(),
                    });
                }
                return schedule(item, now, &user.retention, |retention| DecisionBasis::UserRule {
                    rule: rule.name.clone(),
                    user: requester.display_name(),
                    retention,
                });
            }
        }
    }

    // Watched rule
    if let Some(rule) = enabled(RuleKind::Watched).next() {
        if rule.require_watched && !item.has_been_watched() {
            return PolicyDecision::keep(DecisionBasis::NotWatchedYet {
                rule: rule.name.clone(),
            });
        }
        let retention = rule.retention.clone().unwrap_or_default();
        return schedule(item, now, &retention, |retention| DecisionBasis::WatchedRule {
            rule: rule.name.clone(),
            retention,
        });
    }

    // Standard retention
    let retention = config.rules.retention_for(item.media_type);
    let duration = match parse_duration(retention) {
        Ok(duration) => duration,
        Err(e) => return invalid_retention(item, retention, e),
    };
    if duration.is_zero() {
        return PolicyDecision::keep(DecisionBasis::RetentionDisabled);
    }
    if item.is_requested && config.advanced_rules.is_empty() {
        return PolicyDecision::keep(DecisionBasis::Requested);
    }
    scheduled_decision(item, now, duration, DecisionBasis::Standard {
        retention: retention.to_string(),
    })
}

/// First per-user entry matching the requester: by user id across all
/// rules, then by username, then by email
fn find_user_rule<'a, I>(rules: I, requester: &Requester) -> Option<(&'a AdvancedRule, &'a UserRule)>
where
    I: Iterator<Item = &'a AdvancedRule> + Clone,
{
    let entries = || rules.clone().flat_map(|rule| rule.users.iter().map(move |user| (rule, user)));
    let same = |a: &Option<String>, b: &Option<String>| match (a.as_deref(), b.as_deref()) {
        (Some(a), Some(b)) => !a.is_empty() && a.eq_ignore_ascii_case(b),
        _ => false,
    };

    if let Some(id) = requester.user_id {
        if let Some(found) = entries().find(|(_, user)| user.user_id == Some(id)) {
            return Some(found);
        }
    }
    if let Some(found) = entries().find(|(_, user)| same(&requester.username, &user.username)) {
        return Some(found);
    }
    entries().find(|(_, user)| same(&requester.email, &user.email))
}

fn schedule<F>(item: &MediaItem, now: DateTime<Utc>, retention: &str, basis: F) -> PolicyDecision
where
    F: FnOnce(String) -> DecisionBasis,
{
    match parse_duration(retention) {
        // A rule that retains for `never` keeps its items indefinitely
        Ok(duration) if duration.is_zero() => PolicyDecision::keep(DecisionBasis::RetentionDisabled),
        Ok(duration) => scheduled_decision(item, now, duration, basis(retention.to_string())),
        Err(e) => invalid_retention(item, retention, e),
    }
}

fn scheduled_decision(
    item: &MediaItem,
    now: DateTime<Utc>,
    duration: Duration,
    basis: DecisionBasis,
) -> PolicyDecision {
    match item.retention_base().checked_add_signed(duration) {
        Some(delete_after) => PolicyDecision {
            should_delete: now > delete_after,
            delete_after: Some(delete_after),
            basis,
        },
        None => {
            warn!(item = %item.id, "Retention overflows the calendar; no deletion scheduled");
            PolicyDecision::keep(DecisionBasis::InvalidRetention {
                retention: format!("{}s", duration.num_seconds()),
            })
        }
    }
}

fn invalid_retention(item: &MediaItem, retention: &str, error: EngineError) -> PolicyDecision {
    warn!(
        item = %item.id,
        media_type = %item.media_type,
        retention = %retention,
        error = %error,
        "Invalid retention; no deletion scheduled"
    );
    PolicyDecision::keep(DecisionBasis::InvalidRetention {
        retention: retention.to_string(),
    })
}
