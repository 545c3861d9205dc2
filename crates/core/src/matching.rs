//! Matching availability changes against alert rules.

use crate::alert::{AlertRule, NotificationEnvelope};
use crate::availability::AvailabilityChange;

/// Produce an envelope for every (change, rule) pair where the rule matches.
///
/// Changes form the outer loop and rules the inner one, so envelopes come
/// out grouped by change in rule order. Runs in O(changes x rules); alert
/// creation caps each user at a handful of rules.
pub fn match_changes(
    changes: &[AvailabilityChange],
    rules: &[AlertRule],
) -> Vec<NotificationEnvelope> {
    changes
        .iter()
        .flat_map(|change| {
            rules
                .iter()
                .filter(move |rule| rule.matches(change))
                .map(move |rule| NotificationEnvelope::new(rule, change))
        })
        .collect()
}
