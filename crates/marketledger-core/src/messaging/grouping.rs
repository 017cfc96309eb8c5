//! Day grouping for message lists.

use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone};
use marketledger_api::types::Message;

/// Heading of a day group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    /// Same calendar day as "now".
    Today,
    /// The day before "now".
    Yesterday,
    /// Any earlier (or later) day.
    Date(NaiveDate),
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("Today"),
            Self::Yesterday => f.write_str("Yesterday"),
            Self::Date(date) => write!(f, "{}", date.format("%B %-d, %Y")),
        }
    }
}

/// Consecutive messages sent on the same day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    /// Calendar day in the caller's time zone.
    pub date: NaiveDate,
    /// Heading for the group.
    pub label: DayLabel,
    /// Messages in display order.
    pub messages: Vec<Message>,
}

/// Groups time-ordered messages by calendar day in `now`'s time zone.
#[must_use]
pub fn group_by_day<Tz: TimeZone>(messages: &[Message], now: &DateTime<Tz>) -> Vec<DayGroup> {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.pred_opt();

    let mut groups: Vec<DayGroup> = Vec::new();
    for message in messages {
        let date = message.timestamp.with_timezone(&tz).date_naive();
        match groups.last_mut() {
            Some(group) if group.date == date => group.messages.push(message.clone()),
            _ => {
                let label = if date == today {
                    DayLabel::Today
                } else if Some(date) == yesterday {
                    DayLabel::Yesterday
                } else {
                    DayLabel::Date(date)
                };
                groups.push(DayGroup {
                    date,
                    label,
                    messages: vec![message.clone()],
                });
            }
        }
    }
    groups
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{FixedOffset, Utc};
    use marketledger_api::types::{ConversationId, MessageId, UserId, UserRef};

    use super::*;

    fn message(id: i64, at: &str) -> Message {
        Message {
            id: MessageId::new(id),
            conversation_id: ConversationId::new(1),
            sender: UserRef {
                id: UserId::new(1),
                username: "ana".to_string(),
            },
            content: format!("m{id}"),
            timestamp: at.parse::<DateTime<Utc>>().unwrap(),
            is_read: true,
        }
    }

    #[test]
    fn test_groups_today_yesterday_and_older() {
        let messages = [
            message(1, "2026-03-01T09:00:00Z"),
            message(2, "2026-03-09T23:00:00Z"),
            message(3, "2026-03-10T08:00:00Z"),
            message(4, "2026-03-10T10:00:00Z"),
        ];
        let now: DateTime<Utc> = "2026-03-10T12:00:00Z".parse().unwrap();

        let groups = group_by_day(&messages, &now);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].label.to_string(), "March 1, 2026");
        assert_eq!(groups[1].label, DayLabel::Yesterday);
        assert_eq!(groups[2].label, DayLabel::Today);
        assert_eq!(groups[2].messages.len(), 2);
    }

    #[test]
    fn test_grouping_uses_callers_time_zone() {
        let messages = [message(1, "2026-03-09T23:00:00Z")];
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = "2026-03-10T12:00:00Z"
            .parse::<DateTime<Utc>>()
            .unwrap()
            .with_timezone(&offset);

        let groups = group_by_day(&messages, &now);

        // 23:00 UTC is already the next day at UTC+2
        assert_eq!(groups[0].label, DayLabel::Today);
    }
}
