use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod admin;
pub mod health;
pub mod public;
pub mod rsvp;
pub mod session;
pub mod validation;

use crate::dao::models::EpochMillis;

fn format_epoch_millis(at: EpochMillis) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(at.0) * 1_000_000)
        .ok()
        .and_then(|moment| moment.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}
