//! Caveats: side conditions that narrow when a capability may be used.
//!
//! A closed tagged union. Adding a caveat type is a source change; there
//! is no runtime registration inside the security boundary. Documents
//! carrying a type outside the recognized set still parse (the raw object
//! is retained) and fail at evaluation time with `UnknownCaveat`, unless
//! the caller has enrolled that type as externally enforced.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::error::{Result, ZcapError};
use crate::model::Parameters;
use crate::store::RevocationSet;

/// A single caveat attached to a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Caveat {
    /// Satisfied while `now <= date`.
    ValidUntil {
        #[serde(with = "crate::codec::datetime")]
        date: DateTime<Utc>,
    },
    /// Satisfied while `now >= date`.
    ValidAfter {
        #[serde(with = "crate::codec::datetime")]
        date: DateTime<Utc>,
    },
    /// Satisfied while the condition id has not been revoked.
    ValidWhileTrue {
        #[serde(rename = "conditionId")]
        condition_id: String,
    },
    /// Restricts which actions may be invoked.
    AllowedAction { actions: Vec<String> },
    /// Requires an invocation parameter to carry an exact value.
    RequireParameter { parameter: String, value: Value },
    /// Host-context restriction; evaluation is deferred to the caller.
    AllowedNetwork {
        #[serde(flatten)]
        fields: BTreeMap<String, Value>,
    },
    /// Use-count restriction; evaluation is deferred to the caller.
    MaxUses { limit: u64 },
    /// Satisfied while the clock's UTC time-of-day is inside `start..=end`.
    TimeSlot { start: String, end: String },
    /// Anything outside the recognized set. Always fails closed.
    #[serde(untagged)]
    Unrecognized(BTreeMap<String, Value>),
}

impl Caveat {
    /// Wire-level type name of this caveat.
    pub fn type_name(&self) -> &str {
        match self {
            Caveat::ValidUntil { .. } => "ValidUntil",
            Caveat::ValidAfter { .. } => "ValidAfter",
            Caveat::ValidWhileTrue { .. } => "ValidWhileTrue",
            Caveat::AllowedAction { .. } => "AllowedAction",
            Caveat::RequireParameter { .. } => "RequireParameter",
            Caveat::AllowedNetwork { .. } => "AllowedNetwork",
            Caveat::MaxUses { .. } => "MaxUses",
            Caveat::TimeSlot { .. } => "TimeSlot",
            Caveat::Unrecognized(fields) => fields
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }
}

/// Context a caveat is evaluated against.
///
/// `action` and `parameters` are present only when evaluating on behalf of
/// an invocation; capability verification evaluates with both absent.
pub struct CaveatContext<'a> {
    pub now: DateTime<Utc>,
    pub action: Option<&'a str>,
    pub parameters: Option<&'a Parameters>,
    pub revocations: &'a dyn RevocationSet,
    /// Caveat type names the caller has declared it enforces externally.
    pub external: &'a HashSet<String>,
}

/// Evaluate one caveat. `Ok(())` means satisfied.
pub fn evaluate(caveat: &Caveat, ctx: &CaveatContext<'_>) -> Result<()> {
    match caveat {
        Caveat::ValidUntil { date } => {
            if ctx.now <= *date {
                Ok(())
            } else {
                Err(failed(caveat, format!("window closed at {date}")))
            }
        }
        Caveat::ValidAfter { date } => {
            if ctx.now >= *date {
                Ok(())
            } else {
                Err(failed(caveat, format!("window opens at {date}")))
            }
        }
        Caveat::ValidWhileTrue { condition_id } => {
            if ctx.revocations.contains(condition_id) {
                Err(failed(caveat, format!("condition {condition_id} revoked")))
            } else {
                Ok(())
            }
        }
        Caveat::AllowedAction { actions } => match ctx.action {
            Some(action) if !actions.iter().any(|a| a == action) => {
                Err(failed(caveat, format!("action {action} not in {actions:?}")))
            }
            _ => Ok(()),
        },
        Caveat::RequireParameter { parameter, value } => match ctx.parameters {
            None => Ok(()),
            Some(parameters) => match parameters.get(parameter) {
                Some(supplied) if supplied == value => Ok(()),
                Some(supplied) => Err(failed(
                    caveat,
                    format!("parameter {parameter} is {supplied}, requires {value}"),
                )),
                None => Err(failed(caveat, format!("parameter {parameter} missing"))),
            },
        },
        Caveat::TimeSlot { start, end } => {
            let window_start = parse_clock_time(caveat, start)?;
            let window_end = parse_clock_time(caveat, end)?;
            let time_of_day = ctx.now.time();
            let inside = if window_start <= window_end {
                (window_start..=window_end).contains(&time_of_day)
            } else {
                // Window crosses midnight.
                time_of_day >= window_start || time_of_day <= window_end
            };
            if inside {
                Ok(())
            } else {
                Err(failed(caveat, format!("outside {start}-{end}")))
            }
        }
        Caveat::AllowedNetwork { .. } | Caveat::MaxUses { .. } => deferred(caveat, ctx),
        Caveat::Unrecognized(_) => deferred(caveat, ctx),
    }
}

/// Types the core cannot evaluate pass only when the caller enrolled them.
fn deferred(caveat: &Caveat, ctx: &CaveatContext<'_>) -> Result<()> {
    let name = caveat.type_name();
    if ctx.external.contains(name) {
        Ok(())
    } else {
        Err(ZcapError::UnknownCaveat(name.to_string()))
    }
}

fn failed(caveat: &Caveat, detail: String) -> ZcapError {
    ZcapError::CaveatFailed {
        caveat_type: caveat.type_name().to_string(),
        detail,
    }
}

fn parse_clock_time(caveat: &Caveat, s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| failed(caveat, format!("bad time {s:?}")))
}
