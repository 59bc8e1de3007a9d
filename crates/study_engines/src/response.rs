#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use study_kernel_contracts::participant::ParticipantId;
use study_kernel_contracts::timeline::CandidateUnitContext;
use study_kernel_contracts::trial::{TrialRecord, RATING_MAX, RATING_MIN};
use study_kernel_contracts::ContractViolation;
use tracing::warn;

/// Answer payload as delivered by the presentation runtime for one rating unit.
///
/// Either `response` holds an object keyed by question, or `responses` holds
/// the same object JSON-encoded as a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub responses: Option<String>,
    /// Reaction time in milliseconds; the runtime reports it as a float.
    #[serde(default, deserialize_with = "deserialize_rt_ms")]
    pub rt: Option<u64>,
}

fn rt_ms_from_value(value: &Value) -> Option<u64> {
    let ms = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (ms.is_finite() && ms >= 0.0).then(|| ms.round() as u64)
}

/// Accepts integers, floats and numeric strings; anything else reads as absent.
fn deserialize_rt_ms<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(rt_ms_from_value))
}

impl RawResponse {
    pub fn answer(question_key: &str, internal_value: u8, rt_ms: Option<u64>) -> Self {
        Self {
            response: Some(serde_json::json!({ question_key: internal_value })),
            responses: None,
            rt: rt_ms,
        }
    }
}

/// 0-based internal scale value to the external 1..=7 rating.
pub fn external_rating(internal: i64) -> Option<u8> {
    let max_internal = i64::from(RATING_MAX - RATING_MIN);
    if (0..=max_internal).contains(&internal) {
        Some(internal as u8 + RATING_MIN)
    } else {
        None
    }
}

fn answer_object(raw: &RawResponse) -> Option<serde_json::Map<String, Value>> {
    match &raw.response {
        Some(Value::Object(obj)) => return Some(obj.clone()),
        Some(_) | None => {}
    }
    let encoded = raw.responses.as_deref()?;
    match serde_json::from_str::<Value>(encoded) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

fn numeric_answer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Internal answer for `question_key`, falling back to the first key in
/// payload order.
pub fn extract_internal_answer(raw: &RawResponse, question_key: &str) -> Option<i64> {
    let obj = answer_object(raw)?;
    let value = obj.get(question_key).or_else(|| obj.values().next())?;
    numeric_answer(value)
}

/// Builds the trial record for a completed rating unit.
///
/// Malformed answers do not abort the unit: the record keeps an empty rating.
pub fn normalize_response(
    participant_id: &ParticipantId,
    context: &CandidateUnitContext,
    raw: &RawResponse,
) -> Result<TrialRecord, ContractViolation> {
    let rating = extract_internal_answer(raw, &context.question_key).and_then(external_rating);
    if rating.is_none() {
        warn!(
            participant_id = %participant_id,
            question_key = %context.question_key,
            "malformed rating response; recording empty rating"
        );
    }
    TrialRecord::v1(
        participant_id.clone(),
        context.scenario_id,
        context.candidate_id.clone(),
        context.modality,
        context.variant,
        rating,
        context.asset_path.clone(),
        raw.rt,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_kernel_contracts::scenario::{CandidateId, ScenarioId};
    use study_kernel_contracts::stimulus::{AssetIndex, Modality, Variant};
    use study_kernel_contracts::trial::ResponseStatus;

    fn context(modality: Modality) -> CandidateUnitContext {
        let candidate_id = CandidateId::new("C3").unwrap();
        CandidateUnitContext {
            scenario_id: ScenarioId::CeoB,
            scenario_kind: ScenarioId::CeoB.role_kind(),
            scenario_ordinal: 1,
            question_key: CandidateUnitContext::question_key_for(ScenarioId::CeoB, modality, &candidate_id),
            candidate_id,
            display_position: 2,
            modality,
            asset_index: AssetIndex::new(2).unwrap(),
            variant: Variant::new(1).unwrap(),
            asset_path: "assets/faces/male/face02_var1.png".to_string(),
        }
    }

    fn pid() -> ParticipantId {
        ParticipantId::new("P9").unwrap()
    }

    #[test]
    fn at_response_01_scale_endpoints_map_to_one_and_seven() {
        assert_eq!(external_rating(0), Some(1));
        assert_eq!(external_rating(6), Some(7));
        assert_eq!(external_rating(-1), None);
        assert_eq!(external_rating(7), None);
    }

    #[test]
    fn at_response_02_object_response_is_normalized() {
        let ctx = context(Modality::Image);
        let raw = RawResponse::answer(&ctx.question_key, 4, Some(2300));
        let r = normalize_response(&pid(), &ctx, &raw).unwrap();
        assert_eq!(r.rating, Some(5));
        assert_eq!(r.rt_ms, Some(2300));
        assert_eq!(r.variant, ctx.variant);
        assert_eq!(r.face_file, ctx.asset_path);
        assert!(r.audio_file.is_empty());
    }

    #[test]
    fn at_response_03_string_encoded_responses_are_accepted() {
        let ctx = context(Modality::Image);
        let raw = RawResponse {
            response: None,
            responses: Some(r#"{"Q0":"2"}"#.to_string()),
            rt: None,
        };
        assert_eq!(normalize_response(&pid(), &ctx, &raw).unwrap().rating, Some(3));
    }

    #[test]
    fn at_response_04_malformed_payload_records_empty_rating() {
        let ctx = context(Modality::Image);
        for raw in [
            RawResponse::default(),
            RawResponse {
                response: Some(Value::String("nope".to_string())),
                ..RawResponse::default()
            },
            RawResponse {
                responses: Some("not json".to_string()),
                ..RawResponse::default()
            },
            RawResponse {
                response: Some(serde_json::json!({ "k": 9 })),
                ..RawResponse::default()
            },
            RawResponse {
                response: Some(serde_json::json!({ "k": 2.5 })),
                ..RawResponse::default()
            },
        ] {
            let r = normalize_response(&pid(), &ctx, &raw).unwrap();
            assert_eq!(r.rating, None);
            assert_eq!(r.response_status, ResponseStatus::Malformed);
        }
    }

    #[test]
    fn at_response_05_question_key_wins_over_other_keys() {
        let ctx = context(Modality::Image);
        let mut obj = serde_json::Map::new();
        obj.insert("AAA".to_string(), Value::from(0));
        obj.insert(ctx.question_key.clone(), Value::from(6));
        let raw = RawResponse {
            response: Some(Value::Object(obj)),
            ..RawResponse::default()
        };
        assert_eq!(normalize_response(&pid(), &ctx, &raw).unwrap().rating, Some(7));
    }

    #[test]
    fn at_response_06_float_reaction_time_keeps_the_rating() {
        let ctx = context(Modality::Image);
        let raw: RawResponse = serde_json::from_str(r#"{"response":{"Q0":3},"rt":2345.1000000238}"#).unwrap();
        assert_eq!(raw.rt, Some(2345));
        let r = normalize_response(&pid(), &ctx, &raw).unwrap();
        assert_eq!(r.rating, Some(4));
        assert_eq!(r.rt_ms, Some(2345));

        let raw: RawResponse = serde_json::from_str(r#"{"response":{"Q0":1},"rt":"812.6"}"#).unwrap();
        assert_eq!(raw.rt, Some(813));
        for payload in [
            r#"{"response":{"Q0":1},"rt":null}"#,
            r#"{"response":{"Q0":1},"rt":"soon"}"#,
            r#"{"response":{"Q0":1},"rt":-4}"#,
            r#"{"response":{"Q0":1},"rt":[1]}"#,
            r#"{"response":{"Q0":1}}"#,
        ] {
            let raw: RawResponse = serde_json::from_str(payload).unwrap();
            assert_eq!(raw.rt, None, "{payload}");
            assert_eq!(normalize_response(&pid(), &ctx, &raw).unwrap().rating, Some(2));
        }
    }

    #[test]
    fn at_response_07_first_key_follows_payload_order() {
        let ctx = context(Modality::Image);
        let raw: RawResponse = serde_json::from_str(r#"{"responses":"{\"Z9\":5,\"A1\":0}"}"#).unwrap();
        assert_eq!(extract_internal_answer(&raw, &ctx.question_key), Some(5));
        let raw: RawResponse = serde_json::from_str(r#"{"response":{"Z9":2,"A1":6}}"#).unwrap();
        assert_eq!(normalize_response(&pid(), &ctx, &raw).unwrap().rating, Some(3));
    }
}
