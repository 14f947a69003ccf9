//! Parameter adjustment for THROTTLE decisions.

use ctrldot_core::{Decision, ProviderRequest};

/// Token ceiling assumed when the caller set none.
const UNSET_MAX_TOKENS: u32 = 4096;
/// Temperature assumed when the caller set none.
const UNSET_TEMPERATURE: f32 = 1.0;

const CHEAP_MAX_TOKENS: u32 = 2048;
const CHEAP_TEMPERATURE: f32 = 0.7;

const TOKEN_FACTOR: f64 = 0.7;
const TEMPERATURE_FACTOR: f32 = 0.8;

/// Produce the adjusted request for a THROTTLE decision.
///
/// With a cheap-model policy and a configured cheap model, `max_tokens` and
/// `temperature` are capped. Otherwise both are scaled down, or set to the
/// cheap caps when the caller left them unset. The model name and every
/// other field pass through. The input is never modified.
pub fn apply_throttle(
    request: &ProviderRequest,
    decision: &Decision,
    cheap_model: Option<&str>,
) -> ProviderRequest {
    let mut adjusted = request.clone();

    if decision.wants_cheap_model() && cheap_model.is_some() {
        adjusted.max_tokens = Some(
            request
                .max_tokens
                .unwrap_or(UNSET_MAX_TOKENS)
                .min(CHEAP_MAX_TOKENS),
        );
        adjusted.temperature = Some(
            request
                .temperature
                .unwrap_or(UNSET_TEMPERATURE)
                .min(CHEAP_TEMPERATURE),
        );
        return adjusted;
    }

    adjusted.max_tokens = Some(match request.max_tokens {
        Some(current) => (f64::from(current) * TOKEN_FACTOR) as u32,
        None => CHEAP_MAX_TOKENS,
    });
    adjusted.temperature = Some(match request.temperature {
        Some(current) => current * TEMPERATURE_FACTOR,
        None => CHEAP_TEMPERATURE,
    });
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrldot_core::{DecisionKind, Message, ModelPolicy};

    fn throttle() -> Decision {
        Decision::new(DecisionKind::Throttle, "Budget threshold")
    }

    fn cheap_throttle() -> Decision {
        throttle().with_model_policy(ModelPolicy::Cheap)
    }

    fn request(max_tokens: Option<u32>, temperature: Option<f32>) -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4o".into(),
            messages: vec![Message::user("hello")],
            temperature,
            max_tokens,
            tools: vec![],
            stop: vec!["END".into()],
        }
    }

    fn approx(a: Option<f32>, b: f32) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-6)
    }

    #[test]
    fn cheap_policy_caps_tokens_and_temperature() {
        let out = apply_throttle(&request(Some(4096), Some(1.0)), &cheap_throttle(), Some("gpt-4o-mini"));
        assert_eq!(out.max_tokens, Some(2048));
        assert!(approx(out.temperature, 0.7));
    }

    #[test]
    fn cheap_policy_keeps_values_already_below_caps() {
        let out = apply_throttle(&request(Some(512), Some(0.2)), &cheap_throttle(), Some("gpt-4o-mini"));
        assert_eq!(out.max_tokens, Some(512));
        assert!(approx(out.temperature, 0.2));
    }

    #[test]
    fn cheap_policy_fills_unset_values() {
        let out = apply_throttle(&request(None, None), &cheap_throttle(), Some("gpt-4o-mini"));
        assert_eq!(out.max_tokens, Some(2048));
        assert!(approx(out.temperature, 0.7));
    }

    #[test]
    fn default_branch_scales_down() {
        let out = apply_throttle(&request(Some(4096), Some(1.0)), &throttle(), None);
        assert_eq!(out.max_tokens, Some(2867));
        assert!(approx(out.temperature, 0.8));
    }

    #[test]
    fn default_branch_fills_unset_values() {
        let out = apply_throttle(&request(None, None), &throttle(), None);
        assert_eq!(out.max_tokens, Some(2048));
        assert!(approx(out.temperature, 0.7));
    }

    #[test]
    fn cheap_policy_without_cheap_model_uses_default_branch() {
        let out = apply_throttle(&request(Some(4096), Some(1.0)), &cheap_throttle(), None);
        assert_eq!(out.max_tokens, Some(2867));
        assert!(approx(out.temperature, 0.8));
    }

    #[test]
    fn cheap_model_without_cheap_policy_uses_default_branch() {
        let out = apply_throttle(&request(Some(1001), Some(0.5)), &throttle(), Some("gpt-4o-mini"));
        assert_eq!(out.max_tokens, Some(700));
        assert!(approx(out.temperature, 0.4));
    }

    #[test]
    fn other_fields_pass_through_and_input_is_untouched() {
        let original = request(Some(4096), Some(1.0));
        let out = apply_throttle(&original, &cheap_throttle(), Some("gpt-4o-mini"));

        assert_eq!(out.model, "gpt-4o");
        assert_eq!(out.messages, original.messages);
        assert_eq!(out.stop, original.stop);
        assert_eq!(original.max_tokens, Some(4096));
        assert_eq!(original.temperature, Some(1.0));
    }

    #[test]
    fn deterministic() {
        let req = request(Some(3000), Some(0.9));
        assert_eq!(
            apply_throttle(&req, &throttle(), None),
            apply_throttle(&req, &throttle(), None)
        );
    }
}
