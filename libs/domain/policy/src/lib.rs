// [libs/domain/policy/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TOOL GATE AUTHORITY (V3.0 - ZENITH SOVEREIGN)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ADMISIÓN DE INTENTS BAJO POLÍTICA DETERMINISTA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TWO-PHASE CRYSTALLIZATION: Solo esta autoridad convierte un
 *    'IntentRequest' crudo en un 'ToolIntent' tipado; ningún intent
 *    sin veredicto 'Allowed' toca el estado de simulación.
 * 2. RATE SOVEREIGNTY: El intent de vitales se limita a 1 por cada
 *    10 segundos por sesión; el sello temporal solo avanza cuando el
 *    intent es admitido.
 * 3. WIDENED BOUNDS: Las cotas numéricas del delta se evalúan contra
 *    el rango fisiológico ensanchado [min − 50, max + 50].
 *
 * # Mathematical Proof (Policy Determinism):
 * El veredicto es función pura de (allowlist, request, now, último
 * sello admitido). Dos gateways con el mismo historial producen
 * veredictos idénticos.
 * =================================================================
 */

use codeblue_domain_models::intents::{IntentRequest, ToolIntent};
use codeblue_domain_models::vitals::VitalsDelta;
use tracing::debug;

/// Ventana mínima entre intents de vitales admitidos (milisegundos).
pub const VITALS_RATE_WINDOW_MS: i64 = 10_000;

/// Rango fisiológico nominal por dimensión (min, max).
const HEART_RATE_LIMITS: (f64, f64) = (20.0, 240.0);
const RESPIRATORY_LIMITS: (f64, f64) = (5.0, 80.0);
const SATURATION_LIMITS: (f64, f64) = (50.0, 100.0);
const TEMPERATURE_LIMITS: (f64, f64) = (90.0, 110.0);

/// Margen de ensanchamiento aplicado a cada cota del delta.
const BOUNDS_WIDENING: f64 = 50.0;

/// Veredicto de la autoridad de admisión.
#[derive(Debug, Clone, PartialEq)]
pub enum GateVerdict {
    /// Intent cristalizado y autorizado para aplicación.
    Allowed(ToolIntent),
    /// Intent rechazado con razón de política estable.
    Rejected { reason: &'static str },
}

impl GateVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateVerdict::Allowed(_))
    }
}

/// Autoridad de admisión por sesión (mantiene el sello de rate limit).
#[derive(Debug, Default)]
pub struct ToolGate {
    last_vitals_admitted_at_ms: Option<i64>,
}

impl ToolGate {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Evalúa un intent crudo contra la política vigente.
     *
     * # Arguments:
     * * `allowed_intents` - Allowlist del estadio actual (None = todo permitido).
     * * `request` - Intent crudo del upstream o del presentador.
     * * `now_ms` - Epoch milisegundos del momento de evaluación.
     */
    pub fn validate(
        &mut self,
        allowed_intents: Option<&[String]>,
        request: &IntentRequest,
        now_ms: i64,
    ) -> GateVerdict {
        // 1. ALLOWLIST DEL ESTADIO
        if let Some(allowlist) = allowed_intents {
            if !allowlist.iter().any(|permitted| permitted == &request.intent_type) {
                debug!(
                    "⛔ [TOOL_GATE]: Intent '{}' outside stage allowlist.",
                    request.intent_type
                );
                return GateVerdict::Rejected { reason: "intent_not_allowed_in_stage" };
            }
        }

        // 2. DESPACHO POR TIPO DE INTENT
        match request.intent_type.as_str() {
            "intent_updateVitals" => self.validate_vitals_intent(request, now_ms),
            "intent_advanceStage" => match request.stage_id.as_deref() {
                Some(stage_id) if !stage_id.trim().is_empty() => {
                    GateVerdict::Allowed(ToolIntent::AdvanceStage { stage_id: stage_id.to_string() })
                }
                _ => GateVerdict::Rejected { reason: "missing_stage" },
            },
            "intent_revealFinding" => match request.finding_id.as_deref() {
                Some(finding_id) if !finding_id.trim().is_empty() => {
                    GateVerdict::Allowed(ToolIntent::RevealFinding { finding_id: finding_id.to_string() })
                }
                _ => GateVerdict::Rejected { reason: "invalid_finding" },
            },
            "intent_setEmotion" => match request.emotion.as_deref() {
                Some(emotion) if !emotion.trim().is_empty() => {
                    GateVerdict::Allowed(ToolIntent::SetEmotion { emotion: emotion.to_string() })
                }
                _ => GateVerdict::Rejected { reason: "invalid_emotion" },
            },
            _ => GateVerdict::Rejected { reason: "unknown_intent" },
        }
    }

    fn validate_vitals_intent(&mut self, request: &IntentRequest, now_ms: i64) -> GateVerdict {
        // Rate limit: 1 intent de vitales admitido por ventana de 10 s.
        if let Some(last_admitted) = self.last_vitals_admitted_at_ms {
            if now_ms - last_admitted < VITALS_RATE_WINDOW_MS {
                return GateVerdict::Rejected { reason: "vitals_rate_limited" };
            }
        }

        let Some(delta) = request.delta else {
            return GateVerdict::Rejected { reason: "invalid_vitals_delta" };
        };

        if delta.is_empty() || !delta_within_widened_bounds(&delta) {
            return GateVerdict::Rejected { reason: "invalid_vitals_delta" };
        }

        // El sello temporal solo avanza sobre admisión efectiva.
        self.last_vitals_admitted_at_ms = Some(now_ms);
        GateVerdict::Allowed(ToolIntent::UpdateVitals { delta })
    }
}

/// Evalúa cada dimensión presente contra su rango ensanchado.
fn delta_within_widened_bounds(delta: &VitalsDelta) -> bool {
    fn within(value: Option<f64>, limits: (f64, f64)) -> bool {
        match value {
            Some(magnitude) => {
                magnitude >= limits.0 - BOUNDS_WIDENING && magnitude <= limits.1 + BOUNDS_WIDENING
            }
            None => true,
        }
    }

    within(delta.heart_rate, HEART_RATE_LIMITS)
        && within(delta.respiratory_rate, RESPIRATORY_LIMITS)
        && within(delta.oxygen_saturation, SATURATION_LIMITS)
        && within(delta.temperature, TEMPERATURE_LIMITS)
}
