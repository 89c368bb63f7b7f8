// [libs/domain/physiology/src/rules.rs]
/*!
 * =================================================================
 * APARATO: PHYSIOLOGY RULE ENGINE (V8.0 - DETERMINISTIC PASS)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: EVALUACIÓN CONDICIÓN -> EFECTO CON COOLDOWN Y TOPE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PURE PASS RESULT: El pase devuelve un valor agregado que el
 *    orquestador del latido fusiona en una sola trama 'sim_state';
 *    el motor no conoce al Session Manager ni a otros motores.
 * 2. DELAYED EFFECTS: Los efectos diferidos se cristalizan en
 *    'pending_effects' y se drenan cuando 'execute_at <= now'.
 * 3. AGGREGATION LAW: Todos los deltas de vitales de un pase se
 *    fusionan en uno; la línea de enfermera de mayor prioridad gana;
 *    el primer avance de fase/estadio gana y los demás se descartan.
 *
 * # Mathematical Proof (Cooldown Safety):
 * Una regla con cooldown C y registro (last, count) solo re-dispara
 * cuando now - last >= C*1000 y count < max. Ambas comparaciones se
 * evalúan ANTES de cualquier mutación, por lo que ninguna secuencia
 * de ticks puede violar la ventana ni el tope de disparos.
 * =================================================================
 */

use codeblue_domain_models::extended::myocarditis::MyoPhase;
use codeblue_domain_models::extended::svt::SvtPhase;
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::rules::{
    ConditionLogic, InotropeSelector, PendingEffect, PhysiologyRule, Priority, RuleCondition,
    RuleEffect, RuleTriggerRecord,
};
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_models::InotropeDrug;
use tracing::debug;

/// Resultado agregado de un pase del motor de reglas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePassOutcome {
    /// Delta de vitales fusionado de todos los efectos del pase.
    pub vitals_delta: Option<VitalsDelta>,
    /// Línea de enfermera de mayor prioridad del pase.
    pub nurse_line: Option<(String, Priority)>,
    /// Fase alcanzada si el pase avanzó fase (la primera gana).
    pub phase_changed_to: Option<String>,
    /// Estadio de shock vigente si el pase lo avanzó.
    pub shock_stage_now: Option<u8>,
    /// Nivel de estabilidad vigente si el pase lo ajustó.
    pub stability_level_now: Option<u8>,
    /// Banderas mutadas durante el pase (nombre, valor).
    pub flags_set: Vec<(String, bool)>,
    /// Protocolo de paro activado en este pase.
    pub code_blue_triggered: bool,
    /// Reglas disparadas en este pase (orden de evaluación).
    pub triggered_rule_ids: Vec<String>,
}

impl RulePassOutcome {
    /// Verdadero si el pase no produjo ningún efecto observable.
    pub fn is_quiet(&self) -> bool {
        self.vitals_delta.is_none()
            && self.nurse_line.is_none()
            && self.phase_changed_to.is_none()
            && self.shock_stage_now.is_none()
            && self.stability_level_now.is_none()
            && self.flags_set.is_empty()
            && !self.code_blue_triggered
            && self.triggered_rule_ids.is_empty()
    }
}

/**
 * Ejecuta un pase completo del motor de reglas.
 *
 * Invocado en cada latido y tras cada tratamiento/intent exitoso.
 * El pase es determinista: toda aleatoriedad clínica pertenece a los
 * manejadores de tratamiento, no a las reglas.
 */
pub fn run_rule_pass(
    rules: &[PhysiologyRule],
    extended: &mut ExtendedState,
    now_ms: i64,
) -> RulePassOutcome {
    let mut outcome = RulePassOutcome::default();
    let mut ready_effects: Vec<(String, RuleEffect)> = Vec::new();

    // 1. EVALUACIÓN DE REGLAS (gating por cooldown y tope de disparos)
    for rule in rules {
        let record_snapshot = rule_triggers(extended).get(&rule.id).copied();

        if let (Some(max_triggers), Some(record)) = (rule.max_triggers, record_snapshot) {
            if record.trigger_count >= max_triggers {
                continue;
            }
        }
        if let (Some(cooldown_seconds), Some(record)) = (rule.cooldown_seconds, record_snapshot) {
            if now_ms - record.last_triggered_at_ms < (cooldown_seconds * 1000.0) as i64 {
                continue;
            }
        }

        let satisfied = match rule.condition_logic {
            ConditionLogic::All => rule
                .conditions
                .iter()
                .all(|condition| evaluate_condition(condition, extended, now_ms)),
            ConditionLogic::Any => rule
                .conditions
                .iter()
                .any(|condition| evaluate_condition(condition, extended, now_ms)),
        };

        if !satisfied {
            continue;
        }

        debug!("⚗️ [RULE_ENGINE]: Rule '{}' satisfied.", rule.id);

        // 2. CRISTALIZACIÓN DE EFECTOS (inmediatos o diferidos)
        match rule.delay_seconds {
            Some(delay_seconds) => {
                let execute_at_ms = now_ms + (delay_seconds * 1000.0) as i64;
                for effect in &rule.effects {
                    pending_effects_mut(extended).push(PendingEffect {
                        rule_id: rule.id.clone(),
                        effect: effect.clone(),
                        execute_at_ms,
                    });
                }
            }
            None => {
                for effect in &rule.effects {
                    ready_effects.push((rule.id.clone(), effect.clone()));
                }
            }
        }

        // 3. CONTABILIDAD DEL DISPARO
        let triggers_map = rule_triggers_mut(extended);
        let entry = triggers_map.entry(rule.id.clone()).or_insert(RuleTriggerRecord {
            first_triggered_at_ms: now_ms,
            last_triggered_at_ms: now_ms,
            trigger_count: 0,
        });
        entry.last_triggered_at_ms = now_ms;
        entry.trigger_count += 1;

        outcome.triggered_rule_ids.push(rule.id.clone());
    }

    // 4. DRENAJE DE EFECTOS DIFERIDOS VENCIDOS
    let pending = pending_effects_mut(extended);
    let mut still_pending = Vec::with_capacity(pending.len());
    for effect_entry in pending.drain(..) {
        if effect_entry.execute_at_ms <= now_ms {
            ready_effects.push((effect_entry.rule_id, effect_entry.effect));
        } else {
            still_pending.push(effect_entry);
        }
    }
    *pending = still_pending;

    // 5. AGREGACIÓN DE EFECTOS DEL PASE
    for (_rule_id, effect) in ready_effects {
        apply_effect(effect, extended, now_ms, &mut outcome);
    }

    outcome
}

fn apply_effect(
    effect: RuleEffect,
    extended: &mut ExtendedState,
    now_ms: i64,
    outcome: &mut RulePassOutcome,
) {
    match effect {
        RuleEffect::VitalsDelta { delta } => {
            outcome.vitals_delta = Some(match outcome.vitals_delta {
                Some(accumulated) => accumulated.merge(&delta),
                None => delta,
            });
        }
        RuleEffect::NurseLine { line, priority } => {
            let should_replace = match &outcome.nurse_line {
                // Priority ordena Critical < High < Normal: menor gana.
                Some((_, current_priority)) => priority < *current_priority,
                None => true,
            };
            if should_replace {
                outcome.nurse_line = Some((line, priority));
            }
        }
        RuleEffect::SetFlag { flag, value } => {
            if let ExtendedState::Myocarditis(state) = extended {
                match flag.as_str() {
                    "pulmonary_edema" => state.flags.pulmonary_edema = value,
                    "intubation_collapse" => state.flags.intubation_collapse = value,
                    "code_blue_active" => state.flags.code_blue_active = value,
                    "stabilizing" => state.flags.stabilizing = value,
                    _ => {}
                }
            }
            outcome.flags_set.push((flag, value));
        }
        RuleEffect::AdvanceShockStage { stage } => {
            // El primer avance del pase gana; los siguientes se descartan.
            if outcome.shock_stage_now.is_some() {
                return;
            }
            if let ExtendedState::Myocarditis(state) = extended {
                if state.advance_shock_stage(stage) {
                    outcome.shock_stage_now = Some(state.shock_stage);
                }
            }
        }
        RuleEffect::AdvancePhase { phase_id } => {
            if outcome.phase_changed_to.is_some() {
                return;
            }
            if advance_phase(extended, &phase_id, now_ms) {
                outcome.phase_changed_to = Some(phase_id);
            }
        }
        RuleEffect::TriggerCodeBlue => {
            if let ExtendedState::Myocarditis(state) = extended {
                state.flags.code_blue_active = true;
            }
            outcome.code_blue_triggered = true;
        }
        RuleEffect::SetStabilityLevel { level } => {
            if outcome.stability_level_now.is_some() {
                return;
            }
            if let ExtendedState::Svt(state) = extended {
                state.stability_level = level.clamp(1, 4);
                outcome.stability_level_now = Some(state.stability_level);
            }
        }
    }
}

/// Transiciona la fase del escenario si el identificador es válido.
fn advance_phase(extended: &mut ExtendedState, phase_id: &str, now_ms: i64) -> bool {
    let phase_value = serde_json::Value::String(phase_id.to_string());
    match extended {
        ExtendedState::Svt(state) => {
            if let Ok(target_phase) = serde_json::from_value::<SvtPhase>(phase_value) {
                if state.phase != target_phase {
                    state.phase = target_phase;
                    state.phase_entered_at = now_ms;
                    return true;
                }
            }
            false
        }
        ExtendedState::Myocarditis(state) => {
            if let Ok(target_phase) = serde_json::from_value::<MyoPhase>(phase_value) {
                if state.phase != target_phase {
                    state.phase = target_phase;
                    state.phase_entered_at = now_ms;
                    return true;
                }
            }
            false
        }
    }
}

/// Evalúa una condición declarativa contra el estado extendido y "now".
/// Una condición de la variante equivocada es simplemente falsa.
pub fn evaluate_condition(condition: &RuleCondition, extended: &ExtendedState, now_ms: i64) -> bool {
    match (condition, extended) {
        (RuleCondition::FluidsMlKgInWindow { threshold_ml_kg, window_minutes }, ExtendedState::Myocarditis(state)) => {
            state.fluids_ml_kg_in_window(*window_minutes, now_ms) >= *threshold_ml_kg
        }
        (RuleCondition::InotropeRunning { drug }, ExtendedState::Myocarditis(state)) => match drug {
            InotropeSelector::Both => {
                state.running_infusion(InotropeDrug::Epi).is_some()
                    && state.running_infusion(InotropeDrug::Milrinone).is_some()
            }
            InotropeSelector::Epi => state.running_infusion(InotropeDrug::Epi).is_some(),
            InotropeSelector::Milrinone => state.running_infusion(InotropeDrug::Milrinone).is_some(),
            InotropeSelector::Dobutamine => state.running_infusion(InotropeDrug::Dobutamine).is_some(),
            InotropeSelector::Dopamine => state.running_infusion(InotropeDrug::Dopamine).is_some(),
            InotropeSelector::Norepi => state.running_infusion(InotropeDrug::Norepi).is_some(),
        },
        (RuleCondition::InotropeDoseGte { drug, dose_mcg_kg_min }, ExtendedState::Myocarditis(state)) => {
            state
                .running_infusion(*drug)
                .map(|infusion| infusion.dose_mcg_kg_min >= *dose_mcg_kg_min)
                .unwrap_or(false)
        }
        (RuleCondition::AirwayIntervention { method }, ExtendedState::Myocarditis(state)) => state
            .airway
            .as_ref()
            .map(|airway| airway.method == *method)
            .unwrap_or(false),
        (RuleCondition::IntubationInduction { agent }, ExtendedState::Myocarditis(state)) => state
            .airway
            .as_ref()
            .map(|airway| airway.induction_agent == Some(*agent))
            .unwrap_or(false),
        (RuleCondition::PressorAtBedside { expected }, ExtendedState::Myocarditis(state)) => {
            let pressor_ready = state
                .airway
                .as_ref()
                .map(|airway| airway.pressor_ready || airway.push_dose_epi_drawn)
                .unwrap_or(false);
            pressor_ready == *expected
        }
        (RuleCondition::PeepGte { centimeters_water }, ExtendedState::Myocarditis(state)) => state
            .airway
            .as_ref()
            .and_then(|airway| airway.peep_cm_h2o)
            .map(|peep| peep >= *centimeters_water)
            .unwrap_or(false),
        (RuleCondition::ShockStageGte { stage }, ExtendedState::Myocarditis(state)) => {
            state.shock_stage >= *stage
        }
        (RuleCondition::ConsultCalled { service }, ExtendedState::Myocarditis(state)) => {
            state.consults_called.iter().any(|called| called == service)
        }
        (RuleCondition::ConsultCalled { service }, ExtendedState::Svt(state)) => {
            state.consults_called.iter().any(|called| called == service)
        }
        (RuleCondition::TimeInPhaseGte { minutes }, ExtendedState::Myocarditis(state)) => {
            now_ms - state.phase_entered_at >= (*minutes * 60_000.0) as i64
        }
        (RuleCondition::TimeInPhaseGte { minutes }, ExtendedState::Svt(state)) => {
            now_ms - state.phase_entered_at >= (*minutes * 60_000.0) as i64
        }
        (RuleCondition::DiagnosticOrdered { test }, ExtendedState::Myocarditis(state)) => {
            state.diagnostics.iter().any(|diagnostic| diagnostic.test == *test)
        }
        (RuleCondition::DiagnosticOrdered { test }, ExtendedState::Svt(state)) => {
            matches!(test.as_str(), "ecg" | "ekg") && state.ecg_ordered
        }

        // --- CONDICIONES LOCALES DEL ESCENARIO SVT ---
        (RuleCondition::VagalAttempted, ExtendedState::Svt(state)) => state.vagal_attempts > 0,
        (RuleCondition::Converted { expected }, ExtendedState::Svt(state)) => {
            state.converted == *expected
        }
        (RuleCondition::AdenosineGiven { dose_number }, ExtendedState::Svt(state)) => state
            .adenosine_doses
            .iter()
            .any(|dose| dose.dose_number == *dose_number),
        (RuleCondition::CardioversionPerformed, ExtendedState::Svt(state)) => {
            !state.cardioversion_attempts.is_empty()
        }
        (RuleCondition::RhythmIs { rhythm }, ExtendedState::Svt(state)) => {
            state.current_rhythm == *rhythm
        }
        (RuleCondition::StabilityLevelGte { level }, ExtendedState::Svt(state)) => {
            state.stability_level >= *level
        }

        // Condición de la variante equivocada: jamás satisfecha.
        _ => false,
    }
}

fn rule_triggers(
    extended: &ExtendedState,
) -> &std::collections::HashMap<String, RuleTriggerRecord> {
    match extended {
        ExtendedState::Svt(state) => &state.rule_triggers,
        ExtendedState::Myocarditis(state) => &state.rule_triggers,
    }
}

fn rule_triggers_mut(
    extended: &mut ExtendedState,
) -> &mut std::collections::HashMap<String, RuleTriggerRecord> {
    match extended {
        ExtendedState::Svt(state) => &mut state.rule_triggers,
        ExtendedState::Myocarditis(state) => &mut state.rule_triggers,
    }
}

fn pending_effects_mut(extended: &mut ExtendedState) -> &mut Vec<PendingEffect> {
    match extended {
        ExtendedState::Svt(state) => &mut state.pending_effects,
        ExtendedState::Myocarditis(state) => &mut state.pending_effects,
    }
}
