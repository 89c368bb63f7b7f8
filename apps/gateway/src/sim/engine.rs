// [apps/gateway/src/sim/engine.rs]
/*!
 * =================================================================
 * APARATO: SCENARIO ENGINE CORE (V12.0 - DRIFT INTEGRATED)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ESTADO DE SIMULACIÓN DE UNA SESIÓN BAJO CERROJO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NO BACK-POINTERS: El motor no conoce al Session Manager ni al
 *    bus de difusión; cada mutación devuelve eventos y banderas que
 *    el orquestador del latido fusiona en una trama 'sim_state'.
 * 2. LOST TICK RECOVERY: La integración de deriva usa 'last_tick_ms';
 *    un latido perdido se recupera completo en el siguiente pase.
 * 3. BOUNDED HISTORIES: El recorte de EKG (3) y telemetría (120) se
 *    ejecuta aquí, no en el esquema.
 *
 * # Mathematical Proof (Drift Linearity):
 * La deriva por estadio es lineal en el tiempo: integrar un tramo de
 * T segundos en un pase o en N pases parciales produce el mismo
 * delta acumulado (el factor es elapsed/60 por dimensión).
 * =================================================================
 */

use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_models::extended::myocarditis::MyocarditisExtendedState;
use codeblue_domain_models::extended::svt::SvtExtendedState;
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::intents::ToolIntent;
use codeblue_domain_models::orders::{Order, OrderKind};
use codeblue_domain_models::state::{ScenarioId, SimulationState, StatePatch, TelemetryFrame};
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_models::wire::SimStatePayload;
use codeblue_domain_orders::{OrderParams, ParsedOrderKind};
use codeblue_domain_physiology::alarms::AlarmTracker;
use codeblue_domain_physiology::rhythm::synthesize_rhythm_label;
use codeblue_domain_physiology::triggers::TriggerHistory;
use codeblue_domain_physiology::waveform::build_telemetry_waveform;
use codeblue_domain_scenarios::{scenario, ScenarioDefinition};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Clarificación pendiente del bucle de órdenes.
#[derive(Debug, Clone)]
pub struct PendingClarification {
    pub kind: ParsedOrderKind,
    pub params: OrderParams,
    pub question: String,
}

/// Resultado de un pase de 'tick' del motor.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub changed: bool,
    pub stage_changed_to: Option<String>,
    pub events: Vec<SimEvent>,
}

/// Resultado de la aplicación de un intent aprobado.
#[derive(Debug, Default)]
pub struct IntentApplication {
    pub changed: bool,
    pub events: Vec<SimEvent>,
}

/**
 * Núcleo de simulación de una sesión. Vive DENTRO del cerrojo de la
 * sesión; todo acceso está serializado por construcción.
 */
pub struct SimCore {
    pub scenario: &'static ScenarioDefinition,
    pub state: SimulationState,
    /// Sombra numérica de la presión arterial. La trama conserva la
    /// forma "SBP/DBP" redondeada; la integración de deriva sub-entera
    /// vive aquí para no perderse en el redondeo por tick.
    pressure_shadow: codeblue_domain_models::vitals::BloodPressure,
    /// Acciones de historia registradas (claves de transición).
    pub actions: HashSet<String>,
    pub trigger_history: TriggerHistory,
    pub alarm_tracker: AlarmTracker,
    /// Índice de órdenes pendientes por tipo (dedupe soberano).
    pub pending_orders: HashMap<OrderKind, String>,
    pub pending_clarification: Option<PendingClarification>,
    /// La IA conversacional está pausada por el presentador.
    pub ai_paused: bool,
    /// El enlace de voz upstream está vivo.
    pub voice_connected: bool,
}

impl SimCore {
    /// Forja el núcleo inicial para el escenario dado.
    pub fn new(session_id: &str, scenario_id: ScenarioId, now: i64) -> Self {
        let definition = scenario(scenario_id);
        let initial_stage = definition
            .stage(definition.initial_stage)
            .expect("FATAL: catalog certified initial stage missing");

        let extended = match scenario_id {
            ScenarioId::TeenSvtComplexV1 => {
                let mut svt_state = SvtExtendedState::initial();
                svt_state.phase_entered_at = now;
                Some(ExtendedState::Svt(svt_state))
            }
            ScenarioId::PedsMyocarditisSilentCrashV1 => {
                let mut myo_state = MyocarditisExtendedState::initial();
                myo_state.phase_entered_at = now;
                Some(ExtendedState::Myocarditis(myo_state))
            }
            _ => None,
        };

        let state = SimulationState {
            session_id: session_id.to_string(),
            scenario_id,
            stage_id: initial_stage.id.clone(),
            vitals: initial_stage.vitals.clone(),
            exam: initial_stage.exam.clone(),
            rhythm_summary: initial_stage.rhythm_summary.clone(),
            telemetry_enabled: false,
            telemetry_waveform: Vec::new(),
            telemetry_history: Vec::new(),
            ekg_history: Vec::new(),
            orders: Vec::new(),
            findings: Vec::new(),
            fallback: false,
            budget: None,
            scenario_started_at: now,
            stage_entered_at: now,
            last_tick_ms: now,
            interventions: Vec::new(),
            extended,
        };

        info!(
            "🫀 [SCENARIO_ENGINE]: Session {} ignited with scenario '{}'.",
            session_id,
            scenario_id.wire_label()
        );

        let pressure_shadow = state.vitals.blood_pressure_pair();

        Self {
            scenario: definition,
            state,
            pressure_shadow,
            actions: HashSet::new(),
            trigger_history: TriggerHistory::new(),
            alarm_tracker: AlarmTracker::new(),
            pending_orders: HashMap::new(),
            pending_clarification: None,
            ai_paused: false,
            voice_connected: false,
        }
    }

    /// Snapshot inmutable del estado vigente.
    pub fn get_state(&self) -> SimulationState {
        self.state.clone()
    }

    /// Segundos de escenario transcurridos hasta 'now'.
    pub fn elapsed_seconds(&self, now: i64) -> f64 {
        (now - self.state.scenario_started_at) as f64 / 1000.0
    }

    /// Segundos transcurridos dentro del estadio vigente.
    pub fn stage_elapsed_seconds(&self, now: i64) -> f64 {
        (now - self.state.stage_entered_at) as f64 / 1000.0
    }

    /// Aplica un parche de hidratación (identidad sobre parche total).
    pub fn hydrate(&mut self, patch: StatePatch) {
        self.state.hydrate(patch);
        // Reconstruir sombra de presión e índice de pendientes.
        self.pressure_shadow = self.state.vitals.blood_pressure_pair();
        self.rebuild_pending_index();
    }

    /// Restituye la lista de órdenes (re-conexión de sesión).
    pub fn hydrate_orders(&mut self, orders: Vec<Order>) {
        self.state.orders = orders;
        self.rebuild_pending_index();
    }

    fn rebuild_pending_index(&mut self) {
        self.pending_orders = self
            .state
            .orders
            .iter()
            .filter(|order| order.status == codeblue_domain_models::orders::OrderStatus::Pending)
            .map(|order| (order.kind, order.id.clone()))
            .collect();
    }

    /// Registra una acción de historia (clave de transición).
    pub fn record_action(&mut self, action: &str) {
        self.actions.insert(action.to_string());
    }

    /**
     * Instala un estadio del escenario: vitales basales, examen,
     * ritmo y sello temporal de entrada.
     */
    pub fn set_stage(&mut self, stage_id: &str, now: i64) -> Option<Vec<SimEvent>> {
        let stage = self.scenario.stage(stage_id)?;

        let previous_stage = self.state.stage_id.clone();
        self.state.stage_id = stage.id.clone();
        self.state.vitals = stage.vitals.clone();
        self.state.exam = stage.exam.clone();
        self.state.rhythm_summary = stage.rhythm_summary.clone();
        self.state.stage_entered_at = now;
        self.state.vitals.clamp_invariants();
        self.pressure_shadow = self.state.vitals.blood_pressure_pair();
        self.sync_extended_with_stage(stage_id, now);

        debug!(
            "🎬 [SCENARIO_ENGINE]: Stage pivot {} -> {} (session {}).",
            previous_stage, stage.id, self.state.session_id
        );

        Some(vec![
            SimEvent::with_payload(
                now,
                EventKind::StageChanged,
                serde_json::json!({ "from": previous_stage, "to": stage.id }),
            ),
            SimEvent::with_payload(
                now,
                EventKind::StateDiff,
                serde_json::json!({ "source": "stage_change" }),
            ),
        ])
    }

    /**
     * Sincroniza el estado extendido con estadios con semántica de
     * fase conocida (el arco SVT enlaza estadio base <-> fase).
     */
    fn sync_extended_with_stage(&mut self, stage_id: &str, now: i64) {
        use codeblue_domain_models::extended::append_timeline;
        use codeblue_domain_models::extended::svt::SvtPhase;
        use codeblue_domain_models::extended::TimelineEvent;
        use codeblue_domain_models::SvtRhythm;

        if let Some(ExtendedState::Svt(svt_state)) = self.state.extended.as_mut() {
            match stage_id {
                "svt_onset" => {
                    if svt_state.phase == SvtPhase::Presentation {
                        svt_state.phase = SvtPhase::SvtOnset;
                        svt_state.phase_entered_at = now;
                        append_timeline(
                            &mut svt_state.timeline,
                            TimelineEvent {
                                ts: now,
                                label: "svt_onset".to_string(),
                                detail: None,
                            },
                        );
                    }
                    svt_state.current_rhythm = SvtRhythm::Svt;
                }
                "decompensating" => {
                    if svt_state.phase != SvtPhase::Decompensating {
                        svt_state.phase = SvtPhase::Decompensating;
                        svt_state.phase_entered_at = now;
                    }
                }
                "converted" => {
                    svt_state.current_rhythm = SvtRhythm::Sinus;
                }
                _ => {}
            }
        }
    }

    /// Enciende o apaga la telemetría continua.
    pub fn set_telemetry(&mut self, enabled: bool, rhythm_summary: Option<String>) {
        self.state.telemetry_enabled = enabled;
        if let Some(summary) = rhythm_summary {
            self.state.rhythm_summary = summary;
        }
        if enabled {
            self.state.telemetry_waveform = build_telemetry_waveform(self.state.vitals.heart_rate);
        } else {
            self.state.telemetry_waveform = Vec::new();
        }
    }

    /**
     * Integra un delta aditivo de vitales y re-sintetiza la etiqueta
     * de ritmo PALS para la nueva frecuencia. La presión opera sobre
     * la sombra numérica y se re-serializa hacia "SBP/DBP".
     */
    pub fn apply_vitals_adjustment(&mut self, delta: &VitalsDelta) {
        if delta.is_empty() {
            return;
        }

        let scalar_delta = VitalsDelta { systolic: None, diastolic: None, ..*delta };
        if !scalar_delta.is_empty() {
            self.state.vitals.apply_delta(&scalar_delta);
        }

        if delta.systolic.is_some() || delta.diastolic.is_some() {
            self.pressure_shadow.systolic += delta.systolic.unwrap_or(0.0);
            self.pressure_shadow.diastolic += delta.diastolic.unwrap_or(0.0);
            self.pressure_shadow.clamp_floors();
            self.state.vitals.blood_pressure = self.pressure_shadow.render();
        }

        self.refresh_rhythm_label();
    }

    /// Fija la etiqueta de ritmo de forma explícita (override clínico).
    pub fn set_rhythm(&mut self, summary: &str, note: Option<&str>) {
        self.state.rhythm_summary = match note {
            Some(annotation) => format!("{summary} ({annotation})"),
            None => summary.to_string(),
        };
    }

    /// Re-sintetiza la etiqueta PALS desde la edad y la HR vigentes.
    pub fn refresh_rhythm_label(&mut self) {
        self.state.rhythm_summary = synthesize_rhythm_label(
            self.scenario.patient.age_months,
            self.state.vitals.heart_rate,
            &self.scenario.patient.rhythm_augmentations,
        );
    }

    /**
     * Aplica un intent YA aprobado por el Tool Gate.
     * Emite 'tool.intent.applied' siempre y 'scenario.state.diff'
     * únicamente cuando el estado cambió.
     */
    pub fn apply_intent(&mut self, intent: &ToolIntent, now: i64) -> IntentApplication {
        let mut application = IntentApplication::default();

        match intent {
            ToolIntent::UpdateVitals { delta } => {
                self.apply_vitals_adjustment(delta);
                application.changed = true;
            }
            ToolIntent::AdvanceStage { stage_id } => {
                if let Some(stage_events) = self.set_stage(stage_id, now) {
                    application.events.extend(stage_events);
                    application.changed = true;
                }
            }
            ToolIntent::RevealFinding { finding_id } => {
                if self.state.reveal_finding(finding_id) {
                    application.events.push(SimEvent::with_payload(
                        now,
                        EventKind::FindingRevealed,
                        serde_json::json!({ "finding_id": finding_id }),
                    ));
                    application.changed = true;
                }
            }
            ToolIntent::SetEmotion { .. } => {
                // El registro emocional vive en el proveedor de voz; el
                // núcleo solo lo audita.
                application.changed = false;
            }
        }

        application.events.push(SimEvent::with_payload(
            now,
            EventKind::IntentApplied,
            serde_json::json!({ "intent": intent.wire_label() }),
        ));

        if application.changed {
            application.events.push(SimEvent::with_payload(
                now,
                EventKind::StateDiff,
                serde_json::json!({ "source": "intent" }),
            ));
        }

        application
    }

    /**
     * Evalúa las transiciones salientes del estadio vigente contra el
     * set de acciones y el reloj. La primera satisfecha gana.
     */
    pub fn evaluate_automatic_transitions(&mut self, now: i64) -> Option<String> {
        let elapsed_stage_seconds = self.stage_elapsed_seconds(now);
        let current_stage = self.scenario.stage(&self.state.stage_id)?;

        let target = current_stage
            .transitions
            .iter()
            .find(|transition| transition.when.satisfied(&self.actions, elapsed_stage_seconds))
            .map(|transition| transition.to.clone())?;

        Some(target)
    }

    /**
     * Pase de latido del motor: (a) integra la deriva del estadio
     * desde 'last_tick_ms', (b) evalúa transiciones automáticas.
     */
    pub fn tick(&mut self, now: i64) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        // (a) INTEGRACIÓN DE DERIVA
        let elapsed_since_tick_ms = now - self.state.last_tick_ms;
        self.state.last_tick_ms = now;

        if elapsed_since_tick_ms > 0 {
            if let Some(drift) = self
                .scenario
                .stage(&self.state.stage_id)
                .and_then(|stage| stage.drift)
            {
                if !drift.is_inert() {
                    let minutes = elapsed_since_tick_ms as f64 / 60_000.0;
                    let drift_delta = VitalsDelta {
                        heart_rate: non_zero(drift.heart_rate_per_min * minutes),
                        systolic: non_zero(drift.systolic_per_min * minutes),
                        diastolic: non_zero(drift.diastolic_per_min * minutes),
                        oxygen_saturation: non_zero(drift.oxygen_saturation_per_min * minutes),
                        ..VitalsDelta::default()
                    };
                    if !drift_delta.is_empty() {
                        self.apply_vitals_adjustment(&drift_delta);
                        outcome.changed = true;
                    }
                }
            }
        }

        // (b) TRANSICIONES AUTOMÁTICAS
        if let Some(target_stage) = self.evaluate_automatic_transitions(now) {
            if let Some(stage_events) = self.set_stage(&target_stage, now) {
                outcome.events.extend(stage_events);
                outcome.stage_changed_to = Some(target_stage);
                outcome.changed = true;
            }
        }

        // Telemetría continua: cuadro nuevo por latido mientras esté activa.
        if self.state.telemetry_enabled {
            let waveform = build_telemetry_waveform(self.state.vitals.heart_rate);
            self.state.telemetry_waveform = waveform.clone();
            self.state.record_telemetry(TelemetryFrame {
                ts: now,
                heart_rate: self.state.vitals.heart_rate,
                waveform,
            });
            outcome.changed = true;
        }

        outcome
    }

    /// Construye el payload 'sim_state' difundido a la sesión.
    pub fn sim_state_payload(&self) -> SimStatePayload {
        SimStatePayload {
            session_id: self.state.session_id.clone(),
            stage_id: self.state.stage_id.clone(),
            stage_ids: Some(self.scenario.stage_ids()),
            scenario_id: Some(self.state.scenario_id),
            vitals: self.state.vitals.clone(),
            exam: Some(self.state.exam.clone()),
            telemetry: Some(self.state.telemetry_enabled),
            rhythm_summary: Some(self.state.rhythm_summary.clone()),
            telemetry_waveform: Some(self.state.telemetry_waveform.clone()),
            findings: Some(self.state.findings.clone()),
            fallback: self.state.fallback,
            budget: self.state.budget.clone(),
            orders: Some(self.state.orders.clone()),
            ekg_history: Some(self.state.ekg_history.clone()),
            telemetry_history: Some(self.state.telemetry_history.clone()),
        }
    }

    /// Registra una intervención en la bitácora plana del estado.
    pub fn log_intervention(&mut self, label: &str) {
        self.state.interventions.push(label.to_string());
    }
}

fn non_zero(value: f64) -> Option<f64> {
    if value == 0.0 {
        None
    } else {
        Some(value)
    }
}
