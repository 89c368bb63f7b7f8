// [libs/domain/models/src/state.rs]
/*!
 * =================================================================
 * APARATO: SIMULATION STATE CONTRACT (V9.0 - HYDRATION SEALED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: SNAPSHOT SOBERANO DEL ESTADO DE SIMULACIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BOUNDED HISTORIES: La historia de EKG se sella a 3 entradas y la
 *    de telemetría a 120 cuadros DENTRO del modelo; ningún handler
 *    puede desbordar los buffers por omisión.
 * 2. HYDRATION IDENTITY: 'hydrate(get_state())' es la identidad; el
 *    parche total generado desde un snapshot restituye cada campo.
 * 3. WIRE PARITY: Los nombres serde reproducen la gramática de trama
 *    que los consumidores del Dashboard ya dependen.
 * =================================================================
 */

use crate::extended::ExtendedState;
use crate::orders::Order;
use crate::vitals::Vitals;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;

/// Tope sellado de entradas en la historia rodante de EKG.
pub const EKG_HISTORY_LIMIT: usize = 3;
/// Tope sellado de cuadros en la historia de telemetría.
pub const TELEMETRY_HISTORY_LIMIT: usize = 120;

/// Enumeración cerrada de escenarios registrados en el catálogo.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    #[serde(rename = "syncope")]
    Syncope,
    #[serde(rename = "palpitations_svt")]
    PalpitationsSvt,
    #[serde(rename = "peds_myocarditis_silent_crash_v1")]
    PedsMyocarditisSilentCrashV1,
    #[serde(rename = "teen_svt_complex_v1")]
    TeenSvtComplexV1,
}

impl ScenarioId {
    /// Decodifica el identificador de trama hacia el catálogo cerrado.
    pub fn parse(raw_identifier: &str) -> Option<Self> {
        match raw_identifier {
            "syncope" => Some(ScenarioId::Syncope),
            "palpitations_svt" => Some(ScenarioId::PalpitationsSvt),
            "peds_myocarditis_silent_crash_v1" => Some(ScenarioId::PedsMyocarditisSilentCrashV1),
            "teen_svt_complex_v1" => Some(ScenarioId::TeenSvtComplexV1),
            _ => None,
        }
    }

    pub fn wire_label(&self) -> &'static str {
        match self {
            ScenarioId::Syncope => "syncope",
            ScenarioId::PalpitationsSvt => "palpitations_svt",
            ScenarioId::PedsMyocarditisSilentCrashV1 => "peds_myocarditis_silent_crash_v1",
            ScenarioId::TeenSvtComplexV1 => "teen_svt_complex_v1",
        }
    }

    /// Verdadero para escenarios con motor de fisiología y triggers.
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            ScenarioId::PedsMyocarditisSilentCrashV1 | ScenarioId::TeenSvtComplexV1
        )
    }
}

/// Cuadro de telemetría sintetizada para la historia rodante.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryFrame {
    #[typeshare(serialized_as = "number")]
    pub ts: i64,
    pub heart_rate: f64,
    pub waveform: Vec<f64>,
}

/// Entrada de la historia rodante de EKG (acotada a las últimas 3).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EkgRecord {
    #[typeshare(serialized_as = "number")]
    pub ordered_at: i64,
    pub rhythm_label: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Snapshot del presupuesto upstream expuesto en cada 'sim_state'.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BudgetSnapshot {
    pub usd_estimate: f64,
    pub soft_limit_usd: f64,
    pub hard_limit_usd: f64,
    pub throttled: bool,
    pub fallback: bool,
}

/// Estado de simulación completo de una sesión.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationState {
    pub session_id: String,
    pub scenario_id: ScenarioId,
    pub stage_id: String,
    pub vitals: Vitals,
    /// Hallazgos de examen físico por región ("cardiac" -> texto).
    pub exam: BTreeMap<String, String>,
    pub rhythm_summary: String,
    pub telemetry_enabled: bool,
    pub telemetry_waveform: Vec<f64>,
    pub telemetry_history: Vec<TelemetryFrame>,
    pub ekg_history: Vec<EkgRecord>,
    pub orders: Vec<Order>,
    /// Identificadores de hallazgos revelados (semántica de conjunto).
    pub findings: Vec<String>,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetSnapshot>,
    #[typeshare(serialized_as = "number")]
    pub scenario_started_at: i64,
    #[typeshare(serialized_as = "number")]
    pub stage_entered_at: i64,
    #[typeshare(serialized_as = "number")]
    pub last_tick_ms: i64,
    /// Bitácora plana de intervenciones aplicadas.
    pub interventions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended: Option<ExtendedState>,
}

impl SimulationState {
    /**
     * Anexa una entrada de EKG preservando el tope de 3 registros.
     * El recorte vive en el motor de estado, no en el esquema.
     */
    pub fn record_ekg(&mut self, record: EkgRecord) {
        self.ekg_history.push(record);
        if self.ekg_history.len() > EKG_HISTORY_LIMIT {
            let overflow = self.ekg_history.len() - EKG_HISTORY_LIMIT;
            self.ekg_history.drain(0..overflow);
        }
    }

    /// Anexa un cuadro de telemetría preservando el tope sellado.
    pub fn record_telemetry(&mut self, frame: TelemetryFrame) {
        self.telemetry_history.push(frame);
        if self.telemetry_history.len() > TELEMETRY_HISTORY_LIMIT {
            let overflow = self.telemetry_history.len() - TELEMETRY_HISTORY_LIMIT;
            self.telemetry_history.drain(0..overflow);
        }
    }

    /// Revela un hallazgo una sola vez. Devuelve si hubo cambio.
    pub fn reveal_finding(&mut self, finding_id: &str) -> bool {
        if self.findings.iter().any(|existing| existing == finding_id) {
            return false;
        }
        self.findings.push(finding_id.to_string());
        true
    }

    /**
     * Aplica un parche parcial sobre el estado. Un parche total
     * construido desde 'get_state()' restituye el snapshot exacto
     * (identidad de hidratación).
     */
    pub fn hydrate(&mut self, patch: StatePatch) {
        if let Some(stage_id) = patch.stage_id {
            self.stage_id = stage_id;
        }
        if let Some(vitals) = patch.vitals {
            self.vitals = vitals;
        }
        if let Some(exam) = patch.exam {
            self.exam = exam;
        }
        if let Some(rhythm_summary) = patch.rhythm_summary {
            self.rhythm_summary = rhythm_summary;
        }
        if let Some(telemetry_enabled) = patch.telemetry_enabled {
            self.telemetry_enabled = telemetry_enabled;
        }
        if let Some(telemetry_waveform) = patch.telemetry_waveform {
            self.telemetry_waveform = telemetry_waveform;
        }
        if let Some(telemetry_history) = patch.telemetry_history {
            self.telemetry_history = telemetry_history;
        }
        if let Some(ekg_history) = patch.ekg_history {
            self.ekg_history = ekg_history;
        }
        if let Some(orders) = patch.orders {
            self.orders = orders;
        }
        if let Some(findings) = patch.findings {
            self.findings = findings;
        }
        if let Some(fallback) = patch.fallback {
            self.fallback = fallback;
        }
        if let Some(budget) = patch.budget {
            self.budget = budget;
        }
        if let Some(scenario_started_at) = patch.scenario_started_at {
            self.scenario_started_at = scenario_started_at;
        }
        if let Some(stage_entered_at) = patch.stage_entered_at {
            self.stage_entered_at = stage_entered_at;
        }
        if let Some(last_tick_ms) = patch.last_tick_ms {
            self.last_tick_ms = last_tick_ms;
        }
        if let Some(interventions) = patch.interventions {
            self.interventions = interventions;
        }
        if let Some(extended) = patch.extended {
            self.extended = extended;
        }
    }
}

/// Parche parcial de hidratación. Cada campo ausente no se toca.
/// 'budget' y 'extended' usan doble Option para poder escribir None.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(default)]
    pub stage_id: Option<String>,
    #[serde(default)]
    pub vitals: Option<Vitals>,
    #[serde(default)]
    pub exam: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub rhythm_summary: Option<String>,
    #[serde(default)]
    pub telemetry_enabled: Option<bool>,
    #[serde(default)]
    pub telemetry_waveform: Option<Vec<f64>>,
    #[serde(default)]
    pub telemetry_history: Option<Vec<TelemetryFrame>>,
    #[serde(default)]
    pub ekg_history: Option<Vec<EkgRecord>>,
    #[serde(default)]
    pub orders: Option<Vec<Order>>,
    #[serde(default)]
    pub findings: Option<Vec<String>>,
    #[serde(default)]
    pub fallback: Option<bool>,
    #[serde(default)]
    pub budget: Option<Option<BudgetSnapshot>>,
    #[serde(default)]
    pub scenario_started_at: Option<i64>,
    #[serde(default)]
    pub stage_entered_at: Option<i64>,
    #[serde(default)]
    pub last_tick_ms: Option<i64>,
    #[serde(default)]
    pub interventions: Option<Vec<String>>,
    #[serde(default)]
    pub extended: Option<Option<ExtendedState>>,
}

impl From<&SimulationState> for StatePatch {
    /// Parche total: restituye cada campo del snapshot de origen.
    fn from(state: &SimulationState) -> Self {
        StatePatch {
            stage_id: Some(state.stage_id.clone()),
            vitals: Some(state.vitals.clone()),
            exam: Some(state.exam.clone()),
            rhythm_summary: Some(state.rhythm_summary.clone()),
            telemetry_enabled: Some(state.telemetry_enabled),
            telemetry_waveform: Some(state.telemetry_waveform.clone()),
            telemetry_history: Some(state.telemetry_history.clone()),
            ekg_history: Some(state.ekg_history.clone()),
            orders: Some(state.orders.clone()),
            findings: Some(state.findings.clone()),
            fallback: Some(state.fallback),
            budget: Some(state.budget.clone()),
            scenario_started_at: Some(state.scenario_started_at),
            stage_entered_at: Some(state.stage_entered_at),
            last_tick_ms: Some(state.last_tick_ms),
            interventions: Some(state.interventions.clone()),
            extended: Some(state.extended.clone()),
        }
    }
}
