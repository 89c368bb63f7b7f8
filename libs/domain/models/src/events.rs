// [libs/domain/models/src/events.rs]
/*!
 * =================================================================
 * APARATO: SESSION EVENT LEDGER CONTRACT (V3.1)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CATÁLOGO CERRADO DE EVENTOS APPEND-ONLY
 *
 * # Mathematical Proof (Closed Event Set):
 * El conjunto de tipos de evento es un enum cerrado con renames
 * punteados. Cualquier evento nuevo exige un cambio de contrato aquí,
 * garantizando que el lector del ledger nunca encuentre tipos huérfanos.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Catálogo cerrado de tipos de evento persistidos por sesión.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    #[serde(rename = "realtime.connected")]
    RealtimeConnected,
    #[serde(rename = "tool.intent.received")]
    IntentReceived,
    #[serde(rename = "tool.intent.approved")]
    IntentApproved,
    #[serde(rename = "tool.intent.rejected")]
    IntentRejected,
    #[serde(rename = "tool.intent.applied")]
    IntentApplied,
    #[serde(rename = "scenario.stage.changed")]
    StageChanged,
    #[serde(rename = "scenario.state.diff")]
    StateDiff,
    #[serde(rename = "scenario.finding.revealed")]
    FindingRevealed,
    #[serde(rename = "scenario.phase.changed")]
    PhaseChanged,
    #[serde(rename = "scenario.treatment.applied")]
    TreatmentApplied,
    #[serde(rename = "scenario.rule.triggered")]
    RuleTriggered,
    #[serde(rename = "scenario.alarm.fired")]
    AlarmFired,
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.duplicate")]
    OrderDuplicate,
    #[serde(rename = "order.completed")]
    OrderCompleted,
    #[serde(rename = "budget.soft")]
    BudgetSoft,
    #[serde(rename = "budget.hard")]
    BudgetHard,
    #[serde(rename = "fallback.enabled")]
    FallbackEnabled,
    #[serde(rename = "fallback.disabled")]
    FallbackDisabled,
    #[serde(rename = "error")]
    Error,
}

/// Unidad atómica del ledger append-only de una sesión.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    /// Epoch milisegundos asignados por el núcleo al emitir.
    #[typeshare(serialized_as = "number")]
    pub ts: i64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl SimEvent {
    pub fn new(ts: i64, kind: EventKind) -> Self {
        Self { ts, kind, payload: None }
    }

    pub fn with_payload(ts: i64, kind: EventKind, payload: serde_json::Value) -> Self {
        Self { ts, kind, payload: Some(payload) }
    }
}
