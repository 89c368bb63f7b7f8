// [libs/domain/models/src/extended/mod.rs]
/*!
 * =================================================================
 * APARATO: EXTENDED STATE UMBRELLA (V4.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: ESTADO EXTENDIDO DE ESCENARIOS COMPLEJOS
 * =================================================================
 */

pub mod myocarditis;
pub mod svt;

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Estado extendido presente solo en escenarios complejos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ExtendedState {
    Svt(svt::SvtExtendedState),
    Myocarditis(myocarditis::MyocarditisExtendedState),
}

impl ExtendedState {
    /// Línea de tiempo del escenario (lectura).
    pub fn timeline(&self) -> &[TimelineEvent] {
        match self {
            ExtendedState::Svt(state) => &state.timeline,
            ExtendedState::Myocarditis(state) => &state.timeline,
        }
    }

    /// Puntuación acumulada del escenario (lectura).
    pub fn scoring(&self) -> &ScoringState {
        match self {
            ExtendedState::Svt(state) => &state.scoring,
            ExtendedState::Myocarditis(state) => &state.scoring,
        }
    }
}

/// Evento de línea de tiempo con sello temporal monotónico.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    /// Epoch milisegundos; jamás decrece dentro de una sesión.
    #[typeshare(serialized_as = "number")]
    pub ts: i64,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Acumuladores de puntuación de un escenario complejo.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoringState {
    pub checklist_completed: Vec<String>,
    pub bonuses_earned: Vec<String>,
    pub penalties_incurred: Vec<String>,
    /// Puntaje vigente, sellado al rango [0, 100].
    pub current_score: f64,
}

impl ScoringState {
    /// Marca un ítem de checklist una sola vez y acredita su valor.
    pub fn complete_checklist_item(&mut self, item_id: &str, points: f64) -> bool {
        if self.checklist_completed.iter().any(|existing| existing == item_id) {
            return false;
        }
        self.checklist_completed.push(item_id.to_string());
        self.adjust_score(points);
        true
    }

    /// Acredita un bono nombrado una sola vez.
    pub fn earn_bonus(&mut self, bonus_id: &str, points: f64) -> bool {
        if self.bonuses_earned.iter().any(|existing| existing == bonus_id) {
            return false;
        }
        self.bonuses_earned.push(bonus_id.to_string());
        self.adjust_score(points);
        true
    }

    /// Registra una penalización nombrada una sola vez.
    pub fn incur_penalty(&mut self, penalty_id: &str, points: f64) -> bool {
        if self.penalties_incurred.iter().any(|existing| existing == penalty_id) {
            return false;
        }
        self.penalties_incurred.push(penalty_id.to_string());
        self.adjust_score(-points.abs());
        true
    }

    fn adjust_score(&mut self, delta: f64) {
        self.current_score = (self.current_score + delta).clamp(0.0, 100.0);
    }
}

/**
 * Inserta un evento en una línea de tiempo preservando la monotonía.
 * Un sello temporal retrógrado se eleva al último conocido en vez de
 * violar el invariante del ledger.
 */
pub fn append_timeline(timeline: &mut Vec<TimelineEvent>, mut event: TimelineEvent) {
    if let Some(last_event) = timeline.last() {
        if event.ts < last_event.ts {
            event.ts = last_event.ts;
        }
    }
    timeline.push(event);
}
