// [libs/domain/scenarios/src/scoring.rs]
/*!
 * =================================================================
 * APARATO: SCORING CONFIGURATION (V2.3)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: TABLAS DE PUNTAJE DE ESCENARIOS COMPLEJOS
 * =================================================================
 */

/// Ítem puntuable (checklist, bono o penalización).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreItem {
    pub id: &'static str,
    pub points: f64,
    pub label: &'static str,
}

/// Configuración de puntaje de un escenario complejo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringConfig {
    pub checklist: Vec<ScoreItem>,
    pub bonuses: Vec<ScoreItem>,
    pub penalties: Vec<ScoreItem>,
}

impl ScoringConfig {
    /// Busca un ítem de checklist por identificador.
    pub fn checklist_item(&self, item_id: &str) -> Option<&ScoreItem> {
        self.checklist.iter().find(|item| item.id == item_id)
    }

    pub fn bonus_item(&self, bonus_id: &str) -> Option<&ScoreItem> {
        self.bonuses.iter().find(|item| item.id == bonus_id)
    }

    pub fn penalty_item(&self, penalty_id: &str) -> Option<&ScoreItem> {
        self.penalties.iter().find(|item| item.id == penalty_id)
    }
}
