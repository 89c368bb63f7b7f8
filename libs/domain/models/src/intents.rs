// [libs/domain/models/src/intents.rs]
/*!
 * =================================================================
 * APARATO: TOOL INTENT CONTRACT (V2.4)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: GRAMÁTICA DE MUTACIONES PROPUESTAS (LLM / PRESENTER)
 *
 * # Mathematical Proof (Two-Phase Validation):
 * El upstream entrega 'IntentRequest' (forma cruda con campos opcionales).
 * Solo el Tool Gate puede cristalizarlo en un 'ToolIntent' tipado. La
 * separación garantiza que ningún intent sin validar mute el estado.
 * =================================================================
 */

use crate::vitals::VitalsDelta;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Conjunto universal de tipos de intent reconocidos por el Gateway.
pub const UNIVERSAL_INTENT_TYPES: [&str; 4] = [
    "intent_updateVitals",
    "intent_advanceStage",
    "intent_revealFinding",
    "intent_setEmotion",
];

/// Forma cruda de un intent tal como llega del proveedor upstream o
/// de un control de presentador. Los campos son opcionales porque la
/// validación semántica pertenece al Tool Gate, no al deserializador.
#[typeshare]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentRequest {
    /// Nombre del tool-call upstream (ej: "intent_updateVitals").
    /// Con default: el adaptador de voz lo inyecta desde el nombre
    /// del tool-call cuando los argumentos no lo transportan.
    #[serde(default)]
    pub intent_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<VitalsDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

/// Intent tipado y ya aprobado por el Tool Gate.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolIntent {
    /// Ajuste aditivo de signos vitales.
    UpdateVitals { delta: VitalsDelta },
    /// Salto de estadio con reinicio del estado de estadio.
    AdvanceStage { stage_id: String },
    /// Revelación de un hallazgo clínico al equipo.
    RevealFinding { finding_id: String },
    /// Cambio de registro emocional del personaje paciente.
    SetEmotion { emotion: String },
}

impl ToolIntent {
    /// Etiqueta de trama estable del intent (paridad con el upstream).
    pub fn wire_label(&self) -> &'static str {
        match self {
            ToolIntent::UpdateVitals { .. } => "intent_updateVitals",
            ToolIntent::AdvanceStage { .. } => "intent_advanceStage",
            ToolIntent::RevealFinding { .. } => "intent_revealFinding",
            ToolIntent::SetEmotion { .. } => "intent_setEmotion",
        }
    }
}
