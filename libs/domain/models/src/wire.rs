// [libs/domain/models/src/wire.rs]
/*!
 * =================================================================
 * APARATO: WIRE PROTOCOL CONTRACT (V11.0 - EDGE VALIDATED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: GRAMÁTICA DE TRAMAS ENTRANTES/SALIENTES Y VALIDACIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SUM TYPE SOVEREIGNTY: Cada trama es una variante etiquetada por
 *    'type'; los campos desconocidos se toleran en la entrada y jamás
 *    se re-emiten hacia otros clientes.
 * 2. EDGE VALIDATION: Este módulo es el ÚNICO lugar que tolera deriva
 *    de forma; pasado 'parse_inbound', todo el núcleo opera tipado.
 * 3. PAYLOAD CEILING: Las tramas que exceden el tope configurado se
 *    rechazan antes de tocar serde_json.
 *
 * # Mathematical Proof (Round-Trip Stability):
 * Validar, serializar y re-validar una trama produce el mismo valor
 * (módulo tolerancia de campos desconocidos), porque la serialización
 * emite exclusivamente los campos del contrato.
 * =================================================================
 */

use crate::state::{BudgetSnapshot, EkgRecord, ScenarioId, TelemetryFrame};
use crate::vitals::Vitals;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use typeshare::typeshare;

/// Gramática sellada de identificadores de sesión.
static SESSION_ID_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{4,64}$").expect("FATAL: session id grammar malformed"));

/// Catálogo de fallos de validación de tramas.
#[derive(Error, Debug)]
pub enum WireError {
    /// La trama excede el tope configurado de bytes.
    #[error("[L2_WIRE_FAULT]: FRAME_CEILING_EXCEEDED -> {observed_bytes} > {ceiling_bytes}")]
    FrameTooLarge { observed_bytes: usize, ceiling_bytes: usize },

    /// El texto no es JSON o no coincide con ninguna variante.
    #[error("[L2_WIRE_FAULT]: MALFORMED_FRAME -> {0}")]
    MalformedFrame(String),

    /// El identificador de sesión viola la gramática sellada.
    #[error("[L2_WIRE_FAULT]: INVALID_SESSION_ID")]
    InvalidSessionId,

    /// Un campo obligatorio llegó vacío.
    #[error("[L2_WIRE_FAULT]: EMPTY_REQUIRED_FIELD -> {0}")]
    EmptyField(&'static str),

    /// El identificador de escenario no pertenece al catálogo.
    #[error("[L2_WIRE_FAULT]: UNKNOWN_SCENARIO -> {0}")]
    UnknownScenario(String),
}

/// Rol de un cliente dentro de la sesión.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    Presenter,
    Participant,
}

/// Comandos de voz/control despachables por el presentador o el equipo.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    PauseAi,
    ResumeAi,
    ForceReply,
    EndTurn,
    MuteUser,
    Freeze,
    Unfreeze,
    SkipStage,
    Order,
    Exam,
    ToggleTelemetry,
    ShowEkg,
    Treatment,
}

/// Turno de transcripción entregado al analizador de debrief.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: String,
    pub text: String,
    #[typeshare(serialized_as = "number")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Tramas entrantes del canal duplex (etiquetadas por 'type').
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Join {
        session_id: String,
        user_id: String,
        role: ClientRole,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth_token: Option<String>,
    },
    StartSpeaking {
        session_id: String,
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<String>,
    },
    StopSpeaking {
        session_id: String,
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<String>,
    },
    VoiceCommand {
        session_id: String,
        user_id: String,
        command_type: CommandType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    DoctorAudio {
        session_id: String,
        user_id: String,
        audio_base64: String,
        content_type: String,
    },
    SetScenario {
        session_id: String,
        user_id: String,
        scenario_id: String,
    },
    AnalyzeTranscript {
        session_id: String,
        user_id: String,
        turns: Vec<TranscriptTurn>,
    },
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}

impl InboundMessage {
    /// Identificador de sesión referenciado por la trama, si alguno.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            InboundMessage::Join { session_id, .. }
            | InboundMessage::StartSpeaking { session_id, .. }
            | InboundMessage::StopSpeaking { session_id, .. }
            | InboundMessage::VoiceCommand { session_id, .. }
            | InboundMessage::DoctorAudio { session_id, .. }
            | InboundMessage::SetScenario { session_id, .. }
            | InboundMessage::AnalyzeTranscript { session_id, .. } => Some(session_id),
            InboundMessage::Ping { session_id } => session_id.as_deref(),
        }
    }
}

/// Estado agregado del paciente para el indicador del Dashboard.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatientStateKind {
    Idle,
    Listening,
    Speaking,
    Error,
}

/// Payload del snapshot 'sim_state' difundido a toda la sesión.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimStatePayload {
    pub session_id: String,
    pub stage_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<ScenarioId>,
    pub vitals: Vitals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhythm_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_waveform: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<Vec<String>>,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<Vec<crate::orders::Order>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ekg_history: Option<Vec<EkgRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_history: Option<Vec<TelemetryFrame>>,
}

/// Tramas salientes del canal duplex (etiquetadas por 'type').
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Joined {
        session_id: String,
        role: ClientRole,
    },
    ParticipantState {
        session_id: String,
        user_id: String,
        speaking: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<String>,
    },
    PatientState {
        session_id: String,
        state: PatientStateKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    PatientTranscriptDelta {
        session_id: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<String>,
    },
    PatientAudio {
        session_id: String,
        audio_base64: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<String>,
    },
    DoctorUtterance {
        session_id: String,
        user_id: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<String>,
    },
    ScenarioChanged {
        session_id: String,
        scenario_id: ScenarioId,
    },
    AnalysisResult {
        session_id: String,
        summary: String,
        strengths: Vec<String>,
        opportunities: Vec<String>,
        teaching_points: Vec<String>,
    },
    SimState(SimStatePayload),
    Pong,
    Error {
        message: String,
    },
}

/**
 * Valida y decodifica una trama entrante.
 *
 * # Errors:
 * - 'FrameTooLarge' si la trama supera el tope de bytes.
 * - 'MalformedFrame' si el JSON no coincide con el contrato.
 * - 'InvalidSessionId' / 'EmptyField' ante violaciones semánticas.
 */
pub fn parse_inbound(raw_frame: &str, ceiling_bytes: usize) -> Result<InboundMessage, WireError> {
    if raw_frame.len() > ceiling_bytes {
        return Err(WireError::FrameTooLarge {
            observed_bytes: raw_frame.len(),
            ceiling_bytes,
        });
    }

    let message: InboundMessage =
        serde_json::from_str(raw_frame).map_err(|fault| WireError::MalformedFrame(fault.to_string()))?;

    // Validación semántica post-deserialización
    if let Some(session_id) = message.session_id() {
        if !SESSION_ID_GRAMMAR.is_match(session_id) {
            return Err(WireError::InvalidSessionId);
        }
    }

    match &message {
        InboundMessage::Join { user_id, .. }
        | InboundMessage::StartSpeaking { user_id, .. }
        | InboundMessage::StopSpeaking { user_id, .. }
        | InboundMessage::VoiceCommand { user_id, .. }
        | InboundMessage::SetScenario { user_id, .. }
        | InboundMessage::AnalyzeTranscript { user_id, .. } => {
            if user_id.trim().is_empty() {
                return Err(WireError::EmptyField("user_id"));
            }
        }
        InboundMessage::DoctorAudio { user_id, audio_base64, .. } => {
            if user_id.trim().is_empty() {
                return Err(WireError::EmptyField("user_id"));
            }
            if audio_base64.is_empty() {
                return Err(WireError::EmptyField("audio_base64"));
            }
        }
        InboundMessage::Ping { .. } => {}
    }

    if let InboundMessage::SetScenario { scenario_id, .. } = &message {
        if ScenarioId::parse(scenario_id).is_none() {
            return Err(WireError::UnknownScenario(scenario_id.clone()));
        }
    }

    Ok(message)
}

/// Verdadero si el identificador respeta la gramática de sesión.
pub fn is_valid_session_id(candidate: &str) -> bool {
    SESSION_ID_GRAMMAR.is_match(candidate)
}

/// Serializa una trama saliente hacia texto JSON.
/// La emisión es infalible para el contrato; un fallo aquí es interno.
pub fn render_outbound(message: &OutboundMessage) -> String {
    serde_json::to_string(message).unwrap_or_else(|fault| {
        format!("{{\"type\":\"error\",\"message\":\"serialization fault: {}\"}}", fault)
    })
}
