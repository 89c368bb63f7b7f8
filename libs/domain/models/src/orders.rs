// [libs/domain/models/src/orders.rs]
/*!
 * =================================================================
 * APARATO: CLINICAL ORDER CONTRACT (V3.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CICLO DE VIDA PENDING -> COMPLETE DE ÓRDENES
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Tipos de orden diagnóstica con registro en el estado de sesión.
/// A lo sumo UNA orden 'pending' por tipo y por sesión.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Vitals,
    Ekg,
    Labs,
    Imaging,
    CardiacExam,
    LungExam,
    GeneralExam,
    IvAccess,
}

impl OrderKind {
    /// Etiqueta estable usada en payloads de eventos y logs.
    pub fn wire_label(&self) -> &'static str {
        match self {
            OrderKind::Vitals => "vitals",
            OrderKind::Ekg => "ekg",
            OrderKind::Labs => "labs",
            OrderKind::Imaging => "imaging",
            OrderKind::CardiacExam => "cardiac_exam",
            OrderKind::LungExam => "lung_exam",
            OrderKind::GeneralExam => "general_exam",
            OrderKind::IvAccess => "iv_access",
        }
    }
}

/// Estado del ciclo de vida de una orden.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Complete,
}

/// Resultado adjuntado a una orden al completarse.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderResult {
    /// Resumen textual leído por el personaje correspondiente.
    pub summary: String,
    /// Marca el hallazgo como anormal para el resaltado del Dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abnormal: Option<bool>,
    /// Recurso visual asociado (tira de ritmo, placa de tórax).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Metadatos estructurados específicos del tipo de orden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// Registro soberano de una orden clínica emitida por el equipo.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Identificador único universal de la orden (UUID v4).
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OrderKind,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OrderResult>,
    /// Epoch milisegundos de creación.
    #[typeshare(serialized_as = "number")]
    pub ordered_at: i64,
    /// Epoch milisegundos de finalización.
    #[typeshare(serialized_as = "number")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Identificador del clínico que emitió la orden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_by: Option<String>,
}

impl Order {
    /// Forja una orden recién emitida en estado 'pending'.
    pub fn pending(kind: OrderKind, ordered_at: i64, ordered_by: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            status: OrderStatus::Pending,
            result: None,
            ordered_at,
            completed_at: None,
            ordered_by,
        }
    }

    /// Transiciona la orden a 'complete' adjuntando su resultado.
    pub fn complete(&mut self, result: OrderResult, completed_at: i64) {
        self.status = OrderStatus::Complete;
        self.result = Some(result);
        self.completed_at = Some(completed_at);
    }
}
