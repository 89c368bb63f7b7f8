// [libs/domain/orders/src/params.rs]
/*!
 * =================================================================
 * APARATO: ORDER PARAMETER STRUCTS (V3.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: PARÁMETROS TIPADOS POR CLASE DE ORDEN
 *
 * Cada extractor del parser devuelve el struct de SU clase; el sum
 * type erradica los payloads 'any' del diseño original.
 * =================================================================
 */

use codeblue_domain_models::extended::myocarditis::{FluidType, InductionAgent, InotropeDrug};
use serde::{Deserialize, Serialize};

/// Parámetros de un bolo de fluidos.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FluidsParams {
    pub ml_per_kg: Option<f64>,
    /// Volumen absoluto cuando el clínico lo dijo en mL totales.
    pub total_ml: Option<f64>,
    pub fluid_type: Option<FluidType>,
    pub rate_minutes: Option<f64>,
}

/// Parámetros de una dosis de adenosina.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdenosineParams {
    pub dose_milligrams: Option<f64>,
    pub rapid_push: bool,
    pub flush_requested: bool,
}

/// Parámetros de una cardioversión.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CardioversionParams {
    pub joules: Option<f64>,
    /// None = el clínico no lo explicitó (el manejador asume sincronizada).
    pub synchronized: Option<bool>,
}

/// Parámetros de una infusión inotrópica.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InotropeParams {
    pub drug: InotropeDrug,
    pub dose_mcg_kg_min: Option<f64>,
}

/// Parámetros de la secuencia de intubación.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IntubationParams {
    pub induction_agent: Option<InductionAgent>,
    pub peep_cm_h2o: Option<f64>,
    pub fio2_fraction: Option<f64>,
    pub pressor_ready: bool,
    pub push_dose_epi_drawn: bool,
}

/// Parámetros de soporte de oxígeno simple.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OxygenParams {
    pub flow_liters_per_min: Option<f64>,
    pub device: Option<String>,
}

/// Parámetros de acceso intravenoso.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IvAccessParams {
    pub gauge: Option<u8>,
    pub location: Option<String>,
}

/// Parámetros de sedación procedimental.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SedationParams {
    pub agent: Option<String>,
}

/// Unión de parámetros extraídos, una variante por clase de orden.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum OrderParams {
    #[default]
    None,
    Fluids(FluidsParams),
    Adenosine(AdenosineParams),
    Cardioversion(CardioversionParams),
    Inotrope(InotropeParams),
    Intubation(IntubationParams),
    Oxygen(OxygenParams),
    IvAccess(IvAccessParams),
    Sedation(SedationParams),
}

impl OrderParams {
    /**
     * Fusiona parámetros de una respuesta de clarificación sobre los
     * parámetros pendientes (los valores nuevos rellenan los huecos).
     */
    pub fn merge_clarification(&mut self, incoming: OrderParams) {
        match (self, incoming) {
            (OrderParams::Fluids(pending), OrderParams::Fluids(update)) => {
                if pending.ml_per_kg.is_none() {
                    pending.ml_per_kg = update.ml_per_kg;
                }
                if pending.total_ml.is_none() {
                    pending.total_ml = update.total_ml;
                }
                if pending.fluid_type.is_none() {
                    pending.fluid_type = update.fluid_type;
                }
                if pending.rate_minutes.is_none() {
                    pending.rate_minutes = update.rate_minutes;
                }
            }
            (OrderParams::Adenosine(pending), OrderParams::Adenosine(update)) => {
                if pending.dose_milligrams.is_none() {
                    pending.dose_milligrams = update.dose_milligrams;
                }
                pending.rapid_push |= update.rapid_push;
                pending.flush_requested |= update.flush_requested;
            }
            (OrderParams::Cardioversion(pending), OrderParams::Cardioversion(update)) => {
                if pending.joules.is_none() {
                    pending.joules = update.joules;
                }
                if pending.synchronized.is_none() {
                    pending.synchronized = update.synchronized;
                }
            }
            (OrderParams::Intubation(pending), OrderParams::Intubation(update)) => {
                if pending.induction_agent.is_none() {
                    pending.induction_agent = update.induction_agent;
                }
                if pending.peep_cm_h2o.is_none() {
                    pending.peep_cm_h2o = update.peep_cm_h2o;
                }
                if pending.fio2_fraction.is_none() {
                    pending.fio2_fraction = update.fio2_fraction;
                }
                pending.pressor_ready |= update.pressor_ready;
                pending.push_dose_epi_drawn |= update.push_dose_epi_drawn;
            }
            (slot, update) => {
                if matches!(slot, OrderParams::None) {
                    *slot = update;
                }
            }
        }
    }
}
