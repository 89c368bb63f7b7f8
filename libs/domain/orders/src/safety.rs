// [libs/domain/orders/src/safety.rs]
/*!
 * =================================================================
 * APARATO: MYOCARDITIS ORDER SAFETY VALIDATOR (V4.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ADVERTENCIAS DOCENTES SOBRE ÓRDENES RIESGOSAS
 *
 * El validador JAMÁS rechaza una orden: el escenario existe para que
 * los errores ocurran y enseñen. Las advertencias se vocalizan por la
 * enfermera; los puntos docentes alimentan el debrief.
 * =================================================================
 */

use crate::params::OrderParams;
use crate::parser::{ParsedOrder, ParsedOrderKind};
use codeblue_domain_models::extended::myocarditis::{InductionAgent, InotropeDrug};

/// Contexto hemodinámico vigente al validar la orden.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyocarditisOrderContext {
    pub shock_stage: u8,
    pub total_fluids_ml_kg: f64,
    pub has_epi_running: bool,
    pub has_airway: bool,
}

/// Resultado del chequeo de seguridad.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafetyAssessment {
    /// Falso cuando la orden acarrea advertencias (nunca se rechaza).
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub teaching_points: Vec<String>,
}

/**
 * Evalúa una orden contra la fisiología de shock cardiogénico.
 *
 * Trampas vigiladas: sobrecarga de volumen (> 40 mL/kg), propofol sin
 * vasopresor en shock >= 2, PEEP alta en shock >= 3, milrinona sin
 * vasopresor concurrente.
 */
pub fn validate_myocarditis_order(
    parsed: &ParsedOrder,
    context: &MyocarditisOrderContext,
) -> SafetyAssessment {
    let mut assessment = SafetyAssessment { is_valid: true, ..SafetyAssessment::default() };

    match (&parsed.kind, &parsed.params) {
        (ParsedOrderKind::Fluids, OrderParams::Fluids(fluids)) => {
            let incoming_ml_kg = fluids.ml_per_kg.unwrap_or(0.0);
            if context.total_fluids_ml_kg + incoming_ml_kg > 40.0 {
                assessment.warnings.push(
                    "That would put him over 40 mL/kg — in cardiogenic shock every bolus backs up into the lungs.".to_string(),
                );
                assessment.teaching_points.push(
                    "Myocarditis hearts are volume-intolerant; prefer 5-10 mL/kg aliquots with reassessment.".to_string(),
                );
            } else if incoming_ml_kg > 10.0 && context.shock_stage >= 2 {
                assessment.warnings.push(
                    "A large bolus into a failing ventricle — want to give it slowly and reassess?".to_string(),
                );
            }
        }
        (ParsedOrderKind::Intubation, OrderParams::Intubation(intubation)) => {
            if intubation.induction_agent == Some(InductionAgent::Propofol)
                && context.shock_stage >= 2
                && !intubation.pressor_ready
                && !intubation.push_dose_epi_drawn
            {
                assessment.warnings.push(
                    "Propofol will drop his pressure and we don't have a pressor drawn up.".to_string(),
                );
                assessment.teaching_points.push(
                    "In decompensated shock choose ketamine or etomidate and have push-dose epi at bedside before induction.".to_string(),
                );
            }
            if intubation.peep_cm_h2o.unwrap_or(0.0) >= 10.0 && context.shock_stage >= 3 {
                assessment.warnings.push(
                    "That much PEEP will tank his preload at this shock stage.".to_string(),
                );
            }
        }
        (ParsedOrderKind::Milrinone, OrderParams::Inotrope(inotrope)) => {
            if inotrope.drug == InotropeDrug::Milrinone && !context.has_epi_running {
                assessment.warnings.push(
                    "Milrinone alone will vasodilate him — do you want a vasopressor running first?".to_string(),
                );
                assessment.teaching_points.push(
                    "Inodilators need a concurrent vasopressor in hypotensive myocarditis.".to_string(),
                );
            }
        }
        _ => {}
    }

    assessment.is_valid = assessment.warnings.is_empty();
    assessment
}
