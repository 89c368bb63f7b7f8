// [apps/gateway/src/services/analysis.rs]
/*!
 * =================================================================
 * APARATO: DEBRIEF ANALYSIS SERVICE (V3.0 - DETERMINISTIC)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: SÍNTESIS DE DEBRIEF DESDE TIMELINE Y PUNTAJE
 *
 * El analizador es determinista por diseño: funciona íntegro en modo
 * fallback porque consume el ledger local, jamás al proveedor.
 * =================================================================
 */

use codeblue_domain_models::state::SimulationState;
use codeblue_domain_models::wire::{OutboundMessage, TranscriptTurn};
use codeblue_domain_scenarios::scenario;

/**
 * Sintetiza el resultado de análisis para la trama 'analysis_result'.
 */
pub fn analyze_session(state: &SimulationState, turns: &[TranscriptTurn]) -> OutboundMessage {
    let definition = scenario(state.scenario_id);

    let mut strengths = Vec::new();
    let mut opportunities = Vec::new();
    let mut teaching_points = Vec::new();

    if let (Some(extended), Some(scoring_config)) = (&state.extended, &definition.scoring) {
        let scoring = extended.scoring();

        for completed_id in &scoring.checklist_completed {
            if let Some(item) = scoring_config.checklist_item(completed_id) {
                strengths.push(item.label.to_string());
            }
        }
        for bonus_id in &scoring.bonuses_earned {
            if let Some(item) = scoring_config.bonus_item(bonus_id) {
                strengths.push(item.label.to_string());
            }
        }

        for item in &scoring_config.checklist {
            if !scoring.checklist_completed.iter().any(|done| done == item.id) {
                opportunities.push(format!("Not done: {}", item.label));
            }
        }
        for penalty_id in &scoring.penalties_incurred {
            if let Some(item) = scoring_config.penalty_item(penalty_id) {
                opportunities.push(item.label.to_string());
                teaching_points.push(format!("Review why this hurt the patient: {}.", item.label));
            }
        }
    } else {
        // Escenarios simples: el debrief resume la exploración de historia.
        if state.interventions.is_empty() {
            opportunities.push("No orders were placed during the encounter.".to_string());
        } else {
            strengths.push(format!(
                "Team worked through {} clinical actions.",
                state.interventions.len()
            ));
        }
    }

    teaching_points.push(match state.scenario_id {
        codeblue_domain_models::state::ScenarioId::TeenSvtComplexV1 => {
            "PALS SVT ladder: vagal maneuvers, adenosine 0.1 then 0.2 mg/kg rapid push, synchronized cardioversion 0.5-2 J/kg.".to_string()
        }
        codeblue_domain_models::state::ScenarioId::PedsMyocarditisSilentCrashV1 => {
            "Myocarditis masquerades as 'just a virus' — tachycardia out of proportion, gallop and hepatomegaly are the tells; fluids hurt, early inotropes help.".to_string()
        }
        _ => "Exertional syncope with a murmur deserves an ECG and a family history before discharge.".to_string(),
    });

    let score_fragment = state
        .extended
        .as_ref()
        .map(|extended| format!(" Final score {:.0}/100.", extended.scoring().current_score))
        .unwrap_or_default();

    let summary = format!(
        "Scenario '{}' reached stage '{}' across {} transcript turns with {} orders placed.{}",
        state.scenario_id.wire_label(),
        state.stage_id,
        turns.len(),
        state.orders.len(),
        score_fragment
    );

    OutboundMessage::AnalysisResult {
        session_id: state.session_id.clone(),
        summary,
        strengths,
        opportunities,
        teaching_points,
    }
}
