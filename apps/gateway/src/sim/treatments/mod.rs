// [apps/gateway/src/sim/treatments/mod.rs]
/*!
 * =================================================================
 * APARATO: TREATMENT DISPATCH UMBRELLA (V5.0)
 * CLASIFICACIÓN: APPLICATION LOGIC (ESTRATO L1-APP)
 * RESPONSABILIDAD: RUTEO DE TRATAMIENTOS POR VARIANTE DE ESCENARIO
 *
 * Los desenlaces probabilísticos (conversión con adenosina, rebote)
 * viven AQUÍ, jamás en el motor de reglas. El RNG entra por parámetro
 * para que el Proving Grounds lo pueda sembrar.
 * =================================================================
 */

pub mod myocarditis;
pub mod svt;

use crate::sim::SimCore;
use codeblue_domain_models::events::SimEvent;
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_orders::ParsedOrder;
use rand::Rng;

/// Resultado de la aplicación de un tratamiento bajo el cerrojo.
#[derive(Debug, Default)]
pub struct TreatmentReport {
    pub changed: bool,
    pub events: Vec<SimEvent>,
    /// Líneas de personaje a difundir: (personaje, texto).
    pub lines: Vec<(String, String)>,
}

impl TreatmentReport {
    pub fn say(&mut self, character: &str, line: impl Into<String>) {
        self.lines.push((character.to_string(), line.into()));
    }
}

/**
 * Aplica un tratamiento parseado sobre el núcleo de la sesión.
 * Devuelve None cuando el escenario vigente no maneja tratamientos
 * (escenarios simples: la enfermera declina con una línea guionada).
 */
pub fn apply_treatment<R: Rng>(
    sim: &mut SimCore,
    parsed: &ParsedOrder,
    now: i64,
    rng: &mut R,
) -> Option<TreatmentReport> {
    let is_svt = matches!(sim.state.extended, Some(ExtendedState::Svt(_)));
    let is_myocarditis = matches!(sim.state.extended, Some(ExtendedState::Myocarditis(_)));

    if is_svt {
        Some(svt::apply(sim, parsed, now, rng))
    } else if is_myocarditis {
        Some(myocarditis::apply(sim, parsed, now))
    } else {
        None
    }
}
