// [libs/domain/physiology/src/triggers.rs]
/*!
 * =================================================================
 * APARATO: CHARACTER TRIGGER ENGINE (V4.1 - PRIORITY GATED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DESPACHO DETERMINISTA DE LÍNEAS DE PERSONAJE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ONE LINE PER PASS: El pase devuelve a lo sumo UNA línea; la
 *    enfermera tiene prelación absoluta, los familiares y la paciente
 *    hablan con probabilidad acotada (30%) para evitar cacofonía.
 * 2. HISTORY OWNERSHIP: El historial de disparos pertenece a la
 *    sesión; el motor solo lo consulta. El llamador lo actualiza tras
 *    despachar la línea, manteniendo el pase libre de efectos.
 *
 * # Mathematical Proof (Cooldown Gate):
 * Un disparador con cooldown C y tope F queda excluido del pase
 * cuando now - last_fired < C o fire_count >= F. El filtrado ocurre
 * antes de evaluar la condición, por lo que el costo del pase es
 * lineal en los disparadores elegibles.
 * =================================================================
 */

use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::rules::Priority;
use rand::Rng;
use std::collections::HashMap;

/// Probabilidad de que un familiar o la paciente tome la palabra.
const SUPPORTING_CAST_SPEAK_PROBABILITY: f64 = 0.30;

/// Personaje que emite la línea despachada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakingCharacter {
    Nurse,
    Parent,
    Patient,
}

impl SpeakingCharacter {
    /// Etiqueta de personaje usada en la trama 'patient_transcript_delta'.
    pub fn wire_label(&self) -> &'static str {
        match self {
            SpeakingCharacter::Nurse => "nurse",
            SpeakingCharacter::Parent => "parent",
            SpeakingCharacter::Patient => "patient",
        }
    }
}

/// Disparador guionado de una línea de personaje.
pub struct CharacterTrigger {
    pub id: &'static str,
    /// Condición pura sobre (estado extendido, milisegundos de escenario).
    pub condition: fn(&ExtendedState, i64) -> bool,
    pub line: &'static str,
    pub cooldown_ms: i64,
    pub max_fires: Option<u32>,
    pub priority: Priority,
}

/// Los tres pools de disparadores de una sesión compleja.
#[derive(Default)]
pub struct TriggerPools {
    pub nurse: Vec<CharacterTrigger>,
    pub parent: Vec<CharacterTrigger>,
    pub patient: Vec<CharacterTrigger>,
}

/// Contabilidad de disparos de un disparador individual.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerHistoryEntry {
    pub last_fired_ms: i64,
    pub fire_count: u32,
}

/// Historial por sesión: id de disparador -> contabilidad.
pub type TriggerHistory = HashMap<String, TriggerHistoryEntry>;

/// Línea seleccionada por un pase del motor.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredTrigger {
    pub id: String,
    pub character: SpeakingCharacter,
    pub line: String,
    pub priority: Priority,
}

/**
 * Ejecuta un pase de evaluación sobre los tres pools.
 *
 * Orden de despacho: enfermera (por prioridad ascendente: critical
 * gana) si alguna satisfizo; si no, familiar al 30%; si no, paciente
 * al 30%. El llamador debe registrar el disparo vía 'record_fire'.
 */
pub fn run_trigger_pass<R: Rng>(
    pools: &TriggerPools,
    extended: &ExtendedState,
    elapsed_ms: i64,
    history: &TriggerHistory,
    now_ms: i64,
    rng: &mut R,
) -> Option<FiredTrigger> {
    let satisfied_nurse = eligible_satisfied(&pools.nurse, extended, elapsed_ms, history, now_ms);

    if let Some(trigger) = satisfied_nurse
        .into_iter()
        .min_by_key(|candidate| candidate.priority)
    {
        return Some(FiredTrigger {
            id: trigger.id.to_string(),
            character: SpeakingCharacter::Nurse,
            line: trigger.line.to_string(),
            priority: trigger.priority,
        });
    }

    // Familiares y paciente hablan con probabilidad acotada.
    let parent_candidates = eligible_satisfied(&pools.parent, extended, elapsed_ms, history, now_ms);
    if !parent_candidates.is_empty() && rng.gen_bool(SUPPORTING_CAST_SPEAK_PROBABILITY) {
        let trigger = parent_candidates[0];
        return Some(FiredTrigger {
            id: trigger.id.to_string(),
            character: SpeakingCharacter::Parent,
            line: trigger.line.to_string(),
            priority: trigger.priority,
        });
    }

    let patient_candidates = eligible_satisfied(&pools.patient, extended, elapsed_ms, history, now_ms);
    if !patient_candidates.is_empty() && rng.gen_bool(SUPPORTING_CAST_SPEAK_PROBABILITY) {
        let trigger = patient_candidates[0];
        return Some(FiredTrigger {
            id: trigger.id.to_string(),
            character: SpeakingCharacter::Patient,
            line: trigger.line.to_string(),
            priority: trigger.priority,
        });
    }

    None
}

/// Registra el despacho efectivo de un disparador en el historial.
pub fn record_fire(history: &mut TriggerHistory, trigger_id: &str, now_ms: i64) {
    let entry = history.entry(trigger_id.to_string()).or_default();
    entry.last_fired_ms = now_ms;
    entry.fire_count += 1;
}

/// Filtra por cooldown/tope y evalúa la condición de cada entrada.
fn eligible_satisfied<'pool>(
    pool: &'pool [CharacterTrigger],
    extended: &ExtendedState,
    elapsed_ms: i64,
    history: &TriggerHistory,
    now_ms: i64,
) -> Vec<&'pool CharacterTrigger> {
    pool.iter()
        .filter(|trigger| {
            if let Some(entry) = history.get(trigger.id) {
                if entry.fire_count > 0 && now_ms - entry.last_fired_ms < trigger.cooldown_ms {
                    return false;
                }
                if let Some(max_fires) = trigger.max_fires {
                    if entry.fire_count >= max_fires {
                        return false;
                    }
                }
            }
            (trigger.condition)(extended, elapsed_ms)
        })
        .collect()
}
