// [libs/domain/physiology/src/alarms.rs]
/*!
 * =================================================================
 * APARATO: CLINICAL ALARM DEBOUNCER (V3.0 - SUSTAINED GATE)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DETECCIÓN DE CONDICIONES SOSTENIDAS (>= 4 s)
 *
 * # Mathematical Proof (Debounce Semantics):
 * Una alarma dispara cuando su condición se observa de forma continua
 * durante al menos la ventana de sostenimiento, y NO vuelve a disparar
 * hasta que la condición se haya limpiado por completo. El autómata
 * por alarma tiene tres estados: inactiva, observándose, activa.
 * =================================================================
 */

use crate::rhythm::{hypotension_floor, pals_band};
use codeblue_domain_models::vitals::Vitals;
use std::collections::HashMap;

/// Ventana de sostenimiento requerida antes de disparar (ms).
pub const SUSTAIN_WINDOW_MS: i64 = 4_000;
/// Umbral de desaturación para la alarma de SpO₂.
pub const LOW_SPO2_THRESHOLD: f64 = 90.0;

/// Tipos de alarma clínica vigilados por el monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmKind {
    LowOxygenSaturation,
    Hypotension,
    Bradycardia,
}

impl AlarmKind {
    pub fn wire_label(&self) -> &'static str {
        match self {
            AlarmKind::LowOxygenSaturation => "low_spo2",
            AlarmKind::Hypotension => "hypotension",
            AlarmKind::Bradycardia => "bradycardia",
        }
    }
}

/// Autómata de debounce de una alarma individual.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlarmState {
    pub first_observed_at: Option<i64>,
    pub last_fired_at: Option<i64>,
    pub active: bool,
}

/// Mapa por sesión: tipo de alarma -> autómata de debounce.
pub type AlarmTracker = HashMap<AlarmKind, AlarmState>;

/// Alarma disparada en un pase de vigilancia.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmFiring {
    pub kind: AlarmKind,
    pub message: String,
}

/**
 * Ejecuta un pase de vigilancia de alarmas sobre los vitales vigentes.
 *
 * Devuelve las alarmas que disparan en ESTE pase; las condiciones ya
 * activas no re-disparan hasta limpiarse.
 */
pub fn check_alarms(
    vitals: &Vitals,
    age_months: u32,
    tracker: &mut AlarmTracker,
    now_ms: i64,
) -> Vec<AlarmFiring> {
    let pressure_pair = vitals.blood_pressure_pair();
    let (bradycardia_floor, _) = pals_band(age_months).sinus_range();

    let observations = [
        (
            AlarmKind::LowOxygenSaturation,
            vitals.oxygen_saturation < LOW_SPO2_THRESHOLD,
            format!("SpO2 {}% — desaturation sustained", vitals.oxygen_saturation.round() as i64),
        ),
        (
            AlarmKind::Hypotension,
            pressure_pair.systolic < hypotension_floor(age_months),
            format!("SBP {} — hypotension for age", pressure_pair.systolic.round() as i64),
        ),
        (
            AlarmKind::Bradycardia,
            vitals.heart_rate < bradycardia_floor && vitals.heart_rate > 0.5,
            format!("HR {} — bradycardia for age", vitals.heart_rate.round() as i64),
        ),
    ];

    let mut firings = Vec::new();

    for (kind, condition_present, message) in observations {
        let state = tracker.entry(kind).or_default();

        if !condition_present {
            // La condición se limpió: el autómata vuelve a reposo y la
            // alarma queda re-armada para un próximo episodio.
            state.first_observed_at = None;
            state.active = false;
            continue;
        }

        let first_observed = *state.first_observed_at.get_or_insert(now_ms);

        if state.active {
            continue;
        }

        if now_ms - first_observed >= SUSTAIN_WINDOW_MS {
            state.active = true;
            state.last_fired_at = Some(now_ms);
            firings.push(AlarmFiring { kind, message });
        }
    }

    firings
}
