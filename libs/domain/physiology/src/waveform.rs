// [libs/domain/physiology/src/waveform.rs]
/*!
 * =================================================================
 * APARATO: TELEMETRY WAVEFORM SYNTHESIZER (V2.2)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: GENERACIÓN PSEUDO-PERIÓDICA PARA EL MONITOR DE UI
 * =================================================================
 */

/// Muestras por cuadro de telemetría (≈ 1.6 s de tira a 30 Hz).
const SAMPLES_PER_FRAME: usize = 48;
/// Frecuencia de muestreo nominal de la tira (Hz).
const SAMPLE_RATE_HZ: f64 = 30.0;

/**
 * Sintetiza una tira corta de telemetría parametrizada por la HR.
 *
 * El generador es determinista: complejo QRS estilizado sobre una
 * línea base con onda T suave, repetido al período del latido. Una
 * HR de cero produce línea plana (asistolia).
 */
pub fn build_telemetry_waveform(heart_rate: f64) -> Vec<f64> {
    if heart_rate <= 0.5 {
        return vec![0.0; SAMPLES_PER_FRAME];
    }

    let beat_period_samples = (60.0 / heart_rate) * SAMPLE_RATE_HZ;
    let mut samples = Vec::with_capacity(SAMPLES_PER_FRAME);

    for sample_index in 0..SAMPLES_PER_FRAME {
        let beat_phase = (sample_index as f64 % beat_period_samples) / beat_period_samples;
        samples.push(beat_amplitude(beat_phase));
    }

    samples
}

/// Amplitud estilizada de un latido en la fase [0, 1).
fn beat_amplitude(beat_phase: f64) -> f64 {
    if beat_phase < 0.08 {
        // Complejo QRS: espiga dominante
        let spike_phase = beat_phase / 0.08;
        ((spike_phase * std::f64::consts::PI).sin() * 1.0 * 100.0).round() / 100.0
    } else if beat_phase < 0.16 {
        // Descenso S
        -0.25
    } else if beat_phase < 0.45 {
        // Onda T suave
        let t_phase = (beat_phase - 0.16) / 0.29;
        ((t_phase * std::f64::consts::PI).sin() * 0.3 * 100.0).round() / 100.0
    } else {
        // Línea base isoeléctrica
        0.0
    }
}
