// [libs/domain/models/src/vitals.rs]
/*!
 * =================================================================
 * APARATO: VITAL SIGNS CONTRACT (V4.2 - PALS ALIGNED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN SOBERANA DE SIGNOS VITALES Y SUS DELTAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WIRE PARITY: La presión arterial viaja como String "SBP/DBP" en
 *    todas las tramas; los consumidores del Dashboard dependen de esa
 *    forma. La aritmética de deriva se hace sobre los pares numéricos.
 * 2. CLAMP SOVEREIGNTY: Los invariantes fisiológicos (SpO₂ ∈ [50,100],
 *    SBP ≥ 40, DBP ≥ 20) se sellan aquí, no en cada llamador.
 * 3. NOMINAL PURITY: Nomenclatura nominal absoluta con renames serde
 *    para mantener la gramática de la trama original.
 *
 * # Mathematical Proof (Drift Integration):
 * La deriva por estadio se expresa en unidades/minuto. La integración
 * usa 'elapsed_seconds / 60' como factor escalar, de modo que ticks
 * perdidos se recuperan sin error acumulado al siguiente latido.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Piso fisiológico absoluto de presión sistólica tras cualquier ajuste.
pub const SYSTOLIC_FLOOR: f64 = 40.0;
/// Piso fisiológico absoluto de presión diastólica tras cualquier ajuste.
pub const DIASTOLIC_FLOOR: f64 = 20.0;
/// Rango sellado de saturación de oxígeno simulable.
pub const SPO2_RANGE: (f64, f64) = (50.0, 100.0);

/// Par numérico de presión arterial con codec hacia la forma "SBP/DBP".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

impl BloodPressure {
    /**
     * Decodifica la forma de trama "SBP/DBP" hacia el par numérico.
     * Entradas malformadas colapsan a un perfil neutro (90/60) en vez
     * de propagar un fallo dentro del cerrojo de sesión.
     */
    pub fn parse(serialized_pair: &str) -> Self {
        let mut segments = serialized_pair.splitn(2, '/');
        let systolic = segments
            .next()
            .and_then(|fragment| fragment.trim().parse::<f64>().ok())
            .unwrap_or(90.0);
        let diastolic = segments
            .next()
            .and_then(|fragment| fragment.trim().parse::<f64>().ok())
            .unwrap_or(60.0);
        Self { systolic, diastolic }
    }

    /// Re-serializa hacia la forma de trama, redondeando al entero clínico.
    pub fn render(&self) -> String {
        format!("{}/{}", self.systolic.round() as i64, self.diastolic.round() as i64)
    }

    /// Aplica los pisos fisiológicos sellados (SBP ≥ 40, DBP ≥ 20).
    pub fn clamp_floors(&mut self) {
        self.systolic = self.systolic.max(SYSTOLIC_FLOOR);
        self.diastolic = self.diastolic.max(DIASTOLIC_FLOOR);
    }
}

/// Snapshot completo de signos vitales de la paciente simulada.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vitals {
    /// Frecuencia cardiaca en latidos por minuto.
    #[serde(rename = "hr")]
    pub heart_rate: f64,
    /// Frecuencia respiratoria en respiraciones por minuto.
    #[serde(rename = "rr")]
    pub respiratory_rate: f64,
    /// Saturación de oxígeno periférica (porcentaje).
    #[serde(rename = "spo2")]
    pub oxygen_saturation: f64,
    /// Temperatura corporal en grados Fahrenheit.
    #[serde(rename = "temp")]
    pub temperature: f64,
    /// Presión arterial serializada como "SBP/DBP".
    #[serde(rename = "bp")]
    pub blood_pressure: String,
}

impl Vitals {
    /// Acceso numérico al par de presión arterial.
    pub fn blood_pressure_pair(&self) -> BloodPressure {
        BloodPressure::parse(&self.blood_pressure)
    }

    /**
     * Sella los invariantes fisiológicos tras cualquier mutación.
     * Debe invocarse después de integrar deltas o deriva.
     */
    pub fn clamp_invariants(&mut self) {
        self.oxygen_saturation = self.oxygen_saturation.clamp(SPO2_RANGE.0, SPO2_RANGE.1);
        self.heart_rate = self.heart_rate.max(0.0);
        self.respiratory_rate = self.respiratory_rate.max(0.0);

        let mut pressure_pair = self.blood_pressure_pair();
        pressure_pair.clamp_floors();
        self.blood_pressure = pressure_pair.render();
    }

    /**
     * Integra un delta aditivo sobre los valores actuales y re-sella
     * los invariantes. El delta de presión opera sobre el par numérico
     * y se re-serializa hacia la forma "SBP/DBP".
     */
    pub fn apply_delta(&mut self, delta: &VitalsDelta) {
        if let Some(heart_rate_delta) = delta.heart_rate {
            self.heart_rate += heart_rate_delta;
        }
        if let Some(respiratory_delta) = delta.respiratory_rate {
            self.respiratory_rate += respiratory_delta;
        }
        if let Some(saturation_delta) = delta.oxygen_saturation {
            self.oxygen_saturation += saturation_delta;
        }
        if let Some(temperature_delta) = delta.temperature {
            self.temperature += temperature_delta;
        }

        if delta.systolic.is_some() || delta.diastolic.is_some() {
            let mut pressure_pair = self.blood_pressure_pair();
            pressure_pair.systolic += delta.systolic.unwrap_or(0.0);
            pressure_pair.diastolic += delta.diastolic.unwrap_or(0.0);
            self.blood_pressure = pressure_pair.render();
        }

        self.clamp_invariants();
    }
}

/// Delta aditivo parcial sobre signos vitales.
/// Cada campo ausente significa "sin cambio" en esa dimensión.
#[typeshare]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct VitalsDelta {
    #[serde(rename = "hr", default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(rename = "rr", default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[serde(rename = "spo2", default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
    #[serde(rename = "temp", default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "sbp", default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<f64>,
    #[serde(rename = "dbp", default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,
}

impl VitalsDelta {
    /// Verdadero si el delta no toca ninguna dimensión.
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.respiratory_rate.is_none()
            && self.oxygen_saturation.is_none()
            && self.temperature.is_none()
            && self.systolic.is_none()
            && self.diastolic.is_none()
    }

    /**
     * Fusiona dos deltas en uno solo (suma componente a componente).
     * Usado por el motor de reglas para agregar todos los efectos de
     * un mismo pase en un único ajuste.
     */
    pub fn merge(&self, other: &VitalsDelta) -> VitalsDelta {
        fn fuse(left: Option<f64>, right: Option<f64>) -> Option<f64> {
            match (left, right) {
                (None, None) => None,
                (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
            }
        }

        VitalsDelta {
            heart_rate: fuse(self.heart_rate, other.heart_rate),
            respiratory_rate: fuse(self.respiratory_rate, other.respiratory_rate),
            oxygen_saturation: fuse(self.oxygen_saturation, other.oxygen_saturation),
            temperature: fuse(self.temperature, other.temperature),
            systolic: fuse(self.systolic, other.systolic),
            diastolic: fuse(self.diastolic, other.diastolic),
        }
    }
}
