// [libs/domain/physiology/src/rhythm.rs]
/*!
 * =================================================================
 * APARATO: PALS RHYTHM SYNTHESIZER (V6.0 - PALS ALIGNED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ETIQUETADO DETERMINISTA DE RITMO POR BANDA ETARIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. AGE BANDING: Umbrales PALS por banda etaria (neonato a
 *    adolescente); el umbral de SVT es 220 lpm a TODA edad.
 * 2. OPAQUE STRINGS: Las etiquetas de ritmo son opacas para los
 *    llamadores; solo este sintetizador conoce su gramática.
 * 3. AUGMENTATION APPENDIX: Los matices por escenario (HVI, bajo
 *    voltaje, HVD, corridas ectópicas) se anexan a la etiqueta base.
 *
 * # Mathematical Proof (Total Function):
 * El sintetizador es total sobre (edad_meses, HR >= 0): cada entrada
 * cae en exactamente una rama del árbol de umbrales, garantizando
 * una etiqueta única y determinista.
 * =================================================================
 */

/// Banda etaria PALS con sus umbrales de ritmo sinusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalsBand {
    /// Menos de 1 mes de vida.
    Neonate,
    /// 1 a 12 meses.
    Infant,
    /// 1 a 3 años.
    Toddler,
    /// 3 a 6 años.
    Preschool,
    /// 6 a 12 años.
    SchoolAge,
    /// Mayor de 12 años.
    Adolescent,
}

impl PalsBand {
    /// Rango de ritmo sinusal normal (inferior, superior) en lpm.
    /// Taquicardia por encima del superior, bradicardia por debajo
    /// del inferior.
    pub fn sinus_range(&self) -> (f64, f64) {
        match self {
            PalsBand::Neonate => (100.0, 180.0),
            PalsBand::Infant => (100.0, 160.0),
            PalsBand::Toddler => (90.0, 150.0),
            PalsBand::Preschool => (80.0, 120.0),
            PalsBand::SchoolAge => (70.0, 110.0),
            PalsBand::Adolescent => (60.0, 100.0),
        }
    }
}

/// Umbral universal de SVT: 220 lpm a cualquier edad.
pub const SVT_THRESHOLD_BPM: f64 = 220.0;
/// Umbral de taquicardia ventricular polimorfa / Torsades.
pub const POLYMORPHIC_VT_THRESHOLD_BPM: f64 = 250.0;
/// Umbral de ritmo agónico.
pub const AGONAL_THRESHOLD_BPM: f64 = 20.0;

/// Resuelve la banda etaria PALS desde la edad en meses.
pub fn pals_band(age_months: u32) -> PalsBand {
    match age_months {
        0 => PalsBand::Neonate,
        1..=12 => PalsBand::Infant,
        13..=36 => PalsBand::Toddler,
        37..=72 => PalsBand::Preschool,
        73..=144 => PalsBand::SchoolAge,
        _ => PalsBand::Adolescent,
    }
}

/**
 * Piso de hipotensión PALS (SBP mínima aceptable) por edad.
 * Usado por el detector de alarmas para el umbral de presión.
 */
pub fn hypotension_floor(age_months: u32) -> f64 {
    let age_years = age_months as f64 / 12.0;
    if age_months < 1 {
        60.0
    } else if age_years < 1.0 {
        70.0
    } else if age_years <= 10.0 {
        70.0 + 2.0 * age_years
    } else {
        90.0
    }
}

/// Matices de etiqueta de ritmo propios de cada escenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RhythmAugmentation {
    /// Hipertrofia ventricular izquierda (cardiomiopatía hipertrófica).
    LeftVentricularHypertrophy,
    /// Bajo voltaje difuso (miocarditis).
    LowVoltage,
    /// Hipertrofia ventricular derecha (cardiopatía cianótica).
    RightVentricularHypertrophy,
    /// Corridas de extrasístoles auriculares/ventriculares.
    EctopicRuns,
}

impl RhythmAugmentation {
    fn appendix_label(&self) -> &'static str {
        match self {
            RhythmAugmentation::LeftVentricularHypertrophy => "LVH by voltage criteria",
            RhythmAugmentation::LowVoltage => "diffuse low voltage",
            RhythmAugmentation::RightVentricularHypertrophy => "RVH pattern",
            RhythmAugmentation::EctopicRuns => "frequent PAC/PVC runs",
        }
    }
}

/**
 * Sintetiza la etiqueta de ritmo PALS para la edad y HR vigentes.
 *
 * Precedencia del árbol de umbrales:
 * asistolia -> agónico -> TV polimorfa -> SVT -> bradicardia ->
 * taquicardia -> sinusal normal.
 */
pub fn synthesize_rhythm_label(
    age_months: u32,
    heart_rate: f64,
    augmentations: &[RhythmAugmentation],
) -> String {
    let base_label = if heart_rate <= 0.5 {
        "Asystole/PEA".to_string()
    } else if heart_rate < AGONAL_THRESHOLD_BPM {
        format!("Agonal rhythm, {} bpm", heart_rate.round() as i64)
    } else if heart_rate >= POLYMORPHIC_VT_THRESHOLD_BPM {
        format!("Polymorphic VT / Torsades, {} bpm", heart_rate.round() as i64)
    } else if heart_rate >= SVT_THRESHOLD_BPM {
        format!("SVT {} bpm, narrow complex, regular", heart_rate.round() as i64)
    } else {
        let (sinus_low, sinus_high) = pals_band(age_months).sinus_range();
        if heart_rate < sinus_low {
            format!("Sinus bradycardia, {} bpm", heart_rate.round() as i64)
        } else if heart_rate > sinus_high {
            format!("Sinus tachycardia, {} bpm", heart_rate.round() as i64)
        } else {
            "Normal sinus rhythm".to_string()
        }
    };

    if augmentations.is_empty() {
        return base_label;
    }

    let appendix = augmentations
        .iter()
        .map(RhythmAugmentation::appendix_label)
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}, {}", base_label, appendix)
}
