// [tests/mirror/libs/domain/physiology/rhythm_bands.test.rs]
/**
 * =================================================================
 * APARATO: PALS RHYTHM BAND CERTIFICATION (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-PHYSIOLOGY
 * RESPONSABILIDAD: ETIQUETAS DE RITMO POR BANDA ETARIA
 * =================================================================
 */

use codeblue_domain_physiology::rhythm::{
    hypotension_floor, synthesize_rhythm_label, RhythmAugmentation,
};

const INFANT_MONTHS: u32 = 1;
const ADOLESCENT_MONTHS: u32 = 180;

#[test]
fn certify_infant_rhythm_bands() {
    println!("\n🫀 [PROVING_GROUNDS]: Auditing infant PALS bands...");

    assert_eq!(synthesize_rhythm_label(INFANT_MONTHS, 140.0, &[]), "Normal sinus rhythm");
    assert!(synthesize_rhythm_label(INFANT_MONTHS, 170.0, &[]).contains("Sinus tachycardia"));
    assert!(synthesize_rhythm_label(INFANT_MONTHS, 90.0, &[]).contains("Sinus bradycardia"));
    assert!(
        synthesize_rhythm_label(INFANT_MONTHS, 225.0, &[]).contains("SVT"),
        "L2_RHYTHM_FAULT: 225 bpm must label as SVT at every age."
    );

    println!("   ✅ [SUCCESS]: Infant band certified.");
}

#[test]
fn certify_adolescent_rhythm_bands() {
    assert_eq!(synthesize_rhythm_label(ADOLESCENT_MONTHS, 95.0, &[]), "Normal sinus rhythm");
    assert!(synthesize_rhythm_label(ADOLESCENT_MONTHS, 110.0, &[]).contains("Sinus tachycardia"));
    assert!(synthesize_rhythm_label(ADOLESCENT_MONTHS, 50.0, &[]).contains("Sinus bradycardia"));
}

#[test]
fn certify_extreme_rate_labels() {
    assert_eq!(synthesize_rhythm_label(ADOLESCENT_MONTHS, 0.0, &[]), "Asystole/PEA");
    assert!(synthesize_rhythm_label(ADOLESCENT_MONTHS, 12.0, &[]).contains("Agonal"));
    assert!(synthesize_rhythm_label(ADOLESCENT_MONTHS, 260.0, &[]).contains("Polymorphic VT"));

    // El umbral de SVT es universal: 220 a toda edad.
    for age_months in [0, 6, 24, 60, 100, 200] {
        assert!(
            synthesize_rhythm_label(age_months, 220.0, &[]).contains("SVT"),
            "L2_RHYTHM_FAULT: SVT threshold drifted for age {age_months} months."
        );
    }
}

#[test]
fn certify_scenario_augmentations_appended() {
    let label = synthesize_rhythm_label(104, 140.0, &[RhythmAugmentation::LowVoltage]);
    assert!(label.contains("Sinus tachycardia"));
    assert!(label.contains("diffuse low voltage"));

    let hcm_label =
        synthesize_rhythm_label(196, 80.0, &[RhythmAugmentation::LeftVentricularHypertrophy]);
    assert!(hcm_label.contains("LVH by voltage criteria"));
}

#[test]
fn certify_hypotension_floors_by_age() {
    assert_eq!(hypotension_floor(0), 60.0);
    assert_eq!(hypotension_floor(6), 70.0);
    // 8 años: 70 + 2*8 = 86.
    assert!((hypotension_floor(96) - 86.0).abs() < 0.01);
    assert_eq!(hypotension_floor(180), 90.0);
}
