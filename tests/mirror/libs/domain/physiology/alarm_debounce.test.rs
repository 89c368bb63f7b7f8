// [tests/mirror/libs/domain/physiology/alarm_debounce.test.rs]
/**
 * =================================================================
 * APARATO: ALARM DEBOUNCE CERTIFICATION (V2.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-PHYSIOLOGY
 * RESPONSABILIDAD: SOSTENIMIENTO >= 4 s Y RE-ARMADO TRAS LIMPIEZA
 * =================================================================
 */

use codeblue_domain_models::vitals::Vitals;
use codeblue_domain_physiology::alarms::{check_alarms, AlarmKind, AlarmTracker};

fn vitals_with_spo2(spo2: f64) -> Vitals {
    Vitals {
        heart_rate: 120.0,
        respiratory_rate: 24.0,
        oxygen_saturation: spo2,
        temperature: 98.6,
        blood_pressure: "110/70".to_string(),
    }
}

const AGE_MONTHS: u32 = 104;

#[test]
fn certify_alarm_requires_sustained_condition() {
    println!("\n🚨 [PROVING_GROUNDS]: Auditing desaturation debounce...");

    let mut tracker = AlarmTracker::new();
    let low = vitals_with_spo2(85.0);

    // Primera observación: registra pero NO dispara.
    let t0 = 1_000_000;
    assert!(check_alarms(&low, AGE_MONTHS, &mut tracker, t0).is_empty());

    // A los 2 s sigue sin disparar (ventana de 4 s).
    assert!(check_alarms(&low, AGE_MONTHS, &mut tracker, t0 + 2_000).is_empty());

    // A los 4 s la condición sostenida dispara exactamente una vez.
    let firings = check_alarms(&low, AGE_MONTHS, &mut tracker, t0 + 4_000);
    assert_eq!(firings.len(), 1);
    assert_eq!(firings[0].kind, AlarmKind::LowOxygenSaturation);

    // Mientras la condición persiste, NO re-dispara.
    assert!(check_alarms(&low, AGE_MONTHS, &mut tracker, t0 + 8_000).is_empty());

    println!("   ✅ [SUCCESS]: Debounce window certified.");
}

#[test]
fn certify_alarm_rearms_after_clearing() {
    let mut tracker = AlarmTracker::new();
    let low = vitals_with_spo2(85.0);
    let normal = vitals_with_spo2(98.0);

    let t0 = 1_000_000;
    check_alarms(&low, AGE_MONTHS, &mut tracker, t0);
    let first = check_alarms(&low, AGE_MONTHS, &mut tracker, t0 + 4_500);
    assert_eq!(first.len(), 1);

    // La condición se limpia: el autómata vuelve a reposo.
    assert!(check_alarms(&normal, AGE_MONTHS, &mut tracker, t0 + 10_000).is_empty());

    // Nuevo episodio: exige de nuevo la ventana completa.
    assert!(check_alarms(&low, AGE_MONTHS, &mut tracker, t0 + 20_000).is_empty());
    let second = check_alarms(&low, AGE_MONTHS, &mut tracker, t0 + 24_500);
    assert_eq!(second.len(), 1, "L2_ALARM_FAULT: Alarm must re-fire after clearing.");
}

#[test]
fn certify_transient_dip_never_fires() {
    let mut tracker = AlarmTracker::new();
    let t0 = 1_000_000;

    // Caída de 3 s que se recupera: jamás dispara.
    check_alarms(&vitals_with_spo2(86.0), AGE_MONTHS, &mut tracker, t0);
    check_alarms(&vitals_with_spo2(86.0), AGE_MONTHS, &mut tracker, t0 + 3_000);
    assert!(check_alarms(&vitals_with_spo2(97.0), AGE_MONTHS, &mut tracker, t0 + 3_500).is_empty());
    assert!(check_alarms(&vitals_with_spo2(86.0), AGE_MONTHS, &mut tracker, t0 + 4_500).is_empty());
}

#[test]
fn certify_hypotension_uses_age_floor() {
    let mut tracker = AlarmTracker::new();
    let mut vitals = vitals_with_spo2(97.0);
    // 8 años: piso 86, por lo que 80/50 es hipotensión para la edad.
    vitals.blood_pressure = "80/50".to_string();

    let t0 = 1_000_000;
    check_alarms(&vitals, AGE_MONTHS, &mut tracker, t0);
    let firings = check_alarms(&vitals, AGE_MONTHS, &mut tracker, t0 + 4_200);
    assert!(firings.iter().any(|firing| firing.kind == AlarmKind::Hypotension));
}
