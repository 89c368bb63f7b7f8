// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V4.0 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DEL CONTRATO CLÍNICO
 *
 * # Mathematical Proof (Wire Parity):
 * La presión arterial viaja como String "SBP/DBP" y los vitales como
 * números planos. Cualquier deriva en los renames serde rompería los
 * consumidores del Dashboard; este aparato la detecta en compilación
 * continua.
 * =================================================================
 */
