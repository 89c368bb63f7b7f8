// [apps/gateway/src/config.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY CONFIGURATION (V5.0 - ENV SEALED)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: CAPTURA TIPADA Y ÚNICA DEL ENTORNO DEL PROCESO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE CAPTURE: El entorno se lee UNA vez en el bootstrap y se
 *    congela en un struct inmutable compartido por Arc.
 * 2. PRODUCTION SUPPRESSION: Con APP_ENV=production las perillas de
 *    caos quedan forzadas a cero sin importar el entorno.
 * 3. FLOOR ENFORCEMENT: El latido tiene piso de 250 ms; valores
 *    menores del entorno se elevan en silencio.
 * =================================================================
 */

use codeblue_infra_store::StoreConfig;
use tracing::warn;

/// Piso sellado del intervalo de latido del escenario.
pub const HEARTBEAT_FLOOR_MS: u64 = 250;
/// Costo nominal por token del proveedor realtime (USD).
pub const DEFAULT_USD_PER_TOKEN: f64 = 0.00001;

/// Configuración inmutable del proceso Gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_port: u16,
    pub allow_insecure_voice_ws: bool,
    pub heartbeat_interval_ms: u64,
    pub command_cooldown_ms: i64,
    pub max_ws_payload_bytes: usize,
    pub soft_budget_usd: f64,
    pub hard_budget_usd: f64,
    pub usd_per_token: f64,
    pub realtime_model: String,
    pub openai_api_key: Option<String>,
    /// APP_ENV == "production".
    pub is_production: bool,
    /// Techo de clientes conectados por sesión.
    pub session_client_ceiling: usize,
    /// Gracia sin clientes antes de que el reaper recoja la sesión.
    pub session_grace_ms: i64,
    pub store: StoreConfig,
    /// Perillas de caos de pruebas (cero garantizado en producción).
    pub chaos_latency_ms: u64,
    pub chaos_drop_percentage: f64,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_string(key)
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_string(key)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

impl GatewayConfig {
    /**
     * Captura el entorno del proceso hacia la configuración sellada.
     *
     * Variables reconocidas: PORT, ALLOW_INSECURE_VOICE_WS,
     * SCENARIO_HEARTBEAT_MS, COMMAND_COOLDOWN_MS, MAX_WS_PAYLOAD_BYTES,
     * SOFT_BUDGET_USD, HARD_BUDGET_USD, USD_PER_TOKEN,
     * OPENAI_REALTIME_MODEL, OPENAI_API_KEY, APP_ENV,
     * SESSION_CLIENT_CEILING, SESSION_GRACE_MS, SIM_STORE_URL,
     * SIM_STORE_AUTH_TOKEN, SIM_STORE_EMULATOR_HOST, SIM_STORE_PROJECT_ID,
     * CHAOS_LATENCY_MS, CHAOS_DROP_PERCENTAGE.
     */
    pub fn from_env() -> Self {
        let is_production = env_string("APP_ENV")
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let allow_insecure_voice_ws = env_bool("ALLOW_INSECURE_VOICE_WS", false);
        if is_production && allow_insecure_voice_ws {
            warn!("🛡️ [CONFIG]: ALLOW_INSECURE_VOICE_WS ignored in production strata.");
        }

        let requested_heartbeat: u64 = env_parse("SCENARIO_HEARTBEAT_MS", 1_000);
        let heartbeat_interval_ms = requested_heartbeat.max(HEARTBEAT_FLOOR_MS);

        // En producción el caos de pruebas queda erradicado de raíz.
        let (chaos_latency_ms, chaos_drop_percentage) = if is_production {
            (0, 0.0)
        } else {
            (
                env_parse("CHAOS_LATENCY_MS", 0_u64),
                env_parse("CHAOS_DROP_PERCENTAGE", 0.0_f64),
            )
        };

        Self {
            listen_port: env_parse("PORT", 8080_u16),
            allow_insecure_voice_ws: allow_insecure_voice_ws && !is_production,
            heartbeat_interval_ms,
            command_cooldown_ms: env_parse("COMMAND_COOLDOWN_MS", 3_000_i64),
            max_ws_payload_bytes: env_parse("MAX_WS_PAYLOAD_BYTES", 262_144_usize),
            soft_budget_usd: env_parse("SOFT_BUDGET_USD", 1.0_f64),
            hard_budget_usd: env_parse("HARD_BUDGET_USD", 2.0_f64),
            usd_per_token: env_parse("USD_PER_TOKEN", DEFAULT_USD_PER_TOKEN),
            realtime_model: env_string("OPENAI_REALTIME_MODEL")
                .unwrap_or_else(|| "gpt-4o-realtime-preview".to_string()),
            openai_api_key: env_string("OPENAI_API_KEY"),
            is_production,
            session_client_ceiling: env_parse("SESSION_CLIENT_CEILING", 24_usize),
            session_grace_ms: env_parse("SESSION_GRACE_MS", 120_000_i64),
            store: StoreConfig {
                url: env_string("SIM_STORE_URL")
                    .unwrap_or_else(|| "file:codeblue-sessions.db".to_string()),
                auth_token: env_string("SIM_STORE_AUTH_TOKEN"),
                emulator_host: env_string("SIM_STORE_EMULATOR_HOST"),
                project_id: env_string("SIM_STORE_PROJECT_ID"),
            },
            chaos_latency_ms,
            chaos_drop_percentage,
        }
    }
}

/// Epoch milisegundos del reloj del proceso.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
