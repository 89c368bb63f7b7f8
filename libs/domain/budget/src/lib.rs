// [libs/domain/budget/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COST GOVERNOR ENGINE (V2.1 - GOLD MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: GOBERNANZA FINANCIERA DEL ENLACE UPSTREAM
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TWO-TIER DEGRADATION: Límite blando -> 'throttled' (se continúa
 *    con moderación); límite duro -> 'fallback' (supresión total de
 *    voz upstream, solo líneas deterministas).
 * 2. LATCHED HARD LIMIT: Un límite duro disparado jamás se limpia en
 *    la vida del controlador; solo una instancia nueva lo restituye.
 * 3. CHAOS SUPPRESSION: Las perillas de caos de pruebas (latencia y
 *    descarte artificial) se fuerzan a cero en producción.
 *
 * # Mathematical Proof (Monotone Spend):
 * El estimado USD es monótono no-decreciente bajo 'add_usage'; los
 * umbrales se cruzan a lo sumo una vez cada uno, por lo que cada
 * callback se invoca exactamente una vez por disparo.
 * =================================================================
 */

use codeblue_domain_models::state::BudgetSnapshot;
use tracing::{info, warn};

/// Firma de los ganchos de notificación de umbral.
pub type LimitHook = Box<dyn Fn(&UsageLedger) + Send + Sync>;

/// Contadores acumulados de consumo upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageLedger {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub usd_estimate: f64,
}

/// Delta de uso reportado por el adaptador de voz.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageDelta {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Configuración inmutable del gobernador de costos.
pub struct CostGovernorConfig {
    pub usd_per_token: f64,
    pub soft_limit_usd: f64,
    pub hard_limit_usd: f64,
    /// Invocado una única vez al cruzar el límite blando.
    pub on_soft_limit: Option<LimitHook>,
    /// Invocado una única vez al cruzar el límite duro.
    pub on_hard_limit: Option<LimitHook>,
    /// Invocado al restituir manualmente el límite blando.
    pub on_soft_reset: Option<LimitHook>,
    /// Perillas de caos de pruebas (forzadas a cero en producción).
    pub chaos_latency_ms: u64,
    pub chaos_drop_percentage: f64,
}

impl CostGovernorConfig {
    /**
     * Sella la configuración para el entorno dado.
     * En producción, las perillas de caos se fuerzan a cero sin
     * importar lo que el entorno haya solicitado.
     */
    pub fn sealed_for_environment(mut self, is_production: bool) -> Self {
        if is_production {
            if self.chaos_latency_ms > 0 || self.chaos_drop_percentage > 0.0 {
                warn!("🛡️ [COST_GOVERNOR]: Chaos knobs suppressed for production strata.");
            }
            self.chaos_latency_ms = 0;
            self.chaos_drop_percentage = 0.0;
        }
        self
    }
}

/// Gobernador de costos por sesión (singleton mutable de la sesión).
pub struct CostGovernor {
    config: CostGovernorConfig,
    ledger: UsageLedger,
    soft_triggered: bool,
    hard_triggered: bool,
    throttled: bool,
    fallback: bool,
}

impl CostGovernor {
    pub fn new(config: CostGovernorConfig) -> Self {
        Self {
            config,
            ledger: UsageLedger::default(),
            soft_triggered: false,
            hard_triggered: false,
            throttled: false,
            fallback: false,
        }
    }

    /**
     * Acumula consumo y evalúa los umbrales en orden blando -> duro.
     * Cada umbral dispara su callback exactamente una vez.
     */
    pub fn add_usage(&mut self, delta: UsageDelta) {
        self.ledger.input_tokens += delta.input_tokens.unwrap_or(0);
        self.ledger.output_tokens += delta.output_tokens.unwrap_or(0);
        self.ledger.usd_estimate =
            (self.ledger.input_tokens + self.ledger.output_tokens) as f64 * self.config.usd_per_token;

        if self.ledger.usd_estimate >= self.config.soft_limit_usd && !self.soft_triggered {
            self.soft_triggered = true;
            self.throttled = true;
            info!(
                "💸 [COST_GOVERNOR]: Soft ceiling crossed at {:.4} USD. Throttle engaged.",
                self.ledger.usd_estimate
            );
            if let Some(hook) = &self.config.on_soft_limit {
                hook(&self.ledger);
            }
        }

        if self.ledger.usd_estimate >= self.config.hard_limit_usd && !self.hard_triggered {
            self.hard_triggered = true;
            self.fallback = true;
            warn!(
                "🚨 [COST_GOVERNOR]: HARD ceiling crossed at {:.4} USD. Fallback mode LATCHED.",
                self.ledger.usd_estimate
            );
            if let Some(hook) = &self.config.on_hard_limit {
                hook(&self.ledger);
            }
        }
    }

    /**
     * Restituye el estado 'throttled' SOLO si el límite duro no fue
     * alcanzado. Idempotente: llamadas repetidas no re-disparan nada.
     */
    pub fn reset_soft_limit(&mut self) {
        if self.hard_triggered {
            warn!("⛔ [COST_GOVERNOR]: Soft reset rejected. Hard limit remains latched.");
            return;
        }
        if self.throttled || self.soft_triggered {
            self.throttled = false;
            self.soft_triggered = false;
            info!("♻️ [COST_GOVERNOR]: Soft limit restored. Throttle released.");
            if let Some(hook) = &self.config.on_soft_reset {
                hook(&self.ledger);
            }
        }
    }

    /**
     * Cera los contadores y limpia el límite blando. El límite duro
     * disparado permanece sellado hasta construir un gobernador nuevo.
     */
    pub fn reset(&mut self) {
        self.ledger = UsageLedger::default();
        self.soft_triggered = false;
        self.throttled = false;
        // hard_triggered y fallback quedan sellados deliberadamente
    }

    pub fn is_hard_limit_hit(&self) -> bool {
        self.hard_triggered
    }

    pub fn is_throttled(&self) -> bool {
        self.throttled
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn ledger(&self) -> UsageLedger {
        self.ledger
    }

    /// Latencia artificial vigente (cero garantizado en producción).
    pub fn chaos_latency_ms(&self) -> u64 {
        self.config.chaos_latency_ms
    }

    /// Porcentaje de descarte artificial (cero en producción).
    pub fn chaos_drop_percentage(&self) -> f64 {
        self.config.chaos_drop_percentage
    }

    /// Snapshot del presupuesto para la trama 'sim_state'.
    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            usd_estimate: self.ledger.usd_estimate,
            soft_limit_usd: self.config.soft_limit_usd,
            hard_limit_usd: self.config.hard_limit_usd,
            throttled: self.throttled,
            fallback: self.fallback,
        }
    }
}
