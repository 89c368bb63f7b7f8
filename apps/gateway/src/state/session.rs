// [apps/gateway/src/state/session.rs]
/*!
 * =================================================================
 * APARATO: SESSION RUNTIME (V11.0 - LOCK SOVEREIGN)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ESTADO VIVO DE UNA SESIÓN Y SUS PRIMITIVAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LOCK SOVEREIGNTY: Toda mutación del núcleo de simulación pasa
 *    por el Mutex asíncrono de la sesión. El latido usa 'try_lock'
 *    (tick oportunista); los tratamientos esperan su turno.
 * 2. FIFO PER CLIENT: Cada handle tiene su canal mpsc sin tope; el
 *    orden de envío por cliente queda garantizado, sin orden global.
 * 3. BEST-EFFORT BROADCAST: Un handle roto se marca y se recoge en
 *    la siguiente iteración; el resto de la sala sigue recibiendo.
 *
 * # Mathematical Proof (Serialized Mutation):
 * Con un único Mutex por sesión, dos mutaciones del estado jamás
 * están en vuelo en el mismo instante de pared; los ticks perdidos
 * por 'try_lock' se recuperan vía 'last_tick_ms'.
 * =================================================================
 */

use crate::config::now_ms;
use crate::sim::SimCore;
use codeblue_domain_budget::CostGovernor;
use codeblue_domain_models::wire::{render_outbound, ClientRole, CommandType, OutboundMessage};
use codeblue_domain_policy::ToolGate;
use codeblue_infra_voice::VoiceClient;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex as StdMutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

/// Handle vivo de un cliente conectado a la sesión.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub user_id: String,
    pub role: ClientRole,
    pub display_name: Option<String>,
    pub character: Option<String>,
    /// Identidad de ESTA conexión (un re-join la reemplaza).
    pub connection_id: u64,
    /// Cola FIFO de salida de este cliente (enqueue, jamás bloquea).
    pub sender: mpsc::UnboundedSender<String>,
}

impl ClientHandle {
    /// Encola una trama; devuelve false si el enlace está roto.
    pub fn send(&self, message: &OutboundMessage) -> bool {
        self.sender.send(render_outbound(message)).is_ok()
    }
}

/// Estado vivo de una sesión de simulación.
pub struct SessionRuntime {
    pub session_id: String,
    /// Clientes conectados por user id (registro interno propio).
    clients: RwLock<HashMap<String, ClientHandle>>,
    /// Núcleo de simulación bajo el cerrojo soberano de la sesión.
    pub sim: AsyncMutex<SimCore>,
    /// Gobernador de costos (singleton mutable de la sesión).
    pub cost: StdMutex<CostGovernor>,
    /// Autoridad de admisión de intents.
    pub gate: StdMutex<ToolGate>,
    /// Enlace de voz upstream (None = fallback determinista).
    pub voice: StdMutex<Option<VoiceClient>>,
    /// Escenario congelado por el presentador.
    pub frozen: AtomicBool,
    /// Epoch ms de congelamiento (para el corrimiento de relojes).
    pub frozen_at: StdMutex<Option<i64>>,
    /// Usuarios silenciados por el presentador.
    pub muted_users: RwLock<HashSet<String>>,
    /// Último despacho por tipo de comando (cooldown de mando).
    pub command_seen_at: StdMutex<HashMap<CommandType, i64>>,
    /// Desde cuándo la sesión está sin clientes (gracia del reaper).
    pub empty_since: StdMutex<Option<i64>>,
    /// Tarea de latido de la sesión (abortada en el teardown).
    pub heartbeat_handle: StdMutex<Option<tokio::task::JoinHandle<()>>>,
    /// Tarea de drenaje de eventos de voz.
    pub voice_pump_handle: StdMutex<Option<tokio::task::JoinHandle<()>>>,
}

impl std::fmt::Debug for SessionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRuntime")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl SessionRuntime {
    pub fn new(session_id: String, sim: SimCore, cost: CostGovernor) -> Self {
        Self {
            session_id,
            clients: RwLock::new(HashMap::new()),
            sim: AsyncMutex::new(sim),
            cost: StdMutex::new(cost),
            gate: StdMutex::new(ToolGate::new()),
            voice: StdMutex::new(None),
            frozen: AtomicBool::new(false),
            frozen_at: StdMutex::new(None),
            muted_users: RwLock::new(HashSet::new()),
            command_seen_at: StdMutex::new(HashMap::new()),
            empty_since: StdMutex::new(Some(now_ms())),
            heartbeat_handle: StdMutex::new(None),
            voice_pump_handle: StdMutex::new(None),
        }
    }

    // --- GESTIÓN DE HANDLES ---

    /**
     * Instala (o reemplaza) el handle de un usuario. El handle previo
     * del mismo usuario se despide con una razón explicativa.
     */
    pub fn attach_client(&self, handle: ClientHandle) {
        let mut clients_guard = self.clients.write().expect("Session clients lock poisoned");

        if let Some(previous_handle) = clients_guard.insert(handle.user_id.clone(), handle) {
            previous_handle.send(&OutboundMessage::Error {
                message: "Connection replaced by a newer join from the same user.".to_string(),
            });
            debug!(
                "♻️ [SESSION]: Prior handle for user {} replaced (idempotent join).",
                previous_handle.user_id
            );
        }

        *self.empty_since.lock().expect("empty_since poisoned") = None;
    }

    /**
     * Retira el handle de un usuario SOLO si la conexión coincide
     * (un re-join ya pudo haberlo reemplazado).
     */
    pub fn detach_client(&self, user_id: &str, connection_id: u64) {
        let mut clients_guard = self.clients.write().expect("Session clients lock poisoned");

        let matches_connection = clients_guard
            .get(user_id)
            .map(|handle| handle.connection_id == connection_id)
            .unwrap_or(false);

        if matches_connection {
            clients_guard.remove(user_id);
        }

        if clients_guard.is_empty() {
            *self.empty_since.lock().expect("empty_since poisoned") = Some(now_ms());
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().expect("Session clients lock poisoned").len()
    }

    pub fn client_role(&self, user_id: &str) -> Option<ClientRole> {
        self.clients
            .read()
            .expect("Session clients lock poisoned")
            .get(user_id)
            .map(|handle| handle.role)
    }

    // --- PRIMITIVAS DE DIFUSIÓN (BEST-EFFORT) ---

    /// Difunde a todos los clientes; los enlaces rotos se recogen.
    pub fn broadcast(&self, message: &OutboundMessage) {
        self.broadcast_filtered(message, |_handle| true);
    }

    /// Difunde únicamente a los presentadores de la sesión.
    pub fn broadcast_to_presenters(&self, message: &OutboundMessage) {
        self.broadcast_filtered(message, |handle| handle.role == ClientRole::Presenter);
    }

    /// Envía a un único cliente por user id.
    pub fn send_to_user(&self, user_id: &str, message: &OutboundMessage) {
        let broken = {
            let clients_guard = self.clients.read().expect("Session clients lock poisoned");
            match clients_guard.get(user_id) {
                Some(handle) => !handle.send(message),
                None => false,
            }
        };
        if broken {
            self.reap_broken(&[user_id.to_string()]);
        }
    }

    fn broadcast_filtered(&self, message: &OutboundMessage, filter: impl Fn(&ClientHandle) -> bool) {
        let broken_user_ids: Vec<String> = {
            let clients_guard = self.clients.read().expect("Session clients lock poisoned");
            clients_guard
                .values()
                .filter(|handle| filter(handle))
                .filter(|handle| !handle.send(message))
                .map(|handle| handle.user_id.clone())
                .collect()
        };

        if !broken_user_ids.is_empty() {
            self.reap_broken(&broken_user_ids);
        }
    }

    /// Recoge los handles marcados como rotos (siguiente iteración).
    fn reap_broken(&self, user_ids: &[String]) {
        let mut clients_guard = self.clients.write().expect("Session clients lock poisoned");
        for user_id in user_ids {
            clients_guard.remove(user_id);
            warn!("🧹 [SESSION]: Broken handle reaped for user {}.", user_id);
        }
        if clients_guard.is_empty() {
            *self.empty_since.lock().expect("empty_since poisoned") = Some(now_ms());
        }
    }

    // --- CONGELAMIENTO DEL ESCENARIO ---

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
        *self.frozen_at.lock().expect("frozen_at poisoned") = Some(now_ms());
    }

    /**
     * Descongela corriendo los relojes del núcleo por la duración de
     * la pausa, para que la deriva y las reglas no "salten".
     */
    pub async fn unfreeze(&self) {
        let frozen_duration = {
            let mut frozen_at_guard = self.frozen_at.lock().expect("frozen_at poisoned");
            frozen_at_guard.take().map(|frozen_at| now_ms() - frozen_at)
        };

        if let Some(duration) = frozen_duration {
            let mut sim = self.sim.lock().await;
            sim.state.last_tick_ms += duration;
            sim.state.stage_entered_at += duration;
            if let Some(extended) = sim.state.extended.as_mut() {
                match extended {
                    codeblue_domain_models::ExtendedState::Svt(state) => {
                        state.phase_entered_at += duration;
                    }
                    codeblue_domain_models::ExtendedState::Myocarditis(state) => {
                        state.phase_entered_at += duration;
                    }
                }
            }
        }

        self.frozen.store(false, Ordering::Release);
    }

    // --- COOLDOWN DE COMANDOS DE PRESENTADOR ---

    /// Admite el comando si su ventana de cooldown ya venció.
    pub fn command_admitted(&self, command: CommandType, cooldown_ms: i64) -> bool {
        let mut seen_guard = self.command_seen_at.lock().expect("command_seen_at poisoned");
        let now = now_ms();
        match seen_guard.get(&command) {
            Some(last_seen) if now - last_seen < cooldown_ms => false,
            _ => {
                seen_guard.insert(command, now);
                true
            }
        }
    }

    /// Verdadero cuando el reaper puede recoger la sesión.
    pub async fn is_collectable(&self, grace_ms: i64) -> bool {
        if self.client_count() > 0 {
            return false;
        }
        let empty_since = *self.empty_since.lock().expect("empty_since poisoned");
        let Some(empty_since_ts) = empty_since else { return false };
        if now_ms() - empty_since_ts < grace_ms {
            return false;
        }
        // Trabajo programado pendiente impide la recolección.
        let sim = self.sim.lock().await;
        sim.pending_orders.is_empty()
    }

    /// Teardown ordenado: aborta daemons y cierra el enlace de voz.
    pub fn teardown(&self) {
        if let Some(handle) = self.heartbeat_handle.lock().expect("heartbeat poisoned").take() {
            handle.abort();
        }
        if let Some(handle) = self.voice_pump_handle.lock().expect("voice pump poisoned").take() {
            handle.abort();
        }
        if let Some(voice) = self.voice.lock().expect("voice poisoned").take() {
            voice.close();
        }
    }
}
