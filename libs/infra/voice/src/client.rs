// [libs/infra/voice/src/client.rs]
/*!
 * =================================================================
 * APARATO: VOICE UPLINK CLIENT (V4.0 - TRIPLE TASK)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: TAREAS DE LECTURA/ESCRITURA DEL ENLACE REALTIME
 * =================================================================
 */

use codeblue_domain_models::intents::IntentRequest;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Endpoint nominal del proveedor realtime.
const REALTIME_ENDPOINT: &str = "wss://api.openai.com/v1/realtime";

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("[L3_VOICE_CONFIG_FAULT]: API_KEY_VOID")]
    MissingApiKey,

    #[error("[L3_VOICE_NET_FAULT]: UPLINK_HANDSHAKE_REJECTED -> {0}")]
    HandshakeFailure(String),

    #[error("[L3_VOICE_NET_FAULT]: UPLINK_SEVERED")]
    LinkSevered,
}

/// Coordenadas del enlace upstream.
#[derive(Debug, Clone)]
pub struct VoiceClientConfig {
    pub api_key: String,
    pub model: String,
    /// Override del endpoint (pruebas locales).
    pub endpoint_override: Option<String>,
}

/// Evento entregado por el canal único de la sesión.
#[derive(Debug, Clone)]
pub enum VoiceEvent {
    /// Ráfaga de audio sintetizado (base64) hacia los clientes.
    AudioOut { audio_base64: String },
    /// Delta de transcripción del personaje sintetizado.
    TranscriptDelta { text: String, is_final: bool },
    /// Intent propuesto vía tool-call (crudo, pendiente del Tool Gate).
    ToolIntent(IntentRequest),
    /// Consumo reportado por el proveedor al cerrar una respuesta.
    Usage { input_tokens: u64, output_tokens: u64 },
    /// El enlace upstream se cerró (activa fallback hasta reconexión).
    Disconnected,
}

/// Comandos internos hacia la tarea de escritura.
enum UplinkCommand {
    Frame(String),
    Close,
}

/// Cliente del enlace realtime de una sesión.
pub struct VoiceClient {
    command_sender: mpsc::UnboundedSender<UplinkCommand>,
}

impl VoiceClient {
    /**
     * Abre el enlace y arranca las tareas de lectura/escritura.
     * Devuelve el cliente y el canal único de eventos de la sesión.
     */
    pub async fn connect(
        config: VoiceClientConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<VoiceEvent>), VoiceError> {
        if config.api_key.trim().is_empty() {
            return Err(VoiceError::MissingApiKey);
        }

        let endpoint = config
            .endpoint_override
            .clone()
            .unwrap_or_else(|| format!("{}?model={}", REALTIME_ENDPOINT, config.model));

        let mut request = endpoint
            .clone()
            .into_client_request()
            .map_err(|fault| VoiceError::HandshakeFailure(fault.to_string()))?;

        let bearer_header = format!("Bearer {}", config.api_key)
            .parse()
            .map_err(|_| VoiceError::HandshakeFailure("authorization header malformed".into()))?;
        request.headers_mut().insert("Authorization", bearer_header);
        request.headers_mut().insert(
            "OpenAI-Beta",
            "realtime=v1".parse().expect("static header value"),
        );

        let (websocket_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|fault| VoiceError::HandshakeFailure(fault.to_string()))?;

        info!("⚡ [VOICE_UPLINK]: Realtime link established against [{}].", endpoint);

        let (mut socket_sender, mut socket_receiver) = websocket_stream.split();
        let (command_sender, mut command_receiver) = mpsc::unbounded_channel::<UplinkCommand>();
        let (event_sender, event_receiver) = mpsc::unbounded_channel::<VoiceEvent>();

        // --- TAREA DE ESCRITURA (Gateway -> Proveedor) ---
        tokio::spawn(async move {
            while let Some(command) = command_receiver.recv().await {
                match command {
                    UplinkCommand::Frame(payload) => {
                        if socket_sender.send(Message::Text(payload.into())).await.is_err() {
                            warn!("⚠️ [VOICE_UPLINK]: Frame delivery failed; writer retiring.");
                            break;
                        }
                    }
                    UplinkCommand::Close => {
                        let _ = socket_sender.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        // --- TAREA DE LECTURA (Proveedor -> Canal de la sesión) ---
        tokio::spawn(async move {
            while let Some(network_read_result) = socket_receiver.next().await {
                match network_read_result {
                    Ok(Message::Text(raw_frame)) => {
                        if let Some(event) = decode_provider_frame(raw_frame.as_ref()) {
                            if event_sender.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 [VOICE_UPLINK]: Close frame received from provider.");
                        break;
                    }
                    Err(physical_layer_fault) => {
                        error!("❌ [VOICE_UPLINK]: Network fault: {}", physical_layer_fault);
                        break;
                    }
                    _ => {}
                }
            }
            let _ = event_sender.send(VoiceEvent::Disconnected);
        });

        Ok((Self { command_sender }, event_receiver))
    }

    /// Encola una ráfaga de audio del equipo clínico hacia el proveedor.
    pub fn send_audio_chunk(&self, audio_base64: &str) {
        self.dispatch_frame(serde_json::json!({
            "type": "input_audio_buffer.append",
            "audio": audio_base64,
        }));
    }

    /// Sella el buffer de audio para que el proveedor responda.
    pub fn commit_audio(&self) {
        self.dispatch_frame(serde_json::json!({ "type": "input_audio_buffer.commit" }));
    }

    /// Cancela la respuesta en vuelo (mando 'end_turn' del presentador).
    pub fn cancel_response(&self) {
        self.dispatch_frame(serde_json::json!({ "type": "response.cancel" }));
    }

    /// Cierra el enlace de forma ordenada.
    pub fn close(&self) {
        let _ = self.command_sender.send(UplinkCommand::Close);
    }

    fn dispatch_frame(&self, frame: serde_json::Value) {
        if self.command_sender.send(UplinkCommand::Frame(frame.to_string())).is_err() {
            warn!("⚠️ [VOICE_UPLINK]: Command dropped; writer task already retired.");
        }
    }
}

/// Decodifica una trama del proveedor hacia el evento de la sesión.
fn decode_provider_frame(raw_frame: &str) -> Option<VoiceEvent> {
    let frame: serde_json::Value = serde_json::from_str(raw_frame).ok()?;

    match frame["type"].as_str()? {
        "response.audio.delta" => frame["delta"].as_str().map(|delta| VoiceEvent::AudioOut {
            audio_base64: delta.to_string(),
        }),
        "response.audio_transcript.delta" => frame["delta"].as_str().map(|delta| {
            VoiceEvent::TranscriptDelta { text: delta.to_string(), is_final: false }
        }),
        "response.audio_transcript.done" => frame["transcript"].as_str().map(|transcript| {
            VoiceEvent::TranscriptDelta { text: transcript.to_string(), is_final: true }
        }),
        "response.function_call_arguments.done" => {
            let tool_name = frame["name"].as_str().unwrap_or_default().to_string();
            let mut intent_request: IntentRequest = frame["arguments"]
                .as_str()
                .and_then(|arguments| serde_json::from_str(arguments).ok())
                .unwrap_or_default();
            if intent_request.intent_type.is_empty() {
                intent_request.intent_type = tool_name;
            }
            Some(VoiceEvent::ToolIntent(intent_request))
        }
        "response.done" => {
            let usage = &frame["response"]["usage"];
            Some(VoiceEvent::Usage {
                input_tokens: usage["input_tokens"].as_u64().unwrap_or(0),
                output_tokens: usage["output_tokens"].as_u64().unwrap_or(0),
            })
        }
        "error" => {
            warn!("⚠️ [VOICE_UPLINK]: Provider error frame: {}", frame["error"]);
            None
        }
        _ => None,
    }
}
