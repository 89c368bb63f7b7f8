// [libs/domain/orders/src/parser.rs]
/*!
 * =================================================================
 * APARATO: FREE-TEXT ORDER PARSER (V10.0 - STATIC MATCHER TABLE)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: TEXTO LIBRE -> ORDEN ESTRUCTURADA CON CLARIFICACIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FIRST MATCH WINS: La tabla de matchers es una lista ORDENADA;
 *    gana el primer matcher cuyo pre-check pasa y cuyo algún regex
 *    coincide. El orden codifica la desambiguación clínica (la
 *    adenosina con "flush" se captura antes que el matcher de fluidos).
 * 2. PURE FUNCTION: 'parse_order' es una función pura String ->
 *    ParsedOrder; sin estado global, sin aleatoriedad.
 * 3. TYPED EXTRACTION: Cada extractor devuelve el struct tipado de su
 *    clase; ningún payload 'any' sobrevive esta frontera.
 *
 * # Mathematical Proof (Totality):
 * Toda entrada produce exactamente un ParsedOrder: o bien el primer
 * matcher coincidente, o bien la variante 'Unknown' con confianza
 * baja. El bucle de clarificación reduce monótonamente los huecos de
 * parámetros hasta que la orden es ejecutable.
 * =================================================================
 */

use crate::params::{
    AdenosineParams, CardioversionParams, FluidsParams, InotropeParams, IntubationParams,
    IvAccessParams, OrderParams, OxygenParams, SedationParams,
};
use codeblue_domain_models::extended::myocarditis::{FluidType, InductionAgent, InotropeDrug};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Clase de orden reconocida por el parser (tratamientos + diagnósticos).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParsedOrderKind {
    // --- TRATAMIENTOS ---
    Fluids,
    VagalManeuver,
    Adenosine,
    Cardioversion,
    Sedation,
    EpiDrip,
    EpiPush,
    Milrinone,
    Intubation,
    Hfnc,
    Oxygen,
    // --- ACCESOS, DIAGNÓSTICOS Y CONSULTAS ---
    IvAccess,
    Labs,
    Ecg,
    Echo,
    ChestXray,
    Abg,
    ConsultPicu,
    ConsultCardiology,
    ConsultEcmo,
    Monitor,
    DefibPads,
    // --- EXÁMENES ---
    CardiacExam,
    LungExam,
    GeneralExam,
    VitalsCheck,
    /// Ninguna gramática coincidió.
    Unknown,
}

/// Confianza del parse (alta cuando un matcher explícito coincidió).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

/// Orden estructurada transitoria producida por el parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedOrder {
    pub kind: ParsedOrderKind,
    pub confidence: Confidence,
    pub params: OrderParams,
    pub needs_clarification: bool,
    pub clarification_question: Option<String>,
    pub raw_text: String,
}

/// Registro estático de la tabla: (regexes, clase, extractor, clarificación, pre-check).
struct OrderMatcher {
    kind: ParsedOrderKind,
    patterns: &'static [&'static str],
    pre_check: Option<fn(&str) -> bool>,
    extractor: fn(&str) -> OrderParams,
    needs_clarification: Option<fn(&str, &OrderParams) -> Option<String>>,
}

struct CompiledMatcher {
    kind: ParsedOrderKind,
    regexes: Vec<Regex>,
    pre_check: Option<fn(&str) -> bool>,
    extractor: fn(&str) -> OrderParams,
    needs_clarification: Option<fn(&str, &OrderParams) -> Option<String>>,
}

fn no_params(_utterance: &str) -> OrderParams {
    OrderParams::None
}

/// Tabla maestra ORDENADA de matchers (la desambiguación vive aquí).
static MATCHER_TABLE: &[OrderMatcher] = &[
    // La intubación captura antes que sedación/oxígeno (contiene agentes).
    OrderMatcher {
        kind: ParsedOrderKind::Intubation,
        patterns: &[r"intubat", r"rapid sequence", r"\brsi\b", r"secure (the )?airway"],
        pre_check: None,
        extractor: extract_intubation,
        needs_clarification: Some(|_utterance, params| {
            if let OrderParams::Intubation(intubation) = params {
                if intubation.induction_agent.is_none() {
                    return Some("Which induction agent do you want — ketamine, etomidate, or propofol?".to_string());
                }
            }
            None
        }),
    },
    // Adenosina antes que fluidos: su "flush" no es un bolo.
    OrderMatcher {
        kind: ParsedOrderKind::Adenosine,
        patterns: &[r"adenosine"],
        pre_check: None,
        extractor: extract_adenosine,
        needs_clarification: Some(|_utterance, params| {
            if let OrderParams::Adenosine(adenosine) = params {
                if adenosine.dose_milligrams.is_none() {
                    return Some("What dose of adenosine — in milligrams?".to_string());
                }
            }
            None
        }),
    },
    OrderMatcher {
        kind: ParsedOrderKind::VagalManeuver,
        patterns: &[r"vagal", r"valsalva", r"ice (pack )?to the face", r"bear down", r"blow (through|into) (a|the) (straw|syringe)"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Cardioversion,
        patterns: &[r"cardiovert", r"cardioversion", r"synchronized shock", r"sync(ed)? shock", r"shock (her|him|the patient) at"],
        pre_check: None,
        extractor: extract_cardioversion,
        needs_clarification: Some(|_utterance, params| {
            if let OrderParams::Cardioversion(cardioversion) = params {
                if cardioversion.joules.is_none() {
                    return Some("How many joules for the cardioversion?".to_string());
                }
            }
            None
        }),
    },
    // Push-dose de epi antes que el drip (la frase contiene "epi").
    OrderMatcher {
        kind: ParsedOrderKind::EpiPush,
        patterns: &[r"push[- ]dose epi", r"epi push", r"code[- ]dose epi", r"draw up (some )?epi"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::EpiDrip,
        patterns: &[r"epi(nephrine)? (drip|infusion)", r"start epi(nephrine)? at", r"epi(nephrine)? \d+(\.\d+)? ?(mcg|mic)"],
        pre_check: None,
        extractor: |utterance| {
            OrderParams::Inotrope(InotropeParams {
                drug: InotropeDrug::Epi,
                dose_mcg_kg_min: extract_mcg_kg_min(utterance),
            })
        },
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Milrinone,
        patterns: &[r"milrinone"],
        pre_check: None,
        extractor: |utterance| {
            OrderParams::Inotrope(InotropeParams {
                drug: InotropeDrug::Milrinone,
                dose_mcg_kg_min: extract_mcg_kg_min(utterance),
            })
        },
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Sedation,
        patterns: &[r"sedat", r"midazolam", r"versed", r"give (her|him) something to relax"],
        pre_check: Some(|utterance| !utterance.contains("intubat")),
        extractor: extract_sedation,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Fluids,
        patterns: &[
            r"normal saline", r"\bns\b", r"lactated ringers", r"\blr\b", r"albumin",
            r"(fluid|saline) bolus", r"bolus", r"\d+ ?(ml|cc) ?(/|per) ?kg",
        ],
        pre_check: Some(|utterance| !utterance.contains("flush")),
        extractor: extract_fluids,
        needs_clarification: Some(|_utterance, params| {
            if let OrderParams::Fluids(fluids) = params {
                if fluids.ml_per_kg.is_none() && fluids.total_ml.is_none() {
                    return Some("How much volume — mL per kilo?".to_string());
                }
            }
            None
        }),
    },
    OrderMatcher {
        kind: ParsedOrderKind::Hfnc,
        patterns: &[r"high[- ]flow", r"\bhfnc\b", r"vapotherm"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Oxygen,
        patterns: &[r"oxygen", r"nasal cannula", r"non[- ]?rebreather", r"face ?mask", r"\bo2\b"],
        pre_check: None,
        extractor: extract_oxygen,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Abg,
        patterns: &[r"\babg\b", r"arterial blood gas"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Labs,
        patterns: &[r"\blabs?\b", r"\bcbc\b", r"\bbmp\b", r"chem ?(7|10|panel)", r"troponin", r"\bbnp\b", r"lactate", r"blood work", r"blood cultures?"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Ecg,
        patterns: &[r"\bekg\b", r"\becg\b", r"12[- ]lead", r"twelve[- ]lead"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Echo,
        patterns: &[r"echo(cardiogram)?", r"bedside (cardiac )?ultrasound", r"pocus"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::ChestXray,
        patterns: &[r"chest x[- ]?ray", r"\bcxr\b", r"chest film", r"portable chest"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::ConsultEcmo,
        patterns: &[r"ecmo"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::ConsultPicu,
        patterns: &[r"\bpicu\b", r"intensive care", r"critical care (consult|team)"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::ConsultCardiology,
        patterns: &[r"cardiolog"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    // Parches de desfibrilación antes que el monitor genérico.
    OrderMatcher {
        kind: ParsedOrderKind::DefibPads,
        patterns: &[r"defib(rillator)? pads", r"pads on", r"place (the )?pads"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::Monitor,
        patterns: &[r"monitor", r"telemetry", r"leads on", r"hook (her|him) up"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::IvAccess,
        patterns: &[r"\biv\b", r"intravenous", r"start a line", r"peripheral line", r"\bio\b access", r"intraosseous"],
        pre_check: None,
        extractor: extract_iv_access,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::CardiacExam,
        patterns: &[r"listen to (the |her |his )?heart", r"cardiac exam", r"heart sounds", r"auscultate (the )?heart"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::LungExam,
        patterns: &[r"listen to (the |her |his )?lungs", r"lung exam", r"breath sounds", r"auscultate (the )?lungs"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::GeneralExam,
        patterns: &[r"general exam", r"physical exam", r"assess (the )?patient", r"head to toe"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
    OrderMatcher {
        kind: ParsedOrderKind::VitalsCheck,
        patterns: &[r"vitals", r"vital signs", r"recheck (the )?(pressure|bp)", r"blood pressure check"],
        pre_check: None,
        extractor: no_params,
        needs_clarification: None,
    },
];

/// Tabla compilada una única vez por proceso.
static COMPILED_MATCHERS: Lazy<Vec<CompiledMatcher>> = Lazy::new(|| {
    MATCHER_TABLE
        .iter()
        .map(|matcher| CompiledMatcher {
            kind: matcher.kind,
            regexes: matcher
                .patterns
                .iter()
                .map(|pattern| Regex::new(pattern).expect("FATAL: order grammar malformed"))
                .collect(),
            pre_check: matcher.pre_check,
            extractor: matcher.extractor,
            needs_clarification: matcher.needs_clarification,
        })
        .collect()
});

/**
 * Analiza un enunciado de texto libre hacia una orden estructurada.
 * Función pura: minúsculas + trim, primer matcher gana.
 */
pub fn parse_order(raw_utterance: &str) -> ParsedOrder {
    let utterance = raw_utterance.trim().to_lowercase();

    for matcher in COMPILED_MATCHERS.iter() {
        if let Some(pre_check) = matcher.pre_check {
            if !pre_check(&utterance) {
                continue;
            }
        }
        if !matcher.regexes.iter().any(|regex| regex.is_match(&utterance)) {
            continue;
        }

        let params = (matcher.extractor)(&utterance);
        let clarification = matcher
            .needs_clarification
            .and_then(|check| check(&utterance, &params));

        return ParsedOrder {
            kind: matcher.kind,
            confidence: Confidence::High,
            needs_clarification: clarification.is_some(),
            clarification_question: clarification,
            params,
            raw_text: raw_utterance.trim().to_string(),
        };
    }

    ParsedOrder {
        kind: ParsedOrderKind::Unknown,
        confidence: Confidence::Low,
        params: OrderParams::None,
        needs_clarification: false,
        clarification_question: None,
        raw_text: raw_utterance.trim().to_string(),
    }
}

/// Separador de enunciados compuestos.
static SEGMENT_SPLITTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\band\b|,|\balso\b|\bthen\b|\bplus\b").expect("FATAL: splitter grammar"));

/**
 * Divide un enunciado compuesto y analiza cada segmento.
 * Devuelve únicamente los resultados con gramática reconocida.
 */
pub fn parse_multiple_orders(raw_utterance: &str) -> Vec<ParsedOrder> {
    SEGMENT_SPLITTER
        .split(&raw_utterance.to_lowercase())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(parse_order)
        .filter(|parsed| parsed.kind != ParsedOrderKind::Unknown)
        .collect()
}

/**
 * Analiza la respuesta a una pregunta de clarificación pendiente.
 * Devuelve parámetros parciales para fusionar con la orden en espera.
 */
pub fn parse_clarification_response(raw_text: &str, pending_kind: ParsedOrderKind) -> OrderParams {
    let text = raw_text.trim().to_lowercase();
    match pending_kind {
        ParsedOrderKind::Fluids => extract_fluids(&text),
        ParsedOrderKind::Adenosine => extract_adenosine(&text),
        ParsedOrderKind::Cardioversion => extract_cardioversion(&text),
        ParsedOrderKind::Intubation => extract_intubation(&text),
        _ => OrderParams::None,
    }
}

// --- EXTRACTORES DE PARÁMETROS NOMBRADOS ---

static ML_PER_KG_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:ml|cc)\s*(?:/|per)\s*(?:kg|kilo)").unwrap());
static TOTAL_ML_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:ml|cc)\b").unwrap());
static MILLIGRAMS_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:mg|milligrams?)").unwrap());
static MCG_KG_MIN_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:mcg|mics?|micrograms?)\s*/?\s*(?:kg|kilo)?\s*/?\s*(?:min|minute)?").unwrap());
static JOULES_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:j\b|joules?)").unwrap());
static PEEP_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"peep\s*(?:of\s*)?(\d+(?:\.\d+)?)").unwrap());
static FIO2_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"fio2\s*(?:of\s*)?(\d+(?:\.\d+)?)\s*%?").unwrap());
static GAUGE_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:gauge|g\b)").unwrap());
static RATE_MINUTES_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"over\s*(\d+(?:\.\d+)?)\s*min").unwrap());
static OXYGEN_FLOW_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:l|liters?)(?:\s*(?:/|per)\s*min)?").unwrap());

fn first_number(regex: &Regex, utterance: &str) -> Option<f64> {
    regex
        .captures(utterance)
        .and_then(|capture| capture.get(1))
        .and_then(|group| group.as_str().parse::<f64>().ok())
}

fn extract_fluids(utterance: &str) -> OrderParams {
    let ml_per_kg = first_number(&ML_PER_KG_GRAMMAR, utterance);
    // El volumen absoluto solo aplica cuando NO se dijo por kilo.
    let total_ml = if ml_per_kg.is_none() {
        first_number(&TOTAL_ML_GRAMMAR, utterance)
    } else {
        None
    };

    let fluid_type = if utterance.contains("lactated") || utterance.contains(" lr") {
        Some(FluidType::LactatedRingers)
    } else if utterance.contains("albumin") {
        Some(FluidType::Albumin)
    } else if utterance.contains("blood") {
        Some(FluidType::Blood)
    } else if utterance.contains("saline") || utterance.contains(" ns") || utterance.contains("bolus") {
        Some(FluidType::NormalSaline)
    } else {
        None
    };

    OrderParams::Fluids(FluidsParams {
        ml_per_kg,
        total_ml,
        fluid_type,
        rate_minutes: first_number(&RATE_MINUTES_GRAMMAR, utterance),
    })
}

fn extract_adenosine(utterance: &str) -> OrderParams {
    OrderParams::Adenosine(AdenosineParams {
        dose_milligrams: first_number(&MILLIGRAMS_GRAMMAR, utterance),
        rapid_push: utterance.contains("rapid") || utterance.contains("fast push") || utterance.contains("slam"),
        flush_requested: utterance.contains("flush"),
    })
}

fn extract_cardioversion(utterance: &str) -> OrderParams {
    let synchronized = if utterance.contains("unsync") || utterance.contains("defibrillate") {
        Some(false)
    } else if utterance.contains("sync") {
        Some(true)
    } else {
        None
    };

    OrderParams::Cardioversion(CardioversionParams {
        joules: first_number(&JOULES_GRAMMAR, utterance),
        synchronized,
    })
}

fn extract_intubation(utterance: &str) -> OrderParams {
    let induction_agent = if utterance.contains("ketamine") {
        Some(InductionAgent::Ketamine)
    } else if utterance.contains("propofol") {
        Some(InductionAgent::Propofol)
    } else if utterance.contains("etomidate") {
        Some(InductionAgent::Etomidate)
    } else {
        None
    };

    let fio2_fraction = first_number(&FIO2_GRAMMAR, utterance).map(|raw_value| {
        // "fio2 60" y "fio2 0.6" son la misma intención clínica.
        if raw_value > 1.0 { raw_value / 100.0 } else { raw_value }
    });

    OrderParams::Intubation(IntubationParams {
        induction_agent,
        peep_cm_h2o: first_number(&PEEP_GRAMMAR, utterance),
        fio2_fraction,
        pressor_ready: utterance.contains("pressor") || utterance.contains("epi ready"),
        push_dose_epi_drawn: utterance.contains("push-dose") || utterance.contains("push dose"),
    })
}

fn extract_oxygen(utterance: &str) -> OrderParams {
    let device = if utterance.contains("non-rebreather") || utterance.contains("nonrebreather") {
        Some("non-rebreather".to_string())
    } else if utterance.contains("nasal cannula") {
        Some("nasal cannula".to_string())
    } else if utterance.contains("mask") {
        Some("face mask".to_string())
    } else {
        None
    };

    OrderParams::Oxygen(OxygenParams {
        flow_liters_per_min: first_number(&OXYGEN_FLOW_GRAMMAR, utterance),
        device,
    })
}

fn extract_iv_access(utterance: &str) -> OrderParams {
    let location = ["antecubital", "forearm", "hand", "foot", "tibia"]
        .iter()
        .find(|site| utterance.contains(*site))
        .map(|site| site.to_string());

    OrderParams::IvAccess(IvAccessParams {
        gauge: first_number(&GAUGE_GRAMMAR, utterance).map(|gauge| gauge as u8),
        location,
    })
}

fn extract_sedation(utterance: &str) -> OrderParams {
    let agent = ["midazolam", "versed", "ketamine", "fentanyl"]
        .iter()
        .find(|candidate| utterance.contains(*candidate))
        .map(|candidate| candidate.to_string());

    OrderParams::Sedation(SedationParams { agent })
}

fn extract_mcg_kg_min(utterance: &str) -> Option<f64> {
    first_number(&MCG_KG_MIN_GRAMMAR, utterance)
}
