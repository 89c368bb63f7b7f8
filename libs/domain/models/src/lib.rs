// [libs/domain/models/src/lib.rs]

pub mod vitals;
pub mod state;
pub mod orders;
pub mod intents;
pub mod events;
pub mod rules;
pub mod extended;
pub mod wire;

pub use vitals::{BloodPressure, Vitals, VitalsDelta};
pub use state::{BudgetSnapshot, EkgRecord, ScenarioId, SimulationState, StatePatch, TelemetryFrame};
pub use orders::{Order, OrderKind, OrderResult, OrderStatus};
pub use intents::{IntentRequest, ToolIntent};
pub use events::{EventKind, SimEvent};
pub use rules::{
    ConditionLogic, PendingEffect, PhysiologyRule, Priority, RuleCondition, RuleEffect,
    RuleTriggerRecord,
};
pub use extended::svt::{AdenosineDose, CardioversionAttempt, ConversionMethod, SvtExtendedState, SvtPhase, SvtRhythm};
pub use extended::myocarditis::{
    AirwayIntervention, AirwayMethod, DiagnosticOrder, FluidBolus, FluidType, InductionAgent,
    InotropeDrug, InotropeInfusion, MyocarditisExtendedState, MyoPhase, PhysiologyFlags,
};
pub use extended::{ExtendedState, ScoringState, TimelineEvent};
pub use wire::{ClientRole, CommandType, InboundMessage, OutboundMessage, SimStatePayload, WireError};
