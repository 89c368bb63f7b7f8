// [libs/domain/physiology/src/lib.rs]

pub mod alarms;
pub mod rhythm;
pub mod rules;
pub mod triggers;
pub mod waveform;

pub use alarms::{check_alarms, AlarmFiring, AlarmKind, AlarmState, AlarmTracker};
pub use rhythm::{hypotension_floor, pals_band, synthesize_rhythm_label, PalsBand, RhythmAugmentation};
pub use rules::{run_rule_pass, RulePassOutcome};
pub use triggers::{
    run_trigger_pass, CharacterTrigger, FiredTrigger, SpeakingCharacter, TriggerHistory,
    TriggerHistoryEntry, TriggerPools,
};
pub use waveform::build_telemetry_waveform;
