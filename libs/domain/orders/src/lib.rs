// [libs/domain/orders/src/lib.rs]

pub mod params;
pub mod parser;
pub mod safety;

pub use params::{
    AdenosineParams, CardioversionParams, FluidsParams, InotropeParams, IntubationParams,
    IvAccessParams, OrderParams, OxygenParams, SedationParams,
};
pub use parser::{
    parse_clarification_response, parse_multiple_orders, parse_order, Confidence, ParsedOrder,
    ParsedOrderKind,
};
pub use safety::{validate_myocarditis_order, MyocarditisOrderContext, SafetyAssessment};
