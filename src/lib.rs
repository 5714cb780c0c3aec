pub mod filter;
pub mod flow;
pub mod scoring;
pub mod server;
pub mod stats;
pub mod view;


pub use filter::{ScoringFilter, TeamSelection};
pub use flow::{
    aggregate, Cell, FlowAggregate, FlowDiagram, FlowError, FlowLink, FlowOptions, FlowRecord,
    LabelIndex, Record,
};
pub use scoring::{extract_scoring_flow, ScoringRow, ShotType};
pub use server::{create_router, run_server, ApiError, AppState, ServerConfig};
pub use stats::{PlayerStats, StatsError, StatsTable};
pub use view::{ScoringView, ViewCache};
