//! ScanQuest Shared - Wire types for the HTTP surface
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, and uuid
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` in DTOs

pub mod requests;
pub mod responses;

pub use requests::{
    AddTeamsRequest, BlockInputRequest, CreateBlockRequest, CreateInstanceRequest,
    InstanceSettingsDto, LocationRequest, ReorderBlocksRequest, ResetTeamsRequest, ScanRequest,
    ScheduleInstanceRequest, StartPlayingRequest, UpdateBlockRequest,
};
pub use responses::{
    BlockResponse, BlockStateResponse, CheckInResponse, CheckOutResponse, ErrorResponse, FlashLevel,
    FlashMessageDto, GameStatusResponse, HistoryEntry, InstanceResponse, LocationResponse,
    LocationSummary, NextLocationsResponse, TeamResponse,
};
