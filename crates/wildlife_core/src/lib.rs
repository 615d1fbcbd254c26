pub mod catalog;
pub mod coordinator;
pub mod domain;
pub mod failure;
pub mod ports;
pub mod regions;
pub mod risk;
pub mod session;

pub use catalog::{RiskGroup, WildlifeCatalog};
pub use coordinator::{RegionPhase, RegionQueryCoordinator, RegionView, SelectionOutcome};
pub use domain::{
    AnimalId, AnimalRecord, BearerToken, Credentials, DecodedToken, IssuedToken, NewAccount,
    RegionAnimals, RegionDescriptor, RegionId, UserSummary,
};
pub use failure::{Failure, FailureKind, Operation};
pub use ports::{
    AuthApi, PortError, PortResult, TokenDecoder, TokenStore, ValidationIssue, WildlifeApi,
};
pub use regions::RegionDirectory;
pub use risk::{RiskLevel, Tone};
pub use session::{SessionManager, SessionPhase, SessionSnapshot};
