//! Speech synthesis system

pub mod backends;
pub mod cache;
pub mod engine;
pub mod mp3;
pub mod player;
pub mod registry;
pub mod token;

pub use cache::{CacheKey, SynthesisCache};
pub use engine::{Engine, EngineContext, RenderedAudio, SpeakOutcome};
pub use mp3::{normalize, Mp3Output};
pub use player::{AudioPlayer, CommandPlayer, Playback};
pub use registry::{default_registry, EngineDescriptor, EngineRegistry};
pub use token::{CredentialRecord, TokenManager};
