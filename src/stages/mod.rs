pub mod stage1_segment_splitter;
pub mod stage2_explicit_attribution;
pub mod stage3_turn_taking;
pub mod stage4_character_registry;
pub mod stage5_pause_timing;
pub mod stage6_validation;
pub mod stage7_ai_attribution;
pub mod stage8_emotion_classifier;

pub use stage1_segment_splitter::{execute_stage1, Stage1Config, Stage1Result};
pub use stage2_explicit_attribution::{execute_stage2, Stage2Result};
pub use stage3_turn_taking::{execute_stage3, Stage3Result};
pub use stage4_character_registry::execute_stage4;
pub use stage5_pause_timing::execute_stage5;
pub use stage6_validation::{execute_stage6, PositionalMismatch, ValidationReport};
pub use stage7_ai_attribution::{execute_stage7, Stage7Config, Stage7Result};
pub use stage8_emotion_classifier::{execute_stage8, Stage8Config, Stage8Result};
