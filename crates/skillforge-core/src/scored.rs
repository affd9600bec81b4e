//! Result type returned from retrieval.

use crate::skill::Skill;

/// Which component contributed to a [`ScoredSkill`]'s final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreProvenance {
    VectorOnly,
    GraphOnly,
    Hybrid,
}

/// A skill paired with a final score in `[0, 1]` and optional provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSkill {
    pub skill: Skill,
    pub score: f32,
    pub provenance: Option<ScoreProvenance>,
}

impl ScoredSkill {
    pub fn new(skill: Skill, score: f32) -> Self {
        Self {
            skill,
            score: score.clamp(0.0, 1.0),
            provenance: None,
        }
    }

    pub fn with_provenance(mut self, provenance: ScoreProvenance) -> Self {
        self.provenance = Some(provenance);
        self
    }
}
