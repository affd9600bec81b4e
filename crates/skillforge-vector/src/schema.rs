//! Arrow schema and record batch (de)serialization for the skill table.
//!
//! Per spec.md §4.4 the stored metadata map must carry at minimum
//! `{skill_id, name, category, tags, repo_id, updated_at}`; we additionally
//! store the full skill as JSON (`skill_json`) so a query can return a
//! complete [`Skill`] without re-reading the source repository, and the
//! embeddable `text` itself so re-embedding never requires a filesystem
//! pass (spec.md §4.4: "reindexing the embedder does not require
//! re-reading source files").

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use skillforge_core::Skill;

use crate::error::VectorError;

pub const COL_ID: &str = "id";
pub const COL_TEXT: &str = "text";
pub const COL_VECTOR: &str = "vector";
pub const COL_NAME: &str = "name";
pub const COL_CATEGORY: &str = "category";
pub const COL_TAGS: &str = "tags";
pub const COL_REPO_ID: &str = "repo_id";
pub const COL_UPDATED_AT: &str = "updated_at";
pub const COL_SKILL_JSON: &str = "skill_json";
pub const COL_DISTANCE: &str = "_distance";

pub fn build_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(COL_ID, DataType::Utf8, false),
        Field::new(COL_TEXT, DataType::Utf8, false),
        Field::new(
            COL_VECTOR,
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension as i32),
            false,
        ),
        Field::new(COL_NAME, DataType::Utf8, false),
        Field::new(COL_CATEGORY, DataType::Utf8, false),
        Field::new(COL_TAGS, DataType::Utf8, false),
        Field::new(COL_REPO_ID, DataType::Utf8, false),
        Field::new(COL_UPDATED_AT, DataType::Utf8, true),
        Field::new(COL_SKILL_JSON, DataType::Utf8, false),
    ]))
}

/// Build a single-row record batch for one (skill, text, vector) triple.
/// Upserts in this store are one skill at a time (spec.md §4.4's contract
/// is `index(skill)` on a single record), so batching many rows together
/// isn't needed.
pub fn skill_to_batch(
    skill: &Skill,
    text: &str,
    vector: &[f32],
    schema: Arc<Schema>,
) -> Result<RecordBatch, VectorError> {
    let dimension = vector.len();
    let values = Arc::new(Float32Array::from(vector.to_vec()));
    let list_field = Arc::new(Field::new("item", DataType::Float32, true));
    let vector_array = FixedSizeListArray::new(list_field, dimension as i32, values, None);

    let updated_at = skill.updated_at.map(|dt| dt.to_rfc3339());
    let skill_json = serde_json::to_string(skill)
        .map_err(|e| VectorError::Backend(format!("failed to serialize skill: {e}")))?;

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![skill.id.as_str().to_string()])),
            Arc::new(StringArray::from(vec![text.to_string()])),
            Arc::new(vector_array) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![skill.name.clone()])),
            Arc::new(StringArray::from(vec![skill.category.as_str().to_string()])),
            Arc::new(StringArray::from(vec![skill.tags_delimited()])),
            Arc::new(StringArray::from(vec![skill.repo_id.as_str().to_string()])),
            Arc::new(StringArray::from(vec![updated_at])),
            Arc::new(StringArray::from(vec![skill_json])),
        ],
    )
    .map_err(|e| VectorError::Backend(format!("failed to build record batch: {e}")))
}

/// A single decoded row: the reconstructed skill, its raw distance (as
/// reported by the backend, smaller is more similar), and the similarity
/// already mapped into `[0, 1]` per spec.md §4.4's `(1 + cos) / 2` rule.
pub struct DecodedHit {
    pub skill: Skill,
    pub similarity: f32,
}

/// LanceDB reports cosine *distance* (`1 - cosine_similarity`) in
/// `_distance` when the query is run with `DistanceType::Cosine`. Spec.md
/// §4.4 wants similarity mapped as `(1 + cos) / 2`; substituting
/// `cos = 1 - distance` gives `1 - distance / 2`.
pub fn distance_to_similarity(distance: f32) -> f32 {
    (1.0 - distance / 2.0).clamp(0.0, 1.0)
}

pub fn decode_batch(batch: &RecordBatch) -> Result<Vec<DecodedHit>, VectorError> {
    let skill_json_col = batch
        .column_by_name(COL_SKILL_JSON)
        .and_then(|c| c.as_string_opt::<i32>())
        .ok_or_else(|| VectorError::Backend(format!("{COL_SKILL_JSON} column missing or wrong type")))?;
    let distance_col = batch.column_by_name(COL_DISTANCE).and_then(|c| c.as_primitive_opt::<Float32Type>());

    let mut hits = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let raw = skill_json_col.value(i);
        let skill: Skill = serde_json::from_str(raw)
            .map_err(|e| VectorError::CorruptRecord("<unknown>".into(), e.to_string()))?;
        let distance = distance_col.map(|c| c.value(i)).unwrap_or(0.0);
        hits.push(DecodedHit {
            skill,
            similarity: distance_to_similarity(distance),
        });
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_zero_is_perfect_similarity() {
        assert_eq!(distance_to_similarity(0.0), 1.0);
    }

    #[test]
    fn distance_two_is_zero_similarity() {
        assert_eq!(distance_to_similarity(2.0), 0.0);
    }

    #[test]
    fn distance_one_is_half_similarity() {
        assert!((distance_to_similarity(1.0) - 0.5).abs() < f32::EPSILON);
    }
}
