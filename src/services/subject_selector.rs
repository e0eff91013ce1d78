use crate::{
    error::{AppError, AppResult},
    models::{SharedSubject, SubjectWeights},
};

/// Picks the subject present in both weight maps with the greatest combined
/// weight. Ties go to the lexicographically smallest subject name.
pub fn select_shared_subject(
    first: &SubjectWeights,
    second: &SubjectWeights,
) -> AppResult<SharedSubject> {
    let mut best: Option<SharedSubject> = None;

    // Ascending key order, so a later subject only wins with a strictly larger weight
    for (subject, weight) in first.iter() {
        let Some(other) = second.get(subject) else {
            continue;
        };
        let combined = weight + other;
        if best
            .as_ref()
            .map_or(true, |current| combined > current.combined_weight)
        {
            best = Some(SharedSubject {
                name: subject.to_string(),
                combined_weight: combined,
            });
        }
    }

    best.ok_or_else(|| {
        AppError::NotFound("No common subjects found between the users".to_string())
    })
}
