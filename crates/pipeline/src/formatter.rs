//! Turns ranked recommendations into output lines.

use crate::config::LookupMissPolicy;
use crate::error::FormatError;
use data_loader::{MovieTitles, UserId};
use engine::Recommendation;
use tracing::warn;

/// First line of the output
pub fn header(user_id: UserId) -> String {
    format!("Recommendations for User: {}", user_id)
}

/// One `"<title> <score>"` line per recommendation, in ranked order.
///
/// The score uses `f32`'s shortest round-trip formatting, so `4.7` prints as
/// `4.7`.
pub fn format_recommendations(
    recommendations: &[Recommendation],
    titles: &MovieTitles,
    policy: LookupMissPolicy,
) -> Result<Vec<String>, FormatError> {
    let mut lines = Vec::with_capacity(recommendations.len());

    for rec in recommendations {
        match titles.get(rec.movie_id) {
            Some(title) => lines.push(format!("{} {}", title, rec.score)),
            None => match policy {
                LookupMissPolicy::Fail => {
                    return Err(FormatError::MissingTitle {
                        movie_id: rec.movie_id,
                    });
                }
                LookupMissPolicy::Skip => {
                    warn!("Skipping movie {} with no title", rec.movie_id);
                }
                LookupMissPolicy::Placeholder => {
                    lines.push(format!("<unknown movie {}> {}", rec.movie_id, rec.score));
                }
            },
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles() -> MovieTitles {
        vec![(42, "Movie A".to_string()), (7, "Movie B".to_string())]
            .into_iter()
            .collect()
    }

    fn recs() -> Vec<Recommendation> {
        vec![Recommendation::new(42, 4.7), Recommendation::new(7, 3.2)]
    }

    #[test]
    fn test_header() {
        assert_eq!(header(1), "Recommendations for User: 1");
    }

    #[test]
    fn test_lines_in_ranked_order() {
        let lines = format_recommendations(&recs(), &titles(), LookupMissPolicy::Fail).unwrap();
        assert_eq!(lines, vec!["Movie A 4.7", "Movie B 3.2"]);
    }

    #[test]
    fn test_missing_title_fails_by_default() {
        let mut recs = recs();
        recs.push(Recommendation::new(99, 1.5));

        let err =
            format_recommendations(&recs, &titles(), LookupMissPolicy::default()).unwrap_err();
        assert_eq!(err, FormatError::MissingTitle { movie_id: 99 });
    }

    #[test]
    fn test_missing_title_skip_and_placeholder() {
        let recs = vec![
            Recommendation::new(99, 4.9),
            Recommendation::new(42, 4.7),
        ];

        let skipped = format_recommendations(&recs, &titles(), LookupMissPolicy::Skip).unwrap();
        assert_eq!(skipped, vec!["Movie A 4.7"]);

        let placeholder =
            format_recommendations(&recs, &titles(), LookupMissPolicy::Placeholder).unwrap();
        assert_eq!(placeholder, vec!["<unknown movie 99> 4.9", "Movie A 4.7"]);
    }

    #[test]
    fn test_empty_recommendations_format_to_nothing() {
        let lines = format_recommendations(&[], &titles(), LookupMissPolicy::Fail).unwrap();
        assert!(lines.is_empty());
    }
}
