//! Integration tests for the pipeline.
//!
//! These tests write small MovieLens-style files to a temp directory and run
//! the pipeline end to end: parsing, split, fit, top-N and formatting.

use engine::{AlsParams, Metric, Session};
use pipeline::{
    FitTarget, LookupMissPolicy, PipelineConfig, PipelineError, RecommendationPipeline,
};
use std::fs;
use std::path::PathBuf;

/// Temp directory holding movies.dat and ratings.dat, removed on drop
struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    fn new(name: &str, movies: &[u8], ratings: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "als-movie-rec-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("movies.dat"), movies).unwrap();
        fs::write(dir.join("ratings.dat"), ratings).unwrap();
        Self { dir }
    }

    fn config(&self, user_id: i32) -> PipelineConfig {
        PipelineConfig::new(user_id).with_data_dir(&self.dir)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.dir).ok();
    }
}

fn movies_dat() -> Vec<u8> {
    let mut out = Vec::new();
    for id in 1..=12i32 {
        let line = format!("{}::Film {} (199{})::Drama|Comedy\n", id, id, id % 10);
        out.extend_from_slice(line.as_bytes());
    }
    // Latin-1 title: 0xE9 is 'é'
    out.extend_from_slice(b"13::Am\xE9lie (2001)::Comedy|Romance\n");
    out
}

/// Eight users; users 1-4 like the low ids, users 5-8 the high ids
fn ratings_dat() -> String {
    let mut out = String::new();
    let mut ts = 978300000i64;
    for user in 1..=8i32 {
        for movie in 1..=13i32 {
            if (user * 7 + movie * 3) % 4 == 0 {
                continue;
            }
            let likes_low = user <= 4;
            let rating = match (likes_low, movie <= 6) {
                (true, true) | (false, false) => 5,
                _ => 1,
            };
            out.push_str(&format!("{}::{}::{}::{}\n", user, movie, rating, ts));
            ts += 1;
        }
    }
    out
}

fn session() -> Session {
    Session::builder()
        .app_name("integration-test")
        .num_threads(2)
        .build()
        .unwrap()
}

#[test]
fn test_end_to_end_recommendations() {
    let fixture = Fixture::new("end-to-end", &movies_dat(), &ratings_dat());
    let session = session();

    let pipeline = RecommendationPipeline::new(&session, fixture.config(1)).unwrap();
    let report = pipeline.run().unwrap();

    assert_eq!(report.recommendations.len(), 10);
    assert!(report
        .recommendations
        .windows(2)
        .all(|w| w[0].score >= w[1].score));

    let mut ids: Vec<_> = report.recommendations.iter().map(|r| r.movie_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10);

    let mut out = Vec::new();
    report.write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Recommendations for User: 1"));
    assert_eq!(lines.count(), 10);
}

#[test]
fn test_user_preferences_shape_ranking() {
    let fixture = Fixture::new("preferences", &movies_dat(), &ratings_dat());
    let session = session();
    let config = fixture
        .config(2)
        .with_top_n(3)
        .with_als(AlsParams::default().with_max_iter(10));

    let report = RecommendationPipeline::new(&session, config)
        .unwrap()
        .run()
        .unwrap();

    // User 2 rates movies 1-6 highly
    assert!(
        report.recommendations.iter().all(|r| r.movie_id <= 6),
        "{:?}",
        report.recommendations
    );
}

#[test]
fn test_latin1_title_is_printed() {
    let fixture = Fixture::new("latin1", &movies_dat(), &ratings_dat());
    let session = session();
    let config = fixture.config(5).with_top_n(13);

    let report = RecommendationPipeline::new(&session, config)
        .unwrap()
        .run()
        .unwrap();

    assert!(report.lines.iter().any(|l| l.starts_with("Amélie (2001) ")));
}

#[test]
fn test_same_inputs_same_output() {
    let fixture = Fixture::new("repeatable", &movies_dat(), &ratings_dat());
    let session = session();

    let first = RecommendationPipeline::new(&session, fixture.config(3))
        .unwrap()
        .run()
        .unwrap();
    let second = RecommendationPipeline::new(&session, fixture.config(3))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_unknown_user() {
    let fixture = Fixture::new("unknown-user", &movies_dat(), &ratings_dat());
    let session = session();

    let err = RecommendationPipeline::new(&session, fixture.config(999))
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoRecommendations { user_id: 999 }));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn test_negative_user_has_no_recommendations() {
    let fixture = Fixture::new("negative-user", &movies_dat(), &ratings_dat());
    let session = session();

    let err = RecommendationPipeline::new(&session, fixture.config(-1))
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoRecommendations { user_id: -1 }));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn test_missing_data_dir() {
    let session = session();
    let config = PipelineConfig::new(1).with_data_dir("/definitely/not/a/dataset");

    let err = RecommendationPipeline::new(&session, config)
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(err, PipelineError::DataNotFound(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_malformed_ratings() {
    let ratings = "1::1::5::978300760\n1::two::5::978300761\n";
    let fixture = Fixture::new("malformed", &movies_dat(), ratings);
    let session = session();

    let err = RecommendationPipeline::new(&session, fixture.config(1))
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(err, PipelineError::Data(_)));
    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_lookup_miss_policies() {
    // Titles only for movies 1-3
    let movies = b"1::One::Drama\n2::Two::Drama\n3::Three::Drama\n";
    let fixture = Fixture::new("lookup-miss", movies, &ratings_dat());
    let session = session();

    let err = RecommendationPipeline::new(&session, fixture.config(1))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, PipelineError::LookupMiss(_)));
    assert_eq!(err.exit_code(), 6);

    let placeholder = fixture
        .config(1)
        .with_lookup_miss_policy(LookupMissPolicy::Placeholder);
    let report = RecommendationPipeline::new(&session, placeholder)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.lines.len(), 10);
    assert!(report.lines.iter().any(|l| l.starts_with("<unknown movie ")));
}

#[test]
fn test_training_fit_with_evaluation() {
    let fixture = Fixture::new("evaluate", &movies_dat(), &ratings_dat());
    let session = session();
    let config = fixture
        .config(1)
        .with_fit_target(FitTarget::Training)
        .with_evaluation(Some(Metric::Rmse));

    let report = RecommendationPipeline::new(&session, config)
        .unwrap()
        .run()
        .unwrap();

    let (metric, rmse) = report.evaluation.unwrap();
    assert_eq!(metric, Metric::Rmse);
    assert!(rmse.is_finite() && rmse >= 0.0);

    let mut out = Vec::new();
    report.write_to(&mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("RMSE: "));
}
