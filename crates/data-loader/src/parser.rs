//! Parser for MovieLens data files.
//!
//! Handles the two `::`-separated files the recommender reads:
//! - movies.dat: movieId::title::genres (only the first two fields are used)
//! - ratings.dat: userId::movieId::rating::timestamp

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Field separator used by every MovieLens 1M file
pub const FIELD_SEPARATOR: &str = "::";

/// Read a file with ISO-8859-1 encoding (Latin-1)
///
/// The MovieLens dataset uses ISO-8859-1 encoding, not UTF-8. Every byte maps
/// directly to the Unicode code point of the same value, so decoding never
/// fails and no byte is lost.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|e| DataLoadError::from_open(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();

    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Pull the next `::` field off a line, or report which one is missing
fn next_field<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts.next().ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

/// Parse a numeric field, surrounding whitespace tolerated
fn parse_number<T>(value: &str, file: &str, line: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {} {:?}: {}", name, value, e),
    })
}

/// Parse the movies.dat file into a title lookup
///
/// Format: movieId::title::genres
///
/// The title is kept verbatim, nothing is trimmed from it. A line whose id
/// is not an integer fails the whole load.
pub fn parse_movie_titles(path: &Path) -> Result<MovieTitles> {
    let lines = read_lines_latin1(path)?;
    let titles = titles_from_lines(&file_label(path), lines.iter().map(String::as_str))?;
    debug!("Parsed {} titles from {}", titles.len(), path.display());
    Ok(titles)
}

pub(crate) fn titles_from_lines<'a>(
    file: &str,
    lines: impl Iterator<Item = &'a str>,
) -> Result<MovieTitles> {
    let mut titles = MovieTitles::new();

    for (idx, line) in lines.enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut parts = line.split(FIELD_SEPARATOR);
        let movie_id = next_field(&mut parts, file, line_no, "movieId")?;
        let title = next_field(&mut parts, file, line_no, "title")?;

        titles.insert(parse_number(movie_id, file, line_no, "movieId")?, title);
    }

    Ok(titles)
}

/// Parse the ratings.dat file
///
/// Format: userId::movieId::rating::timestamp
///
/// Each field is coerced to the schema type (i32, i32, i32, i64). A row that
/// fails coercion fails the load.
pub fn parse_ratings(path: &Path) -> Result<RatingsDataset> {
    let lines = read_lines_latin1(path)?;
    let dataset = ratings_from_lines(&file_label(path), lines.iter().map(String::as_str))?;
    debug!("Parsed {} ratings from {}", dataset.len(), path.display());
    Ok(dataset)
}

pub(crate) fn ratings_from_lines<'a>(
    file: &str,
    lines: impl Iterator<Item = &'a str>,
) -> Result<RatingsDataset> {
    let mut dataset = RatingsDataset::new();

    for (idx, line) in lines.enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut parts = line_trimmed.split(FIELD_SEPARATOR);
        let user_id = next_field(&mut parts, file, line_no, "userId")?;
        let movie_id = next_field(&mut parts, file, line_no, "movieId")?;
        let rating_value = next_field(&mut parts, file, line_no, "rating")?;
        let timestamp = next_field(&mut parts, file, line_no, "timestamp")?;

        dataset.push(Rating {
            user_id: parse_number(user_id, file, line_no, "userId")?,
            movie_id: parse_number(movie_id, file, line_no, "movieId")?,
            rating: parse_number(rating_value, file, line_no, "rating")?,
            timestamp: parse_number(timestamp, file, line_no, "timestamp")?,
        });
    }

    Ok(dataset)
}
