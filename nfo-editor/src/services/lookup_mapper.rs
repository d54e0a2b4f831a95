//! Catalog detail → Record mapping
//!
//! Pure conversion of TMDB-shaped detail payloads (movie, TV show, episode)
//! into records. Fetching the payloads is the caller's job.

use serde::Deserialize;

use crate::models::{Actor, Kind, Record};

pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Full-size images
pub const ORIGINAL_SIZE: &str = "original";

/// Cast thumbnails
pub const PROFILE_SIZE: &str = "w200";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamedEntry {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CastEntry {
    pub name: Option<String>,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrewEntry {
    pub name: Option<String>,
    pub job: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credits {
    pub cast: Vec<CastEntry>,
    pub crew: Vec<CrewEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MovieDetails {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub runtime: Option<i64>,
    pub vote_average: Option<f64>,
    pub genres: Vec<NamedEntry>,
    pub production_companies: Vec<NamedEntry>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub credits: Credits,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TvShowDetails {
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub episode_run_time: Vec<i64>,
    pub vote_average: Option<f64>,
    pub genres: Vec<NamedEntry>,
    pub production_companies: Vec<NamedEntry>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub credits: Credits,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EpisodeDetails {
    pub name: Option<String>,
    pub air_date: Option<String>,
    pub overview: Option<String>,
    pub runtime: Option<i64>,
    pub vote_average: Option<f64>,
    pub still_path: Option<String>,
    pub season_number: Option<i64>,
    pub episode_number: Option<i64>,
    pub credits: Credits,
}

/// `<base>/<size><path>`, empty when there is no path
pub fn image_url(path: Option<&str>, size: &str) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{}/{}{}", IMAGE_BASE_URL, size, p),
        _ => String::new(),
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn year_of(date: &Option<String>) -> String {
    date.as_deref()
        .and_then(|d| d.split('-').next())
        .unwrap_or_default()
        .to_string()
}

fn runtime_of(minutes: Option<i64>) -> String {
    match minutes {
        Some(m) if m != 0 => m.to_string(),
        _ => String::new(),
    }
}

fn rating_of(vote: Option<f64>) -> String {
    match vote {
        Some(v) if v != 0.0 => format!("{:.1}", v),
        _ => String::new(),
    }
}

fn names(entries: &[NamedEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|e| e.name.clone())
        .filter(|n| !n.is_empty())
        .collect()
}

fn directors(crew: &[CrewEntry]) -> Vec<String> {
    crew.iter()
        .filter(|c| c.job.as_deref() == Some("Director"))
        .filter_map(|c| c.name.clone())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Cast with names; `order` is the position in the source list
fn cast(entries: &[CastEntry]) -> Vec<Actor> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let name = c.name.clone().filter(|n| !n.is_empty())?;
            Some(Actor {
                name,
                role: text(&c.character),
                thumb: image_url(c.profile_path.as_deref(), PROFILE_SIZE),
                order: i as i64,
            })
        })
        .collect()
}

fn studio(companies: &[NamedEntry]) -> String {
    companies
        .first()
        .and_then(|c| c.name.clone())
        .unwrap_or_default()
}

pub fn map_movie(details: &MovieDetails) -> Record {
    Record {
        kind: Kind::Movie,
        title: text(&details.title),
        original_title: text(&details.original_title),
        year: year_of(&details.release_date),
        plot: text(&details.overview),
        runtime: runtime_of(details.runtime),
        genres: names(&details.genres),
        directors: directors(&details.credits.crew),
        cast: cast(&details.credits.cast),
        studio: studio(&details.production_companies),
        rating: rating_of(details.vote_average),
        poster_path: image_url(details.poster_path.as_deref(), ORIGINAL_SIZE),
        fanart_path: image_url(details.backdrop_path.as_deref(), ORIGINAL_SIZE),
        aired: text(&details.release_date),
        ..Record::default()
    }
}

pub fn map_tv_show(details: &TvShowDetails) -> Record {
    Record {
        kind: Kind::TvShow,
        title: text(&details.name),
        original_title: text(&details.original_name),
        year: year_of(&details.first_air_date),
        plot: text(&details.overview),
        runtime: runtime_of(details.episode_run_time.first().copied()),
        genres: names(&details.genres),
        directors: directors(&details.credits.crew),
        cast: cast(&details.credits.cast),
        studio: studio(&details.production_companies),
        rating: rating_of(details.vote_average),
        poster_path: image_url(details.poster_path.as_deref(), ORIGINAL_SIZE),
        fanart_path: image_url(details.backdrop_path.as_deref(), ORIGINAL_SIZE),
        aired: text(&details.first_air_date),
        ..Record::default()
    }
}

/// Episodes carry no genres, studio or fanart of their own
pub fn map_episode(details: &EpisodeDetails) -> Record {
    Record {
        kind: Kind::Episode,
        title: text(&details.name),
        original_title: text(&details.name),
        year: year_of(&details.air_date),
        plot: text(&details.overview),
        runtime: runtime_of(details.runtime),
        directors: directors(&details.credits.crew),
        cast: cast(&details.credits.cast),
        rating: rating_of(details.vote_average),
        poster_path: image_url(details.still_path.as_deref(), ORIGINAL_SIZE),
        season: details.season_number.map(|n| n.to_string()).unwrap_or_default(),
        episode: details.episode_number.map(|n| n.to_string()).unwrap_or_default(),
        aired: text(&details.air_date),
        ..Record::default()
    }
}
