//! Movie records and the request shapes used to create and edit them.
//!
//! The store itself accepts any field values. `validate()` is for callers at
//! the boundary (the HTTP surface) that must not trust caller-supplied shape.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Release years accepted at the boundary.
pub const YEAR_RANGE: RangeInclusive<i32> = 1800..=9999;

/// A movie in the catalog. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: u64,
    pub name: String,
    pub genre: String,
    pub year: i32,
    pub image_url: String,
}

impl Movie {
    pub fn new(id: u64, input: MovieInput) -> Self {
        Self {
            id,
            name: input.name,
            genre: input.genre,
            year: input.year,
            image_url: input.image_url,
        }
    }

    /// Overwrite the fields present in `patch`. The id never changes.
    pub fn apply(&mut self, patch: MoviePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
    }
}

/// A movie record minus its id, as supplied on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInput {
    pub name: String,
    pub genre: String,
    pub year: i32,
    pub image_url: String,
}

impl MovieInput {
    pub fn new(
        name: impl Into<String>,
        genre: impl Into<String>,
        year: i32,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            genre: genre.into(),
            year,
            image_url: image_url.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_year(self.year)
    }
}

/// A partial edit: absent fields keep their previous values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl MoviePatch {
    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(year) = self.year {
            validate_year(year)?;
        }
        Ok(())
    }
}

impl From<MovieInput> for MoviePatch {
    fn from(input: MovieInput) -> Self {
        Self {
            name: Some(input.name),
            genre: Some(input.genre),
            year: Some(input.year),
            image_url: Some(input.image_url),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::Invalid("name must not be blank".into()));
    }
    Ok(())
}

fn validate_year(year: i32) -> Result<()> {
    if !YEAR_RANGE.contains(&year) {
        return Err(CatalogError::Invalid(format!(
            "year {} outside {}..={}",
            year,
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )));
    }
    Ok(())
}
