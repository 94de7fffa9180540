//! CsvFile - the flat file the catalog is loaded from and flushed to.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::MovieSink;
use crate::error::Result;
use crate::movie::Movie;

/// Column titles written as the first row of every flush.
pub const CSV_HEADER: [&str; 4] = ["Movie Name", "Genre", "Year of Release", "Link to Movie Image"];

/// Movies read from a CSV file, with ids `1..` in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub movies: Vec<Movie>,
    /// Rows rejected because they were short or had a non-numeric year.
    pub skipped: usize,
}

/// A CSV file holding `name,genre,year,imageUrl` rows under a header row.
///
/// Ids are not stored; they are regenerated from row order on load.
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file is an empty catalog.
    pub fn load(&self) -> Result<LoadReport> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no movie file yet, starting empty");
                return Ok(LoadReport::default());
            }
            Err(err) => return Err(err.into()),
        };

        let report = Self::read_from(file)?;
        info!(
            path = %self.path.display(),
            loaded = report.movies.len(),
            skipped = report.skipped,
            "movie file loaded"
        );
        Ok(report)
    }

    /// Parse CSV text. The first row is always treated as the header.
    pub fn read_from<R: Read>(reader: R) -> Result<LoadReport> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut report = LoadReport::default();
        let mut next_id = 1;

        for (index, row) in reader.records().enumerate() {
            // Line 1 is the header.
            let line = index + 2;
            let record = match row {
                Ok(record) => record,
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    warn!(line, error = %err, "skipping unreadable movie row");
                    report.skipped += 1;
                    continue;
                }
            };

            match parse_row(&record) {
                Some((name, genre, year, image_url)) => {
                    report.movies.push(Movie {
                        id: next_id,
                        name,
                        genre,
                        year,
                        image_url,
                    });
                    next_id += 1;
                }
                None => {
                    warn!(line, "skipping movie row with missing columns or non-numeric year");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// Write the header and one row per movie, in order.
    pub fn write_to<W: Write>(writer: W, movies: &[Movie]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(CSV_HEADER)?;
        for movie in movies {
            let year = movie.year.to_string();
            writer.write_record([
                movie.name.as_str(),
                movie.genre.as_str(),
                year.as_str(),
                movie.image_url.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write to a temporary sibling file and rename it over the target.
    fn write_atomic(&self, movies: &[Movie]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let tmp_path = self.temp_path();
        {
            let file = fs::File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            Self::write_to(&mut writer, movies)?;
            let file = writer.into_inner().map_err(|err| err.into_error())?;
            file.sync_all()?;
        }

        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        Ok(())
    }

    /// `movies.csv` stages as `movies.csv.tmp`, so the staging file never
    /// collides with the target whatever its extension.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl MovieSink for CsvFile {
    fn save(&self, movies: &[Movie]) -> Result<()> {
        self.write_atomic(movies)
    }
}

fn parse_row(record: &csv::StringRecord) -> Option<(String, String, i32, String)> {
    let name = record.get(0)?;
    let genre = record.get(1)?;
    let year = record.get(2)?.trim().parse::<i32>().ok()?;
    let image_url = record.get(3)?;
    Some((name.to_string(), genre.to_string(), year, image_url.to_string()))
}
