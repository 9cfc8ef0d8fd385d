use std::fmt;
use std::fs::{self, File};
use std::path::Path;

use crate::data_model::agency::Agency;
use crate::data_model::calendar::CalendarRow;
use crate::data_model::calendar_dates::CalendarDate;
use crate::data_model::routes::{Route, RouteId};
use crate::data_model::shapes::ShapesRow;
use crate::data_model::stop_times::StopTime;
use crate::data_model::stops::{Stop, StopId};
use crate::data_model::transfers::TransfersRow;
use crate::data_model::trips::{Trip, TripId};
use crate::database::{read_csv_rows, write_csv_rows, InMemoryPrimaryKeyTable, PrimaryKeyTable};

/// A feed file that is read or written as part of a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFile {
    Agency,
    Calendar,
    CalendarDates,
    Routes,
    Shapes,
    Stops,
    StopTimes,
    Transfers,
    Trips,
}

impl FeedFile {
    fn name(self) -> &'static str {
        match self {
            Self::Agency => "agency.txt",
            Self::Calendar => "calendar.txt",
            Self::CalendarDates => "calendar_dates.txt",
            Self::Routes => "routes.txt",
            Self::Shapes => "shapes.txt",
            Self::Stops => "stops.txt",
            Self::StopTimes => "stop_times.txt",
            Self::Transfers => "transfers.txt",
            Self::Trips => "trips.txt",
        }
    }
}

#[derive(Debug)]
pub enum FeedError {
    MissingRequiredFile(FeedFile),
    Io { file: FeedFile, source: std::io::Error },
    Csv { file: FeedFile, source: Box<dyn std::error::Error> },
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredFile(file) => {
                write!(f, "required feed file {} is missing", file.name())
            }
            Self::Io { file, source } => {
                write!(f, "error reading/writing {}: {source}", file.name())
            }
            Self::Csv { file, source } => {
                write!(f, "error parsing {}: {source}", file.name())
            }
        }
    }
}

impl std::error::Error for FeedError {}

/// The in-memory representation of a GTFS feed directory, loaded once at
/// start-up and written once at the end of a conversion run.
pub struct Feed {
    pub agencies: Vec<Agency>,
    pub stops: InMemoryPrimaryKeyTable<StopId, Stop>,
    pub routes: InMemoryPrimaryKeyTable<RouteId, Route>,
    pub trips: InMemoryPrimaryKeyTable<TripId, Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendar: Vec<CalendarRow>,
    pub calendar_dates: Vec<CalendarDate>,
    pub transfers: Vec<TransfersRow>,
    pub shapes: Vec<ShapesRow>,
}

fn open(dir: &Path, file: FeedFile) -> Result<Option<File>, FeedError> {
    let path = dir.join(file.name());
    match File::open(&path) {
        Ok(f) => Ok(Some(f)),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FeedError::Io { file, source }),
    }
}

fn read_required<T: serde::de::DeserializeOwned>(
    dir: &Path,
    file: FeedFile,
) -> Result<Vec<T>, FeedError> {
    let reader = open(dir, file)?.ok_or(FeedError::MissingRequiredFile(file))?;
    read_csv_rows(reader).map_err(|source| FeedError::Csv { file, source })
}

fn read_optional<T: serde::de::DeserializeOwned>(
    dir: &Path,
    file: FeedFile,
) -> Result<Vec<T>, FeedError> {
    match open(dir, file)? {
        Some(reader) => read_csv_rows(reader).map_err(|source| FeedError::Csv { file, source }),
        None => Ok(Vec::new()),
    }
}

fn write_rows<T: serde::Serialize>(
    dir: &Path,
    file: FeedFile,
    rows: &[T],
) -> Result<(), FeedError> {
    if rows.is_empty() {
        return Ok(());
    }
    let path = dir.join(file.name());
    let writer = File::create(&path).map_err(|source| FeedError::Io { file, source })?;
    write_csv_rows(writer, rows).map_err(|source| FeedError::Csv { file, source })
}

impl Feed {
    /// Loads a feed from `dir`. `routes.txt`, `stops.txt`, `trips.txt` and
    /// `stop_times.txt` must be present; every other file is optional and
    /// defaults to empty.
    pub fn load(dir: &Path) -> Result<Self, FeedError> {
        let agencies = read_optional(dir, FeedFile::Agency)?;
        let stops = InMemoryPrimaryKeyTable::from_rows(read_required(dir, FeedFile::Stops)?);
        let routes = InMemoryPrimaryKeyTable::from_rows(read_required(dir, FeedFile::Routes)?);
        let trips = InMemoryPrimaryKeyTable::from_rows(read_required(dir, FeedFile::Trips)?);
        let stop_times = read_required(dir, FeedFile::StopTimes)?;
        let calendar = read_optional(dir, FeedFile::Calendar)?;
        let calendar_dates = read_optional(dir, FeedFile::CalendarDates)?;
        let transfers = read_optional(dir, FeedFile::Transfers)?;
        let shapes = read_optional(dir, FeedFile::Shapes)?;

        if calendar.is_empty() && calendar_dates.is_empty() {
            log::warn!(
                "neither calendar.txt nor calendar_dates.txt define any service; \
                 every trip will run on no days"
            );
        }

        Ok(Self {
            agencies,
            stops,
            routes,
            trips,
            stop_times,
            calendar,
            calendar_dates,
            transfers,
            shapes,
        })
    }

    /// Writes the feed to `dir`, creating it first if `create_dir` is set.
    pub fn write(&self, dir: &Path, remove_existing: bool) -> Result<(), FeedError> {
        if remove_existing && dir.exists() {
            fs::remove_dir_all(dir).map_err(|source| FeedError::Io {
                file: FeedFile::Trips,
                source,
            })?;
        }
        fs::create_dir_all(dir).map_err(|source| FeedError::Io {
            file: FeedFile::Trips,
            source,
        })?;

        write_rows(dir, FeedFile::Agency, &self.agencies)?;
        write_rows(dir, FeedFile::Stops, &self.stops.get_all())?;
        write_rows(dir, FeedFile::Routes, &self.routes.get_all())?;
        write_rows(dir, FeedFile::Trips, &self.trips.get_all())?;
        write_rows(dir, FeedFile::StopTimes, &self.stop_times)?;
        write_rows(dir, FeedFile::Calendar, &self.calendar)?;
        write_rows(dir, FeedFile::CalendarDates, &self.calendar_dates)?;
        write_rows(dir, FeedFile::Transfers, &self.transfers)?;
        write_rows(dir, FeedFile::Shapes, &self.shapes)?;
        Ok(())
    }
}
