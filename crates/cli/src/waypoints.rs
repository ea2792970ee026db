use std::{error, fmt, fs::File, io, path::Path};

use model::waypoint::{Waypoint, WaypointRole};
use serde::Deserialize;

#[derive(Debug)]
pub enum WaypointError {
    Io(io::Error),
    Csv(csv::Error),
    /// A row that was read but does not describe a usable waypoint.
    Invalid { row: usize, message: String },
}

impl error::Error for WaypointError {}

impl fmt::Display for WaypointError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(why) => write!(f, "Could not open waypoint file: {why}"),
            Self::Csv(why) => write!(f, "Could not read waypoint file: {why}"),
            Self::Invalid { row, message } => write!(f, "Invalid waypoint in row {row}: {message}"),
        }
    }
}

impl From<io::Error> for WaypointError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for WaypointError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// One row of a waypoint file, `latitude,longitude[,label][,role]` with a
/// header line.
#[derive(Debug, Deserialize)]
struct WaypointRow {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

pub fn read_waypoints<R: io::Read>(reader: R) -> Result<Vec<Waypoint>, WaypointError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut waypoints = vec![];
    for (index, row) in reader.deserialize::<WaypointRow>().enumerate() {
        let row = row?;
        let invalid = |message: String| WaypointError::Invalid {
            row: index + 1,
            message,
        };
        let role = match row.role.as_deref() {
            Some(role) => role.parse::<WaypointRole>().map_err(invalid)?,
            None => WaypointRole::default(),
        };
        let waypoint = Waypoint::new(
            row.latitude,
            row.longitude,
            row.label.unwrap_or_default(),
            role,
        );
        if !waypoint.coordinate().is_valid() {
            return Err(invalid(format!(
                "coordinate {} is out of range",
                waypoint.coordinate()
            )));
        }
        waypoints.push(waypoint);
    }
    Ok(waypoints)
}

pub fn read_waypoint_file<P: AsRef<Path>>(path: P) -> Result<Vec<Waypoint>, WaypointError> {
    read_waypoints(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_rows_in_order() {
        let csv = "latitude,longitude,label,role\n\
                   54.3233, 10.1228, Depot, pickup\n\
                   54.3389,10.1228,,stop\n\
                   54.3466,10.1085,Office,drop\n";
        let waypoints = read_waypoints(csv.as_bytes()).unwrap();

        assert_eq!(waypoints.len(), 3);
        assert_eq!(waypoints[0].label, "Depot");
        assert_eq!(waypoints[0].role, WaypointRole::Pickup);
        assert_eq!(waypoints[1].role, WaypointRole::Intermediate);
        assert!(waypoints[1].label.is_empty());
        assert_eq!(waypoints[2].role, WaypointRole::Dropoff);
    }

    #[test]
    fn label_and_role_are_optional() {
        let csv = "latitude,longitude\n1.0,2.0\n";
        let waypoints = read_waypoints(csv.as_bytes()).unwrap();
        assert_eq!(waypoints[0].role, WaypointRole::Intermediate);
    }

    #[test]
    fn report_the_broken_row() {
        let csv = "latitude,longitude,label,role\n1.0,2.0,a,pickup\n1.0,2.0,b,taxi\n";
        match read_waypoints(csv.as_bytes()) {
            Err(WaypointError::Invalid { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected an invalid row, got {other:?}"),
        }

        let csv = "latitude,longitude\n91.0,2.0\n";
        assert!(matches!(
            read_waypoints(csv.as_bytes()),
            Err(WaypointError::Invalid { row: 1, .. })
        ));
    }
}
